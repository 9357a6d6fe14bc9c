//! Account and exchange-config CRUD operations

use crate::encryption::{CredentialCipher, SealedSecret};
use miwallet_core::{Account, Error, ExchangeConfig, Result};
use sqlx::SqlitePool;
use std::collections::HashMap;
use tracing::debug;

/// Database row for an account; tokens still sealed
#[derive(Debug, sqlx::FromRow)]
struct AccountRow {
    alias: String,
    user_id: Option<String>,
    pass_token_encrypted: Option<Vec<u8>>,
    pass_token_iv: Option<Vec<u8>>,
    security_token_encrypted: Option<Vec<u8>>,
    security_token_iv: Option<Vec<u8>>,
}

#[derive(Debug, sqlx::FromRow)]
struct ExchangeConfigRow {
    account_alias: String,
    membership_type: String,
    phone_number: String,
}

fn open_column(
    cipher: &CredentialCipher,
    ciphertext: Option<Vec<u8>>,
    iv: Option<Vec<u8>>,
) -> Result<Option<String>> {
    match (ciphertext, iv) {
        (Some(ciphertext), Some(iv)) => {
            let sealed = SealedSecret::from_parts(ciphertext, &iv)?;
            cipher.open(&sealed).map(Some)
        }
        _ => Ok(None),
    }
}

impl AccountRow {
    fn into_account(
        self,
        cipher: &CredentialCipher,
        exchange_configs: Vec<ExchangeConfig>,
    ) -> Result<Account> {
        Ok(Account {
            pass_token: open_column(cipher, self.pass_token_encrypted, self.pass_token_iv)?,
            security_token: open_column(
                cipher,
                self.security_token_encrypted,
                self.security_token_iv,
            )?,
            alias: self.alias,
            user_id: self.user_id,
            exchange_configs,
        })
    }
}

/// Insert or update an account, replacing its exchange configs
pub async fn save_account(
    pool: &SqlitePool,
    cipher: &CredentialCipher,
    account: &Account,
) -> Result<()> {
    let alias = account.alias.trim();
    if alias.is_empty() {
        return Err(Error::ConfigError("account alias must not be blank".into()));
    }

    let pass = cipher.seal_optional(account.pass_token.as_deref())?;
    let security = cipher.seal_optional(account.security_token.as_deref())?;

    let mut tx = pool
        .begin()
        .await
        .map_err(|e| Error::DatabaseError(e.to_string()))?;

    sqlx::query(
        r#"
        INSERT INTO accounts (alias, user_id, pass_token_encrypted, pass_token_iv,
                              security_token_encrypted, security_token_iv)
        VALUES (?, ?, ?, ?, ?, ?)
        ON CONFLICT(alias) DO UPDATE SET
            user_id = excluded.user_id,
            pass_token_encrypted = excluded.pass_token_encrypted,
            pass_token_iv = excluded.pass_token_iv,
            security_token_encrypted = excluded.security_token_encrypted,
            security_token_iv = excluded.security_token_iv,
            updated_at = CURRENT_TIMESTAMP
        "#,
    )
    .bind(alias)
    .bind(account.user_id.as_deref())
    .bind(pass.as_ref().map(|s| s.ciphertext.clone()))
    .bind(pass.as_ref().map(|s| s.iv.to_vec()))
    .bind(security.as_ref().map(|s| s.ciphertext.clone()))
    .bind(security.as_ref().map(|s| s.iv.to_vec()))
    .execute(&mut *tx)
    .await
    .map_err(|e| Error::DatabaseError(e.to_string()))?;

    sqlx::query("DELETE FROM exchange_configs WHERE account_alias = ?")
        .bind(alias)
        .execute(&mut *tx)
        .await
        .map_err(|e| Error::DatabaseError(e.to_string()))?;

    for config in &account.exchange_configs {
        sqlx::query(
            r#"
            INSERT OR REPLACE INTO exchange_configs (account_alias, membership_type, phone_number)
            VALUES (?, ?, ?)
            "#,
        )
        .bind(alias)
        .bind(&config.membership_type)
        .bind(&config.phone_number)
        .execute(&mut *tx)
        .await
        .map_err(|e| Error::DatabaseError(e.to_string()))?;
    }

    tx.commit()
        .await
        .map_err(|e| Error::DatabaseError(e.to_string()))?;

    debug!("Saved account {}", alias);
    Ok(())
}

/// All accounts in creation order, tokens decrypted
pub async fn list_accounts(pool: &SqlitePool, cipher: &CredentialCipher) -> Result<Vec<Account>> {
    let rows: Vec<AccountRow> = sqlx::query_as(
        r#"
        SELECT alias, user_id, pass_token_encrypted, pass_token_iv,
               security_token_encrypted, security_token_iv
        FROM accounts
        ORDER BY id ASC
        "#,
    )
    .fetch_all(pool)
    .await
    .map_err(|e| Error::DatabaseError(e.to_string()))?;

    let config_rows: Vec<ExchangeConfigRow> = sqlx::query_as(
        r#"
        SELECT account_alias, membership_type, phone_number
        FROM exchange_configs
        ORDER BY created_at ASC, rowid ASC
        "#,
    )
    .fetch_all(pool)
    .await
    .map_err(|e| Error::DatabaseError(e.to_string()))?;

    let mut configs: HashMap<String, Vec<ExchangeConfig>> = HashMap::new();
    for row in config_rows {
        configs
            .entry(row.account_alias)
            .or_default()
            .push(ExchangeConfig {
                membership_type: row.membership_type,
                phone_number: row.phone_number,
            });
    }

    rows.into_iter()
        .map(|row| {
            let account_configs = configs.remove(&row.alias).unwrap_or_default();
            row.into_account(cipher, account_configs)
        })
        .collect()
}

pub async fn get_account(
    pool: &SqlitePool,
    cipher: &CredentialCipher,
    alias: &str,
) -> Result<Option<Account>> {
    let row: Option<AccountRow> = sqlx::query_as(
        r#"
        SELECT alias, user_id, pass_token_encrypted, pass_token_iv,
               security_token_encrypted, security_token_iv
        FROM accounts
        WHERE alias = ?
        "#,
    )
    .bind(alias)
    .fetch_optional(pool)
    .await
    .map_err(|e| Error::DatabaseError(e.to_string()))?;

    let Some(row) = row else {
        return Ok(None);
    };

    let configs = list_exchange_configs(pool, alias).await?;
    row.into_account(cipher, configs).map(Some)
}

/// Delete an account and its exchange configs. Returns false if it did not exist.
pub async fn delete_account(pool: &SqlitePool, alias: &str) -> Result<bool> {
    let mut tx = pool
        .begin()
        .await
        .map_err(|e| Error::DatabaseError(e.to_string()))?;

    sqlx::query("DELETE FROM exchange_configs WHERE account_alias = ?")
        .bind(alias)
        .execute(&mut *tx)
        .await
        .map_err(|e| Error::DatabaseError(e.to_string()))?;

    let result = sqlx::query("DELETE FROM accounts WHERE alias = ?")
        .bind(alias)
        .execute(&mut *tx)
        .await
        .map_err(|e| Error::DatabaseError(e.to_string()))?;

    tx.commit()
        .await
        .map_err(|e| Error::DatabaseError(e.to_string()))?;

    Ok(result.rows_affected() > 0)
}

pub async fn list_exchange_configs(pool: &SqlitePool, alias: &str) -> Result<Vec<ExchangeConfig>> {
    let rows: Vec<ExchangeConfigRow> = sqlx::query_as(
        r#"
        SELECT account_alias, membership_type, phone_number
        FROM exchange_configs
        WHERE account_alias = ?
        ORDER BY created_at ASC, rowid ASC
        "#,
    )
    .bind(alias)
    .fetch_all(pool)
    .await
    .map_err(|e| Error::DatabaseError(e.to_string()))?;

    Ok(rows
        .into_iter()
        .map(|row| ExchangeConfig {
            membership_type: row.membership_type,
            phone_number: row.phone_number,
        })
        .collect())
}

/// Add or replace the config for `config.membership_type` on an existing account
pub async fn save_exchange_config(
    pool: &SqlitePool,
    alias: &str,
    config: &ExchangeConfig,
) -> Result<()> {
    let exists: Option<(i64,)> = sqlx::query_as("SELECT id FROM accounts WHERE alias = ?")
        .bind(alias)
        .fetch_optional(pool)
        .await
        .map_err(|e| Error::DatabaseError(e.to_string()))?;

    if exists.is_none() {
        return Err(Error::ConfigError(format!("no account named '{}'", alias)));
    }

    sqlx::query(
        r#"
        INSERT INTO exchange_configs (account_alias, membership_type, phone_number)
        VALUES (?, ?, ?)
        ON CONFLICT(account_alias, membership_type) DO UPDATE SET
            phone_number = excluded.phone_number
        "#,
    )
    .bind(alias)
    .bind(&config.membership_type)
    .bind(&config.phone_number)
    .execute(pool)
    .await
    .map_err(|e| Error::DatabaseError(e.to_string()))?;

    Ok(())
}

pub async fn delete_exchange_config(
    pool: &SqlitePool,
    alias: &str,
    membership_type: &str,
) -> Result<bool> {
    let result = sqlx::query(
        "DELETE FROM exchange_configs WHERE account_alias = ? AND membership_type = ?",
    )
    .bind(alias)
    .bind(membership_type)
    .execute(pool)
    .await
    .map_err(|e| Error::DatabaseError(e.to_string()))?;

    Ok(result.rows_affected() > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sqlite::Database;

    fn cipher() -> CredentialCipher {
        CredentialCipher::from_passphrase("accounts-test").unwrap()
    }

    #[tokio::test]
    async fn test_account_roundtrip_with_encrypted_tokens() {
        let db = Database::connect_in_memory().await.unwrap();
        let cipher = cipher();

        let mut account = Account::with_credentials("main", "10001", "V1:pass");
        account.security_token = Some("ssec".into());
        account.upsert_exchange_config(ExchangeConfig::new("tencent", "13800000000"));
        save_account(db.pool(), &cipher, &account).await.unwrap();

        let raw: (Vec<u8>,) =
            sqlx::query_as("SELECT pass_token_encrypted FROM accounts WHERE alias = 'main'")
                .fetch_one(db.pool())
                .await
                .unwrap();
        assert_ne!(raw.0, b"V1:pass".to_vec());

        let loaded = get_account(db.pool(), &cipher, "main").await.unwrap().unwrap();
        assert_eq!(loaded, account);
    }

    #[tokio::test]
    async fn test_save_replaces_existing_alias() {
        let db = Database::connect_in_memory().await.unwrap();
        let cipher = cipher();

        save_account(db.pool(), &cipher, &Account::with_credentials("a", "1", "t1"))
            .await
            .unwrap();
        save_account(db.pool(), &cipher, &Account::with_credentials("b", "2", "t2"))
            .await
            .unwrap();
        save_account(db.pool(), &cipher, &Account::with_credentials("a", "1", "t3"))
            .await
            .unwrap();

        let accounts = list_accounts(db.pool(), &cipher).await.unwrap();
        assert_eq!(accounts.len(), 2);
        assert_eq!(accounts[0].alias, "a");
        assert_eq!(accounts[0].pass_token.as_deref(), Some("t3"));
    }

    #[tokio::test]
    async fn test_exchange_configs_unique_per_type() {
        let db = Database::connect_in_memory().await.unwrap();
        let cipher = cipher();
        save_account(db.pool(), &cipher, &Account::new("main"))
            .await
            .unwrap();

        save_exchange_config(db.pool(), "main", &ExchangeConfig::new("iqiyi", "1"))
            .await
            .unwrap();
        save_exchange_config(db.pool(), "main", &ExchangeConfig::new("iqiyi", "2"))
            .await
            .unwrap();

        let configs = list_exchange_configs(db.pool(), "main").await.unwrap();
        assert_eq!(configs, vec![ExchangeConfig::new("iqiyi", "2")]);

        assert!(delete_exchange_config(db.pool(), "main", "iqiyi")
            .await
            .unwrap());
        assert!(list_exchange_configs(db.pool(), "main")
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_config_for_unknown_account_rejected() {
        let db = Database::connect_in_memory().await.unwrap();
        let result =
            save_exchange_config(db.pool(), "ghost", &ExchangeConfig::new("youku", "1")).await;
        assert!(matches!(result, Err(Error::ConfigError(_))));
    }

    #[tokio::test]
    async fn test_delete_account_removes_configs() {
        let db = Database::connect_in_memory().await.unwrap();
        let cipher = cipher();
        let mut account = Account::new("gone");
        account.upsert_exchange_config(ExchangeConfig::new("mgtv", "1"));
        save_account(db.pool(), &cipher, &account).await.unwrap();

        assert!(delete_account(db.pool(), "gone").await.unwrap());
        assert!(!delete_account(db.pool(), "gone").await.unwrap());
        assert!(list_exchange_configs(db.pool(), "gone")
            .await
            .unwrap()
            .is_empty());
    }
}
