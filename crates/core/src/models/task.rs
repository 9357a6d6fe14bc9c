//! Browse-task models for the `getTaskList` / `getTask` endpoints

use crate::models::wire::{deserialize_string_lenient, id_from_value};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Task names containing this marker are the "browse a page" tasks
pub const BROWSE_TASK_MARKER: &str = "浏览组浏览任务";

/// Click-tracking info nested in a task
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityUrlInfo {
    #[serde(default, deserialize_with = "deserialize_string_lenient")]
    pub id: String,
    #[serde(default, deserialize_with = "deserialize_string_lenient")]
    pub brows_click_url_id: String,
}

/// One entry of `value.taskInfoList`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskInfo {
    #[serde(default, deserialize_with = "deserialize_string_lenient")]
    pub task_id: String,
    #[serde(default, deserialize_with = "deserialize_string_lenient")]
    pub task_code: String,
    #[serde(default)]
    pub task_name: String,
    #[serde(default)]
    pub general_activity_url_info: Option<ActivityUrlInfo>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskListPage {
    #[serde(default)]
    pub task_info_list: Vec<TaskInfo>,
}

/// `value` of the `getTask` response
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskStatePage {
    #[serde(default)]
    pub task_info: Option<TaskState>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskState {
    #[serde(default)]
    pub user_task_id: Value,
}

impl TaskStatePage {
    pub fn user_task_id(&self) -> Option<String> {
        self.task_info
            .as_ref()
            .and_then(|info| id_from_value(&info.user_task_id))
    }
}

/// A browse task selected for one round
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrowseTask {
    pub task_id: String,
    pub task_code: String,
    pub name: String,
    /// `generalActivityUrlInfo.id`, sent as `browsTaskId`
    pub click_id: Option<String>,
    pub brows_click_url_id: String,
}

impl From<TaskInfo> for BrowseTask {
    fn from(info: TaskInfo) -> Self {
        let url_info = info.general_activity_url_info.unwrap_or_default();
        let click_id = Some(url_info.id.trim().to_string()).filter(|id| !id.is_empty());
        Self {
            task_id: info.task_id,
            task_code: info.task_code,
            name: info.task_name,
            click_id,
            brows_click_url_id: url_info.brows_click_url_id,
        }
    }
}

/// First task whose name carries the browse marker
pub fn select_browse_task(tasks: Vec<TaskInfo>) -> Option<BrowseTask> {
    tasks
        .into_iter()
        .find(|t| t.task_name.contains(BROWSE_TASK_MARKER))
        .map(BrowseTask::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_first_browse_task() {
        let page: TaskListPage = serde_json::from_str(
            r#"{"taskInfoList":[
                {"taskId":1,"taskCode":"SIGN","taskName":"签到"},
                {"taskId":"77","taskCode":"BROWSE_A","taskName":"浏览组浏览任务A",
                 "generalActivityUrlInfo":{"id":9001,"browsClickUrlId":"555"}},
                {"taskId":"78","taskCode":"BROWSE_B","taskName":"浏览组浏览任务B"}
            ]}"#,
        )
        .unwrap();

        let task = select_browse_task(page.task_info_list).unwrap();
        assert_eq!(task.task_id, "77");
        assert_eq!(task.task_code, "BROWSE_A");
        assert_eq!(task.click_id.as_deref(), Some("9001"));
        assert_eq!(task.brows_click_url_id, "555");
    }

    #[test]
    fn test_missing_click_id_is_none() {
        let task = BrowseTask::from(TaskInfo {
            task_id: "1".into(),
            task_code: "C".into(),
            task_name: "浏览组浏览任务".into(),
            general_activity_url_info: Some(ActivityUrlInfo::default()),
        });
        assert_eq!(task.click_id, None);
    }

    #[test]
    fn test_no_browse_task_selected() {
        assert!(select_browse_task(vec![TaskInfo::default()]).is_none());
    }

    #[test]
    fn test_task_state_user_task_id() {
        let page: TaskStatePage =
            serde_json::from_str(r#"{"taskInfo":{"userTaskId":123456}}"#).unwrap();
        assert_eq!(page.user_task_id().as_deref(), Some("123456"));

        let empty: TaskStatePage = serde_json::from_str(r#"{"taskInfo":{}}"#).unwrap();
        assert_eq!(empty.user_task_id(), None);
    }
}
