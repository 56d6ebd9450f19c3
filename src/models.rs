use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize, Serializer};
use std::collections::{BTreeMap, BTreeSet};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RepoCommitWindow {
    pub repo_name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub daily_counts: Vec<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RecentCommit {
    pub sha: String,
    pub message: String,
    pub author: Option<String>,
    pub date: DateTime<Utc>,
    pub url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentStatus {
    pub is_deployed: bool,
    pub platform: Option<String>,
    pub url: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum MergeOutcome {
    Success,
    Failed,
    #[default]
    Unknown,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct MergeStatus {
    pub last_merge_status: MergeOutcome,
    pub last_merged_at: Option<DateTime<Utc>>,
    pub last_merged_pr: Option<u64>,
    pub last_merged_title: Option<String>,
    pub failed_count: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct RepoStatus {
    pub deployment: DeploymentStatus,
    pub merge_status: MergeStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RepoStat {
    pub name: String,
    pub total_commits: u32,
    pub max_commits: u32,
    pub max_commits_date: Option<String>,
    pub max_consecutive_days: u32,
    pub last_commit_date: Option<DateTime<Utc>>,
    pub created_at: Option<DateTime<Utc>>,
    pub language: Option<String>,
    pub stars: u32,
    pub forks: u32,
    pub color: String,
    pub recent_commits: Vec<RecentCommit>,
    pub deployment: DeploymentStatus,
    pub merge_status: MergeStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Dataset {
    pub label: String,
    pub data: Vec<u32>,
    pub color: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ChartData {
    pub username: String,
    pub days: u32,
    pub labels: Vec<String>,
    pub datasets: Vec<Dataset>,
    pub repo_stats: Vec<RepoStat>,
    pub windows: Vec<RepoCommitWindow>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Up,
    Down,
    Same,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ActivityChange {
    pub repo_name: String,
    pub today: u32,
    pub yesterday: u32,
    pub change: i64,
    pub trend: Trend,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum InactivityReason {
    #[serde(rename = "Empty repository")]
    Empty,
    #[serde(rename = "Repository not found")]
    NotFound,
    #[serde(rename = "No commits in last 21 days")]
    NoCommits21Days,
    #[serde(rename = "No commits in last 15 days")]
    NoCommits15Days,
}

impl InactivityReason {
    pub fn label(self) -> &'static str {
        match self {
            Self::Empty => "Empty repository",
            Self::NotFound => "Repository not found",
            Self::NoCommits21Days => "No commits in last 21 days",
            Self::NoCommits15Days => "No commits in last 15 days",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DaysWithoutCommits {
    Days(i64),
    Unknown,
}

impl Serialize for DaysWithoutCommits {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Days(days) => serializer.serialize_i64(*days),
            Self::Unknown => serializer.serialize_str("N/A"),
        }
    }
}

impl<'de> Deserialize<'de> for DaysWithoutCommits {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Days(i64),
            Other(serde::de::IgnoredAny),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Days(days) => Self::Days(days),
            Raw::Other(_) => Self::Unknown,
        })
    }
}

impl std::fmt::Display for DaysWithoutCommits {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Days(days) => write!(f, "{days}"),
            Self::Unknown => f.write_str("N/A"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct InactivityRecord {
    pub repo_name: String,
    pub reason: InactivityReason,
    pub last_commit_date: Option<DateTime<Utc>>,
    pub days_without_commits: DaysWithoutCommits,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct InactivityReport {
    pub inactive_repos: Vec<InactivityRecord>,
    pub repos_15_days: Vec<InactivityRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    pub sequence: u64,
    pub chart: ChartData,
    pub activity: Vec<ActivityChange>,
    pub inactivity: InactivityReport,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum TodoStatus {
    #[default]
    Todo,
    InProgress,
    Done,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Todo {
    pub id: Uuid,
    pub title: String,
    pub priority: Priority,
    pub status: TodoStatus,
    pub repo_id: Option<u64>,
    pub repo_name: Option<String>,
    pub project_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTodo {
    pub title: String,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub status: TodoStatus,
    #[serde(default)]
    pub repo_id: Option<u64>,
    #[serde(default)]
    pub repo_name: Option<String>,
    #[serde(default)]
    pub project_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TodoPatch {
    pub title: Option<String>,
    pub priority: Option<Priority>,
    pub status: Option<TodoStatus>,
    pub repo_id: Option<u64>,
    pub repo_name: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum NotificationKind {
    Inactivity,
    LoadComplete,
    LoadFailed,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: Uuid,
    pub kind: NotificationKind,
    pub message: String,
    pub repo_name: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct NotificationSettings {
    pub inactivity_alerts: bool,
    pub load_alerts: bool,
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            inactivity_alerts: true,
            load_alerts: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct AppData {
    pub todos: Vec<Todo>,
    pub notifications: BTreeMap<String, Vec<Notification>>,
    pub notified_repos: BTreeMap<String, BTreeSet<String>>,
    pub notification_settings: NotificationSettings,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn days_without_commits_serializes_number_or_na() {
        assert_eq!(
            serde_json::to_value(DaysWithoutCommits::Days(4)).unwrap(),
            serde_json::json!(4)
        );
        assert_eq!(
            serde_json::to_value(DaysWithoutCommits::Unknown).unwrap(),
            serde_json::json!("N/A")
        );
        let parsed: DaysWithoutCommits = serde_json::from_str("\"N/A\"").unwrap();
        assert_eq!(parsed, DaysWithoutCommits::Unknown);
    }

    #[test]
    fn inactivity_reason_uses_display_labels() {
        let value = serde_json::to_value(InactivityReason::Empty).unwrap();
        assert_eq!(value, serde_json::json!("Empty repository"));
        assert_eq!(InactivityReason::NoCommits15Days.label(), "No commits in last 15 days");
    }

    #[test]
    fn app_data_tolerates_missing_fields() {
        let data: AppData = serde_json::from_str("{}").unwrap();
        assert!(data.todos.is_empty());
        assert!(data.notification_settings.inactivity_alerts);
    }
}
