use crate::errors::AppError;
use crate::models::{
    AppData, InactivityReport, Notification, NotificationKind, NotificationSettings,
};
use crate::storage::LocalStore;
use chrono::{DateTime, Utc};
use tracing::info;
use uuid::Uuid;

pub const HISTORY_LIMIT: usize = 50;

pub fn push(
    data: &mut AppData,
    username: &str,
    kind: NotificationKind,
    message: String,
    repo_name: Option<String>,
    now: DateTime<Utc>,
) {
    let history = data
        .notifications
        .entry(history_key(username))
        .or_default();
    history.insert(
        0,
        Notification {
            id: Uuid::new_v4(),
            kind,
            message,
            repo_name,
            created_at: now,
        },
    );
    history.truncate(HISTORY_LIMIT);
}

// Notifies once per repository that is inactive and was not already reported.
pub fn push_inactivity(
    data: &mut AppData,
    username: &str,
    report: &InactivityReport,
    now: DateTime<Utc>,
) -> usize {
    if !data.notification_settings.inactivity_alerts {
        return 0;
    }

    let notified = data
        .notified_repos
        .entry(history_key(username))
        .or_default();
    let fresh: Vec<_> = report
        .inactive_repos
        .iter()
        .filter(|record| notified.insert(record.repo_name.clone()))
        .collect();

    for record in &fresh {
        push(
            data,
            username,
            NotificationKind::Inactivity,
            format!("{} is inactive: {}", record.repo_name, record.reason.label()),
            Some(record.repo_name.clone()),
            now,
        );
    }
    fresh.len()
}

fn history_key(username: &str) -> String {
    format!("notifications_{}", username.to_lowercase())
}

#[derive(Clone)]
pub struct NotificationCenter {
    store: LocalStore,
}

impl NotificationCenter {
    pub fn new(store: LocalStore) -> Self {
        Self { store }
    }

    pub async fn history(&self, username: &str) -> Vec<Notification> {
        let key = history_key(username);
        self.store
            .read(|data| data.notifications.get(&key).cloned().unwrap_or_default())
            .await
    }

    pub async fn settings(&self) -> NotificationSettings {
        self.store.read(|data| data.notification_settings).await
    }

    pub async fn update_settings(
        &self,
        settings: NotificationSettings,
    ) -> Result<NotificationSettings, AppError> {
        self.store
            .update(|data| {
                data.notification_settings = settings;
                settings
            })
            .await
    }

    pub async fn inactivity_scanned(
        &self,
        username: &str,
        report: &InactivityReport,
        now: DateTime<Utc>,
    ) -> Result<usize, AppError> {
        let added = self
            .store
            .update(|data| push_inactivity(data, username, report, now))
            .await?;
        if added > 0 {
            info!("raised {added} inactivity notifications for {username}");
        }
        Ok(added)
    }

    pub async fn load_finished(
        &self,
        username: &str,
        outcome: Result<usize, &str>,
        now: DateTime<Utc>,
    ) -> Result<(), AppError> {
        if !self.settings().await.load_alerts {
            return Ok(());
        }
        let (kind, message) = match outcome {
            Ok(repos) => (
                NotificationKind::LoadComplete,
                format!("Dashboard refreshed: {repos} active repositories"),
            ),
            Err(message) => (
                NotificationKind::LoadFailed,
                format!("Dashboard refresh failed: {message}"),
            ),
        };
        self.store
            .update(|data| push(data, username, kind, message, None, now))
            .await
    }
}
