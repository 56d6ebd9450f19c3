use crate::cache::TtlCache;
use crate::config::Config;
use crate::dashboard::DashboardService;
use crate::errors::AppError;
use crate::github::GitHubClient;
use crate::loads::LoadTracker;
use crate::notifications::NotificationCenter;
use crate::repo_status::StatusProbe;
use crate::storage::LocalStore;
use crate::todos::TodoStore;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub github: GitHubClient,
    pub probe: StatusProbe,
    pub dashboard: DashboardService,
    pub todos: TodoStore,
    pub notifications: NotificationCenter,
}

impl AppState {
    pub fn new(config: &Config, store: LocalStore) -> Result<Self, AppError> {
        let github = GitHubClient::new(config.github_token.as_deref(), &config.github_api_url)
            .map_err(AppError::internal)?;
        let notifications = NotificationCenter::new(store.clone());
        let dashboard = DashboardService::new(
            github.clone(),
            config.inactivity_delay,
            Arc::new(TtlCache::default()),
            Arc::new(LoadTracker::new()),
            notifications.clone(),
        );

        Ok(Self {
            probe: StatusProbe::new(github.clone()),
            github,
            dashboard,
            todos: TodoStore::new(store),
            notifications,
        })
    }
}
