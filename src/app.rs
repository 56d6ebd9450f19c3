use crate::handlers;
use crate::state::AppState;
use axum::{
    Router,
    routing::{get, patch},
};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/api/health", get(handlers::health))
        .route("/api/github/user", get(handlers::github_user))
        .route("/api/github/repos", get(handlers::github_repos))
        .route("/api/github/commits", get(handlers::github_commits))
        .route("/api/github/repo-status", get(handlers::github_repo_status))
        .route("/api/dashboard", get(handlers::dashboard))
        .route("/api/dashboard/status", get(handlers::dashboard_status))
        .route("/api/activity", get(handlers::activity))
        .route("/api/inactive", get(handlers::inactive))
        .route("/api/notifications", get(handlers::notifications))
        .route(
            "/api/notification-settings",
            get(handlers::get_notification_settings).put(handlers::put_notification_settings),
        )
        .route("/api/todos", get(handlers::list_todos).post(handlers::create_todo))
        .route(
            "/api/todos/:id",
            patch(handlers::update_todo).delete(handlers::delete_todo),
        )
        .with_state(state)
}
