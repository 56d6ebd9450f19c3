use crate::errors::AppError;
use crate::github::{CommitQuery, RepoQuery, Resource};
use crate::loads::LoadState;
use crate::models::{
    ChartData, Dashboard, InactivityReport, NewTodo, Notification, NotificationSettings,
    RepoStatus, Todo, TodoPatch,
};
use crate::state::AppState;
use crate::ui::render_index;
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::Html,
};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::info;
use uuid::Uuid;

const DEFAULT_DAYS: u32 = 7;
const MAX_DAYS: u32 = 365;

#[derive(Debug, Default, Deserialize)]
pub struct UserParams {
    pub username: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ReposParams {
    pub username: Option<String>,
    pub per_page: Option<u32>,
    pub sort: Option<String>,
    pub page: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CommitsParams {
    pub username: Option<String>,
    pub repo: Option<String>,
    pub since: Option<String>,
    pub until: Option<String>,
    pub per_page: Option<u32>,
    pub page: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RepoParams {
    pub username: Option<String>,
    pub repo: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct DashboardParams {
    pub username: Option<String>,
    pub days: Option<String>,
    #[serde(default)]
    pub refresh: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct TodoParams {
    #[serde(rename = "projectId")]
    pub project_id: Option<String>,
}

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

pub async fn index(
    State(state): State<AppState>,
    Query(params): Query<DashboardParams>,
) -> Html<String> {
    let Some(username) = present(&params.username) else {
        return Html(render_index(None, DEFAULT_DAYS, None, None));
    };

    let days = match parse_days(params.days.as_deref()) {
        Ok(days) => days,
        Err(err) => return Html(render_index(Some(username), DEFAULT_DAYS, None, Some(&err.message))),
    };

    match state.dashboard.load(username, days, params.refresh).await {
        Ok(dashboard) => Html(render_index(Some(username), days, Some(&dashboard), None)),
        Err(err) => {
            let message = err.user_message(Resource::User);
            Html(render_index(Some(username), days, None, Some(&message)))
        }
    }
}

pub async fn github_user(
    State(state): State<AppState>,
    Query(params): Query<UserParams>,
) -> Result<Json<Value>, AppError> {
    let username = present(&params.username).ok_or_else(|| AppError::bad_request("Missing username"))?;
    let user = state
        .github
        .user(username)
        .await
        .map_err(|err| AppError::github(&err, Resource::User))?;
    Ok(Json(user))
}

pub async fn github_repos(
    State(state): State<AppState>,
    Query(params): Query<ReposParams>,
) -> Result<Json<Value>, AppError> {
    let username = present(&params.username).ok_or_else(|| AppError::bad_request("Missing username"))?;
    let query = RepoQuery {
        per_page: params.per_page,
        sort: params.sort.clone(),
        page: params.page,
    };
    let repos = state
        .github
        .repos(username, &query)
        .await
        .map_err(|err| AppError::github(&err, Resource::User))?;
    Ok(Json(repos))
}

pub async fn github_commits(
    State(state): State<AppState>,
    Query(params): Query<CommitsParams>,
) -> Result<Json<Value>, AppError> {
    let (username, repo) = match (present(&params.username), present(&params.repo)) {
        (Some(username), Some(repo)) => (username, repo),
        _ => return Err(AppError::bad_request("Missing username or repo")),
    };
    let query = CommitQuery {
        since: params.since.clone(),
        until: params.until.clone(),
        per_page: params.per_page,
        page: params.page,
    };
    let commits = state
        .github
        .commits(username, repo, &query)
        .await
        .map_err(|err| AppError::github(&err, Resource::Repository))?;
    Ok(Json(commits))
}

pub async fn github_repo_status(
    State(state): State<AppState>,
    Query(params): Query<RepoParams>,
) -> Result<Json<RepoStatus>, AppError> {
    let (username, repo) = match (present(&params.username), present(&params.repo)) {
        (Some(username), Some(repo)) => (username, repo),
        _ => return Err(AppError::bad_request("Missing username or repo")),
    };
    Ok(Json(state.probe.probe(username, repo).await))
}

pub async fn dashboard(
    State(state): State<AppState>,
    Query(params): Query<DashboardParams>,
) -> Result<Json<Dashboard>, AppError> {
    let username = present(&params.username).ok_or_else(|| AppError::bad_request("Missing username"))?;
    let days = parse_days(params.days.as_deref())?;
    let dashboard = state
        .dashboard
        .load(username, days, params.refresh)
        .await
        .map_err(|err| AppError::github(&err, Resource::User))?;
    Ok(Json(Dashboard::clone(&dashboard)))
}

pub async fn dashboard_status(
    State(state): State<AppState>,
    Query(params): Query<DashboardParams>,
) -> Result<Json<LoadState>, AppError> {
    let username = present(&params.username).ok_or_else(|| AppError::bad_request("Missing username"))?;
    let days = parse_days(params.days.as_deref())?;
    Ok(Json(state.dashboard.status(username, days)))
}

pub async fn activity(
    State(state): State<AppState>,
    Query(params): Query<DashboardParams>,
) -> Result<Json<ChartData>, AppError> {
    let username = present(&params.username).ok_or_else(|| AppError::bad_request("Missing username"))?;
    let days = parse_days(params.days.as_deref())?;
    let chart = state
        .dashboard
        .activity(username, days, params.refresh)
        .await
        .map_err(|err| AppError::github(&err, Resource::User))?;
    Ok(Json(chart))
}

pub async fn inactive(
    State(state): State<AppState>,
    Query(params): Query<DashboardParams>,
) -> Result<Json<InactivityReport>, AppError> {
    let username = present(&params.username).ok_or_else(|| AppError::bad_request("Missing username"))?;
    let report = state
        .dashboard
        .inactivity(username, params.refresh)
        .await
        .map_err(|err| AppError::github(&err, Resource::User))?;
    Ok(Json(report))
}

pub async fn notifications(
    State(state): State<AppState>,
    Query(params): Query<UserParams>,
) -> Result<Json<Vec<Notification>>, AppError> {
    let username = present(&params.username).ok_or_else(|| AppError::bad_request("Missing username"))?;
    Ok(Json(state.notifications.history(username).await))
}

pub async fn get_notification_settings(State(state): State<AppState>) -> Json<NotificationSettings> {
    Json(state.notifications.settings().await)
}

pub async fn put_notification_settings(
    State(state): State<AppState>,
    Json(settings): Json<NotificationSettings>,
) -> Result<Json<NotificationSettings>, AppError> {
    Ok(Json(state.notifications.update_settings(settings).await?))
}

pub async fn list_todos(
    State(state): State<AppState>,
    Query(params): Query<TodoParams>,
) -> Json<Vec<Todo>> {
    Json(state.todos.list(present(&params.project_id)).await)
}

pub async fn create_todo(
    State(state): State<AppState>,
    Json(payload): Json<NewTodo>,
) -> Result<(StatusCode, Json<Todo>), AppError> {
    let todo = state.todos.add(payload).await?;
    info!("created todo {}", todo.id);
    Ok((StatusCode::CREATED, Json(todo)))
}

pub async fn update_todo(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(patch): Json<TodoPatch>,
) -> Result<Json<Todo>, AppError> {
    Ok(Json(state.todos.update(id, patch).await?))
}

pub async fn delete_todo(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state.todos.remove(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

fn present(value: &Option<String>) -> Option<&str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

fn parse_days(raw: Option<&str>) -> Result<u32, AppError> {
    let Some(raw) = raw.map(str::trim).filter(|raw| !raw.is_empty()) else {
        return Ok(DEFAULT_DAYS);
    };
    match raw.parse::<u32>() {
        Ok(days) if (1..=MAX_DAYS).contains(&days) => Ok(days),
        _ => Err(AppError::bad_request(format!(
            "days must be a number between 1 and {MAX_DAYS}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn days_default_and_bounds() {
        assert_eq!(parse_days(None).unwrap(), 7);
        assert_eq!(parse_days(Some(" ")).unwrap(), 7);
        assert_eq!(parse_days(Some("30")).unwrap(), 30);
        assert_eq!(parse_days(Some("365")).unwrap(), 365);
        assert!(parse_days(Some("0")).is_err());
        assert!(parse_days(Some("366")).is_err());
        assert!(parse_days(Some("week")).is_err());
    }

    #[test]
    fn blank_parameters_are_missing() {
        assert_eq!(present(&Some("  octocat ".to_string())), Some("octocat"));
        assert_eq!(present(&Some("   ".to_string())), None);
        assert_eq!(present(&None), None);
    }
}
