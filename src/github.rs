use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue};
use serde::{Deserialize, de::DeserializeOwned};
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

const USER_AGENT: &str = "gh_pulse";
const JSON_MEDIA_TYPE: &str = "application/vnd.github+json";
const RAW_MEDIA_TYPE: &str = "application/vnd.github.raw";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    User,
    Repository,
}

#[derive(Debug, Error)]
pub enum GitHubError {
    #[error("GitHub responded with {status}")]
    Status { status: StatusCode, rate_limited: bool },

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("failed to decode GitHub response: {0}")]
    Decode(String),
}

impl GitHubError {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Self::Status { rate_limited: true, .. })
            || self.status() == Some(StatusCode::TOO_MANY_REQUESTS)
    }

    pub fn response_status(&self) -> StatusCode {
        match self {
            Self::Status { status, .. } => *status,
            Self::Network(_) | Self::Decode(_) => StatusCode::BAD_GATEWAY,
        }
    }

    pub fn user_message(&self, resource: Resource) -> String {
        match self {
            Self::Status { status, rate_limited } => match status.as_u16() {
                401 => "Bad credentials. Check your GitHub token.".to_string(),
                403 if *rate_limited => {
                    "GitHub API rate limit exceeded. Please try again later.".to_string()
                }
                403 => "Access to this resource is forbidden.".to_string(),
                404 => match resource {
                    Resource::User => "User not found".to_string(),
                    Resource::Repository => "Repository not found".to_string(),
                },
                409 => "Repository is empty".to_string(),
                422 => "Invalid request parameters".to_string(),
                429 => "Too many requests. Please slow down and try again.".to_string(),
                _ => format!("GitHub API error: {status}"),
            },
            Self::Network(err) => format!("Network error: {err}"),
            Self::Decode(detail) => format!("Network error: unexpected response ({detail})"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct GitHubRepo {
    pub name: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub pushed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub stargazers_count: u32,
    #[serde(default)]
    pub forks_count: u32,
}

// The author date is kept as text so one malformed entry cannot sink the page.
#[derive(Debug, Clone, Deserialize)]
pub struct GitHubCommit {
    pub sha: String,
    pub commit: CommitDetail,
    #[serde(default)]
    pub html_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommitDetail {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub author: Option<CommitAuthor>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommitAuthor {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
}

impl GitHubCommit {
    pub fn author_date(&self) -> Option<DateTime<Utc>> {
        let raw = self.commit.author.as_ref()?.date.as_deref()?;
        DateTime::parse_from_rfc3339(raw)
            .ok()
            .map(|date| date.with_timezone(&Utc))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PullRequest {
    pub number: u64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub merged_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub merge_commit_sha: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CombinedStatus {
    #[serde(default)]
    pub state: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CheckRuns {
    #[serde(default)]
    pub check_runs: Vec<CheckRun>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CheckRun {
    #[serde(default)]
    pub conclusion: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PagesSite {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub html_url: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct CommitQuery {
    pub since: Option<String>,
    pub until: Option<String>,
    pub per_page: Option<u32>,
    pub page: Option<u32>,
}

impl CommitQuery {
    fn pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::with_capacity(4);
        if let Some(since) = &self.since {
            pairs.push(("since", since.clone()));
        }
        if let Some(until) = &self.until {
            pairs.push(("until", until.clone()));
        }
        if let Some(per_page) = self.per_page {
            pairs.push(("per_page", per_page.to_string()));
        }
        if let Some(page) = self.page {
            pairs.push(("page", page.to_string()));
        }
        pairs
    }
}

#[derive(Debug, Clone, Default)]
pub struct RepoQuery {
    pub per_page: Option<u32>,
    pub sort: Option<String>,
    pub page: Option<u32>,
}

impl RepoQuery {
    pub fn recently_updated(per_page: u32) -> Self {
        Self {
            per_page: Some(per_page),
            sort: Some("updated".to_string()),
            page: Some(1),
        }
    }

    fn pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::with_capacity(3);
        if let Some(per_page) = self.per_page {
            pairs.push(("per_page", per_page.to_string()));
        }
        if let Some(sort) = &self.sort {
            pairs.push(("sort", sort.clone()));
        }
        if let Some(page) = self.page {
            pairs.push(("page", page.to_string()));
        }
        pairs
    }
}

#[derive(Debug, Clone)]
pub struct GitHubClient {
    client: reqwest::Client,
    base_url: String,
}

impl GitHubClient {
    pub fn new(token: Option<&str>, base_url: impl Into<String>) -> Result<Self, GitHubError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(JSON_MEDIA_TYPE));

        if let Some(token) = token {
            let mut value = HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|err| GitHubError::Decode(err.to_string()))?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn user(&self, username: &str) -> Result<Value, GitHubError> {
        self.get_json(&format!("/users/{username}"), &[]).await
    }

    pub async fn repos(&self, username: &str, query: &RepoQuery) -> Result<Value, GitHubError> {
        self.get_json(&format!("/users/{username}/repos"), &query.pairs())
            .await
    }

    pub async fn commits(
        &self,
        owner: &str,
        repo: &str,
        query: &CommitQuery,
    ) -> Result<Value, GitHubError> {
        self.get_json(&format!("/repos/{owner}/{repo}/commits"), &query.pairs())
            .await
    }

    pub async fn typed_repos(
        &self,
        username: &str,
        query: &RepoQuery,
    ) -> Result<Vec<GitHubRepo>, GitHubError> {
        decode(self.repos(username, query).await?)
    }

    pub async fn typed_commits(
        &self,
        owner: &str,
        repo: &str,
        query: &CommitQuery,
    ) -> Result<Vec<GitHubCommit>, GitHubError> {
        decode(self.commits(owner, repo, query).await?)
    }

    pub async fn closed_pulls(
        &self,
        owner: &str,
        repo: &str,
        per_page: u32,
    ) -> Result<Vec<PullRequest>, GitHubError> {
        let query = [
            ("state", "closed".to_string()),
            ("sort", "updated".to_string()),
            ("direction", "desc".to_string()),
            ("per_page", per_page.to_string()),
        ];
        decode(
            self.get_json(&format!("/repos/{owner}/{repo}/pulls"), &query)
                .await?,
        )
    }

    pub async fn combined_status(
        &self,
        owner: &str,
        repo: &str,
        sha: &str,
    ) -> Result<CombinedStatus, GitHubError> {
        decode(
            self.get_json(&format!("/repos/{owner}/{repo}/commits/{sha}/status"), &[])
                .await?,
        )
    }

    pub async fn check_runs(
        &self,
        owner: &str,
        repo: &str,
        sha: &str,
    ) -> Result<CheckRuns, GitHubError> {
        decode(
            self.get_json(&format!("/repos/{owner}/{repo}/commits/{sha}/check-runs"), &[])
                .await?,
        )
    }

    pub async fn pages(&self, owner: &str, repo: &str) -> Result<PagesSite, GitHubError> {
        decode(
            self.get_json(&format!("/repos/{owner}/{repo}/pages"), &[])
                .await?,
        )
    }

    pub async fn file_exists(&self, owner: &str, repo: &str, path: &str) -> Result<bool, GitHubError> {
        let url = format!("{}/repos/{owner}/{repo}/contents/{path}", self.base_url);
        let response = self.client.get(&url).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(false);
        }
        check_status(&response)?;
        Ok(true)
    }

    pub async fn file_text(&self, owner: &str, repo: &str, path: &str) -> Result<String, GitHubError> {
        self.raw_text(&format!("/repos/{owner}/{repo}/contents/{path}"))
            .await
    }

    pub async fn readme_text(&self, owner: &str, repo: &str) -> Result<String, GitHubError> {
        self.raw_text(&format!("/repos/{owner}/{repo}/readme")).await
    }

    async fn raw_text(&self, path: &str) -> Result<String, GitHubError> {
        let url = format!("{}{path}", self.base_url);
        let response = self
            .client
            .get(&url)
            .header(ACCEPT, RAW_MEDIA_TYPE)
            .send()
            .await?;
        check_status(&response)?;
        Ok(response.text().await?)
    }

    async fn get_json(&self, path: &str, query: &[(&str, String)]) -> Result<Value, GitHubError> {
        let url = format!("{}{path}", self.base_url);
        debug!("GET {url}");
        let response = self.client.get(&url).query(query).send().await?;
        check_status(&response)?;
        response
            .json::<Value>()
            .await
            .map_err(|err| GitHubError::Decode(err.to_string()))
    }
}

fn check_status(response: &reqwest::Response) -> Result<(), GitHubError> {
    let status = response.status();
    if status.is_success() {
        return Ok(());
    }

    Err(GitHubError::Status {
        status,
        rate_limited: rate_limit_exhausted(response.headers()),
    })
}

fn rate_limit_exhausted(headers: &HeaderMap) -> bool {
    headers
        .get("x-ratelimit-remaining")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse::<u64>().ok())
        == Some(0)
}

fn decode<T: DeserializeOwned>(value: Value) -> Result<T, GitHubError> {
    serde_json::from_value(value).map_err(|err| GitHubError::Decode(err.to_string()))
}
