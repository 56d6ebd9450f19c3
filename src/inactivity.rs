use crate::github::{CommitQuery, GitHubClient, GitHubError, RepoQuery};
use crate::models::{DaysWithoutCommits, InactivityReason, InactivityRecord, InactivityReport};
use axum::http::StatusCode;
use chrono::{DateTime, Duration, SecondsFormat, Utc};
use tracing::{debug, info, warn};

pub const SCAN_REPO_LIMIT: u32 = 100;
pub const LOOKBACK_DAYS: i64 = 30;
pub const INACTIVE_DAYS: i64 = 21;
pub const WARNING_DAYS: i64 = 15;
const COMMIT_PAGE_SIZE: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitProbe {
    Empty,
    NotFound,
    LastCommit(Option<DateTime<Utc>>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bucket {
    Inactive,
    Warning,
}

// First matching rule wins. `None` means the repository is active.
pub fn classify(
    repo_name: &str,
    probe: CommitProbe,
    now: DateTime<Utc>,
) -> Option<(Bucket, InactivityRecord)> {
    let record = |reason, last_commit_date, days_without_commits| InactivityRecord {
        repo_name: repo_name.to_string(),
        reason,
        last_commit_date,
        days_without_commits,
    };

    match probe {
        CommitProbe::Empty => Some((
            Bucket::Inactive,
            record(InactivityReason::Empty, None, DaysWithoutCommits::Unknown),
        )),
        CommitProbe::NotFound => Some((
            Bucket::Inactive,
            record(InactivityReason::NotFound, None, DaysWithoutCommits::Unknown),
        )),
        CommitProbe::LastCommit(None) => Some((
            Bucket::Inactive,
            record(InactivityReason::NoCommits21Days, None, DaysWithoutCommits::Unknown),
        )),
        CommitProbe::LastCommit(Some(last)) => {
            let days = (now - last).num_days();
            let days_without = DaysWithoutCommits::Days(days);
            if days >= INACTIVE_DAYS {
                Some((
                    Bucket::Inactive,
                    record(InactivityReason::NoCommits21Days, Some(last), days_without),
                ))
            } else if days >= WARNING_DAYS {
                Some((
                    Bucket::Warning,
                    record(InactivityReason::NoCommits15Days, Some(last), days_without),
                ))
            } else {
                None
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct InactivityClassifier {
    client: GitHubClient,
    delay: std::time::Duration,
}

impl InactivityClassifier {
    pub fn new(client: GitHubClient, delay: std::time::Duration) -> Self {
        Self { client, delay }
    }

    pub async fn scan(
        &self,
        username: &str,
        now: DateTime<Utc>,
    ) -> Result<InactivityReport, GitHubError> {
        let repos = self
            .client
            .typed_repos(username, &RepoQuery::recently_updated(SCAN_REPO_LIMIT))
            .await?;

        info!("scanning {} repositories of {username} for inactivity", repos.len());

        let query = CommitQuery {
            since: Some(
                (now - Duration::days(LOOKBACK_DAYS)).to_rfc3339_opts(SecondsFormat::Secs, true),
            ),
            until: None,
            per_page: Some(COMMIT_PAGE_SIZE),
            page: Some(1),
        };

        let mut report = InactivityReport::default();
        for (index, repo) in repos.iter().enumerate() {
            if index > 0 && !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }

            let probe = match self.client.typed_commits(username, &repo.name, &query).await {
                Ok(commits) => {
                    CommitProbe::LastCommit(commits.iter().filter_map(|c| c.author_date()).max())
                }
                Err(err) if err.status() == Some(StatusCode::CONFLICT) => CommitProbe::Empty,
                Err(err) if err.status() == Some(StatusCode::NOT_FOUND) => CommitProbe::NotFound,
                Err(err) => {
                    warn!("{username}/{}: skipped in inactivity scan: {err}", repo.name);
                    continue;
                }
            };

            match classify(&repo.name, probe, now) {
                Some((Bucket::Inactive, record)) => report.inactive_repos.push(record),
                Some((Bucket::Warning, record)) => report.repos_15_days.push(record),
                None => debug!("{username}/{}: active", repo.name),
            }
        }

        Ok(report)
    }
}
