use crate::github::{CommitQuery, GitHubClient, GitHubCommit, GitHubError, GitHubRepo, RepoQuery};
use crate::models::{ChartData, Dataset, RecentCommit, RepoCommitWindow, RepoStat, RepoStatus};
use crate::repo_status::StatusProbe;
use crate::stats::{self, DayWindow};
use chrono::{DateTime, SecondsFormat, Utc};
use futures::future::join_all;
use tracing::{info, warn};

pub const PAGE_SIZE: u32 = 100;
pub const MAX_PAGES: u32 = 3;
pub const RECENT_COMMITS: usize = 5;
pub const DEFAULT_REPO_CAP: u32 = 8;
pub const YEARLY_REPO_CAP: u32 = 20;
pub const YEARLY_DAYS: u32 = 365;

pub fn repo_cap(days: u32) -> u32 {
    if days >= YEARLY_DAYS {
        YEARLY_REPO_CAP
    } else {
        DEFAULT_REPO_CAP
    }
}

#[derive(Debug, Clone)]
pub struct Aggregator {
    client: GitHubClient,
    probe: StatusProbe,
}

impl Aggregator {
    pub fn new(client: GitHubClient) -> Self {
        let probe = StatusProbe::new(client.clone());
        Self { client, probe }
    }

    pub async fn load_activity(
        &self,
        username: &str,
        days: u32,
        now: DateTime<Utc>,
    ) -> Result<ChartData, GitHubError> {
        let window = DayWindow::ending_at(now.date_naive(), days);
        let repos = self
            .client
            .typed_repos(username, &RepoQuery::recently_updated(repo_cap(days)))
            .await?;

        info!(
            "aggregating {} repositories for {username} over {} days",
            repos.len(),
            window.len()
        );

        let results = join_all(
            repos
                .iter()
                .enumerate()
                .map(|(index, repo)| self.process_repo_commits(username, repo, index, &window, now)),
        )
        .await;

        let mut chart = ChartData {
            username: username.to_string(),
            days: u32::try_from(window.len()).unwrap_or(days),
            labels: window.labels.clone(),
            datasets: Vec::new(),
            repo_stats: Vec::new(),
            windows: Vec::new(),
        };

        for (commit_window, stat) in results.into_iter().flatten() {
            if stat.total_commits == 0 {
                continue;
            }
            chart.datasets.push(Dataset {
                label: stat.name.clone(),
                data: commit_window.daily_counts.clone(),
                color: stat.color.clone(),
            });
            chart.windows.push(commit_window);
            chart.repo_stats.push(stat);
        }

        Ok(chart)
    }

    // `None` when not even the first page of commits could be read.
    pub async fn process_repo_commits(
        &self,
        username: &str,
        repo: &GitHubRepo,
        index: usize,
        window: &DayWindow,
        now: DateTime<Utc>,
    ) -> Option<(RepoCommitWindow, RepoStat)> {
        let (commits, status) = tokio::join!(
            self.fetch_window_commits(username, &repo.name, window, now),
            self.probe.probe(username, &repo.name)
        );

        let commits = commits?;
        Some(summarize(repo, index, window, &commits, status))
    }

    async fn fetch_window_commits(
        &self,
        owner: &str,
        repo: &str,
        window: &DayWindow,
        now: DateTime<Utc>,
    ) -> Option<Vec<GitHubCommit>> {
        let mut commits = Vec::new();

        for page in 1..=MAX_PAGES {
            let query = CommitQuery {
                since: Some(window.since().to_rfc3339_opts(SecondsFormat::Secs, true)),
                until: Some(now.to_rfc3339_opts(SecondsFormat::Secs, true)),
                per_page: Some(PAGE_SIZE),
                page: Some(page),
            };

            match self.client.typed_commits(owner, repo, &query).await {
                Ok(batch) => {
                    let short_page = batch.len() < PAGE_SIZE as usize;
                    commits.extend(batch);
                    if short_page {
                        break;
                    }
                }
                Err(err) if page == 1 => {
                    warn!("{owner}/{repo}: skipping repository, commits unavailable: {err}");
                    return None;
                }
                Err(err) => {
                    warn!("{owner}/{repo}: stopping at page {page}: {err}");
                    break;
                }
            }
        }

        Some(commits)
    }
}

pub fn summarize(
    repo: &GitHubRepo,
    index: usize,
    window: &DayWindow,
    commits: &[GitHubCommit],
    status: RepoStatus,
) -> (RepoCommitWindow, RepoStat) {
    let dated: Vec<(&GitHubCommit, DateTime<Utc>)> = commits
        .iter()
        .filter_map(|commit| commit.author_date().map(|date| (commit, date)))
        .filter(|(_, date)| window.index_of(date.date_naive()).is_some())
        .collect();

    let daily_counts = stats::bucket_commits(window, dated.iter().map(|(_, date)| *date));
    let total_commits = daily_counts.iter().sum();
    let peak = stats::peak(&daily_counts);

    let mut recent: Vec<&(&GitHubCommit, DateTime<Utc>)> = dated.iter().collect();
    recent.sort_by(|a, b| b.1.cmp(&a.1));
    let last_commit_date = recent.first().map(|(_, date)| *date);
    let recent_commits = recent
        .into_iter()
        .take(RECENT_COMMITS)
        .map(|(commit, date)| RecentCommit {
            sha: commit.sha.clone(),
            message: commit.commit.message.lines().next().unwrap_or_default().to_string(),
            author: commit.commit.author.as_ref().and_then(|author| author.name.clone()),
            date: *date,
            url: commit.html_url.clone(),
        })
        .collect();

    let stat = RepoStat {
        name: repo.name.clone(),
        total_commits,
        max_commits: peak.map(|(_, count)| count).unwrap_or(0),
        max_commits_date: peak.map(|(day, _)| window.labels[day].clone()),
        max_consecutive_days: stats::max_consecutive_days(&daily_counts),
        last_commit_date,
        created_at: repo.created_at,
        language: repo.language.clone(),
        stars: repo.stargazers_count,
        forks: repo.forks_count,
        color: stats::color_for(index),
        recent_commits,
        deployment: status.deployment,
        merge_status: status.merge_status,
    };

    let commit_window = RepoCommitWindow {
        repo_name: repo.name.clone(),
        start_date: window.start,
        end_date: window.end,
        daily_counts,
    };

    (commit_window, stat)
}
