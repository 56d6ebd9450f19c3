use crate::aggregator::Aggregator;
use crate::cache::{self, TtlCache};
use crate::github::{GitHubClient, GitHubError};
use crate::inactivity::InactivityClassifier;
use crate::loads::{DashboardKey, LoadState, LoadTicket, LoadTracker};
use crate::models::{ChartData, Dashboard, InactivityReport};
use crate::notifications::NotificationCenter;
use crate::stats;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

#[derive(Clone)]
pub struct DashboardService {
    aggregator: Aggregator,
    classifier: InactivityClassifier,
    cache: Arc<TtlCache>,
    loads: Arc<LoadTracker>,
    notifications: NotificationCenter,
}

impl DashboardService {
    pub fn new(
        client: GitHubClient,
        inactivity_delay: Duration,
        cache: Arc<TtlCache>,
        loads: Arc<LoadTracker>,
        notifications: NotificationCenter,
    ) -> Self {
        Self {
            aggregator: Aggregator::new(client.clone()),
            classifier: InactivityClassifier::new(client, inactivity_delay),
            cache,
            loads,
            notifications,
        }
    }

    pub async fn activity(
        &self,
        username: &str,
        days: u32,
        refresh: bool,
    ) -> Result<ChartData, GitHubError> {
        let sequence = self.loads.next_sequence();
        self.fetch_activity(username, days, refresh, sequence).await
    }

    pub async fn inactivity(
        &self,
        username: &str,
        refresh: bool,
    ) -> Result<InactivityReport, GitHubError> {
        let sequence = self.loads.next_sequence();
        self.fetch_inactivity(username, refresh, sequence).await
    }

    async fn fetch_activity(
        &self,
        username: &str,
        days: u32,
        refresh: bool,
        sequence: u64,
    ) -> Result<ChartData, GitHubError> {
        let key = cache::chart_key(username, days);
        if !refresh {
            if let Some(chart) = self.cache.get::<ChartData>(&key, Utc::now()) {
                return Ok(chart);
            }
        }

        let chart = self.aggregator.load_activity(username, days, Utc::now()).await?;
        if !self.cache.put(&key, &chart, sequence, Utc::now()) {
            info!("not caching chart {sequence} for {username}, a newer one is cached");
        }
        Ok(chart)
    }

    async fn fetch_inactivity(
        &self,
        username: &str,
        refresh: bool,
        sequence: u64,
    ) -> Result<InactivityReport, GitHubError> {
        let key = cache::inactivity_key(username);
        if !refresh {
            if let Some(report) = self.cache.get::<InactivityReport>(&key, Utc::now()) {
                return Ok(report);
            }
        }

        let report = self.classifier.scan(username, Utc::now()).await?;
        if !self.cache.put(&key, &report, sequence, Utc::now()) {
            info!("not caching inactivity scan {sequence} for {username}, a newer one is cached");
        }
        if let Err(err) = self
            .notifications
            .inactivity_scanned(username, &report, Utc::now())
            .await
        {
            warn!("could not record inactivity notifications: {}", err.message);
        }
        Ok(report)
    }

    pub async fn load(
        &self,
        username: &str,
        days: u32,
        refresh: bool,
    ) -> Result<Arc<Dashboard>, GitHubError> {
        let ticket = self.loads.begin(DashboardKey::new(username, days), Utc::now());
        self.run_load(username, ticket, refresh).await
    }

    async fn run_load(
        &self,
        username: &str,
        ticket: LoadTicket,
        refresh: bool,
    ) -> Result<Arc<Dashboard>, GitHubError> {
        let days = ticket.key.days;
        let (chart, inactivity) = tokio::join!(
            self.fetch_activity(username, days, refresh, ticket.sequence),
            self.fetch_inactivity(username, refresh, ticket.sequence)
        );

        let inactivity = inactivity.unwrap_or_else(|err| {
            warn!("inactivity scan for {username} failed: {err}");
            InactivityReport::default()
        });

        let outcome = chart.map(|chart| {
            Arc::new(Dashboard {
                sequence: ticket.sequence,
                activity: stats::activity_changes(&chart.windows),
                chart,
                inactivity,
            })
        });

        let recorded = match &outcome {
            Ok(dashboard) => self.loads.complete(&ticket, Ok(Arc::clone(dashboard)), Utc::now()),
            Err(err) => self.loads.complete(&ticket, Err(err.to_string()), Utc::now()),
        };

        if !recorded {
            info!(
                "load {} for {username} superseded by a newer one",
                ticket.sequence
            );
            if let Some(latest) = self.loads.latest(&ticket.key) {
                return Ok(latest);
            }
            return outcome;
        }

        let summary = match &outcome {
            Ok(dashboard) => Ok(dashboard.chart.repo_stats.len()),
            Err(_) => Err("GitHub request failed"),
        };
        if let Err(err) = self
            .notifications
            .load_finished(username, summary, Utc::now())
            .await
        {
            warn!("could not record load notification: {}", err.message);
        }

        outcome
    }

    pub fn status(&self, username: &str, days: u32) -> LoadState {
        self.loads.state(&DashboardKey::new(username, days))
    }

    // Reloads, bypassing the cache, every dashboard whose last load succeeded
    // and that was requested recently. Stops early once GitHub rate limits us.
    pub async fn refresh_all(&self) {
        let dropped = self.loads.prune(Utc::now());
        if dropped > 0 {
            info!("auto-refresh dropped {dropped} failed or idle dashboards");
        }

        for key in self.loads.refreshable_keys() {
            let ticket = self.loads.begin_refresh(key.clone(), Utc::now());
            match self.run_load(&key.username, ticket, true).await {
                Ok(dashboard) => info!(
                    "auto-refreshed {} ({}d): {} repositories",
                    key.username,
                    key.days,
                    dashboard.chart.repo_stats.len()
                ),
                Err(err) if err.is_rate_limited() => {
                    error!("auto-refresh halted, GitHub rate limit reached: {err}");
                    break;
                }
                Err(err) => error!("auto-refresh of {} failed: {err}", key.username),
            }
        }
    }

    pub fn spawn_auto_refresh(self, period: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                self.refresh_all().await;
            }
        })
    }
}
