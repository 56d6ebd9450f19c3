use crate::models::{ActivityChange, RepoCommitWindow, Trend};
use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};

const PALETTE: [&str; 10] = [
    "#ff6b4a", "#2f4858", "#33658a", "#86bbd8", "#f6ae2d", "#f26419", "#55a630", "#9d4edd",
    "#e63946", "#457b9d",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub labels: Vec<String>,
}

impl DayWindow {
    pub fn ending_at(today: NaiveDate, days: u32) -> Self {
        let days = days.max(1);
        let start = today - Duration::days(i64::from(days) - 1);
        let labels = (0..days)
            .map(|offset| date_key(start + Duration::days(i64::from(offset))))
            .collect();

        Self {
            start,
            end: today,
            labels,
        }
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn index_of(&self, date: NaiveDate) -> Option<usize> {
        if date < self.start || date > self.end {
            return None;
        }
        usize::try_from((date - self.start).num_days()).ok()
    }

    pub fn since(&self) -> DateTime<Utc> {
        self.start.and_time(NaiveTime::MIN).and_utc()
    }
}

pub fn bucket_commits<I>(window: &DayWindow, dates: I) -> Vec<u32>
where
    I: IntoIterator<Item = DateTime<Utc>>,
{
    let mut counts = vec![0u32; window.len()];
    for date in dates {
        if let Some(index) = window.index_of(date.date_naive()) {
            counts[index] = counts[index].saturating_add(1);
        }
    }
    counts
}

pub fn max_consecutive_days(counts: &[u32]) -> u32 {
    let mut best = 0u32;
    let mut current = 0u32;
    for &count in counts {
        if count > 0 {
            current += 1;
            best = best.max(current);
        } else {
            current = 0;
        }
    }
    best
}

// Index and value of the busiest day. Ties keep the earliest day; an all-zero series has no peak.
pub fn peak(counts: &[u32]) -> Option<(usize, u32)> {
    let mut best: Option<(usize, u32)> = None;
    for (index, &count) in counts.iter().enumerate() {
        if count == 0 {
            continue;
        }
        match best {
            Some((_, max)) if count <= max => {}
            _ => best = Some((index, count)),
        }
    }
    best
}

pub fn activity_changes(windows: &[RepoCommitWindow]) -> Vec<ActivityChange> {
    windows
        .iter()
        .filter_map(|window| {
            let today = window.daily_counts.last().copied().unwrap_or(0);
            let yesterday = window
                .daily_counts
                .len()
                .checked_sub(2)
                .and_then(|index| window.daily_counts.get(index))
                .copied()
                .unwrap_or(0);

            if today == 0 && yesterday == 0 {
                return None;
            }

            let change = i64::from(today) - i64::from(yesterday);
            let trend = match change {
                c if c > 0 => Trend::Up,
                c if c < 0 => Trend::Down,
                _ => Trend::Same,
            };

            Some(ActivityChange {
                repo_name: window.repo_name.clone(),
                today,
                yesterday,
                change,
                trend,
            })
        })
        .collect()
}

pub fn color_for(index: usize) -> String {
    PALETTE[index % PALETTE.len()].to_string()
}

pub fn date_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn window_for(name: &str, counts: Vec<u32>) -> RepoCommitWindow {
        let end = NaiveDate::from_ymd_opt(2026, 1, 5).unwrap();
        RepoCommitWindow {
            repo_name: name.to_string(),
            start_date: end - Duration::days(counts.len() as i64 - 1),
            end_date: end,
            daily_counts: counts,
        }
    }

    #[test]
    fn window_has_one_label_per_day() {
        let today = NaiveDate::from_ymd_opt(2026, 1, 5).unwrap();
        let window = DayWindow::ending_at(today, 7);
        assert_eq!(window.len(), 7);
        assert_eq!(window.labels.first().unwrap(), "2025-12-30");
        assert_eq!(window.labels.last().unwrap(), "2026-01-05");
        assert_eq!(window.index_of(today), Some(6));
        assert_eq!(window.index_of(today + Duration::days(1)), None);
        assert_eq!(window.index_of(window.start - Duration::days(1)), None);
    }

    #[test]
    fn zero_day_window_is_widened() {
        let today = NaiveDate::from_ymd_opt(2026, 1, 5).unwrap();
        assert_eq!(DayWindow::ending_at(today, 0).len(), 1);
    }

    #[test]
    fn buckets_sum_to_in_window_commits() {
        let today = NaiveDate::from_ymd_opt(2026, 1, 5).unwrap();
        let window = DayWindow::ending_at(today, 7);
        let dates = vec![
            Utc.with_ymd_and_hms(2026, 1, 5, 23, 59, 0).unwrap(),
            Utc.with_ymd_and_hms(2026, 1, 5, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2025, 12, 30, 12, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2025, 12, 29, 12, 0, 0).unwrap(),
        ];
        let counts = bucket_commits(&window, dates);
        assert_eq!(counts.len(), 7);
        assert_eq!(counts, vec![1, 0, 0, 0, 0, 0, 2]);
        assert_eq!(counts.iter().sum::<u32>(), 3);
    }

    #[test]
    fn streak_is_longest_non_zero_run() {
        assert_eq!(max_consecutive_days(&[1, 1, 0, 1, 1, 1, 0]), 3);
        assert_eq!(max_consecutive_days(&[0, 0, 0]), 0);
        assert_eq!(max_consecutive_days(&[]), 0);
        assert_eq!(max_consecutive_days(&[2, 5, 1]), 3);
    }

    #[test]
    fn peak_keeps_first_of_ties() {
        assert_eq!(peak(&[0, 3, 1, 3]), Some((1, 3)));
        assert_eq!(peak(&[0, 0]), None);
        assert_eq!(peak(&[1, 4, 4, 2]), Some((1, 4)));
    }

    #[test]
    fn activity_changes_skip_quiet_repositories() {
        let windows = vec![
            window_for("busy", vec![0, 1, 3]),
            window_for("quiet", vec![5, 0, 0]),
        ];
        let changes = activity_changes(&windows);
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].repo_name, "busy");
        assert_eq!(changes[0].change, 2);
        assert_eq!(changes[0].trend, Trend::Up);
    }

    #[test]
    fn activity_changes_report_drops_and_flat_days() {
        let windows = vec![
            window_for("down", vec![4, 1]),
            window_for("flat", vec![2, 2]),
            window_for("single", vec![1]),
        ];
        let changes = activity_changes(&windows);
        assert_eq!(changes[0].trend, Trend::Down);
        assert_eq!(changes[0].change, -3);
        assert_eq!(changes[1].trend, Trend::Same);
        assert_eq!(changes[2].yesterday, 0);
        assert_eq!(changes[2].trend, Trend::Up);
    }

    #[test]
    fn colors_cycle_through_palette() {
        assert_eq!(color_for(0), color_for(PALETTE.len()));
        assert_ne!(color_for(0), color_for(1));
    }
}
