use crate::models::{Dashboard, DaysWithoutCommits, InactivityRecord, Trend};
use std::fmt::Write;

const CHART_WIDTH: f64 = 720.0;
const CHART_HEIGHT: f64 = 220.0;
const CHART_PAD: f64 = 28.0;
const DAY_OPTIONS: [u32; 4] = [7, 30, 90, 365];

pub fn render_index(
    username: Option<&str>,
    days: u32,
    dashboard: Option<&Dashboard>,
    error: Option<&str>,
) -> String {
    let banner = error
        .map(|message| format!(r#"<p class="status" data-type="error">{}</p>"#, escape(message)))
        .unwrap_or_default();

    let body = dashboard.map(render_dashboard).unwrap_or_else(|| {
        r#"<p class="hint">Enter a GitHub username to see its commit activity.</p>"#.to_string()
    });

    fill(
        INDEX_HTML,
        &[
            ("{{USERNAME}}", escape(username.unwrap_or_default()).as_str()),
            ("{{DAY_OPTIONS}}", day_options(days).as_str()),
            ("{{BANNER}}", banner.as_str()),
            ("{{BODY}}", body.as_str()),
        ],
    )
}

// Substitutes placeholders in one pass, so inserted text is never rescanned.
fn fill(template: &str, values: &[(&str, &str)]) -> String {
    let mut html = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find("{{") {
        html.push_str(&rest[..start]);
        let tail = &rest[start..];
        match values.iter().find(|(name, _)| tail.starts_with(name)) {
            Some((name, value)) => {
                html.push_str(value);
                rest = &tail[name.len()..];
            }
            None => {
                html.push_str("{{");
                rest = &tail[2..];
            }
        }
    }
    html.push_str(rest);
    html
}

fn day_options(selected: u32) -> String {
    let mut html = String::new();
    for days in DAY_OPTIONS {
        let marker = if days == selected { " selected" } else { "" };
        let _ = write!(html, r#"<option value="{days}"{marker}>Last {days} days</option>"#);
    }
    html
}

fn render_dashboard(dashboard: &Dashboard) -> String {
    let chart = &dashboard.chart;
    let total: u32 = chart.repo_stats.iter().map(|stat| stat.total_commits).sum();
    let best_streak = chart
        .repo_stats
        .iter()
        .map(|stat| stat.max_consecutive_days)
        .max()
        .unwrap_or(0);

    let mut html = String::new();
    let _ = write!(
        html,
        r#"<section class="panel">
  <div class="stat"><span class="label">Commits</span><span class="value">{total}</span></div>
  <div class="stat"><span class="label">Active repos</span><span class="value">{}</span></div>
  <div class="stat"><span class="label">Best streak</span><span class="value">{best_streak}d</span></div>
  <div class="stat"><span class="label">Inactive</span><span class="value net">{}</span></div>
</section>"#,
        chart.repo_stats.len(),
        dashboard.inactivity.inactive_repos.len()
    );

    let _ = write!(
        html,
        r#"<section class="chart-card"><h2>Commits per day</h2>{}</section>"#,
        render_chart(&chart.labels, &daily_totals(dashboard))
    );

    html.push_str(r#"<section class="chart-card"><h2>Repositories</h2><table><thead><tr><th>Repository</th><th>Commits</th><th>Peak</th><th>Streak</th><th>Language</th><th>Deployment</th><th>Last merge</th></tr></thead><tbody>"#);
    for stat in &chart.repo_stats {
        let peak = stat
            .max_commits_date
            .as_deref()
            .map(|date| format!("{} on {}", stat.max_commits, escape(date)))
            .unwrap_or_else(|| "-".to_string());
        let deployment = match (&stat.deployment.platform, &stat.deployment.url) {
            (Some(platform), Some(url)) => {
                format!(r#"<a href="{}">{}</a>"#, escape(url), escape(platform))
            }
            (Some(platform), None) => escape(platform),
            _ => "not deployed".to_string(),
        };
        let merge = format!("{:?}", stat.merge_status.last_merge_status).to_lowercase();
        let _ = write!(
            html,
            r#"<tr><td><span class="swatch" style="background:{}"></span>{}</td><td>{}</td><td>{peak}</td><td>{}d</td><td>{}</td><td>{deployment}</td><td>{merge}</td></tr>"#,
            escape(&stat.color),
            escape(&stat.name),
            stat.total_commits,
            stat.max_consecutive_days,
            escape(stat.language.as_deref().unwrap_or("-")),
        );
    }
    html.push_str("</tbody></table></section>");

    if !dashboard.activity.is_empty() {
        html.push_str(r#"<section class="chart-card"><h2>Today vs yesterday</h2><ul>"#);
        for change in &dashboard.activity {
            let arrow = match change.trend {
                Trend::Up => "&#9650;",
                Trend::Down => "&#9660;",
                Trend::Same => "&#9644;",
            };
            let _ = write!(
                html,
                "<li>{arrow} {}: {} today, {} yesterday ({:+})</li>",
                escape(&change.repo_name),
                change.today,
                change.yesterday,
                change.change
            );
        }
        html.push_str("</ul></section>");
    }

    html.push_str(&render_inactivity("Inactive repositories", &dashboard.inactivity.inactive_repos));
    html.push_str(&render_inactivity("Quiet for 15+ days", &dashboard.inactivity.repos_15_days));
    html
}

fn render_inactivity(title: &str, records: &[InactivityRecord]) -> String {
    if records.is_empty() {
        return String::new();
    }
    let mut html = format!(r#"<section class="chart-card"><h2>{title}</h2><ul>"#);
    for record in records {
        let days = match record.days_without_commits {
            DaysWithoutCommits::Days(days) => format!("{days} days without commits"),
            DaysWithoutCommits::Unknown => "no commit date".to_string(),
        };
        let _ = write!(
            html,
            "<li><strong>{}</strong>: {} ({days})</li>",
            escape(&record.repo_name),
            record.reason.label()
        );
    }
    html.push_str("</ul></section>");
    html
}

fn daily_totals(dashboard: &Dashboard) -> Vec<u32> {
    let mut totals = vec![0u32; dashboard.chart.labels.len()];
    for dataset in &dashboard.chart.datasets {
        for (total, count) in totals.iter_mut().zip(&dataset.data) {
            *total = total.saturating_add(*count);
        }
    }
    totals
}

fn render_chart(labels: &[String], values: &[u32]) -> String {
    if values.is_empty() {
        return r#"<p class="hint">No data.</p>"#.to_string();
    }

    let max = values.iter().copied().max().unwrap_or(0).max(1);
    let step = if values.len() > 1 {
        (CHART_WIDTH - 2.0 * CHART_PAD) / (values.len() - 1) as f64
    } else {
        0.0
    };
    let plot_height = CHART_HEIGHT - 2.0 * CHART_PAD;

    let points: Vec<(f64, f64)> = values
        .iter()
        .enumerate()
        .map(|(i, value)| {
            let x = CHART_PAD + step * i as f64;
            let y = CHART_HEIGHT - CHART_PAD - plot_height * f64::from(*value) / f64::from(max);
            (x, y)
        })
        .collect();

    let mut svg = format!(
        r#"<svg id="chart" viewBox="0 0 {CHART_WIDTH} {CHART_HEIGHT}" role="img"><line class="chart-axis" x1="{CHART_PAD}" y1="{base}" x2="{end}" y2="{base}"/>"#,
        base = CHART_HEIGHT - CHART_PAD,
        end = CHART_WIDTH - CHART_PAD
    );

    let path: Vec<String> = points.iter().map(|(x, y)| format!("{x:.1},{y:.1}")).collect();
    let _ = write!(svg, r#"<polyline class="chart-line" points="{}"/>"#, path.join(" "));

    let label_every = (labels.len() / 7).max(1);
    for (i, (x, y)) in points.iter().enumerate() {
        let _ = write!(
            svg,
            r#"<circle class="chart-point" cx="{x:.1}" cy="{y:.1}" r="3"><title>{}: {}</title></circle>"#,
            labels.get(i).map(String::as_str).unwrap_or_default(),
            values[i]
        );
        if i % label_every == 0 {
            if let Some(label) = labels.get(i) {
                let _ = write!(
                    svg,
                    r#"<text class="chart-label" x="{x:.1}" y="{}" text-anchor="middle">{}</text>"#,
                    CHART_HEIGHT - 8.0,
                    label.get(5..).unwrap_or(label)
                );
            }
        }
    }
    svg.push_str("</svg>");
    svg
}

fn escape(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <meta http-equiv="refresh" content="3600" />
  <title>GitHub Pulse</title>
  <style>
    :root {
      --bg-1: #f8f3e6;
      --ink: #2b2a28;
      --accent: #ff6b4a;
      --accent-2: #2f4858;
      --card: rgba(255, 255, 255, 0.86);
      --shadow: 0 24px 60px rgba(47, 72, 88, 0.18);
    }

    * { box-sizing: border-box; }

    body {
      margin: 0;
      min-height: 100vh;
      background: linear-gradient(135deg, var(--bg-1), #ffe9d4 60%, #f9f2e9 100%);
      color: var(--ink);
      font-family: "Space Grotesk", "Trebuchet MS", sans-serif;
      display: grid;
      place-items: center;
      padding: 32px 18px 48px;
    }

    .app {
      width: min(980px, 100%);
      background: var(--card);
      border-radius: 28px;
      box-shadow: var(--shadow);
      padding: 36px;
      display: grid;
      gap: 24px;
    }

    h1 { margin: 0; font-family: "Fraunces", "Georgia", serif; }
    h2 { margin: 0 0 12px; font-size: 1.2rem; }

    form { display: flex; flex-wrap: wrap; gap: 12px; }
    input, select, button { font: inherit; padding: 10px 14px; border-radius: 999px; border: 1px solid rgba(47, 72, 88, 0.2); }
    button { background: var(--accent); color: white; border: none; font-weight: 600; cursor: pointer; }

    .panel { display: grid; grid-template-columns: repeat(auto-fit, minmax(160px, 1fr)); gap: 16px; }
    .stat { background: white; border-radius: 18px; padding: 18px; display: grid; gap: 8px; }
    .stat .label { font-size: 0.8rem; text-transform: uppercase; letter-spacing: 0.12em; color: #8b857d; }
    .stat .value { font-size: 1.6rem; font-weight: 600; color: var(--accent-2); }
    .stat .value.net { color: var(--accent); }

    .chart-card { background: white; border-radius: 20px; padding: 16px; overflow-x: auto; }
    #chart { width: 100%; height: 240px; display: block; }
    .chart-line { fill: none; stroke: var(--accent); stroke-width: 3; }
    .chart-point { fill: white; stroke: var(--accent); stroke-width: 2; }
    .chart-axis { stroke: rgba(47, 72, 88, 0.25); stroke-dasharray: 4 6; }
    .chart-label { fill: #7a746d; font-size: 11px; }

    table { width: 100%; border-collapse: collapse; font-size: 0.9rem; }
    th, td { text-align: left; padding: 8px; border-bottom: 1px solid rgba(47, 72, 88, 0.08); }
    .swatch { display: inline-block; width: 10px; height: 10px; border-radius: 50%; margin-right: 8px; }

    .status[data-type="error"] { color: #c63b2b; font-weight: 600; }
    .hint { margin: 0; color: #6f6a65; }
  </style>
</head>
<body>
  <main class="app">
    <header>
      <h1>GitHub Pulse</h1>
      <p class="hint">Commit activity, quiet repositories and deployment hints for one account.</p>
    </header>
    <form method="get" action="/">
      <input name="username" placeholder="GitHub username" value="{{USERNAME}}" required />
      <select name="days">{{DAY_OPTIONS}}</select>
      <button type="submit">Load</button>
      <button type="submit" name="refresh" value="true">Refresh</button>
    </form>
    {{BANNER}}
    {{BODY}}
  </main>
</body>
</html>
"#;
