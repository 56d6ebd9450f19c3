use crate::github::GitHubClient;
use crate::models::{DeploymentStatus, MergeOutcome, MergeStatus, RepoStatus};
use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;
use tracing::debug;

const RECENT_PULLS: u32 = 5;
const FAILURE_SAMPLE_PULLS: u32 = 20;

const DEPLOY_CONFIG_FILES: [(&str, &str); 5] = [
    ("vercel.json", "Vercel"),
    ("netlify.toml", "Netlify"),
    ("heroku.yml", "Heroku"),
    ("render.yaml", "Render"),
    ("railway.json", "Railway"),
];

const HOST_PLATFORMS: [(&str, &str); 10] = [
    ("vercel.app", "Vercel"),
    ("netlify.app", "Netlify"),
    ("github.io", "GitHub Pages"),
    ("herokuapp.com", "Heroku"),
    ("onrender.com", "Render"),
    ("railway.app", "Railway"),
    ("pages.dev", "Cloudflare Pages"),
    ("web.app", "Firebase"),
    ("firebaseapp.com", "Firebase"),
    ("surge.sh", "Surge"),
];

const SCRIPT_PLATFORMS: [(&str, &str); 6] = [
    ("gh-pages", "GitHub Pages"),
    ("vercel", "Vercel"),
    ("netlify", "Netlify"),
    ("firebase", "Firebase"),
    ("heroku", "Heroku"),
    ("surge", "Surge"),
];

const FAILED_CONCLUSIONS: [&str; 2] = ["failure", "timed_out"];
const FAILED_STATES: [&str; 2] = ["failure", "error"];

static DEPLOY_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"https?://[A-Za-z0-9.-]+\.(?:vercel\.app|netlify\.app|github\.io|herokuapp\.com|onrender\.com|railway\.app|pages\.dev|web\.app|firebaseapp\.com|surge\.sh)(?:/[^\s)\]"'<>]*)?"#,
    )
    .unwrap_or_else(|err| panic!("deployment URL pattern is invalid: {err}"))
});

#[derive(Debug, Clone)]
pub struct StatusProbe {
    client: GitHubClient,
}

impl StatusProbe {
    pub fn new(client: GitHubClient) -> Self {
        Self { client }
    }

    pub async fn probe(&self, owner: &str, repo: &str) -> RepoStatus {
        let (deployment, merge_status) =
            tokio::join!(self.probe_deployment(owner, repo), self.probe_merge(owner, repo));
        RepoStatus {
            deployment,
            merge_status,
        }
    }

    // Pages, then config files, then package.json scripts, then the README. First hit wins.
    pub async fn probe_deployment(&self, owner: &str, repo: &str) -> DeploymentStatus {
        match self.client.pages(owner, repo).await {
            Ok(site) if site.status.as_deref() == Some("built") => {
                return deployed("GitHub Pages", site.html_url);
            }
            Ok(_) => {}
            Err(err) => debug!("{owner}/{repo}: pages probe failed: {err}"),
        }

        for (file, platform) in DEPLOY_CONFIG_FILES {
            match self.client.file_exists(owner, repo, file).await {
                Ok(true) => return deployed(platform, None),
                Ok(false) => {}
                Err(err) => debug!("{owner}/{repo}: {file} probe failed: {err}"),
            }
        }

        match self.client.file_text(owner, repo, "package.json").await {
            Ok(text) => {
                if let Some(platform) = deploy_script_platform(&text) {
                    return deployed(platform, None);
                }
            }
            Err(err) => debug!("{owner}/{repo}: package.json probe failed: {err}"),
        }

        match self.client.readme_text(owner, repo).await {
            Ok(text) => {
                if let Some((platform, url)) = find_deployment_url(&text) {
                    return deployed(platform, Some(url));
                }
            }
            Err(err) => debug!("{owner}/{repo}: README probe failed: {err}"),
        }

        DeploymentStatus::default()
    }

    pub async fn probe_merge(&self, owner: &str, repo: &str) -> MergeStatus {
        let mut status = MergeStatus::default();

        match self.client.closed_pulls(owner, repo, RECENT_PULLS).await {
            Ok(pulls) => {
                let last_merged = pulls
                    .iter()
                    .filter(|pull| pull.merged_at.is_some())
                    .max_by_key(|pull| pull.merged_at);

                if let Some(pull) = last_merged {
                    status.last_merged_at = pull.merged_at;
                    status.last_merged_pr = Some(pull.number);
                    status.last_merged_title = Some(pull.title.clone());
                    status.last_merge_status = match pull.merge_commit_sha.as_deref() {
                        Some(sha) => self.merge_commit_outcome(owner, repo, sha).await,
                        None => MergeOutcome::Success,
                    };
                }
            }
            Err(err) => debug!("{owner}/{repo}: pull request probe failed: {err}"),
        }

        match self.client.closed_pulls(owner, repo, FAILURE_SAMPLE_PULLS).await {
            Ok(pulls) => {
                let unmerged = pulls.iter().filter(|pull| pull.merged_at.is_none()).count();
                status.failed_count = u32::try_from(unmerged).unwrap_or(u32::MAX);
            }
            Err(err) => debug!("{owner}/{repo}: failure sample probe failed: {err}"),
        }

        status
    }

    // A status or check-run we cannot read counts as passing.
    async fn merge_commit_outcome(&self, owner: &str, repo: &str, sha: &str) -> MergeOutcome {
        let (combined, runs) = tokio::join!(
            self.client.combined_status(owner, repo, sha),
            self.client.check_runs(owner, repo, sha)
        );

        let status_failed = combined
            .map(|combined| FAILED_STATES.contains(&combined.state.as_str()))
            .unwrap_or(false);

        let checks_failed = runs
            .map(|runs| {
                runs.check_runs.iter().any(|run| {
                    run.conclusion
                        .as_deref()
                        .is_some_and(|conclusion| FAILED_CONCLUSIONS.contains(&conclusion))
                })
            })
            .unwrap_or(false);

        if status_failed || checks_failed {
            MergeOutcome::Failed
        } else {
            MergeOutcome::Success
        }
    }
}

fn deployed(platform: &str, url: Option<String>) -> DeploymentStatus {
    DeploymentStatus {
        is_deployed: true,
        platform: Some(platform.to_string()),
        url,
    }
}

pub fn deploy_script_platform(package_json: &str) -> Option<&'static str> {
    let manifest: Value = serde_json::from_str(package_json).ok()?;
    let scripts = manifest.get("scripts")?.as_object()?;

    let mut found = None;
    for (name, command) in scripts {
        let name = name.to_lowercase();
        let command = command.as_str().unwrap_or_default().to_lowercase();
        let by_command = SCRIPT_PLATFORMS
            .iter()
            .find(|(needle, _)| command.contains(needle))
            .map(|(_, platform)| *platform);

        let deploy_like = name.contains("deploy") || command.contains("deploy");
        if let Some(platform) = by_command.filter(|_| deploy_like) {
            return Some(platform);
        }
        if name.contains("deploy") && found.is_none() {
            found = Some(by_command.unwrap_or("Custom deploy script"));
        }
    }
    found
}

pub fn find_deployment_url(readme: &str) -> Option<(&'static str, String)> {
    let url = DEPLOY_URL.find(readme)?.as_str().trim_end_matches(['.', ',']);
    let host = url.split("://").nth(1)?.split('/').next()?;
    let platform = HOST_PLATFORMS
        .iter()
        .find(|(suffix, _)| host.ends_with(suffix))
        .map(|(_, platform)| *platform)?;
    Some((platform, url.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deploy_script_with_known_tool_names_platform() {
        let manifest = r#"{ "scripts": { "build": "vite build", "deploy": "gh-pages -d dist" } }"#;
        assert_eq!(deploy_script_platform(manifest), Some("GitHub Pages"));
    }

    #[test]
    fn deploy_script_with_unknown_tool_is_custom() {
        let manifest = r#"{ "scripts": { "deploy": "./ship.sh" } }"#;
        assert_eq!(deploy_script_platform(manifest), Some("Custom deploy script"));
    }

    #[test]
    fn manifest_without_deploy_scripts_is_not_deployed() {
        let manifest = r#"{ "scripts": { "build": "vercel build" } }"#;
        assert_eq!(deploy_script_platform(manifest), None);
        assert_eq!(deploy_script_platform("not json"), None);
        assert_eq!(deploy_script_platform(r#"{ "name": "x" }"#), None);
    }

    #[test]
    fn readme_url_is_found_with_platform() {
        let readme = "# Demo\n\nLive at https://demo-app.vercel.app/dashboard.\n";
        assert_eq!(
            find_deployment_url(readme),
            Some(("Vercel", "https://demo-app.vercel.app/dashboard".to_string()))
        );
    }

    #[test]
    fn readme_without_hosted_url_has_no_deployment() {
        assert_eq!(find_deployment_url("See https://example.com for docs"), None);
        assert_eq!(
            find_deployment_url("[site](https://octocat.github.io)").map(|(p, _)| p),
            Some("GitHub Pages")
        );
    }
}
