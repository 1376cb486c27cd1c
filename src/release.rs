use std::time::Duration;

use anyhow::{Context, Result, anyhow, bail};
use serde::Deserialize;
use tracing::debug;

pub const USER_AGENT: &str = concat!("tspatch/", env!("CARGO_PKG_VERSION"));

/// Which revision of the upstream repository to clone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum RevisionSelector {
    /// A branch or tag name, used verbatim.
    Branch(String),
    /// Tag of the release GitHub marks as latest.
    #[default]
    LatestStable,
    /// Tag of the newest release, stable or not.
    LatestPrerelease,
    /// Tip of the default branch.
    LatestDev,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Release {
    pub tag_name: String,
}

/// Release metadata lookups for the upstream repository.
pub trait ReleaseSource {
    /// The single release marked as latest.
    fn latest_release(&self) -> Result<Release>;
    /// Every release, newest first.
    fn releases(&self) -> Result<Vec<Release>>;
}

/// Turn a selector into the revision passed to `git clone --branch`. `None` means clone the
/// default branch tip. Only the two `Latest*` release variants touch the network.
pub fn resolve(selector: &RevisionSelector, source: &dyn ReleaseSource) -> Result<Option<String>> {
    match selector {
        RevisionSelector::Branch(name) => Ok(Some(name.clone())),
        RevisionSelector::LatestStable => {
            let release = source
                .latest_release()
                .context("resolving latest stable release")?;
            Ok(Some(release.tag_name))
        }
        RevisionSelector::LatestPrerelease => {
            let releases = source.releases().context("resolving latest prerelease")?;
            let newest = releases
                .into_iter()
                .next()
                .ok_or_else(|| anyhow!("release list is empty"))?;
            Ok(Some(newest.tag_name))
        }
        RevisionSelector::LatestDev => Ok(None),
    }
}

/// GitHub REST releases endpoint, e.g. `https://api.github.com/repos/<owner>/<repo>/releases`.
#[derive(Debug, Clone)]
pub struct GithubReleases {
    endpoint: String,
    client: reqwest::blocking::Client,
}

impl GithubReleases {
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .context("creating HTTP client")?;
        Ok(Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn latest_url(&self) -> String {
        format!("{}/latest", self.endpoint)
    }

    pub fn list_url(&self) -> &str {
        &self.endpoint
    }

    fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<T> {
        debug!("GET {}", url);
        let response = self
            .client
            .get(url)
            .header(reqwest::header::ACCEPT, "application/vnd.github+json")
            .send()
            .with_context(|| format!("requesting {}", url))?;

        let status = response.status();
        if !status.is_success() {
            bail!("{} returned status {}", url, status);
        }

        response
            .json()
            .with_context(|| format!("parsing release metadata from {}", url))
    }
}

impl ReleaseSource for GithubReleases {
    fn latest_release(&self) -> Result<Release> {
        self.get_json(&self.latest_url())
    }

    fn releases(&self) -> Result<Vec<Release>> {
        self.get_json(self.list_url())
    }
}
