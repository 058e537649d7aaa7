//! Release feed resolution
//!
//! The feed is a GitHub-style JSON array of releases, newest first. Feed
//! order is trusted and never re-sorted.

use chrono::{DateTime, Utc};
use reqwest::header::{ACCEPT, USER_AGENT};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use url::Url;

use crate::error::{Result, UpdateError};
use crate::version::SemanticVersion;

/// Media type requested from the feed
pub const FEED_ACCEPT: &str = "application/vnd.github.v3+json";

/// One release entry of the feed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReleaseDescriptor {
    /// Display name of the release
    #[serde(default)]
    pub name: Option<String>,

    /// Release tag (e.g. "v1.2.0")
    pub tag_name: String,

    /// Whether this is a prerelease
    #[serde(default)]
    pub prerelease: bool,

    /// Downloadable files attached to the release
    #[serde(default)]
    pub assets: Vec<AssetDescriptor>,
}

/// Release asset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetDescriptor {
    #[serde(default)]
    pub id: u64,

    /// Asset file name
    pub name: String,

    /// Download URL
    pub browser_download_url: String,

    #[serde(default)]
    pub content_type: Option<String>,

    /// Asset size in bytes
    #[serde(default)]
    pub size: u64,

    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,

    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Outcome of a successful update check
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpdateInfo {
    /// Version of the selected release
    pub version: SemanticVersion,

    /// Version that was running when the check was made
    pub current_version: SemanticVersion,

    /// Download URL of the selected asset
    pub uri: Url,

    /// Asset file name
    pub name: String,

    /// Whether the selected release is a prerelease
    pub is_prerelease: bool,

    /// Name of the release the asset belongs to
    pub release_name: Option<String>,

    /// Advertised asset size in bytes
    pub size: u64,
}

impl UpdateInfo {
    /// `true` if the selected release is newer than the running version
    pub fn is_upgrade(&self) -> bool {
        self.version.is_upgrade(&self.current_version)
    }
}

/// Release selection policy for one check
#[derive(Debug, Clone)]
pub struct UpdateQuery<'a> {
    /// Release asset that carries the program
    pub asset_name: &'a str,

    /// Accept releases flagged as prerelease
    pub allow_prerelease: bool,

    /// Tags that are never selected (case-insensitive)
    pub ignore_tags: &'a [String],

    /// Version currently running
    pub current_version: &'a SemanticVersion,
}

/// Queries the release feed and picks an update candidate
#[derive(Debug, Clone)]
pub struct ReleaseResolver {
    /// Shared HTTP client owned by the engine
    client: reqwest::Client,
}

impl ReleaseResolver {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// Fetch the release list from the feed
    pub async fn fetch_releases(
        &self,
        feed: &Url,
        asset_name: &str,
        current_version: &SemanticVersion,
    ) -> Result<Vec<ReleaseDescriptor>> {
        debug!("Fetching releases from: {}", feed);

        let response = self
            .client
            .get(feed.clone())
            .header(ACCEPT, FEED_ACCEPT)
            .header(USER_AGENT, format!("{}/{}", asset_name, current_version))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(UpdateError::HttpStatus {
                status,
                uri: feed.to_string(),
            });
        }

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| UpdateError::malformed_feed(e.to_string()))
    }

    /// Check the feed for an update.
    ///
    /// Returns `Ok(None)` when no release or asset matches the policy. The
    /// returned info may describe a version that is not newer than the
    /// running one; callers consult [`UpdateInfo::is_upgrade`].
    pub async fn check_for_update(
        &self,
        feed: &Url,
        query: &UpdateQuery<'_>,
    ) -> Result<Option<UpdateInfo>> {
        let releases = self
            .fetch_releases(feed, query.asset_name, query.current_version)
            .await?;

        let info = select_update(&releases, query)?;
        if let Some(info) = &info {
            if info.is_upgrade() {
                info!("Update available: {} -> {}", info.current_version, info.version);
            } else {
                debug!("Already on latest version: {}", info.current_version);
            }
        }

        Ok(info)
    }
}

/// Pick the first eligible release and its matching asset.
///
/// Pure over its inputs: the same feed and policy always select the same
/// release and asset.
pub fn select_update(
    releases: &[ReleaseDescriptor],
    query: &UpdateQuery<'_>,
) -> Result<Option<UpdateInfo>> {
    let Some(release) = releases.iter().find(|r| {
        (query.allow_prerelease || !r.prerelease)
            && !query
                .ignore_tags
                .iter()
                .any(|tag| tag.eq_ignore_ascii_case(&r.tag_name))
    }) else {
        warn!(
            "No eligible release found ({} releases, prerelease allowed: {})",
            releases.len(),
            query.allow_prerelease
        );
        return Ok(None);
    };

    let Some(asset) = release
        .assets
        .iter()
        .find(|a| a.name.eq_ignore_ascii_case(query.asset_name))
    else {
        warn!(
            "Release {} has no asset named {}",
            release.name.as_deref().unwrap_or(&release.tag_name),
            query.asset_name
        );
        return Ok(None);
    };

    let version = SemanticVersion::parse(&release.tag_name)?;
    let uri = Url::parse(&asset.browser_download_url).map_err(|e| {
        UpdateError::malformed_feed(format!(
            "invalid download URL '{}': {}",
            asset.browser_download_url, e
        ))
    })?;

    Ok(Some(UpdateInfo {
        version,
        current_version: query.current_version.clone(),
        uri,
        name: asset.name.clone(),
        is_prerelease: release.prerelease,
        release_name: release.name.clone(),
        size: asset.size,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn release(tag: &str, prerelease: bool, assets: &[&str]) -> ReleaseDescriptor {
        ReleaseDescriptor {
            name: Some(format!("Release {}", tag)),
            tag_name: tag.to_string(),
            prerelease,
            assets: assets
                .iter()
                .enumerate()
                .map(|(i, name)| AssetDescriptor {
                    id: i as u64,
                    name: name.to_string(),
                    browser_download_url: format!("https://example.com/{}/{}", tag, name),
                    content_type: Some("application/octet-stream".to_string()),
                    size: 1024,
                    created_at: None,
                    updated_at: None,
                })
                .collect(),
        }
    }

    fn query<'a>(current: &'a SemanticVersion, ignore: &'a [String]) -> UpdateQuery<'a> {
        UpdateQuery {
            asset_name: "MyApp.exe",
            allow_prerelease: false,
            ignore_tags: ignore,
            current_version: current,
        }
    }

    #[test]
    fn test_selects_first_eligible_release() {
        let current = SemanticVersion::new(1, 0, 0);
        let feed = vec![
            release("v1.2.0-beta", true, &["MyApp.exe"]),
            release("v1.1.0", false, &["MyApp.exe"]),
            release("v1.0.0", false, &["MyApp.exe"]),
        ];

        let info = select_update(&feed, &query(&current, &[])).unwrap().unwrap();
        assert_eq!(info.version, SemanticVersion::new(1, 1, 0));
        assert_eq!(info.uri.as_str(), "https://example.com/v1.1.0/MyApp.exe");
        assert!(info.is_upgrade());
        assert!(!info.is_prerelease);
    }

    #[test]
    fn test_prerelease_allowed() {
        let current = SemanticVersion::new(1, 0, 0);
        let feed = vec![
            release("v1.2.0-beta", true, &["MyApp.exe"]),
            release("v1.1.0", false, &["MyApp.exe"]),
        ];
        let ignore: Vec<String> = Vec::new();
        let q = UpdateQuery {
            allow_prerelease: true,
            ..query(&current, &ignore)
        };

        let info = select_update(&feed, &q).unwrap().unwrap();
        assert_eq!(info.version.prerelease(), Some("beta"));
        assert!(info.is_prerelease);
    }

    #[test]
    fn test_ignored_tags_case_insensitive() {
        let current = SemanticVersion::new(1, 0, 0);
        let ignore = vec!["V1.1.0".to_string()];
        let feed = vec![
            release("v1.1.0", false, &["MyApp.exe"]),
            release("v1.0.5", false, &["MyApp.exe"]),
        ];

        let info = select_update(&feed, &query(&current, &ignore))
            .unwrap()
            .unwrap();
        assert_eq!(info.version, SemanticVersion::new(1, 0, 5));
    }

    #[test]
    fn test_asset_matched_case_insensitively() {
        let current = SemanticVersion::new(1, 0, 0);
        let feed = vec![release("v1.1.0", false, &["notes.txt", "MYAPP.EXE"])];

        let info = select_update(&feed, &query(&current, &[])).unwrap().unwrap();
        assert_eq!(info.name, "MYAPP.EXE");
    }

    #[test]
    fn test_missing_asset_is_not_found() {
        let current = SemanticVersion::new(1, 0, 0);
        // Only the first eligible release is considered
        let feed = vec![
            release("v1.1.0", false, &["Other.exe"]),
            release("v1.0.5", false, &["MyApp.exe"]),
        ];

        assert!(select_update(&feed, &query(&current, &[])).unwrap().is_none());
    }

    #[test]
    fn test_empty_feed_is_not_found() {
        let current = SemanticVersion::new(1, 0, 0);
        assert!(select_update(&[], &query(&current, &[])).unwrap().is_none());
    }

    #[test]
    fn test_unparseable_tag_is_error() {
        let current = SemanticVersion::new(1, 0, 0);
        let feed = vec![release("nightly", false, &["MyApp.exe"])];

        let err = select_update(&feed, &query(&current, &[])).unwrap_err();
        assert!(matches!(err, UpdateError::VersionParse { .. }));
    }

    #[test]
    fn test_not_upgrade_when_current() {
        let current = SemanticVersion::new(1, 1, 0);
        let feed = vec![release("v1.1.0", false, &["MyApp.exe"])];

        let info = select_update(&feed, &query(&current, &[])).unwrap().unwrap();
        assert!(!info.is_upgrade());
    }

    #[test]
    fn test_selection_is_idempotent() {
        let current = SemanticVersion::new(1, 0, 0);
        let feed = vec![
            release("v1.1.0", false, &["MyApp.exe"]),
            release("v1.0.5", false, &["MyApp.exe"]),
        ];

        let first = select_update(&feed, &query(&current, &[])).unwrap();
        let second = select_update(&feed, &query(&current, &[])).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_deserialize_github_payload() {
        let json = r#"[{
            "name": "v1.1.0",
            "tag_name": "v1.1.0",
            "prerelease": false,
            "draft": false,
            "assets": [{
                "id": 42,
                "name": "MyApp.exe",
                "browser_download_url": "https://example.com/MyApp.exe",
                "content_type": "application/x-msdownload",
                "size": 2048,
                "created_at": "2024-05-01T10:00:00Z",
                "updated_at": "2024-05-01T10:05:00Z"
            }]
        }]"#;

        let feed: Vec<ReleaseDescriptor> = serde_json::from_str(json).unwrap();
        assert_eq!(feed.len(), 1);
        assert_eq!(feed[0].assets[0].id, 42);
        assert_eq!(feed[0].assets[0].size, 2048);
        assert!(feed[0].assets[0].created_at.is_some());
    }
}
