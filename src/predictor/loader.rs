//! Model artifact retrieval.
//!
//! An artifact lives either on local disk or behind an HTTPS URL. Downloaded
//! artifacts are sanity-checked before parsing (an HTML error page or a Git
//! LFS pointer must not reach the JSON decoder). Only a download that parses
//! is written to the cache directory, which is consulted before any network
//! access. A cache entry that fails the same checks is removed and fetched
//! again.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use super::surrogate::ModelArtifact;

/// Smallest plausible artifact size (bytes).
const MIN_ARTIFACT_BYTES: usize = 32;

/// User agent sent with artifact downloads.
const USER_AGENT: &str = concat!("alloy-designer/", env!("CARGO_PKG_VERSION"));

/// Artifact loading errors.
#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("Artifact I/O error ({path}): {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Artifact download failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Artifact format error: {0}")]
    Format(String),
    #[error("Artifact shape error: {0}")]
    Shape(String),
}

/// Where an artifact is read from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactSource {
    File(PathBuf),
    Url(String),
}

impl std::fmt::Display for ArtifactSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ArtifactSource::File(p) => write!(f, "{}", p.display()),
            ArtifactSource::Url(u) => f.write_str(u),
        }
    }
}

/// Fetches and decodes model artifacts.
#[derive(Debug, Clone)]
pub struct ArtifactLoader {
    cache_dir: Option<PathBuf>,
    timeout: Duration,
}

impl ArtifactLoader {
    pub fn new(cache_dir: Option<PathBuf>, timeout: Duration) -> Self {
        Self { cache_dir, timeout }
    }

    /// Load and decode the artifact at `source`.
    pub async fn load(&self, source: &ArtifactSource) -> Result<ModelArtifact, ArtifactError> {
        match source {
            ArtifactSource::File(path) => ModelArtifact::from_json(&read_file(path).await?),
            ArtifactSource::Url(url) => self.fetch_cached(url).await,
        }
    }

    async fn fetch_cached(&self, url: &str) -> Result<ModelArtifact, ArtifactError> {
        let cache_path = self.cache_dir.as_ref().map(|dir| dir.join(cache_file_name(url)));

        if let Some(path) = &cache_path {
            if path.exists() {
                match read_cached(path).await {
                    Ok(artifact) => {
                        debug!(path = %path.display(), "Using cached model artifact");
                        return Ok(artifact);
                    }
                    Err(e) => {
                        warn!(path = %path.display(), error = %e, "Discarding unusable cached artifact");
                        if let Err(e) = tokio::fs::remove_file(path).await {
                            warn!(path = %path.display(), error = %e, "Failed to remove cached artifact");
                        }
                    }
                }
            }
        }

        info!(url = %url, "Downloading model artifact");
        let bytes = self.download(url).await?;
        let artifact = ModelArtifact::from_json(&bytes)?;

        if let Some(path) = &cache_path {
            if let Err(e) = write_cache(path, &bytes).await {
                warn!(path = %path.display(), error = %e, "Failed to cache model artifact");
            }
        }
        Ok(artifact)
    }

    async fn download(&self, url: &str) -> Result<Vec<u8>, ArtifactError> {
        let client = reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(USER_AGENT)
            .build()?;
        let resp = client
            .get(url)
            .header(reqwest::header::ACCEPT, "application/json, application/octet-stream")
            .send()
            .await?
            .error_for_status()?;
        let bytes = resp.bytes().await?.to_vec();
        check_artifact_bytes(&bytes)?;
        Ok(bytes)
    }
}

async fn read_file(path: &Path) -> Result<Vec<u8>, ArtifactError> {
    tokio::fs::read(path).await.map_err(|source| ArtifactError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Read a cache entry, applying the same checks as a fresh download.
async fn read_cached(path: &Path) -> Result<ModelArtifact, ArtifactError> {
    let bytes = read_file(path).await?;
    check_artifact_bytes(&bytes)?;
    ModelArtifact::from_json(&bytes)
}

/// Write `bytes` next to `path` and rename into place, so a reader never
/// sees a partial entry.
async fn write_cache(path: &Path, bytes: &[u8]) -> Result<(), ArtifactError> {
    let io_err = |source| ArtifactError::Io {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await.map_err(io_err)?;
    }
    let mut partial = path.as_os_str().to_owned();
    partial.push(format!(".{}.part", std::process::id()));
    let partial = PathBuf::from(partial);

    tokio::fs::write(&partial, bytes).await.map_err(io_err)?;
    if let Err(e) = tokio::fs::rename(&partial, path).await {
        tokio::fs::remove_file(&partial).await.ok();
        return Err(io_err(e));
    }
    Ok(())
}

/// Reject payloads that cannot be a JSON artifact.
pub fn check_artifact_bytes(bytes: &[u8]) -> Result<(), ArtifactError> {
    if bytes.len() < MIN_ARTIFACT_BYTES {
        return Err(ArtifactError::Format(format!(
            "downloaded artifact is unexpectedly small ({} bytes); check the URL or permissions",
            bytes.len()
        )));
    }
    let first = bytes.iter().find(|b| !b.is_ascii_whitespace()).copied();
    if first != Some(b'{') {
        let preview = String::from_utf8_lossy(&bytes[..bytes.len().min(32)]).into_owned();
        return Err(ArtifactError::Format(format!(
            "downloaded content is not a JSON model artifact (starts with {preview:?})"
        )));
    }
    Ok(())
}

/// File name under the cache directory for a given URL.
pub fn cache_file_name(url: &str) -> String {
    let mut name: String = url
        .trim_start_matches("https://")
        .trim_start_matches("http://")
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '.' || c == '-' { c } else { '_' })
        .collect();
    if !name.ends_with(".json") {
        name.push_str(".json");
    }
    name
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_artifact_bytes() {
        assert!(check_artifact_bytes(b"{}").is_err());
        assert!(check_artifact_bytes(b"<!DOCTYPE html><html><body>Not found</body></html>").is_err());
        let ok = br#"  {"kind": "linear", "feature_names": [], "x": 0}"#;
        assert!(check_artifact_bytes(ok).is_ok());
    }

    #[test]
    fn test_cache_file_name() {
        let name = cache_file_name("https://models.example.org/alloy/gp_YS balanced");
        assert_eq!(name, "models.example.org_alloy_gp_YS_balanced.json");
        assert_eq!(cache_file_name("http://h/a.json"), "h_a.json");
    }

    #[tokio::test]
    async fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ys.json");
        std::fs::write(
            &path,
            r#"{"kind":"linear","feature_names":["Mg"],"scaler":{"mean":[0.0],"scale":[1.0]},"coefficients":[10.0],"intercept":100.0}"#,
        )
        .unwrap();

        let loader = ArtifactLoader::new(None, Duration::from_secs(5));
        let artifact = loader.load(&ArtifactSource::File(path)).await.unwrap();
        assert!(matches!(artifact, ModelArtifact::Linear(_)));
    }

    #[tokio::test]
    async fn test_url_served_from_cache_without_network() {
        let dir = tempfile::tempdir().unwrap();
        let url = "https://unreachable.invalid/models/ys.json";
        std::fs::write(
            dir.path().join(cache_file_name(url)),
            r#"{"kind":"linear","feature_names":["Mg"],"scaler":{"mean":[0.0],"scale":[1.0]},"coefficients":[10.0],"intercept":100.0}"#,
        )
        .unwrap();

        let loader = ArtifactLoader::new(Some(dir.path().to_path_buf()), Duration::from_secs(1));
        let artifact = loader.load(&ArtifactSource::Url(url.to_string())).await.unwrap();
        assert!(matches!(artifact, ModelArtifact::Linear(_)));
    }

    #[tokio::test]
    async fn test_corrupt_cache_entry_is_evicted_and_refetched() {
        let dir = tempfile::tempdir().unwrap();
        let url = "https://unreachable.invalid/models/ys.json";
        let cached = dir.path().join(cache_file_name(url));
        // Truncated mid-write
        std::fs::write(
            &cached,
            r#"{"kind":"linear","feature_names":["Mg"],"scaler":{"mean":[0.0],"scale":[1.0]},"coefficients":[10.0"#,
        )
        .unwrap();

        let loader = ArtifactLoader::new(Some(dir.path().to_path_buf()), Duration::from_secs(1));
        let err = loader.load(&ArtifactSource::Url(url.to_string())).await.unwrap_err();
        assert!(matches!(err, ArtifactError::Http(_)), "expected a fetch attempt, got {err:?}");
        assert!(!cached.exists());
    }

    #[tokio::test]
    async fn test_write_cache_leaves_no_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("ys.json");
        write_cache(&path, b"{\"kind\":\"linear\"}").await.unwrap();

        assert_eq!(std::fs::read(&path).unwrap(), b"{\"kind\":\"linear\"}");
        let entries: Vec<_> = std::fs::read_dir(path.parent().unwrap()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }

    #[tokio::test]
    async fn test_missing_file_is_io_error() {
        let loader = ArtifactLoader::new(None, Duration::from_secs(1));
        let err = loader
            .load(&ArtifactSource::File(PathBuf::from("/definitely/not/here.json")))
            .await
            .unwrap_err();
        assert!(matches!(err, ArtifactError::Io { .. }));
    }
}
