// ============================================================================
// cutlist-core/src/assets/resolver.rs
// ============================================================================
//
// ASSET RESOLVER: Turning asset references into local files
//
// Overlay executors need a file path for their second ffmpeg input. Local
// paths are used in place. Embedded payloads are decoded, and remote URLs are
// downloaded, into named temp files owned by the returned `ResolvedAsset`;
// dropping it deletes the file, so cleanup holds on every exit path.
//
// KEY COMPONENTS:
// - AssetFetcher: Trait for downloading remote assets
// - HttpAssetFetcher: Blocking reqwest implementation
// - ResolvedAsset: Local path plus the temp file guard, if any
// - resolve_asset: Entry point used by the overlay executors

use super::reference::{AssetReference, AssetRole};
use crate::error::{CoreError, CoreResult};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::{Builder as TempFileBuilder, NamedTempFile};

/// Downloads a remote asset.
pub trait AssetFetcher {
    /// Returns the full body of `url`.
    fn fetch(&self, url: &str) -> CoreResult<Vec<u8>>;
}

/// `AssetFetcher` backed by a blocking reqwest client.
#[derive(Debug, Clone)]
pub struct HttpAssetFetcher {
    client: reqwest::blocking::Client,
}

impl HttpAssetFetcher {
    pub fn new(timeout: Duration) -> CoreResult<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| CoreError::Config(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self { client })
    }
}

impl AssetFetcher for HttpAssetFetcher {
    fn fetch(&self, url: &str) -> CoreResult<Vec<u8>> {
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|e| CoreError::asset(url, format!("Request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(CoreError::asset(url, format!("HTTP {}", response.status())));
        }

        let bytes = response
            .bytes()
            .map_err(|e| CoreError::asset(url, format!("Failed to read response: {e}")))?;
        Ok(bytes.to_vec())
    }
}

/// A local file for an asset reference.
#[derive(Debug)]
pub struct ResolvedAsset {
    path: PathBuf,
    temp: Option<NamedTempFile>,
}

impl ResolvedAsset {
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// True when the file was created by the resolver and is deleted on drop.
    #[must_use]
    pub fn is_owned(&self) -> bool {
        self.temp.is_some()
    }
}

/// Produces a local file for `reference`, writing owned copies into `work_dir`.
pub fn resolve_asset<F: AssetFetcher + ?Sized>(
    reference: &AssetReference,
    role: AssetRole,
    work_dir: &Path,
    fetcher: &F,
) -> CoreResult<ResolvedAsset> {
    match reference {
        AssetReference::LocalPath(path) => {
            if !path.is_file() {
                return Err(CoreError::asset(
                    reference.to_param(),
                    "local file does not exist",
                ));
            }
            log::debug!("Using local asset {}", path.display());
            Ok(ResolvedAsset {
                path: path.clone(),
                temp: None,
            })
        }
        AssetReference::Embedded { payload, .. } => {
            let bytes = STANDARD
                .decode(payload.trim())
                .map_err(|e| CoreError::asset(reference.to_string(), format!("invalid base64 payload: {e}")))?;
            let asset = write_owned(reference, role, work_dir, &bytes)?;
            log::debug!(
                "Decoded {} into {} ({} bytes)",
                reference,
                asset.path.display(),
                bytes.len()
            );
            Ok(asset)
        }
        AssetReference::Remote(url) => {
            log::info!("Downloading asset {url}");
            let bytes = fetcher.fetch(url)?;
            if bytes.is_empty() {
                return Err(CoreError::asset(url.clone(), "download returned no data"));
            }
            let asset = write_owned(reference, role, work_dir, &bytes)?;
            log::debug!("Downloaded {} bytes to {}", bytes.len(), asset.path.display());
            Ok(asset)
        }
    }
}

fn write_owned(
    reference: &AssetReference,
    role: AssetRole,
    work_dir: &Path,
    bytes: &[u8],
) -> CoreResult<ResolvedAsset> {
    let to_asset_error = |e: std::io::Error| CoreError::asset(reference.to_string(), e);

    std::fs::create_dir_all(work_dir).map_err(to_asset_error)?;
    let mut temp = TempFileBuilder::new()
        .prefix("asset_")
        .suffix(&format!(".{}", reference.extension(role)))
        .tempfile_in(work_dir)
        .map_err(to_asset_error)?;
    temp.write_all(bytes).map_err(to_asset_error)?;
    temp.flush().map_err(to_asset_error)?;

    Ok(ResolvedAsset {
        path: temp.path().to_path_buf(),
        temp: Some(temp),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    struct StubFetcher(Vec<u8>);

    impl AssetFetcher for StubFetcher {
        fn fetch(&self, _url: &str) -> CoreResult<Vec<u8>> {
            Ok(self.0.clone())
        }
    }

    struct FailingFetcher;

    impl AssetFetcher for FailingFetcher {
        fn fetch(&self, url: &str) -> CoreResult<Vec<u8>> {
            Err(CoreError::asset(url, "connection refused"))
        }
    }

    #[test]
    fn embedded_payload_is_decoded_and_removed_on_drop() {
        let dir = tempfile::tempdir().unwrap();
        let reference = AssetReference::parse("data:image/png;base64,aGVsbG8=").unwrap();
        let asset = resolve_asset(&reference, AssetRole::Image, dir.path(), &FailingFetcher).unwrap();
        let path = asset.path().to_path_buf();
        assert!(asset.is_owned());
        assert_eq!(std::fs::read(&path).unwrap(), b"hello");
        assert_eq!(path.extension().unwrap(), "png");
        drop(asset);
        assert!(!path.exists());
    }

    #[test]
    fn invalid_base64_is_an_asset_error() {
        let dir = tempfile::tempdir().unwrap();
        let reference = AssetReference::parse("data:image/png;base64,@@@").unwrap();
        let err = resolve_asset(&reference, AssetRole::Image, dir.path(), &FailingFetcher).unwrap_err();
        assert!(matches!(err, CoreError::AssetResolution { .. }));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn remote_assets_use_url_extension() {
        let dir = tempfile::tempdir().unwrap();
        let reference = AssetReference::parse("https://example.com/sfx/boom.wav?sig=1").unwrap();
        let asset = resolve_asset(&reference, AssetRole::Audio, dir.path(), &StubFetcher(b"RIFF".to_vec())).unwrap();
        assert_eq!(asset.path().extension().unwrap(), "wav");
        assert!(asset.path().starts_with(dir.path()));
    }

    #[test]
    fn download_failures_propagate() {
        let dir = tempfile::tempdir().unwrap();
        let reference = AssetReference::parse("https://example.com/a.png").unwrap();
        let err = resolve_asset(&reference, AssetRole::Image, dir.path(), &FailingFetcher).unwrap_err();
        assert!(matches!(err, CoreError::AssetResolution { .. }));
    }

    #[test]
    fn local_paths_are_not_owned() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("logo.png");
        std::fs::write(&file, b"png").unwrap();
        let reference = AssetReference::LocalPath(file.clone());
        let asset = resolve_asset(&reference, AssetRole::Image, dir.path(), &FailingFetcher).unwrap();
        assert!(!asset.is_owned());
        drop(asset);
        assert!(file.exists());

        let missing = AssetReference::LocalPath(dir.path().join("missing.png"));
        assert!(resolve_asset(&missing, AssetRole::Image, dir.path(), &FailingFetcher).is_err());
    }
}
