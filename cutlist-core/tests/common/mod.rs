// cutlist-core/tests/common/mod.rs

#![allow(dead_code)]

use cutlist_core::config::CoreConfig;
use cutlist_core::engine::mocks::{MockAssetFetcher, MockFfmpegSpawner, MockMediaProbe, sample_audio_info, sample_media_info};
use cutlist_core::pipeline::Pipeline;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub type MockPipeline = Pipeline<MockFfmpegSpawner, MockMediaProbe, MockAssetFetcher>;

pub const SOURCE_BYTES: &[u8] = b"source video bytes";

/// 1x1 transparent PNG.
pub const PIXEL_PNG_BASE64: &str =
    "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNkYPhfDwAChwGA60e6kgAAAABJRU5ErkJggg==";

/// Separate directories for the source, intermediates and renders.
pub struct Workspace {
    pub source_dir: TempDir,
    pub work_dir: TempDir,
    pub output_dir: TempDir,
    pub source: PathBuf,
}

impl Workspace {
    pub fn new() -> Self {
        let source_dir = tempfile::tempdir().expect("source dir");
        let work_dir = tempfile::tempdir().expect("work dir");
        let output_dir = tempfile::tempdir().expect("output dir");
        let source = source_dir.path().join("source.mp4");
        std::fs::write(&source, SOURCE_BYTES).expect("write source");
        Self {
            source_dir,
            work_dir,
            output_dir,
            source,
        }
    }

    pub fn config(&self) -> CoreConfig {
        let mut config = CoreConfig::new(self.output_dir.path().to_path_buf());
        config.work_dir = Some(self.work_dir.path().to_path_buf());
        config
    }

    pub fn pipeline(
        &self,
        spawner: &MockFfmpegSpawner,
        duration_sec: f64,
        with_audio: bool,
    ) -> MockPipeline {
        Pipeline::with_components(
            self.config(),
            spawner.clone(),
            MockMediaProbe::with_default(sample_media_info(duration_sec, with_audio)),
            MockAssetFetcher::new(),
        )
        .expect("valid config")
    }

    /// Pipeline whose source probes as audio only.
    pub fn audio_pipeline(&self, spawner: &MockFfmpegSpawner, duration_sec: f64) -> MockPipeline {
        Pipeline::with_components(
            self.config(),
            spawner.clone(),
            MockMediaProbe::with_default(sample_audio_info(duration_sec)),
            MockAssetFetcher::new(),
        )
        .expect("valid config")
    }

    pub fn work_files(&self) -> Vec<PathBuf> {
        list(self.work_dir.path())
    }

    pub fn output_files(&self) -> Vec<PathBuf> {
        list(self.output_dir.path())
    }
}

pub fn list(dir: &Path) -> Vec<PathBuf> {
    let mut entries: Vec<PathBuf> = std::fs::read_dir(dir)
        .expect("read dir")
        .map(|entry| entry.expect("dir entry").path())
        .collect();
    entries.sort();
    entries
}
