// Inspect interactor - probes a picked file for the shell

use std::path::Path;
use std::sync::Arc;

use tracing::info;

use crate::domain::model::FileSelection;
use crate::error::{ConvertError, ConvertResult};
use crate::ports::ProbePort;
use crate::utils::path::{default_output_path, display_name};

/// Interactor behind file selection
pub struct InspectInteractor {
    probe_port: Arc<dyn ProbePort>,
}

impl InspectInteractor {
    pub fn new(probe_port: Arc<dyn ProbePort>) -> Self {
        Self { probe_port }
    }

    /// Probe `path` and describe it the way the shell displays a selection
    pub async fn select_file(&self, path: &Path) -> ConvertResult<FileSelection> {
        if !tokio::fs::try_exists(path).await.unwrap_or(false) {
            return Err(ConvertError::InputMissing {
                path: path.to_path_buf(),
            });
        }

        let media_info = self.probe_port.probe(path).await?;
        info!(
            input = %path.display(),
            duration_seconds = media_info.duration_seconds,
            width = media_info.width,
            height = media_info.height,
            "File selected"
        );

        Ok(FileSelection {
            display_name: display_name(path),
            duration_seconds: media_info.duration_seconds,
            width: media_info.width,
            height: media_info.height,
            suggested_output: default_output_path(path),
        })
    }
}
