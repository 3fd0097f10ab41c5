use std::path::Path;
use std::sync::Arc;

use tokio::sync::mpsc;

use crate::adapters::{FfmpegAdapter, FfprobeAdapter};
use crate::app::{
    conversion_controller::{ConversionController, JobEvent},
    inspect_interactor::InspectInteractor,
};
use crate::ports::{EncoderPort, ProbePort};

pub trait AppContainer: Send + Sync {
    fn controller(&self) -> Arc<ConversionController>;
    fn inspect_interactor(&self) -> Arc<InspectInteractor>;
}

pub struct DefaultAppContainer {
    controller: Arc<ConversionController>,
    inspect_interactor: Arc<InspectInteractor>,
}

impl DefaultAppContainer {
    /// Wire the ffprobe and ffmpeg adapters found at the given paths
    pub fn new(ffmpeg: &Path, ffprobe: &Path) -> (Self, mpsc::UnboundedReceiver<JobEvent>) {
        Self::with_ports(
            Arc::new(FfprobeAdapter::new(ffprobe)),
            Arc::new(FfmpegAdapter::new(ffmpeg)),
        )
    }

    pub fn with_ports(
        probe_port: Arc<dyn ProbePort>,
        encoder_port: Arc<dyn EncoderPort>,
    ) -> (Self, mpsc::UnboundedReceiver<JobEvent>) {
        let (controller, events) =
            ConversionController::new(Arc::clone(&probe_port), encoder_port);
        let inspect_interactor = Arc::new(InspectInteractor::new(probe_port));

        let container = Self {
            controller: Arc::new(controller),
            inspect_interactor,
        };
        (container, events)
    }
}

impl AppContainer for DefaultAppContainer {
    fn controller(&self) -> Arc<ConversionController> {
        Arc::clone(&self.controller)
    }

    fn inspect_interactor(&self) -> Arc<InspectInteractor> {
        Arc::clone(&self.inspect_interactor)
    }
}
