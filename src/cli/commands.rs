//! Command implementations

use anyhow::{Context, Result};
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::app::container::{AppContainer, DefaultAppContainer};
use crate::app::JobEvent;
use crate::cli::args::{ConvertArgs, InspectArgs};
use crate::config_initialization::RuntimeConfig;
use crate::domain::model::{ConversionRequest, JobOutcome};
use crate::output::{stdout_renderer, EventRenderer};

/// Execute the convert command and return how the job ended
pub async fn convert(args: ConvertArgs, runtime: &RuntimeConfig) -> Result<JobOutcome> {
    let config = runtime.encode_config(&args)?;
    let mut request = ConversionRequest::new(&args.input, config);
    if let Some(output) = &args.output {
        request = request.with_output(output);
    }

    let (container, mut events) = DefaultAppContainer::new(&runtime.ffmpeg, &runtime.ffprobe);
    let mut renderer = stdout_renderer(args.json);
    let controller = container.controller();

    let handle = match controller.start_conversion(request).await {
        Ok(handle) => handle,
        Err(e) => {
            // The failed job's events are already queued
            render_pending(&mut events, renderer.as_mut())?;
            return Err(e).context("Conversion could not start");
        }
    };
    info!(job_id = %handle.id(), "Conversion started");

    let cancel = handle.cancellation_token();
    let interrupt = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, cancelling conversion");
            cancel.cancel();
        }
    });

    while let Some(event) = events.recv().await {
        renderer.render_event(&event)?;
        if matches!(event, JobEvent::Completed { .. }) {
            break;
        }
    }
    interrupt.abort();

    Ok(handle.wait().await)
}

/// Execute the inspect command
pub async fn inspect(args: InspectArgs, runtime: &RuntimeConfig) -> Result<()> {
    let (container, _events) = DefaultAppContainer::new(&runtime.ffmpeg, &runtime.ffprobe);
    let selection = container
        .inspect_interactor()
        .select_file(&args.input)
        .await
        .with_context(|| format!("Failed to inspect {}", args.input.display()))?;

    stdout_renderer(args.json).render_selection(&selection)?;
    Ok(())
}

fn render_pending(
    events: &mut mpsc::UnboundedReceiver<JobEvent>,
    renderer: &mut dyn EventRenderer,
) -> Result<()> {
    while let Ok(event) = events.try_recv() {
        renderer.render_event(&event)?;
    }
    Ok(())
}
