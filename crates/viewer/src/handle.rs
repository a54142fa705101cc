//! RendererHandle - runs a renderer in its own worker task behind a bounded queue

use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, instrument, warn};

use contracts::{FrameRenderer, SceneSnapshot};

use crate::metrics::RendererMetrics;

/// Handle to a running renderer worker
pub struct RendererHandle {
    name: String,
    tx: mpsc::Sender<SceneSnapshot>,
    metrics: Arc<RendererMetrics>,
    worker_handle: JoinHandle<()>,
}

impl RendererHandle {
    /// Create a new RendererHandle and spawn the worker task
    pub fn spawn<R: FrameRenderer + Send + 'static>(renderer: R, queue_capacity: usize) -> Self {
        let name = renderer.name().to_string();
        let (tx, rx) = mpsc::channel(queue_capacity.max(1));
        let metrics = Arc::new(RendererMetrics::new());

        let worker_metrics = Arc::clone(&metrics);
        let worker_name = name.clone();

        let worker_handle = tokio::spawn(async move {
            renderer_worker(renderer, rx, worker_metrics, worker_name).await;
        });

        Self {
            name,
            tx,
            metrics,
            worker_handle,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn metrics(&self) -> &Arc<RendererMetrics> {
        &self.metrics
    }

    /// Queue a snapshot (non-blocking)
    ///
    /// Returns true if queued, false if the queue was full (snapshot dropped)
    pub fn try_send(&self, snapshot: SceneSnapshot) -> bool {
        match self.tx.try_send(snapshot) {
            Ok(()) => {
                self.metrics
                    .set_queue_len(self.tx.max_capacity() - self.tx.capacity());
                true
            }
            Err(mpsc::error::TrySendError::Full(s)) => {
                self.metrics.inc_dropped_count();
                observability::record_snapshot_rendered(&self.name, "dropped");
                warn!(renderer = %self.name, tick = s.tick, "Queue full, snapshot dropped");
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                error!(renderer = %self.name, "Renderer worker closed unexpectedly");
                false
            }
        }
    }

    /// Close the queue and wait for the worker to drain it
    #[instrument(name = "renderer_handle_shutdown", skip(self), fields(renderer = %self.name))]
    pub async fn shutdown(self) {
        drop(self.tx);
        if let Err(e) = self.worker_handle.await {
            error!(renderer = %self.name, error = ?e, "Worker task panicked");
        }
        debug!(renderer = %self.name, "RendererHandle shutdown complete");
    }
}

#[instrument(
    name = "renderer_worker_loop",
    skip(renderer, rx, metrics),
    fields(renderer = %name)
)]
async fn renderer_worker<R: FrameRenderer>(
    mut renderer: R,
    mut rx: mpsc::Receiver<SceneSnapshot>,
    metrics: Arc<RendererMetrics>,
    name: String,
) {
    debug!(renderer = %name, "Renderer worker started");

    while let Some(snapshot) = rx.recv().await {
        metrics.set_queue_len(rx.len());

        match renderer.render(&snapshot).await {
            Ok(()) => {
                metrics.inc_rendered_count();
                observability::record_snapshot_rendered(&name, "ok");
            }
            Err(e) => {
                // 单次失败不终止 worker
                metrics.inc_failure_count();
                observability::record_snapshot_rendered(&name, "failed");
                error!(renderer = %name, tick = snapshot.tick, error = %e, "Render failed");
            }
        }
    }

    if let Err(e) = renderer.flush().await {
        error!(renderer = %name, error = %e, "Flush failed on shutdown");
    }
    if let Err(e) = renderer.close().await {
        error!(renderer = %name, error = %e, "Close failed on shutdown");
    }

    debug!(renderer = %name, "Renderer worker stopped");
}
