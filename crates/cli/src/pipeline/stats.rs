//! Session statistics and the renderer that collects them.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use contracts::{ContractError, FrameRenderer, SceneSnapshot};
use observability::ViewerMetricsAggregator;
use viewer::RendererMetricsSnapshot;

/// Renderer that feeds every snapshot into a shared aggregator
pub struct StatsRenderer {
    aggregator: Arc<Mutex<ViewerMetricsAggregator>>,
}

impl StatsRenderer {
    pub fn new(aggregator: Arc<Mutex<ViewerMetricsAggregator>>) -> Self {
        Self { aggregator }
    }
}

impl FrameRenderer for StatsRenderer {
    fn name(&self) -> &str {
        "stats"
    }

    async fn render(&mut self, snapshot: &SceneSnapshot) -> Result<(), ContractError> {
        self.aggregator
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .observe(snapshot);
        Ok(())
    }

    async fn flush(&mut self) -> Result<(), ContractError> {
        Ok(())
    }

    async fn close(&mut self) -> Result<(), ContractError> {
        Ok(())
    }
}

/// Statistics from a session run
#[derive(Debug, Clone, Default)]
pub struct SessionStats {
    /// Wall-clock duration from connect to render loop stop
    pub duration: Duration,

    /// Render ticks executed
    pub ticks: u64,

    /// New frames moved into the sinks
    pub frames_pulled: u64,

    /// Number of sensors that were active
    pub active_sensors: usize,

    /// Per-renderer counters
    pub renderers: Vec<(String, RendererMetricsSnapshot)>,

    /// Snapshot and ingestion statistics
    pub aggregator: ViewerMetricsAggregator,
}

impl SessionStats {
    /// Render ticks per second
    pub fn tick_rate(&self) -> f64 {
        let secs = self.duration.as_secs_f64();
        if secs > 0.0 {
            self.ticks as f64 / secs
        } else {
            0.0
        }
    }

    /// Print detailed summary
    pub fn print_summary(&self) {
        println!("\n╔══════════════════════════════════════════════════════════════╗");
        println!("║                    Viewer Statistics                         ║");
        println!("╚══════════════════════════════════════════════════════════════╝\n");

        println!("📊 Overview");
        println!("   ├─ Duration: {:.2}s", self.duration.as_secs_f64());
        println!("   ├─ Render ticks: {}", self.ticks);
        println!("   ├─ Tick rate: {:.2}/s", self.tick_rate());
        println!("   ├─ Frames displayed: {}", self.frames_pulled);
        println!("   └─ Active sensors: {}", self.active_sensors);

        let summary = self.aggregator.summary();

        println!("\n📈 Ingestion");
        println!("   ├─ Packets received: {}", summary.ingestion.packets_received);
        println!("   ├─ Frames converted: {}", summary.ingestion.frames_converted);
        println!(
            "   ├─ Frames rejected: {} ({:.2}%)",
            summary.ingestion.frames_rejected, summary.reject_rate
        );
        println!(
            "   └─ Frames overwritten before display: {}",
            summary.ingestion.frames_overwritten
        );

        if !summary.sensors.is_empty() {
            println!("\n🛰  Sensors");
            let count = summary.sensors.len();
            for (i, (sensor, stats)) in summary.sensors.iter().enumerate() {
                let prefix = if i + 1 == count { "└─" } else { "├─" };
                println!(
                    "   {} {}: {} frames, points {}",
                    prefix, sensor, stats.frames_seen, stats.points
                );
            }
        }

        if !self.renderers.is_empty() {
            println!("\n📤 Renderers");
            let count = self.renderers.len();
            for (i, (name, metrics)) in self.renderers.iter().enumerate() {
                let prefix = if i + 1 == count { "└─" } else { "├─" };
                println!(
                    "   {} {}: rendered={}, failed={}, dropped={}",
                    prefix,
                    name,
                    metrics.rendered_count,
                    metrics.failure_count,
                    metrics.dropped_count
                );
            }
        }

        println!();
    }
}
