//! # Viewer
//!
//! 点云显示模块。
//!
//! 负责：
//! - 每个传感器一个 `PointCloudSink`，由渲染循环独占写入
//! - 固定周期 tick：从单槽通道拉取最新帧 → 构建 `SceneSnapshot` → fan-out 到渲染器
//! - 隔离慢渲染器，不阻塞渲染循环

pub mod error;
pub mod handle;
pub mod metrics;
pub mod render_loop;
pub mod renderers;
pub mod sink;

pub use contracts::{FrameRenderer, SceneSnapshot};
pub use error::{Result, ViewerError};
pub use handle::RendererHandle;
pub use metrics::{RendererMetrics, RendererMetricsSnapshot};
pub use render_loop::{
    create_render_loop, create_renderer_handle, RenderLoop, RenderLoopBuilder, RenderLoopConfig,
    RenderReport,
};
pub use renderers::{LogRenderer, PlyRenderer, PlyRendererConfig};
#[cfg(feature = "rerun-viewer")]
pub use renderers::RerunRenderer;
pub use sink::PointCloudSink;
