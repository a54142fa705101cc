//! Renderer implementations
//!
//! Contains LogRenderer, PlyRenderer and (with `rerun-viewer`) RerunRenderer.

mod log;
mod ply;
#[cfg(feature = "rerun-viewer")]
mod rerun;

pub use self::log::LogRenderer;
pub use self::ply::{write_ply, PlyRenderer, PlyRendererConfig};
#[cfg(feature = "rerun-viewer")]
pub use self::rerun::RerunRenderer;

use std::collections::HashMap;

use contracts::ContractError;

/// Default snapshot cadence for renderers that only sample the stream
pub(crate) const DEFAULT_EVERY_N_TICKS: u64 = 200;

/// Read `every_n_ticks` from renderer params
pub(crate) fn every_n_ticks(
    name: &str,
    params: &HashMap<String, String>,
) -> Result<u64, ContractError> {
    match params.get("every_n_ticks") {
        None => Ok(DEFAULT_EVERY_N_TICKS),
        Some(raw) => match raw.trim().parse::<u64>() {
            Ok(0) | Err(_) => Err(ContractError::renderer_startup(
                name,
                format!("every_n_ticks must be a positive integer, got '{}'", raw),
            )),
            Ok(n) => Ok(n),
        },
    }
}

/// [0, 1] color channel to 8-bit
pub(crate) fn channel_to_u8(value: f32) -> u8 {
    (value.clamp(0.0, 1.0) * 255.0).round() as u8
}
