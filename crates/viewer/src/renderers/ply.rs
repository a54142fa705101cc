//! PlyRenderer - periodically writes each sensor's cloud to a binary PLY file
//!
//! Layout: `<output_dir>/<sensor_id>/<tick>.ply`, plus `<output_dir>/axes.ply` once when
//! axis display is enabled.

use std::collections::{HashMap, HashSet};
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use contracts::{ContractError, FrameRenderer, PointCloudFrame, SceneSnapshot, ViewerConfig};
use ply_rs::ply::{
    Addable, DefaultElement, ElementDef, Encoding, Ply, Property, PropertyDef, PropertyType,
    ScalarType,
};
use ply_rs::writer::Writer;
use tracing::{debug, error, instrument};

use super::{channel_to_u8, every_n_ticks};

/// Configuration for PlyRenderer
#[derive(Debug, Clone)]
pub struct PlyRendererConfig {
    /// Base output directory
    pub output_dir: PathBuf,
    /// Write one file set every N ticks
    pub every_n_ticks: u64,
    /// Also write the coordinate axis triad
    pub write_axes: bool,
    /// Written as a PLY comment, control characters replaced
    pub comment: String,
}

impl PlyRendererConfig {
    /// Create config from params map; `output_dir` is required
    pub fn from_params(
        name: &str,
        params: &HashMap<String, String>,
        viewer: &ViewerConfig,
    ) -> Result<Self, ContractError> {
        let output_dir = params
            .get("output_dir")
            .filter(|dir| !dir.trim().is_empty())
            .map(PathBuf::from)
            .ok_or_else(|| ContractError::renderer_startup(name, "missing 'output_dir' param"))?;

        Ok(Self {
            output_dir,
            every_n_ticks: every_n_ticks(name, params)?,
            write_axes: viewer.show_axes,
            comment: header_comment(&viewer.window_name),
        })
    }
}

/// Renderer that writes point-cloud snapshots to disk
pub struct PlyRenderer {
    name: String,
    config: PlyRendererConfig,
    created_dirs: HashSet<PathBuf>,
    axes_written: bool,
    files_written: u64,
}

impl PlyRenderer {
    pub fn new(name: impl Into<String>, config: PlyRendererConfig) -> io::Result<Self> {
        fs::create_dir_all(&config.output_dir)?;

        Ok(Self {
            name: name.into(),
            config,
            created_dirs: HashSet::new(),
            axes_written: false,
            files_written: 0,
        })
    }

    /// Create from params map (for factory)
    pub fn from_params(
        name: impl Into<String>,
        params: &HashMap<String, String>,
        viewer: &ViewerConfig,
    ) -> Result<Self, ContractError> {
        let name = name.into();
        let config = PlyRendererConfig::from_params(&name, params, viewer)?;
        Self::new(&name, config).map_err(|e| ContractError::renderer_startup(&name, e.to_string()))
    }

    pub fn files_written(&self) -> u64 {
        self.files_written
    }

    fn write_snapshot(&mut self, snapshot: &SceneSnapshot) -> io::Result<()> {
        if self.config.write_axes && !self.axes_written {
            let path = self.config.output_dir.join("axes.ply");
            let mut writer = BufWriter::new(File::create(path)?);
            write_axes(&mut writer, &self.config.comment)?;
            writer.flush()?;
            self.axes_written = true;
        }

        for cloud in &snapshot.clouds {
            if cloud.is_empty() {
                continue;
            }

            let sensor_dir = self.config.output_dir.join(cloud.sensor_id().as_str());
            if !self.created_dirs.contains(&sensor_dir) {
                fs::create_dir_all(&sensor_dir)?;
                self.created_dirs.insert(sensor_dir.clone());
            }

            let path = sensor_dir.join(format!("{}.ply", snapshot.tick));
            let mut writer = BufWriter::new(File::create(&path)?);
            write_ply(&mut writer, cloud, &self.config.comment)?;
            writer.flush()?;
            self.files_written += 1;

            debug!(
                renderer = %self.name,
                path = %path.display(),
                points = cloud.len(),
                "PLY written"
            );
        }

        Ok(())
    }
}

const POSITION_KEYS: [&str; 3] = ["x", "y", "z"];
const COLOR_KEYS: [&str; 3] = ["red", "green", "blue"];

/// Write one frame as binary little-endian PLY with per-vertex RGB
pub fn write_ply<W: Write>(writer: &mut W, frame: &PointCloudFrame, comment: &str) -> io::Result<()> {
    let mut ply = binary_ply([comment.to_string(), format!("sensor {}", frame.sensor_id())]);

    let vertices = frame
        .positions()
        .iter()
        .zip(frame.colors())
        .map(|(position, color)| colored_vertex(*position, color.map(channel_to_u8)))
        .collect();
    ply.header.elements.add(colored_vertex_element());
    ply.payload.insert("vertex".to_string(), vertices);

    write_consistent(writer, ply)
}

/// Unit axis triad: origin plus x (red), y (green), z (blue) tips joined by edges
fn write_axes<W: Write>(writer: &mut W, comment: &str) -> io::Result<()> {
    const VERTICES: [([f32; 3], [u8; 3]); 4] = [
        ([0.0, 0.0, 0.0], [255, 255, 255]),
        ([1.0, 0.0, 0.0], [255, 0, 0]),
        ([0.0, 1.0, 0.0], [0, 255, 0]),
        ([0.0, 0.0, 1.0], [0, 0, 255]),
    ];

    let mut ply = binary_ply([comment.to_string()]);

    let vertices = VERTICES
        .into_iter()
        .map(|(position, color)| colored_vertex(position, color))
        .collect();
    ply.header.elements.add(colored_vertex_element());
    ply.payload.insert("vertex".to_string(), vertices);

    let mut edge_element = ElementDef::new("edge".to_string());
    for key in ["vertex1", "vertex2"] {
        edge_element.properties.add(PropertyDef::new(
            key.to_string(),
            PropertyType::Scalar(ScalarType::Int),
        ));
    }
    let edges = (1..=3)
        .map(|tip| {
            let mut edge = DefaultElement::new();
            edge.insert("vertex1".to_string(), Property::Int(0));
            edge.insert("vertex2".to_string(), Property::Int(tip));
            edge
        })
        .collect();
    ply.header.elements.add(edge_element);
    ply.payload.insert("edge".to_string(), edges);

    write_consistent(writer, ply)
}

/// PLY 头部逐行解析，注释里的控制字符 (换行等) 替换为空格
pub fn header_comment(text: &str) -> String {
    text.chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect()
}

fn binary_ply<const N: usize>(comments: [String; N]) -> Ply<DefaultElement> {
    let mut ply = Ply::<DefaultElement>::new();
    ply.header.encoding = Encoding::BinaryLittleEndian;
    ply.header
        .comments
        .extend(comments.iter().map(String::as_str).map(header_comment));
    ply
}

fn colored_vertex_element() -> ElementDef {
    let mut element = ElementDef::new("vertex".to_string());
    for key in POSITION_KEYS {
        element.properties.add(PropertyDef::new(
            key.to_string(),
            PropertyType::Scalar(ScalarType::Float),
        ));
    }
    for key in COLOR_KEYS {
        element.properties.add(PropertyDef::new(
            key.to_string(),
            PropertyType::Scalar(ScalarType::UChar),
        ));
    }
    element
}

fn colored_vertex(position: [f32; 3], color: [u8; 3]) -> DefaultElement {
    let mut vertex = DefaultElement::new();
    for (key, value) in POSITION_KEYS.into_iter().zip(position) {
        vertex.insert(key.to_string(), Property::Float(value));
    }
    for (key, value) in COLOR_KEYS.into_iter().zip(color) {
        vertex.insert(key.to_string(), Property::UChar(value));
    }
    vertex
}

/// 元素计数由 payload 推出后写出
fn write_consistent<W: Write>(writer: &mut W, mut ply: Ply<DefaultElement>) -> io::Result<()> {
    ply.make_consistent()
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, format!("{:?}", e)))?;
    Writer::new().write_ply(writer, &mut ply)?;
    Ok(())
}

impl FrameRenderer for PlyRenderer {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "ply_renderer_render",
        skip(self, snapshot),
        fields(renderer = %self.name, tick = snapshot.tick)
    )]
    async fn render(&mut self, snapshot: &SceneSnapshot) -> Result<(), ContractError> {
        if snapshot.tick % self.config.every_n_ticks != 0 {
            return Ok(());
        }

        self.write_snapshot(snapshot).map_err(|e| {
            error!(renderer = %self.name, tick = snapshot.tick, error = %e, "Write failed");
            ContractError::renderer_write(&self.name, e.to_string())
        })
    }

    async fn flush(&mut self) -> Result<(), ContractError> {
        Ok(())
    }

    #[instrument(name = "ply_renderer_close", skip(self))]
    async fn close(&mut self) -> Result<(), ContractError> {
        debug!(renderer = %self.name, files = self.files_written, "PlyRenderer closed");
        Ok(())
    }
}
