//! Node parameters and engine constants.
//!
//! [`NodeParams`] is what the host hands the node on every call. It
//! deserializes from YAML with every field optional:
//!
//! ```yaml
//! pitch: 10.0      # degrees
//! yaw: -15.0
//! roll: 0.0
//! tx: 20.0         # pixels
//! ty: 0.0
//! distance: 1200.0
//! scale: 80.0      # percent
//! backend: threaded
//! threads: 4
//! quality: quality
//! ```
//!
//! `use_gpu: true` and `use_threads: true` are accepted in place of
//! `backend`.

use std::path::Path;

use persp_compute::{Backend, BackendRequest, Filter};
use serde::{Deserialize, Serialize};

use crate::{OpsError, OpsResult};

/// Smallest camera distance used after clamping.
pub const MIN_DISTANCE: f64 = 1.0;

/// Smallest scale (percent) used after clamping.
pub const MIN_SCALE_PERCENT: f64 = 0.01;

/// Interpolation quality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Quality {
    /// Nearest-neighbor.
    Speed,
    /// Bilinear.
    #[default]
    Balanced,
    /// Bicubic.
    Quality,
}

impl Quality {
    /// Resampling filter for this quality.
    pub fn filter(self) -> Filter {
        match self {
            Self::Speed => Filter::Nearest,
            Self::Balanced => Filter::Bilinear,
            Self::Quality => Filter::Bicubic,
        }
    }
}

impl std::str::FromStr for Quality {
    type Err = OpsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "speed" | "fast" => Ok(Self::Speed),
            "balanced" => Ok(Self::Balanced),
            "quality" | "best" => Ok(Self::Quality),
            other => Err(OpsError::InvalidParameter(format!("unknown quality '{other}'"))),
        }
    }
}

/// Requested execution backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendChoice {
    /// Calling thread.
    #[default]
    Serial,
    /// GPU compute.
    Gpu,
    /// Row-band worker pool.
    #[serde(alias = "multithreaded", alias = "threads")]
    Threaded,
}

impl From<BackendChoice> for Backend {
    fn from(choice: BackendChoice) -> Self {
        match choice {
            BackendChoice::Serial => Backend::Serial,
            BackendChoice::Gpu => Backend::Gpu,
            BackendChoice::Threaded => Backend::Threaded,
        }
    }
}

impl std::str::FromStr for BackendChoice {
    type Err = OpsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "serial" | "cpu" => Ok(Self::Serial),
            "gpu" | "wgpu" => Ok(Self::Gpu),
            "threaded" | "multithreaded" | "threads" => Ok(Self::Threaded),
            other => Err(OpsError::InvalidParameter(format!("unknown backend '{other}'"))),
        }
    }
}

fn available_cores() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

/// Per-call node parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeParams {
    /// Rotation about X in degrees.
    pub pitch: f64,
    /// Rotation about Y in degrees.
    pub yaw: f64,
    /// Rotation about Z in degrees.
    pub roll: f64,
    /// Horizontal translation in pixels.
    pub tx: f64,
    /// Vertical translation in pixels.
    pub ty: f64,
    /// Camera distance in pixels.
    pub distance: f64,
    /// Source plane scale in percent.
    pub scale: f64,
    /// Requested backend.
    pub backend: BackendChoice,
    /// Shorthand for `backend: gpu`.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub use_gpu: bool,
    /// Shorthand for `backend: threaded`.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub use_threads: bool,
    /// Worker count for the threaded backend.
    pub threads: usize,
    /// Interpolation quality.
    pub quality: Quality,
}

impl Default for NodeParams {
    fn default() -> Self {
        Self {
            pitch: 0.0,
            yaw: 0.0,
            roll: 0.0,
            tx: 0.0,
            ty: 0.0,
            distance: EngineConfig::DEFAULT_DISTANCE,
            scale: 100.0,
            backend: BackendChoice::Serial,
            use_gpu: false,
            use_threads: false,
            threads: available_cores(),
            quality: Quality::Balanced,
        }
    }
}

impl NodeParams {
    /// Parse from a YAML document.
    pub fn from_yaml_str(yaml: &str) -> OpsResult<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Load from a YAML file.
    pub fn from_file(path: impl AsRef<Path>) -> OpsResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&text)
    }

    /// Serialize to YAML.
    pub fn to_yaml_string(&self) -> OpsResult<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Effective backend. An explicit `backend` wins over the boolean flags.
    pub fn backend(&self) -> Backend {
        match self.backend {
            BackendChoice::Serial if self.use_gpu => Backend::Gpu,
            BackendChoice::Serial if self.use_threads => Backend::Threaded,
            choice => choice.into(),
        }
    }

    /// Backend request with the worker count clamped to `[1, cores]`.
    pub fn backend_request(&self) -> BackendRequest {
        BackendRequest {
            backend: self.backend(),
            threads: self.threads.clamp(1, available_cores()),
        }
    }

    /// Rejects NaN or infinite geometry.
    pub fn validate(&self) -> OpsResult<()> {
        let fields = [
            ("pitch", self.pitch),
            ("yaw", self.yaw),
            ("roll", self.roll),
            ("tx", self.tx),
            ("ty", self.ty),
            ("distance", self.distance),
            ("scale", self.scale),
        ];
        for (name, value) in fields {
            if !value.is_finite() {
                return Err(OpsError::InvalidParameter(format!("{name} is {value}")));
            }
        }
        Ok(())
    }

    /// Distance clamped to [`MIN_DISTANCE`].
    pub fn clamped_distance(&self) -> f64 {
        self.distance.max(MIN_DISTANCE)
    }

    /// Scale factor (not percent) clamped to [`MIN_SCALE_PERCENT`].
    pub fn scale_factor(&self) -> f64 {
        self.scale.max(MIN_SCALE_PERCENT) / 100.0
    }
}

/// Engine constants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Focal length in pixels at the reference distance.
    pub focal_length: f64,
    /// Distance at which `focal_length` applies.
    pub reference_distance: f64,
    /// Distance that counts as "no transform".
    pub default_distance: f64,
    /// Minimum projected edge length in pixels.
    pub min_edge: f64,
    /// Minimum projected quad area in square pixels.
    pub min_area: f64,
    /// Offset from the canvas centre for corners behind the camera.
    pub sentinel: f64,
    /// Side length of the error image.
    pub error_size: u32,
}

impl EngineConfig {
    /// Default camera distance.
    pub const DEFAULT_DISTANCE: f64 = 1000.0;

    /// Focal length for a camera at `distance`.
    pub fn focal_for(&self, distance: f64) -> f64 {
        self.focal_length * (distance / self.reference_distance)
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            focal_length: 1000.0,
            reference_distance: 1000.0,
            default_distance: Self::DEFAULT_DISTANCE,
            min_edge: 1.0,
            min_area: 100.0,
            sentinel: 1.0e6,
            error_size: 100,
        }
    }
}
