//! The perspective node: projection, warp and composite behind one call.
//!
//! [`PerspectiveNode::process`] never fails. Every problem becomes degraded
//! output plus a [`RunReport`]:
//!
//! | Situation | Output | [`Outcome`] |
//! |-----------|--------|-------------|
//! | missing or unreadable input | 100x100 red [`error_image`] | `InvalidInput` |
//! | identity parameters | centered composite | `IdentityFastPath` |
//! | quad fails validity, solve fails | reference unchanged | `Degenerate` |
//! | backend fails, Serial retry succeeds | composite | `Composited` (fallback) |
//! | Serial fails too | reference unchanged | `Failed` |
//!
//! # Example
//!
//! ```rust
//! use persp_compute::ComputeImage;
//! use persp_ops::{NodeParams, Outcome, PerspectiveNode};
//!
//! let src = ComputeImage::filled(100, 100, &[1.0, 1.0, 1.0]);
//! let canvas = ComputeImage::filled(200, 200, &[0.0, 0.0, 0.0]);
//! let params = NodeParams { yaw: 20.0, ..Default::default() };
//!
//! let out = PerspectiveNode::new().process(Some(&src), Some(&canvas), &params);
//! assert_eq!(out.report.outcome, Outcome::Composited);
//! assert_eq!(out.image.dimensions(), (200, 200, 3));
//! ```

use std::time::{Duration, Instant};

use persp_compute::{Backend, BackendRequest, ComputeImage, ComputeResult, Filter, create_executor};
use tracing::{debug, info, warn};

use crate::camera::Camera;
use crate::composite::composite_centered;
use crate::params::{EngineConfig, NodeParams};
use crate::project::{Projector, validate_quad};
use crate::warp::WarpPlan;
use crate::{OpsError, OpsResult};

/// Opaque red RGBA image returned when an input is missing or unreadable.
pub fn error_image(config: &EngineConfig) -> ComputeImage {
    ComputeImage::filled(config.error_size, config.error_size, &[1.0, 0.0, 0.0, 1.0])
}

/// How an invocation ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Full projection, warp and composite.
    Composited,
    /// Identity parameters; centered composite without resampling.
    IdentityFastPath,
    /// Projection rejected; reference passed through.
    Degenerate,
    /// Missing or unusable input; error image or passthrough.
    InvalidInput,
    /// Every backend failed; reference passed through.
    Failed,
}

/// Diagnostics for one invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    /// Backend the parameters asked for.
    pub requested: Backend,
    /// Backend that produced the output, if any ran.
    pub used: Option<Backend>,
    /// How the call ended.
    pub outcome: Outcome,
    /// True when the requested backend was replaced by Serial.
    pub fell_back: bool,
    /// Wall-clock time of the whole call.
    pub elapsed: Duration,
    /// Diagnostic for logs.
    pub message: Option<String>,
}

impl RunReport {
    fn new(requested: Backend) -> Self {
        Self {
            requested,
            used: None,
            outcome: Outcome::Failed,
            fell_back: false,
            elapsed: Duration::ZERO,
            message: None,
        }
    }

    /// Elapsed time in milliseconds.
    pub fn elapsed_ms(&self) -> f64 {
        self.elapsed.as_secs_f64() * 1000.0
    }
}

/// Image plus report.
#[derive(Debug, Clone)]
pub struct NodeOutput {
    /// Output image; always present.
    pub image: ComputeImage,
    /// What happened.
    pub report: RunReport,
}

/// The perspective projection node.
#[derive(Debug, Clone, Default)]
pub struct PerspectiveNode {
    config: EngineConfig,
}

impl PerspectiveNode {
    /// Node with default engine constants.
    pub fn new() -> Self {
        Self::default()
    }

    /// Node with custom engine constants.
    pub fn with_config(config: EngineConfig) -> Self {
        Self { config }
    }

    /// Engine constants.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Projects `source` onto `reference` according to `params`.
    ///
    /// Never panics on bad input and never returns an error; see the module
    /// docs for what each failure produces.
    pub fn process(
        &self,
        source: Option<&ComputeImage>,
        reference: Option<&ComputeImage>,
        params: &NodeParams,
    ) -> NodeOutput {
        let start = Instant::now();
        let request = params.backend_request();
        let mut report = RunReport::new(request.backend);

        let image = match check_inputs(source, reference) {
            Ok((src, reference)) => match self.run(src, reference, params, request, &mut report) {
                Ok(image) => image,
                Err(e) => {
                    report.outcome = match e {
                        OpsError::Degenerate(_) | OpsError::Math(_) => Outcome::Degenerate,
                        OpsError::InvalidParameter(_) => Outcome::InvalidInput,
                        _ => Outcome::Failed,
                    };
                    let msg = e.to_string();
                    debug!(outcome = ?report.outcome, "passthrough: {msg}");
                    report.message = Some(msg);
                    reference.clone()
                }
            },
            Err(e) => {
                let msg = e.to_string();
                warn!("{msg}");
                report.outcome = Outcome::InvalidInput;
                report.message = Some(msg);
                error_image(&self.config)
            }
        };

        report.elapsed = start.elapsed();
        info!(
            outcome = ?report.outcome,
            requested = %report.requested,
            used = ?report.used,
            fell_back = report.fell_back,
            elapsed_ms = report.elapsed_ms(),
            "perspective node"
        );
        NodeOutput { image, report }
    }

    fn run(
        &self,
        src: &ComputeImage,
        reference: &ComputeImage,
        params: &NodeParams,
        request: BackendRequest,
        report: &mut RunReport,
    ) -> OpsResult<ComputeImage> {
        params.validate()?;

        let camera = Camera::from_params(params);
        if camera.is_identity(&self.config) {
            report.outcome = Outcome::IdentityFastPath;
            report.used = Some(Backend::Serial);
            return Ok(composite_centered(src, reference));
        }

        let projector = Projector::new(
            camera.focal_length(&self.config),
            reference.width,
            reference.height,
            &self.config,
        );
        let quad = projector.project(&camera.corners(src.width, src.height));
        debug!(?quad, focal = projector.focal(), "projected");
        validate_quad(&quad, reference.width, reference.height, &self.config)?;

        let plan = WarpPlan::solve(src.width, src.height, &quad)?;
        let inv = plan.kernel_matrix();
        let filter = params.quality.filter();
        let image = with_serial_fallback(
            request.backend,
            report,
            || run_backend(&request, src, reference, &inv, filter),
            || run_backend(&BackendRequest::serial(), src, reference, &inv, filter),
        )?;
        report.outcome = Outcome::Composited;
        Ok(image)
    }
}

/// Runs `primary` for a non-Serial backend, then restarts from scratch on
/// Serial if it fails. Records the backend that produced the image.
fn with_serial_fallback(
    backend: Backend,
    report: &mut RunReport,
    primary: impl FnOnce() -> ComputeResult<ComputeImage>,
    serial: impl FnOnce() -> ComputeResult<ComputeImage>,
) -> OpsResult<ComputeImage> {
    if backend != Backend::Serial {
        match primary() {
            Ok(image) => {
                report.used = Some(backend);
                return Ok(image);
            }
            Err(e) => {
                let msg = format!("{backend} backend failed, retrying serial: {e}");
                warn!("{msg}");
                report.fell_back = true;
                report.message = Some(msg);
            }
        }
    }
    let image = serial()?;
    report.used = Some(Backend::Serial);
    Ok(image)
}

/// Both images present and well-formed.
fn check_inputs<'a>(
    source: Option<&'a ComputeImage>,
    reference: Option<&'a ComputeImage>,
) -> OpsResult<(&'a ComputeImage, &'a ComputeImage)> {
    let src = source.ok_or(OpsError::MissingInput("source"))?;
    let reference = reference.ok_or(OpsError::MissingInput("reference"))?;
    src.validate()?;
    reference.validate()?;
    Ok((src, reference))
}

fn run_backend(
    request: &BackendRequest,
    src: &ComputeImage,
    reference: &ComputeImage,
    inv: &[f32; 9],
    filter: Filter,
) -> ComputeResult<ComputeImage> {
    create_executor(request)?.run(src, reference, inv, filter)
}
