//! Backend detection.
//!
//! The GPU probe creates an instance and asks for an adapter, which takes
//! tens of milliseconds, so its answer is cached for the process lifetime.
//!
//! Set `PERSP_DISABLE_GPU=1` (or `true`) to report the GPU as unavailable
//! without probing.

use std::sync::OnceLock;

use super::Backend;

/// Environment variable that switches the GPU backend off.
pub const DISABLE_GPU_ENV: &str = "PERSP_DISABLE_GPU";

static GPU_PROBE: OnceLock<bool> = OnceLock::new();

/// Information about a compute backend.
#[derive(Debug, Clone)]
pub struct BackendInfo {
    /// Backend type.
    pub backend: Backend,
    /// Human-readable name.
    pub name: &'static str,
    /// Whether backend is available.
    pub available: bool,
    /// Description.
    pub description: &'static str,
}

/// True when [`DISABLE_GPU_ENV`] is set to `1` or `true`.
pub fn gpu_disabled_by_env() -> bool {
    std::env::var(DISABLE_GPU_ENV)
        .map(|v| {
            let v = v.trim();
            v == "1" || v.eq_ignore_ascii_case("true")
        })
        .unwrap_or(false)
}

/// Whether a GPU adapter can be used. Probed once per process.
pub fn gpu_available() -> bool {
    *GPU_PROBE.get_or_init(probe_gpu)
}

fn probe_gpu() -> bool {
    if gpu_disabled_by_env() {
        tracing::debug!("GPU disabled via {}", DISABLE_GPU_ENV);
        return false;
    }
    probe_adapter()
}

#[cfg(feature = "wgpu")]
fn probe_adapter() -> bool {
    let found = super::WgpuPrimitives::is_available();
    tracing::debug!(found, "wgpu adapter probe");
    found
}

#[cfg(not(feature = "wgpu"))]
fn probe_adapter() -> bool {
    false
}

/// Detect all backends.
pub fn detect_backends() -> Vec<BackendInfo> {
    vec![
        BackendInfo {
            backend: Backend::Serial,
            name: "serial",
            available: true,
            description: "single thread, always available",
        },
        BackendInfo {
            backend: Backend::Threaded,
            name: "threaded",
            available: true,
            description: "row bands on a rayon worker pool",
        },
        BackendInfo {
            backend: Backend::Gpu,
            name: "gpu",
            available: gpu_available(),
            description: if cfg!(feature = "wgpu") {
                "compute shaders via wgpu (Vulkan/Metal/DX12)"
            } else {
                "not compiled in (enable feature \"wgpu\")"
            },
        },
    ]
}

/// Get description of available backends.
pub fn describe_backends() -> String {
    let mut desc = String::new();
    for info in detect_backends() {
        let status = if info.available { "+" } else { "-" };
        desc.push_str(&format!("[{}] {}: {}\n", status, info.name, info.description));
    }
    desc
}
