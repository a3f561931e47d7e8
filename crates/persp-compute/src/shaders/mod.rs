//! WGSL compute shaders.
//!
//! Both shaders mirror [`crate::kernels`] so GPU output matches the CPU
//! backends to within float rounding.

#![cfg_attr(not(feature = "wgpu"), allow(dead_code))]

/// Inverse-mapped perspective warp with a constant zero border.
///
/// `src_dims.w` selects the filter: 0 nearest, 1 bilinear, 2 bicubic.
/// `inv` holds the rows of the destination-to-source homography.
pub const WARP_PERSPECTIVE: &str = r#"
@group(0) @binding(0) var<storage, read> src: array<f32>;
@group(0) @binding(1) var<storage, read_write> dst: array<f32>;
@group(0) @binding(2) var<uniform> src_dims: vec4<u32>;  // sw, sh, c, filter
@group(0) @binding(3) var<uniform> dst_dims: vec4<u32>;  // dw, dh, 0, 0
@group(0) @binding(4) var<uniform> inv: array<vec4<f32>, 3>;

fn keys(x: f32) -> f32 {
    let a = -0.5;
    let ax = abs(x);
    if ax <= 1.0 {
        return ((a + 2.0) * ax - (a + 3.0)) * ax * ax + 1.0;
    }
    if ax < 2.0 {
        return ((a * ax - 5.0 * a) * ax + 8.0 * a) * ax - 4.0 * a;
    }
    return 0.0;
}

fn weight(filter: u32, x: f32) -> f32 {
    if filter == 1u {
        return max(1.0 - abs(x), 0.0);
    }
    return keys(x);
}

fn tap(x: i32, y: i32, ch: u32) -> f32 {
    if x < 0 || y < 0 || x >= i32(src_dims.x) || y >= i32(src_dims.y) {
        return 0.0;
    }
    return src[(u32(y) * src_dims.x + u32(x)) * src_dims.z + ch];
}

@compute @workgroup_size(16, 16)
fn main(@builtin(global_invocation_id) id: vec3<u32>) {
    let dx = id.x;
    let dy = id.y;
    let dw = dst_dims.x;
    let dh = dst_dims.y;
    if dx >= dw || dy >= dh { return; }

    let c = src_dims.z;
    let filter = src_dims.w;
    let base = (dy * dw + dx) * c;
    for (var ch = 0u; ch < c; ch = ch + 1u) {
        dst[base + ch] = 0.0;
    }

    let p = vec3<f32>(f32(dx), f32(dy), 1.0);
    let w = dot(inv[2].xyz, p);
    if abs(w) < 1e-8 { return; }
    let sx = dot(inv[0].xyz, p) / w;
    let sy = dot(inv[1].xyz, p) / w;

    var r = 2.0;
    if filter == 0u { r = 0.5; } else if filter == 1u { r = 1.0; }
    if !(sx >= -r && sy >= -r && sx <= f32(src_dims.x) + r && sy <= f32(src_dims.y) + r) {
        return;
    }

    if filter == 0u {
        let x = i32(floor(sx + 0.5));
        let y = i32(floor(sy + 0.5));
        for (var ch = 0u; ch < c; ch = ch + 1u) {
            dst[base + ch] = tap(x, y, ch);
        }
        return;
    }

    let x0f = floor(sx);
    let y0f = floor(sy);
    let fx = sx - x0f;
    let fy = sy - y0f;
    let x0 = i32(x0f);
    let y0 = i32(y0f);
    var lo = -1;
    var hi = 2;
    if filter == 1u {
        lo = 0;
        hi = 1;
    }

    for (var ch = 0u; ch < c; ch = ch + 1u) {
        var acc = 0.0;
        for (var j = lo; j <= hi; j = j + 1) {
            let wy = weight(filter, fy - f32(j));
            for (var i = lo; i <= hi; i = i + 1) {
                acc = acc + weight(filter, fx - f32(i)) * wy * tap(x0 + i, y0 + j, ch);
            }
        }
        if filter == 2u {
            acc = clamp(acc, 0.0, 1.0);
        }
        dst[base + ch] = acc;
    }
}
"#;

/// Porter-Duff over of a warped buffer onto the canvas, one row band per dispatch.
///
/// Gray sources replicate into color canvases, color sources reduce to
/// Rec.601 luma on gray canvases.
pub const COMPOSITE_OVER: &str = r#"
@group(0) @binding(0) var<storage, read> warped: array<f32>;
@group(0) @binding(1) var<storage, read_write> canvas: array<f32>;
@group(0) @binding(2) var<uniform> dims: vec4<u32>;  // w, h, src_c, dst_c
@group(0) @binding(3) var<uniform> band: vec4<u32>;  // y0, y1, 0, 0

@compute @workgroup_size(256)
fn main(@builtin(global_invocation_id) id: vec3<u32>) {
    let w = dims.x;
    let rows = band.y - band.x;
    if id.x >= w * rows { return; }

    let idx = band.x * w + id.x;
    let sc = dims.z;
    let dc = dims.w;
    let s = idx * sc;
    let d = idx * dc;

    var color = vec3<f32>(warped[s]);
    if sc >= 3u {
        color = vec3<f32>(warped[s], warped[s + 1u], warped[s + 2u]);
        if dc < 3u {
            color = vec3<f32>(dot(color, vec3<f32>(0.299, 0.587, 0.114)));
        }
    }
    var ncolor = 1u;
    if dc >= 3u { ncolor = 3u; }

    if sc == 4u {
        let sa = warped[s + 3u];
        if sa <= 0.0 { return; }
        var da = 1.0;
        if dc == 4u { da = canvas[d + 3u]; }
        let keep = da * (1.0 - sa);
        for (var k = 0u; k < ncolor; k = k + 1u) {
            canvas[d + k] = color[k] * sa + canvas[d + k] * keep;
        }
        if dc == 4u { canvas[d + 3u] = sa + keep; }
        return;
    }

    var covered = false;
    for (var k = 0u; k < sc; k = k + 1u) {
        if warped[s + k] != 0.0 { covered = true; }
    }
    if !covered { return; }
    for (var k = 0u; k < ncolor; k = k + 1u) {
        canvas[d + k] = color[k];
    }
    if dc == 4u { canvas[d + 3u] = 1.0; }
}
"#;
