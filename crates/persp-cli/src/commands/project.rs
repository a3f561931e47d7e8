//! Project command - place SRC on a 3D plane and composite onto REF

use anyhow::{Context, Result};
use persp_ops::{NodeParams, Outcome, PerspectiveNode};
use tracing::{info, warn};

use crate::ProjectArgs;
use crate::commands::{load_image, save_image};

pub fn run(args: ProjectArgs, verbose: bool) -> Result<()> {
    let params = resolve_params(&args)?;
    if verbose {
        println!("Parameters:\n{}", params.to_yaml_string()?);
    }

    // Unreadable inputs still go through the node so the output is the
    // error image rather than nothing.
    let source = load_or_warn(&args.source);
    let reference = load_or_warn(&args.reference);

    let node = PerspectiveNode::new();
    let out = node.process(source.as_ref(), reference.as_ref(), &params);
    let report = &out.report;

    match report.outcome {
        Outcome::Composited | Outcome::IdentityFastPath => info!(
            outcome = ?report.outcome,
            backend = ?report.used,
            fell_back = report.fell_back,
            elapsed_ms = report.elapsed_ms(),
            "projected"
        ),
        outcome => warn!(
            ?outcome,
            reason = report.message.as_deref().unwrap_or("unknown"),
            "projection skipped"
        ),
    }

    save_image(&args.output, &out.image)?;

    if verbose {
        let (w, h, c) = out.image.dimensions();
        println!("Saved: {} ({}x{}, {} ch)", args.output.display(), w, h, c);
    }

    Ok(())
}

/// File values first, then any flag given on the command line.
pub fn resolve_params(args: &ProjectArgs) -> Result<NodeParams> {
    let mut params = match &args.params {
        Some(path) => NodeParams::from_file(path)
            .with_context(|| format!("Failed to read params: {}", path.display()))?,
        None => NodeParams::default(),
    };

    let overrides = [
        (args.pitch, &mut params.pitch),
        (args.yaw, &mut params.yaw),
        (args.roll, &mut params.roll),
        (args.tx, &mut params.tx),
        (args.ty, &mut params.ty),
        (args.distance, &mut params.distance),
        (args.scale, &mut params.scale),
    ];
    for (flag, field) in overrides {
        if let Some(v) = flag {
            *field = v;
        }
    }
    if let Some(backend) = args.backend {
        params.backend = backend;
        params.use_gpu = false;
        params.use_threads = false;
    }
    if let Some(threads) = args.threads {
        params.threads = threads;
    }
    if let Some(quality) = args.quality {
        params.quality = quality;
    }
    Ok(params)
}

fn load_or_warn(path: &std::path::Path) -> Option<persp_compute::ComputeImage> {
    load_image(path)
        .map_err(|e| warn!("{e:#}"))
        .ok()
}
