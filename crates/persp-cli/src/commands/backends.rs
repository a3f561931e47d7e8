//! Backends command - list execution backends

use anyhow::Result;
use persp_compute::describe_backends;

pub fn run(verbose: bool) -> Result<()> {
    print!("{}", describe_backends());
    if verbose {
        println!();
        println!("Set PERSP_DISABLE_GPU=1 to hide the GPU backend.");
    }
    Ok(())
}
