//! Tolerances command
//!
//! Usage: fldiff tolerances --tolerances <FILE> [--label <LABEL>]

use anyhow::Context;
use clap::Args;
use fldiff_loader::{load_tolerance_spec, render_yaml_document};
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct TolerancesArgs {
    /// Tolerance specification file
    #[arg(short, long)]
    pub tolerances: PathBuf,

    /// Override block to merge into the defaults
    #[arg(short, long)]
    pub label: Option<String>,
}

/// Execute tolerances command
pub fn execute(args: TolerancesArgs) -> anyhow::Result<()> {
    let spec = load_tolerance_spec(Some(&args.tolerances)).with_context(|| {
        format!(
            "cannot read tolerance specification {}",
            args.tolerances.display()
        )
    })?;
    let resolved = spec.resolve(args.label.as_deref());
    print!("{}", render_yaml_document(&resolved)?);
    Ok(())
}
