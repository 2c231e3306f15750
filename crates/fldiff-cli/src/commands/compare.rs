//! Compare command
//!
//! Usage: fldiff compare -r <REFERENCE> -d <DATA> [-t <TOLERANCES>] [-o <FILE>] [-l <LABEL>]
//!
//! Failing tests are reported, not signalled: the command exits 0 whenever a
//! report stream could be produced, including the minimal failure report
//! written when the inputs cannot be compared.

use anyhow::Context;
use clap::Args;
use fldiff_core::diff::human_summary::{render_batch_line, render_document_line};
use fldiff_core::errors::ExError;
use fldiff_core::{compare_streams, BatchOutcome, CompareOptions, Report, ReportKeys};
use fldiff_loader::{load_stream, load_tolerance_spec, render_yaml_document, ReportWriter};
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct CompareArgs {
    /// Reference stream
    #[arg(short, long)]
    pub reference: PathBuf,

    /// Stream to be compared with the reference
    #[arg(short, long)]
    pub data: PathBuf,

    /// Tolerance specification file
    #[arg(short, long)]
    pub tolerances: Option<PathBuf>,

    /// Report stream file (default: discard)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Override block of the tolerance specification to apply
    #[arg(short, long)]
    pub label: Option<String>,

    /// Let failing sequence elements loosen the tolerance of later elements
    #[arg(long)]
    pub ratchet_sequences: bool,
}

/// Execute compare command
pub fn execute(args: CompareArgs) -> anyhow::Result<()> {
    let mut writer = ReportWriter::create(args.output.as_deref())
        .context("cannot open the report stream")?;

    match run(&args) {
        Ok(outcome) => emit_outcome(&outcome, &mut writer)?,
        Err(err) if err.is_format_violation() => {
            tracing::error!(err_code = err.code(), "inputs cannot be compared: {}", err);
            eprintln!("Inputs cannot be compared: {}", err);
            let report = Report::fatal();
            print!("{}", render_yaml_document(&report)?);
            writer.write_document(&report)?;
        }
        Err(err) => return Err(err.into()),
    }

    writer.finish().context("cannot flush the report stream")?;
    Ok(())
}

fn run(args: &CompareArgs) -> Result<BatchOutcome, ExError> {
    let references = load_stream(&args.reference)?;
    let data = load_stream(&args.data)?;
    let tolerances = load_tolerance_spec(args.tolerances.as_deref())?.resolve(args.label.as_deref());
    let options = CompareOptions {
        ratchet_sequences: args.ratchet_sequences,
    };

    compare_streams(&references, &data, &tolerances, options, &ReportKeys::default())
}

fn emit_outcome(outcome: &BatchOutcome, writer: &mut ReportWriter) -> anyhow::Result<()> {
    for document in &outcome.documents {
        if document.failed() {
            if let Some(diagnostic) = &document.comparison.diagnostic {
                print!("{}", render_yaml_document(diagnostic)?);
            }
        }
        print!("{}", render_yaml_document(&document.report)?);
        println!("{}", render_document_line(document));
        writer.write_document(&document.report)?;
    }

    if let Some(summary) = &outcome.summary {
        print!("{}", render_yaml_document(summary)?);
        println!("{}", render_batch_line(outcome));
        writer.write_document(summary)?;
    }
    Ok(())
}
