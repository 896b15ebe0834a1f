//! review-filer entry point.
//!
//! This binary is the composition root. Responsibilities:
//!
//! 1. **Parse configuration** from the command line (see [`args::Args`]).
//! 2. **Wire logging** with `tracing-subscriber`, text or JSON, inside a span
//!    carrying the run's [`pipeline::RunId`].
//! 3. **Construct infrastructure**: the GitHub CLI token, the
//!    [`github::GithubClient`], and the parsed [`document::CommentsDocument`].
//! 4. **Run** the [`publisher::Publisher`] and, when asked, write issue links
//!    into a copy of the document.
//!
//! Any error ends the process with exit status 1.

mod args;
mod logging;

use std::path::Path;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use document::CommentsDocument;
use github::{GhCli, GithubClient};
use pipeline::RunId;
use publisher::{Publisher, RunReport};
use tracing::{error, info, info_span, Instrument};

use crate::args::Args;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let args = Args::parse();
    logging::init(args.log_format);

    let run_id = RunId::new_random();
    async move {
        match execute(args).await {
            Ok(()) => ExitCode::SUCCESS,
            Err(err) => {
                error!("{err:#}");
                ExitCode::FAILURE
            }
        }
    }
    .instrument(info_span!("run", %run_id))
    .await
}

async fn execute(args: Args) -> Result<()> {
    args.validate()?;

    let token = GhCli::default().token().await?;

    let document = CommentsDocument::open(&args.comments_document).with_context(|| {
        format!("Failed to read '{}'", args.comments_document.display())
    })?;
    let header = document.header()?;
    let rows = document.comment_rows()?;
    info!(
        repository = %header.repository,
        version = %header.version,
        rows = rows.len(),
        dry_run = args.dry_run,
        "Loaded comments document"
    );

    let client = GithubClient::new(args.github_config(), header.repository.clone(), &token)?;
    let report = Publisher::new(&client, args.dry_run)
        .run(&rows, &header.version, &args.filters())
        .await?;

    if let Some(output) = args.link_output() {
        write_links(document, output, args.dry_run, &report)?;
    }
    Ok(())
}

/// Why no linked document is written for this run, if that is the case.
fn skip_linking(dry_run: bool, report: &RunReport) -> Option<&'static str> {
    if dry_run {
        Some("Dry run, no links written")
    } else if report.created.is_empty() {
        Some("No issues created, no links written")
    } else {
        None
    }
}

/// Links created issues into `output`; returns the number of linked titles.
fn write_links(
    document: CommentsDocument,
    output: &Path,
    dry_run: bool,
    report: &RunReport,
) -> Result<usize> {
    if let Some(reason) = skip_linking(dry_run, report) {
        info!("{reason}");
        return Ok(0);
    }
    let linked = document
        .link_into(output, &report.created)
        .with_context(|| format!("Failed to write '{}'", output.display()))?;
    info!(linked, output = %output.display(), "Wrote linked document");
    Ok(linked)
}
