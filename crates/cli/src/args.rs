//! Command-line configuration.

use std::path::PathBuf;

use anyhow::{ensure, Result};
use clap::{Parser, ValueEnum};
use github::{GithubConfig, DEFAULT_API_URL, DEFAULT_MAX_RETRIES};
use pipeline::{ClauseFilter, RunFilters, TypeFilter};

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Text,
    /// One JSON object per event.
    Json,
}

/// Files the rows of a review-comments document as GitHub issues.
#[derive(Debug, Parser)]
#[command(name = "review-filer", version, about)]
pub struct Args {
    /// Word document containing the comments table.
    #[arg(short = 'i', long = "comments_document", alias = "comments-document")]
    pub comments_document: PathBuf,

    /// Show what would be filed without creating anything.
    #[arg(short = 'n', long = "dry_run", alias = "dry-run")]
    pub dry_run: bool,

    /// Maximum number of issues to create (or preview) in this run.
    #[arg(short = 'l', long)]
    pub limit: Option<usize>,

    /// Only process these types: comma-separated codes, or 'all' for rows without a type.
    #[arg(short = 't', long = "type-filter")]
    pub type_filter: Option<String>,

    /// Only process these clauses: comma-separated numbers, or 'all' for rows without a clause.
    #[arg(short = 'c', long = "clause-filter")]
    pub clause_filter: Option<String>,

    /// Link each created issue from its title in a copy of the document.
    #[arg(long, requires = "output_document")]
    pub link_titles: bool,

    /// Where the linked copy of the document is written.
    #[arg(long, requires = "link_titles")]
    pub output_document: Option<PathBuf>,

    /// Base URL of the GitHub REST API.
    #[arg(long, env = "GITHUB_API_URL", default_value = DEFAULT_API_URL)]
    pub api_url: String,

    /// How often a rate-limited request is retried.
    #[arg(long, default_value_t = DEFAULT_MAX_RETRIES)]
    pub max_retries: u32,

    /// Log output format.
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,
}

impl Args {
    /// Checks what clap cannot express.
    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.comments_document.is_file(),
            "Comments document '{}' does not exist",
            self.comments_document.display()
        );
        Ok(())
    }

    /// Row filters for this run. A blank filter value means no filter.
    pub fn filters(&self) -> RunFilters {
        RunFilters {
            type_filter: non_blank(&self.type_filter).map(TypeFilter::parse),
            clause_filter: non_blank(&self.clause_filter).map(ClauseFilter::parse),
            limit: self.limit,
        }
    }

    pub fn github_config(&self) -> GithubConfig {
        GithubConfig {
            api_url: self.api_url.clone(),
            max_retries: self.max_retries,
            ..GithubConfig::default()
        }
    }

    /// Target of the back-writer, if linking was requested.
    pub fn link_output(&self) -> Option<&PathBuf> {
        self.output_document.as_ref().filter(|_| self.link_titles)
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.trim().is_empty())
}
