//! The apivet command line: vet one OpenAPI document and report.

use anyhow::Context;
use apivet::diagnostics::{Severity, Verbosity, render_snippet};
use apivet::loader::{Environment, OsEnvironment};
use apivet::{VetOptions, vet};
use clap::Parser;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "apivet", version, about = "Load, resolve, and vet OpenAPI documents")]
struct Cli {
    /// Path or URL of the document to vet
    path: String,

    /// Output format: text or json
    #[arg(long, default_value = "text")]
    format: String,

    /// Report detail: none, code, breadcrumbs, locations, footnote, all
    #[arg(long, default_value = "locations")]
    verbosity: String,

    /// Pin the specification version (e.g. 3.0.3) instead of honoring
    /// the document's declaration
    #[arg(long = "spec-version")]
    spec_version: Option<String>,

    /// Remap a diagnostic code's severity, e.g. REF_NOT_RESOLVED=warn.
    /// Repeatable.
    #[arg(long = "remap")]
    remaps: Vec<String>,

    /// Render source excerpts for error diagnostics
    #[arg(long)]
    snippets: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let verbosity: Verbosity = cli.verbosity.parse().map_err(anyhow::Error::msg)?;
    let version = cli
        .spec_version
        .as_deref()
        .map(str::parse)
        .transpose()
        .map_err(anyhow::Error::msg)?;
    let remaps = cli
        .remaps
        .iter()
        .map(|spec| parse_remap(spec))
        .collect::<anyhow::Result<Vec<_>>>()?;

    let options = VetOptions {
        version,
        remaps,
        build: false,
    };
    let result = vet(&cli.path, options)
        .await
        .context("invalid configuration")?;

    let env = OsEnvironment::new();
    match cli.format.as_str() {
        "json" => {
            let counts = result.store.counts();
            let output = serde_json::json!({
                "source": result.root_key,
                "counts": {
                    "error": counts.error,
                    "warn": counts.warn,
                    "info": counts.info,
                },
                "reports": [
                    result.store.report(Severity::Error).to_json(),
                    result.store.report(Severity::Warn).to_json(),
                    result.store.report(Severity::Info).to_json(),
                ],
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        "text" => {
            let mut sections = Vec::new();
            for severity in [Severity::Error, Severity::Warn, Severity::Info] {
                let report = result.store.report(severity);
                if !report.is_empty() {
                    sections.push(report.to_text(verbosity));
                }
            }
            if sections.is_empty() {
                println!("{} is valid", result.root_key);
            } else {
                print!("{}", sections.join(env.line_ending()));
            }

            if cli.snippets {
                for (_, diagnostic) in result.store.flatten() {
                    if diagnostic.level == Severity::Error
                        && let Some(snippet) = render_snippet(diagnostic, &result.docs.sources)
                    {
                        print!("{}{}", env.line_ending(), snippet);
                    }
                }
            }
        }
        other => anyhow::bail!("unknown output format {other:?}; expected text or json"),
    }

    Ok(if result.store.has_errors() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

fn parse_remap(spec: &str) -> anyhow::Result<(String, Severity)> {
    let (code, level) = spec
        .split_once('=')
        .with_context(|| format!("--remap expects CODE=LEVEL, got {spec:?}"))?;
    let level = level.parse().map_err(anyhow::Error::msg)?;
    Ok((code.to_string(), level))
}
