use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use futures_util::future::join_all;
use phishguard::redirect::same_site;
use phishguard::{Config, EvaluationReport, Evaluator};
use serde::Serialize;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use url::Url;

#[derive(Parser, Debug)]
#[command(author, version, about = "Heuristic URL phishing detector", long_about = None)]
struct Cli {
    /// TOML config file (defaults are used when omitted)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP API (POST /check-url)
    Serve {
        /// Listen address, overrides config and environment
        #[arg(long)]
        host: Option<String>,

        /// Listen port, overrides config and environment
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Evaluate one or more URLs and print the reports
    Check {
        /// One or more URLs to analyze
        #[arg(required = true)]
        urls: Vec<String>,

        /// Output JSON
        #[arg(short, long)]
        json: bool,
    },
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Verdict<'a> {
    url: &'a str,
    #[serde(flatten)]
    report: &'a EvaluationReport,
    final_url: Option<&'a str>,
    reasons: Vec<String>,
}

fn init_logging(default_filter: &str) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();
}

fn reasons(url: &str, report: &EvaluationReport) -> Vec<String> {
    let d = report.details();
    let mut reasons = Vec::new();
    if !d.url_length_valid {
        reasons.push(format!(
            "URL length > {}",
            phishguard::lexical::MAX_URL_LENGTH
        ));
    }
    if !d.domain_valid {
        reasons.push("domain format not recognised".into());
    }
    if !d.redirection_safe {
        match report.final_url() {
            Some(f) if Url::parse(url).is_ok_and(|o| same_site(&o, f)) => {
                reasons.push(format!("too many redirects ({})", report.redirects()));
            }
            Some(f) => reasons.push(format!(
                "redirects to different host ({})",
                f.host_str().unwrap_or("?")
            )),
            None => reasons.push("page could not be fetched".into()),
        }
    }
    for finding in report.findings() {
        reasons.push(format!("{} (+{})", finding.rule, finding.points));
    }
    reasons
}

fn print_report(url: &str, report: &EvaluationReport) {
    let d = report.details();
    println!("URL: {url}");
    println!("  Risk score: {} => {}", d.risk_score, report.verdict());
    println!("  URL length valid:       {}", d.url_length_valid);
    println!("  Domain valid:           {}", d.domain_valid);
    println!("  Redirection safe:       {}", d.redirection_safe);
    println!("  Source code phishing:   {}", d.source_code_phishing);

    let reasons = reasons(url, report);
    if reasons.is_empty() {
        println!("  Reasons: none");
    } else {
        println!("  Reasons:");
        for r in &reasons {
            println!("    - {r}");
        }
    }
    if let Some(f) = report.final_url() {
        println!("  Final URL after redirects: {f}");
    }
    println!();
}

async fn check(config: &Config, urls: &[String], json: bool) -> Result<()> {
    let evaluator = Evaluator::new(&config.fetch).context("failed to build http client")?;

    let reports = join_all(urls.iter().map(|u| evaluator.evaluate(Some(u.as_str())))).await;

    let mut results = Vec::new();
    for (url, report) in urls.iter().zip(reports) {
        let report = match report {
            Ok(r) => r,
            Err(e) => {
                eprintln!("{url}: {e}");
                continue;
            }
        };
        results.push((url, report));
    }

    if json {
        let verdicts: Vec<Verdict<'_>> = results
            .iter()
            .map(|(url, report)| Verdict {
                url: url.as_str(),
                report,
                final_url: report.final_url().map(Url::as_str),
                reasons: reasons(url, report),
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&verdicts)?);
    } else {
        for (url, report) in &results {
            print_report(url, report);
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = match cli.command {
        Command::Serve { .. } => "info,phishguard=debug",
        Command::Check { .. } => "warn",
    };
    init_logging(default_filter);

    let mut config = Config::load(cli.config.as_deref())?;

    match cli.command {
        Command::Serve { host, port } => {
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            phishguard::server::run_server(config).await
        }
        Command::Check { urls, json } => check(&config, &urls, json).await,
    }
}
