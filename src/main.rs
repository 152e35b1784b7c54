// src/main.rs

use serde::Serialize;
use std::path::Path;
use std::process::ExitCode;
use tracing::{debug, error, info, warn};

mod app;
mod cli;
mod core;
mod logging;
mod ui;

use crate::app::{Pipeline, PipelineOptions, parse_stages};
use crate::cli::{CommandLine, Commands};
use crate::core::catalog::top_ports;
use crate::core::config::{
    DEFAULT_ENUM_TIMEOUT_SECS, DEFAULT_HTTP_TIMEOUT, DEFAULT_SCAN_TIMEOUT_SECS, ScanConfiguration,
    timeout_from_secs,
};
use crate::core::error::{ReconError, Result, ValidationError};
use crate::core::exporter;
use crate::core::input::{load_wordlist, normalize_domain, parse_port_spec, validate_target};
use crate::core::scanner::{
    Fingerprinter, HeaderAnalyzer, SubdomainEnumerator, SystemResolver, TokioConnector,
    build_liveness_client, run_port_scan,
};
use crate::core::sources::WordlistSource;

#[tokio::main]
async fn main() -> color_eyre::Result<ExitCode> {
    color_eyre::install()?;
    let cli = CommandLine::parse_args();
    let log_path = logging::initialize_logging(cli.verbose, cli.log_dir.as_deref())?;
    debug!(log_file = %log_path.display(), "Logging initialized.");

    ui::print_banner();

    match execute(cli.command).await {
        Ok(()) => Ok(ExitCode::SUCCESS),
        Err(e) => {
            error!(error = %e, "Command failed.");
            ui::print_error(&e.to_string());
            Ok(ExitCode::FAILURE)
        }
    }
}

async fn execute(command: Commands) -> Result<()> {
    match command {
        Commands::Enum { domain, wordlist, threads, timeout, output, no_http } => {
            let domain = normalize_domain(&domain)?;
            let timeout = timeout_from_secs(timeout)?;
            let labels = wordlist.as_deref().map(load_wordlist).transpose()?;
            let limits = ScanConfiguration::new(threads, timeout, Vec::new())?;

            let source = match labels {
                Some(labels) => WordlistSource::new(&domain, labels),
                None => WordlistSource::builtin(&domain),
            };
            let mut enumerator = SubdomainEnumerator::new(&domain, limits, SystemResolver::new(timeout))
                .with_source(Box::new(source));
            if !no_http {
                enumerator = enumerator.with_liveness(build_liveness_client(timeout)?);
            }

            let bar = ui::create_progressbar(enumerator.candidate_count() as u64, "enum".to_string());
            let report = enumerator.with_progress(ui::progress_hook(&bar)).run().await;
            bar.finish_and_clear();

            ui::print_subdomains(&report);
            save_output(&report, output.as_deref());
        }
        Commands::Scan { target, ports, top_ports: top, threads, timeout, output } => {
            let target = validate_target(&target)?;
            let ports = match ports {
                Some(spec) => parse_port_spec(&spec)?,
                None => top_ports(top),
            };
            let timeout = timeout_from_secs(timeout)?;
            let limits = ScanConfiguration::new(threads, timeout, Vec::new())?;

            let bar = ui::create_progressbar(ports.len() as u64, "scan".to_string());
            let open = run_port_scan(&target, &ports, &limits, TokioConnector, Some(ui::progress_hook(&bar))).await;
            bar.finish_and_clear();

            ui::print_ports(&target, &open);
            save_output(&serde_json::json!({ "target": target, "open_ports": open }), output.as_deref());
        }
        Commands::Fingerprint { url, detailed, output } => {
            let report = Fingerprinter::new(DEFAULT_HTTP_TIMEOUT)?.analyze(&url, detailed).await;
            ui::print_fingerprint(&report);
            save_output(&report, output.as_deref());
        }
        Commands::Headers { url, output } => {
            let report = HeaderAnalyzer::new(DEFAULT_HTTP_TIMEOUT)?.analyze(&url).await;
            ui::print_headers(&report);
            save_output(&report, output.as_deref());
        }
        Commands::Run { domain, pipeline, output, threads } => {
            let domain = normalize_domain(&domain)?;
            let dns_timeout = timeout_from_secs(DEFAULT_ENUM_TIMEOUT_SECS)?;
            ScanConfiguration::new(threads, dns_timeout, Vec::new())?;
            let stages = parse_stages(&pipeline);
            if stages.is_empty() {
                warn!(pipeline = %pipeline, "No known stages selected.");
            }
            let options = PipelineOptions {
                domain,
                stages,
                threads,
                dns_timeout,
                connect_timeout: timeout_from_secs(DEFAULT_SCAN_TIMEOUT_SECS)?,
                http_timeout: DEFAULT_HTTP_TIMEOUT,
                wordlist: None,
                check_liveness: true,
            };
            let resolver = SystemResolver::new(options.dns_timeout);

            let spinner = ui::create_spinner("run".to_string());
            let report = Pipeline::new(options, resolver, TokioConnector)
                .with_progress(ui::progress_hook(&spinner))
                .run()
                .await;
            spinner.finish_and_clear();

            let saved = save_output(&report, Some(&output));
            ui::print_pipeline_summary(&report, saved.then_some(output.as_path()));
        }
        Commands::Export { data, output, format } => {
            if !data.is_file() {
                return Err(ValidationError::MissingInput(data).into());
            }
            let content = std::fs::read_to_string(&data)
                .map_err(|source| ReconError::Read { path: data.clone(), source })?;
            let value = exporter::parse_input(&content, &data)?;
            let format = exporter::save(&value, &output, &format)?;
            ui::print_status(&format!("Exported {} as {format} to {}", data.display(), output.display()));
        }
    }
    Ok(())
}

/// Writes a command's result when `-o` was given. A failed write is reported
/// but does not fail the command. Returns whether a file was written.
fn save_output<T: Serialize>(data: &T, output: Option<&Path>) -> bool {
    let Some(path) = output else {
        return false;
    };
    match exporter::save_report(data, path, "auto") {
        Ok(format) => {
            info!(path = %path.display(), format = %format, "Results saved.");
            ui::print_status(&format!("Results saved to {}", path.display()));
            true
        }
        Err(e) => {
            error!(path = %path.display(), error = %e, "Failed to save results.");
            ui::print_error(&format!("Failed to save results: {e}"));
            false
        }
    }
}
