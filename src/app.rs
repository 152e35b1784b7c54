// src/app.rs

//! The `run` pipeline: subdomain enumeration feeding port scans, fingerprinting
//! and header analysis of the first few hosts found.

use chrono::{DateTime, Local};
use serde::Serialize;
use std::collections::BTreeMap;
use std::str::FromStr;
use std::time::Duration;
use strum::{Display, EnumString};
use tracing::{info, warn};

use crate::core::catalog::COMMON_PORTS;
use crate::core::config::ScanConfiguration;
use crate::core::engine::ProgressHook;
use crate::core::models::{FingerprintReport, HeaderReport, PortMap, SubdomainReport};
use crate::core::scanner::liveness::build_liveness_client;
use crate::core::scanner::{
    Connector, Fingerprinter, HeaderAnalyzer, HostResolver, SubdomainEnumerator, run_port_scan,
};
use crate::core::sources::WordlistSource;

/// Hosts port-scanned by the `scan` stage.
const SCAN_HOST_LIMIT: usize = 5;
/// Hosts fingerprinted by the `fingerprint` stage.
const FINGERPRINT_HOST_LIMIT: usize = 3;
/// Hosts analysed by the `headers` stage.
const HEADERS_HOST_LIMIT: usize = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Enum,
    Scan,
    Fingerprint,
    Headers,
}

/// Parses a comma-separated stage list. Unknown names are logged and
/// skipped; repeats keep their first position.
pub fn parse_stages(list: &str) -> Vec<Stage> {
    let mut stages = Vec::new();
    for name in list.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        match Stage::from_str(name) {
            Ok(stage) if !stages.contains(&stage) => stages.push(stage),
            Ok(_) => {}
            Err(_) => warn!(stage = name, "Unknown pipeline stage, skipping."),
        }
    }
    stages
}

/// A stage failure. Recorded in the report, never fatal to the run.
#[derive(Debug, Clone, Serialize)]
pub struct StageError {
    pub stage: Stage,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PipelineReport {
    pub domain: String,
    pub generated_at: DateTime<Local>,
    pub stages: Vec<Stage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subdomains: Option<SubdomainReport>,
    /// Only hosts with at least one open port.
    pub ports: BTreeMap<String, PortMap>,
    pub fingerprints: BTreeMap<String, FingerprintReport>,
    pub headers: BTreeMap<String, HeaderReport>,
    pub errors: Vec<StageError>,
}

impl PipelineReport {
    fn new(domain: &str, stages: &[Stage]) -> Self {
        Self {
            domain: domain.to_string(),
            generated_at: Local::now(),
            stages: stages.to_vec(),
            subdomains: None,
            ports: BTreeMap::new(),
            fingerprints: BTreeMap::new(),
            headers: BTreeMap::new(),
            errors: Vec::new(),
        }
    }

    fn record_error(&mut self, stage: Stage, target: Option<&str>, message: impl Into<String>) {
        let message = message.into();
        warn!(stage = %stage, target = target.unwrap_or("-"), error = %message, "Pipeline stage error.");
        self.errors.push(StageError { stage, target: target.map(String::from), message });
    }

    /// Hosts later stages work on: the root domain first, then the other
    /// discovered subdomains in order.
    pub fn hosts(&self) -> Vec<String> {
        let mut hosts = vec![self.domain.clone()];
        if let Some(report) = &self.subdomains {
            hosts.extend(report.subdomains.iter().filter(|s| **s != self.domain).cloned());
        }
        hosts
    }
}

/// Tunables for one pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub domain: String,
    pub stages: Vec<Stage>,
    pub threads: usize,
    pub dns_timeout: Duration,
    pub connect_timeout: Duration,
    pub http_timeout: Duration,
    /// Subname labels; the built-in list when `None`.
    pub wordlist: Option<Vec<String>>,
    /// Run the HTTP liveness check after DNS enumeration.
    pub check_liveness: bool,
}

/// Runs the selected stages in a fixed order: enum, scan, fingerprint, headers.
pub struct Pipeline<R, C> {
    options: PipelineOptions,
    resolver: R,
    connector: C,
    progress: Option<ProgressHook>,
}

impl<R: HostResolver, C: Connector + Clone> Pipeline<R, C> {
    pub fn new(options: PipelineOptions, resolver: R, connector: C) -> Self {
        Self { options, resolver, connector, progress: None }
    }

    /// Ticks once per probe of every engine-driven stage.
    pub fn with_progress(mut self, hook: ProgressHook) -> Self {
        self.progress = Some(hook);
        self
    }

    pub async fn run(self) -> PipelineReport {
        let Pipeline { options, resolver, connector, progress } = self;
        let stages = options.stages.clone();
        let mut report = PipelineReport::new(&options.domain, &stages);
        info!(domain = %options.domain, stages = ?stages, "Starting pipeline.");

        if stages.contains(&Stage::Enum) {
            enumerate(&options, resolver, progress.clone(), &mut report).await;
        }
        if stages.contains(&Stage::Scan) {
            scan(&options, connector, progress, &mut report).await;
        }
        if stages.contains(&Stage::Fingerprint) {
            fingerprint(&options, &mut report).await;
        }
        if stages.contains(&Stage::Headers) {
            analyze_headers(&options, &mut report).await;
        }

        info!(errors = report.errors.len(), "Pipeline finished.");
        report
    }
}

async fn enumerate<R: HostResolver>(
    options: &PipelineOptions,
    resolver: R,
    progress: Option<ProgressHook>,
    report: &mut PipelineReport,
) {
    let limits = match ScanConfiguration::new(options.threads, options.dns_timeout, Vec::new()) {
        Ok(limits) => limits,
        Err(e) => return report.record_error(Stage::Enum, None, e.to_string()),
    };

    let source = match &options.wordlist {
        Some(words) => WordlistSource::new(&options.domain, words.clone()),
        None => WordlistSource::builtin(&options.domain),
    };
    let mut enumerator = SubdomainEnumerator::new(&options.domain, limits, resolver).with_source(Box::new(source));
    if let Some(hook) = progress {
        enumerator = enumerator.with_progress(hook);
    }
    if options.check_liveness {
        match build_liveness_client(options.http_timeout) {
            Ok(client) => enumerator = enumerator.with_liveness(client),
            Err(e) => report.record_error(Stage::Enum, None, format!("liveness check disabled: {e}")),
        }
    }

    report.subdomains = Some(enumerator.run().await);
}

async fn scan<C: Connector + Clone>(
    options: &PipelineOptions,
    connector: C,
    progress: Option<ProgressHook>,
    report: &mut PipelineReport,
) {
    let limits = match ScanConfiguration::new(options.threads, options.connect_timeout, Vec::new()) {
        Ok(limits) => limits,
        Err(e) => return report.record_error(Stage::Scan, None, e.to_string()),
    };

    for host in report.hosts().into_iter().take(SCAN_HOST_LIMIT) {
        let open = run_port_scan(&host, COMMON_PORTS, &limits, connector.clone(), progress.clone()).await;
        if !open.is_empty() {
            report.ports.insert(host, open);
        }
    }
}

async fn fingerprint(options: &PipelineOptions, report: &mut PipelineReport) {
    let fingerprinter = match Fingerprinter::new(options.http_timeout) {
        Ok(f) => f,
        Err(e) => return report.record_error(Stage::Fingerprint, None, e.to_string()),
    };

    for host in report.hosts().into_iter().take(FINGERPRINT_HOST_LIMIT) {
        let result = fingerprinter.analyze(&host, false).await;
        if let Some(e) = &result.error {
            report.record_error(Stage::Fingerprint, Some(&host), e.clone());
        }
        report.fingerprints.insert(host, result);
    }
}

async fn analyze_headers(options: &PipelineOptions, report: &mut PipelineReport) {
    let analyzer = match HeaderAnalyzer::new(options.http_timeout) {
        Ok(a) => a,
        Err(e) => return report.record_error(Stage::Headers, None, e.to_string()),
    };

    for host in report.hosts().into_iter().take(HEADERS_HOST_LIMIT) {
        let result = analyzer.analyze(&host).await;
        if let Some(e) = &result.error {
            report.record_error(Stage::Headers, Some(&host), e.clone());
        }
        report.headers.insert(host, result);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::ProbeError;
    use std::io;
    use std::net::{IpAddr, Ipv4Addr};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct MockResolver(Vec<&'static str>);

    impl HostResolver for MockResolver {
        async fn resolve(&self, fqdn: &str) -> Result<Vec<IpAddr>, ProbeError> {
            let known = self.0.iter().any(|name| *name == fqdn);
            Ok(if known { vec![IpAddr::V4(Ipv4Addr::LOCALHOST)] } else { Vec::new() })
        }
    }

    /// Port 22 open everywhere, port 80 open only on the root domain.
    #[derive(Clone)]
    struct MockNetwork;

    impl Connector for MockNetwork {
        async fn connect(&self, host: &str, port: u16) -> io::Result<()> {
            match (host, port) {
                (_, 22) | ("example.com", 80) => Ok(()),
                _ => Err(io::Error::from(io::ErrorKind::ConnectionRefused)),
            }
        }
    }

    fn options(stages: &str) -> PipelineOptions {
        PipelineOptions {
            domain: "example.com".to_string(),
            stages: parse_stages(stages),
            threads: 8,
            dns_timeout: Duration::from_millis(200),
            connect_timeout: Duration::from_millis(200),
            http_timeout: Duration::from_millis(200),
            wordlist: Some(vec!["www".into(), "api".into(), "dev".into()]),
            check_liveness: false,
        }
    }

    #[test]
    fn stages_parse_case_insensitively_and_skip_unknown() {
        assert_eq!(
            parse_stages("enum, SCAN,bogus,,enum,headers"),
            vec![Stage::Enum, Stage::Scan, Stage::Headers]
        );
        assert!(parse_stages("").is_empty());
        assert_eq!(Stage::Fingerprint.to_string(), "fingerprint");
    }

    #[tokio::test]
    async fn enum_then_scan_records_hosts_with_open_ports() {
        let report = Pipeline::new(
            options("enum,scan"),
            MockResolver(vec!["www.example.com", "dev.example.com"]),
            MockNetwork,
        )
        .run()
        .await;

        let subdomains = report.subdomains.as_ref().unwrap();
        assert_eq!(subdomains.subdomains.len(), 3);
        assert_eq!(report.hosts(), vec!["example.com", "dev.example.com", "www.example.com"]);
        assert_eq!(report.ports.len(), 3);
        assert_eq!(report.ports["example.com"].keys().copied().collect::<Vec<_>>(), vec![22, 80]);
        assert_eq!(report.ports["www.example.com"].get(&22).map(String::as_str), Some("SSH"));
        assert!(report.errors.is_empty());
    }

    #[tokio::test]
    async fn scan_without_enum_targets_the_root_domain() {
        let report = Pipeline::new(options("scan"), MockResolver(vec![]), MockNetwork).run().await;
        assert!(report.subdomains.is_none());
        assert_eq!(report.ports.keys().collect::<Vec<_>>(), vec!["example.com"]);
    }

    #[tokio::test]
    async fn scan_covers_at_most_five_hosts() {
        let mut opts = options("enum,scan");
        opts.wordlist = Some((0..10).map(|i| format!("h{i}")).collect());
        let names: Vec<&'static str> = vec![
            "h0.example.com", "h1.example.com", "h2.example.com", "h3.example.com",
            "h4.example.com", "h5.example.com", "h6.example.com",
        ];
        let report = Pipeline::new(opts, MockResolver(names), MockNetwork).run().await;
        assert_eq!(report.subdomains.as_ref().map(|s| s.subdomains.len()), Some(8));
        assert_eq!(report.ports.len(), SCAN_HOST_LIMIT);
    }

    #[tokio::test]
    async fn invalid_limits_are_recorded_not_fatal() {
        let mut opts = options("enum,scan");
        opts.threads = 0;
        let report = Pipeline::new(opts, MockResolver(vec![]), MockNetwork).run().await;
        assert_eq!(report.errors.len(), 2);
        assert_eq!(report.errors[0].stage, Stage::Enum);
        assert_eq!(report.errors[1].stage, Stage::Scan);
        assert!(report.ports.is_empty());
    }

    #[tokio::test]
    async fn progress_ticks_for_every_probe() {
        let ticks = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&ticks);
        let report = Pipeline::new(options("enum,scan"), MockResolver(vec![]), MockNetwork)
            .with_progress(Arc::new(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            }))
            .run()
            .await;
        assert_eq!(report.hosts(), vec!["example.com"]);
        assert_eq!(ticks.load(Ordering::SeqCst), 3 + COMMON_PORTS.len());
    }

    #[test]
    fn report_serializes_stage_names_lowercase() {
        let report = PipelineReport::new("example.com", &[Stage::Enum, Stage::Headers]);
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["stages"], serde_json::json!(["enum", "headers"]));
        assert!(json.get("subdomains").is_none());
    }
}
