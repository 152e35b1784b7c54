// src/core/scanner/dns_scanner.rs

use hickory_resolver::TokioAsyncResolver;
use hickory_resolver::config::{ResolverConfig, ResolverOpts};
use hickory_resolver::error::ResolveErrorKind;
use std::future::Future;
use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::core::config::ScanConfiguration;
use crate::core::engine::{Probe, ProbeScheduler, ProgressHook, ResultAggregator};
use crate::core::error::ProbeError;
use crate::core::models::{Candidate, ProbeOutcome, SubdomainReport};
use crate::core::scanner::liveness::{HttpLivenessProbe, StatusFetcher};
use crate::core::sources::CandidateSource;

/// Resolves a fully qualified name to its addresses.
///
/// A name that does not exist resolves to an empty list; only failures of
/// the lookup itself are errors.
pub trait HostResolver: Send + Sync + 'static {
    fn resolve(&self, fqdn: &str) -> impl Future<Output = Result<Vec<IpAddr>, ProbeError>> + Send;
}

/// The system's resolver configuration, through hickory.
pub struct SystemResolver {
    inner: TokioAsyncResolver,
}

impl SystemResolver {
    /// One attempt per query, bounded by `timeout`.
    pub fn new(timeout: Duration) -> Self {
        let (config, mut opts) = hickory_resolver::system_conf::read_system_conf().unwrap_or_else(|e| {
            warn!(error = %e, "Could not read system resolver configuration, using defaults.");
            (ResolverConfig::default(), ResolverOpts::default())
        });
        opts.attempts = 1;
        opts.timeout = timeout;
        Self { inner: TokioAsyncResolver::tokio(config, opts) }
    }
}

impl HostResolver for SystemResolver {
    async fn resolve(&self, fqdn: &str) -> Result<Vec<IpAddr>, ProbeError> {
        // Absolute name, so search domains are never appended.
        let absolute = format!("{}.", fqdn.trim_end_matches('.'));
        match self.inner.lookup_ip(absolute.as_str()).await {
            Ok(lookup) => Ok(lookup.iter().collect()),
            Err(e) => match e.kind() {
                ResolveErrorKind::NoRecordsFound { .. } => Ok(Vec::new()),
                _ => Err(ProbeError::Resolve(e.to_string())),
            },
        }
    }
}

/// Confirms a subname that resolves to at least one address.
///
/// There are no retries: a transient resolver failure looks exactly like a
/// name that does not exist, and the name is reported absent for this run.
pub struct DnsProbe<R> {
    resolver: R,
}

impl<R: HostResolver> DnsProbe<R> {
    pub fn new(resolver: R) -> Self {
        Self { resolver }
    }
}

impl<R: HostResolver> Probe for DnsProbe<R> {
    type Finding = String;

    async fn probe(&self, target: &Candidate) -> ProbeOutcome<String> {
        let Candidate::Subname(name) = target else {
            return ProbeOutcome::Errored(ProbeError::Unsupported(target.to_string()));
        };
        match self.resolver.resolve(name).await {
            Ok(addresses) if !addresses.is_empty() => {
                info!(subdomain = %name, addresses = addresses.len(), "Found subdomain.");
                ProbeOutcome::Confirmed(name.clone())
            }
            Ok(_) => ProbeOutcome::Absent,
            Err(e) => ProbeOutcome::Errored(e),
        }
    }
}

/// Brute-forces subnames of one domain, then checks which answer over HTTP.
pub struct SubdomainEnumerator<R, F> {
    domain: String,
    limits: ScanConfiguration,
    dns: Arc<DnsProbe<R>>,
    liveness: Option<Arc<HttpLivenessProbe<F>>>,
    sources: Vec<Box<dyn CandidateSource>>,
    progress: Option<ProgressHook>,
}

impl<R: HostResolver, F: StatusFetcher> SubdomainEnumerator<R, F> {
    /// `limits` supplies the concurrency limit and per-probe timeout; its
    /// targets are ignored in favour of the registered sources.
    pub fn new(domain: &str, limits: ScanConfiguration, resolver: R) -> Self {
        Self {
            domain: domain.to_lowercase(),
            limits,
            dns: Arc::new(DnsProbe::new(resolver)),
            liveness: None,
            sources: Vec::new(),
            progress: None,
        }
    }

    pub fn with_source(mut self, source: Box<dyn CandidateSource>) -> Self {
        self.sources.push(source);
        self
    }

    /// Enables the HTTP liveness stage.
    pub fn with_liveness(mut self, fetcher: F) -> Self {
        self.liveness = Some(Arc::new(HttpLivenessProbe::new(fetcher)));
        self
    }

    /// Ticks once per DNS probe.
    pub fn with_progress(mut self, hook: ProgressHook) -> Self {
        self.progress = Some(hook);
        self
    }

    /// Number of DNS candidates the registered sources produce.
    pub fn candidate_count(&self) -> usize {
        self.sources.iter().map(|s| s.fetch().len()).sum()
    }

    pub async fn run(&self) -> SubdomainReport {
        info!(domain = %self.domain, "Starting subdomain enumeration.");

        let mut targets = Vec::new();
        for source in &self.sources {
            let candidates = source.fetch();
            debug!(source = source.name(), candidates = candidates.len(), "Collected candidates.");
            targets.extend(candidates);
        }

        let found = ResultAggregator::new();
        let mut scheduler = ProbeScheduler::new(self.limits.with_targets(targets));
        if let Some(hook) = &self.progress {
            scheduler = scheduler.with_progress(Arc::clone(hook));
        }
        scheduler.run(Arc::clone(&self.dns), &found).await;

        let live = ResultAggregator::new();
        if let Some(probe) = &self.liveness {
            debug!(candidates = found.len(), "Checking HTTP liveness.");
            let targets = found.snapshot().into_iter().map(Candidate::Subname).collect();
            ProbeScheduler::new(self.limits.with_targets(targets))
                .run(Arc::clone(probe), &live)
                .await;
        }

        found.add(self.domain.clone());

        let report = SubdomainReport {
            domain: self.domain.clone(),
            subdomains: found.snapshot(),
            live: live.snapshot(),
        };
        info!(
            total = report.subdomains.len(),
            live = report.live.len(),
            "Subdomain enumeration finished."
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::sources::WordlistSource;
    use std::collections::HashSet;
    use std::net::Ipv4Addr;

    /// Resolves only the names it was given; everything else is NXDOMAIN.
    struct MockResolver {
        known: HashSet<String>,
    }

    impl MockResolver {
        fn confirming(names: &[&str]) -> Self {
            Self { known: names.iter().map(|n| n.to_string()).collect() }
        }
    }

    impl HostResolver for MockResolver {
        async fn resolve(&self, fqdn: &str) -> Result<Vec<IpAddr>, ProbeError> {
            if fqdn.starts_with("servfail.") {
                return Err(ProbeError::Resolve("SERVFAIL".into()));
            }
            if fqdn.starts_with("slow.") {
                std::future::pending::<()>().await;
            }
            if self.known.contains(fqdn) {
                Ok(vec![IpAddr::V4(Ipv4Addr::new(93, 184, 216, 34))])
            } else {
                Ok(Vec::new())
            }
        }
    }

    /// Every URL answers with the same status.
    struct AlwaysStatus(u16);

    impl StatusFetcher for AlwaysStatus {
        async fn fetch_status(&self, _url: &str) -> Result<u16, ProbeError> {
            Ok(self.0)
        }
    }

    fn limits() -> ScanConfiguration {
        ScanConfiguration::new(8, Duration::from_millis(200), Vec::new()).unwrap()
    }

    fn enumerator(words: &[&str], resolver: MockResolver) -> SubdomainEnumerator<MockResolver, AlwaysStatus> {
        let words = words.iter().map(|w| w.to_string()).collect();
        SubdomainEnumerator::new("example.com", limits(), resolver)
            .with_source(Box::new(WordlistSource::new("example.com", words)))
    }

    fn names(report: &SubdomainReport) -> Vec<&str> {
        report.subdomains.iter().map(String::as_str).collect()
    }

    #[tokio::test]
    async fn confirmed_subset_plus_root_domain() {
        let report = enumerator(&["www", "api"], MockResolver::confirming(&["www.example.com"]))
            .run()
            .await;
        assert_eq!(names(&report), vec!["example.com", "www.example.com"]);
        assert!(report.live.is_empty());
    }

    #[tokio::test]
    async fn result_is_exactly_the_confirmed_words() {
        let words = ["www", "mail", "dev", "vpn", "shop", "cdn"];
        let confirmed = ["mail.example.com", "vpn.example.com", "cdn.example.com"];
        let report = enumerator(&words, MockResolver::confirming(&confirmed)).run().await;

        let expected: HashSet<String> = confirmed
            .iter()
            .map(|s| s.to_string())
            .chain(std::iter::once("example.com".to_string()))
            .collect();
        let actual: HashSet<String> = report.subdomains.into_iter().collect();
        assert_eq!(actual, expected);
    }

    #[tokio::test]
    async fn resolver_errors_are_absent_not_fatal() {
        let report = enumerator(
            &["servfail", "www"],
            MockResolver::confirming(&["www.example.com", "servfail.example.com"]),
        )
        .run()
        .await;
        assert_eq!(names(&report), vec!["example.com", "www.example.com"]);
    }

    #[tokio::test(start_paused = true)]
    async fn timed_out_lookups_are_absent() {
        let report = enumerator(&["slow", "www"], MockResolver::confirming(&["slow.example.com", "www.example.com"]))
            .run()
            .await;
        assert_eq!(names(&report), vec!["example.com", "www.example.com"]);
    }

    #[tokio::test]
    async fn duplicate_words_do_not_duplicate_results() {
        let report = enumerator(&["www", "WWW", "www "], MockResolver::confirming(&["www.example.com"]))
            .run()
            .await;
        assert_eq!(report.subdomains.len(), 2);
    }

    #[tokio::test]
    async fn liveness_is_reported_but_never_filters_the_set() {
        let resolver = MockResolver::confirming(&["www.example.com", "api.example.com"]);
        let down = enumerator(&["www", "api"], resolver).with_liveness(AlwaysStatus(502)).run().await;
        assert_eq!(down.subdomains.len(), 3);
        assert!(down.live.is_empty());

        let resolver = MockResolver::confirming(&["www.example.com", "api.example.com"]);
        let up = enumerator(&["www", "api"], resolver).with_liveness(AlwaysStatus(301)).run().await;
        assert_eq!(up.subdomains.len(), 3);
        let live: Vec<&str> = up.live.iter().map(String::as_str).collect();
        assert_eq!(live, vec!["api.example.com", "www.example.com"]);
    }

    #[tokio::test]
    async fn same_configuration_twice_gives_the_same_set() {
        let first = enumerator(&["www", "api", "dev"], MockResolver::confirming(&["dev.example.com"]))
            .run()
            .await;
        let second = enumerator(&["www", "api", "dev"], MockResolver::confirming(&["dev.example.com"]))
            .run()
            .await;
        assert_eq!(first.subdomains, second.subdomains);
    }

    #[tokio::test]
    async fn no_sources_still_reports_the_root_domain() {
        let enumerator: SubdomainEnumerator<MockResolver, AlwaysStatus> =
            SubdomainEnumerator::new("Example.com", limits(), MockResolver::confirming(&[]));
        assert_eq!(enumerator.candidate_count(), 0);
        let report = enumerator.run().await;
        assert_eq!(names(&report), vec!["example.com"]);
    }
}
