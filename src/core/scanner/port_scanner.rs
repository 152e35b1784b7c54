// src/core/scanner/port_scanner.rs

use std::future::Future;
use std::io;
use std::sync::Arc;
use tokio::net::TcpStream;
use tracing::info;

use crate::core::catalog;
use crate::core::config::ScanConfiguration;
use crate::core::engine::{Probe, ProbeScheduler, ProgressHook, ResultAggregator};
use crate::core::error::ProbeError;
use crate::core::models::{Candidate, PortFinding, PortMap, ProbeOutcome};
use crate::core::sources::{CandidateSource, PortListSource};

/// Completes a TCP handshake with `host:port`.
pub trait Connector: Send + Sync + 'static {
    fn connect(&self, host: &str, port: u16) -> impl Future<Output = io::Result<()>> + Send;
}

/// Real connects through tokio.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioConnector;

impl Connector for TokioConnector {
    async fn connect(&self, host: &str, port: u16) -> io::Result<()> {
        let stream = TcpStream::connect((host, port)).await?;
        // No banner grabbing: close as soon as the handshake completes.
        drop(stream);
        Ok(())
    }
}

/// Connect scan of one endpoint. The service label comes from the catalog
/// and is not verified against the protocol actually spoken.
pub struct TcpConnectProbe<C> {
    connector: C,
}

impl<C: Connector> TcpConnectProbe<C> {
    pub fn new(connector: C) -> Self {
        Self { connector }
    }
}

impl<C: Connector> Probe for TcpConnectProbe<C> {
    type Finding = PortFinding;

    async fn probe(&self, target: &Candidate) -> ProbeOutcome<PortFinding> {
        let Candidate::Endpoint { host, port } = target else {
            return ProbeOutcome::Errored(ProbeError::Unsupported(target.to_string()));
        };
        match self.connector.connect(host, *port).await {
            Ok(()) => ProbeOutcome::Confirmed(PortFinding {
                port: *port,
                service: catalog::service_name(*port).to_string(),
            }),
            Err(e) if e.kind() == io::ErrorKind::ConnectionRefused => ProbeOutcome::Absent,
            Err(e) => ProbeOutcome::Errored(ProbeError::Connect(e.to_string())),
        }
    }
}

/// Connect-scans `ports` on `target` and returns the open ones in ascending
/// order. `limits` supplies the concurrency limit and per-probe timeout.
pub async fn run_port_scan<C: Connector>(
    target: &str,
    ports: &[u16],
    limits: &ScanConfiguration,
    connector: C,
    progress: Option<ProgressHook>,
) -> PortMap {
    info!(target, ports = ports.len(), "Starting port scan.");

    let candidates = PortListSource::new(target, ports.to_vec()).fetch();
    let mut scheduler = ProbeScheduler::new(limits.with_targets(candidates));
    if let Some(hook) = progress {
        scheduler = scheduler.with_progress(hook);
    }

    let found = ResultAggregator::new();
    scheduler.run(Arc::new(TcpConnectProbe::new(connector)), &found).await;

    let open = found.snapshot().into_port_map();
    for (port, service) in &open {
        info!(target, port, service = %service, "Open port.");
    }
    info!(target, open = open.len(), "Port scan finished.");
    open
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::net::TcpListener;

    /// Accepts only the listed ports, refuses the rest.
    struct MockNetwork {
        open: Vec<u16>,
    }

    impl Connector for MockNetwork {
        async fn connect(&self, _host: &str, port: u16) -> io::Result<()> {
            if self.open.contains(&port) {
                Ok(())
            } else {
                Err(io::Error::from(io::ErrorKind::ConnectionRefused))
            }
        }
    }

    fn limits() -> ScanConfiguration {
        ScanConfiguration::new(16, Duration::from_millis(500), Vec::new()).unwrap()
    }

    #[tokio::test]
    async fn open_port_is_labelled_from_the_catalog() {
        let open = run_port_scan(
            "127.0.0.1",
            &[22, 9999],
            &limits(),
            MockNetwork { open: vec![22] },
            None,
        )
        .await;
        assert_eq!(open, PortMap::from([(22, "SSH".to_string())]));
    }

    #[tokio::test]
    async fn result_is_in_ascending_port_order() {
        let open = run_port_scan(
            "10.0.0.5",
            &[8080, 22, 443, 22, 31337],
            &limits(),
            MockNetwork { open: vec![443, 22, 8080, 31337] },
            None,
        )
        .await;
        let ports: Vec<u16> = open.keys().copied().collect();
        assert_eq!(ports, vec![22, 443, 8080, 31337]);
        assert_eq!(open[&31337], "Unknown");
    }

    #[tokio::test]
    async fn other_connect_errors_are_reported_as_errors() {
        struct Unreachable;
        impl Connector for Unreachable {
            async fn connect(&self, _host: &str, _port: u16) -> io::Result<()> {
                Err(io::Error::from(io::ErrorKind::HostUnreachable))
            }
        }
        let probe = TcpConnectProbe::new(Unreachable);
        let outcome = probe.probe(&Candidate::endpoint("10.0.0.5", 80)).await;
        assert!(matches!(outcome, ProbeOutcome::Errored(ProbeError::Connect(_))));
    }

    #[tokio::test]
    async fn real_loopback_connect_scan() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let open_port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            loop {
                if listener.accept().await.is_err() {
                    break;
                }
            }
        });

        // Bind then release to get a port nothing listens on.
        let closed = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let closed_port = closed.local_addr().unwrap().port();
        drop(closed);

        let open = run_port_scan(
            "127.0.0.1",
            &[open_port, closed_port],
            &limits(),
            TokioConnector,
            None,
        )
        .await;
        assert!(open.contains_key(&open_port));
        assert!(!open.contains_key(&closed_port));
    }
}
