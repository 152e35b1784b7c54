// src/core/scanner/mod.rs

// Each scanner owns one kind of probe or analysis. The DNS, port and liveness
// scanners run on the shared engine; fingerprinting and header analysis are
// single-request analyzers.
pub mod dns_scanner;
pub mod fingerprint_scanner;
pub mod headers_scanner;
pub mod liveness;
pub mod port_scanner;

pub use dns_scanner::{HostResolver, SubdomainEnumerator, SystemResolver};
pub use fingerprint_scanner::Fingerprinter;
pub use headers_scanner::HeaderAnalyzer;
pub use liveness::build_liveness_client;
pub use port_scanner::{Connector, TokioConnector, run_port_scan};
