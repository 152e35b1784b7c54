// src/core/models.rs

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::core::error::ProbeError;

// --- Probe Inputs ---

/// A single unit of probe input. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Candidate {
    /// A composed subname such as `www.example.com`.
    Subname(String),
    /// A TCP endpoint.
    Endpoint { host: String, port: u16 },
}

impl Candidate {
    /// Composes `label + "." + domain`, lower-cased.
    pub fn subname(label: &str, domain: &str) -> Self {
        Candidate::Subname(format!("{}.{}", label.trim(), domain.trim()).to_lowercase())
    }

    pub fn endpoint(host: &str, port: u16) -> Self {
        Candidate::Endpoint { host: host.to_string(), port }
    }
}

impl fmt::Display for Candidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Candidate::Subname(name) => write!(f, "{name}"),
            Candidate::Endpoint { host, port } => write!(f, "{host}:{port}"),
        }
    }
}

// --- Probe Outputs ---

/// Result of one probe. `Errored` is distinct from `Absent` for diagnostics
/// only; the scheduler treats both as "not found".
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome<M> {
    Confirmed(M),
    Absent,
    Errored(ProbeError),
}

#[cfg(test)]
impl<M> ProbeOutcome<M> {
    pub fn is_confirmed(&self) -> bool {
        matches!(self, ProbeOutcome::Confirmed(_))
    }

    /// Folds `Errored` into `Absent`.
    pub fn into_confirmed(self) -> Option<M> {
        match self {
            ProbeOutcome::Confirmed(m) => Some(m),
            ProbeOutcome::Absent | ProbeOutcome::Errored(_) => None,
        }
    }
}

/// An open port together with its catalog label. The label is a lookup,
/// not a verified protocol identity.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PortFinding {
    pub port: u16,
    pub service: String,
}

/// Open ports in ascending order, mapped to their service labels.
pub type PortMap = BTreeMap<u16, String>;

/// Deduplicated, immutable output of a completed scheduler run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResultSet<T: Ord>(BTreeSet<T>);

impl<T: Ord> ResultSet<T> {
    pub(crate) fn from_set(set: BTreeSet<T>) -> Self {
        Self(set)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, value: &T) -> bool {
        self.0.contains(value)
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.0.iter()
    }
}

impl<T: Ord> Default for ResultSet<T> {
    fn default() -> Self {
        Self(BTreeSet::new())
    }
}

impl<T: Ord> IntoIterator for ResultSet<T> {
    type Item = T;
    type IntoIter = std::collections::btree_set::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl ResultSet<PortFinding> {
    pub fn into_port_map(self) -> PortMap {
        self.0.into_iter().map(|f| (f.port, f.service)).collect()
    }
}

// --- Subdomain Enumeration ---

/// Output of a subdomain enumeration.
///
/// `subdomains` is the DNS-confirmed set plus the root domain. `live` is the
/// subset that answered HTTP without a server error; it is reported alongside
/// and never filters `subdomains`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SubdomainReport {
    pub domain: String,
    pub subdomains: ResultSet<String>,
    pub live: ResultSet<String>,
}

// --- Fingerprint Models ---

/// A technology detected on a web endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Technology {
    pub name: String,
    pub category: String,
    pub version: Option<String>,
}

/// Details pulled from the HTML document in detailed mode.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PageInfo {
    pub title: Option<String>,
    pub meta_tags: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FingerprintReport {
    pub url: String,
    pub server_info: BTreeMap<String, String>,
    pub technologies: Vec<Technology>,
    pub security_headers: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_info: Option<PageInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_length: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

// --- Header Analysis Models ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum SecurityStatus {
    Secure,
    Insecure,
    Warning,
}

/// Verdict for one security header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityCheck {
    pub status: SecurityStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    pub recommendation: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HeaderReport {
    pub url: String,
    pub headers: BTreeMap<String, String>,
    pub security_analysis: BTreeMap<String, SecurityCheck>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subname_composes_label_and_domain() {
        assert_eq!(
            Candidate::subname("WWW", "Example.com"),
            Candidate::Subname("www.example.com".to_string())
        );
        assert_eq!(Candidate::endpoint("127.0.0.1", 22).to_string(), "127.0.0.1:22");
    }

    #[test]
    fn errored_folds_into_absent() {
        let errored: ProbeOutcome<u16> = ProbeOutcome::Errored(ProbeError::Connect("refused".into()));
        assert!(!errored.is_confirmed());
        assert_eq!(errored.into_confirmed(), None);
        assert_eq!(ProbeOutcome::Confirmed(22u16).into_confirmed(), Some(22));
    }

    #[test]
    fn port_findings_become_ascending_port_map() {
        let set: BTreeSet<PortFinding> = [443u16, 22, 80]
            .into_iter()
            .map(|port| PortFinding { port, service: format!("svc{port}") })
            .collect();
        let map = ResultSet::from_set(set).into_port_map();
        assert_eq!(map.keys().copied().collect::<Vec<_>>(), vec![22, 80, 443]);
    }

    #[test]
    fn security_status_serializes_lowercase() {
        let json = serde_json::to_string(&SecurityStatus::Insecure).unwrap();
        assert_eq!(json, "\"insecure\"");
        assert_eq!(SecurityStatus::Warning.to_string(), "warning");
    }
}
