// src/core/sources.rs

//! Producers of initial probe candidates.
//!
//! Only local sources ship: a wordlist of subname labels and a list of
//! ports for one host. Passive-intelligence feeds (certificate transparency,
//! passive DNS) plug in by implementing [`CandidateSource`].

use crate::core::models::Candidate;

/// Built-in subname labels used when no wordlist file is given.
pub const DEFAULT_WORDLIST: &[&str] = &[
    "www", "mail", "ftp", "admin", "test", "dev", "staging", "api", "blog", "webmail", "cpanel",
    "whm", "webdisk", "server", "ns1", "ns2", "ns3", "ns4", "m", "mobile", "secure", "vpn",
    "portal", "app", "beta", "demo", "shop", "store", "support", "status", "git", "svn", "dns",
    "cdn", "mx", "smtp", "pop", "imap", "static", "assets", "media", "download", "upload",
    "forum", "community", "wiki", "docs", "help", "knowledgebase", "kb", "client", "clients",
    "my", "account", "accounts", "login", "signin", "auth", "oauth", "sso", "idp", "ldap", "ad",
    "adfs", "owa", "exchange", "outlook", "remote", "ssh", "sftp", "phpmyadmin", "mysql",
    "mariadb", "postgres", "mongodb", "redis", "memcached", "elasticsearch", "kibana", "grafana",
    "prometheus", "alertmanager", "jenkins", "gitlab", "nexus", "artifactory", "sonar",
    "sonarqube", "jira", "confluence", "bitbucket", "bamboo", "crowd", "fisheye", "crucible",
];

/// A pluggable producer of candidates.
pub trait CandidateSource: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    fn fetch(&self) -> Vec<Candidate>;
}

/// Subnames composed from a list of labels under one domain.
#[derive(Debug, Clone)]
pub struct WordlistSource {
    domain: String,
    labels: Vec<String>,
}

impl WordlistSource {
    pub fn new(domain: &str, labels: Vec<String>) -> Self {
        Self { domain: domain.to_lowercase(), labels }
    }

    /// Uses [`DEFAULT_WORDLIST`].
    pub fn builtin(domain: &str) -> Self {
        Self::new(domain, DEFAULT_WORDLIST.iter().map(|w| w.to_string()).collect())
    }
}

impl CandidateSource for WordlistSource {
    fn name(&self) -> &str {
        "wordlist"
    }

    fn fetch(&self) -> Vec<Candidate> {
        self.labels
            .iter()
            .map(|label| label.trim())
            .filter(|label| !label.is_empty())
            .map(|label| Candidate::subname(label, &self.domain))
            .collect()
    }
}

/// TCP endpoints for a list of ports on one host.
#[derive(Debug, Clone)]
pub struct PortListSource {
    host: String,
    ports: Vec<u16>,
}

impl PortListSource {
    pub fn new(host: &str, ports: Vec<u16>) -> Self {
        Self { host: host.to_string(), ports }
    }
}

impl CandidateSource for PortListSource {
    fn name(&self) -> &str {
        "ports"
    }

    fn fetch(&self) -> Vec<Candidate> {
        self.ports.iter().map(|&port| Candidate::endpoint(&self.host, port)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wordlist_composes_subnames_and_skips_blanks() {
        let source = WordlistSource::new(
            "Example.com",
            vec!["www".into(), "  ".into(), " api ".into()],
        );
        assert_eq!(
            source.fetch(),
            vec![
                Candidate::Subname("www.example.com".into()),
                Candidate::Subname("api.example.com".into()),
            ]
        );
    }

    #[test]
    fn builtin_wordlist_is_not_empty() {
        let source = WordlistSource::builtin("example.com");
        assert_eq!(source.fetch().len(), DEFAULT_WORDLIST.len());
        assert_eq!(source.name(), "wordlist");
    }

    #[test]
    fn port_list_keeps_order() {
        let source = PortListSource::new("127.0.0.1", vec![443, 22]);
        assert_eq!(
            source.fetch(),
            vec![Candidate::endpoint("127.0.0.1", 443), Candidate::endpoint("127.0.0.1", 22)]
        );
    }
}
