// src/core/input.rs

//! Validation and parsing of user input. Everything here runs before the
//! first socket is opened and fails with a [`ValidationError`].

use once_cell::sync::Lazy;
use regex::Regex;
use std::net::IpAddr;
use std::path::Path;
use tracing::{debug, info};
use url::Url;

use crate::core::error::{ReconError, ValidationError};

static RE_DOMAIN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?\.)+[A-Za-z]{2,63}$").unwrap()
});

/// Accepts `example.com`, `https://example.com/path` or `Example.COM.` and
/// returns the bare lower-case domain.
pub fn normalize_domain(input: &str) -> Result<String, ValidationError> {
    let trimmed = input.trim();
    let host = extract_host_from_url(trimmed).unwrap_or_else(|| trimmed.to_string());
    let domain = host.trim_end_matches('.').to_lowercase();
    if validate_domain(&domain) {
        Ok(domain)
    } else {
        Err(ValidationError::InvalidDomain(input.to_string()))
    }
}

pub fn validate_domain(domain: &str) -> bool {
    domain.len() <= 253 && RE_DOMAIN.is_match(domain)
}

pub fn validate_ip(ip: &str) -> bool {
    ip.parse::<IpAddr>().is_ok()
}

/// A scan target must be an IP address or a domain name.
pub fn validate_target(target: &str) -> Result<String, ValidationError> {
    let target = target.trim();
    if validate_ip(target) {
        return Ok(target.to_string());
    }
    normalize_domain(target).map_err(|_| ValidationError::InvalidTarget(target.to_string()))
}

/// Host part of a URL, if `input` has a scheme and a host.
pub fn extract_host_from_url(input: &str) -> Option<String> {
    if !input.contains("://") {
        return None;
    }
    Url::parse(input).ok().and_then(|url| url.host_str().map(String::from))
}

/// Prefixes `http://` when the input carries no scheme.
pub fn normalize_url(input: &str) -> String {
    let input = input.trim();
    if input.starts_with("http://") || input.starts_with("https://") {
        input.to_string()
    } else {
        format!("http://{input}")
    }
}

/// Reads a newline-delimited wordlist. Blank lines and `#` comments are
/// skipped; invalid UTF-8 is replaced rather than rejected.
pub fn load_wordlist(path: &Path) -> Result<Vec<String>, ReconError> {
    if !path.is_file() {
        return Err(ValidationError::MissingInput(path.to_path_buf()).into());
    }
    let bytes = std::fs::read(path)
        .map_err(|source| ReconError::Read { path: path.to_path_buf(), source })?;
    let words = parse_wordlist(&String::from_utf8_lossy(&bytes));
    info!(path = %path.display(), words = words.len(), "Loaded wordlist.");
    Ok(words)
}

pub fn parse_wordlist(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(String::from)
        .collect()
}

/// Parses `80,443,8000-8100` into a port list, in the order given.
///
/// Every token must be a port in `1..=65535` or an inclusive `start-end`
/// range with `start <= end`.
pub fn parse_port_spec(spec: &str) -> Result<Vec<u16>, ValidationError> {
    let invalid = |reason: &str| ValidationError::InvalidPortSpec {
        spec: spec.to_string(),
        reason: reason.to_string(),
    };

    if spec.trim().is_empty() {
        return Err(invalid("empty port specification"));
    }

    let mut ports = Vec::new();
    for token in spec.split(',').map(str::trim) {
        if token.is_empty() {
            return Err(invalid("empty token"));
        }
        match token.split_once('-') {
            Some((start, end)) => {
                let start = parse_port(start.trim())
                    .ok_or_else(|| invalid(&format!("bad range start in '{token}'")))?;
                let end = parse_port(end.trim())
                    .ok_or_else(|| invalid(&format!("bad range end in '{token}'")))?;
                if start > end {
                    return Err(invalid(&format!("range '{token}' is reversed")));
                }
                ports.extend(start..=end);
            }
            None => {
                let port = parse_port(token)
                    .ok_or_else(|| invalid(&format!("'{token}' is not a port between 1 and 65535")))?;
                ports.push(port);
            }
        }
    }
    debug!(spec, count = ports.len(), "Parsed port specification.");
    Ok(ports)
}

fn parse_port(token: &str) -> Option<u16> {
    if token.is_empty() || !token.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    token.parse::<u16>().ok().filter(|&p| p != 0)
}
