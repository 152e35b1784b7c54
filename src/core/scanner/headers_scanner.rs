// src/core/scanner/headers_scanner.rs

use reqwest::header::HeaderMap;
use reqwest::redirect::Policy;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use crate::core::config::USER_AGENT;
use crate::core::input::normalize_url;
use crate::core::knowledge_base::{self, HeaderGuidance};
use crate::core::models::{HeaderReport, SecurityCheck, SecurityStatus};

/// Longest header value copied into a security check.
const MAX_VALUE_LEN: usize = 100;

/// Fetches a page and grades its security headers.
pub struct HeaderAnalyzer {
    client: reqwest::Client,
}

impl HeaderAnalyzer {
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .redirect(Policy::limited(10))
            .build()?;
        Ok(Self { client })
    }

    /// Never fails: a transport error is recorded in `HeaderReport::error`
    /// and leaves the header and analysis maps empty.
    pub async fn analyze(&self, url: &str) -> HeaderReport {
        let url = normalize_url(url);
        info!(url = %url, "Starting headers scan.");

        match self.client.get(&url).send().await {
            Ok(response) => {
                info!(status = %response.status(), final_url = %response.url(), "Received HTTP response for headers scan.");
                let headers = response.headers();
                let mut security_analysis = analyze_security_headers(headers);
                security_analysis.insert(
                    "https_redirect".to_string(),
                    https_check(response.url().scheme() == "https"),
                );
                let report = HeaderReport {
                    url,
                    headers: collect_headers(headers),
                    security_analysis,
                    error: None,
                };
                let insecure = report
                    .security_analysis
                    .values()
                    .filter(|c| c.status != SecurityStatus::Secure)
                    .count();
                info!(headers = report.headers.len(), insecure, "Headers scan finished.");
                report
            }
            Err(e) => {
                error!(url = %url, error = %e, "HTTP request failed for headers scan.");
                HeaderReport { url, error: Some(format!("HTTP request failed: {e}")), ..Default::default() }
            }
        }
    }
}

/// Flattens a header map; repeated headers are joined with `", "`.
pub fn collect_headers(headers: &HeaderMap) -> BTreeMap<String, String> {
    let mut collected: BTreeMap<String, String> = BTreeMap::new();
    for (name, value) in headers {
        let value = value.to_str().unwrap_or("[Invalid UTF-8]");
        collected
            .entry(name.as_str().to_string())
            .and_modify(|existing| {
                existing.push_str(", ");
                existing.push_str(value);
            })
            .or_insert_with(|| value.to_string());
    }
    collected
}

/// Grades every header-based check from the knowledge base.
pub fn analyze_security_headers(headers: &HeaderMap) -> BTreeMap<String, SecurityCheck> {
    knowledge_base::all_guidance()
        .iter()
        .filter_map(|guidance| {
            let name = guidance.header?;
            Some((guidance.key.to_string(), grade(guidance, header_value(headers, name))))
        })
        .collect()
}

fn grade(guidance: &HeaderGuidance, value: Option<String>) -> SecurityCheck {
    let Some(value) = value else {
        debug!(check = guidance.key, "Header missing.");
        return SecurityCheck {
            status: SecurityStatus::Insecure,
            value: None,
            recommendation: guidance.when_insecure.to_string(),
        };
    };

    let (status, recommendation) = match guidance.key {
        "x_content_type_options" if !value.trim().eq_ignore_ascii_case("nosniff") => {
            (SecurityStatus::Insecure, guidance.when_insecure)
        }
        "xss_protection" if value.trim() == "0" => (
            SecurityStatus::Warning,
            guidance.when_weak.unwrap_or(guidance.when_insecure),
        ),
        _ => (SecurityStatus::Secure, guidance.when_secure),
    };
    SecurityCheck {
        status,
        value: Some(truncate(&value, MAX_VALUE_LEN)),
        recommendation: recommendation.to_string(),
    }
}

fn https_check(is_https: bool) -> SecurityCheck {
    let advice = knowledge_base::guidance("https_redirect");
    let (status, recommendation) = if is_https {
        (SecurityStatus::Secure, advice.map(|g| g.when_secure))
    } else {
        (SecurityStatus::Insecure, advice.map(|g| g.when_insecure))
    };
    SecurityCheck { status, value: None, recommendation: recommendation.unwrap_or_default().to_string() }
}

fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers.get(name).map(|value| match value.to_str() {
        Ok(s) => s.to_string(),
        Err(_) => {
            warn!(header_name = name, "Header found but contained invalid UTF-8.");
            "[Invalid UTF-8]".to_string()
        }
    })
}

fn truncate(value: &str, max_chars: usize) -> String {
    value.chars().take(max_chars).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.append(*name, HeaderValue::from_static(value));
        }
        map
    }

    #[test]
    fn missing_headers_are_insecure() {
        let analysis = analyze_security_headers(&HeaderMap::new());
        assert_eq!(analysis.len(), 6);
        assert!(analysis.values().all(|c| c.status == SecurityStatus::Insecure));
        assert_eq!(analysis["csp"].recommendation, "Add a Content-Security-Policy header");
    }

    #[test]
    fn present_headers_are_secure_with_values() {
        let analysis = analyze_security_headers(&headers(&[
            ("content-security-policy", "default-src 'self'"),
            ("x-frame-options", "DENY"),
            ("x-content-type-options", "nosniff"),
            ("strict-transport-security", "max-age=31536000"),
            ("referrer-policy", "no-referrer"),
            ("x-xss-protection", "1; mode=block"),
        ]));
        assert!(analysis.values().all(|c| c.status == SecurityStatus::Secure));
        assert_eq!(analysis["x_frame_options"].value.as_deref(), Some("DENY"));
    }

    #[test]
    fn weak_values_are_flagged() {
        let analysis = analyze_security_headers(&headers(&[
            ("x-content-type-options", "sniff-away"),
            ("x-xss-protection", "0"),
        ]));
        assert_eq!(analysis["x_content_type_options"].status, SecurityStatus::Insecure);
        assert_eq!(analysis["xss_protection"].status, SecurityStatus::Warning);
        assert_eq!(analysis["xss_protection"].recommendation, "Enable X-XSS-Protection");
    }

    #[test]
    fn long_values_are_truncated() {
        let long = "a".repeat(150);
        let mut map = HeaderMap::new();
        map.insert("content-security-policy", HeaderValue::from_str(&long).unwrap());
        let analysis = analyze_security_headers(&map);
        assert_eq!(analysis["csp"].value.as_ref().map(String::len), Some(MAX_VALUE_LEN));
    }

    #[test]
    fn repeated_headers_are_joined() {
        let collected = collect_headers(&headers(&[("set-cookie", "a=1"), ("set-cookie", "b=2"), ("server", "nginx")]));
        assert_eq!(collected["set-cookie"], "a=1, b=2");
        assert_eq!(collected["server"], "nginx");
    }

    #[test]
    fn https_check_follows_the_final_scheme() {
        assert_eq!(https_check(true).status, SecurityStatus::Secure);
        assert_eq!(https_check(false).status, SecurityStatus::Insecure);
    }

    #[tokio::test]
    async fn unreachable_host_yields_error_report() {
        let analyzer = HeaderAnalyzer::new(Duration::from_millis(500)).unwrap();
        // Nothing listens on port 1 of the loopback address.
        let report = analyzer.analyze("http://127.0.0.1:1").await;
        assert!(report.error.is_some());
        assert!(report.headers.is_empty());
        assert!(report.security_analysis.is_empty());
    }
}
