//! Static guidance for the HTTP security-header checks.
//!
//! Every check the header analyzer performs has one entry here carrying the
//! header it inspects and the advice shown for each verdict, so the wording
//! can change without touching the analysis code.

/// Guidance for one security-header check.
#[derive(Debug)]
pub struct HeaderGuidance {
    /// Key used in reports (e.g. `"csp"`).
    pub key: &'static str,
    /// Lower-case header name, or `None` for checks that do not read a header.
    pub header: Option<&'static str>,
    pub title: &'static str,
    /// Shown when the check passes.
    pub when_secure: &'static str,
    /// Shown when the header is missing or carries an unsafe value.
    pub when_insecure: &'static str,
    /// Shown when the header is present but configured weakly.
    pub when_weak: Option<&'static str>,
}

static GUIDANCE: &[HeaderGuidance] = &[
    HeaderGuidance {
        key: "csp",
        header: Some("content-security-policy"),
        title: "Content-Security-Policy",
        when_secure: "CSP present",
        when_insecure: "Add a Content-Security-Policy header",
        when_weak: None,
    },
    HeaderGuidance {
        key: "x_frame_options",
        header: Some("x-frame-options"),
        title: "X-Frame-Options",
        when_secure: "Protected against clickjacking",
        when_insecure: "Add X-Frame-Options: DENY or SAMEORIGIN",
        when_weak: None,
    },
    HeaderGuidance {
        key: "x_content_type_options",
        header: Some("x-content-type-options"),
        title: "X-Content-Type-Options",
        when_secure: "MIME sniffing disabled",
        when_insecure: "Add X-Content-Type-Options: nosniff",
        when_weak: None,
    },
    HeaderGuidance {
        key: "hsts",
        header: Some("strict-transport-security"),
        title: "Strict-Transport-Security",
        when_secure: "HSTS enabled",
        when_insecure: "Add a Strict-Transport-Security header",
        when_weak: None,
    },
    HeaderGuidance {
        key: "referrer_policy",
        header: Some("referrer-policy"),
        title: "Referrer-Policy",
        when_secure: "Referrer policy present",
        when_insecure: "Add a Referrer-Policy header",
        when_weak: None,
    },
    HeaderGuidance {
        key: "xss_protection",
        header: Some("x-xss-protection"),
        title: "X-XSS-Protection",
        when_secure: "XSS protection enabled",
        when_insecure: "Add X-XSS-Protection: 1; mode=block",
        when_weak: Some("Enable X-XSS-Protection"),
    },
    HeaderGuidance {
        key: "https_redirect",
        header: None,
        title: "HTTPS",
        when_secure: "Served over HTTPS",
        when_insecure: "Serve the site over HTTPS and redirect plain HTTP to it",
        when_weak: None,
    },
];

/// Looks up the guidance for a check key.
pub fn guidance(key: &str) -> Option<&'static HeaderGuidance> {
    GUIDANCE.iter().find(|g| g.key == key)
}

/// All checks, in report order.
pub fn all_guidance() -> &'static [HeaderGuidance] {
    GUIDANCE
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_are_unique() {
        let mut keys: Vec<_> = GUIDANCE.iter().map(|g| g.key).collect();
        keys.sort_unstable();
        keys.dedup();
        assert_eq!(keys.len(), GUIDANCE.len());
    }

    #[test]
    fn lookup_by_key() {
        assert_eq!(guidance("hsts").and_then(|g| g.header), Some("strict-transport-security"));
        assert!(guidance("https_redirect").is_some_and(|g| g.header.is_none()));
        assert!(guidance("nope").is_none());
    }
}
