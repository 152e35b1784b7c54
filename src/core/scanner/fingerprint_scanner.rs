// src/core/scanner/fingerprint_scanner.rs

use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::header::{CONTENT_TYPE, HeaderMap};
use reqwest::redirect::Policy;
use scraper::{Html, Selector};
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{debug, error, info};

use crate::core::config::USER_AGENT;
use crate::core::input::normalize_url;
use crate::core::models::{FingerprintReport, PageInfo, Technology};

/// Defines the different types of checks that can be performed to identify a technology.
enum Check<'a> {
    /// Check for a pattern in a specific HTTP header.
    Header(&'a str, &'a Lazy<Regex>),
    /// Check for a pattern in the content of a specific meta tag.
    MetaTag(&'a str, &'a Lazy<Regex>),
    /// Check for a pattern in the HTML body.
    Body(&'a Lazy<Regex>),
    /// Check for a pattern in the `src` attribute of `<script>` tags.
    ScriptSrc(&'a Lazy<Regex>),
    /// Check for a pattern in the `href` attribute of `<link>` tags.
    LinkHref(&'a Lazy<Regex>),
    /// Check for a pattern in the `set-cookie` headers.
    Cookie(&'a Lazy<Regex>),
    /// Case-insensitive keyword anywhere in the body or in any header value.
    Keyword(&'a [&'a str]),
}

struct FingerprintRule<'a> {
    tech_name: &'a str,
    category: &'a str,
    check: Check<'a>,
}

static RE_NGINX: Lazy<Regex> = Lazy::new(|| Regex::new(r"nginx/([\d\.]+)").unwrap());
static RE_NGINX_ERROR: Lazy<Regex> = Lazy::new(|| Regex::new(r"<hr><center>nginx</center>").unwrap());
static RE_APACHE: Lazy<Regex> = Lazy::new(|| Regex::new(r"Apache/([\d\.]+)").unwrap());
static RE_IIS: Lazy<Regex> = Lazy::new(|| Regex::new(r"Microsoft-IIS/([\d\.]+)").unwrap());
static RE_LITESPEED: Lazy<Regex> = Lazy::new(|| Regex::new(r"LiteSpeed").unwrap());
static RE_WORDPRESS: Lazy<Regex> = Lazy::new(|| Regex::new(r"WordPress ([\d\.]+)").unwrap());
static RE_WP_EMBED: Lazy<Regex> = Lazy::new(|| Regex::new(r"/wp-content/|/wp-includes/").unwrap());
static RE_JOOMLA: Lazy<Regex> = Lazy::new(|| Regex::new(r"Joomla!").unwrap());
static RE_DRUPAL: Lazy<Regex> = Lazy::new(|| Regex::new(r"Drupal ([\d\.]+)?").unwrap());
static RE_PHP: Lazy<Regex> = Lazy::new(|| Regex::new(r"PHP/([\d\.]+)").unwrap());
static RE_PHPSESSID: Lazy<Regex> = Lazy::new(|| Regex::new(r"PHPSESSID").unwrap());
static RE_ASPNET: Lazy<Regex> = Lazy::new(|| Regex::new(r"ASP\.NET").unwrap());
static RE_JSESSIONID: Lazy<Regex> = Lazy::new(|| Regex::new(r"JSESSIONID").unwrap());
static RE_DJANGO_CSRF: Lazy<Regex> = Lazy::new(|| Regex::new(r"csrftoken").unwrap());
static RE_EXPRESS: Lazy<Regex> = Lazy::new(|| Regex::new(r"Express").unwrap());
static RE_NEXTJS_SCRIPT: Lazy<Regex> = Lazy::new(|| Regex::new(r"/_next/static/").unwrap());
static RE_ANGULAR: Lazy<Regex> = Lazy::new(|| Regex::new(r#"ng-version="([\d\.]+)""#).unwrap());
static RE_JQUERY: Lazy<Regex> = Lazy::new(|| Regex::new(r"jquery[-.]?([\d]+\.[\d\.]+)?(\.min)?\.js").unwrap());
static RE_REACT: Lazy<Regex> = Lazy::new(|| Regex::new(r"react-dom|data-reactroot").unwrap());
static RE_BOOTSTRAP: Lazy<Regex> = Lazy::new(|| Regex::new(r"bootstrap(\.min)?\.css").unwrap());
static RE_GOOGLE_ANALYTICS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"google-analytics\.com/|googletagmanager\.com/").unwrap());

static RULES: &[FingerprintRule] = &[
    FingerprintRule { tech_name: "Nginx", category: "Web Server", check: Check::Header("server", &RE_NGINX) },
    FingerprintRule { tech_name: "Nginx", category: "Web Server", check: Check::Body(&RE_NGINX_ERROR) },
    FingerprintRule { tech_name: "Nginx", category: "Web Server", check: Check::Keyword(&["nginx"]) },
    FingerprintRule { tech_name: "Apache", category: "Web Server", check: Check::Header("server", &RE_APACHE) },
    FingerprintRule { tech_name: "Apache", category: "Web Server", check: Check::Keyword(&["apache", "httpd"]) },
    FingerprintRule { tech_name: "IIS", category: "Web Server", check: Check::Header("server", &RE_IIS) },
    FingerprintRule { tech_name: "IIS", category: "Web Server", check: Check::Keyword(&["microsoft-iis", "iis"]) },
    FingerprintRule { tech_name: "LiteSpeed", category: "Web Server", check: Check::Header("server", &RE_LITESPEED) },
    FingerprintRule { tech_name: "Cloudflare", category: "CDN / WAF", check: Check::Keyword(&["cloudflare"]) },
    FingerprintRule { tech_name: "CloudFront", category: "CDN / WAF", check: Check::Keyword(&["cloudfront"]) },
    FingerprintRule { tech_name: "WordPress", category: "CMS", check: Check::MetaTag("generator", &RE_WORDPRESS) },
    FingerprintRule { tech_name: "WordPress", category: "CMS", check: Check::Body(&RE_WP_EMBED) },
    FingerprintRule { tech_name: "Joomla", category: "CMS", check: Check::MetaTag("generator", &RE_JOOMLA) },
    FingerprintRule { tech_name: "Drupal", category: "CMS", check: Check::MetaTag("generator", &RE_DRUPAL) },
    FingerprintRule { tech_name: "PHP", category: "Language", check: Check::Header("x-powered-by", &RE_PHP) },
    FingerprintRule { tech_name: "PHP", category: "Language", check: Check::Cookie(&RE_PHPSESSID) },
    FingerprintRule { tech_name: "ASP.NET", category: "Framework", check: Check::Header("x-powered-by", &RE_ASPNET) },
    FingerprintRule { tech_name: "Java", category: "Language", check: Check::Cookie(&RE_JSESSIONID) },
    FingerprintRule { tech_name: "Python/Django", category: "Framework", check: Check::Cookie(&RE_DJANGO_CSRF) },
    FingerprintRule { tech_name: "Express", category: "Framework", check: Check::Header("x-powered-by", &RE_EXPRESS) },
    FingerprintRule { tech_name: "Next.js", category: "JS Framework", check: Check::ScriptSrc(&RE_NEXTJS_SCRIPT) },
    FingerprintRule { tech_name: "Angular", category: "JS Framework", check: Check::Body(&RE_ANGULAR) },
    FingerprintRule { tech_name: "React", category: "JS Library", check: Check::Body(&RE_REACT) },
    FingerprintRule { tech_name: "jQuery", category: "JS Library", check: Check::ScriptSrc(&RE_JQUERY) },
    FingerprintRule { tech_name: "Bootstrap", category: "UI Framework", check: Check::LinkHref(&RE_BOOTSTRAP) },
    FingerprintRule { tech_name: "Google Analytics", category: "Analytics", check: Check::ScriptSrc(&RE_GOOGLE_ANALYTICS) },
];

/// Headers whose presence is copied into `FingerprintReport::security_headers`.
const SECURITY_HEADERS: &[&str] = &[
    "X-Frame-Options",
    "Content-Security-Policy",
    "X-Content-Type-Options",
    "Strict-Transport-Security",
    "Referrer-Policy",
];

/// Identifies the server software and web technologies behind a URL.
pub struct Fingerprinter {
    client: reqwest::Client,
}

impl Fingerprinter {
    /// Redirects are not followed: the first response is the one analysed.
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .redirect(Policy::none())
            .build()?;
        Ok(Self { client })
    }

    /// Runs a single GET against `url` and fingerprints the response.
    ///
    /// Schemeless input is treated as `http://`. Transport failures are
    /// recorded in the report's `error` field rather than returned.
    pub async fn analyze(&self, url: &str, detailed: bool) -> FingerprintReport {
        let url = normalize_url(url);
        info!(url = %url, detailed, "Starting fingerprint scan.");

        let mut report = FingerprintReport { url: url.clone(), ..Default::default() };

        let response = match self.client.get(&url).send().await {
            Ok(res) => {
                info!(status = %res.status(), "Received HTTP response.");
                res
            }
            Err(e) => {
                error!(url = %url, error = %e, "HTTP request failed");
                report.error = Some(format!("HTTP request failed: {e}"));
                return report;
            }
        };

        let status = response.status().as_u16();
        let headers = response.headers().clone();
        let body = match response.text().await {
            Ok(text) => {
                debug!(bytes = %text.len(), "Successfully read response body.");
                text
            }
            Err(e) => {
                error!(error = %e, "Failed to read response body");
                report.error = Some(format!("Failed to read response body: {e}"));
                return report;
            }
        };

        report.server_info = server_info(&headers);
        report.technologies = detect_technologies(&headers, &body);
        report.security_headers = present_security_headers(&headers);
        report.status_code = Some(status);
        report.content_type = Some(header_str(&headers, CONTENT_TYPE.as_str()).unwrap_or_default().to_string());
        report.content_length = Some(body.len());
        if detailed {
            report.page_info = Some(page_info(&Html::parse_document(&body)));
        }

        info!(count = %report.technologies.len(), "Fingerprint scan finished.");
        report
    }
}

/// Applies every rule to a response and returns the detected technologies,
/// sorted by name. A technology matched by several rules appears once, with
/// the first version any rule captured.
pub fn detect_technologies(headers: &HeaderMap, body: &str) -> Vec<Technology> {
    let document = Html::parse_document(body);
    let cookies = headers
        .get_all("set-cookie")
        .into_iter()
        .filter_map(|v| v.to_str().ok())
        .collect::<Vec<_>>()
        .join("; ");
    let body_lower = body.to_lowercase();
    let header_values: Vec<String> = headers
        .values()
        .filter_map(|v| v.to_str().ok())
        .map(str::to_lowercase)
        .collect();

    let mut found_techs: BTreeMap<&str, Technology> = BTreeMap::new();

    debug!(total_rules = %RULES.len(), "Applying fingerprinting rules.");
    for rule in RULES {
        let version = match &rule.check {
            Check::Header(name, re) => check_with_regex(header_str(headers, name), re),
            Check::MetaTag(name, re) => check_meta_tag(&document, name, re),
            Check::Body(re) => check_with_regex(Some(body), re),
            Check::ScriptSrc(re) => check_attr(&document, "script[src]", "src", re),
            Check::LinkHref(re) => check_attr(&document, "link[href]", "href", re),
            Check::Cookie(re) => check_with_regex(Some(&cookies), re),
            Check::Keyword(words) => words
                .iter()
                .any(|w| body_lower.contains(w) || header_values.iter().any(|v| v.contains(w)))
                .then_some(None),
        };

        if let Some(v) = version {
            debug!(tech = %rule.tech_name, version = ?v, "Rule matched.");
            found_techs
                .entry(rule.tech_name)
                .and_modify(|existing| {
                    if existing.version.is_none() && v.is_some() {
                        existing.version = v.clone();
                    }
                })
                .or_insert_with(|| Technology {
                    name: rule.tech_name.to_string(),
                    category: rule.category.to_string(),
                    version: v,
                });
        }
    }

    found_techs.into_values().collect()
}

/// `server` and `x_powered_by`, when the response carries them.
fn server_info(headers: &HeaderMap) -> BTreeMap<String, String> {
    [("server", "server"), ("x-powered-by", "x_powered_by")]
        .into_iter()
        .filter_map(|(header, key)| header_str(headers, header).map(|v| (key.to_string(), v.to_string())))
        .collect()
}

fn present_security_headers(headers: &HeaderMap) -> BTreeMap<String, String> {
    SECURITY_HEADERS
        .iter()
        .filter_map(|name| header_str(headers, name).map(|v| (name.to_string(), v.to_string())))
        .collect()
}

/// Title plus every `<meta>` carrying a `name` or `property` attribute.
pub fn page_info(doc: &Html) -> PageInfo {
    let title = Selector::parse("title").ok().and_then(|sel| {
        doc.select(&sel)
            .next()
            .map(|el| el.text().collect::<String>().trim().to_string())
    });

    let mut meta_tags = BTreeMap::new();
    if let Ok(selector) = Selector::parse("meta") {
        for el in doc.select(&selector) {
            let attrs = el.value();
            if let Some(key) = attrs.attr("name").or_else(|| attrs.attr("property")) {
                meta_tags.insert(key.to_string(), attrs.attr("content").unwrap_or_default().to_string());
            }
        }
    }

    PageInfo { title, meta_tags }
}

fn header_str<'h>(headers: &'h HeaderMap, name: &str) -> Option<&'h str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

/// `Some(version)` if the regex matches, where `version` is the first
/// non-empty capture group, if any.
fn check_with_regex(text_option: Option<&str>, re: &Regex) -> Option<Option<String>> {
    text_option.and_then(|text| {
        re.captures(text).map(|caps| {
            caps.get(1)
                .map(|m| m.as_str().to_string())
                .filter(|s| !s.is_empty())
        })
    })
}

fn check_meta_tag(doc: &Html, name: &str, re: &Regex) -> Option<Option<String>> {
    let selector = Selector::parse(&format!("meta[name='{name}']")).ok()?;
    let content = doc.select(&selector).next().and_then(|el| el.value().attr("content"));
    check_with_regex(content, re)
}

/// First element matching `selector` whose `attr` matches the regex.
fn check_attr(doc: &Html, selector: &str, attr: &str, re: &Regex) -> Option<Option<String>> {
    let selector = Selector::parse(selector).ok()?;
    doc.select(&selector)
        .filter_map(|el| el.value().attr(attr))
        .find_map(|value| check_with_regex(Some(value), re))
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

    fn names(techs: &[Technology]) -> Vec<&str> {
        techs.iter().map(|t| t.name.as_str()).collect()
    }

    #[test]
    fn server_header_yields_versioned_technology() {
        let techs = detect_technologies(&headers(&[("server", "nginx/1.25.3")]), "<html></html>");
        assert_eq!(names(&techs), vec!["Nginx"]);
        assert_eq!(techs[0].version.as_deref(), Some("1.25.3"));
        assert_eq!(techs[0].category, "Web Server");
    }

    #[test]
    fn keywords_match_body_or_any_header_value() {
        let techs = detect_technologies(
            &headers(&[("via", "1.1 abc.cloudfront.net (CloudFront)")]),
            "<p>Protected by Cloudflare</p>",
        );
        assert_eq!(names(&techs), vec!["CloudFront", "Cloudflare"]);
    }

    #[test]
    fn rules_for_the_same_technology_merge_versions() {
        let body = r#"<html><head><meta name="generator" content="WordPress 6.4.2"></head>
            <body><img src="/wp-content/uploads/a.png"></body></html>"#;
        let techs = detect_technologies(&HeaderMap::new(), body);
        let wp: Vec<_> = techs.iter().filter(|t| t.name == "WordPress").collect();
        assert_eq!(wp.len(), 1);
        assert_eq!(wp[0].version.as_deref(), Some("6.4.2"));
    }

    #[test]
    fn cookies_and_script_tags_are_inspected() {
        let body = r#"<script src="https://code.jquery.com/jquery-3.7.1.min.js"></script>"#;
        let techs = detect_technologies(&headers(&[("set-cookie", "PHPSESSID=abc; path=/")]), body);
        assert_eq!(names(&techs), vec!["PHP", "jQuery"]);
        assert_eq!(techs[1].version.as_deref(), Some("3.7.1"));
    }

    #[test]
    fn plain_page_has_no_technologies() {
        assert!(detect_technologies(&HeaderMap::new(), "<html><body>hello</body></html>").is_empty());
    }

    #[test]
    fn server_info_and_security_headers() {
        let map = headers(&[
            ("server", "Apache/2.4.58"),
            ("x-powered-by", "PHP/8.2.1"),
            ("x-frame-options", "DENY"),
            ("strict-transport-security", "max-age=63072000"),
        ]);
        let info = server_info(&map);
        assert_eq!(info["server"], "Apache/2.4.58");
        assert_eq!(info["x_powered_by"], "PHP/8.2.1");

        let present = present_security_headers(&map);
        assert_eq!(present.len(), 2);
        assert_eq!(present["X-Frame-Options"], "DENY");
    }

    #[test]
    fn page_info_collects_title_and_meta() {
        let doc = Html::parse_document(
            r#"<html><head><title> Example Domain </title>
            <meta name="description" content="An example">
            <meta property="og:title" content="Example">
            <meta charset="utf-8"></head></html>"#,
        );
        let info = page_info(&doc);
        assert_eq!(info.title.as_deref(), Some("Example Domain"));
        assert_eq!(info.meta_tags.len(), 2);
        assert_eq!(info.meta_tags["og:title"], "Example");
    }

    #[tokio::test]
    async fn unreachable_host_sets_error() {
        let fingerprinter = Fingerprinter::new(Duration::from_millis(500)).unwrap();
        let report = fingerprinter.analyze("127.0.0.1:1", true).await;
        assert_eq!(report.url, "http://127.0.0.1:1");
        assert!(report.error.is_some());
        assert!(report.technologies.is_empty());
        assert!(report.status_code.is_none());
    }
}
