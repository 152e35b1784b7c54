// src/core/catalog.rs

//! Static port tables: the well-known service names and the default
//! "top ports" list scanned when no port specification is given.

/// Label used for ports the catalog does not know.
pub const UNKNOWN_SERVICE: &str = "Unknown";

static SERVICES: &[(u16, &str)] = &[
    (21, "FTP"),
    (22, "SSH"),
    (23, "Telnet"),
    (25, "SMTP"),
    (53, "DNS"),
    (80, "HTTP"),
    (110, "POP3"),
    (111, "RPC"),
    (135, "MSRPC"),
    (139, "NetBIOS"),
    (143, "IMAP"),
    (443, "HTTPS"),
    (445, "SMB"),
    (993, "IMAPS"),
    (995, "POP3S"),
    (1723, "PPTP"),
    (3306, "MySQL"),
    (3389, "RDP"),
    (5000, "UPnP"),
    (5432, "PostgreSQL"),
    (5900, "VNC"),
    (6379, "Redis"),
    (8080, "HTTP-Proxy"),
    (8443, "HTTPS-Alt"),
    (8888, "HTTP-Alt"),
    (9000, "SonarQube"),
    (9200, "Elasticsearch"),
    (9300, "Elasticsearch-Cluster"),
    (27017, "MongoDB"),
    (28017, "MongoDB-HTTP"),
];

/// Ports probed by default, most interesting first. `--top-ports N` takes
/// a prefix of this list.
pub const COMMON_PORTS: &[u16] = &[
    21, 22, 23, 25, 53, 80, 110, 111, 135, 139, 143, 443, 445, 993, 995, 1723, 3306, 3389, 5900,
    8080, 8443, 8888, 9000, 10000, 11211, 27017, 28017, 5000, 5432, 6379, 9200, 9300, 8081, 8090,
    3000, 4000, 6000, 7000, 8000, 9001,
];

/// Returns the well-known service label for `port`, or `"Unknown"`.
pub fn service_name(port: u16) -> &'static str {
    SERVICES
        .iter()
        .find(|(p, _)| *p == port)
        .map(|(_, name)| *name)
        .unwrap_or(UNKNOWN_SERVICE)
}

/// The first `count` entries of [`COMMON_PORTS`].
pub fn top_ports(count: usize) -> Vec<u16> {
    COMMON_PORTS.iter().copied().take(count).collect()
}
