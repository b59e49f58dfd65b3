/// URL classification and domain extraction for tab records
use std::net::Ipv4Addr;

use url::{Host, Url};

/// Second-level labels that belong to a country TLD (`co.uk`, `com.cn`, ...)
const DOUBLE_TLD_LABELS: [&str; 7] = ["co", "com", "net", "org", "gov", "edu", "ac"];

/// Schemes of pages that belong to the browser itself
const INTERNAL_PREFIXES: [&str; 6] = [
    "chrome://",
    "chrome-extension://",
    "chrome-devtools://",
    "edge://",
    "about:",
    "view-source:",
];

/// Hostname shown next to a tab
///
/// - https://www.example.co.uk/path → example.co.uk
/// - https://www.rust-lang.org → rust-lang.org
/// - https://www.com → www.com (only two labels, kept as is)
/// - chrome://extensions/ → extensions
/// - file:///tmp/a.html → "" (no host)
/// - not a url?x=1 → "not a url" (unparsable input up to the query)
pub fn domain_from_url(url: &str) -> String {
    if url.is_empty() {
        return String::new();
    }

    match Url::parse(url) {
        Ok(parsed) => {
            let hostname = parsed.host_str().unwrap_or_default();
            match hostname.strip_prefix("www.") {
                Some(rest) if hostname.split('.').count() > 2 => rest.to_string(),
                _ => hostname.to_string(),
            }
        }
        Err(_) => url.split('?').next().unwrap_or_default().to_string(),
    }
}

/// Registrable part of a domain, used to group tabs when sorting
///
/// Examples:
/// - mail.google.com → google.com
/// - news.bbc.co.uk → bbc.co.uk
/// - shop.example.com.cn → example.com.cn
/// - localhost:3000 → localhost
pub fn base_domain(domain: &str) -> String {
    let without_port = domain.split(':').next().unwrap_or_default();
    let parts: Vec<&str> = without_port.split('.').collect();

    if parts.len() <= 2 {
        return without_port.to_string();
    }

    let num_parts = if DOUBLE_TLD_LABELS.contains(&parts[parts.len() - 2]) {
        3
    } else {
        2
    };

    parts[parts.len() - num_parts..].join(".")
}

/// Browser-internal or extension page
pub fn is_extension_url(url: &str) -> bool {
    INTERNAL_PREFIXES.iter().any(|prefix| url.starts_with(prefix))
}

/// Local file or a host on the loopback/private network
pub fn is_local_url(url: &str) -> bool {
    let Ok(parsed) = Url::parse(url) else {
        return false;
    };

    if parsed.scheme() == "file" {
        return true;
    }

    match parsed.host() {
        Some(Host::Domain(name)) => name == "localhost",
        Some(Host::Ipv4(addr)) => is_local_ipv4(addr),
        Some(Host::Ipv6(addr)) => addr.is_loopback() || addr.is_unspecified(),
        None => false,
    }
}

fn is_local_ipv4(addr: Ipv4Addr) -> bool {
    addr.is_loopback() || addr.is_private() || addr.is_unspecified()
}

/// URLs that are never written to the closed-tabs store
pub fn is_persistable_url(url: &str) -> bool {
    !url.is_empty() && !is_extension_url(url) && !is_local_url(url)
}
