// ABOUTME: SSRF defence for user-supplied media URLs
// ABOUTME: Checks the literal hostname, then re-checks every DNS-resolved address
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 CastCraft

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};

use tokio::net::lookup_host;
use url::{Host, Url};

use crate::errors::{AppError, AppResult};

const BLOCKED_MESSAGE: &str = "URL points to a private or internal address";

/// Private, loopback, link-local, CGNAT, and reserved IPv4 ranges.
///
/// The url crate normalizes decimal (2130706433), hex (0x7f000001), and
/// octal (0177.0.0.1) host literals into `Host::Ipv4`, so those spellings
/// land here too.
fn ipv4_blocked(ip: Ipv4Addr) -> bool {
    let octets = ip.octets();
    ip.is_loopback()
        || ip.is_private()
        || ip.is_link_local()
        || ip.is_broadcast()
        || ip.is_multicast()
        || octets[0] == 0
        // CGNAT 100.64.0.0/10
        || (octets[0] == 100 && (64..=127).contains(&octets[1]))
        // 240.0.0.0/4 reserved
        || octets[0] >= 240
}

fn ipv6_blocked(ip: Ipv6Addr) -> bool {
    if let Some(mapped) = ip.to_ipv4_mapped() {
        return ipv4_blocked(mapped);
    }
    let segments = ip.segments();
    ip.is_loopback()
        || ip.is_unspecified()
        // Unique local fc00::/7
        || (segments[0] & 0xfe00) == 0xfc00
        // Link-local fe80::/10
        || (segments[0] & 0xffc0) == 0xfe80
}

fn ip_blocked(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => ipv4_blocked(v4),
        IpAddr::V6(v6) => ipv6_blocked(v6),
    }
}

/// Validate a user-supplied media URL before any network activity.
///
/// Rejects non-HTTP(S) schemes, hostless URLs, localhost, and IP
/// literals in private or internal ranges in any spelling.
///
/// # Errors
///
/// Returns `InvalidInput` describing the first failed check.
pub fn validate_external_url(raw: &str) -> AppResult<Url> {
    let url = Url::parse(raw).map_err(|_| AppError::invalid_input("Invalid URL format"))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(AppError::invalid_input(
            "Only HTTP and HTTPS URLs are allowed",
        ));
    }

    match url.host() {
        None => Err(AppError::invalid_input("URL must have a valid hostname")),
        Some(Host::Ipv4(ip)) if ipv4_blocked(ip) => Err(AppError::invalid_input(BLOCKED_MESSAGE)),
        Some(Host::Ipv6(ip)) if ipv6_blocked(ip) => Err(AppError::invalid_input(BLOCKED_MESSAGE)),
        Some(Host::Domain(domain)) => {
            let lower = domain.to_ascii_lowercase();
            if lower == "localhost" || lower.ends_with(".localhost") {
                return Err(AppError::invalid_input(BLOCKED_MESSAGE));
            }
            Ok(url)
        }
        Some(_) => Ok(url),
    }
}

/// Resolve the URL's hostname and re-check every resolved address.
///
/// The returned addresses are the only ones the caller may connect to
/// (pinned into the HTTP client), so a DNS answer that changes between
/// this check and the request cannot redirect the fetch inward.
///
/// # Errors
///
/// Returns `InvalidInput` if resolution fails, yields no addresses, or
/// any resolved address is private or internal.
pub async fn resolve_and_pin(url: &Url) -> AppResult<Vec<SocketAddr>> {
    let host = url
        .host_str()
        .ok_or_else(|| AppError::invalid_input("URL must have a valid hostname"))?;
    let port = url
        .port_or_known_default()
        .ok_or_else(|| AppError::invalid_input("URL has no usable port"))?;

    let addrs: Vec<SocketAddr> = lookup_host((host, port))
        .await
        .map_err(|e| AppError::invalid_input(format!("hostname did not resolve: {e}")))?
        .collect();

    if addrs.is_empty() {
        return Err(AppError::invalid_input("hostname did not resolve"));
    }
    if addrs.iter().any(|addr| ip_blocked(addr.ip())) {
        return Err(AppError::invalid_input(BLOCKED_MESSAGE));
    }

    Ok(addrs)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rejected(raw: &str) -> bool {
        validate_external_url(raw).is_err()
    }

    #[test]
    fn test_accepts_public_urls() {
        assert!(validate_external_url("https://cdn.example.com/ep.mp3").is_ok());
        assert!(validate_external_url("http://93.184.216.34/ep.mp3").is_ok());
    }

    #[test]
    fn test_rejects_non_http_schemes() {
        assert!(rejected("ftp://example.com/ep.mp3"));
        assert!(rejected("file:///etc/passwd"));
        assert!(rejected("gopher://example.com/"));
    }

    #[test]
    fn test_rejects_localhost_and_loopback() {
        assert!(rejected("http://localhost/ep.mp3"));
        assert!(rejected("http://LOCALHOST:8080/ep.mp3"));
        assert!(rejected("http://app.localhost/ep.mp3"));
        assert!(rejected("http://127.0.0.1/ep.mp3"));
        assert!(rejected("http://127.8.9.10/ep.mp3"));
        assert!(rejected("http://[::1]/ep.mp3"));
    }

    #[test]
    fn test_rejects_private_and_metadata_ranges() {
        assert!(rejected("http://10.0.0.5/ep.mp3"));
        assert!(rejected("http://172.16.0.1/ep.mp3"));
        assert!(rejected("http://172.31.255.255/ep.mp3"));
        assert!(rejected("http://192.168.1.1/ep.mp3"));
        assert!(rejected("http://169.254.169.254/latest/meta-data/"));
        assert!(rejected("http://100.64.0.1/ep.mp3"));
        assert!(rejected("http://0.0.0.0/ep.mp3"));
    }

    #[test]
    fn test_rejects_alternate_ip_spellings() {
        // Decimal, hex, and octal all normalize to 127.0.0.1
        assert!(rejected("http://2130706433/ep.mp3"));
        assert!(rejected("http://0x7f000001/ep.mp3"));
        assert!(rejected("http://0177.0.0.1/ep.mp3"));
    }

    #[test]
    fn test_rejects_ipv6_internal_ranges() {
        assert!(rejected("http://[fc00::1]/ep.mp3"));
        assert!(rejected("http://[fd12:3456::1]/ep.mp3"));
        assert!(rejected("http://[fe80::1]/ep.mp3"));
        assert!(rejected("http://[::ffff:127.0.0.1]/ep.mp3"));
        assert!(rejected("http://[::ffff:10.0.0.1]/ep.mp3"));
    }

    #[test]
    fn test_172_range_boundaries() {
        assert!(rejected("http://172.16.0.0/x"));
        assert!(rejected("http://172.31.0.0/x"));
        assert!(validate_external_url("http://172.15.0.1/x").is_ok());
        assert!(validate_external_url("http://172.32.0.1/x").is_ok());
    }
}
