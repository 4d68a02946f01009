//! Header manipulation for forwarded traffic.
//!
//! # Responsibilities
//! - Stamp the diagnostic marker on forwarded requests
//! - Append the immediate peer to X-Forwarded-For
//! - Strip hop-by-hop headers in both directions
//!
//! # Design Decisions
//! - X-Forwarded-For is appended only after authorization has read it
//! - Headers named in `Connection` are treated as hop-by-hop too

use std::net::IpAddr;

use axum::http::{header, HeaderMap, HeaderName, HeaderValue};

use crate::security::access_control::X_FORWARDED_FOR;

/// Marker stamped on every request passing through the proxy.
pub const MARKER_HEADER: &str = "x-ip-whitelisting-proxy";
pub const MARKER_VALUE: &str = "X-IP-Whitelisting-Proxy";

const HOP_BY_HOP: [HeaderName; 8] = [
    header::CONNECTION,
    HeaderName::from_static("keep-alive"),
    HeaderName::from_static("proxy-connection"),
    header::PROXY_AUTHENTICATE,
    header::PROXY_AUTHORIZATION,
    header::TE,
    header::TRAILER,
    header::TRANSFER_ENCODING,
];

pub fn stamp_marker(headers: &mut HeaderMap) {
    headers.insert(
        HeaderName::from_static(MARKER_HEADER),
        HeaderValue::from_static(MARKER_VALUE),
    );
}

/// Remove hop-by-hop headers, including any listed in `Connection`.
pub fn strip_hop_by_hop(headers: &mut HeaderMap) {
    let listed: Vec<HeaderName> = headers
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .filter_map(|name| HeaderName::from_bytes(name.trim().as_bytes()).ok())
        .collect();

    for name in listed {
        headers.remove(name);
    }
    for name in HOP_BY_HOP {
        headers.remove(name);
    }
    headers.remove(header::UPGRADE);
}

/// Append the peer address to the forwarding chain.
///
/// Every prior `X-Forwarded-For` line is folded into one comma-separated
/// value. If any line is not visible ASCII the lines are left alone and the
/// peer is added as a line of its own.
pub fn append_forwarded_for(headers: &mut HeaderMap, peer: IpAddr) {
    let prior: Option<Vec<String>> = headers
        .get_all(X_FORWARDED_FOR)
        .iter()
        .map(|v| v.to_str().ok().map(str::to_string))
        .collect();
    let name = HeaderName::from_static(X_FORWARDED_FOR);

    let chain = match prior {
        Some(lines) if lines.is_empty() => peer.to_string(),
        Some(lines) => format!("{}, {}", lines.join(", "), peer),
        None => {
            if let Ok(value) = HeaderValue::from_str(&peer.to_string()) {
                headers.append(name, value);
            }
            return;
        }
    };
    if let Ok(value) = HeaderValue::from_str(&chain) {
        headers.insert(name, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_hop_by_hop() {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONNECTION, HeaderValue::from_static("keep-alive, x-session-hint"));
        headers.insert("keep-alive", HeaderValue::from_static("timeout=5"));
        headers.insert("x-session-hint", HeaderValue::from_static("abc"));
        headers.insert(header::TRANSFER_ENCODING, HeaderValue::from_static("chunked"));
        headers.insert(header::UPGRADE, HeaderValue::from_static("websocket"));
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("text/plain"));

        strip_hop_by_hop(&mut headers);

        assert_eq!(headers.len(), 1);
        assert_eq!(headers[header::CONTENT_TYPE], "text/plain");
    }

    #[test]
    fn test_append_forwarded_for() {
        let mut headers = HeaderMap::new();
        append_forwarded_for(&mut headers, "127.0.0.1".parse().unwrap());
        assert_eq!(headers[X_FORWARDED_FOR], "127.0.0.1");

        append_forwarded_for(&mut headers, "10.0.0.2".parse().unwrap());
        assert_eq!(headers[X_FORWARDED_FOR], "127.0.0.1, 10.0.0.2");
    }

    #[test]
    fn test_append_forwarded_for_folds_every_line() {
        let mut headers = HeaderMap::new();
        headers.append(X_FORWARDED_FOR, HeaderValue::from_static("1.1.1.1"));
        headers.append(X_FORWARDED_FOR, HeaderValue::from_static("2.2.2.2, 3.3.3.3"));

        append_forwarded_for(&mut headers, "127.0.0.1".parse().unwrap());

        let lines: Vec<_> = headers.get_all(X_FORWARDED_FOR).iter().collect();
        assert_eq!(lines, ["1.1.1.1, 2.2.2.2, 3.3.3.3, 127.0.0.1"]);
    }

    #[test]
    fn test_append_forwarded_for_keeps_opaque_lines() {
        let mut headers = HeaderMap::new();
        headers.append(X_FORWARDED_FOR, HeaderValue::from_bytes(b"10.0.0.1 \xff").unwrap());
        headers.append(X_FORWARDED_FOR, HeaderValue::from_static("2.2.2.2"));

        append_forwarded_for(&mut headers, "127.0.0.1".parse().unwrap());

        let lines: Vec<_> = headers.get_all(X_FORWARDED_FOR).iter().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0].as_bytes(), b"10.0.0.1 \xff");
        assert_eq!(lines[1], "2.2.2.2");
        assert_eq!(lines[2], "127.0.0.1");
    }

    #[test]
    fn test_append_forwarded_for_keeps_blank_prior() {
        let mut headers = HeaderMap::new();
        headers.insert(X_FORWARDED_FOR, HeaderValue::from_static("  "));

        append_forwarded_for(&mut headers, "127.0.0.1".parse().unwrap());

        assert_eq!(headers[X_FORWARDED_FOR], "  , 127.0.0.1");
    }

    #[test]
    fn test_stamp_marker_overwrites() {
        let mut headers = HeaderMap::new();
        headers.insert(MARKER_HEADER, HeaderValue::from_static("spoofed"));
        stamp_marker(&mut headers);
        assert_eq!(headers[MARKER_HEADER], MARKER_VALUE);
        assert_eq!(headers.get_all(MARKER_HEADER).iter().count(), 1);
    }
}
