//! Origin authorization.
//! Decides whether a request's claimed client address is whitelisted.

use std::sync::Arc;

use axum::http::HeaderMap;

use crate::security::whitelist::AddressSet;

/// Header carrying the client-then-proxies address chain.
pub const X_FORWARDED_FOR: &str = "x-forwarded-for";

/// A yes/no decision on whether a request may be forwarded.
pub trait Authorize: Send + Sync {
    fn authorize(&self, headers: &HeaderMap) -> bool;
}

/// Extract the claimed client origin from the forwarding chain.
///
/// The left-most element is the address closest to the client. A missing,
/// empty or non-UTF-8 header yields the empty string.
pub fn claimed_origin(headers: &HeaderMap) -> String {
    headers
        .get(X_FORWARDED_FOR)
        .and_then(|v| v.to_str().ok())
        .and_then(|chain| chain.split(',').next())
        .map(|first| first.trim().to_string())
        .unwrap_or_default()
}

/// Checks the claimed origin against the whitelist.
///
/// Trusts the first hop of `X-Forwarded-For`: the upstream router is assumed
/// to prepend it honestly.
#[derive(Debug, Clone)]
pub struct Authorizer {
    whitelist: Arc<AddressSet>,
}

impl Authorizer {
    pub fn new(whitelist: Arc<AddressSet>) -> Self {
        Self { whitelist }
    }

    pub fn whitelist(&self) -> &AddressSet {
        &self.whitelist
    }
}

impl Authorize for Authorizer {
    fn authorize(&self, headers: &HeaderMap) -> bool {
        self.whitelist.is_allowed(&claimed_origin(headers))
    }
}
