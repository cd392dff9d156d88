//! URL parsing and construction.
//!
//! The relay only needs a handful of URL operations. They sit behind
//! [`UrlCodec`] so embedders can route them through the host environment;
//! [`StdUrlCodec`] implements them with the `url` and `urlencoding` crates.

// ============================================================================
// Imports
// ============================================================================

use rustc_hash::FxHashMap;
use url::Url;

use crate::error::{Error, Result};

// ============================================================================
// Types
// ============================================================================

/// Decoded query parameters, last occurrence wins.
pub type QueryParams = FxHashMap<String, String>;

// ============================================================================
// UrlCodec
// ============================================================================

/// URL utilities required by the relay.
pub trait UrlCodec: Send + Sync {
    /// Parses and percent-decodes the query parameters of `url`.
    ///
    /// `+` is kept literally; only `%XX` sequences are decoded.
    fn query(&self, url: &str) -> Result<QueryParams>;

    /// Resolves `url` against `base`.
    fn resolve(&self, base: &str, url: &str) -> Result<String>;

    /// Returns the serialized origin (`scheme://host[:port]`) of `url`.
    fn origin(&self, url: &str) -> Result<String>;

    /// Appends query parameters to `url`, keeping any fragment at the end.
    fn append_query(&self, url: &str, params: &[(&str, &str)]) -> String;

    /// Percent-encodes a single URL component.
    ///
    /// Implementations may encode more characters than strictly needed; the
    /// peer only has to decode the result back to `value`.
    fn encode_component(&self, value: &str) -> String;

    /// Percent-decodes a single URL component.
    fn decode_component(&self, value: &str) -> Result<String>;
}

// ============================================================================
// StdUrlCodec
// ============================================================================

/// Default [`UrlCodec`] backed by the `url` crate.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdUrlCodec;

impl StdUrlCodec {
    /// Creates the codec.
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl UrlCodec for StdUrlCodec {
    fn query(&self, url: &str) -> Result<QueryParams> {
        let without_fragment = url.split_once('#').map_or(url, |(head, _)| head);
        let Some((_, query)) = without_fragment.split_once('?') else {
            return Ok(QueryParams::default());
        };

        let mut params = QueryParams::default();
        for pair in query.split('&').filter(|p| !p.is_empty()) {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            params.insert(self.decode_component(key)?, self.decode_component(value)?);
        }
        Ok(params)
    }

    fn resolve(&self, base: &str, url: &str) -> Result<String> {
        let base = Url::parse(base).map_err(|e| Error::invalid_url(base, e))?;
        let resolved = base.join(url).map_err(|e| Error::invalid_url(url, e))?;
        Ok(resolved.into())
    }

    fn origin(&self, url: &str) -> Result<String> {
        let parsed = Url::parse(url).map_err(|e| Error::invalid_url(url, e))?;
        Ok(parsed.origin().ascii_serialization())
    }

    fn append_query(&self, url: &str, params: &[(&str, &str)]) -> String {
        let (head, fragment) = match url.split_once('#') {
            Some((head, fragment)) => (head, Some(fragment)),
            None => (url, None),
        };

        let mut out = String::from(head);
        let mut separator = if head.contains('?') { '&' } else { '?' };
        for (key, value) in params {
            out.push(separator);
            out.push_str(&self.encode_component(key));
            out.push('=');
            out.push_str(&self.encode_component(value));
            separator = '&';
        }

        if let Some(fragment) = fragment {
            out.push('#');
            out.push_str(fragment);
        }
        out
    }

    /// Leaves only `A-Z a-z 0-9 - . _ ~` unencoded. Unlike JavaScript's
    /// `encodeURIComponent`, `! ' ( ) *` are encoded too; any standard
    /// decoder reads both forms back to the same text.
    fn encode_component(&self, value: &str) -> String {
        urlencoding::encode(value).into_owned()
    }

    fn decode_component(&self, value: &str) -> Result<String> {
        Ok(urlencoding::decode(value)?.into_owned())
    }
}

// ============================================================================
// Tests
// ============================================================================
