//! HMAC-SHA1 request signing for the VRage remote API.
//!
//! Every request carries a `Date` header and an `Authorization` header of the
//! form `<nonce>:<signature>`, where the signature is
//! `base64(HMAC-SHA1(base64_decode(key), method_path CRLF nonce CRLF date CRLF))`.

use std::fmt;
use std::sync::Arc;

use base64::{engine::general_purpose::STANDARD as B64, Engine};
use hmac::{Hmac, Mac};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, DATE};
use sha1::Sha1;
use tracing::debug;

use crate::canon;
use crate::clock::{Clock, SystemClock};
use crate::error::{Error, Result};
use crate::nonce::NonceCounter;

type HmacSha1 = Hmac<Sha1>;

/// A signed request description, valid for one use.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedRequest {
    pub method_path: String,
    pub nonce: u64,
    pub date: String,
    pub signature: String,
}

impl SignedRequest {
    pub fn authorization(&self) -> String {
        format!("{}:{}", self.nonce, self.signature)
    }

    pub fn headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::with_capacity(2);
        headers.insert(DATE, header_value(&self.date)?);
        headers.insert(AUTHORIZATION, header_value(&self.authorization())?);
        Ok(headers)
    }
}

fn header_value(s: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(s).map_err(|e| Error::config(format!("invalid header value: {e}")))
}

/// Builds signed requests from a shared secret.
///
/// The key is decoded once on construction; the nonce counter defaults to the
/// process-wide one so that separate builders never hand out the same nonce.
#[derive(Clone)]
pub struct SignedRequestBuilder {
    key: Vec<u8>,
    nonces: Arc<NonceCounter>,
    clock: Arc<dyn Clock>,
}

impl SignedRequestBuilder {
    /// # Errors
    ///
    /// Returns [`Error::InvalidCredentialFormat`] if `key_b64` is not valid base64.
    pub fn new(key_b64: impl AsRef<str>) -> Result<Self> {
        let key = B64.decode(key_b64.as_ref().trim())?;
        Ok(Self {
            key,
            nonces: NonceCounter::shared(),
            clock: Arc::new(SystemClock),
        })
    }

    pub fn with_nonce_counter(mut self, nonces: Arc<NonceCounter>) -> Self {
        self.nonces = nonces;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Sign a GET for `resource` (relative to `/vrageremote/v1/`).
    pub fn build(&self, resource: &str) -> SignedRequest {
        let method_path = canon::method_path(resource);
        let nonce = self.nonces.next();
        let date = canon::http_date(self.clock.now());
        let signature = build_hash(&self.key, &method_path, nonce, &date);
        debug!(%method_path, nonce, "signed request");

        SignedRequest {
            method_path,
            nonce,
            date,
            signature,
        }
    }
}

impl fmt::Debug for SignedRequestBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignedRequestBuilder")
            .field("key", &"<redacted>")
            .field("nonces", &self.nonces)
            .finish_non_exhaustive()
    }
}

/// Base64 HMAC-SHA1 of the canonical message. Pure; same inputs, same output.
pub fn build_hash(key: &[u8], method_path: &str, nonce: u64, date: &str) -> String {
    let message = canon::canonical_message(method_path, nonce, date);
    let mut mac = HmacSha1::new_from_slice(key).expect("HMAC can take key of any size");
    mac.update(message.as_bytes());
    B64.encode(mac.finalize().into_bytes())
}
