use chrono::{DateTime, Utc};

pub const API_PREFIX: &str = "/vrageremote/v1/";

pub fn method_path(resource: &str) -> String {
    format!("{API_PREFIX}{resource}")
}

/// RFC 1123 HTTP-date, e.g. `Wed, 22 Oct 2008 10:52:40 GMT`.
pub fn http_date(at: DateTime<Utc>) -> String {
    at.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

/// The exact byte string the server recomputes the HMAC over.
pub fn canonical_message(method_path: &str, nonce: u64, date: &str) -> String {
    let nonce = nonce.to_string();
    let mut out = String::with_capacity(method_path.len() + nonce.len() + date.len() + 6);
    for part in [method_path, nonce.as_str(), date] {
        out.push_str(part);
        out.push_str("\r\n");
    }
    out
}
