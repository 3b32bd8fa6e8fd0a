//! Request signing for the S3 REST API.
//!
//! Requests are authenticated with `Authorization: AWS <key id>:<signature>`
//! where the signature is base64(HMAC-SHA1(secret, string-to-sign)) and the
//! string to sign is:
//!
//! ```text
//! VERB\n
//! \n                          (content MD5, always empty)
//! content-type\n
//! canonicalized amz headers   (one "name:value\n" per header)
//! /bucket/key
//! ```
//!
//! The `Date` header is not part of the string to sign. `X-Amz-Date` carries
//! the same timestamp and is covered through the amz headers.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha1::Sha1;
use stowage_error::{ConfigError, StowageResult};

type HmacSha1 = Hmac<Sha1>;

/// Header name prefix of headers covered by the signature.
pub const AMZ_PREFIX: &str = "x-amz";

/// Format a timestamp the way `Date` and `X-Amz-Date` carry it.
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use stowage_storage::signer::format_date;
///
/// let date = Utc.with_ymd_and_hms(2024, 3, 5, 8, 30, 15).unwrap();
/// assert_eq!(format_date(date), "Tue, 05 Mar 2024 08:30:15 +0000");
/// ```
pub fn format_date(date: DateTime<Utc>) -> String {
    date.format("%a, %d %b %Y %H:%M:%S +0000").to_string()
}

/// Canonicalize the headers covered by the signature.
///
/// Keeps `x-amz*` headers and `host`, lowercases names, merges repeated names
/// with a comma and sorts by name. A repeated value is not appended when the
/// accumulated value already contains it as a substring.
pub fn canonicalize_amz_headers<K, V>(headers: &[(K, V)]) -> String
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    let mut kept: Vec<(String, String)> = Vec::new();
    for (name, value) in headers {
        let name = name.as_ref().trim().to_lowercase();
        let value = value.as_ref().trim();
        if !name.starts_with(AMZ_PREFIX) && name != "host" {
            continue;
        }

        match kept.iter().position(|(k, _)| *k == name) {
            None => kept.push((name, value.to_string())),
            Some(i) => {
                let (name, existing) = kept.remove(i);
                let merged = if existing.contains(value) {
                    existing
                } else {
                    format!("{},{}", existing, value)
                };
                kept.push((name, merged));
            }
        }
    }

    kept.sort_by(|a, b| a.0.cmp(&b.0));
    kept.iter()
        .map(|(name, value)| format!("{}:{}\n", name, value))
        .collect()
}

/// Canonicalize the addressed resource: `/bucket/key`.
pub fn canonicalized_resource(bucket: &str, key: &str) -> String {
    format!("/{}/{}", bucket, key)
}

/// Assemble the exact string whose HMAC is the request signature.
pub fn string_to_sign<K, V>(
    verb: &str,
    content_type: Option<&str>,
    headers: &[(K, V)],
    bucket: &str,
    key: &str,
) -> String
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    format!(
        "{}\n\n{}\n{}{}",
        verb,
        content_type.unwrap_or_default(),
        canonicalize_amz_headers(headers),
        canonicalized_resource(bucket, key)
    )
}

/// Signs requests with an account key pair.
#[derive(Clone)]
pub struct RequestSigner {
    access_key_id: String,
    mac: HmacSha1,
}

impl RequestSigner {
    /// Create a signer for the given key pair.
    pub fn new(access_key_id: impl Into<String>, secret: &str) -> StowageResult<Self> {
        let mac = HmacSha1::new_from_slice(secret.as_bytes())
            .map_err(|e| ConfigError::new(format!("unusable signing secret: {}", e)))?;
        Ok(Self {
            access_key_id: access_key_id.into(),
            mac,
        })
    }

    /// Access key id requests are signed as.
    pub fn access_key_id(&self) -> &str {
        &self.access_key_id
    }

    /// base64(HMAC-SHA1(secret, string_to_sign)).
    pub fn sign(&self, string_to_sign: &str) -> String {
        let mut mac = self.mac.clone();
        mac.update(string_to_sign.as_bytes());
        BASE64.encode(mac.finalize().into_bytes())
    }

    /// Value of the `Authorization` header for `string_to_sign`.
    pub fn authorization(&self, string_to_sign: &str) -> String {
        format!("AWS {}:{}", self.access_key_id, self.sign(string_to_sign))
    }

    /// Add `Date`, `X-Amz-Date` and `Authorization` to a request's headers.
    ///
    /// `headers` must already hold every other header the request carries,
    /// including `Host`.
    pub fn sign_headers(
        &self,
        verb: &str,
        bucket: &str,
        key: &str,
        content_type: Option<&str>,
        mut headers: Vec<(String, String)>,
        now: DateTime<Utc>,
    ) -> Vec<(String, String)> {
        let date = format_date(now);
        headers.push(("Date".to_string(), date.clone()));
        headers.push(("X-Amz-Date".to_string(), date));

        let sts = string_to_sign(verb, content_type, &headers, bucket, key);
        tracing::trace!(string_to_sign = %sts.escape_debug(), "Signing request");
        headers.push(("Authorization".to_string(), self.authorization(&sts)));
        headers
    }
}

impl std::fmt::Debug for RequestSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestSigner")
            .field("access_key_id", &self.access_key_id)
            .finish_non_exhaustive()
    }
}
