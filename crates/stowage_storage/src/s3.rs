//! S3-compatible storage backend speaking the REST API directly.
//!
//! Every request is signed with [`RequestSigner`]. Object attributes travel as
//! `x-amz-meta-*` user metadata; uploaded objects are always `public-read`.
//!
//! Unlike [`FileSystemStorage`](crate::FileSystemStorage), `remove` cannot hand
//! back the deleted content: the store's delete call returns none, so
//! `remove` always answers `Ok(None)`.

use crate::signer::RequestSigner;
use crate::storage_class::StorageClass;
use chrono::{DateTime, Utc};
use reqwest::header::HeaderMap;
use reqwest::{Method, StatusCode, Url};
use stowage_core::{ATTR_CONTENT_TYPE, Attributes, BackendOptions, StorageObject};
use stowage_error::{ConfigError, HttpError, StowageResult};
use stowage_interface::{Configure, StorageBackend};

/// Option holding the access key id.
pub const OPT_KEY_ID: &str = "storage.s3.key_id";
/// Option holding the access key secret.
pub const OPT_KEY_SECRET: &str = "storage.s3.key_secret";
/// Option holding the bucket name.
pub const OPT_BUCKET: &str = "storage.s3.bucket";
/// Option holding the default storage class.
pub const OPT_DEFAULT_STORAGE_CLASS: &str = "storage.s3.default_storage_class";
/// Option holding the static website endpoint used for public URLs.
pub const OPT_STATIC_WEB_ENDPOINT: &str = "storage.s3.static_web_endpoint";
/// Option overriding the REST endpoint (e.g. for S3-compatible services).
pub const OPT_ENDPOINT: &str = "storage.s3.endpoint";

/// Attribute selecting the storage class of a single object.
pub const ATTR_STORAGE_CLASS: &str = "storage-class";

const META_PREFIX: &str = "x-amz-meta-";
const ACL_POLICY: &str = "public-read";

/// A request ready to be sent: target URL and signed headers.
#[derive(Debug, Clone)]
pub struct SignedRequest {
    /// HTTP verb
    pub verb: String,
    /// Object URL
    pub url: Url,
    /// Every header, including `Host`, `Date` and `Authorization`
    pub headers: Vec<(String, String)>,
}

impl SignedRequest {
    /// First header named `name`, compared case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// S3 storage backend.
#[derive(Debug, Clone)]
pub struct S3Storage {
    client: reqwest::Client,
    signer: RequestSigner,
    bucket: String,
    endpoint: String,
    default_storage_class: StorageClass,
    static_web_endpoint: Option<String>,
}

impl S3Storage {
    /// Create a backend for `bucket` on the default AWS endpoint.
    pub fn new(signer: RequestSigner, bucket: impl Into<String>) -> StowageResult<Self> {
        let bucket = bucket.into();
        let client = reqwest::Client::builder()
            .user_agent(concat!("stowage/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ConfigError::new(format!("cannot build HTTP client: {}", e)))?;

        tracing::info!(bucket = %bucket, "Created S3 storage");
        Ok(Self {
            client,
            signer,
            endpoint: format!("https://{}.s3.amazonaws.com", bucket),
            bucket,
            default_storage_class: StorageClass::default(),
            static_web_endpoint: None,
        })
    }

    /// Send requests to `endpoint` instead of the AWS virtual-host endpoint.
    pub fn with_endpoint(mut self, endpoint: &str) -> StowageResult<Self> {
        let endpoint = endpoint.trim_end_matches('/');
        Url::parse(endpoint)
            .map_err(|e| ConfigError::new(format!("invalid endpoint {}: {}", endpoint, e)))?;
        self.endpoint = endpoint.to_string();
        Ok(self)
    }

    /// Storage class used when an object does not pick one.
    pub fn with_default_storage_class(mut self, class: StorageClass) -> Self {
        self.default_storage_class = class;
        self
    }

    /// Serve stored keys from a static website endpoint.
    pub fn with_static_web_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.static_web_endpoint = Some(endpoint.into());
        self
    }

    /// Bucket holding the objects.
    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Storage class used when an object does not pick one.
    pub fn default_storage_class(&self) -> StorageClass {
        self.default_storage_class
    }

    /// URL addressing `key`.
    pub fn object_url(&self, key: &str) -> StowageResult<Url> {
        let url = format!("{}/{}", self.endpoint, key);
        Url::parse(&url).map_err(|e| HttpError::new(format!("invalid object URL {}: {}", url, e)).into())
    }

    /// Headers a `put` of `object` carries, before signing.
    ///
    /// Returns the content type separately because it feeds the string to sign.
    pub fn put_headers(&self, object: &StorageObject) -> (Option<String>, Vec<(String, String)>) {
        let mut attributes: Vec<_> = object.attributes().into_iter().collect();
        attributes.sort();

        let mut content_type = None;
        let mut storage_class = self.default_storage_class;
        let mut headers = Vec::new();
        for (name, value) in attributes {
            if name.eq_ignore_ascii_case(ATTR_CONTENT_TYPE) {
                content_type = Some(value);
            } else if name.eq_ignore_ascii_case(ATTR_STORAGE_CLASS) {
                storage_class = StorageClass::parse_lenient(&value);
            } else {
                headers.push((format!("{}{}", META_PREFIX, name), value));
            }
        }

        if let Some(content_type) = &content_type {
            headers.push(("Content-Type".to_string(), content_type.clone()));
        }
        headers.push((
            "x-amz-storage-class".to_string(),
            storage_class.as_str().to_string(),
        ));
        headers.push(("x-amz-acl".to_string(), ACL_POLICY.to_string()));

        (content_type, headers)
    }

    /// Build and sign a request for `key` as of `now`.
    pub fn signed_request(
        &self,
        verb: &str,
        key: &str,
        content_type: Option<&str>,
        mut headers: Vec<(String, String)>,
        now: DateTime<Utc>,
    ) -> StowageResult<SignedRequest> {
        let url = self.object_url(key)?;
        headers.insert(0, ("Host".to_string(), host_header(&url)));

        let headers = self
            .signer
            .sign_headers(verb, &self.bucket, key, content_type, headers, now);
        Ok(SignedRequest {
            verb: verb.to_string(),
            url,
            headers,
        })
    }

    async fn send(
        &self,
        method: Method,
        key: &str,
        content_type: Option<&str>,
        headers: Vec<(String, String)>,
        body: Option<Vec<u8>>,
    ) -> StowageResult<reqwest::Response> {
        let signed = self.signed_request(method.as_str(), key, content_type, headers, Utc::now())?;

        let mut request = self.client.request(method.clone(), signed.url);
        for (name, value) in &signed.headers {
            request = request.header(name.as_str(), value.as_str());
        }
        if let Some(body) = body {
            request = request.body(body);
        }

        request.send().await.map_err(|e| {
            tracing::error!(verb = %method, key, error = %e, "S3 request failed");
            HttpError::new(format!("{} {}: {}", method, key, e)).into()
        })
    }

    /// Turn a non-success response into an error carrying the store's answer.
    async fn check(
        method: &Method,
        key: &str,
        response: reqwest::Response,
    ) -> StowageResult<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        tracing::error!(verb = %method, key, status = status.as_u16(), "S3 rejected request");
        Err(HttpError::with_status(
            status.as_u16(),
            format!("{} {} returned {}: {}", method, key, status, body.trim()),
        )
        .into())
    }
}

/// `Host` header value for `url`, with the port when it is not the default.
fn host_header(url: &Url) -> String {
    let host = url.host_str().unwrap_or_default();
    match url.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    }
}

/// Attributes carried by a response's headers.
fn attributes_from(headers: &HeaderMap) -> Attributes {
    let mut attributes = Attributes::new();
    for (name, value) in headers {
        let Ok(value) = value.to_str() else {
            continue;
        };
        if let Some(attribute) = name.as_str().strip_prefix(META_PREFIX) {
            attributes.insert(attribute.to_string(), value.to_string());
        } else if *name == reqwest::header::CONTENT_TYPE {
            attributes.insert(ATTR_CONTENT_TYPE.to_string(), value.to_string());
        }
    }
    attributes
}

impl Configure for S3Storage {
    const BACKEND: &'static str = "s3";

    fn configure(options: &BackendOptions) -> StowageResult<Self> {
        let signer = RequestSigner::new(
            options.require(OPT_KEY_ID)?,
            options.require(OPT_KEY_SECRET)?,
        )?;
        let mut storage = Self::new(signer, options.require(OPT_BUCKET)?)?;

        if let Some(class) = options.get(OPT_DEFAULT_STORAGE_CLASS) {
            storage = storage.with_default_storage_class(StorageClass::parse_lenient(class));
        }
        if let Some(endpoint) = options.get(OPT_ENDPOINT) {
            storage = storage.with_endpoint(endpoint)?;
        }
        if let Some(web) = options.get(OPT_STATIC_WEB_ENDPOINT) {
            storage = storage.with_static_web_endpoint(web);
        }
        Ok(storage)
    }
}

#[async_trait::async_trait]
impl StorageBackend for S3Storage {
    fn name(&self) -> &'static str {
        Self::BACKEND
    }

    #[tracing::instrument(skip(self), fields(bucket = %self.bucket))]
    async fn get(&self, key: &str) -> StowageResult<Option<StorageObject>> {
        let response = self.send(Method::GET, key, None, Vec::new(), None).await?;
        if response.status() == StatusCode::NOT_FOUND {
            tracing::debug!("Object not found");
            return Ok(None);
        }

        let response = Self::check(&Method::GET, key, response).await?;
        let attributes = attributes_from(response.headers());
        let bytes = response
            .bytes()
            .await
            .map_err(|e| HttpError::new(format!("GET {}: reading body: {}", key, e)))?;

        tracing::debug!(size = bytes.len(), "Retrieved object");
        Ok(Some(
            StorageObject::from_bytes(key, bytes.to_vec())?.with_attributes(attributes),
        ))
    }

    #[tracing::instrument(skip(self, object), fields(bucket = %self.bucket))]
    async fn put(&self, key: &str, object: &StorageObject) -> StowageResult<()> {
        let (content_type, headers) = self.put_headers(object);
        let body = object.as_bytes().await?;
        let size = body.len();

        let response = self
            .send(Method::PUT, key, content_type.as_deref(), headers, Some(body))
            .await?;
        Self::check(&Method::PUT, key, response).await?;

        tracing::info!(size, "Stored object");
        Ok(())
    }

    #[tracing::instrument(skip(self), fields(bucket = %self.bucket))]
    async fn remove(&self, key: &str) -> StowageResult<Option<StorageObject>> {
        let response = self.send(Method::DELETE, key, None, Vec::new(), None).await?;
        if response.status() == StatusCode::NOT_FOUND {
            tracing::debug!("Nothing to remove");
            return Ok(None);
        }

        Self::check(&Method::DELETE, key, response).await?;
        tracing::info!("Removed object");
        Ok(None)
    }

    async fn get_url(&self, key: &str) -> StowageResult<Option<String>> {
        Ok(self
            .static_web_endpoint
            .as_ref()
            .map(|endpoint| format!("//{}/{}", endpoint.trim_end_matches('/'), key)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_host_header_keeps_custom_port() {
        let url = Url::parse("http://127.0.0.1:9000/media/a.txt").unwrap();
        assert_eq!(host_header(&url), "127.0.0.1:9000");

        let url = Url::parse("https://media.s3.amazonaws.com/a.txt").unwrap();
        assert_eq!(host_header(&url), "media.s3.amazonaws.com");
    }

    #[test]
    fn test_attributes_from_headers() {
        let mut headers = HeaderMap::new();
        headers.insert("x-amz-meta-filename", "pic.jpg".parse().unwrap());
        headers.insert("content-type", "image/jpeg".parse().unwrap());
        headers.insert("etag", "\"abc\"".parse().unwrap());

        let attributes = attributes_from(&headers);
        assert_eq!(attributes.len(), 2);
        assert_eq!(attributes["filename"], "pic.jpg");
        assert_eq!(attributes[ATTR_CONTENT_TYPE], "image/jpeg");
    }
}
