//! Backend HTTP estilo object store (GET / PUT / HEAD).
//!
//! Con `endpoint_url` (o `client_kwargs.endpoint_url`) una ruta
//! `scheme://bucket/key` se traduce path-style a `{endpoint}/bucket/key`.
//! Sin endpoint sólo se aceptan rutas `http(s)://`.
//!
//! `S3FileSystem` usa el mismo backend con los args de s3fs (`key`,
//! `secret`, `anon`, `client_kwargs.endpoint_url`). Las peticiones no se
//! firman: sirve para buckets públicos o gateways path-style sin auth.
//!
//! El cliente bloqueante se crea por operación: las operaciones corren en
//! hilos de trabajo, nunca dentro del runtime async.

use std::sync::Arc;
use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::StatusCode;
use serde_json::{Map, Value};

use super::{FileSystem, StorageError};

/// Endpoint por defecto de `S3FileSystem` sin `endpoint_url`.
pub const DEFAULT_S3_ENDPOINT: &str = "https://s3.amazonaws.com";

#[derive(Debug, Clone)]
pub struct HttpFileSystem {
    protocol: &'static str,
    endpoint: Option<String>,
    headers: HeaderMap,
    timeout: Option<Duration>,
}

impl HttpFileSystem {
    pub fn new(endpoint: Option<String>) -> Self {
        Self { protocol: "http",
               endpoint: endpoint.map(|e| e.trim_end_matches('/').to_string()),
               headers: HeaderMap::new(),
               timeout: None }
    }

    pub fn from_args(args: &Map<String, Value>) -> Result<Arc<dyn FileSystem>, StorageError> {
        Ok(Arc::new(Self::configure(args)?))
    }

    /// Constructor para `S3FileSystem` / `s3`.
    pub fn s3_from_args(args: &Map<String, Value>) -> Result<Arc<dyn FileSystem>, StorageError> {
        Ok(Arc::new(Self::configure_s3(args)?))
    }

    fn configure_s3(args: &Map<String, Value>) -> Result<Self, StorageError> {
        for field in ["key", "secret"] {
            if args.get(field).is_some_and(|v| !v.is_string()) {
                return Err(StorageError::InvalidArgs(format!("{field} must be a string")));
            }
        }
        if args.get("anon").is_some_and(|v| !v.is_boolean()) {
            return Err(StorageError::InvalidArgs("anon must be a boolean".into()));
        }
        let mut fs = Self::configure(args)?;
        fs.protocol = "s3";
        if fs.endpoint.is_none() {
            fs.endpoint = Some(DEFAULT_S3_ENDPOINT.to_string());
        }
        if args.contains_key("key") || args.contains_key("secret") {
            log::warn!("S3FileSystem requests to {} are sent unsigned; key and secret are not used",
                       fs.endpoint.as_deref().unwrap_or_default());
        }
        Ok(fs)
    }

    fn configure(args: &Map<String, Value>) -> Result<Self, StorageError> {
        let endpoint = args.get("endpoint_url")
                           .or_else(|| args.get("client_kwargs").and_then(|c| c.get("endpoint_url")))
                           .map(|v| {
                               v.as_str()
                                .map(str::to_string)
                                .ok_or_else(|| StorageError::InvalidArgs("endpoint_url must be a string".into()))
                           })
                           .transpose()?;
        let mut fs = Self::new(endpoint);

        if let Some(headers) = args.get("headers") {
            let headers = headers.as_object()
                                 .ok_or_else(|| StorageError::InvalidArgs("headers must be a mapping".into()))?;
            for (k, v) in headers {
                let name = HeaderName::from_bytes(k.as_bytes())
                    .map_err(|e| StorageError::InvalidArgs(format!("header {k}: {e}")))?;
                let raw = v.as_str().map(str::to_string).unwrap_or_else(|| v.to_string());
                let value = HeaderValue::from_str(&raw).map_err(|e| StorageError::InvalidArgs(format!("header {k}: {e}")))?;
                fs.headers.insert(name, value);
            }
        }
        if let Some(t) = args.get("timeout_secs") {
            let secs = t.as_u64()
                        .ok_or_else(|| StorageError::InvalidArgs("timeout_secs must be a positive integer".into()))?;
            fs.timeout = Some(Duration::from_secs(secs));
        }
        Ok(fs)
    }

    /// URL HTTP efectiva para una ruta del filesystem.
    pub fn url_for(&self, path: &str) -> Result<String, StorageError> {
        let (scheme, rest) = match path.split_once("://") {
            Some((s, r)) => (Some(s), r),
            None => (None, path),
        };
        match (&self.endpoint, scheme) {
            (Some(endpoint), Some("http" | "https")) if path.starts_with(endpoint.as_str()) => Ok(path.to_string()),
            (Some(endpoint), _) => Ok(format!("{endpoint}/{}", rest.trim_start_matches('/'))),
            (None, Some("http" | "https")) => Ok(path.to_string()),
            (None, _) => Err(StorageError::InvalidArgs(format!("{path} is not an http url and no endpoint_url is set"))),
        }
    }

    fn client(&self) -> Result<Client, StorageError> {
        let mut builder = Client::builder().default_headers(self.headers.clone());
        if let Some(t) = self.timeout {
            builder = builder.timeout(t);
        }
        builder.build().map_err(|e| StorageError::Http { url: self.endpoint.clone().unwrap_or_default(),
                                                         reason: e.to_string() })
    }
}

fn http_err(url: &str, reason: impl ToString) -> StorageError {
    StorageError::Http { url: url.to_string(),
                         reason: reason.to_string() }
}

impl FileSystem for HttpFileSystem {
    fn protocol(&self) -> &'static str {
        self.protocol
    }

    fn read(&self, path: &str) -> Result<Vec<u8>, StorageError> {
        let url = self.url_for(path)?;
        let resp = self.client()?.get(&url).send().map_err(|e| http_err(&url, e))?;
        match resp.status() {
            StatusCode::NOT_FOUND => Err(StorageError::NotFound(path.to_string())),
            s if s.is_success() => Ok(resp.bytes().map_err(|e| http_err(&url, e))?.to_vec()),
            s => Err(http_err(&url, format!("status {s}"))),
        }
    }

    fn write(&self, path: &str, data: &[u8]) -> Result<(), StorageError> {
        let url = self.url_for(path)?;
        let resp = self.client()?
                       .put(&url)
                       .body(data.to_vec())
                       .send()
                       .map_err(|e| http_err(&url, e))?;
        if resp.status().is_success() {
            Ok(())
        } else {
            Err(http_err(&url, format!("status {}", resp.status())))
        }
    }

    fn exists(&self, path: &str) -> Result<bool, StorageError> {
        let url = self.url_for(path)?;
        let resp = self.client()?.head(&url).send().map_err(|e| http_err(&url, e))?;
        match resp.status() {
            StatusCode::NOT_FOUND => Ok(false),
            s if s.is_success() => Ok(true),
            s => Err(http_err(&url, format!("status {s}"))),
        }
    }

    fn list(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
        Err(StorageError::Unsupported(format!("listing {prefix} over http")))
    }
}
