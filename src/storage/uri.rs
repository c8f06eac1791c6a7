// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Public URI derivation for stored objects.
//!
//! URIs are never persisted. They are recomputed from `(bucket, key)` and the
//! backend configuration, so the same configuration always yields the same
//! link:
//!
//! | Configuration | URI |
//! |---------------|-----|
//! | `PUBLIC_URL` set (any backend) | `{public_url.origin}/{key}` |
//! | S3, custom endpoint, path style | `{endpoint.origin}/{bucket}/{key}` |
//! | S3, custom endpoint, virtual-hosted | `{scheme}://{bucket}.{host[:port]}/{key}` |
//! | S3, AWS | `https://{bucket}.s3.amazonaws.com/{key}` |
//! | GCS | `https://{bucket}.storage.googleapis.com/{key}` |
//! | Local | `{protocol}://{domain}[:{port}]/api/{version}/{bucket}/{key}` |

use url::Url;

/// A URL that failed validation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("\"{value}\" is not a valid http(s) URL")]
pub struct InvalidUrl {
    pub value: String,
}

/// A validated absolute `http` or `https` URL.
///
/// Only the scheme, host and port are ever used when deriving URIs; any path,
/// query or fragment on the configured value is discarded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaseUrl(Url);

impl BaseUrl {
    pub fn parse(raw: &str) -> Result<Self, InvalidUrl> {
        let invalid = || InvalidUrl {
            value: raw.to_string(),
        };
        let url = Url::parse(raw).map_err(|_| invalid())?;
        if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
            return Err(invalid());
        }
        Ok(Self(url))
    }

    pub fn scheme(&self) -> &str {
        self.0.scheme()
    }

    /// `scheme://host[:port]`, omitting the port when it is the scheme default.
    pub fn origin(&self) -> String {
        self.0.origin().ascii_serialization()
    }

    /// `host[:port]`, omitting the port when it is the scheme default.
    pub fn authority(&self) -> String {
        let host = self.0.host_str().unwrap_or_default();
        match self.0.port() {
            Some(port) => format!("{host}:{port}"),
            None => host.to_string(),
        }
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl std::fmt::Display for BaseUrl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.0.as_str())
    }
}

/// Externally reachable address of this service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceAddress {
    pub protocol: String,
    pub domain: String,
    pub port: u16,
}

impl ServiceAddress {
    pub fn new(protocol: impl Into<String>, domain: impl Into<String>, port: u16) -> Self {
        Self {
            protocol: protocol.into(),
            domain: domain.into(),
            port,
        }
    }

    fn is_default_port(&self) -> bool {
        matches!(
            (self.protocol.as_str(), self.port),
            ("https", 443) | ("http", 80)
        )
    }

    /// `{protocol}://{domain}[:{port}]`, omitting a default port.
    pub fn base_url(&self) -> String {
        if self.is_default_port() {
            format!("{}://{}", self.protocol, self.domain)
        } else {
            format!("{}://{}:{}", self.protocol, self.domain, self.port)
        }
    }

    /// Base URL joined with a relative path.
    pub fn url_for(&self, path: &str) -> String {
        format!("{}/{}", self.base_url(), path.trim_start_matches('/'))
    }
}

/// URI under a CDN or reverse proxy that routes purely by key.
pub fn override_uri(public_url: &BaseUrl, key: &str) -> String {
    format!("{}/{}", public_url.origin(), key)
}

pub fn s3_uri(endpoint: Option<&BaseUrl>, force_path_style: bool, bucket: &str, key: &str) -> String {
    match endpoint {
        Some(endpoint) if force_path_style => format!("{}/{bucket}/{key}", endpoint.origin()),
        Some(endpoint) => format!(
            "{}://{bucket}.{}/{key}",
            endpoint.scheme(),
            endpoint.authority()
        ),
        None => format!("https://{bucket}.s3.amazonaws.com/{key}"),
    }
}

pub fn gcs_uri(bucket: &str, key: &str) -> String {
    format!("https://{bucket}.storage.googleapis.com/{key}")
}

pub fn local_uri(address: &ServiceAddress, api_version: &str, bucket: &str, key: &str) -> String {
    address.url_for(&format!("api/{api_version}/{bucket}/{key}"))
}
