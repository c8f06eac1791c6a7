// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! This module defines environment variable names, default values, and the
//! [`AppConfig`] struct built from them once at startup. The struct is passed
//! by reference into the storage backend and services; nothing reads the
//! environment after startup.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `3333` |
//! | `PROTOCOL` | Externally visible scheme | `http` |
//! | `DOMAIN` | Externally visible host name | `localhost` |
//! | `EXTERNAL_PORT` | Externally visible port | value of `PORT` |
//! | `API_VERSION` | Version segment of every API path | `v1` |
//! | `API_KEY` | Shared secret expected in `x-api-key` | Required |
//! | `DEFAULT_BUCKET` | Bucket used when public/private requests omit one | unset |
//! | `AVAILABLE_BUCKETS` | Comma-separated bucket allow-list | `documents,files` |
//! | `STORAGE_TYPE` | `local`, `aws` (`s3`) or `gcp` (`gcs`) | `local` |
//! | `LOCAL_DIRECTORY` | Root directory of the local backend | `uploads` |
//! | `S3_REGION` | S3 region, required without `S3_ENDPOINT` | `us-east-1` with an endpoint |
//! | `S3_ENDPOINT` | Endpoint of an S3-compatible provider | unset (AWS) |
//! | `S3_FORCE_PATH_STYLE` | `true` for path-style addressing | `false` |
//! | `PUBLIC_URL` | CDN/proxy origin used for returned URIs | unset |
//! | `ALLOWED_BINARY_TYPES` | Comma-separated MIME allow-list | `image/png,image/jpeg,image/webp,application/pdf` |
//! | `MAX_BINARY_FILE_SIZE` | Upload ceiling in bytes | `10485760` |
//! | `TLS_CERT_PATH` / `TLS_KEY_PATH` | PEM files; serve HTTPS when both set | unset |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use std::path::PathBuf;

use crate::storage::{BaseUrl, InvalidUrl, ServiceAddress, StorageConfig};

pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";
pub const PROTOCOL_ENV: &str = "PROTOCOL";
pub const DOMAIN_ENV: &str = "DOMAIN";
pub const EXTERNAL_PORT_ENV: &str = "EXTERNAL_PORT";
pub const API_VERSION_ENV: &str = "API_VERSION";
pub const API_KEY_ENV: &str = "API_KEY";
pub const DEFAULT_BUCKET_ENV: &str = "DEFAULT_BUCKET";
pub const AVAILABLE_BUCKETS_ENV: &str = "AVAILABLE_BUCKETS";
pub const STORAGE_TYPE_ENV: &str = "STORAGE_TYPE";
pub const LOCAL_DIRECTORY_ENV: &str = "LOCAL_DIRECTORY";
pub const S3_REGION_ENV: &str = "S3_REGION";
pub const S3_ENDPOINT_ENV: &str = "S3_ENDPOINT";
pub const S3_FORCE_PATH_STYLE_ENV: &str = "S3_FORCE_PATH_STYLE";
pub const PUBLIC_URL_ENV: &str = "PUBLIC_URL";
pub const ALLOWED_BINARY_TYPES_ENV: &str = "ALLOWED_BINARY_TYPES";
pub const MAX_BINARY_FILE_SIZE_ENV: &str = "MAX_BINARY_FILE_SIZE";
pub const TLS_CERT_PATH_ENV: &str = "TLS_CERT_PATH";
pub const TLS_KEY_PATH_ENV: &str = "TLS_KEY_PATH";
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

pub const DEFAULT_PORT: u16 = 3333;
pub const DEFAULT_AVAILABLE_BUCKETS: &[&str] = &["documents", "files"];
pub const DEFAULT_ALLOWED_BINARY_TYPES: &[&str] =
    &["image/png", "image/jpeg", "image/webp", "application/pdf"];
pub const DEFAULT_MAX_BINARY_FILE_SIZE: usize = 10 * 1024 * 1024;
/// Region handed to S3-compatible providers that do not care about regions.
pub const DEFAULT_S3_REGION: &str = "us-east-1";
/// Ceiling for JSON request bodies.
pub const JSON_BODY_LIMIT: usize = 50 * 1024 * 1024;

/// Configuration errors, reported before the server starts.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} environment variable is required but not set")]
    Missing(&'static str),
    #[error("{var} must be a valid number, got '{value}'")]
    InvalidNumber { var: &'static str, value: String },
    #[error("invalid {var}: {source}")]
    InvalidUrl {
        var: &'static str,
        #[source]
        source: InvalidUrl,
    },
    #[error("invalid storage type '{0}', expected one of: local, aws, gcp")]
    UnknownStorageType(String),
    #[error("S3_REGION is required when using AWS S3 (no S3_ENDPOINT specified)")]
    MissingS3Region,
    #[error("AVAILABLE_BUCKETS must name at least one bucket")]
    NoBuckets,
}

/// Logging output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Bucket allow-list and optional default.
///
/// Invariant: when a default is set it is a member of `available`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BucketConfig {
    available: Vec<String>,
    default: Option<String>,
}

impl BucketConfig {
    /// Build the allow-list, appending the default bucket when missing.
    pub fn new(available: Vec<String>, default: Option<String>) -> Self {
        let mut available = available;
        if let Some(default) = &default {
            if !available.contains(default) {
                available.push(default.clone());
            }
        }
        Self { available, default }
    }

    pub fn available(&self) -> &[String] {
        &self.available
    }

    pub fn default_bucket(&self) -> Option<&str> {
        self.default.as_deref()
    }
}

/// PEM certificate and key used to serve HTTPS.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlsPaths {
    pub cert: PathBuf,
    pub key: PathBuf,
}

/// Complete service configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub protocol: String,
    pub domain: String,
    pub external_port: u16,
    pub api_version: String,
    pub api_key: String,
    pub buckets: BucketConfig,
    pub storage: StorageConfig,
    pub public_url: Option<BaseUrl>,
    pub allowed_binary_types: Vec<String>,
    pub max_binary_file_size: usize,
    pub tls: Option<TlsPaths>,
    pub log_format: LogFormat,
}

impl AppConfig {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// Empty values are treated as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let port = parse_number(PORT_ENV, var(PORT_ENV))?.unwrap_or(DEFAULT_PORT);
        let external_port = parse_number(EXTERNAL_PORT_ENV, var(EXTERNAL_PORT_ENV))?.unwrap_or(port);

        let api_key = var(API_KEY_ENV).ok_or(ConfigError::Missing(API_KEY_ENV))?;

        let available = match var(AVAILABLE_BUCKETS_ENV) {
            Some(list) => split_list(&list),
            None => to_strings(DEFAULT_AVAILABLE_BUCKETS),
        };
        let buckets = BucketConfig::new(available, var(DEFAULT_BUCKET_ENV));
        if buckets.available().is_empty() {
            return Err(ConfigError::NoBuckets);
        }

        let storage = storage_config(&var)?;

        let public_url = var(PUBLIC_URL_ENV)
            .map(|raw| parse_url(PUBLIC_URL_ENV, &raw))
            .transpose()?;

        let allowed_binary_types = match var(ALLOWED_BINARY_TYPES_ENV) {
            Some(list) => split_list(&list),
            None => to_strings(DEFAULT_ALLOWED_BINARY_TYPES),
        };

        let max_binary_file_size = parse_number(MAX_BINARY_FILE_SIZE_ENV, var(MAX_BINARY_FILE_SIZE_ENV))?
            .unwrap_or(DEFAULT_MAX_BINARY_FILE_SIZE);

        let tls = match (var(TLS_CERT_PATH_ENV), var(TLS_KEY_PATH_ENV)) {
            (Some(cert), Some(key)) => Some(TlsPaths {
                cert: cert.into(),
                key: key.into(),
            }),
            _ => None,
        };

        let log_format = match var(LOG_FORMAT_ENV).as_deref() {
            Some("json") => LogFormat::Json,
            _ => LogFormat::Pretty,
        };

        Ok(Self {
            host: var(HOST_ENV).unwrap_or_else(|| "0.0.0.0".to_string()),
            port,
            protocol: var(PROTOCOL_ENV).unwrap_or_else(|| "http".to_string()),
            domain: var(DOMAIN_ENV).unwrap_or_else(|| "localhost".to_string()),
            external_port,
            api_version: var(API_VERSION_ENV).unwrap_or_else(|| "v1".to_string()),
            api_key,
            buckets,
            storage,
            public_url,
            allowed_binary_types,
            max_binary_file_size,
            tls,
            log_format,
        })
    }

    /// Address this service is reachable at from outside.
    pub fn service_address(&self) -> ServiceAddress {
        ServiceAddress::new(&self.protocol, &self.domain, self.external_port)
    }

    /// Path prefix of every versioned API route.
    pub fn api_prefix(&self) -> String {
        format!("/api/{}", self.api_version)
    }
}

fn storage_config<F>(var: &F) -> Result<StorageConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let kind = var(STORAGE_TYPE_ENV).unwrap_or_else(|| "local".to_string());
    match kind.to_ascii_lowercase().as_str() {
        "local" => Ok(StorageConfig::Local {
            directory: var(LOCAL_DIRECTORY_ENV)
                .unwrap_or_else(|| "uploads".to_string())
                .into(),
        }),
        "aws" | "s3" => {
            let endpoint = var(S3_ENDPOINT_ENV)
                .map(|raw| parse_url(S3_ENDPOINT_ENV, &raw))
                .transpose()?;
            let region = match (var(S3_REGION_ENV), &endpoint) {
                (Some(region), _) => region,
                (None, Some(_)) => DEFAULT_S3_REGION.to_string(),
                (None, None) => return Err(ConfigError::MissingS3Region),
            };
            let force_path_style = var(S3_FORCE_PATH_STYLE_ENV)
                .is_some_and(|value| value.eq_ignore_ascii_case("true"));
            Ok(StorageConfig::S3 {
                region,
                endpoint,
                force_path_style,
            })
        }
        "gcp" | "gcs" => Ok(StorageConfig::Gcs),
        _ => Err(ConfigError::UnknownStorageType(kind)),
    }
}

fn parse_url(var: &'static str, raw: &str) -> Result<BaseUrl, ConfigError> {
    BaseUrl::parse(raw).map_err(|source| ConfigError::InvalidUrl { var, source })
}

fn parse_number<T: std::str::FromStr>(
    var: &'static str,
    value: Option<String>,
) -> Result<Option<T>, ConfigError> {
    value
        .map(|value| {
            value
                .parse()
                .map_err(|_| ConfigError::InvalidNumber { var, value })
        })
        .transpose()
}

fn split_list(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

fn to_strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|item| item.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn defaults_with_only_api_key() {
        let config = load(&[("API_KEY", "secret")]).unwrap();

        assert_eq!(config.port, 3333);
        assert_eq!(config.external_port, 3333);
        assert_eq!(config.api_version, "v1");
        assert_eq!(config.api_prefix(), "/api/v1");
        assert_eq!(config.buckets.available(), &["documents", "files"]);
        assert_eq!(config.buckets.default_bucket(), None);
        assert_eq!(
            config.storage,
            StorageConfig::Local {
                directory: PathBuf::from("uploads")
            }
        );
        assert_eq!(config.allowed_binary_types.len(), 4);
        assert_eq!(config.max_binary_file_size, 10_485_760);
        assert_eq!(config.tls, None);
        assert_eq!(config.log_format, LogFormat::Pretty);
        assert_eq!(config.service_address().base_url(), "http://localhost:3333");
    }

    #[test]
    fn api_key_is_required() {
        assert_eq!(load(&[]).unwrap_err(), ConfigError::Missing("API_KEY"));
        assert_eq!(
            load(&[("API_KEY", "  ")]).unwrap_err(),
            ConfigError::Missing("API_KEY")
        );
    }

    #[test]
    fn default_bucket_joins_available_buckets() {
        let config = load(&[
            ("API_KEY", "secret"),
            ("AVAILABLE_BUCKETS", "a, b,,"),
            ("DEFAULT_BUCKET", "private"),
        ])
        .unwrap();

        assert_eq!(config.buckets.available(), &["a", "b", "private"]);
        assert_eq!(config.buckets.default_bucket(), Some("private"));

        let already_listed = BucketConfig::new(vec!["a".into()], Some("a".into()));
        assert_eq!(already_listed.available(), &["a"]);
    }

    #[test]
    fn external_port_falls_back_to_port() {
        let config = load(&[("API_KEY", "k"), ("PORT", "8080")]).unwrap();
        assert_eq!(config.external_port, 8080);

        let config = load(&[("API_KEY", "k"), ("PORT", "8080"), ("EXTERNAL_PORT", "443"), ("PROTOCOL", "https")]).unwrap();
        assert_eq!(config.service_address().base_url(), "https://localhost");

        let err = load(&[("API_KEY", "k"), ("EXTERNAL_PORT", "abc")]).unwrap_err();
        assert_eq!(
            err,
            ConfigError::InvalidNumber {
                var: "EXTERNAL_PORT",
                value: "abc".into()
            }
        );
    }

    #[test]
    fn s3_requires_region_without_endpoint() {
        let err = load(&[("API_KEY", "k"), ("STORAGE_TYPE", "aws")]).unwrap_err();
        assert_eq!(err, ConfigError::MissingS3Region);

        let config = load(&[("API_KEY", "k"), ("STORAGE_TYPE", "aws"), ("S3_REGION", "eu-west-1")]).unwrap();
        assert_eq!(
            config.storage,
            StorageConfig::S3 {
                region: "eu-west-1".into(),
                endpoint: None,
                force_path_style: false
            }
        );
    }

    #[test]
    fn s3_endpoint_defaults_region_and_parses_path_style() {
        let config = load(&[
            ("API_KEY", "k"),
            ("STORAGE_TYPE", "s3"),
            ("S3_ENDPOINT", "http://localhost:9000"),
            ("S3_FORCE_PATH_STYLE", "true"),
        ])
        .unwrap();

        match config.storage {
            StorageConfig::S3 {
                region,
                endpoint,
                force_path_style,
            } => {
                assert_eq!(region, "us-east-1");
                assert_eq!(endpoint.unwrap().origin(), "http://localhost:9000");
                assert!(force_path_style);
            }
            other => panic!("unexpected storage config {other:?}"),
        }
    }

    #[test]
    fn malformed_urls_fail_fast() {
        let err = load(&[("API_KEY", "k"), ("STORAGE_TYPE", "aws"), ("S3_ENDPOINT", "localhost:9000")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidUrl { var: "S3_ENDPOINT", .. }));

        let err = load(&[("API_KEY", "k"), ("PUBLIC_URL", "not a url")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidUrl { var: "PUBLIC_URL", .. }));
    }

    #[test]
    fn storage_type_is_validated() {
        let config = load(&[("API_KEY", "k"), ("STORAGE_TYPE", "GCP")]).unwrap();
        assert_eq!(config.storage, StorageConfig::Gcs);

        let err = load(&[("API_KEY", "k"), ("STORAGE_TYPE", "ftp")]).unwrap_err();
        assert_eq!(err, ConfigError::UnknownStorageType("ftp".into()));
    }

    #[test]
    fn tls_requires_both_paths_and_log_format_parses() {
        let config = load(&[("API_KEY", "k"), ("TLS_CERT_PATH", "/tls/cert.pem")]).unwrap();
        assert_eq!(config.tls, None);

        let config = load(&[
            ("API_KEY", "k"),
            ("TLS_CERT_PATH", "/tls/cert.pem"),
            ("TLS_KEY_PATH", "/tls/key.pem"),
            ("LOG_FORMAT", "json"),
        ])
        .unwrap();
        assert_eq!(
            config.tls,
            Some(TlsPaths {
                cert: "/tls/cert.pem".into(),
                key: "/tls/key.pem".into()
            })
        );
        assert_eq!(config.log_format, LogFormat::Json);
    }
}
