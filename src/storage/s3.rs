// ABOUTME: S3-compatible object storage using SigV4 query-string presigning
// ABOUTME: HEAD and DELETE go through the same presigner, no SDK dependency
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 CastCraft

use std::fmt::Write as _;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use ring::digest::{digest, SHA256};
use ring::hmac;
use uuid::Uuid;

use super::{user_key_prefix, ObjectStorage, PresignedUpload};
use crate::config::StorageConfig;
use crate::errors::{AppError, AppResult};

const UNSIGNED_PAYLOAD: &str = "UNSIGNED-PAYLOAD";

/// S3-compatible storage with presigned access
pub struct S3Storage {
    client: Client,
    bucket: String,
    region: String,
    endpoint: String,
    access_key_id: String,
    secret_access_key: String,
    presign_expiry: Duration,
}

impl S3Storage {
    /// Create a storage client from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(config: &StorageConfig) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| AppError::internal(format!("Failed to create HTTP client: {e}")))?;

        let endpoint = config.endpoint.clone().unwrap_or_else(|| {
            format!("https://s3.{}.amazonaws.com", config.region)
        });

        Ok(Self {
            client,
            bucket: config.bucket.clone(),
            region: config.region.clone(),
            endpoint,
            access_key_id: config.access_key_id.clone(),
            secret_access_key: config.secret_access_key.clone(),
            presign_expiry: config.presign_expiry,
        })
    }

    fn host(&self) -> AppResult<String> {
        let url = url::Url::parse(&self.endpoint)
            .map_err(|e| AppError::config(format!("invalid storage endpoint: {e}")))?;
        let host = url
            .host_str()
            .ok_or_else(|| AppError::config("storage endpoint has no host"))?;
        Ok(url.port().map_or_else(
            || host.to_owned(),
            |port| format!("{host}:{port}"),
        ))
    }

    /// Build a SigV4 query-presigned URL for `method` on `key`.
    fn presign(&self, method: &str, key: &str, now: DateTime<Utc>) -> AppResult<String> {
        let host = self.host()?;
        let amz_date = now.format("%Y%m%dT%H%M%SZ").to_string();
        let date = now.format("%Y%m%d").to_string();
        let scope = format!("{date}/{}/s3/aws4_request", self.region);
        let credential = format!("{}/{scope}", self.access_key_id);

        let canonical_path = format!(
            "/{}/{}",
            uri_encode(&self.bucket, false),
            uri_encode(key, false)
        );

        let mut query: Vec<(String, String)> = vec![
            ("X-Amz-Algorithm".into(), "AWS4-HMAC-SHA256".into()),
            ("X-Amz-Credential".into(), credential),
            ("X-Amz-Date".into(), amz_date.clone()),
            ("X-Amz-Expires".into(), self.presign_expiry.as_secs().to_string()),
            ("X-Amz-SignedHeaders".into(), "host".into()),
        ];
        query.sort();

        let canonical_query = query
            .iter()
            .map(|(k, v)| format!("{}={}", uri_encode(k, true), uri_encode(v, true)))
            .collect::<Vec<_>>()
            .join("&");

        let canonical_request = format!(
            "{method}\n{canonical_path}\n{canonical_query}\nhost:{host}\n\nhost\n{UNSIGNED_PAYLOAD}"
        );

        let string_to_sign = format!(
            "AWS4-HMAC-SHA256\n{amz_date}\n{scope}\n{}",
            hex::encode(digest(&SHA256, canonical_request.as_bytes()))
        );

        let signing_key = self.signing_key(&date);
        let signature = hex::encode(
            hmac::sign(
                &hmac::Key::new(hmac::HMAC_SHA256, &signing_key),
                string_to_sign.as_bytes(),
            )
            .as_ref(),
        );

        Ok(format!(
            "{}{canonical_path}?{canonical_query}&X-Amz-Signature={signature}",
            self.endpoint.trim_end_matches('/')
        ))
    }

    fn signing_key(&self, date: &str) -> Vec<u8> {
        let mut key = format!("AWS4{}", self.secret_access_key).into_bytes();
        for part in [date, self.region.as_str(), "s3", "aws4_request"] {
            key = hmac::sign(&hmac::Key::new(hmac::HMAC_SHA256, &key), part.as_bytes())
                .as_ref()
                .to_vec();
        }
        key
    }
}

/// AWS-style URI encoding: unreserved characters pass through, everything
/// else is percent-encoded; `/` is preserved in paths
fn uri_encode(input: &str, encode_slash: bool) -> String {
    let mut encoded = String::with_capacity(input.len());
    for byte in input.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' => {
                encoded.push(byte as char);
            }
            b'/' if !encode_slash => encoded.push('/'),
            _ => {
                let _ = write!(encoded, "%{byte:02X}");
            }
        }
    }
    encoded
}

#[async_trait]
impl ObjectStorage for S3Storage {
    async fn presign_upload(
        &self,
        user_id: Uuid,
        file_name: &str,
        _content_type: &str,
    ) -> AppResult<PresignedUpload> {
        // Flatten any client-supplied path to its final component
        let safe_name = file_name
            .rsplit(['/', '\\'])
            .next()
            .filter(|name| !name.is_empty())
            .ok_or_else(|| AppError::invalid_input("Invalid file name"))?;
        let key = format!("{}{}-{safe_name}", user_key_prefix(user_id), Uuid::new_v4());
        let url = self.presign("PUT", &key, Utc::now())?;
        Ok(PresignedUpload { url, key })
    }

    async fn presign_download(&self, key: &str) -> AppResult<String> {
        self.presign("GET", key, Utc::now())
    }

    async fn head_size(&self, key: &str) -> AppResult<Option<u64>> {
        let url = self.presign("HEAD", key, Utc::now())?;
        let response = self.client.head(&url).send().await.map_err(|e| {
            AppError::external_service("storage", format!("HEAD failed: {e}"))
        })?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(AppError::external_service(
                "storage",
                format!("HEAD returned {}", response.status()),
            ));
        }
        Ok(response.content_length())
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        let url = self.presign("DELETE", key, Utc::now())?;
        let response = self.client.delete(&url).send().await.map_err(|e| {
            AppError::external_service("storage", format!("DELETE failed: {e}"))
        })?;

        // S3 returns 204 for deletes, including of missing objects
        if !response.status().is_success() && response.status() != reqwest::StatusCode::NOT_FOUND {
            return Err(AppError::external_service(
                "storage",
                format!("DELETE returned {}", response.status()),
            ));
        }
        Ok(())
    }
}
