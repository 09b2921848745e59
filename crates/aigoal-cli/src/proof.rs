//! Download of progress-update proof files from the blob aggregator.

use std::path::Path;

use anyhow::{Context, Result, anyhow};
use reqwest::{Client, header};

use crate::retry::{RetryPolicy, send_with_retry};

pub const DEFAULT_AGGREGATOR_URL: &str = "https://aggregator.walrus-testnet.walrus.space";

/// A downloaded proof attachment.
#[derive(Debug)]
pub struct ProofFile {
  pub filename: String,
  pub bytes:    Vec<u8>,
}

#[derive(Clone)]
pub struct ProofStore {
  client:         Client,
  aggregator_url: String,
  retry:          RetryPolicy,
}

impl ProofStore {
  pub fn new(aggregator_url: impl Into<String>) -> Result<Self> {
    let client = Client::builder()
      .build()
      .context("failed to build HTTP client")?;
    Ok(Self {
      client,
      aggregator_url: aggregator_url.into(),
      retry: RetryPolicy::default(),
    })
  }

  pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
    self.retry = retry;
    self
  }

  /// `GET {aggregator}/v1/blobs/{blob_id}`
  pub async fn download(&self, blob_id: &str) -> Result<ProofFile> {
    let url = format!("{}/v1/blobs/{blob_id}", self.aggregator_url.trim_end_matches('/'));
    let resp = send_with_retry(&self.retry, "proof download", || self.client.get(&url))
      .await
      .with_context(|| format!("downloading blob {blob_id}"))?;

    let status = resp.status();
    if !status.is_success() {
      return Err(anyhow!("blob {blob_id} → {status}"));
    }

    let filename = resp
      .headers()
      .get(header::CONTENT_DISPOSITION)
      .and_then(|v| v.to_str().ok())
      .and_then(filename_from_disposition)
      .unwrap_or_else(|| format!("proof-{blob_id}"));

    let bytes = resp.bytes().await.context("reading blob body")?.to_vec();
    Ok(ProofFile { filename, bytes })
  }
}

/// The `filename` parameter of a `Content-Disposition` value, quotes removed
/// and reduced to its final path component.
pub fn filename_from_disposition(value: &str) -> Option<String> {
  let raw = value.split(';').map(str::trim).find_map(|part| {
    let (key, val) = part.split_once('=')?;
    let key = key.trim();
    if key.eq_ignore_ascii_case("filename*") {
      // RFC 5987: charset'lang'value
      val.splitn(3, '\'').nth(2)
    } else if key.eq_ignore_ascii_case("filename") {
      Some(val)
    } else {
      None
    }
  })?;

  let unquoted = raw.trim().trim_matches(|c| c == '"' || c == '\'');
  let name = Path::new(unquoted).file_name()?.to_str()?;
  (!name.is_empty()).then(|| name.to_string())
}

#[cfg(test)]
mod tests {
  use std::time::Duration;

  use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path},
  };

  use super::*;

  fn store_for(server: &MockServer) -> ProofStore {
    ProofStore::new(server.uri()).unwrap().with_retry(RetryPolicy {
      max_retries: 1,
      base_delay:  Duration::ZERO,
      max_delay:   Duration::ZERO,
    })
  }

  #[tokio::test]
  async fn download_without_disposition_uses_blob_id() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(path("/v1/blobs/blob-42"))
      .respond_with(ResponseTemplate::new(200).set_body_bytes(b"proof bytes".to_vec()))
      .mount(&server)
      .await;

    let file = store_for(&server).download("blob-42").await.unwrap();
    assert_eq!(file.filename, "proof-blob-42");
    assert_eq!(file.bytes, b"proof bytes");
  }

  #[tokio::test]
  async fn download_takes_disposition_filename() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(path("/v1/blobs/blob-7"))
      .respond_with(
        ResponseTemplate::new(200)
          .insert_header("content-disposition", r#"attachment; filename="run-log.pdf""#)
          .set_body_bytes(b"%PDF".to_vec()),
      )
      .mount(&server)
      .await;

    let file = store_for(&server).download("blob-7").await.unwrap();
    assert_eq!(file.filename, "run-log.pdf");
  }

  #[tokio::test]
  async fn missing_blob_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(path("/v1/blobs/gone"))
      .respond_with(ResponseTemplate::new(404))
      .mount(&server)
      .await;

    let err = store_for(&server).download("gone").await.unwrap_err();
    assert!(err.to_string().contains("404"), "{err}");
    assert_eq!(server.received_requests().await.unwrap().len(), 1);
  }

  #[test]
  fn quoted_filename() {
    assert_eq!(
      filename_from_disposition(r#"attachment; filename="run-log.pdf""#).as_deref(),
      Some("run-log.pdf")
    );
  }

  #[test]
  fn bare_and_extended_filenames() {
    assert_eq!(
      filename_from_disposition("attachment; filename=photo.jpg").as_deref(),
      Some("photo.jpg")
    );
    assert_eq!(
      filename_from_disposition("attachment; filename*=UTF-8''proof.png").as_deref(),
      Some("proof.png")
    );
  }

  #[test]
  fn path_components_are_stripped() {
    assert_eq!(
      filename_from_disposition(r#"attachment; filename="../../etc/passwd""#).as_deref(),
      Some("passwd")
    );
  }

  #[test]
  fn missing_filename() {
    assert_eq!(filename_from_disposition("inline"), None);
    assert_eq!(filename_from_disposition(r#"attachment; filename="""#), None);
  }
}
