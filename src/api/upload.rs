//! Unsigned uploads to an image host (Cloudinary-style endpoint).
//!
//! In the TUI the user points a form row at a local file path; the file is
//! uploaded as multipart form data with an `upload_preset` and the returned
//! `secure_url` replaces the path in the record being edited.

use std::path::Path;

use color_eyre::eyre::{eyre, Result};
use tokio::fs;
use tracing::debug;

use crate::config::UploadConfig;

#[derive(Clone)]
pub struct Uploader {
  http: reqwest::Client,
  url: String,
  preset: String,
}

impl Uploader {
  pub fn new(config: &UploadConfig) -> Self {
    Self {
      http: reqwest::Client::new(),
      url: config.url.clone(),
      preset: config.preset.clone(),
    }
  }

  /// Uploads a local file and returns its hosted URL.
  pub async fn upload(&self, path: &Path) -> Result<String> {
    let bytes = fs::read(path)
      .await
      .map_err(|e| eyre!("cannot read {}: {e}", path.display()))?;
    let filename = path
      .file_name()
      .map(|n| n.to_string_lossy().into_owned())
      .unwrap_or_else(|| "upload".to_string());
    debug!(file = %path.display(), size = bytes.len(), "uploading");

    let part = reqwest::multipart::Part::bytes(bytes).file_name(filename);
    let form = reqwest::multipart::Form::new()
      .part("file", part)
      .text("upload_preset", self.preset.clone());

    let response = self.http.post(&self.url).multipart(form).send().await?;
    let status = response.status();
    if !status.is_success() {
      return Err(eyre!("upload failed with status {status}"));
    }
    let body: serde_json::Value = response.json().await?;
    body
      .get("secure_url")
      .and_then(|u| u.as_str())
      .map(String::from)
      .ok_or_else(|| eyre!("upload response had no secure_url"))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use wiremock::matchers::{method, path};
  use wiremock::{Mock, MockServer, ResponseTemplate};

  #[tokio::test]
  async fn test_upload_returns_secure_url() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
      .and(path("/image/upload"))
      .respond_with(ResponseTemplate::new(200).set_body_json(
        serde_json::json!({"secure_url": "https://cdn.example/abc.png"}),
      ))
      .mount(&server)
      .await;

    let dir = std::env::temp_dir().join("folio-upload-test");
    std::fs::create_dir_all(&dir).unwrap();
    let file = dir.join("cover.png");
    std::fs::write(&file, b"png-bytes").unwrap();

    let uploader = Uploader::new(&UploadConfig {
      url: format!("{}/image/upload", server.uri()),
      preset: "unsigned".to_string(),
    });
    let url = uploader.upload(&file).await.unwrap();
    assert_eq!(url, "https://cdn.example/abc.png");
  }

  #[tokio::test]
  async fn test_missing_file_is_an_error() {
    let uploader = Uploader::new(&UploadConfig {
      url: "http://127.0.0.1:1/image/upload".to_string(),
      preset: "unsigned".to_string(),
    });
    let err = uploader.upload(Path::new("/no/such/file.png")).await.unwrap_err();
    assert!(err.to_string().contains("cannot read"));
  }
}
