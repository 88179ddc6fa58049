// SPDX-FileCopyrightText: 2026 Kindred Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! First-run download of the ONNX embedding model.
//!
//! Fetches the INT8-quantized all-MiniLM-L6-v2 model and its tokenizer
//! from HuggingFace into the data directory when they are not already
//! present on disk.

use std::path::{Path, PathBuf};

use kindred_core::KindredError;
use tracing::info;

const MODEL_URL: &str =
    "https://huggingface.co/onnx-community/all-MiniLM-L6-v2-ONNX/resolve/main/onnx/model_quantized.onnx";
const TOKENIZER_URL: &str =
    "https://huggingface.co/sentence-transformers/all-MiniLM-L6-v2/resolve/main/tokenizer.json";

/// Resolves and, when missing, downloads the embedding model files.
pub struct ModelFiles {
    model_dir: PathBuf,
}

impl ModelFiles {
    /// Creates a resolver rooted at an explicit model directory, or at the
    /// default `<data_dir>/models/all-MiniLM-L6-v2` when `None`.
    pub fn new(model_dir: Option<&str>, data_dir: &Path) -> Self {
        let model_dir = match model_dir {
            Some(dir) => PathBuf::from(dir),
            None => data_dir.join("models").join("all-MiniLM-L6-v2"),
        };
        Self { model_dir }
    }

    /// The directory holding `model.onnx` and `tokenizer.json`.
    pub fn model_dir(&self) -> &Path {
        &self.model_dir
    }

    /// Returns true if both model and tokenizer files exist on disk.
    pub fn is_available(&self) -> bool {
        self.model_dir.join("model.onnx").exists()
            && self.model_dir.join("tokenizer.json").exists()
    }

    /// Ensures the model files are present, downloading any that are missing.
    ///
    /// Returns the model directory on success. Partial downloads are
    /// removed so a retry starts clean.
    pub async fn ensure(&self) -> Result<PathBuf, KindredError> {
        if self.is_available() {
            return Ok(self.model_dir.clone());
        }

        info!(
            dir = %self.model_dir.display(),
            "embedding model not found, downloading from HuggingFace"
        );

        tokio::fs::create_dir_all(&self.model_dir)
            .await
            .map_err(|e| {
                KindredError::Internal(format!("failed to create model directory: {e}"))
            })?;

        for (filename, url) in [("model.onnx", MODEL_URL), ("tokenizer.json", TOKENIZER_URL)] {
            let dest = self.model_dir.join(filename);
            if dest.exists() {
                continue;
            }

            match download_file(url, &dest).await {
                Ok(size) => info!(file = filename, bytes = size, "downloaded model file"),
                Err(e) => {
                    let _ = tokio::fs::remove_file(&dest).await;
                    return Err(e);
                }
            }
        }

        Ok(self.model_dir.clone())
    }
}

/// Download a file from a URL to a local path, returning its size.
async fn download_file(url: &str, dest: &Path) -> Result<usize, KindredError> {
    let response = reqwest::get(url)
        .await
        .map_err(|e| KindredError::Internal(format!("failed to download {url}: {e}")))?;

    if !response.status().is_success() {
        return Err(KindredError::Internal(format!(
            "download of {url} failed with status {}",
            response.status()
        )));
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| KindredError::Internal(format!("failed to read body from {url}: {e}")))?;

    let size = bytes.len();
    tokio::fs::write(dest, &bytes)
        .await
        .map_err(|e| KindredError::Internal(format!("failed to write {}: {e}", dest.display())))?;

    Ok(size)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_model_dir_wins() {
        let files = ModelFiles::new(Some("/opt/models/minilm"), Path::new("/data"));
        assert_eq!(files.model_dir(), Path::new("/opt/models/minilm"));
    }

    #[test]
    fn default_dir_is_under_data_dir() {
        let files = ModelFiles::new(None, Path::new("/data/kindred"));
        assert_eq!(
            files.model_dir(),
            Path::new("/data/kindred/models/all-MiniLM-L6-v2")
        );
    }

    #[test]
    fn missing_files_report_unavailable() {
        let files = ModelFiles::new(Some("/nonexistent/model/dir"), Path::new("/data"));
        assert!(!files.is_available());
    }
}
