use async_trait::async_trait;
use image::{GrayImage, ImageFormat};
use std::path::{Path, PathBuf};
use tokio::process::Command;

use super::{OcrEngine, OcrError, OcrOptions};

/// OCR engine backed by the `tesseract` CLI.
///
/// Each page is staged as a PNG under the scratch directory and removed once
/// the engine has read it.
#[derive(Debug, Clone)]
pub struct TesseractEngine {
    binary: String,
    scratch_dir: PathBuf,
}

impl TesseractEngine {
    pub fn new(binary: impl Into<String>, scratch_dir: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
            scratch_dir: scratch_dir.into(),
        }
    }

    async fn run(&self, input: &Path, options: &OcrOptions) -> Result<String, OcrError> {
        let output = Command::new(&self.binary)
            .args(tesseract_args(input, options))
            .output()
            .await
            .map_err(|source| OcrError::Spawn {
                binary: self.binary.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(OcrError::Failed {
                binary: self.binary.clone(),
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(clean_output(&String::from_utf8_lossy(&output.stdout)))
    }
}

#[async_trait]
impl OcrEngine for TesseractEngine {
    async fn recognize(&self, image: &GrayImage, options: &OcrOptions) -> Result<String, OcrError> {
        let staged = tempfile::Builder::new()
            .prefix("ocr-")
            .suffix(".png")
            .tempfile_in(&self.scratch_dir)?;
        let path = staged.path().to_path_buf();

        let page = image.clone();
        let target = path.clone();
        tokio::task::spawn_blocking(move || page.save_with_format(&target, ImageFormat::Png))
            .await??;

        let result = self.run(&path, options).await;

        if let Err(e) = staged.close() {
            tracing::warn!(error = %e, path = %path.display(), "Failed to remove staged OCR page");
        }

        result
    }
}

/// Arguments for `tesseract <input> stdout -l <lang> --oem <n> --psm <n>`.
pub fn tesseract_args(input: &Path, options: &OcrOptions) -> Vec<String> {
    vec![
        input.to_string_lossy().into_owned(),
        "stdout".to_string(),
        "-l".to_string(),
        options.language.clone(),
        "--oem".to_string(),
        options.engine_mode.to_string(),
        "--psm".to_string(),
        options.page_seg_mode.to_string(),
    ]
}

/// Drop the page-break form feed tesseract appends and trailing blank lines.
fn clean_output(stdout: &str) -> String {
    stdout.replace('\u{c}', "").trim_end().to_string()
}
