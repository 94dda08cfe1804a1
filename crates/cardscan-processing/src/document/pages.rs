use async_trait::async_trait;
use cardscan_core::SourceKind;
use image::DynamicImage;
use std::path::{Path, PathBuf};
use std::process::ExitStatus;
use std::sync::Arc;
use tokio::process::Command;

use crate::image::decode_image;

const PAGE_PREFIX: &str = "page";

#[derive(Debug, thiserror::Error)]
pub enum PageError {
    #[error("Failed to stage document: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to run {binary}: {source}")]
    Spawn {
        binary: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{binary} exited with {status}: {stderr}")]
    Failed {
        binary: String,
        status: ExitStatus,
        stderr: String,
    },

    #[error("Failed to decode page {page}: {source}")]
    Decode {
        page: usize,
        #[source]
        source: image::ImageError,
    },

    #[error("Rasterizer produced no pages")]
    NoPages,

    #[error("Page decoding task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Renders every page of a paginated document into a raster image, in page order.
#[async_trait]
pub trait PageRasterizer: Send + Sync {
    async fn rasterize(&self, document: &[u8]) -> Result<Vec<DynamicImage>, PageError>;
}

/// Rasterizer backed by the poppler `pdftoppm` binary.
#[derive(Debug, Clone)]
pub struct PdftoppmRasterizer {
    binary: String,
    dpi: u32,
    scratch_dir: PathBuf,
}

impl PdftoppmRasterizer {
    pub fn new(binary: impl Into<String>, dpi: u32, scratch_dir: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
            dpi,
            scratch_dir: scratch_dir.into(),
        }
    }

    async fn render(&self, workdir: &Path, document: &[u8]) -> Result<Vec<DynamicImage>, PageError> {
        let input = workdir.join("document.pdf");
        tokio::fs::write(&input, document).await?;

        let output = Command::new(&self.binary)
            .args(pdftoppm_args(self.dpi, &input, &workdir.join(PAGE_PREFIX)))
            .output()
            .await
            .map_err(|source| PageError::Spawn {
                binary: self.binary.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(PageError::Failed {
                binary: self.binary.clone(),
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let mut pages = Vec::new();
        let mut entries = tokio::fs::read_dir(workdir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if let Some(number) = path
                .file_name()
                .and_then(|n| n.to_str())
                .and_then(page_number)
            {
                pages.push((number, path));
            }
        }
        pages.sort_by_key(|(number, _)| *number);

        if pages.is_empty() {
            return Err(PageError::NoPages);
        }

        tracing::debug!(pages = pages.len(), dpi = self.dpi, "Rasterized document");

        tokio::task::spawn_blocking(move || {
            pages
                .into_iter()
                .map(|(number, path)| {
                    let data = std::fs::read(&path)?;
                    decode_image(&data).map_err(|source| PageError::Decode {
                        page: number,
                        source,
                    })
                })
                .collect::<Result<Vec<_>, PageError>>()
        })
        .await?
    }
}

#[async_trait]
impl PageRasterizer for PdftoppmRasterizer {
    async fn rasterize(&self, document: &[u8]) -> Result<Vec<DynamicImage>, PageError> {
        let workdir = tempfile::Builder::new()
            .prefix("pages-")
            .tempdir_in(&self.scratch_dir)?;

        let result = self.render(workdir.path(), document).await;

        let path = workdir.path().to_path_buf();
        if let Err(e) = workdir.close() {
            tracing::warn!(error = %e, path = %path.display(), "Failed to remove rasterizer scratch directory");
        }

        result
    }
}

/// Arguments for `pdftoppm -png -r <dpi> <input> <prefix>`.
pub fn pdftoppm_args(dpi: u32, input: &Path, prefix: &Path) -> Vec<String> {
    vec![
        "-png".to_string(),
        "-r".to_string(),
        dpi.to_string(),
        input.to_string_lossy().into_owned(),
        prefix.to_string_lossy().into_owned(),
    ]
}

/// Parse the page number out of a `page-<n>.png` file name (pdftoppm zero-pads `n`).
fn page_number(file_name: &str) -> Option<usize> {
    file_name
        .strip_prefix(PAGE_PREFIX)?
        .strip_prefix('-')?
        .strip_suffix(".png")?
        .parse()
        .ok()
}

/// Page Extractor
///
/// Turns an upload into its page images. Failures never propagate: a document
/// that cannot be decoded or rasterized yields no pages.
#[derive(Clone)]
pub struct PageExtractor {
    rasterizer: Arc<dyn PageRasterizer>,
}

impl PageExtractor {
    pub fn new(rasterizer: Arc<dyn PageRasterizer>) -> Self {
        Self { rasterizer }
    }

    pub async fn extract_pages(&self, document: &[u8], kind: SourceKind) -> Vec<DynamicImage> {
        match kind {
            SourceKind::Image => {
                let data = document.to_vec();
                match tokio::task::spawn_blocking(move || decode_image(&data)).await {
                    Ok(Ok(image)) => vec![image],
                    Ok(Err(e)) => {
                        tracing::warn!(error = %e, "Failed to decode card image");
                        Vec::new()
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "Card image decoding task failed");
                        Vec::new()
                    }
                }
            }
            SourceKind::Paginated => match self.rasterizer.rasterize(document).await {
                Ok(pages) => pages,
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to rasterize document, no cards extracted");
                    Vec::new()
                }
            },
        }
    }
}
