//! Document conversion: résumé document → preview image.
//!
//! The pipeline only needs "one image, or a reason why not". That is the
//! [`DocumentConverter`] contract; [`PdfiumConverter`] fulfils it by
//! rendering the first PDF page.

use crate::error::DEFAULT_CONVERSION_ERROR;
use crate::pipeline::{encode, render};
use crate::store::Blob;
use async_trait::async_trait;
use std::path::PathBuf;
use tracing::warn;

/// Outcome reported by a converter.
///
/// Mirrors the `{ image } | { error }` shape converters report; both halves
/// are optional because a converter can "succeed" without producing
/// anything usable. [`ConversionResult::into_image`] resolves the ambiguity.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConversionResult {
    pub image: Option<Blob>,
    pub error: Option<String>,
}

impl ConversionResult {
    pub fn image(image: Blob) -> Self {
        Self {
            image: Some(image),
            error: None,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            image: None,
            error: Some(message.into()),
        }
    }

    /// The usable image, or the message to show the user.
    ///
    /// A missing or zero-byte image is a failure. The converter's message is
    /// used when it supplied a non-empty one, else the generic fallback.
    pub fn into_image(self) -> Result<Blob, String> {
        match self.image {
            Some(image) if !image.is_empty() => Ok(image),
            _ => Err(self
                .error
                .filter(|m| !m.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_CONVERSION_ERROR.to_string())),
        }
    }
}

/// Turns a source document into a single rendered image.
#[async_trait]
pub trait DocumentConverter: Send + Sync {
    async fn convert(&self, document: &Blob) -> ConversionResult;
}

/// Renders page 1 of a PDF to a PNG through pdfium.
#[derive(Debug, Clone)]
pub struct PdfiumConverter {
    max_rendered_pixels: u32,
    library_path: Option<PathBuf>,
}

impl Default for PdfiumConverter {
    fn default() -> Self {
        Self {
            max_rendered_pixels: 2000,
            library_path: None,
        }
    }
}

impl PdfiumConverter {
    pub fn new(max_rendered_pixels: u32, library_path: Option<PathBuf>) -> Self {
        Self {
            max_rendered_pixels: max_rendered_pixels.max(100),
            library_path,
        }
    }
}

/// `resume.pdf` → `resume.png`; names without a `.pdf` suffix get `.png` appended.
pub fn preview_name(document_name: &str) -> String {
    let base = document_name.rsplit('/').next().unwrap_or(document_name);
    let stem = match base.len().checked_sub(4) {
        Some(cut) if base.is_char_boundary(cut) && base[cut..].eq_ignore_ascii_case(".pdf") => {
            &base[..cut]
        }
        _ => base,
    };
    let stem = if stem.is_empty() { "resume" } else { stem };
    format!("{stem}.png")
}

#[async_trait]
impl DocumentConverter for PdfiumConverter {
    async fn convert(&self, document: &Blob) -> ConversionResult {
        if !document.is_pdf() {
            return ConversionResult::failed("Failed to convert PDF: file is not a PDF");
        }

        let image = match render::render_first_page(
            document.bytes.clone(),
            self.max_rendered_pixels,
            self.library_path.clone(),
        )
        .await
        {
            Ok(image) => image,
            Err(e) => {
                warn!("Rendering {} failed: {}", document.name, e);
                return ConversionResult::failed(format!("Failed to convert PDF: {e}"));
            }
        };

        match encode::encode_png(&image) {
            Ok(png) => ConversionResult::image(Blob::new(
                preview_name(&document.name),
                "image/png",
                png,
            )),
            Err(e) => ConversionResult::failed(format!("Failed to convert PDF: {e}")),
        }
    }
}
