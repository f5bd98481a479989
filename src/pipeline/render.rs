//! PDF rasterisation: render the first page of a résumé via pdfium.
//!
//! ## Why spawn_blocking?
//!
//! The `pdfium-render` crate wraps the pdfium C++ library, which uses
//! thread-local state internally and is not safe to call from async contexts.
//! `tokio::task::spawn_blocking` moves the work onto the blocking pool so the
//! Tokio workers keep serving other submissions while a page renders.
//!
//! ## Why cap pixels?
//!
//! Page sizes vary wildly. `max_rendered_pixels` caps the longest edge so the
//! preview stays bounded in memory and fits vision-model upload limits.

use image::DynamicImage;
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Why a page could not be rendered. Converted to user-facing text by the
/// converter.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("could not load the pdfium library: {0}")]
    Binding(String),

    #[error("the PDF is password protected")]
    PasswordProtected,

    #[error("the PDF could not be read: {0}")]
    Corrupt(String),

    #[error("the PDF has no pages")]
    NoPages,

    #[error("page rendering failed: {0}")]
    Render(String),

    #[error("render task panicked: {0}")]
    Panicked(String),
}

/// Rasterise the first page of `pdf` with its longest edge capped at
/// `max_pixels`.
pub async fn render_first_page(
    pdf: Vec<u8>,
    max_pixels: u32,
    library_path: Option<PathBuf>,
) -> Result<DynamicImage, RenderError> {
    tokio::task::spawn_blocking(move || {
        render_first_page_blocking(&pdf, max_pixels, library_path.as_deref())
    })
    .await
    .map_err(|e| RenderError::Panicked(e.to_string()))?
}

/// Bind to an explicit pdfium library, or to the system one.
fn bind_pdfium(library_path: Option<&Path>) -> Result<Pdfium, RenderError> {
    let bindings = match library_path {
        Some(path) => Pdfium::bind_to_library(path),
        None => Pdfium::bind_to_system_library(),
    }
    .map_err(|e| RenderError::Binding(format!("{e:?}")))?;

    Ok(Pdfium::new(bindings))
}

fn render_first_page_blocking(
    pdf: &[u8],
    max_pixels: u32,
    library_path: Option<&Path>,
) -> Result<DynamicImage, RenderError> {
    let pdfium = bind_pdfium(library_path)?;

    let document = pdfium.load_pdf_from_byte_slice(pdf, None).map_err(|e| {
        let err_str = format!("{e:?}");
        if err_str.contains("Password") || err_str.contains("password") {
            RenderError::PasswordProtected
        } else {
            RenderError::Corrupt(err_str)
        }
    })?;

    let pages = document.pages();
    if pages.len() == 0 {
        return Err(RenderError::NoPages);
    }

    let render_config = PdfRenderConfig::new()
        .set_target_width(max_pixels as i32)
        .set_maximum_height(max_pixels as i32);

    let page = pages
        .get(0)
        .map_err(|e| RenderError::Render(format!("{e:?}")))?;

    let bitmap = page
        .render_with_config(&render_config)
        .map_err(|e| RenderError::Render(format!("{e:?}")))?;

    let image = bitmap.as_image();
    debug!(
        "Rendered page 1 of {} → {}x{} px",
        pages.len(),
        image.width(),
        image.height()
    );

    Ok(image)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_errors_read_as_sentences() {
        assert_eq!(
            RenderError::PasswordProtected.to_string(),
            "the PDF is password protected"
        );
        assert!(RenderError::Corrupt("bad xref".into())
            .to_string()
            .contains("bad xref"));
    }
}
