//! Turning a submitted document into page rasters and one text blob.

use std::sync::Arc;

use anyhow::{Context, Result};
use image::DynamicImage;

use crate::models::{codes, evidence::stage_code, ContainerKind, DocumentPayload, ExtractedContent, RawDocument};
use crate::structure::{EmbeddedRaster, PdfContainer, StructureForensicsEngine};

const ENABLE_LOGS: bool = true;
const LOG_TAG: &str = "docforensics::pipeline";

use crate::{log_info, log_warn};

/// Reads the text layer of a parsed PDF.
pub trait TextExtractor: Send + Sync {
    fn extract(&self, container: &PdfContainer) -> Result<String>;
}

/// Text layer straight from the PDF content streams.
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfTextExtractor;

impl TextExtractor for PdfTextExtractor {
    fn extract(&self, container: &PdfContainer) -> Result<String> {
        container.text()
    }
}

/// Optical character recognition over a page raster.
pub trait OcrEngine: Send + Sync {
    fn name(&self) -> &str;

    fn recognize(&self, image: &DynamicImage) -> Result<String>;
}

/// What extraction produced, plus what went wrong on the way.
#[derive(Default)]
pub struct Extraction {
    pub content: ExtractedContent,
    pub container: Option<PdfContainer>,
    pub rasters: Vec<EmbeddedRaster>,
    /// `EXTRACTION_FAILED_*` codes.
    pub failures: Vec<String>,
}

impl Extraction {
    fn fail(&mut self, stage: &str, err: anyhow::Error) {
        log_warn!("extraction step '{stage}' failed: {err:#}");
        self.failures.push(stage_code(codes::EXTRACTION_FAILED, stage));
    }
}

pub struct Extractor<'a> {
    pub text: &'a dyn TextExtractor,
    pub ocr: Option<&'a dyn OcrEngine>,
    pub structure: &'a StructureForensicsEngine,
}

impl Extractor<'_> {
    pub fn extract(&self, document: &RawDocument) -> Extraction {
        let mut extraction = Extraction::default();
        match (document.payload(), document.kind()) {
            (DocumentPayload::Pages(pages), _) => {
                extraction.content.pages = pages.clone();
            }
            (DocumentPayload::Bytes(bytes), ContainerKind::Pdf) => {
                match PdfContainer::parse(bytes) {
                    Ok(container) => {
                        extraction.rasters = self.structure.embedded_rasters(&container);
                        extraction.content.pages =
                            extraction.rasters.iter().map(|r| Arc::clone(&r.image)).collect();
                        extraction.content.pages_from_container = true;
                        extraction.container = Some(container);
                    }
                    Err(err) => extraction.fail("container", err),
                }
            }
            (DocumentPayload::Bytes(bytes), _) => {
                match image::load_from_memory(bytes).context("failed to decode image input") {
                    Ok(image) => extraction.content.pages = vec![Arc::new(image)],
                    Err(err) => extraction.fail("image", err),
                }
            }
        }

        extraction.content.text = match document.supplied_text() {
            Some(text) => text.to_string(),
            None => self.read_text(&mut extraction),
        };

        log_info!(
            "extracted {} page raster(s) and {} text character(s)",
            extraction.content.pages.len(),
            extraction.content.text_len()
        );
        extraction
    }

    fn read_text(&self, extraction: &mut Extraction) -> String {
        let mut text = String::new();
        if let Some(container) = &extraction.container {
            match self.text.extract(container) {
                Ok(layer) => text = layer,
                Err(err) => extraction.fail("text", err),
            }
        }
        // Scanned PDFs and plain images carry no text layer.
        if text.trim().is_empty() {
            if let Some(ocr) = self.ocr {
                text = self.recognize_pages(ocr, extraction);
            }
        }
        text
    }

    fn recognize_pages(&self, ocr: &dyn OcrEngine, extraction: &mut Extraction) -> String {
        let mut text = String::new();
        let pages = extraction.content.pages.clone();
        for page in &pages {
            match ocr.recognize(page) {
                Ok(chunk) => {
                    text.push_str(&chunk);
                    text.push('\n');
                }
                Err(err) => {
                    extraction.fail("ocr", err.context(format!("OCR engine '{}'", ocr.name())));
                }
            }
        }
        text
    }
}
