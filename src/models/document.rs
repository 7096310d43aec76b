use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use anyhow::{anyhow, Result};
use image::DynamicImage;
use serde::{Deserialize, Serialize};

/// Business context a document is submitted under. Drives the scoring policy.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Sector {
    Generic,
    /// Human resources / employment.
    Rh,
    /// Real estate / tenancy files.
    Immobilier,
    Banque,
    /// Legal.
    Juridique,
    /// Insurance.
    Assurance,
}

impl Sector {
    pub const ALL: [Sector; 6] = [
        Sector::Generic,
        Sector::Rh,
        Sector::Immobilier,
        Sector::Banque,
        Sector::Juridique,
        Sector::Assurance,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Sector::Generic => "GENERIC",
            Sector::Rh => "RH",
            Sector::Immobilier => "IMMOBILIER",
            Sector::Banque => "BANQUE",
            Sector::Juridique => "JURIDIQUE",
            Sector::Assurance => "ASSURANCE",
        }
    }

    /// Parse a declared sector, falling back to `Generic` for values outside
    /// the enumeration.
    pub fn parse_or_generic(value: &str) -> Sector {
        value.parse().unwrap_or_else(|err| {
            log::warn!("{err}; falling back to GENERIC");
            Sector::Generic
        })
    }
}

impl Default for Sector {
    fn default() -> Self {
        Sector::Generic
    }
}

impl FromStr for Sector {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self> {
        let wanted = value.trim().to_ascii_uppercase();
        Sector::ALL
            .into_iter()
            .find(|sector| sector.as_str() == wanted)
            .ok_or_else(|| anyhow!("unknown sector context '{value}'"))
    }
}

impl fmt::Display for Sector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the ingestion collaborator handed over.
#[derive(Debug, Clone)]
pub enum DocumentPayload {
    /// Encoded container: a PDF or a single encoded image (PNG, JPEG, ...).
    Bytes(Arc<[u8]>),
    /// Pages already rasterized upstream.
    Pages(Vec<Arc<DynamicImage>>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContainerKind {
    Pdf,
    Image,
    Pages,
}

/// A submitted document. Immutable once built.
#[derive(Debug, Clone)]
pub struct RawDocument {
    payload: DocumentPayload,
    sector: Sector,
    file_name: Option<String>,
    supplied_text: Option<String>,
}

impl RawDocument {
    pub fn from_bytes(bytes: impl Into<Arc<[u8]>>, sector: Sector) -> Self {
        Self {
            payload: DocumentPayload::Bytes(bytes.into()),
            sector,
            file_name: None,
            supplied_text: None,
        }
    }

    pub fn from_pages(pages: Vec<DynamicImage>, sector: Sector) -> Self {
        Self {
            payload: DocumentPayload::Pages(pages.into_iter().map(Arc::new).collect()),
            sector,
            file_name: None,
            supplied_text: None,
        }
    }

    pub fn with_file_name(mut self, name: impl Into<String>) -> Self {
        self.file_name = Some(name.into());
        self
    }

    /// Attach text produced by an external OCR/text collaborator. When set,
    /// the pipeline uses it instead of running its own text extraction.
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.supplied_text = Some(text.into());
        self
    }

    pub fn payload(&self) -> &DocumentPayload {
        &self.payload
    }

    pub fn sector(&self) -> Sector {
        self.sector
    }

    pub fn file_name(&self) -> Option<&str> {
        self.file_name.as_deref()
    }

    pub fn supplied_text(&self) -> Option<&str> {
        self.supplied_text.as_deref()
    }

    pub fn bytes(&self) -> Option<&[u8]> {
        match &self.payload {
            DocumentPayload::Bytes(bytes) => Some(bytes),
            DocumentPayload::Pages(_) => None,
        }
    }

    pub fn kind(&self) -> ContainerKind {
        match &self.payload {
            DocumentPayload::Bytes(bytes) if is_pdf(bytes) => ContainerKind::Pdf,
            DocumentPayload::Bytes(_) => ContainerKind::Image,
            DocumentPayload::Pages(_) => ContainerKind::Pages,
        }
    }
}

/// PDF files may carry a few bytes of junk before the header.
fn is_pdf(bytes: &[u8]) -> bool {
    bytes
        .windows(5)
        .take(1024)
        .any(|window| window == b"%PDF-")
}

/// Rasters and text pulled out of a document for one run.
///
/// Page images are owned by the run and dropped with it on every exit path.
#[derive(Debug, Clone, Default)]
pub struct ExtractedContent {
    pub pages: Vec<Arc<DynamicImage>>,
    pub text: String,
    /// Pages that came out of a PDF container rather than being the input itself.
    pub pages_from_container: bool,
}

impl ExtractedContent {
    pub fn text_len(&self) -> usize {
        self.text.chars().count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sector_parses_case_insensitively() {
        assert_eq!("banque".parse::<Sector>().unwrap(), Sector::Banque);
        assert_eq!(" JURIDIQUE ".parse::<Sector>().unwrap(), Sector::Juridique);
        assert!("marine".parse::<Sector>().is_err());
        assert_eq!(Sector::parse_or_generic("marine"), Sector::Generic);
    }

    #[test]
    fn sector_serializes_as_screaming_case() {
        let json = serde_json::to_string(&Sector::Immobilier).unwrap();
        assert_eq!(json, "\"IMMOBILIER\"");
    }

    #[test]
    fn container_kind_sniffs_pdf_header() {
        let pdf = RawDocument::from_bytes(b"%PDF-1.4\n%%EOF".to_vec(), Sector::Generic);
        assert_eq!(pdf.kind(), ContainerKind::Pdf);
        let png = RawDocument::from_bytes(vec![0x89, b'P', b'N', b'G'], Sector::Generic);
        assert_eq!(png.kind(), ContainerKind::Image);
    }
}
