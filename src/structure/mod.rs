//! Container forensics: metadata timeline, revision count, font patchwork and
//! reused embedded objects. Only PDF containers carry this information;
//! plain images skip the axis.

pub mod config;
pub mod container;
pub mod fonts;
pub mod metadata;
pub mod objects;

use std::sync::Arc;

use anyhow::Result;
use chrono::{NaiveDateTime, Utc};
use image::DynamicImage;
use lopdf::ObjectId;

use crate::models::{codes, Evidence, IncrementalUpdates, StructureFindings};
use crate::utils::or_neutral;

pub use config::StructureConfig;
pub use container::PdfContainer;

use self::container::count_eof_markers;
use self::fonts::FontTally;

const ENABLE_LOGS: bool = true;
const LOG_TAG: &str = "docforensics::structure";

use crate::{log_debug, log_info};

/// A raster decoded out of an image XObject.
#[derive(Debug, Clone)]
pub struct EmbeddedRaster {
    pub object_id: ObjectId,
    pub image: Arc<DynamicImage>,
}

#[derive(Debug, Clone, Default)]
pub struct StructureForensicsEngine {
    config: StructureConfig,
}

impl StructureForensicsEngine {
    pub fn new(config: StructureConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &StructureConfig {
        &self.config
    }

    /// Parse and analyze PDF bytes against the current clock.
    pub fn analyze(&self, bytes: &[u8]) -> Result<StructureFindings> {
        let container = PdfContainer::parse(bytes)?;
        Ok(self.analyze_container(&container, bytes, Utc::now().naive_utc()))
    }

    /// Analyze an already parsed container. `now` is the analysis clock used
    /// for the recent-creation check.
    pub fn analyze_container(
        &self,
        container: &PdfContainer,
        bytes: &[u8],
        now: NaiveDateTime,
    ) -> StructureFindings {
        let metadata = metadata::analyze_timeline(
            container.info_entry("CreationDate"),
            container.info_entry("ModDate"),
            container.info_entry("Producer"),
            now,
            &self.config,
        );

        let revision_count = count_eof_markers(bytes);
        let incremental_updates = IncrementalUpdates {
            has_incremental_updates: revision_count > 1,
            revision_count,
        };

        let mut structural_clones = Vec::new();
        let mut tally = FontTally::new();
        for (page_number, page_id) in container.pages() {
            let operations = or_neutral(
                "page content",
                container.page_operations(page_id),
                Vec::new(),
            );
            let images = container.page_images(page_id);
            structural_clones.extend(objects::find_structural_clones(
                page_number,
                &images,
                &operations,
            ));
            tally.add_page(&operations, &container.page_fonts(page_id));
        }
        let font_analysis = tally.finish(&self.config);

        let jpeg_ids: Vec<ObjectId> = container
            .all_images()
            .into_iter()
            .filter(|id| container.is_jpeg(*id))
            .collect();
        let hashes = objects::hash_pictures(&jpeg_ids, |id| container.decode_image(id));
        let duplicate_images = objects::find_duplicates(&hashes, self.config.duplicate_max_hamming);

        log_info!(
            "structure: producer {:?}, {} revision(s), {} clone(s), {} font outlier(s), {} duplicate(s)",
            metadata.producer,
            revision_count,
            structural_clones.len(),
            font_analysis.suspicious_fonts.len(),
            duplicate_images.len()
        );

        StructureFindings {
            metadata,
            structural_clones,
            duplicate_images,
            font_analysis,
            incremental_updates,
        }
    }

    /// Decode every supported image XObject of the container, in page order.
    pub fn embedded_rasters(&self, container: &PdfContainer) -> Vec<EmbeddedRaster> {
        container
            .all_images()
            .into_iter()
            .filter_map(|object_id| match container.decode_image(object_id) {
                Ok(image) => Some(EmbeddedRaster {
                    object_id,
                    image: Arc::new(image),
                }),
                Err(err) => {
                    log_debug!("embedded image not decoded: {err:#}");
                    None
                }
            })
            .collect()
    }

    /// Embedded rasters sized like a pasted patch (a field, a signature).
    pub fn count_patches(&self, rasters: &[EmbeddedRaster]) -> u32 {
        let count = rasters
            .iter()
            .filter(|raster| self.config.is_patch_sized(raster.image.width(), raster.image.height()))
            .count();
        u32::try_from(count).unwrap_or(u32::MAX)
    }
}

pub fn raise_evidence(findings: &StructureFindings, evidence: &mut Evidence) {
    evidence.raise_all(findings.metadata.issues.iter().cloned());
    if findings.incremental_updates.has_incremental_updates {
        evidence.raise(codes::INCREMENTAL_UPDATES);
    }
    if !findings.font_analysis.suspicious_fonts.is_empty() {
        evidence.raise(codes::FONT_OUTLIER);
    }
    if !findings.structural_clones.is_empty() {
        evidence.raise(codes::STRUCTURAL_CLONE_DETECTED);
    }
    if !findings.duplicate_images.is_empty() {
        evidence.raise(codes::DUPLICATE_EMBEDDED_IMAGE);
    }
}


#[cfg(test)]
mod tests {
    use super::test_pdf::{build, PdfSpec};
    use super::*;
    use chrono::NaiveDate;

    fn june_2024() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 6, 1)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    fn analyze(spec: &PdfSpec<'_>) -> StructureFindings {
        let bytes = build(spec);
        let container = PdfContainer::parse(&bytes).unwrap();
        StructureForensicsEngine::default().analyze_container(&container, &bytes, june_2024())
    }

    #[test]
    fn clean_pdf_has_no_structural_findings() {
        let findings = analyze(&PdfSpec::default());
        assert_eq!(findings.producer(), Some("Microsoft Word"));
        assert!(findings.metadata.issues.is_empty(), "{:?}", findings.metadata.issues);
        assert!(findings.structural_clones.is_empty());
        assert_eq!(findings.incremental_updates.revision_count, 1);

        let mut evidence = Evidence::new();
        raise_evidence(&findings, &mut evidence);
        assert!(evidence.is_empty());
    }

    #[test]
    fn reads_editor_producer_and_timeline_edit() {
        let findings = analyze(&PdfSpec {
            producer: Some("Adobe Photoshop 25.0"),
            mod_date: Some("D:20240301090000"),
            ..PdfSpec::default()
        });
        assert_eq!(findings.metadata.editing_tool.as_deref(), Some("photoshop"));

        let mut evidence = Evidence::new();
        raise_evidence(&findings, &mut evidence);
        assert!(evidence.contains(codes::EDITING_SOFTWARE_PRODUCER));
        assert!(evidence.contains(codes::TIMELINE_MODIFIED));
    }

    #[test]
    fn missing_producer_entry_reads_as_empty() {
        let findings = analyze(&PdfSpec {
            producer: None,
            ..PdfSpec::default()
        });
        assert_eq!(findings.producer(), Some(""));
    }

    #[test]
    fn shared_signature_image_is_a_structural_clone() {
        let findings = analyze(&PdfSpec {
            shared_image_names: &["Sig1", "Sig2"],
            ..PdfSpec::default()
        });
        assert_eq!(findings.structural_clones.len(), 1);
        assert_eq!(findings.structural_clones[0].page, 1);
    }

    #[test]
    fn appended_revision_counts_as_incremental_update() {
        let mut bytes = build(&PdfSpec::default());
        bytes.extend_from_slice(b"\n1 0 obj\n<<>>\nendobj\n%%EOF\n");
        let container = PdfContainer::parse(&build(&PdfSpec::default())).unwrap();
        let findings =
            StructureForensicsEngine::default().analyze_container(&container, &bytes, june_2024());
        assert!(findings.incremental_updates.has_incremental_updates);
        assert_eq!(findings.incremental_updates.revision_count, 2);
    }

    #[test]
    fn decodes_flate_free_gray_image() {
        let bytes = build(&PdfSpec {
            shared_image_names: &["Im1"],
            ..PdfSpec::default()
        });
        let container = PdfContainer::parse(&bytes).unwrap();
        let engine = StructureForensicsEngine::default();
        let rasters = engine.embedded_rasters(&container);
        assert_eq!(rasters.len(), 1);
        assert_eq!((rasters[0].image.width(), rasters[0].image.height()), (2, 2));
        assert_eq!(engine.count_patches(&rasters), 0);
    }
}
