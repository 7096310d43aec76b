//! Full runs through the orchestrator on synthetic inputs.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use image::{DynamicImage, GrayImage, Luma};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use docforensics::models::ContainerKind;
use docforensics::{codes, ForgeryClassifier, Orchestrator, RawDocument, Sector, Verdict};

fn analysis_clock() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339("2024-06-01T12:00:00Z")
        .unwrap()
        .with_timezone(&Utc)
}

/// Single-page PDF with one line of text and the given producer.
fn pdf(producer: &str, text: &str) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });
    let content = Content {
        operations: vec![
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec!["F1".into(), 12.into()]),
            Operation::new("Td", vec![50.into(), 700.into()]),
            Operation::new("Tj", vec![Object::string_literal(text)]),
            Operation::new("ET", vec![]),
        ],
    };
    let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
    });
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![page_id.into()],
            "Count" => 1,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    let info_id = doc.add_object(dictionary! {
        "Producer" => Object::string_literal(producer),
        "CreationDate" => Object::string_literal("D:20240105103000"),
        "ModDate" => Object::string_literal("D:20240105103000"),
    });
    doc.trailer.set("Info", info_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).unwrap();
    bytes
}

/// White page with the same noisy 32×32 stamp pasted at each position.
fn page_with_stamps(positions: &[(u32, u32)]) -> DynamicImage {
    let mut rng = StdRng::seed_from_u64(7);
    let stamp: Vec<u8> = (0..32 * 32).map(|_| rng.gen_range(0u8..=255)).collect();
    let page = GrayImage::from_fn(256, 256, |x, y| {
        for (px, py) in positions {
            if (*px..px + 32).contains(&x) && (*py..py + 32).contains(&y) {
                return Luma([stamp[((y - py) * 32 + (x - px)) as usize]]);
            }
        }
        Luma([255])
    });
    DynamicImage::ImageLuma8(page)
}

struct ConfidentClassifier;

impl ForgeryClassifier for ConfidentClassifier {
    fn name(&self) -> &str {
        "confident"
    }

    fn score(&self, _image: &DynamicImage) -> anyhow::Result<f32> {
        Ok(0.9)
    }
}

#[tokio::test]
async fn edited_payslip_pdf() {
    let bytes = pdf("Adobe Photoshop CS6", "Bulletin de paie - Salaire de base");
    let document = RawDocument::from_bytes(bytes, Sector::Generic);
    let report = Orchestrator::default()
        .analyze_at(document, analysis_clock())
        .await
        .unwrap();

    assert_eq!(report.container, ContainerKind::Pdf);
    assert_eq!(report.detected_sector, "employment");
    assert_eq!(report.sector, Sector::Rh);
    assert_eq!(
        report.findings.structure.metadata.editing_tool.as_deref(),
        Some("photoshop")
    );
    assert!(report.evidence.contains(codes::EDITING_SOFTWARE_PRODUCER));
    assert_eq!(report.score.axis_scores.structure, 60.0);
    assert!(report.score.indicators.contains(&codes::STRUCTURE_SIGNAL.to_string()));

    assert_eq!(report.vds.level_achieved, 0);
    assert!(report.vds.badges.is_empty());
    assert_eq!(report.vds.details.get("metadata_safe"), Some(&false));
    assert!(report.proof.is_some());
    assert!(report.safe_snippet.contains("Bulletin de paie"));
}

#[tokio::test]
async fn copy_move_page_is_suspicious() {
    let page = page_with_stamps(&[(16, 16), (160, 160)]);
    let document = RawDocument::from_pages(vec![page], Sector::Generic);
    let report = Orchestrator::default().analyze(document).await.unwrap();

    assert!(report.findings.forensic.clones_detected >= 1);
    assert!(report.evidence.contains(codes::CLONE_DETECTED));
    assert_eq!(report.score.axis_scores.forensic, 100.0);
    assert_eq!(report.score.risk_score, 40);
    assert_eq!(report.score.verdict, Verdict::Suspicious);
    // Axis indicators land in the evidence next to the engine codes.
    assert!(report.evidence.contains(codes::FORENSIC_SIGNAL));
    assert!(report
        .hypotheses
        .iter()
        .any(|h| h.starts_with("Copy-move alteration")));
}

#[tokio::test]
async fn declared_sector_overrides_detection() {
    let bytes = pdf("Microsoft Word", "Bulletin de paie");
    let document = RawDocument::from_bytes(bytes, Sector::Juridique);
    let report = Orchestrator::default()
        .analyze_at(document, analysis_clock())
        .await
        .unwrap();

    assert_eq!(report.detected_sector, "employment");
    assert_eq!(report.declared_sector, Sector::Juridique);
    assert_eq!(report.sector, Sector::Juridique);
    assert_eq!(report.score.sector, Sector::Juridique);
}

#[tokio::test]
async fn shared_classifier_is_loaded_once() {
    let loads = AtomicUsize::new(0);
    let load = || -> anyhow::Result<Arc<dyn ForgeryClassifier>> {
        loads.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::new(ConfidentClassifier))
    };
    let first = Orchestrator::default().with_shared_classifier(load);
    let _second = Orchestrator::default().with_shared_classifier(load);
    assert_eq!(loads.load(Ordering::SeqCst), 1);

    let page = DynamicImage::ImageLuma8(GrayImage::from_pixel(64, 64, Luma([255])));
    let report = first
        .analyze(RawDocument::from_pages(vec![page], Sector::Generic))
        .await
        .unwrap();
    let probability = report.findings.forensic.classifier_score.unwrap();
    assert!((probability - 0.9).abs() < 1e-6);
    assert!(report.evidence.contains(codes::CLASSIFIER_FORGERY_SUSPECTED));
}

#[tokio::test]
async fn report_serializes_to_json() {
    let document = RawDocument::from_pages(vec![page_with_stamps(&[])], Sector::Banque);
    let report = Orchestrator::default().analyze(document).await.unwrap();
    let json = serde_json::to_value(&report).unwrap();

    assert_eq!(json["sector"], "BANQUE");
    assert_eq!(json["container"], "pages");
    assert!(json["score"]["risk_score"].is_u64());
    assert!(json["proof"].is_null());
}
