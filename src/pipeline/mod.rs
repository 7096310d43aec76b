//! One analysis run, from submitted document to `FinalReport`.
//!
//! Engines run as contained stages: a stage that panics or fails records an
//! `ENGINE_FAILED_<STAGE>` code and the run continues on neutral findings.
//! Only a scoring failure aborts the run.

pub mod extraction;
pub mod redaction;
pub mod sector;

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use image::DynamicImage;
use serde::{Deserialize, Serialize};
use tokio::task::JoinSet;
use uuid::Uuid;

use crate::investigation::InvestigationEngine;
use crate::logic::{self, BusinessLogicEngine, LogicContext};
use crate::models::{
    codes, evidence::stage_code, AxisFindings, BusinessFindings, DocumentPayload, Evidence,
    FinalReport, LogicFindings, MrzFindings, PageSignal, RawDocument, SemanticFindings, SignalFindings,
    StructureFindings,
};
use crate::mrz::{self, MrzScanner};
use crate::scoring::ScoringEngine;
use crate::semantic::{self, SemanticEngine};
use crate::settings::AnalysisSettings;
use crate::signal::{self, classifier, ForgeryClassifier, SignalContext, SignalForensicEngine};
use crate::structure::{self, StructureForensicsEngine};
use crate::vds::VdsValidator;

pub use extraction::{Extraction, Extractor, OcrEngine, PdfTextExtractor, TextExtractor};
pub use sector::{detect_sector, resolve_sector, DetectedSector};

const ENABLE_LOGS: bool = true;
const LOG_TAG: &str = "docforensics::pipeline";

use crate::{log_error, log_info, log_warn};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Upper bound for the signal analysis of a single page.
    pub page_timeout_ms: u64,
    /// Characters of extracted text kept (redacted) in the report.
    pub snippet_chars: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            page_timeout_ms: 30_000,
            snippet_chars: 500,
        }
    }
}

impl PipelineConfig {
    fn page_timeout(&self) -> Duration {
        Duration::from_millis(self.page_timeout_ms)
    }
}

/// Runs documents through every engine. Cheap to clone and safe to share
/// across concurrent runs; it holds read-only configuration only.
#[derive(Clone)]
pub struct Orchestrator {
    structure: StructureForensicsEngine,
    signal: Arc<SignalForensicEngine>,
    logic: BusinessLogicEngine,
    semantic: SemanticEngine,
    mrz: MrzScanner,
    scoring: ScoringEngine,
    vds: VdsValidator,
    investigation: InvestigationEngine,
    text_extractor: Arc<dyn TextExtractor>,
    ocr: Option<Arc<dyn OcrEngine>>,
    config: PipelineConfig,
}

impl Default for Orchestrator {
    fn default() -> Self {
        Self::new(&AnalysisSettings::default())
    }
}

impl Orchestrator {
    pub fn new(settings: &AnalysisSettings) -> Self {
        Self {
            structure: StructureForensicsEngine::new(settings.structure.clone()),
            signal: Arc::new(SignalForensicEngine::new(settings.signal.clone())),
            logic: BusinessLogicEngine::new(),
            semantic: SemanticEngine::new(),
            mrz: MrzScanner::new(),
            scoring: ScoringEngine::new(settings.scoring.clone()),
            vds: VdsValidator::new(settings.vds.clone()),
            investigation: InvestigationEngine::new(settings.investigation.clone()),
            text_extractor: Arc::new(PdfTextExtractor),
            ocr: None,
            config: settings.pipeline.clone(),
        }
    }

    pub fn with_classifier(mut self, classifier: Arc<dyn ForgeryClassifier>) -> Self {
        let engine = (*self.signal).clone().with_classifier(classifier);
        self.signal = Arc::new(engine);
        self
    }

    /// Attach the process-wide classifier, loading it on first use. A load
    /// failure leaves the orchestrator without a classifier.
    pub fn with_shared_classifier<F>(self, load: F) -> Self
    where
        F: FnOnce() -> Result<Arc<dyn ForgeryClassifier>>,
    {
        match classifier::shared_classifier(load) {
            Some(classifier) => self.with_classifier(classifier),
            None => self,
        }
    }

    pub fn with_ocr(mut self, ocr: Arc<dyn OcrEngine>) -> Self {
        self.ocr = Some(ocr);
        self
    }

    pub fn with_text_extractor(mut self, extractor: Arc<dyn TextExtractor>) -> Self {
        self.text_extractor = extractor;
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub async fn analyze(&self, document: RawDocument) -> Result<FinalReport> {
        self.analyze_at(document, Utc::now()).await
    }

    /// Run against an explicit analysis clock.
    pub async fn analyze_at(&self, document: RawDocument, now: DateTime<Utc>) -> Result<FinalReport> {
        let run_id = Uuid::new_v4();
        let started = Instant::now();
        let document = Arc::new(document);
        let mut evidence = Evidence::new();
        log_info!(
            "run {run_id}: {:?} input, declared sector {}",
            document.kind(),
            document.sector()
        );

        let extraction = self.extract(&document, &mut evidence).await;
        evidence.raise_all(extraction.failures.iter().cloned());
        let Extraction {
            content,
            container,
            rasters,
            ..
        } = extraction;

        let structure_findings = self
            .run_structure(&document, container, now, &mut evidence)
            .await;

        let ctx = self.signal.context_for(structure_findings.producer());
        let mut signal_findings = self.run_signal(&content.pages, ctx, &mut evidence).await;
        if content.pages_from_container {
            signal_findings.patch_count = self.structure.count_patches(&rasters);
        }
        drop(rasters);

        let text: Arc<str> = Arc::from(content.text.as_str());
        let detected = detect_sector(&text);
        let logic_context = LogicContext {
            creation_date: structure_findings.metadata.created_at,
            tax_notice_hint: detected == DetectedSector::Government,
        };

        let business = contained("logic", &mut evidence, BusinessFindings::default(), {
            let engine = self.logic;
            let text = Arc::clone(&text);
            move || engine.analyze(&text, &logic_context)
        })
        .await;
        let semantic_findings = contained("semantic", &mut evidence, SemanticFindings::default(), {
            let engine = self.semantic;
            let text = Arc::clone(&text);
            move || engine.analyze(&text)
        })
        .await;
        let mrz_findings = contained("mrz", &mut evidence, MrzFindings::default(), {
            let scanner = self.mrz;
            let text = Arc::clone(&text);
            move || scanner.scan(&text)
        })
        .await;

        structure::raise_evidence(&structure_findings, &mut evidence);
        signal::raise_evidence(&signal_findings, self.signal.config(), &mut evidence);
        logic::raise_evidence(&business, &mut evidence);
        semantic::raise_evidence(&semantic_findings, &mut evidence);
        mrz::raise_evidence(&mrz_findings, &mut evidence);

        let findings = AxisFindings {
            forensic: signal_findings,
            structure: structure_findings,
            logic: LogicFindings {
                business,
                semantic: semantic_findings,
                mrz: mrz_findings,
            },
        };

        let sector = resolve_sector(document.sector(), detected);
        let score = self
            .scoring
            .compute_score(&findings, sector)
            .with_context(|| format!("scoring failed for run {run_id}"))?;
        evidence.raise_all(score.indicators.iter().cloned());

        let vds = self
            .vds
            .validate(&self.vds.input_from(&findings, content.text_len()));
        let hypotheses = self.investigation.generate_hypotheses(&evidence, &findings);

        let proof = document
            .bytes()
            .map(|bytes| redaction::issue_certificate(bytes, &score, now));
        let safe_snippet = redaction::safe_snippet(&text, self.config.snippet_chars);

        log_info!(
            "run {run_id}: score {} ({}), VDS level {}, {} evidence code(s) in {}ms",
            score.risk_score,
            score.verdict.as_str(),
            vds.level_achieved,
            evidence.len(),
            started.elapsed().as_millis()
        );

        Ok(FinalReport {
            run_id,
            version: env!("CARGO_PKG_VERSION").to_string(),
            file_name: document.file_name().map(str::to_string),
            container: document.kind(),
            analyzed_at: now,
            declared_sector: document.sector(),
            sector,
            detected_sector: detected.as_str().to_string(),
            score,
            vds,
            evidence,
            hypotheses,
            findings,
            safe_snippet,
            proof,
        })
    }

    async fn extract(&self, document: &Arc<RawDocument>, evidence: &mut Evidence) -> Extraction {
        contained("extraction", evidence, Extraction::default(), {
            let document = Arc::clone(document);
            let text = Arc::clone(&self.text_extractor);
            let ocr = self.ocr.clone();
            let structure = self.structure.clone();
            move || {
                Extractor {
                    text: text.as_ref(),
                    ocr: ocr.as_deref(),
                    structure: &structure,
                }
                .extract(&document)
            }
        })
        .await
    }

    async fn run_structure(
        &self,
        document: &RawDocument,
        container: Option<structure::PdfContainer>,
        now: DateTime<Utc>,
        evidence: &mut Evidence,
    ) -> StructureFindings {
        let (Some(container), DocumentPayload::Bytes(bytes)) = (container, document.payload()) else {
            return StructureFindings::without_container();
        };
        contained("structure", evidence, StructureFindings::without_container(), {
            let engine = self.structure.clone();
            let bytes = Arc::clone(bytes);
            move || engine.analyze_container(&container, &bytes, now.naive_utc())
        })
        .await
    }

    /// Analyze every page on its own blocking worker and fold the results,
    /// keeping the worst value of each sub-signal.
    async fn run_signal(
        &self,
        pages: &[Arc<DynamicImage>],
        ctx: SignalContext,
        evidence: &mut Evidence,
    ) -> SignalFindings {
        let timeout = self.config.page_timeout();
        let mut workers = JoinSet::new();
        for (index, page) in pages.iter().enumerate() {
            let engine = Arc::clone(&self.signal);
            let page = Arc::clone(page);
            workers.spawn(async move {
                let work = tokio::task::spawn_blocking(move || engine.analyze(&page, &ctx));
                (index, tokio::time::timeout(timeout, work).await)
            });
        }

        let mut merged: Vec<(usize, PageSignal)> = Vec::with_capacity(pages.len());
        while let Some(joined) = workers.join_next().await {
            match joined {
                Ok((index, Ok(Ok(page)))) => merged.push((index, page)),
                Ok((index, Ok(Err(err)))) => {
                    log_error!("signal analysis of page {index} failed: {err}");
                    evidence.raise(stage_code(codes::ENGINE_FAILED, "signal"));
                }
                Ok((index, Err(_))) => {
                    log_warn!(
                        "signal analysis of page {index} timeout (> {}ms)",
                        self.config.page_timeout_ms
                    );
                    evidence.raise(codes::SIGNAL_PAGE_TIMEOUT);
                }
                Err(err) => {
                    log_error!("signal worker join failed: {err}");
                    evidence.raise(stage_code(codes::ENGINE_FAILED, "signal"));
                }
            }
        }

        merged.sort_by_key(|(index, _)| *index);
        let mut findings = SignalFindings::default();
        for (_, page) in &merged {
            findings.merge_page(page);
        }
        findings
    }
}

/// Run a blocking engine stage. A panic inside it becomes an
/// `ENGINE_FAILED_<STAGE>` code and the neutral value.
async fn contained<T, F>(stage: &str, evidence: &mut Evidence, neutral: T, work: F) -> T
where
    T: Send + 'static,
    F: FnOnce() -> T + Send + 'static,
{
    match tokio::task::spawn_blocking(work).await {
        Ok(findings) => findings,
        Err(err) => {
            log_error!("{stage} engine failed: {err}");
            evidence.raise(stage_code(codes::ENGINE_FAILED, stage));
            neutral
        }
    }
}
