//! Document forgery-risk analysis.
//!
//! A submitted document is examined along three independent axes (pixel
//! signal, file structure, business logic), the axes are fused under a
//! sector policy into a verdict, and the run is explained by evidence codes
//! and narrative hypotheses.
//!
//! ```no_run
//! use docforensics::{Orchestrator, RawDocument, Sector};
//!
//! # async fn run(bytes: Vec<u8>) -> anyhow::Result<()> {
//! docforensics::init_logging();
//! let report = Orchestrator::default()
//!     .analyze(RawDocument::from_bytes(bytes, Sector::Banque))
//!     .await?;
//! println!("{} {}", report.score.risk_score, report.score.verdict.as_str());
//! # Ok(())
//! # }
//! ```

pub mod investigation;
pub mod logic;
pub mod models;
pub mod mrz;
pub mod pipeline;
pub mod scoring;
pub mod semantic;
pub mod settings;
pub mod signal;
pub mod structure;
pub mod utils;
pub mod vds;

pub use investigation::InvestigationEngine;
pub use logic::{BusinessLogicEngine, LogicContext};
pub use models::{
    codes, AxisFindings, AxisScores, Evidence, FinalReport, RawDocument, ScoreReport, Sector,
    TriageCategory, VdsResult, Verdict,
};
pub use mrz::MrzScanner;
pub use pipeline::{OcrEngine, Orchestrator, PipelineConfig, TextExtractor};
pub use scoring::{ScoringConfig, ScoringEngine};
pub use semantic::SemanticEngine;
pub use settings::{AnalysisSettings, SettingsStore};
pub use signal::{ForgeryClassifier, SignalConfig, SignalForensicEngine};
pub use structure::{StructureConfig, StructureForensicsEngine};
pub use vds::{VdsConfig, VdsValidator};

/// Install the `env_logger` backend (`info` unless `RUST_LOG` says otherwise).
/// Safe to call more than once.
pub fn init_logging() {
    utils::logging::init();
}
