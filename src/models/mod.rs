pub mod document;
pub mod evidence;
pub mod findings;
pub mod report;

pub use document::{ContainerKind, DocumentPayload, ExtractedContent, RawDocument, Sector};
pub use evidence::{codes, Evidence};
pub use findings::{
    AxisFindings, BusinessFindings, DocumentType, DuplicateImage, ExtractedEntities, FontAnalysis,
    FontOutlier, FontUsage, IbanCheck, IncrementalUpdates, LogicFindings, MetadataTimeline,
    MrzData, MrzFindings, MrzFormat, PageSignal, SemanticFindings, SignalFindings,
    StructuralClone, StructureFindings, TaxFigures,
};
pub use report::{
    AxisScores, FinalReport, ProofCertificate, ScoreReport, TriageCategory, VdsResult, Verdict,
};
