use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use super::document::{ContainerKind, Sector};
use super::evidence::Evidence;
use super::findings::AxisFindings;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Verdict {
    Valid,
    Suspicious,
    Fraudulent,
}

impl Verdict {
    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::Valid => "VALID",
            Verdict::Suspicious => "SUSPICIOUS",
            Verdict::Fraudulent => "FRAUDULENT",
        }
    }

    pub fn triage(&self) -> TriageCategory {
        match self {
            Verdict::Valid => TriageCategory::C,
            Verdict::Suspicious => TriageCategory::B,
            Verdict::Fraudulent => TriageCategory::A,
        }
    }

    pub fn disclaimer(&self) -> &'static str {
        match self {
            Verdict::Fraudulent => "Critical anomalies incompatible with acceptance of this document.",
            Verdict::Suspicious => "Elements requiring particular vigilance before acceptance.",
            Verdict::Valid => "No significant signal detected.",
        }
    }
}

/// A = critical, B = review, C = clear.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum TriageCategory {
    A,
    B,
    C,
}

/// Per-axis risk sub-scores, each within `[0, 100]`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AxisScores {
    pub forensic: f64,
    pub structure: f64,
    pub logic: f64,
}

impl AxisScores {
    pub fn new(forensic: f64, structure: f64, logic: f64) -> Self {
        Self {
            forensic,
            structure,
            logic,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreReport {
    pub risk_score: u8,
    pub verdict: Verdict,
    pub triage_category: TriageCategory,
    pub axis_scores: AxisScores,
    pub indicators: Vec<String>,
    pub disclaimer_text: String,
    /// Weighted sum before blocking rules and clamping.
    pub weighted_score: f64,
    pub blocking_rules: Vec<String>,
    pub sector: Sector,
    pub green_ceiling: u8,
    pub yellow_ceiling: u8,
}

/// Certification tier reached by the VDS state machine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VdsResult {
    pub level_achieved: u8,
    pub badges: Vec<String>,
    pub details: BTreeMap<String, bool>,
    pub failure_reason: Option<String>,
}

/// Fingerprint of the analyzed input bound to the verdict it received.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofCertificate {
    pub file_hash: String,
    pub issued_at: DateTime<Utc>,
    pub risk_score: u8,
    pub verdict: Verdict,
    pub engine_version: String,
}

/// The single externally visible output of a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinalReport {
    pub run_id: Uuid,
    pub version: String,
    pub file_name: Option<String>,
    pub container: ContainerKind,
    pub analyzed_at: DateTime<Utc>,
    pub declared_sector: Sector,
    pub sector: Sector,
    pub detected_sector: String,
    pub score: ScoreReport,
    pub vds: VdsResult,
    pub evidence: Evidence,
    pub hypotheses: Vec<String>,
    pub findings: AxisFindings,
    pub safe_snippet: String,
    pub proof: Option<ProofCertificate>,
}

impl FinalReport {
    /// Flatten into dotted keys (`score.axis_scores.forensic`) for key-value
    /// stores. Array elements are addressed by index.
    pub fn to_flat_map(&self) -> serde_json::Result<BTreeMap<String, Value>> {
        let tree = serde_json::to_value(self)?;
        let mut flat = BTreeMap::new();
        flatten_into(String::new(), tree, &mut flat);
        Ok(flat)
    }
}

fn flatten_into(prefix: String, value: Value, out: &mut BTreeMap<String, Value>) {
    let join = |key: &str| {
        if prefix.is_empty() {
            key.to_string()
        } else {
            format!("{prefix}.{key}")
        }
    };
    match value {
        Value::Object(map) if !map.is_empty() => {
            for (key, child) in map {
                flatten_into(join(&key), child, out);
            }
        }
        Value::Array(items) if !items.is_empty() => {
            for (index, child) in items.into_iter().enumerate() {
                flatten_into(join(&index.to_string()), child, out);
            }
        }
        leaf => {
            out.insert(prefix, leaf);
        }
    }
}
