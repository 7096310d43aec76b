use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::models::Sector;

/// Per-axis multipliers, also used for the base weights.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AxisFactors {
    pub forensic: f64,
    pub structure: f64,
    pub logic: f64,
}

impl AxisFactors {
    pub const fn new(forensic: f64, structure: f64, logic: f64) -> Self {
        Self {
            forensic,
            structure,
            logic,
        }
    }
}

/// How strict one sector is: axis emphasis and the highest score still
/// accepted as clean.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SectorPolicy {
    pub modifiers: AxisFactors,
    pub green_ceiling: u8,
}

impl SectorPolicy {
    const fn new(forensic: f64, structure: f64, logic: f64, green_ceiling: u8) -> Self {
        Self {
            modifiers: AxisFactors::new(forensic, structure, logic),
            green_ceiling,
        }
    }
}

/// Points added to the pixel axis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForensicPoints {
    pub ela_high_threshold: f64,
    pub ela_high: f64,
    pub ela_low_threshold: f64,
    pub ela_low: f64,
    pub clone: f64,
    pub luminance: f64,
    pub classifier_threshold: f64,
    /// Classifier probability is multiplied by this
    pub classifier_scale: f64,
}

impl Default for ForensicPoints {
    fn default() -> Self {
        Self {
            ela_high_threshold: 5.0,
            ela_high: 60.0,
            ela_low_threshold: 4.0,
            ela_low: 30.0,
            clone: 100.0,
            luminance: 20.0,
            classifier_threshold: 0.5,
            classifier_scale: 40.0,
        }
    }
}

/// Points added to the container axis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StructurePoints {
    pub empty_producer: f64,
    pub editing_tool: f64,
    pub incremental_updates: f64,
    pub font_outliers: f64,
    pub structural_clones: f64,
    pub timeline_modified: f64,
    pub recently_created: f64,
}

impl Default for StructurePoints {
    fn default() -> Self {
        Self {
            empty_producer: 40.0,
            editing_tool: 60.0,
            incremental_updates: 30.0,
            font_outliers: 40.0,
            structural_clones: 50.0,
            timeline_modified: 10.0,
            recently_created: 10.0,
        }
    }
}

/// Points added to the content axis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogicPoints {
    pub date_inconsistency: f64,
    pub amount_inconsistency: f64,
    pub invalid_identifier: f64,
    pub suspicious_amount: f64,
    pub template_markers: f64,
    pub text_quality: f64,
}

impl Default for LogicPoints {
    fn default() -> Self {
        Self {
            date_inconsistency: 80.0,
            amount_inconsistency: 80.0,
            invalid_identifier: 50.0,
            suspicious_amount: 30.0,
            template_markers: 40.0,
            text_quality: 15.0,
        }
    }
}

/// What has to hold for a blocking rule to fire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BlockCondition {
    DateInconsistency,
    AmountInconsistency,
    /// Raw pixel and container axes both above their floors.
    AxisConvergence { forensic_above: f64, structure_above: f64 },
}

/// A rule that forces the maximum score regardless of the weighted sum.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockingRule {
    pub code: String,
    /// Sectors the rule applies to. Empty means every sector.
    #[serde(default)]
    pub sectors: Vec<Sector>,
    pub condition: BlockCondition,
}

impl BlockingRule {
    pub fn applies_to(&self, sector: Sector) -> bool {
        self.sectors.is_empty() || self.sectors.contains(&sector)
    }
}

/// Configuration for multi-axis fusion: weights, sector policies, point
/// tables and blocking rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Base weights applied after sector modifiers
    pub weights: AxisFactors,

    pub policies: BTreeMap<Sector, SectorPolicy>,

    /// Width of the review band above each sector's green ceiling
    pub yellow_band: u8,

    /// Axis score above which the axis is listed as an indicator
    pub indicator_threshold: f64,

    pub forensic: ForensicPoints,
    pub structure: StructurePoints,
    pub logic: LogicPoints,

    pub blocking_rules: Vec<BlockingRule>,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        let policies = BTreeMap::from([
            (Sector::Generic, SectorPolicy::new(1.00, 1.00, 1.00, 29)),
            (Sector::Rh, SectorPolicy::new(0.85, 1.00, 1.10, 40)),
            (Sector::Immobilier, SectorPolicy::new(1.00, 1.10, 1.20, 25)),
            (Sector::Banque, SectorPolicy::new(1.10, 1.10, 1.10, 10)),
            (Sector::Juridique, SectorPolicy::new(1.10, 1.20, 1.20, 29)),
            (Sector::Assurance, SectorPolicy::new(1.20, 1.00, 1.00, 29)),
        ]);
        Self {
            weights: AxisFactors::new(0.40, 0.35, 0.25),
            policies,
            yellow_band: 30,
            indicator_threshold: 10.0,
            forensic: ForensicPoints::default(),
            structure: StructurePoints::default(),
            logic: LogicPoints::default(),
            blocking_rules: vec![
                BlockingRule {
                    code: "BLOCK_LEGAL_DATE_ALTERED".to_string(),
                    sectors: vec![Sector::Juridique],
                    condition: BlockCondition::DateInconsistency,
                },
                BlockingRule {
                    code: "BLOCK_INSURANCE_AMOUNT_ALTERED".to_string(),
                    sectors: vec![Sector::Assurance],
                    condition: BlockCondition::AmountInconsistency,
                },
                BlockingRule {
                    code: "BLOCK_VISUAL_STRUCTURE_CONVERGENCE".to_string(),
                    sectors: Vec::new(),
                    condition: BlockCondition::AxisConvergence {
                        forensic_above: 50.0,
                        structure_above: 50.0,
                    },
                },
            ],
        }
    }
}

impl ScoringConfig {
    /// Policy for `sector`, falling back to the generic one.
    pub fn policy(&self, sector: Sector) -> SectorPolicy {
        self.policies
            .get(&sector)
            .or_else(|| self.policies.get(&Sector::Generic))
            .copied()
            .unwrap_or(SectorPolicy::new(1.0, 1.0, 1.0, 29))
    }

    /// `(green, yellow)` ceilings for `sector`.
    pub fn ceilings(&self, sector: Sector) -> (u8, u8) {
        let green = self.policy(sector).green_ceiling;
        (green, green.saturating_add(self.yellow_band))
    }
}
