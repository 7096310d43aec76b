//! Multi-axis fusion under sector policy.

pub mod axes;
pub mod config;

use anyhow::{Context, Result};

use crate::models::{codes, AxisFindings, AxisScores, ScoreReport, Sector, Verdict};

pub use config::{BlockCondition, BlockingRule, ScoringConfig, SectorPolicy};

const ENABLE_LOGS: bool = true;
const LOG_TAG: &str = "docforensics::scoring";

use crate::{log_debug, log_info};

#[derive(Debug, Clone, Default)]
pub struct ScoringEngine {
    config: ScoringConfig,
}

impl ScoringEngine {
    pub fn new(config: ScoringConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    /// Raw, capped per-axis scores.
    pub fn axis_scores(&self, findings: &AxisFindings) -> Result<AxisScores> {
        let forensic = axes::forensic_axis(&findings.forensic, &self.config.forensic)
            .context("failed to score the forensic axis")?;
        let structure = axes::structure_axis(&findings.structure, &self.config.structure);
        let logic = axes::logic_axis(&findings.logic, &self.config.logic);
        Ok(AxisScores::new(forensic, structure, logic))
    }

    pub fn compute_score(&self, findings: &AxisFindings, sector: Sector) -> Result<ScoreReport> {
        let axis_scores = self.axis_scores(findings)?;
        let policy = self.config.policy(sector);
        let weights = self.config.weights;

        let weighted_score = weights.forensic * axis_scores.forensic * policy.modifiers.forensic
            + weights.structure * axis_scores.structure * policy.modifiers.structure
            + weights.logic * axis_scores.logic * policy.modifiers.logic;
        if !weighted_score.is_finite() {
            anyhow::bail!("weighted score is not finite: {weighted_score}");
        }

        let blocking_rules: Vec<String> = self
            .config
            .blocking_rules
            .iter()
            .filter(|rule| rule.applies_to(sector) && blocks(rule, findings, &axis_scores))
            .map(|rule| rule.code.clone())
            .collect();

        let fused = if blocking_rules.is_empty() {
            weighted_score
        } else {
            axes::AXIS_MAX
        };
        // Truncated toward zero, never rounded up.
        let risk_score = fused.clamp(0.0, axes::AXIS_MAX).floor() as u8;

        let (green_ceiling, yellow_ceiling) = self.config.ceilings(sector);
        let verdict = if risk_score <= green_ceiling {
            Verdict::Valid
        } else if risk_score <= yellow_ceiling {
            Verdict::Suspicious
        } else {
            Verdict::Fraudulent
        };

        let threshold = self.config.indicator_threshold;
        let mut indicators: Vec<String> = [
            (axis_scores.forensic, codes::FORENSIC_SIGNAL),
            (axis_scores.structure, codes::STRUCTURE_SIGNAL),
            (axis_scores.logic, codes::LOGIC_SIGNAL),
        ]
        .into_iter()
        .filter(|(score, _)| *score > threshold)
        .map(|(_, code)| code.to_string())
        .collect();
        indicators.extend(blocking_rules.iter().cloned());

        log_debug!(
            "axes {:.1}/{:.1}/{:.1}, weighted {:.2} under {}",
            axis_scores.forensic,
            axis_scores.structure,
            axis_scores.logic,
            weighted_score,
            sector
        );
        log_info!(
            "score {} ({}) for {}, blocking rules: {:?}",
            risk_score,
            verdict.as_str(),
            sector,
            blocking_rules
        );

        Ok(ScoreReport {
            risk_score,
            verdict,
            triage_category: verdict.triage(),
            axis_scores,
            indicators,
            disclaimer_text: verdict.disclaimer().to_string(),
            weighted_score,
            blocking_rules,
            sector,
            green_ceiling,
            yellow_ceiling,
        })
    }
}

fn blocks(rule: &BlockingRule, findings: &AxisFindings, axis_scores: &AxisScores) -> bool {
    match &rule.condition {
        BlockCondition::DateInconsistency => findings.logic.date_inconsistency(),
        BlockCondition::AmountInconsistency => findings.logic.amount_inconsistency(),
        BlockCondition::AxisConvergence {
            forensic_above,
            structure_above,
        } => axis_scores.forensic > *forensic_above && axis_scores.structure > *structure_above,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{SignalFindings, TriageCategory};

    #[test]
    fn clean_findings_are_valid_everywhere() {
        let engine = ScoringEngine::default();
        for sector in Sector::ALL {
            let report = engine.compute_score(&AxisFindings::default(), sector).unwrap();
            assert_eq!(report.risk_score, 0);
            assert_eq!(report.verdict, Verdict::Valid);
            assert_eq!(report.triage_category, TriageCategory::C);
            assert!(report.indicators.is_empty());
        }
    }

    #[test]
    fn sector_modifier_shifts_the_verdict() {
        let engine = ScoringEngine::default();
        let mut findings = AxisFindings::default();
        findings.logic.business.suspicious_amount = true;
        findings.logic.business.text_quality_issue = true;
        findings.logic.semantic.found_placeholders.push("{{NOM}}".into());

        // logic 85: GENERIC 85 × 0.25 = 21.25 → 21, BANQUE × 1.1 → 23.375 → 23.
        let generic = engine.compute_score(&findings, Sector::Generic).unwrap();
        assert_eq!(generic.risk_score, 21);
        assert_eq!(generic.verdict, Verdict::Valid);
        let bank = engine.compute_score(&findings, Sector::Banque).unwrap();
        assert_eq!(bank.risk_score, 23);
        assert_eq!(bank.verdict, Verdict::Suspicious);
        assert_eq!(bank.indicators, vec![codes::LOGIC_SIGNAL.to_string()]);
    }

    #[test]
    fn amount_block_only_applies_to_insurance() {
        let engine = ScoringEngine::default();
        let mut findings = AxisFindings::default();
        findings.logic.business.amount_inconsistency = true;

        let insurance = engine.compute_score(&findings, Sector::Assurance).unwrap();
        assert_eq!(insurance.risk_score, 100);
        assert_eq!(insurance.blocking_rules, vec!["BLOCK_INSURANCE_AMOUNT_ALTERED".to_string()]);
        assert!(insurance
            .indicators
            .contains(&"BLOCK_INSURANCE_AMOUNT_ALTERED".to_string()));

        let generic = engine.compute_score(&findings, Sector::Generic).unwrap();
        assert_eq!(generic.risk_score, 20);
        assert!(generic.blocking_rules.is_empty());
    }

    #[test]
    fn fractional_score_is_truncated_below_the_ceiling() {
        let findings = AxisFindings {
            forensic: SignalFindings {
                noise_score: 73.75,
                ..Default::default()
            },
            ..AxisFindings::default()
        };
        // 0.40 × 73.75 = 29.5 sits half a point above the GENERIC green ceiling.
        let report = ScoringEngine::default()
            .compute_score(&findings, Sector::Generic)
            .unwrap();
        assert!((report.weighted_score - 29.5).abs() < 1e-9);
        assert_eq!(report.risk_score, 29);
        assert_eq!(report.verdict, Verdict::Valid);
    }

    #[test]
    fn non_finite_findings_fail_the_run() {
        let mut findings = AxisFindings::default();
        findings.forensic.noise_score = f64::INFINITY;
        assert!(ScoringEngine::default()
            .compute_score(&findings, Sector::Generic)
            .is_err());
    }
}
