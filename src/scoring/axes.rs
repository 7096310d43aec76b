//! Additive point tables, one per axis. Each axis is capped to `[0, 100]`
//! before any weighting.

use anyhow::{bail, Result};

use super::config::{ForensicPoints, LogicPoints, StructurePoints};
use crate::models::{codes, LogicFindings, SignalFindings, StructureFindings};

pub const AXIS_MAX: f64 = 100.0;

fn cap(points: f64) -> f64 {
    points.clamp(0.0, AXIS_MAX)
}

fn ensure_finite(name: &str, value: f64) -> Result<f64> {
    if !value.is_finite() {
        bail!("non-finite {name} value: {value}");
    }
    Ok(value)
}

pub fn forensic_axis(findings: &SignalFindings, points: &ForensicPoints) -> Result<f64> {
    let ela = ensure_finite("ELA", findings.ela_score)?;
    let noise = ensure_finite("noise", findings.noise_score)?;

    let mut score = 0.0;
    if ela > points.ela_high_threshold {
        score += points.ela_high;
    } else if ela > points.ela_low_threshold {
        score += points.ela_low;
    }
    if findings.clones_detected > 0 {
        score += points.clone;
    }
    if findings.luminance_anomaly {
        score += points.luminance;
    }
    score += noise;
    if let Some(probability) = findings.classifier_score {
        let probability = ensure_finite("classifier", probability)?;
        if probability >= points.classifier_threshold {
            score += probability * points.classifier_scale;
        }
    }
    Ok(cap(score))
}

/// Container points, weighted by [`StructurePoints`] in `scoring/config.rs`.
pub fn structure_axis(findings: &StructureFindings, points: &StructurePoints) -> f64 {
    let mut score = 0.0;
    if findings.producer().is_some_and(|p| p.trim().is_empty()) {
        score += points.empty_producer;
    }
    if findings.metadata.editing_tool.is_some() {
        score += points.editing_tool;
    }
    if findings.incremental_updates.has_incremental_updates {
        score += points.incremental_updates;
    }
    if !findings.font_analysis.suspicious_fonts.is_empty() {
        score += points.font_outliers;
    }
    if !findings.structural_clones.is_empty() {
        score += points.structural_clones;
    }
    let issues = &findings.metadata.issues;
    if issues.iter().any(|i| i == codes::TIMELINE_MODIFIED) {
        score += points.timeline_modified;
    }
    if issues.iter().any(|i| i == codes::METADATA_RECENTLY_CREATED) {
        score += points.recently_created;
    }
    cap(score)
}

/// Content points, weighted by [`LogicPoints`] in `scoring/config.rs`.
pub fn logic_axis(findings: &LogicFindings, points: &LogicPoints) -> f64 {
    let table = [
        (findings.date_inconsistency(), points.date_inconsistency),
        (findings.amount_inconsistency(), points.amount_inconsistency),
        (findings.invalid_identifier(), points.invalid_identifier),
        (findings.business.suspicious_amount, points.suspicious_amount),
        (findings.template_markers(), points.template_markers),
        (findings.business.text_quality_issue, points.text_quality),
    ];
    cap(table
        .iter()
        .filter(|(fired, _)| *fired)
        .map(|(_, points)| points)
        .sum())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::StructuralClone;

    #[test]
    fn ela_tiers_are_exclusive() {
        let points = ForensicPoints::default();
        let mut findings = SignalFindings {
            ela_score: 4.5,
            ..SignalFindings::default()
        };
        assert_eq!(forensic_axis(&findings, &points).unwrap(), 30.0);
        findings.ela_score = 5.5;
        assert_eq!(forensic_axis(&findings, &points).unwrap(), 60.0);
    }

    #[test]
    fn forensic_axis_is_capped() {
        let findings = SignalFindings {
            ela_score: 12.0,
            clones_detected: 3,
            luminance_anomaly: true,
            noise_score: 40.0,
            classifier_score: Some(0.9),
            ..SignalFindings::default()
        };
        assert_eq!(forensic_axis(&findings, &ForensicPoints::default()).unwrap(), 100.0);
    }

    #[test]
    fn weak_classifier_adds_nothing() {
        let findings = SignalFindings {
            classifier_score: Some(0.49),
            ..SignalFindings::default()
        };
        assert_eq!(forensic_axis(&findings, &ForensicPoints::default()).unwrap(), 0.0);
    }

    #[test]
    fn non_finite_signal_is_an_error() {
        let findings = SignalFindings {
            ela_score: f64::NAN,
            ..SignalFindings::default()
        };
        assert!(forensic_axis(&findings, &ForensicPoints::default()).is_err());
    }

    #[test]
    fn image_input_scores_zero_structure() {
        let findings = StructureFindings::without_container();
        assert_eq!(structure_axis(&findings, &StructurePoints::default()), 0.0);
    }

    #[test]
    fn structure_points_add_up() {
        let mut findings = StructureFindings::default();
        findings.metadata.producer = Some(String::new());
        findings.metadata.issues = vec![codes::TIMELINE_MODIFIED.to_string()];
        findings.structural_clones.push(StructuralClone {
            page: 1,
            object_id: "5 0 R".into(),
            count: 2,
            usage_names: vec!["Im1".into()],
        });
        assert_eq!(structure_axis(&findings, &StructurePoints::default()), 100.0);

        findings.structural_clones.clear();
        assert_eq!(structure_axis(&findings, &StructurePoints::default()), 50.0);
    }

    #[test]
    fn timeline_and_recent_creation_add_ten_each() {
        let mut findings = StructureFindings::default();
        findings.metadata.issues = vec![codes::TIMELINE_MODIFIED.to_string()];
        assert_eq!(structure_axis(&findings, &StructurePoints::default()), 10.0);
        findings
            .metadata
            .issues
            .push(codes::METADATA_RECENTLY_CREATED.to_string());
        assert_eq!(structure_axis(&findings, &StructurePoints::default()), 20.0);
    }

    #[test]
    fn logic_points_add_up_and_cap() {
        let mut findings = LogicFindings::default();
        findings.business.suspicious_amount = true;
        findings.business.text_quality_issue = true;
        assert_eq!(logic_axis(&findings, &LogicPoints::default()), 45.0);
        findings.business.date_inconsistency = true;
        findings.business.amount_inconsistency = true;
        assert_eq!(logic_axis(&findings, &LogicPoints::default()), 100.0);
    }
}
