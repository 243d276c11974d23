use std::collections::HashMap;

use uuid::Uuid;

use crate::knowledge::KnowledgeVersion;
use crate::models::{FindingKind, RiskLevel, Severity, UserProfile};

use super::helpers::upsert_strongest;
use super::messages::MessageTemplates;
use super::types::{
    Finding, RiskReport, ScanStatus, NO_ANALYSIS_ADVISORY_ID, UNRESOLVED_ADVISORY_ID,
};

/// Merge allergy and interaction findings into one report.
///
/// - duplicates on (kind, entry_id) collapse to the strongest, at the first
///   position seen
/// - unresolved tokens add a caution advisory unless the profile is empty
/// - findings are sorted by severity desc, then confidence desc; the sort is
///   stable so allergy findings stay ahead of interactions on ties
/// - overall severity is the highest finding severity, or `Safe`
///
/// The knowledge version is left at its default; the engine stamps it.
pub fn aggregate(
    allergy_findings: Vec<Finding>,
    interaction_findings: Vec<Finding>,
    unresolved_tokens: Vec<String>,
    profile: &UserProfile,
) -> RiskReport {
    let mut findings = Vec::with_capacity(allergy_findings.len() + interaction_findings.len() + 1);
    let mut positions: HashMap<(FindingKind, String), usize> = HashMap::new();
    for finding in allergy_findings.into_iter().chain(interaction_findings) {
        let key = (finding.kind, finding.entry_id.clone());
        upsert_strongest(&mut findings, &mut positions, key, finding);
    }

    if !unresolved_tokens.is_empty() && !profile.is_trivial() {
        findings.push(advisory(
            UNRESOLVED_ADVISORY_ID,
            MessageTemplates::unresolved(&unresolved_tokens),
        ));
    }

    findings.sort_by(|a, b| {
        b.severity
            .cmp(&a.severity)
            .then(b.confidence.total_cmp(&a.confidence))
    });

    let overall_severity = overall(&findings);
    let recommendations = MessageTemplates::recommendations(overall_severity, &findings);

    RiskReport {
        scan_id: Uuid::new_v4(),
        generated_at: chrono::Local::now().naive_local(),
        status: ScanStatus::Analyzed,
        findings,
        overall_severity,
        unresolved_tokens,
        recommendations,
        knowledge_version: KnowledgeVersion::default(),
    }
}

/// Report for a scan with no ingredient list. Never `Safe`.
pub fn not_analyzed(reason: &str) -> RiskReport {
    let findings = vec![advisory(NO_ANALYSIS_ADVISORY_ID, MessageTemplates::not_analyzed(reason))];

    RiskReport {
        scan_id: Uuid::new_v4(),
        generated_at: chrono::Local::now().naive_local(),
        status: ScanStatus::NotAnalyzed {
            reason: reason.to_string(),
        },
        overall_severity: overall(&findings),
        findings,
        unresolved_tokens: Vec::new(),
        recommendations: MessageTemplates::not_analyzed_recommendations(),
        knowledge_version: KnowledgeVersion::default(),
    }
}

fn overall(findings: &[Finding]) -> RiskLevel {
    findings
        .iter()
        .map(|f| RiskLevel::from(f.severity))
        .max()
        .unwrap_or(RiskLevel::Safe)
}

// Advisories are certain in what they say (something went unchecked) but
// carry no match confidence, so they sort after real cautions.
fn advisory(id: &str, explanation: String) -> Finding {
    Finding {
        kind: FindingKind::Advisory,
        entry_id: id.to_string(),
        related_id: None,
        severity: Severity::Caution,
        matched_ingredient: String::new(),
        confidence: 0.0,
        explanation,
        advice: None,
        precautionary: false,
    }
}
