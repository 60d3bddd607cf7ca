//! Urgency triage over symptom flags
//!
//! Declarative criteria evaluated alongside prediction. A match does not
//! change the ranked diseases; it produces an alert the caller surfaces
//! ahead of them.

use crate::models::{Confidence, DiseasePrediction, SymptomMap};

/// One urgency criterion: fires when every listed flag is present
#[derive(Debug, Clone, Copy)]
pub struct UrgencyCriterion {
    pub all_of: &'static [&'static str],
    pub message: &'static str,
}

const URGENCY_CRITERIA: &[UrgencyCriterion] = &[
    UrgencyCriterion {
        all_of: &["breathing_difficulty"],
        message: "Difficulty breathing can be life-threatening; seek veterinary care immediately.",
    },
    UrgencyCriterion {
        all_of: &["seizures"],
        message: "Seizures require urgent veterinary evaluation.",
    },
    UrgencyCriterion {
        all_of: &["convulsions"],
        message: "Convulsions require urgent veterinary evaluation.",
    },
    UrgencyCriterion {
        all_of: &["diarrhea_hemorrhagic", "dehydration"],
        message: "Bloody diarrhea with dehydration needs same-day veterinary attention.",
    },
];

/// Flags that make a presentation urgent regardless of how few there are
const URGENT_FLAGS: [&str; 4] = [
    "diarrhea_hemorrhagic",
    "seizures",
    "convulsions",
    "breathing_difficulty",
];

/// Coarse severity of the overall presentation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymptomBurden {
    High,
    Medium,
    Low,
}

fn flag(symptoms: &SymptomMap, name: &str) -> bool {
    symptoms.get(name).copied().unwrap_or(0) == 1
}

/// First matching urgency alert, if any. Criteria are checked in table
/// order so the message is deterministic for a given flag set.
pub fn assess_urgency(symptoms: &SymptomMap) -> Option<&'static str> {
    URGENCY_CRITERIA
        .iter()
        .find(|c| c.all_of.iter().all(|s| flag(symptoms, s)))
        .map(|c| c.message)
}

/// Severity from active-flag count, escalated by any urgent flag
pub fn symptom_burden(symptoms: &SymptomMap) -> SymptomBurden {
    let active = symptoms.values().filter(|v| **v == 1).count();
    let has_urgent = URGENT_FLAGS.iter().any(|s| flag(symptoms, s));

    if has_urgent || active >= 5 {
        SymptomBurden::High
    } else if active >= 3 {
        SymptomBurden::Medium
    } else {
        SymptomBurden::Low
    }
}

/// Owner-facing next-step message for a triaged prediction set
pub fn recommendation(top: Option<&DiseasePrediction>, urgency: Option<&str>) -> String {
    if let Some(alert) = urgency {
        return format!("Urgent: {alert}");
    }
    match top {
        Some(p) if p.confidence == Confidence::High => format!(
            "The reported signs are most consistent with {}. A veterinary visit is recommended to confirm the diagnosis.",
            p.disease
        ),
        _ => "The reported signs match several possible conditions. A full veterinary evaluation is recommended.".to_string(),
    }
}
