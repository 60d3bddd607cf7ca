//! Post-processing rules over raw model output
//!
//! Two passes in fixed order: a species/disease compatibility filter, then
//! additive symptom-coherence adjustments. Both encode veterinary domain
//! knowledge as data tables (not learned, not branching code) so each rule
//! can be tested and retuned without touching the predictor.

use crate::models::{Confidence, DiseasePrediction, SymptomMap};
use tracing::{debug, warn};

/// Species resolved from the free-form animal-type value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Species {
    Dog,
    Cat,
}

impl Species {
    pub fn from_animal_type(raw: &str) -> Self {
        let lowered = raw.to_lowercase();
        if lowered.contains("gato") || lowered.contains("cat") {
            Species::Cat
        } else {
            Species::Dog
        }
    }
}

/// Allow-list of disease-name fragments with documented occurrence in a
/// species
#[derive(Debug, Clone, Copy)]
pub struct SpeciesRule {
    pub species: Species,
    pub diseases: &'static [&'static str],
}

const SPECIES_COMPATIBILITY: &[SpeciesRule] = &[
    SpeciesRule {
        species: Species::Dog,
        diseases: &[
            // Canine parvovirus and distemper do not infect cats; the feline
            // counterparts are panleucopenia and calicivirus/herpesvirus
            "Parvovirosis",
            "Moquillo",
            "Dirofilariosis",
            "Traqueobronquitis",
            "Leptospirosis",
            // Species-shared conditions
            "Gastroenteritis",
            "Otitis externa",
            "Dermatitis",
            "Artrosis",
            "Obesidad",
        ],
    },
    SpeciesRule {
        species: Species::Cat,
        diseases: &[
            "Panleucopenia",
            "Rinotraqueitis",
            "FVR",
            "Calicivirus",
            "FCV",
            "Insuficiencia renal",
            // Species-shared conditions
            "Gastroenteritis",
            "Otitis externa",
            "Dermatitis",
            "Artrosis",
            "Obesidad",
        ],
    },
];

/// One additive probability adjustment.
///
/// The rule fires when the species matches (if set), every `all_of` flag is
/// present, at least one `any_of` flag is present (empty list is satisfied),
/// every `absent` flag is missing, and the disease name contains one of the
/// keywords.
#[derive(Debug, Clone, Copy)]
pub struct BoostRule {
    pub species: Option<Species>,
    pub all_of: &'static [&'static str],
    pub any_of: &'static [&'static str],
    pub absent: &'static [&'static str],
    pub disease_keywords: &'static [&'static str],
    pub delta: f64,
    pub rationale: &'static str,
}

const BOOST_RULES: &[BoostRule] = &[
    BoostRule {
        species: Some(Species::Cat),
        all_of: &[],
        any_of: &["sneezing", "nasal_discharge", "ocular_discharge"],
        absent: &[],
        disease_keywords: &["fvr", "fcv", "rinotraqueitis", "calicivirus", "respiratorio felino"],
        delta: 0.30,
        rationale: "sneezing with nasal or ocular discharge is the classic presentation \
                    of feline herpesvirus (FVR) and calicivirus (FCV)",
    },
    BoostRule {
        species: Some(Species::Dog),
        all_of: &["cough"],
        any_of: &["breathing_difficulty", "tachypnea"],
        absent: &[],
        disease_keywords: &["dirofilari"],
        delta: 0.20,
        rationale: "chronic cough with laboured breathing in dogs is typical of heartworm disease",
    },
    BoostRule {
        species: Some(Species::Dog),
        all_of: &["cough"],
        any_of: &["breathing_difficulty", "tachypnea"],
        absent: &[],
        disease_keywords: &["moquillo", "distemper"],
        delta: 0.20,
        rationale: "the respiratory phase of canine distemper presents with cough and dyspnea",
    },
    BoostRule {
        species: None,
        all_of: &[],
        any_of: &["sneezing", "cough", "nasal_discharge"],
        absent: &["vomiting", "diarrhea"],
        disease_keywords: &["parvovirosis", "gastroenteritis", "panleucopenia"],
        delta: -0.15,
        rationale: "a purely respiratory presentation argues against primarily digestive disease",
    },
];

fn flag(symptoms: &SymptomMap, name: &str) -> bool {
    symptoms.get(name).copied().unwrap_or(0) == 1
}

impl BoostRule {
    fn triggers(&self, species: Species, symptoms: &SymptomMap) -> bool {
        if let Some(required) = self.species {
            if required != species {
                return false;
            }
        }
        if !self.all_of.iter().all(|s| flag(symptoms, s)) {
            return false;
        }
        if !self.any_of.is_empty() && !self.any_of.iter().any(|s| flag(symptoms, s)) {
            return false;
        }
        if self.absent.iter().any(|s| flag(symptoms, s)) {
            return false;
        }
        true
    }

    fn applies_to(&self, disease: &str) -> bool {
        let lowered = disease.to_lowercase();
        self.disease_keywords.iter().any(|k| lowered.contains(k))
    }
}

/// Applies the species filter and symptom-coherence adjustments
pub struct RulesEngine {
    species_rules: &'static [SpeciesRule],
    boost_rules: &'static [BoostRule],
}

impl RulesEngine {
    pub fn new() -> Self {
        Self {
            species_rules: SPECIES_COMPATIBILITY,
            boost_rules: BOOST_RULES,
        }
    }

    /// Custom rule tables, used by tests to exercise rules in isolation
    pub fn with_rules(
        species_rules: &'static [SpeciesRule],
        boost_rules: &'static [BoostRule],
    ) -> Self {
        Self {
            species_rules,
            boost_rules,
        }
    }

    /// Filter then boost, in that fixed order
    pub fn refine(
        &self,
        predictions: Vec<DiseasePrediction>,
        animal_type: &str,
        symptoms: &SymptomMap,
    ) -> Vec<DiseasePrediction> {
        let species = Species::from_animal_type(animal_type);
        let filtered = self.filter_by_species(predictions, species);
        self.apply_boosts(filtered, species, symptoms)
    }

    /// Drop predictions incompatible with the species. Never empties a
    /// non-empty list: over-filtering returns the original predictions.
    fn filter_by_species(
        &self,
        predictions: Vec<DiseasePrediction>,
        species: Species,
    ) -> Vec<DiseasePrediction> {
        let allowed = match self.species_rules.iter().find(|r| r.species == species) {
            Some(rule) => rule.diseases,
            None => return predictions,
        };

        let filtered: Vec<DiseasePrediction> = predictions
            .iter()
            .filter(|p| {
                let disease = p.disease.to_lowercase();
                allowed.iter().any(|a| {
                    let a = a.to_lowercase();
                    disease.contains(&a) || a.contains(&disease)
                })
            })
            .cloned()
            .collect();

        if filtered.is_empty() && !predictions.is_empty() {
            warn!(
                species = ?species,
                "Species filter removed every prediction; returning the unfiltered list"
            );
            return predictions;
        }

        for removed in predictions.iter().filter(|p| !filtered.iter().any(|f| f.disease == p.disease)) {
            debug!(disease = %removed.disease, species = ?species, "Dropped species-incompatible prediction");
        }

        filtered
    }

    /// Apply every matching adjustment, clamp into [0,1], re-derive the
    /// confidence band, and re-sort by adjusted probability
    fn apply_boosts(
        &self,
        predictions: Vec<DiseasePrediction>,
        species: Species,
        symptoms: &SymptomMap,
    ) -> Vec<DiseasePrediction> {
        let active: Vec<&BoostRule> = self
            .boost_rules
            .iter()
            .filter(|r| r.triggers(species, symptoms))
            .collect();

        let mut adjusted: Vec<DiseasePrediction> = predictions
            .into_iter()
            .map(|mut p| {
                let mut delta = 0.0;
                for rule in &active {
                    if rule.applies_to(&p.disease) {
                        debug!(
                            disease = %p.disease,
                            delta = rule.delta,
                            rationale = rule.rationale,
                            "Symptom-coherence adjustment"
                        );
                        delta += rule.delta;
                    }
                }
                if delta != 0.0 {
                    p.probability = (p.probability + delta).clamp(0.0, 1.0);
                    p.confidence = Confidence::from_probability(p.probability);
                }
                p
            })
            .collect();

        adjusted.sort_by(|a, b| {
            b.probability
                .partial_cmp(&a.probability)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        adjusted
    }
}

impl Default for RulesEngine {
    fn default() -> Self {
        Self::new()
    }
}
