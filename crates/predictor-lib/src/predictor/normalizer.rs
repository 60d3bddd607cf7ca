//! Categorical input normalization
//!
//! Categorical values arrive as free text in mixed casing and mixed language
//! (English and Spanish). Each field has a synonym table mapping variants
//! onto the canonical label used at training time; anything the table and
//! the encoder both miss falls back to the encoder's first known class, and
//! the substitution is counted for diagnostics. Normalization never fails.

use crate::artifacts::LabelEncoder;
use dashmap::DashMap;
use tracing::warn;

/// Categorical fields the demographic record carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CategoricalField {
    AnimalType,
    Size,
    LifeStage,
    Sex,
    Vaccination,
}

impl CategoricalField {
    pub fn as_str(&self) -> &'static str {
        match self {
            CategoricalField::AnimalType => "animal_type",
            CategoricalField::Size => "size",
            CategoricalField::LifeStage => "life_stage",
            CategoricalField::Sex => "sex",
            CategoricalField::Vaccination => "vaccination_up_to_date",
        }
    }

    fn synonyms(&self) -> &'static [(&'static str, &'static str)] {
        match self {
            CategoricalField::AnimalType => ANIMAL_TYPE_SYNONYMS,
            CategoricalField::Size => SIZE_SYNONYMS,
            CategoricalField::LifeStage => LIFE_STAGE_SYNONYMS,
            CategoricalField::Sex => SEX_SYNONYMS,
            CategoricalField::Vaccination => VACCINATION_SYNONYMS,
        }
    }
}

const ANIMAL_TYPE_SYNONYMS: &[(&str, &str)] = &[
    ("dog", "Perro"),
    ("perro", "Perro"),
    ("canine", "Perro"),
    ("cat", "Gato"),
    ("gato", "Gato"),
    ("feline", "Gato"),
];

const SIZE_SYNONYMS: &[(&str, &str)] = &[
    ("small", "Small"),
    ("pequeño", "Small"),
    ("pequeno", "Small"),
    ("chico", "Small"),
    ("medium", "Medium"),
    ("mediano", "Medium"),
    ("large", "Large"),
    ("grande", "Large"),
];

const LIFE_STAGE_SYNONYMS: &[(&str, &str)] = &[
    ("puppy", "Puppy"),
    ("cachorro", "Puppy"),
    ("kitten", "Kitten"),
    ("gatito", "Kitten"),
    ("young", "Adult"),
    ("joven", "Adult"),
    ("adult", "Adult"),
    ("adulto", "Adult"),
    ("mature", "Adult"),
    ("maduro", "Adult"),
    ("senior", "Senior"),
    ("geriatric", "Senior"),
    ("geriatrico", "Senior"),
    ("geriátrico", "Senior"),
];

const SEX_SYNONYMS: &[(&str, &str)] = &[
    ("male", "Male"),
    ("macho", "Male"),
    ("m", "Male"),
    ("female", "Female"),
    ("hembra", "Female"),
    ("f", "Female"),
];

const VACCINATION_SYNONYMS: &[(&str, &str)] = &[
    ("yes", "1"),
    ("si", "1"),
    ("sí", "1"),
    ("true", "1"),
    ("al dia", "1"),
    ("al día", "1"),
    ("1", "1"),
    ("no", "0"),
    ("false", "0"),
    ("0", "0"),
];

/// Result of normalizing one raw value
#[derive(Debug, Clone)]
pub struct Normalized {
    /// One of the encoder's known classes
    pub value: String,
    /// True when the deterministic first-class fallback was used
    pub fallback: bool,
}

/// Maps loosely specified categorical input onto encoder classes.
///
/// For a fixed encoder this is pure and deterministic; the counters only
/// record how often the fallback fired.
pub struct Normalizer {
    fallback_counts: DashMap<&'static str, u64>,
}

impl Normalizer {
    pub fn new() -> Self {
        Self {
            fallback_counts: DashMap::new(),
        }
    }

    /// Resolve a raw value to one of `encoder`'s known classes.
    ///
    /// Lookup order: synonym table, then the raw value directly against the
    /// known classes (case-insensitive), then the encoder's first class.
    pub fn normalize(
        &self,
        field: CategoricalField,
        raw: &str,
        encoder: &LabelEncoder,
    ) -> Normalized {
        let trimmed = raw.trim();
        let lowered = trimmed.to_lowercase();

        if let Some((_, canonical)) = field
            .synonyms()
            .iter()
            .find(|(variant, _)| *variant == lowered)
        {
            if let Some(class) = encoder.match_ignore_case(canonical) {
                return Normalized {
                    value: class.to_string(),
                    fallback: false,
                };
            }
        }

        if let Some(class) = encoder.match_ignore_case(trimmed) {
            return Normalized {
                value: class.to_string(),
                fallback: false,
            };
        }

        let substitute = encoder.fallback_class();
        warn!(
            field = field.as_str(),
            raw = %trimmed,
            substitute = %substitute,
            known_classes = ?encoder.classes,
            "Unknown categorical value, substituting first known class"
        );
        *self.fallback_counts.entry(field.as_str()).or_insert(0) += 1;

        Normalized {
            value: substitute.to_string(),
            fallback: true,
        }
    }

    /// Fallback substitutions recorded for one field
    pub fn fallback_count(&self, field: CategoricalField) -> u64 {
        self.fallback_counts
            .get(field.as_str())
            .map(|c| *c)
            .unwrap_or(0)
    }

    /// Fallback substitutions recorded across all fields
    pub fn total_fallbacks(&self) -> u64 {
        self.fallback_counts.iter().map(|e| *e.value()).sum()
    }
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn size_encoder() -> LabelEncoder {
        LabelEncoder {
            classes: vec!["Large".to_string(), "Medium".to_string(), "Small".to_string()],
        }
    }

    fn legacy_size_encoder() -> LabelEncoder {
        LabelEncoder {
            classes: vec![
                "grande".to_string(),
                "mediano".to_string(),
                "pequeño".to_string(),
            ],
        }
    }

    #[test]
    fn test_synonyms_resolve_to_canonical_class() {
        let normalizer = Normalizer::new();
        let enc = size_encoder();

        for raw in ["small", "SMALL", "pequeño", "pequeno", " chico "] {
            let n = normalizer.normalize(CategoricalField::Size, raw, &enc);
            assert_eq!(n.value, "Small", "raw = {raw}");
            assert!(!n.fallback);
        }
    }

    #[test]
    fn test_canonical_label_is_unchanged() {
        let normalizer = Normalizer::new();
        let enc = size_encoder();

        let n = normalizer.normalize(CategoricalField::Size, "Medium", &enc);
        assert_eq!(n.value, "Medium");
        assert!(!n.fallback);
        // Idempotent: normalizing the output returns it again
        let again = normalizer.normalize(CategoricalField::Size, &n.value, &enc);
        assert_eq!(again.value, "Medium");
    }

    #[test]
    fn test_raw_value_matches_legacy_classes_directly() {
        let normalizer = Normalizer::new();
        let enc = legacy_size_encoder();

        // Spanish labels are not in the synonym targets for this artifact
        // generation, but match the encoder classes directly
        let n = normalizer.normalize(CategoricalField::Size, "Pequeño", &enc);
        assert_eq!(n.value, "pequeño");
        assert!(!n.fallback);
    }

    #[test]
    fn test_unknown_value_falls_back_to_first_class() {
        let normalizer = Normalizer::new();
        let enc = legacy_size_encoder();

        let n = normalizer.normalize(CategoricalField::Size, "XL", &enc);
        assert_eq!(n.value, "grande");
        assert!(n.fallback);
        assert_eq!(normalizer.fallback_count(CategoricalField::Size), 1);
        assert_eq!(normalizer.total_fallbacks(), 1);
    }

    #[test]
    fn test_never_fails_on_arbitrary_input() {
        let normalizer = Normalizer::new();
        let enc = size_encoder();

        for raw in ["", "    ", "🐶", "drop table sizes", "väldigt stor"] {
            let n = normalizer.normalize(CategoricalField::Size, raw, &enc);
            assert!(enc.classes.contains(&n.value));
        }
    }

    #[test]
    fn test_animal_type_spanish_and_english() {
        let normalizer = Normalizer::new();
        let enc = LabelEncoder {
            classes: vec!["Gato".to_string(), "Perro".to_string()],
        };

        assert_eq!(
            normalizer
                .normalize(CategoricalField::AnimalType, "dog", &enc)
                .value,
            "Perro"
        );
        assert_eq!(
            normalizer
                .normalize(CategoricalField::AnimalType, "CAT", &enc)
                .value,
            "Gato"
        );
    }

    #[test]
    fn test_vaccination_yes_no_variants() {
        let normalizer = Normalizer::new();
        let enc = LabelEncoder {
            classes: vec!["0".to_string(), "1".to_string()],
        };

        assert_eq!(
            normalizer
                .normalize(CategoricalField::Vaccination, "Sí", &enc)
                .value,
            "1"
        );
        assert_eq!(
            normalizer
                .normalize(CategoricalField::Vaccination, "no", &enc)
                .value,
            "0"
        );
    }

    #[test]
    fn test_deterministic_for_same_input() {
        let normalizer = Normalizer::new();
        let enc = legacy_size_encoder();

        let first = normalizer.normalize(CategoricalField::Size, "XL", &enc);
        let second = normalizer.normalize(CategoricalField::Size, "XL", &enc);
        assert_eq!(first.value, second.value);
    }
}
