//! Free-text symptom extraction
//!
//! Preprocessing adapter that turns a natural-language complaint into the
//! symptom-flag map the encoder expects. The default implementation is
//! keyword-based; the trait keeps it swappable (a model-backed extractor
//! plugs in the same way) without touching the prediction core.

use crate::models::SymptomMap;
use tracing::debug;

/// Turns owner-written text into canonical symptom flags
pub trait SymptomExtractor: Send + Sync {
    fn extract(&self, text: &str) -> SymptomMap;
}

/// Canonical symptom name → trigger phrases. Owners write in Spanish or
/// English, so both appear; phrases are matched against lowercased text.
const KEYWORD_MAP: &[(&str, &[&str])] = &[
    ("vomiting", &["vomit", "vómito", "vomito", "devuelv", "arcada", "throwing up"]),
    ("diarrhea", &["diarrea", "diarrhea", "heces blandas", "caca líquida", "loose stool"]),
    (
        "diarrhea_hemorrhagic",
        &["con sangre", "hemorrágica", "hemorragica", "sanguinolent", "bloody"],
    ),
    ("fever", &["fiebre", "fever", "temperatura alta", "calentura"]),
    (
        "lethargy",
        &[
            "letargo", "decaído", "decaido", "sin energía", "sin energia", "cansad", "débil",
            "debil", "apátic", "apatic", "lethargic", "listless",
        ],
    ),
    (
        "loss_appetite",
        &["no quiere comer", "no come", "sin apetito", "not eating", "lost appetite"],
    ),
    ("dehydration", &["deshidrat", "dehydrat"]),
    ("cough", &["tos", "toser", "cough"]),
    (
        "breathing_difficulty",
        &[
            "dificultad respirar",
            "dificultad para respirar",
            "respira mal",
            "le cuesta respirar",
            "trouble breathing",
            "difficulty breathing",
        ],
    ),
    ("sneezing", &["estornud", "sneez"]),
    (
        "nasal_discharge",
        &["mocos", "secreción nasal", "secrecion nasal", "runny nose", "nasal discharge"],
    ),
    (
        "ocular_discharge",
        &[
            "legañ", "lagañ", "ojos llorosos", "secreción ocular", "secrecion ocular",
            "eye discharge", "watery eyes",
        ],
    ),
    (
        "itching",
        &["picazón", "picazon", "rascarse", "se rasca", "comezón", "comezon", "itch", "scratch"],
    ),
    (
        "alopecia",
        &[
            "pérdida de pelo", "perdida de pelo", "se le cae el pelo", "calvo", "sin pelo",
            "hair loss", "bald patch",
        ],
    ),
    ("limping", &["cojea", "cojera", "renguea", "no apoya", "limp"]),
    ("stiff_gait", &["rígido", "rigido", "rigidez", "tieso", "stiff"]),
    (
        "joint_pain",
        &["dolor articu", "dolor en las patas", "artritis", "joint pain", "arthritis"],
    ),
    (
        "abdominal_pain",
        &[
            "dolor abdominal",
            "duele la panza",
            "dolor de estómago",
            "dolor de estomago",
            "belly pain",
            "stomach pain",
        ],
    ),
    (
        "seizures",
        &["convulsion", "convulsión", "espasmo", "temblor", "ataque", "seizure"],
    ),
    ("salivation", &["saliva", "babea", "drool"]),
    ("ear_discharge", &["supura", "oído sucio", "oido sucio", "ear discharge"]),
    ("head_shaking", &["sacude la cabeza", "head shaking", "shaking its head"]),
];

/// Keyword-table extractor. Flags are only ever set to 1: a symptom the
/// text does not mention is simply absent, and the encoder defaults it.
pub struct KeywordExtractor;

impl KeywordExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for KeywordExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl SymptomExtractor for KeywordExtractor {
    fn extract(&self, text: &str) -> SymptomMap {
        let lowered = text.to_lowercase();
        let mut symptoms = SymptomMap::new();

        for (symptom, phrases) in KEYWORD_MAP {
            if phrases.iter().any(|phrase| matches_phrase(&lowered, phrase)) {
                symptoms.insert(symptom.to_string(), 1);
            }
        }

        debug!(
            n_flags = symptoms.len(),
            text_len = text.len(),
            "Extracted symptom flags from free text"
        );
        symptoms
    }
}

/// Short triggers ("tos") must match whole words or they fire inside
/// unrelated ones ("gatos"); longer phrases match as substrings
fn matches_phrase(text: &str, phrase: &str) -> bool {
    if phrase.chars().count() <= 3 {
        text.split(|c: char| !c.is_alphanumeric()).any(|w| w == phrase)
    } else {
        text.contains(phrase)
    }
}
