use serde::{Deserialize, Serialize};

/// Reference facts for a recognised condition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConditionKnowledge {
    pub common_treatments: Vec<String>,
    pub severity: String,
    pub specialist: String,
    pub urgency: String,
}

struct KnowledgeRow {
    key: &'static str,
    treatments: &'static [&'static str],
    severity: &'static str,
    specialist: &'static str,
    urgency: &'static str,
}

const KNOWLEDGE_BASE: &[KnowledgeRow] = &[
    KnowledgeRow {
        key: "acne",
        treatments: &[
            "Topical retinoids",
            "Benzoyl peroxide",
            "Salicylic acid",
            "Antibiotics",
        ],
        severity: "mild-severe",
        specialist: "dermatologist",
        urgency: "routine",
    },
    KnowledgeRow {
        key: "eczema",
        treatments: &["Moisturizers", "Topical corticosteroids", "Antihistamines"],
        severity: "mild-severe",
        specialist: "dermatologist or allergist",
        urgency: "routine",
    },
    KnowledgeRow {
        key: "psoriasis",
        treatments: &[
            "Topical corticosteroids",
            "Vitamin D analogs",
            "Immunosuppressants",
        ],
        severity: "mild-severe",
        specialist: "dermatologist or rheumatologist",
        urgency: "routine",
    },
    KnowledgeRow {
        key: "melanoma",
        treatments: &["Surgical excision", "Immunotherapy", "Radiation therapy"],
        severity: "severe",
        specialist: "oncological dermatologist",
        urgency: "urgent",
    },
    KnowledgeRow {
        key: "basal_cell_carcinoma",
        treatments: &["Surgical excision", "Mohs surgery", "Topical chemotherapy"],
        severity: "moderate-severe",
        specialist: "dermatologist or dermatological surgeon",
        urgency: "semi-urgent",
    },
    KnowledgeRow {
        key: "dermatitis",
        treatments: &["Avoid irritants", "Moisturizers", "Topical corticosteroids"],
        severity: "mild-moderate",
        specialist: "dermatologist or allergist",
        urgency: "routine",
    },
    KnowledgeRow {
        key: "rosacea",
        treatments: &[
            "Topical metronidazole",
            "Oral antibiotics",
            "Lifestyle modifications",
        ],
        severity: "mild-moderate",
        specialist: "dermatologist",
        urgency: "routine",
    },
    KnowledgeRow {
        key: "fungal_infection",
        treatments: &["Antifungal creams", "Oral antifungals", "Proper hygiene"],
        severity: "mild-moderate",
        specialist: "dermatologist or primary care",
        urgency: "routine",
    },
    KnowledgeRow {
        key: "warts",
        treatments: &["Cryotherapy", "Topical treatments", "Laser therapy"],
        severity: "mild",
        specialist: "dermatologist or primary care",
        urgency: "routine",
    },
    KnowledgeRow {
        key: "normal_skin",
        treatments: &[
            "Regular skincare routine",
            "Sun protection",
            "Moisturizing",
        ],
        severity: "none",
        specialist: "none required",
        urgency: "none",
    },
];

/// Lowercases the label and joins whitespace runs with `_`. Leading and
/// trailing whitespace is dropped, so `" acne"` keys as `acne`, not `_acne`.
pub fn condition_key(condition: &str) -> String {
    condition
        .split_whitespace()
        .collect::<Vec<&str>>()
        .join("_")
        .to_lowercase()
}

pub fn lookup(condition: &str) -> Option<ConditionKnowledge> {
    let key = condition_key(condition);
    KNOWLEDGE_BASE
        .iter()
        .find(|row| row.key == key)
        .map(|row| ConditionKnowledge {
            common_treatments: row.treatments.iter().map(|t| (*t).to_string()).collect(),
            severity: row.severity.to_string(),
            specialist: row.specialist.to_string(),
            urgency: row.urgency.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::{condition_key, lookup};

    #[test]
    fn condition_key_collapses_whitespace() {
        assert_eq!(condition_key("Basal Cell  Carcinoma"), "basal_cell_carcinoma");
        assert_eq!(condition_key("acne"), "acne");
        assert_eq!(condition_key(" acne "), "acne");
    }

    #[test]
    fn lookup_finds_known_conditions_only() {
        let melanoma = lookup("Melanoma").unwrap_or_else(|| panic!("melanoma missing"));
        assert_eq!(melanoma.urgency, "urgent");
        assert_eq!(melanoma.common_treatments.len(), 3);
        assert!(lookup("Normal skin").is_some());
        assert!(lookup("lichen planus").is_none());
    }
}
