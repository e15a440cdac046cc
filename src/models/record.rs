use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::enums::DocumentKind;

/// Sentinel for time values/units the model could not determine.
pub const UNSPECIFIED: &str = "unspezifisch";

/// Fully extracted curriculum document, built stage-by-stage during one
/// pipeline run and discarded after export.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentRecord {
    pub kind: DocumentKind,
    /// Canonical "männliche Form/weibliche Form" label, e.g. "Maurer/Maurerin".
    pub occupation_name: String,
    /// Three-paragraph free-text description, intended ≤ 700 characters.
    pub occupation_description: String,
    /// Unit name → unit, in document order.
    pub units: IndexMap<String, LearningUnit>,
}

impl DocumentRecord {
    pub fn objective_count(&self) -> usize {
        self.units
            .values()
            .flat_map(|u| u.periods.values())
            .map(|p| p.objectives.len())
            .sum()
    }
}

/// A Lernfeld (Rahmenlehrplan) or Ausbildungsteil (Ausbildungsrahmenplan).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LearningUnit {
    pub label: String,
    /// Period label → period, in the order the unit/period stage listed them.
    pub periods: IndexMap<String, Period>,
}

/// One training-calendar segment of a unit, e.g. "1. Ausbildungsjahr".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Period {
    #[serde(rename = "zeit")]
    pub time: TimeAllocation,
    /// Objective id ("doc_lz_<n>") → objective. Ids are sequential per unit
    /// across all of its periods, assigned once and never reassigned.
    #[serde(rename = "lernziele")]
    pub objectives: IndexMap<String, Objective>,
}

/// Time budget of a period, split from a raw value like "40 Stunden".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeAllocation {
    #[serde(rename = "wert")]
    pub value: String,
    #[serde(rename = "einheit")]
    pub unit: String,
}

impl TimeAllocation {
    /// Split a raw time string on the first space into value and unit.
    /// "40 Stunden" → ("40", "Stunden"); no space → (raw, "unspezifisch").
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        match raw.split_once(' ') {
            Some((value, unit)) => Self {
                value: value.trim().to_string(),
                unit: unit.trim().to_string(),
            },
            None => Self {
                value: raw.to_string(),
                unit: UNSPECIFIED.to_string(),
            },
        }
    }

    pub fn unspecified() -> Self {
        Self {
            value: UNSPECIFIED.to_string(),
            unit: UNSPECIFIED.to_string(),
        }
    }
}

/// A single learning objective statement with its accepted taxonomy matches.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Objective {
    pub text: String,
    /// Empty unless reconciliation ran and accepted at least one match.
    #[serde(rename = "esco_mappings")]
    pub matches: Vec<SkillMatch>,
}

/// One accepted objective → taxonomy-skill link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillMatch {
    #[serde(rename = "kompetenz")]
    pub label: String,
    pub uri: String,
}

/// Occupation resolved from the reference taxonomy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxonomyOccupation {
    pub uri: String,
    #[serde(rename = "titel")]
    pub title: String,
    #[serde(rename = "beschreibung")]
    pub description: String,
}

/// Skill fetched from the reference taxonomy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxonomySkill {
    #[serde(rename = "titel")]
    pub title: String,
    #[serde(rename = "beschreibung")]
    pub description: String,
    pub uri: String,
}

/// Whether a skill came from the essential or optional relation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SkillProvenance {
    Essential,
    Optional,
}

impl SkillProvenance {
    /// Catalog id prefix: "esco_ess_<n>" / "esco_opt_<n>".
    pub fn id_prefix(&self) -> &'static str {
        match self {
            Self::Essential => "esco_ess",
            Self::Optional => "esco_opt",
        }
    }
}

/// Taxonomy data attached to one document run: the resolved occupation plus
/// the numbered skill catalog the matching pass draws from.
#[derive(Debug, Clone)]
pub struct TaxonomyData {
    pub occupation: TaxonomyOccupation,
    /// Essential then optional, in fetch order. Index order is the 1-based
    /// numbering used in matching prompts.
    pub skills: Vec<CatalogSkill>,
}

/// A catalog entry: a fetched skill plus its generated id and provenance.
#[derive(Debug, Clone)]
pub struct CatalogSkill {
    pub id: String,
    pub provenance: SkillProvenance,
    pub skill: TaxonomySkill,
}

impl TaxonomyData {
    /// Build the numbered catalog from the two fetched skill sequences.
    pub fn new(
        occupation: TaxonomyOccupation,
        essential: Vec<TaxonomySkill>,
        optional: Vec<TaxonomySkill>,
    ) -> Self {
        let mut skills = Vec::with_capacity(essential.len() + optional.len());
        for (i, skill) in essential.into_iter().enumerate() {
            skills.push(CatalogSkill {
                id: format!("{}_{}", SkillProvenance::Essential.id_prefix(), i + 1),
                provenance: SkillProvenance::Essential,
                skill,
            });
        }
        for (i, skill) in optional.into_iter().enumerate() {
            skills.push(CatalogSkill {
                id: format!("{}_{}", SkillProvenance::Optional.id_prefix(), i + 1),
                provenance: SkillProvenance::Optional,
                skill,
            });
        }
        Self { occupation, skills }
    }

    pub fn is_empty(&self) -> bool {
        self.skills.is_empty()
    }
}
