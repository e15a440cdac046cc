//! Nested JSON export: the full document tree plus the taxonomy catalog and
//! the matching view, mirroring the established German wire schema. UTF-8
//! text is preserved verbatim.

use std::fs;
use std::path::Path;

use indexmap::IndexMap;
use serde::{Serialize, Serializer};

use super::ExportError;
use crate::models::{
    DocumentRecord, Period, SkillMatch, SkillProvenance, TaxonomyData, TaxonomyOccupation,
    TaxonomySkill,
};

/// Top-level nested export, one per document.
#[derive(Debug, Serialize)]
pub struct NestedExport {
    pub dokumententyp: String,
    pub beruf: OccupationSection,
}

#[derive(Debug, Serialize)]
pub struct OccupationSection {
    pub dokumente_daten: DocumentData,
    /// `{}` when no taxonomy data was resolved for this document.
    #[serde(serialize_with = "esco_or_empty")]
    pub esco_daten: Option<EscoData>,
    pub matching: IndexMap<String, IndexMap<String, MatchingPeriod>>,
}

#[derive(Debug, Serialize)]
pub struct DocumentData {
    pub berufsbezeichnung: String,
    pub berufsbeschreibung: String,
    pub lernfelder_ausbildungsteile: IndexMap<String, UnitExport>,
}

#[derive(Debug, Serialize)]
pub struct UnitExport {
    pub beschreibung: String,
    pub zeitraeume: IndexMap<String, Period>,
}

#[derive(Debug, Serialize)]
pub struct EscoData {
    pub beruf: TaxonomyOccupation,
    pub kompetenzen: SkillCatalogExport,
}

#[derive(Debug, Serialize)]
pub struct SkillCatalogExport {
    pub essentiell: IndexMap<String, TaxonomySkill>,
    pub optional: IndexMap<String, TaxonomySkill>,
}

#[derive(Debug, Serialize)]
pub struct MatchingPeriod {
    pub lernziele: IndexMap<String, MatchingObjective>,
}

#[derive(Debug, Serialize)]
pub struct MatchingObjective {
    pub text: String,
    pub mappings: Vec<SkillMatch>,
}

fn esco_or_empty<S: Serializer>(
    value: &Option<EscoData>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match value {
        Some(data) => data.serialize(serializer),
        None => serde_json::Map::new().serialize(serializer),
    }
}

impl NestedExport {
    /// Assemble the export tree from a finished record and the (optional)
    /// taxonomy data of its run. Pure restructuring — no information is
    /// invented here.
    pub fn build(record: &DocumentRecord, taxonomy: Option<&TaxonomyData>) -> Self {
        let units: IndexMap<String, UnitExport> = record
            .units
            .iter()
            .map(|(label, unit)| {
                (
                    label.clone(),
                    UnitExport {
                        beschreibung: unit.label.clone(),
                        zeitraeume: unit.periods.clone(),
                    },
                )
            })
            .collect();

        let matching = record
            .units
            .iter()
            .map(|(label, unit)| {
                let periods = unit
                    .periods
                    .iter()
                    .map(|(period_label, period)| {
                        let lernziele = period
                            .objectives
                            .iter()
                            .map(|(id, objective)| {
                                (
                                    id.clone(),
                                    MatchingObjective {
                                        text: objective.text.clone(),
                                        mappings: objective.matches.clone(),
                                    },
                                )
                            })
                            .collect();
                        (period_label.clone(), MatchingPeriod { lernziele })
                    })
                    .collect();
                (label.clone(), periods)
            })
            .collect();

        let esco_daten = taxonomy.map(|data| {
            let mut essentiell = IndexMap::new();
            let mut optional = IndexMap::new();
            for entry in &data.skills {
                match entry.provenance {
                    SkillProvenance::Essential => {
                        essentiell.insert(entry.id.clone(), entry.skill.clone())
                    }
                    SkillProvenance::Optional => {
                        optional.insert(entry.id.clone(), entry.skill.clone())
                    }
                };
            }
            EscoData {
                beruf: data.occupation.clone(),
                kompetenzen: SkillCatalogExport {
                    essentiell,
                    optional,
                },
            }
        });

        Self {
            dokumententyp: record.kind.to_string(),
            beruf: OccupationSection {
                dokumente_daten: DocumentData {
                    berufsbezeichnung: record.occupation_name.clone(),
                    berufsbeschreibung: record.occupation_description.clone(),
                    lernfelder_ausbildungsteile: units,
                },
                esco_daten,
                matching,
            },
        }
    }
}

/// Write the nested export as pretty-printed UTF-8 JSON.
pub fn write_json(export: &NestedExport, path: &Path) -> Result<(), ExportError> {
    let json = serde_json::to_string_pretty(export)
        .map_err(|e| ExportError::Serialization(e.to_string()))?;
    fs::write(path, json)?;
    tracing::info!(path = %path.display(), "JSON export written");
    Ok(())
}
