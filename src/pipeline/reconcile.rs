//! Best-effort linkage of document objectives to taxonomy skills.
//!
//! The matching pass is model-assisted and non-deterministic; the invariants
//! that hold regardless are enforced here: indices are bounds-checked before
//! use, a failed unit degrades to "no matches for that unit", and a document
//! without taxonomy data is a valid (degraded) outcome, never a failure.

use super::parser::parse_skill_mappings;
use super::prompts::{matching_prompt, SYSTEM_PROMPT};
use crate::llm::TextGenerator;
use crate::models::{DocumentRecord, SkillMatch, TaxonomyData};
use crate::taxonomy::TaxonomyClient;

pub struct Reconciler<'a> {
    taxonomy: &'a dyn TaxonomyClient,
    generator: &'a dyn TextGenerator,
    model: &'a str,
}

impl<'a> Reconciler<'a> {
    pub fn new(
        taxonomy: &'a dyn TaxonomyClient,
        generator: &'a dyn TextGenerator,
        model: &'a str,
    ) -> Self {
        Self {
            taxonomy,
            generator,
            model,
        }
    }

    /// Run reconciliation for one document, merging accepted matches into the
    /// record. Returns the taxonomy data for export, or `None` when the
    /// occupation lookup missed or yielded no skills.
    pub fn reconcile(&self, record: &mut DocumentRecord) -> Option<TaxonomyData> {
        let occupation = match self.taxonomy.find_occupation(&record.occupation_name) {
            Ok(Some(occupation)) => occupation,
            Ok(None) => {
                tracing::info!(
                    occupation = %record.occupation_name,
                    "No taxonomy occupation, record proceeds without taxonomy data"
                );
                return None;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Occupation lookup failed, treated as miss");
                return None;
            }
        };
        tracing::info!(title = %occupation.title, uri = %occupation.uri, "Taxonomy occupation resolved");

        let (essential, optional) = self.taxonomy.fetch_skills(&occupation.uri);
        let data = TaxonomyData::new(occupation, essential, optional);
        if data.is_empty() {
            tracing::info!("No taxonomy skills, matching skipped");
            return None;
        }

        let unit_labels: Vec<String> = record.units.keys().cloned().collect();
        for label in unit_labels {
            self.match_unit(record, &label, &data);
        }

        Some(data)
    }

    /// One matching pass for one unit: all objective texts across all of the
    /// unit's periods, numbered 1-based, against the numbered skill catalog.
    fn match_unit(&self, record: &mut DocumentRecord, unit_label: &str, data: &TaxonomyData) {
        // Objective locations in period order; the list position is the
        // 1-based number used in the prompt, so merging is index-addressed
        // and duplicate objective texts cannot collide.
        let locations: Vec<(String, String, String)> = match record.units.get(unit_label) {
            Some(unit) => unit
                .periods
                .iter()
                .flat_map(|(period_label, period)| {
                    period.objectives.iter().map(move |(id, objective)| {
                        (period_label.clone(), id.clone(), objective.text.clone())
                    })
                })
                .collect(),
            None => return,
        };
        if locations.is_empty() {
            return;
        }

        let texts: Vec<&str> = locations.iter().map(|(_, _, text)| text.as_str()).collect();
        let prompt = matching_prompt(&texts, &data.skills);
        let response = match self.generator.generate(SYSTEM_PROMPT, &prompt, self.model) {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(unit_label, error = %e, "Matching call failed, unit left unmatched");
                return;
            }
        };

        let mappings = parse_skill_mappings(&response, locations.len(), data.skills.len());
        let accepted = mappings.len();
        for (objective_index, skill_indices) in mappings {
            let (period_label, objective_id, _) = &locations[objective_index];
            let Some(objective) = record
                .units
                .get_mut(unit_label)
                .and_then(|u| u.periods.get_mut(period_label))
                .and_then(|p| p.objectives.get_mut(objective_id))
            else {
                continue;
            };
            for skill_index in skill_indices {
                let entry = &data.skills[skill_index];
                let skill_match = SkillMatch {
                    label: entry.skill.title.clone(),
                    uri: entry.skill.uri.clone(),
                };
                // A repeated mapping line must not duplicate a match.
                if !objective.matches.contains(&skill_match) {
                    objective.matches.push(skill_match);
                }
            }
        }
        tracing::info!(unit_label, accepted, "Matching pass finished");
    }
}
