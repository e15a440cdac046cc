use indexmap::IndexMap;

use super::parser::ParsedUnit;
use crate::models::{
    DocumentKind, DocumentRecord, LearningUnit, Objective, Period, TimeAllocation,
};

/// Assembles a `DocumentRecord` from parsed stage fragments in the fixed
/// stage order: kind → occupation name → description → unit/period pairs →
/// per-unit time values → per-unit objectives.
///
/// Objective ids (`doc_lz_<n>`) are 1-based and sequential per learning unit,
/// continuing across the unit's periods. An id, once assigned, is never
/// changed.
pub struct RecordBuilder {
    record: DocumentRecord,
    /// Next objective number per unit label.
    counters: IndexMap<String, usize>,
}

impl RecordBuilder {
    pub fn new(kind: DocumentKind, occupation_name: String, occupation_description: String) -> Self {
        Self {
            record: DocumentRecord {
                kind,
                occupation_name,
                occupation_description,
                units: IndexMap::new(),
            },
            counters: IndexMap::new(),
        }
    }

    /// Register a unit with its periods (time values still unspecified).
    /// Re-registering an existing unit label only adds unseen periods.
    pub fn add_unit(&mut self, parsed: &ParsedUnit) {
        let unit = self
            .record
            .units
            .entry(parsed.label.clone())
            .or_insert_with(|| LearningUnit {
                label: parsed.label.clone(),
                periods: IndexMap::new(),
            });
        for period in &parsed.periods {
            unit.periods.entry(period.clone()).or_insert_with(|| Period {
                time: TimeAllocation::unspecified(),
                objectives: IndexMap::new(),
            });
        }
        self.counters.entry(parsed.label.clone()).or_insert(1);
    }

    /// Assign time values positionally to a unit's periods, in the order the
    /// periods were registered. The parser already pads missing positions.
    pub fn set_time_values(&mut self, unit_label: &str, values: &[TimeAllocation]) {
        let Some(unit) = self.record.units.get_mut(unit_label) else {
            tracing::warn!(unit_label, "Time values for unknown unit, dropped");
            return;
        };
        for (i, period) in unit.periods.values_mut().enumerate() {
            period.time = values
                .get(i)
                .cloned()
                .unwrap_or_else(TimeAllocation::unspecified);
        }
    }

    /// Attach `(period_label, objective_text)` pairs to a unit.
    ///
    /// A period label the unit/period stage did not report is still accepted:
    /// it becomes a new period carrying the unit's FIRST period's time
    /// allocation. That fallback can mis-attribute timing, so it is logged.
    pub fn add_objectives(&mut self, unit_label: &str, pairs: &[(String, String)]) {
        let Some(unit) = self.record.units.get_mut(unit_label) else {
            tracing::warn!(unit_label, "Objectives for unknown unit, dropped");
            return;
        };
        let counter = self.counters.entry(unit_label.to_string()).or_insert(1);

        for (period_label, text) in pairs {
            if !unit.periods.contains_key(period_label) {
                tracing::warn!(
                    unit_label,
                    period_label,
                    "Objective names unknown period, falling back to first period's time"
                );
            }
            let fallback_time = unit
                .periods
                .first()
                .map(|(_, p)| p.time.clone())
                .unwrap_or_else(TimeAllocation::unspecified);
            let period = unit
                .periods
                .entry(period_label.clone())
                .or_insert_with(|| Period {
                    time: fallback_time,
                    objectives: IndexMap::new(),
                });

            let id = format!("doc_lz_{counter}");
            *counter += 1;
            period.objectives.insert(
                id,
                Objective {
                    text: text.clone(),
                    matches: Vec::new(),
                },
            );
        }
    }

    pub fn finish(self) -> DocumentRecord {
        self.record
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn builder() -> RecordBuilder {
        RecordBuilder::new(
            DocumentKind::Rahmenlehrplan,
            "Maurer/Maurerin".into(),
            "Beschreibung".into(),
        )
    }

    fn unit(label: &str, periods: &[&str]) -> ParsedUnit {
        ParsedUnit {
            label: label.into(),
            periods: periods.iter().map(|p| p.to_string()).collect(),
        }
    }

    #[test]
    fn objective_ids_continue_across_periods_of_one_unit() {
        let mut b = builder();
        b.add_unit(&unit("Kunden beraten", &["1. Jahr", "2. Jahr"]));
        b.add_objectives(
            "Kunden beraten",
            &[
                ("1. Jahr".into(), "Gespräche führen".into()),
                ("1. Jahr".into(), "Bedarf ermitteln".into()),
                ("2. Jahr".into(), "Beschwerden bearbeiten".into()),
            ],
        );
        let record = b.finish();
        let periods = &record.units["Kunden beraten"].periods;

        let first: Vec<&String> = periods["1. Jahr"].objectives.keys().collect();
        let second: Vec<&String> = periods["2. Jahr"].objectives.keys().collect();
        assert_eq!(first, vec!["doc_lz_1", "doc_lz_2"]);
        assert_eq!(second, vec!["doc_lz_3"]);
    }

    #[test]
    fn objective_ids_restart_per_unit() {
        let mut b = builder();
        b.add_unit(&unit("A", &["1. Jahr"]));
        b.add_unit(&unit("B", &["1. Jahr"]));
        b.add_objectives("A", &[("1. Jahr".into(), "x".into())]);
        b.add_objectives("B", &[("1. Jahr".into(), "y".into())]);
        let record = b.finish();
        assert!(record.units["A"].periods["1. Jahr"].objectives.contains_key("doc_lz_1"));
        assert!(record.units["B"].periods["1. Jahr"].objectives.contains_key("doc_lz_1"));
    }

    #[test]
    fn time_values_assigned_in_period_order() {
        let mut b = builder();
        b.add_unit(&unit("A", &["1. Jahr", "2. Jahr"]));
        b.set_time_values(
            "A",
            &[TimeAllocation::parse("40 Stunden"), TimeAllocation::parse("60 Stunden")],
        );
        let record = b.finish();
        let periods = &record.units["A"].periods;
        assert_eq!(periods["1. Jahr"].time.value, "40");
        assert_eq!(periods["2. Jahr"].time.value, "60");
    }

    #[test]
    fn unknown_period_label_falls_back_to_first_periods_time() {
        let mut b = builder();
        b.add_unit(&unit("A", &["1. Jahr"]));
        b.set_time_values("A", &[TimeAllocation::parse("40 Stunden")]);
        b.add_objectives("A", &[("3. Jahr".into(), "Sonderfall".into())]);
        let record = b.finish();
        let periods = &record.units["A"].periods;

        // The unknown label became a real period with the first period's time.
        assert_eq!(periods.len(), 2);
        assert_eq!(periods["3. Jahr"].time.value, "40");
        assert_eq!(periods["3. Jahr"].time.unit, "Stunden");
        assert!(periods["3. Jahr"].objectives.contains_key("doc_lz_1"));
    }

    #[test]
    fn objectives_for_unknown_unit_are_dropped() {
        let mut b = builder();
        b.add_unit(&unit("A", &["1. Jahr"]));
        b.add_objectives("Gibt es nicht", &[("1. Jahr".into(), "x".into())]);
        let record = b.finish();
        assert_eq!(record.objective_count(), 0);
    }

    #[test]
    fn reregistering_a_unit_keeps_existing_periods() {
        let mut b = builder();
        b.add_unit(&unit("A", &["1. Jahr"]));
        b.set_time_values("A", &[TimeAllocation::parse("40 Stunden")]);
        b.add_unit(&unit("A", &["1. Jahr", "2. Jahr"]));
        let record = b.finish();
        let periods = &record.units["A"].periods;
        assert_eq!(periods.len(), 2);
        assert_eq!(periods["1. Jahr"].time.value, "40");
    }
}
