//! Lenient decoders for the model's line-oriented replies.
//!
//! Replies are untrusted semi-structured text. Each decoder validates line by
//! line and drops what it cannot read; a stage fails only when a reply yields
//! zero usable entries. Partial extraction beats full failure.

use thiserror::Error;

use crate::models::TimeAllocation;

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("Empty response in {0} stage")]
    Empty(&'static str),

    #[error("Could not classify document type from: {0:?}")]
    Unclassifiable(String),

    #[error("No usable entries in {0} response")]
    NoUsableEntries(&'static str),
}

/// One unit with its period labels, as listed by the unit/period stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedUnit {
    pub label: String,
    pub periods: Vec<String>,
}

/// Single-value stages (document type, occupation name, description):
/// trim; an empty result is a stage failure.
pub fn parse_single_value(response: &str, stage: &'static str) -> Result<String, ParseError> {
    let trimmed = response.trim();
    if trimmed.is_empty() {
        return Err(ParseError::Empty(stage));
    }
    Ok(trimmed.to_string())
}

/// Unit/period listing: each non-blank line is `unit;period[;period...]`.
/// A line may carry several periods; repeated unit labels merge, with
/// duplicate period labels ignored. Malformed lines are skipped.
pub fn parse_unit_periods(response: &str) -> Result<Vec<ParsedUnit>, ParseError> {
    let mut units: Vec<ParsedUnit> = Vec::new();

    for line in response.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let mut fields = line.split(';').map(str::trim);
        let label = fields.next().unwrap_or_default();
        let periods: Vec<String> = fields
            .filter(|p| !p.is_empty())
            .map(str::to_string)
            .collect();
        if label.is_empty() || periods.is_empty() {
            tracing::debug!(line, "Skipping malformed unit/period line");
            continue;
        }

        match units.iter_mut().find(|u| u.label == label) {
            Some(existing) => {
                for period in periods {
                    if !existing.periods.contains(&period) {
                        existing.periods.push(period);
                    }
                }
            }
            None => units.push(ParsedUnit {
                label: label.to_string(),
                periods,
            }),
        }
    }

    if units.is_empty() {
        return Err(ParseError::NoUsableEntries("unit/period"));
    }
    Ok(units)
}

/// Time-value listing: one line whose `;`-separated fields align positionally
/// with the unit's periods in request order. An empty field keeps its
/// position and becomes the unspecified sentinel, so later fields are not
/// shifted. Missing positions default to the sentinel; surplus fields are
/// dropped.
pub fn parse_time_values(response: &str, period_count: usize) -> Vec<TimeAllocation> {
    let mut values: Vec<TimeAllocation> = response
        .trim()
        .split(';')
        .map(|field| {
            let field = field.trim();
            if field.is_empty() {
                TimeAllocation::unspecified()
            } else {
                TimeAllocation::parse(field)
            }
        })
        .take(period_count)
        .collect();
    while values.len() < period_count {
        values.push(TimeAllocation::unspecified());
    }
    values
}

/// Objective listing: each non-blank line splits on the FIRST `;` into
/// `(period_label, objective_text)`. Lines without a `;` or with an empty
/// text are skipped.
pub fn parse_objectives(response: &str) -> Vec<(String, String)> {
    response
        .lines()
        .filter_map(|line| {
            let line = line.trim();
            if line.is_empty() {
                return None;
            }
            let Some((period, text)) = line.split_once(';') else {
                tracing::debug!(line, "Skipping objective line without delimiter");
                return None;
            };
            let period = period.trim();
            let text = text.trim();
            if period.is_empty() || text.is_empty() {
                tracing::debug!(line, "Skipping objective line with empty field");
                return None;
            }
            Some((period.to_string(), text.to_string()))
        })
        .collect()
}

/// Matching reply: lines of the form `objective_nr -> skill_nr[,skill_nr...]`
/// with 1-based indices. Returns 0-based `(objective, skills)` pairs. A line
/// is discarded in full when either side is malformed or out of bounds.
pub fn parse_skill_mappings(
    response: &str,
    objective_count: usize,
    skill_count: usize,
) -> Vec<(usize, Vec<usize>)> {
    let mut mappings = Vec::new();

    for line in response.lines() {
        let line = line.trim();
        if !line.contains("->") {
            continue;
        }
        let Some((src, targets)) = line.split_once("->") else {
            continue;
        };
        let Some(objective) = parse_index(src, objective_count) else {
            tracing::warn!(line, "Discarding mapping line with unusable objective index");
            continue;
        };
        let target_indices: Option<Vec<usize>> = targets
            .split(',')
            .map(|t| parse_index(t, skill_count))
            .collect();
        match target_indices {
            Some(skills) if !skills.is_empty() => mappings.push((objective, skills)),
            _ => tracing::warn!(line, "Discarding mapping line with unusable skill index"),
        }
    }

    mappings
}

/// Parse a 1-based index field and bounds-check it, returning 0-based.
fn parse_index(field: &str, count: usize) -> Option<usize> {
    let number: usize = field.trim().parse().ok()?;
    if number < 1 || number > count {
        return None;
    }
    Some(number - 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UNSPECIFIED;

    #[test]
    fn single_value_trims() {
        assert_eq!(
            parse_single_value("  Maurer/Maurerin \n", "occupation name").unwrap(),
            "Maurer/Maurerin"
        );
    }

    #[test]
    fn single_value_empty_is_stage_failure() {
        assert!(matches!(
            parse_single_value("   \n ", "description"),
            Err(ParseError::Empty("description"))
        ));
    }

    #[test]
    fn unit_periods_one_and_two_periods() {
        let response =
            "Kundenberatung;1. Ausbildungsjahr\nVerkaufsgespräche;1. Ausbildungsjahr;2. Ausbildungsjahr";
        let units = parse_unit_periods(response).unwrap();
        assert_eq!(units.len(), 2);
        assert_eq!(units[0].label, "Kundenberatung");
        assert_eq!(units[0].periods, vec!["1. Ausbildungsjahr"]);
        assert_eq!(units[1].label, "Verkaufsgespräche");
        assert_eq!(
            units[1].periods,
            vec!["1. Ausbildungsjahr", "2. Ausbildungsjahr"]
        );
    }

    #[test]
    fn unit_periods_skips_malformed_lines() {
        let response = "Kundenberatung;1. Ausbildungsjahr\nNur ein Name ohne Zeitraum\n;1. Jahr\n\n";
        let units = parse_unit_periods(response).unwrap();
        assert_eq!(units.len(), 1);
    }

    #[test]
    fn unit_periods_merges_repeated_units() {
        let response = "Kundenberatung;1. Ausbildungsjahr\nKundenberatung;2. Ausbildungsjahr\nKundenberatung;1. Ausbildungsjahr";
        let units = parse_unit_periods(response).unwrap();
        assert_eq!(units.len(), 1);
        assert_eq!(
            units[0].periods,
            vec!["1. Ausbildungsjahr", "2. Ausbildungsjahr"]
        );
    }

    #[test]
    fn unit_periods_all_malformed_is_stage_failure() {
        assert!(matches!(
            parse_unit_periods("keine Trennzeichen\nhier auch nicht"),
            Err(ParseError::NoUsableEntries("unit/period"))
        ));
    }

    #[test]
    fn time_values_positional() {
        let values = parse_time_values("40 Stunden;60 Stunden", 2);
        assert_eq!(values[0].value, "40");
        assert_eq!(values[0].unit, "Stunden");
        assert_eq!(values[1].value, "60");
    }

    #[test]
    fn time_values_missing_tail_defaults_to_unspecified() {
        let values = parse_time_values("40 Stunden", 3);
        assert_eq!(values.len(), 3);
        assert_eq!(values[1].value, UNSPECIFIED);
        assert_eq!(values[2], TimeAllocation::unspecified());
    }

    #[test]
    fn time_values_empty_middle_field_keeps_position() {
        let values = parse_time_values("40 Stunden;;60 Stunden", 3);
        assert_eq!(values[0].value, "40");
        assert_eq!(values[1], TimeAllocation::unspecified());
        assert_eq!(values[2].value, "60");
        assert_eq!(values[2].unit, "Stunden");
    }

    #[test]
    fn time_values_trailing_delimiter_is_unspecified() {
        let values = parse_time_values("40 Stunden;", 2);
        assert_eq!(values[0].value, "40");
        assert_eq!(values[1], TimeAllocation::unspecified());
    }

    #[test]
    fn time_values_surplus_fields_dropped() {
        let values = parse_time_values("40 Stunden;60 Stunden;80 Stunden", 2);
        assert_eq!(values.len(), 2);
    }

    #[test]
    fn objectives_split_on_first_delimiter_only() {
        let pairs =
            parse_objectives("1. Ausbildungsjahr;Waren annehmen; prüfen und lagern\n");
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].0, "1. Ausbildungsjahr");
        assert_eq!(pairs[0].1, "Waren annehmen; prüfen und lagern");
    }

    #[test]
    fn objectives_skip_malformed_lines() {
        let pairs = parse_objectives("ohne Trennzeichen\n1. Jahr;\n;Lernziel\n2. Jahr;Kunden beraten");
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].1, "Kunden beraten");
    }

    #[test]
    fn mapping_one_objective_two_skills() {
        let mappings = parse_skill_mappings("1 -> 2,3", 1, 3);
        assert_eq!(mappings, vec![(0, vec![1, 2])]);
    }

    #[test]
    fn mapping_out_of_range_objective_discarded() {
        let mappings = parse_skill_mappings("5 -> 1", 3, 3);
        assert!(mappings.is_empty());
    }

    #[test]
    fn mapping_any_bad_skill_index_discards_line() {
        // Skill index 9 is out of bounds, the whole line goes.
        let mappings = parse_skill_mappings("1 -> 2,9\n2 -> 1", 3, 3);
        assert_eq!(mappings, vec![(1, vec![0])]);
    }

    #[test]
    fn mapping_ignores_prose_lines() {
        let response = "Hier die Zuordnungen:\n1 -> 1\nKeine weiteren.";
        let mappings = parse_skill_mappings(response, 2, 2);
        assert_eq!(mappings, vec![(0, vec![0])]);
    }

    #[test]
    fn mapping_preserves_skill_order() {
        let mappings = parse_skill_mappings("1 -> 3,1,2", 1, 3);
        assert_eq!(mappings, vec![(0, vec![2, 0, 1])]);
    }
}
