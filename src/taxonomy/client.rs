use std::time::Duration;

use serde_json::Value;

use super::TaxonomyError;
use crate::models::{TaxonomyOccupation, TaxonomySkill};

/// Ranked results requested from the occupation search; the first is used.
const SEARCH_LIMIT: usize = 3;

/// Upper bound on skills fetched per relation kind.
const SKILLS_LIMIT: usize = 100;

const ESSENTIAL_RELATION: &str = "hasEssentialSkill";
const OPTIONAL_RELATION: &str = "hasOptionalSkill";

/// Reference taxonomy gateway abstraction (allows mocking).
pub trait TaxonomyClient {
    /// Free-text occupation lookup. `Ok(None)` when the taxonomy has no match.
    fn find_occupation(&self, name: &str) -> Result<Option<TaxonomyOccupation>, TaxonomyError>;

    /// Fetch (essential, optional) skills for an occupation. Transport
    /// failures degrade to empty sequences — reconciliation proceeds without
    /// taxonomy data rather than aborting the document.
    fn fetch_skills(&self, occupation_uri: &str) -> (Vec<TaxonomySkill>, Vec<TaxonomySkill>);
}

/// Blocking client for the ESCO REST API.
pub struct EscoClient {
    base_url: String,
    language: String,
    client: reqwest::blocking::Client,
}

impl EscoClient {
    pub fn new(base_url: &str, language: &str, timeout_secs: u64) -> Self {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            language: language.to_string(),
            client,
        }
    }

    fn get_json(&self, path: &str, params: &[(&str, &str)]) -> Result<Value, TaxonomyError> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .client
            .get(&url)
            .query(params)
            .header("Accept", "application/json")
            .send()
            .map_err(|e| {
                if e.is_connect() {
                    TaxonomyError::Connection(self.base_url.clone())
                } else {
                    TaxonomyError::HttpClient(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(TaxonomyError::Service {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json()
            .map_err(|e| TaxonomyError::ResponseParsing(e.to_string()))
    }

    fn fetch_relation(&self, occupation_uri: &str, relation: &str) -> Vec<TaxonomySkill> {
        let limit = SKILLS_LIMIT.to_string();
        let result = self.get_json(
            "/resource/related",
            &[
                ("uri", occupation_uri),
                ("relation", relation),
                ("language", &self.language),
                ("full", "true"),
                ("limit", &limit),
            ],
        );

        let data = match result {
            Ok(data) => data,
            Err(e) => {
                tracing::warn!(relation, error = %e, "Skill fetch failed, continuing without");
                return Vec::new();
            }
        };

        let entries = data["_embedded"][relation].as_array().cloned().unwrap_or_default();
        entries
            .iter()
            .filter_map(|entry| {
                let uri = entry["uri"].as_str()?.to_string();
                Some(TaxonomySkill {
                    title: localized(&entry["preferredLabel"], &self.language),
                    description: localized(&entry["description"], &self.language),
                    uri,
                })
            })
            .collect()
    }
}

/// Resolve a `{lang: text}` map in the configured language, falling back to
/// "en", then to an empty string.
fn localized(value: &Value, language: &str) -> String {
    value[language]
        .as_str()
        .or_else(|| value["en"].as_str())
        .unwrap_or_default()
        .to_string()
}

impl TaxonomyClient for EscoClient {
    fn find_occupation(&self, name: &str) -> Result<Option<TaxonomyOccupation>, TaxonomyError> {
        let limit = SEARCH_LIMIT.to_string();
        let data = self.get_json(
            "/search",
            &[
                ("text", name),
                ("type", "occupation"),
                ("language", &self.language),
                ("full", "true"),
                ("limit", &limit),
            ],
        )?;

        let results = data["_embedded"]["results"].as_array().cloned().unwrap_or_default();
        let Some(first) = results.first() else {
            tracing::info!(name, "No taxonomy occupation found");
            return Ok(None);
        };

        let uri = first["uri"]
            .as_str()
            .ok_or_else(|| TaxonomyError::ResponseParsing("Occupation without uri".into()))?
            .to_string();

        Ok(Some(TaxonomyOccupation {
            uri,
            title: localized(&first["preferredLabel"], &self.language),
            description: localized(&first["description"], &self.language),
        }))
    }

    fn fetch_skills(&self, occupation_uri: &str) -> (Vec<TaxonomySkill>, Vec<TaxonomySkill>) {
        let essential = self.fetch_relation(occupation_uri, ESSENTIAL_RELATION);
        let optional = self.fetch_relation(occupation_uri, OPTIONAL_RELATION);
        (essential, optional)
    }
}

/// Mock taxonomy client for testing — configurable occupation and skills.
#[derive(Default)]
pub struct MockTaxonomyClient {
    occupation: Option<TaxonomyOccupation>,
    essential: Vec<TaxonomySkill>,
    optional: Vec<TaxonomySkill>,
}

impl MockTaxonomyClient {
    /// A client whose lookup always misses.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_occupation(occupation: TaxonomyOccupation) -> Self {
        Self {
            occupation: Some(occupation),
            ..Self::default()
        }
    }

    pub fn with_skills(
        mut self,
        essential: Vec<TaxonomySkill>,
        optional: Vec<TaxonomySkill>,
    ) -> Self {
        self.essential = essential;
        self.optional = optional;
        self
    }
}

impl TaxonomyClient for MockTaxonomyClient {
    fn find_occupation(&self, _name: &str) -> Result<Option<TaxonomyOccupation>, TaxonomyError> {
        Ok(self.occupation.clone())
    }

    fn fetch_skills(&self, _uri: &str) -> (Vec<TaxonomySkill>, Vec<TaxonomySkill>) {
        (self.essential.clone(), self.optional.clone())
    }
}
