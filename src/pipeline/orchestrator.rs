//! Per-document pipeline driver and batch runner.
//!
//! One document runs through a fixed stage sequence; any stage error aborts
//! that document only. The batch driver walks the data folder, absorbs
//! per-document failures, and reports an aggregate summary.

use std::fs;
use std::path::{Path, PathBuf};

use crate::export::{write_csv, write_json, NestedExport};
use crate::llm::TextGenerator;
use crate::models::DocumentKind;
use crate::taxonomy::TaxonomyClient;

use super::builder::RecordBuilder;
use super::convert::{cached_convert, DocumentConverter};
use super::parser::{
    parse_objectives, parse_single_value, parse_time_values, parse_unit_periods, ParseError,
};
use super::prompts::{
    description_prompt, objectives_prompt, occupation_name_prompt, time_values_prompt,
    units_prompt, DOCUMENT_TYPE_PROMPT, SYSTEM_PROMPT,
};
use super::reconcile::Reconciler;
use super::PipelineError;

/// Intended upper bound for the occupation description, matching the prompt.
const DESCRIPTION_CHAR_LIMIT: usize = 700;

/// Pipeline stages in run order, plus the two terminal states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Converting,
    ClassifyingType,
    ExtractingOccupationName,
    GeneratingDescription,
    ExtractingUnits,
    ExtractingTimeAndObjectives,
    Reconciling,
    Exporting,
    Done,
    Failed,
}

impl Stage {
    /// User-facing progress label.
    pub fn label(&self) -> &'static str {
        match self {
            Stage::Converting => "Konvertiere Dokument",
            Stage::ClassifyingType => "Bestimme Dokumententyp",
            Stage::ExtractingOccupationName => "Extrahiere Berufsbezeichnung",
            Stage::GeneratingDescription => "Erstelle Berufsbeschreibung",
            Stage::ExtractingUnits => "Extrahiere Lernfelder/Ausbildungsteile",
            Stage::ExtractingTimeAndObjectives => "Extrahiere Zeiten und Lernziele",
            Stage::Reconciling => "Gleiche mit ESCO ab",
            Stage::Exporting => "Schreibe Exporte",
            Stage::Done => "Fertig",
            Stage::Failed => "Fehlgeschlagen",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Progress consumer. Implementations must not fail; eventing is
/// observational and never influences pipeline behavior.
pub trait ProgressSink {
    fn stage_changed(&self, document: &Path, stage: Stage);
}

/// Default sink: forwards stage changes to the log.
pub struct LogSink;

impl ProgressSink for LogSink {
    fn stage_changed(&self, document: &Path, stage: Stage) {
        tracing::info!(document = %document.display(), stage = %stage, "Pipeline stage");
    }
}

/// Result of one successfully processed document.
#[derive(Debug)]
pub struct DocumentOutcome {
    pub source: PathBuf,
    pub kind: DocumentKind,
    pub objectives: usize,
    pub json_path: PathBuf,
    pub csv_path: PathBuf,
}

/// Aggregate result of a batch run.
#[derive(Debug, Default)]
pub struct BatchSummary {
    pub outcomes: Vec<DocumentOutcome>,
    pub failed: usize,
}

impl BatchSummary {
    pub fn processed(&self) -> usize {
        self.outcomes.len()
    }
}

pub struct Pipeline<'a> {
    generator: &'a dyn TextGenerator,
    taxonomy: &'a dyn TaxonomyClient,
    converter: &'a dyn DocumentConverter,
    sink: &'a dyn ProgressSink,
    output_dir: PathBuf,
    model: String,
}

impl<'a> Pipeline<'a> {
    pub fn new(
        generator: &'a dyn TextGenerator,
        taxonomy: &'a dyn TaxonomyClient,
        converter: &'a dyn DocumentConverter,
        sink: &'a dyn ProgressSink,
        output_dir: PathBuf,
        model: String,
    ) -> Self {
        Self {
            generator,
            taxonomy,
            converter,
            sink,
            output_dir,
            model,
        }
    }

    fn generate(&self, user_prompt: &str) -> Result<String, PipelineError> {
        Ok(self
            .generator
            .generate(SYSTEM_PROMPT, user_prompt, &self.model)?)
    }

    /// Run one document through every stage and write both exports.
    pub fn process_document(&self, source: &Path) -> Result<DocumentOutcome, PipelineError> {
        match self.run_stages(source) {
            Ok(outcome) => {
                self.sink.stage_changed(source, Stage::Done);
                Ok(outcome)
            }
            Err(e) => {
                self.sink.stage_changed(source, Stage::Failed);
                Err(e)
            }
        }
    }

    fn run_stages(&self, source: &Path) -> Result<DocumentOutcome, PipelineError> {
        self.sink.stage_changed(source, Stage::Converting);
        let text = cached_convert(source, &self.output_dir, self.converter)?;

        self.sink.stage_changed(source, Stage::ClassifyingType);
        let response = self.generate(&format!("{DOCUMENT_TYPE_PROMPT}\n\n{text}"))?;
        let kind = DocumentKind::from_response(&response)
            .ok_or(ParseError::Unclassifiable(response))?;
        tracing::info!(kind = %kind, "Document classified");

        self.sink.stage_changed(source, Stage::ExtractingOccupationName);
        let name = parse_single_value(
            &self.generate(&occupation_name_prompt(kind, &text))?,
            "occupation name",
        )?;

        self.sink.stage_changed(source, Stage::GeneratingDescription);
        let description = parse_single_value(
            &self.generate(&description_prompt(kind, &text))?,
            "occupation description",
        )?;
        let chars = description.chars().count();
        if chars > DESCRIPTION_CHAR_LIMIT {
            tracing::warn!(chars, "Occupation description exceeds the intended length");
        }

        self.sink.stage_changed(source, Stage::ExtractingUnits);
        let units = parse_unit_periods(&self.generate(&units_prompt(kind, &text))?)?;

        let mut builder = RecordBuilder::new(kind, name, description);
        for unit in &units {
            builder.add_unit(unit);
        }

        self.sink.stage_changed(source, Stage::ExtractingTimeAndObjectives);
        for unit in &units {
            let times = parse_time_values(
                &self.generate(&time_values_prompt(kind, &unit.label, &text))?,
                unit.periods.len(),
            );
            builder.set_time_values(&unit.label, &times);

            let pairs =
                parse_objectives(&self.generate(&objectives_prompt(kind, &unit.label, &text))?);
            builder.add_objectives(&unit.label, &pairs);
        }

        let mut record = builder.finish();
        if record.objective_count() == 0 {
            return Err(ParseError::NoUsableEntries("objectives").into());
        }

        self.sink.stage_changed(source, Stage::Reconciling);
        let taxonomy_data =
            Reconciler::new(self.taxonomy, self.generator, &self.model).reconcile(&mut record);

        self.sink.stage_changed(source, Stage::Exporting);
        let export = NestedExport::build(&record, taxonomy_data.as_ref());
        let stem = source
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
        let json_path = self.output_dir.join(format!("{stem}_{timestamp}.json"));
        let csv_path = self.output_dir.join(format!("{stem}_{timestamp}.csv"));
        write_json(&export, &json_path)?;
        write_csv(&export, &csv_path)?;

        Ok(DocumentOutcome {
            source: source.to_path_buf(),
            kind: record.kind,
            objectives: record.objective_count(),
            json_path,
            csv_path,
        })
    }

    /// Process every supported document under the data folder. A failing
    /// document is logged and skipped; the batch never aborts because of one.
    pub fn run_batch(&self, data_dir: &Path) -> Result<BatchSummary, PipelineError> {
        fs::create_dir_all(&self.output_dir)?;
        let sources = collect_sources(data_dir)?;
        tracing::info!(count = sources.len(), dir = %data_dir.display(), "Batch started");

        let mut summary = BatchSummary::default();
        for source in sources {
            match self.process_document(&source) {
                Ok(outcome) => {
                    tracing::info!(
                        document = %outcome.source.display(),
                        objectives = outcome.objectives,
                        "Document processed"
                    );
                    summary.outcomes.push(outcome);
                }
                Err(e) => {
                    tracing::error!(document = %source.display(), error = %e, "Document skipped");
                    summary.failed += 1;
                }
            }
        }
        tracing::info!(
            processed = summary.processed(),
            failed = summary.failed,
            "Batch finished"
        );
        Ok(summary)
    }
}

fn is_supported_source(path: &Path) -> bool {
    path.extension().is_some_and(|ext| {
        ext.eq_ignore_ascii_case("pdf") || ext.eq_ignore_ascii_case("md")
    })
}

/// Recursively collect supported documents, in sorted path order so batch
/// runs are deterministic.
fn collect_sources(dir: &Path) -> Result<Vec<PathBuf>, std::io::Error> {
    let mut entries: Vec<PathBuf> = fs::read_dir(dir)?
        .collect::<Result<Vec<_>, _>>()?
        .into_iter()
        .map(|e| e.path())
        .collect();
    entries.sort();

    let mut sources = Vec::new();
    for path in entries {
        if path.is_dir() {
            sources.extend(collect_sources(&path)?);
        } else if is_supported_source(&path) {
            sources.push(path);
        }
    }
    Ok(sources)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use crate::llm::ScriptedGenerator;
    use crate::models::{TaxonomyOccupation, TaxonomySkill};
    use crate::pipeline::convert::MarkdownReader;
    use crate::taxonomy::MockTaxonomyClient;

    struct RecordingSink {
        stages: Mutex<Vec<Stage>>,
    }

    impl RecordingSink {
        fn new() -> Self {
            Self {
                stages: Mutex::new(Vec::new()),
            }
        }

        fn stages(&self) -> Vec<Stage> {
            self.stages.lock().unwrap().clone()
        }
    }

    impl ProgressSink for RecordingSink {
        fn stage_changed(&self, _document: &Path, stage: Stage) {
            self.stages.lock().unwrap().push(stage);
        }
    }

    fn write_source(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, content).unwrap();
        path
    }

    fn happy_path_responses() -> Vec<&'static str> {
        vec![
            "Rahmenlehrplan",
            "Maurer/Maurerin",
            "Ein Beruf im Bauhauptgewerbe.",
            "Wände errichten;1. Ausbildungsjahr",
            "40 Stunden",
            "1. Ausbildungsjahr;Mauerwerk planen\n1. Ausbildungsjahr;Mauerwerk ausführen",
        ]
    }

    #[test]
    fn single_document_runs_all_stages_and_exports() {
        let data = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();
        let source = write_source(data.path(), "plan.md", "# Rahmenlehrplan Maurer\nInhalt");

        let generator = ScriptedGenerator::new(happy_path_responses());
        let taxonomy = MockTaxonomyClient::empty();
        let sink = RecordingSink::new();
        let pipeline = Pipeline::new(
            &generator,
            &taxonomy,
            &MarkdownReader,
            &sink,
            output.path().to_path_buf(),
            "gpt-4o-mini".into(),
        );

        let outcome = pipeline.process_document(&source).unwrap();
        assert_eq!(outcome.kind, DocumentKind::Rahmenlehrplan);
        assert_eq!(outcome.objectives, 2);
        assert!(outcome.json_path.is_file());
        assert!(outcome.csv_path.is_file());

        let json = fs::read_to_string(&outcome.json_path).unwrap();
        assert!(json.contains("Maurer/Maurerin"));
        assert!(json.contains("Mauerwerk planen"));
        // Empty taxonomy lookup leaves an empty esco_daten object.
        assert!(json.contains("\"esco_daten\": {}"));

        assert_eq!(
            sink.stages(),
            vec![
                Stage::Converting,
                Stage::ClassifyingType,
                Stage::ExtractingOccupationName,
                Stage::GeneratingDescription,
                Stage::ExtractingUnits,
                Stage::ExtractingTimeAndObjectives,
                Stage::Reconciling,
                Stage::Exporting,
                Stage::Done,
            ]
        );
    }

    #[test]
    fn matching_results_reach_the_exports() {
        let data = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();
        let source = write_source(data.path(), "plan.md", "Inhalt");

        let mut responses = happy_path_responses();
        responses.push("1 -> 1\n2 -> 1"); // matching stage
        let generator = ScriptedGenerator::new(responses);
        let taxonomy = MockTaxonomyClient::with_occupation(TaxonomyOccupation {
            uri: "http://data.europa.eu/esco/occupation/maurer".into(),
            title: "Maurer/Maurerin".into(),
            description: String::new(),
        })
        .with_skills(
            vec![TaxonomySkill {
                title: "Mauerwerk erstellen".into(),
                description: String::new(),
                uri: "http://data.europa.eu/esco/skill/1".into(),
            }],
            vec![],
        );
        let pipeline = Pipeline::new(
            &generator,
            &taxonomy,
            &MarkdownReader,
            &LogSink,
            output.path().to_path_buf(),
            "gpt-4o-mini".into(),
        );

        let outcome = pipeline.process_document(&source).unwrap();
        let json = fs::read_to_string(&outcome.json_path).unwrap();
        assert!(json.contains("esco_ess_1"));
        assert!(json.contains("Mauerwerk erstellen"));

        let csv = fs::read_to_string(&outcome.csv_path).unwrap();
        assert!(csv.contains("Mauerwerk erstellen;http://data.europa.eu/esco/skill/1"));
    }

    #[test]
    fn document_without_objectives_fails() {
        let data = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();
        let source = write_source(data.path(), "plan.md", "Inhalt");

        let generator = ScriptedGenerator::new(vec![
            "Rahmenlehrplan",
            "Maurer/Maurerin",
            "Beschreibung",
            "Wände errichten;1. Ausbildungsjahr",
            "unspezifisch",
            "keine verwertbare Antwort ohne Trennzeichen",
        ]);
        let taxonomy = MockTaxonomyClient::empty();
        let sink = RecordingSink::new();
        let pipeline = Pipeline::new(
            &generator,
            &taxonomy,
            &MarkdownReader,
            &sink,
            output.path().to_path_buf(),
            "gpt-4o-mini".into(),
        );

        let result = pipeline.process_document(&source);
        assert!(matches!(
            result,
            Err(PipelineError::Parse(ParseError::NoUsableEntries(_)))
        ));
        assert_eq!(sink.stages().last(), Some(&Stage::Failed));
    }

    #[test]
    fn unclassifiable_document_fails_early() {
        let data = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();
        let source = write_source(data.path(), "plan.md", "Inhalt");

        let generator = ScriptedGenerator::new(vec!["Das ist ein Lehrbuch."]);
        let taxonomy = MockTaxonomyClient::empty();
        let pipeline = Pipeline::new(
            &generator,
            &taxonomy,
            &MarkdownReader,
            &LogSink,
            output.path().to_path_buf(),
            "gpt-4o-mini".into(),
        );

        let result = pipeline.process_document(&source);
        assert!(matches!(
            result,
            Err(PipelineError::Parse(ParseError::Unclassifiable(_)))
        ));
    }

    #[test]
    fn batch_absorbs_failing_documents() {
        let data = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();
        // Sorted order: the empty document fails first, then the good one runs.
        write_source(data.path(), "a_leer.md", "   \n");
        write_source(data.path(), "b_plan.md", "Inhalt");

        let generator = ScriptedGenerator::new(happy_path_responses());
        let taxonomy = MockTaxonomyClient::empty();
        let pipeline = Pipeline::new(
            &generator,
            &taxonomy,
            &MarkdownReader,
            &LogSink,
            output.path().to_path_buf(),
            "gpt-4o-mini".into(),
        );

        let summary = pipeline.run_batch(data.path()).unwrap();
        assert_eq!(summary.processed(), 1);
        assert_eq!(summary.failed, 1);
        assert!(summary.outcomes[0].source.ends_with("b_plan.md"));
    }

    #[test]
    fn source_collection_recurses_and_filters() {
        let data = tempfile::tempdir().unwrap();
        write_source(data.path(), "b.md", "x");
        write_source(data.path(), "notizen.txt", "x");
        let sub = data.path().join("unter");
        fs::create_dir(&sub).unwrap();
        write_source(&sub, "a.pdf", "x");

        let sources = collect_sources(data.path()).unwrap();
        let names: Vec<String> = sources
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["b.md", "a.pdf"]);
    }
}
