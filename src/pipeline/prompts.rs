//! Prompt bundles for the extraction stages.
//!
//! The model's replies are treated as a line-oriented wire format: every
//! template spells out the delimiter and field order the parser expects
//! (`;`-separated fields, one entry per line). Two bundles exist, selected
//! by `DocumentKind`; they differ only where the document structure differs.

use crate::models::{CatalogSkill, DocumentKind};

/// System prompt for every extraction stage.
pub const SYSTEM_PROMPT: &str = "Du bist ein hilfreicher Assistent.";

/// Document classification stage. The reply must be one of the two tokens.
pub const DOCUMENT_TYPE_PROMPT: &str = "\
Ist dieses Dokument ein Ausbildungsrahmenplan (Gesetz) oder ein Rahmenlehrplan \
mit Lernfeldern? Bitte antworte nur mit 'Ausbildungsrahmenplan' oder 'Rahmenlehrplan'.";

/// Occupation-name stage (identical for both bundles).
const OCCUPATION_NAME_TEMPLATE: &str = "\
Gib den Beruf in der Form 'männliche Form/weibliche Form' an.

Beispiel:
Maurer/Maurerin";

/// Occupation-description stage (identical for both bundles).
const DESCRIPTION_TEMPLATE: &str = "\
Erstelle eine prägnante Beschreibung des Berufs basierend auf dem Dokument.
Die Beschreibung soll maximal 700 Zeichen lang sein und in drei Absätzen strukturiert sein:

Absatz 1: Die offizielle Berufsbezeichnung
Absatz 2: Die typischen Tätigkeiten und Aufgaben in fließendem Text
Absatz 3: Die charakteristischen Merkmale des Berufs in fließendem Text

Antworte nur mit der Beschreibung, ohne Überschriften oder Aufzählungszeichen. \
Jeder Absatz soll ein eigenständiger Fließtext sein.";

const UNITS_TEMPLATE_RLP: &str = "\
Liste die Lernfelder und ihre zugehörigen Zeiträume auf.
Entferne dabei Nummerierungen und Aufzählungszeichen vor den Lernfeldern.
Verwende folgendes Format:
Lernfeldname;Zeitraum

Beispiele:
Geschäftsprozesse und Märkte erkunden;1. Ausbildungsjahr
Waren annehmen und kontrollieren;1. Ausbildungsjahr;2. Ausbildungsjahr
Kunden beraten;2. Ausbildungsjahr";

const UNITS_TEMPLATE_ARP: &str = "\
Liste die Ausbildungsteile und ihre zugehörigen Zeiträume auf.
Entferne dabei Nummerierungen und Aufzählungszeichen vor den Ausbildungsteilen.
Verwende folgendes Format:
Ausbildungsteilname;Zeitraum

Beispiele:
Berufsbildung sowie Arbeits- und Tarifrecht;1. bis 18. Ausbildungsmonat
Aufbau und Organisation des Ausbildungsbetriebes;1. - 15. Monat;16. - 36. Monat
Sicherheit und Gesundheitsschutz bei der Arbeit;1. bis 18. Ausbildungsmonat";

/// Time-value stage. Replies align positionally with the unit's periods.
const TIME_VALUES_TEMPLATE: &str = "\
Gib die Zeit mit Einheit für '{unit}' in den Zeiträumen an.
Antworte nur mit Zahlen und Einheiten, keine weiteren Erklärungen.
Bei mehreren Zeiträumen trenne die Zeiten mit Semikolon.

Beispiele für einen Zeitraum:
40 Stunden
4 Wochen
3 Monate

Beispiele für zwei Zeiträume:
40 Stunden;60 Stunden
4 Wochen;8 Wochen
2 Monate;4 Monate

Bei fehlender Zeitangabe:
unspezifisch";

/// Objective stage. One `Zeitraum;Lernziel` pair per line.
const OBJECTIVES_TEMPLATE: &str = "\
Liste die Lernziele für '{unit}' sortiert nach Zeiträumen auf.
Verwende folgendes Format:
Zeitraum;Lernziel

Ein Lernziel pro Zeile, keine Aufzählungszeichen.

Beispiel für einen Zeitraum:
1. Ausbildungsjahr;Kundenberatungsgespräche führen
1. Ausbildungsjahr;Verkaufsgespräche durchführen

Beispiel für zwei Zeiträume:
1. - 15. Monat;Grundlagen der Kundenberatung anwenden
1. - 15. Monat;Verkaufstechniken einüben
16. - 36. Monat;Komplexe Beratungsgespräche führen
16. - 36. Monat;Verkaufsstrategien entwickeln";

/// Append the document text to a stage template.
fn with_document(template: &str, document_text: &str) -> String {
    format!("{template}\n\n{document_text}")
}

pub fn occupation_name_prompt(_kind: DocumentKind, document_text: &str) -> String {
    with_document(OCCUPATION_NAME_TEMPLATE, document_text)
}

pub fn description_prompt(_kind: DocumentKind, document_text: &str) -> String {
    with_document(DESCRIPTION_TEMPLATE, document_text)
}

pub fn units_prompt(kind: DocumentKind, document_text: &str) -> String {
    let template = match kind {
        DocumentKind::Rahmenlehrplan => UNITS_TEMPLATE_RLP,
        DocumentKind::Ausbildungsrahmenplan => UNITS_TEMPLATE_ARP,
    };
    with_document(template, document_text)
}

pub fn time_values_prompt(_kind: DocumentKind, unit_label: &str, document_text: &str) -> String {
    with_document(&TIME_VALUES_TEMPLATE.replace("{unit}", unit_label), document_text)
}

pub fn objectives_prompt(_kind: DocumentKind, unit_label: &str, document_text: &str) -> String {
    with_document(&OBJECTIVES_TEMPLATE.replace("{unit}", unit_label), document_text)
}

/// Matching stage: numbered objectives against the numbered skill catalog.
/// The reply format is `Lernziel-Nr -> ESCO-Kompetenz-Nr[,Nr...]` per line.
pub fn matching_prompt(objectives: &[&str], skills: &[CatalogSkill]) -> String {
    let numbered_objectives: Vec<String> = objectives
        .iter()
        .enumerate()
        .map(|(i, text)| format!("{}. {}", i + 1, text))
        .collect();
    let numbered_skills: Vec<String> = skills
        .iter()
        .enumerate()
        .map(|(i, entry)| format!("{}. {}", i + 1, entry.skill.title))
        .collect();

    format!(
        "Ordne die folgenden Lernziele den ESCO-Kompetenzen zu.

Lernziele:
{}

ESCO-Kompetenzen:
{}

Gib die Zuordnungen im Format \"Lernziel-Nr -> ESCO-Kompetenz-Nr\" an.
Ein Lernziel kann mehreren Kompetenzen zugeordnet werden und umgekehrt.
Beispiel: 1 -> 2,3 bedeutet, dass Lernziel 1 den ESCO-Kompetenzen 2 und 3 zugeordnet ist.

Bitte gib nur die Zuordnungen zurück, keine weiteren Erklärungen.",
        numbered_objectives.join("\n"),
        numbered_skills.join("\n")
    )
}
