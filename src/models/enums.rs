use std::fmt;

use serde::{Deserialize, Serialize};

/// Document category of a training curriculum source.
///
/// Determines which prompt bundle drives the extraction stages: a
/// Rahmenlehrplan organizes content into Lernfelder per Ausbildungsjahr,
/// an Ausbildungsrahmenplan into Ausbildungsteile with month ranges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DocumentKind {
    Rahmenlehrplan,
    Ausbildungsrahmenplan,
}

impl DocumentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Rahmenlehrplan => "Rahmenlehrplan",
            Self::Ausbildungsrahmenplan => "Ausbildungsrahmenplan",
        }
    }

    /// Classify a model reply from the document-type stage.
    ///
    /// The classification prompt asks for exactly one of the two tokens;
    /// replies wrapped in quotes or a short sentence still resolve. The
    /// longer token is checked first.
    pub fn from_response(response: &str) -> Option<Self> {
        let trimmed = response.trim();
        if trimmed.contains("Ausbildungsrahmenplan") {
            Some(Self::Ausbildungsrahmenplan)
        } else if trimmed.contains("Rahmenlehrplan") {
            Some(Self::Rahmenlehrplan)
        } else {
            None
        }
    }

    /// Label used for the unit level in prompts and status output.
    pub fn unit_term(&self) -> &'static str {
        match self {
            Self::Rahmenlehrplan => "Lernfeld",
            Self::Ausbildungsrahmenplan => "Ausbildungsteil",
        }
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
