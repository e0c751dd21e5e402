/**
This module classifies the outcome of evaluating one treebank into a closed
set of statuses and renders the human-readable status message for each. The
messages are part of the output contract: downstream tooling greps for them.
*/
use crate::conllu::UdError;
use crate::score::round_score;
use std::fmt::Display;

/// Outcome of one treebank evaluation. Every variant is terminal: once a
/// treebank is classified, no further processing happens for it.
#[derive(Debug, Clone, PartialEq)]
pub enum Status {
    /// Scoring succeeded. Carries the raw LAS, MLAS and BLEX f-scores; the
    /// rendered message shows them rounded to the nearest 5%.
    Ok { las: f64, mlas: f64, blex: f64 },
    /// The gold file failed to load, whatever the reason.
    GoldNotLoaded,
    /// The system file contains a HEAD cycle.
    Cycle,
    /// A sentence of the system file has more than one root.
    MultipleRoots,
    /// Any other structural problem in the system file.
    FormatError,
    /// The system file could not be read at all.
    SystemNotLoaded,
    /// The system file loaded but contains no non-space characters.
    EmptySystem,
    /// The system token characters differ from the gold ones.
    CharacterMismatch {
        system_characters: usize,
        gold_characters: usize,
    },
    /// Scoring failed after validation passed. Only reachable through a
    /// scorer defect; kept as an explicit branch so a defect degrades one
    /// treebank instead of the whole run.
    Internal,
}

impl Status {
    /// Classifies a system-file loading failure. The gold-file path does not
    /// go through here: any gold failure is `GoldNotLoaded`.
    pub fn from_system_load_error(err: &UdError) -> Self {
        match err {
            UdError::Cycle => Status::Cycle,
            UdError::MultipleRoots => Status::MultipleRoots,
            UdError::Format(_) => Status::FormatError,
            UdError::Io(_) => Status::SystemNotLoaded,
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, Status::Ok { .. })
    }
}

impl Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ok { las, mlas, blex } => write!(
                f,
                "OK: Result F1 scores rounded to 5% are LAS={:.0}% MLAS={:.0}% BLEX={:.0}%",
                100.0 * round_score(*las),
                100.0 * round_score(*mlas),
                100.0 * round_score(*blex),
            ),
            Self::GoldNotLoaded => write!(f, "Error: Cannot load gold file"),
            Self::Cycle => write!(f, "Error: There is a cycle in generated CoNLL-U file"),
            Self::MultipleRoots => write!(
                f,
                "Error: There are multiple roots in a sentence in generated CoNLL-U file"
            ),
            Self::FormatError => write!(
                f,
                "Error: There is a format error (tabs, ID values, etc) in generated CoNLL-U file"
            ),
            Self::SystemNotLoaded => write!(f, "Error: Cannot open generated CoNLL-U file"),
            Self::EmptySystem => write!(f, "Error: The system file is empty"),
            Self::CharacterMismatch {
                system_characters,
                gold_characters,
            } => {
                // Integer truncation is deliberate: 2/3 reports as 66%.
                let percentage = match gold_characters {
                    0 => 0,
                    g => 100 * system_characters / g,
                };
                write!(
                    f,
                    "Error: The concatenation of tokens in gold file and in system file differ, \
                     system file has {} nonspace characters, which is approximately {}% of the gold file",
                    system_characters, percentage,
                )
            }
            Self::Internal => write!(
                f,
                "Error: Cannot evaluate generated CoNLL-U file, internal error"
            ),
        }
    }
}
