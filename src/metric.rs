/**
This module defines the closed set of metrics reported by the harness. The
enumeration order is the order used everywhere in the output: the aggregate
records, the per-treebank records and the columns of the report all follow it.
*/
use enum_iterator::{all, Sequence};
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;

/// The thirteen metrics of the shared-task evaluation. The declaration order
/// is load-bearing: output records are emitted in this order.
#[derive(
    Debug, Hash, PartialEq, Eq, PartialOrd, Ord, Copy, Clone, Sequence, Serialize, Deserialize,
)]
pub enum Metric {
    Tokens,
    Sentences,
    Words,
    Upos,
    Xpos,
    UFeats,
    AllTags,
    Lemmas,
    Uas,
    Las,
    Clas,
    Mlas,
    Blex,
}

impl Metric {
    /// Returns every metric, in declaration order.
    pub fn all() -> impl Iterator<Item = Metric> {
        all::<Metric>()
    }

    /// The name used in report keys, e.g. `total-UFeats-F1`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Tokens => "Tokens",
            Self::Sentences => "Sentences",
            Self::Words => "Words",
            Self::Upos => "UPOS",
            Self::Xpos => "XPOS",
            Self::UFeats => "UFeats",
            Self::AllTags => "AllTags",
            Self::Lemmas => "Lemmas",
            Self::Uas => "UAS",
            Self::Las => "LAS",
            Self::Clas => "CLAS",
            Self::Mlas => "MLAS",
            Self::Blex => "BLEX",
        }
    }
}

impl Display for Metric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, PartialEq, PartialOrd, Eq, Ord, Clone)]
pub struct MetricParsingError(String);
impl Display for MetricParsingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Impossible to parse the string ({}) into a Metric", self.0)
    }
}
impl std::error::Error for MetricParsingError {}

impl FromStr for Metric {
    type Err = MetricParsingError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Metric::all()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| MetricParsingError(String::from(s)))
    }
}
