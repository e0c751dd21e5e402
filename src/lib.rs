/*!
This library is a batch evaluation harness for multi-treebank Universal
Dependencies parsing benchmarks, in the style of the CoNLL 2018 shared task.
Given a truth directory, a system-output directory and an output directory,
it scores every treebank listed in the truth `metadata.json`, averages
thirteen fixed metrics over all attempted treebanks and renders the results
as a prototext report plus human-readable summary lines.

# Evaluation model
* Each treebank is evaluated in isolation. A treebank whose files are
    missing, malformed or mismatched gets an error status record; it never
    aborts the run.
* The aggregate `total-<metric>-F1` figures divide by the number of
    *attempted* treebanks. A failing treebank therefore counts as 0 in every
    average. This is the competition's penalty policy.
* The headline LAS, MLAS and BLEX figures in the status line are rounded to
    the nearest 5 percentage points; the per-metric records keep nine decimal
    places.

# Components
* [`conllu`]: the CoNLL-U loader and its structural validation (single root
    per sentence, acyclic HEAD graph, ten-column format).
* [`score`]: span-based alignment scoring of the thirteen metrics and the
    5% quantization of headline scores.
* [`status`]: the closed taxonomy of per-treebank outcomes and their
    human-readable messages.
* [`harness`]: the orchestration loop and per-metric accumulation.
* [`report`]: the prototext and summary-line renderers.
*/

pub mod conllu;
pub mod harness;
pub mod metric;
pub mod report;
pub mod score;
pub mod status;

pub use conllu::{load_conllu_file, parse_conllu, Corpus, UdError};
pub use harness::{evaluate_treebanks, Accumulator, EvaluationRun, TreebankEntry};
pub use metric::Metric;
pub use report::{write_prototext, write_summaries};
pub use score::{evaluate, round_score, Score};
pub use status::Status;

use std::error::Error;
use std::fmt::Display;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use tracing::info;

/// Fatal, run-level failure: the benchmark infrastructure itself is broken
/// (unreadable metadata, unwritable output directory). Per-treebank problems
/// never surface here.
#[derive(Debug)]
pub enum HarnessError {
    Metadata(serde_json::Error),
    Io(io::Error),
}

impl Display for HarnessError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Metadata(err) => write!(f, "Cannot parse metadata.json: {}", err),
            Self::Io(err) => write!(f, "I/O failure outside treebank evaluation: {}", err),
        }
    }
}
impl Error for HarnessError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Metadata(err) => Some(err),
            Self::Io(err) => Some(err),
        }
    }
}
impl From<io::Error> for HarnessError {
    fn from(value: io::Error) -> Self {
        Self::Io(value)
    }
}
impl From<serde_json::Error> for HarnessError {
    fn from(value: serde_json::Error) -> Self {
        Self::Metadata(value)
    }
}

/// Reads the treebank list from `<truth_dir>/metadata.json`.
pub fn load_metadata(truth_dir: &Path) -> Result<Vec<TreebankEntry>, HarnessError> {
    let file = File::open(truth_dir.join("metadata.json"))?;
    let entries = serde_json::from_reader(file)?;
    Ok(entries)
}

/// Main entrypoint of the harness: evaluates every treebank of the benchmark
/// and writes `<output_dir>/evaluation.prototext` plus the summary lines to
/// the given sinks (stdout and stderr in the binary). Only infrastructure
/// failures return an error.
pub fn run_evaluation<O: Write, E: Write>(
    truth_dir: &Path,
    system_dir: &Path,
    output_dir: &Path,
    out: O,
    err: E,
) -> Result<(), HarnessError> {
    let entries = load_metadata(truth_dir)?;
    info!(treebanks = entries.len(), "starting evaluation run");

    let run = evaluate_treebanks(&entries, truth_dir, system_dir);

    let prototext = File::create(output_dir.join("evaluation.prototext"))?;
    let mut prototext = BufWriter::new(prototext);
    write_prototext(&mut prototext, &run.records)?;
    prototext.flush()?;

    write_summaries(&run, out, err)?;
    info!(records = run.records.len(), "evaluation run finished");
    Ok(())
}
