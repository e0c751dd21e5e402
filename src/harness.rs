/**
This module drives the evaluation of every treebank listed in the benchmark
metadata. Each treebank is loaded, validated, scored and classified in
isolation: a bad treebank produces an error status record and the loop moves
on, so a single malformed submission can never abort the whole batch.
*/
use crate::conllu::load_conllu_file;
use crate::metric::Metric;
use crate::score::{evaluate, Score};
use crate::status::Status;
use ahash::HashMap as AHashMap;
use serde::Deserialize;
use std::path::Path;
use tracing::debug;

/// Suffix of the per-treebank status record keys. Aggregate records never
/// carry it, which is how the renderer tells the two kinds apart.
pub const STATUS_SUFFIX: &str = "-Status";

/// One treebank of the benchmark, as listed in the truth directory's
/// `metadata.json`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TreebankEntry {
    pub lcode: String,
    pub tcode: String,
    pub goldfile: String,
    pub outfile: String,
}

impl TreebankEntry {
    /// The composite language-treebank code, e.g. `en_ewt`.
    pub fn code(&self) -> String {
        format!("{}_{}", self.lcode, self.tcode)
    }
}

/// Running per-metric F1 sums over the treebanks evaluated so far. The
/// averages divide by the number of *attempted* treebanks, not successful
/// ones: a treebank that fails to load contributes 0 to every average. This
/// is the competition's penalty policy, not an accident.
#[derive(Debug, Default)]
pub struct Accumulator {
    sums: AHashMap<Metric, f64>,
    attempted: usize,
}

impl Accumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts one treebank as attempted, whether or not it will score.
    pub fn count_attempt(&mut self) {
        self.attempted += 1;
    }

    pub fn add(&mut self, metric: Metric, f1: f64) {
        *self.sums.entry(metric).or_insert(0.0) += f1;
    }

    pub fn attempted(&self) -> usize {
        self.attempted
    }

    /// Mean F1 over all attempted treebanks. An empty run averages to 0
    /// rather than faulting.
    pub fn average(&self, metric: Metric) -> f64 {
        match self.attempted {
            0 => 0.0,
            n => self.sums.get(&metric).copied().unwrap_or(0.0) / n as f64,
        }
    }
}

/// The raw headline f-scores of one successful treebank, consumed by the
/// stdout summary line.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Headline {
    pub las: f64,
    pub mlas: f64,
    pub blex: f64,
}

/// The complete outcome of one evaluation run: the ordered key/value record
/// list (thirteen `total-*-F1` records first, then the per-treebank records
/// in processing order) and the per-treebank headline side table.
#[derive(Debug, Default)]
pub struct EvaluationRun {
    pub records: Vec<(String, String)>,
    headlines: AHashMap<String, Headline>,
}

impl EvaluationRun {
    /// Headline scores for a treebank code, 0 for treebanks that never
    /// scored.
    pub fn headline(&self, code: &str) -> Headline {
        self.headlines.get(code).copied().unwrap_or_default()
    }
}

// Terminal outcome of a single treebank: either a failure status or the full
// score map.
enum Outcome {
    Failure(Status),
    Scored(AHashMap<Metric, Score>),
}

fn evaluate_entry(entry: &TreebankEntry, truth_dir: &Path, system_dir: &Path) -> Outcome {
    let gold = match load_conllu_file(truth_dir.join(&entry.goldfile)) {
        Ok(corpus) => corpus,
        Err(err) => {
            debug!(code = %entry.code(), %err, "gold file failed to load");
            return Outcome::Failure(Status::GoldNotLoaded);
        }
    };
    let system = match load_conllu_file(system_dir.join(&entry.outfile)) {
        Ok(corpus) => corpus,
        Err(err) => {
            debug!(code = %entry.code(), %err, "system file failed to load");
            return Outcome::Failure(Status::from_system_load_error(&err));
        }
    };
    if system.is_empty() {
        return Outcome::Failure(Status::EmptySystem);
    }
    if system.characters != gold.characters {
        return Outcome::Failure(Status::CharacterMismatch {
            system_characters: system.characters.len(),
            gold_characters: gold.characters.len(),
        });
    }
    match evaluate(&gold, &system) {
        Ok(scores) => Outcome::Scored(scores),
        // Unreachable unless the scorer disagrees with the validation above;
        // degrade this treebank only.
        Err(err) => {
            debug!(code = %entry.code(), %err, "scoring failed after validation");
            Outcome::Failure(Status::Internal)
        }
    }
}

/// Evaluates every metadata entry in order and assembles the final record
/// list. Never fails: each treebank's problems are folded into its status
/// record.
pub fn evaluate_treebanks(
    entries: &[TreebankEntry],
    truth_dir: &Path,
    system_dir: &Path,
) -> EvaluationRun {
    let mut accumulator = Accumulator::new();
    let mut run = EvaluationRun::default();

    for entry in entries {
        accumulator.count_attempt();
        let code = entry.code();
        match evaluate_entry(entry, truth_dir, system_dir) {
            Outcome::Failure(status) => {
                run.records
                    .push((format!("{}{}", code, STATUS_SUFFIX), status.to_string()));
            }
            Outcome::Scored(scores) => {
                let headline = Headline {
                    las: scores[&Metric::Las].f1,
                    mlas: scores[&Metric::Mlas].f1,
                    blex: scores[&Metric::Blex].f1,
                };
                let status = Status::Ok {
                    las: headline.las,
                    mlas: headline.mlas,
                    blex: headline.blex,
                };
                run.records
                    .push((format!("{}{}", code, STATUS_SUFFIX), status.to_string()));
                for metric in Metric::all() {
                    let f1 = scores[&metric].f1;
                    run.records
                        .push((format!("{}-{}-F1", code, metric), format!("{:.9}", 100.0 * f1)));
                    accumulator.add(metric, f1);
                }
                run.headlines.insert(code, headline);
            }
        }
    }

    // Aggregates go first, in metric declaration order.
    let mut records: Vec<(String, String)> = Metric::all()
        .map(|metric| {
            (
                format!("total-{}-F1", metric),
                format!("{:.9}", 100.0 * accumulator.average(metric)),
            )
        })
        .collect();
    records.append(&mut run.records);
    run.records = records;
    run
}
