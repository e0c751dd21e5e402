/**
This module renders a finished evaluation run into its two output surfaces:
the structured prototext report consumed by the benchmark infrastructure and
the fixed-width human-readable summary lines.
*/
use crate::harness::{EvaluationRun, STATUS_SUFFIX};
use std::io::{self, Write};

/// Writes one `measure{}` block per record, in record order, with no blank
/// lines between blocks.
pub fn write_prototext<W: Write>(mut sink: W, records: &[(String, String)]) -> io::Result<()> {
    for (key, value) in records {
        writeln!(
            sink,
            "measure{{\n  key: \"{}\"\n  value: \"{}\"\n}}",
            key, value
        )?;
    }
    Ok(())
}

/// Writes the per-treebank summary lines: one detailed line per treebank to
/// `out` (code, headline percentages, status) and one terse line to `err`
/// (code and status). Aggregate records carry no status suffix and are
/// skipped.
pub fn write_summaries<O: Write, E: Write>(
    run: &EvaluationRun,
    mut out: O,
    mut err: E,
) -> io::Result<()> {
    for (key, value) in &run.records {
        let Some(code) = key.strip_suffix(STATUS_SUFFIX) else {
            continue;
        };
        let headline = run.headline(code);
        writeln!(
            out,
            "{:<13} LAS={:10.6}% MLAS={:10.6}% BLEX={:10.6}% ({})",
            code,
            100.0 * headline.las,
            100.0 * headline.mlas,
            100.0 * headline.blex,
            value
        )?;
        writeln!(err, "{:<13} {}", code, value)?;
    }
    Ok(())
}
