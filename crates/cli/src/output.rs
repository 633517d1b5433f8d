//! Report rendering

use std::io::{self, Write};

use bulkcheck_engine::RunReport;

fn flag(value: bool) -> &'static str {
    if value {
        "yes"
    } else {
        "no"
    }
}

/// Write a fixed-width summary table
pub fn write_table<W: Write>(out: &mut W, run: &RunReport) -> io::Result<()> {
    writeln!(out, "run {}  seed {}", run.run_id, run.seed)?;
    writeln!(
        out,
        "{:<5} {:<8} {:<5} {:<5} {:<8} {:>6} {:>10} {:>12} {:>7} {:>9}",
        "coe", "location", "first", "last", "scramble", "trials", "documents", "bytes", "faults", "ms"
    )?;
    for s in &run.scenarios {
        let o = &s.options;
        writeln!(
            out,
            "{:<5} {:<8} {:<5} {:<5} {:<8} {:>6} {:>10} {:>12} {:>7} {:>9}",
            flag(o.continue_on_error),
            o.fault_location.as_str(),
            flag(o.force_first_fault),
            flag(o.force_last_fault),
            flag(o.scramble_partition_key),
            s.trials,
            s.totals.documents,
            s.totals.bytes,
            s.totals.faults,
            s.elapsed_ms,
        )?;
    }
    writeln!(
        out,
        "{} scenarios, {} trials, {} documents, {} faults in {} ms",
        run.scenarios.len(),
        run.trials(),
        run.documents(),
        run.faults(),
        run.elapsed_ms
    )
}

/// Write the report as pretty JSON
pub fn write_json<W: Write>(out: &mut W, run: &RunReport) -> io::Result<()> {
    serde_json::to_writer_pretty(&mut *out, run)?;
    writeln!(out)
}
