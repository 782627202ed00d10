use std::io::Write;

use super::Report;
use crate::domain::GaugeResult;

/// Pretty-printed JSON of the whole report
pub fn write_json<W: Write>(report: &Report, mut w: W) -> GaugeResult<()> {
    serde_json::to_writer_pretty(&mut w, report)?;
    writeln!(w)?;
    Ok(())
}
