use super::error::SeqlabResult;
use super::myio;
use super::samples::SampleSheet;
use super::variants::VariantCall;
use std::collections::HashMap;
use std::io::Write;
use std::path::Path;

pub const DEFAULT_REPORT: &str = "report.txt";

/// Write the per-color summary, a blank line, then one line per sample variant.
pub fn write_report<W: Write>(
    out: &mut W,
    variants: &HashMap<String, Vec<VariantCall>>,
    sheet: &SampleSheet,
) -> SeqlabResult<()> {
    for (color, names) in sheet.by_color() {
        let mut seen: Vec<(u32, char, char)> = Vec::new();
        for call in names.iter().filter_map(|n| variants.get(n)).flatten() {
            let key = (call.position, call.wildtype, call.mutation);
            if !seen.contains(&key) {
                seen.push(key);
            }
        }
        for (position, wildtype, mutation) in seen {
            writeln!(
                out,
                "The {} mold was caused by a mutation in position {}.  The wildtype base was {} and the mutation was {}",
                color, position, wildtype, mutation
            )?;
        }
    }
    writeln!(out)?;

    for name in sheet.names() {
        let color = sheet.color(name).unwrap_or_default();
        for call in variants.get(name).into_iter().flatten() {
            writeln!(
                out,
                "Sample {} had a {} mold, {} reads, and had {:.0}% of the reads at position {} had the mutation {}",
                name,
                color,
                call.nreads,
                call.mutation_frequency() * 100.0,
                call.position,
                call.mutation
            )?;
        }
    }
    Ok(())
}

pub fn run_report(
    report: &Path,
    variants: &HashMap<String, Vec<VariantCall>>,
    sheet: &SampleSheet,
) -> SeqlabResult<()> {
    let mut out = myio::writer(report)?;
    write_report(&mut out, variants, sheet)?;
    out.flush()?;
    log::info!("wrote {}", report.display());
    Ok(())
}
