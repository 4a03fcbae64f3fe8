use super::error::{Error, SeqlabResult};
use super::myio;
use super::samples::SampleSheet;
use lazy_static::lazy_static;
use linear_map::LinearMap;
use needletail::parse_fastx_file;
use needletail::parser::{write_fastq, Format, LineEnding};
use num_format::{Locale, ToFormattedString};
use regex::bytes::Regex;
use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

pub const TRIMMED_SUFFIX: &str = "_trimmed.fastq";
pub const DEFAULT_FASTQS_DIR: &str = "fastqs";

lazy_static! {
    // two consecutive low quality calls end the usable part of a read
    static ref LOW_QUAL: Regex = Regex::new(r"[DF]{2}").unwrap();
}

/// Length of a read after quality trimming.
/// # Example
/// ```
/// use seqlab::demux::trim_point;
/// assert_eq!(trim_point(b"IIIIIDDIII"), 5);
/// assert_eq!(trim_point(b"IIDFII"), 2);
/// assert_eq!(trim_point(b"IIDIFI"), 6);
/// ```
pub fn trim_point(qual: &[u8]) -> usize {
    LOW_QUAL.find(qual).map_or(qual.len(), |m| m.start())
}

/// Read counts of a demultiplexing run.
#[derive(Debug, Default)]
pub struct DemuxStats {
    /// Reads written per sample, in sample sheet order.
    pub assigned: LinearMap<String, u64>,
    /// Reads skipped per unknown barcode.
    pub unassigned: HashMap<String, u64>,
}

impl DemuxStats {
    pub fn total_unassigned(&self) -> u64 {
        self.unassigned.values().sum()
    }

    fn log(&self) {
        for (name, n) in self.assigned.iter() {
            log::info!("{}: {} reads", name, n.to_formatted_string(&Locale::en));
        }
        if !self.unassigned.is_empty() {
            log::warn!(
                "{} reads across {} unknown barcodes were skipped",
                self.total_unassigned().to_formatted_string(&Locale::en),
                self.unassigned.len()
            );
        }
    }
}

pub fn trimmed_path(fastqs_dir: &Path, name: &str) -> PathBuf {
    fastqs_dir.join(format!("{}{}", name, TRIMMED_SUFFIX))
}

/// Split `fastq` by barcode into `<fastqs_dir>/<name>_trimmed.fastq`, removing the
/// barcode and everything from the first pair of `D`/`F` quality calls onwards.
pub fn demultiplex(fastq: &Path, sheet: &SampleSheet, fastqs_dir: &Path) -> SeqlabResult<DemuxStats> {
    myio::check_inputs(&[fastq])?;
    fs::create_dir_all(fastqs_dir)?;

    let mut outs: HashMap<String, Box<dyn Write>> = HashMap::new();
    let mut stats = DemuxStats::default();
    for name in sheet.names() {
        outs.insert(name.to_string(), myio::writer(trimmed_path(fastqs_dir, name))?);
        stats.assigned.insert(name.to_string(), 0);
    }

    let mut reader = parse_fastx_file(fastq)?;
    let mut rec_num = 0;
    while let Some(record) = reader.next() {
        let rec = record?;
        rec_num += 1;
        if !matches!(rec.format(), Format::Fastq) {
            return Err(Error::NotFastq(fastq.display().to_string()));
        }
        let seq = rec.seq();
        let qual = rec
            .qual()
            .ok_or_else(|| Error::NotFastq(fastq.display().to_string()))?;
        if seq.len() < sheet.bc_length {
            log::debug!("read {} is shorter than the barcode", rec_num);
            *stats.unassigned.entry(String::from_utf8_lossy(&seq).into_owned()).or_insert(0) += 1;
            continue;
        }

        let (barcode, insert) = seq.split_at(sheet.bc_length);
        let Some(name) = sheet.name_for_barcode(barcode) else {
            *stats
                .unassigned
                .entry(String::from_utf8_lossy(barcode).into_owned())
                .or_insert(0) += 1;
            continue;
        };
        let insert_qual = &qual[sheet.bc_length..];
        let keep = trim_point(insert_qual);
        if let Some(out) = outs.get_mut(name) {
            write_fastq(
                rec.id(),
                &insert[..keep],
                Some(&insert_qual[..keep]),
                out,
                LineEnding::Unix,
            )?;
        }
        if let Some(n) = stats.assigned.get_mut(name) {
            *n += 1;
        }
        log::trace!("read {} -> {}", rec_num, name);
    }

    for out in outs.values_mut() {
        out.flush()?;
    }
    stats.log();
    Ok(stats)
}

/// `demux` subcommand: validate paths, then split the reads.
pub fn run_demux(fastq: &Path, samples: &Path, fastqs_dir: &Path, force: bool) -> SeqlabResult<DemuxStats> {
    myio::check_inputs(&[fastq, samples])?;
    myio::prepare_outputs(&[fastqs_dir], force)?;
    let sheet = SampleSheet::from_path(samples)?;
    demultiplex(fastq, &sheet, fastqs_dir)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_demux_fixture() {
        let dir = tempfile::tempdir().unwrap();
        let fastqs = dir.path().join("fastqs");
        let stats = run_demux(
            Path::new(".test/reads.fastq"),
            Path::new(".test/samples.txt"),
            &fastqs,
            false,
        )
        .unwrap();
        assert_eq!(stats.assigned["Tim"], 2);
        assert_eq!(stats.assigned["Kristen"], 1);
        assert_eq!(stats.assigned["Laura"], 0);
        assert_eq!(stats.unassigned["AAAAA"], 1);

        let tim = fs::read_to_string(trimmed_path(&fastqs, "Tim")).unwrap();
        assert_eq!(tim, "@read1\nACGTA\n+\nIIIII\n@read4\nGG\n+\nII\n");
        // barcode qualities never trigger trimming
        let kristen = fs::read_to_string(trimmed_path(&fastqs, "Kristen")).unwrap();
        assert_eq!(kristen, "@read2\nTTTTGGGG\n+\nIIIIIIII\n");
        assert_eq!(fs::read_to_string(trimmed_path(&fastqs, "Laura")).unwrap(), "");
    }

    #[test]
    fn test_demux_gzipped_fastq() {
        let dir = tempfile::tempdir().unwrap();
        let gz = dir.path().join("reads.fastq.gz");
        {
            let mut w = myio::writer(&gz).unwrap();
            w.write_all(&fs::read(".test/reads.fastq").unwrap()).unwrap();
            w.flush().unwrap();
        }
        let fastqs = dir.path().join("fastqs");
        let stats = run_demux(&gz, Path::new(".test/samples.txt"), &fastqs, false).unwrap();
        assert_eq!(stats.assigned["Tim"], 2);
        assert_eq!(stats.unassigned["AAAAA"], 1);
        let tim = fs::read_to_string(trimmed_path(&fastqs, "Tim")).unwrap();
        assert_eq!(tim, "@read1\nACGTA\n+\nIIIII\n@read4\nGG\n+\nII\n");
    }

    #[test]
    fn test_fasta_input_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let sheet = SampleSheet::from_path(".test/samples.txt").unwrap();
        let err = demultiplex(Path::new(".test/exome.fasta"), &sheet, dir.path()).unwrap_err();
        assert!(matches!(err, Error::NotFastq(_)));
    }

    #[test]
    fn test_truncated_fastq_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let bad = dir.path().join("bad.fastq");
        fs::write(&bad, "@r1\nTACGAACGT\n+\nIII\n").unwrap();
        let sheet = SampleSheet::from_path(".test/samples.txt").unwrap();
        assert!(demultiplex(&bad, &sheet, &dir.path().join("out")).is_err());
    }
}
