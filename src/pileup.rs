use super::error::SeqlabResult;
use super::myio;
use rust_htslib::{bam, bam::Read};
use std::fmt;
use std::io::Write;
use std::path::Path;
use std::str;

/// Bases in the order frequencies are reported.
pub const REPORT_ORDER: [u8; 4] = [b'A', b'C', b'T', b'G'];

/// Base counts of one pileup column.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BaseCounts {
    pub contig: String,
    /// 0-based reference position.
    pub pos: u32,
    /// Reads overlapping the column, deletions included.
    pub depth: u32,
    pub a: u64,
    pub c: u64,
    pub g: u64,
    pub t: u64,
    pub n: u64,
}

impl BaseCounts {
    pub fn add(&mut self, base: u8) {
        match base.to_ascii_uppercase() {
            b'A' => self.a += 1,
            b'C' => self.c += 1,
            b'G' => self.g += 1,
            b'T' => self.t += 1,
            b'N' => self.n += 1,
            _ => log::warn!("Seq character not recognized: {}", base as char),
        }
    }

    pub fn count(&self, base: u8) -> u64 {
        match base.to_ascii_uppercase() {
            b'A' => self.a,
            b'C' => self.c,
            b'G' => self.g,
            b'T' => self.t,
            b'N' => self.n,
            _ => 0,
        }
    }

    /// Number of different bases seen in the column.
    pub fn distinct(&self) -> usize {
        [self.a, self.c, self.g, self.t, self.n]
            .iter()
            .filter(|&&c| c > 0)
            .count()
    }

    /// # Example
    /// ```
    /// use seqlab::pileup::BaseCounts;
    /// let mut col = BaseCounts { depth: 4, ..Default::default() };
    /// for b in b"AAAG" {
    ///     col.add(*b);
    /// }
    /// assert!(col.is_polymorphic());
    /// assert_eq!(col.frequency(b'G'), 0.25);
    /// ```
    pub fn is_polymorphic(&self) -> bool {
        self.distinct() > 1
    }

    pub fn frequency(&self, base: u8) -> f64 {
        if self.depth == 0 {
            return 0.0;
        }
        self.count(base) as f64 / self.depth as f64
    }

    /// Frequencies of A, C, T and G, in that order.
    pub fn frequencies(&self) -> [(char, f64); 4] {
        REPORT_ORDER.map(|b| (b as char, self.frequency(b)))
    }
}

impl fmt::Display for BaseCounts {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}",
            self.contig,
            self.pos + 1,
            self.depth,
            self.a,
            self.c,
            self.g,
            self.t,
            self.n
        )
    }
}

/// Count A, C, G, T and N at every covered position of an alignment file.
/// Deletions and reference skips contribute to depth only.
pub fn pileup_counts<P: AsRef<Path>>(path: P) -> SeqlabResult<Vec<BaseCounts>> {
    let path = path.as_ref();
    log::debug!("Reading pileup from {}", path.display());
    let mut bam = bam::Reader::from_path(path)?;
    let header = bam.header().clone();
    let mut columns = Vec::new();
    for p in bam.pileup() {
        let pileup = p?;
        let mut counts = BaseCounts {
            contig: str::from_utf8(header.tid2name(pileup.tid()))?.to_string(),
            pos: pileup.pos(),
            depth: pileup.depth(),
            ..Default::default()
        };
        for aln in pileup.alignments() {
            if aln.is_del() || aln.is_refskip() {
                continue;
            }
            if let Some(qpos) = aln.qpos() {
                counts.add(aln.record().seq()[qpos]);
            }
        }
        log::trace!("{}", counts);
        columns.push(counts);
    }
    Ok(columns)
}

/// Pileup columns where more than one base was observed.
pub fn polymorphic_sites<P: AsRef<Path>>(path: P) -> SeqlabResult<Vec<BaseCounts>> {
    Ok(pileup_counts(path)?
        .into_iter()
        .filter(BaseCounts::is_polymorphic)
        .collect())
}

pub fn write_sites<W: Write>(out: &mut W, sites: &[BaseCounts]) -> SeqlabResult<()> {
    writeln!(out, "#contig\tpos\tdepth\tA\tC\tG\tT\tN")?;
    for site in sites {
        writeln!(out, "{}", site)?;
    }
    Ok(())
}

/// `snps` subcommand: print the polymorphic columns of a BAM.
pub fn run_snps(bam: &Path, output: &Path) -> SeqlabResult<usize> {
    myio::check_inputs(&[bam])?;
    let sites = polymorphic_sites(bam)?;
    let mut out = myio::writer(output)?;
    write_sites(&mut out, &sites)?;
    out.flush()?;
    Ok(sites.len())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::path::PathBuf;

    /// Reference `ref` (16 bp) with three reads. Position 4 (1-based 5) is `A` in two
    /// reads and `G` in one, position 6 is a deletion in the third read.
    pub(crate) const SAM: &str = "@HD\tVN:1.6\tSO:coordinate
@SQ\tSN:ref\tLN:16
r1\t0\tref\t1\t60\t8M\t*\t0\t0\tACGTACGT\tIIIIIIII
r2\t0\tref\t1\t60\t8M\t*\t0\t0\tACGTGCGT\tIIIIIIII
r3\t0\tref\t3\t60\t4M1D4M\t*\t0\t0\tGTACTTAC\tIIIIIIII
";

    pub(crate) fn write_bam(dir: &Path, name: &str) -> PathBuf {
        let sam = dir.join(format!("{}.sam", name));
        std::fs::write(&sam, SAM).unwrap();
        let bam_path = dir.join(format!("{}.bam", name));
        let mut reader = bam::Reader::from_path(&sam).unwrap();
        let header = bam::Header::from_template(reader.header());
        let mut writer = bam::Writer::from_path(&bam_path, &header, bam::Format::Bam).unwrap();
        for rec in reader.records() {
            writer.write(&rec.unwrap()).unwrap();
        }
        bam_path
    }

    #[test]
    fn test_pileup_counts() {
        let dir = tempfile::tempdir().unwrap();
        let bam = write_bam(dir.path(), "S1");
        let cols = pileup_counts(&bam).unwrap();
        assert_eq!(cols[0].contig, "ref");
        assert_eq!(cols[0].pos, 0);
        assert_eq!(cols[0].a, 2);

        let site = cols.iter().find(|c| c.pos == 4).unwrap();
        assert_eq!(site.depth, 3);
        assert_eq!((site.a, site.g), (2, 1));

        let del = cols.iter().find(|c| c.pos == 6).unwrap();
        assert_eq!(del.depth, 3);
        assert_eq!(del.g, 2);
        assert_eq!(del.distinct(), 1);
    }

    #[test]
    fn test_only_polymorphic_sites_are_written() {
        let dir = tempfile::tempdir().unwrap();
        let bam = write_bam(dir.path(), "S1");
        let out = dir.path().join("snps.tsv");
        assert_eq!(run_snps(&bam, &out).unwrap(), 1);
        assert_eq!(
            std::fs::read_to_string(&out).unwrap(),
            "#contig\tpos\tdepth\tA\tC\tG\tT\tN\nref\t5\t3\t2\t0\t1\t0\t0\n"
        );
    }

    #[test]
    fn test_frequencies_in_report_order() {
        let col = BaseCounts {
            depth: 4,
            a: 1,
            c: 0,
            g: 2,
            t: 1,
            ..Default::default()
        };
        assert_eq!(
            col.frequencies(),
            [('A', 0.25), ('C', 0.0), ('T', 0.25), ('G', 0.5)]
        );
    }
}
