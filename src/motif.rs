use super::crispr::{POST_CRISPR_SUFFIX, PRE_CRISPR_SUFFIX};
use super::error::SeqlabResult;
use super::{fasta, myio};
use bio::io::fasta::Record;
use linear_map::LinearMap;
use rayon::prelude::*;
use std::fs;
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

pub const TOP_MOTIFS_SUFFIX: &str = "_topmotifs.fasta";
pub const MOTIF_COUNT_SUFFIX: &str = "_motif_count.txt";

/// Motifs in the order of the motif file, with their counts and the records they hit.
#[derive(Debug, Default)]
pub struct MotifCounts<'a> {
    pub counts: LinearMap<String, u64>,
    pub hits: LinearMap<String, Vec<&'a Record>>,
}

impl<'a> MotifCounts<'a> {
    /// Motifs sorted by count, largest first. Ties keep the motif file order.
    pub fn sorted(&self) -> Vec<(&str, u64)> {
        let mut v: Vec<(&str, u64)> = self
            .counts
            .iter()
            .map(|(m, c)| (m.as_str(), *c))
            .collect();
        v.sort_by(|a, b| b.1.cmp(&a.1));
        v
    }

    pub fn top(&self, n: usize) -> Vec<&str> {
        self.sorted().into_iter().take(n).map(|(m, _)| m).collect()
    }
}

/// Read one motif per line, ignoring blank lines and repeats of an earlier motif.
/// # Example
/// ```
/// let motifs = seqlab::motif::read_motifs(".test/motifs.txt").unwrap();
/// assert_eq!(motifs, vec!["ACGT", "GGCC", "TTT", "AAAA"]);
/// ```
pub fn read_motifs<P: AsRef<Path>>(path: P) -> SeqlabResult<Vec<String>> {
    let mut motifs = Vec::new();
    for line in myio::reader(path)?.lines() {
        let line = line?;
        let motif = line.trim();
        if !motif.is_empty() && !motifs.iter().any(|m| m == motif) {
            motifs.push(motif.to_string());
        }
    }
    Ok(motifs)
}

/// Count non-overlapping occurrences of every motif across all records.
/// # Example
/// ```
/// use bio::io::fasta::Record;
/// let recs = vec![
///     Record::with_attrs("g1", None, b"AAAAAA"),
///     Record::with_attrs("g2", None, b"CCAAC"),
/// ];
/// let motifs = vec!["AA".to_string(), "CC".to_string(), "GG".to_string()];
/// let mc = seqlab::motif::count_motifs(&recs, &motifs).unwrap();
/// assert_eq!(mc.counts["AA"], 4);
/// assert_eq!(mc.counts["CC"], 1);
/// assert_eq!(mc.hits["GG"].len(), 0);
/// assert_eq!(mc.top(1), vec!["AA"]);
/// ```
pub fn count_motifs<'a>(records: &'a [Record], motifs: &[String]) -> SeqlabResult<MotifCounts<'a>> {
    let mut mc = MotifCounts::default();
    for motif in motifs {
        mc.counts.insert(motif.clone(), 0);
        mc.hits.insert(motif.clone(), Vec::new());
    }
    for rec in records {
        let seq = fasta::seq_str(rec)?;
        for (motif, count) in mc.counts.iter_mut() {
            let n = seq.matches(motif.as_str()).count() as u64;
            if n > 0 {
                *count += n;
                if let Some(hits) = mc.hits.get_mut(motif) {
                    hits.push(rec);
                }
            }
        }
    }
    Ok(mc)
}

fn write_counts<P: AsRef<Path>>(path: P, counts: &[(&str, u64)]) -> SeqlabResult<()> {
    let mut out = myio::writer(path)?;
    for (motif, count) in counts {
        writeln!(out, "{} {}", motif, count)?;
    }
    out.flush()?;
    Ok(())
}

/// Count motifs in a single fasta and write `<motif_dir>/<motif>.txt` for each of them.
pub fn run_motif_count(
    fasta_file: &Path,
    motifs_file: &Path,
    motif_dir: &Path,
    count_file: &Path,
    force: bool,
) -> SeqlabResult<()> {
    myio::check_inputs(&[fasta_file, motifs_file])?;
    myio::prepare_outputs(&[motif_dir, count_file], force)?;
    fs::create_dir_all(motif_dir)?;

    let motifs = read_motifs(motifs_file)?;
    let records = fasta::read_fasta(fasta_file)?;
    log::info!(
        "Searching {} records for {} motifs",
        records.len(),
        motifs.len()
    );
    let mc = count_motifs(&records, &motifs)?;

    let in_file_order: Vec<(&str, u64)> = mc.counts.iter().map(|(m, c)| (m.as_str(), *c)).collect();
    write_counts(count_file, &in_file_order)?;

    for (motif, hits) in mc.hits.iter() {
        let mut out = fasta::writer(motif_dir.join(format!("{}.txt", motif)))?;
        for rec in hits {
            out.write_record(rec)?;
        }
        out.flush()?;
    }
    Ok(())
}

/// Two passes over one exome: count all motifs, then keep records holding a top motif.
fn top_motifs_for_fasta(
    fasta_file: &Path,
    motifs: &[String],
    output_dir: &Path,
    top_n: usize,
) -> SeqlabResult<Vec<String>> {
    let exome = myio::sample_name(fasta_file);
    log::info!("fasta: {}", fasta_file.display());
    let records = fasta::read_fasta(fasta_file)?;
    let mc = count_motifs(&records, motifs)?;

    let sorted = mc.sorted();
    write_counts(output_dir.join(format!("{}{}", exome, MOTIF_COUNT_SUFFIX)), &sorted)?;

    let top = mc.top(top_n);
    log::debug!("{} top motifs: {:?}", exome, &sorted[..top.len()]);
    let mut out = fasta::writer(output_dir.join(format!("{}{}", exome, TOP_MOTIFS_SUFFIX)))?;
    for rec in &records {
        let seq = fasta::seq_str(rec)?;
        if top.iter().any(|m| seq.contains(m)) {
            out.write_record(rec)?;
        }
    }
    out.flush()?;
    Ok(top.into_iter().map(str::to_string).collect())
}

/// For every `*.fasta` in `fasta_dir` write its sorted motif counts and the records
/// containing one of its `top_n` motifs. Returns the top motifs of each exome.
pub fn run_top_motifs(
    fasta_dir: &Path,
    motifs_file: &Path,
    output_dir: Option<&Path>,
    top_n: usize,
    force: bool,
) -> SeqlabResult<Vec<(String, Vec<String>)>> {
    myio::check_dirs(&[fasta_dir])?;
    myio::check_inputs(&[motifs_file])?;
    let output_dir: PathBuf = match output_dir {
        Some(dir) => {
            myio::prepare_outputs(&[dir], force)?;
            fs::create_dir_all(dir)?;
            dir.to_path_buf()
        }
        None => fasta_dir.to_path_buf(),
    };
    let motifs = read_motifs(motifs_file)?;
    let fastas: Vec<PathBuf> = myio::files_with_suffix(fasta_dir, ".fasta")?
        .into_iter()
        .filter(|f| {
            let name = f.to_string_lossy();
            ![TOP_MOTIFS_SUFFIX, PRE_CRISPR_SUFFIX, POST_CRISPR_SUFFIX]
                .iter()
                .any(|suffix| name.ends_with(suffix))
        })
        .collect();

    fastas
        .par_iter()
        .map(|f| {
            let top = top_motifs_for_fasta(f, &motifs, &output_dir, top_n)?;
            Ok((myio::sample_name(f), top))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_are_non_overlapping() {
        let recs = vec![Record::with_attrs("g", None, b"AAAA")];
        let mc = count_motifs(&recs, &["AA".to_string(), "AAA".to_string()]).unwrap();
        assert_eq!(mc.counts["AA"], 2);
        assert_eq!(mc.counts["AAA"], 1);
    }

    #[test]
    fn test_repeated_motif_counted_once() {
        let recs = vec![Record::with_attrs("g", None, b"ACGTACGT")];
        let mc = count_motifs(&recs, &["ACGT".to_string(), "ACGT".to_string()]).unwrap();
        assert_eq!(mc.counts.len(), 1);
        assert_eq!(mc.counts["ACGT"], 2);
        assert_eq!(mc.hits["ACGT"].len(), 1);

        let dir = tempfile::tempdir().unwrap();
        let motifs_file = dir.path().join("motifs.txt");
        fs::write(&motifs_file, "TTT\nACGT\n\nTTT\nGGCC\nACGT\n").unwrap();
        assert_eq!(read_motifs(&motifs_file).unwrap(), vec!["TTT", "ACGT", "GGCC"]);
    }

    #[test]
    fn test_ties_keep_file_order() {
        let recs = vec![Record::with_attrs("g", None, b"ACGTTT")];
        let motifs: Vec<String> = ["GG", "TT", "AC", "CG"].iter().map(|s| s.to_string()).collect();
        let mc = count_motifs(&recs, &motifs).unwrap();
        assert_eq!(mc.top(3), vec!["TT", "AC", "CG"]);
    }

    #[test]
    fn test_motif_count_outputs() {
        let dir = tempfile::tempdir().unwrap();
        let motif_dir = dir.path().join("motifs");
        let count_file = dir.path().join("count.txt");
        run_motif_count(
            Path::new(".test/exome.fasta"),
            Path::new(".test/motifs.txt"),
            &motif_dir,
            &count_file,
            false,
        )
        .unwrap();
        let counts = fs::read_to_string(&count_file).unwrap();
        assert_eq!(counts, "ACGT 3\nGGCC 1\nTTT 2\nAAAA 0\n");
        let acgt = fs::read_to_string(motif_dir.join("ACGT.txt")).unwrap();
        assert_eq!(acgt.matches('>').count(), 2);
        assert_eq!(fs::read_to_string(motif_dir.join("AAAA.txt")).unwrap(), "");

        // second run without force refuses to clobber
        assert!(run_motif_count(
            Path::new(".test/exome.fasta"),
            Path::new(".test/motifs.txt"),
            &motif_dir,
            &count_file,
            false,
        )
        .is_err());
    }

    #[test]
    fn test_top_motifs_per_exome() {
        let input = tempfile::tempdir().unwrap();
        fs::copy(".test/exome.fasta", input.path().join("FOX.fasta")).unwrap();
        let out = input.path().join("out");
        let tops = run_top_motifs(
            input.path(),
            Path::new(".test/motifs.txt"),
            Some(&out),
            1,
            false,
        )
        .unwrap();
        assert_eq!(tops, vec![("FOX".to_string(), vec!["ACGT".to_string()])]);
        let counts = fs::read_to_string(out.join("FOX_motif_count.txt")).unwrap();
        assert_eq!(counts.lines().next(), Some("ACGT 3"));
        let top = fasta::read_fasta(out.join("FOX_topmotifs.fasta")).unwrap();
        assert_eq!(top.len(), 2);
    }

    #[test]
    fn test_top_motifs_counts_reset_per_exome() {
        let input = tempfile::tempdir().unwrap();
        fs::write(
            input.path().join("HEN.fasta"),
            ">h1\nACGTACGTACGT\n>h2\nGGCCA\n",
        )
        .unwrap();
        fs::write(
            input.path().join("OWL.fasta"),
            ">o1\nTTTCTTT\n>o2\nACGTC\n",
        )
        .unwrap();
        let out = input.path().join("out");
        let tops = run_top_motifs(
            input.path(),
            Path::new(".test/motifs.txt"),
            Some(&out),
            1,
            false,
        )
        .unwrap();
        assert_eq!(
            tops,
            vec![
                ("HEN".to_string(), vec!["ACGT".to_string()]),
                ("OWL".to_string(), vec!["TTT".to_string()]),
            ]
        );
        let hen = fs::read_to_string(out.join("HEN_motif_count.txt")).unwrap();
        assert_eq!(hen, "ACGT 3\nGGCC 1\nTTT 0\nAAAA 0\n");
        let owl = fs::read_to_string(out.join("OWL_motif_count.txt")).unwrap();
        assert_eq!(owl, "TTT 2\nACGT 1\nGGCC 0\nAAAA 0\n");
        let owl_top = fasta::read_fasta(out.join("OWL_topmotifs.fasta")).unwrap();
        assert_eq!(owl_top.len(), 1);
        assert_eq!(owl_top[0].id(), "o1");
    }
}
