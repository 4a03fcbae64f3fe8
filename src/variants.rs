use super::align::SORTED_BAM_SUFFIX;
use super::error::SeqlabResult;
use super::pileup::{self, BaseCounts, REPORT_ORDER};
use super::{fasta, myio};
use rayon::prelude::*;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// A polymorphic pileup column compared against the reference.
#[derive(Debug, Clone, PartialEq)]
pub struct VariantCall {
    pub contig: String,
    /// 1-based reference position.
    pub position: u32,
    pub nreads: u32,
    pub wildtype: char,
    pub mutation: char,
    /// Frequencies of A, C, T and G, in that order.
    pub frequencies: [(char, f64); 4],
}

impl VariantCall {
    /// Turn a polymorphic column into a call, or `None` when the reference base is
    /// unknown or no base other than the wildtype was observed.
    /// # Example
    /// ```
    /// use seqlab::pileup::BaseCounts;
    /// use seqlab::variants::VariantCall;
    /// let col = BaseCounts { contig: "ref".into(), pos: 4, depth: 4, a: 3, t: 1, ..Default::default() };
    /// let call = VariantCall::from_counts(&col, b'A').unwrap();
    /// assert_eq!((call.position, call.wildtype, call.mutation), (5, 'A', 'T'));
    /// assert_eq!(call.mutation_frequency(), 0.25);
    /// ```
    pub fn from_counts(site: &BaseCounts, reference_base: u8) -> Option<VariantCall> {
        let wildtype = reference_base.to_ascii_uppercase();
        let mutation = REPORT_ORDER
            .iter()
            .copied()
            .find(|&b| b != wildtype && site.frequency(b) > 0.0)?;
        Some(VariantCall {
            contig: site.contig.clone(),
            position: site.pos + 1,
            nreads: site.depth,
            wildtype: wildtype as char,
            mutation: mutation as char,
            frequencies: site.frequencies(),
        })
    }

    pub fn mutation_frequency(&self) -> f64 {
        self.frequencies
            .iter()
            .find(|(b, _)| *b == self.mutation)
            .map_or(0.0, |(_, f)| *f)
    }
}

/// Every reference contig, keyed by id, upper-cased.
pub fn load_reference<P: AsRef<Path>>(path: P) -> SeqlabResult<HashMap<String, Vec<u8>>> {
    Ok(fasta::read_fasta(path)?
        .into_iter()
        .map(|rec| (rec.id().to_string(), rec.seq().to_ascii_uppercase()))
        .collect())
}

/// Variant calls for one alignment file.
pub fn call_bam(bam: &Path, reference: &HashMap<String, Vec<u8>>) -> SeqlabResult<Vec<VariantCall>> {
    log::info!("Processing {} ...", bam.display());
    let mut calls = Vec::new();
    for site in pileup::polymorphic_sites(bam)? {
        let Some(&base) = reference
            .get(&site.contig)
            .and_then(|seq| seq.get(site.pos as usize))
        else {
            log::warn!(
                "{}: {}:{} is not in the reference, skipping",
                bam.display(),
                site.contig,
                site.pos + 1
            );
            continue;
        };
        match VariantCall::from_counts(&site, base) {
            Some(call) => calls.push(call),
            None => log::warn!(
                "{}: no base besides the wildtype {} at {}:{}, skipping",
                bam.display(),
                base as char,
                site.contig,
                site.pos + 1
            ),
        }
    }
    Ok(calls)
}

/// Call variants for every `<name>_sorted.bam` in `bams_dir`. Samples without variants
/// are left out.
pub fn call_variants(bams_dir: &Path, reference: &Path) -> SeqlabResult<HashMap<String, Vec<VariantCall>>> {
    let reference = load_reference(reference)?;
    let bams: Vec<PathBuf> = myio::files_with_suffix(bams_dir, SORTED_BAM_SUFFIX)?;
    let per_sample: Vec<(String, Vec<VariantCall>)> = bams
        .par_iter()
        .map(|bam| {
            let name = myio::strip_suffix(bam, SORTED_BAM_SUFFIX).unwrap_or_default();
            Ok((name, call_bam(bam, &reference)?))
        })
        .collect::<SeqlabResult<_>>()?;
    Ok(per_sample
        .into_iter()
        .filter(|(_, calls)| !calls.is_empty())
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pileup::tests::write_bam;
    use std::fs;

    #[test]
    fn test_call_variants_per_sample() {
        let dir = tempfile::tempdir().unwrap();
        write_bam(dir.path(), "Tim_sorted");
        let reference = dir.path().join("ref.fa");
        fs::write(&reference, ">ref\nacgtacgtacgtacgt\n").unwrap();

        let calls = call_variants(dir.path(), &reference).unwrap();
        let tim = &calls["Tim"];
        assert_eq!(tim.len(), 1);
        assert_eq!(tim[0].position, 5);
        assert_eq!(tim[0].nreads, 3);
        assert_eq!((tim[0].wildtype, tim[0].mutation), ('A', 'G'));
        assert!((tim[0].mutation_frequency() - 1.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_mutation_is_never_wildtype() {
        let col = BaseCounts {
            pos: 0,
            depth: 3,
            c: 2,
            g: 1,
            ..Default::default()
        };
        assert_eq!(VariantCall::from_counts(&col, b'C').unwrap().mutation, 'G');
        assert_eq!(VariantCall::from_counts(&col, b'G').unwrap().mutation, 'C');
        let only_wt = BaseCounts {
            depth: 3,
            a: 2,
            n: 1,
            ..Default::default()
        };
        assert_eq!(VariantCall::from_counts(&only_wt, b'A'), None);
    }

    #[test]
    fn test_samples_without_variants_are_omitted() {
        let dir = tempfile::tempdir().unwrap();
        write_bam(dir.path(), "Tim_sorted");
        let reference = dir.path().join("ref.fa");
        // the polymorphic site lies on a contig the reference does not have
        fs::write(&reference, ">other\nACGT\n").unwrap();
        assert!(call_variants(dir.path(), &reference).unwrap().is_empty());
    }
}
