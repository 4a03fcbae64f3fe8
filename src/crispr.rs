use super::error::{Error, SeqlabResult};
use super::motif::TOP_MOTIFS_SUFFIX;
use super::{fasta, myio};
use bio::io::fasta::Record;
use lazy_static::lazy_static;
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};

pub const PRE_CRISPR_SUFFIX: &str = "_precrispr.fasta";
pub const POST_CRISPR_SUFFIX: &str = "_postcrispr.fasta";

lazy_static! {
    // 20 nt protospacer followed by an NGG PAM
    static ref SITE_RE: Regex = Regex::new(r"[ACTG]{21}GG").unwrap();
    static ref PAM_RE: Regex = Regex::new(r"([ACTG]{20})([ACTG]GG)").unwrap();
}

/// Does the sequence hold a CRISPR target site?
/// # Example
/// ```
/// use seqlab::crispr::has_crispr_site;
/// assert!(has_crispr_site("TTACGTACGTACGTACGTACGTAGGTT"));
/// assert!(!has_crispr_site("CGTACGTACGTACGTACGTAGG"));
/// ```
pub fn has_crispr_site(seq: &str) -> bool {
    SITE_RE.is_match(seq)
}

/// Insert `base` right before every PAM that follows a full protospacer.
/// # Example
/// ```
/// use seqlab::crispr::insert_before_pam;
/// let seq = "ACGTACGTACGTACGTACGTCGGAA";
/// assert_eq!(insert_before_pam(seq, 'A'), "ACGTACGTACGTACGTACGTACGGAA");
/// assert_eq!(insert_before_pam("ACGGAA", 'A'), "ACGGAA");
/// ```
pub fn insert_before_pam(seq: &str, base: char) -> String {
    let replacement = format!("${{1}}{}${{2}}", base);
    PAM_RE.replace_all(seq, replacement.as_str()).into_owned()
}

fn resolve_output_dir(input_dir: &Path, output_dir: Option<&Path>, force: bool) -> SeqlabResult<PathBuf> {
    myio::check_dirs(&[input_dir])?;
    match output_dir {
        Some(dir) => {
            myio::prepare_outputs(&[dir], force)?;
            fs::create_dir_all(dir)?;
            Ok(dir.to_path_buf())
        }
        None => Ok(input_dir.to_path_buf()),
    }
}

/// Apply `edit` to every `<exome><in_suffix>` file, writing `<exome><out_suffix>`.
/// Records for which `edit` returns `None` are dropped.
fn transform_fastas<F>(
    fasta_dir: &Path,
    output_dir: &Path,
    in_suffix: &str,
    out_suffix: &str,
    edit: F,
) -> SeqlabResult<Vec<PathBuf>>
where
    F: Fn(&Record) -> SeqlabResult<Option<Record>>,
{
    let mut outputs = Vec::new();
    for fasta_file in myio::files_with_suffix(fasta_dir, in_suffix)? {
        log::info!("fasta: {}", fasta_file.display());
        let exome = myio::sample_name(&fasta_file);
        let out_file = output_dir.join(format!("{}{}", exome, out_suffix));
        let mut out = fasta::writer(&out_file)?;
        let mut kept = 0;
        for rec in fasta::read_fasta(&fasta_file)? {
            if let Some(new_rec) = edit(&rec)? {
                out.write_record(&new_rec)?;
                kept += 1;
            }
        }
        out.flush()?;
        log::debug!("{}: wrote {} records", out_file.display(), kept);
        outputs.push(out_file);
    }
    Ok(outputs)
}

/// Keep the records of each `*_topmotifs.fasta` that have a CRISPR target site.
pub fn run_identify_sites(
    fasta_dir: &Path,
    output_dir: Option<&Path>,
    force: bool,
) -> SeqlabResult<Vec<PathBuf>> {
    let output_dir = resolve_output_dir(fasta_dir, output_dir, force)?;
    transform_fastas(
        fasta_dir,
        &output_dir,
        TOP_MOTIFS_SUFFIX,
        PRE_CRISPR_SUFFIX,
        |rec| {
            let seq = fasta::seq_str(rec)?;
            Ok(has_crispr_site(seq).then(|| rec.clone()))
        },
    )
}

/// Insert `base` before every PAM in each `*_precrispr.fasta`.
pub fn run_edit_genome(
    fasta_dir: &Path,
    output_dir: Option<&Path>,
    base: char,
    force: bool,
) -> SeqlabResult<Vec<PathBuf>> {
    let base = base.to_ascii_uppercase();
    if !matches!(base, 'A' | 'C' | 'G' | 'T') {
        return Err(Error::Invalid(format!(
            "cannot insert `{}`, the base must be one of A, C, G, T",
            base
        )));
    }
    let output_dir = resolve_output_dir(fasta_dir, output_dir, force)?;
    transform_fastas(
        fasta_dir,
        &output_dir,
        PRE_CRISPR_SUFFIX,
        POST_CRISPR_SUFFIX,
        |rec| {
            let seq = insert_before_pam(fasta::seq_str(rec)?, base);
            Ok(Some(Record::with_attrs(
                rec.id(),
                rec.desc(),
                seq.as_bytes(),
            )))
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const SITE: &str = "ACGTACGTACGTACGTACGTTGG";

    #[test]
    fn test_every_pam_gets_a_base() {
        let seq = format!("{}{}", SITE, SITE);
        let edited = insert_before_pam(&seq, 'C');
        assert_eq!(edited.len(), seq.len() + 2);
        assert_eq!(&edited[20..24], "CTGG");
    }

    #[test]
    fn test_site_needs_21_bases_before_gg() {
        assert!(has_crispr_site(SITE));
        assert!(!has_crispr_site(&SITE[1..]));
        assert!(!has_crispr_site("ACGTACGTACGTNCGTACGTACGTTGG"));
    }

    #[test]
    fn test_crispr_chain() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("FOX_topmotifs.fasta"),
            format!(">gene1\n{}\n>gene2\nACGT\n", SITE),
        )
        .unwrap();
        let pre = run_identify_sites(dir.path(), None, false).unwrap();
        assert_eq!(pre, vec![dir.path().join("FOX_precrispr.fasta")]);
        let recs = fasta::read_fasta(&pre[0]).unwrap();
        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].id(), "gene1");

        let out = dir.path().join("edited");
        let post = run_edit_genome(dir.path(), Some(&out), 'a', false).unwrap();
        let recs = fasta::read_fasta(&post[0]).unwrap();
        assert_eq!(
            fasta::seq_str(&recs[0]).unwrap(),
            "ACGTACGTACGTACGTACGTATGG"
        );
        assert!(run_edit_genome(dir.path(), None, 'Z', false).is_err());
    }
}
