use super::error::SeqlabResult;
use super::{fasta, myio};
use lazy_static::lazy_static;
use regex::Regex;
use std::io::Write;
use std::path::Path;

lazy_static! {
    // shortest in-frame run from an ATG to the first stop codon
    static ref ORF_RE: Regex = Regex::new(r"^ATG(?:[ACGT]{3})*?(?:TAA|TAG|TGA)").unwrap();
}

/// Standard genetic code with codons in TCAG order.
const CODON_TABLE: &[u8; 64] = b"FFLLSSSSYY**CC*WLLLLPPPPHHQQRRRRIIIMTTTTNNKKSSRRVVVVAAAADDEEGGGG";

fn base_index(b: u8) -> Option<usize> {
    match b.to_ascii_uppercase() {
        b'T' | b'U' => Some(0),
        b'C' => Some(1),
        b'A' => Some(2),
        b'G' => Some(3),
        _ => None,
    }
}

/// Amino acid of one codon; `X` when a base is not A, C, G or T.
pub fn codon_to_aa(codon: &[u8]) -> char {
    match codon {
        [a, b, c] => match (base_index(*a), base_index(*b), base_index(*c)) {
            (Some(i), Some(j), Some(k)) => CODON_TABLE[16 * i + 4 * j + k] as char,
            _ => 'X',
        },
        _ => 'X',
    }
}

/// Translate DNA codon by codon; stops become `*` and a trailing partial codon is dropped.
/// # Example
/// ```
/// use seqlab::orf::translate;
/// assert_eq!(translate("ATGGCCTAA"), "MA*");
/// assert_eq!(translate("atgNNNtg"), "MX");
/// ```
pub fn translate(dna: &str) -> String {
    dna.as_bytes().chunks_exact(3).map(codon_to_aa).collect()
}

/// The longest open reading frame of `dna`: from an `ATG` to the first in-frame stop,
/// the earliest one winning ties.
/// # Example
/// ```
/// use seqlab::orf::longest_orf;
/// assert_eq!(longest_orf("TTTATGATGAATGAATGATTT").as_deref(), Some("ATGATGAATGAATGA"));
/// assert_eq!(longest_orf("TTATGATAA"), None);
/// ```
pub fn longest_orf(dna: &str) -> Option<String> {
    let dna = dna.to_ascii_uppercase();
    let mut best: Option<&str> = None;
    for (start, _) in dna.match_indices("ATG") {
        if let Some(m) = ORF_RE.find(&dna[start..]) {
            if best.map_or(true, |b| m.as_str().len() > b.len()) {
                best = Some(m.as_str());
            }
        }
    }
    best.map(str::to_string)
}

/// `orf` subcommand: write the translated longest ORF of every record.
pub fn run_orf(fasta_file: &Path, output: &Path) -> SeqlabResult<usize> {
    myio::check_inputs(&[fasta_file])?;
    let mut out = fasta::writer(output)?;
    let mut found = 0;
    for rec in fasta::read_fasta(fasta_file)? {
        match longest_orf(fasta::seq_str(&rec)?) {
            Some(orf) => {
                log::debug!("{}: {} bp ORF", rec.id(), orf.len());
                let id = format!("{}:longest_ORF:AA", rec.id());
                out.write(&id, None, translate(&orf).as_bytes())?;
                found += 1;
            }
            None => log::warn!("{}: no open reading frame found", rec.id()),
        }
    }
    out.flush()?;
    Ok(found)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_longest_orf() {
        let cases = [
            ("ATGTAA", Some("ATGTAA")),
            ("TTTATGATGAATGAATGATTT", Some("ATGATGAATGAATGA")),
            ("TTATGCCCTAATAATT", Some("ATGCCCTAA")),
            ("TTATGATAA", None),
            (
                "CCCCCATGCCCATGCTAACCTAACTAACTAACCCCCC",
                Some("ATGCCCATGCTAACCTAA"),
            ),
            (
                "ATGCCCTAACATGAAACCCTTTTGACCATGGGGTAA",
                Some("ATGAAACCCTTTTGA"),
            ),
        ];
        for (dna, expected) in cases {
            let orf = longest_orf(dna);
            assert_eq!(orf.as_deref(), expected, "{}", dna);
            if let Some(orf) = orf {
                assert_eq!(orf.len() % 3, 0);
            }
        }
    }

    #[test]
    fn test_ties_keep_the_first() {
        assert_eq!(longest_orf("ATGAAATGAATGCCCTGA").as_deref(), Some("ATGAAATGA"));
    }

    #[test]
    fn test_codons() {
        assert_eq!(translate("TTTTGGTGAAAGGGG"), "FW*KG");
        assert_eq!(codon_to_aa(b"AT"), 'X');
        assert_eq!(translate(""), "");
    }

    #[test]
    fn test_run_orf() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.fasta");
        std::fs::write(&input, ">g1 kinase\nCCATGGCCTAGG\n>g2\nCCCC\n").unwrap();
        let out = dir.path().join("orf.fasta");
        assert_eq!(run_orf(&input, &out).unwrap(), 1);
        assert_eq!(
            std::fs::read_to_string(&out).unwrap(),
            ">g1:longest_ORF:AA\nMA*\n"
        );
    }
}
