use super::error::SeqlabResult;
use super::myio;
use bio::io::fasta;
use std::io::Write;
use std::path::Path;
use std::str;

/// Read every record of a (optionally gzipped) fasta file.
/// # Example
/// ```
/// let recs = seqlab::fasta::read_fasta(".test/exome.fasta").unwrap();
/// assert_eq!(recs.len(), 4);
/// assert_eq!(recs[0].id(), "gene1");
/// ```
pub fn read_fasta<P: AsRef<Path>>(path: P) -> SeqlabResult<Vec<fasta::Record>> {
    let reader = fasta::Reader::new(myio::reader(path)?);
    let mut records = Vec::new();
    for rec in reader.records() {
        records.push(rec?);
    }
    Ok(records)
}

/// Open a fasta writer, compressed when the file name ends in `.gz`.
pub fn writer<P: AsRef<Path>>(path: P) -> SeqlabResult<fasta::Writer<Box<dyn Write>>> {
    Ok(fasta::Writer::new(myio::writer(path)?))
}

/// The full header line (without the `>`).
pub fn header(rec: &fasta::Record) -> String {
    match rec.desc() {
        Some(desc) => format!("{} {}", rec.id(), desc),
        None => rec.id().to_string(),
    }
}

pub fn seq_str(rec: &fasta::Record) -> SeqlabResult<&str> {
    Ok(str::from_utf8(rec.seq())?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_headers_survive_writing() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out.fasta");
        let rec = fasta::Record::with_attrs("gene7", Some("lipid kinase"), b"ACGT");
        {
            let mut w = writer(&out).unwrap();
            w.write_record(&rec).unwrap();
            w.flush().unwrap();
        }
        assert_eq!(
            std::fs::read_to_string(&out).unwrap(),
            ">gene7 lipid kinase\nACGT\n"
        );
        let back = read_fasta(&out).unwrap();
        assert_eq!(header(&back[0]), "gene7 lipid kinase");
        assert_eq!(seq_str(&back[0]).unwrap(), "ACGT");
    }
}
