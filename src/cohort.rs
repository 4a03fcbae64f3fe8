use super::error::{Error, SeqlabResult};
use super::myio;
use super::table::Table;
use std::collections::HashSet;
use std::fs;
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

pub const HEADER_DIAMETER: &str = "Diamater (mm)";
pub const HEADER_CODENAME: &str = "code_name";
pub const HEADER_DISCOVERER: &str = "Discoverer";
pub const HEADER_ENVIRONMENT: &str = "Environment";

pub const DEFAULT_COHORT_DIR: &str = "exomesCohort";
pub const DEFAULT_REPORT: &str = "exomeReport.txt";

fn parse_diameter(table: &Table, row: usize, value: &str) -> SeqlabResult<f64> {
    value.parse::<f64>().map_err(|_| Error::Parse {
        path: table.name.clone(),
        line: row + 2,
        msg: format!("diameter `{}` is not a number", value),
    })
}

/// Code names of the organisms whose diameter lies within `[lower, upper]`.
/// # Example
/// ```
/// use seqlab::table::Table;
/// let t = Table::from_path(".test/clinical_data.txt").unwrap();
/// let names = seqlab::cohort::select_by_diameter(&t, 20.0, 30.0).unwrap();
/// assert_eq!(names, vec!["FOX", "OWL"]);
/// ```
pub fn select_by_diameter(table: &Table, lower: f64, upper: f64) -> SeqlabResult<Vec<String>> {
    let code = table.column(HEADER_CODENAME)?;
    let diameter = table.column(HEADER_DIAMETER)?;
    let mut selected = Vec::new();
    for (idx, row) in table.rows.iter().enumerate() {
        let d = parse_diameter(table, idx, &row[diameter])?;
        log::debug!("{}: {}", row[code], d);
        if lower <= d && d <= upper {
            log::info!("{} MATCH", row[code]);
            selected.push(row[code].clone());
        }
    }
    Ok(selected)
}

/// Copy `<exome_dir>/<code_name>.fasta` of every organism in the diameter range.
pub fn run_copy_exomes(
    clinical: &Path,
    exome_dir: &Path,
    output_dir: &Path,
    lower: f64,
    upper: f64,
    force: bool,
) -> SeqlabResult<Vec<String>> {
    if lower > upper {
        return Err(Error::Invalid(format!(
            "lower bound {} is above upper bound {}",
            lower, upper
        )));
    }
    myio::check_inputs(&[clinical])?;
    myio::check_dirs(&[exome_dir])?;
    myio::prepare_outputs(&[output_dir], force)?;

    let table = Table::from_path(clinical)?;
    let selected = select_by_diameter(&table, lower, upper)?;
    fs::create_dir_all(output_dir)?;
    for code_name in &selected {
        let src = exome_dir.join(format!("{}.fasta", code_name));
        myio::check_inputs(&[&src])?;
        fs::copy(&src, output_dir.join(format!("{}.fasta", code_name)))?;
    }
    Ok(selected)
}

/// Distinct fasta header names across `files`, in natural order (`gene2` < `gene10`).
pub fn gene_union(files: &[PathBuf]) -> SeqlabResult<Vec<String>> {
    let mut genes = HashSet::new();
    for file in files {
        for line in myio::reader(file)?.lines() {
            let line = line?;
            if let Some(name) = line.trim().strip_prefix('>') {
                genes.insert(name.to_string());
            }
        }
    }
    let mut genes: Vec<String> = genes.into_iter().collect();
    genes.sort_by(|a, b| natord::compare(a, b));
    Ok(genes)
}

/// Write the organism summary and gene union of the exomes in `exome_dir`.
pub fn write_exome_report<W: Write>(out: &mut W, table: &Table, exome_dir: &Path) -> SeqlabResult<()> {
    let fastas = myio::files_with_suffix(exome_dir, ".fasta")?;
    let exomes: HashSet<String> = fastas.iter().map(|f| myio::sample_name(f)).collect();

    let code = table.column(HEADER_CODENAME)?;
    let discoverer = table.column(HEADER_DISCOVERER)?;
    let diameter = table.column(HEADER_DIAMETER)?;
    let environment = table.column(HEADER_ENVIRONMENT)?;
    for row in table.rows.iter().filter(|r| exomes.contains(&r[code])) {
        writeln!(
            out,
            "Organism {}, discovered by {}, has a diameter of {}, and is from the environment {}",
            row[code], row[discoverer], row[diameter], row[environment]
        )?;
    }

    let genes = gene_union(&fastas)?;
    writeln!(
        out,
        "The number of the union of genes across the cohort is {}.  Those genes are:",
        genes.len()
    )?;
    writeln!(out, "{}", genes.join(","))?;
    Ok(())
}

pub fn run_exome_report(
    clinical: &Path,
    exome_dir: &Path,
    report: &Path,
    force: bool,
) -> SeqlabResult<()> {
    myio::check_inputs(&[clinical])?;
    myio::check_dirs(&[exome_dir])?;
    myio::prepare_outputs(&[report], force)?;
    let table = Table::from_path(clinical)?;
    let mut out = myio::writer(report)?;
    write_exome_report(&mut out, &table, exome_dir)?;
    out.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_copy_exomes() {
        let exomes = tempfile::tempdir().unwrap();
        for name in ["FOX", "HEN", "OWL", "YAK"] {
            fs::copy(".test/exome.fasta", exomes.path().join(format!("{}.fasta", name))).unwrap();
        }
        let out = exomes.path().join("cohort");
        let copied = run_copy_exomes(
            Path::new(".test/clinical_data.txt"),
            exomes.path(),
            &out,
            25.0,
            35.0,
            false,
        )
        .unwrap();
        assert_eq!(copied, vec!["FOX", "HEN"]);
        assert!(out.join("FOX.fasta").exists());
        assert!(!out.join("OWL.fasta").exists());
    }

    #[test]
    fn test_bad_bounds_keep_existing_cohort() {
        let exomes = tempfile::tempdir().unwrap();
        let out = exomes.path().join("cohort");
        fs::create_dir(&out).unwrap();
        fs::write(out.join("FOX.fasta"), ">gene1\nACGT\n").unwrap();
        let err = run_copy_exomes(
            Path::new(".test/clinical_data.txt"),
            exomes.path(),
            &out,
            30.0,
            20.0,
            true,
        )
        .unwrap_err();
        assert!(matches!(err, Error::Invalid(_)));
        assert!(out.join("FOX.fasta").exists());
    }

    #[test]
    fn test_missing_exome_fails() {
        let exomes = tempfile::tempdir().unwrap();
        let out = exomes.path().join("cohort");
        let err = run_copy_exomes(
            Path::new(".test/clinical_data.txt"),
            exomes.path(),
            &out,
            0.0,
            100.0,
            false,
        )
        .unwrap_err();
        assert!(matches!(err, Error::MissingInput(_)));
    }

    #[test]
    fn test_exome_report() {
        let exomes = tempfile::tempdir().unwrap();
        fs::copy(".test/exome.fasta", exomes.path().join("FOX_postcrispr.fasta")).unwrap();
        fs::write(exomes.path().join("OWL_postcrispr.fasta"), ">gene2\nACGT\n>gene31\nA\n").unwrap();
        let table = Table::from_path(".test/clinical_data.txt").unwrap();
        let mut out = Vec::new();
        write_exome_report(&mut out, &table, exomes.path()).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines[0],
            "Organism FOX, discovered by Simpson, has a diameter of 25, and is from the environment desert"
        );
        assert!(lines[1].starts_with("Organism OWL, discovered by Curie"));
        assert_eq!(
            lines[2],
            "The number of the union of genes across the cohort is 5.  Those genes are:"
        );
        assert_eq!(lines[3], "gene1,gene2,gene3,gene10,gene31");
    }
}
