use crate::error::{Error, SeqlabResult};
use flate2::write;
use flate2::Compression;
use std::ffi::OsStr;
use std::fs::{self, File};
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

/// Write normal or compressed files seamlessly
/// Uses the presence of a `.gz` extension to decide, `-` writes to stdout.
pub fn writer<P: AsRef<Path>>(filename: P) -> SeqlabResult<Box<dyn Write>> {
    let path = filename.as_ref();
    if path == Path::new("-") {
        return Ok(Box::new(BufWriter::new(io::stdout())));
    }
    let file = File::create(path)?;

    if path.extension() == Some(OsStr::new("gz")) {
        Ok(Box::new(BufWriter::with_capacity(
            128 * 1024,
            write::GzEncoder::new(file, Compression::default()),
        )))
    } else {
        Ok(Box::new(BufWriter::with_capacity(128 * 1024, file)))
    }
}

/// Read normal or compressed files seamlessly
/// Compression is sniffed from the magic bytes, `-` reads stdin.
/// # Example
/// ```
/// use std::io::BufRead;
/// let reader = seqlab::myio::reader(".test/motifs.txt").unwrap();
/// assert_eq!(reader.lines().count(), 4);
/// ```
pub fn reader<P: AsRef<Path>>(filename: P) -> SeqlabResult<Box<dyn BufRead>> {
    let path = filename.as_ref();
    if path == Path::new("-") {
        return Ok(Box::new(BufReader::new(io::stdin())));
    }
    let open = || {
        File::open(path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => Error::MissingInput(path.to_path_buf()),
            _ => Error::Io(e),
        })
    };
    let inner: Box<dyn io::Read> = match niffler::get_reader(Box::new(open()?)) {
        Ok((inner, _format)) => inner,
        // fewer bytes than any magic number, so it cannot be compressed
        Err(niffler::Error::FileTooShort) => Box::new(open()?),
        Err(e) => return Err(e.into()),
    };
    Ok(Box::new(BufReader::with_capacity(128 * 1024, inner)))
}

/// Every input path has to exist. `-` stands for stdin and always passes.
pub fn check_inputs<P: AsRef<Path>>(paths: &[P]) -> SeqlabResult<()> {
    for path in paths {
        let path = path.as_ref();
        if path == Path::new("-") {
            continue;
        }
        if !path.exists() {
            return Err(Error::MissingInput(path.to_path_buf()));
        }
    }
    Ok(())
}

/// Every path has to be an existing directory.
pub fn check_dirs<P: AsRef<Path>>(paths: &[P]) -> SeqlabResult<()> {
    for path in paths {
        let path = path.as_ref();
        if !path.exists() {
            return Err(Error::MissingInput(path.to_path_buf()));
        }
        if !path.is_dir() {
            return Err(Error::NotADirectory(path.to_path_buf()));
        }
    }
    Ok(())
}

/// Refuse existing outputs unless `force` is set. Nothing is removed, so the
/// caller can overwrite them once its work has succeeded.
pub fn check_outputs<P: AsRef<Path>>(paths: &[P], force: bool) -> SeqlabResult<()> {
    for path in paths {
        let path = path.as_ref();
        if !force && path.exists() {
            return Err(Error::OutputExists(path.to_path_buf()));
        }
    }
    Ok(())
}

/// Refuse to clobber existing outputs unless `force` is set, in which case they are removed.
/// # Example
/// ```
/// let dir = tempfile::tempdir().unwrap();
/// let out = dir.path().join("report.txt");
/// std::fs::write(&out, "old").unwrap();
/// assert!(seqlab::myio::prepare_outputs(&[&out], false).is_err());
/// seqlab::myio::prepare_outputs(&[&out], true).unwrap();
/// assert!(!out.exists());
/// ```
pub fn prepare_outputs<P: AsRef<Path>>(paths: &[P], force: bool) -> SeqlabResult<()> {
    for path in paths {
        let path = path.as_ref();
        if !path.exists() {
            continue;
        }
        if !force {
            return Err(Error::OutputExists(path.to_path_buf()));
        }
        log::info!("Deleting existing {} ...", path.display());
        if path.is_dir() {
            fs::remove_dir_all(path)?;
        } else {
            fs::remove_file(path)?;
        }
    }
    Ok(())
}

/// Files directly inside `dir` whose name ends with `suffix`, sorted by name.
pub fn files_with_suffix(dir: &Path, suffix: &str) -> SeqlabResult<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        if let Some(name) = path.file_name().and_then(OsStr::to_str) {
            if name.ends_with(suffix) {
                files.push(path);
            }
        }
    }
    files.sort();
    Ok(files)
}

/// Sample/exome name of a file: everything before the first `_` (or the extension).
/// # Example
/// ```
/// use std::path::Path;
/// use seqlab::myio::sample_name;
/// assert_eq!(sample_name(Path::new("dir/FOX_topmotifs.fasta")), "FOX");
/// assert_eq!(sample_name(Path::new("FOX.fasta")), "FOX");
/// ```
pub fn sample_name(path: &Path) -> String {
    let name = path.file_name().and_then(OsStr::to_str).unwrap_or_default();
    match name.split_once('_') {
        Some((stem, _)) => stem.to_string(),
        None => name.split('.').next().unwrap_or(name).to_string(),
    }
}

/// The file name with a known suffix removed, e.g. `Tim_trimmed.fastq` -> `Tim`.
pub fn strip_suffix(path: &Path, suffix: &str) -> Option<String> {
    path.file_name()
        .and_then(OsStr::to_str)
        .and_then(|name| name.strip_suffix(suffix))
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    #[test]
    fn test_gz_round_trip_through_reader() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("x.txt.gz");
        {
            let mut w = writer(&path).unwrap();
            writeln!(w, "hello").unwrap();
        }
        let mut text = String::new();
        reader(&path).unwrap().read_to_string(&mut text).unwrap();
        assert_eq!(text, "hello\n");
    }

    #[test]
    fn test_files_with_suffix_sorted() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b_precrispr.fasta", "a_precrispr.fasta", "c.txt"] {
            fs::write(dir.path().join(name), "").unwrap();
        }
        let files = files_with_suffix(dir.path(), "_precrispr.fasta").unwrap();
        let names: Vec<String> = files.iter().map(|f| sample_name(f)).collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn test_missing_and_not_dir() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("f");
        fs::write(&file, "").unwrap();
        assert!(matches!(
            check_dirs(&[&file]),
            Err(Error::NotADirectory(_))
        ));
        assert!(matches!(
            check_inputs(&[dir.path().join("nope")]),
            Err(Error::MissingInput(_))
        ));
    }

    #[test]
    fn test_stdin_is_a_valid_input() {
        check_inputs(&[Path::new("-")]).unwrap();
        assert!(matches!(
            check_inputs(&[Path::new("-"), Path::new("no/such/file")]),
            Err(Error::MissingInput(_))
        ));
    }

    #[test]
    fn test_check_outputs_keeps_files() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out.txt");
        fs::write(&out, "old").unwrap();
        assert!(matches!(
            check_outputs(&[&out], false),
            Err(Error::OutputExists(_))
        ));
        check_outputs(&[&out], true).unwrap();
        assert_eq!(fs::read_to_string(&out).unwrap(), "old");
    }
}
