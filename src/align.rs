use super::demux::TRIMMED_SUFFIX;
use super::error::{Error, SeqlabResult};
use super::myio;
use std::ffi::OsStr;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

pub const SORTED_BAM_SUFFIX: &str = "_sorted.bam";
pub const DEFAULT_BAMS_DIR: &str = "bams";

/// Run a program with an argument list (no shell), optionally sending stdout to a file.
/// A non-zero exit becomes [`Error::Subprocess`] carrying the exit code.
/// # Example
/// ```
/// use std::ffi::OsStr;
/// use seqlab::align::run_subprocess;
/// assert!(run_subprocess("true", &[], None).is_ok());
/// assert!(run_subprocess("false", &[OsStr::new("x")], None).is_err());
/// ```
pub fn run_subprocess(program: &str, args: &[&OsStr], stdout: Option<&Path>) -> SeqlabResult<()> {
    let cmd = std::iter::once(program.to_string())
        .chain(args.iter().map(|a| a.to_string_lossy().into_owned()))
        .collect::<Vec<_>>()
        .join(" ");
    log::info!("running {} ...", cmd);

    let mut command = Command::new(program);
    command.args(args);
    if let Some(path) = stdout {
        command.stdout(Stdio::from(File::create(path)?));
    }
    let status = command.status().map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => Error::MissingTool(program.to_string()),
        _ => Error::Io(e),
    })?;
    if !status.success() {
        return Err(Error::Subprocess {
            cmd,
            code: status.code().unwrap_or(1),
        });
    }
    Ok(())
}

/// External aligner and SAM/BAM tool programs.
#[derive(Debug, Clone)]
pub struct Aligner {
    pub bwa: String,
    pub samtools: String,
}

impl Default for Aligner {
    fn default() -> Self {
        Aligner {
            bwa: "bwa".to_string(),
            samtools: "samtools".to_string(),
        }
    }
}

impl Aligner {
    /// Both programs must be found by `which`.
    pub fn verify_prerequisites(&self) -> SeqlabResult<()> {
        for app in [&self.bwa, &self.samtools] {
            run_subprocess("which", &[OsStr::new(app)], None).map_err(|e| match e {
                Error::Subprocess { .. } | Error::MissingTool(_) => Error::MissingTool(app.clone()),
                e => e,
            })?;
        }
        Ok(())
    }

    /// `bwa index <reference>`, skipped when `<reference>.amb` already exists.
    pub fn index_reference(&self, reference: &Path, reindex: bool) -> SeqlabResult<bool> {
        let mut amb = reference.as_os_str().to_owned();
        amb.push(".amb");
        if Path::new(&amb).exists() && !reindex {
            log::info!("{} is already indexed", reference.display());
            return Ok(false);
        }
        log::info!("generate index...");
        run_subprocess(&self.bwa, &[OsStr::new("index"), reference.as_os_str()], None)?;
        Ok(true)
    }

    /// `bwa mem` every `<name>_trimmed.fastq` into `<bams_dir>/<name>.sam`.
    pub fn align_fastqs(&self, reference: &Path, fastqs_dir: &Path, bams_dir: &Path) -> SeqlabResult<Vec<PathBuf>> {
        fs::create_dir_all(bams_dir)?;
        let mut sams = Vec::new();
        for fastq in myio::files_with_suffix(fastqs_dir, TRIMMED_SUFFIX)? {
            let name = myio::strip_suffix(&fastq, TRIMMED_SUFFIX).unwrap_or_default();
            let sam = bams_dir.join(format!("{}.sam", name));
            run_subprocess(
                &self.bwa,
                &[OsStr::new("mem"), reference.as_os_str(), fastq.as_os_str()],
                Some(&sam),
            )?;
            sams.push(sam);
        }
        Ok(sams)
    }

    /// Convert every SAM in `bams_dir` into a sorted, indexed `<name>_sorted.bam`.
    /// Intermediate files are removed as soon as they are consumed.
    pub fn sam_to_bam(&self, bams_dir: &Path, savesam: bool) -> SeqlabResult<Vec<PathBuf>> {
        let mut sorted = Vec::new();
        for sam in myio::files_with_suffix(bams_dir, ".sam")? {
            let name = myio::strip_suffix(&sam, ".sam").unwrap_or_default();
            let bam = bams_dir.join(format!("{}.bam", name));
            let sorted_bam = bams_dir.join(format!("{}{}", name, SORTED_BAM_SUFFIX));

            run_subprocess(
                &self.samtools,
                &[OsStr::new("view"), OsStr::new("-bS"), sam.as_os_str()],
                Some(&bam),
            )?;
            if !savesam {
                fs::remove_file(&sam)?;
            }
            run_subprocess(
                &self.samtools,
                &[
                    OsStr::new("sort"),
                    OsStr::new("-m"),
                    OsStr::new("100M"),
                    OsStr::new("-o"),
                    sorted_bam.as_os_str(),
                    bam.as_os_str(),
                ],
                None,
            )?;
            fs::remove_file(&bam)?;
            run_subprocess(
                &self.samtools,
                &[OsStr::new("index"), sorted_bam.as_os_str()],
                None,
            )?;
            sorted.push(sorted_bam);
        }
        Ok(sorted)
    }
}
