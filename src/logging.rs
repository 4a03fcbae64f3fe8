use super::error::SeqlabResult;
use env_logger::{Builder, Target};
use log::LevelFilter;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::Path;

/// `-v` occurrences to a level: warn, info, debug, then trace.
/// # Example
/// ```
/// use log::LevelFilter;
/// assert_eq!(seqlab::logging::level_from_verbosity(0), LevelFilter::Warn);
/// assert_eq!(seqlab::logging::level_from_verbosity(7), LevelFilter::Trace);
/// ```
pub fn level_from_verbosity(verbose: usize) -> LevelFilter {
    match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

/// Copies every log line to stderr and a log file.
struct Tee {
    file: File,
}

impl Write for Tee {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        io::stderr().write_all(buf)?;
        self.file.write_all(buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        io::stderr().flush()?;
        self.file.flush()
    }
}

/// Build the logger: stderr only, or stderr plus `logfile` with timestamped lines.
pub fn builder(verbose: usize, logfile: Option<&Path>) -> SeqlabResult<Builder> {
    let mut builder = Builder::new();
    builder.filter(None, level_from_verbosity(verbose));
    match logfile {
        None => {
            builder.target(Target::Stderr);
        }
        Some(path) => {
            if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
                fs::create_dir_all(dir)?;
            }
            let file = File::create(path)?;
            builder
                .target(Target::Pipe(Box::new(Tee { file })))
                .format(|buf, record| {
                    writeln!(
                        buf,
                        "{} - {}: {}",
                        chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
                        record.level(),
                        record.args()
                    )
                });
        }
    }
    Ok(builder)
}

pub fn init(verbose: usize, logfile: Option<&Path>) -> SeqlabResult<()> {
    builder(verbose, logfile)?.init();
    log::debug!("DEBUG logging enabled");
    log::trace!("TRACE logging enabled");
    Ok(())
}
