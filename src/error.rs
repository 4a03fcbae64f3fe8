use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("{} not found", .0.display())]
    MissingInput(PathBuf),
    #[error("{} is not a directory", .0.display())]
    NotADirectory(PathBuf),
    #[error("{} already exists, use --force to overwrite", .0.display())]
    OutputExists(PathBuf),
    #[error("required program `{0}` was not found, is it on your PATH?")]
    MissingTool(String),
    #[error("`{cmd}` failed with exit status {code}")]
    Subprocess { cmd: String, code: i32 },
    #[error("{path} has barcodes of differing lengths: {lengths}")]
    BarcodeLength { path: String, lengths: String },
    #[error("{path}: duplicate {what} `{value}`")]
    Duplicate {
        path: String,
        what: &'static str,
        value: String,
    },
    #[error("{path} has no `{column}` column")]
    MissingColumn { path: String, column: String },
    #[error("{path} line {line}: {msg}")]
    Parse {
        path: String,
        line: usize,
        msg: String,
    },
    #[error("{0} is not a FASTQ file (no quality scores)")]
    NotFastq(String),
    #[error("API call failure: {url} - response code {status}")]
    Api { url: String, status: u16 },
    #[error("no hits for {0}")]
    NoHits(String),
    #[error("MyGeneInfo - no ensembl gene ID found for {0}")]
    NoEnsemblId(String),
    #[error("unsupported species `{0}`")]
    UnknownSpecies(String),
    #[error("plotting failed: {0}")]
    Plot(String),
    #[error("{0}")]
    Invalid(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Utf8(#[from] std::str::Utf8Error),
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error(transparent)]
    Fastx(#[from] needletail::errors::ParseError),
    #[error(transparent)]
    Htslib(#[from] rust_htslib::errors::Error),
    #[error(transparent)]
    Compression(#[from] niffler::Error),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type SeqlabResult<T> = Result<T, Error>;
