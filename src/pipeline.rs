use super::align::Aligner;
use super::error::SeqlabResult;
use super::samples::SampleSheet;
use super::variants::VariantCall;
use super::{demux, myio, report, variants};
use std::collections::HashMap;
use std::path::PathBuf;

/// Inputs, outputs and switches of the demultiplex -> align -> call -> report pipeline.
#[derive(Debug, Clone)]
pub struct VariantPipeline {
    pub fastq: PathBuf,
    pub samples: PathBuf,
    pub reference: PathBuf,
    pub fastqs_dir: PathBuf,
    pub bams_dir: PathBuf,
    pub report: PathBuf,
    pub reindex: bool,
    pub savesam: bool,
    pub force: bool,
    pub aligner: Aligner,
}

impl VariantPipeline {
    /// Inputs must exist, outputs must not (they are removed with `force`).
    pub fn validate(&self) -> SeqlabResult<()> {
        myio::check_inputs(&[&self.fastq, &self.samples, &self.reference])?;
        myio::prepare_outputs(&[&self.fastqs_dir, &self.bams_dir, &self.report], self.force)
    }

    pub fn run(&self) -> SeqlabResult<HashMap<String, Vec<VariantCall>>> {
        log::info!("-- Verify prerequisites --");
        self.aligner.verify_prerequisites()?;
        log::info!("-- Validate input --");
        self.validate()?;
        log::info!("-- Parse sample file --");
        let sheet = SampleSheet::from_path(&self.samples)?;
        log::info!("-- Create demultiplexed trimmed fastqs --");
        demux::demultiplex(&self.fastq, &sheet, &self.fastqs_dir)?;
        log::info!("-- Align reads --");
        self.aligner.index_reference(&self.reference, self.reindex)?;
        self.aligner
            .align_fastqs(&self.reference, &self.fastqs_dir, &self.bams_dir)?;
        log::info!("-- Convert SAM to sorted BAM --");
        self.aligner.sam_to_bam(&self.bams_dir, self.savesam)?;
        log::info!("-- Call variants --");
        let calls = variants::call_variants(&self.bams_dir, &self.reference)?;
        log::info!("-- Generate report --");
        report::run_report(&self.report, &calls, &sheet)?;
        Ok(calls)
    }
}
