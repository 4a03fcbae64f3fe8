//! # Command line interface for seqlab
//! [seqlab command line interface, subcommands, and options.](cli::Commands)
//! # README for seqlab
#![doc = include_str!("../README.md")]
/// Run `bwa` and `samtools` to index, align and sort.
pub mod align;
/// Command line interface for seqlab.
pub mod cli;
/// Select exomes by clinical data and report on a cohort.
pub mod cohort;
/// Find CRISPR target sites and edit sequences before their PAM.
pub mod crispr;
/// Split a barcoded fastq into per-sample trimmed fastqs.
pub mod demux;
/// Diversity statistics, k-means clustering and plots for clinical samples.
pub mod diversity;
/// Error type shared by every module.
pub mod error;
/// Reading and writing fasta records.
pub mod fasta;
/// Query mygene.info and Ensembl for a gene's sequence and homologs.
pub mod gene;
/// Seeded k-means with the elbow method.
pub mod kmeans;
/// Logger setup.
pub mod logging;
/// Motif counting in fasta files.
pub mod motif;
/// Module for automatically reading a writing compressed or uncompressed files.
pub mod myio;
/// Longest open reading frame and its translation.
pub mod orf;
/// Per-position base counts from a bam pileup.
pub mod pileup;
/// The demultiplex, align, call and report pipeline.
pub mod pipeline;
/// Scatter, elbow and cluster plots.
pub mod plot;
/// Mold color report of the variant pipeline.
pub mod report;
/// Sample sheets of names, colors and barcodes.
pub mod samples;
/// Delimited tables such as the clinical data.
pub mod table;
/// Call the dominant non-reference base of polymorphic sites.
pub mod variants;
