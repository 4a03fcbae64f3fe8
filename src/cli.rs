use clap::{AppSettings, CommandFactory, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[clap(
    author,
    version,
    about,
    propagate_version = true,
    subcommand_required = true,
    infer_subcommands = true,
    arg_required_else_help = true,
    help_expected = true
)]
#[clap(global_setting(AppSettings::DeriveDisplayOrder))]
pub struct Cli {
    /// Threads for per-file parallel work.
    #[clap(short, long, default_value_t = 8)]
    pub threads: usize,

    /// Logging level [-v: Info, -vv: Debug, -vvv: Trace].
    #[clap(short, long, parse(from_occurrences), help_heading = "DEBUG")]
    pub verbose: usize,

    /// Also write every log line to this file.
    #[clap(short, long, help_heading = "DEBUG")]
    pub logfile: Option<PathBuf>,

    #[clap(subcommand)]
    pub command: Option<Commands>,
}

/// Image format of the diversity plots.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlotFormat {
    Svg,
    Png,
}

///
/// This structure contains all the subcommands for seqlab and their help descriptions.
///
/// Because of naming conventions for rust enums the commands names have
/// different capitalization than on the command line.
/// For example, the `MotifCount` enum is invoked using `seqlab motif-count`.
///
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Count motifs in a fasta and write the records holding each motif.
    ///
    /// Writes `<MOTIF> <COUNT>` lines (motif file order) to the count file and one
    /// fasta per motif, `<motif-dir>/<MOTIF>.txt`, with every record containing it.
    #[clap(visible_aliases = &["mc"])]
    MotifCount {
        /// Input fasta file.
        fasta: PathBuf,
        /// Motifs, one per line.
        motifs: PathBuf,
        /// Directory for the per-motif fasta files.
        #[clap(short = 'd', long, default_value = "motifs_py")]
        motif_dir: PathBuf,
        /// File for the motif counts.
        #[clap(short, long, default_value = "motif_count_py.txt")]
        count_file: PathBuf,
        /// Overwrite existing outputs.
        #[clap(short, long)]
        force: bool,
    },
    /// Find the most frequent motifs of every exome in a directory.
    ///
    /// For each `<exome>.fasta` writes `<exome>_motif_count.txt` (all motifs, most
    /// frequent first) and `<exome>_topmotifs.fasta` (records with a top motif).
    #[clap(visible_aliases = &["tm"])]
    TopMotifs {
        /// Directory of exome fasta files.
        fasta_dir: PathBuf,
        /// Motifs, one per line.
        motifs: PathBuf,
        /// Output directory [default: the input directory].
        #[clap(short, long)]
        output_dir: Option<PathBuf>,
        /// Number of top motifs to keep.
        #[clap(short = 'n', long, default_value_t = 3)]
        top: usize,
        /// Overwrite an existing output directory.
        #[clap(short, long)]
        force: bool,
    },
    /// Keep the records of each `<exome>_topmotifs.fasta` with a CRISPR target site (20 bp + NGG).
    #[clap(visible_aliases = &["cs"])]
    CrisprSites {
        /// Directory of `*_topmotifs.fasta` files.
        fasta_dir: PathBuf,
        /// Output directory [default: the input directory].
        #[clap(short, long)]
        output_dir: Option<PathBuf>,
        /// Overwrite an existing output directory.
        #[clap(short, long)]
        force: bool,
    },
    /// Insert a base before every NGG PAM in each `<exome>_precrispr.fasta`.
    #[clap(visible_aliases = &["eg"])]
    EditGenome {
        /// Directory of `*_precrispr.fasta` files.
        fasta_dir: PathBuf,
        /// Output directory [default: the input directory].
        #[clap(short, long)]
        output_dir: Option<PathBuf>,
        /// Base to insert (A, C, G or T).
        #[clap(short, long, default_value_t = 'A')]
        base: char,
        /// Overwrite an existing output directory.
        #[clap(short, long)]
        force: bool,
    },
    /// Copy the exomes of organisms whose diameter lies in a range.
    #[clap(visible_aliases = &["ce"])]
    CopyExomes {
        /// Clinical data table.
        clinical: PathBuf,
        /// Directory of `<code_name>.fasta` exomes.
        exome_dir: PathBuf,
        /// Output directory.
        #[clap(short, long, default_value = "exomesCohort")]
        output_dir: PathBuf,
        /// Smallest diameter to keep (inclusive).
        #[clap(short, long, default_value_t = 20.0)]
        lower: f64,
        /// Largest diameter to keep (inclusive).
        #[clap(short, long, default_value_t = 30.0)]
        upper: f64,
        /// Overwrite an existing output directory.
        #[clap(short, long)]
        force: bool,
    },
    /// Report the organisms of a cohort and the union of their genes.
    #[clap(visible_aliases = &["er"])]
    ExomeReport {
        /// Clinical data table.
        clinical: PathBuf,
        /// Directory of exome fasta files.
        exome_dir: PathBuf,
        /// Report file.
        #[clap(short, long, default_value = "exomeReport.txt")]
        report: PathBuf,
        /// Overwrite an existing report.
        #[clap(short, long)]
        force: bool,
    },
    /// Add diversity mean/std to the clinical data and plot the distances of the
    /// most and least diverse samples, clustered with k-means.
    #[clap(visible_aliases = &["div"])]
    Diversity {
        /// Clinical data table.
        clinical: PathBuf,
        /// Directory of `<code_name>.diversity.txt` files.
        diversity_dir: PathBuf,
        /// Directory of `<code_name>.distance.txt` files.
        distance_dir: PathBuf,
        /// Number of highest mean diversity samples to plot.
        #[clap(short = 'n', long, default_value_t = 2)]
        top: usize,
        /// Number of lowest mean diversity samples to plot.
        #[clap(short = 'm', long, default_value_t = 1)]
        bottom: usize,
        /// Output directory.
        #[clap(short, long, default_value = ".")]
        output_dir: PathBuf,
        /// File name of the updated clinical table (inside the output directory).
        #[clap(short, long, default_value = "clinical_data_with_diversity.txt")]
        clinical_output: String,
        /// Plot format.
        #[clap(long, value_enum, default_value = "svg")]
        format: PlotFormat,
        /// Largest k tried for the elbow method.
        #[clap(short = 'k', long, default_value_t = 10)]
        max_k: usize,
        /// Seed for k-means++ initialisation.
        #[clap(long, default_value_t = 42)]
        seed: u64,
        /// Overwrite existing outputs.
        #[clap(short, long)]
        force: bool,
    },
    /// Split a barcoded fastq into per-sample, quality trimmed fastqs.
    Demux {
        /// Input fastq (optionally gzipped).
        fastq: PathBuf,
        /// Sample sheet with Name, Color and Barcode columns.
        samples: PathBuf,
        /// Output directory for `<name>_trimmed.fastq`.
        #[clap(long, default_value = "fastqs")]
        fastqs_dir: PathBuf,
        /// Overwrite an existing output directory.
        #[clap(short, long)]
        force: bool,
    },
    /// Print the pileup columns of a bam where more than one base was observed.
    Snps {
        /// Input sam/bam/cram file.
        bam: PathBuf,
        /// Output table.
        #[clap(short, long, default_value = "-")]
        output: PathBuf,
    },
    /// Demultiplex, align with bwa, call variants and report the mutation behind each mold color.
    #[clap(visible_aliases = &["pipeline"])]
    Variants {
        /// Input fastq (optionally gzipped).
        fastq: PathBuf,
        /// Sample sheet with Name, Color and Barcode columns.
        samples: PathBuf,
        /// Reference fasta.
        reference: PathBuf,
        /// Directory for the trimmed fastqs.
        #[clap(long, default_value = "fastqs")]
        fastqs_dir: PathBuf,
        /// Directory for the sorted bams.
        #[clap(long, default_value = "bams")]
        bams_dir: PathBuf,
        /// Report file.
        #[clap(short, long, default_value = "report.txt")]
        report: PathBuf,
        /// Index the reference even when a bwa index exists.
        #[clap(long)]
        reindex: bool,
        /// Keep the intermediate sam files.
        #[clap(long)]
        savesam: bool,
        /// Overwrite existing outputs.
        #[clap(short, long)]
        force: bool,
        /// bwa program.
        #[clap(long, default_value = "bwa")]
        bwa: String,
        /// samtools program.
        #[clap(long, default_value = "samtools")]
        samtools: String,
    },
    /// Fetch a gene's sequence and homologs from mygene.info and Ensembl.
    ///
    /// Writes `<GENE>_gene_AA.fasta` (genomic sequence plus the translation of its
    /// longest open reading frame) and `<GENE>_homology_list.txt`.
    Gene {
        /// Gene name, e.g. MC1R.
        gene: String,
        /// Species: homo sapiens, mus musculus, rattus norvegicus or danio rerio.
        #[clap(short, long, default_value = "homo sapiens")]
        species: String,
        /// Output directory.
        #[clap(short, long, default_value = ".")]
        output_dir: PathBuf,
        /// Overwrite existing outputs.
        #[clap(short, long)]
        force: bool,
        /// Save the raw JSON responses in the output directory.
        #[clap(long)]
        json: bool,
        /// mygene.info base url.
        #[clap(long, default_value = "https://mygene.info")]
        mygene_url: String,
        /// Ensembl REST base url.
        #[clap(long, default_value = "https://rest.ensembl.org")]
        ensembl_url: String,
    },
    /// Translate the longest open reading frame of every fasta record.
    Orf {
        /// Input fasta file.
        #[clap(default_value = "-")]
        fasta: PathBuf,
        /// Output fasta.
        #[clap(short, long, default_value = "-")]
        output: PathBuf,
    },
}

pub fn make_cli_app() -> clap::Command<'static> {
    Cli::command()
}
