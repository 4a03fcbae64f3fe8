use anyhow::Context;
use clap::FromArgMatches;
use colored::Colorize;
use seqlab::align::Aligner;
use seqlab::cli::{Cli, Commands};
use seqlab::diversity::DiversityRun;
use seqlab::error::Error;
use seqlab::gene::{GeneClient, GeneQuery, Species};
use seqlab::pipeline::VariantPipeline;
use seqlab::*;
use std::process;
use std::time::Instant;

fn main() {
    let pg_start = Instant::now();
    let matches = cli::make_cli_app().get_matches();
    let args = Cli::from_arg_matches(&matches).unwrap_or_else(|e| e.exit());
    let subcommand = matches.subcommand_name().unwrap_or("seqlab").to_string();

    if let Err(e) = logging::init(args.verbose, args.logfile.as_deref()) {
        eprintln!("Error: could not start logging: {}", e);
        process::exit(1);
    }

    // set up number of threads to use globally
    if let Err(e) = rayon::ThreadPoolBuilder::new()
        .num_threads(args.threads)
        .build_global()
    {
        log::warn!("could not set up {} threads: {}", args.threads, e);
    }

    if let Err(e) = run(&args) {
        log::error!("{:#}", e);
        let code = match e.downcast_ref::<Error>() {
            Some(Error::Subprocess { code, .. }) => *code,
            _ => 1,
        };
        process::exit(code);
    }

    let duration = pg_start.elapsed();
    log::info!(
        "{} done! Time elapsed: {}",
        subcommand.bright_green().bold(),
        format!("{:.2?}", duration).bright_yellow().bold()
    );
}

fn run(args: &Cli) -> anyhow::Result<()> {
    match &args.command {
        //
        // Run MotifCount
        //
        Some(Commands::MotifCount {
            fasta,
            motifs,
            motif_dir,
            count_file,
            force,
        }) => {
            motif::run_motif_count(fasta, motifs, motif_dir, count_file, *force)?;
        }
        //
        // Run TopMotifs
        //
        Some(Commands::TopMotifs {
            fasta_dir,
            motifs,
            output_dir,
            top,
            force,
        }) => {
            let tops =
                motif::run_top_motifs(fasta_dir, motifs, output_dir.as_deref(), *top, *force)?;
            for (exome, motifs) in tops {
                println!("{}\t{}", exome, motifs.join(","));
            }
        }
        //
        // Run CrisprSites
        //
        Some(Commands::CrisprSites {
            fasta_dir,
            output_dir,
            force,
        }) => {
            let written = crispr::run_identify_sites(fasta_dir, output_dir.as_deref(), *force)?;
            log::info!("wrote {} files", written.len());
        }
        //
        // Run EditGenome
        //
        Some(Commands::EditGenome {
            fasta_dir,
            output_dir,
            base,
            force,
        }) => {
            let written =
                crispr::run_edit_genome(fasta_dir, output_dir.as_deref(), *base, *force)?;
            log::info!("wrote {} files", written.len());
        }
        //
        // Run CopyExomes
        //
        Some(Commands::CopyExomes {
            clinical,
            exome_dir,
            output_dir,
            lower,
            upper,
            force,
        }) => {
            let copied =
                cohort::run_copy_exomes(clinical, exome_dir, output_dir, *lower, *upper, *force)?;
            for code in copied {
                println!("{}", code);
            }
        }
        //
        // Run ExomeReport
        //
        Some(Commands::ExomeReport {
            clinical,
            exome_dir,
            report,
            force,
        }) => {
            cohort::run_exome_report(clinical, exome_dir, report, *force)?;
        }
        //
        // Run Diversity
        //
        Some(Commands::Diversity {
            clinical,
            diversity_dir,
            distance_dir,
            top,
            bottom,
            output_dir,
            clinical_output,
            format,
            max_k,
            seed,
            force,
        }) => {
            let plots = DiversityRun {
                clinical: clinical.clone(),
                diversity_dir: diversity_dir.clone(),
                distance_dir: distance_dir.clone(),
                output_dir: output_dir.clone(),
                clinical_output: clinical_output.clone(),
                top: *top,
                bottom: *bottom,
                max_k: *max_k,
                format: *format,
                seed: *seed,
                force: *force,
            }
            .run()?;
            for p in plots {
                println!("{}\t{}\t{}", p.code_name, p.k, p.kmeans.display());
            }
        }
        //
        // Run Demux
        //
        Some(Commands::Demux {
            fastq,
            samples,
            fastqs_dir,
            force,
        }) => {
            demux::run_demux(fastq, samples, fastqs_dir, *force)?;
        }
        //
        // Run Snps
        //
        Some(Commands::Snps { bam, output }) => {
            let n = pileup::run_snps(bam, output)?;
            log::info!("{} polymorphic sites", n);
        }
        //
        // Run Variants
        //
        Some(Commands::Variants {
            fastq,
            samples,
            reference,
            fastqs_dir,
            bams_dir,
            report,
            reindex,
            savesam,
            force,
            bwa,
            samtools,
        }) => {
            let calls = VariantPipeline {
                fastq: fastq.clone(),
                samples: samples.clone(),
                reference: reference.clone(),
                fastqs_dir: fastqs_dir.clone(),
                bams_dir: bams_dir.clone(),
                report: report.clone(),
                reindex: *reindex,
                savesam: *savesam,
                force: *force,
                aligner: Aligner {
                    bwa: bwa.clone(),
                    samtools: samtools.clone(),
                },
            }
            .run()?;
            log::info!("variants called for {} samples", calls.len());
        }
        //
        // Run Gene
        //
        Some(Commands::Gene {
            gene,
            species,
            output_dir,
            force,
            json,
            mygene_url,
            ensembl_url,
        }) => {
            let client = GeneClient::new(mygene_url, ensembl_url)?;
            let outputs = GeneQuery {
                gene: gene.clone(),
                species: Species::lookup(species)?,
                output_dir: output_dir.clone(),
                force: *force,
                save_json: *json,
            }
            .run(&client)
            .with_context(|| format!("looking up {}", gene))?;
            log::info!(
                "{} ({}): {} homologous species",
                gene,
                outputs.ensembl_id,
                outputs.species.len()
            );
        }
        //
        // Run Orf
        //
        Some(Commands::Orf { fasta, output }) => {
            let n = orf::run_orf(fasta, output)?;
            log::info!("translated {} open reading frames", n);
        }
        //
        // no command opt
        //
        None => {}
    };
    Ok(())
}
