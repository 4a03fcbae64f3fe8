use super::error::{Error, SeqlabResult};
use super::{myio, orf};
use reqwest::blocking::Client;
use reqwest::header;
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeSet;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const MYGENE_URL: &str = "https://mygene.info";
pub const ENSEMBL_URL: &str = "https://rest.ensembl.org";
pub const DEFAULT_SPECIES: &str = "homo sapiens";

pub const GENE_FASTA_SUFFIX: &str = "_gene_AA.fasta";
pub const HOMOLOGY_SUFFIX: &str = "_homology_list.txt";

/// A species and its names in the two services.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Species {
    pub name: &'static str,
    pub mygene: &'static str,
    pub ensembl: &'static str,
}

pub const SPECIES: [Species; 4] = [
    Species {
        name: "homo sapiens",
        mygene: "human",
        ensembl: "homo_sapiens",
    },
    Species {
        name: "mus musculus",
        mygene: "mouse",
        ensembl: "mus_musculus",
    },
    Species {
        name: "rattus norvegicus",
        mygene: "rat",
        ensembl: "rattus_norvegicus",
    },
    Species {
        name: "danio rerio",
        mygene: "zebrafish",
        ensembl: "danio_rerio",
    },
];

impl Species {
    /// Look a species up by any of its names.
    /// # Example
    /// ```
    /// use seqlab::gene::Species;
    /// assert_eq!(Species::lookup("Homo Sapiens").unwrap().ensembl, "homo_sapiens");
    /// assert_eq!(Species::lookup("mouse").unwrap().name, "mus musculus");
    /// assert!(Species::lookup("felis catus").is_err());
    /// ```
    pub fn lookup(name: &str) -> SeqlabResult<&'static Species> {
        let key = name.trim().to_lowercase();
        SPECIES
            .iter()
            .find(|s| s.name == key || s.mygene == key || s.ensembl == key)
            .ok_or_else(|| Error::UnknownSpecies(name.to_string()))
    }
}

#[derive(Debug, Deserialize)]
struct MyGeneResponse {
    #[serde(default)]
    hits: Vec<MyGeneHit>,
}

#[derive(Debug, Deserialize)]
struct MyGeneHit {
    ensembl: Option<EnsemblField>,
}

// mygene returns a list when a symbol maps to several Ensembl genes
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum EnsemblField {
    One(EnsemblRef),
    Many(Vec<EnsemblRef>),
}

#[derive(Debug, Deserialize)]
struct EnsemblRef {
    gene: Option<String>,
}

/// Genomic sequence of an Ensembl gene.
#[derive(Debug, Clone, Deserialize)]
pub struct EnsemblSequence {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub desc: Option<String>,
    pub seq: String,
}

#[derive(Debug, Deserialize)]
struct HomologyResponse {
    #[serde(default)]
    data: Vec<HomologyData>,
}

#[derive(Debug, Deserialize)]
struct HomologyData {
    #[serde(default)]
    homologies: Vec<Homology>,
}

#[derive(Debug, Deserialize)]
struct Homology {
    species: Option<String>,
    target: Option<HomologyTarget>,
}

#[derive(Debug, Deserialize)]
struct HomologyTarget {
    species: Option<String>,
}

/// Ensembl gene id of the first mygene.info hit.
/// # Example
/// ```
/// let data = serde_json::json!({"hits": [{"ensembl": {"gene": "ENSG00000198211"}, "symbol": "MC1R"}]});
/// let id = seqlab::gene::ensembl_id_from_mygene("MC1R", &data).unwrap();
/// assert_eq!(id, "ENSG00000198211");
/// ```
pub fn ensembl_id_from_mygene(gene: &str, data: &Value) -> SeqlabResult<String> {
    let response: MyGeneResponse = serde_json::from_value(data.clone())?;
    let hit = response
        .hits
        .into_iter()
        .next()
        .ok_or_else(|| Error::NoHits(gene.to_string()))?;
    let id = match hit.ensembl {
        Some(EnsemblField::One(r)) => r.gene,
        Some(EnsemblField::Many(refs)) => refs.into_iter().find_map(|r| r.gene),
        None => None,
    };
    id.ok_or_else(|| Error::NoEnsemblId(gene.to_string()))
}

pub fn parse_sequence(data: &Value) -> SeqlabResult<EnsemblSequence> {
    Ok(serde_json::from_value(data.clone())?)
}

/// Sorted, distinct species with a homolog of the gene, `exclude` left out.
pub fn homologous_species(data: &Value, exclude: &str) -> SeqlabResult<Vec<String>> {
    let response: HomologyResponse = serde_json::from_value(data.clone())?;
    let Some(first) = response.data.into_iter().next() else {
        log::warn!("No homology data found");
        return Ok(Vec::new());
    };
    let species: BTreeSet<String> = first
        .homologies
        .into_iter()
        .filter_map(|h| h.species.or_else(|| h.target.and_then(|t| t.species)))
        .filter(|s| s != exclude)
        .collect();
    Ok(species.into_iter().collect())
}

/// Write the gene sequence and, when one exists, the translation of its longest ORF.
pub fn write_gene_fasta<W: Write>(out: &mut W, ensembl_id: &str, sequence: &EnsemblSequence) -> SeqlabResult<()> {
    let desc = sequence
        .desc
        .as_deref()
        .or(sequence.id.as_deref())
        .unwrap_or(ensembl_id);
    writeln!(out, ">{}", desc)?;
    writeln!(out, "{}", sequence.seq)?;
    match orf::longest_orf(&sequence.seq) {
        Some(longest) => {
            log::debug!("longest ORF: {} bp", longest.len());
            writeln!(out, ">{}:longest_ORF:AA", ensembl_id)?;
            writeln!(out, "{}", orf::translate(&longest))?;
        }
        None => log::warn!("{} has no open reading frame", ensembl_id),
    }
    Ok(())
}

/// Blocking client for mygene.info and the Ensembl REST API.
pub struct GeneClient {
    client: Client,
    mygene_url: String,
    ensembl_url: String,
}

impl GeneClient {
    pub fn new(mygene_url: &str, ensembl_url: &str) -> SeqlabResult<GeneClient> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::USER_AGENT,
            header::HeaderValue::from_static(concat!("seqlab/", env!("CARGO_PKG_VERSION"))),
        );
        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(60))
            .build()?;
        Ok(GeneClient {
            client,
            mygene_url: mygene_url.trim_end_matches('/').to_string(),
            ensembl_url: ensembl_url.trim_end_matches('/').to_string(),
        })
    }

    fn get_json(&self, url: &str, params: &[(&str, &str)]) -> SeqlabResult<Value> {
        log::debug!("GET {} {:?}", url, params);
        let response = self.client.get(url).query(params).send()?;
        let status = response.status().as_u16();
        if status != 200 && status != 301 {
            return Err(Error::Api {
                url: url.to_string(),
                status,
            });
        }
        Ok(response.json()?)
    }

    pub fn query_mygene(&self, gene: &str, species: &Species) -> SeqlabResult<Value> {
        self.get_json(
            &format!("{}/v3/query", self.mygene_url),
            &[
                ("q", gene),
                ("species", species.mygene),
                ("fields", "symbol,name,ensembl,taxid"),
            ],
        )
    }

    pub fn sequence(&self, ensembl_id: &str) -> SeqlabResult<Value> {
        self.get_json(
            &format!("{}/sequence/id/{}", self.ensembl_url, ensembl_id),
            &[("content-type", "application/json"), ("type", "genomic")],
        )
    }

    pub fn homology(&self, ensembl_id: &str) -> SeqlabResult<Value> {
        self.get_json(
            &format!("{}/homology/id/{}", self.ensembl_url, ensembl_id),
            &[
                ("content-type", "application/json"),
                ("layout", "condensed"),
                ("sequence", "none"),
            ],
        )
    }
}

/// What to look up and where the results go.
#[derive(Debug, Clone)]
pub struct GeneQuery {
    pub gene: String,
    pub species: &'static Species,
    pub output_dir: PathBuf,
    pub force: bool,
    /// Keep the raw JSON responses next to the outputs.
    pub save_json: bool,
}

#[derive(Debug, Clone)]
pub struct GeneOutputs {
    pub ensembl_id: String,
    pub fasta: PathBuf,
    pub homologs: PathBuf,
    pub species: Vec<String>,
}

impl GeneQuery {
    pub fn fasta_path(&self) -> PathBuf {
        self.output_dir.join(format!("{}{}", self.gene, GENE_FASTA_SUFFIX))
    }

    pub fn homology_path(&self) -> PathBuf {
        self.output_dir.join(format!("{}{}", self.gene, HOMOLOGY_SUFFIX))
    }

    fn save(&self, name: &str, data: &Value) -> SeqlabResult<()> {
        if self.save_json {
            let mut out = myio::writer(self.output_dir.join(name))?;
            serde_json::to_writer_pretty(&mut out, data)?;
            writeln!(out)?;
            out.flush()?;
        }
        Ok(())
    }

    pub fn run(&self, client: &GeneClient) -> SeqlabResult<GeneOutputs> {
        log::info!("-- Setup output --");
        let (fasta, homologs) = (self.fasta_path(), self.homology_path());
        myio::check_outputs(&[&fasta, &homologs], self.force)?;
        fs::create_dir_all(&self.output_dir)?;

        log::info!("-- get ensembl ID from mygene.info --");
        let data = client.query_mygene(&self.gene, self.species)?;
        self.save("mygene.json", &data)?;
        let ensembl_id = ensembl_id_from_mygene(&self.gene, &data)?;
        log::info!("Ensembl ID: {}", ensembl_id);

        log::info!("-- get nucleotide sequence via Ensembl --");
        let data = client.sequence(&ensembl_id)?;
        self.save("ensembl_gene.json", &data)?;
        let sequence = parse_sequence(&data)?;

        log::info!("-- get homologous genes via Ensembl --");
        let data = client.homology(&ensembl_id)?;
        self.save("ensembl_homolog.json", &data)?;
        let species = homologous_species(&data, self.species.ensembl)?;

        // outputs are only replaced once every request has succeeded
        let mut out = myio::writer(&fasta)?;
        write_gene_fasta(&mut out, &ensembl_id, &sequence)?;
        out.flush()?;
        write_lines(&homologs, &species)?;

        Ok(GeneOutputs {
            ensembl_id,
            fasta,
            homologs,
            species,
        })
    }
}

fn write_lines(path: &Path, lines: &[String]) -> SeqlabResult<()> {
    let mut out = myio::writer(path)?;
    for line in lines {
        writeln!(out, "{}", line)?;
    }
    out.flush()?;
    Ok(())
}
