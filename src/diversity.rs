use super::cli::PlotFormat;
use super::cohort::HEADER_CODENAME;
use super::error::{Error, SeqlabResult};
use super::kmeans::{self, Point};
use super::myio;
use super::plot::{self, Clusters, Elbow, Scatter};
use super::table::Table;
use statrs::statistics::Statistics;
use std::cmp::Ordering;
use std::fs;
use std::io::BufRead;
use std::path::{Path, PathBuf};

pub const DIVERSITY_SUFFIX: &str = ".diversity.txt";
pub const DISTANCE_SUFFIX: &str = ".distance.txt";
pub const DEFAULT_CLINICAL_OUTPUT: &str = "clinical_data_with_diversity.txt";
pub const AVERAGES_HEADER: &str = "averages";
pub const STD_HEADER: &str = "std";

fn parse_number(path: &Path, line: usize, field: &str) -> SeqlabResult<f64> {
    field.trim().parse::<f64>().map_err(|_| Error::Parse {
        path: path.display().to_string(),
        line,
        msg: format!("`{}` is not a number", field),
    })
}

/// One number per line; blank lines are skipped.
pub fn read_values(path: &Path) -> SeqlabResult<Vec<f64>> {
    let mut values = Vec::new();
    for (idx, line) in myio::reader(path)?.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        values.push(parse_number(path, idx + 1, &line)?);
    }
    Ok(values)
}

/// Two numeric columns per line, split on a comma or whitespace.
pub fn read_distances(path: &Path) -> SeqlabResult<Vec<Point>> {
    let mut points = Vec::new();
    for (idx, line) in myio::reader(path)?.lines().enumerate() {
        let line = line?;
        let fields: Vec<&str> = line
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|f| !f.is_empty())
            .collect();
        match fields.as_slice() {
            [] => continue,
            [x, y] => points.push((parse_number(path, idx + 1, x)?, parse_number(path, idx + 1, y)?)),
            _ => {
                return Err(Error::Parse {
                    path: path.display().to_string(),
                    line: idx + 1,
                    msg: format!("expected 2 columns, found {}", fields.len()),
                })
            }
        }
    }
    Ok(points)
}

/// Mean and sample standard deviation, `None` without values.
/// # Example
/// ```
/// let (mean, std) = seqlab::diversity::mean_std(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]).unwrap();
/// assert!((mean - 5.0).abs() < 1e-9);
/// assert!((std - 2.138).abs() < 1e-3);
/// assert!(seqlab::diversity::mean_std(&[]).is_none());
/// ```
pub fn mean_std(values: &[f64]) -> Option<(f64, f64)> {
    if values.is_empty() {
        return None;
    }
    Some((values.mean(), values.std_dev()))
}

/// The `n_top` highest and `m_bottom` lowest means, highest first; each code appears once.
/// # Example
/// ```
/// use seqlab::diversity::select_extremes;
/// let means = vec![("A".to_string(), 1.0), ("B".to_string(), 3.0), ("C".to_string(), 2.0)];
/// assert_eq!(select_extremes(&means, 2, 1), vec!["B", "C", "A"]);
/// assert_eq!(select_extremes(&means, 3, 3), vec!["B", "C", "A"]);
/// ```
pub fn select_extremes(means: &[(String, f64)], n_top: usize, m_bottom: usize) -> Vec<String> {
    let mut sorted: Vec<&(String, f64)> = means.iter().collect();
    sorted.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
    let mut selected: Vec<String> = sorted.iter().take(n_top).map(|(c, _)| c.clone()).collect();
    for (code, _) in sorted.iter().rev().take(m_bottom) {
        if !selected.contains(code) {
            selected.push(code.clone());
        }
    }
    selected
}

/// Add `averages` and `std` columns from `<diversity_dir>/<code_name>.diversity.txt`.
/// Returns the codes that had diversity values, with their means.
pub fn annotate_clinical(table: &mut Table, diversity_dir: &Path) -> SeqlabResult<Vec<(String, f64)>> {
    let codes: Vec<String> = table
        .values(HEADER_CODENAME)?
        .into_iter()
        .map(str::to_string)
        .collect();
    let mut means = Vec::new();
    let mut averages = Vec::with_capacity(codes.len());
    let mut stds = Vec::with_capacity(codes.len());
    for code in &codes {
        let path = diversity_dir.join(format!("{}{}", code, DIVERSITY_SUFFIX));
        let stats = if path.exists() {
            mean_std(&read_values(&path)?)
        } else {
            None
        };
        match stats {
            Some((mean, std)) => {
                log::debug!("{}: mean {} std {}", code, mean, std);
                averages.push(mean.to_string());
                stds.push(std.to_string());
                means.push((code.clone(), mean));
            }
            None => {
                log::warn!("no diversity values for {}", code);
                averages.push(String::new());
                stds.push(String::new());
            }
        }
    }
    table.add_column(AVERAGES_HEADER, averages)?;
    table.add_column(STD_HEADER, stds)?;
    Ok(means)
}

/// Arguments of a `diversity` run.
#[derive(Debug, Clone)]
pub struct DiversityRun {
    pub clinical: PathBuf,
    pub diversity_dir: PathBuf,
    pub distance_dir: PathBuf,
    pub output_dir: PathBuf,
    pub clinical_output: String,
    pub top: usize,
    pub bottom: usize,
    pub max_k: usize,
    pub format: PlotFormat,
    pub seed: u64,
    pub force: bool,
}

/// Plots written for one sample.
#[derive(Debug, Clone, PartialEq)]
pub struct SamplePlots {
    pub code_name: String,
    pub scatter: PathBuf,
    pub elbow: PathBuf,
    pub kmeans: PathBuf,
    pub k: usize,
}

impl DiversityRun {
    fn plot_path(&self, code: &str, kind: &str) -> PathBuf {
        self.output_dir
            .join(format!("{}_{}.{}", code, kind, self.format.extension()))
    }

    fn plot_sample(&self, code: &str) -> SeqlabResult<SamplePlots> {
        let distances = self.distance_dir.join(format!("{}{}", code, DISTANCE_SUFFIX));
        myio::check_inputs(&[&distances])?;
        let points = read_distances(&distances)?;
        if points.is_empty() {
            return Err(Error::Invalid(format!("{} has no points", distances.display())));
        }

        let out = SamplePlots {
            code_name: code.to_string(),
            scatter: self.plot_path(code, "scatter"),
            elbow: self.plot_path(code, "elbow"),
            kmeans: self.plot_path(code, "kmeans"),
            k: 0,
        };
        myio::prepare_outputs(&[&out.scatter, &out.elbow, &out.kmeans], self.force)?;

        plot::save(
            &Scatter {
                title: code.to_string(),
                points: &points,
            },
            &out.scatter,
            self.format,
        )?;
        let curve = kmeans::inertias(&points, self.max_k, self.seed)?;
        let k = kmeans::elbow(&curve);
        log::info!("{}: {} points, elbow at k = {}", code, points.len(), k);
        plot::save(
            &Elbow {
                title: format!("{} elbow", code),
                inertias: &curve,
                chosen_k: k,
            },
            &out.elbow,
            self.format,
        )?;
        let fit = kmeans::kmeans(&points, k, self.seed)?;
        plot::save(
            &Clusters {
                title: format!("{} k-means (k = {})", code, k),
                points: &points,
                fit: &fit,
            },
            &out.kmeans,
            self.format,
        )?;
        Ok(SamplePlots { k, ..out })
    }

    pub fn run(&self) -> SeqlabResult<Vec<SamplePlots>> {
        myio::check_inputs(&[&self.clinical])?;
        myio::check_dirs(&[&self.diversity_dir, &self.distance_dir])?;
        if self.max_k == 0 {
            return Err(Error::Invalid("--max-k must be at least 1".to_string()));
        }
        fs::create_dir_all(&self.output_dir)?;
        let clinical_out = self.output_dir.join(&self.clinical_output);
        myio::prepare_outputs(&[&clinical_out], self.force)?;

        let mut table = Table::from_path(&self.clinical)?;
        let means = annotate_clinical(&mut table, &self.diversity_dir)?;
        table.write(&clinical_out)?;
        log::info!("wrote {}", clinical_out.display());

        select_extremes(&means, self.top, self.bottom)
            .iter()
            .map(|code| self.plot_sample(code))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(dir: &Path, name: &str, text: &str) {
        fs::write(dir.join(name), text).unwrap();
    }

    #[test]
    fn test_distance_formats() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "a.txt", "1.5,2\n\n3 4.25\n");
        assert_eq!(
            read_distances(&dir.path().join("a.txt")).unwrap(),
            vec![(1.5, 2.0), (3.0, 4.25)]
        );
        write(dir.path(), "b.txt", "1,2,3\n");
        assert!(matches!(
            read_distances(&dir.path().join("b.txt")),
            Err(Error::Parse { line: 1, .. })
        ));
        write(dir.path(), "c.txt", "1\nx\n");
        assert!(matches!(
            read_values(&dir.path().join("c.txt")),
            Err(Error::Parse { line: 2, .. })
        ));
    }

    #[test]
    fn test_diversity_run() {
        let dir = tempfile::tempdir().unwrap();
        let div = dir.path().join("div");
        let dist = dir.path().join("dist");
        fs::create_dir_all(&div).unwrap();
        fs::create_dir_all(&dist).unwrap();
        write(&div, "FOX.diversity.txt", "1\n2\n3\n");
        write(&div, "HEN.diversity.txt", "10\n20\n");
        write(&div, "OWL.diversity.txt", "5\n");
        // YAK has no diversity file
        let blobs = "0,0\n0.1,0\n0,0.1\n5,5\n5.1,5\n5,5.1\n10,0\n10.1,0\n10,0.1\n";
        for code in ["FOX", "HEN", "OWL"] {
            write(&dist, &format!("{}.distance.txt", code), blobs);
        }

        let run = DiversityRun {
            clinical: PathBuf::from(".test/clinical_data.txt"),
            diversity_dir: div,
            distance_dir: dist,
            output_dir: dir.path().join("out"),
            clinical_output: DEFAULT_CLINICAL_OUTPUT.to_string(),
            top: 1,
            bottom: 1,
            max_k: 5,
            format: PlotFormat::Svg,
            seed: kmeans::DEFAULT_SEED,
            force: false,
        };
        let plots = run.run().unwrap();
        let codes: Vec<&str> = plots.iter().map(|p| p.code_name.as_str()).collect();
        assert_eq!(codes, vec!["HEN", "FOX"]);
        assert_eq!(plots[0].k, 3);
        assert!(plots[0].kmeans.ends_with("HEN_kmeans.svg"));
        assert!(plots[1].scatter.exists());

        let table = Table::from_path(run.output_dir.join(DEFAULT_CLINICAL_OUTPUT)).unwrap();
        assert_eq!(table.values(AVERAGES_HEADER).unwrap(), vec!["2", "15", "5", ""]);
        assert_eq!(table.values(STD_HEADER).unwrap()[0], "1");

        // rerunning needs --force
        assert!(matches!(run.run(), Err(Error::OutputExists(_))));
        DiversityRun { force: true, ..run }.run().unwrap();
    }
}
