use super::error::{Error, SeqlabResult};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

pub const DEFAULT_SEED: u64 = 42;
pub const MAX_ITER: usize = 300;
/// Independent k-means++ starts per fit; the lowest inertia wins.
pub const N_INIT: usize = 10;

pub type Point = (f64, f64);

/// A fitted clustering.
#[derive(Debug, Clone, PartialEq)]
pub struct KMeans {
    pub centroids: Vec<Point>,
    pub labels: Vec<usize>,
    /// Sum of squared distances of every point to its centroid.
    pub inertia: f64,
}

fn dist2(a: Point, b: Point) -> f64 {
    (a.0 - b.0).powi(2) + (a.1 - b.1).powi(2)
}

fn nearest(p: Point, centroids: &[Point]) -> (usize, f64) {
    centroids
        .iter()
        .enumerate()
        .map(|(i, &c)| (i, dist2(p, c)))
        .fold((0, f64::INFINITY), |best, cur| if cur.1 < best.1 { cur } else { best })
}

/// k-means++ seeding: each next centroid is drawn with probability proportional to its
/// squared distance from the closest centroid already chosen.
fn seed_centroids(points: &[Point], k: usize, rng: &mut StdRng) -> Vec<Point> {
    let mut centroids = vec![points[rng.gen_range(0..points.len())]];
    while centroids.len() < k {
        let d2: Vec<f64> = points.iter().map(|&p| nearest(p, &centroids).1).collect();
        let total: f64 = d2.iter().sum();
        if total <= 0.0 {
            centroids.push(points[rng.gen_range(0..points.len())]);
            continue;
        }
        let mut target = rng.gen::<f64>() * total;
        let mut chosen = points.len() - 1;
        for (i, d) in d2.iter().enumerate() {
            if target < *d {
                chosen = i;
                break;
            }
            target -= d;
        }
        centroids.push(points[chosen]);
    }
    centroids
}

fn lloyd(points: &[Point], mut centroids: Vec<Point>, max_iter: usize) -> KMeans {
    let k = centroids.len();
    let mut labels = vec![usize::MAX; points.len()];
    for iter in 0..max_iter {
        let mut changed = false;
        for (label, &p) in labels.iter_mut().zip(points) {
            let (best, _) = nearest(p, &centroids);
            if *label != best {
                *label = best;
                changed = true;
            }
        }
        if !changed {
            log::trace!("k-means converged after {} iterations", iter);
            break;
        }
        let mut sums = vec![(0.0, 0.0, 0usize); k];
        for (&label, &p) in labels.iter().zip(points) {
            sums[label].0 += p.0;
            sums[label].1 += p.1;
            sums[label].2 += 1;
        }
        for (c, (sx, sy, n)) in centroids.iter_mut().zip(sums) {
            // an empty cluster keeps its previous centroid
            if n > 0 {
                *c = (sx / n as f64, sy / n as f64);
            }
        }
    }
    let inertia = points
        .iter()
        .zip(&labels)
        .map(|(&p, &l)| dist2(p, centroids[l]))
        .sum();
    KMeans {
        centroids,
        labels,
        inertia,
    }
}

/// Cluster `points` into `k` groups. Results only depend on `seed`.
/// # Example
/// ```
/// let pts = vec![(0.0, 0.0), (0.1, 0.0), (5.0, 5.0), (5.1, 5.0)];
/// let fit = seqlab::kmeans::kmeans(&pts, 2, 42).unwrap();
/// assert_eq!(fit.labels[0], fit.labels[1]);
/// assert_ne!(fit.labels[1], fit.labels[2]);
/// assert!(fit.inertia < 0.1);
/// ```
pub fn kmeans(points: &[Point], k: usize, seed: u64) -> SeqlabResult<KMeans> {
    if k == 0 || k > points.len() {
        return Err(Error::Invalid(format!(
            "cannot make {} clusters from {} points",
            k,
            points.len()
        )));
    }
    let mut rng = StdRng::seed_from_u64(seed);
    let mut best: Option<KMeans> = None;
    for _ in 0..N_INIT {
        let fit = lloyd(points, seed_centroids(points, k, &mut rng), MAX_ITER);
        if best.as_ref().map_or(true, |b| fit.inertia < b.inertia) {
            best = Some(fit);
        }
    }
    best.ok_or_else(|| Error::Invalid("k-means produced no fit".to_string()))
}

/// Inertia for k = 1..=max_k (fewer when there are fewer points).
pub fn inertias(points: &[Point], max_k: usize, seed: u64) -> SeqlabResult<Vec<f64>> {
    (1..=max_k.min(points.len()))
        .map(|k| kmeans(points, k, seed).map(|fit| fit.inertia))
        .collect()
}

/// Pick k (1-based) from an inertia curve: the point lying farthest below the straight
/// line from the first to the last inertia, both axes scaled to `[0, 1]`.
/// # Example
/// ```
/// use seqlab::kmeans::elbow;
/// assert_eq!(elbow(&[100.0, 20.0, 15.0, 12.0, 10.0]), 2);
/// assert_eq!(elbow(&[3.0]), 1);
/// ```
pub fn elbow(inertias: &[f64]) -> usize {
    let n = inertias.len();
    if n < 3 {
        return n.max(1);
    }
    let (first, last) = (inertias[0], inertias[n - 1]);
    let range = first - last;
    if range <= 0.0 {
        return 1;
    }
    let mut best = (1, 0.0);
    for (i, &inertia) in inertias.iter().enumerate() {
        let x = i as f64 / (n - 1) as f64;
        let y = (inertia - last) / range;
        let below = (1.0 - x) - y;
        if below > best.1 {
            best = (i + 1, below);
        }
    }
    best.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn three_blobs() -> Vec<Point> {
        let centers = [(0.0, 0.0), (10.0, 0.0), (0.0, 10.0)];
        let mut pts = Vec::new();
        for (cx, cy) in centers {
            for i in 0..10 {
                pts.push((cx + (i % 3) as f64 * 0.1, cy + (i / 3) as f64 * 0.1));
            }
        }
        pts
    }

    #[test]
    fn test_three_blobs() {
        let pts = three_blobs();
        let curve = inertias(&pts, 10, DEFAULT_SEED).unwrap();
        assert_eq!(curve.len(), 10);
        assert_eq!(elbow(&curve), 3);

        let fit = kmeans(&pts, 3, DEFAULT_SEED).unwrap();
        for blob in pts.chunks(10).zip(fit.labels.chunks(10)) {
            assert!(blob.1.iter().all(|&l| l == blob.1[0]));
        }
        let mut distinct = fit.labels.clone();
        distinct.sort_unstable();
        distinct.dedup();
        assert_eq!(distinct.len(), 3);
    }

    #[test]
    fn test_deterministic() {
        let pts = three_blobs();
        assert_eq!(kmeans(&pts, 4, 7).unwrap(), kmeans(&pts, 4, 7).unwrap());
    }

    #[test]
    fn test_bad_k_and_duplicates() {
        let pts = vec![(1.0, 1.0); 4];
        assert!(kmeans(&pts, 0, 1).is_err());
        assert!(kmeans(&pts, 5, 1).is_err());
        let fit = kmeans(&pts, 3, 1).unwrap();
        assert_eq!(fit.inertia, 0.0);
        assert_eq!(elbow(&inertias(&pts, 4, 1).unwrap()), 1);
    }
}
