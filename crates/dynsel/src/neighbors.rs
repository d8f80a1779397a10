//! Nearest-neighbor index over DSEL and the region of competence it returns.
//!
//! Brute-force search keeps ties deterministic: candidates are ordered by
//! distance first and DSEL insertion order second, so identical queries on an
//! identical index always produce the same neighbors in the same order.
use std::cmp::Ordering;

use ndarray::{Array2, ArrayView1};
use serde::{Deserialize, Serialize};

/// Distance metric used by the neighbor index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistanceMetric {
    /// Euclidean distance (L2)
    Euclidean,
    /// Manhattan distance (L1)
    Manhattan,
}

impl Default for DistanceMetric {
    fn default() -> Self {
        Self::Euclidean
    }
}

impl DistanceMetric {
    pub fn distance(&self, a: ArrayView1<'_, f64>, b: ArrayView1<'_, f64>) -> f64 {
        match self {
            DistanceMetric::Euclidean => a
                .iter()
                .zip(b.iter())
                .map(|(ai, bi)| {
                    let d = ai - bi;
                    d * d
                })
                .sum::<f64>()
                .sqrt(),
            DistanceMetric::Manhattan => a.iter().zip(b.iter()).map(|(ai, bi)| (ai - bi).abs()).sum(),
        }
    }
}

/// Ordered neighbors of one query: nearest first.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Region {
    indices: Vec<usize>,
    distances: Vec<f64>,
}

impl Region {
    pub fn new(indices: Vec<usize>, distances: Vec<f64>) -> Self {
        debug_assert_eq!(indices.len(), distances.len());
        Self { indices, distances }
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// DSEL row indices, nearest first.
    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    pub fn distances(&self) -> &[f64] {
        &self.distances
    }

    /// The `k` nearest entries of this region.
    pub fn truncated(&self, k: usize) -> Region {
        let k = k.min(self.len());
        Region {
            indices: self.indices[..k].to_vec(),
            distances: self.distances[..k].to_vec(),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.indices.iter().copied().zip(self.distances.iter().copied())
    }
}

/// Brute-force k-nearest-neighbor index built once over a point set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NeighborIndex {
    points: Array2<f64>,
    metric: DistanceMetric,
}

impl NeighborIndex {
    pub fn new(points: Array2<f64>, metric: DistanceMetric) -> Self {
        Self { points, metric }
    }

    pub fn len(&self) -> usize {
        self.points.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.points.nrows() == 0
    }

    /// Feature width of the indexed points.
    pub fn dim(&self) -> usize {
        self.points.ncols()
    }

    pub fn metric(&self) -> DistanceMetric {
        self.metric
    }

    pub fn points(&self) -> &Array2<f64> {
        &self.points
    }

    /// The `k` nearest points to `point` (fewer if the index is smaller).
    pub fn query(&self, point: ArrayView1<'_, f64>, k: usize) -> Region {
        self.search(point, k, None)
    }

    /// Like [`NeighborIndex::query`] but never returns row `exclude`; used
    /// for leave-one-out neighborhoods of points that live in the index.
    pub fn query_excluding(&self, point: ArrayView1<'_, f64>, k: usize, exclude: usize) -> Region {
        self.search(point, k, Some(exclude))
    }

    fn search(&self, point: ArrayView1<'_, f64>, k: usize, exclude: Option<usize>) -> Region {
        let mut candidates: Vec<(f64, usize)> = self
            .points
            .rows()
            .into_iter()
            .enumerate()
            .filter(|(idx, _)| Some(*idx) != exclude)
            .map(|(idx, row)| (self.metric.distance(point, row), idx))
            .collect();

        let k = k.min(candidates.len());
        if k == 0 {
            return Region::default();
        }
        if k < candidates.len() {
            candidates.select_nth_unstable_by(k - 1, by_distance_then_index);
            candidates.truncate(k);
        }
        candidates.sort_unstable_by(by_distance_then_index);

        let (distances, indices) = candidates.into_iter().unzip();
        Region::new(indices, distances)
    }
}

fn by_distance_then_index(a: &(f64, usize), b: &(f64, usize)) -> Ordering {
    a.0.total_cmp(&b.0).then(a.1.cmp(&b.1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn line_index() -> NeighborIndex {
        // Points 1 and 3 are equidistant from 0.5 / 2.0 queries
        let points = array![[0.0], [1.0], [2.0], [3.0], [1.0]];
        NeighborIndex::new(points, DistanceMetric::Euclidean)
    }

    #[test]
    fn neighbors_are_sorted_by_distance() {
        let index = line_index();
        let region = index.query(array![2.9].view(), 3);
        assert_eq!(region.indices(), &[3, 2, 1]);
        assert!((region.distances()[0] - 0.1).abs() < 1e-12);
    }

    #[test]
    fn ties_follow_insertion_order() {
        let index = line_index();
        // rows 1 and 4 are duplicates, rows 0 and 2 are both at distance 1
        let region = index.query(array![1.0].view(), 4);
        assert_eq!(region.indices(), &[1, 4, 0, 2]);
        let again = index.query(array![1.0].view(), 4);
        assert_eq!(region, again);
    }

    #[test]
    fn excluding_skips_the_query_row() {
        let index = line_index();
        let region = index.query_excluding(array![1.0].view(), 2, 1);
        assert_eq!(region.indices(), &[4, 0]);
    }

    #[test]
    fn k_is_clamped_to_index_size() {
        let index = line_index();
        assert_eq!(index.query(array![0.0].view(), 50).len(), 5);
        assert!(index.query(array![0.0].view(), 0).is_empty());
    }

    #[test]
    fn manhattan_distance() {
        let d = DistanceMetric::Manhattan.distance(array![0.0, 0.0].view(), array![1.0, -2.0].view());
        assert_eq!(d, 3.0);
    }

    #[test]
    fn truncation_keeps_the_nearest() {
        let region = line_index().query(array![0.0].view(), 3).truncated(2);
        assert_eq!(region.indices(), &[0, 1]);
        assert_eq!(region.truncated(10).len(), 2);
    }
}
