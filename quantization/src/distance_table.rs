use log::debug;
use utils::distance::cosine::{similarity_from_distance, CosineDistanceCalculator};
use utils::distance::l2::L2DistanceCalculator;
use utils::DistanceCalculator;

use crate::codebook::Codebook;
use crate::typing::VectorScalar;

/// Precomputed inter-centroid distances for every subspace.
///
/// Both tables are dense `[num_subvectors][ks][ks]` arrays. The dense layout
/// doubles the memory of a triangular one but gives every subspace a constant
/// `ks * ks` stride, so symmetric lookups reduce to one multiply-add per
/// operand and the gather path needs no index symmetry fixups.
///
/// The L2 table holds squared L2 distances; the cosine table holds
/// similarities, converted back to a distance only at the facade.
#[derive(Debug)]
pub struct DistanceTable {
    num_subvectors: usize,
    ks_per_subvector: usize,
    l2: Vec<f32>,
    cosine: Vec<f32>,
}

impl DistanceTable {
    /// Builds both tables from the codebook. Runs once per construction or
    /// load, single-threaded; entries are never mutated afterwards.
    pub fn build<T: VectorScalar>(codebook: &Codebook<T>) -> Self {
        let num_subvectors = codebook.num_subvectors();
        let ks_per_subvector = codebook.ks_per_subvector();
        let num_entries = num_subvectors * ks_per_subvector * ks_per_subvector;

        let mut l2 = vec![0.0f32; num_entries];
        let mut cosine = vec![0.0f32; num_entries];
        for i in 0..num_subvectors {
            for j in 0..ks_per_subvector {
                // Fill both (j, k) and (k, j): the kernels are symmetric in
                // their arguments, so mirroring halves the build cost and
                // makes table symmetry exact by construction.
                for k in j..ks_per_subvector {
                    let a = codebook.centroid(i, j);
                    let b = codebook.centroid(i, k);
                    let l2_distance = L2DistanceCalculator::calculate(a, b);
                    let cosine_similarity =
                        similarity_from_distance(CosineDistanceCalculator::calculate(a, b));

                    let forward = (i * ks_per_subvector + j) * ks_per_subvector + k;
                    let backward = (i * ks_per_subvector + k) * ks_per_subvector + j;
                    l2[forward] = l2_distance;
                    l2[backward] = l2_distance;
                    cosine[forward] = cosine_similarity;
                    cosine[backward] = cosine_similarity;
                }
            }
        }
        debug!(
            "Built distance tables: {} subvectors, {} centroids, {} f32 entries per table",
            num_subvectors, ks_per_subvector, num_entries
        );

        Self {
            num_subvectors,
            ks_per_subvector,
            l2,
            cosine,
        }
    }

    pub fn num_subvectors(&self) -> usize {
        self.num_subvectors
    }

    pub fn ks_per_subvector(&self) -> usize {
        self.ks_per_subvector
    }

    #[inline]
    fn index(&self, subvector: usize, j: usize, k: usize) -> usize {
        (subvector * self.ks_per_subvector + j) * self.ks_per_subvector + k
    }

    /// Squared L2 distance between centroids `j` and `k` of a subspace.
    #[inline]
    pub fn l2(&self, subvector: usize, j: usize, k: usize) -> f32 {
        self.l2[self.index(subvector, j, k)]
    }

    /// Cosine similarity between centroids `j` and `k` of a subspace.
    #[inline]
    pub fn cosine_similarity(&self, subvector: usize, j: usize, k: usize) -> f32 {
        self.cosine[self.index(subvector, j, k)]
    }

    /// Flat L2 entries for the gather path.
    #[inline]
    pub fn l2_entries(&self) -> &[f32] {
        &self.l2
    }
}
