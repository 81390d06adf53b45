use std::ops::AddAssign;
use std::simd::num::SimdFloat;
use std::simd::Simd;

use crate::DistanceCalculator;

pub struct DotProductCalculator {}

impl DotProductCalculator {
    pub fn calculate_scalar(a: &[f32], b: &[f32]) -> f32 {
        Self::accumulate_scalar(a, b)
    }
}

impl DistanceCalculator for DotProductCalculator {
    fn calculate(a: &[f32], b: &[f32]) -> f32 {
        let mut res = 0.0;
        let mut a_vec = a;
        let mut b_vec = b;

        if a_vec.len() >= 16 {
            let mut accumulator = Simd::<f32, 16>::splat(0.0);
            Self::accumulate_lanes::<16>(a_vec, b_vec, &mut accumulator);
            res += accumulator.reduce_sum();
            a_vec = a_vec.chunks_exact(16).remainder();
            b_vec = b_vec.chunks_exact(16).remainder();
        }

        if a_vec.len() >= 8 {
            let mut accumulator = Simd::<f32, 8>::splat(0.0);
            Self::accumulate_lanes::<8>(a_vec, b_vec, &mut accumulator);
            res += accumulator.reduce_sum();
            a_vec = a_vec.chunks_exact(8).remainder();
            b_vec = b_vec.chunks_exact(8).remainder();
        }

        if a_vec.len() >= 4 {
            let mut accumulator = Simd::<f32, 4>::splat(0.0);
            Self::accumulate_lanes::<4>(a_vec, b_vec, &mut accumulator);
            res += accumulator.reduce_sum();
            a_vec = a_vec.chunks_exact(4).remainder();
            b_vec = b_vec.chunks_exact(4).remainder();
        }

        res + Self::accumulate_scalar(a_vec, b_vec)
    }

    fn accumulate_lanes<const LANES: usize>(
        a: &[f32],
        b: &[f32],
        accumulator: &mut Simd<f32, LANES>,
    ) {
        a.chunks_exact(LANES)
            .zip(b.chunks_exact(LANES))
            .for_each(|(a_chunk, b_chunk)| {
                let a_simd = Simd::<f32, LANES>::from_slice(a_chunk);
                let b_simd = Simd::<f32, LANES>::from_slice(b_chunk);
                accumulator.add_assign(a_simd * b_simd);
            });
    }

    fn accumulate_scalar(a: &[f32], b: &[f32]) -> f32 {
        a.iter().zip(b.iter()).map(|(&x, &y)| x * y).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::generate_random_vector;

    #[test]
    fn test_basic_dot_product() {
        let a = [0.0, 3.0, -5.0];
        let b = [-3.0, 9.0, 8.0];
        let known_product = 0.0 * -3.0 + 3.0 * 9.0 + -5.0 * 8.0;
        assert_eq!(DotProductCalculator::calculate(&a, &b), known_product);
        assert_eq!(DotProductCalculator::calculate_scalar(&a, &b), known_product);
    }

    #[test]
    fn test_dot_product_simd_matches_scalar() {
        let a = generate_random_vector(128);
        let b = generate_random_vector(128);
        let epsilon = 1e-5;
        let simd = DotProductCalculator::calculate(&a, &b);
        let scalar = DotProductCalculator::calculate_scalar(&a, &b);
        assert!((simd - scalar).abs() < epsilon);
    }
}
