#![feature(portable_simd)]

use std::simd::Simd;

pub mod distance;
pub mod test_utils;

pub trait DistanceCalculator {
    /// Distance between two vectors of the same length.
    fn calculate(a: &[f32], b: &[f32]) -> f32;

    /// Accumulate partial results for full LANES-sized chunks of `a` and `b`
    /// into `accumulator`. Leftover elements are the caller's concern.
    fn accumulate_lanes<const LANES: usize>(
        a: &[f32],
        b: &[f32],
        accumulator: &mut Simd<f32, LANES>,
    );

    fn accumulate_scalar(a: &[f32], b: &[f32]) -> f32;
}
