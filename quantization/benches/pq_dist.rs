use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use quantization::pq::{PqDistanceImpl, ProductQuantizer};
use quantization::quantization::Quantizer;
use strum::IntoEnumIterator;
use utils::test_utils::generate_random_vector;

fn bench_pq_distance(c: &mut Criterion) {
    env_logger::init();
    let mut group = c.benchmark_group("PQ Distance");
    for num_subvectors in [8, 16, 32, 96].iter() {
        for dim_per_subvector in [4, 8].iter() {
            let ks_per_subvector = 256;
            let codebook =
                generate_random_vector(num_subvectors * ks_per_subvector * dim_per_subvector);
            let pq = ProductQuantizer::<f32>::new(
                *num_subvectors,
                ks_per_subvector,
                *dim_per_subvector,
                false,
                codebook,
            )
            .expect("Failed to build ProductQuantizer");

            let dimension = num_subvectors * dim_per_subvector;
            let point = pq
                .quantize(&generate_random_vector(dimension))
                .expect("Failed to quantize");
            let query = pq
                .quantize(&generate_random_vector(dimension))
                .expect("Failed to quantize");

            for implementation in PqDistanceImpl::iter() {
                group.bench_with_input(
                    BenchmarkId::new(
                        &format!(
                            "pq_distance_{}_{}_{}",
                            *num_subvectors, ks_per_subvector, *dim_per_subvector
                        ),
                        &format!("{:?}", &implementation),
                    ),
                    &implementation,
                    |bencher, implem| {
                        bencher.iter(|| {
                            pq.l2_distance_with_impl(
                                black_box(&query),
                                black_box(&point),
                                *implem,
                            )
                        })
                    },
                );
            }
        }
    }
    group.finish();
}

criterion_group!(benches, bench_pq_distance);
criterion_main!(benches);
