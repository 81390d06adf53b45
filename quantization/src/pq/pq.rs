use std::io::{Read, Write};
use std::mem::size_of;
use std::simd::num::SimdFloat;
use std::simd::Simd;

use byteorder::{ByteOrder, LittleEndian, ReadBytesExt, WriteBytesExt};
use log::info;
use strum::EnumIter;
use utils::distance::cosine::CosineDistanceCalculator;
use utils::distance::l2::L2DistanceCalculator;
use utils::DistanceCalculator;

use crate::codebook::{Codebook, MAX_KS_PER_SUBVECTOR};
use crate::distance_table::DistanceTable;
use crate::error::QuantizationError;
use crate::quantization::Quantizer;
use crate::typing::VectorScalar;

/// Subspaces folded into one table gather.
const GATHER_LANES: usize = 8;

/// Serialized header: num_subvectors, ks_per_subvector, dim_per_subvector.
const HEADER_SIZE: usize = 3 * size_of::<i32>();

#[derive(Debug, Clone, Copy, PartialEq, EnumIter)]
pub enum PqDistanceImpl {
    Scalar,
    SIMD,
}

/// Product quantizer over scalar type `T`.
///
/// Compresses a vector of `num_subvectors * dim_per_subvector` scalars into
/// one centroid index per subspace. Symmetric distances are looked up in the
/// precomputed inter-centroid tables; with ADC enabled, `quantize` instead
/// emits a per-query lookup buffer so the query side keeps full precision.
///
/// All distance and reconstruction calls take `&self` and are safe to share
/// across threads; the two mutators (`set_enable_adc`, wholesale replacement
/// after a load) require `&mut self`.
#[derive(Debug)]
pub struct ProductQuantizer<T: VectorScalar> {
    codebook: Codebook<T>,
    distance_table: DistanceTable,
    enable_adc: bool,
}

impl<T: VectorScalar> ProductQuantizer<T> {
    /// Takes ownership of a pre-trained centroid buffer in row-major
    /// `[num_subvectors][ks_per_subvector][dim_per_subvector]` order and
    /// eagerly builds the distance tables.
    pub fn new(
        num_subvectors: usize,
        ks_per_subvector: usize,
        dim_per_subvector: usize,
        enable_adc: bool,
        codebook_data: Vec<T>,
    ) -> Result<Self, QuantizationError> {
        let codebook = Codebook::new(
            num_subvectors,
            ks_per_subvector,
            dim_per_subvector,
            codebook_data,
        )?;
        let distance_table = DistanceTable::build(&codebook);
        Ok(Self {
            codebook,
            distance_table,
            enable_adc,
        })
    }

    pub fn num_subvectors(&self) -> usize {
        self.codebook.num_subvectors()
    }

    pub fn ks_per_subvector(&self) -> usize {
        self.codebook.ks_per_subvector()
    }

    pub fn dim_per_subvector(&self) -> usize {
        self.codebook.dim_per_subvector()
    }

    /// Full-vector dimension.
    pub fn dimension(&self) -> usize {
        self.codebook.dimension()
    }

    pub fn codebook(&self) -> &Codebook<T> {
        &self.codebook
    }

    pub fn enable_adc(&self) -> bool {
        self.enable_adc
    }

    /// Switches between symmetric codes and ADC query buffers. Exclusive
    /// access: callers must not race this against in-flight operations, which
    /// `&mut self` already enforces within safe code.
    pub fn set_enable_adc(&mut self, enable_adc: bool) {
        self.enable_adc = enable_adc;
    }

    fn quantize_symmetric(&self, query: &[f32]) -> Result<Vec<u8>, QuantizationError> {
        let ks_per_subvector = self.ks_per_subvector();
        let dim_per_subvector = self.dim_per_subvector();

        let mut codes = Vec::with_capacity(self.num_subvectors());
        for (subvector, query_sub) in query.chunks_exact(dim_per_subvector).enumerate() {
            let mut best_index: Option<usize> = None;
            let mut min_distance = f32::INFINITY;
            for index in 0..ks_per_subvector {
                let distance = L2DistanceCalculator::calculate(
                    query_sub,
                    self.codebook.centroid(subvector, index),
                );
                // Strictly-better only: equidistant centroids resolve to the
                // smaller index.
                if distance < min_distance {
                    min_distance = distance;
                    best_index = Some(index);
                }
            }
            let best_index =
                best_index.ok_or(QuantizationError::EmptyCodebook { subvector })?;
            codes.push(best_index as u8);
        }
        Ok(codes)
    }

    fn quantize_adc(&self, query: &[f32]) -> Vec<u8> {
        let ks_per_subvector = self.ks_per_subvector();
        let dim_per_subvector = self.dim_per_subvector();

        let mut buffer = Vec::with_capacity(self.quantize_size());
        for (subvector, query_sub) in query.chunks_exact(dim_per_subvector).enumerate() {
            for index in 0..ks_per_subvector {
                let distance = L2DistanceCalculator::calculate(
                    query_sub,
                    self.codebook.centroid(subvector, index),
                );
                buffer.extend_from_slice(&distance.to_le_bytes());
            }
        }
        for (subvector, query_sub) in query.chunks_exact(dim_per_subvector).enumerate() {
            for index in 0..ks_per_subvector {
                let distance = CosineDistanceCalculator::calculate(
                    query_sub,
                    self.codebook.centroid(subvector, index),
                );
                buffer.extend_from_slice(&distance.to_le_bytes());
            }
        }
        buffer
    }

    fn auto_impl(&self) -> PqDistanceImpl {
        // The gather only pays for itself once a full group of lanes exists.
        if self.num_subvectors() >= GATHER_LANES {
            PqDistanceImpl::SIMD
        } else {
            PqDistanceImpl::Scalar
        }
    }

    /// Symmetric L2 with an explicit implementation choice. Both variants
    /// read the same table entries and agree up to summation order.
    pub fn l2_distance_with_impl(
        &self,
        query: &[u8],
        point: &[u8],
        implem: PqDistanceImpl,
    ) -> f32 {
        if self.enable_adc {
            return self.l2_distance_adc(query, point);
        }
        match implem {
            PqDistanceImpl::Scalar => self.l2_distance_scalar(query, point),
            PqDistanceImpl::SIMD => self.l2_distance_gather(query, point),
        }
    }

    fn l2_distance_scalar(&self, query: &[u8], point: &[u8]) -> f32 {
        query
            .iter()
            .zip(point.iter())
            .enumerate()
            .map(|(subvector, (&j, &k))| {
                self.distance_table.l2(subvector, j as usize, k as usize)
            })
            .sum()
    }

    fn l2_distance_gather(&self, query: &[u8], point: &[u8]) -> f32 {
        let ks_per_subvector = self.distance_table.ks_per_subvector();
        let stride = ks_per_subvector * ks_per_subvector;
        let table = self.distance_table.l2_entries();
        let num_subvectors = query.len().min(point.len());

        let mut accumulator = Simd::<f32, GATHER_LANES>::splat(0.0);
        let mut subvector = 0;
        while subvector + GATHER_LANES <= num_subvectors {
            let mut indices = [0usize; GATHER_LANES];
            for lane in 0..GATHER_LANES {
                let s = subvector + lane;
                indices[lane] =
                    s * stride + (query[s] as usize) * ks_per_subvector + point[s] as usize;
            }
            accumulator +=
                Simd::<f32, GATHER_LANES>::gather_or_default(table, Simd::from_array(indices));
            subvector += GATHER_LANES;
        }

        let mut distance = accumulator.reduce_sum();
        while subvector < num_subvectors {
            distance += self.distance_table.l2(
                subvector,
                query[subvector] as usize,
                point[subvector] as usize,
            );
            subvector += 1;
        }
        distance
    }

    fn l2_distance_adc(&self, query: &[u8], point: &[u8]) -> f32 {
        let ks_per_subvector = self.ks_per_subvector();
        let mut distance = 0.0;
        for (subvector, &code) in point.iter().enumerate() {
            let offset = (subvector * ks_per_subvector + code as usize) * size_of::<f32>();
            distance += LittleEndian::read_f32(&query[offset..]);
        }
        distance
    }

    fn cosine_distance_adc(&self, query: &[u8], point: &[u8]) -> f32 {
        let ks_per_subvector = self.ks_per_subvector();
        // Second half of the query buffer; entries are already distances.
        let base = self.num_subvectors() * ks_per_subvector * size_of::<f32>();
        let mut distance = 0.0;
        for (subvector, &code) in point.iter().enumerate() {
            let offset =
                base + (subvector * ks_per_subvector + code as usize) * size_of::<f32>();
            distance += LittleEndian::read_f32(&query[offset..]);
        }
        distance
    }

    /// Serializes the shape header and the codebook, little-endian. The
    /// scalar type is not written; it travels out-of-band with the registry.
    pub fn save<W: Write + ?Sized>(&self, writer: &mut W) -> Result<(), QuantizationError> {
        writer.write_i32::<LittleEndian>(self.num_subvectors() as i32)?;
        writer.write_i32::<LittleEndian>(self.ks_per_subvector() as i32)?;
        writer.write_i32::<LittleEndian>(self.dim_per_subvector() as i32)?;
        writer.write_all(&self.codebook.to_le_bytes())?;
        info!(
            "Saved quantizer: num_subvectors={} ks_per_subvector={} dim_per_subvector={}",
            self.num_subvectors(),
            self.ks_per_subvector(),
            self.dim_per_subvector()
        );
        Ok(())
    }

    /// Reads a quantizer serialized by `save` and rebuilds its distance
    /// tables exactly as construction does. Returns a fresh value, so a
    /// failed load cannot tear an existing quantizer; ADC starts disabled.
    pub fn load<R: Read>(reader: &mut R) -> Result<Self, QuantizationError> {
        let num_subvectors = reader.read_i32::<LittleEndian>()?;
        let ks_per_subvector = reader.read_i32::<LittleEndian>()?;
        let dim_per_subvector = reader.read_i32::<LittleEndian>()?;

        if num_subvectors <= 0 || ks_per_subvector <= 0 || dim_per_subvector <= 0 {
            return Err(QuantizationError::MalformedHeader {
                num_subvectors,
                ks_per_subvector,
                dim_per_subvector,
                reason: "dimension counts must be positive",
            });
        }
        if ks_per_subvector as usize > MAX_KS_PER_SUBVECTOR {
            return Err(QuantizationError::MalformedHeader {
                num_subvectors,
                ks_per_subvector,
                dim_per_subvector,
                reason: "centroid count not addressable by a byte code",
            });
        }

        let num_subvectors = num_subvectors as usize;
        let ks_per_subvector = ks_per_subvector as usize;
        let dim_per_subvector = dim_per_subvector as usize;

        let mut buffer =
            vec![0u8; T::DATUM_SIZE * num_subvectors * ks_per_subvector * dim_per_subvector];
        reader.read_exact(&mut buffer)?;

        let codebook = Codebook::from_le_bytes(
            num_subvectors,
            ks_per_subvector,
            dim_per_subvector,
            &buffer,
        )?;
        let distance_table = DistanceTable::build(&codebook);
        info!(
            "Loaded quantizer: num_subvectors={} ks_per_subvector={} dim_per_subvector={}",
            num_subvectors, ks_per_subvector, dim_per_subvector
        );
        Ok(Self {
            codebook,
            distance_table,
            enable_adc: false,
        })
    }
}

impl<T: VectorScalar> Quantizer for ProductQuantizer<T> {
    type Scalar = T;

    fn quantize(&self, vector: &[T]) -> Result<Vec<u8>, QuantizationError> {
        debug_assert_eq!(vector.len(), self.dimension());
        // Widen once per call; exact for every supported scalar type.
        let query: Vec<f32> = vector.iter().map(|value| value.to_f32()).collect();
        if self.enable_adc {
            Ok(self.quantize_adc(&query))
        } else {
            self.quantize_symmetric(&query)
        }
    }

    fn quantized_dimension(&self) -> usize {
        self.num_subvectors()
    }

    fn quantize_size(&self) -> usize {
        if self.enable_adc {
            2 * self.num_subvectors() * self.ks_per_subvector() * size_of::<f32>()
        } else {
            self.num_subvectors()
        }
    }

    fn reconstruct(&self, code: &[u8]) -> Vec<T> {
        let mut vector = Vec::with_capacity(self.dimension());
        for (subvector, &index) in code.iter().enumerate() {
            vector.extend_from_slice(self.codebook.centroid_native(subvector, index as usize));
        }
        vector
    }

    fn reconstruct_size(&self) -> usize {
        self.num_subvectors() * self.dim_per_subvector() * T::DATUM_SIZE
    }

    fn buffer_size(&self) -> u64 {
        (HEADER_SIZE
            + T::DATUM_SIZE
                * self.num_subvectors()
                * self.ks_per_subvector()
                * self.dim_per_subvector()) as u64
    }

    fn l2_distance(&self, query: &[u8], point: &[u8]) -> f32 {
        if self.enable_adc {
            self.l2_distance_adc(query, point)
        } else {
            self.l2_distance_with_impl(query, point, self.auto_impl())
        }
    }

    fn cosine_distance(&self, query: &[u8], point: &[u8]) -> f32 {
        if self.enable_adc {
            return self.cosine_distance_adc(query, point);
        }
        // Per-subspace distances are summed in both modes. The table stores
        // similarities, so the sum of (1 - sim_i) telescopes to m - sum(sim).
        let similarity: f32 = query
            .iter()
            .zip(point.iter())
            .enumerate()
            .map(|(subvector, (&j, &k))| {
                self.distance_table
                    .cosine_similarity(subvector, j as usize, k as usize)
            })
            .sum();
        self.num_subvectors() as f32 - similarity
    }

    fn save(&self, writer: &mut dyn Write) -> Result<(), QuantizationError> {
        ProductQuantizer::save(self, writer)
    }
}
