use std::io::{Read, Write};

use half::f16;
use serde::{Deserialize, Serialize};

use crate::error::QuantizationError;
use crate::pq::ProductQuantizer;
use crate::quantization::Quantizer;
use crate::typing::{VectorScalar, VectorValueType};

/// Kinds of quantizer a registry can host. Product quantization is the only
/// kind today; the tag is serialized next to the scalar type tag so stored
/// indexes stay self-describing at the directory level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QuantizerType {
    ProductQuantizer,
}

/// A product quantizer with its scalar type resolved at runtime.
///
/// Serialized codebooks do not name their element type, so whoever loads one
/// must pick the concrete variant first; this enum is that choice made
/// explicit, with monomorphized quantizers underneath.
#[derive(Debug)]
pub enum TypedQuantizer {
    F32(ProductQuantizer<f32>),
    F16(ProductQuantizer<f16>),
    I8(ProductQuantizer<i8>),
    U8(ProductQuantizer<u8>),
}

macro_rules! dispatch {
    ($self:expr, $quantizer:ident => $body:expr) => {
        match $self {
            TypedQuantizer::F32($quantizer) => $body,
            TypedQuantizer::F16($quantizer) => $body,
            TypedQuantizer::I8($quantizer) => $body,
            TypedQuantizer::U8($quantizer) => $body,
        }
    };
}

impl TypedQuantizer {
    /// Reads a quantizer of the given kind and scalar type from `reader`.
    pub fn load<R: Read>(
        reader: &mut R,
        kind: QuantizerType,
        value_type: VectorValueType,
    ) -> Result<Self, QuantizationError> {
        let QuantizerType::ProductQuantizer = kind;
        Ok(match value_type {
            VectorValueType::F32 => TypedQuantizer::F32(ProductQuantizer::load(reader)?),
            VectorValueType::F16 => TypedQuantizer::F16(ProductQuantizer::load(reader)?),
            VectorValueType::I8 => TypedQuantizer::I8(ProductQuantizer::load(reader)?),
            VectorValueType::U8 => TypedQuantizer::U8(ProductQuantizer::load(reader)?),
        })
    }

    pub fn quantizer_type(&self) -> QuantizerType {
        QuantizerType::ProductQuantizer
    }

    pub fn value_type(&self) -> VectorValueType {
        match self {
            TypedQuantizer::F32(_) => f32::value_type(),
            TypedQuantizer::F16(_) => f16::value_type(),
            TypedQuantizer::I8(_) => i8::value_type(),
            TypedQuantizer::U8(_) => u8::value_type(),
        }
    }

    pub fn quantized_dimension(&self) -> usize {
        dispatch!(self, quantizer => quantizer.quantized_dimension())
    }

    pub fn quantize_size(&self) -> usize {
        dispatch!(self, quantizer => quantizer.quantize_size())
    }

    pub fn reconstruct_size(&self) -> usize {
        dispatch!(self, quantizer => quantizer.reconstruct_size())
    }

    pub fn buffer_size(&self) -> u64 {
        dispatch!(self, quantizer => quantizer.buffer_size())
    }

    pub fn enable_adc(&self) -> bool {
        dispatch!(self, quantizer => quantizer.enable_adc())
    }

    pub fn set_enable_adc(&mut self, enable_adc: bool) {
        dispatch!(self, quantizer => quantizer.set_enable_adc(enable_adc))
    }

    pub fn l2_distance(&self, query: &[u8], point: &[u8]) -> f32 {
        dispatch!(self, quantizer => quantizer.l2_distance(query, point))
    }

    pub fn cosine_distance(&self, query: &[u8], point: &[u8]) -> f32 {
        dispatch!(self, quantizer => quantizer.cosine_distance(query, point))
    }

    pub fn save<W: Write>(&self, writer: &mut W) -> Result<(), QuantizationError> {
        dispatch!(self, quantizer => quantizer.save(writer))
    }
}

/// Holds the quantizer an index searches with: at most one, living exactly as
/// long as its owner keeps the registry alive.
///
/// This is deliberately a value the index owns and threads through its own
/// plumbing, not process-global state; single-writer discipline falls out of
/// `&mut` access.
#[derive(Default)]
pub struct QuantizerRegistry {
    active: Option<TypedQuantizer>,
}

impl QuantizerRegistry {
    pub fn new() -> Self {
        Self { active: None }
    }

    pub fn is_initialized(&self) -> bool {
        self.active.is_some()
    }

    /// The active quantizer, or `NotInitialized` before any `set`/`load`.
    pub fn active(&self) -> Result<&TypedQuantizer, QuantizationError> {
        self.active.as_ref().ok_or(QuantizationError::NotInitialized)
    }

    pub fn active_mut(&mut self) -> Result<&mut TypedQuantizer, QuantizationError> {
        self.active.as_mut().ok_or(QuantizationError::NotInitialized)
    }

    /// Installs a quantizer, replacing any previous one.
    pub fn set(&mut self, quantizer: TypedQuantizer) {
        self.active = Some(quantizer);
    }

    /// Loads and installs in one step. On failure the previously active
    /// quantizer, if any, is left untouched.
    pub fn load<R: Read>(
        &mut self,
        reader: &mut R,
        kind: QuantizerType,
        value_type: VectorValueType,
    ) -> Result<&TypedQuantizer, QuantizationError> {
        let loaded = TypedQuantizer::load(reader, kind, value_type)?;
        Ok(self.active.insert(loaded))
    }

    pub fn take(&mut self) -> Option<TypedQuantizer> {
        self.active.take()
    }

    /// Index teardown path.
    pub fn clear(&mut self) {
        self.active = None;
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use utils::test_utils::generate_random_vector;

    use super::*;

    fn serialized_f32_quantizer() -> (ProductQuantizer<f32>, Vec<u8>) {
        let codebook = generate_random_vector(4 * 16 * 2);
        let pq = ProductQuantizer::new(4, 16, 2, false, codebook).expect("shape is valid");
        let mut buffer = Vec::new();
        ProductQuantizer::save(&pq, &mut buffer).expect("save");
        (pq, buffer)
    }

    #[test]
    fn test_registry_starts_uninitialized() {
        let registry = QuantizerRegistry::new();
        assert!(!registry.is_initialized());
        assert!(matches!(
            registry.active().unwrap_err(),
            QuantizationError::NotInitialized
        ));
    }

    #[test]
    fn test_registry_load_and_clear() {
        let (pq, buffer) = serialized_f32_quantizer();
        let mut registry = QuantizerRegistry::new();
        registry
            .load(
                &mut Cursor::new(&buffer),
                QuantizerType::ProductQuantizer,
                VectorValueType::F32,
            )
            .expect("load");

        let active = registry.active().expect("initialized");
        assert_eq!(active.value_type(), VectorValueType::F32);
        assert_eq!(active.quantized_dimension(), 4);
        assert_eq!(active.buffer_size(), pq.buffer_size());

        let v = generate_random_vector(pq.dimension());
        let w = generate_random_vector(pq.dimension());
        let code_v = pq.quantize(&v).expect("quantize");
        let code_w = pq.quantize(&w).expect("quantize");
        assert_eq!(
            active.l2_distance(&code_v, &code_w),
            pq.l2_distance(&code_v, &code_w)
        );
        assert_eq!(
            active.cosine_distance(&code_v, &code_w),
            pq.cosine_distance(&code_v, &code_w)
        );

        registry.clear();
        assert!(!registry.is_initialized());
    }

    #[test]
    fn test_registry_failed_load_keeps_previous() {
        let (_, buffer) = serialized_f32_quantizer();
        let mut registry = QuantizerRegistry::new();
        registry
            .load(
                &mut Cursor::new(&buffer),
                QuantizerType::ProductQuantizer,
                VectorValueType::F32,
            )
            .expect("load");

        let truncated = &buffer[..buffer.len() - 1];
        let err = registry
            .load(
                &mut Cursor::new(truncated),
                QuantizerType::ProductQuantizer,
                VectorValueType::F32,
            )
            .unwrap_err();
        assert!(matches!(err, QuantizationError::IoFailed(_)));
        assert!(registry.is_initialized());
    }

    #[test]
    fn test_registry_adc_toggle() {
        let (_, buffer) = serialized_f32_quantizer();
        let mut registry = QuantizerRegistry::new();
        registry
            .load(
                &mut Cursor::new(&buffer),
                QuantizerType::ProductQuantizer,
                VectorValueType::F32,
            )
            .expect("load");

        assert!(!registry.active().expect("initialized").enable_adc());
        let symmetric_size = registry.active().expect("initialized").quantize_size();
        registry
            .active_mut()
            .expect("initialized")
            .set_enable_adc(true);
        let adc_size = registry.active().expect("initialized").quantize_size();
        assert_eq!(symmetric_size, 4);
        assert_eq!(adc_size, 2 * 4 * 16 * 4);
    }
}
