use std::io::Write;

use crate::error::QuantizationError;
use crate::typing::VectorScalar;

/// The capability set an ANN index needs from a quantizer: compress a vector
/// into a byte code, reconstruct an approximation, and evaluate distances on
/// compressed operands in place of exact distances at search time.
pub trait Quantizer {
    type Scalar: VectorScalar;

    /// Compress a vector. In symmetric mode the output is one centroid index
    /// per subspace; in ADC mode it is the per-query lookup buffer consumed by
    /// the distance calls. Either way the output is `quantize_size()` bytes.
    fn quantize(&self, vector: &[Self::Scalar]) -> Result<Vec<u8>, QuantizationError>;

    /// Number of subspaces, i.e. the length of a byte code.
    fn quantized_dimension(&self) -> usize;

    /// Size in bytes of one `quantize` output in the current mode.
    fn quantize_size(&self) -> usize;

    /// Approximate the original vector from its byte code.
    fn reconstruct(&self, code: &[u8]) -> Vec<Self::Scalar>;

    /// Size in bytes of one reconstructed vector.
    fn reconstruct_size(&self) -> usize;

    /// Serialized size in bytes, header included.
    fn buffer_size(&self) -> u64;

    /// Squared L2 distance between two quantized operands.
    fn l2_distance(&self, query: &[u8], point: &[u8]) -> f32;

    /// Cosine distance proxy between two quantized operands. Summed per
    /// subspace rather than re-normalized, so only relative order is
    /// meaningful.
    fn cosine_distance(&self, query: &[u8], point: &[u8]) -> f32;

    fn save(&self, writer: &mut dyn Write) -> Result<(), QuantizationError>;
}
