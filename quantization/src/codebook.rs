use crate::error::QuantizationError;
use crate::typing::VectorScalar;

/// Centroid indices are stored in one byte per subspace.
pub const MAX_KS_PER_SUBVECTOR: usize = 256;

/// Owns the trained centroids for every subspace, laid out row-major as
/// `[num_subvectors][ks_per_subvector][dim_per_subvector]`. Immutable after
/// construction.
///
/// The buffer is kept twice: in the native scalar type (the serialization and
/// reconstruction domain) and widened to f32 (the kernel domain). The widening
/// is exact for every supported scalar type, and the f32 copy is small next to
/// the distance tables derived from it.
#[derive(Debug)]
pub struct Codebook<T: VectorScalar> {
    num_subvectors: usize,
    ks_per_subvector: usize,
    dim_per_subvector: usize,
    data: Vec<T>,
    kernel_data: Vec<f32>,
}

impl<T: VectorScalar> Codebook<T> {
    /// Takes ownership of the centroid buffer. Fails with `BadCodebookShape`
    /// unless the buffer holds exactly
    /// `num_subvectors * ks_per_subvector * dim_per_subvector` values and each
    /// extent is usable.
    pub fn new(
        num_subvectors: usize,
        ks_per_subvector: usize,
        dim_per_subvector: usize,
        data: Vec<T>,
    ) -> Result<Self, QuantizationError> {
        let expected_len = num_subvectors * ks_per_subvector * dim_per_subvector;
        if num_subvectors == 0
            || ks_per_subvector == 0
            || dim_per_subvector == 0
            || ks_per_subvector > MAX_KS_PER_SUBVECTOR
            || data.len() != expected_len
        {
            return Err(QuantizationError::BadCodebookShape {
                num_subvectors,
                ks_per_subvector,
                dim_per_subvector,
                buffer_len: data.len(),
            });
        }

        let kernel_data = data.iter().map(|value| value.to_f32()).collect();
        Ok(Self {
            num_subvectors,
            ks_per_subvector,
            dim_per_subvector,
            data,
            kernel_data,
        })
    }

    pub fn num_subvectors(&self) -> usize {
        self.num_subvectors
    }

    pub fn ks_per_subvector(&self) -> usize {
        self.ks_per_subvector
    }

    pub fn dim_per_subvector(&self) -> usize {
        self.dim_per_subvector
    }

    /// Full-vector dimension.
    pub fn dimension(&self) -> usize {
        self.num_subvectors * self.dim_per_subvector
    }

    #[inline]
    fn centroid_offset(&self, subvector: usize, index: usize) -> usize {
        (subvector * self.ks_per_subvector + index) * self.dim_per_subvector
    }

    /// Centroid `index` of subspace `subvector`, widened to f32.
    #[inline]
    pub fn centroid(&self, subvector: usize, index: usize) -> &[f32] {
        let offset = self.centroid_offset(subvector, index);
        &self.kernel_data[offset..offset + self.dim_per_subvector]
    }

    /// Centroid `index` of subspace `subvector` in the native scalar type.
    #[inline]
    pub fn centroid_native(&self, subvector: usize, index: usize) -> &[T] {
        let offset = self.centroid_offset(subvector, index);
        &self.data[offset..offset + self.dim_per_subvector]
    }

    /// The whole buffer as little-endian bytes, row-major.
    pub fn to_le_bytes(&self) -> Vec<u8> {
        let mut buffer = Vec::with_capacity(self.data.len() * T::DATUM_SIZE);
        for value in self.data.iter() {
            value.write_le(&mut buffer);
        }
        buffer
    }

    /// Rebuilds a codebook from the byte layout produced by `to_le_bytes`.
    pub fn from_le_bytes(
        num_subvectors: usize,
        ks_per_subvector: usize,
        dim_per_subvector: usize,
        bytes: &[u8],
    ) -> Result<Self, QuantizationError> {
        let mut data = Vec::with_capacity(bytes.len() / T::DATUM_SIZE);
        for chunk in bytes.chunks_exact(T::DATUM_SIZE) {
            data.push(T::read_le(chunk));
        }
        Self::new(num_subvectors, ks_per_subvector, dim_per_subvector, data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codebook_access() {
        // 2 subspaces, 2 centroids each, 2 dims per centroid.
        let data = vec![0.0f32, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 1.0];
        let codebook = Codebook::new(2, 2, 2, data).expect("shape is valid");
        assert_eq!(codebook.dimension(), 4);
        assert_eq!(codebook.centroid(0, 1), &[1.0, 0.0]);
        assert_eq!(codebook.centroid(1, 1), &[0.0, 1.0]);
        assert_eq!(codebook.centroid_native(1, 0), &[0.0, 0.0]);
    }

    #[test]
    fn test_codebook_rejects_bad_shapes() {
        let err = Codebook::new(2, 2, 2, vec![0.0f32; 7]).unwrap_err();
        assert!(matches!(
            err,
            QuantizationError::BadCodebookShape { buffer_len: 7, .. }
        ));

        assert!(Codebook::new(0, 2, 2, Vec::<f32>::new()).is_err());
        assert!(Codebook::new(2, 0, 2, Vec::<f32>::new()).is_err());
        assert!(Codebook::new(2, 2, 0, Vec::<f32>::new()).is_err());
        // 257 centroids cannot be addressed by a byte code.
        assert!(Codebook::new(1, 257, 1, vec![0.0f32; 257]).is_err());
    }

    #[test]
    fn test_codebook_byte_roundtrip() {
        let data = vec![-3i8, 7, 100, -128, 0, 1, 2, 3];
        let codebook = Codebook::new(2, 2, 2, data.clone()).expect("shape is valid");
        let bytes = codebook.to_le_bytes();
        assert_eq!(bytes.len(), 8);
        let restored = Codebook::<i8>::from_le_bytes(2, 2, 2, &bytes).expect("shape is valid");
        for subvector in 0..2 {
            for index in 0..2 {
                assert_eq!(
                    codebook.centroid_native(subvector, index),
                    restored.centroid_native(subvector, index)
                );
            }
        }
        // Widening matches the native values.
        assert_eq!(restored.centroid(0, 0), &[-3.0, 7.0]);
    }
}
