use std::fmt::Debug;

use byteorder::{ByteOrder, LittleEndian};
use half::f16;
use serde::{Deserialize, Serialize};

/// Tag naming the scalar element type of a vector. Carried out-of-band next
/// to serialized codebooks, which do not self-describe their element type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VectorValueType {
    F32,
    F16,
    I8,
    U8,
}

/// Scalar element type a quantizer can be instantiated over.
///
/// All supported types embed into f32 exactly, so the distance kernels run in
/// f32 for every instantiation and produce the same values the native type
/// would.
pub trait VectorScalar: Copy + PartialEq + Debug + Send + Sync + 'static {
    /// Serialized width in bytes.
    const DATUM_SIZE: usize;

    fn value_type() -> VectorValueType;

    fn to_f32(self) -> f32;

    fn write_le(self, out: &mut Vec<u8>);

    /// Reads one value from the first `DATUM_SIZE` bytes of `buf`.
    fn read_le(buf: &[u8]) -> Self;
}

impl VectorScalar for f32 {
    const DATUM_SIZE: usize = 4;

    fn value_type() -> VectorValueType {
        VectorValueType::F32
    }

    fn to_f32(self) -> f32 {
        self
    }

    fn write_le(self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.to_le_bytes());
    }

    fn read_le(buf: &[u8]) -> Self {
        LittleEndian::read_f32(buf)
    }
}

impl VectorScalar for f16 {
    const DATUM_SIZE: usize = 2;

    fn value_type() -> VectorValueType {
        VectorValueType::F16
    }

    fn to_f32(self) -> f32 {
        f16::to_f32(self)
    }

    fn write_le(self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.to_le_bytes());
    }

    fn read_le(buf: &[u8]) -> Self {
        f16::from_le_bytes([buf[0], buf[1]])
    }
}

impl VectorScalar for i8 {
    const DATUM_SIZE: usize = 1;

    fn value_type() -> VectorValueType {
        VectorValueType::I8
    }

    fn to_f32(self) -> f32 {
        self as f32
    }

    fn write_le(self, out: &mut Vec<u8>) {
        out.push(self as u8);
    }

    fn read_le(buf: &[u8]) -> Self {
        buf[0] as i8
    }
}

impl VectorScalar for u8 {
    const DATUM_SIZE: usize = 1;

    fn value_type() -> VectorValueType {
        VectorValueType::U8
    }

    fn to_f32(self) -> f32 {
        self as f32
    }

    fn write_le(self, out: &mut Vec<u8>) {
        out.push(self);
    }

    fn read_le(buf: &[u8]) -> Self {
        buf[0]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip<T: VectorScalar>(value: T) -> T {
        let mut buf = Vec::new();
        value.write_le(&mut buf);
        assert_eq!(buf.len(), T::DATUM_SIZE);
        T::read_le(&buf)
    }

    #[test]
    fn test_scalar_roundtrips() {
        assert_eq!(roundtrip(1.5f32), 1.5);
        assert_eq!(roundtrip(f16::from_f32(-0.25)), f16::from_f32(-0.25));
        assert_eq!(roundtrip(-42i8), -42);
        assert_eq!(roundtrip(200u8), 200);
    }

    #[test]
    fn test_exact_widening() {
        assert_eq!((-128i8).to_f32(), -128.0);
        assert_eq!(255u8.to_f32(), 255.0);
        assert_eq!(f16::from_f32(0.5).to_f32(), 0.5);
    }
}
