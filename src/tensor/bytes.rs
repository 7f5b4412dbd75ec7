//! Byte reinterpretation of `f32` buffers.
//!
//! Both directions use native endianness and must preserve the byte count
//! exactly (`floats * 4 == bytes`). A mismatch means a shape was computed
//! wrong somewhere upstream, so it is reported as `ShapeMismatch` rather
//! than padded or truncated.

use crate::error::{ClassifyError, Result};

const F32_SIZE: usize = std::mem::size_of::<f32>();

/// Copies the raw bytes of `values`.
pub fn f32s_to_bytes(values: &[f32]) -> Vec<u8> {
    bytemuck::cast_slice(values).to_vec()
}

/// Reads `bytes` back as `f32`s.
///
/// The input may come from any allocation and is not guaranteed to be
/// 4-byte aligned, so values are decoded chunk by chunk instead of cast in
/// place.
pub fn bytes_to_f32s(bytes: &[u8]) -> Result<Vec<f32>> {
    if bytes.len() % F32_SIZE != 0 {
        return Err(ClassifyError::ShapeMismatch {
            context: "byte to f32 reinterpretation",
            expected: bytes.len() / F32_SIZE * F32_SIZE + F32_SIZE,
            actual: bytes.len(),
        });
    }
    Ok(bytes
        .chunks_exact(F32_SIZE)
        .map(|c| f32::from_ne_bytes([c[0], c[1], c[2], c[3]]))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_is_bit_exact() {
        let values = vec![0.0, -0.0, 1.0 / 255.0, f32::MIN_POSITIVE, f32::INFINITY, 123.456];
        let bytes = f32s_to_bytes(&values);
        assert_eq!(bytes.len(), values.len() * 4);

        let back = bytes_to_f32s(&bytes).unwrap();
        let bits: Vec<u32> = values.iter().map(|v| v.to_bits()).collect();
        let back_bits: Vec<u32> = back.iter().map(|v| v.to_bits()).collect();
        assert_eq!(bits, back_bits);
    }

    #[test]
    fn test_nan_payload_survives() {
        let nan = f32::from_bits(0x7fc0_1234);
        let back = bytes_to_f32s(&f32s_to_bytes(&[nan])).unwrap();
        assert_eq!(back[0].to_bits(), 0x7fc0_1234);
    }

    #[test]
    fn test_misaligned_length_is_shape_mismatch() {
        let err = bytes_to_f32s(&[0u8; 7]).unwrap_err();
        assert!(matches!(
            err,
            ClassifyError::ShapeMismatch { expected: 8, actual: 7, .. }
        ));
    }

    #[test]
    fn test_unaligned_slice_decodes() {
        let mut buf = vec![0u8];
        buf.extend_from_slice(&f32s_to_bytes(&[2.5, -4.0]));
        assert_eq!(bytes_to_f32s(&buf[1..]).unwrap(), vec![2.5, -4.0]);
    }
}
