//! Self-describing binary encoding for feature arrays
//!
//! Blob layout: magic `VPFA`, format version, dtype tag, rank, u64
//! little-endian dimensions, then raw little-endian element data. Shape,
//! dtype and values are all recoverable from the blob alone.

use crate::error::{Result, VoiceprintError};

const MAGIC: &[u8; 4] = b"VPFA";
const FORMAT_VERSION: u8 = 1;

/// Fixed header length: magic + version + dtype tag + rank.
const HEADER_LEN: usize = 7;

/// Element type of a stored feature array.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dtype {
    F32,
    F64,
    I32,
    I64,
}

impl Dtype {
    fn tag(self) -> u8 {
        match self {
            Dtype::F32 => 0,
            Dtype::F64 => 1,
            Dtype::I32 => 2,
            Dtype::I64 => 3,
        }
    }

    fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            0 => Some(Dtype::F32),
            1 => Some(Dtype::F64),
            2 => Some(Dtype::I32),
            3 => Some(Dtype::I64),
            _ => None,
        }
    }

    /// Size of one element in bytes.
    pub fn element_size(self) -> usize {
        match self {
            Dtype::F32 | Dtype::I32 => 4,
            Dtype::F64 | Dtype::I64 => 8,
        }
    }
}

/// Typed element storage for a feature array.
#[derive(Debug, Clone, PartialEq)]
pub enum ArrayValues {
    F32(Vec<f32>),
    F64(Vec<f64>),
    I32(Vec<i32>),
    I64(Vec<i64>),
}

impl ArrayValues {
    pub fn len(&self) -> usize {
        match self {
            ArrayValues::F32(data) => data.len(),
            ArrayValues::F64(data) => data.len(),
            ArrayValues::I32(data) => data.len(),
            ArrayValues::I64(data) => data.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn dtype(&self) -> Dtype {
        match self {
            ArrayValues::F32(_) => Dtype::F32,
            ArrayValues::F64(_) => Dtype::F64,
            ArrayValues::I32(_) => Dtype::I32,
            ArrayValues::I64(_) => Dtype::I64,
        }
    }
}

/// An owned numeric array with shape, as persisted per speaker.
///
/// Typically a 2-D f64 matrix of MFCC features, but any shape and any
/// supported dtype round-trips through the codec.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureArray {
    shape: Vec<usize>,
    values: ArrayValues,
}

impl FeatureArray {
    /// Build an array, checking that the element count matches the shape.
    ///
    /// Rank is limited to 255: the blob encodes it as a single byte.
    pub fn new(shape: Vec<usize>, values: ArrayValues) -> Result<Self> {
        if shape.len() > u8::MAX as usize {
            return Err(VoiceprintError::MalformedBlob {
                reason: format!("rank {} exceeds the encodable maximum of 255", shape.len()),
            });
        }
        let expected: usize = shape.iter().product();
        if expected != values.len() {
            return Err(VoiceprintError::ShapeMismatch {
                expected,
                actual: values.len(),
                shape,
            });
        }
        Ok(Self { shape, values })
    }

    pub fn from_f32(shape: Vec<usize>, data: Vec<f32>) -> Result<Self> {
        Self::new(shape, ArrayValues::F32(data))
    }

    pub fn from_f64(shape: Vec<usize>, data: Vec<f64>) -> Result<Self> {
        Self::new(shape, ArrayValues::F64(data))
    }

    pub fn from_i32(shape: Vec<usize>, data: Vec<i32>) -> Result<Self> {
        Self::new(shape, ArrayValues::I32(data))
    }

    pub fn from_i64(shape: Vec<usize>, data: Vec<i64>) -> Result<Self> {
        Self::new(shape, ArrayValues::I64(data))
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn values(&self) -> &ArrayValues {
        &self.values
    }

    pub fn dtype(&self) -> Dtype {
        self.values.dtype()
    }

    /// Total number of elements.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Encoder/decoder between feature arrays and payload blobs.
///
/// Owned by the store and invoked explicitly on the write and read paths;
/// nothing is registered globally.
#[derive(Debug, Clone, Copy, Default)]
pub struct ArrayCodec;

impl ArrayCodec {
    /// Encode an array as a self-describing blob.
    pub fn encode(&self, array: &FeatureArray) -> Vec<u8> {
        let data_len = array.len() * array.dtype().element_size();
        let mut out = Vec::with_capacity(HEADER_LEN + array.shape().len() * 8 + data_len);

        out.extend_from_slice(MAGIC);
        out.push(FORMAT_VERSION);
        out.push(array.dtype().tag());
        out.push(array.shape().len() as u8);
        for &dim in array.shape() {
            out.extend_from_slice(&(dim as u64).to_le_bytes());
        }

        match array.values() {
            ArrayValues::F32(data) => {
                for v in data {
                    out.extend_from_slice(&v.to_le_bytes());
                }
            }
            ArrayValues::F64(data) => {
                for v in data {
                    out.extend_from_slice(&v.to_le_bytes());
                }
            }
            ArrayValues::I32(data) => {
                for v in data {
                    out.extend_from_slice(&v.to_le_bytes());
                }
            }
            ArrayValues::I64(data) => {
                for v in data {
                    out.extend_from_slice(&v.to_le_bytes());
                }
            }
        }

        out
    }

    /// Decode a blob back into an array.
    ///
    /// Fails with `MalformedBlob` on bad magic, unknown version or dtype,
    /// truncated shape or data, and trailing bytes. Never panics on
    /// arbitrary input.
    pub fn decode(&self, bytes: &[u8]) -> Result<FeatureArray> {
        if bytes.len() < HEADER_LEN {
            return Err(malformed("blob shorter than header"));
        }
        if &bytes[0..4] != MAGIC {
            return Err(malformed("bad magic"));
        }
        if bytes[4] != FORMAT_VERSION {
            return Err(malformed(format!("unsupported format version {}", bytes[4])));
        }
        let dtype = Dtype::from_tag(bytes[5])
            .ok_or_else(|| malformed(format!("unknown dtype tag {}", bytes[5])))?;
        let rank = bytes[6] as usize;

        let dims_end = HEADER_LEN + rank * 8;
        if bytes.len() < dims_end {
            return Err(malformed("truncated shape"));
        }
        let mut shape = Vec::with_capacity(rank);
        for chunk in bytes[HEADER_LEN..dims_end].chunks_exact(8) {
            let dim = u64::from_le_bytes(to_array(chunk));
            let dim = usize::try_from(dim).map_err(|_| malformed("dimension overflows usize"))?;
            shape.push(dim);
        }

        let count = shape
            .iter()
            .try_fold(1usize, |acc, &dim| acc.checked_mul(dim))
            .ok_or_else(|| malformed("element count overflows"))?;
        let expected_bytes = count
            .checked_mul(dtype.element_size())
            .ok_or_else(|| malformed("data length overflows"))?;

        let payload = &bytes[dims_end..];
        if payload.len() != expected_bytes {
            return Err(malformed(format!(
                "expected {} data bytes for shape {:?}, got {}",
                expected_bytes,
                shape,
                payload.len()
            )));
        }

        let values = match dtype {
            Dtype::F32 => ArrayValues::F32(
                payload
                    .chunks_exact(4)
                    .map(|c| f32::from_le_bytes(to_array(c)))
                    .collect(),
            ),
            Dtype::F64 => ArrayValues::F64(
                payload
                    .chunks_exact(8)
                    .map(|c| f64::from_le_bytes(to_array(c)))
                    .collect(),
            ),
            Dtype::I32 => ArrayValues::I32(
                payload
                    .chunks_exact(4)
                    .map(|c| i32::from_le_bytes(to_array(c)))
                    .collect(),
            ),
            Dtype::I64 => ArrayValues::I64(
                payload
                    .chunks_exact(8)
                    .map(|c| i64::from_le_bytes(to_array(c)))
                    .collect(),
            ),
        };

        FeatureArray::new(shape, values)
    }
}

fn malformed(reason: impl Into<String>) -> VoiceprintError {
    VoiceprintError::MalformedBlob {
        reason: reason.into(),
    }
}

/// Copy a slice into a fixed-size array. The caller guarantees the length.
fn to_array<const N: usize>(chunk: &[u8]) -> [u8; N] {
    let mut buf = [0u8; N];
    buf.copy_from_slice(chunk);
    buf
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codec() -> ArrayCodec {
        ArrayCodec
    }

    #[test]
    fn test_round_trip_f64_matrix() {
        let data: Vec<f64> = (0..39).map(|i| i as f64 * 0.25 - 4.0).collect();
        let array = FeatureArray::from_f64(vec![3, 13], data).unwrap();

        let blob = codec().encode(&array);
        let decoded = codec().decode(&blob).unwrap();

        assert_eq!(decoded, array);
        assert_eq!(decoded.shape(), &[3, 13]);
        assert_eq!(decoded.dtype(), Dtype::F64);
    }

    #[test]
    fn test_round_trip_all_dtypes() {
        let arrays = vec![
            FeatureArray::from_f32(vec![4], vec![1.5, -2.25, 0.0, f32::MIN]).unwrap(),
            FeatureArray::from_f64(vec![2, 2], vec![1e300, -1e-300, 0.0, 7.0]).unwrap(),
            FeatureArray::from_i32(vec![3], vec![i32::MIN, 0, i32::MAX]).unwrap(),
            FeatureArray::from_i64(vec![3], vec![i64::MIN, -1, i64::MAX]).unwrap(),
        ];

        for array in arrays {
            let decoded = codec().decode(&codec().encode(&array)).unwrap();
            assert_eq!(decoded, array);
        }
    }

    #[test]
    fn test_round_trip_scalar_and_empty() {
        let scalar = FeatureArray::from_f32(vec![], vec![3.5]).unwrap();
        assert_eq!(codec().decode(&codec().encode(&scalar)).unwrap(), scalar);

        let empty = FeatureArray::from_i64(vec![0], vec![]).unwrap();
        assert_eq!(codec().decode(&codec().encode(&empty)).unwrap(), empty);
    }

    #[test]
    fn test_shape_mismatch_rejected() {
        let result = FeatureArray::from_f32(vec![2, 3], vec![1.0, 2.0]);
        match result.unwrap_err() {
            VoiceprintError::ShapeMismatch {
                expected, actual, ..
            } => {
                assert_eq!(expected, 6);
                assert_eq!(actual, 2);
            }
            other => panic!("Expected ShapeMismatch, got: {:?}", other),
        }
    }

    #[test]
    fn test_decode_bad_magic() {
        let mut blob = codec().encode(&FeatureArray::from_f32(vec![1], vec![1.0]).unwrap());
        blob[0] = b'X';
        assert!(matches!(
            codec().decode(&blob),
            Err(VoiceprintError::MalformedBlob { .. })
        ));
    }

    #[test]
    fn test_decode_unknown_dtype() {
        let mut blob = codec().encode(&FeatureArray::from_f32(vec![1], vec![1.0]).unwrap());
        blob[5] = 99;
        assert!(matches!(
            codec().decode(&blob),
            Err(VoiceprintError::MalformedBlob { .. })
        ));
    }

    #[test]
    fn test_decode_truncated_blob() {
        let blob = codec().encode(&FeatureArray::from_f64(vec![2, 2], vec![0.0; 4]).unwrap());

        // every prefix must fail cleanly, never panic
        for end in 0..blob.len() {
            assert!(
                matches!(
                    codec().decode(&blob[..end]),
                    Err(VoiceprintError::MalformedBlob { .. })
                ),
                "prefix of {} bytes should be rejected",
                end
            );
        }
    }

    #[test]
    fn test_decode_trailing_bytes_rejected() {
        let mut blob = codec().encode(&FeatureArray::from_i32(vec![2], vec![1, 2]).unwrap());
        blob.push(0);
        assert!(matches!(
            codec().decode(&blob),
            Err(VoiceprintError::MalformedBlob { .. })
        ));
    }

    #[test]
    fn test_decode_unsupported_version() {
        let mut blob = codec().encode(&FeatureArray::from_f32(vec![1], vec![1.0]).unwrap());
        blob[4] = 9;
        assert!(matches!(
            codec().decode(&blob),
            Err(VoiceprintError::MalformedBlob { .. })
        ));
    }
}
