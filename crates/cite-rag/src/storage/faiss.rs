//! FAISS `IndexFlatIP` serialization
//!
//! Layout, all little-endian: fourcc `IxFI`, `d: i32`, `ntotal: i64`, two
//! unused `i64` fields, `is_trained: u8`, `metric_type: i32` (0 = inner
//! product), then the vector buffer as a `u64` element count followed by
//! `ntotal * d` `f32` values.

use std::path::Path;

use crate::error::{Error, Result};
use crate::retrieval::FlatIpIndex;

const FOURCC: &[u8; 4] = b"IxFI";
const METRIC_INNER_PRODUCT: i32 = 0;
const UNUSED_FIELD: i64 = 1 << 20;

/// Encode `index` in the FAISS flat inner-product layout
pub fn encode(index: &FlatIpIndex) -> Vec<u8> {
    let vectors = index.vectors();
    let mut out = Vec::with_capacity(4 + 4 + 8 * 3 + 1 + 4 + 8 + vectors.len() * 4);

    out.extend_from_slice(FOURCC);
    out.extend_from_slice(&(index.dimensions() as i32).to_le_bytes());
    out.extend_from_slice(&(index.len() as i64).to_le_bytes());
    out.extend_from_slice(&UNUSED_FIELD.to_le_bytes());
    out.extend_from_slice(&UNUSED_FIELD.to_le_bytes());
    out.push(1);
    out.extend_from_slice(&METRIC_INNER_PRODUCT.to_le_bytes());
    out.extend_from_slice(&(vectors.len() as u64).to_le_bytes());
    for value in vectors {
        out.extend_from_slice(&value.to_le_bytes());
    }
    out
}

struct Cursor<'a> {
    path: &'a Path,
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn take<const N: usize>(&mut self) -> Result<[u8; N]> {
        let slice = self
            .bytes
            .get(self.pos..self.pos + N)
            .ok_or_else(|| Error::artifact(self.path, "unexpected end of index file"))?;
        self.pos += N;
        let mut out = [0u8; N];
        out.copy_from_slice(slice);
        Ok(out)
    }

    fn i32(&mut self) -> Result<i32> {
        Ok(i32::from_le_bytes(self.take::<4>()?))
    }

    fn i64(&mut self) -> Result<i64> {
        Ok(i64::from_le_bytes(self.take::<8>()?))
    }

    fn u64(&mut self) -> Result<u64> {
        Ok(u64::from_le_bytes(self.take::<8>()?))
    }

    fn rest(&self) -> &'a [u8] {
        &self.bytes[self.pos.min(self.bytes.len())..]
    }
}

/// Decode an index file read from `path`
pub fn decode(path: &Path, bytes: &[u8]) -> Result<FlatIpIndex> {
    let mut cur = Cursor { path, bytes, pos: 0 };

    if &cur.take::<4>()? != FOURCC {
        return Err(Error::artifact(path, "not a flat inner-product index"));
    }

    let d = cur.i32()?;
    let ntotal = cur.i64()?;
    cur.i64()?;
    cur.i64()?;
    cur.take::<1>()?;
    let metric = cur.i32()?;

    if metric != METRIC_INNER_PRODUCT {
        return Err(Error::artifact(path, format!("unsupported metric type {}", metric)));
    }
    if d <= 0 || ntotal < 0 {
        return Err(Error::artifact(path, format!("invalid header: d={}, ntotal={}", d, ntotal)));
    }

    let (d, ntotal) = (d as usize, ntotal as usize);
    let count = cur.u64()? as usize;
    if Some(count) != ntotal.checked_mul(d) {
        return Err(Error::artifact(
            path,
            format!("header declares {} x {} vectors but buffer holds {} values", ntotal, d, count),
        ));
    }

    let data = cur.rest();
    if data.len() != count * 4 {
        return Err(Error::artifact(path, "vector buffer length does not match header"));
    }

    let vectors = data
        .chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect();

    FlatIpIndex::from_normalized(d, vectors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retrieval::EmbeddingMatrix;

    fn sample() -> FlatIpIndex {
        let matrix = EmbeddingMatrix::from_rows(&[vec![3.0, 4.0], vec![0.0, 2.0]], 2).unwrap();
        FlatIpIndex::build(&matrix, 2).unwrap()
    }

    #[test]
    fn test_header_fields() {
        let bytes = encode(&sample());

        assert_eq!(&bytes[..4], b"IxFI");
        assert_eq!(i32::from_le_bytes(bytes[4..8].try_into().unwrap()), 2);
        assert_eq!(i64::from_le_bytes(bytes[8..16].try_into().unwrap()), 2);
        assert_eq!(bytes[32], 1);
        assert_eq!(i32::from_le_bytes(bytes[33..37].try_into().unwrap()), 0);
        assert_eq!(u64::from_le_bytes(bytes[37..45].try_into().unwrap()), 4);
        assert_eq!(bytes.len(), 45 + 16);
        assert_eq!(f32::from_le_bytes(bytes[45..49].try_into().unwrap()), 0.6);
    }

    #[test]
    fn test_decode_preserves_search() {
        let index = sample();
        let decoded = decode(Path::new("index.faiss"), &encode(&index)).unwrap();

        assert_eq!(decoded, index);
        let hits = decoded.search(&[0.0, 1.0], 1).unwrap();
        assert_eq!(hits[0].position, 1);
    }

    #[test]
    fn test_rejects_other_metric() {
        let mut bytes = encode(&sample());
        bytes[33..37].copy_from_slice(&1i32.to_le_bytes());
        assert!(matches!(
            decode(Path::new("index.faiss"), &bytes),
            Err(Error::ArtifactFormat { .. })
        ));
    }

    #[test]
    fn test_rejects_truncated() {
        let bytes = encode(&sample());
        assert!(decode(Path::new("index.faiss"), &bytes[..40]).is_err());
        assert!(decode(Path::new("index.faiss"), &bytes[..bytes.len() - 1]).is_err());
    }
}
