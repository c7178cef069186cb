//! NumPy `.npy` encoding for the embedding matrix
//!
//! Only the one layout the pipeline writes is accepted on read: little-endian
//! `f32`, C order, two-dimensional.

use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{Error, Result};
use crate::retrieval::EmbeddingMatrix;

const MAGIC: &[u8] = b"\x93NUMPY";
const ALIGNMENT: usize = 64;

static DESCR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"'descr'\s*:\s*'([^']*)'").expect("Invalid regex"));
static FORTRAN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"'fortran_order'\s*:\s*(True|False)").expect("Invalid regex"));
static SHAPE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"'shape'\s*:\s*\(\s*(\d+)\s*,\s*(\d+)\s*,?\s*\)").expect("Invalid regex")
});

/// Encode `matrix` as a version 1.0 `.npy` file
pub fn encode(matrix: &EmbeddingMatrix) -> Vec<u8> {
    let dict = format!(
        "{{'descr': '<f4', 'fortran_order': False, 'shape': ({}, {}), }}",
        matrix.rows(),
        matrix.dimensions()
    );

    // magic + version + u16 length + dict + newline, padded to the alignment
    let unpadded = MAGIC.len() + 2 + 2 + dict.len() + 1;
    let padding = (ALIGNMENT - unpadded % ALIGNMENT) % ALIGNMENT;
    let header_len = dict.len() + padding + 1;

    let mut out = Vec::with_capacity(unpadded + padding + matrix.as_slice().len() * 4);
    out.extend_from_slice(MAGIC);
    out.extend_from_slice(&[1, 0]);
    out.extend_from_slice(&(header_len as u16).to_le_bytes());
    out.extend_from_slice(dict.as_bytes());
    out.extend(std::iter::repeat(b' ').take(padding));
    out.push(b'\n');
    for value in matrix.as_slice() {
        out.extend_from_slice(&value.to_le_bytes());
    }
    out
}

/// Decode a `.npy` file read from `path`
pub fn decode(path: &Path, bytes: &[u8]) -> Result<EmbeddingMatrix> {
    if bytes.len() < MAGIC.len() + 4 || &bytes[..MAGIC.len()] != MAGIC {
        return Err(Error::artifact(path, "not a NumPy array file"));
    }

    let major = bytes[MAGIC.len()];
    let (header_len, header_start) = match major {
        1 => {
            let len = u16::from_le_bytes([bytes[8], bytes[9]]) as usize;
            (len, 10)
        }
        2 | 3 => {
            if bytes.len() < 12 {
                return Err(Error::artifact(path, "truncated header"));
            }
            let len = u32::from_le_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]) as usize;
            (len, 12)
        }
        v => return Err(Error::artifact(path, format!("unsupported format version {}", v))),
    };

    let data_start = header_start + header_len;
    let header = bytes
        .get(header_start..data_start)
        .ok_or_else(|| Error::artifact(path, "truncated header"))?;
    let header = std::str::from_utf8(header)
        .map_err(|_| Error::artifact(path, "header is not valid text"))?;

    let descr = DESCR
        .captures(header)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
        .ok_or_else(|| Error::artifact(path, "header has no dtype"))?;
    if descr != "<f4" {
        return Err(Error::artifact(path, format!("expected dtype '<f4', found '{}'", descr)));
    }

    if FORTRAN.captures(header).and_then(|c| c.get(1)).map(|m| m.as_str()) != Some("False") {
        return Err(Error::artifact(path, "only C-order arrays are supported"));
    }

    let shape = SHAPE
        .captures(header)
        .ok_or_else(|| Error::artifact(path, "expected a two-dimensional shape"))?;
    let rows: usize = shape[1]
        .parse()
        .map_err(|_| Error::artifact(path, "invalid row count"))?;
    let dimensions: usize = shape[2]
        .parse()
        .map_err(|_| Error::artifact(path, "invalid column count"))?;

    let data = &bytes[data_start..];
    let expected = rows
        .checked_mul(dimensions)
        .and_then(|n| n.checked_mul(4))
        .ok_or_else(|| Error::artifact(path, "shape overflows"))?;
    if data.len() != expected {
        return Err(Error::artifact(
            path,
            format!("expected {} data bytes for shape ({}, {}), found {}", expected, rows, dimensions, data.len()),
        ));
    }

    let values = data
        .chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect();

    EmbeddingMatrix::from_flat(values, dimensions)
}
