//! Fixed, versioned, little-endian wire format for latent columns.
//!
//! One message carries one entity's vector:
//! `[WireColumnHdr][len × f64 (LE)]`.

use bytemuck::{Pod, Zeroable};
use nalgebra::DVector;
use std::mem::size_of;

use crate::bpmf_error::BpmfError;

/// Bump when the layout or semantics change in incompatible ways.
pub const WIRE_VERSION: u16 = 1;

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
pub struct WireColumnHdr {
    pub version_le: u16,
    pub tag_le: u16,
    pub len_le: u32,
    pub entity_le: u64,
}

impl WireColumnHdr {
    pub fn new(tag: u16, entity: usize, len: usize) -> Self {
        Self {
            version_le: WIRE_VERSION.to_le(),
            tag_le: tag.to_le(),
            len_le: (len as u32).to_le(),
            entity_le: (entity as u64).to_le(),
        }
    }
    pub fn version(&self) -> u16 {
        u16::from_le(self.version_le)
    }
    pub fn tag(&self) -> u16 {
        u16::from_le(self.tag_le)
    }
    pub fn len(&self) -> usize {
        u32::from_le(self.len_le) as usize
    }
    pub fn entity(&self) -> usize {
        u64::from_le(self.entity_le) as usize
    }
}

pub const HDR_BYTES: usize = size_of::<WireColumnHdr>();

pub fn expect_exact_len(actual: usize, expected: usize) -> Result<(), BpmfError> {
    if actual == expected {
        Ok(())
    } else {
        Err(BpmfError::Communication(format!(
            "expected {expected} bytes, got {actual}"
        )))
    }
}

/// Serialize entity `entity`'s column.
pub fn encode_column(tag: u16, entity: usize, col: &[f64]) -> Vec<u8> {
    let hdr = WireColumnHdr::new(tag, entity, col.len());
    let mut buf = Vec::with_capacity(HDR_BYTES + col.len() * size_of::<f64>());
    buf.extend_from_slice(bytemuck::bytes_of(&hdr));
    for v in col {
        buf.extend_from_slice(&v.to_le_bytes());
    }
    buf
}

/// Decode a column message, checking version, tag and length.
pub fn decode_column(
    buf: &[u8],
    tag: u16,
    num_latent: usize,
) -> Result<(usize, DVector<f64>), BpmfError> {
    if buf.len() < HDR_BYTES {
        return Err(BpmfError::Communication(format!(
            "column message of {} bytes is shorter than its header",
            buf.len()
        )));
    }
    let hdr: WireColumnHdr = bytemuck::pod_read_unaligned(&buf[..HDR_BYTES]);
    if hdr.version() != WIRE_VERSION {
        return Err(BpmfError::Communication(format!(
            "wire version {} != {WIRE_VERSION}",
            hdr.version()
        )));
    }
    if hdr.tag() != tag {
        return Err(BpmfError::Communication(format!(
            "column tagged {} arrived on channel {tag}",
            hdr.tag()
        )));
    }
    if hdr.len() != num_latent {
        return Err(BpmfError::DimensionMismatch {
            what: "received column length",
            expected: num_latent,
            found: hdr.len(),
        });
    }
    let payload = &buf[HDR_BYTES..];
    expect_exact_len(payload.len(), num_latent * size_of::<f64>())?;
    let col = DVector::from_iterator(
        num_latent,
        payload.chunks_exact(size_of::<f64>()).map(|c| {
            let mut b = [0u8; 8];
            b.copy_from_slice(c);
            f64::from_le_bytes(b)
        }),
    );
    Ok((hdr.entity(), col))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_is_sixteen_bytes() {
        assert_eq!(HDR_BYTES, 16);
    }

    #[test]
    fn decode_reads_back_column() {
        let buf = encode_column(3, 17, &[1.5, -2.0, 0.25]);
        let (entity, col) = decode_column(&buf, 3, 3).unwrap();
        assert_eq!(entity, 17);
        assert_eq!(col.as_slice(), &[1.5, -2.0, 0.25]);
    }

    #[test]
    fn decode_rejects_wrong_tag_and_truncation() {
        let buf = encode_column(1, 0, &[1.0, 2.0]);
        assert!(decode_column(&buf, 2, 2).is_err());
        assert!(decode_column(&buf[..buf.len() - 1], 1, 2).is_err());
        assert!(matches!(
            decode_column(&buf, 1, 3),
            Err(BpmfError::DimensionMismatch { .. })
        ));
    }
}
