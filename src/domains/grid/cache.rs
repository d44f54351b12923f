//! Versioned on-disk format for the grid's obstacle-relevance cache.
//!
//! Layout: magic `CELL`, one version byte, little-endian u32 header length,
//! bincode [`CacheHeader`], bincode `Vec<CellRecord>`. Agent membership is
//! never stored.

use super::cell::CellCoord;
use crate::common::{DomainError, DomainResult};
use crate::domains::geometry::{Point, Size};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

pub const MAGIC: &[u8; 4] = b"CELL";
pub const VERSION: u8 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheHeader {
    pub cells_x: u32,
    pub cells_y: u32,
    pub cell_width: f64,
    pub cell_height: f64,
    /// md5 of the newline-joined sorted obstacle names.
    pub layout_digest: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CellRecord {
    pub coord: CellCoord,
    pub begin: Point,
    pub size: Size,
    pub obstacle_names: Vec<String>,
}

pub fn layout_digest(names: &BTreeSet<String>) -> String {
    let joined = names.iter().map(String::as_str).collect::<Vec<_>>().join("\n");
    format!("{:x}", md5::compute(joined.as_bytes()))
}

pub fn encode(header: &CacheHeader, records: &[CellRecord]) -> DomainResult<Vec<u8>> {
    let header_bytes = bincode::serialize(header)?;
    let payload = bincode::serialize(records)?;
    let mut out = Vec::with_capacity(9 + header_bytes.len() + payload.len());
    out.extend_from_slice(MAGIC);
    out.push(VERSION);
    out.extend_from_slice(&(header_bytes.len() as u32).to_le_bytes());
    out.extend_from_slice(&header_bytes);
    out.extend_from_slice(&payload);
    Ok(out)
}

/// Reads the header only, returning it with the undecoded payload.
pub fn decode_header(bytes: &[u8]) -> DomainResult<(CacheHeader, &[u8])> {
    if bytes.len() < 9 || &bytes[..4] != MAGIC {
        return Err(DomainError::CacheFormat {
            reason: "missing CELL magic".to_string(),
        });
    }
    if bytes[4] != VERSION {
        return Err(DomainError::CacheFormat {
            reason: format!("unsupported version {}", bytes[4]),
        });
    }
    let mut len = [0u8; 4];
    len.copy_from_slice(&bytes[5..9]);
    let header_len = u32::from_le_bytes(len) as usize;
    let header_end = 9usize.checked_add(header_len).filter(|end| *end <= bytes.len()).ok_or_else(|| {
        DomainError::CacheFormat {
            reason: format!("header length {} exceeds file size", header_len),
        }
    })?;
    let header: CacheHeader = bincode::deserialize(&bytes[9..header_end])?;
    Ok((header, &bytes[header_end..]))
}

pub fn decode(bytes: &[u8]) -> DomainResult<(CacheHeader, Vec<CellRecord>)> {
    let (header, payload) = decode_header(bytes)?;
    let records: Vec<CellRecord> = bincode::deserialize(payload)?;
    Ok((header, records))
}
