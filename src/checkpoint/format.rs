//! Binary format definitions for population checkpoint files.

use std::io::{self, Read, Write};

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::schema::Score;

/// Magic bytes identifying a checkpoint file.
pub const CHECKPOINT_MAGIC: &[u8; 4] = b"EVCK";

/// Current format version.
pub const CHECKPOINT_VERSION: u16 = 1;

/// Compression type for the entry payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum CompressionType {
    /// Raw JSON payload.
    #[default]
    None = 0,
    /// LZ4 fast compression.
    Lz4 = 1,
}

impl CompressionType {
    pub fn from_u8(v: u8) -> Option<Self> {
        match v {
            0 => Some(CompressionType::None),
            1 => Some(CompressionType::Lz4),
            _ => None,
        }
    }

    /// The compression actually applied by this build.
    pub fn effective(self) -> Self {
        if cfg!(feature = "lz4") {
            self
        } else {
            CompressionType::None
        }
    }
}

/// Checkpoint read/write errors.
#[derive(Debug, thiserror::Error)]
pub enum CheckpointError {
    #[error("checkpoint I/O failed: {0}")]
    Io(#[from] io::Error),
    #[error("invalid checkpoint magic bytes")]
    BadMagic,
    #[error("unsupported checkpoint version: {0}")]
    UnsupportedVersion(u16),
    #[error("unsupported checkpoint compression: {0}")]
    UnsupportedCompression(u8),
    #[error("checkpoint payload is {actual} bytes, header says {expected}")]
    PayloadLength { expected: u64, actual: u64 },
    #[error("checkpoint holds {actual} entries, header says {expected}")]
    EntryCount { expected: u64, actual: u64 },
    #[error("checkpoint payload could not be decoded: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("objective `{0}` has a non-finite value and cannot be stored")]
    NonFiniteScore(String),
}

/// File header for checkpoint files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckpointHeader {
    /// Payload compression.
    pub compression: CompressionType,
    /// Number of stored population entries.
    pub entry_count: u64,
    /// Stored (possibly compressed) payload size in bytes.
    pub payload_len: u64,
}

impl CheckpointHeader {
    /// Size of header in bytes.
    /// Magic(4) + Version(2) + Flags(2) + EntryCount(8) + PayloadLen(8) + Reserved(16) = 40
    pub const SIZE: usize = 40;

    /// Write header to output.
    pub fn write_to<W: Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_all(CHECKPOINT_MAGIC)?;
        w.write_all(&CHECKPOINT_VERSION.to_le_bytes())?;
        w.write_all(&(self.compression as u16).to_le_bytes())?;
        w.write_all(&self.entry_count.to_le_bytes())?;
        w.write_all(&self.payload_len.to_le_bytes())?;
        // Reserved bytes
        w.write_all(&[0u8; 16])?;
        Ok(())
    }

    /// Read header from input.
    pub fn read_from<R: Read>(r: &mut R) -> Result<Self, CheckpointError> {
        let mut magic = [0u8; 4];
        r.read_exact(&mut magic)?;
        if &magic != CHECKPOINT_MAGIC {
            return Err(CheckpointError::BadMagic);
        }

        let mut buf2 = [0u8; 2];
        let mut buf8 = [0u8; 8];

        r.read_exact(&mut buf2)?;
        let version = u16::from_le_bytes(buf2);
        if version != CHECKPOINT_VERSION {
            return Err(CheckpointError::UnsupportedVersion(version));
        }

        r.read_exact(&mut buf2)?;
        let flags = u16::from_le_bytes(buf2);
        let code = (flags & 0x0F) as u8;
        let compression =
            CompressionType::from_u8(code).ok_or(CheckpointError::UnsupportedCompression(code))?;

        r.read_exact(&mut buf8)?;
        let entry_count = u64::from_le_bytes(buf8);

        r.read_exact(&mut buf8)?;
        let payload_len = u64::from_le_bytes(buf8);

        // Skip reserved bytes
        let mut reserved = [0u8; 16];
        r.read_exact(&mut reserved)?;

        Ok(Self {
            compression,
            entry_count,
            payload_len,
        })
    }
}

/// Write a full checkpoint (header and payload) for the given entries.
pub fn write_checkpoint<W, C>(
    w: &mut W,
    entries: &[(&Score, &C)],
    compression: CompressionType,
) -> Result<(), CheckpointError>
where
    W: Write,
    C: Serialize,
{
    // JSON has no encoding for infinities or NaN; they would read back as null.
    if let Some((name, _)) = entries
        .iter()
        .flat_map(|(score, _)| score.iter())
        .find(|(_, value)| !value.is_finite())
    {
        return Err(CheckpointError::NonFiniteScore(name.to_string()));
    }

    let compression = compression.effective();
    let json = serde_json::to_vec(entries)?;
    let payload = match compression {
        CompressionType::None => json,
        CompressionType::Lz4 => compress_lz4(&json),
    };

    let header = CheckpointHeader {
        compression,
        entry_count: entries.len() as u64,
        payload_len: payload.len() as u64,
    };
    header.write_to(w)?;
    w.write_all(&payload)?;
    Ok(())
}

/// Read a full checkpoint written by [`write_checkpoint`].
pub fn read_checkpoint<R, C>(r: &mut R) -> Result<Vec<(Score, C)>, CheckpointError>
where
    R: Read,
    C: DeserializeOwned,
{
    let header = CheckpointHeader::read_from(r)?;

    let mut payload = Vec::new();
    r.read_to_end(&mut payload)?;
    if payload.len() as u64 != header.payload_len {
        return Err(CheckpointError::PayloadLength {
            expected: header.payload_len,
            actual: payload.len() as u64,
        });
    }

    let json = match header.compression {
        CompressionType::None => payload,
        CompressionType::Lz4 => decompress_lz4(&payload)?,
    };

    let entries: Vec<(Score, C)> = serde_json::from_slice(&json)?;
    if entries.len() as u64 != header.entry_count {
        return Err(CheckpointError::EntryCount {
            expected: header.entry_count,
            actual: entries.len() as u64,
        });
    }
    Ok(entries)
}

/// Compress data using LZ4.
#[cfg(feature = "lz4")]
fn compress_lz4(data: &[u8]) -> Vec<u8> {
    lz4_flex::compress_prepend_size(data)
}

/// Decompress LZ4 data.
#[cfg(feature = "lz4")]
fn decompress_lz4(data: &[u8]) -> Result<Vec<u8>, CheckpointError> {
    lz4_flex::decompress_size_prepended(data)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e).into())
}

/// Never reached: `effective()` downgrades LZ4 when the feature is off.
#[cfg(not(feature = "lz4"))]
fn compress_lz4(data: &[u8]) -> Vec<u8> {
    data.to_vec()
}

#[cfg(not(feature = "lz4"))]
fn decompress_lz4(_data: &[u8]) -> Result<Vec<u8>, CheckpointError> {
    Err(CheckpointError::UnsupportedCompression(
        CompressionType::Lz4 as u8,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_header_roundtrip() {
        let header = CheckpointHeader {
            compression: CompressionType::None,
            entry_count: 12,
            payload_len: 4096,
        };

        let mut buf = Vec::new();
        header.write_to(&mut buf).unwrap();
        assert_eq!(buf.len(), CheckpointHeader::SIZE);

        let decoded = CheckpointHeader::read_from(&mut Cursor::new(&buf)).unwrap();
        assert_eq!(decoded, header);
    }

    #[test]
    fn test_bad_magic() {
        let mut buf = vec![0u8; CheckpointHeader::SIZE];
        buf[..4].copy_from_slice(b"NOPE");
        assert!(matches!(
            CheckpointHeader::read_from(&mut Cursor::new(&buf)),
            Err(CheckpointError::BadMagic)
        ));
    }

    #[test]
    fn test_future_version_rejected() {
        let mut buf = Vec::new();
        CheckpointHeader {
            compression: CompressionType::None,
            entry_count: 0,
            payload_len: 0,
        }
        .write_to(&mut buf)
        .unwrap();
        buf[4..6].copy_from_slice(&9u16.to_le_bytes());

        assert!(matches!(
            CheckpointHeader::read_from(&mut Cursor::new(&buf)),
            Err(CheckpointError::UnsupportedVersion(9))
        ));
    }

    #[test]
    fn test_truncated_payload_rejected() {
        let score = Score::from_pairs([("x", 1.0)]);
        let candidate = vec![3u8, 1, 2];
        let mut buf = Vec::new();
        write_checkpoint(&mut buf, &[(&score, &candidate)], CompressionType::None).unwrap();
        buf.truncate(buf.len() - 3);

        let result: Result<Vec<(Score, Vec<u8>)>, _> = read_checkpoint(&mut Cursor::new(&buf));
        assert!(matches!(result, Err(CheckpointError::PayloadLength { .. })));
    }

    #[test]
    fn test_entries_roundtrip() {
        let s1 = Score::from_pairs([("x", 1.0), ("y", 2.5)]);
        let s2 = Score::from_pairs([("x", 0.0), ("y", 7.0)]);
        let c1 = vec![1u8, 0, 1];
        let c2 = vec![0u8, 0, 0];

        let mut buf = Vec::new();
        write_checkpoint(&mut buf, &[(&s1, &c1), (&s2, &c2)], CompressionType::Lz4).unwrap();

        let entries: Vec<(Score, Vec<u8>)> = read_checkpoint(&mut Cursor::new(&buf)).unwrap();
        assert_eq!(entries, vec![(s1, c1), (s2, c2)]);
    }

    #[test]
    fn test_non_finite_score_not_written() {
        let score = Score::from_pairs([("x", 1.0), ("y", f64::INFINITY)]);
        let mut buf = Vec::new();
        let result = write_checkpoint(&mut buf, &[(&score, &0u8)], CompressionType::None);
        assert!(matches!(result, Err(CheckpointError::NonFiniteScore(name)) if name == "y"));
        assert!(buf.is_empty());
    }
}
