//! Binary tablebase format.
//!
//! Format:
//! - Header (48 bytes):
//!   - Magic: "MRS1" (4 bytes)
//!   - Version: u32 LE (4 bytes)
//!   - Entry count: u64 LE (8 bytes)
//!   - Checksum: u64 LE xxhash of adjacency + data section (8 bytes)
//!   - Rules flags: u8 (bit 0 = anti-oscillation)
//!   - Reserved: 5 bytes (zeros)
//!   - Adjacency: 9 × u16 LE neighbour masks (18 bytes)
//! - Data section (entry_count × 8 bytes), one record per catalog index:
//!   - Red stones: u16 LE
//!   - Black stones: u16 LE
//!   - Red ban: u8 (0xFF = none, else from << 4 | to)
//!   - Black ban: u8
//!   - Red-to-move status: i8
//!   - Black-to-move status: i8
//!
//! Records are stored in index order, so the file alone reproduces the
//! catalog and both status arrays.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use morris_core::{Board, Catalog, CellSet, Position, PositionIndex, Rules, Step};
use tracing::{info, instrument};
use xxhash_rust::xxh64::xxh64;

use crate::error::CheckpointError;
use crate::solver::{Status, StatusTable};

const MAGIC: &[u8; 4] = b"MRS1";
const VERSION: u32 = 1;
const HEADER_SIZE: usize = 48;
const ADJACENCY_OFFSET: usize = 30;
const ENTRY_SIZE: usize = 8;
const NO_BAN: u8 = 0xFF;

const FLAG_ANTI_OSCILLATION: u8 = 1;

/// Decoded tablebase file.
#[derive(Debug, Clone)]
pub struct Checkpoint {
    pub rules: Rules,
    pub adjacency: [u16; 9],
    pub positions: Vec<Position>,
    pub status: StatusTable,
}

fn encode_ban(ban: Option<Step>) -> u8 {
    ban.map(Step::to_byte).unwrap_or(NO_BAN)
}

fn decode_ban(byte: u8, index: PositionIndex) -> Result<Option<Step>, CheckpointError> {
    if byte == NO_BAN {
        return Ok(None);
    }
    Step::from_byte(byte)
        .map(Some)
        .ok_or(CheckpointError::CorruptRecord {
            index,
            reason: "bad ban",
        })
}

impl Checkpoint {
    /// Save catalog and statuses to a tablebase file, creating missing parent
    /// directories. Returns the entry count.
    #[instrument(skip_all, fields(path = %path.display()))]
    pub fn save(
        path: &Path,
        board: &Board,
        catalog: &Catalog,
        status: &StatusTable,
    ) -> Result<usize, CheckpointError> {
        let count = catalog.len();

        let mut body = Vec::with_capacity(18 + count * ENTRY_SIZE);
        for mask in board.masks() {
            body.extend_from_slice(&mask.to_le_bytes());
        }
        for (i, pos) in catalog.positions().iter().enumerate() {
            let idx = i as PositionIndex;
            body.extend_from_slice(&pos.red.bits().to_le_bytes());
            body.extend_from_slice(&pos.black.bits().to_le_bytes());
            body.push(encode_ban(pos.red_ban));
            body.push(encode_ban(pos.black_ban));
            for side in morris_core::Side::ALL {
                let s = status.get(side, idx).unwrap_or_default();
                body.push(s.to_i8() as u8);
            }
        }

        let checksum = xxh64(&body, 0);
        let flags = if catalog.rules().anti_oscillation {
            FLAG_ANTI_OSCILLATION
        } else {
            0
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);

        // Header; the adjacency masks close it out and open the checksummed body
        writer.write_all(MAGIC)?;
        writer.write_all(&VERSION.to_le_bytes())?;
        writer.write_all(&(count as u64).to_le_bytes())?;
        writer.write_all(&checksum.to_le_bytes())?;
        writer.write_all(&[flags])?;
        writer.write_all(&[0u8; 5])?; // Reserved
        writer.write_all(&body)?;
        writer.flush()?;

        info!(entries = count, bytes = Self::estimate_size(count), "Saved tablebase");
        Ok(count)
    }

    /// Load a tablebase file.
    #[instrument(skip_all, fields(path = %path.display()))]
    pub fn load(path: &Path) -> Result<Self, CheckpointError> {
        let file = File::open(path)?;
        let file_len = file.metadata()?.len();
        let mut reader = BufReader::new(file);

        let mut header = [0u8; ADJACENCY_OFFSET];
        reader.read_exact(&mut header)?;

        if &header[0..4] != MAGIC {
            return Err(CheckpointError::BadMagic);
        }

        let version = u32::from_le_bytes([header[4], header[5], header[6], header[7]]);
        if version != VERSION {
            return Err(CheckpointError::UnsupportedVersion { version });
        }

        let mut count_bytes = [0u8; 8];
        count_bytes.copy_from_slice(&header[8..16]);
        let count = u64::from_le_bytes(count_bytes);
        let mut checksum_bytes = [0u8; 8];
        checksum_bytes.copy_from_slice(&header[16..24]);
        let stored = u64::from_le_bytes(checksum_bytes);
        let rules = Rules {
            anti_oscillation: header[24] & FLAG_ANTI_OSCILLATION != 0,
        };

        // Adjacency + records. The count is untrusted until it matches the file.
        let body_len = file_len.saturating_sub(ADJACENCY_OFFSET as u64);
        let expected = count
            .checked_mul(ENTRY_SIZE as u64)
            .and_then(|n| n.checked_add((HEADER_SIZE - ADJACENCY_OFFSET) as u64));
        if expected != Some(body_len) || count > PositionIndex::MAX as u64 {
            return Err(CheckpointError::LengthMismatch {
                count,
                bytes: body_len,
            });
        }
        let count = count as usize;
        let mut body = vec![0u8; body_len as usize];
        reader.read_exact(&mut body)?;

        let computed = xxh64(&body, 0);
        if computed != stored {
            return Err(CheckpointError::ChecksumMismatch { stored, computed });
        }

        let (adjacency_bytes, data) = body.split_at(HEADER_SIZE - ADJACENCY_OFFSET);
        let mut adjacency = [0u16; 9];
        for (i, mask) in adjacency.iter_mut().enumerate() {
            *mask = u16::from_le_bytes([adjacency_bytes[2 * i], adjacency_bytes[2 * i + 1]]);
        }

        let mut positions = Vec::with_capacity(count);
        let mut red_status = Vec::with_capacity(count);
        let mut black_status = Vec::with_capacity(count);
        for (i, record) in data.chunks_exact(ENTRY_SIZE).enumerate() {
            let index = i as PositionIndex;
            let corrupt = |reason| CheckpointError::CorruptRecord { index, reason };

            let red = CellSet::from_bits(u16::from_le_bytes([record[0], record[1]]))
                .ok_or(corrupt("bad red stones"))?;
            let black = CellSet::from_bits(u16::from_le_bytes([record[2], record[3]]))
                .ok_or(corrupt("bad black stones"))?;
            let position = Position {
                red,
                black,
                red_ban: decode_ban(record[4], index)?,
                black_ban: decode_ban(record[5], index)?,
            };
            if !position.is_valid_layout() {
                return Err(corrupt("invalid layout"));
            }
            positions.push(position);
            red_status.push(Status::from_i8(record[6] as i8).ok_or(corrupt("bad status"))?);
            black_status.push(Status::from_i8(record[7] as i8).ok_or(corrupt("bad status"))?);
        }

        let status = StatusTable::from_arrays(red_status, black_status)
            .ok_or(CheckpointError::CorruptRecord {
                index: 0,
                reason: "status arrays differ in length",
            })?;

        info!(entries = count, "Loaded tablebase");
        Ok(Checkpoint {
            rules,
            adjacency,
            positions,
            status,
        })
    }

    /// Rebuild the board and catalog this file was written from.
    pub fn catalog(&self) -> Result<(Board, Catalog), CheckpointError> {
        let board = Board::from_masks(self.adjacency)?;
        let catalog = Catalog::from_positions(self.positions.clone(), self.rules)
            .map_err(|index| CheckpointError::DuplicatePosition { index })?;
        Ok((board, catalog))
    }

    /// File size for a given number of entries.
    pub fn estimate_size(count: usize) -> usize {
        HEADER_SIZE + count * ENTRY_SIZE
    }
}
