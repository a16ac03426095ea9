// SEEKTABLE block implementation

use serde::Serialize;
use tracing::debug;

use super::metadata::{BlockType, DecodeContext, MetablockDecode};
use crate::error::FlacResult;
use crate::utils::bits::{BitWriter, FieldReader};

/// Field widths of one seek point: sample number, byte offset, sample count.
pub const SEEKPOINT_LAYOUT: [(&str, u32); 3] =
    [("sample_number", 64), ("byte_offset", 64), ("num_samples", 16)];

/// Size of one seek point in bytes
pub const SEEKPOINT_SIZE: usize = 18;

/// Sample number marking a placeholder point
pub const PLACEHOLDER_SAMPLE: u64 = u64::MAX;

/// A single seek point
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SeekPoint {
    /// Sample number of the first sample in the target frame
    pub sample_number: u64,
    /// Offset in bytes from the first frame header to the target frame header
    pub byte_offset: u64,
    /// Number of samples in the target frame
    pub num_samples: u16,
}

impl SeekPoint {
    /// Placeholder points reserve space and carry no offset meaning.
    pub fn is_placeholder(&self) -> bool {
        self.sample_number == PLACEHOLDER_SAMPLE
    }
}

/// A seektable block in a flac file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SeekTable {
    pub points: Vec<SeekPoint>,
}

impl SeekTable {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn is_multi_point(&self) -> bool {
        self.points.len() > 1
    }

    /// Seek points that refer to real frames.
    pub fn real_points(&self) -> impl Iterator<Item = &SeekPoint> {
        self.points.iter().filter(|p| !p.is_placeholder())
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut writer = BitWriter::new();
        for point in &self.points {
            writer.write(point.sample_number, SEEKPOINT_LAYOUT[0].1);
            writer.write(point.byte_offset, SEEKPOINT_LAYOUT[1].1);
            writer.write(u64::from(point.num_samples), SEEKPOINT_LAYOUT[2].1);
        }
        writer.into_bytes()
    }
}

impl MetablockDecode for SeekTable {
    const BLOCK_TYPE: BlockType = BlockType::SeekTable;

    fn decode(data: &[u8], _ctx: &mut DecodeContext<'_>) -> FlacResult<(Self, usize)> {
        let count = data.len() / SEEKPOINT_SIZE;
        let mut reader = FieldReader::new(&data[..count * SEEKPOINT_SIZE]);
        let [(_, sample_width), (_, offset_width), (_, samples_width)] = SEEKPOINT_LAYOUT;

        let mut points = Vec::with_capacity(count);
        for _ in 0..count {
            points.push(SeekPoint {
                sample_number: reader.read_be(sample_width)?,
                byte_offset: reader.read_be(offset_width)?,
                num_samples: reader.read_be(samples_width)? as u16,
            });
        }

        let table = SeekTable { points };
        if table.is_multi_point() {
            debug!("seek table holds {} seek points", table.len());
        }
        Ok((table, reader.byte_position()))
    }
}
