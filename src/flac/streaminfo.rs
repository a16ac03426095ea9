// STREAMINFO block implementation

use serde::{Serialize, Serializer};

use super::metadata::{BlockType, DecodeContext, MetablockDecode};
use crate::error::{FlacError, FlacResult, Warning};
use crate::utils::bits::{BitWriter, FieldReader};

/// Field widths in bits, in stream order.
pub const STREAMINFO_LAYOUT: [(&str, u32); 9] = [
    ("min_block_size", 16),
    ("max_block_size", 16),
    ("min_frame_size", 24),
    ("max_frame_size", 24),
    ("sample_rate", 20),
    ("channels", 3),
    ("bits_per_sample", 5),
    ("total_samples", 36),
    ("md5_signature", 128),
];

/// Payload size of a STREAMINFO block in bytes.
pub const STREAMINFO_SIZE: usize = layout_size(&STREAMINFO_LAYOUT);

const fn layout_size(layout: &[(&str, u32)]) -> usize {
    let mut bits = 0;
    let mut i = 0;
    while i < layout.len() {
        bits += layout[i].1 as usize;
        i += 1;
    }
    bits / 8
}

/// Smallest sample depth the format allows.
pub const MIN_BITS_PER_SAMPLE: u8 = 4;

/// Global stream parameters from the mandatory first block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StreamInfo {
    /// Minimum block size in samples
    pub min_block_size: u16,
    /// Maximum block size in samples
    pub max_block_size: u16,
    /// Minimum frame size in bytes, 0 if unknown
    pub min_frame_size: u32,
    /// Maximum frame size in bytes, 0 if unknown
    pub max_frame_size: u32,
    pub sample_rate: u32,
    /// 1 to 8
    pub channels: u8,
    pub bits_per_sample: u8,
    /// Inter-channel sample count, `None` when the encoder did not know it
    pub total_samples: Option<u64>,
    #[serde(serialize_with = "serialize_hex")]
    pub md5_signature: [u8; 16],
}

fn serialize_hex<S: Serializer>(bytes: &[u8; 16], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&hex::encode(bytes))
}

impl StreamInfo {
    /// Stream length in seconds, when both the sample count and rate are known.
    pub fn duration_secs(&self) -> Option<f64> {
        match (self.total_samples, self.sample_rate) {
            (Some(total), rate) if rate > 0 => Some(total as f64 / f64::from(rate)),
            _ => None,
        }
    }

    /// Encode back into a 34-byte payload.
    pub fn to_bytes(&self) -> Vec<u8> {
        let fields = [
            u64::from(self.min_block_size),
            u64::from(self.max_block_size),
            u64::from(self.min_frame_size),
            u64::from(self.max_frame_size),
            u64::from(self.sample_rate),
            u64::from(self.channels.saturating_sub(1)),
            u64::from(self.bits_per_sample.saturating_sub(1)),
            self.total_samples.unwrap_or(0),
        ];

        let mut writer = BitWriter::new();
        for (value, (_, width)) in fields.iter().zip(STREAMINFO_LAYOUT.iter()) {
            writer.write(*value, *width);
        }
        writer.write_bytes(&self.md5_signature);
        writer.into_bytes()
    }

    fn check_bounds(&self, ctx: &mut DecodeContext<'_>) {
        if self.bits_per_sample < MIN_BITS_PER_SAMPLE {
            ctx.warn(Warning::BitDepthTooLow {
                bits_per_sample: self.bits_per_sample,
            });
        }
        if self.min_block_size > self.max_block_size {
            ctx.warn(Warning::InconsistentBounds {
                field: "block_size",
                min: u32::from(self.min_block_size),
                max: u32::from(self.max_block_size),
            });
        }
        // Zero is "unknown" for either frame size bound.
        if self.min_frame_size != 0
            && self.max_frame_size != 0
            && self.min_frame_size > self.max_frame_size
        {
            ctx.warn(Warning::InconsistentBounds {
                field: "frame_size",
                min: self.min_frame_size,
                max: self.max_frame_size,
            });
        }
    }
}

impl MetablockDecode for StreamInfo {
    const BLOCK_TYPE: BlockType = BlockType::StreamInfo;

    fn decode(data: &[u8], ctx: &mut DecodeContext<'_>) -> FlacResult<(Self, usize)> {
        if data.len() != STREAMINFO_SIZE {
            return Err(FlacError::SizeMismatch {
                expected: STREAMINFO_SIZE,
                actual: data.len(),
            });
        }

        let mut reader = FieldReader::new(data);
        let mut values = [0u64; 8];
        for (slot, (_, width)) in values.iter_mut().zip(STREAMINFO_LAYOUT.iter()) {
            *slot = reader.read_be(*width)?;
        }

        let mut md5_signature = [0u8; 16];
        md5_signature.copy_from_slice(reader.read_bytes(16)?);

        let [min_block, max_block, min_frame, max_frame, rate, channels, bps, total] = values;
        let info = StreamInfo {
            min_block_size: min_block as u16,
            max_block_size: max_block as u16,
            min_frame_size: min_frame as u32,
            max_frame_size: max_frame as u32,
            sample_rate: rate as u32,
            // 3 bits: channels - 1
            channels: channels as u8 + 1,
            // 5 bits: bits per sample - 1
            bits_per_sample: bps as u8 + 1,
            total_samples: (total != 0).then_some(total),
            md5_signature,
        };
        info.check_bounds(ctx);

        Ok((info, reader.byte_position()))
    }
}
