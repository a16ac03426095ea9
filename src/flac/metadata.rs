// FLAC metadata block header implementation

use std::fmt::{Display, Formatter, Result as FmtResult};

use serde::Serialize;
use tracing::warn;

use crate::error::{FlacError, FlacResult, Warning};
use crate::options::ParseOptions;
use crate::utils::bits::FieldReader;

/// FLAC file signature
pub const FLAC_SIGNATURE: &[u8; 4] = b"fLaC";

/// Size of a metadata block header in bytes
pub const HEADER_SIZE: usize = 4;

/// Largest payload a 24-bit length field can declare
pub const MAX_BLOCK_LENGTH: u32 = (1 << 24) - 1;

/// Bit widths of the header fields: last-block flag, type tag, length.
pub const HEADER_LAYOUT: [(&str, u32); 3] = [("last_block", 1), ("block_type", 7), ("length", 24)];

/// Names of the block types defined by the format, indexed by tag.
pub const BLOCK_TYPE_NAMES: [(u8, &str); 8] = [
    (0, "STREAMINFO"),
    (1, "PADDING"),
    (2, "APPLICATION"),
    (3, "SEEKTABLE"),
    (4, "VORBIS_COMMENT"),
    (5, "CUESHEET"),
    (6, "PICTURE"),
    (127, "INVALID"),
];

/// FLAC metadata block types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockType {
    StreamInfo,
    Padding,
    Application,
    SeekTable,
    VorbisComment,
    CueSheet,
    Picture,
    /// Tag 127, reserved so a header cannot look like a frame sync code
    Invalid,
    /// Any other reserved tag
    Unknown(u8),
}

impl BlockType {
    pub const fn from_byte(byte: u8) -> Self {
        match byte {
            0 => BlockType::StreamInfo,
            1 => BlockType::Padding,
            2 => BlockType::Application,
            3 => BlockType::SeekTable,
            4 => BlockType::VorbisComment,
            5 => BlockType::CueSheet,
            6 => BlockType::Picture,
            127 => BlockType::Invalid,
            n => BlockType::Unknown(n),
        }
    }

    pub const fn as_byte(self) -> u8 {
        match self {
            BlockType::StreamInfo => 0,
            BlockType::Padding => 1,
            BlockType::Application => 2,
            BlockType::SeekTable => 3,
            BlockType::VorbisComment => 4,
            BlockType::CueSheet => 5,
            BlockType::Picture => 6,
            BlockType::Invalid => 127,
            BlockType::Unknown(n) => n,
        }
    }

    /// Canonical name from `BLOCK_TYPE_NAMES`, `None` for reserved tags.
    pub fn name(self) -> Option<&'static str> {
        let tag = self.as_byte();
        BLOCK_TYPE_NAMES
            .iter()
            .find(|(t, _)| *t == tag)
            .map(|(_, name)| *name)
    }
}

impl Display for BlockType {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self.name() {
            Some(name) => f.pad(name),
            None => f.pad(&format!("UNKNOWN({})", self.as_byte())),
        }
    }
}

impl Serialize for BlockType {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// FLAC metadata block header
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BlockHeader {
    pub is_last: bool,
    pub block_type: BlockType,
    pub length: u32,
}

impl BlockHeader {
    /// Decode a block header from the first 4 bytes of `data`.
    pub fn decode(data: &[u8]) -> FlacResult<Self> {
        let mut reader = FieldReader::new(data);
        let [(_, last_width), (_, type_width), (_, length_width)] = HEADER_LAYOUT;

        let is_last = reader.read_be(last_width)? == 1;
        let block_type = BlockType::from_byte(reader.read_be(type_width)? as u8);
        let length = reader.read_be(length_width)? as u32;

        Ok(BlockHeader {
            is_last,
            block_type,
            length,
        })
    }

    pub fn to_bytes(&self) -> [u8; HEADER_SIZE] {
        let length = self.length.min(MAX_BLOCK_LENGTH).to_be_bytes();
        let flag = if self.is_last { 0x80 } else { 0x00 };
        [
            flag | (self.block_type.as_byte() & 0x7F),
            length[1],
            length[2],
            length[3],
        ]
    }
}

/// Check for the stream marker at the start of `data`.
pub fn check_signature(data: &[u8]) -> FlacResult<()> {
    match data.get(..FLAC_SIGNATURE.len()) {
        Some(found) if found == FLAC_SIGNATURE => Ok(()),
        found => Err(FlacError::NotThisFormat {
            found: found.unwrap_or(data).to_vec(),
        }),
    }
}

/// State handed to every block decoder.
#[derive(Debug)]
pub struct DecodeContext<'a> {
    pub options: &'a ParseOptions,
    warnings: Vec<Warning>,
}

impl<'a> DecodeContext<'a> {
    pub fn new(options: &'a ParseOptions) -> Self {
        DecodeContext {
            options,
            warnings: Vec::new(),
        }
    }

    pub fn warn(&mut self, warning: Warning) {
        warn!("{}", warning);
        self.warnings.push(warning);
    }

    pub fn into_warnings(self) -> Vec<Warning> {
        self.warnings
    }
}

/// A metadata block payload decoder.
pub trait MetablockDecode: Sized {
    const BLOCK_TYPE: BlockType;

    /// Decode `data`, which is exactly the header-declared payload.
    ///
    /// Returns the block and the number of payload bytes the decoder
    /// actually consumed.
    fn decode(data: &[u8], ctx: &mut DecodeContext<'_>) -> FlacResult<(Self, usize)>;
}
