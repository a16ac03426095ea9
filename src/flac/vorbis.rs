// VORBIS_COMMENT implementation for FLAC

use serde::Serialize;

use super::metadata::{BlockType, DecodeContext, MetablockDecode};
use crate::error::{FlacError, FlacResult, Warning};
use crate::options::CommentPolicy;
use crate::utils::bits::{BitWriter, FieldReader};
use crate::utils::encoding::decode_text;

/// Size of each little-endian length prefix in bytes
const LENGTH_PREFIX_SIZE: usize = 4;

/// Vorbis comment structure
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct VorbisComment {
    pub vendor_string: String,
    /// `(KEY, value)` pairs in stream order, duplicates kept
    pub comments: Vec<(String, String)>,
}

impl VorbisComment {
    /// Get the first comment value by field name
    pub fn get(&self, field: &str) -> Option<&str> {
        self.comments
            .iter()
            .find(|(f, _)| f.eq_ignore_ascii_case(field))
            .map(|(_, v)| v.as_str())
    }

    /// Get every value for a field name, in stream order
    pub fn get_all<'a>(&'a self, field: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.comments
            .iter()
            .filter(move |(f, _)| f.eq_ignore_ascii_case(field))
            .map(|(_, v)| v.as_str())
    }

    pub fn len(&self) -> usize {
        self.comments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.comments.is_empty()
    }

    /// Encode to a block payload (UTF-8 text).
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut writer = BitWriter::new();
        writer.write_le(self.vendor_string.len() as u64, 32);
        writer.write_bytes(self.vendor_string.as_bytes());
        writer.write_le(self.comments.len() as u64, 32);
        for (key, value) in &self.comments {
            let entry = format!("{}={}", key, value);
            writer.write_le(entry.len() as u64, 32);
            writer.write_bytes(entry.as_bytes());
        }
        writer.into_bytes()
    }
}

impl MetablockDecode for VorbisComment {
    const BLOCK_TYPE: BlockType = BlockType::VorbisComment;

    fn decode(data: &[u8], ctx: &mut DecodeContext<'_>) -> FlacResult<(Self, usize)> {
        let encoding = ctx.options.text_encoding;
        let mut reader = FieldReader::new(data);

        let vendor_length = reader.read_le_u32()? as usize;
        let vendor_string = decode_text(reader.read_bytes(vendor_length)?, encoding);

        let comment_count = reader.read_le_u32()? as usize;
        // Every entry needs at least its length prefix.
        let capacity = comment_count.min(reader.remaining_bytes() / LENGTH_PREFIX_SIZE);
        let mut comments = Vec::with_capacity(capacity);

        for index in 0..comment_count {
            let length = reader.read_le_u32()? as usize;
            let entry = decode_text(reader.read_bytes(length)?, encoding);

            match entry.split_once('=') {
                Some((key, value)) => comments.push((key.to_string(), value.to_string())),
                None => match ctx.options.comment_policy {
                    CommentPolicy::Skip => ctx.warn(Warning::SkippedComment { index }),
                    CommentPolicy::Abort => return Err(FlacError::MalformedComment { index }),
                },
            }
        }

        Ok((
            VorbisComment {
                vendor_string,
                comments,
            },
            reader.byte_position(),
        ))
    }
}

/// Common Vorbis comment field names
pub struct VorbisFields;
impl VorbisFields {
    pub const TITLE: &str = "TITLE";
    pub const ARTIST: &str = "ARTIST";
    pub const ALBUM: &str = "ALBUM";
    pub const DATE: &str = "DATE";
    pub const TRACKNUMBER: &str = "TRACKNUMBER";
    pub const GENRE: &str = "GENRE";
    pub const COMMENT: &str = "COMMENT";
}
