//! flacmeta - FLAC metadata block parser
//!
//! Parses the metadata chain that precedes the audio frames of a FLAC
//! stream: the `fLaC` marker, then a sequence of blocks each introduced by a
//! 4-byte header. STREAMINFO, SEEKTABLE, VORBIS_COMMENT and PICTURE blocks
//! are decoded; every other block is skipped by its declared length.
//!
//! The parser works on an in-memory buffer and never does I/O:
//!
//! ```no_run
//! let bytes = std::fs::read("track.flac").unwrap();
//! let (audio_offset, metadata) = flacmeta::parse_metadata(&bytes, 0).unwrap();
//! if let Some(info) = &metadata.stream_info {
//!     println!("{} Hz, {} channels", info.sample_rate, info.channels);
//! }
//! println!("audio frames start at byte {}", audio_offset);
//! ```

pub mod error;
pub mod flac;
pub mod options;
pub mod utils;

pub use error::{FlacError, FlacResult, ParseError, Warning};
pub use flac::{
    parse_metadata, parse_metadata_with, BlockHeader, BlockOutcome, BlockReport, BlockType,
    MetadataRecord, MetadataSet, Picture, PictureType, SeekPoint, SeekTable, StreamInfo,
    VorbisComment, VorbisFields, FLAC_SIGNATURE,
};
pub use options::{CommentPolicy, ParseOptions};
pub use utils::encoding::TextEncoding;

/// Report whether `data` begins with the FLAC stream marker.
pub fn is_flac(data: &[u8]) -> bool {
    flac::metadata::check_signature(data).is_ok()
}
