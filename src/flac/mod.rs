// FLAC metadata handling module

pub mod metadata;
pub mod picture;
pub mod seektable;
pub mod streaminfo;
pub mod vorbis;
pub mod walker;

pub use metadata::{BlockHeader, BlockType, FLAC_SIGNATURE};
pub use picture::{Picture, PictureType};
pub use seektable::{SeekPoint, SeekTable};
pub use streaminfo::StreamInfo;
pub use vorbis::{VorbisComment, VorbisFields};
pub use walker::{
    parse_metadata, parse_metadata_with, BlockOutcome, BlockReport, MetadataRecord, MetadataSet,
};
