// Error and warning types for FLAC metadata parsing

use serde::Serialize;
use thiserror::Error;

use crate::flac::metadata::BlockType;

/// Errors raised while decoding fields or blocks.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FlacError {
    #[error("not a FLAC stream: expected 'fLaC', found {found:?}")]
    NotThisFormat { found: Vec<u8> },

    #[error("read of {width} bits at bit {bit_offset} exceeds {available} available bits")]
    OutOfRange {
        bit_offset: usize,
        width: u32,
        available: usize,
    },

    #[error("invalid field width: {0} bits")]
    InvalidFieldWidth(u32),

    #[error("block size mismatch: expected {expected} bytes, found {actual}")]
    SizeMismatch { expected: usize, actual: usize },

    #[error("comment #{index} has no '=' separator")]
    MalformedComment { index: usize },

    #[error("decoder consumed {consumed} of {declared} declared bytes")]
    TruncatedPayload { declared: usize, consumed: usize },
}

/// A fatal error that stopped the metadata walk, tagged with where it happened.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} (at byte offset {offset})")]
pub struct ParseError {
    pub offset: usize,
    #[source]
    pub kind: FlacError,
}

impl ParseError {
    pub fn new(offset: usize, kind: FlacError) -> Self {
        ParseError { offset, kind }
    }
}

/// Non-fatal discrepancies recorded while walking the metadata chain.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Warning {
    #[error("{block_type} block at byte {offset}: decoder consumed {consumed} of {declared} bytes")]
    TruncatedPayload {
        block_type: BlockType,
        offset: usize,
        declared: usize,
        consumed: usize,
    },

    #[error("STREAMINFO {field}: minimum {min} exceeds maximum {max}")]
    InconsistentBounds {
        field: &'static str,
        min: u32,
        max: u32,
    },

    #[error("STREAMINFO bits per sample is {bits_per_sample}, below the minimum of 4")]
    BitDepthTooLow { bits_per_sample: u8 },

    #[error("skipped comment #{index}: no '=' separator")]
    SkippedComment { index: usize },

    #[error("picture data declares {declared} bytes but only {available} are present")]
    PictureDataTruncated { declared: usize, available: usize },

    #[error("first metadata block is {found}, not STREAMINFO")]
    StreamInfoNotFirst { found: BlockType },

    #[error("{block_type} block at byte {offset} could not be decoded: {error}")]
    BlockFailed {
        block_type: BlockType,
        offset: usize,
        error: FlacError,
    },
}

impl Serialize for Warning {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

pub type FlacResult<T> = Result<T, FlacError>;
