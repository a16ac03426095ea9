// Metadata chain walker
//
// Walks the block headers from the stream marker to the block flagged as
// last, dispatching each payload to its decoder. The cursor always advances
// by the header-declared length, so a decoder that over- or under-reads
// cannot desynchronize the rest of the chain.

use serde::Serialize;
use tracing::{debug, trace, warn};

use super::metadata::{
    check_signature, BlockHeader, BlockType, DecodeContext, MetablockDecode, FLAC_SIGNATURE,
    HEADER_SIZE,
};
use super::picture::Picture;
use super::seektable::SeekTable;
use super::streaminfo::StreamInfo;
use super::vorbis::VorbisComment;
use crate::error::{FlacError, ParseError, Warning};
use crate::options::ParseOptions;

/// What happened to one metadata block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockOutcome {
    Decoded,
    /// No decoder for this type; skipped by declared length
    Skipped,
    /// The decoder failed; see the matching `Warning::BlockFailed`
    Failed,
}

/// One visited block, in stream order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BlockReport {
    /// Offset of the block header in the buffer
    pub offset: usize,
    pub header: BlockHeader,
    pub outcome: BlockOutcome,
}

/// Borrowed view of one decoded record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetadataRecord<'a> {
    StreamInfo(&'a StreamInfo),
    SeekTable(&'a SeekTable),
    VorbisComment(&'a VorbisComment),
    Picture(&'a Picture),
}

/// Everything decoded from one metadata chain.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MetadataSet {
    pub stream_info: Option<StreamInfo>,
    pub seek_table: Option<SeekTable>,
    pub vorbis_comment: Option<VorbisComment>,
    /// Every PICTURE block, in stream order
    pub pictures: Vec<Picture>,
    /// Offset of the first byte after the last metadata block
    pub audio_offset: usize,
    pub blocks: Vec<BlockReport>,
    /// Types of the blocks that had no decoder
    pub unhandled: Vec<BlockType>,
    pub warnings: Vec<Warning>,
}

impl MetadataSet {
    /// Look up the decoded record for a block type.
    ///
    /// Repeated blocks resolve to the last one in the stream.
    pub fn get(&self, block_type: BlockType) -> Option<MetadataRecord<'_>> {
        match block_type {
            BlockType::StreamInfo => self.stream_info.as_ref().map(MetadataRecord::StreamInfo),
            BlockType::SeekTable => self.seek_table.as_ref().map(MetadataRecord::SeekTable),
            BlockType::VorbisComment => self
                .vorbis_comment
                .as_ref()
                .map(MetadataRecord::VorbisComment),
            BlockType::Picture => self.pictures.last().map(MetadataRecord::Picture),
            BlockType::Padding
            | BlockType::Application
            | BlockType::CueSheet
            | BlockType::Invalid
            | BlockType::Unknown(_) => None,
        }
    }

    pub fn contains(&self, block_type: BlockType) -> bool {
        self.get(block_type).is_some()
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

/// Parse the metadata chain with default options.
///
/// `start_offset` is the position of the `fLaC` marker; blocks begin four
/// bytes later. Returns the audio-start offset and the decoded metadata.
pub fn parse_metadata(buffer: &[u8], start_offset: usize) -> Result<(usize, MetadataSet), ParseError> {
    parse_metadata_with(buffer, start_offset, &ParseOptions::default())
}

/// Parse the metadata chain with explicit options.
pub fn parse_metadata_with(
    buffer: &[u8],
    start_offset: usize,
    options: &ParseOptions,
) -> Result<(usize, MetadataSet), ParseError> {
    MetadataWalker::new(buffer, start_offset, options).run()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WalkState {
    Start,
    ValidatingSignature,
    ReadingHeader,
    DispatchingBlock(usize, BlockHeader),
    Done,
}

/// Drives one parse over a borrowed buffer.
#[derive(Debug)]
pub struct MetadataWalker<'a> {
    buffer: &'a [u8],
    offset: usize,
    options: &'a ParseOptions,
    state: WalkState,
    set: MetadataSet,
}

impl<'a> MetadataWalker<'a> {
    pub fn new(buffer: &'a [u8], start_offset: usize, options: &'a ParseOptions) -> Self {
        MetadataWalker {
            buffer,
            offset: start_offset,
            options,
            state: WalkState::Start,
            set: MetadataSet::default(),
        }
    }

    /// Run to completion. Errors are fatal: the offset of the next header
    /// could not be determined.
    pub fn run(mut self) -> Result<(usize, MetadataSet), ParseError> {
        loop {
            self.state = match self.state {
                WalkState::Start => WalkState::ValidatingSignature,
                WalkState::ValidatingSignature => {
                    self.validate_signature()?;
                    WalkState::ReadingHeader
                }
                WalkState::ReadingHeader => {
                    let header_offset = self.offset;
                    let header = self.read_header()?;
                    WalkState::DispatchingBlock(header_offset, header)
                }
                WalkState::DispatchingBlock(header_offset, header) => {
                    self.dispatch(header_offset, header)?;
                    if header.is_last {
                        WalkState::Done
                    } else {
                        WalkState::ReadingHeader
                    }
                }
                WalkState::Done => {
                    self.set.audio_offset = self.offset;
                    debug!(
                        "metadata ends at byte {} after {} blocks",
                        self.offset,
                        self.set.blocks.len()
                    );
                    return Ok((self.offset, self.set));
                }
            };
        }
    }

    fn validate_signature(&mut self) -> Result<(), ParseError> {
        let marker = self.buffer.get(self.offset..).unwrap_or(&[]);
        check_signature(marker).map_err(|e| ParseError::new(self.offset, e))?;
        self.offset += FLAC_SIGNATURE.len();
        Ok(())
    }

    fn read_header(&mut self) -> Result<BlockHeader, ParseError> {
        let bytes = self.buffer.get(self.offset..).unwrap_or(&[]);
        let header = BlockHeader::decode(bytes).map_err(|e| ParseError::new(self.offset, e))?;
        self.offset += HEADER_SIZE;
        trace!(
            "header at {}: {} ({} bytes, last: {})",
            self.offset - HEADER_SIZE,
            header.block_type,
            header.length,
            header.is_last
        );
        Ok(header)
    }

    fn dispatch(&mut self, header_offset: usize, header: BlockHeader) -> Result<(), ParseError> {
        let start = self.offset;
        let length = header.length as usize;
        let end = start + length;
        if end > self.buffer.len() {
            return Err(ParseError::new(
                header_offset,
                FlacError::OutOfRange {
                    bit_offset: start * 8,
                    width: header.length.saturating_mul(8),
                    available: self.buffer.len() * 8,
                },
            ));
        }
        let buffer = self.buffer;
        let payload = &buffer[start..end];

        if self.set.blocks.is_empty() && header.block_type != BlockType::StreamInfo {
            self.record_warning(Warning::StreamInfoNotFirst {
                found: header.block_type,
            });
        }

        let outcome = match header.block_type {
            BlockType::StreamInfo => {
                let block = self.decode_block::<StreamInfo>(header_offset, payload);
                store(&mut self.set.stream_info, block)
            }
            BlockType::SeekTable => {
                let block = self.decode_block::<SeekTable>(header_offset, payload);
                store(&mut self.set.seek_table, block)
            }
            BlockType::VorbisComment => {
                let block = self.decode_block::<VorbisComment>(header_offset, payload);
                store(&mut self.set.vorbis_comment, block)
            }
            BlockType::Picture => match self.decode_block::<Picture>(header_offset, payload) {
                Some(picture) => {
                    self.set.pictures.push(picture);
                    BlockOutcome::Decoded
                }
                None => BlockOutcome::Failed,
            },
            BlockType::Padding
            | BlockType::Application
            | BlockType::CueSheet
            | BlockType::Invalid
            | BlockType::Unknown(_) => {
                debug!("no parser for {} block, skipping {} bytes", header.block_type, length);
                self.set.unhandled.push(header.block_type);
                BlockOutcome::Skipped
            }
        };

        debug!(
            "{} block at {}: {:?}",
            header.block_type, header_offset, outcome
        );
        self.set.blocks.push(BlockReport {
            offset: header_offset,
            header,
            outcome,
        });
        self.offset = end;
        Ok(())
    }

    /// Decode one payload, folding decoder warnings and failures into the set.
    fn decode_block<T: MetablockDecode>(&mut self, header_offset: usize, payload: &[u8]) -> Option<T> {
        let strict = self.options.strict;
        let mut ctx = DecodeContext::new(self.options);

        let result = T::decode(payload, &mut ctx).and_then(|(block, consumed)| {
            if consumed != payload.len() {
                if strict {
                    return Err(FlacError::TruncatedPayload {
                        declared: payload.len(),
                        consumed,
                    });
                }
                ctx.warn(Warning::TruncatedPayload {
                    block_type: T::BLOCK_TYPE,
                    offset: header_offset,
                    declared: payload.len(),
                    consumed,
                });
            }
            Ok(block)
        });
        self.set.warnings.extend(ctx.into_warnings());

        match result {
            Ok(block) => Some(block),
            Err(error) => {
                self.record_warning(Warning::BlockFailed {
                    block_type: T::BLOCK_TYPE,
                    offset: header_offset,
                    error,
                });
                None
            }
        }
    }

    fn record_warning(&mut self, warning: Warning) {
        warn!("{}", warning);
        self.set.warnings.push(warning);
    }
}

fn store<T>(slot: &mut Option<T>, block: Option<T>) -> BlockOutcome {
    match block {
        Some(block) => {
            *slot = Some(block);
            BlockOutcome::Decoded
        }
        None => BlockOutcome::Failed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(block_type: BlockType, is_last: bool, payload: &[u8]) -> Vec<u8> {
        let header = BlockHeader {
            is_last,
            block_type,
            length: payload.len() as u32,
        };
        let mut bytes = header.to_bytes().to_vec();
        bytes.extend_from_slice(payload);
        bytes
    }

    fn stream(blocks: &[Vec<u8>]) -> Vec<u8> {
        let mut bytes = FLAC_SIGNATURE.to_vec();
        for b in blocks {
            bytes.extend_from_slice(b);
        }
        bytes
    }

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn results_are_send_and_sync() {
        assert_send_sync::<MetadataSet>();
        assert_send_sync::<BlockReport>();
        assert_send_sync::<ParseError>();
        assert_send_sync::<Warning>();
    }

    #[test]
    fn rejects_missing_marker() {
        let err = parse_metadata(b"RIFF\x00\x00\x00\x00", 0).unwrap_err();
        assert_eq!(err.offset, 0);
        assert!(matches!(err.kind, FlacError::NotThisFormat { .. }));
    }

    #[test]
    fn marker_may_follow_a_prefix() {
        let mut buffer = vec![0xAA; 10];
        buffer.extend(stream(&[block(BlockType::Padding, true, &[0; 8])]));
        let (end, set) = parse_metadata(&buffer, 10).unwrap();
        assert_eq!(end, 10 + 4 + 4 + 8);
        assert_eq!(set.audio_offset, end);
    }

    #[test]
    fn skips_blocks_without_decoder() {
        let buffer = stream(&[
            block(BlockType::Application, false, b"abcd1234"),
            block(BlockType::Unknown(42), false, &[1, 2, 3]),
            block(BlockType::Padding, true, &[0; 16]),
        ]);
        let (end, set) = parse_metadata(&buffer, 0).unwrap();
        assert_eq!(end, buffer.len());
        assert_eq!(
            set.unhandled,
            vec![BlockType::Application, BlockType::Unknown(42), BlockType::Padding]
        );
        assert!(set.blocks.iter().all(|b| b.outcome == BlockOutcome::Skipped));
        assert!(matches!(
            set.warnings[..],
            [Warning::StreamInfoNotFirst {
                found: BlockType::Application
            }]
        ));
    }

    #[test]
    fn truncated_header_is_fatal() {
        let mut buffer = stream(&[block(BlockType::Padding, false, &[0; 4])]);
        buffer.extend_from_slice(&[0x81, 0x00]);
        let err = parse_metadata(&buffer, 0).unwrap_err();
        assert_eq!(err.offset, 12);
        assert!(matches!(err.kind, FlacError::OutOfRange { .. }));
    }

    #[test]
    fn payload_past_end_is_fatal() {
        let mut buffer = stream(&[block(BlockType::Padding, true, &[0; 4])]);
        buffer.truncate(buffer.len() - 1);
        let err = parse_metadata(&buffer, 0).unwrap_err();
        assert_eq!(err.offset, 4);
    }

    #[test]
    fn failed_block_does_not_stop_the_walk() {
        let buffer = stream(&[
            block(BlockType::StreamInfo, false, &[0; 10]),
            block(BlockType::Padding, true, &[0; 2]),
        ]);
        let (end, set) = parse_metadata(&buffer, 0).unwrap();
        assert_eq!(end, buffer.len());
        assert_eq!(set.blocks[0].outcome, BlockOutcome::Failed);
        assert!(set.stream_info.is_none());
        assert!(matches!(
            set.warnings[0],
            Warning::BlockFailed {
                block_type: BlockType::StreamInfo,
                offset: 4,
                error: FlacError::SizeMismatch {
                    expected: 34,
                    actual: 10
                }
            }
        ));
    }
}
