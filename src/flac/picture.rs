// FLAC PICTURE block implementation

use std::fmt::{Display, Formatter, Result as FmtResult};

use serde::ser::{Serialize, SerializeStruct, Serializer};

use super::metadata::{BlockType, DecodeContext, MetablockDecode};
use crate::error::{FlacResult, Warning};
use crate::utils::bits::FieldReader;
use crate::utils::encoding::decode_text;

/// Picture types defined by the FLAC format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PictureType {
    Other = 0,
    FileIcon = 1,
    OtherFileIcon = 2,
    CoverFront = 3,
    CoverBack = 4,
    LeafletPage = 5,
    Media = 6,
    LeadArtist = 7,
    Artist = 8,
    Conductor = 9,
    Band = 10,
    Composer = 11,
    Lyricist = 12,
    RecordingLocation = 13,
    DuringRecording = 14,
    DuringPerformance = 15,
    VideoScreenCapture = 16,
    BrightColouredFish = 17,
    Illustration = 18,
    BandLogo = 19,
    PublisherLogo = 20,
}

impl PictureType {
    /// Map a raw type code, `None` for codes outside 0..=20.
    pub fn from_u32(value: u32) -> Option<Self> {
        Some(match value {
            0 => PictureType::Other,
            1 => PictureType::FileIcon,
            2 => PictureType::OtherFileIcon,
            3 => PictureType::CoverFront,
            4 => PictureType::CoverBack,
            5 => PictureType::LeafletPage,
            6 => PictureType::Media,
            7 => PictureType::LeadArtist,
            8 => PictureType::Artist,
            9 => PictureType::Conductor,
            10 => PictureType::Band,
            11 => PictureType::Composer,
            12 => PictureType::Lyricist,
            13 => PictureType::RecordingLocation,
            14 => PictureType::DuringRecording,
            15 => PictureType::DuringPerformance,
            16 => PictureType::VideoScreenCapture,
            17 => PictureType::BrightColouredFish,
            18 => PictureType::Illustration,
            19 => PictureType::BandLogo,
            20 => PictureType::PublisherLogo,
            _ => return None,
        })
    }

    pub fn label(&self) -> &'static str {
        match self {
            PictureType::Other => "Other",
            PictureType::FileIcon => "File Icon",
            PictureType::OtherFileIcon => "Other File Icon",
            PictureType::CoverFront => "Cover (front)",
            PictureType::CoverBack => "Cover (back)",
            PictureType::LeafletPage => "Leaflet page",
            PictureType::Media => "Media",
            PictureType::LeadArtist => "Lead artist",
            PictureType::Artist => "Artist",
            PictureType::Conductor => "Conductor",
            PictureType::Band => "Band",
            PictureType::Composer => "Composer",
            PictureType::Lyricist => "Lyricist",
            PictureType::RecordingLocation => "Recording Location",
            PictureType::DuringRecording => "During recording",
            PictureType::DuringPerformance => "During performance",
            PictureType::VideoScreenCapture => "Video screen capture",
            PictureType::BrightColouredFish => "Bright coloured fish",
            PictureType::Illustration => "Illustration",
            PictureType::BandLogo => "Band logo",
            PictureType::PublisherLogo => "Publisher logo",
        }
    }
}

impl Display for PictureType {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.label())
    }
}

/// FLAC PICTURE block structure
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Picture {
    /// Raw type code, see `PictureType`
    pub picture_type: u32,
    pub mime_type: String,
    pub description: String,
    pub width: u32,
    pub height: u32,
    /// Colour depth in bits per pixel
    pub depth: u32,
    /// Number of colours for indexed pictures, 0 otherwise
    pub colors: u32,
    /// Encoded image bytes, never interpreted here
    pub data: Vec<u8>,
}

impl Picture {
    pub fn kind(&self) -> Option<PictureType> {
        PictureType::from_u32(self.picture_type)
    }

    /// Get file extension based on MIME type
    pub fn get_extension(&self) -> &'static str {
        match self.mime_type.as_str() {
            "image/jpeg" | "image/jpg" => "jpg",
            "image/png" => "png",
            "image/gif" => "gif",
            "image/webp" => "webp",
            "image/bmp" => "bmp",
            "image/tiff" => "tiff",
            _ => "bin",
        }
    }

    /// Encode Picture to bytes
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut result = Vec::new();
        result.extend_from_slice(&self.picture_type.to_be_bytes());
        result.extend_from_slice(&(self.mime_type.len() as u32).to_be_bytes());
        result.extend_from_slice(self.mime_type.as_bytes());
        result.extend_from_slice(&(self.description.len() as u32).to_be_bytes());
        result.extend_from_slice(self.description.as_bytes());
        result.extend_from_slice(&self.width.to_be_bytes());
        result.extend_from_slice(&self.height.to_be_bytes());
        result.extend_from_slice(&self.depth.to_be_bytes());
        result.extend_from_slice(&self.colors.to_be_bytes());
        result.extend_from_slice(&(self.data.len() as u32).to_be_bytes());
        result.extend_from_slice(&self.data);
        result
    }
}

// Image bytes are summarised by length; callers that want them serialized
// encode `data` themselves.
impl Serialize for Picture {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Picture", 9)?;
        state.serialize_field("picture_type", &self.picture_type)?;
        state.serialize_field("picture_type_label", &self.kind().map(|k| k.label()))?;
        state.serialize_field("mime_type", &self.mime_type)?;
        state.serialize_field("description", &self.description)?;
        state.serialize_field("width", &self.width)?;
        state.serialize_field("height", &self.height)?;
        state.serialize_field("depth", &self.depth)?;
        state.serialize_field("colors", &self.colors)?;
        state.serialize_field("data_length", &self.data.len())?;
        state.end()
    }
}

impl MetablockDecode for Picture {
    const BLOCK_TYPE: BlockType = BlockType::Picture;

    fn decode(data: &[u8], ctx: &mut DecodeContext<'_>) -> FlacResult<(Self, usize)> {
        let encoding = ctx.options.text_encoding;
        let mut reader = FieldReader::new(data);

        let picture_type = reader.read_be_u32()?;

        let mime_length = reader.read_be_u32()? as usize;
        // MIME types are printable ASCII, so either encoding gives the same text.
        let mime_type = decode_text(reader.read_bytes(mime_length)?, encoding);

        let desc_length = reader.read_be_u32()? as usize;
        let description = decode_text(reader.read_bytes(desc_length)?, encoding);

        let width = reader.read_be_u32()?;
        let height = reader.read_be_u32()?;
        let depth = reader.read_be_u32()?;
        let colors = reader.read_be_u32()?;

        let data_length = reader.read_be_u32()? as usize;
        let image = reader.read_bytes_lossy(data_length);
        if image.len() < data_length {
            ctx.warn(Warning::PictureDataTruncated {
                declared: data_length,
                available: image.len(),
            });
        }

        Ok((
            Picture {
                picture_type,
                mime_type,
                description,
                width,
                height,
                depth,
                colors,
                data: image.to_vec(),
            },
            reader.byte_position(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FlacError;
    use crate::options::ParseOptions;

    fn cover() -> Picture {
        Picture {
            picture_type: 3,
            mime_type: "image/png".to_string(),
            description: "front".to_string(),
            width: 600,
            height: 600,
            depth: 24,
            colors: 0,
            data: vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A],
        }
    }

    fn decode(data: &[u8]) -> FlacResult<(Picture, usize, Vec<Warning>)> {
        let options = ParseOptions::default();
        let mut ctx = DecodeContext::new(&options);
        let (picture, consumed) = Picture::decode(data, &mut ctx)?;
        Ok((picture, consumed, ctx.into_warnings()))
    }

    #[test]
    fn decodes_all_fields() {
        let data = cover().to_bytes();
        let (picture, consumed, warnings) = decode(&data).unwrap();
        assert_eq!(picture, cover());
        assert_eq!(consumed, data.len());
        assert!(warnings.is_empty());
        assert_eq!(picture.kind(), Some(PictureType::CoverFront));
        assert_eq!(picture.get_extension(), "png");
    }

    #[test]
    fn short_image_data_is_kept_with_warning() {
        let mut data = cover().to_bytes();
        data.truncate(data.len() - 2);
        let (picture, consumed, warnings) = decode(&data).unwrap();
        assert_eq!(picture.data, vec![0x89, b'P', b'N', b'G']);
        assert_eq!(consumed, data.len());
        assert_eq!(
            warnings,
            vec![Warning::PictureDataTruncated {
                declared: 6,
                available: 4
            }]
        );
    }

    #[test]
    fn overlong_mime_length_is_out_of_range() {
        let mut data = cover().to_bytes();
        data[4..8].copy_from_slice(&1000u32.to_be_bytes());
        assert!(matches!(decode(&data), Err(FlacError::OutOfRange { .. })));
    }

    #[test]
    fn trailing_bytes_are_not_consumed() {
        let mut data = cover().to_bytes();
        data.extend_from_slice(&[0, 0, 0]);
        let (_, consumed, _) = decode(&data).unwrap();
        assert_eq!(consumed, data.len() - 3);
    }

    #[test]
    fn unknown_type_codes() {
        let mut picture = cover();
        picture.picture_type = 99;
        assert_eq!(picture.kind(), None);
        assert_eq!(PictureType::BandLogo.to_string(), "Band logo");
    }

    #[test]
    fn serializes_length_not_bytes() {
        let value = serde_json::to_value(cover()).unwrap();
        assert_eq!(value["data_length"], 6);
        assert_eq!(value["picture_type_label"], "Cover (front)");
        assert!(value.get("data").is_none());
    }
}
