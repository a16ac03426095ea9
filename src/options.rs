// Parser configuration

use serde::{Deserialize, Serialize};

use crate::utils::encoding::TextEncoding;

/// What to do with a comment entry that has no `=` separator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommentPolicy {
    /// Drop the entry, record a warning and keep decoding the block
    #[default]
    Skip,
    /// Fail the whole VORBIS_COMMENT block
    Abort,
}

/// Options controlling how tolerant the walker is.
///
/// Every field has a default, so a partial JSON object such as
/// `{"strict": true}` is a valid configuration.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ParseOptions {
    /// Treat a decoder that consumes fewer or more bytes than the block
    /// header declares as a block failure instead of a warning.
    pub strict: bool,
    pub comment_policy: CommentPolicy,
    pub text_encoding: TextEncoding,
}

impl ParseOptions {
    pub fn strict() -> Self {
        ParseOptions {
            strict: true,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_uses_defaults() {
        let options: ParseOptions = serde_json::from_str(r#"{"strict": true}"#).unwrap();
        assert!(options.strict);
        assert_eq!(options.comment_policy, CommentPolicy::Skip);
        assert_eq!(options.text_encoding, TextEncoding::Utf8);
    }

    #[test]
    fn enum_names_are_snake_case() {
        let options: ParseOptions =
            serde_json::from_str(r#"{"comment_policy": "abort", "text_encoding": "latin1"}"#).unwrap();
        assert_eq!(options.comment_policy, CommentPolicy::Abort);
        assert_eq!(options.text_encoding, TextEncoding::Latin1);
    }
}
