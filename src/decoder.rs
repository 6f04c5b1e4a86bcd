//! Text decoding with an ordered encoding fallback chain
//!
//! Exports from acquisition software arrive as UTF-8, as Korean or Japanese
//! legacy code pages, or as arbitrary single-byte text. Each candidate is tried
//! strictly (no replacement characters) in priority order and the first one
//! that decodes cleanly wins. The chain always ends in a single-byte encoding
//! that maps every byte, so any byte sequence decodes eventually.

use crate::error::AnalysisError;
use encoding_rs::Encoding;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

/// Candidate text encodings for input files.
///
/// Serialized by label; any label accepted by [`FromStr`] deserializes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum TextEncoding {
    Utf8,
    /// Windows code page 949, a superset of EUC-KR
    Cp949,
    ShiftJis,
    /// Single-byte fallback; never fails
    Latin1,
}

/// Default priority order
pub const DEFAULT_ENCODINGS: [TextEncoding; 4] = [
    TextEncoding::Utf8,
    TextEncoding::Cp949,
    TextEncoding::ShiftJis,
    TextEncoding::Latin1,
];

impl TextEncoding {
    pub fn as_str(&self) -> &'static str {
        match self {
            TextEncoding::Utf8 => "utf-8",
            TextEncoding::Cp949 => "cp949",
            TextEncoding::ShiftJis => "shift_jis",
            TextEncoding::Latin1 => "latin1",
        }
    }

    fn encoding(&self) -> &'static Encoding {
        match self {
            TextEncoding::Utf8 => encoding_rs::UTF_8,
            TextEncoding::Cp949 => encoding_rs::EUC_KR,
            TextEncoding::ShiftJis => encoding_rs::SHIFT_JIS,
            TextEncoding::Latin1 => encoding_rs::WINDOWS_1252,
        }
    }

    /// Whether this encoding maps every possible byte sequence
    pub fn is_total(&self) -> bool {
        matches!(self, TextEncoding::Latin1)
    }

    /// Strictly decode `bytes`, returning `None` on any malformed sequence
    pub fn decode<'a>(&self, bytes: &'a [u8]) -> Option<Cow<'a, str>> {
        let bytes = match self {
            TextEncoding::Utf8 => bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes),
            _ => bytes,
        };
        self.encoding()
            .decode_without_bom_handling_and_without_replacement(bytes)
    }
}

impl fmt::Display for TextEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TextEncoding {
    type Err = AnalysisError;

    fn from_str(label: &str) -> Result<Self, Self::Err> {
        match label.trim().to_ascii_lowercase().as_str() {
            "utf-8" | "utf8" => Ok(TextEncoding::Utf8),
            "cp949" | "euc-kr" | "euc_kr" | "windows-949" => Ok(TextEncoding::Cp949),
            "shift_jis" | "shift-jis" | "sjis" | "cp932" => Ok(TextEncoding::ShiftJis),
            "latin1" | "latin-1" | "iso-8859-1" | "windows-1252" => Ok(TextEncoding::Latin1),
            other => Err(AnalysisError::UnknownEncoding(other.to_string())),
        }
    }
}

impl TryFrom<String> for TextEncoding {
    type Error = AnalysisError;

    fn try_from(label: String) -> Result<Self, Self::Error> {
        label.parse()
    }
}

impl From<TextEncoding> for String {
    fn from(encoding: TextEncoding) -> Self {
        encoding.as_str().to_string()
    }
}

/// Text decoded from a file together with the encoding that produced it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedText {
    pub text: String,
    pub encoding: TextEncoding,
}

/// Iterate over the successful decodings of `bytes`, in priority order.
///
/// Callers that need more than a clean decode (for example a minimum number of
/// lines) take the first item that satisfies them.
pub fn decode_candidates<'a>(
    bytes: &'a [u8],
    encodings: &'a [TextEncoding],
) -> impl Iterator<Item = DecodedText> + 'a {
    encodings.iter().filter_map(move |&encoding| match encoding.decode(bytes) {
        Some(text) => Some(DecodedText {
            text: text.into_owned(),
            encoding,
        }),
        None => {
            log::debug!("Input is not valid {encoding}, trying next encoding");
            None
        }
    })
}
