//! Text decoding and encoding under DICOM specific character sets.
//!
//! A data set's character set is declared by
//! _Specific Character Set_ (0008,0005).
//! The element is multi-valued:
//! the first value names the primary character set,
//! any further values name extension sets which
//! ISO 2022 escape sequences may designate mid-value.
//! `ISO_IR 192` (UTF-8), `GB18030` and `GBK` forbid extensions.
//!
//! Decoders also report whether their byte sequences can be taken
//! as UTF-8 without conversion, enabling a zero-copy access path
//! for ASCII and UTF-8 content.

use encoding::all::{
    GB18030, GBK, ISO_2022_JP, ISO_8859_1, ISO_8859_2, ISO_8859_3, ISO_8859_4, ISO_8859_5, UTF_8,
    WINDOWS_31J,
};
use encoding::{DecoderTrap, EncoderTrap, Encoding, RawDecoder, StringWriter};
use snafu::{Backtrace, Snafu};
use std::borrow::Cow;
use std::fmt::Debug;

/// An error type for text encoding issues.
#[derive(Debug, Snafu)]
#[non_exhaustive]
pub enum EncodeTextError {
    /// A custom error message,
    /// for when the underlying error type does not encode
    /// error semantics into type variants.
    #[snafu(display("{}", message))]
    EncodeCustom {
        /// The error message in plain text.
        message: Cow<'static, str>,
        /// The generated backtrace, if available.
        backtrace: Backtrace,
    },
}

/// An error type for text decoding issues.
#[derive(Debug, Snafu)]
#[non_exhaustive]
pub enum DecodeTextError {
    /// A custom error message,
    /// for when the underlying error type does not encode
    /// error semantics into type variants.
    #[snafu(display("{}", message))]
    DecodeCustom {
        /// The error message in plain text.
        message: Cow<'static, str>,
        /// The generated backtrace, if available.
        backtrace: Backtrace,
    },
}

/// An error raised when building a specific character set
/// from the values of (0008,0005).
#[derive(Debug, Snafu)]
#[non_exhaustive]
pub enum CharsetError {
    /// The term does not name a supported character set.
    #[snafu(display("unsupported character set term `{}`", term))]
    UnknownTerm { term: String },
    /// The named character set must be the only value of (0008,0005).
    #[snafu(display("character set `{}` does not allow code extensions", term))]
    ExtensionsNotAllowed { term: String },
}

type EncodeResult<T> = Result<T, EncodeTextError>;
type DecodeResult<T> = Result<T, DecodeTextError>;

/// A holder of encoding and decoding mechanisms for text in
/// DICOM content, which depends on the specific character set.
pub trait TextCodec {
    /// Obtain the defined term (unique name) of the text encoding,
    /// as used in the Specific Character Set element.
    ///
    /// Should contain no leading or trailing spaces.
    fn name(&self) -> Cow<'static, str>;

    /// Check whether the given byte sequence, exactly as stored,
    /// is a valid UTF-8 encoding of the text it represents.
    /// When this returns `true`, accessors may borrow the bytes
    /// instead of decoding them.
    fn utf8_passthrough(&self, _text: &[u8]) -> bool {
        false
    }

    /// Decode the given byte buffer as a single string.
    /// The result may contain backslash characters (`\`)
    /// delimiting individual values, to be split later if required.
    fn decode(&self, text: &[u8]) -> DecodeResult<String>;

    /// Encode a text value into a byte vector.
    fn encode(&self, text: &str) -> EncodeResult<Vec<u8>>;
}

impl<T: ?Sized> TextCodec for Box<T>
where
    T: TextCodec,
{
    fn name(&self) -> Cow<'static, str> {
        self.as_ref().name()
    }

    fn utf8_passthrough(&self, text: &[u8]) -> bool {
        self.as_ref().utf8_passthrough(text)
    }

    fn decode(&self, text: &[u8]) -> DecodeResult<String> {
        self.as_ref().decode(text)
    }

    fn encode(&self, text: &str) -> EncodeResult<Vec<u8>> {
        self.as_ref().encode(text)
    }
}

impl<'a, T: ?Sized> TextCodec for &'a T
where
    T: TextCodec,
{
    fn name(&self) -> Cow<'static, str> {
        (**self).name()
    }

    fn utf8_passthrough(&self, text: &[u8]) -> bool {
        (**self).utf8_passthrough(text)
    }

    fn decode(&self, text: &[u8]) -> DecodeResult<String> {
        (**self).decode(text)
    }

    fn encode(&self, text: &str) -> EncodeResult<Vec<u8>> {
        (**self).encode(text)
    }
}

fn decode_text_trap(
    _decoder: &mut dyn RawDecoder,
    input: &[u8],
    output: &mut dyn StringWriter,
) -> bool {
    let c = input[0];
    let o0 = c & 7;
    let o1 = (c & 56) >> 3;
    let o2 = (c & 192) >> 6;
    output.write_char('\\');
    output.write_char((o2 + b'0') as char);
    output.write_char((o1 + b'0') as char);
    output.write_char((o0 + b'0') as char);
    true
}

/// Data type representing the default character repertoire
/// (ISO-IR 6).
#[derive(Debug, Default, Copy, Clone, Eq, Hash, PartialEq)]
pub struct DefaultCharacterSetCodec;

impl TextCodec for DefaultCharacterSetCodec {
    fn name(&self) -> Cow<'static, str> {
        Cow::Borrowed("ISO_IR 6")
    }

    fn utf8_passthrough(&self, text: &[u8]) -> bool {
        text.is_ascii()
    }

    fn decode(&self, text: &[u8]) -> DecodeResult<String> {
        // decoding through 8859-1, a superset,
        // tolerates stray high bytes in the wild
        ISO_8859_1
            .decode(text, DecoderTrap::Call(decode_text_trap))
            .map_err(|message| DecodeCustomSnafu { message }.build())
    }

    fn encode(&self, text: &str) -> EncodeResult<Vec<u8>> {
        ISO_8859_1
            .encode(text, EncoderTrap::Strict)
            .map_err(|message| EncodeCustomSnafu { message }.build())
    }
}

/// Data type representing the UTF-8 character set (ISO-IR 192).
#[derive(Debug, Default, Copy, Clone, Eq, Hash, PartialEq)]
pub struct Utf8CharacterSetCodec;

impl TextCodec for Utf8CharacterSetCodec {
    fn name(&self) -> Cow<'static, str> {
        Cow::Borrowed("ISO_IR 192")
    }

    fn utf8_passthrough(&self, text: &[u8]) -> bool {
        std::str::from_utf8(text).is_ok()
    }

    fn decode(&self, text: &[u8]) -> DecodeResult<String> {
        UTF_8
            .decode(text, DecoderTrap::Call(decode_text_trap))
            .map_err(|message| DecodeCustomSnafu { message }.build())
    }

    fn encode(&self, text: &str) -> EncodeResult<Vec<u8>> {
        UTF_8
            .encode(text, EncoderTrap::Strict)
            .map_err(|message| EncodeCustomSnafu { message }.build())
    }
}

/// Create and implement a character set type using the `encoding` crate.
macro_rules! decl_character_set {
    ($typ: ident, $term: literal, $val: expr) => {
        #[derive(Debug, Default, Copy, Clone, Eq, Hash, PartialEq)]
        #[doc = "Data type for the "]
        #[doc = $term]
        #[doc = " character set encoding."]
        pub struct $typ;

        impl TextCodec for $typ {
            fn name(&self) -> Cow<'static, str> {
                Cow::Borrowed($term)
            }

            fn decode(&self, text: &[u8]) -> DecodeResult<String> {
                $val.decode(text, DecoderTrap::Call(decode_text_trap))
                    .map_err(|message| DecodeCustomSnafu { message }.build())
            }

            fn encode(&self, text: &str) -> EncodeResult<Vec<u8>> {
                $val.encode(text, EncoderTrap::Strict)
                    .map_err(|message| EncodeCustomSnafu { message }.build())
            }
        }
    };
}

decl_character_set!(IsoIr100CharacterSetCodec, "ISO_IR 100", ISO_8859_1);
decl_character_set!(IsoIr101CharacterSetCodec, "ISO_IR 101", ISO_8859_2);
decl_character_set!(IsoIr109CharacterSetCodec, "ISO_IR 109", ISO_8859_3);
decl_character_set!(IsoIr110CharacterSetCodec, "ISO_IR 110", ISO_8859_4);
decl_character_set!(IsoIr144CharacterSetCodec, "ISO_IR 144", ISO_8859_5);
decl_character_set!(IsoIr13CharacterSetCodec, "ISO_IR 13", WINDOWS_31J);
decl_character_set!(Iso2022JpCharacterSetCodec, "ISO 2022 IR 87", ISO_2022_JP);
decl_character_set!(Gb18030CharacterSetCodec, "GB18030", GB18030);
decl_character_set!(GbkCharacterSetCodec, "GBK", GBK);

/// An enum type for the individually supported character sets.
#[derive(Debug, Default, Copy, Clone, Eq, PartialEq, PartialOrd, Ord)]
#[non_exhaustive]
enum CharsetImpl {
    /// **ISO-IR 6**: the default character repertoire.
    #[default]
    Default,
    /// **ISO-IR 100** (ISO-8859-1): Western Europe.
    IsoIr100,
    /// **ISO-IR 101** (ISO-8859-2): Central/Eastern Europe.
    IsoIr101,
    /// **ISO-IR 109** (ISO-8859-3): South Europe.
    IsoIr109,
    /// **ISO-IR 110** (ISO-8859-4): North Europe.
    IsoIr110,
    /// **ISO-IR 144** (ISO-8859-5): Latin/Cyrillic.
    IsoIr144,
    /// **ISO-IR 13**: JIS X 0201 (Japanese katakana/romaji).
    IsoIr13,
    /// **ISO-IR 87**: JIS X 0208 (Japanese kanji), via ISO 2022.
    IsoIr87,
    /// **ISO-IR 192**: Unicode in UTF-8.
    IsoIr192,
    /// **GB18030**: Simplified Chinese.
    Gb18030,
    /// **GBK**: Simplified Chinese (subset of GB18030).
    Gbk,
}

impl CharsetImpl {
    /// Obtain the character set identified by the given defined term,
    /// tolerating trailing padding.
    fn from_term(term: &str) -> Option<Self> {
        use self::CharsetImpl::*;
        match term.trim() {
            "" | "Default" | "ISO_IR_6" | "ISO_IR 6" | "ISO 2022 IR 6" => Some(Default),
            "ISO_IR_100" | "ISO_IR 100" | "ISO 2022 IR 100" => Some(IsoIr100),
            "ISO_IR_101" | "ISO_IR 101" | "ISO 2022 IR 101" => Some(IsoIr101),
            "ISO_IR_109" | "ISO_IR 109" | "ISO 2022 IR 109" => Some(IsoIr109),
            "ISO_IR_110" | "ISO_IR 110" | "ISO 2022 IR 110" => Some(IsoIr110),
            "ISO_IR_144" | "ISO_IR 144" | "ISO 2022 IR 144" => Some(IsoIr144),
            "ISO_IR_13" | "ISO_IR 13" | "ISO 2022 IR 13" => Some(IsoIr13),
            "ISO_IR_87" | "ISO_IR 87" | "ISO 2022 IR 87" => Some(IsoIr87),
            "ISO_IR_192" | "ISO_IR 192" => Some(IsoIr192),
            "GB18030" => Some(Gb18030),
            "GBK" => Some(Gbk),
            _ => None,
        }
    }

    /// Whether the character set must be the sole value of (0008,0005).
    fn forbids_extensions(self) -> bool {
        matches!(self, CharsetImpl::IsoIr192 | CharsetImpl::Gb18030 | CharsetImpl::Gbk)
    }
}

impl TextCodec for CharsetImpl {
    fn name(&self) -> Cow<'static, str> {
        Cow::Borrowed(match self {
            CharsetImpl::Default => "ISO_IR 6",
            CharsetImpl::IsoIr100 => "ISO_IR 100",
            CharsetImpl::IsoIr101 => "ISO_IR 101",
            CharsetImpl::IsoIr109 => "ISO_IR 109",
            CharsetImpl::IsoIr110 => "ISO_IR 110",
            CharsetImpl::IsoIr144 => "ISO_IR 144",
            CharsetImpl::IsoIr13 => "ISO_IR 13",
            CharsetImpl::IsoIr87 => "ISO 2022 IR 87",
            CharsetImpl::IsoIr192 => "ISO_IR 192",
            CharsetImpl::Gb18030 => "GB18030",
            CharsetImpl::Gbk => "GBK",
        })
    }

    fn utf8_passthrough(&self, text: &[u8]) -> bool {
        match self {
            CharsetImpl::Default => DefaultCharacterSetCodec.utf8_passthrough(text),
            CharsetImpl::IsoIr192 => Utf8CharacterSetCodec.utf8_passthrough(text),
            _ => false,
        }
    }

    fn decode(&self, text: &[u8]) -> DecodeResult<String> {
        match self {
            CharsetImpl::Default => DefaultCharacterSetCodec.decode(text),
            CharsetImpl::IsoIr100 => IsoIr100CharacterSetCodec.decode(text),
            CharsetImpl::IsoIr101 => IsoIr101CharacterSetCodec.decode(text),
            CharsetImpl::IsoIr109 => IsoIr109CharacterSetCodec.decode(text),
            CharsetImpl::IsoIr110 => IsoIr110CharacterSetCodec.decode(text),
            CharsetImpl::IsoIr144 => IsoIr144CharacterSetCodec.decode(text),
            CharsetImpl::IsoIr13 => IsoIr13CharacterSetCodec.decode(text),
            CharsetImpl::IsoIr87 => Iso2022JpCharacterSetCodec.decode(text),
            CharsetImpl::IsoIr192 => Utf8CharacterSetCodec.decode(text),
            CharsetImpl::Gb18030 => Gb18030CharacterSetCodec.decode(text),
            CharsetImpl::Gbk => GbkCharacterSetCodec.decode(text),
        }
    }

    fn encode(&self, text: &str) -> EncodeResult<Vec<u8>> {
        match self {
            CharsetImpl::Default => DefaultCharacterSetCodec.encode(text),
            CharsetImpl::IsoIr100 => IsoIr100CharacterSetCodec.encode(text),
            CharsetImpl::IsoIr101 => IsoIr101CharacterSetCodec.encode(text),
            CharsetImpl::IsoIr109 => IsoIr109CharacterSetCodec.encode(text),
            CharsetImpl::IsoIr110 => IsoIr110CharacterSetCodec.encode(text),
            CharsetImpl::IsoIr144 => IsoIr144CharacterSetCodec.encode(text),
            CharsetImpl::IsoIr13 => IsoIr13CharacterSetCodec.encode(text),
            CharsetImpl::IsoIr87 => Iso2022JpCharacterSetCodec.encode(text),
            CharsetImpl::IsoIr192 => Utf8CharacterSetCodec.encode(text),
            CharsetImpl::Gb18030 => Gb18030CharacterSetCodec.encode(text),
            CharsetImpl::Gbk => GbkCharacterSetCodec.encode(text),
        }
    }
}

/// A descriptor for the character sets in force for a data set:
/// the primary set, plus any extension sets which ISO 2022
/// escape sequences may designate within a value.
///
/// Escape designations are scoped to a single value:
/// a designation made in one element never carries over
/// to the next.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct SpecificCharacterSet {
    primary: CharsetImpl,
    extensions: Vec<CharsetImpl>,
}

impl SpecificCharacterSet {
    /// The default character repertoire (ISO-IR 6).
    pub fn iso_ir_6() -> Self {
        SpecificCharacterSet::default()
    }

    /// The UTF-8 character set (ISO-IR 192).
    pub fn iso_ir_192() -> Self {
        SpecificCharacterSet {
            primary: CharsetImpl::IsoIr192,
            extensions: Vec::new(),
        }
    }

    /// Obtain the character set identified by a single defined term.
    pub fn from_code(code: &str) -> Option<Self> {
        CharsetImpl::from_term(code).map(|primary| SpecificCharacterSet {
            primary,
            extensions: Vec::new(),
        })
    }

    /// Build a character set descriptor from the values of
    /// a Specific Character Set element:
    /// the first value is the primary set,
    /// the remaining values are code extensions.
    ///
    /// Fails if a term is not recognized,
    /// or if a set which forbids code extensions
    /// appears together with other values.
    pub fn from_terms<T: AsRef<str>>(terms: &[T]) -> Result<Self, CharsetError> {
        if terms.is_empty() {
            return Ok(SpecificCharacterSet::default());
        }
        let mut resolved = Vec::with_capacity(terms.len());
        for term in terms {
            let term = term.as_ref();
            let charset = CharsetImpl::from_term(term).ok_or_else(|| {
                UnknownTermSnafu {
                    term: term.trim().to_string(),
                }
                .build()
            })?;
            resolved.push(charset);
        }
        if terms.len() > 1 {
            if let Some(bad) = resolved.iter().find(|c| c.forbids_extensions()) {
                return ExtensionsNotAllowedSnafu {
                    term: bad.name().into_owned(),
                }
                .fail();
            }
        }
        let primary = resolved.remove(0);
        Ok(SpecificCharacterSet {
            primary,
            extensions: resolved,
        })
    }

    /// Whether text under this character set can be taken as UTF-8
    /// without conversion, provided the bytes check out.
    pub fn is_utf8_compatible(&self) -> bool {
        self.extensions.is_empty()
            && matches!(self.primary, CharsetImpl::Default | CharsetImpl::IsoIr192)
    }

    fn uses_japanese_extensions(&self) -> bool {
        self.extensions
            .iter()
            .chain(std::iter::once(&self.primary))
            .any(|c| matches!(c, CharsetImpl::IsoIr13 | CharsetImpl::IsoIr87))
    }

    /// Decode a value under the code extension machinery:
    /// runs of bytes are interpreted under the currently designated
    /// set, which escape sequences may switch to any announced
    /// extension. Control characters and the value delimiter
    /// reset the designation to the primary set.
    fn decode_with_extensions(&self, text: &[u8]) -> DecodeResult<String> {
        if self.uses_japanese_extensions() {
            // ISO 2022 JP knows the Japanese designations natively
            return Iso2022JpCharacterSetCodec.decode(text);
        }

        let mut out = String::with_capacity(text.len());
        let mut active = self.primary;
        let mut run_start = 0;
        let mut i = 0;
        while i < text.len() {
            match text[i] {
                0x1B => {
                    flush_run(&active, &text[run_start..i], &mut out)?;
                    let designated = match text.get(i + 1..i + 3) {
                        Some([0x28, 0x42]) => CharsetImpl::Default,
                        Some([0x2D, final_byte]) => match *final_byte {
                            0x41 => CharsetImpl::IsoIr100,
                            0x42 => CharsetImpl::IsoIr101,
                            0x43 => CharsetImpl::IsoIr109,
                            0x44 => CharsetImpl::IsoIr110,
                            0x4C => CharsetImpl::IsoIr144,
                            _ => {
                                return DecodeCustomSnafu {
                                    message: Cow::Borrowed("unsupported escape sequence"),
                                }
                                .fail()
                            }
                        },
                        _ => {
                            return DecodeCustomSnafu {
                                message: Cow::Borrowed("truncated escape sequence"),
                            }
                            .fail()
                        }
                    };
                    if designated != CharsetImpl::Default
                        && designated != self.primary
                        && !self.extensions.contains(&designated)
                    {
                        return DecodeCustomSnafu {
                            message: Cow::Borrowed(
                                "escape sequence designates a set not announced in (0008,0005)",
                            ),
                        }
                        .fail();
                    }
                    active = designated;
                    i += 3;
                    run_start = i;
                }
                b @ (0x09 | 0x0A | 0x0C | 0x0D | b'\\') => {
                    flush_run(&active, &text[run_start..i], &mut out)?;
                    out.push(b as char);
                    active = self.primary;
                    i += 1;
                    run_start = i;
                }
                _ => i += 1,
            }
        }
        flush_run(&active, &text[run_start..], &mut out)?;
        Ok(out)
    }
}

fn flush_run(active: &CharsetImpl, run: &[u8], out: &mut String) -> DecodeResult<()> {
    if !run.is_empty() {
        out.push_str(&active.decode(run)?);
    }
    Ok(())
}

impl TextCodec for SpecificCharacterSet {
    fn name(&self) -> Cow<'static, str> {
        if self.extensions.is_empty() {
            self.primary.name()
        } else {
            let mut name = self.primary.name().into_owned();
            for ext in &self.extensions {
                name.push('\\');
                name.push_str(&ext.name());
            }
            Cow::Owned(name)
        }
    }

    fn utf8_passthrough(&self, text: &[u8]) -> bool {
        self.extensions.is_empty() && self.primary.utf8_passthrough(text)
    }

    fn decode(&self, text: &[u8]) -> DecodeResult<String> {
        if self.extensions.is_empty() {
            self.primary.decode(text)
        } else {
            self.decode_with_extensions(text)
        }
    }

    fn encode(&self, text: &str) -> EncodeResult<Vec<u8>> {
        // re-encoding never generates designation sequences;
        // content outside the primary repertoire is rejected
        self.primary.encode(text)
    }
}

/// The result of a text validation procedure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum TextValidationOutcome {
    /// The text is fully valid and can be safely decoded.
    Ok,
    /// Some characters may have to be replaced,
    /// other than that the text can be safely decoded.
    BadCharacters,
    /// The text cannot be decoded.
    NotOk,
}

/// Check whether the given byte slice contains valid text
/// from the default character repertoire.
pub fn validate_iso_8859(text: &[u8]) -> TextValidationOutcome {
    if ISO_8859_1.decode(text, DecoderTrap::Strict).is_err() {
        match ISO_8859_1.decode(text, DecoderTrap::Call(decode_text_trap)) {
            Ok(_) => TextValidationOutcome::BadCharacters,
            Err(_) => TextValidationOutcome::NotOk,
        }
    } else {
        TextValidationOutcome::Ok
    }
}

/// Check whether the given byte slice contains only valid characters
/// for a Date value representation.
pub fn validate_da(text: &[u8]) -> TextValidationOutcome {
    if text.iter().all(|c| c.is_ascii_digit()) {
        TextValidationOutcome::Ok
    } else {
        TextValidationOutcome::NotOk
    }
}

/// Check whether the given byte slice contains only valid characters
/// for a Time value representation.
pub fn validate_tm(text: &[u8]) -> TextValidationOutcome {
    if text.iter().all(|c| match c {
        b'\\' | b'.' | b'-' | b' ' => true,
        c => c.is_ascii_digit(),
    }) {
        TextValidationOutcome::Ok
    } else {
        TextValidationOutcome::NotOk
    }
}

/// Check whether the given byte slice contains only valid characters
/// for a Date Time value representation.
pub fn validate_dt(text: &[u8]) -> TextValidationOutcome {
    if text.iter().all(|c| match c {
        b'.' | b'-' | b'+' | b' ' | b'\\' => true,
        c => c.is_ascii_digit(),
    }) {
        TextValidationOutcome::Ok
    } else {
        TextValidationOutcome::NotOk
    }
}

/// Check whether the given byte slice contains only valid characters
/// for a Code String value representation.
pub fn validate_cs(text: &[u8]) -> TextValidationOutcome {
    if text.iter().all(|c| match c {
        b' ' | b'_' => true,
        c => c.is_ascii_digit() || c.is_ascii_uppercase(),
    }) {
        TextValidationOutcome::Ok
    } else {
        TextValidationOutcome::NotOk
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_codec<T>(codec: T, string: &str, bytes: &[u8])
    where
        T: TextCodec,
    {
        assert_eq!(codec.encode(string).expect("encoding"), bytes);
        assert_eq!(codec.decode(bytes).expect("decoding"), string);
    }

    #[test]
    fn iso_ir_6_baseline() {
        let codec = SpecificCharacterSet::default();
        test_codec(codec, "Smith^John", b"Smith^John");
    }

    #[test]
    fn iso_ir_192_baseline() {
        let codec = SpecificCharacterSet::iso_ir_192();
        test_codec(&codec, "Simões^John", "Simões^John".as_bytes());
        test_codec(codec, "Иванков^Андрей", "Иванков^Андрей".as_bytes());
    }

    #[test]
    fn iso_ir_100_baseline() {
        let codec = SpecificCharacterSet::from_code("ISO_IR 100").unwrap();
        test_codec(&codec, "Simões^João", b"Sim\xF5es^Jo\xE3o");
        test_codec(codec, "Günther^Hans", b"G\xfcnther^Hans");
    }

    #[test]
    fn utf8_passthrough_detection() {
        let default = SpecificCharacterSet::default();
        assert!(default.utf8_passthrough(b"Doe^John"));
        assert!(!default.utf8_passthrough(b"Sim\xF5es"));

        let utf8 = SpecificCharacterSet::iso_ir_192();
        assert!(utf8.utf8_passthrough("Simões".as_bytes()));
        assert!(!utf8.utf8_passthrough(b"\xF5"));

        let latin1 = SpecificCharacterSet::from_code("ISO_IR 100").unwrap();
        assert!(!latin1.utf8_passthrough(b"Doe^John"));
    }

    #[test]
    fn multi_valued_terms() {
        let cs = SpecificCharacterSet::from_terms(&["ISO 2022 IR 6", "ISO 2022 IR 100"]).unwrap();
        assert!(!cs.is_utf8_compatible());

        // sets which forbid extensions must be single-valued
        assert!(matches!(
            SpecificCharacterSet::from_terms(&["ISO_IR 192", "ISO 2022 IR 100"]),
            Err(CharsetError::ExtensionsNotAllowed { .. })
        ));
        assert!(matches!(
            SpecificCharacterSet::from_terms(&["GB18030", "ISO 2022 IR 6"]),
            Err(CharsetError::ExtensionsNotAllowed { .. })
        ));
        assert!(matches!(
            SpecificCharacterSet::from_terms(&["ISO_IR 999"]),
            Err(CharsetError::UnknownTerm { .. })
        ));

        // an empty first value defaults to ISO-IR 6
        let cs = SpecificCharacterSet::from_terms(&["", "ISO 2022 IR 144"]).unwrap();
        assert_eq!(cs.name(), "ISO_IR 6\\ISO_IR 144");
    }

    #[test]
    fn code_extension_escape_sequences() {
        let cs = SpecificCharacterSet::from_terms(&["ISO 2022 IR 6", "ISO 2022 IR 144"]).unwrap();
        // "abc" then ESC -L switching G1 to Latin/Cyrillic
        let bytes = b"abc\x1B\x2D\x4C\xb8\xd2\xd0\xdd";
        assert_eq!(cs.decode(bytes).unwrap(), "abcИван");

        // designating a set that was not announced is an error
        let bytes = b"\x1B\x2D\x41x";
        assert!(cs.decode(bytes).is_err());
    }

    #[test]
    fn escape_designation_resets_at_delimiter() {
        let cs = SpecificCharacterSet::from_terms(&["ISO 2022 IR 6", "ISO 2022 IR 144"]).unwrap();
        // after the backslash the primary set is active again
        let bytes = b"\x1B\x2D\x4C\xb8\xd2\\abc";
        assert_eq!(cs.decode(bytes).unwrap(), "Ив\\abc");
    }
}
