//! The transfer syntax descriptor model.
//!
//! A transfer syntax is identified by its UID and described by
//! its element coding (VR explicitness and byte order),
//! whether its pixel data is encapsulated,
//! whether the compression is lossy,
//! and the kind of compression in use.
//!
//! Three codings are implemented natively:
//! Implicit VR Little Endian, Explicit VR Little Endian,
//! and the retired Explicit VR Big Endian.
//! All other known transfer syntaxes are carried as descriptors:
//! their data sets can be read and written
//! (they use one of the native codings),
//! while their pixel data remains encapsulated,
//! to be handed to an external codec from the
//! [pixel codec registry](PixelCodecRegistry) after parsing.

use crate::decode::basic::BasicDecoder;
use crate::decode::{
    explicit_be::ExplicitVRBigEndianDecoder, explicit_le::ExplicitVRLittleEndianDecoder,
    implicit_le::ImplicitVRLittleEndianDecoder, DecodeFrom,
};
use crate::encode::{
    explicit_be::ExplicitVRBigEndianEncoder, explicit_le::ExplicitVRLittleEndianEncoder,
    implicit_le::ImplicitVRLittleEndianEncoder, EncodeTo, EncoderFor,
};
use byteordered::Endianness;
use once_cell::sync::Lazy;
use snafu::Snafu;
use std::collections::HashMap;
use std::io::{Read, Write};
use std::sync::Arc;

/// A decoder with its type erased.
pub type DynDecoder<S> = Box<dyn DecodeFrom<S>>;

/// An encoder with its type erased.
pub type DynEncoder<'w, W> = Box<dyn EncodeTo<W> + 'w>;

/// The kind of pixel data compression a transfer syntax mandates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum CompressionKind {
    /// Native (uncompressed) pixel data.
    None,
    /// The whole data set is deflated.
    Deflated,
    /// JPEG (ISO 10918-1) family.
    Jpeg,
    /// JPEG-LS (ISO 14495-1).
    JpegLs,
    /// JPEG 2000 (ISO 15444-1).
    Jpeg2000,
    /// Run-length encoding.
    Rle,
    /// Another compression scheme, identified only by UID.
    Other,
}

/// A DICOM transfer syntax descriptor.
#[derive(Debug, Clone, PartialEq)]
pub struct TransferSyntax {
    /// The unique identifier of the transfer syntax.
    uid: &'static str,
    /// The name of the transfer syntax.
    name: &'static str,
    /// The byte order of the data set coding.
    byte_order: Endianness,
    /// Whether element headers carry an explicit VR.
    explicit_vr: bool,
    /// Whether pixel data is stored in encapsulated fragments.
    encapsulated: bool,
    /// Whether the pixel data compression is lossy.
    lossy: bool,
    /// The compression scheme in use.
    compression: CompressionKind,
}

impl TransferSyntax {
    /// Create a new transfer syntax descriptor.
    /// Descriptors for the standard transfer syntaxes are
    /// already provided as constants in this module.
    pub const fn new(
        uid: &'static str,
        name: &'static str,
        byte_order: Endianness,
        explicit_vr: bool,
        encapsulated: bool,
        lossy: bool,
        compression: CompressionKind,
    ) -> Self {
        TransferSyntax {
            uid,
            name,
            byte_order,
            explicit_vr,
            encapsulated,
            lossy,
            compression,
        }
    }

    /// Obtain this transfer syntax' unique identifier.
    pub const fn uid(&self) -> &'static str {
        self.uid
    }

    /// Obtain the name of this transfer syntax.
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Obtain the expected byte order of the data set coding.
    pub const fn endianness(&self) -> Endianness {
        self.byte_order
    }

    /// Whether element headers carry an explicit VR.
    pub const fn is_explicit_vr(&self) -> bool {
        self.explicit_vr
    }

    /// Whether the data set coding is little endian.
    pub const fn is_little_endian(&self) -> bool {
        matches!(self.byte_order, Endianness::Little)
    }

    /// Whether pixel data is stored in encapsulated fragments.
    pub const fn is_encapsulated(&self) -> bool {
        self.encapsulated
    }

    /// Whether the pixel data compression is lossy.
    pub const fn is_lossy(&self) -> bool {
        self.lossy
    }

    /// The compression scheme in use.
    pub const fn compression(&self) -> CompressionKind {
        self.compression
    }

    /// Whether the data set coding can be decoded by this crate.
    /// Deflated data sets require an external adapter and
    /// cannot be decoded here.
    pub fn can_decode_dataset(&self) -> bool {
        !matches!(self.compression, CompressionKind::Deflated)
    }

    /// Retrieve the appropriate data element decoder
    /// for this transfer syntax and the given reader type.
    /// Yields `None` if data set decoding is not supported.
    pub fn decoder_for<S>(&self) -> Option<DynDecoder<S>>
    where
        S: ?Sized + Read,
    {
        if !self.can_decode_dataset() {
            return None;
        }
        match (self.byte_order, self.explicit_vr) {
            (Endianness::Little, false) => Some(Box::<ImplicitVRLittleEndianDecoder>::default()),
            (Endianness::Little, true) => Some(Box::<ExplicitVRLittleEndianDecoder>::default()),
            (Endianness::Big, true) => Some(Box::<ExplicitVRBigEndianDecoder>::default()),
            (Endianness::Big, false) => None,
        }
    }

    /// Retrieve the appropriate data element encoder
    /// for this transfer syntax and the given writer type.
    /// Yields `None` if data set encoding is not supported.
    pub fn encoder_for<'w, W: 'w>(&self) -> Option<DynEncoder<'w, W>>
    where
        W: ?Sized + Write,
    {
        if !self.can_decode_dataset() {
            return None;
        }
        match (self.byte_order, self.explicit_vr) {
            (Endianness::Little, false) => Some(Box::new(EncoderFor::new(
                ImplicitVRLittleEndianEncoder::default(),
            ))),
            (Endianness::Little, true) => Some(Box::new(EncoderFor::new(
                ExplicitVRLittleEndianEncoder::default(),
            ))),
            (Endianness::Big, true) => Some(Box::new(EncoderFor::new(
                ExplicitVRBigEndianEncoder::default(),
            ))),
            (Endianness::Big, false) => None,
        }
    }

    /// Obtain a basic number decoder for this transfer syntax'
    /// expected byte order.
    pub fn basic_decoder(&self) -> BasicDecoder {
        BasicDecoder::from(self.endianness())
    }
}

/// Implicit VR Little Endian: the default transfer syntax.
pub const IMPLICIT_VR_LITTLE_ENDIAN: TransferSyntax = TransferSyntax::new(
    "1.2.840.10008.1.2",
    "Implicit VR Little Endian",
    Endianness::Little,
    false,
    false,
    false,
    CompressionKind::None,
);

/// Explicit VR Little Endian.
pub const EXPLICIT_VR_LITTLE_ENDIAN: TransferSyntax = TransferSyntax::new(
    "1.2.840.10008.1.2.1",
    "Explicit VR Little Endian",
    Endianness::Little,
    true,
    false,
    false,
    CompressionKind::None,
);

/// Explicit VR Big Endian (retired, kept readable).
pub const EXPLICIT_VR_BIG_ENDIAN: TransferSyntax = TransferSyntax::new(
    "1.2.840.10008.1.2.2",
    "Explicit VR Big Endian",
    Endianness::Big,
    true,
    false,
    false,
    CompressionKind::None,
);

/// Deflated Explicit VR Little Endian.
/// Data set decoding requires an external inflater.
pub const DEFLATED_EXPLICIT_VR_LITTLE_ENDIAN: TransferSyntax = TransferSyntax::new(
    "1.2.840.10008.1.2.1.99",
    "Deflated Explicit VR Little Endian",
    Endianness::Little,
    true,
    false,
    false,
    CompressionKind::Deflated,
);

/// JPEG Baseline (Process 1).
pub const JPEG_BASELINE: TransferSyntax = TransferSyntax::new(
    "1.2.840.10008.1.2.4.50",
    "JPEG Baseline (Process 1)",
    Endianness::Little,
    true,
    true,
    true,
    CompressionKind::Jpeg,
);

/// JPEG Extended (Process 2 & 4).
pub const JPEG_EXTENDED: TransferSyntax = TransferSyntax::new(
    "1.2.840.10008.1.2.4.51",
    "JPEG Extended (Process 2 & 4)",
    Endianness::Little,
    true,
    true,
    true,
    CompressionKind::Jpeg,
);

/// JPEG Lossless, Non-Hierarchical (Process 14).
pub const JPEG_LOSSLESS_NON_HIERARCHICAL: TransferSyntax = TransferSyntax::new(
    "1.2.840.10008.1.2.4.57",
    "JPEG Lossless, Non-Hierarchical (Process 14)",
    Endianness::Little,
    true,
    true,
    false,
    CompressionKind::Jpeg,
);

/// JPEG Lossless, Non-Hierarchical, First-Order Prediction.
pub const JPEG_LOSSLESS_SV1: TransferSyntax = TransferSyntax::new(
    "1.2.840.10008.1.2.4.70",
    "JPEG Lossless, Non-Hierarchical, First-Order Prediction",
    Endianness::Little,
    true,
    true,
    false,
    CompressionKind::Jpeg,
);

/// JPEG-LS Lossless.
pub const JPEG_LS_LOSSLESS: TransferSyntax = TransferSyntax::new(
    "1.2.840.10008.1.2.4.80",
    "JPEG-LS Lossless Image Compression",
    Endianness::Little,
    true,
    true,
    false,
    CompressionKind::JpegLs,
);

/// JPEG-LS Lossy (Near-Lossless).
pub const JPEG_LS_NEAR_LOSSLESS: TransferSyntax = TransferSyntax::new(
    "1.2.840.10008.1.2.4.81",
    "JPEG-LS Lossy (Near-Lossless) Image Compression",
    Endianness::Little,
    true,
    true,
    true,
    CompressionKind::JpegLs,
);

/// JPEG 2000 Image Compression (Lossless Only).
pub const JPEG_2000_LOSSLESS: TransferSyntax = TransferSyntax::new(
    "1.2.840.10008.1.2.4.90",
    "JPEG 2000 Image Compression (Lossless Only)",
    Endianness::Little,
    true,
    true,
    false,
    CompressionKind::Jpeg2000,
);

/// JPEG 2000 Image Compression.
pub const JPEG_2000: TransferSyntax = TransferSyntax::new(
    "1.2.840.10008.1.2.4.91",
    "JPEG 2000 Image Compression",
    Endianness::Little,
    true,
    true,
    true,
    CompressionKind::Jpeg2000,
);

/// RLE Lossless.
pub const RLE_LOSSLESS: TransferSyntax = TransferSyntax::new(
    "1.2.840.10008.1.2.5",
    "RLE Lossless",
    Endianness::Little,
    true,
    true,
    false,
    CompressionKind::Rle,
);

static BUILT_IN: &[&TransferSyntax] = &[
    &IMPLICIT_VR_LITTLE_ENDIAN,
    &EXPLICIT_VR_LITTLE_ENDIAN,
    &EXPLICIT_VR_BIG_ENDIAN,
    &DEFLATED_EXPLICIT_VR_LITTLE_ENDIAN,
    &JPEG_BASELINE,
    &JPEG_EXTENDED,
    &JPEG_LOSSLESS_NON_HIERARCHICAL,
    &JPEG_LOSSLESS_SV1,
    &JPEG_LS_LOSSLESS,
    &JPEG_LS_NEAR_LOSSLESS,
    &JPEG_2000_LOSSLESS,
    &JPEG_2000,
    &RLE_LOSSLESS,
];

/// Trait for a repository of transfer syntax descriptors,
/// queried by UID.
pub trait TransferSyntaxIndex {
    /// Obtain a transfer syntax descriptor by its UID.
    ///
    /// Implementations are robust to the presence of
    /// trailing padding in `uid`.
    fn get(&self, uid: &str) -> Option<&TransferSyntax>;
}

impl<T: ?Sized> TransferSyntaxIndex for &T
where
    T: TransferSyntaxIndex,
{
    fn get(&self, uid: &str) -> Option<&TransferSyntax> {
        (**self).get(uid)
    }
}

/// The registry of known transfer syntax descriptors.
///
/// The singleton instance is available through
/// [`TransferSyntaxRegistry::default`]
/// (a unit type backed by a lazily built index).
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TransferSyntaxRegistry;

static TS_INDEX: Lazy<HashMap<&'static str, &'static TransferSyntax>> =
    Lazy::new(|| BUILT_IN.iter().map(|ts| (ts.uid(), *ts)).collect());

impl TransferSyntaxIndex for TransferSyntaxRegistry {
    fn get(&self, uid: &str) -> Option<&TransferSyntax> {
        let uid = uid.trim_end_matches(|c: char| c.is_whitespace() || c == '\0');
        TS_INDEX.get(uid).copied()
    }
}

/// An error surfaced from an external pixel data codec.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
#[non_exhaustive]
pub enum CodecError {
    /// No codec is registered for the transfer syntax.
    #[snafu(display("no pixel data codec registered for transfer syntax {}", uid))]
    CodecNotFound { uid: String },
    /// A frame could not be decoded.
    #[snafu(display("could not decode pixel data frame: {}", message))]
    DecodeFrame { message: String },
    /// A frame could not be encoded.
    #[snafu(display("could not encode pixel data frame: {}", message))]
    EncodeFrame { message: String },
}

/// The declared capabilities of an external pixel data codec.
#[derive(Debug, Clone, PartialEq)]
pub struct CodecCapabilities {
    /// Whether the codec can encode native frames.
    pub can_encode: bool,
    /// Whether the codec can decode encapsulated frames.
    pub can_decode: bool,
    /// Whether the compression is lossy.
    pub is_lossy: bool,
    /// Whether multi-frame instances are supported.
    pub supports_multi_frame: bool,
    /// The sample bit depths the codec accepts.
    pub supported_bit_depths: &'static [u16],
    /// The samples-per-pixel counts the codec accepts.
    pub supported_samples_per_pixel: &'static [u16],
}

/// Contract for an external pixel data codec.
///
/// The parsing engine never invokes these methods itself;
/// they exist so that a consumer can decode or encode
/// encapsulated frames after parsing completes.
pub trait PixelDataCodec: Send + Sync {
    /// The codec's declared capabilities.
    fn capabilities(&self) -> &CodecCapabilities;

    /// Decode one encapsulated frame into native sample data.
    fn decode_frame(&self, frame: &[u8], out: &mut Vec<u8>) -> Result<(), CodecError>;

    /// Encode one native frame into its encapsulated form.
    fn encode_frame(&self, frame: &[u8], out: &mut Vec<u8>) -> Result<(), CodecError>;
}

/// A registry of external pixel data codecs by transfer syntax UID.
///
/// The registry is built once during initialisation
/// and then published immutably;
/// it holds no interior mutability.
#[derive(Default)]
pub struct PixelCodecRegistry {
    entries: HashMap<String, Vec<(i32, Arc<dyn PixelDataCodec>)>>,
}

impl std::fmt::Debug for PixelCodecRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PixelCodecRegistry")
            .field("transfer_syntaxes", &self.entries.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl PixelCodecRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        PixelCodecRegistry::default()
    }

    /// Register a codec for the given transfer syntax
    /// with the given priority. Higher priorities win lookups.
    pub fn register(
        &mut self,
        transfer_syntax_uid: impl Into<String>,
        codec: Arc<dyn PixelDataCodec>,
        priority: i32,
    ) {
        let slot = self.entries.entry(transfer_syntax_uid.into()).or_default();
        slot.push((priority, codec));
        slot.sort_by_key(|(priority, _)| std::cmp::Reverse(*priority));
    }

    /// Look up the highest-priority codec for the given
    /// transfer syntax UID, tolerating trailing padding.
    pub fn lookup(&self, uid: &str) -> Option<Arc<dyn PixelDataCodec>> {
        let uid = uid.trim_end_matches(|c: char| c.is_whitespace() || c == '\0');
        self.entries
            .get(uid)
            .and_then(|slot| slot.first())
            .map(|(_, codec)| Arc::clone(codec))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_lookup() {
        let registry = TransferSyntaxRegistry;
        let ts = registry.get("1.2.840.10008.1.2.1").unwrap();
        assert_eq!(ts.name(), "Explicit VR Little Endian");
        assert!(ts.is_explicit_vr());
        assert!(ts.is_little_endian());
        assert!(!ts.is_encapsulated());

        // trailing padding is tolerated
        let ts = registry.get("1.2.840.10008.1.2\0").unwrap();
        assert!(!ts.is_explicit_vr());

        assert!(registry.get("1.2.3.4").is_none());
    }

    #[test]
    fn encapsulated_stubs_decode_datasets() {
        let registry = TransferSyntaxRegistry;
        let ts = registry.get("1.2.840.10008.1.2.4.50").unwrap();
        assert!(ts.is_encapsulated());
        assert!(ts.is_lossy());
        assert_eq!(ts.compression(), CompressionKind::Jpeg);
        // the data set coding is explicit VR little endian
        assert!(ts.decoder_for::<&[u8]>().is_some());

        // deflated data sets cannot be decoded without an adapter
        let deflated = registry.get("1.2.840.10008.1.2.1.99").unwrap();
        assert!(deflated.decoder_for::<&[u8]>().is_none());
    }

    struct NullCodec(CodecCapabilities);

    impl PixelDataCodec for NullCodec {
        fn capabilities(&self) -> &CodecCapabilities {
            &self.0
        }

        fn decode_frame(&self, frame: &[u8], out: &mut Vec<u8>) -> Result<(), CodecError> {
            out.extend_from_slice(frame);
            Ok(())
        }

        fn encode_frame(&self, frame: &[u8], out: &mut Vec<u8>) -> Result<(), CodecError> {
            out.extend_from_slice(frame);
            Ok(())
        }
    }

    #[test]
    fn codec_registry_priorities() {
        let caps = CodecCapabilities {
            can_encode: false,
            can_decode: true,
            is_lossy: false,
            supports_multi_frame: true,
            supported_bit_depths: &[8, 16],
            supported_samples_per_pixel: &[1, 3],
        };
        let mut registry = PixelCodecRegistry::new();
        let low = Arc::new(NullCodec(caps.clone()));
        let high = Arc::new(NullCodec(CodecCapabilities {
            can_encode: true,
            ..caps.clone()
        }));
        registry.register("1.2.840.10008.1.2.5", low, 0);
        registry.register("1.2.840.10008.1.2.5", high, 10);

        let found = registry.lookup("1.2.840.10008.1.2.5\0").unwrap();
        assert!(found.capabilities().can_encode);
        assert!(registry.lookup("1.2.840.10008.1.2.4.50").is_none());
    }
}
