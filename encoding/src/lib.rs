//! DICOM element coding primitives:
//! data element header decoders and encoders
//! for the native transfer syntax codings,
//! specific character set support,
//! and the transfer syntax descriptor model
//! with its external pixel codec registry contract.
pub mod decode;
pub mod encode;
pub mod text;
pub mod transfer_syntax;

pub use crate::decode::basic::BasicDecoder;
pub use crate::decode::{BasicDecode, Decode, DecodeFrom};
pub use crate::encode::{BasicEncode, Encode, EncodeTo, EncoderFor};
pub use crate::text::{SpecificCharacterSet, TextCodec};
pub use crate::transfer_syntax::{
    CompressionKind, TransferSyntax, TransferSyntaxIndex, TransferSyntaxRegistry,
};

pub use byteordered::Endianness;
