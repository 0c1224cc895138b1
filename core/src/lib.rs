//! This crate contains the base data types and traits
//! of the `dcmkit` DICOM toolkit:
//! attribute tags, value representations, value lengths,
//! data element headers, and the element value model
//! on which the rest of the tool chain is built.
//!
//! Values hold their encoded bytes verbatim.
//! Interpretation (as text, integers, floats, or nested data sets)
//! happens on access,
//! so that a round trip through read and write
//! preserves the original byte representation.
pub mod dictionary;
pub mod header;
pub mod uid;
pub mod value;
pub mod vr;

pub use crate::header::{DataElementHeader, Header, Length, SequenceItemHeader, Tag};
pub use crate::value::{DataElement, DataSetSequence, PixelFragmentSequence, RawValue, Value};
pub use crate::vr::VR;

pub use byteordered::Endianness;

/// The official implementation class UID of this toolkit,
/// used as the default value of the corresponding
/// file meta group attribute (0002,0012).
pub const IMPLEMENTATION_CLASS_UID: &str = "1.2.826.0.1.3680043.10.1204.1";

/// The implementation version name paired with
/// [`IMPLEMENTATION_CLASS_UID`].
pub const IMPLEMENTATION_VERSION_NAME: &str = "DCMKIT01";
