//! This crate implements the standard DICOM dictionaries
//! consumed by the rest of the tool chain.
//!
//! ## Run-time dictionaries
//!
//! - [`data_element`]: the standard attribute registry,
//!   used by default whenever an attribute dictionary is needed.
//! - [`private`]: a registry of known vendor-specific attributes,
//!   queried by private creator identifier.
//!
//! The records in these dictionaries are collected from
//! [DICOM PS3.6]; the tables themselves are emitted by an external
//! generation step which consumes the standard's XML,
//! so the runtime only embeds and indexes them.
//! Each dictionary is provided as a singleton behind a unit type.
//!
//! [DICOM PS3.6]: https://dicom.nema.org/medical/dicom/current/output/chtml/part06/ps3.6.html
//!
//! ## Constants
//!
//! - [`tags`] maps attribute keywords to DICOM tags at compile time
//! - [`uids`] declares normative unique identifiers

pub mod data_element;
mod entries;
pub mod private;
pub mod tags;
pub mod uids;

pub use data_element::{StandardDataDictionary, StandardDataDictionaryRegistry};
pub use private::StandardPrivateDictionary;

#[cfg(test)]
mod tests {
    use dcmkit_core::Tag;

    /// a few attribute constants to make sure the tag constants
    /// were well installed into the crate
    #[test]
    fn tags_constants_available() {
        use crate::tags::*;
        assert_eq!(PATIENT_NAME, Tag(0x0010, 0x0010));
        assert_eq!(MODALITY, Tag(0x0008, 0x0060));
        assert_eq!(PIXEL_DATA, Tag(0x7FE0, 0x0010));
        assert_eq!(TRANSFER_SYNTAX_UID, Tag(0x0002, 0x0010));
    }

    /// presence of a few UID constants
    #[test]
    fn uids_constants_available() {
        use crate::uids::*;
        assert_eq!(EXPLICIT_VR_LITTLE_ENDIAN, "1.2.840.10008.1.2.1");
        assert_eq!(IMPLICIT_VR_LITTLE_ENDIAN, "1.2.840.10008.1.2");
        assert_eq!(VERIFICATION, "1.2.840.10008.1.1");
        assert_eq!(SECONDARY_CAPTURE_IMAGE_STORAGE, "1.2.840.10008.5.1.4.1.1.7");
    }
}
