//! This crate contains the high-level abstraction for reading,
//! validating and writing DICOM objects.
//! At this level, an object is a [data set](Dataset):
//! an ordered dictionary of data elements,
//! some of which may hold data sets themselves.
//!
//! ## Overview
//!
//! - Loading a DICOM file is done with ease via [`open`];
//!   additional reading options (envelope policies, recovery
//!   policies, structural limits, the pixel data load policy and
//!   the validation profile) go through [`OpenOptions`].
//! - [`stream_elements`] yields root-level data elements lazily
//!   without assembling a full data set.
//! - Data sets are serialized back with [`write_file`]/[`write`],
//!   with the transfer syntax and the sequence length mode
//!   selected through [`WriterOptions`].
//! - A data set can be checked against a [validation
//!   profile](ValidationProfile) at any time with [`validate`],
//!   without reparsing.
//!
//! # Encodings
//!
//! Reading and writing covers any transfer syntax without data set
//! compression: _Implicit VR Little Endian_,
//! _Explicit VR Little Endian_
//! (with or without encapsulated pixel data),
//! and the retired _Explicit VR Big Endian_.
//! Encapsulated pixel data is parsed into its fragments;
//! decoding the fragments is delegated to external codecs
//! registered in a
//! [`PixelCodecRegistry`](dcmkit_encoding::transfer_syntax::PixelCodecRegistry)
//! after parsing completes.
//!
//! # Examples
//!
//! Read an object from a DICOM file and inspect some attributes:
//!
//! ```no_run
//! use dcmkit_dictionary_std::tags;
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let obj = dcmkit_object::open("0001.dcm")?;
//!
//! let patient_name = obj.dataset().string(tags::PATIENT_NAME)?;
//! let rows = obj.dataset().uint16(tags::ROWS)?;
//! # Ok(())
//! # }
//! ```
//!
//! Leave the pixel data on disk and fetch one frame on demand:
//!
//! ```no_run
//! use dcmkit_parser::options::{PixelDataHandling, ReaderOptions};
//! use dcmkit_object::OpenOptions;
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let obj = OpenOptions::new()
//!     .reader(ReaderOptions::new().pixel_data_handling(PixelDataHandling::Lazy))
//!     .open_file("0002.dcm")?;
//! let first_frame = obj.dataset().frame(0)?;
//! # Ok(())
//! # }
//! ```

pub mod file;
pub mod mem;
pub mod meta;
pub mod pixeldata;
pub mod tokens;
pub mod validation;

pub use crate::file::{
    from_bytes_with, from_reader_with, open, open_file_with, stream_elements, write, write_dataset,
    write_file, ElementStream, FileDataset, OpenOptions, ReadError, WriteError, WriterOptions,
};
pub use crate::mem::{AccessError, Dataset, Element};
pub use crate::meta::{FileMetaTable, FileMetaTableBuilder};
pub use crate::pixeldata::{
    ImageDescription, LazyPixelData, LoadState, PixelError, PixelPayload,
};
pub use crate::tokens::SequenceLengthMode;
pub use crate::validation::{
    validate, Behavior, ProfileChoice, RuleContext, Severity, ValidationIssue, ValidationOptions,
    ValidationProfile, ValidationReport, ValidationRule,
};

#[cfg(feature = "async")]
pub use crate::file::open_async;

pub use dcmkit_core::{DataElement, DataElementHeader, Length, Tag, VR};
pub use dcmkit_parser::options::{
    CancelToken, EnvelopePolicy, InvalidVrPolicy, PixelDataContext, PixelDataHandling,
    ReaderOptions,
};

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use dcmkit_dictionary_std::tags;
    use dcmkit_parser::options::{PixelDataHandling, ReaderOptions};

    /// wrap a bare explicit VR little endian data set
    /// in a complete Part-10 envelope
    fn part10(dataset: &[u8]) -> Vec<u8> {
        let meta = FileMetaTable::builder()
            .media_storage_sop_class_uid("1.2.840.10008.5.1.4.1.1.7\0")
            .media_storage_sop_instance_uid("1.2.3.4\0")
            .transfer_syntax("1.2.840.10008.1.2.1\0")
            .build()
            .unwrap();
        let mut out = vec![0u8; 128];
        out.extend_from_slice(b"DICM");
        meta.write_to(&mut out).unwrap();
        out.extend_from_slice(dataset);
        out
    }

    #[test]
    fn read_single_element() {
        // (0010,0010) PN "Doe^John"
        let content = part10(&[
            0x10, 0x00, 0x10, 0x00, 0x50, 0x4E, 0x08, 0x00, 0x44, 0x6F, 0x65, 0x5E, 0x4A, 0x6F,
            0x68, 0x6E,
        ]);
        let obj = OpenOptions::new().from_bytes(content).unwrap();
        assert_eq!(
            obj.meta().unwrap().transfer_syntax(),
            "1.2.840.10008.1.2.1"
        );
        let element = obj.dataset().element(tags::PATIENT_NAME).unwrap();
        assert_eq!(element.vr(), VR::PN);
        assert_eq!(element.raw_bytes().as_ref(), b"Doe^John");
        assert_eq!(
            obj.dataset().string(tags::PATIENT_NAME).unwrap(),
            "Doe^John"
        );
    }

    #[test]
    fn read_implicit_vr_unknown_tag() {
        // (0011,1001), 4 bytes, no dictionary entry
        let data: &[u8] = &[
            0x11, 0x00, 0x01, 0x10, 0x04, 0x00, 0x00, 0x00, 0xDE, 0xAD, 0xBE, 0xEF,
        ];
        let obj = OpenOptions::new().from_bytes(Bytes::from_static(data)).unwrap();
        let element = obj.dataset().element(Tag(0x0011, 0x1001)).unwrap();
        assert_eq!(element.vr(), VR::UN);
        assert_eq!(element.raw_bytes().as_ref(), &[0xDE, 0xAD, 0xBE, 0xEF]);
    }

    #[test]
    fn read_delimited_sequence_with_two_items() {
        #[rustfmt::skip]
        let data: &[u8] = &[
            // (0008,1115) SQ, undefined length
            0x08, 0x00, 0x15, 0x11, b'S', b'Q', 0x00, 0x00, 0xFF, 0xFF, 0xFF, 0xFF,
            // item 1, undefined length: (0010,0020) LO "ITEM1 "
            0xFE, 0xFF, 0x00, 0xE0, 0xFF, 0xFF, 0xFF, 0xFF,
            0x10, 0x00, 0x20, 0x00, b'L', b'O', 0x06, 0x00,
            b'I', b'T', b'E', b'M', b'1', b' ',
            0xFE, 0xFF, 0x0D, 0xE0, 0x00, 0x00, 0x00, 0x00,
            // item 2, undefined length: (0010,0020) LO "ITEM2 "
            0xFE, 0xFF, 0x00, 0xE0, 0xFF, 0xFF, 0xFF, 0xFF,
            0x10, 0x00, 0x20, 0x00, b'L', b'O', 0x06, 0x00,
            b'I', b'T', b'E', b'M', b'2', b' ',
            0xFE, 0xFF, 0x0D, 0xE0, 0x00, 0x00, 0x00, 0x00,
            // sequence delimiter
            0xFE, 0xFF, 0xDD, 0xE0, 0x00, 0x00, 0x00, 0x00,
        ];

        let obj = OpenOptions::new().from_bytes(Bytes::from_static(data)).unwrap();
        let element = obj
            .dataset()
            .element(tags::REFERENCED_SERIES_SEQUENCE)
            .unwrap();
        let items = element.value().items().expect("should hold items");
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].string(tags::PATIENT_ID).unwrap(), "ITEM1");
        assert_eq!(items[1].string(tags::PATIENT_ID).unwrap(), "ITEM2");
        assert_eq!(items[0].depth(), 1);
    }

    #[test]
    fn depth_cap_fails_the_parse() {
        let mut data = Vec::new();
        for _ in 0..10 {
            data.extend_from_slice(&[
                0x08, 0x00, 0x15, 0x11, b'S', b'Q', 0x00, 0x00, 0xFF, 0xFF, 0xFF, 0xFF,
            ]);
            data.extend_from_slice(&[0xFE, 0xFF, 0x00, 0xE0, 0xFF, 0xFF, 0xFF, 0xFF]);
        }
        let outcome = OpenOptions::new()
            .reader(ReaderOptions::new().max_sequence_depth(4))
            .from_bytes(data);
        let err = outcome.expect_err("the depth cap must fail the parse");
        assert!(err.to_string().contains("read data set"));
    }

    #[test]
    fn lazy_pixel_data_frame_access() {
        // 128x128, 8 bits, one frame of 16384 bytes
        let mut data = Vec::new();
        let mut us =
            |tag: Tag, value: u16| {
                data.extend_from_slice(&tag.group().to_le_bytes());
                data.extend_from_slice(&tag.element().to_le_bytes());
                data.extend_from_slice(b"US");
                data.extend_from_slice(&2u16.to_le_bytes());
                data.extend_from_slice(&value.to_le_bytes());
            };
        us(tags::ROWS, 128);
        us(tags::COLUMNS, 128);
        us(tags::BITS_ALLOCATED, 8);
        us(tags::PIXEL_REPRESENTATION, 0);
        // (7FE0,0010) OW, 16384 bytes
        data.extend_from_slice(&[0xE0, 0x7F, 0x10, 0x00, b'O', b'W', 0x00, 0x00]);
        data.extend_from_slice(&16384u32.to_le_bytes());
        let pixels: Vec<u8> = (0..16384u32).map(|i| (i % 253) as u8).collect();
        data.extend_from_slice(&pixels);

        let obj = OpenOptions::new()
            .reader(ReaderOptions::new().pixel_data_handling(PixelDataHandling::Lazy))
            .from_bytes(data)
            .unwrap();

        let element = obj.dataset().element(tags::PIXEL_DATA).unwrap();
        let payload = match element.value() {
            dcmkit_core::value::Value::Pixel(p) => p,
            other => panic!("expected a deferred payload, got {:?}", other),
        };
        assert_eq!(payload.load_state(), LoadState::NotLoaded);

        let frame = obj.dataset().frame(0).unwrap();
        assert_eq!(frame.len(), 16384);
        assert_eq!(&frame[..], &pixels[..]);
        assert_eq!(payload.load_state(), LoadState::Loaded);

        let err = obj.dataset().frame(1).expect_err("only one frame");
        assert!(err.to_string().contains("pixel data"));
    }

    #[test]
    fn skipped_pixel_data_fails_access() {
        let mut data = Vec::new();
        data.extend_from_slice(&[0xE0, 0x7F, 0x10, 0x00, b'O', b'B', 0x00, 0x00]);
        data.extend_from_slice(&4u32.to_le_bytes());
        data.extend_from_slice(&[1, 2, 3, 4]);

        let obj = OpenOptions::new()
            .reader(ReaderOptions::new().pixel_data_handling(PixelDataHandling::Skip))
            .from_bytes(data)
            .unwrap();
        let element = obj.dataset().element(tags::PIXEL_DATA).unwrap();
        assert!(element.raw_bytes().is_empty());
        assert!(obj.dataset().frame(0).is_err());
    }

    #[test]
    fn invalid_date_is_a_warning_in_lenient_mode() {
        // (0008,0020) DA "20240230"
        let data: &[u8] = &[
            0x08, 0x00, 0x20, 0x00, b'D', b'A', 0x08, 0x00, b'2', b'0', b'2', b'4', b'0', b'2',
            b'3', b'0',
        ];
        let obj = OpenOptions::new()
            .validation(ValidationOptions {
                profile: ProfileChoice::Lenient,
                callback: None,
                collect_issues: true,
            })
            .from_bytes(Bytes::from_static(data))
            .unwrap();

        let issues: Vec<_> = obj
            .issues()
            .issues()
            .iter()
            .filter(|i| i.code == "value.da.format")
            .collect();
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].severity, Severity::Warning);
        assert_eq!(issues[0].raw_bytes.as_deref(), Some(&b"20240230"[..]));
        assert!(obj.issues().valid());
    }

    #[test]
    fn invalid_uid_aborts_in_strict_mode() {
        // (0008,0018) UI "1.02.3"
        let data: &[u8] = &[
            0x08, 0x00, 0x18, 0x00, b'U', b'I', 0x06, 0x00, b'1', b'.', b'0', b'2', b'.', b'3',
        ];
        let outcome = OpenOptions::new()
            .validation(ValidationOptions {
                profile: ProfileChoice::Strict,
                callback: None,
                collect_issues: true,
            })
            .from_bytes(Bytes::from_static(data));
        match outcome {
            Err(ReadError::Validation { issue }) => {
                assert_eq!(issue.code, "value.ui.format");
                // the position points at the start of the value bytes
                assert_eq!(issue.position, 8);
            }
            other => panic!("expected a validation failure, got {:?}", other.err()),
        }
    }

    #[test]
    fn big_endian_us_value() {
        // explicit VR big endian: (0028,0010) Rows = 512
        let data: &[u8] = &[0x00, 0x28, 0x00, 0x10, b'U', b'S', 0x00, 0x02, 0x02, 0x00];
        let meta = FileMetaTable::builder()
            .media_storage_sop_class_uid("1.2.840.10008.5.1.4.1.1.7\0")
            .media_storage_sop_instance_uid("1.2.3.4\0")
            .transfer_syntax("1.2.840.10008.1.2.2\0")
            .build()
            .unwrap();
        let mut content = vec![0u8; 128];
        content.extend_from_slice(b"DICM");
        meta.write_to(&mut content).unwrap();
        content.extend_from_slice(data);

        let obj = OpenOptions::new().from_bytes(content).unwrap();
        assert_eq!(obj.dataset().uint16(tags::ROWS).unwrap(), 512);
    }

    #[test]
    fn write_and_reread_round_trip() {
        #[rustfmt::skip]
        let data: &[u8] = &[
            // (0008,0060) CS "CT"
            0x08, 0x00, 0x60, 0x00, b'C', b'S', 0x02, 0x00, b'C', b'T',
            // (0008,1115) SQ with one delimited item
            0x08, 0x00, 0x15, 0x11, b'S', b'Q', 0x00, 0x00, 0xFF, 0xFF, 0xFF, 0xFF,
            0xFE, 0xFF, 0x00, 0xE0, 0xFF, 0xFF, 0xFF, 0xFF,
            0x10, 0x00, 0x20, 0x00, b'L', b'O', 0x06, 0x00,
            b'I', b'T', b'E', b'M', b'1', b' ',
            0xFE, 0xFF, 0x0D, 0xE0, 0x00, 0x00, 0x00, 0x00,
            0xFE, 0xFF, 0xDD, 0xE0, 0x00, 0x00, 0x00, 0x00,
            // (0010,0010) PN "Doe^John"
            0x10, 0x00, 0x10, 0x00, b'P', b'N', 0x08, 0x00,
            b'D', b'o', b'e', b'^', b'J', b'o', b'h', b'n',
            // (0028,0010) US 512
            0x28, 0x00, 0x10, 0x00, b'U', b'S', 0x02, 0x00, 0x00, 0x02,
        ];
        let content = part10(data);

        let first = OpenOptions::new().from_bytes(content).unwrap();

        // delimited sequences survive a delimited re-write byte for byte
        let mut rewritten = Vec::new();
        write_dataset(
            first.dataset(),
            &mut rewritten,
            &dcmkit_encoding::transfer_syntax::EXPLICIT_VR_LITTLE_ENDIAN,
            SequenceLengthMode::Delimited,
        )
        .unwrap();
        assert_eq!(&rewritten, &data);

        // a defined re-write still reads back to an equal data set
        let mut defined = Vec::new();
        write_dataset(
            first.dataset(),
            &mut defined,
            &dcmkit_encoding::transfer_syntax::EXPLICIT_VR_LITTLE_ENDIAN,
            SequenceLengthMode::Defined,
        )
        .unwrap();
        assert_eq!(defined.len() % 2, 0);
        let second = OpenOptions::new().from_bytes(defined).unwrap();
        let seq_a = first
            .dataset()
            .element(tags::REFERENCED_SERIES_SEQUENCE)
            .unwrap();
        let seq_b = second
            .dataset()
            .element(tags::REFERENCED_SERIES_SEQUENCE)
            .unwrap();
        assert_eq!(
            seq_a.value().items().unwrap()[0].string(tags::PATIENT_ID).unwrap(),
            seq_b.value().items().unwrap()[0].string(tags::PATIENT_ID).unwrap(),
        );
        assert_eq!(
            second.dataset().string(tags::PATIENT_NAME).unwrap(),
            "Doe^John"
        );
        assert_eq!(second.dataset().uint16(tags::ROWS).unwrap(), 512);
    }

    #[test]
    fn full_envelope_round_trip_through_a_file() {
        let data: &[u8] = &[
            0x10, 0x00, 0x10, 0x00, b'P', b'N', 0x08, 0x00, b'D', b'o', b'e', b'^', b'J', b'o',
            b'h', b'n',
        ];
        let content = part10(data);
        let obj = OpenOptions::new().from_bytes(content).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.dcm");
        obj.write_to_file(&path).unwrap();

        let reread = open(&path).unwrap();
        assert_eq!(
            reread.meta().unwrap().transfer_syntax(),
            "1.2.840.10008.1.2.1"
        );
        assert_eq!(
            reread.dataset().string(tags::PATIENT_NAME).unwrap(),
            "Doe^John"
        );
        assert_eq!(reread.dataset(), obj.dataset());
    }

    #[test]
    fn stream_elements_yields_each_root_element() {
        let data: &[u8] = &[
            0x08, 0x00, 0x60, 0x00, b'C', b'S', 0x02, 0x00, b'C', b'T', //
            0x10, 0x00, 0x10, 0x00, b'P', b'N', 0x08, 0x00, b'D', b'o', b'e', b'^', b'J', b'o',
            b'h', b'n',
        ];
        let content = part10(data);
        let stream = stream_elements(&content[..], OpenOptions::default()).unwrap();
        let elements: Result<Vec<_>, _> = stream.collect();
        let elements = elements.unwrap();
        assert_eq!(elements.len(), 2);
        assert_eq!(
            dcmkit_core::header::Header::tag(&elements[0]),
            tags::MODALITY
        );
        assert_eq!(
            dcmkit_core::header::Header::tag(&elements[1]),
            tags::PATIENT_NAME
        );
    }

    #[test]
    fn clone_to_owned_outlives_the_buffer() {
        let data: &[u8] = &[
            0x10, 0x00, 0x10, 0x00, b'P', b'N', 0x08, 0x00, b'D', b'o', b'e', b'^', b'J', b'o',
            b'h', b'n',
        ];
        let obj = OpenOptions::new().from_bytes(Bytes::from_static(data)).unwrap();
        let owned = obj.dataset().clone_to_owned();
        drop(obj);
        assert_eq!(owned.string(tags::PATIENT_NAME).unwrap(), "Doe^John");
    }

    #[test]
    fn validation_callback_vetoes_the_parse() {
        let data: &[u8] = &[
            0x08, 0x00, 0x20, 0x00, b'D', b'A', 0x08, 0x00, b'2', b'0', b'2', b'4', b'0', b'2',
            b'3', b'0',
        ];
        let outcome = OpenOptions::new()
            .validation(ValidationOptions {
                profile: ProfileChoice::Lenient,
                callback: Some(std::sync::Arc::new(|issue: &ValidationIssue| {
                    issue.code != "value.da.format"
                })),
                collect_issues: false,
            })
            .from_bytes(Bytes::from_static(data));
        assert!(matches!(outcome, Err(ReadError::ValidationCancelled)));
    }

    #[test]
    fn standalone_validation_without_reparse() {
        let data: &[u8] = &[
            0x08, 0x00, 0x20, 0x00, b'D', b'A', 0x08, 0x00, b'2', b'0', b'2', b'4', b'0', b'2',
            b'3', b'0',
        ];
        let obj = OpenOptions::new().from_bytes(Bytes::from_static(data)).unwrap();
        // the default profile collects nothing at read time
        assert!(obj.issues().is_empty());

        let report = validate(obj.dataset(), &ValidationProfile::lenient());
        assert!(report.valid());
        assert_eq!(report.issues()[0].code, "value.da.format");
    }

    #[test]
    fn cancellation_interrupts_the_parse() {
        let data: &[u8] = &[
            0x10, 0x00, 0x10, 0x00, b'P', b'N', 0x08, 0x00, b'D', b'o', b'e', b'^', b'J', b'o',
            b'h', b'n',
        ];
        let token = CancelToken::new();
        token.cancel();
        let outcome = OpenOptions::new()
            .reader(ReaderOptions::new().cancellation(token))
            .from_bytes(Bytes::from_static(data));
        let err = outcome.expect_err("the parse must be cancelled");
        assert!(err.to_string().to_lowercase().contains("read data set"));
    }

    #[test]
    fn pixel_data_callback_decides_the_policy() {
        let mut data = Vec::new();
        data.extend_from_slice(&[0xE0, 0x7F, 0x10, 0x00, b'O', b'B', 0x00, 0x00]);
        data.extend_from_slice(&4u32.to_le_bytes());
        data.extend_from_slice(&[1, 2, 3, 4]);

        let obj = OpenOptions::new()
            .reader(ReaderOptions::new().pixel_data_callback(|ctx: &PixelDataContext| {
                assert!(!ctx.encapsulated);
                PixelDataHandling::Skip
            }))
            .from_bytes(data)
            .unwrap();
        let element = obj.dataset().element(tags::PIXEL_DATA).unwrap();
        assert!(matches!(
            element.value(),
            dcmkit_core::value::Value::Pixel(PixelPayload::Skipped { .. })
        ));
    }

    #[test]
    fn file_meta_only_part10_detection() {
        // a file with preamble but empty main data set
        let content = part10(&[]);
        let obj = OpenOptions::new().from_bytes(content).unwrap();
        assert!(obj.preamble().is_some());
        assert!(obj.dataset().is_empty());
    }

    #[test]
    fn writes_have_even_total_length() {
        let mut dataset = Dataset::new();
        dataset.put(DataElement::new(
            tags::PATIENT_ID,
            VR::LO,
            dcmkit_core::value::Value::Primitive(dcmkit_core::value::RawValue::from_text("ODD")),
        ));
        let mut out = Vec::new();
        write_dataset(
            &dataset,
            &mut out,
            &dcmkit_encoding::transfer_syntax::EXPLICIT_VR_LITTLE_ENDIAN,
            SequenceLengthMode::Delimited,
        )
        .unwrap();
        assert_eq!(out.len() % 2, 0);
        // "ODD" is padded with a space to 4 bytes
        assert_eq!(&out[8..12], b"ODD ");
    }

    #[test]
    fn detects_bare_datasets_without_envelope() {
        let data: &[u8] = &[
            0x10, 0x00, 0x10, 0x00, 0x08, 0x00, 0x00, 0x00, b'D', b'o', b'e', b'^', b'J', b'o',
            b'h', b'n',
        ];
        // implicit VR little endian, no preamble, no file meta
        let obj = OpenOptions::new().from_bytes(Bytes::from_static(data)).unwrap();
        assert!(obj.meta().is_none());
        assert_eq!(
            obj.dataset().string(tags::PATIENT_NAME).unwrap(),
            "Doe^John"
        );
    }

    #[test]
    fn preamble_require_policy_rejects_bare_data() {
        let data: &[u8] = &[0x10, 0x00, 0x10, 0x00, 0x02, 0x00, 0x00, 0x00, b'H', b'i'];
        let outcome = OpenOptions::new()
            .reader(ReaderOptions::new().preamble(EnvelopePolicy::Require))
            .from_bytes(Bytes::from_static(data));
        assert!(matches!(outcome, Err(ReadError::InvalidMagicCode { .. })));
    }

    #[test]
    fn orphan_private_elements_policy() {
        // (0009,1001) without a creator for slot 0x10
        let data: &[u8] = &[
            0x09, 0x00, 0x01, 0x10, b'L', b'O', 0x04, 0x00, b'd', b'a', b't', b'a',
        ];
        let outcome = OpenOptions::new()
            .reader(ReaderOptions::new().fail_on_orphan_private_elements(true))
            .from_bytes(Bytes::from_static(data));
        assert!(matches!(
            outcome,
            Err(ReadError::OrphanPrivateElement { tag: Tag(0x0009, 0x1001), .. })
        ));

        // dropped silently when not retaining unknown private tags
        let obj = OpenOptions::new()
            .reader(ReaderOptions::new().retain_unknown_private_tags(false))
            .from_bytes(Bytes::from_static(data))
            .unwrap();
        assert!(obj.dataset().is_empty());
    }

    #[test]
    fn charset_switch_applies_to_text_access() {
        #[rustfmt::skip]
        let data: &[u8] = &[
            // (0008,0005) CS "ISO_IR 100"
            0x08, 0x00, 0x05, 0x00, b'C', b'S', 0x0A, 0x00,
            b'I', b'S', b'O', b'_', b'I', b'R', b' ', b'1', b'0', b'0',
            // (0010,0010) PN "Simões" in latin-1
            0x10, 0x00, 0x10, 0x00, b'P', b'N', 0x06, 0x00,
            b'S', b'i', b'm', 0xF5, b'e', b's',
        ];
        let obj = OpenOptions::new().from_bytes(Bytes::from_static(data)).unwrap();
        assert_eq!(
            obj.dataset().string(tags::PATIENT_NAME).unwrap(),
            "Simões"
        );
    }

    #[test]
    fn encapsulated_pixel_data_round_trip() {
        #[rustfmt::skip]
        let data: &[u8] = &[
            0xE0, 0x7F, 0x10, 0x00, b'O', b'B', 0x00, 0x00, 0xFF, 0xFF, 0xFF, 0xFF,
            // basic offset table, one frame
            0xFE, 0xFF, 0x00, 0xE0, 0x04, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
            // one fragment
            0xFE, 0xFF, 0x00, 0xE0, 0x04, 0x00, 0x00, 0x00, 0x99, 0x88, 0x77, 0x66,
            0xFE, 0xFF, 0xDD, 0xE0, 0x00, 0x00, 0x00, 0x00,
        ];
        let meta = FileMetaTable::builder()
            .media_storage_sop_class_uid("1.2.840.10008.5.1.4.1.1.7\0")
            .media_storage_sop_instance_uid("1.2.3.4\0")
            .transfer_syntax("1.2.840.10008.1.2.4.50\0")
            .build()
            .unwrap();
        let mut content = vec![0u8; 128];
        content.extend_from_slice(b"DICM");
        meta.write_to(&mut content).unwrap();
        content.extend_from_slice(data);

        let obj = OpenOptions::new().from_bytes(content).unwrap();
        let element = obj.dataset().element(tags::PIXEL_DATA).unwrap();
        let fragments = element.value().fragments().expect("fragment sequence");
        assert_eq!(fragments.offset_table(), &[0]);
        assert_eq!(fragments.fragments().len(), 1);
        assert_eq!(&fragments.fragments()[0][..], &[0x99, 0x88, 0x77, 0x66]);

        // fragment order and content survive a re-write
        let mut rewritten = Vec::new();
        write_dataset(
            obj.dataset(),
            &mut rewritten,
            &dcmkit_encoding::transfer_syntax::JPEG_BASELINE,
            SequenceLengthMode::Delimited,
        )
        .unwrap();
        assert_eq!(&rewritten, &data);
    }
}
