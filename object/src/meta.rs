//! Data structures and readers of the DICOM file meta information
//! group, which heads every Part-10 file and is always encoded in
//! Explicit VR Little Endian.

use dcmkit_core::header::Header;
use dcmkit_core::{DataElementHeader, Length, Tag, VR};
use dcmkit_encoding::decode::file_header_decoder;
use dcmkit_encoding::decode::Decode;
use dcmkit_encoding::encode::explicit_le::ExplicitVRLittleEndianEncoder;
use dcmkit_encoding::encode::Encode;
use dcmkit_core::{IMPLEMENTATION_CLASS_UID, IMPLEMENTATION_VERSION_NAME};
use snafu::{ensure, Backtrace, OptionExt, ResultExt, Snafu};
use std::io::{Read, Write};

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
#[non_exhaustive]
pub enum Error {
    /// The parser could not fetch the value of a data element
    /// from its source.
    #[snafu(display("Could not read data value"))]
    ReadValueData {
        backtrace: Backtrace,
        source: std::io::Error,
    },

    /// An issue occurred while decoding the next data element
    /// in the file meta group.
    #[snafu(display("Could not decode data element"))]
    DecodeElement {
        #[snafu(backtrace)]
        source: dcmkit_encoding::decode::Error,
    },

    /// The first element of the group is not the group length.
    #[snafu(display("Unexpected data element {} in file meta group position", tag))]
    UnexpectedTag { tag: Tag, backtrace: Backtrace },

    /// A required file meta attribute is missing.
    #[snafu(display("Missing file meta data element `{}`", alias))]
    MissingElement {
        alias: &'static str,
        backtrace: Backtrace,
    },

    /// The value length of a file meta element was undefined,
    /// which the group does not allow.
    #[snafu(display("Undefined value length for data element {}", tag))]
    UndefinedValueLength { tag: Tag, backtrace: Backtrace },

    /// The file meta group could not be encoded.
    #[snafu(display("Could not write file meta group"))]
    WriteGroup {
        #[snafu(backtrace)]
        source: dcmkit_encoding::encode::Error,
    },

    /// The file meta group value data could not be written.
    #[snafu(display("Could not write file meta value data"))]
    WriteValueData {
        backtrace: Backtrace,
        source: std::io::Error,
    },
}

type Result<T> = std::result::Result<T, Error>;

/// DICOM File Meta Information group.
///
/// This data type contains the relevant parts of the group-0002
/// data set at the head of a Part-10 file.
/// Creating a table from scratch is more easily done with a
/// [`FileMetaTableBuilder`]; when modifying the public fields,
/// [`update_information_group_length`][1] restores the
/// group length invariant.
///
/// [1]: FileMetaTable::update_information_group_length
#[derive(Debug, Clone, PartialEq)]
pub struct FileMetaTable {
    /// File Meta Information Group Length, in bytes,
    /// covering everything after the group length element itself.
    pub information_group_length: u32,
    /// File Meta Information Version
    pub information_version: [u8; 2],
    /// Media Storage SOP Class UID
    pub media_storage_sop_class_uid: String,
    /// Media Storage SOP Instance UID
    pub media_storage_sop_instance_uid: String,
    /// Transfer Syntax UID
    pub transfer_syntax: String,
    /// Implementation Class UID
    pub implementation_class_uid: String,
    /// Implementation Version Name
    pub implementation_version_name: Option<String>,
    /// Source Application Entity Title
    pub source_application_entity_title: Option<String>,
    /// Sending Application Entity Title
    pub sending_application_entity_title: Option<String>,
    /// Receiving Application Entity Title
    pub receiving_application_entity_title: Option<String>,
    /// Private Information Creator UID
    pub private_information_creator_uid: Option<String>,
    /// Private Information
    pub private_information: Option<Vec<u8>>,
}

fn trim_uid_str(uid: &str) -> &str {
    uid.trim_end_matches(|c: char| c.is_whitespace() || c == '\0')
}

fn dicom_len(value: &str) -> u32 {
    (value.len() as u32 + 1) & !1
}

fn read_str_body<S>(source: &mut S, len: u32) -> Result<String>
where
    S: Read,
{
    let mut v = vec![0u8; len as usize];
    source.read_exact(&mut v).context(ReadValueDataSnafu)?;
    // file meta values are in the default repertoire
    Ok(v.iter().map(|&b| b as char).collect())
}

impl FileMetaTable {
    /// Parse a file meta group from a reader positioned right
    /// after the `DICM` magic code.
    /// Consumes exactly the group length element plus the number
    /// of bytes it declares.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        FileMetaTable::read_from(reader)
    }

    /// Getter for the transfer syntax UID,
    /// with trailing padding already excluded.
    pub fn transfer_syntax(&self) -> &str {
        trim_uid_str(&self.transfer_syntax)
    }

    /// Getter for the media storage SOP class UID,
    /// with trailing padding already excluded.
    pub fn media_storage_sop_class_uid(&self) -> &str {
        trim_uid_str(&self.media_storage_sop_class_uid)
    }

    /// Getter for the media storage SOP instance UID,
    /// with trailing padding already excluded.
    pub fn media_storage_sop_instance_uid(&self) -> &str {
        trim_uid_str(&self.media_storage_sop_instance_uid)
    }

    /// Getter for the implementation class UID,
    /// with trailing padding already excluded.
    pub fn implementation_class_uid(&self) -> &str {
        trim_uid_str(&self.implementation_class_uid)
    }

    /// Replace the transfer syntax UID and recompute
    /// the group length.
    pub fn set_transfer_syntax(&mut self, uid: &str) {
        self.transfer_syntax = trim_uid_str(uid).to_string();
        self.update_information_group_length();
    }

    /// Recompute the `information_group_length` field from the
    /// attributes currently set.
    pub fn update_information_group_length(&mut self) {
        self.information_group_length = self.calculate_information_group_length();
    }

    /// The number of bytes this table occupies on the wire,
    /// including the group length element.
    pub fn encoded_byte_len(&self) -> u64 {
        12 + u64::from(self.calculate_information_group_length())
    }

    fn calculate_information_group_length(&self) -> u32 {
        // the group length element itself is intentionally excluded
        let mut len = (12 + 2) // (0002,0001) OB, long form header
            + 8 + dicom_len(&self.media_storage_sop_class_uid)
            + 8 + dicom_len(&self.media_storage_sop_instance_uid)
            + 8 + dicom_len(&self.transfer_syntax)
            + 8 + dicom_len(&self.implementation_class_uid);
        if let Some(v) = &self.implementation_version_name {
            len += 8 + dicom_len(v);
        }
        if let Some(v) = &self.source_application_entity_title {
            len += 8 + dicom_len(v);
        }
        if let Some(v) = &self.sending_application_entity_title {
            len += 8 + dicom_len(v);
        }
        if let Some(v) = &self.receiving_application_entity_title {
            len += 8 + dicom_len(v);
        }
        if let Some(v) = &self.private_information_creator_uid {
            len += 8 + dicom_len(v);
        }
        if let Some(v) = &self.private_information {
            len += 12 + ((v.len() as u32 + 1) & !1);
        }
        len
    }

    fn read_from<R: Read>(mut source: R) -> Result<Self> {
        let decoder = file_header_decoder();

        // the group length element bounds the rest of the group
        let (header, _) = decoder
            .decode_header(&mut source)
            .context(DecodeElementSnafu)?;
        ensure!(
            header.tag() == Tag(0x0002, 0x0000),
            UnexpectedTagSnafu { tag: header.tag() }
        );

        let mut buf = [0u8; 4];
        source.read_exact(&mut buf).context(ReadValueDataSnafu)?;
        let group_length = u32::from_le_bytes(buf);

        let mut information_version = None;
        let mut media_storage_sop_class_uid = None;
        let mut media_storage_sop_instance_uid = None;
        let mut transfer_syntax = None;
        let mut implementation_class_uid = None;
        let mut implementation_version_name = None;
        let mut source_application_entity_title = None;
        let mut sending_application_entity_title = None;
        let mut receiving_application_entity_title = None;
        let mut private_information_creator_uid = None;
        let mut private_information = None;

        let mut read = 0u32;
        while read < group_length {
            let (header, header_len) = decoder
                .decode_header(&mut source)
                .context(DecodeElementSnafu)?;
            let len = header.len().get().context(UndefinedValueLengthSnafu {
                tag: header.tag(),
            })?;
            read += header_len as u32 + len;

            match header.tag() {
                Tag(0x0002, 0x0001) => {
                    let mut v = vec![0u8; len as usize];
                    source.read_exact(&mut v).context(ReadValueDataSnafu)?;
                    let mut version = [0u8; 2];
                    version.copy_from_slice(&v[..2.min(v.len())]);
                    information_version = Some(version);
                }
                Tag(0x0002, 0x0002) => {
                    media_storage_sop_class_uid = Some(read_str_body(&mut source, len)?);
                }
                Tag(0x0002, 0x0003) => {
                    media_storage_sop_instance_uid = Some(read_str_body(&mut source, len)?);
                }
                Tag(0x0002, 0x0010) => {
                    transfer_syntax = Some(read_str_body(&mut source, len)?);
                }
                Tag(0x0002, 0x0012) => {
                    implementation_class_uid = Some(read_str_body(&mut source, len)?);
                }
                Tag(0x0002, 0x0013) => {
                    implementation_version_name = Some(read_str_body(&mut source, len)?);
                }
                Tag(0x0002, 0x0016) => {
                    source_application_entity_title = Some(read_str_body(&mut source, len)?);
                }
                Tag(0x0002, 0x0017) => {
                    sending_application_entity_title = Some(read_str_body(&mut source, len)?);
                }
                Tag(0x0002, 0x0018) => {
                    receiving_application_entity_title = Some(read_str_body(&mut source, len)?);
                }
                Tag(0x0002, 0x0100) => {
                    private_information_creator_uid = Some(read_str_body(&mut source, len)?);
                }
                Tag(0x0002, 0x0102) => {
                    let mut v = vec![0u8; len as usize];
                    source.read_exact(&mut v).context(ReadValueDataSnafu)?;
                    private_information = Some(v);
                }
                tag => {
                    // tolerate and discard unrecognized 0002 elements
                    tracing::debug!("ignoring unsupported file meta element {}", tag);
                    let mut v = vec![0u8; len as usize];
                    source.read_exact(&mut v).context(ReadValueDataSnafu)?;
                }
            }
        }

        Ok(FileMetaTable {
            information_group_length: group_length,
            information_version: information_version.unwrap_or([0, 1]),
            media_storage_sop_class_uid: media_storage_sop_class_uid.unwrap_or_default(),
            media_storage_sop_instance_uid: media_storage_sop_instance_uid.unwrap_or_default(),
            transfer_syntax: transfer_syntax.context(MissingElementSnafu {
                alias: "TransferSyntaxUID",
            })?,
            implementation_class_uid: implementation_class_uid.unwrap_or_default(),
            implementation_version_name,
            source_application_entity_title,
            sending_application_entity_title,
            receiving_application_entity_title,
            private_information_creator_uid,
            private_information,
        })
    }

    /// Write the file meta group, always in Explicit VR Little
    /// Endian with defined lengths, recomputing the group length.
    pub fn write_to<W: Write>(&self, mut to: W) -> Result<()> {
        let encoder = ExplicitVRLittleEndianEncoder::default();
        let group_length = self.calculate_information_group_length();

        let mut write_element = |tag: Tag, vr: VR, data: &[u8]| -> Result<()> {
            let padded = (data.len() as u32 + 1) & !1;
            encoder
                .encode_element_header(
                    &mut to,
                    DataElementHeader::new(tag, vr, Length(padded)),
                )
                .context(WriteGroupSnafu)?;
            to.write_all(data).context(WriteValueDataSnafu)?;
            if data.len() % 2 != 0 {
                let pad = [vr.padding()];
                to.write_all(&pad).context(WriteValueDataSnafu)?;
            }
            Ok(())
        };

        write_element(
            Tag(0x0002, 0x0000),
            VR::UL,
            &group_length.to_le_bytes(),
        )?;
        write_element(Tag(0x0002, 0x0001), VR::OB, &self.information_version)?;
        write_element(
            Tag(0x0002, 0x0002),
            VR::UI,
            self.media_storage_sop_class_uid.as_bytes(),
        )?;
        write_element(
            Tag(0x0002, 0x0003),
            VR::UI,
            self.media_storage_sop_instance_uid.as_bytes(),
        )?;
        write_element(Tag(0x0002, 0x0010), VR::UI, self.transfer_syntax.as_bytes())?;
        write_element(
            Tag(0x0002, 0x0012),
            VR::UI,
            self.implementation_class_uid.as_bytes(),
        )?;
        if let Some(v) = &self.implementation_version_name {
            write_element(Tag(0x0002, 0x0013), VR::SH, v.as_bytes())?;
        }
        if let Some(v) = &self.source_application_entity_title {
            write_element(Tag(0x0002, 0x0016), VR::AE, v.as_bytes())?;
        }
        if let Some(v) = &self.sending_application_entity_title {
            write_element(Tag(0x0002, 0x0017), VR::AE, v.as_bytes())?;
        }
        if let Some(v) = &self.receiving_application_entity_title {
            write_element(Tag(0x0002, 0x0018), VR::AE, v.as_bytes())?;
        }
        if let Some(v) = &self.private_information_creator_uid {
            write_element(Tag(0x0002, 0x0100), VR::UI, v.as_bytes())?;
        }
        if let Some(v) = &self.private_information {
            write_element(Tag(0x0002, 0x0102), VR::OB, v)?;
        }
        Ok(())
    }

    /// Start building a file meta table.
    pub fn builder() -> FileMetaTableBuilder {
        FileMetaTableBuilder::default()
    }
}

/// A builder for DICOM file meta information tables.
#[derive(Debug, Default, Clone)]
pub struct FileMetaTableBuilder {
    information_version: Option<[u8; 2]>,
    media_storage_sop_class_uid: Option<String>,
    media_storage_sop_instance_uid: Option<String>,
    transfer_syntax: Option<String>,
    implementation_class_uid: Option<String>,
    implementation_version_name: Option<String>,
    source_application_entity_title: Option<String>,
    sending_application_entity_title: Option<String>,
    receiving_application_entity_title: Option<String>,
    private_information_creator_uid: Option<String>,
    private_information: Option<Vec<u8>>,
}

impl FileMetaTableBuilder {
    /// Create a new, empty builder.
    pub fn new() -> Self {
        FileMetaTableBuilder::default()
    }

    /// Define the media storage SOP class UID.
    pub fn media_storage_sop_class_uid(mut self, value: impl Into<String>) -> Self {
        self.media_storage_sop_class_uid = Some(value.into());
        self
    }

    /// Define the media storage SOP instance UID.
    pub fn media_storage_sop_instance_uid(mut self, value: impl Into<String>) -> Self {
        self.media_storage_sop_instance_uid = Some(value.into());
        self
    }

    /// Define the transfer syntax of the main data set.
    pub fn transfer_syntax(mut self, value: impl Into<String>) -> Self {
        self.transfer_syntax = Some(value.into());
        self
    }

    /// Define the implementation class UID.
    pub fn implementation_class_uid(mut self, value: impl Into<String>) -> Self {
        self.implementation_class_uid = Some(value.into());
        self
    }

    /// Define the implementation version name.
    pub fn implementation_version_name(mut self, value: impl Into<String>) -> Self {
        self.implementation_version_name = Some(value.into());
        self
    }

    /// Define the source application entity title.
    pub fn source_application_entity_title(mut self, value: impl Into<String>) -> Self {
        self.source_application_entity_title = Some(value.into());
        self
    }

    /// Build the file meta table, with the group length computed
    /// and this implementation's identifiers filled in
    /// when not overridden.
    pub fn build(self) -> Result<FileMetaTable> {
        let transfer_syntax = self.transfer_syntax.context(MissingElementSnafu {
            alias: "TransferSyntaxUID",
        })?;
        let mut table = FileMetaTable {
            information_group_length: 0,
            information_version: self.information_version.unwrap_or([0, 1]),
            media_storage_sop_class_uid: pad_uid(
                self.media_storage_sop_class_uid.unwrap_or_default(),
            ),
            media_storage_sop_instance_uid: pad_uid(
                self.media_storage_sop_instance_uid.unwrap_or_default(),
            ),
            transfer_syntax: pad_uid(transfer_syntax),
            implementation_class_uid: pad_uid(
                self.implementation_class_uid
                    .unwrap_or_else(|| IMPLEMENTATION_CLASS_UID.to_string()),
            ),
            implementation_version_name: Some(
                self.implementation_version_name
                    .unwrap_or_else(|| IMPLEMENTATION_VERSION_NAME.to_string()),
            ),
            source_application_entity_title: self.source_application_entity_title,
            sending_application_entity_title: self.sending_application_entity_title,
            receiving_application_entity_title: self.receiving_application_entity_title,
            private_information_creator_uid: self.private_information_creator_uid,
            private_information: self.private_information,
        };
        table.update_information_group_length();
        Ok(table)
    }
}

fn pad_uid(mut uid: String) -> String {
    if uid.len() % 2 != 0 {
        uid.push('\0');
    }
    uid
}

#[cfg(test)]
mod tests {
    use super::*;

    // a valid file meta group for Explicit VR Little Endian,
    // with the group length element declaring the exact byte count
    fn sample_table() -> FileMetaTable {
        FileMetaTable::builder()
            .media_storage_sop_class_uid("1.2.840.10008.5.1.4.1.1.7\0")
            .media_storage_sop_instance_uid("1.2.3.4.5.6\0")
            .transfer_syntax("1.2.840.10008.1.2.1\0")
            .build()
            .unwrap()
    }

    #[test]
    fn round_trip_through_bytes() {
        let table = sample_table();
        let mut encoded = Vec::new();
        table.write_to(&mut encoded).unwrap();
        assert_eq!(encoded.len() as u64, table.encoded_byte_len());

        let decoded = FileMetaTable::from_reader(&encoded[..]).unwrap();
        assert_eq!(decoded, table);
        assert_eq!(decoded.transfer_syntax(), "1.2.840.10008.1.2.1");
    }

    #[test]
    fn group_length_matches_encoded_size() {
        let table = sample_table();
        let mut encoded = Vec::new();
        table.write_to(&mut encoded).unwrap();
        // everything after the 12-byte group length element
        // is covered by the declared group length
        assert_eq!(
            encoded.len() as u32 - 12,
            table.information_group_length
        );
    }

    #[test]
    fn updating_fields_updates_group_length() {
        let mut table = sample_table();
        let before = table.information_group_length;
        table.set_transfer_syntax("1.2.840.10008.1.2\0");
        assert_ne!(table.information_group_length, before);
    }

    #[test]
    fn missing_transfer_syntax_is_an_error() {
        let outcome = FileMetaTable::builder()
            .media_storage_sop_class_uid("1.2.840.10008.5.1.4.1.1.7\0")
            .build();
        assert!(matches!(outcome, Err(Error::MissingElement { .. })));
    }
}
