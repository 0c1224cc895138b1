//! Attribute tag constants, by keyword.

use dcmkit_core::Tag;

/// (0002,0000) File Meta Information Group Length
pub const FILE_META_INFORMATION_GROUP_LENGTH: Tag = Tag(0x0002, 0x0000);
/// (0002,0001) File Meta Information Version
pub const FILE_META_INFORMATION_VERSION: Tag = Tag(0x0002, 0x0001);
/// (0002,0002) Media Storage SOP Class UID
pub const MEDIA_STORAGE_SOP_CLASS_UID: Tag = Tag(0x0002, 0x0002);
/// (0002,0003) Media Storage SOP Instance UID
pub const MEDIA_STORAGE_SOP_INSTANCE_UID: Tag = Tag(0x0002, 0x0003);
/// (0002,0010) Transfer Syntax UID
pub const TRANSFER_SYNTAX_UID: Tag = Tag(0x0002, 0x0010);
/// (0002,0012) Implementation Class UID
pub const IMPLEMENTATION_CLASS_UID: Tag = Tag(0x0002, 0x0012);
/// (0002,0013) Implementation Version Name
pub const IMPLEMENTATION_VERSION_NAME: Tag = Tag(0x0002, 0x0013);
/// (0002,0016) Source Application Entity Title
pub const SOURCE_APPLICATION_ENTITY_TITLE: Tag = Tag(0x0002, 0x0016);
/// (0002,0017) Sending Application Entity Title
pub const SENDING_APPLICATION_ENTITY_TITLE: Tag = Tag(0x0002, 0x0017);
/// (0002,0018) Receiving Application Entity Title
pub const RECEIVING_APPLICATION_ENTITY_TITLE: Tag = Tag(0x0002, 0x0018);
/// (0002,0100) Private Information Creator UID
pub const PRIVATE_INFORMATION_CREATOR_UID: Tag = Tag(0x0002, 0x0100);
/// (0002,0102) Private Information
pub const PRIVATE_INFORMATION: Tag = Tag(0x0002, 0x0102);

/// (0008,0005) Specific Character Set
pub const SPECIFIC_CHARACTER_SET: Tag = Tag(0x0008, 0x0005);
/// (0008,0008) Image Type
pub const IMAGE_TYPE: Tag = Tag(0x0008, 0x0008);
/// (0008,0016) SOP Class UID
pub const SOP_CLASS_UID: Tag = Tag(0x0008, 0x0016);
/// (0008,0018) SOP Instance UID
pub const SOP_INSTANCE_UID: Tag = Tag(0x0008, 0x0018);
/// (0008,0020) Study Date
pub const STUDY_DATE: Tag = Tag(0x0008, 0x0020);
/// (0008,0030) Study Time
pub const STUDY_TIME: Tag = Tag(0x0008, 0x0030);
/// (0008,0050) Accession Number
pub const ACCESSION_NUMBER: Tag = Tag(0x0008, 0x0050);
/// (0008,0060) Modality
pub const MODALITY: Tag = Tag(0x0008, 0x0060);
/// (0008,0070) Manufacturer
pub const MANUFACTURER: Tag = Tag(0x0008, 0x0070);
/// (0008,0090) Referring Physician's Name
pub const REFERRING_PHYSICIAN_NAME: Tag = Tag(0x0008, 0x0090);
/// (0008,103E) Series Description
pub const SERIES_DESCRIPTION: Tag = Tag(0x0008, 0x103E);
/// (0008,1115) Referenced Series Sequence
pub const REFERENCED_SERIES_SEQUENCE: Tag = Tag(0x0008, 0x1115);
/// (0008,1150) Referenced SOP Class UID
pub const REFERENCED_SOP_CLASS_UID: Tag = Tag(0x0008, 0x1150);
/// (0008,1155) Referenced SOP Instance UID
pub const REFERENCED_SOP_INSTANCE_UID: Tag = Tag(0x0008, 0x1155);

/// (0010,0010) Patient's Name
pub const PATIENT_NAME: Tag = Tag(0x0010, 0x0010);
/// (0010,0020) Patient ID
pub const PATIENT_ID: Tag = Tag(0x0010, 0x0020);
/// (0010,0030) Patient's Birth Date
pub const PATIENT_BIRTH_DATE: Tag = Tag(0x0010, 0x0030);
/// (0010,0040) Patient's Sex
pub const PATIENT_SEX: Tag = Tag(0x0010, 0x0040);
/// (0010,1010) Patient's Age
pub const PATIENT_AGE: Tag = Tag(0x0010, 0x1010);

/// (0018,6011) Sequence of Ultrasound Regions
pub const SEQUENCE_OF_ULTRASOUND_REGIONS: Tag = Tag(0x0018, 0x6011);

/// (0020,000D) Study Instance UID
pub const STUDY_INSTANCE_UID: Tag = Tag(0x0020, 0x000D);
/// (0020,000E) Series Instance UID
pub const SERIES_INSTANCE_UID: Tag = Tag(0x0020, 0x000E);
/// (0020,0010) Study ID
pub const STUDY_ID: Tag = Tag(0x0020, 0x0010);
/// (0020,0011) Series Number
pub const SERIES_NUMBER: Tag = Tag(0x0020, 0x0011);
/// (0020,0013) Instance Number
pub const INSTANCE_NUMBER: Tag = Tag(0x0020, 0x0013);
/// (0020,4000) Image Comments
pub const IMAGE_COMMENTS: Tag = Tag(0x0020, 0x4000);

/// (0028,0002) Samples per Pixel
pub const SAMPLES_PER_PIXEL: Tag = Tag(0x0028, 0x0002);
/// (0028,0004) Photometric Interpretation
pub const PHOTOMETRIC_INTERPRETATION: Tag = Tag(0x0028, 0x0004);
/// (0028,0008) Number of Frames
pub const NUMBER_OF_FRAMES: Tag = Tag(0x0028, 0x0008);
/// (0028,0010) Rows
pub const ROWS: Tag = Tag(0x0028, 0x0010);
/// (0028,0011) Columns
pub const COLUMNS: Tag = Tag(0x0028, 0x0011);
/// (0028,0100) Bits Allocated
pub const BITS_ALLOCATED: Tag = Tag(0x0028, 0x0100);
/// (0028,0101) Bits Stored
pub const BITS_STORED: Tag = Tag(0x0028, 0x0101);
/// (0028,0102) High Bit
pub const HIGH_BIT: Tag = Tag(0x0028, 0x0102);
/// (0028,0103) Pixel Representation
pub const PIXEL_REPRESENTATION: Tag = Tag(0x0028, 0x0103);

/// (7FE0,0001) Extended Offset Table
pub const EXTENDED_OFFSET_TABLE: Tag = Tag(0x7FE0, 0x0001);
/// (7FE0,0002) Extended Offset Table Lengths
pub const EXTENDED_OFFSET_TABLE_LENGTHS: Tag = Tag(0x7FE0, 0x0002);
/// (7FE0,0008) Float Pixel Data
pub const FLOAT_PIXEL_DATA: Tag = Tag(0x7FE0, 0x0008);
/// (7FE0,0009) Double Float Pixel Data
pub const DOUBLE_FLOAT_PIXEL_DATA: Tag = Tag(0x7FE0, 0x0009);
/// (7FE0,0010) Pixel Data
pub const PIXEL_DATA: Tag = Tag(0x7FE0, 0x0010);

/// (FFFE,E000) Item
pub const ITEM: Tag = Tag(0xFFFE, 0xE000);
/// (FFFE,E00D) Item Delimitation Item
pub const ITEM_DELIMITATION_ITEM: Tag = Tag(0xFFFE, 0xE00D);
/// (FFFE,E0DD) Sequence Delimitation Item
pub const SEQUENCE_DELIMITATION_ITEM: Tag = Tag(0xFFFE, 0xE0DD);
