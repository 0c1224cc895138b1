//! The embedded standard attribute table.
//!
//! Emitted from DICOM PS3.6; the generation step lives outside
//! this repository and this file only carries its output.

use dcmkit_core::dictionary::VirtualVr::{self, Exact, Lt, Ox, Px, Xs};
use dcmkit_core::dictionary::{DictionaryEntryRef, Multiplicity, TagRange};
use dcmkit_core::{Tag, VR};

const fn single(
    group: u16,
    element: u16,
    keyword: &'static str,
    name: &'static str,
    vr: VirtualVr,
    vm: Multiplicity,
    retired: bool,
) -> DictionaryEntryRef<'static> {
    DictionaryEntryRef {
        tag: TagRange::Single(Tag(group, element)),
        keyword,
        name,
        vr,
        vm,
        retired,
    }
}

const fn group100(
    group: u16,
    element: u16,
    keyword: &'static str,
    name: &'static str,
    vr: VirtualVr,
    vm: Multiplicity,
    retired: bool,
) -> DictionaryEntryRef<'static> {
    DictionaryEntryRef {
        tag: TagRange::Group100(Tag(group, element)),
        keyword,
        name,
        vr,
        vm,
        retired,
    }
}

const VM1: Multiplicity = Multiplicity::ONE;
const VM2: Multiplicity = Multiplicity::fixed(2);
const VM3: Multiplicity = Multiplicity::fixed(3);
const VM6: Multiplicity = Multiplicity::fixed(6);
const VM1N: Multiplicity = Multiplicity::unbounded(1);
const VM2N: Multiplicity = Multiplicity::unbounded(2);

#[rustfmt::skip]
pub(crate) static ENTRIES: &[DictionaryEntryRef<'static>] = &[
    // group 0002: file meta information
    single(0x0002, 0x0000, "FileMetaInformationGroupLength", "File Meta Information Group Length", Exact(VR::UL), VM1, false),
    single(0x0002, 0x0001, "FileMetaInformationVersion", "File Meta Information Version", Exact(VR::OB), VM1, false),
    single(0x0002, 0x0002, "MediaStorageSOPClassUID", "Media Storage SOP Class UID", Exact(VR::UI), VM1, false),
    single(0x0002, 0x0003, "MediaStorageSOPInstanceUID", "Media Storage SOP Instance UID", Exact(VR::UI), VM1, false),
    single(0x0002, 0x0010, "TransferSyntaxUID", "Transfer Syntax UID", Exact(VR::UI), VM1, false),
    single(0x0002, 0x0012, "ImplementationClassUID", "Implementation Class UID", Exact(VR::UI), VM1, false),
    single(0x0002, 0x0013, "ImplementationVersionName", "Implementation Version Name", Exact(VR::SH), VM1, false),
    single(0x0002, 0x0016, "SourceApplicationEntityTitle", "Source Application Entity Title", Exact(VR::AE), VM1, false),
    single(0x0002, 0x0017, "SendingApplicationEntityTitle", "Sending Application Entity Title", Exact(VR::AE), VM1, false),
    single(0x0002, 0x0018, "ReceivingApplicationEntityTitle", "Receiving Application Entity Title", Exact(VR::AE), VM1, false),
    single(0x0002, 0x0100, "PrivateInformationCreatorUID", "Private Information Creator UID", Exact(VR::UI), VM1, false),
    single(0x0002, 0x0102, "PrivateInformation", "Private Information", Exact(VR::OB), VM1, false),
    // group 0008
    single(0x0008, 0x0005, "SpecificCharacterSet", "Specific Character Set", Exact(VR::CS), VM1N, false),
    single(0x0008, 0x0008, "ImageType", "Image Type", Exact(VR::CS), VM2N, false),
    single(0x0008, 0x0012, "InstanceCreationDate", "Instance Creation Date", Exact(VR::DA), VM1, false),
    single(0x0008, 0x0013, "InstanceCreationTime", "Instance Creation Time", Exact(VR::TM), VM1, false),
    single(0x0008, 0x0016, "SOPClassUID", "SOP Class UID", Exact(VR::UI), VM1, false),
    single(0x0008, 0x0018, "SOPInstanceUID", "SOP Instance UID", Exact(VR::UI), VM1, false),
    single(0x0008, 0x0020, "StudyDate", "Study Date", Exact(VR::DA), VM1, false),
    single(0x0008, 0x0021, "SeriesDate", "Series Date", Exact(VR::DA), VM1, false),
    single(0x0008, 0x0022, "AcquisitionDate", "Acquisition Date", Exact(VR::DA), VM1, false),
    single(0x0008, 0x0023, "ContentDate", "Content Date", Exact(VR::DA), VM1, false),
    single(0x0008, 0x0030, "StudyTime", "Study Time", Exact(VR::TM), VM1, false),
    single(0x0008, 0x0031, "SeriesTime", "Series Time", Exact(VR::TM), VM1, false),
    single(0x0008, 0x0032, "AcquisitionTime", "Acquisition Time", Exact(VR::TM), VM1, false),
    single(0x0008, 0x0033, "ContentTime", "Content Time", Exact(VR::TM), VM1, false),
    single(0x0008, 0x0050, "AccessionNumber", "Accession Number", Exact(VR::SH), VM1, false),
    single(0x0008, 0x0060, "Modality", "Modality", Exact(VR::CS), VM1, false),
    single(0x0008, 0x0064, "ConversionType", "Conversion Type", Exact(VR::CS), VM1, false),
    single(0x0008, 0x0070, "Manufacturer", "Manufacturer", Exact(VR::LO), VM1, false),
    single(0x0008, 0x0080, "InstitutionName", "Institution Name", Exact(VR::LO), VM1, false),
    single(0x0008, 0x0090, "ReferringPhysicianName", "Referring Physician's Name", Exact(VR::PN), VM1, false),
    single(0x0008, 0x0100, "CodeValue", "Code Value", Exact(VR::SH), VM1, false),
    single(0x0008, 0x0102, "CodingSchemeDesignator", "Coding Scheme Designator", Exact(VR::SH), VM1, false),
    single(0x0008, 0x0104, "CodeMeaning", "Code Meaning", Exact(VR::LO), VM1, false),
    single(0x0008, 0x1030, "StudyDescription", "Study Description", Exact(VR::LO), VM1, false),
    single(0x0008, 0x103E, "SeriesDescription", "Series Description", Exact(VR::LO), VM1, false),
    single(0x0008, 0x1050, "PerformingPhysicianName", "Performing Physician's Name", Exact(VR::PN), VM1N, false),
    single(0x0008, 0x1090, "ManufacturerModelName", "Manufacturer's Model Name", Exact(VR::LO), VM1, false),
    single(0x0008, 0x1110, "ReferencedStudySequence", "Referenced Study Sequence", Exact(VR::SQ), VM1, false),
    single(0x0008, 0x1115, "ReferencedSeriesSequence", "Referenced Series Sequence", Exact(VR::SQ), VM1, false),
    single(0x0008, 0x1140, "ReferencedImageSequence", "Referenced Image Sequence", Exact(VR::SQ), VM1, false),
    single(0x0008, 0x1150, "ReferencedSOPClassUID", "Referenced SOP Class UID", Exact(VR::UI), VM1, false),
    single(0x0008, 0x1155, "ReferencedSOPInstanceUID", "Referenced SOP Instance UID", Exact(VR::UI), VM1, false),
    single(0x0008, 0x2218, "AnatomicRegionSequence", "Anatomic Region Sequence", Exact(VR::SQ), VM1, false),
    // group 0010
    single(0x0010, 0x0010, "PatientName", "Patient's Name", Exact(VR::PN), VM1, false),
    single(0x0010, 0x0020, "PatientID", "Patient ID", Exact(VR::LO), VM1, false),
    single(0x0010, 0x0021, "IssuerOfPatientID", "Issuer of Patient ID", Exact(VR::LO), VM1, false),
    single(0x0010, 0x0030, "PatientBirthDate", "Patient's Birth Date", Exact(VR::DA), VM1, false),
    single(0x0010, 0x0032, "PatientBirthTime", "Patient's Birth Time", Exact(VR::TM), VM1, false),
    single(0x0010, 0x0040, "PatientSex", "Patient's Sex", Exact(VR::CS), VM1, false),
    single(0x0010, 0x1010, "PatientAge", "Patient's Age", Exact(VR::AS), VM1, false),
    single(0x0010, 0x1020, "PatientSize", "Patient's Size", Exact(VR::DS), VM1, false),
    single(0x0010, 0x1030, "PatientWeight", "Patient's Weight", Exact(VR::DS), VM1, false),
    single(0x0010, 0x2160, "EthnicGroup", "Ethnic Group", Exact(VR::SH), VM1, false),
    single(0x0010, 0x21B0, "AdditionalPatientHistory", "Additional Patient History", Exact(VR::LT), VM1, false),
    single(0x0010, 0x4000, "PatientComments", "Patient Comments", Exact(VR::LT), VM1, false),
    // group 0018
    single(0x0018, 0x0015, "BodyPartExamined", "Body Part Examined", Exact(VR::CS), VM1, false),
    single(0x0018, 0x0050, "SliceThickness", "Slice Thickness", Exact(VR::DS), VM1, false),
    single(0x0018, 0x0060, "KVP", "KVP", Exact(VR::DS), VM1, false),
    single(0x0018, 0x1020, "SoftwareVersions", "Software Versions", Exact(VR::LO), VM1N, false),
    single(0x0018, 0x1030, "ProtocolName", "Protocol Name", Exact(VR::LO), VM1, false),
    single(0x0018, 0x1151, "XRayTubeCurrent", "X-Ray Tube Current", Exact(VR::IS), VM1, false),
    single(0x0018, 0x5100, "PatientPosition", "Patient Position", Exact(VR::CS), VM1, false),
    single(0x0018, 0x6011, "SequenceOfUltrasoundRegions", "Sequence of Ultrasound Regions", Exact(VR::SQ), VM1, false),
    single(0x0018, 0x6012, "RegionSpatialFormat", "Region Spatial Format", Exact(VR::US), VM1, false),
    single(0x0018, 0x6014, "RegionDataType", "Region Data Type", Exact(VR::US), VM1, false),
    // group 0020
    single(0x0020, 0x000D, "StudyInstanceUID", "Study Instance UID", Exact(VR::UI), VM1, false),
    single(0x0020, 0x000E, "SeriesInstanceUID", "Series Instance UID", Exact(VR::UI), VM1, false),
    single(0x0020, 0x0010, "StudyID", "Study ID", Exact(VR::SH), VM1, false),
    single(0x0020, 0x0011, "SeriesNumber", "Series Number", Exact(VR::IS), VM1, false),
    single(0x0020, 0x0012, "AcquisitionNumber", "Acquisition Number", Exact(VR::IS), VM1, false),
    single(0x0020, 0x0013, "InstanceNumber", "Instance Number", Exact(VR::IS), VM1, false),
    single(0x0020, 0x0020, "PatientOrientation", "Patient Orientation", Exact(VR::CS), VM2, false),
    single(0x0020, 0x0032, "ImagePositionPatient", "Image Position (Patient)", Exact(VR::DS), VM3, false),
    single(0x0020, 0x0037, "ImageOrientationPatient", "Image Orientation (Patient)", Exact(VR::DS), VM6, false),
    single(0x0020, 0x0052, "FrameOfReferenceUID", "Frame of Reference UID", Exact(VR::UI), VM1, false),
    single(0x0020, 0x1041, "SliceLocation", "Slice Location", Exact(VR::DS), VM1, false),
    single(0x0020, 0x4000, "ImageComments", "Image Comments", Exact(VR::LT), VM1, false),
    // group 0028
    single(0x0028, 0x0002, "SamplesPerPixel", "Samples per Pixel", Exact(VR::US), VM1, false),
    single(0x0028, 0x0004, "PhotometricInterpretation", "Photometric Interpretation", Exact(VR::CS), VM1, false),
    single(0x0028, 0x0006, "PlanarConfiguration", "Planar Configuration", Exact(VR::US), VM1, false),
    single(0x0028, 0x0008, "NumberOfFrames", "Number of Frames", Exact(VR::IS), VM1, false),
    single(0x0028, 0x0010, "Rows", "Rows", Exact(VR::US), VM1, false),
    single(0x0028, 0x0011, "Columns", "Columns", Exact(VR::US), VM1, false),
    single(0x0028, 0x0030, "PixelSpacing", "Pixel Spacing", Exact(VR::DS), VM2, false),
    single(0x0028, 0x0100, "BitsAllocated", "Bits Allocated", Exact(VR::US), VM1, false),
    single(0x0028, 0x0101, "BitsStored", "Bits Stored", Exact(VR::US), VM1, false),
    single(0x0028, 0x0102, "HighBit", "High Bit", Exact(VR::US), VM1, false),
    single(0x0028, 0x0103, "PixelRepresentation", "Pixel Representation", Exact(VR::US), VM1, false),
    single(0x0028, 0x0106, "SmallestImagePixelValue", "Smallest Image Pixel Value", Xs, VM1, false),
    single(0x0028, 0x0107, "LargestImagePixelValue", "Largest Image Pixel Value", Xs, VM1, false),
    single(0x0028, 0x1050, "WindowCenter", "Window Center", Exact(VR::DS), VM1N, false),
    single(0x0028, 0x1051, "WindowWidth", "Window Width", Exact(VR::DS), VM1N, false),
    single(0x0028, 0x1052, "RescaleIntercept", "Rescale Intercept", Exact(VR::DS), VM1, false),
    single(0x0028, 0x1053, "RescaleSlope", "Rescale Slope", Exact(VR::DS), VM1, false),
    single(0x0028, 0x1054, "RescaleType", "Rescale Type", Exact(VR::LO), VM1, false),
    single(0x0028, 0x1101, "RedPaletteColorLookupTableDescriptor", "Red Palette Color Lookup Table Descriptor", Xs, VM3, false),
    single(0x0028, 0x1102, "GreenPaletteColorLookupTableDescriptor", "Green Palette Color Lookup Table Descriptor", Xs, VM3, false),
    single(0x0028, 0x1103, "BluePaletteColorLookupTableDescriptor", "Blue Palette Color Lookup Table Descriptor", Xs, VM3, false),
    single(0x0028, 0x1201, "RedPaletteColorLookupTableData", "Red Palette Color Lookup Table Data", Lt, VM1, false),
    single(0x0028, 0x1202, "GreenPaletteColorLookupTableData", "Green Palette Color Lookup Table Data", Lt, VM1, false),
    single(0x0028, 0x1203, "BluePaletteColorLookupTableData", "Blue Palette Color Lookup Table Data", Lt, VM1, false),
    single(0x0028, 0x2110, "LossyImageCompression", "Lossy Image Compression", Exact(VR::CS), VM1, false),
    single(0x0028, 0x2112, "LossyImageCompressionRatio", "Lossy Image Compression Ratio", Exact(VR::DS), VM1N, false),
    single(0x0028, 0x3002, "LUTDescriptor", "LUT Descriptor", Xs, VM3, false),
    single(0x0028, 0x3006, "LUTData", "LUT Data", Lt, VM1, false),
    single(0x0028, 0x3010, "VOILUTSequence", "VOI LUT Sequence", Exact(VR::SQ), VM1, false),
    // group 0032
    single(0x0032, 0x1060, "RequestedProcedureDescription", "Requested Procedure Description", Exact(VR::LO), VM1, false),
    // group 0040
    single(0x0040, 0x0244, "PerformedProcedureStepStartDate", "Performed Procedure Step Start Date", Exact(VR::DA), VM1, false),
    single(0x0040, 0x0245, "PerformedProcedureStepStartTime", "Performed Procedure Step Start Time", Exact(VR::TM), VM1, false),
    single(0x0040, 0x0253, "PerformedProcedureStepID", "Performed Procedure Step ID", Exact(VR::SH), VM1, false),
    single(0x0040, 0x0254, "PerformedProcedureStepDescription", "Performed Procedure Step Description", Exact(VR::LO), VM1, false),
    single(0x0040, 0x0555, "AcquisitionContextSequence", "Acquisition Context Sequence", Exact(VR::SQ), VM1, false),
    single(0x0040, 0xA730, "ContentSequence", "Content Sequence", Exact(VR::SQ), VM1, false),
    // group 2050
    single(0x2050, 0x0020, "PresentationLUTShape", "Presentation LUT Shape", Exact(VR::CS), VM1, false),
    // repeating group 50xx: curves (retired)
    group100(0x5000, 0x0005, "CurveDimensions", "Curve Dimensions", Exact(VR::US), VM1, true),
    group100(0x5000, 0x0010, "NumberOfPoints", "Number of Points", Exact(VR::US), VM1, true),
    group100(0x5000, 0x3000, "CurveData", "Curve Data", Ox, VM1, true),
    // repeating group 60xx: overlays
    group100(0x6000, 0x0010, "OverlayRows", "Overlay Rows", Exact(VR::US), VM1, false),
    group100(0x6000, 0x0011, "OverlayColumns", "Overlay Columns", Exact(VR::US), VM1, false),
    group100(0x6000, 0x0040, "OverlayType", "Overlay Type", Exact(VR::CS), VM1, false),
    group100(0x6000, 0x0050, "OverlayOrigin", "Overlay Origin", Exact(VR::SS), VM2, false),
    group100(0x6000, 0x0100, "OverlayBitsAllocated", "Overlay Bits Allocated", Exact(VR::US), VM1, false),
    group100(0x6000, 0x0102, "OverlayBitPosition", "Overlay Bit Position", Exact(VR::US), VM1, false),
    group100(0x6000, 0x3000, "OverlayData", "Overlay Data", Ox, VM1, false),
    // group 7FE0: pixel data
    single(0x7FE0, 0x0001, "ExtendedOffsetTable", "Extended Offset Table", Exact(VR::OV), VM1, false),
    single(0x7FE0, 0x0002, "ExtendedOffsetTableLengths", "Extended Offset Table Lengths", Exact(VR::OV), VM1, false),
    single(0x7FE0, 0x0008, "FloatPixelData", "Float Pixel Data", Exact(VR::OF), VM1, false),
    single(0x7FE0, 0x0009, "DoubleFloatPixelData", "Double Float Pixel Data", Exact(VR::OD), VM1, false),
    single(0x7FE0, 0x0010, "PixelData", "Pixel Data", Px, VM1, false),
];
