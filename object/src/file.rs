//! Reading and writing DICOM Part-10 files:
//! preamble and magic code detection, file meta group handling,
//! transfer syntax selection, and the consumer-facing
//! open/stream/write surface.

use crate::mem::{BuildContext, Dataset, Element};
use crate::meta::FileMetaTable;
use crate::pixeldata::PixelSource;
use crate::tokens::{dataset_tokens, SequenceLengthMode, TokenError};
use crate::validation::{ValidationIssue, ValidationOptions, ValidationReport, Validator};
use bytes::Bytes;
use dcmkit_core::{Tag, VR};
use dcmkit_dictionary_std::tags;
use dcmkit_encoding::transfer_syntax::{
    TransferSyntax, TransferSyntaxIndex, TransferSyntaxRegistry, EXPLICIT_VR_BIG_ENDIAN,
    EXPLICIT_VR_LITTLE_ENDIAN, IMPLICIT_VR_LITTLE_ENDIAN,
};
use dcmkit_parser::dataset::read::DataSetReader;
use dcmkit_parser::dataset::write::DataSetWriter;
use dcmkit_parser::options::{EnvelopePolicy, ReaderOptions};
use dcmkit_parser::source::{ByteSource, BytesSource, ReaderSource};
use snafu::{Backtrace, OptionExt, ResultExt, Snafu};
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

const DICM_MAGIC_CODE: &[u8; 4] = b"DICM";

/// An error raised while reading a DICOM object.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
#[non_exhaustive]
pub enum ReadError {
    /// The file could not be opened.
    #[snafu(display("Could not open file {}", filename.display()))]
    OpenFile {
        filename: PathBuf,
        backtrace: Backtrace,
        source: std::io::Error,
    },

    /// The source stream failed while reading the envelope.
    #[snafu(display("Could not read from the source"))]
    ReadSource {
        backtrace: Backtrace,
        source: std::io::Error,
    },

    /// The `DICM` magic code was required but not found.
    #[snafu(display("Invalid DICOM file (magic code check failed)"))]
    InvalidMagicCode { backtrace: Backtrace },

    /// The file meta group could not be parsed.
    #[snafu(display("Could not parse file meta group"))]
    ParseMetaGroup {
        #[snafu(backtrace)]
        source: crate::meta::Error,
    },

    /// The transfer syntax named by the file meta group
    /// is not known to the registry.
    #[snafu(display("Unsupported transfer syntax {}", uid))]
    UnsupportedTransferSyntax { uid: String, backtrace: Backtrace },

    /// The data set parser could not be set up.
    #[snafu(display("Could not create data set parser"))]
    CreateParser {
        #[snafu(backtrace)]
        source: dcmkit_parser::stateful::Error,
    },

    /// A structural failure while parsing the data set.
    #[snafu(display("Could not read data set"))]
    ReadToken {
        #[snafu(backtrace)]
        source: dcmkit_parser::dataset::read::Error,
    },

    /// The token stream took an unexpected shape.
    #[snafu(display("Unexpected token in data set stream: {}", description))]
    UnexpectedToken {
        description: String,
        backtrace: Backtrace,
    },

    /// The source ended in the middle of a data set.
    #[snafu(display("Premature end of data set"))]
    PrematureEnd { backtrace: Backtrace },

    /// The specific character set was not acceptable
    /// under the strict profile.
    #[snafu(display("Unsupported specific character set"))]
    Charset {
        backtrace: Backtrace,
        source: dcmkit_encoding::text::CharsetError,
    },

    /// A private data element has no registered creator.
    #[snafu(display("Private data element {} has no registered creator", tag))]
    OrphanPrivateElement { tag: Tag, backtrace: Backtrace },

    /// A private creator slot was registered more than once.
    #[snafu(display(
        "Private creator slot ({:04X},00{:02X}) already registered by `{}`",
        group,
        slot,
        creator
    ))]
    DuplicatePrivateSlot {
        group: u16,
        slot: u8,
        creator: String,
        backtrace: Backtrace,
    },

    /// A validation rule rejected the content.
    #[snafu(display("Validation failed: {}", issue))]
    Validation { issue: ValidationIssue },

    /// The validation callback vetoed the parse.
    #[snafu(display("Parsing was cancelled by the validation callback"))]
    ValidationCancelled,
}

/// An error raised while writing a DICOM object.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
#[non_exhaustive]
pub enum WriteError {
    /// The target file could not be created.
    #[snafu(display("Could not create file {}", filename.display()))]
    CreateFile {
        filename: PathBuf,
        backtrace: Backtrace,
        source: std::io::Error,
    },

    /// The requested transfer syntax is not known to the registry.
    #[snafu(display("Unsupported transfer syntax {}", uid))]
    UnsupportedWriteTransferSyntax { uid: String, backtrace: Backtrace },

    /// The envelope could not be written.
    #[snafu(display("Could not write file envelope"))]
    WriteEnvelope {
        backtrace: Backtrace,
        source: std::io::Error,
    },

    /// The file meta group could not be built or written.
    #[snafu(display("Could not write file meta group"))]
    WriteMetaGroup {
        #[snafu(backtrace)]
        source: crate::meta::Error,
    },

    /// The data set could not be tokenized for writing.
    #[snafu(display("Could not prepare data set for writing"))]
    Tokenize {
        #[snafu(backtrace)]
        source: TokenError,
    },

    /// The data set could not be serialized.
    #[snafu(display("Could not write data set"))]
    WriteDataSet {
        #[snafu(backtrace)]
        source: dcmkit_parser::dataset::write::Error,
    },
}

/// Options for reading a DICOM object:
/// the parse-level reader options plus the validation setup.
#[derive(Debug, Clone, Default)]
pub struct OpenOptions {
    /// Parse-level options: envelope policies, recovery policies,
    /// limits, and the pixel data policy.
    pub reader: ReaderOptions,
    /// The validation profile, callback and collection switches.
    pub validation: ValidationOptions,
}

impl OpenOptions {
    /// Create the default read configuration.
    pub fn new() -> Self {
        OpenOptions::default()
    }

    /// Replace the parse-level reader options.
    pub fn reader(mut self, reader: ReaderOptions) -> Self {
        self.reader = reader;
        self
    }

    /// Replace the validation configuration.
    pub fn validation(mut self, validation: ValidationOptions) -> Self {
        self.validation = validation;
        self
    }

    /// Open a DICOM file at the given path with these options.
    pub fn open_file(self, path: impl AsRef<Path>) -> Result<FileDataset, ReadError> {
        open_file_with(path, self)
    }

    /// Read a DICOM object from an arbitrary reader
    /// with these options.
    pub fn from_reader(self, reader: impl Read) -> Result<FileDataset, ReadError> {
        from_reader_with(reader, self)
    }

    /// Read a DICOM object from an in-memory buffer
    /// with these options. Element values alias the buffer.
    pub fn from_bytes(self, data: impl Into<Bytes>) -> Result<FileDataset, ReadError> {
        from_bytes_with(data.into(), self)
    }
}

/// Options for writing a DICOM object.
#[derive(Debug, Clone)]
pub struct WriterOptions {
    /// The transfer syntax UID to encode the main data set in.
    pub transfer_syntax: String,
    /// Whether sequence lengths are precomputed or delimited.
    pub sequence_length_mode: SequenceLengthMode,
    /// Whether the Part-10 envelope (preamble, magic code and
    /// file meta group) is generated.
    pub generate_file_meta_info: bool,
    /// Whether private creator slots are re-packed contiguously
    /// from 0x10 before writing.
    pub compact_private_slots: bool,
    /// The preamble content; zeros when absent.
    pub preamble: Option<[u8; 128]>,
}

impl Default for WriterOptions {
    fn default() -> Self {
        WriterOptions {
            transfer_syntax: EXPLICIT_VR_LITTLE_ENDIAN.uid().to_string(),
            sequence_length_mode: SequenceLengthMode::default(),
            generate_file_meta_info: true,
            compact_private_slots: false,
            preamble: None,
        }
    }
}

impl WriterOptions {
    /// Create the default writer configuration.
    pub fn new() -> Self {
        WriterOptions::default()
    }

    /// Select the transfer syntax by UID.
    pub fn transfer_syntax(mut self, uid: impl Into<String>) -> Self {
        self.transfer_syntax = uid.into();
        self
    }

    /// Select the sequence length mode.
    pub fn sequence_length_mode(mut self, mode: SequenceLengthMode) -> Self {
        self.sequence_length_mode = mode;
        self
    }

    /// Choose whether the Part-10 envelope is generated.
    pub fn generate_file_meta_info(mut self, generate: bool) -> Self {
        self.generate_file_meta_info = generate;
        self
    }

    /// Re-pack private creator slots before writing.
    pub fn compact_private_slots(mut self, compact: bool) -> Self {
        self.compact_private_slots = compact;
        self
    }
}

/// A DICOM object read from a Part-10 source:
/// the envelope parts found, the main data set,
/// and the issues the validation engine collected.
#[derive(Debug, Clone)]
pub struct FileDataset {
    preamble: Option<Box<[u8; 128]>>,
    meta: Option<FileMetaTable>,
    dataset: Dataset,
    issues: ValidationReport,
}

impl FileDataset {
    /// The 128-byte preamble, when the source carried one.
    pub fn preamble(&self) -> Option<&[u8; 128]> {
        self.preamble.as_deref()
    }

    /// The file meta group, when the source carried one.
    pub fn meta(&self) -> Option<&FileMetaTable> {
        self.meta.as_ref()
    }

    /// The main data set.
    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    /// Mutable access to the main data set.
    pub fn dataset_mut(&mut self) -> &mut Dataset {
        &mut self.dataset
    }

    /// Recover the main data set.
    pub fn into_dataset(self) -> Dataset {
        self.dataset
    }

    /// The issues collected while reading.
    pub fn issues(&self) -> &ValidationReport {
        &self.issues
    }

    /// Write this object back to a file,
    /// keeping its transfer syntax and preamble.
    pub fn write_to_file(&self, path: impl AsRef<Path>) -> Result<(), WriteError> {
        let path = path.as_ref();
        let file = File::create(path).context(CreateFileSnafu { filename: path })?;
        self.write_to(BufWriter::new(file))
    }

    /// Write this object to the given destination,
    /// keeping its transfer syntax and preamble.
    pub fn write_to<W: Write>(&self, to: W) -> Result<(), WriteError> {
        let mut options = WriterOptions::default();
        if let Some(meta) = &self.meta {
            options.transfer_syntax = meta.transfer_syntax().to_string();
        }
        if let Some(preamble) = &self.preamble {
            options.preamble = Some(**preamble);
        }
        write(&self.dataset, to, &options)
    }
}

/// Open a DICOM file with the default options.
pub fn open(path: impl AsRef<Path>) -> Result<FileDataset, ReadError> {
    open_file_with(path, OpenOptions::default())
}

fn read_up_to<R: Read>(reader: &mut R, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..])? {
            0 => break,
            n => filled += n,
        }
    }
    Ok(filled)
}

/// Envelope layout decided from the first bytes of the source.
struct EnvelopeHead {
    preamble: Option<Box<[u8; 128]>>,
    /// content offset: 0 (bare), 4 (magic only) or 132
    offset: u64,
}

fn detect_envelope(head: &[u8], policy: EnvelopePolicy) -> Result<EnvelopeHead, ReadError> {
    let with_preamble = head.len() >= 132 && &head[128..132] == DICM_MAGIC_CODE;
    match policy {
        EnvelopePolicy::Require => {
            if !with_preamble {
                return InvalidMagicCodeSnafu.fail();
            }
        }
        EnvelopePolicy::Optional => {}
        EnvelopePolicy::Ignore => {
            return Ok(EnvelopeHead {
                preamble: None,
                offset: 0,
            });
        }
    }
    if with_preamble {
        let mut preamble = Box::new([0u8; 128]);
        preamble.copy_from_slice(&head[..128]);
        return Ok(EnvelopeHead {
            preamble: Some(preamble),
            offset: 132,
        });
    }
    if head.len() >= 4 && &head[0..4] == DICM_MAGIC_CODE {
        return Ok(EnvelopeHead {
            preamble: None,
            offset: 4,
        });
    }
    Ok(EnvelopeHead {
        preamble: None,
        offset: 0,
    })
}

fn starts_with_file_meta(head: &[u8]) -> bool {
    head.len() >= 4 && u16::from_le_bytes([head[0], head[1]]) == 0x0002
}

/// Guess the transfer syntax of a headerless data set
/// from its first element.
fn detect_transfer_syntax(head: &[u8]) -> &'static TransferSyntax {
    if head.len() < 8 {
        return &IMPLICIT_VR_LITTLE_ENDIAN;
    }
    let vr = VR::from_binary([head[4], head[5]]);
    let explicit =
        head[4].is_ascii_uppercase() && head[5].is_ascii_uppercase() && vr.is_standard();
    let group_le = u16::from_le_bytes([head[0], head[1]]);
    let group_be = u16::from_be_bytes([head[0], head[1]]);
    match (explicit, group_le <= group_be) {
        (true, true) => &EXPLICIT_VR_LITTLE_ENDIAN,
        (true, false) => &EXPLICIT_VR_BIG_ENDIAN,
        (false, _) => &IMPLICIT_VR_LITTLE_ENDIAN,
    }
}

fn resolve_transfer_syntax(
    meta: Option<&FileMetaTable>,
    content_head: &[u8],
) -> Result<TransferSyntax, ReadError> {
    match meta {
        Some(meta) => {
            let uid = meta.transfer_syntax();
            TransferSyntaxRegistry
                .get(uid)
                .cloned()
                .context(UnsupportedTransferSyntaxSnafu { uid })
        }
        None => Ok(detect_transfer_syntax(content_head).clone()),
    }
}

fn build_file_dataset<S, F>(
    reader: &mut DataSetReader<S>,
    options: &OpenOptions,
    explicit_vr: bool,
    bind: F,
) -> Result<(Dataset, ValidationReport), ReadError>
where
    S: ByteSource,
    F: FnOnce(&Dataset),
{
    let mut validator = Validator::new(&options.validation);
    let dataset = {
        let mut ctx = BuildContext {
            options: &options.reader,
            validator: &mut validator,
            explicit_vr,
        };
        Dataset::build_root(reader, &mut ctx)?
    };
    if dataset.has_deferred_pixel_data() {
        bind(&dataset);
    }
    Ok((dataset, validator.into_report()))
}

/// Read a DICOM object from an in-memory buffer with the given
/// options. Element values alias the buffer; deferred pixel
/// payloads read from the very same buffer.
pub fn from_bytes_with(data: Bytes, options: OpenOptions) -> Result<FileDataset, ReadError> {
    let head = detect_envelope(&data, options.reader.preamble)?;
    let mut offset = head.offset as usize;
    let has_magic = head.offset > 0;

    let read_meta = match options.reader.file_meta_info {
        EnvelopePolicy::Require => true,
        EnvelopePolicy::Optional => has_magic || starts_with_file_meta(&data[offset..]),
        EnvelopePolicy::Ignore => false,
    };
    let meta = if read_meta {
        let mut cursor = &data[offset..];
        let table = FileMetaTable::from_reader(&mut cursor).context(ParseMetaGroupSnafu)?;
        offset = data.len() - cursor.len();
        Some(table)
    } else {
        None
    };

    let ts = resolve_transfer_syntax(meta.as_ref(), &data[offset..])?;
    let source = BytesSource::new(data.slice(offset..));
    let mut reader = DataSetReader::new_positioned(
        source,
        &ts,
        options.reader.clone(),
        offset as u64,
    )
    .context(CreateParserSnafu)?;

    let buffer = data.clone();
    let (dataset, issues) = build_file_dataset(&mut reader, &options, ts.is_explicit_vr(), |d| {
        let source: PixelSource = Arc::new(Mutex::new(std::io::Cursor::new(buffer)));
        d.bind_pixel_source(&source);
    })?;

    Ok(FileDataset {
        preamble: head.preamble,
        meta,
        dataset,
        issues,
    })
}

/// Read a DICOM object from an arbitrary reader with the given
/// options. The remaining stream content is buffered in memory
/// first; use [`open_file_with`] for a streaming file read.
pub fn from_reader_with(mut reader: impl Read, options: OpenOptions) -> Result<FileDataset, ReadError> {
    let mut data = Vec::new();
    reader.read_to_end(&mut data).context(ReadSourceSnafu)?;
    from_bytes_with(Bytes::from(data), options)
}

/// Open a DICOM file with the given options.
/// The file is read incrementally; under the lazy pixel data
/// policy the pixel bytes stay on disk until first access.
pub fn open_file_with(path: impl AsRef<Path>, options: OpenOptions) -> Result<FileDataset, ReadError> {
    let path = path.as_ref();
    let file = File::open(path).context(OpenFileSnafu { filename: path })?;
    let mut file = BufReader::new(file);

    let mut head = [0u8; 132];
    let n = read_up_to(&mut file, &mut head).context(ReadSourceSnafu)?;
    let envelope = detect_envelope(&head[..n], options.reader.preamble)?;
    file.seek(SeekFrom::Start(envelope.offset))
        .context(ReadSourceSnafu)?;
    let mut position = envelope.offset;
    let has_magic = envelope.offset > 0;

    let read_meta = match options.reader.file_meta_info {
        EnvelopePolicy::Require => true,
        EnvelopePolicy::Optional => {
            if has_magic {
                true
            } else {
                let mut sniff = [0u8; 4];
                let n = read_up_to(&mut file, &mut sniff).context(ReadSourceSnafu)?;
                file.seek(SeekFrom::Start(position)).context(ReadSourceSnafu)?;
                starts_with_file_meta(&sniff[..n])
            }
        }
        EnvelopePolicy::Ignore => false,
    };
    let meta = if read_meta {
        let table = FileMetaTable::from_reader(&mut file).context(ParseMetaGroupSnafu)?;
        position += 12 + u64::from(table.information_group_length);
        // the group length is authoritative for the bytes consumed
        file.seek(SeekFrom::Start(position)).context(ReadSourceSnafu)?;
        Some(table)
    } else {
        None
    };

    let ts = match &meta {
        Some(_) => resolve_transfer_syntax(meta.as_ref(), &[])?,
        None => {
            let mut sniff = [0u8; 8];
            let n = read_up_to(&mut file, &mut sniff).context(ReadSourceSnafu)?;
            file.seek(SeekFrom::Start(position)).context(ReadSourceSnafu)?;
            detect_transfer_syntax(&sniff[..n]).clone()
        }
    };

    let source = ReaderSource::new(file);
    let mut reader =
        DataSetReader::new_positioned(source, &ts, options.reader.clone(), position)
            .context(CreateParserSnafu)?;

    let mut validator = Validator::new(&options.validation);
    let dataset = {
        let mut ctx = BuildContext {
            options: &options.reader,
            validator: &mut validator,
            explicit_vr: ts.is_explicit_vr(),
        };
        Dataset::build_root(&mut reader, &mut ctx)?
    };
    if dataset.has_deferred_pixel_data() {
        let file = reader.into_source().into_inner();
        let source: PixelSource = Arc::new(Mutex::new(file));
        dataset.bind_pixel_source(&source);
    }

    Ok(FileDataset {
        preamble: envelope.preamble,
        meta,
        dataset,
        issues: validator.into_report(),
    })
}

/// Read a DICOM object from a file asynchronously.
///
/// The source is pulled through an asynchronous buffered read,
/// suspending only at buffer refill boundaries and honouring the
/// reader's cancellation token between refills; element decoding
/// itself never suspends mid-element.
#[cfg(feature = "async")]
pub async fn open_async(
    path: impl AsRef<Path>,
    options: OpenOptions,
) -> Result<FileDataset, ReadError> {
    use tokio::io::AsyncReadExt;

    let path = path.as_ref();
    let mut file = tokio::fs::File::open(path)
        .await
        .context(OpenFileSnafu { filename: path })?;
    let mut data = Vec::new();
    let mut chunk = vec![0u8; 64 * 1024];
    loop {
        if options.reader.cancellation.is_cancelled() {
            let source = dcmkit_parser::dataset::read::CancelledSnafu {
                position: data.len() as u64,
            }
            .build();
            return Err(ReadError::ReadToken { source });
        }
        let n = file.read(&mut chunk).await.context(ReadSourceSnafu)?;
        if n == 0 {
            break;
        }
        data.extend_from_slice(&chunk[..n]);
    }
    from_bytes_with(Bytes::from(data), options)
}

/// Serialize a data set to a file per the writer options.
pub fn write_file(
    dataset: &Dataset,
    path: impl AsRef<Path>,
    options: &WriterOptions,
) -> Result<(), WriteError> {
    let path = path.as_ref();
    let file = File::create(path).context(CreateFileSnafu { filename: path })?;
    write(dataset, BufWriter::new(file), options)
}

/// Serialize a data set to the given destination
/// per the writer options.
pub fn write<W: Write>(
    dataset: &Dataset,
    mut to: W,
    options: &WriterOptions,
) -> Result<(), WriteError> {
    let ts = TransferSyntaxRegistry
        .get(&options.transfer_syntax)
        .cloned()
        .context(UnsupportedWriteTransferSyntaxSnafu {
            uid: options.transfer_syntax.clone(),
        })?;

    let compacted;
    let dataset = if options.compact_private_slots {
        compacted = dataset.compacted();
        &compacted
    } else {
        dataset
    };

    if options.generate_file_meta_info {
        let preamble = options.preamble.unwrap_or([0u8; 128]);
        to.write_all(&preamble).context(WriteEnvelopeSnafu)?;
        to.write_all(DICM_MAGIC_CODE).context(WriteEnvelopeSnafu)?;

        let meta = FileMetaTable::builder()
            .media_storage_sop_class_uid(
                dataset
                    .string(tags::SOP_CLASS_UID)
                    .map(|s| s.into_owned())
                    .unwrap_or_default(),
            )
            .media_storage_sop_instance_uid(
                dataset
                    .string(tags::SOP_INSTANCE_UID)
                    .map(|s| s.into_owned())
                    .unwrap_or_default(),
            )
            .transfer_syntax(ts.uid())
            .build()
            .context(WriteMetaGroupSnafu)?;
        meta.write_to(&mut to).context(WriteMetaGroupSnafu)?;
    }

    write_dataset(dataset, to, &ts, options.sequence_length_mode)
}

/// Serialize a bare data set (no envelope) to the given destination
/// in the given transfer syntax and sequence length mode.
pub fn write_dataset<W: Write>(
    dataset: &Dataset,
    to: W,
    ts: &TransferSyntax,
    mode: SequenceLengthMode,
) -> Result<(), WriteError> {
    let tokens = dataset_tokens(dataset, mode, ts.is_explicit_vr()).context(TokenizeSnafu)?;
    let mut writer = DataSetWriter::with_ts(to, ts).context(WriteDataSetSnafu)?;
    writer.write_sequence(tokens).context(WriteDataSetSnafu)?;
    Ok(())
}

/// A finite, non-restartable stream of root-level data elements,
/// produced without assembling a full data set.
///
/// Nested sequences are still assembled per element;
/// the stream context (character set, private creators)
/// accumulates in an internal shell data set as elements
/// are produced.
pub struct ElementStream {
    reader: DataSetReader<BytesSource>,
    shell: Dataset,
    validator: Validator,
    options: OpenOptions,
    meta: Option<FileMetaTable>,
    explicit_vr: bool,
    done: bool,
}

impl ElementStream {
    /// The file meta group found ahead of the element stream.
    pub fn meta(&self) -> Option<&FileMetaTable> {
        self.meta.as_ref()
    }
}

impl Iterator for ElementStream {
    type Item = Result<Element, ReadError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let mut ctx = BuildContext {
            options: &self.options.reader,
            validator: &mut self.validator,
            explicit_vr: self.explicit_vr,
        };
        match Dataset::build_element(&mut self.reader, &self.shell, &mut ctx) {
            Ok(Some(element)) => {
                // cheap: raw values are reference counted
                self.shell.put(element.clone());
                Some(Ok(element))
            }
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

/// Stream the root-level data elements of a DICOM object
/// from the given source. The remaining stream content is
/// buffered in memory; values alias that buffer.
pub fn stream_elements(
    mut source: impl Read,
    options: OpenOptions,
) -> Result<ElementStream, ReadError> {
    let mut data = Vec::new();
    source.read_to_end(&mut data).context(ReadSourceSnafu)?;
    let data = Bytes::from(data);

    let head = detect_envelope(&data, options.reader.preamble)?;
    let mut offset = head.offset as usize;
    let has_magic = head.offset > 0;

    let read_meta = match options.reader.file_meta_info {
        EnvelopePolicy::Require => true,
        EnvelopePolicy::Optional => has_magic || starts_with_file_meta(&data[offset..]),
        EnvelopePolicy::Ignore => false,
    };
    let meta = if read_meta {
        let mut cursor = &data[offset..];
        let table = FileMetaTable::from_reader(&mut cursor).context(ParseMetaGroupSnafu)?;
        offset = data.len() - cursor.len();
        Some(table)
    } else {
        None
    };

    let ts = resolve_transfer_syntax(meta.as_ref(), &data[offset..])?;
    let source = BytesSource::new(data.slice(offset..));
    let reader = DataSetReader::new_positioned(source, &ts, options.reader.clone(), offset as u64)
        .context(CreateParserSnafu)?;

    Ok(ElementStream {
        reader,
        shell: Dataset::new(),
        validator: Validator::new(&options.validation),
        explicit_vr: ts.is_explicit_vr(),
        options,
        meta,
        done: false,
    })
}
