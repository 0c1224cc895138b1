//! A mid-level abstraction for reading DICOM content sequentially.
//!
//! Headers and values are treated as tokens which can be used to
//! form a syntax tree of a full data set.
//! On top of the plain token stream, the reader resolves implicit
//! value representations against the dictionary and the surrounding
//! data set context, enforces the configured structural limits,
//! and dispatches pixel data per the configured load policy.

use super::{DataToken, SeqTokenType};
use crate::options::{InvalidVrPolicy, PixelDataContext, PixelDataHandling, ReaderOptions};
use crate::resolve::{resolve_vr, VrContext};
use crate::source::ByteSource;
use crate::stateful::{self, DynStatefulDecoder};
use dcmkit_core::dictionary::{DataDictionary, DictionaryEntryRef, PrivateDictionary};
use dcmkit_core::header::SequenceItemHeader;
use dcmkit_core::value::RawValue;
use dcmkit_core::{DataElementHeader, Length, Tag, VR};
use dcmkit_dictionary_std::{StandardDataDictionary, StandardPrivateDictionary};
use dcmkit_encoding::transfer_syntax::TransferSyntax;
use snafu::{Backtrace, ResultExt, Snafu};
use std::collections::HashMap;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
#[non_exhaustive]
pub enum Error {
    #[snafu(display("Could not decode data set content"))]
    DecodeData {
        #[snafu(backtrace)]
        source: stateful::Error,
    },

    #[snafu(display("Premature end of data set at position {}", position))]
    PrematureEnd { position: u64, backtrace: Backtrace },

    #[snafu(display(
        "Unknown value representation {} of element {} at position {}",
        vr,
        tag,
        position
    ))]
    UnknownVr {
        vr: VR,
        tag: Tag,
        position: u64,
        backtrace: Backtrace,
    },

    #[snafu(display(
        "Unexpected delimited length for {} element {} at position {}",
        vr,
        tag,
        position
    ))]
    UnexpectedUndefinedLength {
        vr: VR,
        tag: Tag,
        position: u64,
        backtrace: Backtrace,
    },

    #[snafu(display(
        "Length {} of element {} exceeds the limit of {} bytes at position {}",
        len,
        tag,
        limit,
        position
    ))]
    ElementLengthLimit {
        tag: Tag,
        len: u32,
        limit: u32,
        position: u64,
        backtrace: Backtrace,
    },

    #[snafu(display(
        "Sequence nesting depth {} exceeds the limit of {} at position {}",
        depth,
        limit,
        position
    ))]
    DepthLimit {
        depth: u32,
        limit: u32,
        position: u64,
        backtrace: Backtrace,
    },

    #[snafu(display(
        "Cumulative item count exceeds the limit of {} at position {}",
        limit,
        position
    ))]
    ItemLimit {
        limit: u64,
        position: u64,
        backtrace: Backtrace,
    },

    #[snafu(display("Encapsulated fragment with delimited length at position {}", position))]
    UndefinedFragmentLength { position: u64, backtrace: Backtrace },

    #[snafu(display("Odd length {} of encapsulated fragment at position {}", len, position))]
    OddFragmentLength {
        len: u32,
        position: u64,
        backtrace: Backtrace,
    },

    #[snafu(display(
        "Basic offset table length {} is not a multiple of 4 at position {}",
        len,
        position
    ))]
    InvalidOffsetTable {
        len: u32,
        position: u64,
        backtrace: Backtrace,
    },

    #[snafu(display("Unexpected item delimiter in pixel data at position {}", position))]
    UnexpectedDelimiter { position: u64, backtrace: Backtrace },

    #[snafu(display(
        "Inconsistent sequence end: expected end at position {}, but got to {}",
        expected,
        actual
    ))]
    InconsistentSequenceEnd {
        expected: u64,
        actual: u64,
        backtrace: Backtrace,
    },

    #[snafu(display("Parsing was cancelled at position {}", position))]
    Cancelled { position: u64, backtrace: Backtrace },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl Error {
    /// The stream position the error was raised at.
    pub fn position(&self) -> u64 {
        match self {
            Error::DecodeData { source } => source.position(),
            Error::PrematureEnd { position, .. }
            | Error::UnknownVr { position, .. }
            | Error::UnexpectedUndefinedLength { position, .. }
            | Error::ElementLengthLimit { position, .. }
            | Error::DepthLimit { position, .. }
            | Error::ItemLimit { position, .. }
            | Error::UndefinedFragmentLength { position, .. }
            | Error::OddFragmentLength { position, .. }
            | Error::InvalidOffsetTable { position, .. }
            | Error::UnexpectedDelimiter { position, .. }
            | Error::Cancelled { position, .. } => *position,
            Error::InconsistentSequenceEnd { actual, .. } => *actual,
        }
    }
}

/// A reader-specific token representing a sequence or item start.
#[derive(Debug, Copy, Clone, PartialEq)]
struct SeqToken {
    /// Whether it is the start of a sequence or of an item.
    typ: SeqTokenType,
    /// The declared length, possibly undefined.
    len: Length,
    /// The number of bytes read when the sequence or item
    /// value data began.
    base_offset: u64,
}

/// The context accumulated for one data set under construction:
/// the values the VR resolver and the pixel data policy may need,
/// plus the private creator slots seen so far.
/// One frame per nesting level; parents are reached by index.
#[derive(Debug, Default)]
struct ContextFrame {
    last_tag: Option<Tag>,
    bits_allocated: Option<u16>,
    pixel_representation: Option<u16>,
    rows: Option<u16>,
    columns: Option<u16>,
    samples_per_pixel: Option<u16>,
    number_of_frames: Option<u32>,
    creators: HashMap<(u16, u8), String>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum FragmentState {
    /// The next item is the basic offset table.
    OffsetTable,
    /// The next item is an encoded fragment.
    Fragments,
}

#[derive(Debug, Clone, Copy)]
struct FragmentSequenceState {
    state: FragmentState,
    handling: PixelDataHandling,
}

/// A higher-level reader for retrieving structure in a DICOM
/// data set from an arbitrary byte source.
pub struct DataSetReader<S, D = StandardDataDictionary> {
    parser: DynStatefulDecoder<S>,
    dict: D,
    private_dict: StandardPrivateDictionary,
    options: ReaderOptions,
    ts_uid: &'static str,
    encapsulated_ts: bool,
    explicit_vr: bool,
    /// context frames of the data sets under construction,
    /// root first
    frames: Vec<ContextFrame>,
    /// a stack of pending sequence/item delimiters
    seq_delimiters: Vec<SeqToken>,
    /// fragment-sequence mode, when inside encapsulated pixel data
    fragment_seq: Option<FragmentSequenceState>,
    /// whether the reader is expecting an item header next
    in_sequence: bool,
    /// whether a check for a defined-length ending is pending
    delimiter_check_pending: bool,
    /// fuse the iteration process if true
    hard_break: bool,
    /// last decoded element header, for which a value is due
    last_header: Option<DataElementHeader>,
    /// cumulative count of items and fragments
    total_items: u64,
}

impl<S> DataSetReader<S, StandardDataDictionary>
where
    S: ByteSource,
{
    /// Create a new token reader over the given source,
    /// considering the given transfer syntax and reader options.
    pub fn new(
        source: S,
        ts: &TransferSyntax,
        options: ReaderOptions,
    ) -> Result<Self, stateful::Error> {
        Self::new_with_dictionary(source, StandardDataDictionary, ts, options, 0)
    }

    /// Create a new token reader assuming a base position
    /// of the source.
    pub fn new_positioned(
        source: S,
        ts: &TransferSyntax,
        options: ReaderOptions,
        position: u64,
    ) -> Result<Self, stateful::Error> {
        Self::new_with_dictionary(source, StandardDataDictionary, ts, options, position)
    }
}

impl<S, D> DataSetReader<S, D>
where
    S: ByteSource,
{
    /// Create a new token reader with the given attribute dictionary.
    pub fn new_with_dictionary(
        source: S,
        dict: D,
        ts: &TransferSyntax,
        options: ReaderOptions,
        position: u64,
    ) -> Result<Self, stateful::Error> {
        let parser = DynStatefulDecoder::new_with(source, ts, position)?;
        Ok(DataSetReader {
            parser,
            dict,
            private_dict: StandardPrivateDictionary,
            options,
            ts_uid: ts.uid(),
            encapsulated_ts: ts.is_encapsulated(),
            explicit_vr: ts.is_explicit_vr(),
            frames: vec![ContextFrame::default()],
            seq_delimiters: Vec::new(),
            fragment_seq: None,
            in_sequence: false,
            delimiter_check_pending: false,
            hard_break: false,
            last_header: None,
            total_items: 0,
        })
    }

    /// The number of bytes the reader has consumed.
    pub fn position(&self) -> u64 {
        self.parser.position()
    }

    /// The byte order of the transfer syntax in effect.
    pub fn endianness(&self) -> byteordered::Endianness {
        self.parser.endianness()
    }

    /// Recover the byte source, consuming the reader.
    /// Used to bind deferred pixel data to its source
    /// once the parse is complete.
    pub fn into_source(self) -> S {
        self.parser.into_source()
    }

    fn sequence_depth(&self) -> u32 {
        self.seq_delimiters
            .iter()
            .filter(|t| t.typ == SeqTokenType::Sequence)
            .count() as u32
    }

    fn vr_context(&self) -> VrContext {
        let mut ctx = VrContext::default();
        for frame in self.frames.iter().rev() {
            if ctx.bits_allocated.is_none() {
                ctx.bits_allocated = frame.bits_allocated;
            }
            if ctx.pixel_representation.is_none() {
                ctx.pixel_representation = frame.pixel_representation;
            }
        }
        ctx
    }

    fn context_u16(&self, get: impl Fn(&ContextFrame) -> Option<u16>) -> Option<u16> {
        self.frames.iter().rev().find_map(get)
    }

    fn lookup_entry(&self, tag: Tag) -> Option<&DictionaryEntryRef<'static>>
    where
        D: DataDictionary<Entry = DictionaryEntryRef<'static>>,
    {
        if let Some(entry) = self.dict.by_tag(tag) {
            return Some(entry);
        }
        let slot = tag.private_creator_slot()?;
        let item = (tag.element() & 0x00FF) as u8;
        let creator = self
            .frames
            .iter()
            .rev()
            .find_map(|f| f.creators.get(&(tag.group(), slot)))?;
        self.private_dict.by_creator(creator, tag.group(), item)
    }

    /// Record context-relevant values as they are parsed,
    /// so that later resolutions can consult them.
    fn observe_value(&mut self, tag: Tag, value: &RawValue) {
        let Some(frame) = self.frames.last_mut() else {
            return;
        };
        match tag {
            Tag(0x0028, 0x0100) => frame.bits_allocated = value.uint16().ok(),
            Tag(0x0028, 0x0103) => frame.pixel_representation = value.uint16().ok(),
            Tag(0x0028, 0x0010) => frame.rows = value.uint16().ok(),
            Tag(0x0028, 0x0011) => frame.columns = value.uint16().ok(),
            Tag(0x0028, 0x0002) => frame.samples_per_pixel = value.uint16().ok(),
            Tag(0x0028, 0x0008) => {
                frame.number_of_frames = value
                    .as_utf8()
                    .and_then(|s| s.trim_matches(|c: char| c == '\0' || c == ' ').parse().ok());
            }
            tag if tag.is_private_creator() => {
                if let Some(creator) = value.as_utf8() {
                    let creator = creator
                        .trim_end_matches(|c: char| c.is_whitespace() || c == '\0')
                        .to_string();
                    frame
                        .creators
                        .insert((tag.group(), (tag.element() & 0x00FF) as u8), creator);
                }
            }
            _ => {}
        }
    }

    fn resolve_pixel_handling(
        &self,
        header: &DataElementHeader,
        encapsulated: bool,
    ) -> PixelDataHandling {
        match self.options.pixel_data_handling {
            PixelDataHandling::Callback => {
                let Some(cb) = &self.options.pixel_data_callback else {
                    return PixelDataHandling::Eager;
                };
                let ctx = PixelDataContext {
                    tag: header.tag,
                    length: header.len,
                    encapsulated,
                    rows: self.context_u16(|f| f.rows),
                    columns: self.context_u16(|f| f.columns),
                    bits_allocated: self.context_u16(|f| f.bits_allocated),
                    samples_per_pixel: self.context_u16(|f| f.samples_per_pixel),
                    number_of_frames: self.frames.iter().rev().find_map(|f| f.number_of_frames),
                    transfer_syntax_uid: self.ts_uid.to_string(),
                };
                match cb(&ctx) {
                    PixelDataHandling::Callback => PixelDataHandling::Eager,
                    handling => handling,
                }
            }
            handling => handling,
        }
    }

    fn update_seq_delimiters(&mut self) -> Result<Option<DataToken>> {
        if let Some(sd) = self.seq_delimiters.last() {
            if let Some(len) = sd.len.get() {
                let eos = sd.base_offset + u64::from(len);
                let position = self.parser.position();
                if eos == position {
                    // end of a defined-length sequence or item
                    let token = match sd.typ {
                        SeqTokenType::Sequence => {
                            self.in_sequence = false;
                            DataToken::SequenceEnd
                        }
                        SeqTokenType::Item => {
                            self.in_sequence = true;
                            self.frames.pop();
                            DataToken::ItemEnd
                        }
                    };
                    self.seq_delimiters.pop();
                    return Ok(Some(token));
                } else if eos < position {
                    return InconsistentSequenceEndSnafu {
                        expected: eos,
                        actual: position,
                    }
                    .fail();
                }
            }
        }
        self.delimiter_check_pending = false;
        Ok(None)
    }

    fn begin_sequence(&mut self, header: DataElementHeader) -> Result<DataToken> {
        let depth = self.sequence_depth() + 1;
        if depth > self.options.max_sequence_depth {
            return DepthLimitSnafu {
                depth,
                limit: self.options.max_sequence_depth,
                position: self.parser.position(),
            }
            .fail();
        }
        self.seq_delimiters.push(SeqToken {
            typ: SeqTokenType::Sequence,
            len: header.len,
            base_offset: self.parser.position(),
        });
        self.in_sequence = true;
        // sequences can end right after they start
        if header.len.get() == Some(0) {
            self.delimiter_check_pending = true;
        }
        Ok(DataToken::SequenceStart {
            tag: header.tag,
            len: header.len,
        })
    }

    fn handle_header(&mut self, mut header: DataElementHeader) -> Result<DataToken>
    where
        D: DataDictionary<Entry = DictionaryEntryRef<'static>>,
    {
        let tag = header.tag;
        let position = self.parser.position();

        // stray delimiters at element position
        if tag == Tag::ITEM_DELIMITER {
            self.in_sequence = true;
            return Ok(DataToken::ItemEnd);
        }
        if tag == Tag::SEQUENCE_DELIMITER {
            self.seq_delimiters.pop();
            self.in_sequence = false;
            return Ok(DataToken::SequenceEnd);
        }

        // real-world files violate tag ordering; note and carry on
        if let Some(frame) = self.frames.last_mut() {
            if let Some(last) = frame.last_tag {
                if tag <= last {
                    tracing::warn!(
                        "data element {} does not ascend over {} at position {}",
                        tag,
                        last,
                        position
                    );
                }
            }
            frame.last_tag = Some(tag);
        }

        if self.explicit_vr {
            if !header.vr.is_standard() {
                match self.options.invalid_vr {
                    InvalidVrPolicy::Throw => {
                        return UnknownVrSnafu {
                            vr: header.vr,
                            tag,
                            position,
                        }
                        .fail();
                    }
                    InvalidVrPolicy::RemapToUn => header.vr = VR::UN,
                    InvalidVrPolicy::Preserve => {}
                }
            }
        } else {
            let resolved = resolve_vr(
                tag,
                self.lookup_entry(tag),
                header.len,
                self.vr_context(),
                self.encapsulated_ts,
            );
            if resolved.ambiguous {
                tracing::debug!(
                    "value representation of {} is ambiguous without context, reading as UN",
                    tag
                );
            }
            header.vr = resolved.vr;
        }

        let is_pixel_data = tag == Tag(0x7FE0, 0x0010);

        if header.len.is_undefined() {
            if is_pixel_data {
                let handling = self.resolve_pixel_handling(&header, true);
                self.fragment_seq = Some(FragmentSequenceState {
                    state: FragmentState::OffsetTable,
                    handling,
                });
                return Ok(DataToken::PixelSequenceStart { tag });
            }
            if header.vr == VR::SQ || header.vr.can_have_undefined_length() {
                return self.begin_sequence(header);
            }
            match self.options.invalid_vr {
                InvalidVrPolicy::Throw => {
                    return UnexpectedUndefinedLengthSnafu {
                        vr: header.vr,
                        tag,
                        position,
                    }
                    .fail();
                }
                _ => {
                    tracing::warn!(
                        "element {} with VR {} declares a delimited length, reading as a sequence",
                        tag,
                        header.vr
                    );
                    return self.begin_sequence(header);
                }
            }
        }

        let len = header.len.0;
        if len > self.options.max_element_length {
            return ElementLengthLimitSnafu {
                tag,
                len,
                limit: self.options.max_element_length,
                position,
            }
            .fail();
        }
        if len % 2 != 0 {
            tracing::warn!("element {} declares an odd length {}", tag, len);
        }

        if header.vr == VR::SQ {
            return self.begin_sequence(header);
        }

        if is_pixel_data {
            match self.resolve_pixel_handling(&header, false) {
                PixelDataHandling::Skip => {
                    self.parser.skip_bytes(len).context(DecodeDataSnafu)?;
                    self.delimiter_check_pending = true;
                    return Ok(DataToken::SkippedPixelValue { header });
                }
                PixelDataHandling::Lazy => {
                    let offset = self.parser.position();
                    self.parser.skip_bytes(len).context(DecodeDataSnafu)?;
                    self.delimiter_check_pending = true;
                    return Ok(DataToken::DeferredPixelValue { header, offset });
                }
                _ => {}
            }
        }

        // plain element: the value comes as the next token
        self.last_header = Some(header);
        Ok(DataToken::ElementHeader(header))
    }

    fn next_item_token(&mut self) -> Result<DataToken> {
        match self.parser.decode_item_header().context(DecodeDataSnafu)? {
            SequenceItemHeader::Item { len } => {
                self.total_items += 1;
                if self.total_items > self.options.max_total_items {
                    return ItemLimitSnafu {
                        limit: self.options.max_total_items,
                        position: self.parser.position(),
                    }
                    .fail();
                }
                self.in_sequence = false;
                self.seq_delimiters.push(SeqToken {
                    typ: SeqTokenType::Item,
                    len,
                    base_offset: self.parser.position(),
                });
                self.frames.push(ContextFrame::default());
                // items can be empty
                if len.get() == Some(0) {
                    self.delimiter_check_pending = true;
                }
                Ok(DataToken::ItemStart { len })
            }
            SequenceItemHeader::ItemDelimiter => {
                self.seq_delimiters.pop();
                self.frames.pop();
                self.in_sequence = true;
                self.delimiter_check_pending = true;
                Ok(DataToken::ItemEnd)
            }
            SequenceItemHeader::SequenceDelimiter => {
                self.seq_delimiters.pop();
                self.in_sequence = false;
                self.delimiter_check_pending = true;
                Ok(DataToken::SequenceEnd)
            }
        }
    }

    fn next_fragment_token(&mut self) -> Result<DataToken> {
        let frag = self
            .fragment_seq
            .expect("fragment state must be set in fragment mode");
        match self.parser.decode_item_header().context(DecodeDataSnafu)? {
            SequenceItemHeader::Item { len } => {
                let position = self.parser.position();
                let Some(len) = len.get() else {
                    return UndefinedFragmentLengthSnafu { position }.fail();
                };
                self.total_items += 1;
                if self.total_items > self.options.max_total_items {
                    return ItemLimitSnafu {
                        limit: self.options.max_total_items,
                        position,
                    }
                    .fail();
                }
                if len > self.options.max_element_length {
                    return ElementLengthLimitSnafu {
                        tag: Tag::ITEM,
                        len,
                        limit: self.options.max_element_length,
                        position,
                    }
                    .fail();
                }
                match frag.state {
                    FragmentState::OffsetTable => {
                        if len % 4 != 0 {
                            return InvalidOffsetTableSnafu { len, position }.fail();
                        }
                        let table = self.parser.read_u32s(len).context(DecodeDataSnafu)?;
                        if let Some(frag) = self.fragment_seq.as_mut() {
                            frag.state = FragmentState::Fragments;
                        }
                        Ok(DataToken::OffsetTable(table))
                    }
                    FragmentState::Fragments => {
                        if len % 2 != 0 {
                            return OddFragmentLengthSnafu { len, position }.fail();
                        }
                        match frag.handling {
                            PixelDataHandling::Lazy => {
                                let offset = self.parser.position();
                                self.parser.skip_bytes(len).context(DecodeDataSnafu)?;
                                Ok(DataToken::DeferredItemValue { offset, len })
                            }
                            PixelDataHandling::Skip => {
                                self.parser.skip_bytes(len).context(DecodeDataSnafu)?;
                                Ok(DataToken::SkippedItemValue { len })
                            }
                            _ => {
                                let data = self.parser.read_raw(len).context(DecodeDataSnafu)?;
                                Ok(DataToken::ItemValue(data))
                            }
                        }
                    }
                }
            }
            SequenceItemHeader::SequenceDelimiter => {
                self.fragment_seq = None;
                self.delimiter_check_pending = true;
                Ok(DataToken::SequenceEnd)
            }
            SequenceItemHeader::ItemDelimiter => UnexpectedDelimiterSnafu {
                position: self.parser.position(),
            }
            .fail(),
        }
    }
}

impl<S, D> Iterator for DataSetReader<S, D>
where
    S: ByteSource,
    D: DataDictionary<Entry = DictionaryEntryRef<'static>>,
{
    type Item = Result<DataToken>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.hard_break {
            return None;
        }

        if self.options.cancellation.is_cancelled() {
            self.hard_break = true;
            return Some(
                CancelledSnafu {
                    position: self.parser.position(),
                }
                .fail(),
            );
        }

        if self.fragment_seq.is_some() {
            let token = self.next_fragment_token();
            if token.is_err() {
                self.hard_break = true;
            }
            return Some(token);
        }

        // item or sequence ending logic for defined lengths
        if self.delimiter_check_pending {
            match self.update_seq_delimiters() {
                Err(e) => {
                    self.hard_break = true;
                    return Some(Err(e));
                }
                Ok(Some(token)) => return Some(Ok(token)),
                Ok(None) => { /* no-op */ }
            }
        }

        if self.in_sequence {
            let token = self.next_item_token();
            if token.is_err() {
                self.hard_break = true;
            }
            Some(token)
        } else if let Some(header) = self.last_header.take() {
            // an element header was read, so a value is due
            match self.parser.read_value(&header).context(DecodeDataSnafu) {
                Ok(value) => {
                    self.observe_value(header.tag, &value);
                    // sequences can end after this token
                    self.delimiter_check_pending = true;
                    Some(Ok(DataToken::PrimitiveValue(value)))
                }
                Err(e) => {
                    self.hard_break = true;
                    Some(Err(e))
                }
            }
        } else {
            match self.parser.decode_header() {
                Ok(header) => {
                    let token = self.handle_header(header);
                    if token.is_err() {
                        self.hard_break = true;
                    }
                    Some(token)
                }
                Err(e) if e.is_eof() && self.seq_delimiters.is_empty() => {
                    // the end of a DICOM object at a header boundary
                    // is the graceful end of iteration
                    self.hard_break = true;
                    None
                }
                Err(e) if e.is_eof() => {
                    self.hard_break = true;
                    Some(
                        PrematureEndSnafu {
                            position: e.position(),
                        }
                        .fail(),
                    )
                }
                Err(e) => {
                    self.hard_break = true;
                    Some(Err(e).context(DecodeDataSnafu))
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{DataSetReader, DataToken};
    use crate::options::{PixelDataHandling, ReaderOptions};
    use crate::source::BytesSource;
    use dcmkit_core::header::{DataElementHeader, Length};
    use dcmkit_core::value::RawValue;
    use dcmkit_core::{Endianness, Tag, VR};
    use dcmkit_encoding::transfer_syntax::{
        EXPLICIT_VR_LITTLE_ENDIAN, IMPLICIT_VR_LITTLE_ENDIAN, JPEG_BASELINE,
    };

    fn validate_dataset_reader(data: &'static [u8], ground_truth: Vec<DataToken>) {
        validate_dataset_reader_with_options(data, ground_truth, ReaderOptions::default())
    }

    fn validate_dataset_reader_with_options(
        data: &'static [u8],
        ground_truth: Vec<DataToken>,
        options: ReaderOptions,
    ) {
        let mut dset_reader = DataSetReader::new(
            BytesSource::new(data),
            &EXPLICIT_VR_LITTLE_ENDIAN,
            options,
        )
        .unwrap();

        let mut iter = Iterator::zip(&mut dset_reader, ground_truth);

        while let Some((res, gt_token)) = iter.next() {
            let token = res.expect("should parse without an error");
            assert_eq!(token, gt_token);
        }

        assert_eq!(
            iter.count(), // consume til the end
            0,            // we have already read all of them
            "unexpected number of tokens remaining"
        );
        assert_eq!(dset_reader.position(), data.len() as u64);
    }

    fn le_value(data: &'static [u8]) -> RawValue {
        RawValue::new(data, Endianness::Little)
    }

    #[test]
    fn read_sequence_explicit() {
        #[rustfmt::skip]
        static DATA: &[u8] = &[
            0x18, 0x00, 0x11, 0x60, // sequence tag: (0018,6011) SequenceOfUltrasoundRegions
            b'S', b'Q', // VR
            0x00, 0x00, // reserved
            0x2e, 0x00, 0x00, 0x00, // length: 28 + 18 = 46 (#= 2)
            // -- 12 --
            0xfe, 0xff, 0x00, 0xe0, // item start tag
            0x14, 0x00, 0x00, 0x00, // item length: 20 (#= 2)
            // -- 20 --
            0x18, 0x00, 0x12, 0x60, b'U', b'S', 0x02, 0x00, 0x01, 0x00, // (0018, 6012) RegionSpatialFormat, len = 2, value = 1
            // -- 30 --
            0x18, 0x00, 0x14, 0x60, b'U', b'S', 0x02, 0x00, 0x02, 0x00, // (0018, 6014) RegionDataType, len = 2, value = 2
            // -- 40 --
            0xfe, 0xff, 0x00, 0xe0, // item start tag
            0x0a, 0x00, 0x00, 0x00, // item length: 10 (#= 1)
            // -- 48 --
            0x18, 0x00, 0x12, 0x60, b'U', b'S', 0x02, 0x00, 0x04, 0x00, // (0018, 6012) RegionSpatialFormat, len = 2, value = 4
            // -- 58 --
            0x20, 0x00, 0x00, 0x40, b'L', b'T', 0x04, 0x00, // (0020,4000) ImageComments, len = 4
            b'T', b'E', b'S', b'T', // value = "TEST"
        ];

        let ground_truth = vec![
            DataToken::SequenceStart {
                tag: Tag(0x0018, 0x6011),
                len: Length(46),
            },
            DataToken::ItemStart { len: Length(20) },
            DataToken::ElementHeader(DataElementHeader {
                tag: Tag(0x0018, 0x6012),
                vr: VR::US,
                len: Length(2),
            }),
            DataToken::PrimitiveValue(le_value(&[0x01, 0x00])),
            DataToken::ElementHeader(DataElementHeader {
                tag: Tag(0x0018, 0x6014),
                vr: VR::US,
                len: Length(2),
            }),
            DataToken::PrimitiveValue(le_value(&[0x02, 0x00])),
            DataToken::ItemEnd,
            DataToken::ItemStart { len: Length(10) },
            DataToken::ElementHeader(DataElementHeader {
                tag: Tag(0x0018, 0x6012),
                vr: VR::US,
                len: Length(2),
            }),
            DataToken::PrimitiveValue(le_value(&[0x04, 0x00])),
            DataToken::ItemEnd,
            DataToken::SequenceEnd,
            DataToken::ElementHeader(DataElementHeader {
                tag: Tag(0x0020, 0x4000),
                vr: VR::LT,
                len: Length(4),
            }),
            DataToken::PrimitiveValue(le_value(b"TEST")),
        ];

        validate_dataset_reader(DATA, ground_truth);
    }

    #[test]
    fn read_sequence_delimited() {
        #[rustfmt::skip]
        static DATA: &[u8] = &[
            0x18, 0x00, 0x11, 0x60, // sequence tag: (0018,6011) SequenceOfUltrasoundRegions
            b'S', b'Q', // VR
            0x00, 0x00, // reserved
            0xff, 0xff, 0xff, 0xff, // length: undefined
            // -- 12 --
            0xfe, 0xff, 0x00, 0xe0, // item start tag
            0xff, 0xff, 0xff, 0xff, // item length: undefined
            // -- 20 --
            0x18, 0x00, 0x12, 0x60, b'U', b'S', 0x02, 0x00, 0x01, 0x00,
            // -- 30 --
            0x18, 0x00, 0x14, 0x60, b'U', b'S', 0x02, 0x00, 0x02, 0x00,
            // -- 40 --
            0xfe, 0xff, 0x0d, 0xe0, 0x00, 0x00, 0x00, 0x00, // item end
            // -- 48 --
            0xfe, 0xff, 0x00, 0xe0, // item start tag
            0xff, 0xff, 0xff, 0xff, // item length: undefined
            // -- 56 --
            0x18, 0x00, 0x12, 0x60, b'U', b'S', 0x02, 0x00, 0x04, 0x00,
            // -- 66 --
            0xfe, 0xff, 0x0d, 0xe0, 0x00, 0x00, 0x00, 0x00, // item end
            // -- 74 --
            0xfe, 0xff, 0xdd, 0xe0, 0x00, 0x00, 0x00, 0x00, // sequence end
            // -- 82 --
            0x20, 0x00, 0x00, 0x40, b'L', b'T', 0x04, 0x00, // (0020,4000) ImageComments, len = 4
            b'T', b'E', b'S', b'T', // value = "TEST"
        ];

        let ground_truth = vec![
            DataToken::SequenceStart {
                tag: Tag(0x0018, 0x6011),
                len: Length::UNDEFINED,
            },
            DataToken::ItemStart {
                len: Length::UNDEFINED,
            },
            DataToken::ElementHeader(DataElementHeader {
                tag: Tag(0x0018, 0x6012),
                vr: VR::US,
                len: Length(2),
            }),
            DataToken::PrimitiveValue(le_value(&[0x01, 0x00])),
            DataToken::ElementHeader(DataElementHeader {
                tag: Tag(0x0018, 0x6014),
                vr: VR::US,
                len: Length(2),
            }),
            DataToken::PrimitiveValue(le_value(&[0x02, 0x00])),
            DataToken::ItemEnd,
            DataToken::ItemStart {
                len: Length::UNDEFINED,
            },
            DataToken::ElementHeader(DataElementHeader {
                tag: Tag(0x0018, 0x6012),
                vr: VR::US,
                len: Length(2),
            }),
            DataToken::PrimitiveValue(le_value(&[0x04, 0x00])),
            DataToken::ItemEnd,
            DataToken::SequenceEnd,
            DataToken::ElementHeader(DataElementHeader {
                tag: Tag(0x0020, 0x4000),
                vr: VR::LT,
                len: Length(4),
            }),
            DataToken::PrimitiveValue(le_value(b"TEST")),
        ];

        validate_dataset_reader(DATA, ground_truth);
    }

    #[test]
    fn read_implicit_vr_with_unknown_tag() {
        // (0011,1001), length 4, value 0xDEADBEEF
        static DATA: &[u8] = &[
            0x11, 0x00, 0x01, 0x10, 0x04, 0x00, 0x00, 0x00, 0xDE, 0xAD, 0xBE, 0xEF,
        ];

        let mut reader = DataSetReader::new(
            BytesSource::new(DATA),
            &IMPLICIT_VR_LITTLE_ENDIAN,
            ReaderOptions::default(),
        )
        .unwrap();

        let token = reader.next().unwrap().unwrap();
        assert_eq!(
            token,
            DataToken::ElementHeader(DataElementHeader {
                tag: Tag(0x0011, 0x1001),
                vr: VR::UN,
                len: Length(4),
            })
        );
        let token = reader.next().unwrap().unwrap();
        assert_eq!(
            token,
            DataToken::PrimitiveValue(le_value(&[0xDE, 0xAD, 0xBE, 0xEF]))
        );
        assert!(reader.next().is_none());
    }

    #[test]
    fn read_implicit_vr_from_dictionary() {
        // (0010,0010) PatientName, length 8, "Doe^John"
        static DATA: &[u8] = &[
            0x10, 0x00, 0x10, 0x00, 0x08, 0x00, 0x00, 0x00, b'D', b'o', b'e', b'^', b'J', b'o',
            b'h', b'n',
        ];

        let mut reader = DataSetReader::new(
            BytesSource::new(DATA),
            &IMPLICIT_VR_LITTLE_ENDIAN,
            ReaderOptions::default(),
        )
        .unwrap();

        let token = reader.next().unwrap().unwrap();
        assert_eq!(
            token,
            DataToken::ElementHeader(DataElementHeader {
                tag: Tag(0x0010, 0x0010),
                vr: VR::PN,
                len: Length(8),
            })
        );
    }

    #[test]
    fn depth_limit_is_fatal() {
        // (0008,1115) SQ u/l > item u/l > (0008,1115) SQ u/l > item u/l > ...
        fn nested_sequences(depth: usize) -> Vec<u8> {
            let mut data = Vec::new();
            for _ in 0..depth {
                data.extend_from_slice(&[
                    0x08, 0x00, 0x15, 0x11, b'S', b'Q', 0x00, 0x00, 0xFF, 0xFF, 0xFF, 0xFF,
                ]);
                data.extend_from_slice(&[0xFE, 0xFF, 0x00, 0xE0, 0xFF, 0xFF, 0xFF, 0xFF]);
            }
            data
        }

        let data = nested_sequences(10);
        let reader = DataSetReader::new(
            BytesSource::new(data),
            &EXPLICIT_VR_LITTLE_ENDIAN,
            ReaderOptions::default().max_sequence_depth(4),
        )
        .unwrap();

        let outcome: Result<Vec<_>, _> = reader.collect();
        let err = outcome.expect_err("the depth limit must fail the parse");
        assert!(err.to_string().contains("depth 5 exceeds the limit of 4"));
    }

    #[test]
    fn read_encapsulated_pixel_data() {
        #[rustfmt::skip]
        static DATA: &[u8] = &[
            0xE0, 0x7F, 0x10, 0x00, // (7FE0,0010) PixelData
            b'O', b'B', 0x00, 0x00, // VR OB, reserved
            0xFF, 0xFF, 0xFF, 0xFF, // undefined length
            // -- basic offset table, one frame at offset 0
            0xFE, 0xFF, 0x00, 0xE0, 0x04, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
            // -- fragment, 4 bytes
            0xFE, 0xFF, 0x00, 0xE0, 0x04, 0x00, 0x00, 0x00, 0x99, 0x88, 0x77, 0x66,
            // -- sequence delimiter
            0xFE, 0xFF, 0xDD, 0xE0, 0x00, 0x00, 0x00, 0x00,
        ];

        let reader = DataSetReader::new(
            BytesSource::new(DATA),
            &JPEG_BASELINE,
            ReaderOptions::default(),
        )
        .unwrap();
        let tokens: Result<Vec<_>, _> = reader.collect();
        let tokens = tokens.unwrap();
        assert_eq!(
            tokens,
            vec![
                DataToken::PixelSequenceStart {
                    tag: Tag(0x7FE0, 0x0010)
                },
                DataToken::OffsetTable(vec![0]),
                DataToken::ItemValue(bytes::Bytes::from_static(&[0x99, 0x88, 0x77, 0x66])),
                DataToken::SequenceEnd,
            ]
        );
    }

    #[test]
    fn skip_encapsulated_fragments() {
        #[rustfmt::skip]
        static DATA: &[u8] = &[
            0xE0, 0x7F, 0x10, 0x00, b'O', b'B', 0x00, 0x00, 0xFF, 0xFF, 0xFF, 0xFF,
            0xFE, 0xFF, 0x00, 0xE0, 0x00, 0x00, 0x00, 0x00, // empty offset table
            0xFE, 0xFF, 0x00, 0xE0, 0x02, 0x00, 0x00, 0x00, 0x99, 0x88,
            0xFE, 0xFF, 0xDD, 0xE0, 0x00, 0x00, 0x00, 0x00,
        ];

        let reader = DataSetReader::new(
            BytesSource::new(DATA),
            &JPEG_BASELINE,
            ReaderOptions::default().pixel_data_handling(PixelDataHandling::Skip),
        )
        .unwrap();
        let tokens: Result<Vec<_>, _> = reader.collect();
        assert_eq!(
            tokens.unwrap(),
            vec![
                DataToken::PixelSequenceStart {
                    tag: Tag(0x7FE0, 0x0010)
                },
                DataToken::OffsetTable(vec![]),
                DataToken::SkippedItemValue { len: 2 },
                DataToken::SequenceEnd,
            ]
        );
    }
}
