//! The in-memory data set model: an ordered associative container
//! of data elements, with the context caches the rest of the engine
//! relies on, and the token-stream builder which assembles data sets
//! from the parser's output.

use crate::file::{
    CharsetSnafu, DuplicatePrivateSlotSnafu, OrphanPrivateElementSnafu, PrematureEndSnafu,
    ReadError, ReadTokenSnafu, UnexpectedTokenSnafu,
};
use crate::pixeldata::{
    DeferredFragments, FragmentPosition, FrameMappingUnknownSnafu, FrameOutOfRangeSnafu,
    ImageDescription, LazyPixelData, MissingImageDescriptionSnafu, PixelError, PixelPayload,
    PixelSource,
};
use crate::validation::{
    RuleContext, Severity, ValidationAbort, ValidationIssue, Validator,
};
use bytes::Bytes;
use dcmkit_core::dictionary::{DataDictionary, DictionaryEntryRef};
use dcmkit_core::header::Header;
use dcmkit_core::value::{DataSetSequence, PixelFragmentSequence, RawValue, Value, ValueAccessError};
use dcmkit_core::{DataElement, DataElementHeader, Length, Tag, VR};
use dcmkit_dictionary_std::{tags, StandardDataDictionary};
use dcmkit_encoding::text::{CharsetError, SpecificCharacterSet, TextCodec};
use dcmkit_parser::dataset::read::DataSetReader;
use dcmkit_parser::dataset::DataToken;
use dcmkit_parser::options::ReaderOptions;
use dcmkit_parser::source::ByteSource;
use snafu::{Backtrace, OptionExt, ResultExt, Snafu};
use std::borrow::Cow;
use std::collections::{BTreeMap, HashMap};
use std::sync::OnceLock;

/// The element type stored in a [`Dataset`]:
/// items are data sets, deferred pixel data is a [`PixelPayload`].
pub type Element = DataElement<Dataset, PixelPayload>;

/// An error raised when accessing data set content.
#[derive(Debug, Snafu)]
#[non_exhaustive]
pub enum AccessError {
    /// No element with the given tag exists.
    #[snafu(display("no such data element {}", tag))]
    NoSuchDataElement { tag: Tag, backtrace: Backtrace },

    /// The element does not hold a primitive value.
    #[snafu(display("element {} is not a primitive value", tag))]
    NotPrimitive { tag: Tag, backtrace: Backtrace },

    /// The value bytes do not interpret under the requested type.
    #[snafu(display("could not interpret the value of {}", tag))]
    ConvertValue {
        tag: Tag,
        source: ValueAccessError,
    },

    /// The value bytes do not decode under the data set's
    /// character set.
    #[snafu(display("could not decode the text value of {}", tag))]
    DecodeText {
        tag: Tag,
        source: dcmkit_encoding::text::DecodeTextError,
    },

    /// A numeric string does not parse as a number.
    #[snafu(display("could not parse the numeric string of {}", tag))]
    ParseNumericString { tag: Tag, backtrace: Backtrace },

    /// Pixel data access failed.
    #[snafu(display("could not access pixel data"))]
    Pixel {
        #[snafu(backtrace)]
        source: PixelError,
    },
}

type Result<T, E = AccessError> = std::result::Result<T, E>;

/// An in-memory DICOM data set:
/// a mapping from tags to data elements with unique keys
/// and enumeration in ascending tag order.
///
/// The data set additionally caches the context other parts of the
/// engine consult: the specific character set in force, the pixel
/// sample description values, and the private creator slot table.
/// Sequence items carry their nesting depth and inherit the context
/// of the data set they were created in.
///
/// Raw values may alias the buffer the data set was parsed from;
/// [`clone_to_owned`](Dataset::clone_to_owned) produces a deep copy
/// with independent storage.
#[derive(Debug, Clone)]
pub struct Dataset {
    entries: HashMap<Tag, Element>,
    /// ascending tag view, rebuilt lazily after mutations
    sorted: OnceLock<Box<[Tag]>>,
    charset: SpecificCharacterSet,
    bits_allocated: Option<u16>,
    pixel_representation: Option<u16>,
    /// (group, slot) → creator identifier
    creators: BTreeMap<(u16, u8), String>,
    depth: u32,
}

impl Default for Dataset {
    fn default() -> Self {
        Dataset::new()
    }
}

/// Data sets are equal iff they hold equal elements.
impl PartialEq for Dataset {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

impl Dataset {
    /// Create an empty root data set
    /// with the default character repertoire.
    pub fn new() -> Self {
        Dataset::with_charset(SpecificCharacterSet::default())
    }

    /// Create an empty root data set with the given character set.
    pub fn with_charset(charset: SpecificCharacterSet) -> Self {
        Dataset {
            entries: HashMap::new(),
            sorted: OnceLock::new(),
            charset,
            bits_allocated: None,
            pixel_representation: None,
            creators: BTreeMap::new(),
            depth: 0,
        }
    }

    /// Create an empty item data set nested under the given parent,
    /// inheriting its character set and context cache.
    pub fn new_item(parent: &Dataset) -> Self {
        Dataset {
            entries: HashMap::new(),
            sorted: OnceLock::new(),
            charset: parent.charset.clone(),
            bits_allocated: parent.bits_allocated,
            pixel_representation: parent.pixel_representation,
            creators: BTreeMap::new(),
            depth: parent.depth + 1,
        }
    }

    /// The nesting depth of this data set;
    /// zero for a root data set,
    /// the parent's depth plus one for a sequence item.
    #[inline]
    pub fn depth(&self) -> u32 {
        self.depth
    }

    /// The character set in force for text values of this data set.
    #[inline]
    pub fn charset(&self) -> &SpecificCharacterSet {
        &self.charset
    }

    /// Replace the character set in force.
    pub fn set_charset(&mut self, charset: SpecificCharacterSet) {
        self.charset = charset;
    }

    /// The cached _Bits Allocated_ value, possibly inherited.
    #[inline]
    pub fn bits_allocated(&self) -> Option<u16> {
        self.bits_allocated
    }

    /// The cached _Pixel Representation_ value, possibly inherited.
    #[inline]
    pub fn pixel_representation(&self) -> Option<u16> {
        self.pixel_representation
    }

    /// The creator identifier registered for the given
    /// private group and slot.
    pub fn private_creator(&self, group: u16, slot: u8) -> Option<&str> {
        self.creators.get(&(group, slot)).map(String::as_str)
    }

    /// The number of elements in the data set.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the data set holds no elements.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn invalidate(&mut self) {
        self.sorted = OnceLock::new();
    }

    fn update_context(&mut self, element: &Element) {
        let tag = element.tag();
        let Value::Primitive(value) = element.value() else {
            return;
        };
        match tag {
            tags::SPECIFIC_CHARACTER_SET => {
                match charset_from_value(value) {
                    Ok(charset) => self.charset = charset,
                    Err(e) => {
                        tracing::warn!("ignoring invalid specific character set: {}", e);
                    }
                }
            }
            tags::BITS_ALLOCATED => self.bits_allocated = value.uint16().ok(),
            tags::PIXEL_REPRESENTATION => self.pixel_representation = value.uint16().ok(),
            tag if tag.is_private_creator() => {
                if let Some(creator) = value.as_utf8() {
                    let creator = creator
                        .trim_end_matches(|c: char| c.is_whitespace() || c == '\0')
                        .to_string();
                    self.creators
                        .insert((tag.group(), tag.element() as u8), creator);
                }
            }
            _ => {}
        }
    }

    /// Insert a data element, replacing any element with the same
    /// tag and returning it. Context caches and the private creator
    /// table are updated accordingly.
    pub fn put(&mut self, element: Element) -> Option<Element> {
        self.update_context(&element);
        self.invalidate();
        self.entries.insert(element.tag(), element)
    }

    /// Remove the element with the given tag, if present.
    pub fn remove(&mut self, tag: Tag) -> Option<Element> {
        self.invalidate();
        self.entries.remove(&tag)
    }

    /// Fetch the element with the given tag.
    pub fn get(&self, tag: Tag) -> Option<&Element> {
        self.entries.get(&tag)
    }

    /// Fetch the element with the given tag,
    /// failing if it does not exist.
    pub fn element(&self, tag: Tag) -> Result<&Element> {
        self.entries
            .get(&tag)
            .context(NoSuchDataElementSnafu { tag })
    }

    fn sorted_tags(&self) -> &[Tag] {
        self.sorted.get_or_init(|| {
            let mut tags: Vec<Tag> = self.entries.keys().copied().collect();
            tags.sort_unstable();
            tags.into_boxed_slice()
        })
    }

    /// Enumerate the element tags in ascending order.
    pub fn tags(&self) -> impl Iterator<Item = Tag> + '_ {
        self.sorted_tags().iter().copied()
    }

    /// Enumerate the elements in ascending tag order.
    pub fn iter(&self) -> impl Iterator<Item = &Element> + '_ {
        self.sorted_tags().iter().map(move |tag| &self.entries[tag])
    }

    fn primitive(&self, tag: Tag) -> Result<(&Element, &RawValue)> {
        let element = self.element(tag)?;
        match element.value() {
            Value::Primitive(value) => Ok((element, value)),
            _ => NotPrimitiveSnafu { tag }.fail(),
        }
    }

    /// Fetch a text value, decoded under the data set's character
    /// set and trimmed of its trailing padding.
    ///
    /// When the character set and the bytes allow it, the returned
    /// string borrows the element's raw bytes without conversion.
    pub fn string(&self, tag: Tag) -> Result<Cow<'_, str>> {
        let (element, value) = self.primitive(tag)?;
        let bytes = value.as_slice();
        let pad = element.vr().padding() as char;
        if self.charset.utf8_passthrough(bytes) {
            if let Ok(text) = std::str::from_utf8(bytes) {
                return Ok(Cow::Borrowed(text.trim_end_matches(pad)));
            }
        }
        let decoded = self
            .charset
            .decode(bytes)
            .context(DecodeTextSnafu { tag })?;
        let trimmed_len = decoded.trim_end_matches(pad).len();
        let mut decoded = decoded;
        decoded.truncate(trimmed_len);
        Ok(Cow::Owned(decoded))
    }

    /// Fetch a multi-valued text value, decoded and split
    /// on the value delimiter, each value trimmed of its padding.
    pub fn strings(&self, tag: Tag) -> Result<Vec<String>> {
        let (element, value) = self.primitive(tag)?;
        let pad = element.vr().padding() as char;
        let decoded = self
            .charset
            .decode(value.as_slice())
            .context(DecodeTextSnafu { tag })?;
        Ok(decoded
            .split('\\')
            .map(|v| v.trim_end_matches(pad).to_string())
            .collect())
    }

    /// Fetch an unsigned 16-bit value.
    pub fn uint16(&self, tag: Tag) -> Result<u16> {
        let (_, value) = self.primitive(tag)?;
        value.uint16().context(ConvertValueSnafu { tag })
    }

    /// Fetch an unsigned 32-bit value.
    pub fn uint32(&self, tag: Tag) -> Result<u32> {
        let (_, value) = self.primitive(tag)?;
        value.uint32().context(ConvertValueSnafu { tag })
    }

    /// Fetch a signed 32-bit value,
    /// parsing Integer String values from text.
    pub fn int32(&self, tag: Tag) -> Result<i32> {
        let (element, value) = self.primitive(tag)?;
        if element.vr() == VR::IS {
            return value
                .as_utf8()
                .and_then(|s| s.trim_matches([' ', '\0']).parse().ok())
                .context(ParseNumericStringSnafu { tag });
        }
        value.int32().context(ConvertValueSnafu { tag })
    }

    /// Fetch a double precision float value,
    /// parsing Decimal String values from text.
    pub fn float64(&self, tag: Tag) -> Result<f64> {
        let (element, value) = self.primitive(tag)?;
        match element.vr() {
            VR::DS | VR::IS => value
                .as_utf8()
                .and_then(|s| s.trim_matches([' ', '\0']).parse().ok())
                .context(ParseNumericStringSnafu { tag }),
            VR::FL => value
                .float32()
                .map(f64::from)
                .context(ConvertValueSnafu { tag }),
            _ => value.float64().context(ConvertValueSnafu { tag }),
        }
    }

    /// The image description accumulated from this data set,
    /// for pixel data frame arithmetic.
    pub fn image_description(&self) -> ImageDescription {
        ImageDescription {
            rows: self.uint16(tags::ROWS).ok(),
            columns: self.uint16(tags::COLUMNS).ok(),
            bits_allocated: self.bits_allocated,
            samples_per_pixel: self.uint16(tags::SAMPLES_PER_PIXEL).ok(),
            number_of_frames: self.int32(tags::NUMBER_OF_FRAMES).ok().map(|v| v as u32),
        }
    }

    /// Fetch the bytes of pixel data frame `index`,
    /// across all pixel data shapes:
    /// a slice for native data, a fragment run for encapsulated
    /// data, a source read for lazily parked data.
    pub fn frame(&self, index: usize) -> Result<Bytes> {
        let element = self.element(tags::PIXEL_DATA)?;
        let description = self.image_description();
        match element.value() {
            Value::Primitive(value) => {
                let frame_len = description
                    .frame_length()
                    .ok_or_else(|| MissingImageDescriptionSnafu.build())
                    .context(PixelSnafu)? as usize;
                let available = if frame_len == 0 {
                    0
                } else {
                    value.len() / frame_len
                };
                if index >= available {
                    return Err(FrameOutOfRangeSnafu { index, available }.build())
                        .context(PixelSnafu);
                }
                let start = index * frame_len;
                Ok(value.bytes().slice(start..start + frame_len))
            }
            Value::PixelSequence(seq) => {
                frame_from_fragments(seq, &description, index).context(PixelSnafu)
            }
            Value::Pixel(payload) => payload
                .lazy()
                .and_then(|lazy| lazy.frame(index))
                .context(PixelSnafu),
            Value::Sequence(_) => NotPrimitiveSnafu {
                tag: tags::PIXEL_DATA,
            }
            .fail(),
        }
    }

    /// Deep-copy the data set so that every element owns its bytes,
    /// severing any aliasing of the source buffer.
    /// Recurses through sequences and fragment sequences.
    pub fn clone_to_owned(&self) -> Dataset {
        let mut out = Dataset {
            entries: HashMap::with_capacity(self.entries.len()),
            sorted: OnceLock::new(),
            charset: self.charset.clone(),
            bits_allocated: self.bits_allocated,
            pixel_representation: self.pixel_representation,
            creators: self.creators.clone(),
            depth: self.depth,
        };
        for (tag, element) in &self.entries {
            out.entries.insert(*tag, owned_element(element));
        }
        out
    }

    /// Produce a copy of the data set with the private creator
    /// slots of every group re-packed contiguously from 0x10,
    /// remapping the data element tags accordingly.
    /// Creator identifiers are preserved.
    pub fn compacted(&self) -> Dataset {
        let mut remap: HashMap<(u16, u8), u8> = HashMap::new();
        let mut next_slot: HashMap<u16, u8> = HashMap::new();
        for (group, slot) in self.creators.keys() {
            let next = next_slot.entry(*group).or_insert(0x10);
            remap.insert((*group, *slot), *next);
            *next += 1;
        }

        let mut out = Dataset {
            entries: HashMap::with_capacity(self.entries.len()),
            sorted: OnceLock::new(),
            charset: self.charset.clone(),
            bits_allocated: self.bits_allocated,
            pixel_representation: self.pixel_representation,
            creators: self
                .creators
                .iter()
                .map(|((group, slot), creator)| ((*group, remap[&(*group, *slot)]), creator.clone()))
                .collect(),
            depth: self.depth,
        };

        for element in self.iter() {
            let tag = element.tag();
            let new_tag = if tag.is_private_creator() {
                match remap.get(&(tag.group(), tag.element() as u8)) {
                    Some(slot) => Tag(tag.group(), u16::from(*slot)),
                    None => tag,
                }
            } else if let Some(slot) = tag.private_creator_slot() {
                match remap.get(&(tag.group(), slot)) {
                    Some(new_slot) => tag.with_private_creator_slot(*new_slot),
                    None => tag,
                }
            } else {
                tag
            };

            let value = match element.value() {
                Value::Sequence(seq) => Value::Sequence(DataSetSequence::new(
                    seq.items().iter().map(Dataset::compacted).collect(),
                    seq.length(),
                )),
                value => value.clone(),
            };
            let header = DataElementHeader::new(new_tag, element.vr(), element.header().len);
            out.entries.insert(new_tag, DataElement::from_parts(header, value));
        }
        out
    }

    /// Bind deferred pixel payloads in this data set (and any nested
    /// items) to the given source stream.
    pub(crate) fn bind_pixel_source(&self, source: &PixelSource) {
        for element in self.entries.values() {
            match element.value() {
                Value::Pixel(PixelPayload::Lazy(lazy)) => {
                    lazy.bind_source(source.clone());
                }
                Value::Sequence(seq) => {
                    for item in seq.items() {
                        item.bind_pixel_source(source);
                    }
                }
                _ => {}
            }
        }
    }

    /// Whether any element defers its pixel data to the source.
    pub(crate) fn has_deferred_pixel_data(&self) -> bool {
        self.entries.values().any(|element| match element.value() {
            Value::Pixel(PixelPayload::Lazy(_)) => true,
            Value::Sequence(seq) => seq.items().iter().any(Dataset::has_deferred_pixel_data),
            _ => false,
        })
    }
}

fn owned_element(element: &Element) -> Element {
    let value = match element.value() {
        Value::Primitive(v) => Value::Primitive(v.detached()),
        Value::Sequence(seq) => Value::Sequence(DataSetSequence::new(
            seq.items().iter().map(Dataset::clone_to_owned).collect(),
            seq.length(),
        )),
        Value::PixelSequence(ps) => Value::PixelSequence(ps.detached()),
        Value::Pixel(payload) => Value::Pixel(payload.clone()),
    };
    DataElement::from_parts(*element.header(), value)
}

/// Select the fragments of one frame from an in-memory fragment
/// sequence and concatenate them.
fn frame_from_fragments(
    seq: &PixelFragmentSequence,
    description: &ImageDescription,
    index: usize,
) -> Result<Bytes, PixelError> {
    let fragments = seq.fragments();
    let bot = seq.offset_table();
    if bot.is_empty() {
        let declared = description.number_of_frames.unwrap_or(1) as usize;
        if fragments.len() == declared {
            return fragments.get(index).cloned().ok_or_else(|| {
                FrameOutOfRangeSnafu {
                    index,
                    available: declared,
                }
                .build()
            });
        }
        return FrameMappingUnknownSnafu {
            fragments: fragments.len(),
            frames: declared,
        }
        .fail();
    }

    if index >= bot.len() {
        return FrameOutOfRangeSnafu {
            index,
            available: bot.len(),
        }
        .fail();
    }
    let start = bot[index];
    let end = bot.get(index + 1).copied().unwrap_or(u32::MAX);

    // walk the fragments accumulating their relative offsets
    let mut run = Vec::new();
    let mut offset = 0u32;
    for fragment in fragments {
        if offset >= start && offset < end {
            run.push(fragment.clone());
        }
        offset += 8 + fragment.len() as u32;
    }
    match run.as_slice() {
        [single] => Ok(single.clone()),
        _ => {
            let mut out = Vec::new();
            for fragment in &run {
                out.extend_from_slice(fragment);
            }
            Ok(Bytes::from(out))
        }
    }
}

fn charset_from_value(value: &RawValue) -> Result<SpecificCharacterSet, CharsetError> {
    let text = String::from_utf8_lossy(value.as_slice());
    let terms: Vec<&str> = text.split('\\').collect();
    SpecificCharacterSet::from_terms(&terms)
}

/// Shared state of one data set building pass.
pub(crate) struct BuildContext<'a> {
    pub options: &'a ReaderOptions,
    pub validator: &'a mut Validator,
    pub explicit_vr: bool,
}

enum Built {
    Element { element: Element, value_position: u64 },
    ItemEnd,
    SequenceEnd,
}

impl Dataset {
    /// Assemble a root data set from the reader's token stream,
    /// validating each element as it completes.
    pub(crate) fn build_root<S, D>(
        reader: &mut DataSetReader<S, D>,
        ctx: &mut BuildContext<'_>,
    ) -> std::result::Result<Dataset, ReadError>
    where
        S: ByteSource,
        D: DataDictionary<Entry = DictionaryEntryRef<'static>>,
    {
        let mut dataset = Dataset::new();
        let mut last_tag = None;
        loop {
            match next_built(reader, &dataset, ctx)? {
                None => break,
                Some(Built::Element {
                    element,
                    value_position,
                }) => insert_built(&mut dataset, element, value_position, &mut last_tag, ctx)?,
                Some(Built::ItemEnd) | Some(Built::SequenceEnd) => {
                    return UnexpectedTokenSnafu {
                        description: "sequence delimiter outside of a sequence",
                    }
                    .fail();
                }
            }
        }
        attach_extended_offset_table(&mut dataset);
        Ok(dataset)
    }

    /// Assemble one root-level element from the reader's token
    /// stream, or `None` at the end of the data set.
    /// The `shell` data set provides the decoding context
    /// accumulated so far.
    pub(crate) fn build_element<S, D>(
        reader: &mut DataSetReader<S, D>,
        shell: &Dataset,
        ctx: &mut BuildContext<'_>,
    ) -> std::result::Result<Option<Element>, ReadError>
    where
        S: ByteSource,
        D: DataDictionary<Entry = DictionaryEntryRef<'static>>,
    {
        match next_built(reader, shell, ctx)? {
            None => Ok(None),
            Some(Built::Element { element, .. }) => Ok(Some(element)),
            Some(Built::ItemEnd) | Some(Built::SequenceEnd) => UnexpectedTokenSnafu {
                description: "sequence delimiter outside of a sequence",
            }
            .fail(),
        }
    }
}

fn next_built<S, D>(
    reader: &mut DataSetReader<S, D>,
    parent: &Dataset,
    ctx: &mut BuildContext<'_>,
) -> std::result::Result<Option<Built>, ReadError>
where
    S: ByteSource,
    D: DataDictionary<Entry = DictionaryEntryRef<'static>>,
{
    let Some(token) = reader.next() else {
        return Ok(None);
    };
    let token = token.context(ReadTokenSnafu)?;
    match token {
        DataToken::ElementHeader(header) => {
            let value_position = DataSetReader::position(reader);
            let value = match reader.next() {
                Some(Ok(DataToken::PrimitiveValue(value))) => value,
                Some(Ok(token)) => {
                    return UnexpectedTokenSnafu {
                        description: token.to_string(),
                    }
                    .fail()
                }
                Some(Err(e)) => return Err(e).context(ReadTokenSnafu),
                None => return PrematureEndSnafu.fail(),
            };
            Ok(Some(Built::Element {
                element: DataElement::from_parts(header, Value::Primitive(value)),
                value_position,
            }))
        }
        DataToken::SequenceStart { tag, len } => {
            let mut items = Vec::new();
            loop {
                match reader.next() {
                    Some(Ok(DataToken::ItemStart { .. })) => {
                        items.push(build_item(reader, parent, ctx)?);
                    }
                    Some(Ok(DataToken::SequenceEnd)) => break,
                    Some(Ok(token)) => {
                        return UnexpectedTokenSnafu {
                            description: token.to_string(),
                        }
                        .fail()
                    }
                    Some(Err(e)) => return Err(e).context(ReadTokenSnafu),
                    None => return PrematureEndSnafu.fail(),
                }
            }
            let header = DataElementHeader::new(tag, VR::SQ, len);
            Ok(Some(Built::Element {
                element: DataElement::from_parts(
                    header,
                    Value::Sequence(DataSetSequence::new(items, len)),
                ),
                value_position: 0,
            }))
        }
        DataToken::PixelSequenceStart { tag } => {
            let element = build_pixel_sequence(reader, tag, parent, ctx)?;
            Ok(Some(Built::Element {
                element,
                value_position: 0,
            }))
        }
        DataToken::DeferredPixelValue { header, offset } => {
            let lazy = LazyPixelData::native(
                header,
                offset,
                header.len.get().unwrap_or(0),
                reader.endianness(),
                parent.image_description(),
            );
            Ok(Some(Built::Element {
                element: DataElement::from_parts(
                    header,
                    Value::Pixel(PixelPayload::Lazy(lazy)),
                ),
                value_position: 0,
            }))
        }
        DataToken::SkippedPixelValue { header } => Ok(Some(Built::Element {
            element: DataElement::from_parts(header, Value::Pixel(PixelPayload::Skipped { header })),
            value_position: 0,
        })),
        DataToken::ItemEnd => Ok(Some(Built::ItemEnd)),
        DataToken::SequenceEnd => Ok(Some(Built::SequenceEnd)),
        token => UnexpectedTokenSnafu {
            description: token.to_string(),
        }
        .fail(),
    }
}

fn build_item<S, D>(
    reader: &mut DataSetReader<S, D>,
    parent: &Dataset,
    ctx: &mut BuildContext<'_>,
) -> std::result::Result<Dataset, ReadError>
where
    S: ByteSource,
    D: DataDictionary<Entry = DictionaryEntryRef<'static>>,
{
    let mut dataset = Dataset::new_item(parent);
    let mut last_tag = None;
    loop {
        match next_built(reader, &dataset, ctx)? {
            None => return PrematureEndSnafu.fail(),
            Some(Built::ItemEnd) => break,
            Some(Built::SequenceEnd) => {
                return UnexpectedTokenSnafu {
                    description: "sequence delimiter in item position",
                }
                .fail()
            }
            Some(Built::Element {
                element,
                value_position,
            }) => insert_built(&mut dataset, element, value_position, &mut last_tag, ctx)?,
        }
    }
    attach_extended_offset_table(&mut dataset);
    Ok(dataset)
}

fn build_pixel_sequence<S, D>(
    reader: &mut DataSetReader<S, D>,
    tag: Tag,
    parent: &Dataset,
    ctx: &mut BuildContext<'_>,
) -> std::result::Result<Element, ReadError>
where
    S: ByteSource,
    D: DataDictionary<Entry = DictionaryEntryRef<'static>>,
{
    let mut offset_table: Vec<u32> = Vec::new();
    let mut eager: Vec<Bytes> = Vec::new();
    let mut deferred: Vec<FragmentPosition> = Vec::new();
    let mut skipped = false;
    let mut fragments_base: u64 = 0;
    loop {
        match reader.next() {
            Some(Ok(DataToken::OffsetTable(table))) => {
                offset_table = table;
                fragments_base = DataSetReader::position(reader);
            }
            Some(Ok(DataToken::ItemValue(data))) => {
                eager.push(data);
            }
            Some(Ok(DataToken::DeferredItemValue { offset, len })) => {
                deferred.push(FragmentPosition {
                    relative_offset: (offset - 8).saturating_sub(fragments_base) as u32,
                    offset,
                    length: len,
                });
            }
            Some(Ok(DataToken::SkippedItemValue { .. })) => {
                skipped = true;
            }
            Some(Ok(DataToken::SequenceEnd)) => break,
            Some(Ok(token)) => {
                return UnexpectedTokenSnafu {
                    description: token.to_string(),
                }
                .fail()
            }
            Some(Err(e)) => return Err(e).context(ReadTokenSnafu),
            None => return PrematureEndSnafu.fail(),
        }
    }

    let description = parent.image_description();
    let fragment_count = eager.len() + deferred.len();
    if let Some(frames) = description.number_of_frames {
        let frames = frames as usize;
        if !offset_table.is_empty() && offset_table.len() != frames {
            note(
                ctx,
                ValidationIssue::new(
                    "pixel.bot.frame-mismatch",
                    Severity::Info,
                    format!(
                        "basic offset table has {} entries for {} frames",
                        offset_table.len(),
                        frames
                    ),
                )
                .with_tag_position(tag, 0),
            )?;
        } else if offset_table.is_empty() && fragment_count > 1 && fragment_count != frames {
            note(
                ctx,
                ValidationIssue::new(
                    "pixel.bot.frame-mapping",
                    Severity::Info,
                    format!(
                        "{} fragments cannot be mapped onto {} frames without an offset table",
                        fragment_count, frames
                    ),
                )
                .with_tag_position(tag, 0),
            )?;
        }
    }

    let header = DataElementHeader::new(tag, VR::OB, Length::UNDEFINED);
    let value = if skipped {
        Value::Pixel(PixelPayload::Skipped { header })
    } else if !deferred.is_empty() {
        Value::Pixel(PixelPayload::Lazy(LazyPixelData::encapsulated(
            header,
            DeferredFragments {
                offset_table,
                fragments: deferred,
            },
            description,
        )))
    } else {
        Value::PixelSequence(PixelFragmentSequence::new(offset_table, eager))
    };
    Ok(DataElement::from_parts(header, value))
}

fn note(ctx: &mut BuildContext<'_>, issue: ValidationIssue) -> std::result::Result<(), ReadError> {
    ctx.validator.note(issue).map_err(abort_to_error)
}

fn abort_to_error(abort: ValidationAbort) -> ReadError {
    match abort {
        ValidationAbort::Failed(issue) => ReadError::Validation { issue },
        ValidationAbort::Cancelled => ReadError::ValidationCancelled,
    }
}

fn insert_built(
    dataset: &mut Dataset,
    element: Element,
    value_position: u64,
    last_tag: &mut Option<Tag>,
    ctx: &mut BuildContext<'_>,
) -> std::result::Result<(), ReadError> {
    let tag = element.tag();

    if let Some(last) = *last_tag {
        if tag <= last {
            note(
                ctx,
                ValidationIssue::new(
                    "structure.tag-order",
                    Severity::Warning,
                    format!("element {} does not ascend over {}", tag, last),
                )
                .with_tag_position(tag, value_position),
            )?;
        }
    }
    *last_tag = Some(tag);

    // the character set element switches the decoding context
    // for the rest of this data set
    if tag == tags::SPECIFIC_CHARACTER_SET {
        if let Value::Primitive(value) = element.value() {
            match charset_from_value(value) {
                Ok(charset) => dataset.set_charset(charset),
                Err(e) => {
                    if ctx.validator.strict_charset() {
                        return Err(e).context(CharsetSnafu);
                    }
                    note(
                        ctx,
                        ValidationIssue::new(
                            "charset.unsupported",
                            Severity::Warning,
                            format!("{}; falling back to UTF-8", e),
                        )
                        .with_tag_position(tag, value_position),
                    )?;
                    dataset.set_charset(SpecificCharacterSet::iso_ir_192());
                }
            }
        }
    }

    // private creator discipline
    if tag.is_private_creator() {
        let slot = tag.element() as u8;
        if let Some(existing) = dataset.private_creator(tag.group(), slot) {
            if ctx.options.fail_on_duplicate_private_slots {
                return DuplicatePrivateSlotSnafu {
                    group: tag.group(),
                    slot,
                    creator: existing.to_string(),
                }
                .fail();
            }
            note(
                ctx,
                ValidationIssue::new(
                    "private.duplicate-slot",
                    Severity::Warning,
                    format!(
                        "private creator slot ({:04X},00{:02X}) is re-registered",
                        tag.group(),
                        slot
                    ),
                )
                .with_tag_position(tag, value_position),
            )?;
        }
    } else if let Some(slot) = tag.private_creator_slot() {
        if dataset.private_creator(tag.group(), slot).is_none() {
            if ctx.options.fail_on_orphan_private_elements {
                return OrphanPrivateElementSnafu { tag }.fail();
            }
            if !ctx.options.retain_unknown_private_tags {
                tracing::debug!("discarding orphan private data element {}", tag);
                return Ok(());
            }
            note(
                ctx,
                ValidationIssue::new(
                    "private.orphan",
                    Severity::Info,
                    format!("private data element {} has no registered creator", tag),
                )
                .with_tag_position(tag, value_position),
            )?;
        }
    }

    // the validation engine runs for each decoded primitive value
    if let Value::Primitive(value) = element.value() {
        let dictionary_vr = StandardDataDictionary.by_tag(tag).map(|e| e.vr);
        let rule_ctx = RuleContext {
            tag,
            declared_vr: element.vr(),
            dictionary_vr,
            value: value.as_slice(),
            dataset,
            charset: dataset.charset(),
            position: value_position,
            is_private: tag.is_private(),
            private_creator: tag
                .private_creator_slot()
                .and_then(|slot| dataset.private_creator(tag.group(), slot)),
        };
        ctx.validator.element(&rule_ctx).map_err(abort_to_error)?;

        if !ctx.explicit_vr
            && element.vr() == VR::UN
            && dictionary_vr.is_some_and(|vr| vr.exact().is_none())
        {
            note(
                ctx,
                ValidationIssue::new(
                    "element.vr.ambiguous",
                    Severity::Info,
                    format!(
                        "the value representation of {} could not be resolved from context",
                        tag
                    ),
                )
                .with_tag_position(tag, value_position),
            )?;
        }
    }

    dataset.put(element);
    Ok(())
}

fn attach_extended_offset_table(dataset: &mut Dataset) {
    let offsets = match dataset.get(tags::EXTENDED_OFFSET_TABLE).map(Element::value) {
        Some(Value::Primitive(v)) => match v.uint64_all() {
            Ok(offsets) => offsets.to_vec(),
            Err(_) => return,
        },
        _ => return,
    };
    let lengths = match dataset
        .get(tags::EXTENDED_OFFSET_TABLE_LENGTHS)
        .map(Element::value)
    {
        Some(Value::Primitive(v)) => v.uint64_all().ok().map(|l| l.to_vec()),
        _ => None,
    };
    if let Some(element) = dataset.entries.get_mut(&tags::PIXEL_DATA) {
        if let Value::PixelSequence(seq) = element.value_mut() {
            seq.set_extended_offset_table(dcmkit_core::value::ExtendedOffsetTable {
                offsets,
                lengths,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dcmkit_core::Endianness;

    fn text_element(tag: Tag, vr: VR, text: &str) -> Element {
        DataElement::new(tag, vr, Value::Primitive(RawValue::from_text(text)))
    }

    #[test]
    fn enumeration_is_sorted_regardless_of_insertion_order() {
        let mut dataset = Dataset::new();
        dataset.put(text_element(Tag(0x0010, 0x0020), VR::LO, "ID"));
        dataset.put(text_element(Tag(0x0008, 0x0060), VR::CS, "CT"));
        dataset.put(text_element(Tag(0x0010, 0x0010), VR::PN, "Doe^John"));

        let tags: Vec<Tag> = dataset.tags().collect();
        assert_eq!(
            tags,
            vec![
                Tag(0x0008, 0x0060),
                Tag(0x0010, 0x0010),
                Tag(0x0010, 0x0020)
            ]
        );

        // mutation invalidates the sorted view
        dataset.put(text_element(Tag(0x0008, 0x0020), VR::DA, "20240101"));
        let tags: Vec<Tag> = dataset.tags().collect();
        assert_eq!(tags[0], Tag(0x0008, 0x0020));
    }

    #[test]
    fn string_access_trims_padding() {
        let mut dataset = Dataset::new();
        dataset.put(text_element(Tag(0x0010, 0x0020), VR::LO, "ITEM1 "));
        dataset.put(text_element(Tag(0x0008, 0x0018), VR::UI, "1.2.3\0"));

        assert_eq!(dataset.string(Tag(0x0010, 0x0020)).unwrap(), "ITEM1");
        assert_eq!(dataset.string(Tag(0x0008, 0x0018)).unwrap(), "1.2.3");
    }

    #[test]
    fn string_access_borrows_on_utf8_passthrough() {
        let mut dataset = Dataset::new();
        dataset.put(text_element(Tag(0x0010, 0x0010), VR::PN, "Doe^John"));
        match dataset.string(Tag(0x0010, 0x0010)).unwrap() {
            Cow::Borrowed(s) => assert_eq!(s, "Doe^John"),
            Cow::Owned(_) => panic!("expected a borrowed string"),
        }
    }

    #[test]
    fn numeric_string_getters() {
        let mut dataset = Dataset::new();
        dataset.put(text_element(Tag(0x0020, 0x0013), VR::IS, "42 "));
        dataset.put(text_element(Tag(0x0010, 0x1030), VR::DS, "70.5 "));
        assert_eq!(dataset.int32(Tag(0x0020, 0x0013)).unwrap(), 42);
        assert_eq!(dataset.float64(Tag(0x0010, 0x1030)).unwrap(), 70.5);
    }

    #[test]
    fn missing_elements_are_reported() {
        let dataset = Dataset::new();
        assert!(matches!(
            dataset.string(Tag(0x0010, 0x0010)),
            Err(AccessError::NoSuchDataElement { .. })
        ));
    }

    #[test]
    fn context_cache_tracks_inserts() {
        let mut dataset = Dataset::new();
        dataset.put(DataElement::new(
            tags::BITS_ALLOCATED,
            VR::US,
            Value::Primitive(RawValue::from_u16s(&[16], Endianness::Little)),
        ));
        dataset.put(DataElement::new(
            tags::PIXEL_REPRESENTATION,
            VR::US,
            Value::Primitive(RawValue::from_u16s(&[1], Endianness::Little)),
        ));
        assert_eq!(dataset.bits_allocated(), Some(16));
        assert_eq!(dataset.pixel_representation(), Some(1));

        let item = Dataset::new_item(&dataset);
        assert_eq!(item.depth(), 1);
        assert_eq!(item.bits_allocated(), Some(16));
    }

    #[test]
    fn private_creator_slots() {
        let mut dataset = Dataset::new();
        dataset.put(text_element(Tag(0x0009, 0x0010), VR::LO, "ACME 1.1 "));
        assert_eq!(dataset.private_creator(0x0009, 0x10), Some("ACME 1.1"));
        assert_eq!(dataset.private_creator(0x0009, 0x11), None);
    }

    #[test]
    fn compacted_repacks_creator_slots() {
        let mut dataset = Dataset::new();
        dataset.put(text_element(Tag(0x0009, 0x0012), VR::LO, "VENDOR A"));
        dataset.put(text_element(Tag(0x0009, 0x0015), VR::LO, "VENDOR B"));
        dataset.put(text_element(Tag(0x0009, 0x1201), VR::LO, "a"));
        dataset.put(text_element(Tag(0x0009, 0x1502), VR::LO, "b"));

        let compact = dataset.compacted();
        assert_eq!(compact.private_creator(0x0009, 0x10), Some("VENDOR A"));
        assert_eq!(compact.private_creator(0x0009, 0x11), Some("VENDOR B"));
        assert_eq!(
            compact.string(Tag(0x0009, 0x1001)).unwrap(),
            "a",
        );
        assert_eq!(
            compact.string(Tag(0x0009, 0x1102)).unwrap(),
            "b",
        );
        assert!(compact.get(Tag(0x0009, 0x1201)).is_none());
    }

    #[test]
    fn clone_to_owned_severs_the_source() {
        let buffer = Bytes::from_static(b"Doe^JohnXXXX");
        let mut dataset = Dataset::new();
        dataset.put(DataElement::new(
            Tag(0x0010, 0x0010),
            VR::PN,
            Value::Primitive(RawValue::new(buffer.slice(0..8), Endianness::Little)),
        ));

        let owned = dataset.clone_to_owned();
        assert_eq!(owned, dataset);
        let original = match dataset.get(Tag(0x0010, 0x0010)).unwrap().value() {
            Value::Primitive(v) => v.as_slice().as_ptr(),
            _ => unreachable!(),
        };
        let copied = match owned.get(Tag(0x0010, 0x0010)).unwrap().value() {
            Value::Primitive(v) => v.as_slice().as_ptr(),
            _ => unreachable!(),
        };
        assert_ne!(original, copied);
    }
}
