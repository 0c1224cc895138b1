//! Conversion of in-memory data sets into data set token streams,
//! with either delimited or precomputed (defined) lengths.

use crate::mem::{Dataset, Element};
use crate::pixeldata::{PixelError, PixelPayload};
use dcmkit_core::header::Header;
use dcmkit_core::value::{RawValue, Value};
use dcmkit_core::{DataElementHeader, Length, Tag, VR};
use dcmkit_parser::dataset::DataToken;
use snafu::{Backtrace, ResultExt, Snafu};

/// How sequence and item lengths are emitted on write.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum SequenceLengthMode {
    /// Every item and sequence byte count is computed ahead
    /// and written as a fixed length, with no delimiters.
    Defined,
    /// Items and sequences declare the undefined length sentinel
    /// and are closed by delimitation items.
    #[default]
    Delimited,
}

/// An error raised while tokenizing a data set for writing.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
#[non_exhaustive]
pub enum TokenError {
    /// Skipped pixel data holds no bytes to serialize.
    #[snafu(display(
        "pixel data of {} was skipped at read time and cannot be written",
        tag
    ))]
    SkippedPixelData { tag: Tag, backtrace: Backtrace },

    /// Deferred pixel data could not be fetched from its source.
    #[snafu(display("could not load deferred pixel data of {}", tag))]
    LoadPixelData {
        tag: Tag,
        #[snafu(backtrace)]
        source: PixelError,
    },
}

pub(crate) type Result<T, E = TokenError> = std::result::Result<T, E>;

fn even(len: usize) -> u32 {
    (len as u32 + 1) & !1
}

fn header_len(vr: VR, explicit_vr: bool) -> u64 {
    if explicit_vr && vr.is_long_form() {
        12
    } else {
        8
    }
}

/// The total encoded byte count of one element under defined
/// lengths, header included.
fn element_total_len(element: &Element, explicit_vr: bool) -> Result<u64> {
    let vr = element.vr();
    match element.value() {
        Value::Primitive(value) => {
            Ok(header_len(vr, explicit_vr) + u64::from(even(value.len())))
        }
        Value::Sequence(seq) => {
            let mut len = header_len(VR::SQ, explicit_vr);
            for item in seq.items() {
                len += 8 + item_content_len(item, explicit_vr)?;
            }
            Ok(len)
        }
        Value::PixelSequence(ps) => {
            // encapsulated pixel data is always delimited
            let mut len = header_len(VR::OB, explicit_vr);
            len += 8 + ps.offset_table().len() as u64 * 4;
            for fragment in ps.fragments() {
                len += 8 + u64::from(even(fragment.len()));
            }
            Ok(len + 8)
        }
        Value::Pixel(PixelPayload::Skipped { .. }) => SkippedPixelDataSnafu {
            tag: element.tag(),
        }
        .fail(),
        Value::Pixel(PixelPayload::Lazy(lazy)) => {
            match lazy.header().len.get() {
                Some(len) => Ok(header_len(vr, explicit_vr) + u64::from((len + 1) & !1)),
                None => {
                    // deferred encapsulated data; structure mirrors
                    // the in-memory fragment sequence above
                    let layout = lazy.deferred_fragments().cloned().unwrap_or_default();
                    let mut total = header_len(VR::OB, explicit_vr);
                    total += 8 + layout.offset_table.len() as u64 * 4;
                    for fragment in &layout.fragments {
                        total += 8 + u64::from((fragment.length + 1) & !1);
                    }
                    Ok(total + 8)
                }
            }
        }
    }
}

fn item_content_len(item: &Dataset, explicit_vr: bool) -> Result<u64> {
    let mut len = 0;
    for element in item.iter() {
        len += element_total_len(element, explicit_vr)?;
    }
    Ok(len)
}

/// Produce the token stream of the data set in ascending tag order.
pub(crate) fn dataset_tokens(
    dataset: &Dataset,
    mode: SequenceLengthMode,
    explicit_vr: bool,
) -> Result<Vec<DataToken>> {
    let mut tokens = Vec::new();
    push_dataset(dataset, mode, explicit_vr, &mut tokens)?;
    Ok(tokens)
}

fn push_dataset(
    dataset: &Dataset,
    mode: SequenceLengthMode,
    explicit_vr: bool,
    tokens: &mut Vec<DataToken>,
) -> Result<()> {
    for element in dataset.iter() {
        push_element(element, mode, explicit_vr, tokens)?;
    }
    Ok(())
}

fn push_element(
    element: &Element,
    mode: SequenceLengthMode,
    explicit_vr: bool,
    tokens: &mut Vec<DataToken>,
) -> Result<()> {
    let tag = element.tag();
    match element.value() {
        Value::Primitive(value) => {
            let header = DataElementHeader::new(tag, element.vr(), Length(even(value.len())));
            tokens.push(DataToken::ElementHeader(header));
            tokens.push(DataToken::PrimitiveValue(value.clone()));
        }
        Value::Sequence(seq) => {
            let seq_len = match mode {
                SequenceLengthMode::Delimited => Length::UNDEFINED,
                SequenceLengthMode::Defined => {
                    let mut len = 0;
                    for item in seq.items() {
                        len += 8 + item_content_len(item, explicit_vr)?;
                    }
                    Length(len as u32)
                }
            };
            tokens.push(DataToken::SequenceStart { tag, len: seq_len });
            for item in seq.items() {
                let item_len = match mode {
                    SequenceLengthMode::Delimited => Length::UNDEFINED,
                    SequenceLengthMode::Defined => {
                        Length(item_content_len(item, explicit_vr)? as u32)
                    }
                };
                tokens.push(DataToken::ItemStart { len: item_len });
                push_dataset(item, mode, explicit_vr, tokens)?;
                tokens.push(DataToken::ItemEnd);
            }
            tokens.push(DataToken::SequenceEnd);
        }
        Value::PixelSequence(ps) => {
            tokens.push(DataToken::PixelSequenceStart { tag });
            tokens.push(DataToken::OffsetTable(ps.offset_table().to_vec()));
            for fragment in ps.fragments() {
                tokens.push(DataToken::ItemValue(fragment.clone()));
            }
            tokens.push(DataToken::SequenceEnd);
        }
        Value::Pixel(PixelPayload::Skipped { .. }) => {
            return SkippedPixelDataSnafu { tag }.fail();
        }
        Value::Pixel(PixelPayload::Lazy(lazy)) => {
            if let Some(layout) = lazy.deferred_fragments() {
                tokens.push(DataToken::PixelSequenceStart { tag });
                tokens.push(DataToken::OffsetTable(layout.offset_table.clone()));
                for index in 0..layout.fragments.len() {
                    let data = lazy
                        .fragment(index)
                        .context(LoadPixelDataSnafu { tag })?;
                    tokens.push(DataToken::ItemValue(data));
                }
                tokens.push(DataToken::SequenceEnd);
            } else {
                let data = lazy.load().context(LoadPixelDataSnafu { tag })?;
                let header =
                    DataElementHeader::new(tag, element.vr(), Length(even(data.len())));
                tokens.push(DataToken::ElementHeader(header));
                tokens.push(DataToken::PrimitiveValue(RawValue::new(
                    data,
                    lazy.endianness(),
                )));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use dcmkit_core::value::DataSetSequence;
    use dcmkit_core::DataElement;

    fn text_element(tag: Tag, vr: VR, text: &str) -> Element {
        DataElement::new(tag, vr, Value::Primitive(RawValue::from_text(text)))
    }

    #[test]
    fn defined_lengths_are_exact() {
        // item: one LO element of 6 padded bytes -> 8 + 6 = 14
        let mut item = Dataset::new();
        item.put(text_element(Tag(0x0010, 0x0020), VR::LO, "ITEM1 "));

        let mut dataset = Dataset::new();
        dataset.put(DataElement::new(
            Tag(0x0008, 0x1115),
            VR::SQ,
            Value::Sequence(DataSetSequence::new(vec![item], Length::UNDEFINED)),
        ));

        let tokens = dataset_tokens(&dataset, SequenceLengthMode::Defined, true).unwrap();
        assert_eq!(
            tokens[0],
            DataToken::SequenceStart {
                tag: Tag(0x0008, 0x1115),
                // item header (8) + element (8 + 6)
                len: Length(22),
            }
        );
        assert_eq!(tokens[1], DataToken::ItemStart { len: Length(14) });
    }

    #[test]
    fn delimited_mode_uses_the_sentinel() {
        let mut item = Dataset::new();
        item.put(text_element(Tag(0x0010, 0x0020), VR::LO, "ITEM1 "));
        let mut dataset = Dataset::new();
        dataset.put(DataElement::new(
            Tag(0x0008, 0x1115),
            VR::SQ,
            Value::Sequence(DataSetSequence::new(vec![item], Length::UNDEFINED)),
        ));

        let tokens = dataset_tokens(&dataset, SequenceLengthMode::Delimited, true).unwrap();
        assert_eq!(
            tokens[0],
            DataToken::SequenceStart {
                tag: Tag(0x0008, 0x1115),
                len: Length::UNDEFINED,
            }
        );
        assert!(matches!(tokens.last(), Some(DataToken::SequenceEnd)));
    }

    #[test]
    fn odd_primitive_values_declare_padded_lengths() {
        let mut dataset = Dataset::new();
        dataset.put(text_element(Tag(0x0010, 0x0020), VR::LO, "ODD"));
        let tokens = dataset_tokens(&dataset, SequenceLengthMode::Delimited, true).unwrap();
        assert_eq!(
            tokens[0],
            DataToken::ElementHeader(DataElementHeader::new(
                Tag(0x0010, 0x0020),
                VR::LO,
                Length(4)
            ))
        );
    }
}
