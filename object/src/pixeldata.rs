//! Materialisation of the pixel data load policy:
//! skipped pixel markers, lazily loaded pixel payloads,
//! and frame-level access over both native and encapsulated data.

use bytes::Bytes;
use dcmkit_core::{DataElementHeader, Endianness};
use snafu::{Backtrace, OptionExt, ResultExt, Snafu};
use std::io::{Read, Seek, SeekFrom};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, OnceLock};

/// Object-safe bound for a pixel data source:
/// a seekable reader which can cross threads.
pub trait ReadSeek: Read + Seek + Send {}
impl<T: Read + Seek + Send> ReadSeek for T {}

/// A shared handle to the source stream holding deferred pixel data.
pub type PixelSource = Arc<Mutex<dyn ReadSeek>>;

/// An error raised when accessing pixel data.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
#[non_exhaustive]
pub enum PixelError {
    /// The pixel data was passed over at read time
    /// under the skip policy.
    #[snafu(display("pixel data was skipped at read time and holds no bytes"))]
    Skipped { backtrace: Backtrace },

    /// The deferred payload has no source bound to it.
    #[snafu(display("deferred pixel data is not bound to a source stream"))]
    NotBound { backtrace: Backtrace },

    /// The requested frame number does not exist.
    #[snafu(display("frame {} is out of range ({} frames available)", index, available))]
    FrameOutOfRange {
        index: usize,
        available: usize,
        backtrace: Backtrace,
    },

    /// The image description elements required for frame
    /// arithmetic are missing.
    #[snafu(display("missing image description for frame access"))]
    MissingImageDescription { backtrace: Backtrace },

    /// The basic offset table is empty and the fragments cannot be
    /// assigned to frames by convention; the caller must supply
    /// its own frame-to-fragment mapping.
    #[snafu(display(
        "cannot map {} fragments onto {} frames without an offset table",
        fragments,
        frames
    ))]
    FrameMappingUnknown {
        fragments: usize,
        frames: usize,
        backtrace: Backtrace,
    },

    /// The source stream failed.
    #[snafu(display("could not read pixel data from the source stream"))]
    ReadSource {
        backtrace: Backtrace,
        source: std::io::Error,
    },
}

pub type Result<T, E = PixelError> = std::result::Result<T, E>;

/// The load state of a deferred pixel payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadState {
    /// No bytes have been fetched from the source yet.
    NotLoaded,
    /// At least one access has materialised bytes from the source.
    Loaded,
}

/// The image description gathered for frame arithmetic,
/// as accumulated from the data set.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct ImageDescription {
    /// Number of rows in each frame.
    pub rows: Option<u16>,
    /// Number of columns in each frame.
    pub columns: Option<u16>,
    /// Bits allocated per sample.
    pub bits_allocated: Option<u16>,
    /// Samples per pixel.
    pub samples_per_pixel: Option<u16>,
    /// Declared number of frames.
    pub number_of_frames: Option<u32>,
}

impl ImageDescription {
    /// The byte length of one native frame:
    /// `rows × columns × samples per pixel × ⌈bits allocated / 8⌉`.
    pub fn frame_length(&self) -> Option<u64> {
        let rows = u64::from(self.rows?);
        let columns = u64::from(self.columns?);
        let samples = u64::from(self.samples_per_pixel.unwrap_or(1));
        let bytes_per_sample = (u64::from(self.bits_allocated?) + 7) / 8;
        Some(rows * columns * samples * bytes_per_sample)
    }
}

/// The location of one encapsulated fragment in the source stream.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FragmentPosition {
    /// Offset of the fragment's item header relative to the first
    /// byte after the basic offset table item, as used by the
    /// offset table.
    pub relative_offset: u32,
    /// Absolute position of the fragment's first value byte
    /// in the source stream.
    pub offset: u64,
    /// The fragment length in bytes.
    pub length: u32,
}

/// The fragment layout of deferred encapsulated pixel data.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DeferredFragments {
    /// The basic offset table, possibly empty.
    pub offset_table: Vec<u32>,
    /// The fragment positions, in source order.
    pub fragments: Vec<FragmentPosition>,
}

/// A pixel data payload whose bytes are still in the source stream:
/// the metadata needed to locate and slice it,
/// plus a handle to the stream bound after parsing completes.
pub struct LazyPixelData {
    header: DataElementHeader,
    /// absolute position of the first value byte (native data)
    offset: u64,
    /// the declared value length (native data)
    length: u32,
    /// the byte order the pixel samples were encoded in
    endianness: Endianness,
    /// fragment layout, for encapsulated pixel data
    fragments: Option<DeferredFragments>,
    description: ImageDescription,
    source: OnceLock<PixelSource>,
    accessed: AtomicBool,
}

impl std::fmt::Debug for LazyPixelData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LazyPixelData")
            .field("header", &self.header)
            .field("offset", &self.offset)
            .field("length", &self.length)
            .field("fragments", &self.fragments)
            .field("description", &self.description)
            .field("bound", &self.source.get().is_some())
            .field("load_state", &self.load_state())
            .finish()
    }
}

impl Clone for LazyPixelData {
    fn clone(&self) -> Self {
        let source = OnceLock::new();
        if let Some(s) = self.source.get() {
            let _ = source.set(Arc::clone(s));
        }
        LazyPixelData {
            header: self.header,
            offset: self.offset,
            length: self.length,
            endianness: self.endianness,
            fragments: self.fragments.clone(),
            description: self.description,
            source,
            accessed: AtomicBool::new(self.accessed.load(Ordering::Relaxed)),
        }
    }
}

/// Payload identity is the source location, not the load state.
impl PartialEq for LazyPixelData {
    fn eq(&self, other: &Self) -> bool {
        self.header == other.header
            && self.offset == other.offset
            && self.length == other.length
            && self.fragments == other.fragments
    }
}

impl LazyPixelData {
    /// Describe a native pixel data element left in the source.
    pub fn native(
        header: DataElementHeader,
        offset: u64,
        length: u32,
        endianness: Endianness,
        description: ImageDescription,
    ) -> Self {
        LazyPixelData {
            header,
            offset,
            length,
            endianness,
            fragments: None,
            description,
            source: OnceLock::new(),
            accessed: AtomicBool::new(false),
        }
    }

    /// Describe an encapsulated pixel data element left in the source.
    pub fn encapsulated(
        header: DataElementHeader,
        fragments: DeferredFragments,
        description: ImageDescription,
    ) -> Self {
        LazyPixelData {
            header,
            offset: 0,
            length: 0,
            endianness: Endianness::Little,
            fragments: Some(fragments),
            description,
            source: OnceLock::new(),
            accessed: AtomicBool::new(false),
        }
    }

    /// The element header of the deferred pixel data.
    pub fn header(&self) -> &DataElementHeader {
        &self.header
    }

    /// The byte order the pixel samples were encoded in.
    pub fn endianness(&self) -> Endianness {
        self.endianness
    }

    /// The image description used for frame arithmetic.
    pub fn description(&self) -> &ImageDescription {
        &self.description
    }

    /// The fragment layout, for encapsulated pixel data.
    pub fn deferred_fragments(&self) -> Option<&DeferredFragments> {
        self.fragments.as_ref()
    }

    /// Bind the source stream this payload reads from.
    /// Subsequent bindings are ignored.
    pub fn bind_source(&self, source: PixelSource) {
        let _ = self.source.set(source);
    }

    /// Whether any bytes have been materialised from the source.
    pub fn load_state(&self) -> LoadState {
        if self.accessed.load(Ordering::Relaxed) {
            LoadState::Loaded
        } else {
            LoadState::NotLoaded
        }
    }

    /// The number of frames that can be addressed through
    /// [`frame`](LazyPixelData::frame).
    pub fn frame_count(&self) -> Result<usize> {
        match &self.fragments {
            None => {
                let frame_len = self
                    .description
                    .frame_length()
                    .context(MissingImageDescriptionSnafu)?;
                if frame_len == 0 {
                    return Ok(0);
                }
                Ok((u64::from(self.length) / frame_len) as usize)
            }
            Some(layout) => {
                if !layout.offset_table.is_empty() {
                    return Ok(layout.offset_table.len());
                }
                let declared = self.description.number_of_frames.unwrap_or(1) as usize;
                if layout.fragments.len() == declared {
                    Ok(declared)
                } else {
                    FrameMappingUnknownSnafu {
                        fragments: layout.fragments.len(),
                        frames: declared,
                    }
                    .fail()
                }
            }
        }
    }

    fn read_at(&self, offset: u64, length: usize) -> Result<Bytes> {
        let source = self.source.get().context(NotBoundSnafu)?;
        let mut guard = source.lock().expect("pixel data source lock poisoned");
        guard
            .seek(SeekFrom::Start(offset))
            .context(ReadSourceSnafu)?;
        let mut buf = vec![0u8; length];
        guard.read_exact(&mut buf).context(ReadSourceSnafu)?;
        self.accessed.store(true, Ordering::Relaxed);
        Ok(Bytes::from(buf))
    }

    /// Fetch the bytes of frame `index` from the source stream,
    /// seeking on first use.
    ///
    /// For native pixel data the frame is a plain slice of the
    /// value. For encapsulated pixel data the frame is the
    /// concatenation of the fragments assigned to it by the basic
    /// offset table, or the fragment of the same rank when the
    /// table is empty and fragments map one-to-one onto frames.
    pub fn frame(&self, index: usize) -> Result<Bytes> {
        match &self.fragments {
            None => {
                let frame_len = self
                    .description
                    .frame_length()
                    .context(MissingImageDescriptionSnafu)?;
                let available = if frame_len == 0 {
                    0
                } else {
                    (u64::from(self.length) / frame_len) as usize
                };
                if index >= available {
                    return FrameOutOfRangeSnafu { index, available }.fail();
                }
                self.read_at(
                    self.offset + index as u64 * frame_len,
                    frame_len as usize,
                )
            }
            Some(layout) => {
                let runs = self.frame_fragments(layout, index)?;
                let mut out = Vec::new();
                for fragment in runs {
                    let data = self.read_at(fragment.offset, fragment.length as usize)?;
                    out.extend_from_slice(&data);
                }
                Ok(Bytes::from(out))
            }
        }
    }

    /// Fetch the whole pixel data value from the source stream.
    pub fn load(&self) -> Result<Bytes> {
        match &self.fragments {
            None => self.read_at(self.offset, self.length as usize),
            Some(layout) => {
                let mut out = Vec::new();
                for fragment in &layout.fragments {
                    let data = self.read_at(fragment.offset, fragment.length as usize)?;
                    out.extend_from_slice(&data);
                }
                Ok(Bytes::from(out))
            }
        }
    }

    /// Fetch the bytes of one fragment by rank.
    pub fn fragment(&self, index: usize) -> Result<Bytes> {
        let layout = self.fragments.as_ref().context(MissingImageDescriptionSnafu)?;
        let fragment = layout
            .fragments
            .get(index)
            .context(FrameOutOfRangeSnafu {
                index,
                available: layout.fragments.len(),
            })?;
        self.read_at(fragment.offset, fragment.length as usize)
    }

    fn frame_fragments<'a>(
        &self,
        layout: &'a DeferredFragments,
        index: usize,
    ) -> Result<Vec<&'a FragmentPosition>> {
        if layout.offset_table.is_empty() {
            let declared = self.description.number_of_frames.unwrap_or(1) as usize;
            if layout.fragments.len() == declared {
                let fragment = layout
                    .fragments
                    .get(index)
                    .context(FrameOutOfRangeSnafu {
                        index,
                        available: declared,
                    })?;
                return Ok(vec![fragment]);
            }
            return FrameMappingUnknownSnafu {
                fragments: layout.fragments.len(),
                frames: declared,
            }
            .fail();
        }

        let available = layout.offset_table.len();
        if index >= available {
            return FrameOutOfRangeSnafu { index, available }.fail();
        }
        let start = layout.offset_table[index];
        let end = layout.offset_table.get(index + 1).copied().unwrap_or(u32::MAX);
        let runs: Vec<_> = layout
            .fragments
            .iter()
            .filter(|f| f.relative_offset >= start && f.relative_offset < end)
            .collect();
        Ok(runs)
    }
}

/// The deferred pixel data payload of a data element:
/// either passed over entirely, or parked in the source.
#[derive(Debug, Clone, PartialEq)]
pub enum PixelPayload {
    /// The pixel data was skipped at read time;
    /// the element is present but holds no bytes.
    Skipped {
        /// the original element header
        header: DataElementHeader,
    },
    /// The pixel data is still in the source stream.
    Lazy(LazyPixelData),
}

impl PixelPayload {
    /// The load state of the payload.
    /// Skipped payloads can never be loaded.
    pub fn load_state(&self) -> LoadState {
        match self {
            PixelPayload::Skipped { .. } => LoadState::NotLoaded,
            PixelPayload::Lazy(lazy) => lazy.load_state(),
        }
    }

    /// Access the lazily loaded payload,
    /// failing for skipped pixel data.
    pub fn lazy(&self) -> Result<&LazyPixelData> {
        match self {
            PixelPayload::Skipped { .. } => SkippedSnafu.fail(),
            PixelPayload::Lazy(lazy) => Ok(lazy),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dcmkit_core::{Length, Tag, VR};
    use std::io::Cursor;

    fn description_128x128() -> ImageDescription {
        ImageDescription {
            rows: Some(128),
            columns: Some(128),
            bits_allocated: Some(8),
            samples_per_pixel: Some(1),
            number_of_frames: Some(1),
        }
    }

    #[test]
    fn frame_length_arithmetic() {
        assert_eq!(description_128x128().frame_length(), Some(16384));
        let twelve_bit = ImageDescription {
            rows: Some(4),
            columns: Some(4),
            bits_allocated: Some(12),
            samples_per_pixel: Some(1),
            number_of_frames: None,
        };
        // 12 bits allocated round up to 2 bytes per sample
        assert_eq!(twelve_bit.frame_length(), Some(32));
    }

    #[test]
    fn lazy_native_frame_access() {
        let mut content = vec![0u8; 100];
        content.extend((0..16384u32).map(|i| (i % 251) as u8));
        let payload = LazyPixelData::native(
            DataElementHeader::new(Tag(0x7FE0, 0x0010), VR::OB, Length(16384)),
            100,
            16384,
            Endianness::Little,
            description_128x128(),
        );

        assert_eq!(payload.load_state(), LoadState::NotLoaded);
        // access before binding is an error
        assert!(matches!(payload.frame(0), Err(PixelError::NotBound { .. })));

        payload.bind_source(Arc::new(Mutex::new(Cursor::new(content.clone()))));
        let frame = payload.frame(0).unwrap();
        assert_eq!(frame.len(), 16384);
        assert_eq!(&frame[..], &content[100..]);
        assert_eq!(payload.load_state(), LoadState::Loaded);

        assert!(matches!(
            payload.frame(1),
            Err(PixelError::FrameOutOfRange {
                index: 1,
                available: 1,
                ..
            })
        ));
    }

    #[test]
    fn lazy_encapsulated_frame_access() {
        // two frames, one fragment each, at source offsets 8 and 20
        let source: Vec<u8> = (0..32).collect();
        let layout = DeferredFragments {
            offset_table: vec![0, 12],
            fragments: vec![
                FragmentPosition {
                    relative_offset: 0,
                    offset: 8,
                    length: 4,
                },
                FragmentPosition {
                    relative_offset: 12,
                    offset: 20,
                    length: 4,
                },
            ],
        };
        let payload = LazyPixelData::encapsulated(
            DataElementHeader::new(Tag(0x7FE0, 0x0010), VR::OB, Length::UNDEFINED),
            layout,
            ImageDescription {
                number_of_frames: Some(2),
                ..Default::default()
            },
        );
        payload.bind_source(Arc::new(Mutex::new(Cursor::new(source))));

        assert_eq!(&payload.frame(0).unwrap()[..], &[8, 9, 10, 11]);
        assert_eq!(&payload.frame(1).unwrap()[..], &[20, 21, 22, 23]);
        assert!(payload.frame(2).is_err());
    }

    #[test]
    fn empty_offset_table_convention() {
        let layout = DeferredFragments {
            offset_table: vec![],
            fragments: vec![
                FragmentPosition {
                    relative_offset: 0,
                    offset: 0,
                    length: 2,
                },
                FragmentPosition {
                    relative_offset: 10,
                    offset: 10,
                    length: 2,
                },
            ],
        };
        // fragment count does not match the declared frame count
        let payload = LazyPixelData::encapsulated(
            DataElementHeader::new(Tag(0x7FE0, 0x0010), VR::OB, Length::UNDEFINED),
            layout,
            ImageDescription {
                number_of_frames: Some(3),
                ..Default::default()
            },
        );
        payload.bind_source(Arc::new(Mutex::new(Cursor::new(vec![0u8; 16]))));
        assert!(matches!(
            payload.frame(0),
            Err(PixelError::FrameMappingUnknown {
                fragments: 2,
                frames: 3,
                ..
            })
        ));
    }

    #[test]
    fn skipped_payload_access_fails() {
        let payload = PixelPayload::Skipped {
            header: DataElementHeader::new(Tag(0x7FE0, 0x0010), VR::OW, Length(100)),
        };
        assert_eq!(payload.load_state(), LoadState::NotLoaded);
        assert!(matches!(payload.lazy(), Err(PixelError::Skipped { .. })));
    }
}
