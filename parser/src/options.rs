//! Reader configuration: envelope policies, recovery policies,
//! structural limits, the pixel data load policy,
//! and cooperative cancellation.

use dcmkit_core::{Length, Tag};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Policy for an envelope part (preamble or file meta group)
/// which may be missing from the input.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum EnvelopePolicy {
    /// The part must be present; fail otherwise.
    Require,
    /// Detect the part heuristically and accept its absence.
    #[default]
    Optional,
    /// Assume the part is absent and do not look for it.
    Ignore,
}

/// Policy for data elements declaring an unknown or
/// inconsistent value representation under explicit VR.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum InvalidVrPolicy {
    /// Fail the parse.
    Throw,
    /// Replace the code with `UN` and continue.
    #[default]
    RemapToUn,
    /// Keep the code exactly as found.
    Preserve,
}

/// Per-instance pixel data handling.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum PixelDataHandling {
    /// Consume the pixel data into memory.
    #[default]
    Eager,
    /// Record the source position and length,
    /// loading frames on first access.
    Lazy,
    /// Advance past the pixel data without retaining it.
    /// Any later access fails with a dedicated error.
    Skip,
    /// Ask a user callback to pick one of the other modes.
    Callback,
}

/// The context handed to a pixel data callback:
/// the image description accumulated up to the pixel data element.
#[derive(Debug, Clone, PartialEq)]
pub struct PixelDataContext {
    /// The pixel data attribute tag.
    pub tag: Tag,
    /// The declared value length (undefined when encapsulated).
    pub length: Length,
    /// Whether the pixel data is encapsulated in fragments.
    pub encapsulated: bool,
    /// Number of rows, if known by this point.
    pub rows: Option<u16>,
    /// Number of columns, if known by this point.
    pub columns: Option<u16>,
    /// Bits allocated per sample, if known by this point.
    pub bits_allocated: Option<u16>,
    /// Samples per pixel, if known by this point.
    pub samples_per_pixel: Option<u16>,
    /// Number of frames, if known by this point.
    pub number_of_frames: Option<u32>,
    /// The transfer syntax UID of the data set.
    pub transfer_syntax_uid: String,
}

/// A callback deciding the pixel data handling for one instance.
/// Returning [`PixelDataHandling::Callback`] is treated as
/// [`PixelDataHandling::Eager`].
pub type PixelDataCallback = Arc<dyn Fn(&PixelDataContext) -> PixelDataHandling + Send + Sync>;

/// A cooperative cancellation handle.
///
/// The reader checks the token at element boundaries and
/// I/O waits; once cancelled, the parse returns a cancelled
/// error without leaving partially decoded elements behind.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    /// Create a new, non-cancelled token.
    pub fn new() -> Self {
        CancelToken::default()
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    /// Check whether cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Configuration for reading DICOM data sets.
///
/// The default configuration reads the whole data set eagerly,
/// remaps unknown value representations to `UN`,
/// and enforces generous structural limits.
#[derive(Clone)]
pub struct ReaderOptions {
    /// Policy for the 128-byte preamble.
    pub preamble: EnvelopePolicy,
    /// Policy for the file meta group.
    pub file_meta_info: EnvelopePolicy,
    /// Policy for unknown value representations under explicit VR.
    pub invalid_vr: InvalidVrPolicy,
    /// Upper bound on any defined element length, in bytes.
    pub max_element_length: u32,
    /// Upper bound on sequence nesting depth.
    pub max_sequence_depth: u32,
    /// Upper bound on the cumulative item count of one parse,
    /// fragments included.
    pub max_total_items: u64,
    /// The pixel data load policy.
    pub pixel_data_handling: PixelDataHandling,
    /// The pixel data decision callback,
    /// consulted when the policy is [`PixelDataHandling::Callback`].
    pub pixel_data_callback: Option<PixelDataCallback>,
    /// Whether private data elements without a registered creator
    /// are kept in the data set.
    pub retain_unknown_private_tags: bool,
    /// Whether a private data element without a registered creator
    /// fails the parse.
    pub fail_on_orphan_private_elements: bool,
    /// Whether re-registration of an occupied private creator slot
    /// fails the parse.
    pub fail_on_duplicate_private_slots: bool,
    /// The cancellation token checked during the parse.
    pub cancellation: CancelToken,
}

impl Default for ReaderOptions {
    fn default() -> Self {
        ReaderOptions {
            preamble: EnvelopePolicy::default(),
            file_meta_info: EnvelopePolicy::default(),
            invalid_vr: InvalidVrPolicy::default(),
            max_element_length: 0xFFFF_FFFE,
            max_sequence_depth: 128,
            max_total_items: 1_000_000,
            pixel_data_handling: PixelDataHandling::default(),
            pixel_data_callback: None,
            retain_unknown_private_tags: true,
            fail_on_orphan_private_elements: false,
            fail_on_duplicate_private_slots: false,
            cancellation: CancelToken::new(),
        }
    }
}

impl fmt::Debug for ReaderOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReaderOptions")
            .field("preamble", &self.preamble)
            .field("file_meta_info", &self.file_meta_info)
            .field("invalid_vr", &self.invalid_vr)
            .field("max_element_length", &self.max_element_length)
            .field("max_sequence_depth", &self.max_sequence_depth)
            .field("max_total_items", &self.max_total_items)
            .field("pixel_data_handling", &self.pixel_data_handling)
            .field(
                "pixel_data_callback",
                &self.pixel_data_callback.as_ref().map(|_| ".."),
            )
            .field(
                "retain_unknown_private_tags",
                &self.retain_unknown_private_tags,
            )
            .field(
                "fail_on_orphan_private_elements",
                &self.fail_on_orphan_private_elements,
            )
            .field(
                "fail_on_duplicate_private_slots",
                &self.fail_on_duplicate_private_slots,
            )
            .finish()
    }
}

impl ReaderOptions {
    /// Create the default reader configuration.
    pub fn new() -> Self {
        ReaderOptions::default()
    }

    /// Set the policy for the 128-byte preamble.
    pub fn preamble(mut self, policy: EnvelopePolicy) -> Self {
        self.preamble = policy;
        self
    }

    /// Set the policy for the file meta group.
    pub fn file_meta_info(mut self, policy: EnvelopePolicy) -> Self {
        self.file_meta_info = policy;
        self
    }

    /// Set the policy for unknown value representations.
    pub fn invalid_vr(mut self, policy: InvalidVrPolicy) -> Self {
        self.invalid_vr = policy;
        self
    }

    /// Set the upper bound on any defined element length.
    pub fn max_element_length(mut self, bytes: u32) -> Self {
        self.max_element_length = bytes;
        self
    }

    /// Set the upper bound on sequence nesting depth.
    pub fn max_sequence_depth(mut self, depth: u32) -> Self {
        self.max_sequence_depth = depth;
        self
    }

    /// Set the upper bound on the cumulative item count.
    pub fn max_total_items(mut self, items: u64) -> Self {
        self.max_total_items = items;
        self
    }

    /// Set the pixel data load policy.
    pub fn pixel_data_handling(mut self, handling: PixelDataHandling) -> Self {
        self.pixel_data_handling = handling;
        self
    }

    /// Set the pixel data decision callback and select the
    /// callback policy.
    pub fn pixel_data_callback(
        mut self,
        callback: impl Fn(&PixelDataContext) -> PixelDataHandling + Send + Sync + 'static,
    ) -> Self {
        self.pixel_data_handling = PixelDataHandling::Callback;
        self.pixel_data_callback = Some(Arc::new(callback));
        self
    }

    /// Set whether unknown private data elements are kept.
    pub fn retain_unknown_private_tags(mut self, retain: bool) -> Self {
        self.retain_unknown_private_tags = retain;
        self
    }

    /// Set whether orphan private data elements fail the parse.
    pub fn fail_on_orphan_private_elements(mut self, fail: bool) -> Self {
        self.fail_on_orphan_private_elements = fail;
        self
    }

    /// Set whether duplicate private creator slots fail the parse.
    pub fn fail_on_duplicate_private_slots(mut self, fail: bool) -> Self {
        self.fail_on_duplicate_private_slots = fail;
        self
    }

    /// Attach a cancellation token.
    pub fn cancellation(mut self, token: CancelToken) -> Self {
        self.cancellation = token;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_style_configuration() {
        let options = ReaderOptions::new()
            .max_sequence_depth(4)
            .max_element_length(1 << 20)
            .pixel_data_handling(PixelDataHandling::Lazy);
        assert_eq!(options.max_sequence_depth, 4);
        assert_eq!(options.max_element_length, 1 << 20);
        assert_eq!(options.pixel_data_handling, PixelDataHandling::Lazy);
    }

    #[test]
    fn cancel_token_is_shared() {
        let token = CancelToken::new();
        let clone = token.clone();
        assert!(!clone.is_cancelled());
        token.cancel();
        assert!(clone.is_cancelled());
    }
}
