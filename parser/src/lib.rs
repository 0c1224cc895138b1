//! A middle-level abstraction for parsing and printing DICOM data sets.
//!
//! A data set is interpreted as a stream of [tokens](dataset::DataToken):
//! element headers, primitive values, and structural markers for
//! sequences, items and encapsulated pixel fragments.
//! [`DataSetReader`](dataset::read::DataSetReader) turns a byte source
//! into such a stream, resolving implicit value representations
//! from the dictionary and the surrounding data set context,
//! enforcing the reader's structural limits,
//! and dispatching pixel data according to the configured policy.
//! [`DataSetWriter`](dataset::write::DataSetWriter) performs the
//! inverse transformation.
pub mod dataset;
pub mod options;
pub mod resolve;
pub mod source;
pub mod stateful;

pub use crate::dataset::read::DataSetReader;
pub use crate::dataset::write::DataSetWriter;
pub use crate::dataset::DataToken;
pub use crate::options::{
    CancelToken, EnvelopePolicy, InvalidVrPolicy, PixelDataContext, PixelDataHandling,
    ReaderOptions,
};
pub use crate::source::{ByteSource, BytesSource, ReaderSource};
pub use crate::stateful::StatefulDecoder;
