//! Everything that happens before the quality pipeline sees a dump: reading
//! and inflating the file, telling the two formats apart and decoding the JSON
//! into a [`DumpDocument`].

pub mod decode;
pub mod error;
pub mod format;
pub mod loader;
pub mod types;

pub use error::DumpError;
pub use format::{detect, DumpFormat};
pub use types::{ConnectionTrace, DumpDocument, SparseSeries, SparseTrace, TraceEvent};
