//! Image format and I/O services
//!
//! Separates format conversion and payload decoding from the pipeline and
//! handler logic, keeping both independently testable.

mod format;
mod io;

pub use format::OutputFormatHandler;
pub use io::{DecodedPayload, ImageIOService, ALLOWED_IMAGE_MIME_TYPES};
