//! Line-delimited JSON protocol over stdin/stdout.
//!
//! - `envelope`: uniform success / error reply shapes
//! - `stdio`: request decoding and the read-evaluate-reply loop

pub mod envelope;
pub mod stdio;

pub use envelope::{ApiErrorResponse, ApiResponse, ErrorDetail, ResponseMeta};
pub use stdio::{handle_line, serve, Request};
