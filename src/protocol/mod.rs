//! HTTP wire formats
//!
//! The server speaks a deliberately small slice of HTTP: it reads one
//! request line, then writes one of three fixed responses. This module
//! holds the request reader and the exact response bytes for the multipart
//! stream, the single JPEG image, and the plain-text help page.

pub mod multipart;
pub mod request;
pub mod response;

pub use multipart::{frame_part_header, BOUNDARY, BOUNDARY_DELIMITER, STREAM_PREAMBLE};
pub use request::{read_request, Request, MAX_HEADER_BYTES};
pub use response::{help_response, SINGLE_IMAGE_PREAMBLE};
