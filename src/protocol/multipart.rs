//! Multipart stream wire format
//!
//! The stream endpoint replies with a `multipart/x-mixed-replace` response:
//! a fixed preamble followed by an unbounded sequence of JPEG parts, each
//! terminated by the boundary delimiter. Browsers replace the displayed
//! image on every part, which is what turns the sequence into live video.

use std::fmt::Write;

use bytes::{Bytes, BytesMut};

/// Fixed multipart boundary token
pub const BOUNDARY: &str = "frame";

/// Boundary delimiter written after every part
pub const BOUNDARY_DELIMITER: &[u8] = b"\r\n--frame\r\n";

/// Response preamble sent once on stream admission
///
/// Status line, permissive CORS header and the multipart content type,
/// followed immediately by the first boundary delimiter. The delimiter's
/// leading `\r\n` doubles as the blank line terminating the header block.
pub const STREAM_PREAMBLE: &[u8] = b"HTTP/1.1 200 OK\r\n\
Access-Control-Allow-Origin: *\r\n\
Content-Type: multipart/x-mixed-replace; boundary=frame\r\n\
\r\n--frame\r\n";

/// Part header for one JPEG frame of the given length
///
/// The part is `header + jpeg bytes + BOUNDARY_DELIMITER`.
pub fn frame_part_header(len: usize) -> Bytes {
    let mut header = BytesMut::with_capacity(64);
    // infallible for BytesMut
    let _ = write!(
        header,
        "Content-Type: image/jpeg\r\nContent-Length: {}\r\n\r\n",
        len
    );
    header.freeze()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preamble_ends_with_delimiter() {
        assert!(STREAM_PREAMBLE.starts_with(b"HTTP/1.1 200 OK\r\n"));
        assert!(STREAM_PREAMBLE.ends_with(BOUNDARY_DELIMITER));
    }

    #[test]
    fn test_preamble_declares_boundary() {
        let text = std::str::from_utf8(STREAM_PREAMBLE).unwrap();
        assert!(text.contains("Content-Type: multipart/x-mixed-replace; boundary=frame\r\n"));
        assert!(text.contains("Access-Control-Allow-Origin: *\r\n"));
    }

    #[test]
    fn test_frame_part_header_exact_bytes() {
        let header = frame_part_header(40000);
        assert_eq!(
            &header[..],
            b"Content-Type: image/jpeg\r\nContent-Length: 40000\r\n\r\n"
        );
    }

    #[test]
    fn test_delimiter_uses_boundary_token() {
        let expected = format!("\r\n--{}\r\n", BOUNDARY);
        assert_eq!(BOUNDARY_DELIMITER, expected.as_bytes());
    }
}
