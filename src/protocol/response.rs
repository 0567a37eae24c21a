//! Single-image and help responses

use std::fmt::Display;

use bytes::Bytes;

/// Preamble for the single-image endpoint
///
/// One JPEG follows the blank line; the connection then closes, so no
/// Content-Length is sent.
pub const SINGLE_IMAGE_PREAMBLE: &[u8] = b"HTTP/1.1 200 OK\r\n\
Content-disposition: inline; filename=capture.jpg\r\n\
Content-Type: image/jpeg\r\n\
\r\n";

/// Plain-text help response for unmatched paths
///
/// Lists the stream and single-picture links built from the address the
/// client reached the server on.
pub fn help_response(addr: &impl Display) -> Bytes {
    let body = format!(
        "Browser Stream Link: http://{addr}/\n\
         Browser Single Picture Link: http://{addr}/jpg\n"
    );
    let response = format!(
        "HTTP/1.1 200 OK\r\nContent-Type: text/plain\r\nContent-Length: {}\r\n\r\n{}",
        body.len(),
        body
    );
    Bytes::from(response)
}
