//! Minimal HTTP request reader
//!
//! Accumulates bytes until the end of the header block and parses the
//! request line. Headers beyond the request line are read and discarded;
//! routing only ever looks at the path.

use std::io;

use bytes::BytesMut;
use tokio::io::{AsyncRead, AsyncReadExt};

/// Upper bound on the size of an accepted header block
pub const MAX_HEADER_BYTES: usize = 8 * 1024;

/// A parsed HTTP request line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    /// Request method (e.g. "GET")
    pub method: String,
    /// Request path (e.g. "/jpg")
    pub path: String,
    /// Protocol version (e.g. "HTTP/1.1")
    pub version: String,
}

/// Read one request from the transport
///
/// Handles fragmented arrival: keeps reading until the `\r\n\r\n` header
/// terminator is seen. Fails with `InvalidData` on a malformed request line
/// or a header block over [`MAX_HEADER_BYTES`], and with `UnexpectedEof` if
/// the peer closes before the terminator.
pub async fn read_request<R>(reader: &mut R) -> io::Result<Request>
where
    R: AsyncRead + Unpin,
{
    let mut buf = BytesMut::with_capacity(1024);

    loop {
        if let Some(end) = find_header_end(&buf) {
            let head = std::str::from_utf8(&buf[..end])
                .map_err(|_| invalid("request is not valid UTF-8"))?;
            let line = head.lines().next().unwrap_or("");
            return parse_request_line(line).ok_or_else(|| invalid("malformed request line"));
        }

        if buf.len() > MAX_HEADER_BYTES {
            return Err(invalid("request header block too large"));
        }

        let n = reader.read_buf(&mut buf).await?;
        if n == 0 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "connection closed before end of request",
            ));
        }
    }
}

/// Parse `METHOD SP PATH SP VERSION`
pub fn parse_request_line(line: &str) -> Option<Request> {
    let mut parts = line.split_whitespace();
    let method = parts.next()?;
    let path = parts.next()?;
    let version = parts.next()?;
    if parts.next().is_some() {
        return None;
    }

    Some(Request {
        method: method.to_string(),
        path: path.to_string(),
        version: version.to_string(),
    })
}

fn find_header_end(buf: &[u8]) -> Option<usize> {
    buf.windows(4).position(|w| w == b"\r\n\r\n")
}

fn invalid(msg: &'static str) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, msg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_read_simple_request() {
        let mut reader = &b"GET / HTTP/1.1\r\nHost: cam\r\n\r\n"[..];
        let request = read_request(&mut reader).await.unwrap();

        assert_eq!(request.method, "GET");
        assert_eq!(request.path, "/");
        assert_eq!(request.version, "HTTP/1.1");
    }

    #[tokio::test]
    async fn test_read_fragmented_request() {
        // Header block arriving in several TCP segments
        let mut reader = tokio_test::io::Builder::new()
            .read(b"GET /jp")
            .read(b"g HTT")
            .read(b"P/1.1\r\nHost: cam\r")
            .read(b"\n\r\n")
            .build();

        let request = read_request(&mut reader).await.unwrap();
        assert_eq!(request.path, "/jpg");
    }

    #[tokio::test]
    async fn test_eof_before_terminator() {
        let mut reader = &b"GET / HTTP/1.1\r\n"[..];
        let err = read_request(&mut reader).await.unwrap_err();

        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }

    #[tokio::test]
    async fn test_oversized_header_block() {
        let junk = vec![b'a'; MAX_HEADER_BYTES + 1];
        let mut reader = tokio_test::io::Builder::new().read(&junk).build();

        let err = read_request(&mut reader).await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    #[tokio::test]
    async fn test_malformed_request_line() {
        let mut reader = &b"NONSENSE\r\n\r\n"[..];
        let err = read_request(&mut reader).await.unwrap_err();

        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    #[test]
    fn test_parse_request_line() {
        let request = parse_request_line("GET /jpg HTTP/1.0").unwrap();
        assert_eq!(request.method, "GET");
        assert_eq!(request.path, "/jpg");
        assert_eq!(request.version, "HTTP/1.0");

        assert!(parse_request_line("GET /").is_none());
        assert!(parse_request_line("GET / HTTP/1.1 extra").is_none());
        assert!(parse_request_line("").is_none());
    }
}
