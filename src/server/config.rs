//! Server configuration

use std::net::SocketAddr;
use std::time::Duration;

use crate::source::FrameSize;

/// Highest JPEG quality index the encoder accepts
const MAX_JPEG_QUALITY: u8 = 63;

/// Server configuration options
///
/// Everything here is decided at startup; there is no runtime
/// reconfiguration surface.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind to
    pub bind_addr: SocketAddr,

    /// Target capture and base service rate in frames per second
    pub frame_rate: u32,

    /// Client queue capacity; admissions beyond this are silently dropped
    pub max_clients: usize,

    /// Capture resolution applied to the source at startup
    pub frame_size: FrameSize,

    /// JPEG encoder quality (0-63, lower is higher quality)
    pub jpeg_quality: u8,

    /// Enable TCP_NODELAY (disable Nagle's algorithm)
    pub tcp_nodelay: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8080".parse().unwrap(),
            frame_rate: 30,
            max_clients: 10,
            frame_size: FrameSize::default(),
            jpeg_quality: 12,
            tcp_nodelay: true, // Important for low latency
        }
    }
}

impl ServerConfig {
    /// Create a new config with custom bind address
    pub fn with_addr(addr: SocketAddr) -> Self {
        Self {
            bind_addr: addr,
            ..Default::default()
        }
    }

    /// Set the bind address
    pub fn bind(mut self, addr: SocketAddr) -> Self {
        self.bind_addr = addr;
        self
    }

    /// Set the target frame rate (floored at 1 fps)
    pub fn frame_rate(mut self, rate: u32) -> Self {
        self.frame_rate = rate.max(1);
        self
    }

    /// Set the client queue capacity
    pub fn max_clients(mut self, max: usize) -> Self {
        self.max_clients = max;
        self
    }

    /// Set the capture resolution
    pub fn frame_size(mut self, size: FrameSize) -> Self {
        self.frame_size = size;
        self
    }

    /// Set the JPEG quality, capped at the encoder maximum
    pub fn jpeg_quality(mut self, quality: u8) -> Self {
        self.jpeg_quality = quality.min(MAX_JPEG_QUALITY);
        self
    }

    /// Capture period derived from the frame rate
    pub fn frame_period(&self) -> Duration {
        Duration::from_secs(1) / self.frame_rate.max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();

        assert_eq!(config.bind_addr.port(), 8080);
        assert_eq!(config.frame_rate, 30);
        assert_eq!(config.max_clients, 10);
        assert_eq!(config.frame_size, FrameSize::Svga);
        assert_eq!(config.jpeg_quality, 12);
        assert!(config.tcp_nodelay);
    }

    #[test]
    fn test_with_addr() {
        let addr: SocketAddr = "127.0.0.1:8081".parse().unwrap();
        let config = ServerConfig::with_addr(addr);

        assert_eq!(config.bind_addr.port(), 8081);
    }

    #[test]
    fn test_builder_frame_rate_floor() {
        let config = ServerConfig::default().frame_rate(0);

        assert_eq!(config.frame_rate, 1);
    }

    #[test]
    fn test_builder_jpeg_quality_capped() {
        let config = ServerConfig::default().jpeg_quality(255);

        assert_eq!(config.jpeg_quality, 63);
    }

    #[test]
    fn test_frame_period() {
        let config = ServerConfig::default().frame_rate(30);
        let period = config.frame_period();

        // 30 fps is a 33.3 ms period
        assert_eq!(period, Duration::from_secs(1) / 30);
        assert!(period > Duration::from_millis(33));
        assert!(period < Duration::from_millis(34));
    }

    #[test]
    fn test_builder_chaining() {
        let addr: SocketAddr = "127.0.0.1:9090".parse().unwrap();
        let config = ServerConfig::default()
            .bind(addr)
            .frame_rate(15)
            .max_clients(4)
            .frame_size(FrameSize::Vga)
            .jpeg_quality(20);

        assert_eq!(config.bind_addr, addr);
        assert_eq!(config.frame_rate, 15);
        assert_eq!(config.max_clients, 4);
        assert_eq!(config.frame_size, FrameSize::Vga);
        assert_eq!(config.jpeg_quality, 20);
    }
}
