//! TCP transport layer for FOCAS communication.
//!
//! This module provides the [`TcpTransport`] struct which handles low-level
//! TCP communication with FANUC controllers. The transport layer is completely
//! separated from the protocol layer and only knows about sockets and bytes.
//!
//! # Design
//!
//! - **Protocol agnostic** - Handles only byte transmission, no FOCAS knowledge
//! - **Synchronous** - Blocking send/receive with configurable timeout
//! - **Exact** - Writes are complete and fixed-length reads either fill the
//!   whole buffer or fail; a truncated read is never returned
//!
//! # Constants
//!
//! - [`DEFAULT_FOCAS_PORT`] - Default FOCAS Ethernet port (8193)
//! - [`DEFAULT_TIMEOUT`] - Default control connection timeout (5 seconds)
//! - [`DEFAULT_CLOSE_TIMEOUT`] - Default close handshake timeout (1 second)
//! - [`DEFAULT_TRANSFER_TIMEOUT`] - Default file transfer timeout (1 second)

use std::io::{ErrorKind, Read, Write};
use std::net::{Shutdown, SocketAddr, TcpStream, ToSocketAddrs};
use std::time::Duration;

use crate::error::{FocasError, Result};

/// Default FOCAS Ethernet port.
pub const DEFAULT_FOCAS_PORT: u16 = 8193;

/// Default timeout for the control connection.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Default read timeout while waiting for the close acknowledgment.
pub const DEFAULT_CLOSE_TIMEOUT: Duration = Duration::from_secs(1);

/// Default timeout for file transfer connections.
pub const DEFAULT_TRANSFER_TIMEOUT: Duration = Duration::from_secs(1);

/// Resolves `host:port` to the first matching socket address.
///
/// # Errors
///
/// Returns an I/O error if resolution fails, or `InvalidParameter` if the
/// host resolves to no address.
pub fn resolve(host: &str, port: u16) -> Result<SocketAddr> {
    (host, port)
        .to_socket_addrs()?
        .next()
        .ok_or_else(|| FocasError::invalid_parameter("host", format!("'{host}' has no address")))
}

/// Blocking TCP transport for FOCAS communication.
///
/// The protocol layer doesn't know about sockets; the socket layer doesn't know FOCAS.
pub struct TcpTransport {
    stream: TcpStream,
    remote_addr: SocketAddr,
}

impl TcpTransport {
    /// Connects to the controller and applies `timeout` to connect, reads and writes.
    ///
    /// # Errors
    ///
    /// Returns `FocasError::Timeout` if the connection attempt times out, or an
    /// I/O error if the socket cannot be connected or configured.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use fanuc_focas::TcpTransport;
    /// use std::time::Duration;
    ///
    /// let transport = TcpTransport::connect(
    ///     "192.168.1.10:8193".parse().unwrap(),
    ///     Duration::from_secs(5),
    /// ).unwrap();
    /// ```
    pub fn connect(addr: SocketAddr, timeout: Duration) -> Result<Self> {
        let stream = TcpStream::connect_timeout(&addr, timeout).map_err(FocasError::from_io)?;
        stream.set_read_timeout(Some(timeout))?;
        stream.set_write_timeout(Some(timeout))?;
        stream.set_nodelay(true)?;
        tracing::debug!(%addr, "tcp connected");

        Ok(Self {
            stream,
            remote_addr: addr,
        })
    }

    /// Writes all of `data` or fails.
    pub fn send_all(&mut self, data: &[u8]) -> Result<()> {
        self.stream.write_all(data).map_err(FocasError::from_io)?;
        self.stream.flush().map_err(FocasError::from_io)
    }

    /// Fills `buf` completely, looping over short reads.
    ///
    /// # Errors
    ///
    /// Returns `FocasError::ConnectionClosed` if the peer closes before the
    /// buffer is full and `FocasError::Timeout` if a read times out.
    pub fn recv_exact(&mut self, buf: &mut [u8]) -> Result<()> {
        self.stream.read_exact(buf).map_err(FocasError::from_io)
    }

    /// Reads whatever is available into `buf`; `Ok(0)` means the peer closed.
    pub fn recv_some(&mut self, buf: &mut [u8]) -> Result<usize> {
        loop {
            match self.stream.read(buf) {
                Ok(n) => return Ok(n),
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(FocasError::from_io(e)),
            }
        }
    }

    /// Changes the read timeout for subsequent receives.
    pub fn set_read_timeout(&self, timeout: Duration) -> Result<()> {
        self.stream.set_read_timeout(Some(timeout))?;
        Ok(())
    }

    /// Shuts both directions down, ignoring errors.
    pub fn shutdown(&self) {
        let _ = self.stream.shutdown(Shutdown::Both);
    }

    /// Returns the remote controller address.
    pub fn remote_addr(&self) -> SocketAddr {
        self.remote_addr
    }
}

impl std::fmt::Debug for TcpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TcpTransport")
            .field("remote_addr", &self.remote_addr)
            .field("local_addr", &self.stream.local_addr().ok())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::TcpListener;
    use std::thread;

    fn listener() -> (TcpListener, SocketAddr) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        (listener, addr)
    }

    #[test]
    fn test_default_constants() {
        assert_eq!(DEFAULT_FOCAS_PORT, 8193);
        assert_eq!(DEFAULT_TIMEOUT, Duration::from_secs(5));
        assert!(DEFAULT_CLOSE_TIMEOUT < DEFAULT_TIMEOUT);
        assert!(DEFAULT_TRANSFER_TIMEOUT < DEFAULT_TIMEOUT);
    }

    #[test]
    fn test_resolve_localhost() {
        let addr = resolve("127.0.0.1", 8193).unwrap();
        assert_eq!(addr.port(), 8193);
    }

    #[test]
    fn test_recv_exact_across_short_writes() {
        let (listener, addr) = listener();
        let peer = thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            for part in [&[1u8, 2][..], &[3, 4, 5], &[6]] {
                stream.write_all(part).unwrap();
                stream.flush().unwrap();
                thread::sleep(Duration::from_millis(10));
            }
        });

        let mut transport = TcpTransport::connect(addr, Duration::from_secs(2)).unwrap();
        let mut buf = [0u8; 6];
        transport.recv_exact(&mut buf).unwrap();
        assert_eq!(buf, [1, 2, 3, 4, 5, 6]);
        peer.join().unwrap();
    }

    #[test]
    fn test_recv_exact_peer_closed() {
        let (listener, addr) = listener();
        let peer = thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            stream.write_all(&[1, 2, 3]).unwrap();
        });

        let mut transport = TcpTransport::connect(addr, Duration::from_secs(2)).unwrap();
        peer.join().unwrap();
        let mut buf = [0u8; 10];
        let err = transport.recv_exact(&mut buf).unwrap_err();
        assert!(matches!(err, FocasError::ConnectionClosed));
    }

    #[test]
    fn test_recv_exact_times_out() {
        let (listener, addr) = listener();
        let mut transport = TcpTransport::connect(addr, Duration::from_millis(50)).unwrap();
        let _held = listener.accept().unwrap();
        let mut buf = [0u8; 4];
        let err = transport.recv_exact(&mut buf).unwrap_err();
        assert!(matches!(err, FocasError::Timeout));
    }

    #[test]
    fn test_send_all_and_recv_some() {
        let (listener, addr) = listener();
        let peer = thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut buf = [0u8; 4];
            stream.read_exact(&mut buf).unwrap();
            stream.write_all(&buf).unwrap();
        });

        let mut transport = TcpTransport::connect(addr, Duration::from_secs(2)).unwrap();
        transport.send_all(&[9, 8, 7, 6]).unwrap();
        let mut received = Vec::new();
        let mut buf = [0u8; 16];
        loop {
            let n = transport.recv_some(&mut buf).unwrap();
            if n == 0 {
                break;
            }
            received.extend_from_slice(&buf[..n]);
        }
        assert_eq!(received, vec![9, 8, 7, 6]);
        peer.join().unwrap();
    }

    #[test]
    fn test_transport_debug() {
        let (listener, addr) = listener();
        let transport = TcpTransport::connect(addr, Duration::from_secs(1)).unwrap();
        let _held = listener.accept().unwrap();
        let debug_str = format!("{:?}", transport);
        assert!(debug_str.contains("TcpTransport"));
        assert!(debug_str.contains(&addr.to_string()));
    }
}
