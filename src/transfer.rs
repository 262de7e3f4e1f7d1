//! Program file transfer over a dedicated connection.
//!
//! Transfers never touch the control connection. Each call opens a second
//! TCP connection to the same controller, runs one exchange and shuts the
//! socket down before returning.
//!
//! # Download
//!
//! ```text
//! client                              controller
//!   | -- 0x0101 open (00 01) ---------> |
//!   | <-------------------- response -- |
//!   | -- 0x1501 query "O0001-O0001" --> |
//!   | <-------------------- response -- |
//!   | <------------- 0x1604 data ... -- |
//!   | <------------------ 0x1701 end -- |
//!   | -- 0x1702 end ack --------------> |
//! ```
//!
//! # Upload
//!
//! ```text
//! client                              controller
//!   | -- 0x0101 open (00 01) ---------> |
//!   | <-------------------- response -- |
//!   | -- 0x1101 write "N://..." ------> |
//!   | <-------------------- response -- |
//!   | -- 0x1204 chunk (<= 0xF0) ... --> |
//!   | -- 0x1301 write end ------------> |
//!   | <------------ 0x1302 / 0x1404 --- |
//! ```

use std::net::SocketAddr;
use std::time::Duration;

use crate::error::{FocasError, Result};
use crate::frame::{read_frame, recv_frame, send_frame, Frame, FrameType, FRAME_HEADER_SIZE, MAGIC};
use crate::transport::TcpTransport;
use crate::utils::be_u16;

/// Open-request payload selecting the transfer channel.
const TRANSFER_OPEN_PAYLOAD: [u8; 2] = [0x00, 0x01];

/// Size of the query and write-open request buffers.
pub const TRANSFER_REQUEST_SIZE: usize = 0x204;

/// Marker at the start of a transfer request buffer.
const TRANSFER_REQUEST_MARKER: [u8; 4] = [0x00, 0x00, 0x00, 0x01];

/// Largest upload data chunk.
pub const UPLOAD_CHUNK_SIZE: usize = 0xF0;

/// Network-root marker every upload path must start with.
pub const NETWORK_ROOT: &str = "//";

/// Receive buffer size for the download stream.
const RECV_BUFFER_SIZE: usize = 1500;

/// Builds the download range query for a program name.
///
/// # Example
///
/// ```
/// use fanuc_focas::transfer::program_query;
///
/// assert_eq!(program_query("O12"), "O0012-O0012");
/// assert_eq!(program_query("7"), "O0007-O0007");
/// assert_eq!(program_query("abc"), "OABC-OABC");
/// assert_eq!(program_query("O1000-O2000"), "O1000-O2000");
/// ```
pub fn program_query(name: &str) -> String {
    if let Ok(number) = name.replace('O', "").parse::<i32>() {
        return format!("O{number:04}-O{number:04}");
    }
    let mut name = name.to_uppercase();
    if !name.starts_with('O') {
        name.insert(0, 'O');
    }
    if name.contains('-') {
        name
    } else {
        format!("{name}-{name}")
    }
}

/// Builds the download range query for a program number.
pub fn program_number_query(number: u32) -> String {
    format!("O{number:04}-O{number:04}")
}

/// Builds a 0x204-byte transfer request: marker followed by `text`.
fn transfer_request(text: &str) -> Result<Vec<u8>> {
    let bytes = text.as_bytes();
    let capacity = TRANSFER_REQUEST_SIZE - TRANSFER_REQUEST_MARKER.len();
    if bytes.len() > capacity {
        return Err(FocasError::invalid_parameter(
            "path",
            format!("must not exceed {capacity} bytes"),
        ));
    }
    let mut buffer = vec![0u8; TRANSFER_REQUEST_SIZE];
    buffer[..4].copy_from_slice(&TRANSFER_REQUEST_MARKER);
    buffer[4..4 + bytes.len()].copy_from_slice(bytes);
    Ok(buffer)
}

/// Splits program text into upload chunks of at most [`UPLOAD_CHUNK_SIZE`] bytes.
///
/// # Example
///
/// ```
/// use fanuc_focas::transfer::{chunk_content, UPLOAD_CHUNK_SIZE};
///
/// let content = "X".repeat(UPLOAD_CHUNK_SIZE + 5);
/// let sizes: Vec<usize> = chunk_content(&content).map(<[u8]>::len).collect();
/// assert_eq!(sizes, vec![UPLOAD_CHUNK_SIZE, 5]);
/// ```
pub fn chunk_content(content: &str) -> std::slice::Chunks<'_, u8> {
    content.as_bytes().chunks(UPLOAD_CHUNK_SIZE)
}

/// Interprets the frame that answers the end of an upload.
///
/// # Errors
///
/// - `AlreadyExists` or `WriteFailed` for a 0x1404 frame
/// - `InvalidResponse` if a 0x1404 payload is shorter than six bytes
/// - `UnexpectedFrame` for any other frame type
pub fn decode_write_ack(frame: Frame) -> Result<()> {
    match frame.frame_type {
        FrameType::WriteAck => Ok(()),
        FrameType::WriteError => {
            let payload = frame.into_raw()?;
            match (be_u16(&payload, 0), be_u16(&payload, 2), be_u16(&payload, 4)) {
                (Some(code), Some(subcode), Some(detail)) => {
                    Err(FocasError::write_failed(code, subcode, detail))
                }
                _ => Err(FocasError::invalid_response(format!(
                    "write error payload too short: {} bytes",
                    payload.len()
                ))),
            }
        }
        other => Err(FocasError::unexpected_frame(
            FrameType::WriteAck.code(),
            other.code(),
        )),
    }
}

/// Outcome of feeding bytes into a [`StreamScanner`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanState {
    /// More data is expected.
    Streaming,
    /// The end frame was seen.
    Done,
}

/// Reassembles the download stream from arbitrary read boundaries.
///
/// Bytes are scanned for the frame magic. Data frames append their payload,
/// the end frame stops the scan, and any other position advances one byte.
#[derive(Debug, Default)]
pub struct StreamScanner {
    pending: Vec<u8>,
    content: Vec<u8>,
}

impl StreamScanner {
    /// Creates an empty scanner.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends received bytes and consumes every complete frame.
    pub fn feed(&mut self, bytes: &[u8]) -> ScanState {
        self.pending.extend_from_slice(bytes);

        let mut pos = 0;
        let mut state = ScanState::Streaming;
        while pos + MAGIC.len() <= self.pending.len() {
            if self.pending[pos..pos + MAGIC.len()] != MAGIC {
                pos += 1;
                continue;
            }
            if pos + FRAME_HEADER_SIZE > self.pending.len() {
                break;
            }
            let (Some(code), Some(length)) =
                (be_u16(&self.pending, pos + 6), be_u16(&self.pending, pos + 8))
            else {
                break;
            };
            match FrameType::from_code(code) {
                FrameType::StreamData => {
                    let end = pos + FRAME_HEADER_SIZE + usize::from(length);
                    if end > self.pending.len() {
                        break;
                    }
                    self.content
                        .extend_from_slice(&self.pending[pos + FRAME_HEADER_SIZE..end]);
                    pos = end;
                }
                FrameType::StreamEnd => {
                    // nothing after the end frame belongs to the program
                    pos = self.pending.len();
                    state = ScanState::Done;
                    break;
                }
                _ => pos += 1,
            }
        }

        self.pending.drain(..pos);
        state
    }

    /// Returns the program text, including any partially received data frame.
    pub fn finish(mut self) -> String {
        let pending = &self.pending;
        if pending.len() > FRAME_HEADER_SIZE
            && pending[..MAGIC.len()] == MAGIC
            && be_u16(pending, 6) == Some(FrameType::StreamData.code())
        {
            self.content
                .extend_from_slice(&pending[FRAME_HEADER_SIZE..]);
        }
        String::from_utf8_lossy(&self.content).into_owned()
    }
}

/// Rejects a controller path that does not start with [`NETWORK_ROOT`].
pub(crate) fn check_network_path(path: &str) -> Result<()> {
    if !path.starts_with(NETWORK_ROOT) {
        return Err(FocasError::invalid_parameter(
            "path",
            format!("must start with '{NETWORK_ROOT}', got '{path}'"),
        ));
    }
    Ok(())
}

/// Opens the transfer channel and sends one request buffer under `frame_type`.
fn open_transfer(
    addr: SocketAddr,
    timeout: Duration,
    frame_type: FrameType,
    request: &[u8],
) -> Result<TcpTransport> {
    let mut transport = TcpTransport::connect(addr, timeout)?;
    match handshake(&mut transport, frame_type, request) {
        Ok(()) => Ok(transport),
        Err(e) => {
            transport.shutdown();
            Err(e)
        }
    }
}

/// Replies to both requests carry nothing the transfer needs.
fn handshake(transport: &mut TcpTransport, frame_type: FrameType, request: &[u8]) -> Result<()> {
    send_frame(transport, FrameType::OpenRequest, &TRANSFER_OPEN_PAYLOAD)?;
    recv_frame(transport)?;
    send_frame(transport, frame_type, request)?;
    recv_frame(transport)?;
    Ok(())
}

/// Downloads a program's text.
pub(crate) fn download(addr: SocketAddr, timeout: Duration, query: &str) -> Result<String> {
    let request = transfer_request(query)?;
    tracing::debug!(%addr, query, "download started");

    let mut transport = open_transfer(addr, timeout, FrameType::OpenData, &request)?;
    let result = stream_program(&mut transport);
    transport.shutdown();

    if let Ok(text) = &result {
        tracing::debug!(bytes = text.len(), "download finished");
    }
    result
}

fn stream_program(transport: &mut TcpTransport) -> Result<String> {
    let mut scanner = StreamScanner::new();
    let mut buf = [0u8; RECV_BUFFER_SIZE];
    loop {
        let n = transport.recv_some(&mut buf)?;
        if n == 0 {
            tracing::debug!("download stream closed by controller");
            return Ok(scanner.finish());
        }
        if scanner.feed(&buf[..n]) == ScanState::Done {
            send_frame(transport, FrameType::StreamEndAck, &[])?;
            return Ok(scanner.finish());
        }
    }
}

/// Uploads program text into the folder `path` (which must start with `//`).
pub(crate) fn upload(addr: SocketAddr, timeout: Duration, path: &str, content: &str) -> Result<()> {
    check_network_path(path)?;
    let request = transfer_request(&format!("N:{path}"))?;
    tracing::debug!(%addr, path, bytes = content.len(), "upload started");

    let mut transport = open_transfer(addr, timeout, FrameType::WriteOpen, &request)?;
    let result = write_program(&mut transport, content);
    transport.shutdown();

    if result.is_ok() {
        tracing::debug!(path, "upload acknowledged");
    }
    result
}

fn write_program(transport: &mut TcpTransport, content: &str) -> Result<()> {
    for chunk in chunk_content(content) {
        send_frame(transport, FrameType::DataChunk, chunk)?;
    }
    send_frame(transport, FrameType::WriteEnd, &[])?;
    decode_write_ack(read_frame(transport)?)
}
