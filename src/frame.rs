//! FOCAS frame envelope encoding and decoding.
//!
//! Every message exchanged with the controller is wrapped in a 10-byte
//! envelope:
//!
//! | Offset | Field | Size | Description |
//! |--------|-------|------|-------------|
//! | 0 | Magic | 4 bytes | Always `A0 A0 A0 A0` |
//! | 4 | Version | u16 BE | Protocol version (1) |
//! | 6 | Type | u16 BE | [`FrameType`] code |
//! | 8 | Length | u16 BE | Byte count of the payload that follows |
//! | 10 | Payload | Length bytes | Frame body |
//!
//! Variable request/response frames carry a sub-packet list as their payload:
//! `count (u16) | (len (u16) | chunk)*`, where `len` includes its own two bytes.
//!
//! # Example
//!
//! ```
//! use fanuc_focas::{Frame, FramePayload, FrameType};
//!
//! let bytes = Frame::encode(FrameType::OpenRequest, &[0x00, 0x02]).unwrap();
//! assert_eq!(&bytes[..4], &[0xA0, 0xA0, 0xA0, 0xA0]);
//!
//! let frame = Frame::decode(&bytes).unwrap();
//! assert_eq!(frame.frame_type, FrameType::OpenRequest);
//! assert_eq!(frame.payload, FramePayload::Raw(vec![0x00, 0x02]));
//! ```

use crate::error::{FocasError, Result};
use crate::transport::TcpTransport;
use crate::utils::format_hex;

/// Frame envelope marker.
pub const MAGIC: [u8; 4] = [0xA0, 0xA0, 0xA0, 0xA0];

/// Envelope header size in bytes.
pub const FRAME_HEADER_SIZE: usize = 10;

/// Protocol version written into every outgoing frame.
pub const DEFAULT_VERSION: u16 = 1;

/// Frame type codes.
///
/// Equality and hashing follow the wire code, so `Other(0x2101)` equals
/// [`FrameType::VarRequest`].
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FrameType {
    /// Session open request (0x0101).
    OpenRequest,
    /// Session open response (0x0102).
    OpenResponse,
    /// Session close request (0x0201).
    CloseRequest,
    /// Session close response (0x0202).
    CloseResponse,
    /// Variable request carrying command records (0x2101).
    VarRequest,
    /// Variable response carrying result records (0x2102).
    VarResponse,
    /// Program write open (0x1101).
    WriteOpen,
    /// Program upload data chunk (0x1204).
    DataChunk,
    /// Program upload end of write (0x1301).
    WriteEnd,
    /// Program upload acknowledgment (0x1302).
    WriteAck,
    /// Program download open (0x1501).
    OpenData,
    /// Program download data (0x1604).
    StreamData,
    /// Program download end (0x1701).
    StreamEnd,
    /// Program download end acknowledgment (0x1702).
    StreamEndAck,
    /// Program upload rejected (0x1404).
    WriteError,
    /// Any other type code.
    Other(u16),
}

impl FrameType {
    /// Returns the wire code for this frame type.
    pub fn code(self) -> u16 {
        match self {
            Self::OpenRequest => 0x0101,
            Self::OpenResponse => 0x0102,
            Self::CloseRequest => 0x0201,
            Self::CloseResponse => 0x0202,
            Self::VarRequest => 0x2101,
            Self::VarResponse => 0x2102,
            Self::WriteOpen => 0x1101,
            Self::DataChunk => 0x1204,
            Self::WriteEnd => 0x1301,
            Self::WriteAck => 0x1302,
            Self::OpenData => 0x1501,
            Self::StreamData => 0x1604,
            Self::StreamEnd => 0x1701,
            Self::StreamEndAck => 0x1702,
            Self::WriteError => 0x1404,
            Self::Other(code) => code,
        }
    }

    /// Maps a wire code to a frame type.
    pub fn from_code(code: u16) -> Self {
        match code {
            0x0101 => Self::OpenRequest,
            0x0102 => Self::OpenResponse,
            0x0201 => Self::CloseRequest,
            0x0202 => Self::CloseResponse,
            0x2101 => Self::VarRequest,
            0x2102 => Self::VarResponse,
            0x1101 => Self::WriteOpen,
            0x1204 => Self::DataChunk,
            0x1301 => Self::WriteEnd,
            0x1302 => Self::WriteAck,
            0x1501 => Self::OpenData,
            0x1604 => Self::StreamData,
            0x1701 => Self::StreamEnd,
            0x1702 => Self::StreamEndAck,
            0x1404 => Self::WriteError,
            other => Self::Other(other),
        }
    }
}

impl PartialEq for FrameType {
    fn eq(&self, other: &Self) -> bool {
        self.code() == other.code()
    }
}

impl Eq for FrameType {}

impl std::hash::Hash for FrameType {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.code().hash(state);
    }
}

impl From<u16> for FrameType {
    fn from(code: u16) -> Self {
        Self::from_code(code)
    }
}

impl std::fmt::Display for FrameType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "0x{:04X}", self.code())
    }
}

/// Decoded frame body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FramePayload {
    /// Opaque payload of any non-variable frame.
    Raw(Vec<u8>),
    /// Sub-packets of a variable response, in wire order.
    SubPackets(Vec<Vec<u8>>),
}

/// A decoded frame envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Protocol version.
    pub version: u16,
    /// Frame type.
    pub frame_type: FrameType,
    /// Payload length declared in the header.
    pub length: u16,
    /// Frame body.
    pub payload: FramePayload,
}

impl Frame {
    /// Encodes a frame with the default version.
    ///
    /// A [`FrameType::VarRequest`] payload is wrapped as a one-element sub-packet list.
    ///
    /// # Errors
    ///
    /// Returns `InvalidParameter` if the payload does not fit a u16 length.
    pub fn encode(frame_type: FrameType, payload: &[u8]) -> Result<Vec<u8>> {
        Self::encode_with_version(frame_type, payload, DEFAULT_VERSION)
    }

    /// Encodes a frame with an explicit version.
    pub fn encode_with_version(frame_type: FrameType, payload: &[u8], version: u16) -> Result<Vec<u8>> {
        if frame_type == FrameType::VarRequest {
            let wrapped = encode_sub_packets(&[payload])?;
            return envelope(frame_type, &wrapped, version);
        }
        envelope(frame_type, payload, version)
    }

    /// Encodes a variable request carrying several sub-packets.
    pub fn encode_batch<T: AsRef<[u8]>>(items: &[T]) -> Result<Vec<u8>> {
        let wrapped = encode_sub_packets(items)?;
        envelope(FrameType::VarRequest, &wrapped, DEFAULT_VERSION)
    }

    /// Decodes a complete frame.
    ///
    /// # Errors
    ///
    /// Returns `InvalidResponse` if the input is shorter than the header, the
    /// magic is wrong, the declared length disagrees with the input length, or
    /// a variable response's sub-packet list is malformed.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < FRAME_HEADER_SIZE {
            return Err(FocasError::invalid_response(format!(
                "frame too short: expected at least {} bytes, got {}",
                FRAME_HEADER_SIZE,
                bytes.len()
            )));
        }
        if bytes[..4] != MAGIC {
            return Err(FocasError::invalid_response(format!(
                "bad frame magic: {}",
                format_hex(&bytes[..4])
            )));
        }

        let version = u16::from_be_bytes([bytes[4], bytes[5]]);
        let frame_type = FrameType::from_code(u16::from_be_bytes([bytes[6], bytes[7]]));
        let length = u16::from_be_bytes([bytes[8], bytes[9]]);

        if length as usize + FRAME_HEADER_SIZE != bytes.len() {
            return Err(FocasError::invalid_response(format!(
                "frame length mismatch: header says {}, got {}",
                length,
                bytes.len() - FRAME_HEADER_SIZE
            )));
        }

        let body = &bytes[FRAME_HEADER_SIZE..];
        let payload = if frame_type == FrameType::VarResponse {
            FramePayload::SubPackets(decode_sub_packets(body)?)
        } else {
            FramePayload::Raw(body.to_vec())
        };

        Ok(Self {
            version,
            frame_type,
            length,
            payload,
        })
    }

    /// Returns the raw payload, or an error for a sub-packet frame.
    pub fn into_raw(self) -> Result<Vec<u8>> {
        match self.payload {
            FramePayload::Raw(data) => Ok(data),
            FramePayload::SubPackets(_) => {
                Err(FocasError::invalid_response("expected a raw frame payload"))
            }
        }
    }

    /// Returns the sub-packets, or an error for a raw frame.
    pub fn into_sub_packets(self) -> Result<Vec<Vec<u8>>> {
        match self.payload {
            FramePayload::SubPackets(items) => Ok(items),
            FramePayload::Raw(_) => Err(FocasError::unexpected_frame(
                FrameType::VarResponse.code(),
                self.frame_type.code(),
            )),
        }
    }
}

fn envelope(frame_type: FrameType, payload: &[u8], version: u16) -> Result<Vec<u8>> {
    let length = u16::try_from(payload.len())
        .map_err(|_| FocasError::invalid_parameter("payload", "exceeds 65535 bytes"))?;

    let mut bytes = Vec::with_capacity(FRAME_HEADER_SIZE + payload.len());
    bytes.extend_from_slice(&MAGIC);
    bytes.extend_from_slice(&version.to_be_bytes());
    bytes.extend_from_slice(&frame_type.code().to_be_bytes());
    bytes.extend_from_slice(&length.to_be_bytes());
    bytes.extend_from_slice(payload);
    Ok(bytes)
}

/// Encodes `count | (len | item)*` where `len = item.len() + 2`.
pub fn encode_sub_packets<T: AsRef<[u8]>>(items: &[T]) -> Result<Vec<u8>> {
    let count = u16::try_from(items.len())
        .map_err(|_| FocasError::invalid_parameter("items", "too many sub-packets"))?;
    let total: usize = items.iter().map(|item| item.as_ref().len() + 2).sum();

    let mut bytes = Vec::with_capacity(2 + total);
    bytes.extend_from_slice(&count.to_be_bytes());
    for item in items {
        let item = item.as_ref();
        let len = u16::try_from(item.len() + 2)
            .map_err(|_| FocasError::invalid_parameter("items", "sub-packet exceeds 65533 bytes"))?;
        bytes.extend_from_slice(&len.to_be_bytes());
        bytes.extend_from_slice(item);
    }
    Ok(bytes)
}

/// Splits a `count | (len | chunk)*` list into its chunks.
pub fn decode_sub_packets(body: &[u8]) -> Result<Vec<Vec<u8>>> {
    if body.is_empty() {
        return Ok(Vec::new());
    }
    if body.len() < 2 {
        return Err(FocasError::invalid_response("sub-packet count truncated"));
    }

    let count = u16::from_be_bytes([body[0], body[1]]) as usize;
    let mut items = Vec::with_capacity(count);
    let mut offset = 2;

    for index in 0..count {
        if offset + 2 > body.len() {
            return Err(FocasError::invalid_response(format!(
                "sub-packet {index} length truncated"
            )));
        }
        let len = u16::from_be_bytes([body[offset], body[offset + 1]]) as usize;
        if len < 2 || offset + len > body.len() {
            return Err(FocasError::invalid_response(format!(
                "sub-packet {index} declares {len} bytes, {} available",
                body.len() - offset
            )));
        }
        items.push(body[offset + 2..offset + len].to_vec());
        offset += len;
    }

    Ok(items)
}

/// Receives one complete frame: the fixed header, then exactly `length` bytes.
pub(crate) fn recv_frame(transport: &mut TcpTransport) -> Result<Vec<u8>> {
    let mut header = [0u8; FRAME_HEADER_SIZE];
    transport.recv_exact(&mut header)?;
    if header[..4] != MAGIC {
        return Err(FocasError::invalid_response(format!(
            "bad frame magic: {}",
            format_hex(&header[..4])
        )));
    }

    let length = u16::from_be_bytes([header[8], header[9]]) as usize;
    let mut bytes = Vec::with_capacity(FRAME_HEADER_SIZE + length);
    bytes.extend_from_slice(&header);
    bytes.resize(FRAME_HEADER_SIZE + length, 0);
    transport.recv_exact(&mut bytes[FRAME_HEADER_SIZE..])?;

    tracing::trace!(
        frame_type = %FrameType::from_code(u16::from_be_bytes([header[6], header[7]])),
        length,
        "frame received"
    );
    Ok(bytes)
}

/// Receives and decodes one frame.
pub(crate) fn read_frame(transport: &mut TcpTransport) -> Result<Frame> {
    Frame::decode(&recv_frame(transport)?)
}

/// Encodes and sends one frame.
pub(crate) fn send_frame(
    transport: &mut TcpTransport,
    frame_type: FrameType,
    payload: &[u8],
) -> Result<()> {
    let bytes = Frame::encode(frame_type, payload)?;
    tracing::trace!(frame_type = %frame_type, length = bytes.len() - FRAME_HEADER_SIZE, "frame sent");
    transport.send_all(&bytes)
}
