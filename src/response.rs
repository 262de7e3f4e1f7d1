//! Response parsing and batch demultiplexing.
//!
//! # Single request
//!
//! The one sub-packet of a single-request response is matched against the
//! request opcode in two layouts, tried in order:
//!
//! | Layout | Condition | Shape |
//! |--------|-----------|-------|
//! | Extended | ≥ 14 bytes, opcode echoed, bytes 6..12 zero | `opcode(6) \| 0(6) \| len(u16) \| data` |
//! | Compact | ≥ 8 bytes, opcode echoed | `opcode(6) \| error(i16) \| detail` |
//!
//! # Batch
//!
//! Batch responses are strictly positional. Item *i* must echo the third
//! opcode field of request *i*:
//!
//! | Offset | Field |
//! |--------|-------|
//! | 0 | c3 (u16 BE) |
//! | 2 | error code (i16 BE) |
//! | 4 | error detail, or 6 bytes of echo followed by the result payload at 10 |
//!
//! A nonzero error code marks only its own item as failed.

use crate::command::{CommandRecord, Opcode};
use crate::error::{FocasError, Result};
use crate::frame::{Frame, FrameType};

/// Minimum size of an extended single response.
const EXTENDED_HEADER_SIZE: usize = 14;
/// Minimum size of a compact single response.
const COMPACT_HEADER_SIZE: usize = 8;
/// Offset of the result payload inside a successful batch item.
const BATCH_PAYLOAD_OFFSET: usize = 10;
/// Minimum size of a batch item carrying a result payload.
const BATCH_PAYLOAD_MIN: usize = 12;

/// Parsed response to a single command record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandResponse {
    /// Result with an explicit length.
    Extended {
        /// Result length declared by the controller.
        length: u16,
        /// Result bytes as received.
        payload: Vec<u8>,
    },
    /// Status-only reply carrying a device error code.
    Compact {
        /// Device error code; zero means success without data.
        error_code: i16,
        /// Error detail bytes.
        payload: Vec<u8>,
    },
}

impl CommandResponse {
    /// Matches a sub-packet against the request opcode.
    ///
    /// # Errors
    ///
    /// Returns `InvalidResponse` if neither layout matches.
    ///
    /// # Example
    ///
    /// ```
    /// use fanuc_focas::{CommandResponse, Opcode};
    ///
    /// let op = Opcode::new(1, 1, 0x1A);
    /// let mut item = op.to_bytes().to_vec();
    /// item.extend_from_slice(&[0, 0, 0, 0, 0, 0, 0x00, 0x04, 0, 0, 0x01, 0x2C]);
    ///
    /// let response = CommandResponse::parse(op, &item).unwrap();
    /// assert_eq!(response.into_data().unwrap(), vec![0, 0, 0x01, 0x2C]);
    /// ```
    pub fn parse(opcode: Opcode, item: &[u8]) -> Result<Self> {
        let echo = opcode.to_bytes();

        if item.len() >= EXTENDED_HEADER_SIZE
            && item[..6] == echo
            && item[6..12].iter().all(|&b| b == 0)
        {
            return Ok(Self::Extended {
                length: u16::from_be_bytes([item[12], item[13]]),
                payload: item[EXTENDED_HEADER_SIZE..].to_vec(),
            });
        }

        if item.len() >= COMPACT_HEADER_SIZE && item[..6] == echo {
            return Ok(Self::Compact {
                error_code: i16::from_be_bytes([item[6], item[7]]),
                payload: item[COMPACT_HEADER_SIZE..].to_vec(),
            });
        }

        Err(FocasError::invalid_response(format!(
            "response does not echo opcode {opcode}"
        )))
    }

    /// Returns the device error code (zero for an extended response).
    pub fn error_code(&self) -> i16 {
        match self {
            Self::Extended { .. } => 0,
            Self::Compact { error_code, .. } => *error_code,
        }
    }

    /// Consumes the response and returns the result bytes.
    ///
    /// An extended payload is clipped to its declared length. A compact
    /// response with error code zero yields no data.
    ///
    /// # Errors
    ///
    /// Returns `DeviceError` for a nonzero compact error code.
    pub fn into_data(self) -> Result<Vec<u8>> {
        match self {
            Self::Extended {
                length,
                mut payload,
            } => {
                payload.truncate(length as usize);
                Ok(payload)
            }
            Self::Compact { error_code: 0, .. } => Ok(Vec::new()),
            Self::Compact { error_code, .. } => Err(FocasError::device_error(error_code)),
        }
    }
}

/// Result of one command within a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultItem {
    /// Device error code; zero on success.
    pub error_code: i16,
    /// Result payload on success, error detail otherwise.
    pub payload: Vec<u8>,
}

impl ResultItem {
    /// Returns `true` if the device reported success.
    pub fn is_ok(&self) -> bool {
        self.error_code == 0
    }

    /// Returns the result payload, or `None` for a failed item.
    pub fn data(&self) -> Option<&[u8]> {
        self.is_ok().then_some(self.payload.as_slice())
    }
}

/// Checks that a frame is a variable response and returns its sub-packets.
///
/// # Errors
///
/// Returns `UnexpectedFrame` for any other frame type and `InvalidResponse`
/// if the response carries no sub-packets.
pub fn var_response_items(frame: Frame) -> Result<Vec<Vec<u8>>> {
    if frame.frame_type != FrameType::VarResponse {
        return Err(FocasError::unexpected_frame(
            FrameType::VarResponse.code(),
            frame.frame_type.code(),
        ));
    }
    let items = frame.into_sub_packets()?;
    if items.is_empty() {
        return Err(FocasError::invalid_response("response carries no sub-packets"));
    }
    Ok(items)
}

/// Correlates batch response items with their requests, position by position.
///
/// # Errors
///
/// Returns `InvalidResponse` if the item count differs from the request count,
/// an item is truncated, or any item fails to echo its request's opcode. The
/// whole batch is rejected in that case.
pub fn demux_batch(requests: &[CommandRecord], items: &[Vec<u8>]) -> Result<Vec<ResultItem>> {
    if items.len() != requests.len() {
        return Err(FocasError::invalid_response(format!(
            "batch expected {} items, got {}",
            requests.len(),
            items.len()
        )));
    }

    requests
        .iter()
        .zip(items)
        .enumerate()
        .map(|(index, (request, resp))| {
            let req = request.to_sub_request_bytes();
            if resp.len() < 4 || req.len() < 6 {
                return Err(FocasError::invalid_response(format!(
                    "batch item {index} truncated"
                )));
            }
            if resp[..2] != req[4..6] {
                return Err(FocasError::invalid_response(format!(
                    "batch item {index} echoes 0x{:04X}, expected {}",
                    u16::from_be_bytes([resp[0], resp[1]]),
                    request.opcode
                )));
            }

            let error_code = i16::from_be_bytes([resp[2], resp[3]]);
            let payload = if error_code != 0 {
                resp[4..].to_vec()
            } else if resp.len() >= BATCH_PAYLOAD_MIN {
                resp[BATCH_PAYLOAD_OFFSET..].to_vec()
            } else {
                Vec::new()
            };
            Ok(ResultItem {
                error_code,
                payload,
            })
        })
        .collect()
}
