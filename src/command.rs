//! FOCAS command records and serialization.
//!
//! A command record identifies a controller operation by an opcode triple and
//! carries up to five signed 32-bit parameters:
//!
//! | Offset | Field | Size |
//! |--------|-------|------|
//! | 0 | c1 | u16 BE |
//! | 2 | c2 | u16 BE |
//! | 4 | c3 | u16 BE |
//! | 6 | v1..v5 | 5 × i32 BE |
//! | 26 | extra payload | variable |
//!
//! Inside a batch each record uses the reduced sub-request form: the opcode
//! triple and the first four parameters, with no fifth slot and no extra
//! payload.
//!
//! # Example
//!
//! ```
//! use fanuc_focas::{CommandRecord, Opcode};
//!
//! let cmd = CommandRecord::new(Opcode::new(1, 1, 0x15)).with_params(&[3901, 3901]);
//! assert_eq!(cmd.to_bytes().len(), 26);
//! assert_eq!(cmd.to_sub_request_bytes().len(), 22);
//! ```

use crate::error::{FocasError, Result};

/// Size of a full command record without extra payload.
pub const COMMAND_SIZE: usize = 26;

/// Size of a reduced sub-request record.
pub const SUB_REQUEST_SIZE: usize = 22;

/// Parameter count of the reduced sub-request form.
const SUB_REQUEST_PARAMS: usize = 4;

/// Opcode triple identifying a controller operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Opcode {
    /// First code.
    pub c1: u16,
    /// Second code.
    pub c2: u16,
    /// Third code, echoed in batch responses.
    pub c3: u16,
}

impl Opcode {
    /// Creates an opcode triple.
    pub const fn new(c1: u16, c2: u16, c3: u16) -> Self {
        Self { c1, c2, c3 }
    }

    /// Serializes the triple to 6 bytes.
    pub fn to_bytes(self) -> [u8; 6] {
        let [a, b] = self.c1.to_be_bytes();
        let [c, d] = self.c2.to_be_bytes();
        let [e, f] = self.c3.to_be_bytes();
        [a, b, c, d, e, f]
    }
}

impl std::fmt::Display for Opcode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({},{},0x{:X})", self.c1, self.c2, self.c3)
    }
}

/// System identity read.
pub(crate) const OP_SYS_INFO: Opcode = Opcode::new(1, 1, 0x18);
/// Status flags read.
pub(crate) const OP_STATUS: Opcode = Opcode::new(1, 1, 0x19);
/// Macro variable read.
pub(crate) const OP_MACRO: Opcode = Opcode::new(1, 1, 0x15);
/// Running/main program number read.
pub(crate) const OP_PROG_NUM: Opcode = Opcode::new(1, 1, 0x1C);
/// Executing program name read.
pub(crate) const OP_PROG_NAME: Opcode = Opcode::new(1, 1, 0xB9);
/// Executing block read.
pub(crate) const OP_EXEC_BLOCK: Opcode = Opcode::new(1, 1, 0x20);
/// Alarm code read.
pub(crate) const OP_ALARM: Opcode = Opcode::new(1, 1, 0x1A);
/// Parameter read, 2-family.
pub(crate) const OP_PARAM2: Opcode = Opcode::new(2, 1, 0x0A);
/// Parameter read, 4-byte elements.
pub(crate) const OP_PARAM: Opcode = Opcode::new(1, 1, 0x8D);
/// Diagnostic read, 8-byte elements.
pub(crate) const OP_DIAG: Opcode = Opcode::new(1, 1, 0x93);
/// PMC area read.
pub(crate) const OP_PMC: Opcode = Opcode::new(2, 1, 0x8001);
/// Date (v1=0) or time (v1=1) read.
pub(crate) const OP_DATE_TIME: Opcode = Opcode::new(1, 1, 0x45);
/// Axis position read.
pub(crate) const OP_AXIS: Opcode = Opcode::new(1, 1, 0x26);
/// Actual feed rate read.
pub(crate) const OP_ACT_FEED: Opcode = Opcode::new(1, 1, 0x24);
/// Actual spindle speed read.
pub(crate) const OP_ACT_SPINDLE_SPEED: Opcode = Opcode::new(1, 1, 0x25);
/// Actual spindle load read.
pub(crate) const OP_ACT_SPINDLE_LOAD: Opcode = Opcode::new(1, 1, 0x40);
/// Directory counts read.
pub(crate) const OP_DIR_INFO: Opcode = Opcode::new(1, 1, 0xB4);
/// Directory listing read.
pub(crate) const OP_DIR_LIST: Opcode = Opcode::new(1, 1, 0xB3);
/// Program listing read.
pub(crate) const OP_PROG_LIST: Opcode = Opcode::new(1, 1, 0x06);
/// Program header read.
pub(crate) const OP_PROG_HEADER: Opcode = Opcode::new(1, 1, 0x0C);
/// Program delete.
pub(crate) const OP_DELETE: Opcode = Opcode::new(1, 1, 0xB6);

/// A command record: opcode triple, five parameters and optional extra payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandRecord {
    /// Operation selector.
    pub opcode: Opcode,
    /// Parameters v1..v5.
    pub params: [i32; 5],
    /// Raw bytes appended after the parameters.
    pub extra: Vec<u8>,
}

impl CommandRecord {
    /// Creates a record with all parameters zero.
    pub fn new(opcode: Opcode) -> Self {
        Self {
            opcode,
            params: [0; 5],
            extra: Vec::new(),
        }
    }

    /// Sets the leading parameters; the rest stay zero. Extra values beyond
    /// five are ignored.
    pub fn with_params(mut self, params: &[i32]) -> Self {
        for (slot, value) in self.params.iter_mut().zip(params) {
            *slot = *value;
        }
        self
    }

    /// Sets the trailing raw payload.
    pub fn with_extra(mut self, extra: impl Into<Vec<u8>>) -> Self {
        self.extra = extra.into();
        self
    }

    /// Serializes the full form (26 bytes + extra payload).
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(COMMAND_SIZE + self.extra.len());
        bytes.extend_from_slice(&self.opcode.to_bytes());
        for value in &self.params {
            bytes.extend_from_slice(&value.to_be_bytes());
        }
        bytes.extend_from_slice(&self.extra);
        bytes
    }

    /// Serializes the reduced sub-request form used inside batches.
    pub fn to_sub_request_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(SUB_REQUEST_SIZE);
        bytes.extend_from_slice(&self.opcode.to_bytes());
        for value in &self.params[..SUB_REQUEST_PARAMS] {
            bytes.extend_from_slice(&value.to_be_bytes());
        }
        bytes
    }
}

/// Builds a path argument block: UTF-8 path, NUL padded to 256 bytes.
///
/// # Errors
///
/// Returns `InvalidParameter` if the path does not fit.
pub(crate) fn path_block(path: &str) -> Result<Vec<u8>> {
    const PATH_BLOCK_SIZE: usize = 0x100;

    let bytes = path.as_bytes();
    if bytes.len() >= PATH_BLOCK_SIZE {
        return Err(FocasError::invalid_parameter(
            "path",
            format!("must be shorter than {} bytes", PATH_BLOCK_SIZE),
        ));
    }
    let mut block = vec![0u8; PATH_BLOCK_SIZE];
    block[..bytes.len()].copy_from_slice(bytes);
    Ok(block)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_record_layout() {
        let cmd = CommandRecord::new(OP_MACRO).with_params(&[3901, 3902]);
        let bytes = cmd.to_bytes();
        assert_eq!(bytes.len(), COMMAND_SIZE);
        assert_eq!(
            bytes,
            hex::decode("000100010015 00000f3d 00000f3e 00000000 00000000 00000000".replace(' ', ""))
                .unwrap()
        );
    }

    #[test]
    fn test_full_record_with_extra() {
        let cmd = CommandRecord::new(OP_PROG_HEADER).with_extra(vec![0xAB, 0xCD]);
        let bytes = cmd.to_bytes();
        assert_eq!(bytes.len(), COMMAND_SIZE + 2);
        assert_eq!(&bytes[COMMAND_SIZE..], &[0xAB, 0xCD]);
    }

    #[test]
    fn test_negative_params_are_twos_complement() {
        let cmd = CommandRecord::new(OP_AXIS).with_params(&[4, -1]);
        let bytes = cmd.to_bytes();
        assert_eq!(&bytes[10..14], &[0xFF, 0xFF, 0xFF, 0xFF]);
    }

    #[test]
    fn test_sub_request_drops_fifth_param_and_extra() {
        let cmd = CommandRecord::new(OP_DIR_LIST)
            .with_params(&[1, 2, 3, 4, 256])
            .with_extra(vec![1, 2, 3]);
        let bytes = cmd.to_sub_request_bytes();
        assert_eq!(bytes.len(), SUB_REQUEST_SIZE);
        assert_eq!(&bytes[..6], &OP_DIR_LIST.to_bytes());
        assert_eq!(&bytes[18..22], &4i32.to_be_bytes());
    }

    #[test]
    fn test_with_params_ignores_overflow() {
        let cmd = CommandRecord::new(OP_PMC).with_params(&[1, 2, 3, 4, 5, 6, 7]);
        assert_eq!(cmd.params, [1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_batch_frame_layout() {
        use crate::frame::{Frame, FRAME_HEADER_SIZE};

        let items: Vec<Vec<u8>> = [0, 1]
            .iter()
            .map(|&v| CommandRecord::new(OP_DATE_TIME).with_params(&[v]).to_sub_request_bytes())
            .collect();
        let frame = Frame::encode_batch(&items).unwrap();
        let body = &frame[FRAME_HEADER_SIZE..];
        assert_eq!(body.len(), 2 + 2 * (2 + SUB_REQUEST_SIZE));
        assert_eq!(&body[..2], &[0x00, 0x02]);
        assert_eq!(&body[2..4], &((SUB_REQUEST_SIZE + 2) as u16).to_be_bytes());
        assert_eq!(&body[4..10], &OP_DATE_TIME.to_bytes());
        assert_eq!(&body[10..14], &0i32.to_be_bytes());
        assert_eq!(&body[26..28], &((SUB_REQUEST_SIZE + 2) as u16).to_be_bytes());
        assert_eq!(&body[34..38], &1i32.to_be_bytes());
    }

    #[test]
    fn test_path_block() {
        let block = path_block("//CNC_MEM/USER/PATH1/").unwrap();
        assert_eq!(block.len(), 256);
        assert!(block.starts_with(b"//CNC_MEM/USER/PATH1/"));
        assert!(block[21..].iter().all(|&b| b == 0));
        assert!(path_block(&"x".repeat(256)).is_err());
    }

    #[test]
    fn test_opcode_display() {
        assert_eq!(OP_PMC.to_string(), "(2,1,0x8001)");
    }
}
