//! Error types for the FOCAS protocol.

use std::io;
use thiserror::Error;

/// Result type alias for FOCAS operations.
pub type Result<T> = std::result::Result<T, FocasError>;

/// Errors that can occur during FOCAS communication.
#[derive(Debug, Error)]
pub enum FocasError {
    /// I/O error during communication.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Communication timeout.
    #[error("Communication timeout")]
    Timeout,

    /// The controller closed the connection in the middle of a frame.
    #[error("Connection closed by controller")]
    ConnectionClosed,

    /// An accessor was called on a session that is not connected.
    #[error("Session is not connected")]
    NotConnected,

    /// Invalid response received from the controller.
    #[error("Invalid response: {reason}")]
    InvalidResponse {
        /// Description of the response error.
        reason: String,
    },

    /// A frame of an unexpected type was received.
    #[error("Unexpected frame type: expected 0x{expected:04X}, received 0x{received:04X}")]
    UnexpectedFrame {
        /// Frame type the protocol step expects.
        expected: u16,
        /// Frame type actually received.
        received: u16,
    },

    /// Error code reported by the controller for a single request.
    #[error("CNC error code {code}")]
    DeviceError {
        /// Device error code from the response.
        code: i16,
    },

    /// Upload target already holds a program that cannot be overwritten.
    #[error("CNC error 1404: file already exists and cannot be overwritten")]
    AlreadyExists,

    /// Upload rejected by the controller's write validation.
    #[error("CNC error 1404: write failed (code=0x{code:04X}, sub=0x{subcode:04X}, detail=0x{detail:04X})")]
    WriteFailed {
        /// Error code.
        code: u16,
        /// Error sub-code.
        subcode: u16,
        /// Error detail.
        detail: u16,
    },

    /// Invalid parameter provided.
    #[error("Invalid parameter '{parameter}': {reason}")]
    InvalidParameter {
        /// Name of the invalid parameter.
        parameter: String,
        /// Description of why the parameter is invalid.
        reason: String,
    },
}

impl FocasError {
    /// Creates a new `InvalidResponse` error.
    ///
    /// # Example
    ///
    /// ```
    /// use fanuc_focas::FocasError;
    ///
    /// let err = FocasError::invalid_response("bad magic");
    /// ```
    pub fn invalid_response(reason: impl Into<String>) -> Self {
        Self::InvalidResponse {
            reason: reason.into(),
        }
    }

    /// Creates a new `InvalidParameter` error.
    ///
    /// # Example
    ///
    /// ```
    /// use fanuc_focas::FocasError;
    ///
    /// let err = FocasError::invalid_parameter("path", "must start with '//'");
    /// ```
    pub fn invalid_parameter(parameter: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            parameter: parameter.into(),
            reason: reason.into(),
        }
    }

    /// Creates a new `UnexpectedFrame` error.
    pub fn unexpected_frame(expected: u16, received: u16) -> Self {
        Self::UnexpectedFrame { expected, received }
    }

    /// Creates a new `DeviceError`.
    pub fn device_error(code: i16) -> Self {
        Self::DeviceError { code }
    }

    /// Maps an upload error triple to its error.
    ///
    /// # Example
    ///
    /// ```
    /// use fanuc_focas::FocasError;
    ///
    /// let err = FocasError::write_failed(0x2006, 0x0005, 0x0004);
    /// assert!(matches!(err, FocasError::AlreadyExists));
    /// ```
    pub fn write_failed(code: u16, subcode: u16, detail: u16) -> Self {
        match (code, subcode, detail) {
            (0x2006, 0x0005, 0x0004) => Self::AlreadyExists,
            _ => Self::WriteFailed {
                code,
                subcode,
                detail,
            },
        }
    }

    /// Returns `true` for failures of the underlying connection.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::Io(_) | Self::Timeout | Self::ConnectionClosed | Self::NotConnected
        )
    }

    pub(crate) fn from_io(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut => Self::Timeout,
            io::ErrorKind::UnexpectedEof => Self::ConnectionClosed,
            _ => Self::Io(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_response_display() {
        let err = FocasError::invalid_response("bad magic");
        assert_eq!(err.to_string(), "Invalid response: bad magic");
    }

    #[test]
    fn test_unexpected_frame_display() {
        let err = FocasError::unexpected_frame(0x2102, 0x0202);
        assert_eq!(
            err.to_string(),
            "Unexpected frame type: expected 0x2102, received 0x0202"
        );
    }

    #[test]
    fn test_write_failed_already_exists() {
        let err = FocasError::write_failed(0x2006, 0x0005, 0x0004);
        assert!(matches!(err, FocasError::AlreadyExists));
    }

    #[test]
    fn test_write_failed_generic() {
        let err = FocasError::write_failed(0x2006, 0x0005, 0x0001);
        match err {
            FocasError::WriteFailed {
                code,
                subcode,
                detail,
            } => {
                assert_eq!((code, subcode, detail), (0x2006, 0x0005, 0x0001));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(
            FocasError::write_failed(1, 2, 3).to_string(),
            "CNC error 1404: write failed (code=0x0001, sub=0x0002, detail=0x0003)"
        );
    }

    #[test]
    fn test_from_io_maps_timeouts() {
        let err = FocasError::from_io(io::Error::from(io::ErrorKind::WouldBlock));
        assert!(matches!(err, FocasError::Timeout));
        let err = FocasError::from_io(io::Error::from(io::ErrorKind::TimedOut));
        assert!(matches!(err, FocasError::Timeout));
        let err = FocasError::from_io(io::Error::from(io::ErrorKind::UnexpectedEof));
        assert!(matches!(err, FocasError::ConnectionClosed));
        let err = FocasError::from_io(io::Error::from(io::ErrorKind::ConnectionReset));
        assert!(matches!(err, FocasError::Io(_)));
    }

    #[test]
    fn test_is_transport() {
        assert!(FocasError::Timeout.is_transport());
        assert!(FocasError::ConnectionClosed.is_transport());
        assert!(!FocasError::device_error(-1).is_transport());
        assert!(!FocasError::invalid_response("x").is_transport());
    }
}
