//! # FANUC FOCAS Ethernet Protocol Library
//!
//! A Rust library for communicating with FANUC CNC controllers using the
//! FOCAS Ethernet protocol.
//!
//! This is a **protocol-only** library. It has no polling, schedulers or
//! application-level features. Each accessor performs one request/response
//! exchange on the control connection, with no automatic retries, caching
//! beyond the connect-time snapshots, or reconnection.
//!
//! ## Features
//!
//! - **Protocol-only**: frame codec, command records, batched requests
//! - **Deterministic**: batch results are matched to requests by position
//! - **Typed results**: every accessor returns a typed record, never a loose map
//! - **No panics**: all errors are returned as `Result<T, FocasError>`
//! - **File transfer**: program download and upload on a separate connection
//! - **Structured logging** through [`tracing`](https://docs.rs/tracing)
//!
//! ## Quick Start
//!
//! ```no_run
//! use fanuc_focas::{Client, ClientConfig};
//!
//! fn main() -> fanuc_focas::Result<()> {
//!     let mut client = Client::new(ClientConfig::new("192.168.1.10"));
//!     client.connect()?;
//!
//!     if let Some(status) = client.status() {
//!         println!("run={} alarm={}", status.run, status.alarm);
//!     }
//!
//!     // Macro variable #500
//!     let value = client.read_macro(500)?;
//!     println!("#500 = {:?}", value);
//!
//!     // Registered programs
//!     for program in client.list_programs(1)? {
//!         println!("O{:04} {} bytes {}", program.number, program.size, program.comment);
//!     }
//!
//!     client.disconnect()
//! }
//! ```
//!
//! ## Frames
//!
//! | Offset | Field | Size |
//! |--------|-------|------|
//! | 0 | Magic `A0 A0 A0 A0` | 4 bytes |
//! | 4 | Version | u16 BE |
//! | 6 | Type | u16 BE |
//! | 8 | Length | u16 BE |
//! | 10 | Payload | Length bytes |
//!
//! Commands travel in variable-request frames (0x2101) as a sub-packet list;
//! see [`Frame`] and [`CommandRecord`].
//!
//! ## Program Transfer
//!
//! ```no_run
//! # use fanuc_focas::{Client, ClientConfig};
//! # let client = Client::new(ClientConfig::new("192.168.1.10"));
//! let text = client.download_program("O0011")?;
//! client.upload_program("//CNC_MEM/USER/PATH1/", &text)?;
//! # Ok::<(), fanuc_focas::FocasError>(())
//! ```
//!
//! ## Error Handling
//!
//! ```no_run
//! use fanuc_focas::{Client, ClientConfig, FocasError};
//!
//! let client = Client::new(ClientConfig::new("192.168.1.10"));
//!
//! match client.upload_program("//CNC_MEM/USER/PATH1/", "%\nO0011\nM30\n%") {
//!     Ok(()) => println!("uploaded"),
//!     Err(FocasError::AlreadyExists) => println!("program exists"),
//!     Err(FocasError::WriteFailed { code, subcode, detail }) => {
//!         println!("rejected: {code:04X}/{subcode:04X}/{detail:04X}");
//!     }
//!     Err(e) if e.is_transport() => println!("connection problem: {e}"),
//!     Err(e) => println!("error: {e}"),
//! }
//! ```
//!
//! ## Configuration
//!
//! ```
//! use fanuc_focas::ClientConfig;
//! use std::time::Duration;
//!
//! let config = ClientConfig::new("cnc-07.plant.local")
//!     .with_port(8193)                                 // default: 8193
//!     .with_timeout(Duration::from_secs(3))            // default: 5s
//!     .with_close_timeout(Duration::from_millis(500))  // default: 1s
//!     .with_transfer_timeout(Duration::from_secs(2));  // default: 1s
//! ```

#![warn(clippy::all)]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

mod client;
mod command;
mod error;
mod frame;
mod numeric;
mod records;
mod response;
pub mod transfer;
mod transport;
pub mod utils;

// Public re-exports
pub use client::{AxisPositions, Client, ClientConfig, ConnectionState, PositionKind};
pub use command::{CommandRecord, Opcode, COMMAND_SIZE, SUB_REQUEST_SIZE};
pub use error::{FocasError, Result};
pub use frame::{
    decode_sub_packets, encode_sub_packets, Frame, FramePayload, FrameType, DEFAULT_VERSION,
    FRAME_HEADER_SIZE, MAGIC,
};
pub use numeric::{decode_number, ElementWidth, EncodedNumber, FocasValue, ENCODED_NUMBER_SIZE};
pub use records::{
    parse_directory, parse_number_list, parse_pmc, parse_prefixed_number, parse_program_listing,
    parse_typed_records, ControllerDateTime, DirectoryEntry, DirectoryInfo, EntryKind,
    ExecutingBlock, KeyedRecord, ProgramListingEntry, ProgramNumbers, Reading, StatusSnapshot,
    SystemIdentity, TypedRecord, ALL_AXES, DIRECTORY_RECORD_SIZE, PROGRAM_RECORD_SIZE,
    STATUS_SNAPSHOT_SIZE, SYSTEM_IDENTITY_SIZE,
};
pub use response::{demux_batch, var_response_items, CommandResponse, ResultItem};
pub use transport::{
    resolve, TcpTransport, DEFAULT_CLOSE_TIMEOUT, DEFAULT_FOCAS_PORT, DEFAULT_TIMEOUT,
    DEFAULT_TRANSFER_TIMEOUT,
};
