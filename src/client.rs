//! High-level FOCAS client for communicating with FANUC CNC controllers.
//!
//! This module provides the [`Client`] struct, which is the primary interface
//! for talking to a controller over the FOCAS Ethernet protocol.
//!
//! # Overview
//!
//! The client provides a high-level API that handles:
//! - Session open/close handshakes on the control connection
//! - Single and batched command execution with positional result matching
//! - Typed decoding of controller records
//! - Program download/upload on a separate transfer connection
//!
//! # Example
//!
//! ```no_run
//! use fanuc_focas::{Client, ClientConfig, PositionKind, ALL_AXES};
//!
//! let mut client = Client::new(ClientConfig::new("192.168.1.10"));
//! client.connect()?;
//!
//! if let Some(identity) = client.system_identity() {
//!     println!("{identity}");
//! }
//!
//! // Macro variables #100..#105, one batch
//! let macros = client.read_macros(100, 105)?;
//!
//! // Absolute and relative positions of all axes
//! let positions = client.read_axes(&[PositionKind::Absolute, PositionKind::Relative], ALL_AXES.into())?;
//!
//! // Program text over the transfer connection
//! let text = client.download_program("O0001")?;
//!
//! client.disconnect()?;
//! # Ok::<(), fanuc_focas::FocasError>(())
//! ```
//!
//! # Session model
//!
//! A [`Client`] is either disconnected or owns exactly one control
//! connection. Each accessor performs one request/response exchange and
//! never retries. The client takes `&mut self` for every exchange, so it
//! cannot be driven from two threads at once without external locking.

use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::time::Duration;

use crate::command::{
    path_block, CommandRecord, OP_ACT_FEED, OP_ACT_SPINDLE_LOAD, OP_ACT_SPINDLE_SPEED, OP_ALARM,
    OP_AXIS, OP_DATE_TIME, OP_DELETE, OP_DIAG, OP_DIR_INFO, OP_DIR_LIST, OP_EXEC_BLOCK, OP_MACRO,
    OP_PARAM, OP_PARAM2, OP_PMC, OP_PROG_HEADER, OP_PROG_LIST, OP_PROG_NAME, OP_PROG_NUM,
    OP_STATUS, OP_SYS_INFO,
};
use crate::error::{FocasError, Result};
use crate::frame::{read_frame, send_frame, Frame, FrameType};
use crate::numeric::{decode_number, ElementWidth};
use crate::records::{
    parse_directory, parse_number_list, parse_pmc, parse_prefixed_number, parse_program_listing,
    parse_typed_records, ControllerDateTime, DirectoryEntry, DirectoryInfo, ExecutingBlock,
    KeyedRecord, ProgramListingEntry, ProgramNumbers, Reading, StatusSnapshot, SystemIdentity,
    TypedRecord,
};
use crate::response::{demux_batch, var_response_items, CommandResponse, ResultItem};
use crate::transfer::{self, check_network_path, program_number_query, program_query};
use crate::transport::{
    resolve, TcpTransport, DEFAULT_CLOSE_TIMEOUT, DEFAULT_FOCAS_PORT, DEFAULT_TIMEOUT,
    DEFAULT_TRANSFER_TIMEOUT,
};
use crate::utils::{be_i32, be_u16, be_u32, utf8_until_nul};

/// Open-request payload selecting the control channel.
const CONTROL_OPEN_PAYLOAD: [u8; 2] = [0x00, 0x02];
/// Length argument sent with path-carrying commands.
const PATH_ARG_SIZE: i32 = 256;
/// Directory entries requested per listing page.
const DIR_PAGE_SIZE: i32 = 10;
/// Programs requested per listing page.
const PROG_PAGE_SIZE: i32 = 0x13;
/// Listing type returning number, size and comment.
const PROG_LIST_TYPE: i32 = 2;

/// Configuration for creating a FOCAS client.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Controller host name or IP address, resolved at connect time.
    pub host: String,
    /// Controller port.
    pub port: u16,
    /// Connect, read and write timeout of the control connection.
    pub timeout: Duration,
    /// Read timeout while waiting for the close acknowledgment.
    pub close_timeout: Duration,
    /// Timeout of program transfer connections.
    pub transfer_timeout: Duration,
}

impl ClientConfig {
    /// Creates a configuration with the default port and timeouts.
    ///
    /// # Example
    ///
    /// ```
    /// use fanuc_focas::ClientConfig;
    ///
    /// let config = ClientConfig::new("192.168.1.10");
    /// assert_eq!(config.port, 8193);
    /// ```
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: DEFAULT_FOCAS_PORT,
            timeout: DEFAULT_TIMEOUT,
            close_timeout: DEFAULT_CLOSE_TIMEOUT,
            transfer_timeout: DEFAULT_TRANSFER_TIMEOUT,
        }
    }

    /// Sets a custom controller port (default is 8193).
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Sets the control connection timeout (default is 5 seconds).
    ///
    /// # Example
    ///
    /// ```
    /// use fanuc_focas::ClientConfig;
    /// use std::time::Duration;
    ///
    /// let config = ClientConfig::new("cnc-01").with_timeout(Duration::from_secs(2));
    /// ```
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the close handshake timeout (default is 1 second).
    pub fn with_close_timeout(mut self, timeout: Duration) -> Self {
        self.close_timeout = timeout;
        self
    }

    /// Sets the transfer connection timeout (default is 1 second).
    pub fn with_transfer_timeout(mut self, timeout: Duration) -> Self {
        self.transfer_timeout = timeout;
        self
    }

    fn socket_addr(&self) -> Result<SocketAddr> {
        resolve(&self.host, self.port)
    }
}

/// Connection state of a [`Client`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// No control connection.
    Disconnected,
    /// Control connection open and handshake completed.
    Connected,
}

/// Axis position kinds, in the order they are requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PositionKind {
    /// Absolute position.
    Absolute,
    /// Relative position.
    Relative,
    /// Machine (reference) position.
    Machine,
    /// Skip position.
    Skip,
    /// Distance to go.
    DistanceToGo,
}

impl PositionKind {
    /// All kinds in request order.
    pub const ALL: [PositionKind; 5] = [
        Self::Absolute,
        Self::Relative,
        Self::Machine,
        Self::Skip,
        Self::DistanceToGo,
    ];

    /// Parameter selecting this kind in the axis read.
    pub fn code(self) -> i32 {
        match self {
            Self::Absolute => 4,
            Self::Relative => 6,
            Self::Machine => 1,
            Self::Skip => 8,
            Self::DistanceToGo => 7,
        }
    }
}

/// Positions per kind; each reading holds one value per axis.
pub type AxisPositions = BTreeMap<PositionKind, Reading<Vec<Option<f64>>>>;

#[derive(Debug)]
struct Session {
    transport: TcpTransport,
    identity: Option<SystemIdentity>,
    status: Option<StatusSnapshot>,
}

/// FOCAS client for communicating with FANUC CNC controllers.
///
/// Each accessor produces exactly one request and one response on the
/// control connection (listings loop over pages). No automatic retries or
/// reconnection.
///
/// # Example
///
/// ```no_run
/// use fanuc_focas::{Client, ClientConfig};
///
/// let mut client = Client::new(ClientConfig::new("192.168.1.10"));
/// client.connect().unwrap();
///
/// let alarm = client.read_alarm().unwrap();
/// let feed = client.read_actual_feed().unwrap();
///
/// client.disconnect().unwrap();
/// ```
#[derive(Debug)]
pub struct Client {
    config: ClientConfig,
    session: Option<Session>,
}

impl Client {
    /// Creates a disconnected client. No I/O is performed.
    pub fn new(config: ClientConfig) -> Self {
        Self {
            config,
            session: None,
        }
    }

    /// Returns the client configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Returns the current connection state.
    pub fn state(&self) -> ConnectionState {
        if self.session.is_some() {
            ConnectionState::Connected
        } else {
            ConnectionState::Disconnected
        }
    }

    /// Returns `true` while a control connection is open.
    pub fn is_connected(&self) -> bool {
        self.session.is_some()
    }

    /// Returns the system identity read at connect time.
    pub fn system_identity(&self) -> Option<&SystemIdentity> {
        self.session.as_ref()?.identity.as_ref()
    }

    /// Returns the status flags read at connect time.
    pub fn status(&self) -> Option<&StatusSnapshot> {
        self.session.as_ref()?.status.as_ref()
    }

    /// Opens the control connection and reads the identity and status snapshots.
    ///
    /// Does nothing if the client is already connected.
    ///
    /// # Errors
    ///
    /// Returns a transport error if the connection cannot be established or
    /// fails during the handshake, and `UnexpectedFrame` if the controller
    /// does not acknowledge the open request. The client stays disconnected
    /// on error.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use fanuc_focas::{Client, ClientConfig};
    ///
    /// let mut client = Client::new(ClientConfig::new("192.168.1.10"));
    /// client.connect().unwrap();
    ///
    /// let identity = client.system_identity().unwrap();
    /// println!("{} axes, series {}", identity.max_axis, identity.series);
    /// ```
    pub fn connect(&mut self) -> Result<()> {
        if self.session.is_some() {
            return Ok(());
        }

        let addr = self.config.socket_addr()?;
        let mut transport = TcpTransport::connect(addr, self.config.timeout)?;
        if let Err(e) = open_control(&mut transport) {
            transport.shutdown();
            return Err(e);
        }

        self.session = Some(Session {
            transport,
            identity: None,
            status: None,
        });

        if let Err(e) = self.load_snapshots() {
            if let Some(session) = self.session.take() {
                session.transport.shutdown();
            }
            return Err(e);
        }

        tracing::debug!(
            %addr,
            max_axis = ?self.system_identity().map(|i| i.max_axis),
            "session opened"
        );
        Ok(())
    }

    fn load_snapshots(&mut self) -> Result<()> {
        let identity = self.fetch_snapshot(
            CommandRecord::new(OP_SYS_INFO),
            "system identity",
            SystemIdentity::parse,
        )?;
        let status = self.fetch_snapshot(
            CommandRecord::new(OP_STATUS).with_params(&[0]),
            "status",
            StatusSnapshot::parse,
        )?;

        let session = self.session_mut()?;
        session.identity = identity;
        session.status = status;
        Ok(())
    }

    /// Transport failures propagate; anything else leaves the snapshot absent.
    fn fetch_snapshot<T>(
        &mut self,
        command: CommandRecord,
        name: &str,
        parse: fn(&[u8]) -> Option<T>,
    ) -> Result<Option<T>> {
        match self.read_data(&command) {
            Ok(data) => {
                let parsed = parse(&data);
                if parsed.is_none() {
                    tracing::warn!(snapshot = name, length = data.len(), "unexpected snapshot length");
                }
                Ok(parsed)
            }
            Err(e) if e.is_transport() => Err(e),
            Err(e) => {
                tracing::warn!(snapshot = name, error = %e, "snapshot unavailable");
                Ok(None)
            }
        }
    }

    /// Sends the close request and shuts the control connection down.
    ///
    /// The client is disconnected afterwards even if the controller does not
    /// acknowledge. Does nothing if the client is not connected.
    ///
    /// # Errors
    ///
    /// Returns the handshake failure, reported after the state change.
    pub fn disconnect(&mut self) -> Result<()> {
        let Some(mut session) = self.session.take() else {
            return Ok(());
        };

        let result = close_control(&mut session.transport, self.config.close_timeout);
        session.transport.shutdown();

        match &result {
            Ok(()) => tracing::debug!(addr = %session.transport.remote_addr(), "session closed"),
            Err(e) => tracing::warn!(error = %e, "close handshake failed"),
        }
        result
    }

    fn session_mut(&mut self) -> Result<&mut Session> {
        self.session.as_mut().ok_or(FocasError::NotConnected)
    }

    /// Sends one command record and parses its response.
    ///
    /// # Errors
    ///
    /// Returns `NotConnected`, a transport error, or `InvalidResponse` /
    /// `UnexpectedFrame` for a malformed reply.
    pub fn execute_single(&mut self, command: &CommandRecord) -> Result<CommandResponse> {
        let session = self.session_mut()?;
        send_frame(&mut session.transport, FrameType::VarRequest, &command.to_bytes())?;
        let items = var_response_items(read_frame(&mut session.transport)?)?;
        CommandResponse::parse(command.opcode, &items[0])
    }

    /// Sends several command records in one frame and correlates the results.
    ///
    /// # Errors
    ///
    /// Returns `InvalidParameter` for an empty batch, `NotConnected`, a
    /// transport error, or `InvalidResponse` if the reply does not match the
    /// requests position by position.
    pub fn execute_batch(&mut self, commands: &[CommandRecord]) -> Result<Vec<ResultItem>> {
        if commands.is_empty() {
            return Err(FocasError::invalid_parameter(
                "commands",
                "batch must not be empty",
            ));
        }
        let sub_requests: Vec<Vec<u8>> = commands
            .iter()
            .map(CommandRecord::to_sub_request_bytes)
            .collect();
        let request = Frame::encode_batch(&sub_requests)?;

        let session = self.session_mut()?;
        tracing::trace!(count = commands.len(), "batch sent");
        session.transport.send_all(&request)?;
        let items = var_response_items(read_frame(&mut session.transport)?)?;
        demux_batch(commands, &items)
    }

    fn read_data(&mut self, command: &CommandRecord) -> Result<Vec<u8>> {
        self.execute_single(command)?.into_data()
    }

    /// A device error on a keyed read marks the key unavailable.
    fn read_keyed(&mut self, command: &CommandRecord) -> Result<Option<Vec<u8>>> {
        match self.read_data(command) {
            Ok(data) => Ok(Some(data)),
            Err(FocasError::DeviceError { code }) => {
                tracing::debug!(opcode = %command.opcode, code, "key unavailable");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    fn max_axis(&self) -> Result<u16> {
        let session = self.session.as_ref().ok_or(FocasError::NotConnected)?;
        session
            .identity
            .as_ref()
            .map(|identity| identity.max_axis)
            .ok_or_else(|| FocasError::invalid_response("system identity not available"))
    }

    /// Reads macro variables `first..=last`.
    ///
    /// A single key uses one request, a range uses one batch with one
    /// sub-request per key. Values are `None` when the controller reports
    /// the variable as empty.
    ///
    /// # Errors
    ///
    /// Returns `InvalidParameter` if `last < first`.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use fanuc_focas::{Client, ClientConfig, Reading};
    ///
    /// let mut client = Client::new(ClientConfig::new("192.168.1.10"));
    /// client.connect().unwrap();
    ///
    /// for (number, reading) in client.read_macros(500, 509).unwrap() {
    ///     match reading {
    ///         Reading::Value(Some(value)) => println!("#{number} = {value}"),
    ///         Reading::Value(None) => println!("#{number} is empty"),
    ///         Reading::Unavailable => println!("#{number} not readable"),
    ///     }
    /// }
    /// ```
    pub fn read_macros(&mut self, first: i32, last: i32) -> Result<KeyedRecord<Option<f64>>> {
        check_range(first, last)?;

        if first == last {
            let command = CommandRecord::new(OP_MACRO).with_params(&[first, last]);
            let reading = match self.read_keyed(&command)? {
                Some(data) if !data.is_empty() => Reading::Value(decode_number(&data, 0)),
                _ => Reading::Unavailable,
            };
            return Ok(BTreeMap::from([(first, reading)]));
        }

        let commands: Vec<CommandRecord> = (first..=last)
            .map(|key| CommandRecord::new(OP_MACRO).with_params(&[key, key]))
            .collect();
        let results = self.execute_batch(&commands)?;

        Ok((first..=last)
            .zip(results)
            .map(|(key, item)| {
                let reading = item.data().map_or(Reading::Unavailable, parse_prefixed_number);
                (key, reading)
            })
            .collect())
    }

    /// Reads one macro variable.
    pub fn read_macro(&mut self, number: i32) -> Result<Reading<Option<f64>>> {
        let mut record = self.read_macros(number, number)?;
        Ok(record.remove(&number).unwrap_or(Reading::Unavailable))
    }

    /// Reads the running and main program numbers.
    pub fn read_program_numbers(&mut self) -> Result<Option<ProgramNumbers>> {
        let data = self.read_data(&CommandRecord::new(OP_PROG_NUM))?;
        Ok(ProgramNumbers::parse(&data))
    }

    /// Reads the name of the executing program.
    pub fn read_program_name(&mut self) -> Result<Option<String>> {
        let data = self.read_data(&CommandRecord::new(OP_PROG_NAME))?;
        Ok(utf8_until_nul(&data))
    }

    /// Reads the executing block, returning at most `chars` characters of text.
    pub fn read_executing_block(&mut self, chars: i32) -> Result<Option<ExecutingBlock>> {
        let data = self.read_data(&CommandRecord::new(OP_EXEC_BLOCK).with_params(&[chars]))?;
        Ok(ExecutingBlock::parse(&data))
    }

    /// Reads the alarm status word.
    pub fn read_alarm(&mut self) -> Result<Option<u32>> {
        let data = self.read_data(&CommandRecord::new(OP_ALARM))?;
        Ok(if data.len() == 4 { be_u32(&data, 0) } else { None })
    }

    /// Reads parameters `first..=last` with the 2-family opcode.
    ///
    /// A range is read as one batch with one sub-request per group of
    /// `size` parameters, keyed by the group's first parameter.
    ///
    /// # Errors
    ///
    /// Returns `InvalidParameter` if `last < first` or `size` is zero.
    pub fn read_param2(&mut self, first: i32, last: i32, size: u16) -> Result<KeyedRecord<i32>> {
        check_range(first, last)?;
        if size == 0 {
            return Err(FocasError::invalid_parameter("size", "must be at least 1"));
        }

        if first == last {
            let command = CommandRecord::new(OP_PARAM2).with_params(&[first, last, 0, 0]);
            let reading = self
                .read_keyed(&command)?
                .and_then(|data| be_i32(&data, 0))
                .map_or(Reading::Unavailable, Reading::Value);
            return Ok(BTreeMap::from([(first, reading)]));
        }

        let step = i32::from(size);
        let keys: Vec<i32> = (first..=last).step_by(usize::from(size)).collect();
        let commands: Vec<CommandRecord> = keys
            .iter()
            .map(|&key| CommandRecord::new(OP_PARAM2).with_params(&[key, key.saturating_add(step - 1)]))
            .collect();
        let results = self.execute_batch(&commands)?;

        Ok(keys
            .into_iter()
            .zip(results)
            .map(|(key, item)| {
                let reading = item
                    .data()
                    .and_then(|payload| be_i32(payload, 0))
                    .map_or(Reading::Unavailable, Reading::Value);
                (key, reading)
            })
            .collect())
    }

    /// Reads parameters `first..=last` for `axis` (4-byte elements).
    ///
    /// # Errors
    ///
    /// Returns `InvalidResponse` if the system identity was not read at
    /// connect time, since the record stride depends on the axis count.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use fanuc_focas::{Client, ClientConfig};
    ///
    /// let mut client = Client::new(ClientConfig::new("192.168.1.10"));
    /// client.connect().unwrap();
    ///
    /// // Non-axis parameter: one value
    /// let params = client.read_params(0, 6711, 6711).unwrap();
    /// println!("{:?}", params[&6711].values);
    /// ```
    pub fn read_params(&mut self, axis: i32, first: i32, last: i32) -> Result<BTreeMap<i32, TypedRecord>> {
        check_range(first, last)?;
        let max_axis = self.max_axis()?;
        let data = self.read_data(&CommandRecord::new(OP_PARAM).with_params(&[first, last, axis]))?;
        Ok(parse_typed_records(&data, max_axis, ElementWidth::Four))
    }

    /// Reads diagnostics `first..=last` for `axis` (8-byte elements).
    ///
    /// # Errors
    ///
    /// Same as [`Client::read_params`].
    pub fn read_diagnostics(
        &mut self,
        axis: i32,
        first: i32,
        last: i32,
    ) -> Result<BTreeMap<i32, TypedRecord>> {
        check_range(first, last)?;
        let max_axis = self.max_axis()?;
        let data = self.read_data(&CommandRecord::new(OP_DIAG).with_params(&[first, last, axis]))?;
        Ok(parse_typed_records(&data, max_axis, ElementWidth::Eight))
    }

    /// Reads `count` PMC values of width `1 << data_type` starting at `first`.
    ///
    /// `data_type` is 0 (byte), 1 (word) or 2 (double word); the result maps
    /// each value's start address to the value.
    ///
    /// # Errors
    ///
    /// Returns `InvalidParameter` for an unknown data type or a count below 1,
    /// before any I/O.
    pub fn read_pmc(
        &mut self,
        data_type: u8,
        section: i32,
        first: i32,
        count: i32,
    ) -> Result<BTreeMap<i32, u32>> {
        if data_type > 2 {
            return Err(FocasError::invalid_parameter(
                "data_type",
                format!("must be 0, 1 or 2, got {data_type}"),
            ));
        }
        if count < 1 {
            return Err(FocasError::invalid_parameter("count", "must be at least 1"));
        }
        let last = (1i32 << data_type)
            .checked_mul(count)
            .and_then(|span| first.checked_add(span - 1))
            .ok_or_else(|| FocasError::invalid_parameter("count", "address range overflows"))?;

        let command = CommandRecord::new(OP_PMC).with_params(&[
            first,
            last,
            section,
            i32::from(data_type),
        ]);
        let data = self.read_data(&command)?;
        Ok(parse_pmc(&data, first, data_type))
    }

    /// Reads the controller clock in one batch of date and time requests.
    ///
    /// Returns `None` if either item fails or the fields are not a valid date.
    pub fn read_date_time(&mut self) -> Result<Option<ControllerDateTime>> {
        let commands = [
            CommandRecord::new(OP_DATE_TIME).with_params(&[0]),
            CommandRecord::new(OP_DATE_TIME).with_params(&[1]),
        ];
        let results = self.execute_batch(&commands)?;

        let (Some(date), Some(time)) = (results[0].data(), results[1].data()) else {
            return Ok(None);
        };
        if date.len() < 8 || time.len() < 8 {
            return Ok(None);
        }
        let fields = (
            be_u16(date, 2),
            be_u16(date, 4),
            be_u16(date, 6),
            be_u16(time, 2),
            be_u16(time, 4),
            be_u16(time, 6),
        );
        Ok(match fields {
            (Some(year), Some(month), Some(day), Some(hour), Some(minute), Some(second)) => {
                ControllerDateTime::new(year, month, day, hour, minute, second)
            }
            _ => None,
        })
    }

    /// Reads the requested position kinds for `axis` (`-1` for all axes) in one batch.
    ///
    /// Kinds are requested in [`PositionKind::ALL`] order; duplicates are ignored.
    ///
    /// # Errors
    ///
    /// Returns `InvalidParameter` if `kinds` is empty.
    pub fn read_axes(&mut self, kinds: &[PositionKind], axis: i32) -> Result<AxisPositions> {
        let selected: Vec<PositionKind> = PositionKind::ALL
            .into_iter()
            .filter(|kind| kinds.contains(kind))
            .collect();
        if selected.is_empty() {
            return Err(FocasError::invalid_parameter(
                "kinds",
                "at least one position kind is required",
            ));
        }

        let commands: Vec<CommandRecord> = selected
            .iter()
            .map(|kind| CommandRecord::new(OP_AXIS).with_params(&[kind.code(), axis]))
            .collect();
        let results = self.execute_batch(&commands)?;

        Ok(selected
            .into_iter()
            .zip(results)
            .map(|(kind, item)| {
                let reading = item
                    .data()
                    .map_or(Reading::Unavailable, |payload| Reading::Value(parse_number_list(payload)));
                (kind, reading)
            })
            .collect())
    }

    /// Reads the actual feed rate.
    pub fn read_actual_feed(&mut self) -> Result<Option<f64>> {
        self.read_encoded_scalar(CommandRecord::new(OP_ACT_FEED))
    }

    /// Reads the actual spindle speed.
    pub fn read_spindle_speed(&mut self) -> Result<Option<f64>> {
        self.read_encoded_scalar(CommandRecord::new(OP_ACT_SPINDLE_SPEED))
    }

    /// Reads the actual spindle load.
    pub fn read_spindle_load(&mut self) -> Result<Option<f64>> {
        self.read_encoded_scalar(CommandRecord::new(OP_ACT_SPINDLE_LOAD))
    }

    fn read_encoded_scalar(&mut self, command: CommandRecord) -> Result<Option<f64>> {
        let data = self.read_data(&command)?;
        Ok(if data.len() == 8 { decode_number(&data, 0) } else { None })
    }

    /// Reads the directory and file counts of `path`.
    pub fn read_dir_info(&mut self, path: &str) -> Result<Option<DirectoryInfo>> {
        let command = CommandRecord::new(OP_DIR_INFO)
            .with_params(&[0, 0, 0, 0, PATH_ARG_SIZE])
            .with_extra(path_block(path)?);
        let data = self.read_data(&command)?;
        Ok(DirectoryInfo::parse(&data))
    }

    /// Reads up to `count` entries of `path` starting at entry `first`.
    pub fn read_dir(&mut self, path: &str, first: i32, count: i32) -> Result<Vec<DirectoryEntry>> {
        let command = CommandRecord::new(OP_DIR_LIST)
            .with_params(&[first, count, 1, 1, PATH_ARG_SIZE])
            .with_extra(path_block(path)?);
        let data = self.read_data(&command)?;
        if data.len() < 8 {
            return Ok(Vec::new());
        }
        Ok(parse_directory(&data))
    }

    /// Reads every entry of `path`, one page of ten at a time.
    ///
    /// # Errors
    ///
    /// Returns `InvalidResponse` if the directory counts cannot be read.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use fanuc_focas::{Client, ClientConfig, EntryKind};
    ///
    /// let mut client = Client::new(ClientConfig::new("192.168.1.10"));
    /// client.connect().unwrap();
    ///
    /// for entry in client.read_dir_complete("//CNC_MEM/USER/PATH1/").unwrap() {
    ///     if entry.kind == EntryKind::File {
    ///         println!("{} {:?}", entry.name, entry.size);
    ///     }
    /// }
    /// ```
    pub fn read_dir_complete(&mut self, path: &str) -> Result<Vec<DirectoryEntry>> {
        let info = self
            .read_dir_info(path)?
            .ok_or_else(|| FocasError::invalid_response("directory info unavailable"))?;
        let total = info.total();

        let mut entries = Vec::new();
        let mut first = 0;
        while first < total {
            let page = self.read_dir(path, first, DIR_PAGE_SIZE)?;
            if page.is_empty() {
                break;
            }
            entries.extend(page);
            first += DIR_PAGE_SIZE;
        }
        tracing::debug!(path, total, read = entries.len(), "directory read");
        Ok(entries)
    }

    /// Lists registered programs with number, size and comment, starting at program `start`.
    pub fn list_programs(&mut self, start: i32) -> Result<Vec<ProgramListingEntry>> {
        let mut programs = Vec::new();
        let mut next = start;
        loop {
            let command = CommandRecord::new(OP_PROG_LIST).with_params(&[
                next,
                PROG_PAGE_SIZE,
                PROG_LIST_TYPE,
            ]);
            let data = self.read_data(&command)?;
            if data.is_empty() {
                break;
            }
            let page = parse_program_listing(&data);
            let Some(last) = page.last() else {
                break;
            };
            let following = i32::try_from(last.number).ok().and_then(|n| n.checked_add(1));
            programs.extend(page);
            match following {
                Some(n) if n > next => next = n,
                _ => break,
            }
        }
        Ok(programs)
    }

    /// Reads the first `max_size` bytes of a program's text.
    pub fn read_program_header(&mut self, name: &str, max_size: i32) -> Result<Option<String>> {
        let mut extra = max_size.to_be_bytes().to_vec();
        extra.extend_from_slice(name.as_bytes());
        let data = self.read_data(&CommandRecord::new(OP_PROG_HEADER).with_extra(extra))?;
        if data.is_empty() {
            return Ok(None);
        }
        let end = data.iter().position(|&b| b == 0).unwrap_or(data.len());
        Ok(Some(String::from_utf8_lossy(&data[..end]).into_owned()))
    }

    /// Deletes the program at `path` (e.g. `//CNC_MEM/USER/PATH1/O0001`).
    ///
    /// # Errors
    ///
    /// Returns `InvalidParameter` if the path does not start with `//`,
    /// before any I/O, and `DeviceError` if the controller rejects the delete.
    pub fn delete_program(&mut self, path: &str) -> Result<()> {
        check_network_path(path)?;
        let command = CommandRecord::new(OP_DELETE)
            .with_params(&[0, 0, 0, 0, PATH_ARG_SIZE])
            .with_extra(path_block(path)?);
        self.read_data(&command)?;
        tracing::debug!(path, "program deleted");
        Ok(())
    }

    /// Downloads a program's text over a separate transfer connection.
    ///
    /// `name` may be a number (`"12"`, `"O12"`), a name, or a range (`"O1-O5"`).
    /// The control connection is not needed.
    ///
    /// # Errors
    ///
    /// Returns a transport error if the transfer connection fails before the
    /// controller starts streaming.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use fanuc_focas::{Client, ClientConfig};
    /// use std::time::Duration;
    ///
    /// let client = Client::new(
    ///     ClientConfig::new("192.168.1.10").with_transfer_timeout(Duration::from_secs(3)),
    /// );
    ///
    /// let text = client.download_program("O0011").unwrap();
    /// std::fs::write("O0011.nc", text).unwrap();
    /// ```
    pub fn download_program(&self, name: &str) -> Result<String> {
        let addr = self.config.socket_addr()?;
        transfer::download(addr, self.config.transfer_timeout, &program_query(name))
    }

    /// Downloads program `number` over a separate transfer connection.
    pub fn download_program_number(&self, number: u32) -> Result<String> {
        let addr = self.config.socket_addr()?;
        transfer::download(addr, self.config.transfer_timeout, &program_number_query(number))
    }

    /// Uploads program text into the folder `path` over a separate transfer connection.
    ///
    /// # Errors
    ///
    /// Returns `InvalidParameter` if `path` does not start with `//` (before
    /// any I/O), `AlreadyExists` if the program exists and cannot be
    /// overwritten, and `WriteFailed` for any other rejection.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use fanuc_focas::{Client, ClientConfig, FocasError};
    ///
    /// let client = Client::new(ClientConfig::new("192.168.1.10"));
    /// let program = "%\nO1234 (DEMO)\nG00 X0 Y0\nM30\n%";
    ///
    /// match client.upload_program("//CNC_MEM/USER/PATH1/", program) {
    ///     Ok(()) => println!("uploaded"),
    ///     Err(FocasError::AlreadyExists) => println!("O1234 already registered"),
    ///     Err(e) => eprintln!("upload failed: {e}"),
    /// }
    /// ```
    pub fn upload_program(&self, path: &str, content: &str) -> Result<()> {
        check_network_path(path)?;
        let addr = self.config.socket_addr()?;
        transfer::upload(addr, self.config.transfer_timeout, path, content)
    }
}

impl Drop for Client {
    fn drop(&mut self) {
        if let Some(session) = self.session.take() {
            session.transport.shutdown();
        }
    }
}

fn open_control(transport: &mut TcpTransport) -> Result<()> {
    send_frame(transport, FrameType::OpenRequest, &CONTROL_OPEN_PAYLOAD)?;
    let reply = read_frame(transport)?;
    if reply.frame_type != FrameType::OpenResponse {
        return Err(FocasError::unexpected_frame(
            FrameType::OpenResponse.code(),
            reply.frame_type.code(),
        ));
    }
    Ok(())
}

fn close_control(transport: &mut TcpTransport, timeout: Duration) -> Result<()> {
    transport.set_read_timeout(timeout)?;
    send_frame(transport, FrameType::CloseRequest, &[])?;
    let reply = read_frame(transport)?;
    if reply.frame_type != FrameType::CloseResponse {
        return Err(FocasError::unexpected_frame(
            FrameType::CloseResponse.code(),
            reply.frame_type.code(),
        ));
    }
    Ok(())
}

fn check_range(first: i32, last: i32) -> Result<()> {
    if last < first {
        return Err(FocasError::invalid_parameter(
            "last",
            format!("{last} is below first {first}"),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn disconnected() -> Client {
        Client::new(ClientConfig::new("127.0.0.1").with_port(1))
    }

    #[test]
    fn test_config_defaults() {
        let config = ClientConfig::new("cnc-01");
        assert_eq!(config.host, "cnc-01");
        assert_eq!(config.port, 8193);
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.close_timeout, Duration::from_secs(1));
        assert_eq!(config.transfer_timeout, Duration::from_secs(1));
    }

    #[test]
    fn test_config_builder() {
        let config = ClientConfig::new("10.0.0.5")
            .with_port(8194)
            .with_timeout(Duration::from_millis(500))
            .with_close_timeout(Duration::from_millis(200))
            .with_transfer_timeout(Duration::from_secs(3));
        assert_eq!(config.port, 8194);
        assert_eq!(config.timeout, Duration::from_millis(500));
        assert_eq!(config.close_timeout, Duration::from_millis(200));
        assert_eq!(config.transfer_timeout, Duration::from_secs(3));
    }

    #[test]
    fn test_new_client_is_disconnected() {
        let client = disconnected();
        assert_eq!(client.state(), ConnectionState::Disconnected);
        assert!(!client.is_connected());
        assert!(client.system_identity().is_none());
        assert!(client.status().is_none());
    }

    #[test]
    fn test_accessors_require_connection() {
        let mut client = disconnected();
        assert!(matches!(client.read_alarm(), Err(FocasError::NotConnected)));
        assert!(matches!(client.read_macros(100, 102), Err(FocasError::NotConnected)));
        assert!(matches!(client.read_params(-1, 1, 1), Err(FocasError::NotConnected)));
    }

    #[test]
    fn test_disconnect_when_disconnected_is_noop() {
        let mut client = disconnected();
        assert!(client.disconnect().is_ok());
        assert_eq!(client.state(), ConnectionState::Disconnected);
    }

    #[test]
    fn test_argument_validation_precedes_io() {
        let mut client = disconnected();
        assert!(matches!(
            client.upload_program("CNC_MEM/USER/", "%\nO1\n%"),
            Err(FocasError::InvalidParameter { .. })
        ));
        assert!(matches!(
            client.delete_program("/CNC_MEM/USER/PATH1/O1"),
            Err(FocasError::InvalidParameter { .. })
        ));
        assert!(matches!(
            client.read_pmc(3, 0, 0, 1),
            Err(FocasError::InvalidParameter { .. })
        ));
        assert!(matches!(
            client.read_pmc(0, 0, 0, 0),
            Err(FocasError::InvalidParameter { .. })
        ));
        assert!(matches!(
            client.read_macros(10, 9),
            Err(FocasError::InvalidParameter { .. })
        ));
        assert!(matches!(
            client.read_param2(1, 5, 0),
            Err(FocasError::InvalidParameter { .. })
        ));
        assert!(matches!(
            client.read_axes(&[], -1),
            Err(FocasError::InvalidParameter { .. })
        ));
        assert!(matches!(
            client.execute_batch(&[]),
            Err(FocasError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn test_position_kind_order_and_codes() {
        let codes: Vec<i32> = PositionKind::ALL.iter().map(|k| k.code()).collect();
        assert_eq!(codes, vec![4, 6, 1, 8, 7]);
        assert!(PositionKind::Absolute < PositionKind::DistanceToGo);
    }
}
