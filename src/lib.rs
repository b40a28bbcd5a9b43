#![warn(missing_docs)]

//! Client library for the KW1281 diagnostic protocol used by VW-group
//! engine control units.
//!
//! KW1281 runs over a K-line serial adapter. This crate performs the
//! 5-baud bit-banged wake-up handshake, the byte-level echo/ack framing
//! discipline, block-counter synchronization, measurement-group requests,
//! and decoding of raw measurement triplets into typed physical values.
//!
//! ```no_run
//! use kw1281::{CancelToken, Callbacks, ConnectConfig, Connection};
//!
//! # fn main() -> kw1281::Result<()> {
//! let mut conn = Connection::connect(&ConnectConfig::new("/dev/ttyUSB0"))?;
//! println!("talking to {}", conn.ecu_details().part_number);
//!
//! let requester = conn.request_sender();
//! requester.request_measurement_group(1)?;
//!
//! let cancel = CancelToken::new();
//! conn.start(cancel, Callbacks::default())?;
//! # Ok(())
//! # }
//! ```
//!
//! Out of scope: other OBD protocols (KWP2000, ISO-14230, CAN), fault code
//! write-back beyond `ClearErrors`, fault code decoding, baud rates other
//! than 9600bps, and concurrent sessions to multiple ECUs.

pub mod block;
pub mod cancel;
pub mod config;
pub mod datalink;
pub mod error;
pub mod metrics;
pub mod port;
pub mod session;
pub mod timing;
pub mod transform;
pub mod wakeup;

pub use block::{Block, BlockType};
pub use cancel::CancelToken;
pub use config::ConnectConfig;
pub use error::{Error, Result};
pub use metrics::{Measurement, Metric};
pub use port::{SerialPort, SerialPortHandle};
pub use session::{Callbacks, Connection, EcuDetails, RequestSender};
pub use timing::Timing;
pub use transform::MeasurementValue;
