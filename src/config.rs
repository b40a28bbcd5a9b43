//! Connection configuration.

use std::time::Duration;

use crate::timing::Timing;

/// Parameters used by [`crate::session::Connection::connect`].
#[derive(Debug, Clone)]
pub struct ConnectConfig {
    /// OS device name of the serial port, e.g. `/dev/ttyUSB0` or `COM3`.
    pub port_name: String,
    /// Baud rate used once the wake-up handshake completes. KW1281 is
    /// 9600bps only; this field exists for the rare adapter that needs a
    /// nonstandard value, not for protocol negotiation.
    pub baud: u32,
    /// Per-byte read timeout.
    pub read_timeout: Duration,
    /// Wake-up bit-bang delays; override to [`Timing::zero`] in tests.
    pub timing: Timing,
}

impl Default for ConnectConfig {
    fn default() -> Self {
        Self {
            port_name: String::new(),
            baud: 9600,
            read_timeout: Duration::from_millis(300),
            timing: Timing::default(),
        }
    }
}

impl ConnectConfig {
    /// A config for `port_name` with every other field at its default.
    pub fn new(port_name: impl Into<String>) -> Self {
        Self {
            port_name: port_name.into(),
            ..Self::default()
        }
    }
}
