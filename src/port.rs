//! Serial port abstraction consumed by the protocol core.
//!
//! The core never talks to a concrete serial library directly; it consumes
//! the narrow [`SerialPort`] capability set, which makes the wake-up and
//! datalink code testable against an in-memory mock (see `tests` modules
//! throughout this crate).

use std::io;
use std::time::Duration;

/// The capability set the KW1281 core needs from a serial port.
///
/// Implementors are expected to provide exact-length reads honoring a
/// configured read timeout, raw writes, buffer flushing, and the three
/// control lines the wake-up sequence bit-bangs.
pub trait SerialPort: Send {
    /// Read exactly `buf.len()` bytes, or fail once the port's read timeout
    /// elapses before that many bytes have arrived.
    fn read_exact(&mut self, buf: &mut [u8]) -> io::Result<()>;

    /// Write all of `buf`.
    fn write_all(&mut self, buf: &[u8]) -> io::Result<()>;

    /// Flush buffered input and output.
    fn flush(&mut self) -> io::Result<()>;

    /// Drive the BREAK line.
    fn set_break(&mut self, on: bool) -> io::Result<()>;

    /// Drive the RTS (Request To Send) control line.
    fn set_rts(&mut self, on: bool) -> io::Result<()>;

    /// Drive the DTR (Data Terminal Ready) control line.
    fn set_dtr(&mut self, on: bool) -> io::Result<()>;
}

/// A [`SerialPort`] backed by the `serialport` crate.
///
/// Opened 8N1, no flow control, at the configured baud rate (9600 for a
/// standard KW1281 adapter) and read timeout (300ms by default, see
/// [`crate::config::ConnectConfig`]).
pub struct SerialPortHandle {
    inner: Box<dyn serialport::SerialPort>,
}

impl SerialPortHandle {
    /// Open `port_name` at the given baud rate (9600 8N1 for a standard
    /// KW1281 adapter) with the given read timeout.
    pub fn open(port_name: &str, baud: u32, read_timeout: Duration) -> io::Result<Self> {
        let inner = serialport::new(port_name, baud)
            .timeout(read_timeout)
            .data_bits(serialport::DataBits::Eight)
            .parity(serialport::Parity::None)
            .stop_bits(serialport::StopBits::One)
            .flow_control(serialport::FlowControl::None)
            .open()
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;

        Ok(Self { inner })
    }
}

impl SerialPort for SerialPortHandle {
    fn read_exact(&mut self, buf: &mut [u8]) -> io::Result<()> {
        io::Read::read_exact(&mut self.inner, buf)
    }

    fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        io::Write::write_all(&mut self.inner, buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner
            .clear(serialport::ClearBuffer::All)
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e))
    }

    fn set_break(&mut self, on: bool) -> io::Result<()> {
        if on {
            self.inner.set_break()
        } else {
            self.inner.clear_break()
        }
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e))
    }

    fn set_rts(&mut self, on: bool) -> io::Result<()> {
        self.inner
            .write_request_to_send(on)
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e))
    }

    fn set_dtr(&mut self, on: bool) -> io::Result<()> {
        self.inner
            .write_data_terminal_ready(on)
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e))
    }
}
