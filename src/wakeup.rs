//! 5-baud bit-banged wake-up sequence.
//!
//! The ECU listens for its address (always `0x01`) sent at 5 bps, a rate no
//! host UART can produce natively. The core simulates it by toggling the
//! BREAK and RTS control lines against wall-clock sleeps, then hands off to
//! the UART at its normal baud rate once the ECU replies with its sync
//! bytes.
//!
//! Polarity convention: "one = idle = HIGH". On an adapter that inverts
//! through a transistor, driving BREAK+RTS produces a LOW line level, and
//! releasing both produces HIGH (idle).

use std::thread::sleep;

use tracing::{debug, warn};

use crate::datalink::{complement, send_byte};
use crate::error::{Error, Result};
use crate::port::SerialPort;
use crate::timing::Timing;

const ECU_ADDRESS: u8 = 0x01;
const EXPECTED_SYNC: [u8; 3] = [0x55, 0x01, 0x8A];

fn drive_line(port: &mut dyn SerialPort, idle: bool) -> Result<()> {
    // idle (logical 1) is BREAK off + RTS off; logical 0 is both on.
    port.set_break(!idle)?;
    port.set_rts(!idle)?;
    Ok(())
}

/// Run the 5-baud wake-up handshake. On success the port has been switched
/// back to its normal UART baud rate and the ECU has echoed the expected
/// sync bytes; the caller is responsible for setting the outbound counter
/// to 1 afterwards.
pub fn wake_up(port: &mut dyn SerialPort, timing: &Timing) -> Result<()> {
    debug!(address = format_args!("0x{:02x}", ECU_ADDRESS), "starting 5-baud wake-up");
    port.flush()?;
    port.set_dtr(false)?;

    drive_line(port, true)?; // idle
    sleep(timing.reset_delay);

    drive_line(port, false)?; // start bit: logical 0
    sleep(timing.baud_delay);

    // Emits a second logical 1 here before the data bits. A canonical UART
    // start bit is logical 0; preserved as-is since this is what has been
    // observed to wake real ECUs.
    drive_line(port, true)?;
    sleep(timing.baud_delay);

    for n in (0..=7).rev() {
        let bit = (ECU_ADDRESS >> n) & 1;
        drive_line(port, bit == 1)?;
        sleep(timing.baud_delay);
    }

    port.set_break(false)?;
    port.flush()?;
    port.set_dtr(true)?;

    let mut sync = [0u8; 3];
    port.read_exact(&mut sync)?;
    if sync != EXPECTED_SYNC {
        warn!(got = format_args!("{:02x?}", sync), "wrong baud: unexpected sync bytes");
        return Err(Error::Protocol(format!(
            "wrong baud: expected sync {:02x?}, got {:02x?}",
            EXPECTED_SYNC, sync
        )));
    }
    debug!(sync = format_args!("{:02x?}", sync), "sync bytes received");

    send_byte(port, complement(EXPECTED_SYNC[2]))?;
    debug!("wake-up complete, counter will initialize to 1");

    Ok(())
}
