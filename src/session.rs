//! Connection lifecycle and the session loop: startup phase, main loop,
//! the single-slot request mailbox, and the public `Connect`/`Start`/
//! `RequestMeasurementGroup`/`Close` surface.

use std::sync::mpsc;

use tracing::{debug, error, info, warn};

use crate::block::{recv_block, send_block, Block, BlockType};
use crate::cancel::CancelToken;
use crate::config::ConnectConfig;
use crate::error::{Error, Result};
use crate::metrics::{decode_group, Measurement};
use crate::port::{SerialPort, SerialPortHandle};
use crate::timing::Timing;
use crate::wakeup::wake_up;

/// ECU identification text collected during the startup phase.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EcuDetails {
    /// The first ASCII block, treated as the ECU part number.
    pub part_number: String,
    /// Any subsequent ASCII blocks.
    pub details: Vec<String>,
}

/// Optional hooks the session loop invokes.
///
/// `ecu_details` fires once, before the main loop starts consuming blocks.
/// `measurement` fires once per decoded MeasurementGroup reply, synchronously
/// from the session task and in receive order -- it must not block
/// indefinitely, or it stalls the loop.
#[derive(Default)]
pub struct Callbacks {
    /// Invoked once with the cached ECU details before the main loop starts.
    pub ecu_details: Option<Box<dyn FnMut(&EcuDetails) + Send>>,
    /// Invoked on each decoded measurement group reply with `(group_id, measurements)`.
    pub measurement: Option<Box<dyn FnMut(u8, &[Measurement; 3]) + Send>>,
}

/// Producer-side handle for [`Connection::request_sender`].
///
/// Backed by a `sync_channel(1)`: a single-slot mailbox rather than a shared
/// mutable reference, so "one pending request at a time" holds without a
/// lock and the producer naturally blocks when a request is already queued.
#[derive(Clone)]
pub struct RequestSender(mpsc::SyncSender<u8>);

impl RequestSender {
    /// Enqueue a `GetMeasurementGroup(group)` request. Blocks if a request
    /// is already pending and not yet consumed by the session loop.
    pub fn request_measurement_group(&self, group: u8) -> Result<()> {
        self.0
            .send(group)
            .map_err(|_| Error::Protocol("session loop is no longer running".into()))
    }
}

/// An open KW1281 session: the serial port, block counter, cached ECU
/// details, and the request mailbox.
pub struct Connection {
    port: Option<Box<dyn SerialPort>>,
    counter: u8,
    details: EcuDetails,
    request_rx: mpsc::Receiver<u8>,
    request_tx: mpsc::SyncSender<u8>,
}

impl Connection {
    /// Open `config.port_name`, run the wake-up handshake, then the startup
    /// phase, caching the ECU's identification text.
    pub fn connect(config: &ConnectConfig) -> Result<Self> {
        info!(port = %config.port_name, "connecting");
        let port = SerialPortHandle::open(&config.port_name, config.baud, config.read_timeout)?;
        Self::connect_with_port(Box::new(port), &config.timing)
    }

    pub(crate) fn connect_with_port(mut port: Box<dyn SerialPort>, timing: &Timing) -> Result<Self> {
        wake_up(&mut *port, timing)?;
        debug!("wake-up complete, counter initialized to 1");

        let mut counter = 1u8;
        let details = run_startup_phase(&mut *port, &mut counter)?;
        info!(part_number = %details.part_number, "startup phase complete");

        let (request_tx, request_rx) = mpsc::sync_channel(1);

        Ok(Self {
            port: Some(port),
            counter,
            details,
            request_rx,
            request_tx,
        })
    }

    /// The ECU identification text cached during the startup phase.
    pub fn ecu_details(&self) -> &EcuDetails {
        &self.details
    }

    /// A cloneable handle for calling [`RequestSender::request_measurement_group`]
    /// from outside the task driving [`Connection::start`].
    pub fn request_sender(&self) -> RequestSender {
        RequestSender(self.request_tx.clone())
    }

    /// Run the main loop until `cancel` is observed or a fatal I/O/protocol
    /// error occurs. Blocking; see [`Connection::start_async`] for use from
    /// an async context.
    pub fn start(&mut self, cancel: CancelToken, mut callbacks: Callbacks) -> Result<()> {
        let port = self.port.as_deref_mut().ok_or(Error::AlreadyClosed)?;

        if let Some(cb) = callbacks.ecu_details.as_mut() {
            cb(&self.details);
        }

        let mut pending_group: Option<u8> = None;

        loop {
            let received = recv_block(port, &mut self.counter)?;

            if received.block_type == BlockType::MeasurementGroup {
                if let Some(group_id) = pending_group {
                    match decode_group(group_id, &received.data) {
                        Ok(measurements) => {
                            if let Some(cb) = callbacks.measurement.as_mut() {
                                cb(group_id, &measurements);
                            }
                        }
                        Err(err) => {
                            error!(%err, group_id, "failed to decode measurement group");
                            return Err(err);
                        }
                    }
                } else {
                    warn!("measurement group reply with no outstanding request; ignoring");
                }
            }

            let to_send = match self.request_rx.try_recv() {
                Ok(group) => {
                    pending_group = Some(group);
                    Block {
                        block_type: BlockType::GetMeasurementGroup,
                        data: vec![group],
                    }
                }
                Err(_) => Block::empty(BlockType::Ack),
            };

            send_block(port, &mut self.counter, &to_send)?;

            if cancel.is_cancelled() {
                debug!("cancellation observed after block exchange; stopping");
                return Ok(());
            }
        }
    }

    /// Run [`Connection::start`] without blocking the calling async task's
    /// worker thread (via [`tokio::task::block_in_place`]); requires a
    /// multi-threaded tokio runtime.
    pub async fn start_async(&mut self, cancel: CancelToken, callbacks: Callbacks) -> Result<()> {
        tokio::task::block_in_place(|| self.start(cancel, callbacks))
    }

    /// Close the port. Fails if already closed.
    pub fn close(&mut self) -> Result<()> {
        match self.port.take() {
            Some(_) => Ok(()),
            None => Err(Error::AlreadyClosed),
        }
    }
}

/// Read blocks and reply ACK until an inbound ACK block arrives. ASCII
/// blocks carry ECU identification text: the first is the part number,
/// subsequent ones are details.
fn run_startup_phase(port: &mut dyn SerialPort, counter: &mut u8) -> Result<EcuDetails> {
    let mut part_number: Option<String> = None;
    let mut details = Vec::new();

    loop {
        let block = recv_block(port, counter)?;

        match block.block_type {
            BlockType::Ascii => {
                let text = String::from_utf8_lossy(&block.data).trim().to_string();
                if part_number.is_none() {
                    part_number = Some(text);
                } else {
                    details.push(text);
                }
                send_block(port, counter, &Block::empty(BlockType::Ack))?;
            }
            BlockType::Ack => {
                return match part_number {
                    Some(part_number) => Ok(EcuDetails { part_number, details }),
                    None => Err(Error::Protocol(
                        "ACK received before any part number during startup".into(),
                    )),
                };
            }
            other => {
                return Err(Error::Protocol(format!(
                    "unexpected block type {:?} during startup",
                    other
                )));
            }
        }
    }
}
