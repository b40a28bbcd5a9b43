//! Block framing: encode/decode and block-counter synchronization.
//!
//! Wire layout of one block, in order: `[length][counter][type][data...][0x03]`.
//! Every byte except the trailing end marker goes through the echo/ack
//! discipline in [`crate::datalink`].

use tracing::debug;

use crate::datalink::{recv_byte, send_byte, send_byte_ack};
use crate::error::{Error, FramingError, Result};
use crate::port::SerialPort;

/// The byte that terminates every block; read/written raw, with no ack.
pub const END_MARKER: u8 = 0x03;

const MIN_BLOCK_LENGTH: u8 = 3;

/// Known KW1281 block type codes, with an escape hatch for anything else
/// seen on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockType {
    /// `0x00`: placeholder, unused.
    Null,
    /// `0x05`: request to clear stored fault codes.
    ClearErrors,
    /// `0x06`: ends an output-only exchange.
    EndOutput,
    /// `0x07`: request stored fault codes.
    GetErrors,
    /// `0x09`: acknowledgement with no payload.
    Ack,
    /// `0x29`: request a measurement group; data is `[group_id]`.
    GetMeasurementGroup,
    /// `0xE7`: measurement group reply; data is 3 triplets (9 bytes).
    MeasurementGroup,
    /// `0xF6`: ASCII identification text sent during startup.
    Ascii,
    /// `0xFC`: stored fault code data.
    Errors,
    /// Any block type code this crate does not otherwise name.
    Other(u8),
}

impl From<u8> for BlockType {
    fn from(v: u8) -> Self {
        match v {
            0x00 => Self::Null,
            0x05 => Self::ClearErrors,
            0x06 => Self::EndOutput,
            0x07 => Self::GetErrors,
            0x09 => Self::Ack,
            0x29 => Self::GetMeasurementGroup,
            0xE7 => Self::MeasurementGroup,
            0xF6 => Self::Ascii,
            0xFC => Self::Errors,
            other => Self::Other(other),
        }
    }
}

impl From<BlockType> for u8 {
    fn from(t: BlockType) -> u8 {
        match t {
            BlockType::Null => 0x00,
            BlockType::ClearErrors => 0x05,
            BlockType::EndOutput => 0x06,
            BlockType::GetErrors => 0x07,
            BlockType::Ack => 0x09,
            BlockType::GetMeasurementGroup => 0x29,
            BlockType::MeasurementGroup => 0xE7,
            BlockType::Ascii => 0xF6,
            BlockType::Errors => 0xFC,
            BlockType::Other(v) => v,
        }
    }
}

/// One KW1281 framing unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    /// The block's type code.
    pub block_type: BlockType,
    /// Payload, 0 to 252 bytes.
    pub data: Vec<u8>,
}

impl Block {
    /// Construct an empty-payload block of the given type, e.g. an ACK.
    pub fn empty(block_type: BlockType) -> Self {
        Self {
            block_type,
            data: Vec::new(),
        }
    }

    /// On-the-wire size: `data.len() + 3` (length, counter, type bytes; the
    /// end marker is not counted).
    pub fn size(&self) -> usize {
        self.data.len() + 3
    }
}

/// Receive one block, validating its counter against `*counter`, and advance
/// `*counter` by one (wrapping) on success.
pub fn recv_block(port: &mut dyn SerialPort, counter: &mut u8) -> Result<Block> {
    let length = recv_byte(port)?;
    if length < MIN_BLOCK_LENGTH {
        return Err(FramingError::LengthTooShort(length).into());
    }

    let received_counter = recv_byte(port)?;
    if received_counter != *counter {
        return Err(FramingError::CounterMismatch {
            expected: *counter,
            actual: received_counter,
        }
        .into());
    }

    let block_type = recv_byte(port)?;

    let data_len = (length - MIN_BLOCK_LENGTH) as usize;
    let mut data = Vec::with_capacity(data_len);
    for _ in 0..data_len {
        data.push(recv_byte(port)?);
    }

    let mut end = [0u8; 1];
    port.read_exact(&mut end)?;
    if end[0] != END_MARKER {
        return Err(FramingError::MissingEndMarker(end[0]).into());
    }

    *counter = counter.wrapping_add(1);

    debug!(length, counter = received_counter, block_type = format_args!("0x{:02x}", block_type), "received block");

    Ok(Block {
        block_type: block_type.into(),
        data,
    })
}

/// Send `block`, using and advancing `*counter` by one (wrapping).
pub fn send_block(port: &mut dyn SerialPort, counter: &mut u8, block: &Block) -> Result<()> {
    let sent_counter = *counter;
    let block_type: u8 = block.block_type.into();

    send_byte_ack(port, block.size() as u8)?;
    send_byte_ack(port, *counter)?;
    *counter = counter.wrapping_add(1);
    send_byte_ack(port, block_type)?;

    for &b in &block.data {
        send_byte_ack(port, b)?;
    }

    send_byte(port, END_MARKER)?;

    debug!(length = block.size(), counter = sent_counter, block_type = format_args!("0x{:02x}", block_type), "sent block");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datalink::complement;
    use crate::port::mock::MockSerialPort;

    fn stage_recv_block(port: &mut MockSerialPort, length: u8, counter: u8, block_type: u8, data: &[u8]) {
        port.stage(&[length]);
        port.stage(&[complement(length)]);
        port.stage(&[counter]);
        port.stage(&[complement(counter)]);
        port.stage(&[block_type]);
        port.stage(&[complement(block_type)]);
        for &b in data {
            port.stage(&[b]);
            port.stage(&[complement(b)]);
        }
        port.stage(&[END_MARKER]);
    }

    #[test]
    fn receives_ack_block() {
        let mut port = MockSerialPort::default();
        stage_recv_block(&mut port, 3, 5, 0x09, &[]);

        let mut counter = 5;
        let block = recv_block(&mut port, &mut counter).unwrap();
        assert_eq!(block.block_type, BlockType::Ack);
        assert!(block.data.is_empty());
        assert_eq!(counter, 6);
    }

    #[test]
    fn receives_block_with_data() {
        let mut port = MockSerialPort::default();
        stage_recv_block(&mut port, 12, 1, 0xE7, &[0x01, 0xc8, 0x31, 0x05, 0x07, 0xd4, 0x05, 0x0e, 0xbf]);

        let mut counter = 1;
        let block = recv_block(&mut port, &mut counter).unwrap();
        assert_eq!(block.block_type, BlockType::MeasurementGroup);
        assert_eq!(block.data, vec![0x01, 0xc8, 0x31, 0x05, 0x07, 0xd4, 0x05, 0x0e, 0xbf]);
        assert_eq!(counter, 2);
    }

    #[test]
    fn rejects_length_below_minimum() {
        let mut port = MockSerialPort::default();
        port.stage(&[2]);
        port.stage(&[complement(2)]);

        let mut counter = 1;
        let err = recv_block(&mut port, &mut counter).unwrap_err();
        assert!(matches!(err, Error::Framing(FramingError::LengthTooShort(2))));
    }

    #[test]
    fn rejects_counter_mismatch() {
        let mut port = MockSerialPort::default();
        stage_recv_block(&mut port, 3, 9, 0x09, &[]);

        let mut counter = 1;
        let err = recv_block(&mut port, &mut counter).unwrap_err();
        assert!(matches!(
            err,
            Error::Framing(FramingError::CounterMismatch { expected: 1, actual: 9 })
        ));
    }

    #[test]
    fn rejects_missing_end_marker() {
        let mut port = MockSerialPort::default();
        port.stage(&[3]);
        port.stage(&[complement(3)]);
        port.stage(&[1]);
        port.stage(&[complement(1)]);
        port.stage(&[0x09]);
        port.stage(&[complement(0x09)]);
        port.stage(&[0xAA]); // wrong end marker

        let mut counter = 1;
        let err = recv_block(&mut port, &mut counter).unwrap_err();
        assert!(matches!(err, Error::Framing(FramingError::MissingEndMarker(0xAA))));
    }

    #[test]
    fn counter_rolls_over_past_0xff() {
        let mut port = MockSerialPort::default();
        stage_recv_block(&mut port, 3, 0xFF, 0x09, &[]);

        let mut counter = 0xFF;
        let block = recv_block(&mut port, &mut counter).unwrap();
        assert_eq!(block.block_type, BlockType::Ack);
        assert_eq!(counter, 0x00);
    }

    #[test]
    fn sends_ack_block() {
        let mut port = MockSerialPort::default();
        // size=3, counter ack, type ack, end echo
        port.stage(&[3]);
        port.stage(&[complement(3)]);
        let mut counter = 4u8;
        port.stage(&[counter]);
        port.stage(&[complement(counter)]);
        port.stage(&[0x09]);
        port.stage(&[complement(0x09)]);
        port.stage(&[END_MARKER]);

        send_block(&mut port, &mut counter, &Block::empty(BlockType::Ack)).unwrap();
        assert_eq!(counter, 5);
        assert_eq!(port.write_buf, vec![3, 4, 0x09, END_MARKER]);
    }

    #[test]
    fn sends_get_measurement_group_request() {
        let mut port = MockSerialPort::default();
        let block = Block {
            block_type: BlockType::GetMeasurementGroup,
            data: vec![4],
        };
        assert_eq!(block.size(), 4);

        let mut counter = 9u8;
        port.stage(&[4]);
        port.stage(&[complement(4)]);
        port.stage(&[counter]);
        port.stage(&[complement(counter)]);
        port.stage(&[0x29]);
        port.stage(&[complement(0x29)]);
        port.stage(&[4]);
        port.stage(&[complement(4)]);
        port.stage(&[END_MARKER]);

        send_block(&mut port, &mut counter, &block).unwrap();
        assert_eq!(port.write_buf, vec![4, 9, 0x29, 4, END_MARKER]);
    }

    #[test]
    fn send_counter_rolls_over() {
        let mut port = MockSerialPort::default();
        let mut counter = 0xFFu8;
        port.stage(&[3]);
        port.stage(&[complement(3)]);
        port.stage(&[0xFF]);
        port.stage(&[complement(0xFF)]);
        port.stage(&[0x09]);
        port.stage(&[complement(0x09)]);
        port.stage(&[END_MARKER]);

        send_block(&mut port, &mut counter, &Block::empty(BlockType::Ack)).unwrap();
        assert_eq!(counter, 0x00);
    }

    #[test]
    fn round_trip_send_then_recv_preserves_block_and_counter() {
        let cases = vec![
            Block::empty(BlockType::Ack),
            Block {
                block_type: BlockType::GetMeasurementGroup,
                data: vec![3],
            },
            Block {
                block_type: BlockType::MeasurementGroup,
                data: vec![0x01, 0xC8, 0x31, 0x05, 0x07, 0xD4, 0x05, 0x0E, 0xBF],
            },
            Block {
                block_type: BlockType::Ascii,
                data: b"1297052 REGELUNG".to_vec(),
            },
            Block {
                block_type: BlockType::Other(0x42),
                data: vec![0xAA; 252],
            },
        ];

        for block in cases {
            let mut sender = MockSerialPort::default();
            let mut send_counter = 0x10u8;
            send_block(&mut sender, &mut send_counter, &block).unwrap();

            let mut receiver = MockSerialPort::loopback_from(&sender.write_buf);
            let mut recv_counter = 0x10u8;
            let received = recv_block(&mut receiver, &mut recv_counter).unwrap();

            assert_eq!(received, block);
            assert_eq!(recv_counter, send_counter);
        }
    }

    #[test]
    fn round_trip_advances_counter_identically_across_rollover() {
        let block = Block::empty(BlockType::Ack);

        let mut sender = MockSerialPort::default();
        let mut send_counter = 0xFFu8;
        send_block(&mut sender, &mut send_counter, &block).unwrap();

        let mut receiver = MockSerialPort::loopback_from(&sender.write_buf);
        let mut recv_counter = 0xFFu8;
        let received = recv_block(&mut receiver, &mut recv_counter).unwrap();

        assert_eq!(received, block);
        assert_eq!(recv_counter, 0x00);
        assert_eq!(recv_counter, send_counter);
    }
}
