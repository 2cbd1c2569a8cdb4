//! Unit tests for SMBus transaction emulation

use crate::common::create_bus;
use fpga_i2c::i2c::registers::cfg;
use fpga_i2c::i2c::{
    ArgumentError, Block, Direction, Error, I2cAlgorithm, IoFault, SmbusData, SmbusSize,
};
use hex_literal::hex;

const DEV: u8 = 0x50;

#[test]
fn test_read_byte() {
    let (bus, sim, _logger) = create_bus(1);
    sim.set_register(0, DEV, 0x00, &[0x5a]);

    assert_eq!(bus.channel(0).unwrap().read_byte(DEV), Ok(0x5a));
    let record = sim.last_transfer();
    assert!(record.tx.is_empty(), "Receive byte sends no command");
    assert_eq!(record.rx_len, 1);
    assert_eq!(record.config & cfg::ACK_POLARITY, cfg::ACK_POLARITY);
}

#[test]
fn test_write_byte_sends_command_only() {
    let (bus, sim, _logger) = create_bus(1);
    sim.add_target(0, DEV);

    bus.channel(0).unwrap().write_byte(DEV, 0x07).unwrap();
    let record = sim.last_transfer();
    assert_eq!(record.tx, vec![0x07]);
    assert_eq!(record.control, (u32::from(DEV) << 17) | (1 << 8));
}

#[test]
fn test_byte_data_read_and_write() {
    let (bus, sim, _logger) = create_bus(1);
    sim.set_register(0, DEV, 0x10, &[0x99]);
    let channel = bus.channel(0).unwrap();

    assert_eq!(channel.read_byte_data(DEV, 0x10), Ok(0x99));
    let record = sim.last_transfer();
    assert_eq!(record.tx, vec![0x10]);
    assert_eq!(record.rx_len, 1);

    channel.write_byte_data(DEV, 0x11, 0x42).unwrap();
    assert_eq!(sim.last_transfer().tx, vec![0x11, 0x42]);
    assert_eq!(sim.last_transfer().rx_len, 0);
}

#[test]
fn test_word_data_is_little_endian() {
    let (bus, sim, _logger) = create_bus(1);
    sim.set_register(0, DEV, 0x20, &hex!("34 12"));
    let channel = bus.channel(0).unwrap();

    assert_eq!(channel.read_word_data(DEV, 0x20), Ok(0x1234));
    assert_eq!(sim.last_transfer().rx_len, 2);

    channel.write_word_data(DEV, 0x21, 0xbeef).unwrap();
    assert_eq!(sim.last_transfer().tx, hex!("21 ef be").to_vec());
}

#[test]
fn test_block_read_skips_padding() {
    let (bus, sim, _logger) = create_bus(1);
    sim.add_target(0, DEV);
    sim.state().raw_rx = Some(hex!("00 00 05 68 65 6c 6c 6f").to_vec());

    let block = bus.channel(0).unwrap().read_block_data(DEV, 0x30).unwrap();
    assert_eq!(&block[..], b"hello");

    let record = sim.last_transfer();
    assert_eq!(record.tx, vec![0x30]);
    assert_eq!(record.rx_len, 33, "Block reads always fetch the full window");
}

#[test]
fn test_block_read_without_count() {
    let (bus, sim, logger) = create_bus(1);
    sim.add_target(0, DEV);
    sim.state().raw_rx = Some(vec![0u8; 33]);

    let result = bus.channel(0).unwrap().read_block_data(DEV, 0x30);
    assert_eq!(result, Err(Error::Io(IoFault::NoBlockLength)));
    assert!(logger.contains("no block length"));
}

#[test]
fn test_block_read_first_count_decides() {
    let (bus, sim, _logger) = create_bus(1);
    sim.add_target(0, DEV);
    let mut window = vec![0u8; 33];
    // Count 10 at offset 30 overruns the window; the short block after it
    // must not be picked up instead.
    window[30] = 10;
    window[31] = 1;
    window[32] = 0x77;
    sim.state().raw_rx = Some(window);

    let result = bus.channel(0).unwrap().read_block_data(DEV, 0x30);
    assert_eq!(result, Err(Error::Io(IoFault::NoBlockLength)));
}

#[test]
fn test_block_write_carries_count() {
    let (bus, sim, _logger) = create_bus(1);
    sim.add_target(0, DEV);
    let channel = bus.channel(0).unwrap();

    channel.write_block_data(DEV, 0x40, &hex!("01 02 03")).unwrap();
    let record = sim.last_transfer();
    assert_eq!(record.tx, hex!("40 03 01 02 03").to_vec());
    assert_eq!(record.control, (u32::from(DEV) << 17) | (5 << 8));

    let full = [0xc3u8; 32];
    channel.write_block_data(DEV, 0x41, &full).unwrap();
    let record = sim.last_transfer();
    assert_eq!(record.tx.len(), 34);
    assert_eq!(&record.tx[..2], &[0x41, 32]);
}

#[test]
fn test_generic_entry_point_matches_helpers() {
    let (bus, sim, _logger) = create_bus(1);
    sim.set_register(0, DEV, 0x20, &hex!("cd ab"));
    let channel = bus.channel(0).unwrap();

    let word = channel.smbus_xfer(
        DEV,
        Direction::Read,
        0x20,
        SmbusSize::WordData,
        SmbusData::Byte(0xff),
    );
    assert_eq!(word, Ok(SmbusData::Word(0xabcd)), "Reads ignore the payload");

    let block = Block::from_slice(&[9, 8]).unwrap();
    let written = I2cAlgorithm::smbus_xfer(
        &channel,
        DEV,
        Direction::Write,
        0x22,
        SmbusSize::BlockData,
        SmbusData::Block(block),
    );
    assert_eq!(written, Ok(SmbusData::None));
    assert_eq!(sim.last_transfer().tx, vec![0x22, 2, 9, 8]);
}

#[test]
fn test_unsupported_sizes_touch_nothing() {
    let (bus, sim, _logger) = create_bus(1);
    sim.add_target(0, DEV);
    let channel = bus.channel(0).unwrap();
    let first = sim.op_count();

    for size in [
        SmbusSize::Quick,
        SmbusSize::ProcCall,
        SmbusSize::I2cBlockBroken,
        SmbusSize::BlockProcCall,
        SmbusSize::I2cBlockData,
    ] {
        for direction in [Direction::Read, Direction::Write] {
            let result = channel.smbus_xfer(DEV, direction, 0, size, SmbusData::None);
            assert_eq!(
                result,
                Err(Error::InvalidArgument(ArgumentError::UnsupportedSize)),
                "{size:?} {direction:?} should be refused"
            );
        }
    }
    assert_eq!(sim.op_count(), first, "No register access for refused sizes");
}

#[test]
fn test_bad_payloads_touch_nothing() {
    let (bus, sim, _logger) = create_bus(1);
    sim.add_target(0, DEV);
    let channel = bus.channel(0).unwrap();
    let first = sim.op_count();

    let mismatch = Err(Error::InvalidArgument(ArgumentError::PayloadMismatch));
    assert_eq!(
        channel.smbus_xfer(DEV, Direction::Write, 1, SmbusSize::ByteData, SmbusData::Word(1)),
        mismatch
    );
    assert_eq!(
        channel.smbus_xfer(DEV, Direction::Write, 1, SmbusSize::WordData, SmbusData::None),
        mismatch
    );
    assert_eq!(
        channel.smbus_xfer(DEV, Direction::Write, 1, SmbusSize::Byte, SmbusData::Byte(2)),
        mismatch
    );
    assert_eq!(
        channel.smbus_xfer(DEV, Direction::Write, 1, SmbusSize::BlockData, SmbusData::None),
        mismatch
    );

    let length = Err(Error::InvalidArgument(ArgumentError::BlockLength));
    assert_eq!(channel.write_block_data(DEV, 1, &[]), length);
    assert_eq!(channel.write_block_data(DEV, 1, &[0u8; 33]), length);

    assert_eq!(
        channel.read_byte_data(0x80, 0),
        Err(Error::InvalidArgument(ArgumentError::BadAddress))
    );
    assert_eq!(sim.op_count(), first);
}

#[test]
fn test_size_codes() {
    assert_eq!(SmbusSize::try_from(1), Ok(SmbusSize::Byte));
    assert_eq!(SmbusSize::try_from(5), Ok(SmbusSize::BlockData));
    assert_eq!(SmbusSize::try_from(8), Ok(SmbusSize::I2cBlockData));
    assert_eq!(
        SmbusSize::try_from(9),
        Err(Error::InvalidArgument(ArgumentError::UnsupportedSize))
    );
    assert_eq!(SmbusSize::WordData as u32, 3);
}
