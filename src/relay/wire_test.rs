use bytes::Bytes;

use super::{ByteOrder, FrameHeader, FrameReassembler, MAX_UDP_PAYLOAD, encode};
use crate::RelayError;
use crate::relay::frame::Frame;

#[test]
fn test_byte_order_encoding() {
    assert_eq!(ByteOrder::Network.encode(1), [0, 0, 0, 1]);
    assert_eq!(ByteOrder::Little.encode(1), [1, 0, 0, 0]);
    assert_eq!(ByteOrder::Network.decode([0, 0, 0x10, 0]), 4096);
    assert_eq!(ByteOrder::Little.decode([0, 0x10, 0, 0]), 4096);
}

#[test]
fn test_byte_order_parse() {
    assert_eq!("network".parse::<ByteOrder>(), Ok(ByteOrder::Network));
    assert_eq!("BE".parse::<ByteOrder>(), Ok(ByteOrder::Network));
    assert_eq!("little".parse::<ByteOrder>(), Ok(ByteOrder::Little));
    assert!("middle".parse::<ByteOrder>().is_err());
    assert_eq!(ByteOrder::default(), ByteOrder::Network);
}

#[test]
fn test_encode_orders_sequence_length_payload() {
    let frame = Frame::new(vec![0xAAu8; 10]);
    let datagrams = encode(7, &frame, ByteOrder::Network).unwrap();
    let parts: Vec<&[u8]> = datagrams.iter().collect();

    assert_eq!(parts.len(), 3);
    assert_eq!(parts[0], &[0, 0, 0, 7]);
    assert_eq!(parts[1], &[0, 0, 0, 10]);
    assert_eq!(parts[2], &[0xAAu8; 10]);
}

#[test]
fn test_encode_zero_length_payload() {
    let frame = Frame::new(Bytes::new());
    let datagrams = encode(0, &frame, ByteOrder::Little).unwrap();
    let parts: Vec<&[u8]> = datagrams.iter().collect();

    assert_eq!(parts[1], &[0, 0, 0, 0]);
    assert!(parts[2].is_empty());
}

#[test]
fn test_encode_max_udp_payload_not_truncated() {
    let payload: Vec<u8> = (0..MAX_UDP_PAYLOAD).map(|i| i as u8).collect();
    let frame = Frame::new(payload.clone());
    let datagrams = encode(3, &frame, ByteOrder::Network).unwrap();

    assert_eq!(
        ByteOrder::Network.decode(datagrams.length),
        MAX_UDP_PAYLOAD as u32
    );
    assert_eq!(datagrams.payload.as_ref(), payload.as_slice());
}

#[test]
fn test_header_rejects_payload_over_datagram_limit() {
    let too_big = MAX_UDP_PAYLOAD + 1;
    match FrameHeader::new(0, too_big) {
        Err(RelayError::FrameTooLarge(n)) => assert_eq!(n, too_big),
        other => panic!("expected FrameTooLarge, got {:?}", other),
    }
    assert_eq!(
        FrameHeader::new(0, MAX_UDP_PAYLOAD).unwrap().length,
        MAX_UDP_PAYLOAD as u32
    );
}

#[test]
fn test_encode_rejects_oversized_frame() {
    let frame = Frame::new(vec![0u8; 70_000]);
    assert!(matches!(
        encode(0, &frame, ByteOrder::Network),
        Err(RelayError::FrameTooLarge(70_000))
    ));
}

#[test]
fn test_reassembler_full_triples() {
    let mut reassembler = FrameReassembler::new(ByteOrder::Network);
    for (sequence, payload) in [(0u32, vec![1u8; 10]), (1, vec![]), (2, vec![3u8; 4096])] {
        let frame = Frame::new(payload.clone());
        let datagrams = encode(sequence, &frame, ByteOrder::Network).unwrap();
        let mut out = None;
        for datagram in datagrams.iter() {
            out = reassembler.push(datagram);
        }
        let received = out.expect("complete triple yields a frame");
        assert_eq!(received.sequence, sequence);
        assert_eq!(received.payload.as_ref(), payload.as_slice());
    }
    assert_eq!(reassembler.discarded(), 0);
}

#[test]
fn test_reassembler_recovers_from_lost_payload() {
    let order = ByteOrder::Little;
    let mut reassembler = FrameReassembler::new(order);

    // frame 0 loses its payload datagram
    assert!(reassembler.push(&order.encode(0)).is_none());
    assert!(reassembler.push(&order.encode(100)).is_none());

    // frame 1 arrives intact; its sequence datagram lands in the payload slot
    assert!(reassembler.push(&order.encode(1)).is_none());
    assert!(reassembler.push(&order.encode(5)).is_none());
    let received = reassembler.push(b"hello").unwrap();

    assert_eq!(received.sequence, 1);
    assert_eq!(received.payload.as_ref(), b"hello");
    assert_eq!(reassembler.discarded(), 1);
}

#[test]
fn test_reassembler_skips_stray_payload() {
    let order = ByteOrder::Network;
    let mut reassembler = FrameReassembler::new(order);

    // a payload with no header in front of it
    assert!(reassembler.push(&[0u8; 32]).is_none());
    assert!(reassembler.push(&order.encode(9)).is_none());
    assert!(reassembler.push(&order.encode(2)).is_none());
    let received = reassembler.push(&[4, 2]).unwrap();

    assert_eq!(received.sequence, 9);
    assert_eq!(reassembler.discarded(), 1);
}
