use bytes::{Buf, BufMut, Bytes, BytesMut};
use wireprims_frame::{
    flags, ErrorCode, Frame, FrameDecoder, FrameError, FrameType, Setting, StreamDependency,
    HEADER_SIZE,
};

fn wire(frame_type: u8, flags: u8, stream_id: u32, payload: &[u8]) -> Vec<u8> {
    wire_with_length(payload.len() as u32, frame_type, flags, stream_id, payload)
}

fn wire_with_length(
    length: u32,
    frame_type: u8,
    flags: u8,
    stream_id: u32,
    payload: &[u8],
) -> Vec<u8> {
    let mut buf = BytesMut::new();
    buf.put_uint(u64::from(length), 3);
    buf.put_u8(frame_type);
    buf.put_u8(flags);
    buf.put_u32(stream_id);
    buf.put_slice(payload);
    buf.to_vec()
}

/// One frame of every known type plus an extension frame.
fn mixed_stream() -> Vec<u8> {
    let mut stream = Vec::new();
    stream.extend(wire(0x4, 0, 0, &[0, 1, 0, 0, 0x10, 0, 0, 3, 0, 0, 0, 100]));
    stream.extend(wire(0x4, flags::ACK, 0, &[]));
    stream.extend(wire(0x8, 0, 0, &[0, 0, 0xFF, 0xFF]));
    stream.extend(wire(
        0x1,
        flags::PRIORITY | flags::END_HEADERS,
        1,
        &[0x80, 0, 0, 3, 15, 0x82, 0x86],
    ));
    stream.extend(wire(0x9, flags::END_HEADERS, 1, &[0x84]));
    stream.extend(wire(0x0, flags::PADDED | flags::END_STREAM, 1, &[3, b'h', b'i', 0, 0, 0]));
    stream.extend(wire(0x2, 0, 3, &[0, 0, 0, 1, 200]));
    stream.extend(wire(0x3, 0, 3, &[0, 0, 0, 8]));
    stream.extend(wire(0x5, flags::END_HEADERS, 1, &[0, 0, 0, 2, 0x82]));
    stream.extend(wire(0x6, 0, 0, b"12345678"));
    stream.extend(wire(0xFF, 0x5A, 7, &[9, 9, 9]));
    stream.extend(wire(0x7, 0, 0, &[0, 0, 0, 1, 0, 0, 0, 0, b'b', b'y', b'e']));
    stream
}

fn decode_whole(bytes: &[u8]) -> Vec<Frame> {
    let mut decoder = FrameDecoder::new();
    let mut src = Bytes::copy_from_slice(bytes);
    let frames = decoder.decode_all(&mut src).unwrap();
    assert!(decoder.is_idle());
    frames
}

fn decode_chunks<'a>(chunks: impl IntoIterator<Item = &'a [u8]>) -> Vec<Frame> {
    let mut decoder = FrameDecoder::new();
    let mut frames = Vec::new();
    for chunk in chunks {
        let mut src = chunk;
        frames.extend(decoder.decode_all(&mut src).unwrap());
        assert!(src.is_empty());
    }
    assert!(decoder.is_idle());
    frames
}

#[test]
fn every_frame_type_decodes_from_one_buffer() {
    let frames = decode_whole(&mixed_stream());
    let types: Vec<FrameType> = frames.iter().map(Frame::frame_type).collect();

    assert_eq!(
        types,
        vec![
            FrameType::Settings,
            FrameType::Settings,
            FrameType::WindowUpdate,
            FrameType::Headers,
            FrameType::Continuation,
            FrameType::Data,
            FrameType::Priority,
            FrameType::RstStream,
            FrameType::PushPromise,
            FrameType::Ping,
            FrameType::Unknown(0xFF),
            FrameType::GoAway,
        ]
    );
}

#[test]
fn results_do_not_depend_on_chunking() {
    let stream = mixed_stream();
    let expected = decode_whole(&stream);

    assert_eq!(decode_chunks(stream.chunks(1)), expected);
    for size in [2, 3, 5, 7, 9, 13, 64] {
        assert_eq!(decode_chunks(stream.chunks(size)), expected, "chunk size {size}");
    }
    for split in 0..=stream.len() {
        let (head, tail) = stream.split_at(split);
        assert_eq!(decode_chunks([head, tail]), expected, "split at {split}");
    }
}

#[test]
fn each_frame_consumes_header_plus_declared_length() {
    let stream = mixed_stream();
    let mut decoder = FrameDecoder::new();
    let mut src = Bytes::from(stream);

    while src.has_remaining() {
        let before = src.remaining();
        let frame = decoder.decode(&mut src).unwrap().unwrap();
        let consumed = before - src.remaining();

        assert_eq!(consumed, HEADER_SIZE + frame.header().length as usize);
        assert_eq!(consumed, frame.wire_size());
    }
}

#[test]
fn reserved_bit_is_cleared_from_stream_ids() {
    let mut stream = wire(0x0, 0, 0x8000_0005, b"x");
    stream.extend(wire(0x7, 0, 0, &[0xFF, 0xFF, 0xFF, 0xFE, 0, 0, 0, 0]));
    stream.extend(wire(0x5, 0, 1, &[0x80, 0, 0, 4]));

    let frames = decode_whole(&stream);

    assert_eq!(frames[0].stream_id(), 5);
    let Frame::GoAway(goaway) = &frames[1] else {
        panic!("expected GOAWAY");
    };
    assert_eq!(goaway.last_stream_id, 0x7FFF_FFFE);
    let Frame::PushPromise(promise) = &frames[2] else {
        panic!("expected PUSH_PROMISE");
    };
    assert_eq!(promise.promised_stream_id, 4);
}

#[test]
fn unknown_type_passes_payload_through() {
    let frames = decode_whole(&wire(0xFF, 0, 0, &[1, 2, 3]));

    let Frame::Unknown(frame) = &frames[0] else {
        panic!("expected UNKNOWN");
    };
    assert_eq!(frame.header.frame_type, 0xFF);
    assert_eq!(frame.payload.as_ref(), &[1, 2, 3]);
}

#[test]
fn ping_with_zero_length_reads_opaque_data() {
    let mut stream = wire_with_length(0, 0x6, 0, 0, &[0; 8]);
    stream.extend(wire(0x4, flags::ACK, 0, &[]));

    let mut decoder = FrameDecoder::new();
    let mut src = Bytes::from(stream);
    let frame = decoder.decode(&mut src).unwrap().unwrap();

    assert_eq!(src.remaining(), HEADER_SIZE);
    assert_eq!(frame.wire_size(), 17);
    assert!(matches!(frame, Frame::Ping(f) if f.opaque_data == [0; 8]));
}

#[test]
fn single_settings_entry() {
    let frames = decode_whole(&wire(0x4, 0, 0, &[0x00, 0x03, 0x00, 0x00, 0x00, 0x00]));

    let Frame::Settings(frame) = &frames[0] else {
        panic!("expected SETTINGS");
    };
    assert_eq!(
        frame.settings,
        vec![Setting {
            identifier: 3,
            value: 0
        }]
    );
    assert_eq!(frame.settings[0].name(), Some("MAX_CONCURRENT_STREAMS"));
}

#[test]
fn padded_headers_with_priority() {
    let payload = [0x02, 0x00, 0x00, 0x00, 0x05, 0x09, 0xAA, 0xBB, 0xCC, 0xCC];
    let stream = wire(0x1, flags::PADDED | flags::PRIORITY, 1, &payload);

    for frames in [decode_whole(&stream), decode_chunks(stream.chunks(1))] {
        let Frame::Headers(frame) = &frames[0] else {
            panic!("expected HEADERS");
        };
        assert!(frame.has_priority());
        assert_eq!(frame.header_block.as_ref(), &[0xAA, 0xBB]);
        assert_eq!(frame.pad_length, Some(2));
        assert_eq!(
            frame.priority,
            Some(StreamDependency {
                dependency: 5,
                exclusive: false,
                weight: 10,
            })
        );
    }
}

#[test]
fn goaway_and_rst_stream_error_codes() {
    let mut stream = wire(0x3, 0, 1, &[0, 0, 0, 0x8]);
    stream.extend(wire(0x7, 0, 0, &[0, 0, 0, 3, 0, 0, 0, 0xB]));

    let frames = decode_whole(&stream);

    let Frame::RstStream(rst) = &frames[0] else {
        panic!("expected RST_STREAM");
    };
    assert_eq!(rst.error_code, ErrorCode(8));
    assert_eq!(rst.error_code.name(), Some("CANCEL"));

    let Frame::GoAway(goaway) = &frames[1] else {
        panic!("expected GOAWAY");
    };
    assert_eq!(goaway.error_code.name(), Some("ENHANCE_YOUR_CALM"));
    assert!(goaway.debug_data.is_empty());
}

#[test]
fn malformed_frames_are_rejected() {
    let cases = [
        wire(0x2, 0, 1, &[0, 0, 0, 1]),
        wire(0x3, 0, 1, &[0, 0]),
        wire(0x4, 0, 0, &[0, 1, 0, 0, 0]),
        wire(0x7, 0, 0, &[0, 0, 0, 1]),
        wire(0x8, 0, 0, &[0, 1]),
        wire(0x0, flags::PADDED, 1, &[5, b'a']),
        wire(0x1, flags::PRIORITY, 1, &[0, 0]),
        wire(0x5, 0, 1, &[0, 0]),
    ];

    for case in cases {
        let mut decoder = FrameDecoder::new();
        let mut src = Bytes::from(case);
        let err = decoder.decode(&mut src).unwrap_err();
        assert!(matches!(err, FrameError::Malformed { .. }), "{err}");
        assert!(decoder.is_idle());
    }
}
