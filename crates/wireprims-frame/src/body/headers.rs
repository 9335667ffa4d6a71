use bytes::Buf;

use super::{prime, primed, require_len, take_frame, unpadded_len};
use crate::error::Result;
use crate::frame::{flags, Frame, HeadersFrame, StreamDependency};
use crate::header::FrameHeader;
use crate::partial::{BytesDecoder, IntDecoder, PartialDecode, SkipDecoder};

const NAME: &str = "HEADERS";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    PadLength,
    StreamDependency,
    Weight,
    HeaderBlock,
    Padding,
    Done,
}

/// `[Pad Length (8)] [E (1) Stream Dependency (31) Weight (8)]
/// Header Block Fragment (*) [Padding (*)]`
#[derive(Debug)]
pub struct HeadersDecoder {
    header: FrameHeader,
    state: State,
    pad_length: Option<u8>,
    dependency: IntDecoder,
    dependency_field: u32,
    priority: Option<StreamDependency>,
    header_block: BytesDecoder,
    padding: SkipDecoder,
    frame: Option<Frame>,
}

impl HeadersDecoder {
    pub fn new(header: FrameHeader) -> Result<Self> {
        require_len(&header, fixed_len(&header), NAME)?;
        primed(Self::initial(header))
    }

    fn initial(header: FrameHeader) -> Self {
        let state = if header.has_flag(flags::PADDED) {
            State::PadLength
        } else if header.has_flag(flags::PRIORITY) {
            State::StreamDependency
        } else {
            State::HeaderBlock
        };
        let block_len = if header.has_flag(flags::PADDED) {
            0
        } else {
            header.payload_len() - fixed_len(&header)
        };
        Self {
            header,
            state,
            pad_length: None,
            dependency: IntDecoder::u32(),
            dependency_field: 0,
            priority: None,
            header_block: BytesDecoder::new(block_len),
            padding: SkipDecoder::new(0),
            frame: None,
        }
    }

    fn after_pad_length(&self) -> State {
        if self.header.has_flag(flags::PRIORITY) {
            State::StreamDependency
        } else {
            State::HeaderBlock
        }
    }

    fn finish(&mut self) -> Result<()> {
        self.frame = Some(Frame::Headers(HeadersFrame {
            header: self.header,
            pad_length: self.pad_length,
            priority: self.priority,
            header_block: self.header_block.value()?,
        }));
        self.state = State::Done;
        Ok(())
    }
}

/// Pad length byte plus stream dependency and weight, as the flags demand.
fn fixed_len(header: &FrameHeader) -> usize {
    let mut len = 0;
    if header.has_flag(flags::PADDED) {
        len += 1;
    }
    if header.has_flag(flags::PRIORITY) {
        len += 5;
    }
    len
}

impl PartialDecode for HeadersDecoder {
    type Output = Frame;

    fn consume<B: Buf>(&mut self, src: &mut B) -> Result<bool> {
        loop {
            match self.state {
                State::PadLength => {
                    if !src.has_remaining() {
                        return Ok(false);
                    }
                    let pad_length = src.get_u8();
                    let available = self.header.payload_len() - fixed_len(&self.header);
                    let block_len = unpadded_len(available, pad_length, NAME)?;
                    self.pad_length = Some(pad_length);
                    self.header_block = BytesDecoder::new(block_len);
                    self.padding = SkipDecoder::new(usize::from(pad_length));
                    self.state = self.after_pad_length();
                }
                State::StreamDependency => {
                    if !self.dependency.consume(src)? {
                        return Ok(false);
                    }
                    self.dependency_field = self.dependency.value()? as u32;
                    self.state = State::Weight;
                }
                State::Weight => {
                    if !src.has_remaining() {
                        return Ok(false);
                    }
                    let weight = src.get_u8();
                    self.priority =
                        Some(StreamDependency::from_wire(self.dependency_field, weight));
                    self.state = State::HeaderBlock;
                }
                State::HeaderBlock => {
                    if !self.header_block.consume(src)? {
                        return Ok(false);
                    }
                    self.state = State::Padding;
                }
                State::Padding => {
                    if !self.padding.consume(src)? {
                        return Ok(false);
                    }
                    self.finish()?;
                }
                State::Done => return Ok(true),
            }
        }
    }

    fn is_complete(&self) -> bool {
        self.state == State::Done
    }

    fn value(&mut self) -> Result<Frame> {
        take_frame(&mut self.frame)
    }

    fn reset(&mut self) {
        *self = Self::initial(self.header);
        // The header passed validation in `new`; an empty cursor cannot fail.
        let _ = prime(self);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::body::test_support::decode_all_ways;
    use crate::error::FrameError;

    fn headers(frame: Frame) -> HeadersFrame {
        match frame {
            Frame::Headers(f) => f,
            other => panic!("expected HEADERS, got {other:?}"),
        }
    }

    #[test]
    fn bare_header_block() {
        let header = FrameHeader::new(3, 0x1, flags::END_HEADERS, 1);
        let frame = headers(decode_all_ways(header, &[0x82, 0x86, 0x84]));

        assert_eq!(frame.header_block.as_ref(), &[0x82, 0x86, 0x84]);
        assert_eq!(frame.priority, None);
        assert_eq!(frame.pad_length, None);
        assert!(frame.end_headers());
        assert!(!frame.end_stream());
    }

    #[test]
    fn padded_and_prioritized() {
        let header = FrameHeader::new(10, 0x1, flags::PADDED | flags::PRIORITY, 3);
        let payload = [0x02, 0x00, 0x00, 0x00, 0x05, 0x09, 0xAA, 0xBB, 0xCC, 0xCC];
        let frame = headers(decode_all_ways(header, &payload));

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

    #[test]
    fn exclusive_priority_without_padding() {
        let header = FrameHeader::new(6, 0x1, flags::PRIORITY | flags::END_STREAM, 7);
        let payload = [0x80, 0x00, 0x00, 0x03, 0xFF, 0x41];
        let frame = headers(decode_all_ways(header, &payload));

        let priority = frame.priority.unwrap();
        assert!(priority.exclusive);
        assert_eq!(priority.dependency, 3);
        assert_eq!(priority.weight, 256);
        assert_eq!(frame.header_block.as_ref(), &[0x41]);
        assert!(frame.end_stream());
    }

    #[test]
    fn priority_fields_longer_than_length_is_malformed() {
        let err = HeadersDecoder::new(FrameHeader::new(4, 0x1, flags::PRIORITY, 1)).unwrap_err();
        assert!(matches!(err, FrameError::Malformed { frame_type: "HEADERS", .. }));
    }

    #[test]
    fn padding_eating_priority_fields_is_malformed() {
        let header = FrameHeader::new(7, 0x1, flags::PADDED | flags::PRIORITY, 1);
        let mut dec = HeadersDecoder::new(header).unwrap();
        let mut src: &[u8] = &[0x02];
        assert!(matches!(
            dec.consume(&mut src),
            Err(FrameError::Malformed { .. })
        ));
    }

    #[test]
    fn empty_block_without_flags_is_complete_immediately() {
        let dec = HeadersDecoder::new(FrameHeader::new(0, 0x1, flags::END_HEADERS, 1)).unwrap();
        assert!(dec.is_complete());
    }
}
