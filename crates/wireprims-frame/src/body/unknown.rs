use bytes::Buf;

use super::{prime, primed, take_frame};
use crate::error::Result;
use crate::frame::{Frame, UnknownFrame};
use crate::header::FrameHeader;
use crate::partial::{BytesDecoder, PartialDecode};

/// Opaque payload for type codes without a known layout. Extension frames
/// must be accepted and passed on, so this decoder never rejects anything.
#[derive(Debug)]
pub struct UnknownDecoder {
    header: FrameHeader,
    payload: BytesDecoder,
    frame: Option<Frame>,
    done: bool,
}

impl UnknownDecoder {
    pub fn new(header: FrameHeader) -> Result<Self> {
        primed(Self::initial(header))
    }

    fn initial(header: FrameHeader) -> Self {
        Self {
            header,
            payload: BytesDecoder::new(header.payload_len()),
            frame: None,
            done: false,
        }
    }
}

impl PartialDecode for UnknownDecoder {
    type Output = Frame;

    fn consume<B: Buf>(&mut self, src: &mut B) -> Result<bool> {
        if self.done {
            return Ok(true);
        }
        if !self.payload.consume(src)? {
            return Ok(false);
        }
        self.frame = Some(Frame::Unknown(UnknownFrame {
            header: self.header,
            payload: self.payload.value()?,
        }));
        self.done = true;
        Ok(true)
    }

    fn is_complete(&self) -> bool {
        self.done
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
    use crate::frame::FrameType;

    #[test]
    fn keeps_payload_and_type_code() {
        let header = FrameHeader::new(3, 0xFF, 0xA5, 11);
        let Frame::Unknown(frame) = decode_all_ways(header, &[0x01, 0x02, 0x03]) else {
            panic!("expected UNKNOWN");
        };

        assert_eq!(frame.payload.as_ref(), &[0x01, 0x02, 0x03]);
        assert_eq!(frame.header.kind(), FrameType::Unknown(0xFF));
        assert_eq!(frame.header.flags, 0xA5);
    }

    #[test]
    fn empty_payload_is_complete_immediately() {
        let dec = UnknownDecoder::new(FrameHeader::new(0, 0x20, 0, 0)).unwrap();
        assert!(dec.is_complete());
    }
}
