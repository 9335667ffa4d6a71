use bytes::Buf;

use super::{prime, primed, take_frame};
use crate::error::Result;
use crate::frame::{ContinuationFrame, Frame};
use crate::header::FrameHeader;
use crate::partial::{BytesDecoder, PartialDecode};

/// `Header Block Fragment (*)`
#[derive(Debug)]
pub struct ContinuationDecoder {
    header: FrameHeader,
    header_block: BytesDecoder,
    frame: Option<Frame>,
    done: bool,
}

impl ContinuationDecoder {
    pub fn new(header: FrameHeader) -> Result<Self> {
        primed(Self::initial(header))
    }

    fn initial(header: FrameHeader) -> Self {
        Self {
            header,
            header_block: BytesDecoder::new(header.payload_len()),
            frame: None,
            done: false,
        }
    }
}

impl PartialDecode for ContinuationDecoder {
    type Output = Frame;

    fn consume<B: Buf>(&mut self, src: &mut B) -> Result<bool> {
        if self.done {
            return Ok(true);
        }
        if !self.header_block.consume(src)? {
            return Ok(false);
        }
        self.frame = Some(Frame::Continuation(ContinuationFrame {
            header: self.header,
            header_block: self.header_block.value()?,
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
