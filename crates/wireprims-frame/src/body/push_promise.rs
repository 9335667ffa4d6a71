use bytes::Buf;

use super::{prime, primed, require_len, take_frame, unpadded_len};
use crate::error::Result;
use crate::frame::{flags, Frame, PushPromiseFrame};
use crate::header::{FrameHeader, STREAM_ID_MASK};
use crate::partial::{BytesDecoder, IntDecoder, PartialDecode, SkipDecoder};

const NAME: &str = "PUSH_PROMISE";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    PadLength,
    PromisedStreamId,
    HeaderBlock,
    Padding,
    Done,
}

/// `[Pad Length (8)] R (1) Promised Stream ID (31) Header Block Fragment (*)
/// [Padding (*)]`
#[derive(Debug)]
pub struct PushPromiseDecoder {
    header: FrameHeader,
    state: State,
    pad_length: Option<u8>,
    promised: IntDecoder,
    header_block: BytesDecoder,
    padding: SkipDecoder,
    frame: Option<Frame>,
}

impl PushPromiseDecoder {
    pub fn new(header: FrameHeader) -> Result<Self> {
        require_len(&header, fixed_len(&header), NAME)?;
        primed(Self::initial(header))
    }

    fn initial(header: FrameHeader) -> Self {
        let (state, block_len) = if header.has_flag(flags::PADDED) {
            (State::PadLength, 0)
        } else {
            (
                State::PromisedStreamId,
                header.payload_len() - fixed_len(&header),
            )
        };
        Self {
            header,
            state,
            pad_length: None,
            promised: IntDecoder::u32(),
            header_block: BytesDecoder::new(block_len),
            padding: SkipDecoder::new(0),
            frame: None,
        }
    }

    fn finish(&mut self) -> Result<()> {
        self.frame = Some(Frame::PushPromise(PushPromiseFrame {
            header: self.header,
            pad_length: self.pad_length,
            promised_stream_id: self.promised.value()? as u32 & STREAM_ID_MASK,
            header_block: self.header_block.value()?,
        }));
        self.state = State::Done;
        Ok(())
    }
}

fn fixed_len(header: &FrameHeader) -> usize {
    if header.has_flag(flags::PADDED) {
        5
    } else {
        4
    }
}

impl PartialDecode for PushPromiseDecoder {
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
                    self.state = State::PromisedStreamId;
                }
                State::PromisedStreamId => {
                    if !self.promised.consume(src)? {
                        return Ok(false);
                    }
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
