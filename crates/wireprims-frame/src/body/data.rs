use bytes::Buf;

use super::{prime, primed, require_len, take_frame, unpadded_len};
use crate::error::Result;
use crate::frame::{flags, DataFrame, Frame};
use crate::header::FrameHeader;
use crate::partial::{BytesDecoder, PartialDecode, SkipDecoder};

const NAME: &str = "DATA";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    PadLength,
    Data,
    Padding,
    Done,
}

/// `[Pad Length (8)] Data (*) [Padding (*)]`
#[derive(Debug)]
pub struct DataDecoder {
    header: FrameHeader,
    state: State,
    pad_length: Option<u8>,
    data: BytesDecoder,
    padding: SkipDecoder,
    frame: Option<Frame>,
}

impl DataDecoder {
    pub fn new(header: FrameHeader) -> Result<Self> {
        if header.has_flag(flags::PADDED) {
            require_len(&header, 1, NAME)?;
        }
        primed(Self::initial(header))
    }

    fn initial(header: FrameHeader) -> Self {
        let (state, data) = if header.has_flag(flags::PADDED) {
            (State::PadLength, BytesDecoder::new(0))
        } else {
            (State::Data, BytesDecoder::new(header.payload_len()))
        };
        Self {
            header,
            state,
            pad_length: None,
            data,
            padding: SkipDecoder::new(0),
            frame: None,
        }
    }

    fn finish(&mut self) -> Result<()> {
        self.frame = Some(Frame::Data(DataFrame {
            header: self.header,
            pad_length: self.pad_length,
            data: self.data.value()?,
        }));
        self.state = State::Done;
        Ok(())
    }
}

impl PartialDecode for DataDecoder {
    type Output = Frame;

    fn consume<B: Buf>(&mut self, src: &mut B) -> Result<bool> {
        loop {
            match self.state {
                State::PadLength => {
                    if !src.has_remaining() {
                        return Ok(false);
                    }
                    let pad_length = src.get_u8();
                    let data_len = unpadded_len(self.header.payload_len() - 1, pad_length, NAME)?;
                    self.pad_length = Some(pad_length);
                    self.data = BytesDecoder::new(data_len);
                    self.padding = SkipDecoder::new(usize::from(pad_length));
                    self.state = State::Data;
                }
                State::Data => {
                    if !self.data.consume(src)? {
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
