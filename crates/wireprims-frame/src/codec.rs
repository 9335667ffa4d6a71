use std::time::Duration;

/// Default maximum payload length: the protocol's initial SETTINGS_MAX_FRAME_SIZE.
pub const DEFAULT_MAX_FRAME_SIZE: u32 = 16_384;

/// Configuration for frame decoding.
#[derive(Debug, Clone)]
pub struct FrameConfig {
    /// Largest payload length accepted. Default: 16 KiB. Values above the
    /// 24-bit length field are clamped.
    pub max_frame_size: u32,
    /// Read timeout for blocking readers.
    pub read_timeout: Option<Duration>,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            max_frame_size: DEFAULT_MAX_FRAME_SIZE,
            read_timeout: None,
        }
    }
}

#[cfg(feature = "async")]
pub use framed::FrameCodec;

#[cfg(feature = "async")]
mod framed {
    use bytes::BytesMut;
    use tokio_util::codec::Decoder;

    use super::FrameConfig;
    use crate::decoder::FrameDecoder;
    use crate::error::{FrameError, Result};
    use crate::frame::Frame;

    /// [`Decoder`] adapter for use with `tokio_util::codec::FramedRead`.
    #[derive(Debug, Default)]
    pub struct FrameCodec {
        decoder: FrameDecoder,
    }

    impl FrameCodec {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_config(config: &FrameConfig) -> Self {
            Self {
                decoder: FrameDecoder::with_config(config),
            }
        }

        /// The underlying connection decoder.
        pub fn decoder_mut(&mut self) -> &mut FrameDecoder {
            &mut self.decoder
        }
    }

    impl Decoder for FrameCodec {
        type Item = Frame;
        type Error = FrameError;

        fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Frame>> {
            self.decoder.decode(src)
        }

        fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Frame>> {
            match self.decoder.decode(src)? {
                Some(frame) => Ok(Some(frame)),
                None if self.decoder.is_idle() => Ok(None),
                None => Err(FrameError::ConnectionClosed),
            }
        }
    }

}
