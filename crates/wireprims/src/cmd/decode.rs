use std::io::Read;
use std::path::Path;

use tracing::{debug, info};
use wireprims_frame::{FrameConfig, FrameDecoder, FrameError, CONNECTION_PREFACE};

use crate::cmd::DecodeArgs;
use crate::exit::{frame_error, io_error, CliResult, SUCCESS};
use crate::output::{print_frame, OutputFormat};

pub fn run(args: DecodeArgs, format: OutputFormat, config: FrameConfig) -> CliResult<i32> {
    let (input, source) = read_input(&args.input)?;

    let mut bytes = input.as_slice();
    if args.preface {
        bytes = strip_preface(bytes).map_err(|err| frame_error("decode failed", err))?;
    }

    let chunk_size = match args.chunk_size {
        Some(n) => usize::try_from(n).unwrap_or(usize::MAX),
        None => bytes.len().max(1),
    };
    debug!(bytes = bytes.len(), chunk_size, "decoding capture");

    let mut decoder = FrameDecoder::with_config(&config);
    let mut printed = 0usize;

    for chunk in bytes.chunks(chunk_size) {
        let mut src = chunk;
        while let Some(frame) = decoder
            .decode(&mut src)
            .map_err(|err| frame_error("decode failed", err))?
        {
            print_frame(&frame, &source, format);
            printed = printed.saturating_add(1);

            if args.count.is_some_and(|count| printed >= count) {
                return Ok(SUCCESS);
            }
        }
    }

    if !decoder.is_idle() {
        return Err(frame_error("decode failed", FrameError::ConnectionClosed));
    }

    info!(frames = printed, "decode complete");
    Ok(SUCCESS)
}

fn read_input(path: &Path) -> CliResult<(Vec<u8>, String)> {
    if path.as_os_str() == "-" {
        let mut buf = Vec::new();
        std::io::stdin()
            .read_to_end(&mut buf)
            .map_err(|err| io_error("failed to read stdin", err))?;
        return Ok((buf, "stdin".to_string()));
    }

    let buf = std::fs::read(path)
        .map_err(|err| io_error(&format!("failed to read {}", path.display()), err))?;
    Ok((buf, path.display().to_string()))
}

fn strip_preface(bytes: &[u8]) -> Result<&[u8], FrameError> {
    bytes
        .strip_prefix(CONNECTION_PREFACE.as_slice())
        .ok_or(FrameError::InvalidPreface)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strip_preface_accepts_exact_prefix() {
        let mut input = CONNECTION_PREFACE.to_vec();
        input.extend_from_slice(&[0, 0, 0, 4, 1, 0, 0, 0, 0]);

        assert_eq!(strip_preface(&input).unwrap().len(), 9);
    }

    #[test]
    fn strip_preface_rejects_other_bytes() {
        let err = strip_preface(b"PRI * HTTP/1.1\r\n").unwrap_err();
        assert!(matches!(err, FrameError::InvalidPreface));
    }
}
