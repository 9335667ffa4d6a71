mod cmd;
mod exit;
mod logging;
mod output;

use clap::Parser;
use wireprims_frame::{FrameConfig, DEFAULT_MAX_FRAME_SIZE};

use crate::cmd::Command;
use crate::logging::{init_logging, LogFormat, LogLevel};
use crate::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(name = "wireprims", version, about = "HTTP/2 frame decoding CLI")]
struct Cli {
    /// Output format.
    #[arg(long, value_name = "FORMAT", global = true)]
    format: Option<OutputFormat>,

    /// Log output format (stderr).
    #[arg(long, value_name = "FORMAT", default_value = "text", global = true)]
    log_format: LogFormat,

    /// Minimum log level (stderr).
    #[arg(long, value_name = "LEVEL", default_value = "info", global = true)]
    log_level: LogLevel,

    /// Largest frame payload accepted, in bytes.
    #[arg(
        long,
        value_name = "BYTES",
        env = "WIREPRIMS_MAX_FRAME_SIZE",
        default_value_t = DEFAULT_MAX_FRAME_SIZE,
        global = true
    )]
    max_frame_size: u32,

    #[command(subcommand)]
    command: Command,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_format, cli.log_level);

    let format = cli.format.unwrap_or_else(OutputFormat::default_for_stdout);
    let config = FrameConfig {
        max_frame_size: cli.max_frame_size,
        ..FrameConfig::default()
    };
    let result = cmd::run(cli.command, format, config);

    match result {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(err.code);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_decode_subcommand() {
        let cli = Cli::try_parse_from([
            "wireprims",
            "decode",
            "capture.bin",
            "--chunk-size",
            "7",
            "--preface",
        ])
        .expect("decode args should parse");

        let Command::Decode(args) = cli.command else {
            panic!("expected decode command");
        };
        assert_eq!(args.chunk_size, Some(7));
        assert!(args.preface);
    }

    #[test]
    fn global_max_frame_size_after_subcommand() {
        let cli = Cli::try_parse_from([
            "wireprims",
            "decode",
            "-",
            "--max-frame-size",
            "1024",
        ])
        .expect("global flag should parse after subcommand");

        assert_eq!(cli.max_frame_size, 1024);
    }

    #[test]
    fn rejects_zero_chunk_size() {
        let err = Cli::try_parse_from(["wireprims", "decode", "-", "--chunk-size", "0"])
            .expect_err("zero chunk size should fail");

        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }

    #[test]
    fn parses_listen_subcommand() {
        let cli = Cli::try_parse_from(["wireprims", "listen", "127.0.0.1:0", "--timeout", "3s"])
            .expect("listen args should parse");
        assert!(matches!(cli.command, Command::Listen(_)));
    }
}
