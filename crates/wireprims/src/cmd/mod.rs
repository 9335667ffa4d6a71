use clap::{Args, Subcommand};
use std::path::PathBuf;
use wireprims_frame::FrameConfig;

use crate::exit::CliResult;
use crate::output::OutputFormat;

pub mod decode;
pub mod listen;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Decode frames from a capture file or stdin.
    Decode(DecodeArgs),
    /// Accept TCP connections and print the frames each peer sends.
    Listen(ListenArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat, config: FrameConfig) -> CliResult<i32> {
    match command {
        Command::Decode(args) => decode::run(args, format, config),
        Command::Listen(args) => listen::run(args, format, config),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug)]
pub struct DecodeArgs {
    /// Capture file to decode, or `-` for stdin.
    pub input: PathBuf,
    /// Feed the decoder N bytes at a time instead of all at once.
    #[arg(long, value_name = "N", value_parser = clap::value_parser!(u64).range(1..))]
    pub chunk_size: Option<u64>,
    /// Expect the client connection preface before the first frame.
    #[arg(long)]
    pub preface: bool,
    /// Stop after printing N frames.
    #[arg(long)]
    pub count: Option<usize>,
}

#[derive(Args, Debug)]
pub struct ListenArgs {
    /// Address to bind (e.g. 127.0.0.1:8080).
    pub addr: String,
    /// Expect the client connection preface on each connection.
    #[arg(long)]
    pub preface: bool,
    /// Exit after printing N frames.
    #[arg(long)]
    pub count: Option<usize>,
    /// Drop a connection when no complete frame arrives within this long
    /// (e.g. 5s, 500ms). Without it, idle peers are kept until they disconnect.
    #[arg(long)]
    pub timeout: Option<String>,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}
