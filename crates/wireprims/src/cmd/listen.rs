use std::io::ErrorKind;
use std::net::TcpListener;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{info, warn};
use wireprims_frame::{FrameConfig, FrameError, FrameReader};

use crate::cmd::ListenArgs;
use crate::exit::{io_error, CliError, CliResult, INTERNAL, SUCCESS, USAGE};
use crate::output::{print_frame, OutputFormat};

const ACCEPT_POLL_INTERVAL: Duration = Duration::from_millis(50);
const READ_POLL_INTERVAL: Duration = Duration::from_millis(200);

pub fn run(args: ListenArgs, format: OutputFormat, mut config: FrameConfig) -> CliResult<i32> {
    let idle_limit = match &args.timeout {
        Some(timeout) => Some(parse_duration(timeout)?),
        None => None,
    };
    // Sockets always get a short read timeout so Ctrl-C is seen while a peer idles.
    config.read_timeout = Some(idle_limit.map_or(READ_POLL_INTERVAL, |limit| {
        limit.min(READ_POLL_INTERVAL)
    }));

    let listener = TcpListener::bind(&args.addr).map_err(|err| io_error("bind failed", err))?;
    listener
        .set_nonblocking(true)
        .map_err(|err| io_error("bind failed", err))?;
    if let Ok(addr) = listener.local_addr() {
        info!(%addr, "listening");
    }

    let running = Arc::new(AtomicBool::new(true));
    install_ctrlc_handler(running.clone())?;

    let mut printed = 0usize;

    while running.load(Ordering::SeqCst) {
        let (stream, peer) = match listener.accept() {
            Ok(accepted) => accepted,
            Err(err) if err.kind() == ErrorKind::WouldBlock => {
                std::thread::sleep(ACCEPT_POLL_INTERVAL);
                continue;
            }
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => return Err(io_error("accept failed", err)),
        };
        stream
            .set_nonblocking(false)
            .map_err(|err| io_error("accept failed", err))?;

        let peer = peer.to_string();
        info!(%peer, "peer connected");

        let mut reader = match FrameReader::with_config_tcp(stream, config.clone()) {
            Ok(reader) => reader,
            Err(err) => {
                warn!(%peer, error = %err, "dropping connection");
                continue;
            }
        };

        if args.preface {
            match retry_on_poll(&running, idle_limit, || reader.read_preface()) {
                Ok(Some(())) => {}
                Ok(None) => break,
                Err(err) => {
                    warn!(%peer, error = %err, "dropping connection");
                    continue;
                }
            }
        }

        loop {
            let frame = match retry_on_poll(&running, idle_limit, || reader.read_frame()) {
                Ok(Some(frame)) => frame,
                Ok(None) => break,
                Err(FrameError::ConnectionClosed) => {
                    info!(%peer, "peer disconnected");
                    break;
                }
                Err(err) => {
                    warn!(%peer, error = %err, "dropping connection");
                    break;
                }
            };

            print_frame(&frame, &peer, format);
            printed = printed.saturating_add(1);

            if args.count.is_some_and(|count| printed >= count) {
                return Ok(SUCCESS);
            }
        }
    }

    Ok(SUCCESS)
}

/// Retry `op` across socket read timeouts.
///
/// Returns `Ok(None)` once `running` is cleared. With an `idle_limit`, gives up
/// with the timeout error after that long without `op` succeeding. A timed-out
/// read leaves the reader's buffered bytes and decoder state intact.
fn retry_on_poll<T>(
    running: &AtomicBool,
    idle_limit: Option<Duration>,
    mut op: impl FnMut() -> Result<T, FrameError>,
) -> Result<Option<T>, FrameError> {
    let started = Instant::now();
    loop {
        match op() {
            Ok(value) => return Ok(Some(value)),
            Err(FrameError::Io(err)) if is_timeout(&err) => {
                if !running.load(Ordering::SeqCst) {
                    return Ok(None);
                }
                if idle_limit.is_some_and(|limit| started.elapsed() >= limit) {
                    return Err(FrameError::Io(err));
                }
            }
            Err(err) => return Err(err),
        }
    }
}

fn is_timeout(err: &std::io::Error) -> bool {
    matches!(err.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut)
}

fn install_ctrlc_handler(running: Arc<AtomicBool>) -> CliResult<()> {
    ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
    })
    .map_err(|err| CliError::new(INTERNAL, format!("signal handler setup failed: {err}")))
}

fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "duration must not be empty"));
    }

    let (number, unit) = if let Some(num) = input.strip_suffix("ms") {
        (num, "ms")
    } else if let Some(num) = input.strip_suffix('s') {
        (num, "s")
    } else {
        (input, "s")
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid duration value: {input}")))?;

    if value == 0 {
        return Err(CliError::new(USAGE, "duration must be greater than zero"));
    }

    match unit {
        "ms" => Ok(Duration::from_millis(value)),
        _ => Ok(Duration::from_secs(value)),
    }
}
