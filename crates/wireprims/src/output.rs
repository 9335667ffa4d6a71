use std::io::{IsTerminal, Write};
use std::time::{SystemTime, UNIX_EPOCH};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;
use serde_json::{Map, Value};
use wireprims_frame::{flags, Frame, FrameType, StreamDependency};

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
    Raw,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

#[derive(Serialize)]
struct FrameOutput<'a> {
    schema_id: &'a str,
    frame_type: String,
    type_code: u8,
    flags: u8,
    flag_names: Vec<&'static str>,
    stream_id: u32,
    length: u32,
    details: Map<String, Value>,
    payload_size: usize,
    payload: String,
    source: &'a str,
    timestamp: String,
}

pub fn print_frame(frame: &Frame, source: &str, format: OutputFormat) {
    let header = frame.header();
    match format {
        OutputFormat::Json => {
            let payload = frame.payload().map(|p| &p[..]).unwrap_or_default();
            let out = FrameOutput {
                schema_id: "https://schemas.3leaps.dev/wireprims/cli/v1/frame-decoded.schema.json",
                frame_type: frame.frame_type().to_string(),
                type_code: header.frame_type,
                flags: header.flags,
                flag_names: flag_names(frame),
                stream_id: header.stream_id,
                length: header.length,
                details: details(frame),
                payload_size: payload.len(),
                payload: payload_preview(payload),
                source,
                timestamp: now_unix_seconds(),
            };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["TYPE", "STREAM", "LENGTH", "FLAGS", "DETAILS"])
                .add_row(vec![
                    frame.frame_type().to_string(),
                    header.stream_id.to_string(),
                    header.length.to_string(),
                    flag_names(frame).join("|"),
                    summary(frame),
                ]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!(
                "{} stream={} length={} flags=0x{:02x} source={} {}",
                frame.frame_type(),
                header.stream_id,
                header.length,
                header.flags,
                source,
                summary(frame)
            );
        }
        OutputFormat::Raw => {
            if let Some(payload) = frame.payload() {
                print_raw(payload.as_ref());
            }
        }
    }
}

pub fn print_raw(data: &[u8]) {
    let mut out = std::io::stdout();
    let _ = out.write_all(data);
    let _ = out.flush();
}

/// Names of the set flag bits that carry meaning for this frame's type.
pub fn flag_names(frame: &Frame) -> Vec<&'static str> {
    let known: &[(u8, &'static str)] = match frame.frame_type() {
        FrameType::Data => &[(flags::END_STREAM, "END_STREAM"), (flags::PADDED, "PADDED")],
        FrameType::Headers => &[
            (flags::END_STREAM, "END_STREAM"),
            (flags::END_HEADERS, "END_HEADERS"),
            (flags::PADDED, "PADDED"),
            (flags::PRIORITY, "PRIORITY"),
        ],
        FrameType::PushPromise => &[(flags::END_HEADERS, "END_HEADERS"), (flags::PADDED, "PADDED")],
        FrameType::Continuation => &[(flags::END_HEADERS, "END_HEADERS")],
        FrameType::Settings | FrameType::Ping => &[(flags::ACK, "ACK")],
        _ => &[],
    };
    known
        .iter()
        .filter(|(bit, _)| frame.flags() & bit != 0)
        .map(|(_, name)| *name)
        .collect()
}

/// Type-specific fields of a frame.
pub fn details(frame: &Frame) -> Map<String, Value> {
    let mut map = Map::new();
    match frame {
        Frame::Data(f) => {
            insert_padding(&mut map, f.pad_length);
        }
        Frame::Headers(f) => {
            insert_padding(&mut map, f.pad_length);
            if let Some(priority) = f.priority {
                insert_priority(&mut map, priority);
            }
        }
        Frame::Priority(f) => insert_priority(&mut map, f.priority),
        Frame::RstStream(f) => {
            map.insert("error_code".into(), f.error_code.to_string().into());
        }
        Frame::Settings(f) => {
            let settings = f
                .settings
                .iter()
                .map(|s| {
                    let name = s
                        .name()
                        .map(str::to_string)
                        .unwrap_or_else(|| format!("0x{:x}", s.identifier));
                    (name, Value::from(s.value))
                })
                .collect::<Map<String, Value>>();
            map.insert("settings".into(), Value::Object(settings));
        }
        Frame::PushPromise(f) => {
            insert_padding(&mut map, f.pad_length);
            map.insert("promised_stream_id".into(), f.promised_stream_id.into());
        }
        Frame::Ping(f) => {
            map.insert("opaque_data".into(), hex(&f.opaque_data).into());
        }
        Frame::GoAway(f) => {
            map.insert("last_stream_id".into(), f.last_stream_id.into());
            map.insert("error_code".into(), f.error_code.to_string().into());
        }
        Frame::WindowUpdate(f) => {
            map.insert("increment".into(), f.increment.into());
        }
        Frame::Continuation(_) | Frame::Unknown(_) => {}
    }
    map
}

/// One-line `key=value` rendering of [`details`] plus the payload preview.
pub fn summary(frame: &Frame) -> String {
    let mut parts: Vec<String> = details(frame)
        .into_iter()
        .map(|(key, value)| match value {
            Value::String(text) => format!("{key}={text}"),
            other => format!("{key}={other}"),
        })
        .collect();
    if let Some(payload) = frame.payload() {
        if !payload.is_empty() {
            parts.push(format!("payload={}", payload_preview(payload.as_ref())));
        }
    }
    parts.join(" ")
}

fn insert_padding(map: &mut Map<String, Value>, pad_length: Option<u8>) {
    if let Some(pad) = pad_length {
        map.insert("pad_length".into(), pad.into());
    }
}

fn insert_priority(map: &mut Map<String, Value>, priority: StreamDependency) {
    map.insert("dependency".into(), priority.dependency.into());
    map.insert("exclusive".into(), priority.exclusive.into());
    map.insert("weight".into(), priority.weight.into());
}

fn payload_preview(payload: &[u8]) -> String {
    match std::str::from_utf8(payload) {
        Ok(text) => text.to_string(),
        Err(_) => format!("<binary {} bytes>", payload.len()),
    }
}

fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

fn now_unix_seconds() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs().to_string())
        .unwrap_or_else(|_| "0".to_string())
}
