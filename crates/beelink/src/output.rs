use std::io::{IsTerminal, Write};
use std::time::{SystemTime, UNIX_EPOCH};

use beelink_frame::{ApiFrame, DecoderStats};
use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;

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
    frame_type: u8,
    frame_type_name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    frame_id: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    source64: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    source16: Option<String>,
    payload_size: usize,
    payload_hex: String,
    payload: String,
    timestamp: String,
}

#[derive(Serialize)]
struct WireOutput<'a> {
    kind: &'a str,
    length: usize,
    wire_hex: String,
}

pub fn print_frame(frame: &ApiFrame, format: OutputFormat) {
    let source64 = frame.source64.map(format_addr64);
    let source16 = frame.source16.map(format_addr16);

    match format {
        OutputFormat::Json => {
            let out = FrameOutput {
                frame_type: frame.frame_type.as_byte(),
                frame_type_name: frame.frame_type.name(),
                frame_id: frame.frame_id,
                source64,
                source16,
                payload_size: frame.payload.len(),
                payload_hex: format_hex(&frame.payload),
                payload: payload_preview(&frame.payload),
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
                .set_header(vec!["TYPE", "SOURCE64", "SOURCE16", "SIZE", "PAYLOAD"])
                .add_row(vec![
                    frame.frame_type.name().to_string(),
                    source64.unwrap_or_else(|| "-".to_string()),
                    source16.unwrap_or_else(|| "-".to_string()),
                    frame.payload.len().to_string(),
                    payload_preview(&frame.payload),
                ]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!(
                "type={} source64={} source16={} size={} payload={}",
                frame.frame_type.name(),
                source64.as_deref().unwrap_or("-"),
                source16.as_deref().unwrap_or("-"),
                frame.payload.len(),
                payload_preview(&frame.payload)
            );
        }
        OutputFormat::Raw => {
            print_raw(&frame.payload);
        }
    }
}

/// Print encoded wire bytes.
pub fn print_wire(kind: &str, wire: &[u8], format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let out = WireOutput {
                kind,
                length: wire.len(),
                wire_hex: format_hex(wire),
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
                .set_header(vec!["KIND", "LENGTH", "WIRE"])
                .add_row(vec![kind.to_string(), wire.len().to_string(), format_hex(wire)]);
            println!("{table}");
        }
        OutputFormat::Pretty => println!("{}", format_hex(wire)),
        OutputFormat::Raw => print_raw(wire),
    }
}

pub fn print_raw(data: &[u8]) {
    let mut out = std::io::stdout();
    let _ = out.write_all(data);
    let _ = out.flush();
}

pub fn log_stats(stats: &DecoderStats) {
    tracing::info!(
        delivered = stats.frames_delivered,
        checksum_failures = stats.checksum_failures,
        ignored = stats.frames_ignored,
        overflows = stats.overflows,
        "decoder summary"
    );
}

pub fn format_hex(bytes: &[u8]) -> String {
    bytes
        .chunks(1)
        .map(hex::encode_upper)
        .collect::<Vec<_>>()
        .join(" ")
}

fn format_addr64(addr: u64) -> String {
    format!("0x{addr:016X}")
}

fn format_addr16(addr: u16) -> String {
    format!("0x{addr:04X}")
}

fn payload_preview(payload: &[u8]) -> String {
    match std::str::from_utf8(payload) {
        Ok(text) if !text.chars().any(char::is_control) => text.to_string(),
        _ => format!("<binary {} bytes>", payload.len()),
    }
}

fn now_unix_seconds() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs().to_string())
        .unwrap_or_else(|_| "0".to_string())
}
