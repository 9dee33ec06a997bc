use clap::{Args, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

use beelink_frame::AtCommand;

use crate::exit::{CliError, CliResult};
use crate::output::OutputFormat;

pub mod at;
pub mod decode;
pub mod encode;
pub mod monitor;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Decode captured wire bytes and print the frames they contain.
    Decode(DecodeArgs),
    /// Encode a frame and print its wire bytes.
    #[command(subcommand)]
    Encode(EncodeCommand),
    /// Open a device and print frames as they arrive.
    Monitor(MonitorArgs),
    /// Send a local AT command to a device.
    At(AtArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Decode(args) => decode::run(args, format),
        Command::Encode(command) => encode::run(command, format),
        Command::Monitor(args) => monitor::run(args, format),
        Command::At(args) => at::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug)]
pub struct DecodeArgs {
    /// Wire bytes as hex (spaces allowed).
    #[arg(long, conflicts_with = "file")]
    pub hex: Option<String>,
    /// Read wire bytes from a capture file. Default: stdin.
    #[arg(long, conflicts_with = "hex")]
    pub file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum EncodeCommand {
    /// Local AT command frame.
    At(EncodeAtArgs),
    /// Transmit request frame.
    Tx(EncodeTxArgs),
}

#[derive(Args, Debug)]
pub struct EncodeAtArgs {
    /// Two-character AT command, e.g. NI.
    pub command: String,
    /// Parameter bytes as hex.
    #[arg(long)]
    pub param: Option<String>,
    /// Frame id to stamp on the command.
    #[arg(long, default_value = "1")]
    pub frame_id: u8,
}

#[derive(Args, Debug)]
pub struct EncodeTxArgs {
    /// 64-bit destination address (hex, optional 0x prefix).
    #[arg(long, default_value = "0x00000000000000FF")]
    pub dest: String,
    /// Raw string payload.
    #[arg(long, conflicts_with_all = ["hex", "file"])]
    pub data: Option<String>,
    /// Payload as hex.
    #[arg(long, conflicts_with_all = ["data", "file"])]
    pub hex: Option<String>,
    /// Read payload from file.
    #[arg(long, conflicts_with_all = ["data", "hex"])]
    pub file: Option<PathBuf>,
    /// Build the frame in one buffer without escaping.
    #[arg(long)]
    pub raw: bool,
}

#[derive(Args, Debug)]
pub struct MonitorArgs {
    /// Device path, e.g. /dev/ttyUSB0.
    #[arg(env = "BEELINK_DEVICE")]
    pub device: PathBuf,
    /// Exit after printing N frames.
    #[arg(long)]
    pub count: Option<usize>,
}

#[derive(Args, Debug)]
pub struct AtArgs {
    /// Device path, e.g. /dev/ttyUSB0.
    #[arg(env = "BEELINK_DEVICE")]
    pub device: PathBuf,
    /// Two-character AT command, e.g. NI.
    pub command: String,
    /// Parameter bytes as hex.
    #[arg(long)]
    pub param: Option<String>,
    /// Wait this long for the response frame (e.g. 2s, 500ms).
    #[arg(long)]
    pub wait: Option<String>,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

pub(crate) fn parse_at_command(input: &str) -> CliResult<AtCommand> {
    match input.as_bytes() {
        [a, b] if a.is_ascii_graphic() && b.is_ascii_graphic() => {
            Ok([a.to_ascii_uppercase(), b.to_ascii_uppercase()])
        }
        _ => Err(CliError::usage(format!(
            "AT command must be two printable characters: {input:?}"
        ))),
    }
}

pub(crate) fn parse_hex(input: &str) -> CliResult<Vec<u8>> {
    let digits: String = input
        .chars()
        .filter(|c| !c.is_whitespace() && *c != ':' && *c != ',')
        .collect();
    let digits = digits
        .strip_prefix("0x")
        .or_else(|| digits.strip_prefix("0X"))
        .unwrap_or(&digits);

    hex::decode(digits).map_err(|err| match err {
        hex::FromHexError::OddLength => {
            CliError::usage(format!("hex input has an odd number of digits: {input:?}"))
        }
        _ => CliError::usage(format!("invalid hex input: {input:?}")),
    })
}

pub(crate) fn parse_addr64(input: &str) -> CliResult<u64> {
    let trimmed = input.trim();
    let digits = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);
    if digits.is_empty() || digits.len() > 16 {
        return Err(CliError::usage(format!("invalid 64-bit address: {input}")));
    }
    u64::from_str_radix(digits, 16)
        .map_err(|_| CliError::usage(format!("invalid 64-bit address: {input}")))
}

pub(crate) fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::usage("duration must not be empty"));
    }

    let (number, millis) = if let Some(num) = input.strip_suffix("ms") {
        (num, true)
    } else if let Some(num) = input.strip_suffix('s') {
        (num, false)
    } else {
        (input, false)
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::usage(format!("invalid duration value: {input}")))?;

    if value == 0 {
        return Err(CliError::usage("duration must be greater than zero"));
    }

    Ok(if millis {
        Duration::from_millis(value)
    } else {
        Duration::from_secs(value)
    })
}
