use std::fs;

use beelink_frame::{
    encode_local_at, encode_transmit_raw, escape_into, write_transmit_escaped, TransmitHeader,
    MAX_AT_PARAMS,
};
use bytes::BytesMut;

use crate::cmd::{
    parse_addr64, parse_at_command, parse_hex, EncodeAtArgs, EncodeCommand, EncodeTxArgs,
};
use crate::exit::{frame_error, io_error, CliError, CliResult, SUCCESS};
use crate::output::{print_wire, OutputFormat};

pub fn run(command: EncodeCommand, format: OutputFormat) -> CliResult<i32> {
    match command {
        EncodeCommand::At(args) => {
            let wire = encode_at(&args)?;
            print_wire("at_command", &wire, format);
        }
        EncodeCommand::Tx(args) => {
            let wire = encode_tx(&args)?;
            let kind = if args.raw {
                "transmit_request_raw"
            } else {
                "transmit_request"
            };
            print_wire(kind, &wire, format);
        }
    }
    Ok(SUCCESS)
}

fn encode_at(args: &EncodeAtArgs) -> CliResult<Vec<u8>> {
    let command = parse_at_command(&args.command)?;
    let params = resolve_params(args.param.as_deref())?;

    let frame = encode_local_at(args.frame_id, command, &params);
    let mut wire = BytesMut::new();
    escape_into(&frame, &mut wire);
    Ok(wire.to_vec())
}

fn encode_tx(args: &EncodeTxArgs) -> CliResult<Vec<u8>> {
    let dest = parse_addr64(&args.dest)?;
    let payload = resolve_payload(args)?;

    if args.raw {
        let frame = encode_transmit_raw(&TransmitHeader::raw(dest), &payload)
            .map_err(|err| frame_error("encode failed", err))?;
        return Ok(frame.to_vec());
    }

    let mut wire = Vec::new();
    write_transmit_escaped(&mut wire, &TransmitHeader::streamed(dest), &payload)
        .map_err(|err| frame_error("encode failed", err))?;
    Ok(wire)
}

/// Parse AT parameters, rejecting blocks the encoder would refuse.
pub(crate) fn resolve_params(param: Option<&str>) -> CliResult<Vec<u8>> {
    let params = match param {
        Some(hex) => parse_hex(hex)?,
        None => Vec::new(),
    };
    if params.len() > MAX_AT_PARAMS {
        return Err(CliError::usage(format!(
            "AT parameters too long ({} bytes, max {MAX_AT_PARAMS})",
            params.len()
        )));
    }
    Ok(params)
}

fn resolve_payload(args: &EncodeTxArgs) -> CliResult<Vec<u8>> {
    if let Some(data) = &args.data {
        return Ok(data.as_bytes().to_vec());
    }
    if let Some(hex) = &args.hex {
        return parse_hex(hex);
    }
    if let Some(path) = &args.file {
        return fs::read(path)
            .map_err(|err| io_error(&format!("failed reading {}", path.display()), err));
    }
    Ok(Vec::new())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tx_args(dest: &str, data: &str, raw: bool) -> EncodeTxArgs {
        EncodeTxArgs {
            dest: dest.to_string(),
            data: Some(data.to_string()),
            hex: None,
            file: None,
            raw,
        }
    }

    #[test]
    fn encodes_plain_at_command() {
        let args = EncodeAtArgs {
            command: "ni".to_string(),
            param: None,
            frame_id: 1,
        };
        assert_eq!(
            encode_at(&args).unwrap(),
            vec![0x7E, 0x00, 0x04, 0x08, 0x01, b'N', b'I', 0x5F]
        );
    }

    #[test]
    fn oversized_params_are_a_usage_error() {
        let hex = "00".repeat(MAX_AT_PARAMS + 1);
        let err = resolve_params(Some(&hex)).unwrap_err();
        assert_eq!(err.code, crate::exit::USAGE);
    }

    #[test]
    fn raw_and_escaped_differ_only_by_stuffing() {
        let raw = encode_tx(&tx_args("0x0013A20040522B6A", "hello", true)).unwrap();
        let escaped = encode_tx(&tx_args("0x0013A20040522B6A", "hello", false)).unwrap();

        assert_eq!(raw[0], 0x7E);
        assert!(escaped.len() > raw.len());
        assert!(!escaped[1..].contains(&0x7E));
    }
}
