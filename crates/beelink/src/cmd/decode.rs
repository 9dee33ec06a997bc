use std::io::Read;
use std::sync::mpsc;

use beelink_frame::FrameDecoder;
use beelink_transport::MemoryPort;

use crate::cmd::{parse_hex, DecodeArgs};
use crate::exit::{frame_error, io_error, CliResult, SUCCESS};
use crate::output::{format_hex, log_stats, print_frame, OutputFormat};

pub fn run(args: DecodeArgs, format: OutputFormat) -> CliResult<i32> {
    let wire = read_input(&args)?;
    tracing::debug!(bytes = wire.len(), "decoding capture");

    let (tx, rx) = mpsc::channel();
    let mut decoder = FrameDecoder::new();
    decoder.set_callback(move |view| {
        tracing::trace!(wire = %format_hex(view.as_bytes()), "frame decoded");
        let _ = tx.send(view.to_owned_frame());
    });

    let mut port = MemoryPort::new();
    port.push_rx(&wire);
    while decoder
        .tick(&mut port)
        .map_err(|err| frame_error("decode failed", err))?
    {
        for frame in rx.try_iter() {
            print_frame(&frame, format);
        }
    }

    log_stats(&decoder.stats());
    Ok(SUCCESS)
}

fn read_input(args: &DecodeArgs) -> CliResult<Vec<u8>> {
    if let Some(hex) = &args.hex {
        return parse_hex(hex);
    }
    if let Some(path) = &args.file {
        return std::fs::read(path)
            .map_err(|err| io_error(&format!("failed reading {}", path.display()), err));
    }
    let mut buf = Vec::new();
    std::io::stdin()
        .read_to_end(&mut buf)
        .map_err(|err| io_error("failed reading stdin", err))?;
    Ok(buf)
}
