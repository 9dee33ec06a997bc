//! Drive an `ApiLink` against an in-memory port that plays the radio.
//!
//! Run with:
//!   cargo run --example loopback

use std::sync::mpsc;

use beelink::frame::{checksum, escape_into, ApiLink, FrameType, DELIMITER};
use beelink::transport::MemoryPort;
use bytes::BytesMut;

/// Build the escaped AT command response a radio would send back.
fn at_response(frame_id: u8, command: [u8; 2], value: &[u8]) -> BytesMut {
    let length = (value.len() + 5) as u16;
    let mut frame = BytesMut::new();
    frame.extend_from_slice(&[DELIMITER]);
    frame.extend_from_slice(&length.to_be_bytes());
    frame.extend_from_slice(&[FrameType::AtCommandResponse.as_byte(), frame_id]);
    frame.extend_from_slice(&command);
    frame.extend_from_slice(&[0x00]);
    frame.extend_from_slice(value);
    let sum = checksum(&frame, frame.len());
    frame.extend_from_slice(&[sum]);

    let mut wire = BytesMut::new();
    escape_into(&frame, &mut wire);
    wire
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let (tx, rx) = mpsc::channel();
    let mut link = ApiLink::new(MemoryPort::new());
    link.set_callback(move |view| {
        let _ = tx.send(view.to_owned_frame());
    });

    let frame_id = link.frame_id();
    link.send_local_at(*b"NI")?;
    eprintln!("sent {:02X?}", link.get_ref().tx());

    // Echo the request back first: it passes the checksum but is not a
    // dispatched type, so it only shows up in the stats.
    link.get_mut().loop_back();

    // The radio answers with its node identifier.
    let reply = at_response(frame_id, *b"NI", b"ROUTER-1");
    link.get_mut().push_rx(&reply);
    while link.tick()? {}

    for frame in rx.try_iter() {
        eprintln!(
            "received {} id={:?} payload={:?}",
            frame.frame_type.name(),
            frame.frame_id,
            String::from_utf8_lossy(&frame.payload)
        );
    }

    let stats = link.stats();
    eprintln!(
        "delivered={} ignored={} checksum_failures={}",
        stats.frames_delivered, stats.frames_ignored, stats.checksum_failures
    );
    Ok(())
}
