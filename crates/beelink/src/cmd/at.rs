use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

use beelink_frame::{ApiLink, FrameType};
use beelink_transport::StreamPort;

use crate::cmd::encode::resolve_params;
use crate::cmd::{parse_at_command, parse_duration, AtArgs};
use crate::exit::{
    frame_error, transport_error, CliError, CliResult, FAILURE, SUCCESS, TIMEOUT,
};
use crate::output::{print_frame, OutputFormat};

const IDLE_SLEEP: Duration = Duration::from_millis(5);

pub fn run(args: AtArgs, format: OutputFormat) -> CliResult<i32> {
    let command = parse_at_command(&args.command)?;
    let params = resolve_params(args.param.as_deref())?;
    let wait = args.wait.as_deref().map(parse_duration).transpose()?;

    let port = StreamPort::open(&args.device).map_err(|err| transport_error("open failed", err))?;
    let (tx, rx) = mpsc::channel();
    let mut link = ApiLink::new(port);
    link.set_callback(move |view| {
        if view.frame_type() == FrameType::AtCommandResponse {
            let _ = tx.send(view.to_owned_frame());
        }
    });

    let frame_id = link.frame_id();
    link.send_local_at_with_params(command, &params)
        .map_err(|err| frame_error("send failed", err))?;
    tracing::info!(
        command = %args.command.to_ascii_uppercase(),
        frame_id,
        "AT command sent"
    );

    let Some(wait) = wait else {
        return Ok(SUCCESS);
    };

    if frame_id == 0 {
        tracing::warn!("frame id 0 requests no response");
    }

    let deadline = Instant::now() + wait;
    while Instant::now() < deadline {
        let consumed = link
            .tick()
            .map_err(|err| frame_error("receive failed", err))?;

        for frame in rx.try_iter() {
            if frame.frame_id == Some(frame_id) {
                print_frame(&frame, format);
                return Ok(SUCCESS);
            }
            tracing::debug!(frame_id = ?frame.frame_id, "ignoring unrelated AT response");
        }

        if !consumed {
            if link.get_ref().is_closed() {
                return Err(CliError::new(
                    FAILURE,
                    "device closed before the AT response arrived",
                ));
            }
            thread::sleep(IDLE_SLEEP);
        }
    }

    Err(CliError::new(
        TIMEOUT,
        format!("no AT response within {}ms", wait.as_millis()),
    ))
}
