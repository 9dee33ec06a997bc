use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use beelink_frame::ApiLink;
use beelink_transport::StreamPort;

use crate::cmd::MonitorArgs;
use crate::exit::{frame_error, transport_error, CliError, CliResult, INTERNAL, SUCCESS};
use crate::output::{log_stats, print_frame, OutputFormat};

const IDLE_SLEEP: Duration = Duration::from_millis(5);

pub fn run(args: MonitorArgs, format: OutputFormat) -> CliResult<i32> {
    let port = StreamPort::open(&args.device).map_err(|err| transport_error("open failed", err))?;

    let (tx, rx) = mpsc::channel();
    let mut link = ApiLink::new(port);
    link.set_callback(move |view| {
        let _ = tx.send(view.to_owned_frame());
    });

    let running = Arc::new(AtomicBool::new(true));
    install_ctrlc_handler(running.clone())?;

    let mut printed = 0usize;

    'outer: while running.load(Ordering::SeqCst) {
        let consumed = link
            .tick()
            .map_err(|err| frame_error("receive failed", err))?;

        for frame in rx.try_iter() {
            print_frame(&frame, format);
            printed = printed.saturating_add(1);

            if let Some(count) = args.count {
                if printed >= count {
                    break 'outer;
                }
            }
        }

        if !consumed {
            if link.get_ref().is_closed() {
                tracing::debug!("device closed");
                break;
            }
            thread::sleep(IDLE_SLEEP);
        }
    }

    log_stats(&link.stats());
    Ok(SUCCESS)
}

pub(crate) fn install_ctrlc_handler(running: Arc<AtomicBool>) -> CliResult<()> {
    ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
    })
    .map_err(|err| CliError::new(INTERNAL, format!("signal handler setup failed: {err}")))
}
