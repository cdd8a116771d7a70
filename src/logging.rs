use tracing::info;
use tracing_subscriber::EnvFilter;

/// Human-facing progress lines emitted by the driver loops.
pub trait Printer {
    /// `out_time` asks for a wall-clock stamp in front of the message
    fn print(&mut self, msg: &str, out_time: bool);
}

/// Forwards loop output to `tracing` at info level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingPrinter;

impl Printer for TracingPrinter {
    fn print(&mut self, msg: &str, out_time: bool) {
        if out_time {
            let now = chrono::Local::now().format("%Y-%m-%d %H:%M:%S");
            info!(target: "gym_loops::print", "{now} {msg}");
        } else {
            info!(target: "gym_loops::print", "{msg}");
        }
    }
}

/// Keeps every printed line, handy for tests and for replaying a run summary.
#[derive(Debug, Default, Clone)]
pub struct BufferPrinter {
    pub lines: Vec<String>,
}

impl Printer for BufferPrinter {
    fn print(&mut self, msg: &str, _out_time: bool) {
        self.lines.push(msg.to_owned());
    }
}

/// Installs the global fmt subscriber; `RUST_LOG` wins over `default_filter`.
pub fn init_logging(default_filter: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .try_init();
}
