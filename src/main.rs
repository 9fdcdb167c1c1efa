use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use overscribe::HeadlessSession;
use overscribe::config::{Config, DisplayConfig};
use overscribe::router::{Action, RouterMessage};
use signal_hook::consts::signal::{SIGINT, SIGTERM};
use signal_hook::iterator::{Handle, Signals};
use std::fs::{self, File};
use std::io::{self, BufRead, BufReader};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use tokio::sync::mpsc::UnboundedSender;

const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("OVERSCRIBE_GIT_HASH"),
    ")"
);

#[derive(Parser, Debug)]
#[command(name = "overscribe")]
#[command(
    version,
    long_version = LONG_VERSION,
    about = "Multi-monitor screen annotation overlay with raster undo history"
)]
struct Cli {
    /// Event script to play (reads stdin when omitted)
    #[arg(long, short = 's', value_name = "FILE")]
    script: Option<PathBuf>,

    /// Display to cover, as WxH[+X+Y][@scale]; repeat for more displays
    #[arg(long = "display", short = 'D', value_name = "SPEC")]
    displays: Vec<String>,

    /// Write each surface's final canvas to DIR/surface-<id>.png
    #[arg(long, value_name = "DIR")]
    dump_dir: Option<PathBuf>,

    /// Config file to use instead of ~/.config/overscribe/config.toml
    #[arg(long, short = 'c', value_name = "FILE")]
    config: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    if !cli.displays.is_empty() {
        config.displays = cli
            .displays
            .iter()
            .enumerate()
            .map(|(id, spec)| DisplayConfig::parse(id as u32, spec).map_err(anyhow::Error::msg))
            .collect::<Result<_>>()?;
        config.validate_and_clamp();
    }

    if let Some(dir) = &cli.dump_dir {
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create dump directory {}", dir.display()))?;
    }

    let script: Box<dyn BufRead> = match &cli.script {
        Some(path) => Box::new(BufReader::new(
            File::open(path)
                .with_context(|| format!("Failed to open script {}", path.display()))?,
        )),
        None => {
            info!("Reading script from stdin");
            Box::new(io::stdin().lock())
        }
    };

    let session = HeadlessSession::start(&config, cli.dump_dir.clone())?;
    let signals = SignalForwarder::start(session.router())?;
    let outcome = session.run(script);
    signals.stop();

    for report in outcome? {
        println!("{report}");
    }
    Ok(())
}

/// Turns SIGINT/SIGTERM into a routed `quit`.
///
/// A second signal while the session is shutting down exits immediately.
struct SignalForwarder {
    handle: Handle,
    thread: JoinHandle<()>,
}

impl SignalForwarder {
    fn start(router: UnboundedSender<RouterMessage>) -> Result<Self> {
        let quitting = Arc::new(AtomicBool::new(false));
        for signal in [SIGINT, SIGTERM] {
            signal_hook::flag::register_conditional_shutdown(signal, 130, Arc::clone(&quitting))
                .context("Failed to register signal handler")?;
        }

        let mut signals =
            Signals::new([SIGINT, SIGTERM]).context("Failed to register signal handler")?;
        let handle = signals.handle();

        let thread = thread::Builder::new()
            .name("signals".to_string())
            .spawn(move || {
                for sig in signals.forever() {
                    info!(
                        "Received {} - shutting down",
                        if sig == SIGTERM { "SIGTERM" } else { "SIGINT" }
                    );
                    quitting.store(true, Ordering::Release);
                    let _ = router.send(RouterMessage::Action(Action::Quit));
                }
            })
            .context("Failed to spawn signal thread")?;

        Ok(Self { handle, thread })
    }

    fn stop(self) {
        self.handle.close();
        let _ = self.thread.join();
    }
}
