use std::io::{self, BufRead, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::Context;
use crossbeam_channel::unbounded;
use tracing::{info, warn};

use abs_overlay::config::Config;
use abs_overlay::error::AppResult;
use abs_overlay::messaging::{Event, EventBus};
use abs_overlay::mode::{forward_intro_events, Direction, ModeController};
use abs_overlay::session::Session;
use abs_overlay::source::SerialLineSource;
use abs_overlay::state::Mode;

const LOG_TARGET_STARTUP: &str = "abs_overlay::startup";

/// Initialize tracing with file rotation
///
/// Logs are written to the platform config directory under AbsOverlay/logs
/// with daily rotation. Debug builds also log to the console.
fn initialize_tracing() {
    use tracing_appender::rolling;
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let log_dir = dirs::config_dir()
        .map(|dir| dir.join("AbsOverlay").join("logs"))
        .unwrap_or_else(|| std::path::PathBuf::from("logs"));

    if let Err(e) = std::fs::create_dir_all(&log_dir) {
        eprintln!("Warning: Failed to create log directory: {}", e);
    }

    let file_appender = rolling::daily(&log_dir, "abs-overlay.log");

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let file_layer = fmt::layer()
        .with_writer(file_appender)
        .with_ansi(false)
        .with_target(true)
        .with_line_number(true);

    #[cfg(debug_assertions)]
    {
        let console_layer = fmt::layer()
            .with_writer(std::io::stdout)
            .with_ansi(true)
            .with_target(false);

        tracing_subscriber::registry()
            .with(filter)
            .with(file_layer)
            .with(console_layer)
            .init();
    }

    #[cfg(not(debug_assertions))]
    {
        tracing_subscriber::registry()
            .with(filter)
            .with(file_layer)
            .init();
    }

    tracing::info!("Log directory: {}", log_dir.display());
}

fn log_runtime_environment() {
    let version = env!("CARGO_PKG_VERSION");
    tracing::info!(
        target: LOG_TARGET_STARTUP,
        "Starting ABS Overlay v{} on {} ({})",
        version,
        std::env::consts::OS,
        std::env::consts::ARCH
    );
}

/// Forward bus notifications to the console play-by-play without ever
/// blocking the consumer thread. Stands in for the rendering layer, which
/// subscribes the same way.
fn spawn_presentation_log(bus: &EventBus) {
    let (rx, _id) = bus.subscribe();
    thread::spawn(move || {
        while let Ok(event) = rx.recv() {
            match &event {
                Event::Shutdown => {
                    info!("Play-by-play closed");
                    break;
                }
                // a frame arrives dozens of times per second
                Event::FrameReady { .. } => tracing::trace!("{}", event.description()),
                _ => println!("  >> {}", event.description()),
            }
        }
    });
}

/// Intro phase: run a serial source for link status only, and drive the
/// mode menu from stdin until a selection is confirmed.
fn run_intro(config: &Config, bus: &EventBus) -> AppResult<Mode> {
    let (intro_tx, intro_rx) = unbounded();
    let intro_serial = match SerialLineSource::open(
        &config.serial_port,
        config.baud_rate,
        config.poll_interval(),
        intro_tx,
    ) {
        Ok(source) => Some(source),
        Err(err) => {
            warn!("Intro running without serial link: {err:#}");
            None
        }
    };

    let mut controller = ModeController::new(config.initial_mode);

    println!("Select mode (up/down to move, enter to confirm, q to quit):");
    print_menu(controller.highlighted());

    let stdin = io::stdin();
    for input in stdin.lock().lines() {
        forward_intro_events(&intro_rx, bus);

        let input = input.context("Failed to read selection input")?;
        match input.trim().to_lowercase().as_str() {
            "up" | "u" | "w" => controller.navigate(Direction::Up),
            "down" | "d" | "s" => controller.navigate(Direction::Down),
            "" | "enter" | "ok" => {
                let mode = controller.confirm(intro_serial);
                // the handshake result and teardown statuses are queued now
                forward_intro_events(&intro_rx, bus);
                return Ok(mode);
            }
            "q" | "quit" => anyhow::bail!("quit from mode selection"),
            other => println!("  (unrecognized: {:?})", other),
        }
        print_menu(controller.highlighted());
    }

    // stdin closed: confirm whatever is highlighted
    let mode = controller.confirm(intro_serial);
    forward_intro_events(&intro_rx, bus);
    Ok(mode)
}

fn print_menu(highlighted: Mode) {
    let marker = |mode: Mode| if mode == highlighted { ">" } else { " " };
    println!(" {} 1. Pitch count (ABS)", marker(Mode::PitchCount));
    println!(" {} 2. Target hit", marker(Mode::TargetHit));
    print!("choice: ");
    let _ = io::stdout().flush();
}

fn main() -> AppResult<()> {
    initialize_tracing();
    log_runtime_environment();

    let config = Config::load().context("Failed to load configuration")?;
    info!(
        "Config: serial {} @ {} baud, camera {}, poll {:?}",
        config.serial_port,
        config.baud_rate,
        config.camera_index,
        config.poll_interval()
    );

    let bus = EventBus::new();
    spawn_presentation_log(&bus);

    let mode = run_intro(&config, &bus)?;

    let running = Arc::new(AtomicBool::new(true));
    {
        let running = Arc::clone(&running);
        ctrlc::set_handler(move || {
            println!("\nShutting down...");
            running.store(false, Ordering::SeqCst);
        })
        .context("Failed to set Ctrl-C handler")?;
    }

    let mut session = Session::start(&config, mode, bus.clone());
    while running.load(Ordering::SeqCst) {
        session.pump(Duration::from_millis(100));
    }

    let final_snapshot = session.snapshot();
    session.shutdown();
    bus.publish(Event::Shutdown);

    info!(
        "Final state: B{} S{} O{} score {}",
        final_snapshot.balls, final_snapshot.strikes, final_snapshot.outs, final_snapshot.score
    );
    Ok(())
}
