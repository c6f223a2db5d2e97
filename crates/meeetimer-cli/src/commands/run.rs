use std::io::BufRead;
use std::thread;
use std::time::Duration;

use clap::Args;
use meeetimer_core::timer::preset;
use meeetimer_core::{
    validate, Config, Phase, StaggeredSink, TimerController, TimerEngine, TimerSettings,
    TimerState, Urgency,
};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::duration::parse_duration;
use crate::notify::build_sink;

/// Upper bound on waiting for queued alerts after the countdown ends.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Args)]
pub struct RunArgs {
    /// Total duration (e.g. "20m", "1h30m", "90s", "600"). Overrides config if provided.
    #[arg(short, long, value_parser = parse_duration, allow_hyphen_values = true)]
    duration: Option<i64>,
    /// Remaining time at which to alert; repeat up to three times
    #[arg(short, long = "alert", value_parser = parse_duration, allow_hyphen_values = true)]
    alerts: Vec<i64>,
    /// Use a preset length in minutes, with alerts at 10, 5 and 1 minute left
    #[arg(long, conflicts_with_all = ["duration", "alerts"])]
    preset: Option<u64>,
    /// Disable notifications for this run
    #[arg(long)]
    no_notify: bool,
    /// Print each snapshot as a JSON line
    #[arg(long)]
    json: bool,
    /// Wait for Enter before counting down
    #[arg(long)]
    manual: bool,
}

/// Keyboard commands read from stdin, one per line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LineCommand {
    Toggle,
    Pause,
    Reset,
    Quit,
    Unknown,
}

fn parse_line(line: &str) -> LineCommand {
    match line.trim().to_lowercase().as_str() {
        "" | "s" | "start" => LineCommand::Toggle,
        "p" | "pause" => LineCommand::Pause,
        "r" | "reset" => LineCommand::Reset,
        "q" | "quit" => LineCommand::Quit,
        _ => LineCommand::Unknown,
    }
}

fn resolve_settings(
    args: &RunArgs,
    config: &Config,
) -> Result<TimerSettings, Box<dyn std::error::Error>> {
    if let Some(minutes) = args.preset {
        return Ok(preset(minutes)?);
    }
    let settings = match (args.duration, args.alerts.is_empty()) {
        (Some(duration), _) => validate(duration, &args.alerts)?,
        (None, false) => validate(config.timer.total_duration_seconds, &args.alerts)?,
        (None, true) => config.timer_settings(),
    };
    Ok(settings)
}

fn phase_label(phase: Phase) -> &'static str {
    match phase {
        Phase::Idle => "stopped",
        Phase::Running => "running",
        Phase::Paused => "paused",
        Phase::Finished => "finished",
    }
}

fn urgency_marker(urgency: Urgency) -> &'static str {
    match urgency {
        Urgency::Calm => " ",
        Urgency::Halfway => "~",
        Urgency::Closing => "!",
        Urgency::Critical => "!!",
    }
}

/// One status line: clock, phase, progress and the alert checklist.
pub fn status_line(state: &TimerState) -> String {
    let alerts: Vec<String> = state
        .alert_thresholds
        .iter()
        .map(|&t| {
            let mark = if state.is_triggered(t) { " ✓" } else { "" };
            format!("{}{}", meeetimer_core::timer::format_clock(t), mark)
        })
        .collect();
    format!(
        "{:>6} {:<2} {:<8} {:>3.0}%  elapsed {}  alerts [{}]",
        state.clock(),
        urgency_marker(state.urgency()),
        phase_label(state.phase),
        state.progress_pct(),
        state.elapsed_clock(),
        alerts.join(", ")
    )
}

fn print_state(state: &TimerState, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    if json {
        println!("{}", serde_json::to_string(state)?);
    } else {
        println!("{}", status_line(state));
    }
    Ok(())
}

/// Forward stdin lines from a dedicated thread.
///
/// The thread is never joined: a blocking read cannot be cancelled, and the
/// process must be free to exit while it waits for input. It stops on EOF,
/// on a read error, or once the receiver is gone.
fn spawn_stdin_reader(input: impl BufRead + Send + 'static) -> mpsc::UnboundedReceiver<String> {
    let (tx, rx) = mpsc::unbounded_channel();
    let spawned = thread::Builder::new()
        .name("meeetimer-stdin".to_string())
        .spawn(move || {
            for line in input.lines() {
                match line {
                    Ok(line) => {
                        if tx.send(line).is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        warn!(error = %e, "stdin read failed");
                        break;
                    }
                }
            }
        });
    if let Err(e) = spawned {
        warn!(error = %e, "could not start stdin reader");
    }
    rx
}

pub async fn run(args: RunArgs) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = Config::load_or_default();
    let settings = resolve_settings(&args, &config)?;

    config.remember(&settings);
    if let Err(e) = config.save() {
        warn!(error = %e, "could not remember timer settings");
    }

    let inner = build_sink(&config, &settings, args.no_notify);
    let (sink, worker) = StaggeredSink::spawn(inner, config.stagger());
    let mut controller = TimerController::new(TimerEngine::new(settings.clone(), sink));
    let mut snapshots = controller.subscribe();

    info!(
        total_secs = settings.total_duration_secs(),
        alerts = ?settings.alert_thresholds(),
        "timer ready"
    );
    if !args.json {
        eprintln!("Enter: start/pause/resume   p: pause   r: reset   q: quit");
    }
    let initial = snapshots.borrow_and_update().clone();
    print_state(&initial, args.json)?;

    if !args.manual {
        controller.start()?;
    }

    let mut lines = spawn_stdin_reader(std::io::BufReader::new(std::io::stdin()));
    let mut stdin_open = true;

    loop {
        tokio::select! {
            changed = snapshots.changed() => {
                if changed.is_err() {
                    break;
                }
                let state = snapshots.borrow_and_update().clone();
                print_state(&state, args.json)?;
                if state.phase == Phase::Finished {
                    break;
                }
            }
            line = lines.recv(), if stdin_open => {
                match line {
                    Some(line) => match parse_line(&line) {
                        LineCommand::Toggle => {
                            controller.toggle()?;
                        }
                        LineCommand::Pause => {
                            controller.pause()?;
                        }
                        LineCommand::Reset => {
                            controller.reset(None)?;
                        }
                        LineCommand::Quit => break,
                        LineCommand::Unknown => {
                            eprintln!("unknown command: {}", line.trim());
                        }
                    },
                    None => {
                        debug!("stdin closed, running without keyboard control");
                        stdin_open = false;
                    }
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("interrupted");
                break;
            }
        }
    }

    controller.shutdown();
    drop(controller);
    match tokio::time::timeout(DRAIN_TIMEOUT, worker).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => warn!(error = %e, "notification worker failed"),
        Err(_) => warn!("gave up waiting for pending notifications"),
    }
    Ok(())
}
