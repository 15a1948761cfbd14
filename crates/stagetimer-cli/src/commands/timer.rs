use std::sync::Arc;

use clap::Subcommand;
use stagetimer_core::format::{format_preset_durations, format_timer_display};
use stagetimer_core::storage::{seed_default_presets, Config, JsonTimerStore, TimerStore};
use stagetimer_core::{
    RunStatus, Segment, SystemClock, TimerEvent, TimerHost, TimerState,
};
use tokio::io::AsyncBufReadExt;

#[derive(Subcommand)]
pub enum TimerAction {
    /// Run a timer session in the foreground.
    ///
    /// Reads `pause`, `resume`, `skip`, `stop`, and `quit` lines on stdin
    /// while the session is active.
    Run {
        /// Preset id (falls back to the default preset)
        #[arg(long)]
        preset: Option<String>,
    },
    /// Print the last known timer state as JSON
    Status,
}

pub fn run(action: TimerAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        TimerAction::Run { preset } => run_session(preset),
        TimerAction::Status => status(),
    }
}

fn status() -> Result<(), Box<dyn std::error::Error>> {
    let store = JsonTimerStore::open()?;
    match store.load_last_state() {
        Some(state) => println!("{}", serde_json::to_string_pretty(&state)?),
        None => println!("null"),
    }
    Ok(())
}

fn run_session(preset_id: Option<String>) -> Result<(), Box<dyn std::error::Error>> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(async move {
        let store: Arc<dyn TimerStore> = Arc::new(JsonTimerStore::open()?);
        seed_default_presets(store.as_ref())?;

        let preset_id = match preset_id.or_else(|| store.default_preset_id()) {
            Some(id) => id,
            None => return Err("no preset given and no default preset configured".into()),
        };

        let config = Config::load()?;
        let clock = Arc::new(SystemClock::new());
        let host = TimerHost::spawn(store, clock, None, config).await;
        host.start(&preset_id)?;

        let mut states = host.states();
        let mut events = host.events();
        let mut pulses = host.countdowns();
        let mut input = tokio::io::BufReader::new(tokio::io::stdin()).lines();
        let mut input_open = true;
        let mut saw_active = false;

        loop {
            tokio::select! {
                changed = states.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let state = states.borrow_and_update().clone();
                    print_state(&state);
                    match state.status() {
                        RunStatus::Running | RunStatus::Paused => saw_active = true,
                        RunStatus::Done => break,
                        RunStatus::Idle if saw_active => break,
                        RunStatus::Idle => {}
                    }
                }
                event = events.recv() => {
                    if let Ok(event) = event {
                        print_event(&event);
                    }
                }
                pulse = pulses.recv() => {
                    if let Ok(pulse) = pulse {
                        println!("  countdown: {}s to next boundary", pulse.seconds_left);
                    }
                }
                line = input.next_line(), if input_open => {
                    match line? {
                        Some(line) => match line.trim() {
                            "pause" => host.pause(),
                            "resume" => host.resume(),
                            "skip" => host.skip(),
                            "stop" => host.stop(),
                            "quit" | "q" => break,
                            "" => {}
                            other => {
                                eprintln!("unknown command: {other} (pause/resume/skip/stop/quit)")
                            }
                        },
                        None => input_open = false,
                    }
                }
            }
        }

        host.shutdown().await;
        Ok(())
    })
}

fn print_state(state: &TimerState) {
    match state.status() {
        RunStatus::Idle => {
            let d = state.durations();
            println!(
                "idle   {}",
                format_preset_durations(d.intro_sec, d.main_sec, d.outro_sec)
            );
        }
        RunStatus::Running => println!(
            "{:<6} {} remaining",
            state.segment().label(),
            format_timer_display(state.remaining_in_segment_sec())
        ),
        RunStatus::Paused => println!(
            "paused {} remaining in {}",
            format_timer_display(state.remaining_in_segment_sec()),
            state.segment().label()
        ),
        RunStatus::Done => println!(
            "done   total {}",
            format_timer_display(state.total_sec())
        ),
    }
}

fn print_event(event: &TimerEvent) {
    match event {
        TimerEvent::BoundaryReached { completed, next } => {
            if *next == Segment::Done {
                println!("  boundary: {} finished", completed.label());
            } else {
                println!("  boundary: {} -> {}", completed.label(), next.label());
            }
        }
        TimerEvent::Completed => println!("  completed"),
        TimerEvent::SkipRejected => println!("  skip not allowed for this preset"),
        TimerEvent::Paused { .. } | TimerEvent::Resumed { .. } | TimerEvent::Stopped => {}
    }
}
