//! The pure timer transition function.
//!
//! Total over every `(state, command)` pair: commands that do not apply to
//! the current status reduce to the unchanged state rather than erroring.
//! Elapsed time is always recomputed from the monotonic anchor, never
//! accumulated, so a late tick or a wake-up after suspension lands on the
//! correct segment in one step.

use crate::model::{Preset, RunStatus, Segment, SegmentDurations, TimerState};

use super::{TimerCommand, TimerEvent};

/// Result of applying one command to one state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reduction {
    pub state: TimerState,
    pub events: Vec<TimerEvent>,
}

impl Reduction {
    fn unchanged(state: &TimerState) -> Self {
        Self {
            state: state.clone(),
            events: Vec::new(),
        }
    }

    fn with_events(state: TimerState, events: Vec<TimerEvent>) -> Self {
        Self { state, events }
    }
}

/// Apply `command` to `current`, producing the next state and any transition
/// events.
pub fn reduce(current: &TimerState, command: &TimerCommand) -> Reduction {
    match command {
        TimerCommand::Start { preset, now_ms } => handle_start(current, preset, *now_ms),
        TimerCommand::Tick { now_ms } => handle_tick(current, *now_ms),
        TimerCommand::Pause { now_ms } => handle_pause(current, *now_ms),
        TimerCommand::Resume { now_ms } => handle_resume(current, *now_ms),
        TimerCommand::SkipSegment { now_ms } => handle_skip(current, *now_ms),
        TimerCommand::Stop => handle_stop(current),
        TimerCommand::SegmentBoundary { segment, at_ms } => {
            handle_segment_boundary(current, *segment, *at_ms)
        }
        TimerCommand::Cancel => Reduction::unchanged(current),
    }
}

fn handle_start(current: &TimerState, preset: &Preset, now_ms: i64) -> Reduction {
    if current.status == RunStatus::Running {
        return Reduction::unchanged(current);
    }
    let meta = preset.to_meta();
    let durations = meta.durations;
    let state = TimerState {
        status: RunStatus::Running,
        segment: Segment::Intro,
        remaining_in_segment_sec: durations.intro_sec,
        elapsed_total_sec: 0,
        durations,
        started_at_monotonic_ms: Some(now_ms),
        active_preset: Some(meta),
    };
    let mut events = Vec::new();
    let state = advance_past_zero_segments(state, &mut events);
    Reduction::with_events(state, events)
}

fn handle_tick(current: &TimerState, now_ms: i64) -> Reduction {
    let (RunStatus::Running, Some(started_at)) = (current.status, current.started_at_monotonic_ms)
    else {
        return Reduction::unchanged(current);
    };
    let total = current.durations.total_sec();
    let new_elapsed = seconds_between(started_at, now_ms).min(total);
    if new_elapsed <= current.elapsed_total_sec {
        return Reduction::unchanged(current);
    }
    update_progress(current.clone(), new_elapsed)
}

fn handle_pause(current: &TimerState, now_ms: i64) -> Reduction {
    let (RunStatus::Running, Some(started_at)) = (current.status, current.started_at_monotonic_ms)
    else {
        return Reduction::unchanged(current);
    };
    let total = current.durations.total_sec();
    let new_elapsed = seconds_between(started_at, now_ms).min(total);
    let Reduction { state, mut events } = update_progress(current.clone(), new_elapsed);
    if state.status == RunStatus::Done {
        // Progress landed exactly on completion; a finished timer stays finished.
        return Reduction::with_events(state, events);
    }
    let paused = TimerState {
        status: RunStatus::Paused,
        started_at_monotonic_ms: None,
        ..state
    };
    events.push(TimerEvent::Paused {
        segment: paused.segment,
        remaining_in_segment_sec: paused.remaining_in_segment_sec,
    });
    Reduction::with_events(paused, events)
}

fn handle_resume(current: &TimerState, now_ms: i64) -> Reduction {
    if current.status != RunStatus::Paused {
        return Reduction::unchanged(current);
    }
    let resumed = TimerState {
        status: RunStatus::Running,
        started_at_monotonic_ms: Some(adjust_baseline(now_ms, current.elapsed_total_sec)),
        ..current.clone()
    };
    let mut events = vec![TimerEvent::Resumed {
        segment: resumed.segment,
    }];
    // Handles a resume landing exactly on a zero-length segment.
    let state = advance_past_zero_segments(resumed, &mut events);
    Reduction::with_events(state, events)
}

fn handle_skip(current: &TimerState, now_ms: i64) -> Reduction {
    let Some(meta) = current.active_preset.as_ref() else {
        return Reduction::unchanged(current);
    };
    if !meta.allow_skip {
        return Reduction::with_events(current.clone(), vec![TimerEvent::SkipRejected]);
    }
    if current.status != RunStatus::Running || current.segment == Segment::Done {
        return Reduction::unchanged(current);
    }
    let durations = meta.durations;
    let boundary = durations.cumulative_boundary_for(current.segment);
    let new_elapsed = boundary.min(durations.total_sec());
    let recalibrated = TimerState {
        elapsed_total_sec: new_elapsed,
        started_at_monotonic_ms: Some(adjust_baseline(now_ms, new_elapsed)),
        ..current.clone()
    };
    update_progress(recalibrated, new_elapsed)
}

fn handle_stop(current: &TimerState) -> Reduction {
    if current.status == RunStatus::Idle {
        return Reduction::unchanged(current);
    }
    // Keep the configured durations so redisplay shows the segment lengths.
    Reduction::with_events(
        TimerState::idle(current.durations),
        vec![TimerEvent::Stopped],
    )
}

fn handle_segment_boundary(current: &TimerState, segment: Segment, at_ms: i64) -> Reduction {
    if current.status != RunStatus::Running {
        return Reduction::unchanged(current);
    }
    let durations = current.durations;
    let new_elapsed = durations
        .cumulative_boundary_for(segment)
        .min(durations.total_sec());
    // Elapsed moves forward only; the baseline is re-anchored to the boundary.
    let adjusted = TimerState {
        elapsed_total_sec: current.elapsed_total_sec.max(new_elapsed),
        started_at_monotonic_ms: Some(adjust_baseline(at_ms, new_elapsed)),
        ..current.clone()
    };
    let target = adjusted.elapsed_total_sec;
    update_progress(adjusted, target)
}

/// Shared progress update: emit crossed boundaries in order, detect
/// completion, and recompute the segment position from the duration table.
fn update_progress(state: TimerState, new_elapsed: u32) -> Reduction {
    let durations = state.durations;
    let mut events = Vec::new();
    for completed in boundaries_crossed(state.elapsed_total_sec, new_elapsed, durations) {
        events.push(TimerEvent::BoundaryReached {
            completed,
            next: durations.next_segment_after(completed),
        });
    }
    if new_elapsed >= durations.total_sec() {
        let done = TimerState {
            status: RunStatus::Done,
            segment: Segment::Done,
            remaining_in_segment_sec: 0,
            elapsed_total_sec: durations.total_sec(),
            started_at_monotonic_ms: None,
            ..state
        };
        if !events.contains(&TimerEvent::Completed) {
            events.push(TimerEvent::Completed);
        }
        return Reduction::with_events(done, events);
    }
    let progress = durations.progress_for_elapsed(new_elapsed);
    let next = TimerState {
        segment: progress.segment,
        remaining_in_segment_sec: progress.remaining_in_segment_sec,
        elapsed_total_sec: new_elapsed,
        ..state
    };
    Reduction::with_events(next, events)
}

/// Skip forward over segments whose duration is zero, emitting one boundary
/// event per skip and completing outright when nothing non-empty remains.
fn advance_past_zero_segments(mut state: TimerState, events: &mut Vec<TimerEvent>) -> TimerState {
    while state.status == RunStatus::Running
        && state.remaining_in_segment_sec == 0
        && state.segment != Segment::Done
    {
        let completed = state.segment;
        let next = state.durations.next_segment_after(completed);
        let boundary_elapsed = state.durations.cumulative_boundary_for(completed);
        events.push(TimerEvent::BoundaryReached { completed, next });
        if next == Segment::Done {
            state = TimerState {
                status: RunStatus::Done,
                segment: Segment::Done,
                remaining_in_segment_sec: 0,
                elapsed_total_sec: state.durations.total_sec(),
                started_at_monotonic_ms: None,
                ..state
            };
            events.push(TimerEvent::Completed);
        } else {
            state = TimerState {
                segment: next,
                remaining_in_segment_sec: state.durations.duration_for(next),
                elapsed_total_sec: boundary_elapsed,
                ..state
            };
        }
    }
    state
}

/// Boundaries lying strictly after `previous` and at or before `new`, in
/// boundary order. A late or coarse tick may cross more than one.
fn boundaries_crossed(previous: u32, new: u32, durations: SegmentDurations) -> Vec<Segment> {
    if new <= previous {
        return Vec::new();
    }
    [Segment::Intro, Segment::Main, Segment::Outro]
        .into_iter()
        .filter(|segment| {
            let boundary = durations.cumulative_boundary_for(*segment);
            previous < boundary && new >= boundary
        })
        .collect()
}

fn seconds_between(start_ms: i64, now_ms: i64) -> u32 {
    let delta = (now_ms - start_ms).max(0);
    (delta / 1000).min(u32::MAX as i64) as u32
}

fn adjust_baseline(now_ms: i64, elapsed_sec: u32) -> i64 {
    now_ms - i64::from(elapsed_sec) * 1000
}
