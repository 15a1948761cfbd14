//! Human-readable duration formatting for CLI and notification surfaces.

/// Formats seconds into a human-readable duration string.
/// Examples: "5m", "2m 30s", "45s", "1h 30m".
pub fn format_duration(seconds: u32) -> String {
    if seconds == 0 {
        return "0s".to_string();
    }
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let rest = seconds % 60;

    let mut parts = Vec::new();
    if hours > 0 {
        parts.push(format!("{hours}h"));
    }
    if minutes > 0 {
        parts.push(format!("{minutes}m"));
    }
    if rest > 0 {
        parts.push(format!("{rest}s"));
    }
    parts.join(" ")
}

/// Formats seconds into a compact duration string suitable for preset lists.
/// Examples: "5:00", "2:30", "1:15:30".
pub fn format_compact(seconds: u32) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let rest = seconds % 60;
    if hours > 0 {
        format!("{hours}:{minutes:02}:{rest:02}")
    } else {
        format!("{minutes}:{rest:02}")
    }
}

/// Formats seconds as MM:SS for timers and countdown displays.
pub fn format_timer_display(seconds: u32) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

/// Formats a preset's durations for list display.
/// Example: "5:00 → 20:00 → 5:00".
pub fn format_preset_durations(intro_sec: u32, main_sec: u32, outro_sec: u32) -> String {
    format!(
        "{} → {} → {}",
        format_compact(intro_sec),
        format_compact(main_sec),
        format_compact(outro_sec)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duration_picks_the_right_units() {
        assert_eq!(format_duration(0), "0s");
        assert_eq!(format_duration(45), "45s");
        assert_eq!(format_duration(300), "5m");
        assert_eq!(format_duration(150), "2m 30s");
        assert_eq!(format_duration(5400), "1h 30m");
        assert_eq!(format_duration(3661), "1h 1m 1s");
    }

    #[test]
    fn compact_rolls_over_to_hours() {
        assert_eq!(format_compact(0), "0:00");
        assert_eq!(format_compact(150), "2:30");
        assert_eq!(format_compact(300), "5:00");
        assert_eq!(format_compact(4530), "1:15:30");
    }

    #[test]
    fn timer_display_is_zero_padded() {
        assert_eq!(format_timer_display(0), "00:00");
        assert_eq!(format_timer_display(65), "01:05");
        assert_eq!(format_timer_display(1200), "20:00");
    }

    #[test]
    fn preset_durations_join_all_three_segments() {
        assert_eq!(
            format_preset_durations(300, 1200, 300),
            "5:00 → 20:00 → 5:00"
        );
    }
}
