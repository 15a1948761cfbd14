use serde::{Deserialize, Serialize};

use super::Segment;

/// The three segment durations in seconds.
///
/// All arithmetic is saturating so absurdly large presets cannot overflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentDurations {
    pub intro_sec: u32,
    pub main_sec: u32,
    pub outro_sec: u32,
}

/// Position within a segment derived from total elapsed seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmentProgress {
    pub segment: Segment,
    pub elapsed_in_segment_sec: u32,
    pub remaining_in_segment_sec: u32,
}

impl SegmentDurations {
    pub fn new(intro_sec: u32, main_sec: u32, outro_sec: u32) -> Self {
        Self {
            intro_sec,
            main_sec,
            outro_sec,
        }
    }

    pub fn zero() -> Self {
        Self::new(0, 0, 0)
    }

    pub fn total_sec(&self) -> u32 {
        self.intro_sec
            .saturating_add(self.main_sec)
            .saturating_add(self.outro_sec)
    }

    pub fn duration_for(&self, segment: Segment) -> u32 {
        match segment {
            Segment::Intro => self.intro_sec,
            Segment::Main => self.main_sec,
            Segment::Outro => self.outro_sec,
            Segment::Done => 0,
        }
    }

    /// Cumulative elapsed seconds at which `segment` completes.
    pub fn cumulative_boundary_for(&self, segment: Segment) -> u32 {
        match segment {
            Segment::Intro => self.intro_sec,
            Segment::Main => self.intro_sec.saturating_add(self.main_sec),
            Segment::Outro | Segment::Done => self.total_sec(),
        }
    }

    /// Next segment after `segment`, skipping any segment whose duration is
    /// zero and terminating at `Done` when nothing non-empty remains.
    pub fn next_segment_after(&self, segment: Segment) -> Segment {
        match segment {
            Segment::Intro => {
                if self.main_sec > 0 {
                    Segment::Main
                } else if self.outro_sec > 0 {
                    Segment::Outro
                } else {
                    Segment::Done
                }
            }
            Segment::Main => {
                if self.outro_sec > 0 {
                    Segment::Outro
                } else {
                    Segment::Done
                }
            }
            Segment::Outro | Segment::Done => Segment::Done,
        }
    }

    /// Recompute the segment position directly from `elapsed_sec`.
    ///
    /// A single large jump in elapsed time always lands on the correct
    /// segment, which is what makes the reducer immune to missed ticks.
    pub fn progress_for_elapsed(&self, elapsed_sec: u32) -> SegmentProgress {
        let intro_boundary = self.intro_sec;
        let main_boundary = intro_boundary.saturating_add(self.main_sec);
        let outro_boundary = self.total_sec();

        if elapsed_sec < intro_boundary {
            SegmentProgress {
                segment: Segment::Intro,
                elapsed_in_segment_sec: elapsed_sec,
                remaining_in_segment_sec: intro_boundary - elapsed_sec,
            }
        } else if elapsed_sec < main_boundary {
            SegmentProgress {
                segment: Segment::Main,
                elapsed_in_segment_sec: elapsed_sec - intro_boundary,
                remaining_in_segment_sec: main_boundary - elapsed_sec,
            }
        } else if elapsed_sec < outro_boundary {
            SegmentProgress {
                segment: Segment::Outro,
                elapsed_in_segment_sec: elapsed_sec - main_boundary,
                remaining_in_segment_sec: outro_boundary - elapsed_sec,
            }
        } else {
            SegmentProgress {
                segment: Segment::Done,
                elapsed_in_segment_sec: self.outro_sec,
                remaining_in_segment_sec: 0,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn total_and_boundaries() {
        let d = SegmentDurations::new(300, 1200, 300);
        assert_eq!(d.total_sec(), 1800);
        assert_eq!(d.cumulative_boundary_for(Segment::Intro), 300);
        assert_eq!(d.cumulative_boundary_for(Segment::Main), 1500);
        assert_eq!(d.cumulative_boundary_for(Segment::Outro), 1800);
        assert_eq!(d.cumulative_boundary_for(Segment::Done), 1800);
    }

    #[test]
    fn next_segment_skips_empty_segments() {
        let d = SegmentDurations::new(300, 0, 300);
        assert_eq!(d.next_segment_after(Segment::Intro), Segment::Outro);

        let d = SegmentDurations::new(300, 0, 0);
        assert_eq!(d.next_segment_after(Segment::Intro), Segment::Done);

        let d = SegmentDurations::new(300, 1200, 0);
        assert_eq!(d.next_segment_after(Segment::Main), Segment::Done);
    }

    #[test]
    fn progress_lands_in_the_right_segment() {
        let d = SegmentDurations::new(300, 1200, 300);

        let p = d.progress_for_elapsed(0);
        assert_eq!(p.segment, Segment::Intro);
        assert_eq!(p.remaining_in_segment_sec, 300);

        let p = d.progress_for_elapsed(300);
        assert_eq!(p.segment, Segment::Main);
        assert_eq!(p.elapsed_in_segment_sec, 0);
        assert_eq!(p.remaining_in_segment_sec, 1200);

        let p = d.progress_for_elapsed(1799);
        assert_eq!(p.segment, Segment::Outro);
        assert_eq!(p.remaining_in_segment_sec, 1);

        let p = d.progress_for_elapsed(1800);
        assert_eq!(p.segment, Segment::Done);
        assert_eq!(p.remaining_in_segment_sec, 0);
    }

    #[test]
    fn progress_ignores_zero_length_segments() {
        let d = SegmentDurations::new(0, 10, 5);
        let p = d.progress_for_elapsed(0);
        assert_eq!(p.segment, Segment::Main);
        assert_eq!(p.remaining_in_segment_sec, 10);
    }
}
