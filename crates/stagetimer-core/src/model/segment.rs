use serde::{Deserialize, Serialize};

/// Current phase of the three-part timer. `Done` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Segment {
    Intro,
    Main,
    Outro,
    Done,
}

impl Segment {
    /// Lowercase label for display and logging.
    pub fn label(self) -> &'static str {
        match self {
            Segment::Intro => "intro",
            Segment::Main => "main",
            Segment::Outro => "outro",
            Segment::Done => "done",
        }
    }
}
