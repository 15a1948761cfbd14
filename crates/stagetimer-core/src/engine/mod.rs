mod actor;
mod command;
mod event;
mod reducer;

pub use actor::{TimerEngine, DEFAULT_EVENT_BUFFER};
pub use command::TimerCommand;
pub use event::TimerEvent;
pub use reducer::{reduce, Reduction};
