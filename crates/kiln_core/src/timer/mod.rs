mod remaining;
mod resolve;
mod spec;

pub use remaining::{RemainingTime, project};
pub use resolve::resolve;
pub use spec::{ClockTime, TimerSpec};
