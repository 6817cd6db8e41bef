pub mod decision;
pub mod observer;
pub mod screen;

pub use decision::{decide, BlockDecision, DecisionInput, IgnoredPackages, SkipReason};
pub use observer::{BlockScreenLauncher, ForegroundObserver};
pub use screen::{format_tag_id, BlockedScreen, ScreenOutcome};
