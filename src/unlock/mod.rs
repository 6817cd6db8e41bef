pub mod controller;
mod countdown;
pub mod state;

pub use controller::{UnlockController, UnlockSnapshot};
pub use state::{UnlockState, UnlockWindow};
