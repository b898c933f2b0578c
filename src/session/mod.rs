//! Guided breathing session: state machine and indicator animation.

pub mod animation;
mod controller;
mod state;

pub use animation::IndicatorFrame;
pub use controller::{Effect, SessionController};
pub use state::{Phase, SessionSnapshot};
