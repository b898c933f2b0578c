//! Best-effort platform side effects of a running session.

mod audio;
mod wake_lock;

pub use audio::CuePlayer;
pub use wake_lock::WakeLock;
