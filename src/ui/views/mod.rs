mod complete;
mod session;
mod start;

pub use complete::draw_complete;
pub use session::draw_session;
pub use start::draw_start;
