//! Command implementations

mod init;
mod recalculate;
mod serve;

pub use init::init;
pub use recalculate::recalculate;
pub use serve::serve;
