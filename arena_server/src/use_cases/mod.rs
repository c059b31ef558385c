// Use cases layer: hosting contexts that drive the simulation engine.

pub mod local;
pub mod session;
pub mod sessions;
#[cfg(test)]
pub(crate) mod test_support;
pub mod types;

pub use local::LocalSession;
pub use sessions::{SessionError, SessionHandle, SessionRegistry, SessionSettings};
pub use types::{SessionCommand, SessionStatus, WorldUpdate};
