// Network adapter modules split by client sockets vs session management routes.

pub mod client;
pub mod internal;

pub use client::{spawn_session_serializer, ws_handler};
pub use internal::create_session_handler;
