// Interface adapters: wire protocol, network handling and snapshot storage.

pub mod http;
pub mod net;
pub mod protocol;
pub mod state;
pub mod storage;
pub mod utils;
