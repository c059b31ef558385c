use std::{env, path::PathBuf, time::Duration};

// Runtime/server configuration (not gameplay tuning).

pub fn http_port() -> u16 {
    env::var("ARENA_SERVER_PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(3001)
}

/// Session loop rate; the simulated delta is still measured per tick.
pub fn tick_interval() -> Duration {
    let hz = env::var("TICK_RATE_HZ")
        .ok()
        .and_then(|value| value.parse::<u64>().ok())
        .filter(|hz| *hz > 0)
        .unwrap_or(30);
    Duration::from_millis(1000 / hz.min(1000))
}

/// Directory for JSON session snapshots; unset keeps snapshots in memory.
pub fn snapshot_dir() -> Option<PathBuf> {
    env::var("SNAPSHOT_DIR")
        .ok()
        .filter(|dir| !dir.trim().is_empty())
        .map(PathBuf::from)
}

pub fn persist_every_ticks() -> u64 {
    env::var("PERSIST_EVERY_TICKS")
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(300)
}

pub fn admin_commands_enabled() -> bool {
    matches!(
        env::var("ADMIN_COMMANDS").as_deref(),
        Ok("1") | Ok("true")
    )
}

pub const INPUT_CHANNEL_CAPACITY: usize = 1024;
pub const WORLD_BROADCAST_CAPACITY: usize = 128;
pub const EVENT_BROADCAST_CAPACITY: usize = 64;

// Session every server starts with; sockets without a session id land here.
pub const DEFAULT_SESSION_ID: &str = "default";
