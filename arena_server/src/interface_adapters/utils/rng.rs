// Non-simulation randomness: identifiers and default seeds. Anything that
// affects gameplay goes through the session's seeded `GameRng` instead.

/// Random identifier for connection logs and generated session names.
pub fn rand_id() -> u64 {
    rand::random()
}

/// Seed for a session created without one.
pub fn rand_seed() -> u64 {
    rand::random()
}
