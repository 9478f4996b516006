/// Seed of the raffle PDA. One raffle per program deployment.
pub const RAFFLE_SEED: &[u8] = b"raffle";

/// Ledger capacity; the raffle account is allocated for this many entries up front.
pub const MAX_PLAYERS: usize = 250;

/// Confirmation depth the oracle must wait for before answering a request.
pub const REQUEST_CONFIRMATIONS: u16 = 3;

/// Random words asked for per cycle.
pub const NUM_WORDS: u32 = 1;

/// Domain separator mixed into every request id.
pub const REQUEST_ID_DOMAIN: &[u8] = b"vrf-raffle-request";
