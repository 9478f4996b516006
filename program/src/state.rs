use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::{
    clock::UnixTimestamp,
    entrypoint::ProgramResult,
    program_error::ProgramError,
    program_pack::{IsInitialized, Sealed},
    pubkey::Pubkey,
};

use crate::{
    constants::{MAX_PLAYERS, NUM_WORDS, REQUEST_CONFIRMATIONS},
    error::RaffleError,
    events::RaffleEvent,
    vrf,
};

/// Status of the raffle
#[derive(BorshSerialize, BorshDeserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RaffleState {
    /// Accepting entries
    #[default]
    Open,
    /// Randomness requested, waiting for the coordinator to answer
    Calculating,
}

/// Randomness oracle settings, frozen at initialization
#[derive(BorshSerialize, BorshDeserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct OracleConfig {
    /// The only key allowed to deliver random words
    pub coordinator: Pubkey,
    /// Routing key selecting the oracle lane
    pub key_hash: [u8; 32],
    /// Billing subscription charged for each request
    pub subscription_id: u64,
    /// Compute budget the coordinator attaches to the callback transaction
    pub callback_compute_limit: u32,
}

/// Deployment parameters passed to `InitializeRaffle`
#[derive(BorshSerialize, BorshDeserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct RaffleConfig {
    /// Minimum payment per entry in lamports
    pub entrance_fee: u64,
    /// Seconds that must pass between draws
    pub interval: i64,
    pub oracle: OracleConfig,
}

impl RaffleConfig {
    pub fn validate(&self) -> Result<(), RaffleError> {
        if self.entrance_fee == 0 || self.interval <= 0 {
            return Err(RaffleError::InvalidConfig);
        }
        Ok(())
    }
}

/// Result of the eligibility check, also the `CheckUpkeep` return data
#[derive(BorshSerialize, BorshDeserialize, Clone, Debug, PartialEq, Eq)]
pub struct UpkeepCheck {
    pub upkeep_needed: bool,
    /// Reserved, always empty
    pub perform_data: Vec<u8>,
}

/// Raffle account data
#[derive(BorshSerialize, BorshDeserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct Raffle {
    /// Is the account initialized
    pub is_initialized: bool,
    /// Bump seed of the raffle PDA
    pub bump: u8,
    pub raffle_state: RaffleState,
    /// Minimum payment per entry in lamports
    pub entrance_fee: u64,
    /// Seconds that must pass between draws
    pub interval: i64,
    /// Time of initialization or of the last settlement
    pub last_timestamp: UnixTimestamp,
    /// Winner of the last draw (zero before the first one)
    pub recent_winner: Pubkey,
    pub oracle: OracleConfig,
    /// Number of randomness requests issued so far
    pub request_nonce: u64,
    /// Request waiting for the coordinator, set only while calculating
    pub pending_request_id: Option<[u8; 32]>,
    /// Entries of the current round, in entry order
    pub players: Vec<Pubkey>,
}

impl Sealed for Raffle {}

impl IsInitialized for Raffle {
    fn is_initialized(&self) -> bool {
        self.is_initialized
    }
}

impl Raffle {
    /// Fixed part of the encoding: everything but the player list
    pub const HEADER_LEN: usize = 1 + 1 + 1 + 8 + 8 + 8 + 32 + (32 + 32 + 8 + 4) + 8 + (1 + 32);

    /// Account size, with room for `MAX_PLAYERS` entries
    pub const LEN: usize = Raffle::HEADER_LEN + 4 + 32 * MAX_PLAYERS;

    /// Create a new, open raffle
    pub fn new(config: RaffleConfig, now: UnixTimestamp, bump: u8) -> Self {
        Self {
            is_initialized: true,
            bump,
            raffle_state: RaffleState::Open,
            entrance_fee: config.entrance_fee,
            interval: config.interval,
            last_timestamp: now,
            recent_winner: Pubkey::default(),
            oracle: config.oracle,
            request_nonce: 0,
            pending_request_id: None,
            players: Vec::new(),
        }
    }

    /// Decode without checking initialization
    pub fn unpack_unchecked(src: &[u8]) -> Result<Self, ProgramError> {
        Self::deserialize(&mut &src[..]).map_err(|_| ProgramError::InvalidAccountData)
    }

    pub fn unpack(src: &[u8]) -> Result<Self, ProgramError> {
        let raffle = Self::unpack_unchecked(src)?;
        if !raffle.is_initialized {
            return Err(ProgramError::UninitializedAccount);
        }
        Ok(raffle)
    }

    pub fn pack(&self, dst: &mut [u8]) -> ProgramResult {
        let mut writer = dst;
        self.serialize(&mut writer)
            .map_err(|_| ProgramError::AccountDataTooSmall)
    }

    /// Admit `player` for the current round.
    pub fn enter(&mut self, player: Pubkey, payment: u64) -> Result<RaffleEvent, RaffleError> {
        if payment < self.entrance_fee {
            return Err(RaffleError::InsufficientPayment);
        }
        if self.raffle_state != RaffleState::Open {
            return Err(RaffleError::NotOpen);
        }
        if self.players.len() >= MAX_PLAYERS {
            return Err(RaffleError::RaffleFull);
        }

        self.players.push(player);
        Ok(RaffleEvent::RaffleEntered { player })
    }

    /// Whether a draw may start at `now` with `pot` lamports collected.
    pub fn check_upkeep(&self, now: UnixTimestamp, pot: u64) -> UpkeepCheck {
        let is_open = self.raffle_state == RaffleState::Open;
        let time_passed = now.saturating_sub(self.last_timestamp) >= self.interval;
        let has_players = !self.players.is_empty();
        let has_balance = pot > 0;

        UpkeepCheck {
            upkeep_needed: is_open && time_passed && has_players && has_balance,
            perform_data: Vec::new(),
        }
    }

    /// Close the round and record `request_id` as the pending randomness request.
    pub fn perform_upkeep(
        &mut self,
        now: UnixTimestamp,
        pot: u64,
        request_id: [u8; 32],
    ) -> Result<RaffleEvent, RaffleError> {
        if !self.check_upkeep(now, pot).upkeep_needed {
            return Err(RaffleError::UpkeepNotNeeded {
                balance: pot,
                num_players: self.players.len() as u64,
                raffle_state: self.raffle_state,
            });
        }

        self.raffle_state = RaffleState::Calculating;
        self.pending_request_id = Some(request_id);
        self.request_nonce = self.request_nonce.wrapping_add(1);
        Ok(RaffleEvent::RequestedRaffleWinner { request_id })
    }

    /// Consume the coordinator's answer and reopen the raffle.
    ///
    /// Returns the drawn player. All bookkeeping is final when this returns;
    /// the caller moves the pot afterwards.
    pub fn fulfill_random_words(
        &mut self,
        request_id: [u8; 32],
        random_words: &[[u8; 32]],
        now: UnixTimestamp,
    ) -> Result<Pubkey, RaffleError> {
        if self.pending_request_id != Some(request_id) {
            return Err(RaffleError::UnknownRequest);
        }
        let random_word = random_words
            .first()
            .ok_or(RaffleError::InvalidInstructionData)?;
        let index = vrf::winner_index(random_word, self.players.len() as u64)
            .ok_or(RaffleError::NoPlayers)?;
        let winner = self.players[index as usize];

        self.recent_winner = winner;
        self.players = Vec::new();
        self.last_timestamp = now;
        self.raffle_state = RaffleState::Open;
        self.pending_request_id = None;
        Ok(winner)
    }

    pub fn raffle_state(&self) -> RaffleState {
        self.raffle_state
    }

    pub fn entrance_fee(&self) -> u64 {
        self.entrance_fee
    }

    pub fn interval(&self) -> i64 {
        self.interval
    }

    pub fn player(&self, index: usize) -> Option<&Pubkey> {
        self.players.get(index)
    }

    pub fn players(&self) -> &[Pubkey] {
        &self.players
    }

    pub fn number_of_players(&self) -> usize {
        self.players.len()
    }

    pub fn recent_winner(&self) -> Pubkey {
        self.recent_winner
    }

    pub fn last_timestamp(&self) -> UnixTimestamp {
        self.last_timestamp
    }

    pub fn pending_request_id(&self) -> Option<[u8; 32]> {
        self.pending_request_id
    }

    pub fn oracle_config(&self) -> &OracleConfig {
        &self.oracle
    }

    pub fn request_confirmations(&self) -> u16 {
        REQUEST_CONFIRMATIONS
    }

    pub fn num_words(&self) -> u32 {
        NUM_WORDS
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FEE: u64 = 10_000_000;
    const INTERVAL: i64 = 30;
    const START: UnixTimestamp = 1_700_000_000;

    fn config() -> RaffleConfig {
        RaffleConfig {
            entrance_fee: FEE,
            interval: INTERVAL,
            oracle: OracleConfig {
                coordinator: Pubkey::new_unique(),
                key_hash: [7; 32],
                subscription_id: 42,
                callback_compute_limit: 200_000,
            },
        }
    }

    fn raffle_with_players(count: usize) -> Raffle {
        let mut raffle = Raffle::new(config(), START, 255);
        for _ in 0..count {
            raffle.enter(Pubkey::new_unique(), FEE).unwrap();
        }
        raffle
    }

    fn word(low: u64) -> [u8; 32] {
        let mut word = [0u8; 32];
        word[24..].copy_from_slice(&low.to_be_bytes());
        word
    }

    #[test]
    fn new_raffle_is_open_and_empty() {
        let raffle = Raffle::new(config(), START, 255);

        assert_eq!(raffle.raffle_state(), RaffleState::Open);
        assert_eq!(raffle.number_of_players(), 0);
        assert_eq!(raffle.recent_winner(), Pubkey::default());
        assert_eq!(raffle.last_timestamp(), START);
        assert_eq!(raffle.request_confirmations(), 3);
        assert_eq!(raffle.num_words(), 1);
    }

    #[test]
    fn config_requires_positive_fee_and_interval() {
        assert!(config().validate().is_ok());
        assert_eq!(
            RaffleConfig { entrance_fee: 0, ..config() }.validate(),
            Err(RaffleError::InvalidConfig)
        );
        assert_eq!(
            RaffleConfig { interval: 0, ..config() }.validate(),
            Err(RaffleError::InvalidConfig)
        );
    }

    #[test]
    fn enter_below_fee_changes_nothing() {
        let mut raffle = raffle_with_players(1);
        let before = raffle.clone();

        assert_eq!(
            raffle.enter(Pubkey::new_unique(), FEE - 1),
            Err(RaffleError::InsufficientPayment)
        );
        assert_eq!(raffle, before);
    }

    #[test]
    fn enter_appends_player_and_reports_it() {
        let mut raffle = Raffle::new(config(), START, 255);
        let player = Pubkey::new_unique();

        let event = raffle.enter(player, FEE).unwrap();

        assert_eq!(event, RaffleEvent::RaffleEntered { player });
        assert_eq!(raffle.player(0), Some(&player));
        assert_eq!(raffle.number_of_players(), 1);
    }

    #[test]
    fn enter_while_calculating_is_rejected() {
        let mut raffle = raffle_with_players(1);
        raffle
            .perform_upkeep(START + INTERVAL, FEE, [1; 32])
            .unwrap();

        assert_eq!(
            raffle.enter(Pubkey::new_unique(), FEE),
            Err(RaffleError::NotOpen)
        );
        assert_eq!(raffle.number_of_players(), 1);
    }

    #[test]
    fn enter_stops_at_capacity() {
        let mut raffle = raffle_with_players(MAX_PLAYERS);

        assert_eq!(
            raffle.enter(Pubkey::new_unique(), FEE),
            Err(RaffleError::RaffleFull)
        );
    }

    #[test]
    fn full_ledger_fits_the_account() {
        let mut raffle = raffle_with_players(MAX_PLAYERS);
        raffle.pending_request_id = Some([9; 32]);

        assert_eq!(borsh::to_vec(&raffle).unwrap().len(), Raffle::LEN);
    }

    #[test]
    fn zeroed_account_is_uninitialized() {
        let data = vec![0u8; Raffle::LEN];

        assert_eq!(Raffle::unpack(&data), Err(ProgramError::UninitializedAccount));
        assert!(!Raffle::unpack_unchecked(&data).unwrap().is_initialized);
    }

    #[test]
    fn check_upkeep_needs_balance() {
        let raffle = raffle_with_players(1);

        assert!(!raffle.check_upkeep(START + 10 * INTERVAL, 0).upkeep_needed);
    }

    #[test]
    fn check_upkeep_needs_players() {
        let raffle = Raffle::new(config(), START, 255);

        assert!(!raffle.check_upkeep(START + INTERVAL, FEE).upkeep_needed);
    }

    #[test]
    fn check_upkeep_waits_for_interval() {
        let raffle = raffle_with_players(1);

        assert!(!raffle.check_upkeep(START + INTERVAL - 1, FEE).upkeep_needed);
        assert!(raffle.check_upkeep(START + INTERVAL, FEE).upkeep_needed);
    }

    #[test]
    fn check_upkeep_is_false_while_calculating() {
        let mut raffle = raffle_with_players(2);
        raffle
            .perform_upkeep(START + INTERVAL, 2 * FEE, [1; 32])
            .unwrap();

        let check = raffle.check_upkeep(START + 2 * INTERVAL, 2 * FEE);
        assert!(!check.upkeep_needed);
        assert!(check.perform_data.is_empty());
    }

    #[test]
    fn perform_upkeep_reports_current_state_when_not_needed() {
        let mut raffle = raffle_with_players(3);
        let before = raffle.clone();

        assert_eq!(
            raffle.perform_upkeep(START + 1, 3 * FEE, [1; 32]),
            Err(RaffleError::UpkeepNotNeeded {
                balance: 3 * FEE,
                num_players: 3,
                raffle_state: RaffleState::Open,
            })
        );
        assert_eq!(raffle, before);
    }

    #[test]
    fn second_perform_upkeep_sees_calculating_state() {
        let mut raffle = raffle_with_players(1);
        raffle.perform_upkeep(START + INTERVAL, FEE, [1; 32]).unwrap();

        assert_eq!(
            raffle.perform_upkeep(START + INTERVAL, FEE, [2; 32]),
            Err(RaffleError::UpkeepNotNeeded {
                balance: FEE,
                num_players: 1,
                raffle_state: RaffleState::Calculating,
            })
        );
        assert_eq!(raffle.pending_request_id(), Some([1; 32]));
    }

    #[test]
    fn perform_upkeep_records_the_request() {
        let mut raffle = raffle_with_players(1);

        let event = raffle.perform_upkeep(START + INTERVAL, FEE, [5; 32]).unwrap();

        assert_eq!(event, RaffleEvent::RequestedRaffleWinner { request_id: [5; 32] });
        assert_eq!(raffle.raffle_state(), RaffleState::Calculating);
        assert_eq!(raffle.pending_request_id(), Some([5; 32]));
        assert_eq!(raffle.request_nonce, 1);
    }

    #[test]
    fn fulfill_for_unknown_request_changes_nothing() {
        let mut raffle = raffle_with_players(2);
        raffle.perform_upkeep(START + INTERVAL, 2 * FEE, [5; 32]).unwrap();
        let before = raffle.clone();

        assert_eq!(
            raffle.fulfill_random_words([6; 32], &[word(1)], START + INTERVAL),
            Err(RaffleError::UnknownRequest)
        );
        assert_eq!(raffle, before);
    }

    #[test]
    fn fulfill_without_pending_request_is_rejected() {
        let mut raffle = raffle_with_players(2);

        assert_eq!(
            raffle.fulfill_random_words([0; 32], &[word(1)], START + INTERVAL),
            Err(RaffleError::UnknownRequest)
        );
    }

    #[test]
    fn fulfill_requires_a_word() {
        let mut raffle = raffle_with_players(2);
        raffle.perform_upkeep(START + INTERVAL, 2 * FEE, [5; 32]).unwrap();

        assert_eq!(
            raffle.fulfill_random_words([5; 32], &[], START + INTERVAL),
            Err(RaffleError::InvalidInstructionData)
        );
        assert_eq!(raffle.raffle_state(), RaffleState::Calculating);
    }

    #[test]
    fn fulfill_picks_word_modulo_players_and_reopens() {
        let mut raffle = raffle_with_players(6);
        let expected = raffle.players()[4];
        raffle.perform_upkeep(START + INTERVAL, 6 * FEE, [5; 32]).unwrap();

        let winner = raffle
            .fulfill_random_words([5; 32], &[word(10), word(3)], START + INTERVAL + 7)
            .unwrap();

        assert_eq!(winner, expected);
        assert_eq!(raffle.recent_winner(), expected);
        assert!(raffle.players().is_empty());
        assert_eq!(raffle.last_timestamp(), START + INTERVAL + 7);
        assert_eq!(raffle.raffle_state(), RaffleState::Open);
        assert_eq!(raffle.pending_request_id(), None);
    }

    #[test]
    fn request_cannot_be_fulfilled_twice() {
        let mut raffle = raffle_with_players(1);
        raffle.perform_upkeep(START + INTERVAL, FEE, [5; 32]).unwrap();
        raffle
            .fulfill_random_words([5; 32], &[word(0)], START + INTERVAL)
            .unwrap();

        assert_eq!(
            raffle.fulfill_random_words([5; 32], &[word(0)], START + INTERVAL),
            Err(RaffleError::UnknownRequest)
        );
    }
}
