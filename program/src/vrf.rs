// Randomness request/response protocol with the off-chain VRF coordinator
use solana_program::{clock::Slot, hash::hashv, pubkey::Pubkey};

use crate::{
    constants::{NUM_WORDS, REQUEST_CONFIRMATIONS, REQUEST_ID_DOMAIN},
    events::RaffleEvent,
    state::Raffle,
};

/// Derive the id of the next randomness request.
///
/// The nonce makes every request of a raffle distinct; the slot ties it to
/// the moment it was issued.
pub fn derive_request_id(raffle: &Pubkey, request_nonce: u64, slot: Slot) -> [u8; 32] {
    hashv(&[
        REQUEST_ID_DOMAIN,
        raffle.as_ref(),
        &request_nonce.to_le_bytes(),
        &slot.to_le_bytes(),
    ])
    .to_bytes()
}

/// The request record the coordinator watches for.
pub fn random_words_request(raffle: &Raffle, sender: &Pubkey, request_id: [u8; 32]) -> RaffleEvent {
    RaffleEvent::RandomWordsRequested {
        request_id,
        key_hash: raffle.oracle.key_hash,
        subscription_id: raffle.oracle.subscription_id,
        request_confirmations: REQUEST_CONFIRMATIONS,
        callback_compute_limit: raffle.oracle.callback_compute_limit,
        num_words: NUM_WORDS,
        sender: *sender,
    }
}

/// Reduce a 256-bit big-endian random word modulo `player_count`.
pub fn winner_index(random_word: &[u8; 32], player_count: u64) -> Option<u64> {
    if player_count == 0 {
        return None;
    }

    let modulus = player_count as u128;
    let index = random_word
        .iter()
        .fold(0u128, |acc, byte| ((acc << 8) | *byte as u128) % modulus);
    Some(index as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn winner_index_uses_the_whole_word() {
        let mut word = [0u8; 32];
        word[31] = 13;
        assert_eq!(winner_index(&word, 6), Some(1));

        // 2^64 mod 6 == 4
        let mut word = [0u8; 32];
        word[23] = 1;
        assert_eq!(winner_index(&word, 6), Some(4));

        assert_eq!(winner_index(&[0xff; 32], 1), Some(0));
    }

    #[test]
    fn winner_index_needs_players() {
        assert_eq!(winner_index(&[1; 32], 0), None);
    }

    #[test]
    fn request_ids_differ_per_nonce() {
        let raffle = Pubkey::new_unique();

        let first = derive_request_id(&raffle, 0, 10);
        let second = derive_request_id(&raffle, 1, 10);

        assert_ne!(first, second);
        assert_ne!(first, [0; 32]);
    }
}
