use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::{log::sol_log_data, msg, pubkey::Pubkey};

/// Notifications written to the transaction log.
///
/// Each event is logged twice: borsh-encoded through `sol_log_data` for
/// indexers and the oracle, and as a readable `msg!` line.
#[derive(BorshSerialize, BorshDeserialize, Clone, Debug, PartialEq, Eq)]
pub enum RaffleEvent {
    RaffleEntered {
        player: Pubkey,
    },
    /// The randomness request picked up by the off-chain coordinator
    RandomWordsRequested {
        request_id: [u8; 32],
        key_hash: [u8; 32],
        subscription_id: u64,
        request_confirmations: u16,
        callback_compute_limit: u32,
        num_words: u32,
        sender: Pubkey,
    },
    RequestedRaffleWinner {
        request_id: [u8; 32],
    },
    WinnerPicked {
        winner: Pubkey,
    },
}

impl RaffleEvent {
    pub fn emit(&self) {
        match borsh::to_vec(self) {
            Ok(data) => sol_log_data(&[&data]),
            Err(err) => msg!("Failed to encode event: {}", err),
        }

        match self {
            RaffleEvent::RaffleEntered { player } => msg!("RaffleEntered: player={}", player),
            RaffleEvent::RandomWordsRequested {
                request_id,
                subscription_id,
                request_confirmations,
                callback_compute_limit,
                num_words,
                sender,
                ..
            } => msg!(
                "RandomWordsRequested: request_id={}, subscription={}, confirmations={}, compute_limit={}, words={}, sender={}",
                hex::encode(request_id),
                subscription_id,
                request_confirmations,
                callback_compute_limit,
                num_words,
                sender
            ),
            RaffleEvent::RequestedRaffleWinner { request_id } => {
                msg!("RequestedRaffleWinner: request_id={}", hex::encode(request_id))
            }
            RaffleEvent::WinnerPicked { winner } => msg!("WinnerPicked: winner={}", winner),
        }
    }
}
