use solana_program::{decode_error::DecodeError, program_error::ProgramError};
use thiserror::Error;

use crate::state::RaffleState;

/// Errors that may be returned by the Raffle program
#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
pub enum RaffleError {
    /// Invalid instruction data passed
    #[error("Invalid instruction data")]
    InvalidInstructionData,

    /// Payment attached to an entry is below the entrance fee
    #[error("Payment is below the entrance fee")]
    InsufficientPayment,

    /// Raffle is drawing a winner and does not accept entries
    #[error("Raffle is not open")]
    NotOpen,

    /// A draw was requested while the raffle is not eligible for one
    #[error("Upkeep not needed: balance={balance}, players={num_players}, state={raffle_state:?}")]
    UpkeepNotNeeded {
        balance: u64,
        num_players: u64,
        raffle_state: RaffleState,
    },

    /// Moving the pot to the winner failed
    #[error("Payout to the winner failed")]
    PayoutFailed,

    /// Randomness was delivered by someone other than the coordinator
    #[error("Only the configured coordinator can deliver randomness")]
    Unauthorized,

    /// Randomness was delivered for a request that is not pending
    #[error("Request id does not match the pending request")]
    UnknownRequest,

    /// The account passed as winner is not the drawn player
    #[error("Winner account does not match the drawn player")]
    WinnerAccountMismatch,

    /// Ledger is at capacity
    #[error("Raffle is full")]
    RaffleFull,

    /// Entrance fee or interval is not positive
    #[error("Invalid raffle configuration")]
    InvalidConfig,

    /// A draw was settled with an empty ledger
    #[error("No players in the raffle")]
    NoPlayers,
}

impl RaffleError {
    /// Code carried by `ProgramError::Custom`.
    pub fn code(&self) -> u32 {
        match self {
            RaffleError::InvalidInstructionData => 0,
            RaffleError::InsufficientPayment => 1,
            RaffleError::NotOpen => 2,
            RaffleError::UpkeepNotNeeded { .. } => 3,
            RaffleError::PayoutFailed => 4,
            RaffleError::Unauthorized => 5,
            RaffleError::UnknownRequest => 6,
            RaffleError::WinnerAccountMismatch => 7,
            RaffleError::RaffleFull => 8,
            RaffleError::InvalidConfig => 9,
            RaffleError::NoPlayers => 10,
        }
    }
}

impl From<RaffleError> for ProgramError {
    fn from(e: RaffleError) -> Self {
        ProgramError::Custom(e.code())
    }
}

impl<T> DecodeError<T> for RaffleError {
    fn type_of() -> &'static str {
        "Raffle Error"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upkeep_not_needed_keeps_its_code_and_payload() {
        let error = RaffleError::UpkeepNotNeeded {
            balance: 60,
            num_players: 6,
            raffle_state: RaffleState::Calculating,
        };

        assert_eq!(ProgramError::from(error), ProgramError::Custom(3));
        assert_eq!(
            error.to_string(),
            "Upkeep not needed: balance=60, players=6, state=Calculating"
        );
    }
}
