// Raffle Program - Utility Functions
use solana_program::{account_info::AccountInfo, pubkey::Pubkey, rent::Rent};

use crate::{constants::RAFFLE_SEED, error::RaffleError};

/// Find the program derived address of the raffle
pub fn find_raffle_address(program_id: &Pubkey) -> (Pubkey, u8) {
    Pubkey::find_program_address(&[RAFFLE_SEED], program_id)
}

/// Lamports held by the raffle account above its rent-exempt reserve
pub fn pot(lamports: u64, rent: &Rent, data_len: usize) -> u64 {
    lamports.saturating_sub(rent.minimum_balance(data_len))
}

/// Move `amount` lamports out of a program-owned account
pub fn transfer_pot(
    from: &AccountInfo,
    to: &AccountInfo,
    amount: u64,
) -> Result<(), RaffleError> {
    if !to.is_writable {
        return Err(RaffleError::PayoutFailed);
    }

    let from_balance = from
        .lamports()
        .checked_sub(amount)
        .ok_or(RaffleError::PayoutFailed)?;
    **from
        .try_borrow_mut_lamports()
        .map_err(|_| RaffleError::PayoutFailed)? = from_balance;

    let to_balance = to
        .lamports()
        .checked_add(amount)
        .ok_or(RaffleError::PayoutFailed)?;
    **to
        .try_borrow_mut_lamports()
        .map_err(|_| RaffleError::PayoutFailed)? = to_balance;

    Ok(())
}

/// Convert lamports to SOL (for display purposes)
pub fn lamports_to_sol(lamports: u64) -> f64 {
    lamports as f64 / 1_000_000_000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pot_excludes_rent_reserve() {
        let rent = Rent::default();
        let reserve = rent.minimum_balance(100);

        assert_eq!(pot(reserve + 60, &rent, 100), 60);
        assert_eq!(pot(reserve - 1, &rent, 100), 0);
    }

    #[test]
    fn transfer_pot_moves_lamports() {
        let owner = Pubkey::new_unique();
        let (from_key, to_key) = (Pubkey::new_unique(), Pubkey::new_unique());
        let (mut from_lamports, mut to_lamports) = (100u64, 5u64);
        let (mut from_data, mut to_data) = (Vec::<u8>::new(), Vec::<u8>::new());
        let from = AccountInfo::new(&from_key, false, true, &mut from_lamports, &mut from_data, &owner, false, 0);
        let to = AccountInfo::new(&to_key, false, true, &mut to_lamports, &mut to_data, &owner, false, 0);

        transfer_pot(&from, &to, 60).unwrap();

        assert_eq!(from.lamports(), 40);
        assert_eq!(to.lamports(), 65);
    }

    #[test]
    fn transfer_pot_to_readonly_account_fails() {
        let owner = Pubkey::new_unique();
        let (from_key, to_key) = (Pubkey::new_unique(), Pubkey::new_unique());
        let (mut from_lamports, mut to_lamports) = (100u64, 5u64);
        let (mut from_data, mut to_data) = (Vec::<u8>::new(), Vec::<u8>::new());
        let from = AccountInfo::new(&from_key, false, true, &mut from_lamports, &mut from_data, &owner, false, 0);
        let to = AccountInfo::new(&to_key, false, false, &mut to_lamports, &mut to_data, &owner, false, 0);

        assert_eq!(transfer_pot(&from, &to, 60), Err(RaffleError::PayoutFailed));
        assert_eq!(from.lamports(), 100);
    }
}
