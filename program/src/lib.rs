// VRF Raffle
// A self-running lottery on Solana: players enter for a fixed fee, anyone can
// trigger a draw once the interval has passed, and a VRF coordinator delivers
// the randomness that picks the winner of the whole pot.

pub mod constants;
pub mod entrypoint;
pub mod error;
pub mod events;
pub mod instruction;
pub mod processor;
pub mod state;
pub mod utils;
pub mod vrf;

use solana_program::{account_info::AccountInfo, entrypoint::ProgramResult, pubkey::Pubkey};

pub fn process_instruction(
    program_id: &Pubkey,
    accounts: &[AccountInfo],
    instruction_data: &[u8],
) -> ProgramResult {
    processor::Processor::process(program_id, accounts, instruction_data)
}
