use arrayref::{array_ref, array_refs};
use solana_program::{
    instruction::{AccountMeta, Instruction},
    program_error::ProgramError,
    pubkey::Pubkey,
    system_program,
};

use crate::{
    error::RaffleError,
    state::{OracleConfig, RaffleConfig},
    utils::find_raffle_address,
};

const INITIALIZE_LEN: usize = 8 + 8 + 32 + 32 + 8 + 4;

#[derive(Clone, Debug, PartialEq)]
pub enum RaffleInstruction {
    /// Create the raffle account and freeze its configuration
    ///
    /// Accounts expected:
    /// 0. `[signer, writable]` The payer funding the raffle account
    /// 1. `[writable]` The raffle account (PDA)
    /// 2. `[]` The system program
    InitializeRaffle {
        config: RaffleConfig,
    },

    /// Enter the current round
    ///
    /// Accounts expected:
    /// 0. `[signer, writable]` The player paying the entry
    /// 1. `[writable]` The raffle account
    /// 2. `[]` The system program
    EnterRaffle {
        /// Lamports paid, at least the entrance fee
        amount: u64,
    },

    /// Evaluate whether a draw may start; answers through return data
    ///
    /// Accounts expected:
    /// 0. `[]` The raffle account
    CheckUpkeep {
        /// Reserved
        check_data: Vec<u8>,
    },

    /// Close the round and request randomness
    ///
    /// Accounts expected:
    /// 0. `[signer]` Any user (anyone can trigger a draw once it is due)
    /// 1. `[writable]` The raffle account
    PerformUpkeep {
        /// Reserved
        perform_data: Vec<u8>,
    },

    /// Deliver randomness for the pending request and pay the winner
    ///
    /// Accounts expected:
    /// 0. `[signer]` The VRF coordinator
    /// 1. `[writable]` The raffle account
    /// 2. `[writable]` The drawn player
    FulfillRandomWords {
        request_id: [u8; 32],
        random_words: Vec<[u8; 32]>,
    },
}

impl RaffleInstruction {
    /// Unpacks a byte buffer into a RaffleInstruction
    pub fn unpack(input: &[u8]) -> Result<Self, ProgramError> {
        let (tag, rest) = input
            .split_first()
            .ok_or(RaffleError::InvalidInstructionData)?;

        Ok(match tag {
            0 => {
                if rest.len() < INITIALIZE_LEN {
                    return Err(RaffleError::InvalidInstructionData.into());
                }
                let src = array_ref![rest, 0, INITIALIZE_LEN];
                let (
                    entrance_fee,
                    interval,
                    coordinator,
                    key_hash,
                    subscription_id,
                    callback_compute_limit,
                ) = array_refs![src, 8, 8, 32, 32, 8, 4];

                Self::InitializeRaffle {
                    config: RaffleConfig {
                        entrance_fee: u64::from_le_bytes(*entrance_fee),
                        interval: i64::from_le_bytes(*interval),
                        oracle: OracleConfig {
                            coordinator: Pubkey::new_from_array(*coordinator),
                            key_hash: *key_hash,
                            subscription_id: u64::from_le_bytes(*subscription_id),
                            callback_compute_limit: u32::from_le_bytes(*callback_compute_limit),
                        },
                    },
                }
            }
            1 => {
                let (amount, _) = Self::unpack_u64(rest)?;
                Self::EnterRaffle { amount }
            }
            2 => {
                let (check_data, _) = Self::unpack_bytes(rest)?;
                Self::CheckUpkeep { check_data }
            }
            3 => {
                let (perform_data, _) = Self::unpack_bytes(rest)?;
                Self::PerformUpkeep { perform_data }
            }
            4 => {
                let (request_id, rest) = Self::unpack_fixed_bytes::<32>(rest)?;
                let (count, mut rest) = Self::unpack_u32(rest)?;
                let needed = (count as usize)
                    .checked_mul(32)
                    .ok_or(RaffleError::InvalidInstructionData)?;
                if rest.len() < needed {
                    return Err(RaffleError::InvalidInstructionData.into());
                }
                let mut random_words = Vec::with_capacity(count as usize);
                for _ in 0..count {
                    let (word, tail) = Self::unpack_fixed_bytes::<32>(rest)?;
                    random_words.push(word);
                    rest = tail;
                }
                Self::FulfillRandomWords {
                    request_id,
                    random_words,
                }
            }
            _ => return Err(RaffleError::InvalidInstructionData.into()),
        })
    }

    /// Packs a RaffleInstruction into a byte buffer
    pub fn pack(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        match self {
            Self::InitializeRaffle { config } => {
                buf.push(0);
                buf.extend_from_slice(&config.entrance_fee.to_le_bytes());
                buf.extend_from_slice(&config.interval.to_le_bytes());
                buf.extend_from_slice(config.oracle.coordinator.as_ref());
                buf.extend_from_slice(&config.oracle.key_hash);
                buf.extend_from_slice(&config.oracle.subscription_id.to_le_bytes());
                buf.extend_from_slice(&config.oracle.callback_compute_limit.to_le_bytes());
            }
            Self::EnterRaffle { amount } => {
                buf.push(1);
                buf.extend_from_slice(&amount.to_le_bytes());
            }
            Self::CheckUpkeep { check_data } => {
                buf.push(2);
                buf.extend_from_slice(&(check_data.len() as u32).to_le_bytes());
                buf.extend_from_slice(check_data);
            }
            Self::PerformUpkeep { perform_data } => {
                buf.push(3);
                buf.extend_from_slice(&(perform_data.len() as u32).to_le_bytes());
                buf.extend_from_slice(perform_data);
            }
            Self::FulfillRandomWords {
                request_id,
                random_words,
            } => {
                buf.push(4);
                buf.extend_from_slice(request_id);
                buf.extend_from_slice(&(random_words.len() as u32).to_le_bytes());
                for word in random_words {
                    buf.extend_from_slice(word);
                }
            }
        }
        buf
    }

    fn unpack_fixed_bytes<const N: usize>(input: &[u8]) -> Result<([u8; N], &[u8]), ProgramError> {
        if input.len() < N {
            return Err(RaffleError::InvalidInstructionData.into());
        }
        let (bytes, rest) = input.split_at(N);
        let bytes: [u8; N] = bytes
            .try_into()
            .map_err(|_| RaffleError::InvalidInstructionData)?;
        Ok((bytes, rest))
    }

    fn unpack_u64(input: &[u8]) -> Result<(u64, &[u8]), ProgramError> {
        let (bytes, rest) = Self::unpack_fixed_bytes::<8>(input)?;
        Ok((u64::from_le_bytes(bytes), rest))
    }

    fn unpack_u32(input: &[u8]) -> Result<(u32, &[u8]), ProgramError> {
        let (bytes, rest) = Self::unpack_fixed_bytes::<4>(input)?;
        Ok((u32::from_le_bytes(bytes), rest))
    }

    fn unpack_bytes(input: &[u8]) -> Result<(Vec<u8>, &[u8]), ProgramError> {
        let (len, rest) = Self::unpack_u32(input)?;
        let len = len as usize;
        if rest.len() < len {
            return Err(RaffleError::InvalidInstructionData.into());
        }
        let (bytes, rest) = rest.split_at(len);
        Ok((bytes.to_vec(), rest))
    }
}

/// Create initialize_raffle instruction
pub fn initialize_raffle(
    program_id: &Pubkey,
    payer: &Pubkey,
    config: RaffleConfig,
) -> Result<Instruction, ProgramError> {
    let (raffle_account, _) = find_raffle_address(program_id);
    let data = RaffleInstruction::InitializeRaffle { config }.pack();

    let accounts = vec![
        AccountMeta::new(*payer, true),
        AccountMeta::new(raffle_account, false),
        AccountMeta::new_readonly(system_program::id(), false),
    ];

    Ok(Instruction {
        program_id: *program_id,
        accounts,
        data,
    })
}

/// Create enter_raffle instruction
pub fn enter_raffle(
    program_id: &Pubkey,
    player: &Pubkey,
    amount: u64,
) -> Result<Instruction, ProgramError> {
    let (raffle_account, _) = find_raffle_address(program_id);
    let data = RaffleInstruction::EnterRaffle { amount }.pack();

    let accounts = vec![
        AccountMeta::new(*player, true),
        AccountMeta::new(raffle_account, false),
        AccountMeta::new_readonly(system_program::id(), false),
    ];

    Ok(Instruction {
        program_id: *program_id,
        accounts,
        data,
    })
}

/// Create check_upkeep instruction
pub fn check_upkeep(
    program_id: &Pubkey,
    check_data: Vec<u8>,
) -> Result<Instruction, ProgramError> {
    let (raffle_account, _) = find_raffle_address(program_id);
    let data = RaffleInstruction::CheckUpkeep { check_data }.pack();

    Ok(Instruction {
        program_id: *program_id,
        accounts: vec![AccountMeta::new_readonly(raffle_account, false)],
        data,
    })
}

/// Create perform_upkeep instruction
pub fn perform_upkeep(
    program_id: &Pubkey,
    caller: &Pubkey,
    perform_data: Vec<u8>,
) -> Result<Instruction, ProgramError> {
    let (raffle_account, _) = find_raffle_address(program_id);
    let data = RaffleInstruction::PerformUpkeep { perform_data }.pack();

    let accounts = vec![
        AccountMeta::new_readonly(*caller, true),
        AccountMeta::new(raffle_account, false),
    ];

    Ok(Instruction {
        program_id: *program_id,
        accounts,
        data,
    })
}

/// Create fulfill_random_words instruction
pub fn fulfill_random_words(
    program_id: &Pubkey,
    coordinator: &Pubkey,
    winner: &Pubkey,
    request_id: [u8; 32],
    random_words: Vec<[u8; 32]>,
) -> Result<Instruction, ProgramError> {
    let (raffle_account, _) = find_raffle_address(program_id);
    let data = RaffleInstruction::FulfillRandomWords {
        request_id,
        random_words,
    }
    .pack();

    let accounts = vec![
        AccountMeta::new_readonly(*coordinator, true),
        AccountMeta::new(raffle_account, false),
        AccountMeta::new(*winner, false),
    ];

    Ok(Instruction {
        program_id: *program_id,
        accounts,
        data,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unpack_rejects_unknown_tag_and_short_input() {
        assert_eq!(
            RaffleInstruction::unpack(&[]),
            Err(ProgramError::Custom(0))
        );
        assert_eq!(
            RaffleInstruction::unpack(&[9]),
            Err(ProgramError::Custom(0))
        );
        assert_eq!(
            RaffleInstruction::unpack(&[1, 0, 0, 0]),
            Err(ProgramError::Custom(0))
        );
    }

    #[test]
    fn unpack_initialize_reads_every_field() {
        let config = RaffleConfig {
            entrance_fee: 10_000_000,
            interval: 30,
            oracle: OracleConfig {
                coordinator: Pubkey::new_unique(),
                key_hash: [3; 32],
                subscription_id: 77,
                callback_compute_limit: 500_000,
            },
        };
        let data = RaffleInstruction::InitializeRaffle { config }.pack();

        assert_eq!(data.len(), 1 + INITIALIZE_LEN);
        assert_eq!(
            RaffleInstruction::unpack(&data),
            Ok(RaffleInstruction::InitializeRaffle { config })
        );
    }

    #[test]
    fn unpack_fulfill_rejects_missing_words() {
        let mut data = vec![4];
        data.extend_from_slice(&[1; 32]);
        data.extend_from_slice(&2u32.to_le_bytes());
        data.extend_from_slice(&[5; 32]);

        assert_eq!(
            RaffleInstruction::unpack(&data),
            Err(ProgramError::Custom(0))
        );

        data.extend_from_slice(&[6; 32]);
        assert_eq!(
            RaffleInstruction::unpack(&data),
            Ok(RaffleInstruction::FulfillRandomWords {
                request_id: [1; 32],
                random_words: vec![[5; 32], [6; 32]],
            })
        );
    }
}
