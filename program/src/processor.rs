use solana_program::{
    account_info::{next_account_info, AccountInfo},
    entrypoint::ProgramResult,
    msg,
    program::{invoke, invoke_signed, set_return_data},
    program_error::ProgramError,
    pubkey::Pubkey,
    system_instruction,
    sysvar::{clock::Clock, rent::Rent, Sysvar},
};

use crate::{
    constants::RAFFLE_SEED,
    error::RaffleError,
    events::RaffleEvent,
    instruction::RaffleInstruction,
    state::{Raffle, RaffleConfig},
    utils::{self, find_raffle_address, lamports_to_sol},
    vrf,
};

pub struct Processor;

impl Processor {
    pub fn process(
        program_id: &Pubkey,
        accounts: &[AccountInfo],
        instruction_data: &[u8],
    ) -> ProgramResult {
        let instruction = RaffleInstruction::unpack(instruction_data)?;

        match instruction {
            RaffleInstruction::InitializeRaffle { config } => {
                msg!("Instruction: Initialize Raffle");
                Self::process_initialize_raffle(accounts, config, program_id)
            }
            RaffleInstruction::EnterRaffle { amount } => {
                msg!("Instruction: Enter Raffle");
                Self::process_enter_raffle(accounts, amount, program_id)
            }
            RaffleInstruction::CheckUpkeep { check_data } => {
                msg!("Instruction: Check Upkeep");
                Self::process_check_upkeep(accounts, &check_data, program_id)
            }
            RaffleInstruction::PerformUpkeep { perform_data } => {
                msg!("Instruction: Perform Upkeep");
                Self::process_perform_upkeep(accounts, &perform_data, program_id)
            }
            RaffleInstruction::FulfillRandomWords {
                request_id,
                random_words,
            } => {
                msg!("Instruction: Fulfill Random Words");
                Self::process_fulfill_random_words(accounts, request_id, &random_words, program_id)
            }
        }
    }

    /// Process the InitializeRaffle instruction
    ///
    /// Creates the raffle PDA and freezes fee, interval and oracle settings.
    /// Called once per deployment.
    fn process_initialize_raffle(
        accounts: &[AccountInfo],
        config: RaffleConfig,
        program_id: &Pubkey,
    ) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let payer_info = next_account_info(account_info_iter)?;
        let raffle_info = next_account_info(account_info_iter)?;
        let system_program_info = next_account_info(account_info_iter)?;

        if !payer_info.is_signer {
            msg!("Payer must sign the transaction");
            return Err(ProgramError::MissingRequiredSignature);
        }

        let (expected_raffle_pubkey, bump_seed) = find_raffle_address(program_id);
        if *raffle_info.key != expected_raffle_pubkey {
            msg!("Invalid raffle account address");
            return Err(ProgramError::InvalidArgument);
        }

        if raffle_info.owner == program_id {
            let existing = Raffle::unpack_unchecked(&raffle_info.data.borrow())?;
            if existing.is_initialized {
                msg!("Raffle account is already initialized");
                return Err(ProgramError::AccountAlreadyInitialized);
            }
        }

        config.validate().map_err(reject)?;

        let rent = Rent::get()?;
        // Below this a pot could never be paid to an empty wallet
        let min_fee = rent.minimum_balance(0);
        if config.entrance_fee < min_fee {
            msg!(
                "Entrance fee {} is below the rent-exempt minimum {}",
                config.entrance_fee,
                min_fee
            );
            return Err(reject(RaffleError::InvalidConfig));
        }

        if raffle_info.owner != program_id {
            msg!("Creating raffle account");
            Self::create_raffle_account(
                payer_info,
                raffle_info,
                system_program_info,
                &rent,
                &[RAFFLE_SEED, &[bump_seed]],
                program_id,
            )?;
        }

        let now = Clock::get()?.unix_timestamp;
        let raffle = Raffle::new(config, now, bump_seed);
        raffle.pack(&mut raffle_info.data.borrow_mut())?;

        msg!(
            "Raffle initialized: EntranceFee={} SOL, Interval={}s, Coordinator={}",
            lamports_to_sol(config.entrance_fee),
            config.interval,
            config.oracle.coordinator
        );
        Ok(())
    }

    fn process_enter_raffle(
        accounts: &[AccountInfo],
        amount: u64,
        program_id: &Pubkey,
    ) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let player_info = next_account_info(account_info_iter)?;
        let raffle_info = next_account_info(account_info_iter)?;
        let system_program_info = next_account_info(account_info_iter)?;

        if !player_info.is_signer {
            msg!("Player must sign the transaction");
            return Err(ProgramError::MissingRequiredSignature);
        }

        let mut raffle = Self::load_raffle(raffle_info, program_id)?;
        let event = raffle.enter(*player_info.key, amount).map_err(reject)?;

        if player_info.lamports() < amount {
            msg!(
                "Insufficient funds: needed {} lamports, had {} lamports",
                amount,
                player_info.lamports()
            );
            return Err(ProgramError::InsufficientFunds);
        }

        invoke(
            &system_instruction::transfer(player_info.key, raffle_info.key, amount),
            &[
                player_info.clone(),
                raffle_info.clone(),
                system_program_info.clone(),
            ],
        )?;

        raffle.pack(&mut raffle_info.data.borrow_mut())?;
        event.emit();

        msg!(
            "Entered with {} lamports, {} players in this round",
            amount,
            raffle.number_of_players()
        );
        Ok(())
    }

    /// Process CheckUpkeep instruction
    ///
    /// Read only. The answer is written to the return data so it can be
    /// consumed through simulation.
    fn process_check_upkeep(
        accounts: &[AccountInfo],
        _check_data: &[u8],
        program_id: &Pubkey,
    ) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let raffle_info = next_account_info(account_info_iter)?;

        let raffle = Self::load_raffle(raffle_info, program_id)?;
        let now = Clock::get()?.unix_timestamp;
        let pot = utils::pot(raffle_info.lamports(), &Rent::get()?, raffle_info.data_len());

        let check = raffle.check_upkeep(now, pot);
        let data = borsh::to_vec(&check).map_err(|_| ProgramError::InvalidAccountData)?;
        set_return_data(&data);

        msg!("Upkeep needed: {}", check.upkeep_needed);
        Ok(())
    }

    /// Process PerformUpkeep instruction - step 1 of a draw
    ///
    /// Anyone can call this once the raffle is due; the eligibility check is
    /// the only gate.
    fn process_perform_upkeep(
        accounts: &[AccountInfo],
        _perform_data: &[u8],
        program_id: &Pubkey,
    ) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let caller_info = next_account_info(account_info_iter)?;
        let raffle_info = next_account_info(account_info_iter)?;

        if !caller_info.is_signer {
            msg!("Initiator must sign the transaction");
            return Err(ProgramError::MissingRequiredSignature);
        }

        let mut raffle = Self::load_raffle(raffle_info, program_id)?;
        let clock = Clock::get()?;
        let pot = utils::pot(raffle_info.lamports(), &Rent::get()?, raffle_info.data_len());

        let request_id = vrf::derive_request_id(raffle_info.key, raffle.request_nonce, clock.slot);
        let event = raffle
            .perform_upkeep(clock.unix_timestamp, pot, request_id)
            .map_err(reject)?;
        raffle.pack(&mut raffle_info.data.borrow_mut())?;

        vrf::random_words_request(&raffle, raffle_info.key, request_id).emit();
        event.emit();
        Ok(())
    }

    /// Process FulfillRandomWords instruction - step 2 of a draw
    ///
    /// Only the configured coordinator may call this. Raffle state is written
    /// back before any lamports move.
    fn process_fulfill_random_words(
        accounts: &[AccountInfo],
        request_id: [u8; 32],
        random_words: &[[u8; 32]],
        program_id: &Pubkey,
    ) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let coordinator_info = next_account_info(account_info_iter)?;
        let raffle_info = next_account_info(account_info_iter)?;
        let winner_info = next_account_info(account_info_iter)?;

        let mut raffle = Self::load_raffle(raffle_info, program_id)?;

        if !coordinator_info.is_signer || *coordinator_info.key != raffle.oracle.coordinator {
            msg!(
                "Expected coordinator {} to sign, got {} (signer: {})",
                raffle.oracle.coordinator,
                coordinator_info.key,
                coordinator_info.is_signer
            );
            return Err(reject(RaffleError::Unauthorized));
        }

        let now = Clock::get()?.unix_timestamp;
        let winner = raffle
            .fulfill_random_words(request_id, random_words, now)
            .map_err(reject)?;
        if *winner_info.key != winner {
            msg!("Drawn player is {}, got {}", winner, winner_info.key);
            return Err(reject(RaffleError::WinnerAccountMismatch));
        }

        raffle.pack(&mut raffle_info.data.borrow_mut())?;

        let prize = utils::pot(raffle_info.lamports(), &Rent::get()?, raffle_info.data_len());
        utils::transfer_pot(raffle_info, winner_info, prize).map_err(reject)?;

        RaffleEvent::WinnerPicked { winner }.emit();
        msg!("Paid {} SOL to {}", lamports_to_sol(prize), winner);
        Ok(())
    }

    /// Create the raffle PDA, or take over one that was funded before initialization.
    fn create_raffle_account<'a>(
        payer_info: &AccountInfo<'a>,
        raffle_info: &AccountInfo<'a>,
        system_program_info: &AccountInfo<'a>,
        rent: &Rent,
        signer_seeds: &[&[u8]],
        program_id: &Pubkey,
    ) -> ProgramResult {
        let required_lamports = rent.minimum_balance(Raffle::LEN);

        if raffle_info.lamports() == 0 {
            return invoke_signed(
                &system_instruction::create_account(
                    payer_info.key,
                    raffle_info.key,
                    required_lamports,
                    Raffle::LEN as u64,
                    program_id,
                ),
                &[
                    payer_info.clone(),
                    raffle_info.clone(),
                    system_program_info.clone(),
                ],
                &[signer_seeds],
            );
        }

        let top_up = required_lamports.saturating_sub(raffle_info.lamports());
        if top_up > 0 {
            msg!("Topping up prefunded raffle account by {} lamports", top_up);
            invoke(
                &system_instruction::transfer(payer_info.key, raffle_info.key, top_up),
                &[
                    payer_info.clone(),
                    raffle_info.clone(),
                    system_program_info.clone(),
                ],
            )?;
        }

        invoke_signed(
            &system_instruction::allocate(raffle_info.key, Raffle::LEN as u64),
            &[raffle_info.clone(), system_program_info.clone()],
            &[signer_seeds],
        )?;
        invoke_signed(
            &system_instruction::assign(raffle_info.key, program_id),
            &[raffle_info.clone(), system_program_info.clone()],
            &[signer_seeds],
        )
    }

    fn load_raffle(raffle_info: &AccountInfo, program_id: &Pubkey) -> Result<Raffle, ProgramError> {
        if raffle_info.owner != program_id {
            msg!("Raffle account must be owned by the program");
            return Err(ProgramError::IncorrectProgramId);
        }
        let raffle = Raffle::unpack(&raffle_info.data.borrow())?;
        Ok(raffle)
    }
}

fn reject(error: RaffleError) -> ProgramError {
    msg!("Error: {}", error);
    error.into()
}
