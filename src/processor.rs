use solana_program::{
    msg,
    rent::Rent,
    sysvar::Sysvar,
    pubkey::Pubkey,
    entrypoint::ProgramResult,
    program::{invoke, invoke_signed},
    program_pack::{Pack, IsInitialized},
    program_error::ProgramError,
    account_info::{AccountInfo, next_account_info},
};
use spl_token::state::Account as TokenAccount;
use super::{
    state::EscrowRecord,
    error::EscrowError,
    instruction::EscrowInstruction
};


pub struct Processor;

impl Processor {
    pub fn process(program_id: &Pubkey, accounts: &[AccountInfo], data: &[u8]) -> ProgramResult {
        let instruction: EscrowInstruction = EscrowInstruction::unpack(data)?;

        match instruction {
            EscrowInstruction::Initialize { amount } => {
                msg!("Instruction: Initialize");
                Self::process_initialize(program_id, accounts, amount)
            },
            EscrowInstruction::Exchange { amount } => {
                msg!("Instruction: Exchange");
                Self::process_exchange(program_id, accounts, amount)
            }
        }
    }

    fn process_initialize(program_id: &Pubkey, accounts: &[AccountInfo], amount: u64) -> ProgramResult {
        let accounts_iter = &mut accounts.iter();

        let depositor_account: &AccountInfo = next_account_info(accounts_iter)?;
        let holding_account: &AccountInfo = next_account_info(accounts_iter)?;
        let payout_account: &AccountInfo = next_account_info(accounts_iter)?;
        let escrow_account: &AccountInfo = next_account_info(accounts_iter)?;
        let token_program: &AccountInfo = next_account_info(accounts_iter)?;

        if !depositor_account.is_signer {
            return Err(EscrowError::Unauthorized.into());
        }

        if holding_account.owner != &spl_token::id()
            || payout_account.owner != &spl_token::id()
            || token_program.key != &spl_token::id()
        {
            return Err(EscrowError::WrongCustodian.into());
        }

        if escrow_account.owner != program_id {
            return Err(ProgramError::IncorrectProgramId);
        }

        // 1. make sure we are not overwriting an open trade, and that the record survives until exchange
        let escrow_record: EscrowRecord = EscrowRecord::unpack_unchecked(&escrow_account.try_borrow_data()?)?;
        if escrow_record.is_initialized() {
            return Err(EscrowError::AlreadyInUse.into());
        }

        if !Rent::get()?.is_exempt(escrow_account.lamports(), escrow_account.data_len()) {
            return Err(EscrowError::InsufficientReserve.into());
        }

        // an owner change keeps the close authority, which would leave the deposit impossible to release
        let holding: TokenAccount = TokenAccount::unpack(&holding_account.try_borrow_data()?)?;
        if holding.close_authority.is_some() {
            return Err(EscrowError::CloseAuthoritySet.into());
        }

        // 2. write the record
        let escrow_record: EscrowRecord = EscrowRecord::new(
            *depositor_account.key,
            *holding_account.key,
            *payout_account.key,
            amount
        );
        EscrowRecord::pack(escrow_record, &mut escrow_account.try_borrow_mut_data()?)?;

        // 3. hand custody of the deposit to the program-derived authority
        let (custody_authority, _bump) = crate::find_custody_authority(program_id);

        let set_authority_ix = spl_token::instruction::set_authority(
            token_program.key,
            holding_account.key,
            Some(&custody_authority),
            spl_token::instruction::AuthorityType::AccountOwner,
            depositor_account.key,
            &[depositor_account.key]
        )?;

        msg!("Calling the token program to transfer deposit custody...");
        invoke(
            &set_authority_ix,
            &[
                holding_account.clone(),
                depositor_account.clone(),
                token_program.clone()
            ]
        )?;

        Ok(())
    }

    fn process_exchange(program_id: &Pubkey, accounts: &[AccountInfo], amount_expected_by_taker: u64) -> ProgramResult {
        let accounts_iter = &mut accounts.iter();

        let taker_account: &AccountInfo = next_account_info(accounts_iter)?;
        let taker_send_account: &AccountInfo = next_account_info(accounts_iter)?;
        let taker_receive_account: &AccountInfo = next_account_info(accounts_iter)?;
        let holding_account: &AccountInfo = next_account_info(accounts_iter)?;
        let depositor_account: &AccountInfo = next_account_info(accounts_iter)?;
        let payout_account: &AccountInfo = next_account_info(accounts_iter)?;
        let escrow_account: &AccountInfo = next_account_info(accounts_iter)?;
        let token_program: &AccountInfo = next_account_info(accounts_iter)?;
        let custody_account: &AccountInfo = next_account_info(accounts_iter)?;

        if !taker_account.is_signer {
            return Err(EscrowError::Unauthorized.into());
        }

        if token_program.key != &spl_token::id() {
            return Err(EscrowError::WrongCustodian.into());
        }

        // 1. re-derive the custody authority
        let (custody_authority, bump) = crate::find_custody_authority(program_id);
        if custody_account.key != &custody_authority {
            return Err(EscrowError::CustodyAuthorityMismatch.into());
        }

        // 2. the holding account is only trusted once the record names it
        if escrow_account.owner != program_id {
            return Err(ProgramError::IncorrectProgramId);
        }

        let escrow_record: EscrowRecord = EscrowRecord::unpack_unchecked(&escrow_account.try_borrow_data()?)?;
        if !escrow_record.is_initialized() || &escrow_record.deposit_holding_reference != holding_account.key {
            return Err(EscrowError::RecordMismatch.into());
        }

        let held_amount: u64 = TokenAccount::unpack(&holding_account.try_borrow_data()?)?.amount;
        if held_amount != amount_expected_by_taker {
            return Err(EscrowError::ExpectedAmountMismatch.into());
        }

        // 3. the remaining references must be the ones the depositor recorded
        if !escrow_record.matches(depositor_account.key, holding_account.key, payout_account.key) {
            return Err(EscrowError::RecordMismatch.into());
        }

        let custody_seeds: &[&[u8]] = &[crate::CUSTODY_SEED, &[bump]];

        // 4. taker pays the depositor first
        let pay_depositor_ix = spl_token::instruction::transfer(
            token_program.key,
            taker_send_account.key,
            payout_account.key,
            taker_account.key,
            &[taker_account.key],
            escrow_record.expected_counter_amount
        )?;

        msg!("Calling the token program to pay the depositor...");
        invoke(
            &pay_depositor_ix,
            &[
                taker_send_account.clone(),
                payout_account.clone(),
                taker_account.clone(),
                token_program.clone()
            ]
        )?;

        // 5. release the deposit to the taker
        let release_ix = spl_token::instruction::transfer(
            token_program.key,
            holding_account.key,
            taker_receive_account.key,
            &custody_authority,
            &[&custody_authority],
            held_amount
        )?;

        msg!("Calling the token program to release the deposit...");
        invoke_signed(
            &release_ix,
            &[
                holding_account.clone(),
                taker_receive_account.clone(),
                custody_account.clone(),
                token_program.clone()
            ],
            &[custody_seeds]
        )?;

        // 6. close the emptied holding account, reserve goes back to the depositor
        let close_holding_ix = spl_token::instruction::close_account(
            token_program.key,
            holding_account.key,
            depositor_account.key,
            &custody_authority,
            &[&custody_authority]
        )?;

        msg!("Calling the token program to close the holding account...");
        invoke_signed(
            &close_holding_ix,
            &[
                holding_account.clone(),
                depositor_account.clone(),
                custody_account.clone(),
                token_program.clone()
            ],
            &[custody_seeds]
        )?;

        // 7. destroy the record
        Self::close_record(depositor_account, escrow_account)?;

        Ok(())
    }

    /// Moves all of `escrow_account`'s lamports to `depositor_account` and zeroes the record.
    ///
    /// An account left with no lamports is purged by the runtime once the transaction ends.
    fn close_record(depositor_account: &AccountInfo, escrow_account: &AccountInfo) -> ProgramResult {
        **depositor_account.try_borrow_mut_lamports()? = depositor_account.lamports()
            .checked_add(escrow_account.lamports())
            .ok_or(EscrowError::AmountOverflow)?;
        **escrow_account.try_borrow_mut_lamports()? = 0;

        escrow_account.try_borrow_mut_data()?.fill(0);

        Ok(())
    }
}
