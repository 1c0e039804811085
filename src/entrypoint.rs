#![allow(unexpected_cfgs)]
use solana_program::{
    msg,
    pubkey::Pubkey,
    account_info::AccountInfo,
    program_error::ProgramError,
    entrypoint::{entrypoint, ProgramResult}
};
use super::{
    error::EscrowError,
    processor::Processor
};


entrypoint!(process_instruction);

pub fn process_instruction(
    program_id: &Pubkey,
    accounts: &[AccountInfo],
    data: &[u8]
) -> ProgramResult {
    if let Err(error) = Processor::process(program_id, accounts, data) {
        log_error(&error);
        return Err(error);
    }

    Ok(())
}

/// Logs our own errors by message, anything else as the host reports it.
fn log_error(error: &ProgramError) {
    match error {
        ProgramError::Custom(code) => match EscrowError::try_from(*code) {
            Ok(escrow_error) => msg!("Escrow error: {}", escrow_error),
            Err(_) => msg!("Escrow error: {}", error)
        },
        _ => msg!("Escrow error: {}", error)
    }
}
