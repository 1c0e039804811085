use thiserror::Error;
use solana_program::program_error::ProgramError;


/// Errors returned by the escrow program.
///
/// Every variant maps to `ProgramError::Custom` with its declaration index as
/// the code, so the order here is part of the program's interface.
#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
pub enum EscrowError {
    #[error("Invalid instruction")]
    InvalidInstruction,

    #[error("Missing required signature")]
    Unauthorized,

    #[error("Account is not governed by the token program")]
    WrongCustodian,

    #[error("Escrow record is already in use")]
    AlreadyInUse,

    #[error("Escrow record is not rent exempt")]
    InsufficientReserve,

    #[error("Held amount does not match the expected amount")]
    ExpectedAmountMismatch,

    #[error("Supplied accounts do not match the escrow record")]
    RecordMismatch,

    #[error("Amount overflow")]
    AmountOverflow,

    #[error("Custody authority does not match the derived address")]
    CustodyAuthorityMismatch,

    #[error("Deposit holding account has a close authority")]
    CloseAuthoritySet,
}

impl TryFrom<u32> for EscrowError {
    type Error = ProgramError;

    fn try_from(code: u32) -> Result<Self, Self::Error> {
        Ok(match code {
            0 => Self::InvalidInstruction,
            1 => Self::Unauthorized,
            2 => Self::WrongCustodian,
            3 => Self::AlreadyInUse,
            4 => Self::InsufficientReserve,
            5 => Self::ExpectedAmountMismatch,
            6 => Self::RecordMismatch,
            7 => Self::AmountOverflow,
            8 => Self::CustodyAuthorityMismatch,
            9 => Self::CloseAuthoritySet,
            _ => return Err(ProgramError::Custom(code))
        })
    }
}

impl From<EscrowError> for ProgramError {
    fn from(e: EscrowError) -> Self {
        ProgramError::Custom(e as u32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn custom_codes_follow_declaration_order() {
        assert_eq!(ProgramError::from(EscrowError::InvalidInstruction), ProgramError::Custom(0));
        assert_eq!(ProgramError::from(EscrowError::AlreadyInUse), ProgramError::Custom(3));
        assert_eq!(ProgramError::from(EscrowError::RecordMismatch), ProgramError::Custom(6));
        assert_eq!(ProgramError::from(EscrowError::CustodyAuthorityMismatch), ProgramError::Custom(8));
    }

    #[test]
    fn codes_decode_back_to_variants() {
        for code in 0..10u32 {
            let error: EscrowError = EscrowError::try_from(code).unwrap();
            assert_eq!(ProgramError::from(error), ProgramError::Custom(code));
        }
        assert_eq!(EscrowError::try_from(10), Err(ProgramError::Custom(10)));
    }

    #[test]
    fn display_messages() {
        assert_eq!(EscrowError::AmountOverflow.to_string(), "Amount overflow");
        assert_eq!(
            EscrowError::ExpectedAmountMismatch.to_string(),
            "Held amount does not match the expected amount"
        );
    }
}
