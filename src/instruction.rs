use solana_program::{
    pubkey::Pubkey,
    program_error::ProgramError,
    instruction::{AccountMeta, Instruction},
};
use super::error::EscrowError;


#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EscrowInstruction {
    /// Locks the depositor's offer.
    ///
    /// Accounts expected:
    ///
    /// 0. `[signer]` depositor
    /// 1. `[writable]` deposit-holding token account, funded and owned by the depositor
    /// 2. `[]` depositor's token account for the counter-asset
    /// 3. `[writable]` escrow record account, rent exempt
    /// 4. `[]` token program
    Initialize {
        /// Amount of the counter-asset the depositor expects
        amount: u64
    },
    /// Pays the depositor and releases the escrowed deposit to the taker.
    ///
    /// Accounts expected:
    ///
    /// 0. `[signer]` taker
    /// 1. `[writable]` taker's token account for the counter-asset
    /// 2. `[writable]` taker's token account for the deposited asset
    /// 3. `[writable]` deposit-holding token account
    /// 4. `[writable]` depositor's main account
    /// 5. `[writable]` depositor's token account for the counter-asset
    /// 6. `[writable]` escrow record account
    /// 7. `[]` token program
    /// 8. `[]` custody authority
    Exchange {
        /// Amount the taker expects the deposit-holding account to contain
        amount: u64
    }
}

impl EscrowInstruction {
    pub fn unpack(data: &[u8]) -> Result<Self, ProgramError> {
        let (instr_type, rest) = data.split_first().ok_or(EscrowError::InvalidInstruction)?;
        let amount: u64 = Self::unpack_amount(rest)?;

        Ok(match *instr_type {
            0 => Self::Initialize { amount },
            1 => Self::Exchange { amount },
            _ => return Err(EscrowError::InvalidInstruction.into())
        })
    }

    pub fn pack(&self) -> Vec<u8> {
        let (instr_type, amount) = match self {
            Self::Initialize { amount } => (0u8, amount),
            Self::Exchange { amount } => (1u8, amount)
        };

        let mut buf: Vec<u8> = Vec::with_capacity(9);
        buf.push(instr_type);
        buf.extend_from_slice(&amount.to_le_bytes());
        buf
    }

    fn unpack_amount(rest: &[u8]) -> Result<u64, ProgramError> {
        let amount: u64 = rest
            .get(..8)
            .and_then(|bytes| bytes.try_into().ok())
            .map(u64::from_le_bytes)
            .ok_or(EscrowError::InvalidInstruction)?;

        Ok(amount)
    }
}

/// Builds an `Initialize` instruction.
pub fn initialize(
    program_id: &Pubkey,
    depositor: &Pubkey,
    deposit_holding_account: &Pubkey,
    payout_account: &Pubkey,
    escrow_account: &Pubkey,
    expected_amount: u64
) -> Instruction {
    Instruction::new_with_bytes(
        *program_id,
        &EscrowInstruction::Initialize { amount: expected_amount }.pack(),
        vec![
            AccountMeta::new_readonly(*depositor, true),
            AccountMeta::new(*deposit_holding_account, false),
            AccountMeta::new_readonly(*payout_account, false),
            AccountMeta::new(*escrow_account, false),
            AccountMeta::new_readonly(spl_token::id(), false)
        ]
    )
}

/// Builds an `Exchange` instruction. The custody authority is derived from `program_id`.
#[allow(clippy::too_many_arguments)]
pub fn exchange(
    program_id: &Pubkey,
    taker: &Pubkey,
    taker_send_account: &Pubkey,
    taker_receive_account: &Pubkey,
    deposit_holding_account: &Pubkey,
    depositor: &Pubkey,
    payout_account: &Pubkey,
    escrow_account: &Pubkey,
    expected_amount: u64
) -> Instruction {
    let (custody_authority, _bump) = crate::find_custody_authority(program_id);

    Instruction::new_with_bytes(
        *program_id,
        &EscrowInstruction::Exchange { amount: expected_amount }.pack(),
        vec![
            AccountMeta::new_readonly(*taker, true),
            AccountMeta::new(*taker_send_account, false),
            AccountMeta::new(*taker_receive_account, false),
            AccountMeta::new(*deposit_holding_account, false),
            AccountMeta::new(*depositor, false),
            AccountMeta::new(*payout_account, false),
            AccountMeta::new(*escrow_account, false),
            AccountMeta::new_readonly(spl_token::id(), false),
            AccountMeta::new_readonly(custody_authority, false)
        ]
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn is_invalid_instruction(result: Result<EscrowInstruction, ProgramError>) -> bool {
        matches!(result, Err(e) if e == EscrowError::InvalidInstruction.into())
    }

    #[test]
    fn unpack_initialize_and_exchange() {
        let mut data: Vec<u8> = vec![0];
        data.extend_from_slice(&u64::to_le_bytes(101101101));
        assert!(matches!(
            EscrowInstruction::unpack(&data),
            Ok(EscrowInstruction::Initialize { amount: 101101101 })
        ));

        data[0] = 1;
        assert!(matches!(
            EscrowInstruction::unpack(&data),
            Ok(EscrowInstruction::Exchange { amount: 101101101 })
        ));
    }

    #[test]
    fn unpack_rejects_malformed_data() {
        assert!(is_invalid_instruction(EscrowInstruction::unpack(&[])));
        assert!(is_invalid_instruction(EscrowInstruction::unpack(&[0, 1, 2, 3])));
        assert!(is_invalid_instruction(EscrowInstruction::unpack(&[1])));

        let mut data: Vec<u8> = vec![2];
        data.extend_from_slice(&u64::to_le_bytes(7));
        assert!(is_invalid_instruction(EscrowInstruction::unpack(&data)));
    }

    #[test]
    fn unpack_ignores_trailing_bytes() {
        let mut data: Vec<u8> = EscrowInstruction::Exchange { amount: 42 }.pack();
        data.push(0xff);
        assert!(matches!(
            EscrowInstruction::unpack(&data),
            Ok(EscrowInstruction::Exchange { amount: 42 })
        ));
    }

    #[test]
    fn pack_layout() {
        assert_eq!(
            EscrowInstruction::Initialize { amount: 1 }.pack(),
            vec![0, 1, 0, 0, 0, 0, 0, 0, 0]
        );
        assert_eq!(
            EscrowInstruction::Exchange { amount: u64::MAX }.pack(),
            vec![1, 255, 255, 255, 255, 255, 255, 255, 255]
        );
    }

    #[test]
    fn exchange_builder_names_derived_custody_authority() {
        let program_id = crate::ID;
        let ix = exchange(
            &program_id,
            &Pubkey::new_unique(),
            &Pubkey::new_unique(),
            &Pubkey::new_unique(),
            &Pubkey::new_unique(),
            &Pubkey::new_unique(),
            &Pubkey::new_unique(),
            &Pubkey::new_unique(),
            100
        );

        assert_eq!(ix.accounts.len(), 9);
        assert!(ix.accounts[0].is_signer);
        assert_eq!(ix.accounts[7].pubkey, spl_token::id());
        assert_eq!(ix.accounts[8].pubkey, crate::find_custody_authority(&program_id).0);
    }
}
