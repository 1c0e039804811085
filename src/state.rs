use arrayref::{array_mut_ref, array_ref, array_refs, mut_array_refs};
use solana_program::{
    pubkey::Pubkey,
    program_error::ProgramError,
    program_pack::{Pack, Sealed, IsInitialized}
};


/// One in-flight trade: what the depositor locked up and what they want back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EscrowRecord {
    pub initialized: bool,
    pub depositor_identity: Pubkey,
    /// Token account holding the deposit, owned by the custody authority while the trade is open.
    pub deposit_holding_reference: Pubkey,
    /// Token account the depositor wants the counter-asset paid into.
    pub depositor_payout_reference: Pubkey,
    pub expected_counter_amount: u64
}

impl EscrowRecord {
    pub fn new(
        depositor_identity: Pubkey,
        deposit_holding_reference: Pubkey,
        depositor_payout_reference: Pubkey,
        expected_counter_amount: u64
    ) -> Self {
        Self {
            initialized: true,
            depositor_identity,
            deposit_holding_reference,
            depositor_payout_reference,
            expected_counter_amount
        }
    }

    /// True when every caller-supplied reference is the one stored in the record.
    pub fn matches(
        &self,
        depositor_identity: &Pubkey,
        deposit_holding_reference: &Pubkey,
        depositor_payout_reference: &Pubkey
    ) -> bool {
        self.initialized
            && &self.depositor_identity == depositor_identity
            && &self.deposit_holding_reference == deposit_holding_reference
            && &self.depositor_payout_reference == depositor_payout_reference
    }
}

impl IsInitialized for EscrowRecord {
    fn is_initialized(&self) -> bool {
        self.initialized
    }
}

impl Sealed for EscrowRecord {}

impl Pack for EscrowRecord {
    const LEN: usize = 1 + 32 + 32 + 32 + 8;

    fn pack_into_slice(&self, dst: &mut [u8]) {
        let dst = array_mut_ref![dst, 0, EscrowRecord::LEN];
        let (
            initialized_dst,
            depositor_dst,
            holding_dst,
            payout_dst,
            amount_dst
        ) = mut_array_refs![dst, 1, 32, 32, 32, 8];

        initialized_dst[0] = self.initialized as u8;
        depositor_dst.copy_from_slice(self.depositor_identity.as_ref());
        holding_dst.copy_from_slice(self.deposit_holding_reference.as_ref());
        payout_dst.copy_from_slice(self.depositor_payout_reference.as_ref());
        *amount_dst = self.expected_counter_amount.to_le_bytes();
    }

    // length is checked by Pack::unpack / Pack::unpack_unchecked before we get here
    fn unpack_from_slice(src: &[u8]) -> Result<Self, ProgramError> {
        let src = array_ref![src, 0, EscrowRecord::LEN];
        let (
            initialized,
            depositor,
            holding,
            payout,
            amount
        ) = array_refs![src, 1, 32, 32, 32, 8];

        let initialized = match initialized {
            [0] => false,
            [1] => true,
            _ => return Err(ProgramError::InvalidAccountData)
        };

        Ok(Self {
            initialized,
            depositor_identity: Pubkey::new_from_array(*depositor),
            deposit_holding_reference: Pubkey::new_from_array(*holding),
            depositor_payout_reference: Pubkey::new_from_array(*payout),
            expected_counter_amount: u64::from_le_bytes(*amount)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> EscrowRecord {
        EscrowRecord::new(
            Pubkey::new_unique(),
            Pubkey::new_unique(),
            Pubkey::new_unique(),
            50
        )
    }

    #[test]
    fn layout_is_fixed_width() {
        assert_eq!(EscrowRecord::LEN, 105);

        let record = sample();
        let mut buf = [0u8; EscrowRecord::LEN];
        record.pack_into_slice(&mut buf);

        assert_eq!(buf[0], 1);
        assert_eq!(&buf[1..33], record.depositor_identity.as_ref());
        assert_eq!(&buf[33..65], record.deposit_holding_reference.as_ref());
        assert_eq!(&buf[65..97], record.depositor_payout_reference.as_ref());
        assert_eq!(&buf[97..105], &50u64.to_le_bytes());

        assert_eq!(EscrowRecord::unpack(&buf).unwrap(), record);
    }

    #[test]
    fn fresh_storage_is_uninitialized() {
        let buf = [0u8; EscrowRecord::LEN];

        let record = EscrowRecord::unpack_unchecked(&buf).unwrap();
        assert!(!record.is_initialized());
        assert_eq!(EscrowRecord::unpack(&buf), Err(ProgramError::UninitializedAccount));
    }

    #[test]
    fn rejects_bad_flag_and_bad_length() {
        let mut buf = [0u8; EscrowRecord::LEN];
        buf[0] = 2;
        assert_eq!(EscrowRecord::unpack_unchecked(&buf), Err(ProgramError::InvalidAccountData));

        let short = [1u8; EscrowRecord::LEN - 1];
        assert_eq!(EscrowRecord::unpack_unchecked(&short), Err(ProgramError::InvalidAccountData));
    }

    #[test]
    fn matches_every_reference() {
        let record = sample();
        let other = Pubkey::new_unique();
        let (d, h, p) = (
            record.depositor_identity,
            record.deposit_holding_reference,
            record.depositor_payout_reference
        );

        assert!(record.matches(&d, &h, &p));
        assert!(!record.matches(&other, &h, &p));
        assert!(!record.matches(&d, &other, &p));
        assert!(!record.matches(&d, &h, &other));
        assert!(!EscrowRecord { initialized: false, ..record }.matches(&d, &h, &p));
    }
}
