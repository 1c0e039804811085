pub mod error;
pub mod state;
pub mod processor;
pub mod instruction;

#[cfg(not(feature = "no-entrypoint"))]
pub mod entrypoint;

use solana_program::{
    declare_id,
    pubkey::Pubkey
};

declare_id!("6kTgVedWkNU87MBkUG1iemHpcjHNWzbrzzwcNEnF5hgN");

/// Label the custody authority is derived from. Shared by every trade.
pub const CUSTODY_SEED: &[u8] = b"escrow";

/// Address holding escrowed deposits. No private key exists for it; the program
/// signs for it by replaying `CUSTODY_SEED` and the bump.
pub fn find_custody_authority(program_id: &Pubkey) -> (Pubkey, u8) {
    Pubkey::find_program_address(&[CUSTODY_SEED], program_id)
}
