/// Wallet address format check

const MIN_ADDRESS_LEN: usize = 32;
const MAX_ADDRESS_LEN: usize = 44;

/// True if `address` looks like a Solana address: 32 to 44 characters, all
/// from the base58 alphabet. Decoded length is not checked.
pub fn is_valid_wallet_address(address: &str) -> bool {
    let len = address.chars().count();
    if !(MIN_ADDRESS_LEN..=MAX_ADDRESS_LEN).contains(&len) {
        return false;
    }

    bs58::decode(address).into_vec().is_ok()
}
