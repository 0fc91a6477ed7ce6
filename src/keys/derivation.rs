use super::keypair::KeyPair;
use super::phrase::{RecoveryPhrase, PHRASE_WORDS};
use crate::error::{WalletError, WalletResult};
use bip39::{Language, Mnemonic};
use hmac::{Hmac, Mac};
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::Sha512;
use std::fmt;
use tracing::debug;
use zeroize::{Zeroize, Zeroizing};

const HARDENED: u32 = 0x8000_0000;
const SLIP10_CURVE_KEY: &[u8] = b"ed25519 seed";

/// Hierarchical path `m/44'/637'/{account}'/0'/0'`.
///
/// Only the account index varies between wallets; every level is hardened
/// because ed25519 has no public derivation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DerivationPath {
    account: u32,
}

impl DerivationPath {
    pub const PURPOSE: u32 = 44;
    /// Registered coin type shared by Aptos-family networks
    pub const COIN_TYPE: u32 = 637;

    pub fn for_account(account: u32) -> WalletResult<Self> {
        if account >= HARDENED {
            return Err(WalletError::invalid_argument(format!(
                "account index {} out of range",
                account
            )));
        }
        Ok(Self { account })
    }

    pub fn account(&self) -> u32 {
        self.account
    }

    fn indices(&self) -> [u32; 5] {
        [Self::PURPOSE, Self::COIN_TYPE, self.account, 0, 0]
    }
}

impl fmt::Display for DerivationPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "m")?;
        for index in self.indices() {
            write!(f, "/{}'", index)?;
        }
        Ok(())
    }
}

/// Turns recovery phrases into signing keypairs.
///
/// Pure: no network, no storage.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeyDerivation;

impl KeyDerivation {
    pub fn new() -> Self {
        Self
    }

    /// Generate a fresh 12-word phrase from 128 bits of OS entropy.
    pub fn generate_phrase(&self) -> WalletResult<RecoveryPhrase> {
        let mut entropy = [0u8; 16];
        OsRng.fill_bytes(&mut entropy);
        let mnemonic = Mnemonic::from_entropy_in(Language::English, &entropy);
        entropy.zeroize();
        let mnemonic = mnemonic
            .map_err(|e| WalletError::DerivationFailure(format!("phrase generation failed: {}", e)))?;
        Ok(RecoveryPhrase::from(mnemonic.to_string()))
    }

    /// Check wordlist membership, word count and checksum.
    pub fn validate_phrase(&self, phrase: &RecoveryPhrase) -> bool {
        parse_mnemonic(phrase).is_ok()
    }

    /// Derive the keypair for `account` from a validated phrase.
    pub fn derive(&self, phrase: &RecoveryPhrase, account: u32) -> WalletResult<KeyPair> {
        let mnemonic = parse_mnemonic(phrase)?;
        let path = DerivationPath::for_account(account)?;
        let seed = Zeroizing::new(mnemonic.to_seed(""));

        let private_key = derive_ed25519_key(&seed[..], &path)?;
        let keypair = KeyPair::from_private_key(*private_key);
        debug!(path = %path, public_key = %keypair.public_key_hex(), "Derived keypair");
        Ok(keypair)
    }
}

fn parse_mnemonic(phrase: &RecoveryPhrase) -> WalletResult<Mnemonic> {
    if phrase.word_count() != PHRASE_WORDS {
        return Err(WalletError::InvalidPhrase);
    }
    Mnemonic::parse_in_normalized(Language::English, phrase.as_str())
        .map_err(|_| WalletError::InvalidPhrase)
}

/// SLIP-0010 ed25519 derivation along a fully hardened path.
fn derive_ed25519_key(seed: &[u8], path: &DerivationPath) -> WalletResult<Zeroizing<[u8; 32]>> {
    let (mut key, mut chain_code) = slip10_step(SLIP10_CURVE_KEY, &[seed])?;

    for index in path.indices() {
        let hardened = (index | HARDENED).to_be_bytes();
        let (child_key, child_chain) =
            slip10_step(&chain_code[..], &[&[0x00u8][..], &key[..], &hardened[..]])?;
        key = child_key;
        chain_code = child_chain;
    }

    Ok(key)
}

type Slip10Output = (Zeroizing<[u8; 32]>, Zeroizing<[u8; 32]>);

fn slip10_step(hmac_key: &[u8], parts: &[&[u8]]) -> WalletResult<Slip10Output> {
    let mut mac = Hmac::<Sha512>::new_from_slice(hmac_key)
        .map_err(|e| WalletError::DerivationFailure(e.to_string()))?;
    for part in parts {
        mac.update(part);
    }
    let mut output = mac.finalize().into_bytes();

    let mut key = Zeroizing::new([0u8; 32]);
    let mut chain_code = Zeroizing::new([0u8; 32]);
    key.copy_from_slice(&output[..32]);
    chain_code.copy_from_slice(&output[32..]);
    output.as_mut_slice().zeroize();
    Ok((key, chain_code))
}
