//! Client side of the Login key exchange.

use num_bigint::BigInt;
use rand::RngCore;
use rsa::pkcs8::DecodePublicKey;
use rsa::{Pkcs1v15Encrypt, RsaPublicKey};
use sha1::{Digest, Sha1};

/// Result of answering an encryption request.
pub struct KeyExchange {
    pub secret: [u8; 16],
    pub encrypted_secret: Vec<u8>,
    pub encrypted_token: Vec<u8>,
    pub server_hash: String,
}

impl std::fmt::Debug for KeyExchange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyExchange")
            .field("server_hash", &self.server_hash)
            .finish_non_exhaustive()
    }
}

pub fn generate_secret() -> [u8; 16] {
    let mut secret = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut secret);
    secret
}

/// Encrypt a fresh shared secret and the server's verify token with the
/// server's DER-encoded public key.
pub fn key_exchange(
    server_id: &str,
    public_key_der: &[u8],
    verify_token: &[u8],
) -> anyhow::Result<KeyExchange> {
    let key = RsaPublicKey::from_public_key_der(public_key_der)
        .map_err(|e| anyhow::anyhow!("Invalid server public key: {}", e))?;
    let secret = generate_secret();
    let mut rng = rand::thread_rng();
    let encrypted_secret = key.encrypt(&mut rng, Pkcs1v15Encrypt, &secret)?;
    let encrypted_token = key.encrypt(&mut rng, Pkcs1v15Encrypt, verify_token)?;
    Ok(KeyExchange {
        secret,
        encrypted_secret,
        encrypted_token,
        server_hash: server_hash(server_id, &secret, public_key_der),
    })
}

/// SHA-1 over `server_id | secret | public_key`, printed as a signed
/// two's-complement hex number without leading zeros.
pub fn server_hash(server_id: &str, secret: &[u8], public_key: &[u8]) -> String {
    let mut hasher = Sha1::new();
    hasher.update(server_id.as_bytes());
    hasher.update(secret);
    hasher.update(public_key);
    let digest = hasher.finalize();
    BigInt::from_signed_bytes_be(&digest).to_str_radix(16)
}
