use aes::cipher::{BlockEncrypt, KeyInit};
use aes::Aes128;
use std::fmt;

/// AES-128-CFB8 that keeps its shift register between calls, so a stream can
/// be processed in arbitrarily sized pieces.
pub struct Cfb8Cipher {
    cipher: Aes128,
    iv: [u8; 16],
}

impl Cfb8Cipher {
    pub fn new(key: &[u8; 16], iv: &[u8; 16]) -> Self {
        let cipher = Aes128::new(key.into());
        Self { cipher, iv: *iv }
    }

    pub fn encrypt(&mut self, data: &mut [u8]) {
        for byte in data.iter_mut() {
            let mut block = aes::Block::from(self.iv);
            self.cipher.encrypt_block(&mut block);
            *byte ^= block[0];
            // Shift IV left by 1, append ciphertext byte
            self.iv.copy_within(1.., 0);
            self.iv[15] = *byte;
        }
    }

    pub fn decrypt(&mut self, data: &mut [u8]) {
        for byte in data.iter_mut() {
            let mut block = aes::Block::from(self.iv);
            self.cipher.encrypt_block(&mut block);
            let ciphertext = *byte;
            *byte ^= block[0];
            self.iv.copy_within(1.., 0);
            self.iv[15] = ciphertext;
        }
    }
}

impl fmt::Debug for Cfb8Cipher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cfb8Cipher").finish_non_exhaustive()
    }
}

/// Send-side half of a session cipher.
#[derive(Debug)]
pub struct Encryptor(Cfb8Cipher);

impl Encryptor {
    pub fn apply(&mut self, data: &mut [u8]) {
        self.0.encrypt(data);
    }
}

/// Receive-side half of a session cipher.
#[derive(Debug)]
pub struct Decryptor(Cfb8Cipher);

impl Decryptor {
    pub fn apply(&mut self, data: &mut [u8]) {
        self.0.decrypt(data);
    }
}

/// Both halves for a login shared secret. The protocol uses the secret as
/// key and IV in each direction.
pub fn session_ciphers(shared_secret: &[u8; 16]) -> (Encryptor, Decryptor) {
    (
        Encryptor(Cfb8Cipher::new(shared_secret, shared_secret)),
        Decryptor(Cfb8Cipher::new(shared_secret, shared_secret)),
    )
}
