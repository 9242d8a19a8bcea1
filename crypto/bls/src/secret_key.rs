use crate::{Error, Hash256, Signature, DST};
use blst::min_pk as blst_core;
use rand::RngCore;
use std::fmt;

/// The byte-size of a BLS secret key.
pub const SECRET_KEY_BYTES_LEN: usize = 32;

/// A BLS secret key.
pub struct SecretKey(blst_core::SecretKey);

impl SecretKey {
    /// Instantiate `Self` from some secure entropy.
    pub fn random() -> Self {
        let mut ikm = [0; SECRET_KEY_BYTES_LEN];
        rand::thread_rng().fill_bytes(&mut ikm);

        blst_core::SecretKey::key_gen(&ikm, &[])
            .map(Self)
            .expect("key_gen never fails with ikm of sufficient length")
    }

    /// Sign the given message.
    pub fn sign(&self, msg: Hash256) -> Signature {
        Signature::from_point(self.0.sign(msg.as_bytes(), DST, &[]), false)
    }

    /// Serialize `self` as bytes.
    ///
    /// ## Warning
    ///
    /// The bytes are not zeroized by this crate; the caller is responsible for handling them
    /// with appropriate care.
    pub fn serialize(&self) -> [u8; SECRET_KEY_BYTES_LEN] {
        self.0.to_bytes()
    }

    /// Deserialize `self` from bytes.
    pub fn deserialize(bytes: &[u8]) -> Result<Self, Error> {
        if bytes.len() != SECRET_KEY_BYTES_LEN {
            return Err(Error::InvalidSecretKeyLength {
                got: bytes.len(),
                expected: SECRET_KEY_BYTES_LEN,
            });
        }

        Ok(Self(blst_core::SecretKey::from_bytes(bytes)?))
    }
}

/// Never print the secret key.
impl fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SecretKey<redacted>")
    }
}
