// Crypto codec for the SYR Connect wire format.
//
// Every command body travels as AES-256-CBC ciphertext under a fixed
// key/IV pair, base64-encoded for the HTTP body. The vendor pads with
// zero bytes to the block boundary instead of PKCS#7, so unpadding
// strips trailing NULs (then trailing whitespace) after decryption.

use aes::Aes256;
use aes::cipher::block_padding::NoPadding;
use aes::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;

use crate::error::Error;

type Aes256CbcEnc = cbc::Encryptor<Aes256>;
type Aes256CbcDec = cbc::Decryptor<Aes256>;

const BLOCK_SIZE: usize = 16;

/// AES key shipped with the vendor app, hex-encoded.
const WIRE_KEY_HEX: &str = "d805a5c409dc354b6ccf03a2c29a5825851cf31979abf526ede72570c52cf954";

/// Fixed CBC initialization vector, hex-encoded.
const WIRE_IV_HEX: &str = "408a42beb8a1cefad990098584ed51a5";

/// Stateless encrypt/decrypt pair over the vendor's wire encoding.
///
/// Owns the base64 step in both directions: callers hand over plaintext
/// command strings and receive wire text, and vice versa. Deterministic
/// for a given key/IV, which the protocol requires (the server decrypts
/// with the same fixed material).
#[derive(Clone)]
pub struct WireCodec {
    key: [u8; 32],
    iv: [u8; 16],
}

impl std::fmt::Debug for WireCodec {
    // Key material stays out of debug output.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WireCodec").finish_non_exhaustive()
    }
}

impl WireCodec {
    /// Create a codec from hex-encoded key material.
    pub fn new(key_hex: &str, iv_hex: &str) -> Result<Self, Error> {
        let key: [u8; 32] = hex::decode(key_hex)
            .map_err(|e| Error::validation(format!("encryption key is not valid hex: {e}")))?
            .try_into()
            .map_err(|_| Error::validation("encryption key must be 32 bytes"))?;
        let iv: [u8; 16] = hex::decode(iv_hex)
            .map_err(|e| Error::validation(format!("encryption IV is not valid hex: {e}")))?
            .try_into()
            .map_err(|_| Error::validation("encryption IV must be 16 bytes"))?;
        Ok(Self { key, iv })
    }

    /// Codec preloaded with the key material the vendor app ships.
    pub fn vendor_default() -> Self {
        Self::new(WIRE_KEY_HEX, WIRE_IV_HEX).expect("vendor key material is valid hex")
    }

    /// Encrypt a plaintext command string into wire text (base64).
    pub fn encrypt(&self, plaintext: &str) -> String {
        let mut buf = plaintext.as_bytes().to_vec();
        let padded_len = buf.len().div_ceil(BLOCK_SIZE) * BLOCK_SIZE;
        buf.resize(padded_len, 0);

        let ciphertext = Aes256CbcEnc::new((&self.key).into(), (&self.iv).into())
            .encrypt_padded_mut::<NoPadding>(&mut buf, padded_len)
            .expect("buffer sized to the block boundary");

        BASE64.encode(ciphertext)
    }

    /// Decrypt wire text (base64 ciphertext) back into the plaintext
    /// document.
    ///
    /// Any malformed input -- bad base64, unaligned ciphertext, non-UTF-8
    /// plaintext -- surfaces as [`Error::Decode`]; cipher-crate error
    /// types never leak to callers.
    pub fn decrypt(&self, wire_text: &str) -> Result<String, Error> {
        let trimmed = wire_text.trim();
        if trimmed.is_empty() {
            return Err(Error::decode("encrypted payload is empty"));
        }

        let mut data = BASE64
            .decode(trimmed)
            .map_err(|e| Error::decode(format!("wire payload is not base64: {e}")))?;

        if data.is_empty() || data.len() % BLOCK_SIZE != 0 {
            return Err(Error::decode(format!(
                "ciphertext length {} is not block-aligned",
                data.len()
            )));
        }

        let plaintext = Aes256CbcDec::new((&self.key).into(), (&self.iv).into())
            .decrypt_padded_mut::<NoPadding>(&mut data)
            .map_err(|_| Error::decode("ciphertext could not be decrypted"))?;

        let text = std::str::from_utf8(plaintext)
            .map_err(|e| Error::decode(format!("decrypted payload is not UTF-8: {e}")))?;

        Ok(text.trim_end_matches('\0').trim_end().to_owned())
    }
}

impl Default for WireCodec {
    fn default() -> Self {
        Self::vendor_default()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_single_block() {
        let codec = WireCodec::vendor_default();
        let wire = codec.encrypt("<sc><us/></sc>");
        assert_eq!(codec.decrypt(&wire).unwrap(), "<sc><us/></sc>");
    }

    #[test]
    fn round_trips_multi_block_and_non_ascii() {
        let codec = WireCodec::vendor_default();
        let plaintext =
            r#"<sc><si v="App-3.7.10"/><us ug="abc"/><pr n="Zuhause Küche größer"/></sc>"#;
        let wire = codec.encrypt(plaintext);
        assert_eq!(codec.decrypt(&wire).unwrap(), plaintext);
    }

    #[test]
    fn round_trips_exact_block_boundary() {
        let codec = WireCodec::vendor_default();
        let plaintext = "0123456789abcdef0123456789abcdef";
        assert_eq!(plaintext.len() % BLOCK_SIZE, 0);
        let wire = codec.encrypt(plaintext);
        assert_eq!(codec.decrypt(&wire).unwrap(), plaintext);
    }

    #[test]
    fn ciphertext_is_block_aligned_base64() {
        let codec = WireCodec::vendor_default();
        let wire = codec.encrypt("x");
        let raw = BASE64.decode(&wire).unwrap();
        assert_eq!(raw.len(), BLOCK_SIZE);
    }

    #[test]
    fn decrypt_rejects_empty_payload() {
        let codec = WireCodec::vendor_default();
        assert!(matches!(codec.decrypt(""), Err(Error::Decode { .. })));
        assert!(matches!(codec.decrypt("   \n"), Err(Error::Decode { .. })));
    }

    #[test]
    fn decrypt_rejects_garbage_base64() {
        let codec = WireCodec::vendor_default();
        assert!(matches!(
            codec.decrypt("not//valid//base64!!!"),
            Err(Error::Decode { .. })
        ));
    }

    #[test]
    fn decrypt_rejects_truncated_ciphertext() {
        let codec = WireCodec::vendor_default();
        let wire = codec.encrypt("a payload long enough to span multiple cipher blocks");
        let mut raw = BASE64.decode(&wire).unwrap();
        raw.truncate(raw.len() - 7);
        let truncated = BASE64.encode(&raw);
        assert!(matches!(
            codec.decrypt(&truncated),
            Err(Error::Decode { .. })
        ));
    }

    #[test]
    fn rejects_short_key_material() {
        assert!(matches!(
            WireCodec::new("d805a5", WIRE_IV_HEX),
            Err(Error::Validation { .. })
        ));
        assert!(matches!(
            WireCodec::new(WIRE_KEY_HEX, "zz"),
            Err(Error::Validation { .. })
        ));
    }
}
