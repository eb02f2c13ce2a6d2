//! Base64url payload decoding.
//!
//! The API encodes part bodies and attachment payloads with the URL-safe
//! alphabet, sometimes padded and sometimes not, so the decoder accepts both.

use base64::alphabet;
use base64::engine::general_purpose::GeneralPurpose;
use base64::engine::{DecodePaddingMode, Engine, GeneralPurposeConfig};

const URL_SAFE_LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Decode a base64url payload into raw bytes.
pub fn decode_bytes(data: &str) -> Result<Vec<u8>, base64::DecodeError> {
    URL_SAFE_LENIENT.decode(data)
}

/// Decode a base64url payload into text, replacing invalid UTF-8.
pub fn decode_text(data: &str) -> Result<String, base64::DecodeError> {
    Ok(String::from_utf8_lossy(&decode_bytes(data)?).into_owned())
}
