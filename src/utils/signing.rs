use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Hex HMAC-SHA256 over `key:expires_at`. Used to gate document downloads
/// without holding session state.
pub fn sign_download(secret: &str, storage_key: &str, expires_at: i64) -> String {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .expect("HMAC accepts keys of any length");
    mac.update(format!("{}:{}", storage_key, expires_at).as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// A signature is valid until its embedded expiry; expired links fail even
/// with a correct signature.
pub fn verify_download(
    secret: &str,
    storage_key: &str,
    expires_at: i64,
    signature: &str,
    now_unix: i64,
) -> bool {
    if now_unix > expires_at {
        return false;
    }
    let expected = sign_download(secret, storage_key, expires_at);
    expected.eq_ignore_ascii_case(signature)
}
