//! HMAC-SHA256 signed claims in JWS compact form.
//!
//! Before an organisation has any access key, privileged calls are made
//! with a short-lived token signed by a pre-shared key. [`token_from_psk`]
//! builds that token from an [`OrgClaim`]; [`ClaimSigner`] does the signing
//! and verification for any serializable claim.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{TimeDelta, Utc};
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use crate::error::SignatureError;

type HmacSha256 = Hmac<Sha256>;

/// The only algorithm produced and accepted.
pub const HS256: &str = "HS256";

/// How long a PSK bootstrap token stays valid.
pub const PSK_TOKEN_LIFETIME: TimeDelta = TimeDelta::minutes(60);

#[derive(Serialize, Deserialize)]
struct JwsHeader {
    alg: String,
}

/// Claim naming the organisation a PSK token acts for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrgClaim {
    /// Organisation id; `0` asks the service to allocate a new one.
    #[serde(rename = "OrgID")]
    pub org_id: i64,
    /// Expiry as Unix seconds.
    pub exp: i64,
}

impl OrgClaim {
    /// A claim for `org_id` that expires `lifetime` from now.
    pub fn expiring_in(org_id: i64, lifetime: TimeDelta) -> Self {
        let exp = Utc::now()
            .checked_add_signed(lifetime)
            .unwrap_or(chrono::DateTime::<Utc>::MAX_UTC)
            .timestamp();
        Self { org_id, exp }
    }
}

/// Signs and verifies compact tokens with a symmetric key.
#[derive(Clone)]
pub struct ClaimSigner {
    mac: HmacSha256,
}

impl std::fmt::Debug for ClaimSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClaimSigner")
            .field("alg", &HS256)
            .finish_non_exhaustive()
    }
}

impl ClaimSigner {
    /// Creates a signer keyed with `key`.
    ///
    /// # Errors
    ///
    /// Returns [`SignatureError::InvalidKey`] if the MAC rejects the key.
    pub fn new(key: &[u8]) -> Result<Self, SignatureError> {
        let mac = HmacSha256::new_from_slice(key).map_err(|_| SignatureError::InvalidKey)?;
        Ok(Self { mac })
    }

    /// Serializes `claim` to JSON and signs it.
    ///
    /// The same claim and key always produce the same token.
    ///
    /// # Errors
    ///
    /// Returns [`SignatureError::Serialization`] if `claim` cannot be encoded.
    pub fn sign<C: Serialize + ?Sized>(&self, claim: &C) -> Result<String, SignatureError> {
        let payload = serde_json::to_vec(claim)?;
        Ok(self.sign_payload(&payload))
    }

    /// Signs raw payload bytes.
    pub fn sign_payload(&self, payload: &[u8]) -> String {
        let header = URL_SAFE_NO_PAD.encode(format!(r#"{{"alg":"{HS256}"}}"#));
        let signing_input = format!("{header}.{}", URL_SAFE_NO_PAD.encode(payload));

        let mut mac = self.mac.clone();
        mac.update(signing_input.as_bytes());
        let signature = mac.finalize().into_bytes();

        format!("{signing_input}.{}", URL_SAFE_NO_PAD.encode(signature))
    }

    /// Checks `token` and returns its payload bytes, uninterpreted.
    ///
    /// # Errors
    ///
    /// - [`SignatureError::Malformed`] unless the token is three base64url
    ///   segments with a JSON header
    /// - [`SignatureError::UnsupportedAlgorithm`] if the header is not `HS256`
    /// - [`SignatureError::InvalidSignature`] if the MAC does not match
    pub fn verify(&self, token: &str) -> Result<Vec<u8>, SignatureError> {
        let segments: Vec<&str> = token.split('.').collect();
        let [header, payload, signature] = segments.as_slice() else {
            return Err(SignatureError::Malformed(format!(
                "expected 3 segments, found {}",
                segments.len()
            )));
        };

        let header_bytes = decode_segment("header", header)?;
        let parsed: JwsHeader = serde_json::from_slice(&header_bytes)
            .map_err(|e| SignatureError::Malformed(format!("header: {e}")))?;
        if parsed.alg != HS256 {
            return Err(SignatureError::UnsupportedAlgorithm(parsed.alg));
        }

        let signature = decode_segment("signature", signature)?;
        let mut mac = self.mac.clone();
        mac.update(header.as_bytes());
        mac.update(b".");
        mac.update(payload.as_bytes());
        mac.verify_slice(&signature)
            .map_err(|_| SignatureError::InvalidSignature)?;

        decode_segment("payload", payload)
    }
}

fn decode_segment(name: &str, segment: &str) -> Result<Vec<u8>, SignatureError> {
    URL_SAFE_NO_PAD
        .decode(segment)
        .map_err(|e| SignatureError::Malformed(format!("{name}: {e}")))
}

/// Signs `claim` with `key`.
///
/// # Errors
///
/// See [`ClaimSigner::sign`].
pub fn sign<C: Serialize + ?Sized>(claim: &C, key: &[u8]) -> Result<String, SignatureError> {
    ClaimSigner::new(key)?.sign(claim)
}

/// Verifies `token` against `key` and returns the payload bytes.
///
/// # Errors
///
/// See [`ClaimSigner::verify`].
pub fn verify(token: &str, key: &[u8]) -> Result<Vec<u8>, SignatureError> {
    ClaimSigner::new(key)?.verify(token)
}

/// Builds a bootstrap bearer token for `org_id`, valid for [`PSK_TOKEN_LIFETIME`].
///
/// # Errors
///
/// See [`ClaimSigner::sign`].
pub fn token_from_psk(psk: &SecretString, org_id: i64) -> Result<SecretString, SignatureError> {
    let claim = OrgClaim::expiring_in(org_id, PSK_TOKEN_LIFETIME);
    let token = sign(&claim, psk.expose_secret().as_bytes())?;
    Ok(SecretString::from(token))
}
