//! Constant-time key confirmation: compute an authenticator over a
//! candidate key and compare against the expected canary output, for
//! single candidates and for parallel UM1 senders-by-receivers
//! searches.

use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use tracing::debug;
use zeroize::Zeroize;

use shroud_core::{bytes::constant_time_equal, CryptoError, Result};

use crate::config::{
    build_digest, build_kdf, build_mac, AuthFunctionType, AuthenticationFunctionConfiguration,
};
use crate::registry::{HashKind, KdfKind};

/// Compute the confirmation value for one candidate key.
///
/// - `Kdf`: `derive(candidate, salt, out_len)`
/// - `Mac`: `mac_candidate(additional_data)`
/// - `Digest`: `h(salt || additional_data || candidate)`
pub fn confirmation_output(
    cfg: &AuthenticationFunctionConfiguration,
    candidate: &[u8],
    out_len: usize,
) -> Result<Vec<u8>> {
    let salt = cfg.salt.as_deref().unwrap_or(&[]);
    let extra = cfg.additional_data.as_deref().unwrap_or(&[]);
    match cfg.function_type {
        AuthFunctionType::Kdf => {
            let kind = KdfKind::from_str(&cfg.function_name)?;
            let kdf = build_kdf(kind)?;
            let mut out = vec![0u8; out_len];
            kdf.derive(candidate, salt, &mut out)?;
            Ok(out)
        }
        AuthFunctionType::Mac => {
            let mut mac = build_mac(cfg, candidate)?;
            mac.update(extra)?;
            let mut out = vec![0u8; mac.output_size()];
            mac.finalize_into(&mut out)?;
            Ok(out)
        }
        AuthFunctionType::Digest => {
            let kind = HashKind::from_str(&cfg.function_name)?;
            let mut digest = build_digest(kind)?;
            digest.update(salt)?;
            digest.update(extra)?;
            digest.update(candidate)?;
            let mut out = vec![0u8; digest.output_size()];
            digest.finalize_into(&mut out)?;
            Ok(out)
        }
    }
}

/// Whether `candidate` confirms against `verified_output`, in time
/// independent of where they differ.
pub fn confirm_key(
    cfg: &AuthenticationFunctionConfiguration,
    verified_output: &[u8],
    candidate: &[u8],
) -> Result<bool> {
    let mut out = confirmation_output(cfg, candidate, verified_output.len())?;
    let ok = constant_time_equal(&out, verified_output);
    out.zeroize();
    Ok(ok)
}

/// Find the first candidate (by index) that confirms; every candidate
/// is processed the same way.
pub fn confirm_keys<'a>(
    cfg: &AuthenticationFunctionConfiguration,
    verified_output: &[u8],
    candidates: &'a [Vec<u8>],
) -> Result<&'a [u8]> {
    let mut matched: Option<&[u8]> = None;
    for candidate in candidates {
        // no early exit: timing stays a function of the set size
        if confirm_key(cfg, verified_output, candidate)? && matched.is_none() {
            matched = Some(candidate);
        }
    }
    matched.ok_or(CryptoError::KeyConfirmationFailed)
}

/// A public or private EC key handle: the curve identity is checked,
/// the encoded bytes are opaque to this crate.
#[derive(Clone)]
pub struct EcKey {
    /// Provider of the curve arithmetic.
    pub curve_provider: String,
    /// Curve name within the provider.
    pub curve_name: String,
    /// Encoded key material.
    pub encoded: Vec<u8>,
}

impl Drop for EcKey {
    fn drop(&mut self) {
        self.encoded.zeroize();
    }
}

/// The opaque UM1 agreement: `(static_key, other_static_key,
/// ephemeral_key) -> shared_secret`.
pub type Um1Agreement = dyn Fn(&EcKey, &EcKey, &EcKey) -> Result<Vec<u8>> + Sync;

/// Search `senders x receivers` for the pair whose UM1 shared secret
/// confirms, in parallel over the larger set.
///
/// Workers share only an atomic found-flag (checked at loop head) and
/// a result slot written once; the first match terminates the rest.
pub fn confirm_um1_hybrid(
    cfg: &AuthenticationFunctionConfiguration,
    verified_output: &[u8],
    ephemeral: &EcKey,
    senders: &[EcKey],
    receivers: &[EcKey],
    agree: &Um1Agreement,
) -> Result<Vec<u8>> {
    if senders.is_empty() || receivers.is_empty() {
        return Err(CryptoError::ArgumentInvalid("empty candidate set"));
    }
    for key in senders.iter().chain(receivers).chain([ephemeral]) {
        if key.curve_provider != ephemeral.curve_provider
            || key.curve_name != ephemeral.curve_name
        {
            return Err(CryptoError::ArgumentInvalid("curve mismatch"));
        }
    }
    // partition work over the larger axis
    let (outer, inner) = if senders.len() >= receivers.len() {
        (senders, receivers)
    } else {
        (receivers, senders)
    };
    let workers = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
        .min(outer.len());
    debug!(
        pairs = outer.len() * inner.len(),
        workers, "starting UM1 confirmation search"
    );
    let found = AtomicBool::new(false);
    let result: Mutex<Option<Vec<u8>>> = Mutex::new(None);

    std::thread::scope(|scope| {
        let per_worker = (outer.len() + workers - 1) / workers;
        for chunk in outer.chunks(per_worker) {
            let found = &found;
            let result = &result;
            scope.spawn(move || {
                for a in chunk {
                    for b in inner {
                        if found.load(Ordering::Acquire) {
                            return;
                        }
                        let (sender, receiver) = if std::ptr::eq(outer.as_ptr(), senders.as_ptr())
                        {
                            (a, b)
                        } else {
                            (b, a)
                        };
                        let secret = match agree(sender, receiver, ephemeral) {
                            Ok(s) => s,
                            Err(_) => continue,
                        };
                        match confirm_key(cfg, verified_output, &secret) {
                            Ok(true) => {
                                if let Ok(mut slot) = result.lock() {
                                    if slot.is_none() {
                                        *slot = Some(secret);
                                    }
                                }
                                found.store(true, Ordering::Release);
                                return;
                            }
                            _ => {
                                let mut s = secret;
                                s.zeroize();
                            }
                        }
                    }
                }
            });
        }
    });

    match result.into_inner() {
        Ok(Some(secret)) => Ok(secret),
        _ => Err(CryptoError::KeyConfirmationFailed),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AuthenticationFunctionConfiguration;

    fn hmac_cfg(salt: &[u8]) -> AuthenticationFunctionConfiguration {
        let mut cfg = AuthenticationFunctionConfiguration::hmac("SHA256");
        cfg.salt = Some(salt.to_vec());
        cfg.additional_data = Some(b"confirmation".to_vec());
        cfg
    }

    #[test]
    fn exactly_one_candidate_matches() {
        let cfg = hmac_cfg(&[1, 2, 3, 4, 5, 6, 7, 8]);
        let candidates = vec![
            b"\xde\xad\xbe\xef".to_vec(),
            b"\xca\xfe\xba\xbe".to_vec(),
            b"\xfe\xed\xfa\xce".to_vec(),
        ];
        let expected = confirmation_output(&cfg, &candidates[1], 32).unwrap();
        let matched = confirm_keys(&cfg, &expected, &candidates).unwrap();
        assert_eq!(matched, candidates[1].as_slice());
        // order independence
        let mut rev = candidates.clone();
        rev.reverse();
        assert_eq!(confirm_keys(&cfg, &expected, &rev).unwrap(), matched);
    }

    #[test]
    fn no_match_fails() {
        let cfg = hmac_cfg(b"salt");
        let err = confirm_keys(&cfg, &[0u8; 32], &[b"nope".to_vec()]).unwrap_err();
        assert_eq!(err, CryptoError::KeyConfirmationFailed);
    }

    fn key(name: &str, data: &[u8]) -> EcKey {
        EcKey {
            curve_provider: "test".into(),
            curve_name: name.into(),
            encoded: data.to_vec(),
        }
    }

    #[test]
    fn um1_search_finds_the_pair() {
        let cfg = hmac_cfg(b"um1");
        // toy agreement: concatenation hashes stand in for EC math
        let agree = |s: &EcKey, r: &EcKey, e: &EcKey| -> Result<Vec<u8>> {
            let mut v = s.encoded.clone();
            v.extend_from_slice(&r.encoded);
            v.extend_from_slice(&e.encoded);
            Ok(v)
        };
        let senders: Vec<EcKey> = (0..5u8).map(|i| key("curve", &[i; 4])).collect();
        let receivers: Vec<EcKey> = (0..3u8).map(|i| key("curve", &[0x10 + i; 4])).collect();
        let eph = key("curve", &[0xee; 4]);
        let target = agree(&senders[3], &receivers[1], &eph).unwrap();
        let expected = confirmation_output(&cfg, &target, 32).unwrap();
        let secret =
            confirm_um1_hybrid(&cfg, &expected, &eph, &senders, &receivers, &agree).unwrap();
        assert_eq!(secret, target);
    }

    #[test]
    fn um1_rejects_mixed_curves() {
        let cfg = hmac_cfg(b"um1");
        let agree = |_: &EcKey, _: &EcKey, _: &EcKey| -> Result<Vec<u8>> { Ok(vec![0u8; 4]) };
        let senders = vec![key("p256", &[1; 4])];
        let receivers = vec![key("p384", &[2; 4])];
        let eph = key("p256", &[3; 4]);
        assert_eq!(
            confirm_um1_hybrid(&cfg, &[0u8; 32], &eph, &senders, &receivers, &agree)
                .unwrap_err(),
            CryptoError::ArgumentInvalid("curve mismatch")
        );
    }
}
