//! Configuration DTOs and their validation against the registry,
//! yielding ready-to-use primitives and pipelines.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;
use zeroize::Zeroize;

use shroud_core::{
    BlockCipher, CipherParameters, CipherWrapper, CryptoError, Digest, Direction, Mac, Padding,
    Result, StreamCipher,
};

use crate::registry::{
    AeadModeKind, BlockCipherKind, BlockModeKind, HashKind, KdfKind, MacKind, PaddingKind,
    PaddingRequirement, StreamCipherKind,
};
use crate::wrapper::{BlockModePipeline, StreamCipherPipeline};

/// The three cipher configuration families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CipherType {
    /// Block cipher + mode (+ padding).
    Block,
    /// Block cipher + authenticated mode.
    Aead,
    /// Stream cipher.
    Stream,
}

/// A symmetric cipher configuration, the engine's wire-facing DTO.
///
/// Fields are validated against the registry before any primitive is
/// constructed; the serialized field semantics are binding, the
/// format is whatever the carrier chooses.
#[derive(Clone, Serialize, Deserialize)]
pub struct CipherConfiguration {
    /// Configuration family.
    pub cipher_type: CipherType,
    /// Registry name of the cipher.
    pub cipher_name: String,
    /// Key length in bits; the provided key must match.
    pub key_size_bits: u32,
    /// Block length in bits (block/AEAD).
    #[serde(default)]
    pub block_size_bits: Option<u32>,
    /// Registry name of the mode (block/AEAD).
    #[serde(default)]
    pub mode_name: Option<String>,
    /// Registry name of the padding (block only).
    #[serde(default)]
    pub padding_name: Option<String>,
    /// IV for block modes, nonce for AEAD/stream.
    pub iv: Vec<u8>,
    /// Tag length in bits (AEAD).
    #[serde(default)]
    pub mac_size_bits: Option<u32>,
    /// Associated data covered by an AEAD tag.
    #[serde(default)]
    pub associated_data: Vec<u8>,
}

impl Drop for CipherConfiguration {
    fn drop(&mut self) {
        self.iv.zeroize();
    }
}

impl CipherConfiguration {
    /// Block-cipher configuration with explicit mode and padding.
    pub fn block(cipher: &str, mode: &str, padding: Option<&str>, key_size_bits: u32, iv: &[u8]) -> Self {
        CipherConfiguration {
            cipher_type: CipherType::Block,
            cipher_name: cipher.to_string(),
            key_size_bits,
            block_size_bits: None,
            mode_name: Some(mode.to_string()),
            padding_name: padding.map(str::to_string),
            iv: iv.to_vec(),
            mac_size_bits: None,
            associated_data: Vec::new(),
        }
    }

    /// AEAD configuration.
    pub fn aead(
        cipher: &str,
        mode: &str,
        key_size_bits: u32,
        mac_size_bits: u32,
        nonce: &[u8],
        aad: &[u8],
    ) -> Self {
        CipherConfiguration {
            cipher_type: CipherType::Aead,
            cipher_name: cipher.to_string(),
            key_size_bits,
            block_size_bits: None,
            mode_name: Some(mode.to_string()),
            padding_name: None,
            iv: nonce.to_vec(),
            mac_size_bits: Some(mac_size_bits),
            associated_data: aad.to_vec(),
        }
    }

    /// Stream-cipher configuration.
    pub fn stream(cipher: &str, key_size_bits: u32, nonce: &[u8]) -> Self {
        CipherConfiguration {
            cipher_type: CipherType::Stream,
            cipher_name: cipher.to_string(),
            key_size_bits,
            block_size_bits: None,
            mode_name: None,
            padding_name: None,
            iv: nonce.to_vec(),
            mac_size_bits: None,
            associated_data: Vec::new(),
        }
    }
}

/// The three authentication function families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuthFunctionType {
    /// Unkeyed digest.
    Digest,
    /// Keyed MAC.
    Mac,
    /// Key derivation function.
    Kdf,
}

/// Configuration of a digest/MAC/KDF used for stream authentication
/// or key confirmation.
#[derive(Clone, Serialize, Deserialize)]
pub struct AuthenticationFunctionConfiguration {
    /// Function family.
    pub function_type: AuthFunctionType,
    /// Registry name of the function.
    pub function_name: String,
    /// Key length in bits (MAC/KDF).
    #[serde(default)]
    pub key_size_bits: Option<u32>,
    /// Salt observed ahead of the message, where supported.
    #[serde(default)]
    pub salt: Option<Vec<u8>>,
    /// Nonce; required by Poly1305.
    #[serde(default)]
    pub nonce: Option<Vec<u8>>,
    /// Inner primitive selector: the UTF-8 registry name of the block
    /// cipher for CMAC/Poly1305 or of the hash for HMAC; KDF
    /// parameters for the KDFs.
    #[serde(default)]
    pub function_configuration: Option<Vec<u8>>,
    /// Extra data mixed into confirmation computations.
    #[serde(default)]
    pub additional_data: Option<Vec<u8>>,
}

impl Drop for AuthenticationFunctionConfiguration {
    fn drop(&mut self) {
        if let Some(s) = &mut self.salt {
            s.zeroize();
        }
        if let Some(n) = &mut self.nonce {
            n.zeroize();
        }
    }
}

impl AuthenticationFunctionConfiguration {
    /// HMAC over the named hash.
    pub fn hmac(hash: &str) -> Self {
        AuthenticationFunctionConfiguration {
            function_type: AuthFunctionType::Mac,
            function_name: "HMAC".to_string(),
            key_size_bits: None,
            salt: None,
            nonce: None,
            function_configuration: Some(hash.as_bytes().to_vec()),
            additional_data: None,
        }
    }

    /// CMAC over the named block cipher.
    pub fn cmac(cipher: &str) -> Self {
        AuthenticationFunctionConfiguration {
            function_type: AuthFunctionType::Mac,
            function_name: "CMAC".to_string(),
            key_size_bits: None,
            salt: None,
            nonce: None,
            function_configuration: Some(cipher.as_bytes().to_vec()),
            additional_data: None,
        }
    }
}

/// Construct an initialized block cipher.
pub fn build_block_cipher(
    kind: BlockCipherKind,
    key: &[u8],
) -> Result<Box<dyn BlockCipher + Send>> {
    use shroud_block_ciphers as bc;
    Ok(match kind {
        BlockCipherKind::Aes => Box::new(bc::Aes::new(key)?),
        BlockCipherKind::Blowfish => Box::new(bc::Blowfish::new(key)?),
        BlockCipherKind::Camellia => Box::new(bc::Camellia::new(key)?),
        BlockCipherKind::Cast5 => Box::new(bc::Cast5::new(key)?),
        BlockCipherKind::Cast6 => Box::new(bc::Cast6::new(key)?),
        BlockCipherKind::Idea => Box::new(bc::Idea::new(key)?),
        BlockCipherKind::Noekeon => Box::new(bc::Noekeon::new(key)?),
        BlockCipherKind::Rc6 => Box::new(bc::Rc6::new(key)?),
        BlockCipherKind::Serpent => Box::new(bc::Serpent::new(key)?),
        BlockCipherKind::TripleDes => Box::new(bc::TripleDes::new(key)?),
        BlockCipherKind::Twofish => Box::new(bc::Twofish::new(key)?),
    })
}

/// Construct an initialized stream cipher.
pub fn build_stream_cipher(
    kind: StreamCipherKind,
    key: &[u8],
    nonce: &[u8],
) -> Result<Box<dyn StreamCipher + Send>> {
    use shroud_stream_ciphers as sc;
    Ok(match kind {
        StreamCipherKind::Hc128 => Box::new(sc::Hc128::new(key, nonce)?),
        StreamCipherKind::Hc256 => Box::new(sc::Hc256::new(key, nonce)?),
        StreamCipherKind::Rabbit => Box::new(sc::Rabbit::new(key, nonce)?),
        StreamCipherKind::Salsa20 => Box::new(sc::Salsa20::new(key, nonce)?),
        StreamCipherKind::Sosemanuk => Box::new(sc::Sosemanuk::new(key, nonce)?),
    })
}

/// Construct a fresh digest.
pub fn build_digest(kind: HashKind) -> Result<Box<dyn Digest + Send>> {
    use shroud_digests as d;
    Ok(match kind {
        HashKind::Blake2b256 => Box::new(d::Blake2b::new(32)?),
        HashKind::Blake2b384 => Box::new(d::Blake2b::new(48)?),
        HashKind::Blake2b512 => Box::new(d::Blake2b::new(64)?),
        HashKind::Keccak224 => Box::new(d::Keccak::new(28)?),
        HashKind::Keccak256 => Box::new(d::Keccak::new(32)?),
        HashKind::Keccak384 => Box::new(d::Keccak::new(48)?),
        HashKind::Keccak512 => Box::new(d::Keccak::new(64)?),
        HashKind::Ripemd160 => Box::new(d::Ripemd160::new()),
        HashKind::Sha256 => Box::new(d::Sha256::new()),
        HashKind::Sha512 => Box::new(d::Sha512::new()),
        HashKind::Tiger => Box::new(d::Tiger::new()),
        HashKind::Whirlpool => Box::new(d::Whirlpool::new()),
    })
}

fn inner_name(cfg: &AuthenticationFunctionConfiguration) -> Result<&str> {
    let bytes = cfg
        .function_configuration
        .as_deref()
        .ok_or(CryptoError::ConfigurationInvalid("inner-primitive-missing"))?;
    std::str::from_utf8(bytes)
        .map_err(|_| CryptoError::ConfigurationInvalid("inner-primitive-name"))
}

/// Construct a keyed MAC per configuration.
pub fn build_mac(
    cfg: &AuthenticationFunctionConfiguration,
    key: &[u8],
) -> Result<Box<dyn Mac + Send>> {
    if cfg.function_type != AuthFunctionType::Mac {
        return Err(CryptoError::ConfigurationInvalid("not-a-mac"));
    }
    if let Some(bits) = cfg.key_size_bits {
        if bits as usize != key.len() * 8 {
            return Err(CryptoError::InvalidKeySize);
        }
    }
    let kind = MacKind::from_str(&cfg.function_name)?;
    let salt = cfg.salt.as_deref().unwrap_or(&[]);
    use shroud_digests as d;
    match kind {
        MacKind::Hmac => {
            let hash = HashKind::from_str(inner_name(cfg)?)?;
            let digest = build_digest(hash)?;
            Ok(Box::new(d::Hmac::new(digest, key)?))
        }
        MacKind::Cmac => {
            let cipher = BlockCipherKind::from_str(inner_name(cfg)?)?;
            let cipher = build_block_cipher(cipher, key)?;
            Ok(Box::new(d::Cmac::new(cipher)?))
        }
        MacKind::Poly1305 => {
            let nonce = cfg
                .nonce
                .as_deref()
                .ok_or(CryptoError::ConfigurationInvalid("nonce-required"))?;
            match cfg.function_configuration.as_deref() {
                None => Ok(Box::new(d::Poly1305::new(key)?)),
                Some(_) => {
                    let cipher_kind = BlockCipherKind::from_str(inner_name(cfg)?)?;
                    let mac = d::Poly1305::with_cipher(key, nonce, |k| {
                        build_block_cipher(cipher_kind, k)
                    })?;
                    Ok(Box::new(mac))
                }
            }
        }
        keyed => {
            let hash = keyed
                .keyed_digest()
                .ok_or(CryptoError::ConfigurationInvalid("unkeyable-function"))?;
            let out = hash.output_size();
            match hash {
                HashKind::Blake2b256 | HashKind::Blake2b384 | HashKind::Blake2b512 => {
                    Ok(Box::new(d::KeyedBlake2b::new(out, key, salt)?))
                }
                _ => Ok(Box::new(d::KeyedKeccak::new(out, key, salt)?)),
            }
        }
    }
}

/// Construct a KDF per configuration; `function_configuration`, when
/// present, is out of band for the built-in functions (iteration and
/// cost parameters use the defaults of the surrounding system).
pub fn build_kdf(kind: KdfKind) -> Result<Box<dyn shroud_core::Kdf + Send>> {
    Ok(match kind {
        KdfKind::Pbkdf2 => Box::new(crate::kdf::Pbkdf2::default()),
        KdfKind::Scrypt => Box::new(crate::kdf::Scrypt::default()),
    })
}

/// Assemble the exhaustive keying variant for a configuration; the
/// factories match on it rather than on loose fields.
pub fn cipher_parameters_for(cfg: &CipherConfiguration, key: &[u8]) -> CipherParameters {
    match cfg.cipher_type {
        CipherType::Aead => CipherParameters::AeadFull {
            key: key.to_vec(),
            nonce: cfg.iv.clone(),
            mac_size_bits: cfg.mac_size_bits.unwrap_or(0),
            aad: cfg.associated_data.clone(),
        },
        CipherType::Block | CipherType::Stream => CipherParameters::KeyIv {
            key: key.to_vec(),
            iv: cfg.iv.clone(),
        },
    }
}

/// Validate `cfg` + `key` against the registry and build the
/// streaming transform (the seven configuration validation steps).
pub fn build_cipher_wrapper(
    cfg: &CipherConfiguration,
    key: &[u8],
    direction: Direction,
) -> Result<Box<dyn CipherWrapper + Send>> {
    debug!(
        cipher = %cfg.cipher_name,
        mode = cfg.mode_name.as_deref().unwrap_or("-"),
        ?direction,
        "validating cipher configuration"
    );
    if key.len() * 8 != cfg.key_size_bits as usize {
        return Err(CryptoError::InvalidKeySize);
    }
    match cfg.cipher_type {
        CipherType::Stream => {
            let kind = StreamCipherKind::from_str(&cfg.cipher_name)?;
            let desc = kind.descriptor();
            if !desc
                .allowable_key_sizes_bits
                .contains(&cfg.key_size_bits)
            {
                return Err(CryptoError::InvalidKeySize);
            }
            if !desc
                .allowable_iv_sizes_bits
                .contains(&((cfg.iv.len() * 8) as u32))
            {
                return Err(CryptoError::InvalidIvSize);
            }
            let cipher = match &cipher_parameters_for(cfg, key) {
                CipherParameters::KeyIv { key, iv } => build_stream_cipher(kind, key, iv)?,
                _ => return Err(CryptoError::ConfigurationInvalid("parameters-mismatch")),
            };
            Ok(Box::new(StreamCipherPipeline::new(cipher)))
        }
        CipherType::Block => {
            let kind = BlockCipherKind::from_str(&cfg.cipher_name)?;
            let desc = kind.descriptor();
            if !desc
                .allowable_key_sizes_bits
                .contains(&cfg.key_size_bits)
            {
                return Err(CryptoError::InvalidKeySize);
            }
            let block_bits = cfg
                .block_size_bits
                .unwrap_or(desc.default_block_size_bits);
            if !desc.allowable_block_sizes_bits.contains(&block_bits) {
                return Err(CryptoError::InvalidBlockSize);
            }
            if cfg.iv.len() * 8 != block_bits as usize {
                return Err(CryptoError::InvalidIvSize);
            }
            let mode_name = cfg
                .mode_name
                .as_deref()
                .ok_or(CryptoError::ConfigurationInvalid("mode-missing"))?;
            let mode_kind = BlockModeKind::from_str(mode_name)?;
            let mode_desc = mode_kind.descriptor();
            if !mode_desc.allowable_block_sizes_bits.is_empty()
                && !mode_desc.allowable_block_sizes_bits.contains(&block_bits)
            {
                return Err(CryptoError::InvalidBlockSize);
            }
            let padding = match (mode_desc.padding_requirement, cfg.padding_name.as_deref()) {
                (PaddingRequirement::None, None) => None,
                (PaddingRequirement::None, Some(_)) => {
                    return Err(CryptoError::ConfigurationInvalid("padding-not-applicable"))
                }
                (_, Some(name)) => Some(build_padding(PaddingKind::from_str(name)?)),
                (PaddingRequirement::Always, None) => {
                    return Err(CryptoError::ConfigurationInvalid("padding-required"))
                }
                (PaddingRequirement::IfUnderOneBlock, None) => None,
            };
            let params = cipher_parameters_for(cfg, key);
            let (key, iv) = match &params {
                CipherParameters::KeyIv { key, iv } => (key.as_slice(), iv.as_slice()),
                _ => return Err(CryptoError::ConfigurationInvalid("parameters-mismatch")),
            };
            let cipher = build_block_cipher(kind, key)?;
            let mode: Box<dyn shroud_core::BlockModeCore + Send> = match mode_kind {
                BlockModeKind::Cbc => Box::new(shroud_modes::Cbc::new(cipher, iv, direction)?),
                BlockModeKind::Ctr => Box::new(shroud_modes::Ctr::new(cipher, iv)?),
                BlockModeKind::Cfb => Box::new(shroud_modes::Cfb::new(cipher, iv, direction)?),
                BlockModeKind::Ofb => Box::new(shroud_modes::Ofb::new(cipher, iv)?),
            };
            Ok(Box::new(BlockModePipeline::new(mode, padding, direction)?))
        }
        CipherType::Aead => {
            let kind = BlockCipherKind::from_str(&cfg.cipher_name)?;
            let desc = kind.descriptor();
            if !desc
                .allowable_key_sizes_bits
                .contains(&cfg.key_size_bits)
            {
                return Err(CryptoError::InvalidKeySize);
            }
            let block_bits = cfg
                .block_size_bits
                .unwrap_or(desc.default_block_size_bits);
            if !desc.allowable_block_sizes_bits.contains(&block_bits) {
                return Err(CryptoError::InvalidBlockSize);
            }
            let mode_name = cfg
                .mode_name
                .as_deref()
                .ok_or(CryptoError::ConfigurationInvalid("mode-missing"))?;
            let mode_kind = AeadModeKind::from_str(mode_name)?;
            let mode_desc = mode_kind.descriptor();
            if !mode_desc.allowable_block_sizes_bits.contains(&block_bits) {
                return Err(CryptoError::InvalidBlockSize);
            }
            let mac_bits = cfg
                .mac_size_bits
                .ok_or(CryptoError::ConfigurationInvalid("mac-size-missing"))?;
            if !mode_desc.allowable_mac_sizes_bits.contains(&mac_bits) {
                return Err(CryptoError::InvalidMacSize);
            }
            if cfg.iv.is_empty() {
                return Err(CryptoError::InvalidIvSize);
            }
            let params = cipher_parameters_for(cfg, key);
            let (key, nonce, mac_bits, aad) = match &params {
                CipherParameters::AeadFull {
                    key,
                    nonce,
                    mac_size_bits,
                    aad,
                } => (key.as_slice(), nonce.as_slice(), *mac_size_bits, aad.as_slice()),
                _ => return Err(CryptoError::ConfigurationInvalid("parameters-mismatch")),
            };
            let cipher = build_block_cipher(kind, key)?;
            Ok(match mode_kind {
                AeadModeKind::Gcm => {
                    Box::new(shroud_modes::Gcm::new(cipher, nonce, mac_bits, aad, direction)?)
                }
                AeadModeKind::Eax => {
                    Box::new(shroud_modes::Eax::new(cipher, nonce, mac_bits, aad, direction)?)
                }
            })
        }
    }
}

/// Construct a padding scheme. ISO 10126-2 draws its random fill from
/// the operating system.
pub fn build_padding(kind: PaddingKind) -> Box<dyn Padding + Send> {
    use shroud_modes as m;
    match kind {
        PaddingKind::Pkcs7 => Box::new(m::Pkcs7),
        PaddingKind::Iso7816 => Box::new(m::Iso7816),
        PaddingKind::Iso10126 => Box::new(m::Iso10126::new(Box::new(rand_core::OsRng))),
        PaddingKind::Tbc => Box::new(m::Tbc),
        PaddingKind::X923 => Box::new(m::X923),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expect_err(
        result: Result<Box<dyn shroud_core::CipherWrapper + Send>>,
    ) -> CryptoError {
        match result {
            Ok(_) => panic!("expected an error, got Ok"),
            Err(e) => e,
        }
    }

    #[test]
    fn stream_config_validation() {
        let cfg = CipherConfiguration::stream("Salsa20", 256, &[0u8; 8]);
        assert!(build_cipher_wrapper(&cfg, &[0u8; 32], Direction::Encrypt).is_ok());
        // wrong nonce size
        let cfg = CipherConfiguration::stream("Salsa20", 256, &[0u8; 12]);
        assert_eq!(
            expect_err(build_cipher_wrapper(&cfg, &[0u8; 32], Direction::Encrypt)),
            CryptoError::InvalidIvSize
        );
        // key does not match declared size
        let cfg = CipherConfiguration::stream("Salsa20", 256, &[0u8; 8]);
        assert_eq!(
            expect_err(build_cipher_wrapper(&cfg, &[0u8; 16], Direction::Encrypt)),
            CryptoError::InvalidKeySize
        );
    }

    #[test]
    fn block_config_requires_padding_for_cbc() {
        let cfg = CipherConfiguration::block("AES", "CBC", None, 128, &[0u8; 16]);
        assert_eq!(
            expect_err(build_cipher_wrapper(&cfg, &[0u8; 16], Direction::Encrypt)),
            CryptoError::ConfigurationInvalid("padding-required")
        );
        let cfg = CipherConfiguration::block("AES", "CBC", Some("PKCS7"), 128, &[0u8; 16]);
        assert!(build_cipher_wrapper(&cfg, &[0u8; 16], Direction::Encrypt).is_ok());
    }

    #[test]
    fn aead_mac_size_allow_list() {
        let cfg = CipherConfiguration::aead("AES", "GCM", 128, 96, &[0u8; 12], b"");
        assert_eq!(
            expect_err(build_cipher_wrapper(&cfg, &[0u8; 16], Direction::Encrypt)),
            CryptoError::InvalidMacSize
        );
        let cfg = CipherConfiguration::aead("AES", "EAX", 128, 192, &[0u8; 12], b"");
        assert_eq!(
            expect_err(build_cipher_wrapper(&cfg, &[0u8; 16], Direction::Encrypt)),
            CryptoError::InvalidMacSize
        );
        let cfg = CipherConfiguration::aead("AES", "EAX", 128, 64, &[0u8; 12], b"");
        assert!(build_cipher_wrapper(&cfg, &[0u8; 16], Direction::Encrypt).is_ok());
    }

    #[test]
    fn unsupported_names_surface() {
        let cfg = CipherConfiguration::stream("RC4", 128, &[0u8; 8]);
        assert!(matches!(
            expect_err(build_cipher_wrapper(&cfg, &[0u8; 16], Direction::Encrypt)),
            CryptoError::Unsupported(_)
        ));
    }

    #[test]
    fn dto_serde_round_trip() {
        let cfg = CipherConfiguration::aead("AES", "GCM", 256, 128, &[7u8; 12], b"aad");
        let json = serde_json::to_string(&cfg).unwrap();
        let back: CipherConfiguration = serde_json::from_str(&json).unwrap();
        assert_eq!(back.cipher_name, "AES");
        assert_eq!(back.mac_size_bits, Some(128));
        assert_eq!(back.iv, vec![7u8; 12]);
    }
}
