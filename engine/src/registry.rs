//! The process-wide primitive registry: every cipher, mode, padding,
//! hash, MAC and KDF the engine can build, with the size sets that
//! drive all later validation.
//!
//! Everything here is `'static` data constructed in const context;
//! lookups are plain matches and are safe for concurrent readers.

use std::str::FromStr;

use shroud_core::CryptoError;

/// Immutable record describing one primitive.
///
/// Fields that do not apply to a primitive kind hold empty slices or
/// zero defaults.
#[derive(Debug)]
pub struct PrimitiveDescriptor {
    /// Stable ASCII identifier used in configurations.
    pub name: &'static str,
    /// Human-facing name.
    pub display_name: &'static str,
    /// Acceptable key sizes, bits.
    pub allowable_key_sizes_bits: &'static [u32],
    /// Key size chosen when a configuration does not say.
    pub default_key_size_bits: u32,
    /// Acceptable block sizes, bits.
    pub allowable_block_sizes_bits: &'static [u32],
    /// Default block size, bits.
    pub default_block_size_bits: u32,
    /// Acceptable IV/nonce sizes, bits.
    pub allowable_iv_sizes_bits: &'static [u32],
    /// Default IV size, bits.
    pub default_iv_size_bits: u32,
    /// Acceptable output sizes, bits (digests, MACs, KDFs).
    pub allowable_output_sizes_bits: &'static [u32],
    /// Default output size, bits.
    pub default_output_size_bits: u32,
}

/// Whether a mode needs padding negotiated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaddingRequirement {
    /// Never pads (keystream-like modes).
    None,
    /// Pads only when the input is under one block.
    IfUnderOneBlock,
    /// Always pads the final block.
    Always,
}

/// Whether a nonce may be observed twice under one key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NonceReusePolicy {
    /// The mode takes no nonce.
    NotApplicable,
    /// Reuse destroys the mode's guarantees.
    NotAllowed,
    /// Reuse is tolerated (degraded but defined behavior).
    Allowed,
}

/// Immutable record describing a mode of operation.
#[derive(Debug)]
pub struct ModeDescriptor {
    /// Stable ASCII identifier.
    pub name: &'static str,
    /// Human-facing name.
    pub display_name: &'static str,
    /// Padding negotiation requirement.
    pub padding_requirement: PaddingRequirement,
    /// Nonce reuse policy.
    pub nonce_reuse_policy: NonceReusePolicy,
    /// Authenticated mode or not.
    pub is_aead: bool,
    /// Acceptable wrapped-cipher block sizes, bits; empty means any.
    pub allowable_block_sizes_bits: &'static [u32],
    /// Acceptable tag sizes, bits (AEAD only).
    pub allowable_mac_sizes_bits: &'static [u32],
}

macro_rules! kinds {
    ($(#[$meta:meta])* $vis:vis enum $name:ident {
        $($variant:ident => $string:literal),+ $(,)?
    }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        $vis enum $name {
            $(
                #[doc = $string]
                $variant,
            )+
        }

        impl $name {
            /// Every registered kind, in registry order.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// The stable ASCII registry name.
            pub fn name(self) -> &'static str {
                match self {
                    $($name::$variant => $string),+
                }
            }
        }

        impl FromStr for $name {
            type Err = CryptoError;

            fn from_str(s: &str) -> Result<Self, CryptoError> {
                match s {
                    $($string => Ok($name::$variant),)+
                    other => Err(CryptoError::Unsupported(other.to_string())),
                }
            }
        }
    };
}

kinds! {
    /// Registered block ciphers.
    pub enum BlockCipherKind {
        Aes => "AES",
        Blowfish => "Blowfish",
        Camellia => "Camellia",
        Cast5 => "CAST5",
        Cast6 => "CAST6",
        Idea => "IDEA",
        Noekeon => "NOEKEON",
        Rc6 => "RC6",
        Serpent => "Serpent",
        TripleDes => "TripleDES",
        Twofish => "Twofish",
    }
}

kinds! {
    /// Registered stream ciphers.
    pub enum StreamCipherKind {
        Hc128 => "HC128",
        Hc256 => "HC256",
        Rabbit => "Rabbit",
        Salsa20 => "Salsa20",
        Sosemanuk => "SOSEMANUK",
    }
}

kinds! {
    /// Registered block modes.
    pub enum BlockModeKind {
        Cbc => "CBC",
        Ctr => "CTR",
        Cfb => "CFB",
        Ofb => "OFB",
    }
}

kinds! {
    /// Registered AEAD modes.
    pub enum AeadModeKind {
        Gcm => "GCM",
        Eax => "EAX",
    }
}

kinds! {
    /// Registered paddings.
    pub enum PaddingKind {
        Pkcs7 => "PKCS7",
        Iso7816 => "ISO7816D4",
        Iso10126 => "ISO10126D2",
        Tbc => "TBC",
        X923 => "X923",
    }
}

kinds! {
    /// Registered digests.
    pub enum HashKind {
        Blake2b256 => "BLAKE2B256",
        Blake2b384 => "BLAKE2B384",
        Blake2b512 => "BLAKE2B512",
        Keccak224 => "Keccak224",
        Keccak256 => "Keccak256",
        Keccak384 => "Keccak384",
        Keccak512 => "Keccak512",
        Ripemd160 => "RIPEMD160",
        Sha256 => "SHA256",
        Sha512 => "SHA512",
        Tiger => "Tiger",
        Whirlpool => "Whirlpool",
    }
}

kinds! {
    /// Registered MAC functions. The keyed-digest entries reuse the
    /// digest primitives in keyed form.
    pub enum MacKind {
        Hmac => "HMAC",
        Cmac => "CMAC",
        Poly1305 => "Poly1305",
        Blake2b256 => "BLAKE2B256",
        Blake2b384 => "BLAKE2B384",
        Blake2b512 => "BLAKE2B512",
        Keccak224 => "Keccak224",
        Keccak256 => "Keccak256",
        Keccak384 => "Keccak384",
        Keccak512 => "Keccak512",
    }
}

kinds! {
    /// Registered key derivation functions.
    pub enum KdfKind {
        Pbkdf2 => "PBKDF2",
        Scrypt => "Scrypt",
    }
}

const fn descriptor(
    name: &'static str,
    display_name: &'static str,
    keys: &'static [u32],
    default_key: u32,
    blocks: &'static [u32],
    default_block: u32,
    ivs: &'static [u32],
    default_iv: u32,
    outs: &'static [u32],
    default_out: u32,
) -> PrimitiveDescriptor {
    PrimitiveDescriptor {
        name,
        display_name,
        allowable_key_sizes_bits: keys,
        default_key_size_bits: default_key,
        allowable_block_sizes_bits: blocks,
        default_block_size_bits: default_block,
        allowable_iv_sizes_bits: ivs,
        default_iv_size_bits: default_iv,
        allowable_output_sizes_bits: outs,
        default_output_size_bits: default_out,
    }
}

static BLOWFISH_KEYS: [u32; 14] = [
    32, 64, 96, 128, 160, 192, 224, 256, 288, 320, 352, 384, 416, 448,
];
static CAST5_KEYS: [u32; 12] = [40, 48, 56, 64, 72, 80, 88, 96, 104, 112, 120, 128];
static CAST6_KEYS: [u32; 5] = [128, 160, 192, 224, 256];
static SOSEMANUK_KEYS: [u32; 5] = [128, 160, 192, 224, 256];
static EAX_MACS: [u32; 9] = [64, 72, 80, 88, 96, 104, 112, 120, 128];

impl BlockCipherKind {
    /// The descriptor seeded for this cipher.
    pub fn descriptor(self) -> &'static PrimitiveDescriptor {
        match self {
            BlockCipherKind::Aes => {
                static D: PrimitiveDescriptor = descriptor(
                    "AES", "AES", &[128, 192, 256], 256, &[128], 128, &[128], 128, &[], 0,
                );
                &D
            }
            BlockCipherKind::Blowfish => {
                static D: PrimitiveDescriptor = descriptor(
                    "Blowfish", "Blowfish", &BLOWFISH_KEYS, 256, &[64], 64, &[64], 64, &[], 0,
                );
                &D
            }
            BlockCipherKind::Camellia => {
                static D: PrimitiveDescriptor = descriptor(
                    "Camellia", "Camellia", &[128, 192, 256], 256, &[128], 128, &[128], 128, &[],
                    0,
                );
                &D
            }
            BlockCipherKind::Cast5 => {
                static D: PrimitiveDescriptor = descriptor(
                    "CAST5", "CAST-128", &CAST5_KEYS, 128, &[64], 64, &[64], 64, &[], 0,
                );
                &D
            }
            BlockCipherKind::Cast6 => {
                static D: PrimitiveDescriptor = descriptor(
                    "CAST6", "CAST-256", &CAST6_KEYS, 256, &[128], 128, &[128], 128, &[], 0,
                );
                &D
            }
            BlockCipherKind::Idea => {
                static D: PrimitiveDescriptor =
                    descriptor("IDEA", "IDEA", &[128], 128, &[64], 64, &[64], 64, &[], 0);
                &D
            }
            BlockCipherKind::Noekeon => {
                static D: PrimitiveDescriptor = descriptor(
                    "NOEKEON", "NOEKEON", &[128], 128, &[128], 128, &[128], 128, &[], 0,
                );
                &D
            }
            BlockCipherKind::Rc6 => {
                static D: PrimitiveDescriptor = descriptor(
                    "RC6", "RC6", &[128, 192, 256], 256, &[128], 128, &[128], 128, &[], 0,
                );
                &D
            }
            BlockCipherKind::Serpent => {
                static D: PrimitiveDescriptor = descriptor(
                    "Serpent", "Serpent", &[128, 192, 256], 256, &[128], 128, &[128], 128, &[], 0,
                );
                &D
            }
            BlockCipherKind::TripleDes => {
                static D: PrimitiveDescriptor = descriptor(
                    "TripleDES", "Triple DES", &[128, 192], 192, &[64], 64, &[64], 64, &[], 0,
                );
                &D
            }
            BlockCipherKind::Twofish => {
                static D: PrimitiveDescriptor = descriptor(
                    "Twofish", "Twofish", &[128, 192, 256], 256, &[128], 128, &[128], 128, &[], 0,
                );
                &D
            }
        }
    }
}

impl StreamCipherKind {
    /// The descriptor seeded for this cipher.
    pub fn descriptor(self) -> &'static PrimitiveDescriptor {
        match self {
            StreamCipherKind::Hc128 => {
                static D: PrimitiveDescriptor =
                    descriptor("HC128", "HC-128", &[128], 128, &[], 0, &[128], 128, &[], 0);
                &D
            }
            StreamCipherKind::Hc256 => {
                static D: PrimitiveDescriptor =
                    descriptor("HC256", "HC-256", &[256], 256, &[], 0, &[256], 256, &[], 0);
                &D
            }
            StreamCipherKind::Rabbit => {
                static D: PrimitiveDescriptor =
                    descriptor("Rabbit", "Rabbit", &[128], 128, &[], 0, &[64], 64, &[], 0);
                &D
            }
            StreamCipherKind::Salsa20 => {
                static D: PrimitiveDescriptor = descriptor(
                    "Salsa20", "Salsa20", &[128, 256], 256, &[], 0, &[64], 64, &[], 0,
                );
                &D
            }
            StreamCipherKind::Sosemanuk => {
                static D: PrimitiveDescriptor = descriptor(
                    "SOSEMANUK", "SOSEMANUK", &SOSEMANUK_KEYS, 256, &[], 0, &[128], 128, &[], 0,
                );
                &D
            }
        }
    }
}

impl BlockModeKind {
    /// The descriptor seeded for this mode.
    pub fn descriptor(self) -> &'static ModeDescriptor {
        match self {
            BlockModeKind::Cbc => {
                static D: ModeDescriptor = ModeDescriptor {
                    name: "CBC",
                    display_name: "Cipher Block Chaining",
                    padding_requirement: PaddingRequirement::Always,
                    nonce_reuse_policy: NonceReusePolicy::NotApplicable,
                    is_aead: false,
                    allowable_block_sizes_bits: &[],
                    allowable_mac_sizes_bits: &[],
                };
                &D
            }
            BlockModeKind::Ctr => {
                static D: ModeDescriptor = ModeDescriptor {
                    name: "CTR",
                    display_name: "Counter",
                    padding_requirement: PaddingRequirement::None,
                    nonce_reuse_policy: NonceReusePolicy::NotAllowed,
                    is_aead: false,
                    allowable_block_sizes_bits: &[],
                    allowable_mac_sizes_bits: &[],
                };
                &D
            }
            BlockModeKind::Cfb => {
                static D: ModeDescriptor = ModeDescriptor {
                    name: "CFB",
                    display_name: "Cipher Feedback",
                    padding_requirement: PaddingRequirement::None,
                    nonce_reuse_policy: NonceReusePolicy::NotAllowed,
                    is_aead: false,
                    allowable_block_sizes_bits: &[],
                    allowable_mac_sizes_bits: &[],
                };
                &D
            }
            BlockModeKind::Ofb => {
                static D: ModeDescriptor = ModeDescriptor {
                    name: "OFB",
                    display_name: "Output Feedback",
                    padding_requirement: PaddingRequirement::None,
                    nonce_reuse_policy: NonceReusePolicy::NotAllowed,
                    is_aead: false,
                    allowable_block_sizes_bits: &[],
                    allowable_mac_sizes_bits: &[],
                };
                &D
            }
        }
    }
}

impl AeadModeKind {
    /// The descriptor seeded for this mode.
    pub fn descriptor(self) -> &'static ModeDescriptor {
        match self {
            AeadModeKind::Gcm => {
                static D: ModeDescriptor = ModeDescriptor {
                    name: "GCM",
                    display_name: "Galois/Counter",
                    padding_requirement: PaddingRequirement::None,
                    nonce_reuse_policy: NonceReusePolicy::NotAllowed,
                    is_aead: true,
                    allowable_block_sizes_bits: &[128],
                    allowable_mac_sizes_bits: &[128],
                };
                &D
            }
            AeadModeKind::Eax => {
                static D: ModeDescriptor = ModeDescriptor {
                    name: "EAX",
                    display_name: "EAX",
                    padding_requirement: PaddingRequirement::None,
                    nonce_reuse_policy: NonceReusePolicy::NotAllowed,
                    is_aead: true,
                    allowable_block_sizes_bits: &[128],
                    // the historical {64..256} list is a tag-size
                    // allow-list; OMAC caps it at the block width
                    allowable_mac_sizes_bits: &EAX_MACS,
                };
                &D
            }
        }
    }
}

impl HashKind {
    /// Digest length in bytes.
    pub fn output_size(self) -> usize {
        match self {
            HashKind::Blake2b256 | HashKind::Keccak256 | HashKind::Sha256 => 32,
            HashKind::Blake2b384 | HashKind::Keccak384 => 48,
            HashKind::Blake2b512 | HashKind::Keccak512 | HashKind::Sha512 => 64,
            HashKind::Keccak224 => 28,
            HashKind::Ripemd160 => 20,
            HashKind::Tiger => 24,
            HashKind::Whirlpool => 64,
        }
    }
}

impl MacKind {
    /// The keyed-digest kinds map onto their digest; the dedicated
    /// MACs have function-specific keying rules.
    pub fn keyed_digest(self) -> Option<HashKind> {
        match self {
            MacKind::Blake2b256 => Some(HashKind::Blake2b256),
            MacKind::Blake2b384 => Some(HashKind::Blake2b384),
            MacKind::Blake2b512 => Some(HashKind::Blake2b512),
            MacKind::Keccak224 => Some(HashKind::Keccak224),
            MacKind::Keccak256 => Some(HashKind::Keccak256),
            MacKind::Keccak384 => Some(HashKind::Keccak384),
            MacKind::Keccak512 => Some(HashKind::Keccak512),
            _ => None,
        }
    }
}

/// The kinds of primitives a name can resolve to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimitiveKind {
    /// A keyed block transform.
    BlockCipher,
    /// A key+nonce keystream generator.
    StreamCipher,
    /// An unauthenticated block mode.
    BlockMode,
    /// An authenticated mode.
    AeadMode,
    /// A block padding scheme.
    Padding,
    /// An unkeyed digest.
    Hash,
    /// A keyed authenticator.
    Mac,
    /// A key derivation function.
    Kdf,
}

/// Whether `name` resolves for the given primitive kind.
pub fn is_supported(kind: PrimitiveKind, name: &str) -> bool {
    match kind {
        PrimitiveKind::BlockCipher => BlockCipherKind::from_str(name).is_ok(),
        PrimitiveKind::StreamCipher => StreamCipherKind::from_str(name).is_ok(),
        PrimitiveKind::BlockMode => BlockModeKind::from_str(name).is_ok(),
        PrimitiveKind::AeadMode => AeadModeKind::from_str(name).is_ok(),
        PrimitiveKind::Padding => PaddingKind::from_str(name).is_ok(),
        PrimitiveKind::Hash => HashKind::from_str(name).is_ok(),
        PrimitiveKind::Mac => MacKind::from_str(name).is_ok(),
        PrimitiveKind::Kdf => KdfKind::from_str(name).is_ok(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip() {
        for k in BlockCipherKind::ALL {
            assert_eq!(BlockCipherKind::from_str(k.name()).unwrap(), *k);
        }
        for k in StreamCipherKind::ALL {
            assert_eq!(StreamCipherKind::from_str(k.name()).unwrap(), *k);
        }
        for k in HashKind::ALL {
            assert_eq!(HashKind::from_str(k.name()).unwrap(), *k);
        }
    }

    #[test]
    fn unknown_names_are_unsupported() {
        assert!(matches!(
            BlockCipherKind::from_str("RC4"),
            Err(CryptoError::Unsupported(_))
        ));
        assert!(!is_supported(PrimitiveKind::AeadMode, "OCB"));
        assert!(!is_supported(PrimitiveKind::BlockMode, "CTS_CBC"));
    }

    #[test]
    fn descriptor_sizes_are_consistent() {
        for k in BlockCipherKind::ALL {
            let d = k.descriptor();
            assert!(d
                .allowable_key_sizes_bits
                .contains(&d.default_key_size_bits));
            assert!(d
                .allowable_block_sizes_bits
                .contains(&d.default_block_size_bits));
        }
        for k in StreamCipherKind::ALL {
            let d = k.descriptor();
            assert!(d.allowable_iv_sizes_bits.contains(&d.default_iv_size_bits));
        }
    }

    #[test]
    fn eax_mac_allow_list_is_byte_stepped() {
        let d = AeadModeKind::Eax.descriptor();
        assert!(d.allowable_mac_sizes_bits.contains(&64));
        assert!(d.allowable_mac_sizes_bits.contains(&128));
        assert!(!d.allowable_mac_sizes_bits.contains(&192));
    }
}
