//! Core types for the VeilVote registry
//!
//! This module defines the opaque identifiers the registry and its client
//! protocol exchange: owner and registry addresses, ciphertext handles, input
//! proofs and the plaintext bit-width declaration. None of these values carry
//! plaintext; a handle is only a reference into the cryptographic backend.

use std::fmt;
use std::str::FromStr;

use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::VoteError;

/// Serializes an address-like newtype as its `0x`-prefixed hex string, so the
/// types are usable as JSON map keys.
macro_rules! serde_as_hex_string {
    ($ty:ident) => {
        impl Serialize for $ty {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(&self.to_string())
            }
        }

        impl<'de> Deserialize<'de> for $ty {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let s = String::deserialize(deserializer)?;
                s.parse().map_err(D::Error::custom)
            }
        }
    };
}

fn decode_fixed<const N: usize>(s: &str) -> Result<[u8; N], VoteError> {
    let stripped = s.strip_prefix("0x").unwrap_or(s);
    let raw = hex::decode(stripped)
        .map_err(|e| VoteError::serialization_error(format!("invalid hex: {e}")))?;
    if raw.len() != N {
        return Err(VoteError::serialization_error(format!(
            "expected {N} bytes, got {}",
            raw.len()
        )));
    }
    let mut out = [0u8; N];
    out.copy_from_slice(&raw);
    Ok(out)
}

/// Opaque 20-byte principal identifier (address-like).
///
/// An `OwnerAddress` names the participant a vote record belongs to. The core
/// never fabricates one; it is always supplied by the identity collaborator.
///
/// # Examples
///
/// ```
/// use veilvote_runtime::OwnerAddress;
///
/// let owner = OwnerAddress::new([0x11; 20]);
/// assert_eq!(owner.to_string().len(), 42); // "0x" + 40 hex chars
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct OwnerAddress([u8; 20]);

impl OwnerAddress {
    pub const fn new(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }
}

impl fmt::Display for OwnerAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl FromStr for OwnerAddress {
    type Err = VoteError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        decode_fixed::<20>(s).map(Self)
    }
}

serde_as_hex_string!(OwnerAddress);

/// Opaque 20-byte registry-instance identifier.
///
/// Input proofs and decryption authorizations are bound to exactly one
/// registry instance; a proof built for one instance must not verify on
/// another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RegistryId([u8; 20]);

impl RegistryId {
    pub const fn new(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }
}

impl fmt::Display for RegistryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl FromStr for RegistryId {
    type Err = VoteError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        decode_fixed::<20>(s).map(Self)
    }
}

serde_as_hex_string!(RegistryId);

/// Opaque 32-byte reference to a ciphertext held by the cryptographic backend.
///
/// Handles support only equality: two handles either reference the same
/// ciphertext or have no comparable relationship. The all-zero handle is the
/// sentinel meaning "no ciphertext stored" and is never produced by a real
/// encryption.
///
/// # Examples
///
/// ```
/// use veilvote_runtime::CiphertextHandle;
///
/// assert!(CiphertextHandle::EMPTY.is_empty());
/// assert!(!CiphertextHandle::new([1; 32]).is_empty());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CiphertextHandle([u8; 32]);

impl CiphertextHandle {
    /// Sentinel handle for the ABSENT state ("never voted").
    pub const EMPTY: Self = Self([0u8; 32]);

    pub const fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// True for the sentinel handle, never for a real ciphertext reference.
    pub fn is_empty(&self) -> bool {
        self.0 == [0u8; 32]
    }
}

impl fmt::Display for CiphertextHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl FromStr for CiphertextHandle {
    type Err = VoteError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        decode_fixed::<32>(s).map(Self)
    }
}

serde_as_hex_string!(CiphertextHandle);

/// Opaque proof bundle accompanying a ciphertext handle on write.
///
/// The proof binds the handle to (submitting owner, registry instance,
/// underlying plaintext) without revealing the plaintext. Its internal
/// structure belongs to the cryptographic backend; the core only forwards it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct InputProof {
    #[serde(with = "hex_bytes")]
    bytes: Vec<u8>,
}

impl InputProof {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Output of the encryption request builder: a handle plus the input proof
/// that makes it admissible for `cast_vote`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EncryptedInput {
    handle: CiphertextHandle,
    proof: InputProof,
}

impl EncryptedInput {
    pub fn new(handle: CiphertextHandle, proof: InputProof) -> Self {
        Self { handle, proof }
    }

    pub fn handle(&self) -> CiphertextHandle {
        self.handle
    }

    pub fn proof(&self) -> &InputProof {
        &self.proof
    }

    pub fn into_parts(self) -> (CiphertextHandle, InputProof) {
        (self.handle, self.proof)
    }
}

/// Declared bit width of an encrypted unsigned integer.
///
/// The vote slot in the registry is 32-bit; the builder still supports the
/// other widths the backend's encoders expose.
///
/// # Examples
///
/// ```
/// use veilvote_runtime::FheUintWidth;
///
/// assert!(FheUintWidth::U32.fits(u32::MAX as u64));
/// assert!(!FheUintWidth::U8.fits(256));
/// assert_eq!(FheUintWidth::from_type_name("euint32"), Some(FheUintWidth::U32));
/// ```
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum FheUintWidth {
    U8,
    U16,
    U32,
    U64,
}

impl FheUintWidth {
    pub fn bits(&self) -> u32 {
        match self {
            Self::U8 => 8,
            Self::U16 => 16,
            Self::U32 => 32,
            Self::U64 => 64,
        }
    }

    /// Largest plaintext representable at this width.
    pub fn max_value(&self) -> u64 {
        match self {
            Self::U8 => u8::MAX as u64,
            Self::U16 => u16::MAX as u64,
            Self::U32 => u32::MAX as u64,
            Self::U64 => u64::MAX,
        }
    }

    pub fn fits(&self, value: u64) -> bool {
        value <= self.max_value()
    }

    /// Maps a declared encrypted-integer type name (e.g. `"euint32"`) to its
    /// width, the way the client negotiates an encoder from a function
    /// signature.
    pub fn from_type_name(name: &str) -> Option<Self> {
        match name {
            "euint8" => Some(Self::U8),
            "euint16" => Some(Self::U16),
            "euint32" => Some(Self::U32),
            "euint64" => Some(Self::U64),
            _ => None,
        }
    }

    /// Name of the backend encoder for this width.
    pub fn encoder_name(&self) -> &'static str {
        match self {
            Self::U8 => "add8",
            Self::U16 => "add16",
            Self::U32 => "add32",
            Self::U64 => "add64",
        }
    }
}

impl fmt::Display for FheUintWidth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::U8 => write!(f, "euint8"),
            Self::U16 => write!(f, "euint16"),
            Self::U32 => write!(f, "euint32"),
            Self::U64 => write!(f, "euint64"),
        }
    }
}

mod hex_bytes {
    use serde::de::Error as DeError;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format!("0x{}", hex::encode(bytes)))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(deserializer)?;
        let stripped = s.strip_prefix("0x").unwrap_or(&s);
        hex::decode(stripped).map_err(D::Error::custom)
    }
}
