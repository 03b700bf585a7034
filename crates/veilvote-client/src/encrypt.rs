//! Encryption request builder
//!
//! Turns a plaintext choice into an admissible `(handle, proof)` pair before
//! any write is attempted. The range gate runs first: an out-of-range value
//! fails without any cryptographic work. The encryption itself is expensive
//! and all-or-nothing; abandoning it touches no shared state, since nothing
//! is committed until the pair is submitted through the registry's write
//! path.

use veilvote_backend::FheOracle;
use veilvote_runtime::{EncryptedInput, FheUintWidth, OwnerAddress, RegistryId, Result, VoteError};

/// Builds encrypted inputs bound to one `(registry instance, owner)` pair.
#[derive(Debug)]
pub struct EncryptionRequestBuilder<'a, O> {
    oracle: &'a O,
    registry: RegistryId,
    owner: OwnerAddress,
}

impl<'a, O: FheOracle> EncryptionRequestBuilder<'a, O> {
    pub fn new(oracle: &'a O, registry: RegistryId, owner: OwnerAddress) -> Self {
        Self { oracle, registry, owner }
    }

    /// Encrypts `value` at the declared width. Fails with
    /// `VoteError::EncodingRange` before contacting the backend if the value
    /// does not fit.
    pub fn build(&self, value: u64, width: FheUintWidth) -> Result<EncryptedInput> {
        build_encrypted_input(self.oracle, self.registry, self.owner, value, width)
    }

    /// Convenience for the registry's 32-bit vote slot.
    pub fn build_u32(&self, value: u32) -> Result<EncryptedInput> {
        self.build(value as u64, FheUintWidth::U32)
    }
}

/// Free-function form of the builder; see [`EncryptionRequestBuilder`].
pub fn build_encrypted_input(
    oracle: &impl FheOracle,
    registry: RegistryId,
    owner: OwnerAddress,
    value: u64,
    width: FheUintWidth,
) -> Result<EncryptedInput> {
    if !width.fits(value) {
        return Err(VoteError::EncodingRange { value, bits: width.bits() });
    }
    oracle.encrypt(registry, owner, value, width)
}
