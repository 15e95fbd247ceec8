// Copyright lowRISC contributors.
// Licensed under the Apache License, Version 2.0, see LICENSE for details.
// SPDX-License-Identifier: Apache-2.0

//! The host-side session authentication engine.
//!
//! Every authenticated exchange with a secure element follows the same
//! shape: the host runs a Nonce command and mirrors the resulting
//! [`TempKey`]; optionally evolves it with GenDig or GenKey; and finally
//! computes or verifies a MAC whose input message embeds the TempKey
//! value. The chip performs the same computations internally, so any
//! deviation in message layout or flag handling produces a digest mismatch
//! rather than an error; correctness here is the entire point.
//!
//! [`Engine`] is the entry point. It owns a SHA-256 implementation and a
//! device [`Profile`], and exposes one method per hardware operation. The
//! engine is pure computation: it never performs I/O, and all session
//! state lives in the caller-owned [`TempKey`].
//!
//! # Errors
//!
//! Operations distinguish caller mistakes from state violations:
//! [`Error::BadParameter`] reports a malformed call and leaves all state
//! untouched, while [`Error::ExecutionError`] reports a TempKey
//! precondition violation, forces the TempKey invalid, and requires the
//! caller to restart the exchange from a fresh Nonce. This mirrors the
//! hardware, which invalidates its own TempKey on misuse rather than
//! silently proceeding.
//!
//! [`TempKey`]: tempkey/struct.TempKey.html
//! [`Engine`]: struct.Engine.html
//! [`Error::BadParameter`]: enum.Error.html#variant.BadParameter
//! [`Error::ExecutionError`]: enum.Error.html#variant.ExecutionError

use crate::crypto::sha256;
use crate::crypto::sha256::BuilderExt as _;
use crate::device::Capability;
use crate::device::Profile;
use crate::io;
use crate::io::Write;

pub mod check_mac;
pub mod counter;
pub mod decrypt;
pub mod derive_key;
pub mod gen_dig;
pub mod gen_key;
pub mod hmac;
pub mod mac;
pub mod nonce;
pub mod secure_boot;
pub mod session_key;
pub mod sign_internal;
pub mod tempkey;
pub mod verify;
pub mod write_mac;

pub use tempkey::Source;
pub use tempkey::TempKey;

#[cfg(test)]
pub(crate) mod test_util;

/// The length of a standard key, block, or challenge, in bytes.
pub const KEY_LEN: usize = 32;

/// A 32-byte key or key-sized block.
pub type Key = [u8; KEY_LEN];

/// A device serial number.
///
/// Every message that binds a computation to a specific die embeds
/// `sn[8]` and `sn[0..2]`; some modes additionally mix in the remaining
/// six bytes.
pub type SerialNumber = [u8; 9];

/// The highest key slot id on classic CryptoAuth parts.
pub const KEY_ID_MAX: u16 = 15;

/// An error returned by an authentication computation.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Error {
    /// Indicates a malformed call: a missing buffer, a wrong-length slice,
    /// or an out-of-range field.
    ///
    /// No state is modified; the caller may fix the parameters and retry.
    BadParameter,

    /// Indicates that a TempKey precondition was violated: the credential
    /// is stale, invalid, or its provenance does not match the requested
    /// mode.
    ///
    /// The TempKey is forced invalid. The only recovery is to re-run the
    /// exchange from a fresh Nonce.
    ExecutionError,

    /// Indicates that the session's device profile does not support the
    /// requested operation.
    ///
    /// No state is modified.
    Unsupported,

    /// Indicates an internal failure: the digest backend failed, or an
    /// internal buffer computation went out of bounds.
    ///
    /// Neither occurs for well-formed calls over a functioning backend.
    Internal,
}

impl From<io::Error> for Error {
    fn from(_: io::Error) -> Self {
        Self::Internal
    }
}

impl From<sha256::Error> for Error {
    fn from(_: sha256::Error) -> Self {
        Self::Internal
    }
}

/// Command opcodes, as embedded in digest messages.
///
/// These are fixed by the hardware command set and must match the bytes
/// the device itself mixes into its digests.
pub(crate) mod opcode {
    pub const CHECKMAC: u8 = 0x28;
    pub const DELETE: u8 = 0x13;
    pub const DERIVE_KEY: u8 = 0x1C;
    pub const GENDIG: u8 = 0x15;
    pub const GENKEY: u8 = 0x40;
    pub const HMAC: u8 = 0x11;
    pub const MAC: u8 = 0x08;
    pub const NONCE: u8 = 0x16;
    pub const PRIVWRITE: u8 = 0x46;
    pub const SECUREBOOT: u8 = 0x80;
    pub const SIGN: u8 = 0x41;
    pub const VERIFY: u8 = 0x45;
    pub const WRITE: u8 = 0x12;
}

/// A run of zero padding, the longest any message layout calls for.
pub(crate) const ZEROS: [u8; 32] = [0; 32];

/// The length of the tail produced by [`IncludedData::write_to()`].
///
/// [`IncludedData::write_to()`]: struct.IncludedData.html#method.write_to
pub(crate) const INCLUDED_DATA_LEN: usize = 20;

/// The OTP-and-serial-number tail shared by the MAC and HMAC messages.
///
/// Always 20 bytes: an 11-byte OTP section (OTP[0..11], or OTP[0..8] plus
/// three zeros, or all zeros), `sn[8]`, `sn[4..8]` or zeros, `sn[0..2]`,
/// and `sn[2..4]` or zeros.
pub(crate) struct IncludedData<'a> {
    pub otp: Option<&'a [u8]>,
    pub sn: &'a SerialNumber,
    pub otp88: bool,
    pub otp64: bool,
    pub full_sn: bool,
}

impl IncludedData<'_> {
    pub fn write_to<W: Write>(&self, w: &mut W) -> Result<(), io::Error> {
        if self.otp88 {
            // OTP[0..11]; the 64-bit option is overridden.
            w.write_bytes(&self.otp.unwrap_or(&ZEROS)[..11])?;
        } else {
            if self.otp64 {
                w.write_bytes(&self.otp.unwrap_or(&ZEROS)[..8])?;
            } else {
                w.write_bytes(&ZEROS[..8])?;
            }
            w.write_bytes(&ZEROS[..3])?;
        }

        w.write_bytes(&[self.sn[8]])?;
        if self.full_sn {
            w.write_bytes(&self.sn[4..8])?;
        } else {
            w.write_bytes(&ZEROS[..4])?;
        }
        w.write_bytes(&self.sn[0..2])?;
        if self.full_sn {
            w.write_bytes(&self.sn[2..4])?;
        } else {
            w.write_bytes(&ZEROS[..2])?;
        }
        Ok(())
    }
}

/// The host half of an authenticated session with a secure element.
///
/// An `Engine` bundles a digest implementation with the [`Profile`] of the
/// device being spoken to. It holds no session state of its own: the
/// TempKey each operation reads and evolves is caller-owned, so a single
/// engine may serve any number of sequential sessions, but a TempKey must
/// never be shared between concurrent ones: its validity is a one-shot,
/// order-dependent credential.
///
/// [`Profile`]: ../device/struct.Profile.html
pub struct Engine<B> {
    profile: Profile,
    sha: B,
}

impl<B: sha256::Builder> Engine<B> {
    /// Creates a new `Engine` for the device described by `profile`.
    pub fn new(profile: Profile, sha: B) -> Self {
        Self { profile, sha }
    }

    /// Returns the profile this engine was constructed with.
    pub fn profile(&self) -> &Profile {
        &self.profile
    }

    /// Fails with [`Error::Unsupported`] unless the profile carries `cap`.
    ///
    /// [`Error::Unsupported`]: enum.Error.html#variant.Unsupported
    pub(crate) fn require(&self, cap: Capability) -> Result<(), Error> {
        if !self.profile.supports(cap) {
            return Err(fail!(
                Error::Unsupported,
                "device {:?} does not support {:?}",
                self.profile.device(),
                cap
            ));
        }
        Ok(())
    }

    /// Starts a streaming digest.
    pub(crate) fn hasher(&self) -> Result<B::Hasher, Error> {
        Ok(self.sha.new_hasher()?)
    }

    /// Digests a fully-assembled message buffer.
    pub(crate) fn digest(&self, msg: &[u8]) -> Result<sha256::Digest, Error> {
        let mut out = sha256::Digest::default();
        self.sha.hash_contiguous(msg, &mut out)?;
        Ok(out)
    }
}
