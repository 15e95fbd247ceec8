// Copyright lowRISC contributors.
// Licensed under the Apache License, Version 2.0, see LICENSE for details.
// SPDX-License-Identifier: Apache-2.0

//! Host-side HMAC computation.
//!
//! The legacy HMAC command performs a FIPS-198 HMAC-SHA256 whose inner
//! text is laid out exactly like a MAC message with a zeroed first block
//! and TempKey as the second. The hardware pads its 32-byte key to the
//! 64-byte block size with zeros before the ipad/opad XOR, which is why
//! the pad runs below are split at 32 bytes.

use arrayvec::ArrayVec;

use enumflags2::bitflags;
use enumflags2::BitFlags;

use crate::crypto::sha256;
use crate::device::Capability;
use crate::host::opcode;
use crate::host::tempkey::Gate;
use crate::host::Engine;
use crate::host::Error;
use crate::host::IncludedData;
use crate::host::INCLUDED_DATA_LEN;
use crate::host::Key;
use crate::host::SerialNumber;
use crate::host::Source;
use crate::host::TempKey;
use crate::host::KEY_LEN;
use crate::host::ZEROS;
use crate::io::Write as _;

/// The SHA-256 block size, which HMAC keys are padded to.
const BLOCK_LEN: usize = 64;

/// The length of the inner HMAC text (identical to a MAC message).
const TEXT_LEN: usize = 68 + INCLUDED_DATA_LEN;

/// Mode bits of the HMAC command.
///
/// Unlike MAC, HMAC has no block-source bits: the message always uses a
/// zero block followed by TempKey.
#[bitflags]
#[repr(u8)]
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum HmacMode {
    /// TempKey.SourceFlag is declared to be `Input`.
    SourceInput = 0b0000_0100,
    /// Include OTP[0..11] in the message.
    IncludeOtp88 = 0b0001_0000,
    /// Include OTP[0..8] in the message.
    IncludeOtp64 = 0b0010_0000,
    /// Include the full serial number in the message.
    IncludeSn = 0b0100_0000,
}

/// Parameters for a host-side HMAC computation.
#[derive(Copy, Clone, Debug)]
pub struct Hmac<'a> {
    /// The mode the HMAC command ran with.
    pub mode: BitFlags<HmacMode>,
    /// The key slot the command addressed.
    pub key_id: u16,
    /// The slot key used as the HMAC key.
    pub key: &'a Key,
    /// OTP zone bytes; required by the OTP-inclusion modes.
    pub otp: Option<&'a [u8]>,
    /// The device serial number.
    pub sn: &'a SerialNumber,
}

impl<B: sha256::Builder> Engine<B> {
    /// Computes the digest an HMAC command returns.
    ///
    /// TempKey is always part of the message, so it must be valid, not
    /// NoMac-tainted, and of the declared provenance; it is consumed on
    /// success.
    pub fn hmac(&self, req: &Hmac, temp_key: &mut TempKey) -> Result<sha256::Digest, Error> {
        self.require(Capability::Hmac)?;

        if req.mode.contains(HmacMode::IncludeOtp88) {
            check!(
                req.otp.map_or(false, |otp| otp.len() >= 11),
                Error::BadParameter
            );
        } else if req.mode.contains(HmacMode::IncludeOtp64) {
            check!(
                req.otp.map_or(false, |otp| otp.len() >= 8),
                Error::BadParameter
            );
        }

        let expect = if req.mode.contains(HmacMode::SourceInput) {
            Source::Input
        } else {
            Source::Random
        };
        temp_key.gate(Gate {
            no_mac_clear: true,
            source: Some(expect),
            ..Gate::default()
        })?;

        // Inner hash: H((K0 ^ ipad) ‖ text).
        let mut inner = ArrayVec::<u8, { BLOCK_LEN + TEXT_LEN }>::new();
        for &byte in req.key.iter() {
            inner.write_bytes(&[byte ^ 0x36])?;
        }
        inner.write_bytes(&[0x36; BLOCK_LEN - KEY_LEN])?;

        inner.write_bytes(&ZEROS[..KEY_LEN])?;
        inner.write_bytes(temp_key.value())?;
        inner.write_bytes(&[opcode::HMAC, req.mode.bits()])?;
        inner.write_le(req.key_id)?;
        IncludedData {
            otp: req.otp,
            sn: req.sn,
            otp88: req.mode.contains(HmacMode::IncludeOtp88),
            otp64: req.mode.contains(HmacMode::IncludeOtp64),
            full_sn: req.mode.contains(HmacMode::IncludeSn),
        }
        .write_to(&mut inner)?;
        let inner_digest = self.digest(&inner)?;

        // Outer hash: H((K0 ^ opad) ‖ inner).
        let mut outer = ArrayVec::<u8, { BLOCK_LEN + sha256::DIGEST_LEN }>::new();
        for &byte in req.key.iter() {
            outer.write_bytes(&[byte ^ 0x5c])?;
        }
        outer.write_bytes(&[0x5c; BLOCK_LEN - KEY_LEN])?;
        outer.write_bytes(&inner_digest)?;
        let digest = self.digest(&outer)?;

        temp_key.consume();
        Ok(digest)
    }
}
