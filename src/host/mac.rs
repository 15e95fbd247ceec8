// Copyright lowRISC contributors.
// Licensed under the Apache License, Version 2.0, see LICENSE for details.
// SPDX-License-Identifier: Apache-2.0

//! Host-side MAC computation.
//!
//! The MAC command digests a key block, a challenge block, and a tail of
//! command parameters, OTP bytes, and serial number fields. Either block
//! may be sourced from TempKey instead of a caller-supplied value, in
//! which case the TempKey's flags are checked first and the credential is
//! consumed afterward; a MAC can be produced from a given TempKey exactly
//! once.

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
use crate::io::Write as _;

/// The length of the digested MAC message.
pub(crate) const MSG_LEN: usize = 68 + INCLUDED_DATA_LEN;

/// Mode bits of the MAC command.
///
/// The type constrains modes to the bit mask the hardware accepts; bits
/// outside this set cannot be expressed.
#[bitflags]
#[repr(u8)]
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum MacMode {
    /// The second block comes from TempKey rather than the challenge.
    Block2TempKey = 0b0000_0001,
    /// The first block comes from TempKey rather than a slot key.
    Block1TempKey = 0b0000_0010,
    /// TempKey.SourceFlag is declared to be `Input`.
    SourceInput = 0b0000_0100,
    /// Include OTP[0..11] in the message.
    IncludeOtp88 = 0b0001_0000,
    /// Include OTP[0..8] in the message.
    IncludeOtp64 = 0b0010_0000,
    /// Include the full serial number in the message.
    IncludeSn = 0b0100_0000,
}

/// Parameters for a host-side MAC computation.
#[derive(Copy, Clone, Debug)]
pub struct Mac<'a> {
    /// The mode the MAC command ran with.
    pub mode: BitFlags<MacMode>,
    /// The key slot the command addressed.
    pub key_id: u16,
    /// The slot key; required unless the first block comes from TempKey.
    pub key: Option<&'a Key>,
    /// The challenge; required unless the second block comes from TempKey.
    pub challenge: Option<&'a [u8; 32]>,
    /// OTP zone bytes; required by the OTP-inclusion modes.
    pub otp: Option<&'a [u8]>,
    /// The device serial number.
    pub sn: &'a SerialNumber,
}

impl<B: sha256::Builder> Engine<B> {
    /// Computes the digest a MAC command returns.
    ///
    /// `temp_key` must be supplied whenever the mode sources a block from
    /// TempKey (and always on the SHA104/SHA105, which check the source
    /// flag unconditionally). On success the TempKey, if supplied, is
    /// consumed.
    pub fn mac(
        &self,
        req: &Mac,
        mut temp_key: Option<&mut TempKey>,
    ) -> Result<sha256::Digest, Error> {
        self.require(Capability::Mac)?;

        let uses_tempkey = req
            .mode
            .intersects(MacMode::Block1TempKey | MacMode::Block2TempKey);
        check!(
            req.mode.contains(MacMode::Block1TempKey) || req.key.is_some(),
            Error::BadParameter
        );
        check!(
            req.mode.contains(MacMode::Block2TempKey) || req.challenge.is_some(),
            Error::BadParameter
        );
        check!(!uses_tempkey || temp_key.is_some(), Error::BadParameter);
        if req.mode.contains(MacMode::IncludeOtp88) {
            check!(
                req.otp.map_or(false, |otp| otp.len() >= 11),
                Error::BadParameter
            );
        } else if req.mode.contains(MacMode::IncludeOtp64) {
            check!(
                req.otp.map_or(false, |otp| otp.len() >= 8),
                Error::BadParameter
            );
        }

        let expect = if req.mode.contains(MacMode::SourceInput) {
            Source::Input
        } else {
            Source::Random
        };
        if !self.profile.has_flag_register() {
            // These parts check the source flag on every MAC, and have no
            // validity flag to revoke.
            let tk = temp_key.as_deref().ok_or(Error::BadParameter)?;
            if tk.source() != expect {
                return Err(fail!(Error::ExecutionError, "source flag mismatch"));
            }
        } else if uses_tempkey {
            let tk = temp_key.as_deref_mut().ok_or(Error::BadParameter)?;
            tk.gate(Gate {
                no_mac_clear: true,
                source: Some(expect),
                ..Gate::default()
            })?;
        }

        let mut msg = ArrayVec::<u8, MSG_LEN>::new();
        let tk_value = temp_key.as_deref().map(|tk| *tk.value());
        if req.mode.contains(MacMode::Block1TempKey) {
            msg.write_bytes(tk_value.as_ref().ok_or(Error::Internal)?)?;
        } else {
            msg.write_bytes(req.key.ok_or(Error::Internal)?)?;
        }
        if req.mode.contains(MacMode::Block2TempKey) {
            msg.write_bytes(tk_value.as_ref().ok_or(Error::Internal)?)?;
        } else {
            msg.write_bytes(req.challenge.ok_or(Error::Internal)?)?;
        }
        msg.write_bytes(&[opcode::MAC, req.mode.bits()])?;
        msg.write_le(req.key_id)?;
        IncludedData {
            otp: req.otp,
            sn: req.sn,
            otp88: req.mode.contains(MacMode::IncludeOtp88),
            otp64: req.mode.contains(MacMode::IncludeOtp64),
            full_sn: req.mode.contains(MacMode::IncludeSn),
        }
        .write_to(&mut msg)?;

        let digest = self.digest(&msg)?;

        // A MAC consumes the credential even when the message did not use
        // it.
        if let Some(tk) = temp_key {
            tk.consume();
        }
        Ok(digest)
    }
}
