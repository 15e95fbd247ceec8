// Copyright lowRISC contributors.
// Licensed under the Apache License, Version 2.0, see LICENSE for details.
// SPDX-License-Identifier: Apache-2.0

//! Host-side CheckMac computations.
//!
//! CheckMac is the mirror image of MAC: a client device produces a MAC
//! response, and the host (or a host-side SHA105) reproduces the expected
//! response to compare against it. The message layout interleaves the
//! caller's 13 bytes of `OtherData` (the client command's opcode, mode,
//! and parameter bytes) with the key blocks and serial number fields.
//!
//! Two extras ride along with the comparison:
//! - *CheckMac copy*: for two specific modes the device, on success,
//!   copies the target slot into TempKey, yielding a valid Input-sourced
//!   credential without another Nonce.
//! - *Output response MAC*: the SHA105 returns a MAC over the comparison
//!   result so the host can authenticate the verdict itself.

use arrayvec::ArrayVec;

use enumflags2::bitflags;
use enumflags2::BitFlags;

use crate::crypto::sha256;
use crate::device::Capability;
use crate::host::opcode;
use crate::host::Engine;
use crate::host::Error;
use crate::host::Key;
use crate::host::SerialNumber;
use crate::host::Source;
use crate::host::TempKey;
use crate::host::ZEROS;
use crate::io::Write as _;

/// The length of the digested CheckMac message.
const MSG_LEN: usize = 88;

/// The length of the digested output-response-MAC message.
const RESP_MSG_LEN: usize = 97;

/// The length of CheckMac `OtherData`.
pub const OTHER_DATA_LEN: usize = 13;

/// Mode bits of the CheckMac command.
#[bitflags]
#[repr(u8)]
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum CheckMacMode {
    /// The second block comes from TempKey rather than the client
    /// challenge.
    Block2TempKey = 0b0000_0001,
    /// The first block comes from TempKey rather than a slot key.
    Block1TempKey = 0b0000_0010,
    /// TempKey.SourceFlag is declared to be `Input`.
    SourceInput = 0b0000_0100,
    /// Include OTP[0..8] in the message.
    IncludeOtp64 = 0b0010_0000,
}

/// Parameters for reproducing a client's MAC response.
#[derive(Copy, Clone, Debug)]
pub struct CheckMac<'a> {
    /// The mode the CheckMac command ran with.
    pub mode: BitFlags<CheckMacMode>,
    /// The slot key; required unless the first block comes from TempKey.
    pub slot_key: Option<&'a Key>,
    /// The challenge sent to the client; required unless the second block
    /// comes from TempKey.
    pub client_chal: Option<&'a [u8; 32]>,
    /// The target slot contents, when a CheckMac copy is intended.
    pub target_key: Option<&'a Key>,
    /// OTP zone bytes; required by the OTP-inclusion mode.
    pub otp: Option<&'a [u8]>,
    /// The client command's opcode, mode, and parameter bytes.
    pub other_data: &'a [u8; OTHER_DATA_LEN],
    /// The device serial number.
    pub sn: &'a SerialNumber,
}

/// Parameters for the SHA105's output response MAC.
#[derive(Copy, Clone, Debug)]
pub struct RespMac<'a> {
    /// The mode the CheckMac command ran with.
    pub mode: BitFlags<CheckMacMode>,
    /// The key slot the command addressed.
    pub key_id: u16,
    /// The slot key.
    pub slot_key: &'a Key,
    /// The MAC response the client produced.
    pub client_resp: &'a [u8; 32],
    /// The comparison result byte returned by the device.
    pub checkmac_result: u8,
    /// The device serial number.
    pub sn: &'a SerialNumber,
}

/// Whether this mode/target combination performs a CheckMac copy.
///
/// The hardware keys this on the two exact mode bytes 0x01 and 0x05, not
/// on any individual bit.
fn is_copy(mode: BitFlags<CheckMacMode>, target_key: Option<&Key>) -> bool {
    let bits = mode.bits();
    (bits == 0x01 || bits == 0x05) && target_key.is_some()
}

impl<B: sha256::Builder> Engine<B> {
    /// Reproduces the client response a CheckMac command compares against.
    ///
    /// When the mode performs a CheckMac copy, `temp_key` is loaded with
    /// the target slot contents on success, exactly as the device loads
    /// its own TempKey.
    pub fn check_mac(
        &self,
        req: &CheckMac,
        mut temp_key: Option<&mut TempKey>,
    ) -> Result<sha256::Digest, Error> {
        self.require(Capability::CheckMac)?;

        let uses_tempkey = req
            .mode
            .intersects(CheckMacMode::Block1TempKey | CheckMacMode::Block2TempKey);
        let needs_tempkey = uses_tempkey || is_copy(req.mode, req.target_key);
        check!(!needs_tempkey || temp_key.is_some(), Error::BadParameter);
        check!(
            req.mode.contains(CheckMacMode::Block1TempKey) || req.slot_key.is_some(),
            Error::BadParameter
        );
        check!(
            req.mode.contains(CheckMacMode::Block2TempKey) || req.client_chal.is_some(),
            Error::BadParameter
        );
        if req.mode.contains(CheckMacMode::IncludeOtp64) {
            check!(
                req.otp.map_or(false, |otp| otp.len() >= 8),
                Error::BadParameter
            );
        }

        if uses_tempkey {
            // The message pulls TempKey in; it must be live and of the
            // declared provenance. Unlike MAC, a failure here does not
            // revoke the credential.
            let tk = temp_key.as_deref().ok_or(Error::Internal)?;
            check!(tk.is_valid(), Error::ExecutionError);
            let expect = if req.mode.contains(CheckMacMode::SourceInput) {
                Source::Input
            } else {
                Source::Random
            };
            check!(tk.source() == expect, Error::ExecutionError);
        }

        let mut msg = ArrayVec::<u8, MSG_LEN>::new();
        let tk_value = temp_key.as_deref().map(|tk| *tk.value());
        if req.mode.contains(CheckMacMode::Block1TempKey) {
            msg.write_bytes(tk_value.as_ref().ok_or(Error::Internal)?)?;
        } else {
            msg.write_bytes(req.slot_key.ok_or(Error::Internal)?)?;
        }
        if req.mode.contains(CheckMacMode::Block2TempKey) {
            msg.write_bytes(tk_value.as_ref().ok_or(Error::Internal)?)?;
        } else {
            msg.write_bytes(req.client_chal.ok_or(Error::Internal)?)?;
        }
        msg.write_bytes(&req.other_data[0..4])?;
        if req.mode.contains(CheckMacMode::IncludeOtp64) {
            msg.write_bytes(&req.otp.ok_or(Error::Internal)?[..8])?;
        } else {
            msg.write_bytes(&ZEROS[..8])?;
        }
        msg.write_bytes(&req.other_data[4..7])?;
        msg.write_bytes(&[req.sn[8]])?;
        msg.write_bytes(&req.other_data[7..11])?;
        msg.write_bytes(&req.sn[0..2])?;
        msg.write_bytes(&req.other_data[11..13])?;

        let digest = self.digest(&msg)?;

        if is_copy(req.mode, req.target_key) {
            let tk = temp_key.as_deref_mut().ok_or(Error::Internal)?;
            let target = req.target_key.ok_or(Error::Internal)?;
            tk.load(target, Source::Input);
            trace!("CheckMac copy loaded TempKey from target slot");
        }

        Ok(digest)
    }

    /// Computes the output response MAC the SHA105 returns alongside its
    /// comparison verdict.
    pub fn resp_mac(&self, req: &RespMac) -> Result<sha256::Digest, Error> {
        self.require(Capability::CheckMac)?;

        let mut msg = ArrayVec::<u8, RESP_MSG_LEN>::new();
        msg.write_bytes(req.slot_key)?;
        msg.write_bytes(&[opcode::CHECKMAC, req.mode.bits()])?;
        msg.write_le(req.key_id)?;
        msg.write_bytes(&[req.sn[8]])?;
        msg.write_bytes(&req.sn[0..2])?;
        msg.write_bytes(&ZEROS[..25])?;
        msg.write_bytes(req.client_resp)?;
        msg.write_bytes(&[req.checkmac_result])?;
        self.digest(&msg)
    }
}
