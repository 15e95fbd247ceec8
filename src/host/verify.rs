// Copyright lowRISC contributors.
// Licensed under the Apache License, Version 2.0, see LICENSE for details.
// SPDX-License-Identifier: Apache-2.0

//! Host-side Verify output MAC.
//!
//! When the ECC608 runs Verify with IO protection enabled, it returns a
//! MAC over the verified message, the host's system nonce, and the
//! signature, keyed by the IO protection key. The host reproduces that
//! MAC here to authenticate the verdict.
//!
//! Which 32 bytes constitute "the message" depends on the mode: the
//! Validate/Invalidate modes derive it from TempKey and the Sign(Internal)
//! `OtherData`, while the plain modes take it from the message digest
//! buffer or TempKey directly.

use crate::crypto::sha256;
use crate::crypto::sha256::Hasher as _;
use crate::device::Capability;
use crate::host::opcode;
use crate::host::Engine;
use crate::host::Error;
use crate::host::Key;
use crate::host::SerialNumber;
use crate::host::TempKey;

/// The mode-byte mask selecting the Verify mode proper.
const MODE_MASK: u8 = 0x07;

/// Verify Validate mode.
pub const MODE_VALIDATE: u8 = 0x03;

/// Verify Invalidate mode.
pub const MODE_INVALIDATE: u8 = 0x07;

/// The mode bit sourcing the message from the message digest buffer.
pub const MODE_SOURCE_MSGDIGBUF: u8 = 0x20;

/// The length of Verify `OtherData` (from Sign(Internal)).
pub const OTHER_DATA_LEN: usize = 19;

/// Parameters for the expected Verify output MAC.
#[derive(Copy, Clone, Debug)]
pub struct VerifyMac<'a> {
    /// The mode byte the command ran with.
    pub mode: u8,
    /// The command's key id / curve type parameter.
    pub key_id: u16,
    /// The ECDSA signature that was verified.
    pub signature: &'a [u8; 64],
    /// The first 64 bytes of the message digest buffer.
    pub msg_dig_buf: &'a [u8; 64],
    /// The IO protection key.
    pub io_key: &'a Key,
    /// Sign(Internal) `OtherData`; required by Validate/Invalidate.
    pub other_data: Option<&'a [u8; OTHER_DATA_LEN]>,
    /// The device serial number; required by Validate/Invalidate.
    pub sn: Option<&'a SerialNumber>,
}

impl<B: sha256::Builder> Engine<B> {
    /// Computes the MAC a successful IO-protected Verify returns.
    ///
    /// `temp_key` is read (never consumed) when the mode takes its message
    /// from TempKey, and by the Validate/Invalidate derivations.
    pub fn verify_mac(
        &self,
        req: &VerifyMac,
        temp_key: Option<&TempKey>,
    ) -> Result<sha256::Digest, Error> {
        self.require(Capability::Verify)?;

        let verify_mode = req.mode & MODE_MASK;
        let from_msg_dig_buf = req.mode & MODE_SOURCE_MSGDIGBUF == MODE_SOURCE_MSGDIGBUF;

        let mut message = [0; 32];
        if verify_mode == MODE_VALIDATE || verify_mode == MODE_INVALIDATE {
            let other_data = req.other_data.ok_or(Error::BadParameter)?;
            let sn = req.sn.ok_or(Error::BadParameter)?;
            let tk = temp_key.ok_or(Error::BadParameter)?;

            // The message is itself a digest over TempKey and the
            // Sign(Internal) parameter bytes.
            let mut hasher = self.hasher()?;
            hasher.write(tk.value())?;
            hasher.write(&[opcode::SIGN])?;
            hasher.write(&other_data[0..10])?;
            hasher.write(&[sn[8]])?;
            hasher.write(&other_data[10..14])?;
            hasher.write(&sn[0..2])?;
            hasher.write(&other_data[14..19])?;
            hasher.finish(&mut message)?;
        } else if from_msg_dig_buf {
            message.copy_from_slice(&req.msg_dig_buf[0..32]);
        } else {
            let tk = temp_key.ok_or(Error::BadParameter)?;
            message.copy_from_slice(tk.value());
        }

        // The system nonce sits behind the message when both share the
        // buffer.
        let nonce = if from_msg_dig_buf {
            &req.msg_dig_buf[32..64]
        } else {
            &req.msg_dig_buf[0..32]
        };

        let mut hasher = self.hasher()?;
        hasher.write(req.io_key)?;
        hasher.write(&message)?;
        hasher.write(nonce)?;
        hasher.write(req.signature)?;
        hasher.write(&[
            opcode::VERIFY,
            req.mode,
            (req.key_id & 0xFF) as u8,
            (req.key_id >> 8) as u8,
        ])?;

        let mut mac = sha256::Digest::default();
        hasher.finish(&mut mac)?;
        Ok(mac)
    }
}
