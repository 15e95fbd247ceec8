// Copyright lowRISC contributors.
// Licensed under the Apache License, Version 2.0, see LICENSE for details.
// SPDX-License-Identifier: Apache-2.0

//! Host-side Nonce computation.
//!
//! The Nonce command is how every authenticated round begins. In its
//! calculated modes the device hashes its random output together with a
//! host-chosen input and its own opcode/mode bytes; the host repeats the
//! same digest here to bring its [`TempKey`] mirror in sync. In
//! pass-through mode the host value is loaded verbatim instead. The
//! source flag records the difference; downstream MAC modes must declare
//! which provenance they expect.
//!
//! [`TempKey`]: ../tempkey/struct.TempKey.html

use core::convert::TryInto as _;

use arrayvec::ArrayVec;

use crate::crypto::sha256;
use crate::device::Capability;
use crate::host::opcode;
use crate::host::tempkey::Source;
use crate::host::Engine;
use crate::host::Error;
use crate::host::TempKey;
use crate::io::Write as _;

/// The length of a calculated-nonce input (`NumIn`).
pub const NUM_IN_LEN: usize = 20;

/// The length of the digested nonce message.
pub(crate) const MSG_LEN: usize = 55;

/// The `zero` parameter bit indicating that the device reported its
/// literal TempKey value instead of fresh randomness.
const ZERO_CALC_TEMPKEY: u16 = 0x8000;

/// A buffer a pass-through nonce may be aimed at.
///
/// Only the TempKey target affects the host's mirror; the ECC608 can also
/// park a pass-through value in its message digest or alternate key
/// buffers.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum NonceTarget {
    /// TempKey, the default target.
    TempKey,
    /// The ECC608 message digest buffer.
    MsgDigBuf,
    /// The ECC608 alternate key buffer.
    AltKeyBuf,
}

/// The operating mode of a Nonce command.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum NonceMode {
    /// Calculate a nonce, updating the device RNG seed.
    SeedUpdate,
    /// Calculate a nonce without updating the RNG seed.
    NoSeedUpdate,
    /// Calculate a transport session key nonce (ECC204 family).
    GenSessionKey,
    /// Load a host-supplied value directly.
    PassThrough {
        /// Which buffer receives the value.
        target: NonceTarget,
        /// Whether the value is a 64-byte quantity.
        long: bool,
    },
}

impl NonceMode {
    /// Shorthand for the common 32-byte pass-through into TempKey.
    pub fn pass_through() -> Self {
        NonceMode::PassThrough {
            target: NonceTarget::TempKey,
            long: false,
        }
    }

    /// Renders the mode byte as the device saw it.
    pub(crate) fn byte(self) -> u8 {
        match self {
            NonceMode::SeedUpdate => 0x00,
            NonceMode::NoSeedUpdate => 0x01,
            NonceMode::GenSessionKey => 0x02,
            NonceMode::PassThrough { target, long } => {
                let target = match target {
                    NonceTarget::TempKey => 0x00,
                    NonceTarget::MsgDigBuf => 0x40,
                    NonceTarget::AltKeyBuf => 0x80,
                };
                0x03 | target | if long { 0x20 } else { 0x00 }
            }
        }
    }

    /// The `NumIn` length this mode carries on the wire.
    fn num_in_len(self) -> usize {
        match self {
            NonceMode::PassThrough { long: true, .. } => 64,
            NonceMode::PassThrough { long: false, .. } => 32,
            _ => NUM_IN_LEN,
        }
    }
}

/// Parameters fed back from a Nonce command exchange.
#[derive(Copy, Clone, Debug)]
pub struct Nonce<'a> {
    /// The mode the command ran with.
    pub mode: NonceMode,
    /// The command's `zero` parameter.
    pub zero: u16,
    /// The host-chosen input value, exactly as sent to the device.
    pub num_in: &'a [u8],
    /// The device's random output; required for the calculated modes.
    pub rand_out: Option<&'a [u8; 32]>,
}

impl<B: sha256::Builder> Engine<B> {
    /// Mirrors a completed Nonce command into `temp_key`.
    ///
    /// For the calculated modes this digests
    /// `rand_out ‖ num_in ‖ opcode ‖ mode ‖ zero-byte` exactly as the
    /// device does; for pass-through it loads `num_in` verbatim. Flag
    /// updates follow the device family: parts without a full flag
    /// register only track the source flag.
    pub fn nonce(&self, req: &Nonce, temp_key: &mut TempKey) -> Result<(), Error> {
        self.require(Capability::Nonce)?;

        match req.mode {
            NonceMode::SeedUpdate | NonceMode::NoSeedUpdate => {
                check!(req.num_in.len() == NUM_IN_LEN, Error::BadParameter);
                let rand_out = req.rand_out.ok_or(Error::BadParameter)?;

                if req.zero & ZERO_CALC_TEMPKEY == ZERO_CALC_TEMPKEY {
                    // Nonce calculation mode: the actual TempKey value was
                    // returned in RandOut. The flags are not changed.
                    temp_key.set_value(rand_out);
                } else {
                    let digest = self.nonce_digest(rand_out, req.num_in, req.mode.byte(), 0x00)?;
                    if self.profile.has_flag_register() {
                        temp_key.load(&digest, Source::Random);
                    } else {
                        temp_key.set_value(&digest);
                        temp_key.set_source(Source::Random);
                    }
                }
                temp_key.set_64(false);
            }
            NonceMode::PassThrough { target, long } => {
                if target != NonceTarget::TempKey {
                    // Other targets have no effect on TempKey beyond the
                    // flag update.
                    temp_key.divert();
                    return Ok(());
                }

                check!(req.num_in.len() == req.mode.num_in_len(), Error::BadParameter);
                let value: &[u8; 32] =
                    req.num_in[..32].try_into().map_err(|_| Error::Internal)?;
                if self.profile.has_flag_register() {
                    temp_key.load_passthrough(value, long);
                } else {
                    temp_key.set_value(value);
                    temp_key.set_source(Source::Input);
                    temp_key.set_64(long);
                }
            }
            NonceMode::GenSessionKey => {
                check!(req.zero >= 0x8000, Error::BadParameter);
                check!(req.num_in.len() == NUM_IN_LEN, Error::BadParameter);
                let rand_out = req.rand_out.ok_or(Error::BadParameter)?;

                let digest = self.nonce_digest(
                    rand_out,
                    req.num_in,
                    req.mode.byte(),
                    (req.zero & 0xFF) as u8,
                )?;
                temp_key.set_value(&digest);
                if !self.profile.has_flag_register() {
                    temp_key.set_source(Source::Random);
                }
            }
        }

        trace!("nonce mirrored; mode {:?}", req.mode);
        Ok(())
    }

    fn nonce_digest(
        &self,
        rand_out: &[u8; 32],
        num_in: &[u8],
        mode: u8,
        zero_byte: u8,
    ) -> Result<sha256::Digest, Error> {
        let mut msg = ArrayVec::<u8, MSG_LEN>::new();
        msg.write_bytes(rand_out)?;
        msg.write_bytes(num_in)?;
        msg.write_bytes(&[opcode::NONCE, mode, zero_byte])?;
        self.digest(&msg)
    }
}
