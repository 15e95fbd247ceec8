// Copyright lowRISC contributors.
// Licensed under the Apache License, Version 2.0, see LICENSE for details.
// SPDX-License-Identifier: Apache-2.0

//! Transport session keys for the small parts.
//!
//! The ECC204/SHA10x family has no long-lived TempKey session: instead,
//! each command sequence derives a session key from a stored transport key
//! and the device nonce, and individual commands (Write, Delete) carry
//! MACs under it. The SHA105 additionally derives per-client diversified
//! keys from a parent key and client-identifying input.
//!
//! All three messages share the familiar 96-byte GenDig shape.

use arrayvec::ArrayVec;

use crate::crypto::sha256;
use crate::device::Capability;
use crate::host::opcode;
use crate::host::tempkey::Source;
use crate::host::Engine;
use crate::host::Error;
use crate::host::Key;
use crate::host::SerialNumber;
use crate::host::TempKey;
use crate::host::ZEROS;
use crate::io::Write as _;

/// The length of the digested messages in this family.
const MSG_LEN: usize = 96;

/// Parameters for deriving a transport session key.
#[derive(Copy, Clone, Debug)]
pub struct SessionKey<'a> {
    /// The stored transport key.
    pub transport_key: &'a Key,
    /// The transport key's slot id.
    pub transport_key_id: u16,
    /// The nonce the device generated for this session.
    pub nonce: &'a [u8; 32],
    /// The device serial number.
    pub sn: &'a SerialNumber,
}

/// Parameters for the Delete command's authorizing MAC.
#[derive(Copy, Clone, Debug)]
pub struct DeleteMac<'a> {
    /// The authorizing key.
    pub key: &'a Key,
    /// The authorizing key's slot id.
    pub key_id: u16,
    /// The nonce the device generated for this session.
    pub nonce: &'a [u8; 32],
    /// The device serial number.
    pub sn: &'a SerialNumber,
}

/// Parameters for deriving a SHA105 diversified key.
#[derive(Copy, Clone, Debug)]
pub struct DivKey<'a> {
    /// The parent key the diversified key descends from.
    pub parent_key: &'a Key,
    /// The GenDivKey command's parameter bytes.
    pub other_data: &'a [u8; 4],
    /// The fixed, client-identifying input data.
    pub input_data: &'a [u8; 32],
    /// The device serial number.
    pub sn: &'a SerialNumber,
}

impl<B: sha256::Builder> Engine<B> {
    /// Derives the session key a GenSessionKey nonce established.
    ///
    /// The message reuses the GenDig opcode with a zero zone byte.
    pub fn session_key(&self, req: &SessionKey) -> Result<Key, Error> {
        self.require(Capability::SessionKey)?;

        let mut msg = ArrayVec::<u8, MSG_LEN>::new();
        msg.write_bytes(req.transport_key)?;
        msg.write_bytes(&[opcode::GENDIG, 0x00])?;
        msg.write_le(req.transport_key_id)?;
        msg.write_bytes(&[req.sn[8]])?;
        msg.write_bytes(&req.sn[0..2])?;
        msg.write_bytes(&ZEROS[..25])?;
        msg.write_bytes(req.nonce)?;
        self.digest(&msg)
    }

    /// Computes the MAC authorizing a Delete command.
    pub fn delete_mac(&self, req: &DeleteMac) -> Result<sha256::Digest, Error> {
        self.require(Capability::SessionKey)?;

        let mut msg = ArrayVec::<u8, MSG_LEN>::new();
        msg.write_bytes(req.key)?;
        msg.write_bytes(&[opcode::DELETE, 0x00])?;
        msg.write_le(req.key_id)?;
        msg.write_bytes(&[req.sn[8]])?;
        msg.write_bytes(&req.sn[0..2])?;
        msg.write_bytes(&ZEROS[..25])?;
        msg.write_bytes(req.nonce)?;
        self.digest(&msg)
    }

    /// Derives a SHA105 diversified key into `temp_key`.
    ///
    /// The result is a fresh host-supplied credential: the register is
    /// fully rewritten with an `Input` source.
    pub fn gen_div_key(&self, req: &DivKey, temp_key: &mut TempKey) -> Result<(), Error> {
        self.require(Capability::SessionKey)?;

        let mut msg = ArrayVec::<u8, MSG_LEN>::new();
        msg.write_bytes(req.parent_key)?;
        msg.write_bytes(req.other_data)?;
        msg.write_bytes(&[req.sn[8]])?;
        msg.write_bytes(&req.sn[0..2])?;
        msg.write_bytes(&ZEROS[..25])?;
        msg.write_bytes(req.input_data)?;

        let digest = self.digest(&msg)?;
        temp_key.load(&digest, Source::Input);
        Ok(())
    }
}
