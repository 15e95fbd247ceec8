// Copyright lowRISC contributors.
// Licensed under the Apache License, Version 2.0, see LICENSE for details.
// SPDX-License-Identifier: Apache-2.0

//! Host-side encrypted-write authorization.
//!
//! When a slot is configured for encrypted writes, the host XORs the
//! plaintext with the current TempKey (the chip undoes the XOR
//! internally) and sends an authorizing MAC over the plaintext alongside.
//! PrivWrite extends the scheme to 36-byte private keys by deriving a
//! second XOR block from a digest of the TempKey itself.
//!
//! The ECC204 family keys the same construction off a transport session
//! key instead of TempKey, with one hardware quirk: the key id inside the
//! MAC message is big-endian there, unlike everywhere else.

use arrayvec::ArrayVec;

use crate::crypto::sha256;
use crate::device::Capability;
use crate::host::opcode;
use crate::host::tempkey::Gate;
use crate::host::Engine;
use crate::host::Error;
use crate::host::Key;
use crate::host::SerialNumber;
use crate::host::TempKey;
use crate::host::KEY_LEN;
use crate::host::ZEROS;
use crate::io::Write as _;

/// The length of the Write auth-MAC message.
const MSG_LEN: usize = 96;

/// The length of the PrivWrite auth-MAC message.
const PRIV_MSG_LEN: usize = 96;

/// The length of a PrivWrite plaintext (a padded private key).
pub const PRIV_PLAINTEXT_LEN: usize = 36;

/// Parameters for an encrypted 32-byte Write.
#[derive(Copy, Clone, Debug)]
pub struct WriteMac<'a> {
    /// The Write command's zone byte.
    pub zone: u8,
    /// The slot being written.
    pub key_id: u16,
    /// The plaintext the caller intends to store.
    pub input_data: &'a [u8; KEY_LEN],
    /// The device serial number.
    pub sn: &'a SerialNumber,
}

/// The ciphertext and authorizing MAC for an encrypted Write.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct WriteAuth {
    /// The plaintext XOR-ed with the session secret, as sent on the wire.
    pub encrypted: [u8; KEY_LEN],
    /// The MAC authorizing the write.
    pub auth_mac: sha256::Digest,
}

/// Parameters for an encrypted PrivWrite.
#[derive(Copy, Clone, Debug)]
pub struct PrivWriteMac<'a> {
    /// The PrivWrite command's zone byte.
    pub zone: u8,
    /// The slot being written.
    pub key_id: u16,
    /// The padded private key the caller intends to store.
    pub input_data: &'a [u8; PRIV_PLAINTEXT_LEN],
    /// The device serial number.
    pub sn: &'a SerialNumber,
}

/// The ciphertext and authorizing MAC for an encrypted PrivWrite.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct PrivWriteAuth {
    /// The 36-byte two-block ciphertext, as sent on the wire.
    pub encrypted: [u8; PRIV_PLAINTEXT_LEN],
    /// The MAC authorizing the write.
    pub auth_mac: sha256::Digest,
}

impl<B: sha256::Builder> Engine<B> {
    /// Encrypts a 32-byte write and computes its authorizing MAC.
    ///
    /// The TempKey must be valid and untainted; it is left live, matching
    /// the device, which only consumes its copy when the Write itself
    /// executes.
    pub fn write_auth_mac(&self, req: &WriteMac, temp_key: &mut TempKey) -> Result<WriteAuth, Error> {
        self.require(Capability::WriteEnc)?;

        temp_key.gate(Gate {
            no_mac_clear: true,
            ..Gate::default()
        })?;

        let mut encrypted = [0; KEY_LEN];
        for (i, out) in encrypted.iter_mut().enumerate() {
            *out = req.input_data[i] ^ temp_key.value()[i];
        }

        let auth_mac = self.write_mac_digest(
            temp_key.value(),
            req.zone,
            req.key_id.to_le_bytes(),
            req.input_data,
            req.sn,
        )?;
        Ok(WriteAuth {
            encrypted,
            auth_mac,
        })
    }

    /// Encrypts a PrivWrite and computes its authorizing MAC.
    ///
    /// The first 32 ciphertext bytes are XOR-ed with TempKey; the last
    /// four use a session key derived by digesting TempKey once more.
    pub fn privwrite_auth_mac(
        &self,
        req: &PrivWriteMac,
        temp_key: &mut TempKey,
    ) -> Result<PrivWriteAuth, Error> {
        self.require(Capability::WriteEnc)?;

        temp_key.gate(Gate {
            no_mac_clear: true,
            ..Gate::default()
        })?;

        let session_key2 = self.digest(temp_key.value())?;
        let mut encrypted = [0; PRIV_PLAINTEXT_LEN];
        for (i, out) in encrypted.iter_mut().enumerate() {
            let pad = if i < KEY_LEN {
                temp_key.value()[i]
            } else {
                session_key2[i - KEY_LEN]
            };
            *out = req.input_data[i] ^ pad;
        }

        let mut msg = ArrayVec::<u8, PRIV_MSG_LEN>::new();
        msg.write_bytes(temp_key.value())?;
        msg.write_bytes(&[opcode::PRIVWRITE, req.zone])?;
        msg.write_le(req.key_id)?;
        msg.write_bytes(&[req.sn[8]])?;
        msg.write_bytes(&req.sn[0..2])?;
        msg.write_bytes(&ZEROS[..21])?;
        msg.write_bytes(req.input_data)?;
        let auth_mac = self.digest(&msg)?;

        Ok(PrivWriteAuth {
            encrypted,
            auth_mac,
        })
    }

    /// Encrypts a 32-byte write under an ECC204-family transport session
    /// key and computes its authorizing MAC.
    ///
    /// These parts have no TempKey flag register, so no preconditions
    /// apply; note the big-endian key id in the message.
    pub fn ecc204_write_auth_mac(
        &self,
        req: &WriteMac,
        session_key: &Key,
    ) -> Result<WriteAuth, Error> {
        self.require(Capability::WriteEnc)?;

        let mut encrypted = [0; KEY_LEN];
        for (i, out) in encrypted.iter_mut().enumerate() {
            *out = req.input_data[i] ^ session_key[i];
        }

        let auth_mac = self.write_mac_digest(
            session_key,
            req.zone,
            req.key_id.to_be_bytes(),
            req.input_data,
            req.sn,
        )?;
        Ok(WriteAuth {
            encrypted,
            auth_mac,
        })
    }

    fn write_mac_digest(
        &self,
        secret: &[u8; KEY_LEN],
        zone: u8,
        key_id_bytes: [u8; 2],
        plaintext: &[u8; KEY_LEN],
        sn: &SerialNumber,
    ) -> Result<sha256::Digest, Error> {
        let mut msg = ArrayVec::<u8, MSG_LEN>::new();
        msg.write_bytes(secret)?;
        msg.write_bytes(&[opcode::WRITE, zone])?;
        msg.write_bytes(&key_id_bytes)?;
        msg.write_bytes(&[sn[8]])?;
        msg.write_bytes(&sn[0..2])?;
        msg.write_bytes(&ZEROS[..25])?;
        msg.write_bytes(plaintext)?;
        self.digest(&msg)
    }
}
