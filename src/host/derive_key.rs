// Copyright lowRISC contributors.
// Licensed under the Apache License, Version 2.0, see LICENSE for details.
// SPDX-License-Identifier: Apache-2.0

//! Host-side DeriveKey computation.
//!
//! DeriveKey replaces a target slot with a digest of its parent key and
//! the current TempKey. The host reproduces that digest here so it can
//! keep using the slot afterward. Whether the operation "rolls" a key
//! (parent and target are the same slot) or "creates" one is a call-site
//! distinction; the computation is identical either way.

use arrayvec::ArrayVec;

use crate::crypto::sha256;
use crate::device::Capability;
use crate::host::opcode;
use crate::host::tempkey::Gate;
use crate::host::Engine;
use crate::host::Error;
use crate::host::Key;
use crate::host::SerialNumber;
use crate::host::Source;
use crate::host::TempKey;
use crate::host::KEY_ID_MAX;
use crate::host::ZEROS;
use crate::io::Write as _;

/// The length of the digested DeriveKey message.
const MSG_LEN: usize = 96;

/// The length of the DeriveKey input-MAC message.
const MAC_MSG_LEN: usize = 39;

/// Parameters for a host-side key derivation.
#[derive(Copy, Clone, Debug)]
pub struct DeriveKey<'a> {
    /// The TempKey provenance the command declared (mode bit 2).
    pub source: Source,
    /// The slot being rewritten.
    pub target_key_id: u16,
    /// The parent key feeding the derivation.
    pub parent_key: &'a Key,
    /// The device serial number.
    pub sn: &'a SerialNumber,
}

/// Parameters for the DeriveKey input MAC.
///
/// Required when the target slot's configuration demands an authorizing
/// MAC from the parent key.
#[derive(Copy, Clone, Debug)]
pub struct DeriveKeyMac<'a> {
    /// The TempKey provenance the command declared (mode bit 2).
    pub source: Source,
    /// The slot being rewritten.
    pub target_key_id: u16,
    /// The parent key authorizing the derivation.
    pub parent_key: &'a Key,
    /// The device serial number.
    pub sn: &'a SerialNumber,
}

/// Renders the DeriveKey mode byte: bit 2 declares the source flag.
fn mode_byte(source: Source) -> u8 {
    match source {
        Source::Random => 0x00,
        Source::Input => 0x04,
    }
}

impl<B: sha256::Builder> Engine<B> {
    /// Computes the key a DeriveKey command writes into its target slot.
    ///
    /// The TempKey must be valid, untainted, and of the declared
    /// provenance; it is consumed on success. The derived key is returned
    /// for the caller to store against the target slot.
    pub fn derive_key(&self, req: &DeriveKey, temp_key: &mut TempKey) -> Result<Key, Error> {
        self.require(Capability::DeriveKey)?;
        check!(req.target_key_id <= KEY_ID_MAX, Error::BadParameter);

        temp_key.gate(Gate {
            no_mac_clear: true,
            source: Some(req.source),
            ..Gate::default()
        })?;

        let mut msg = ArrayVec::<u8, MSG_LEN>::new();
        msg.write_bytes(req.parent_key)?;
        msg.write_bytes(&[opcode::DERIVE_KEY, mode_byte(req.source)])?;
        msg.write_le(req.target_key_id)?;
        msg.write_bytes(&[req.sn[8]])?;
        msg.write_bytes(&req.sn[0..2])?;
        msg.write_bytes(&ZEROS[..25])?;
        msg.write_bytes(temp_key.value())?;

        let derived = self.digest(&msg)?;
        temp_key.consume();
        Ok(derived)
    }

    /// Computes the input MAC a slot-config-protected DeriveKey requires.
    pub fn derive_key_mac(&self, req: &DeriveKeyMac) -> Result<sha256::Digest, Error> {
        self.require(Capability::DeriveKey)?;
        check!(req.target_key_id <= KEY_ID_MAX, Error::BadParameter);

        let mut msg = ArrayVec::<u8, MAC_MSG_LEN>::new();
        msg.write_bytes(req.parent_key)?;
        msg.write_bytes(&[opcode::DERIVE_KEY, mode_byte(req.source)])?;
        msg.write_le(req.target_key_id)?;
        msg.write_bytes(&[req.sn[8]])?;
        msg.write_bytes(&req.sn[0..2])?;
        self.digest(&msg)
    }
}
