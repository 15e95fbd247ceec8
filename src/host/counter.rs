// Copyright lowRISC contributors.
// Licensed under the Apache License, Version 2.0, see LICENSE for details.
// SPDX-License-Identifier: Apache-2.0

//! Counter-match slot encoding.
//!
//! A slot configured for counter matching limits key use to a ceiling
//! stored in the slot itself. The ceiling is stored little-endian and
//! duplicated in the following word; the device rejects mismatched
//! copies, so both are produced here.

use crate::crypto::sha256;
use crate::device::Capability;
use crate::host::Engine;
use crate::host::Error;

/// The largest value a monotonic counter can reach.
pub const COUNTER_MAX: u32 = 2_097_151;

/// The length of an encoded counter-match value.
pub const COUNTER_MATCH_LEN: usize = 8;

impl<B: sha256::Builder> Engine<B> {
    /// Encodes a counter-match ceiling for storage in a slot.
    ///
    /// The value must be a multiple of 32 and no greater than
    /// [`COUNTER_MAX`].
    ///
    /// [`COUNTER_MAX`]: constant.COUNTER_MAX.html
    pub fn encode_counter_match(&self, value: u32) -> Result<[u8; COUNTER_MATCH_LEN], Error> {
        self.require(Capability::Counter)?;
        check!(value <= COUNTER_MAX, Error::BadParameter);
        check!(value % 32 == 0, Error::BadParameter);

        let mut out = [0; COUNTER_MATCH_LEN];
        out[0..4].copy_from_slice(&value.to_le_bytes());
        out[4..8].copy_from_slice(&value.to_le_bytes());
        Ok(out)
    }
}
