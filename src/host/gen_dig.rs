// Copyright lowRISC contributors.
// Licensed under the Apache License, Version 2.0, see LICENSE for details.
// SPDX-License-Identifier: Apache-2.0

//! Host-side GenDig computation.
//!
//! GenDig combines the current TempKey with a stored value (a data slot,
//! an OTP or configuration block, a counter, or a second nonce) to prove
//! knowledge of that value without revealing it. Each application rolls
//! the TempKey forward while keeping it valid, so several GenDigs may be
//! chained within one round.
//!
//! The first 32-byte block and the 25-byte reserved tail are both
//! zone-dependent, and two zones additionally rewrite the opcode/parameter
//! bytes; the branches below are deliberately spelled out one-to-one with
//! the hardware rather than generalized.

use arrayvec::ArrayVec;

use crate::crypto::sha256;
use crate::device::Capability;
use crate::host::opcode;
use crate::host::tempkey::Gate;
use crate::host::Engine;
use crate::host::Error;
use crate::host::SerialNumber;
use crate::host::TempKey;
use crate::host::KEY_LEN;
use crate::host::ZEROS;
use crate::io::Write as _;

/// The length of the digested GenDig message.
pub(crate) const MSG_LEN: usize = 96;

/// The key-id bit selecting TempKey as the shared-nonce input block.
const USE_TEMPKEY_BIT: u16 = 0x8000;

/// The zone a GenDig command operates on.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum GenDigZone {
    /// The configuration zone.
    Config = 0,
    /// The OTP zone.
    Otp = 1,
    /// A data slot.
    Data = 2,
    /// A second nonce shared between host and device.
    SharedNonce = 3,
    /// A monotonic counter.
    Counter = 4,
    /// A slot's configuration words.
    KeyConfig = 5,
}

/// Parameters for a host-side GenDig computation.
#[derive(Copy, Clone, Debug)]
pub struct GenDig<'a> {
    /// The zone the command addressed.
    pub zone: GenDigZone,
    /// The key slot (or zone-specific index) the command addressed.
    pub key_id: u16,
    /// The addressed slot's SlotConfig word; used by the key-config zone.
    pub slot_conf: u16,
    /// The addressed slot's KeyConfig word; used by the key-config zone.
    pub key_conf: u16,
    /// The slot-locked byte; used by the key-config zone.
    pub slot_locked: u8,
    /// The counter value; used by the counter zone.
    pub counter: u32,
    /// Whether the addressed slot has SlotConfig.NoMac set.
    pub is_key_nomac: bool,
    /// The device serial number.
    pub sn: &'a SerialNumber,
    /// The stored value being proven; required for the config, OTP, and
    /// data zones.
    pub stored_value: Option<&'a [u8; KEY_LEN]>,
    /// Auxiliary data: the 32-byte second nonce for the shared-nonce zone,
    /// or the 4 opcode/parameter bytes for NoMac slots.
    pub other_data: Option<&'a [u8]>,
}

/// Parameters for a session-key MAC over written plaintext.
///
/// This is GenDig's sibling: the same message shape keyed by the Write
/// command, used when a plaintext block is carried under a session key.
#[derive(Copy, Clone, Debug)]
pub struct GenMac<'a> {
    /// The Write command's zone byte.
    pub zone: u8,
    /// The key slot the command addressed.
    pub key_id: u16,
    /// The device serial number.
    pub sn: &'a SerialNumber,
    /// The plaintext carried by the Write.
    pub plaintext: &'a [u8; KEY_LEN],
}

impl<B: sha256::Builder> Engine<B> {
    /// Mirrors a completed GenDig command into `temp_key`.
    ///
    /// The caller must know the stored value the device combined; the
    /// resulting TempKey matches the device's and remains valid.
    pub fn gen_dig(&self, req: &GenDig, temp_key: &mut TempKey) -> Result<(), Error> {
        self.require(Capability::GenDig)?;

        let nomac_data = req.zone == GenDigZone::Data && req.is_key_nomac;
        check!(
            !matches!(
                req.zone,
                GenDigZone::Config | GenDigZone::Otp | GenDigZone::Data
            ) || req.stored_value.is_some(),
            Error::BadParameter
        );
        if req.zone == GenDigZone::SharedNonce {
            check!(
                req.other_data.map_or(false, |od| od.len() >= KEY_LEN),
                Error::BadParameter
            );
        } else if nomac_data {
            check!(
                req.other_data.map_or(false, |od| od.len() >= 4),
                Error::BadParameter
            );
        }

        let mut msg = ArrayVec::<u8, MSG_LEN>::new();

        // (1) The 32-byte input block.
        match req.zone {
            GenDigZone::SharedNonce => {
                if req.key_id & USE_TEMPKEY_BIT == USE_TEMPKEY_BIT {
                    msg.write_bytes(temp_key.value())?;
                } else {
                    msg.write_bytes(&other_block(req)?)?;
                }
            }
            GenDigZone::Counter | GenDigZone::KeyConfig => {
                msg.write_bytes(&ZEROS[..KEY_LEN])?;
            }
            _ => msg.write_bytes(req.stored_value.ok_or(Error::Internal)?)?,
        }

        // (2)-(4) Opcode and parameters. NoMac slots substitute the four
        // bytes the client saw; the shared-nonce zone zeroes the key id's
        // high byte.
        if nomac_data {
            msg.write_bytes(&req.other_data.ok_or(Error::Internal)?[..4])?;
        } else {
            msg.write_bytes(&[opcode::GENDIG, req.zone as u8, (req.key_id & 0xFF) as u8])?;
            if req.zone == GenDigZone::SharedNonce {
                msg.write_bytes(&[0x00])?;
            } else {
                msg.write_bytes(&[(req.key_id >> 8) as u8])?;
            }
        }

        // (5)-(6) Serial number binding.
        msg.write_bytes(&[req.sn[8]])?;
        msg.write_bytes(&req.sn[0..2])?;

        // (7) The 25-byte zone-dependent tail.
        match req.zone {
            GenDigZone::Counter => {
                msg.write_bytes(&[0x00])?;
                msg.write_le(req.counter)?;
                msg.write_bytes(&ZEROS[..20])?;
            }
            GenDigZone::KeyConfig => {
                msg.write_bytes(&[0x00])?;
                msg.write_le(req.slot_conf)?;
                msg.write_le(req.key_conf)?;
                msg.write_bytes(&[req.slot_locked])?;
                msg.write_bytes(&ZEROS[..19])?;
            }
            _ => msg.write_bytes(&ZEROS[..25])?,
        }

        // (8) The closing 32-byte block.
        if req.zone == GenDigZone::SharedNonce && req.key_id & USE_TEMPKEY_BIT == USE_TEMPKEY_BIT {
            msg.write_bytes(&other_block(req)?)?;
        } else {
            msg.write_bytes(temp_key.value())?;
        }

        let digest = self.digest(&msg)?;
        let data_slot = (req.zone == GenDigZone::Data).then(|| (req.key_id, req.is_key_nomac));
        temp_key.evolve_gen_dig(&digest, data_slot);
        trace!("gen_dig evolved TempKey; zone {:?}", req.zone);
        Ok(())
    }

    /// Computes a session-keyed MAC over written plaintext, evolving
    /// `temp_key` the way the device does.
    pub fn gen_mac(&self, req: &GenMac, temp_key: &mut TempKey) -> Result<(), Error> {
        self.require(Capability::GenDig)?;

        temp_key.gate(Gate {
            no_mac_clear: true,
            ..Gate::default()
        })?;

        let mut msg = ArrayVec::<u8, MSG_LEN>::new();
        msg.write_bytes(temp_key.value())?;
        msg.write_bytes(&[opcode::WRITE, req.zone])?;
        msg.write_le(req.key_id)?;
        msg.write_bytes(&[req.sn[8]])?;
        msg.write_bytes(&req.sn[0..2])?;
        msg.write_bytes(&ZEROS[..25])?;
        msg.write_bytes(req.plaintext)?;

        let digest = self.digest(&msg)?;
        let data_slot =
            (req.zone == GenDigZone::Data as u8).then(|| (req.key_id, false));
        temp_key.evolve_gen_dig(&digest, data_slot);
        Ok(())
    }
}

/// The 32-byte `other_data` block for the shared-nonce zone.
fn other_block(req: &GenDig) -> Result<[u8; KEY_LEN], Error> {
    use core::convert::TryInto as _;
    req.other_data
        .ok_or(Error::Internal)?
        .get(..KEY_LEN)
        .ok_or(Error::Internal)?
        .try_into()
        .map_err(|_| Error::Internal)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::device::Device;
    use crate::host::test_util::*;
    use crate::host::KEY_ID_MAX;

    const STORED: [u8; 32] = [0x2e; 32];

    fn base_req<'a>(zone: GenDigZone, key_id: u16) -> GenDig<'a> {
        GenDig {
            zone,
            key_id,
            slot_conf: 0,
            key_conf: 0,
            slot_locked: 0,
            counter: 0,
            is_key_nomac: false,
            sn: &SN,
            stored_value: Some(&STORED),
            other_data: None,
        }
    }

    #[test]
    fn data_zone_matches_layout() {
        let engine = engine(Device::Ecc608);
        let mut tk = random_tempkey(&engine);
        let prev = *tk.value();
        engine
            .gen_dig(&base_req(GenDigZone::Data, 5), &mut tk)
            .unwrap();

        let expected = sha256_concat(&[
            &STORED,
            &[0x15, 0x02, 0x05, 0x00],
            &[SN[8]],
            &SN[0..2],
            &[0; 25],
            &prev,
        ]);
        assert_eq!(tk.value(), &expected);
        assert!(tk.is_valid());
        assert!(tk.gen_dig_data());
        assert_eq!(tk.key_id(), 5);
    }

    #[test]
    fn gen_dig_chains_and_stays_valid() {
        let engine = engine(Device::Ecc608);
        let mut tk = random_tempkey(&engine);
        engine
            .gen_dig(&base_req(GenDigZone::Data, 5), &mut tk)
            .unwrap();
        engine
            .gen_dig(&base_req(GenDigZone::Otp, 0), &mut tk)
            .unwrap();
        assert!(tk.is_valid());
        // A non-data zone clears the slot tracking.
        assert!(!tk.gen_dig_data());
        assert_eq!(tk.key_id(), 0);
    }

    #[test]
    fn counter_zone_embeds_counter() {
        let engine = engine(Device::Ecc608);
        let mut tk = random_tempkey(&engine);
        let prev = *tk.value();
        let mut req = base_req(GenDigZone::Counter, 0);
        req.stored_value = None;
        req.counter = 0x0001_e240;
        engine.gen_dig(&req, &mut tk).unwrap();

        let expected = sha256_concat(&[
            &[0; 32],
            &[0x15, 0x04, 0x00, 0x00],
            &[SN[8]],
            &SN[0..2],
            &[0x00],
            &[0x40, 0xe2, 0x01, 0x00],
            &[0; 20],
            &prev,
        ]);
        assert_eq!(tk.value(), &expected);
    }

    #[test]
    fn key_config_zone_embeds_config_words() {
        let engine = engine(Device::Ecc608);
        let mut tk = random_tempkey(&engine);
        let prev = *tk.value();
        let mut req = base_req(GenDigZone::KeyConfig, 2);
        req.stored_value = None;
        req.slot_conf = 0x8320;
        req.key_conf = 0x3300;
        req.slot_locked = 0x01;
        engine.gen_dig(&req, &mut tk).unwrap();

        let expected = sha256_concat(&[
            &[0; 32],
            &[0x15, 0x05, 0x02, 0x00],
            &[SN[8]],
            &SN[0..2],
            &[0x00],
            &[0x20, 0x83],
            &[0x00, 0x33],
            &[0x01],
            &[0; 19],
            &prev,
        ]);
        assert_eq!(tk.value(), &expected);
    }

    #[test]
    fn shared_nonce_selects_blocks_by_high_bit() {
        let engine = engine(Device::Ecc608);
        let other = [0x61; 32];

        // High bit clear: other data leads, TempKey closes.
        let mut tk = random_tempkey(&engine);
        let prev = *tk.value();
        let mut req = base_req(GenDigZone::SharedNonce, 0x0000);
        req.other_data = Some(&other);
        engine.gen_dig(&req, &mut tk).unwrap();
        let expected = sha256_concat(&[
            &other,
            &[0x15, 0x03, 0x00, 0x00],
            &[SN[8]],
            &SN[0..2],
            &[0; 25],
            &prev,
        ]);
        assert_eq!(tk.value(), &expected);

        // High bit set: TempKey leads, other data closes.
        let mut tk = random_tempkey(&engine);
        let prev = *tk.value();
        let mut req = base_req(GenDigZone::SharedNonce, 0x8000);
        req.other_data = Some(&other);
        engine.gen_dig(&req, &mut tk).unwrap();
        let expected = sha256_concat(&[
            &prev,
            &[0x15, 0x03, 0x00, 0x00],
            &[SN[8]],
            &SN[0..2],
            &[0; 25],
            &other,
        ]);
        assert_eq!(tk.value(), &expected);
    }

    #[test]
    fn nomac_slot_substitutes_other_data() {
        let engine = engine(Device::Ecc608);
        let mut tk = random_tempkey(&engine);
        let prev = *tk.value();
        let other = [0x15, 0x02, 0x07, 0x00];
        let mut req = base_req(GenDigZone::Data, 7);
        req.is_key_nomac = true;
        req.other_data = Some(&other);
        engine.gen_dig(&req, &mut tk).unwrap();

        let expected = sha256_concat(&[
            &STORED,
            &other,
            &[SN[8]],
            &SN[0..2],
            &[0; 25],
            &prev,
        ]);
        assert_eq!(tk.value(), &expected);
        assert!(tk.no_mac());
    }

    #[test]
    fn out_of_range_slot_clears_tracking() {
        let engine = engine(Device::Ecc608);
        let mut tk = random_tempkey(&engine);
        engine
            .gen_dig(&base_req(GenDigZone::Data, KEY_ID_MAX + 1), &mut tk)
            .unwrap();
        assert!(!tk.gen_dig_data());
        assert_eq!(tk.key_id(), 0);
    }

    #[test]
    fn missing_stored_value_is_rejected() {
        let engine = engine(Device::Ecc608);
        let mut tk = random_tempkey(&engine);
        let mut req = base_req(GenDigZone::Data, 1);
        req.stored_value = None;
        assert_eq!(engine.gen_dig(&req, &mut tk), Err(Error::BadParameter));
        assert!(tk.is_valid());
    }

    #[test]
    fn gen_mac_requires_live_tempkey() {
        let engine = engine(Device::Ecc608);
        let mut tk = TempKey::new();
        let req = GenMac {
            zone: 0x02,
            key_id: 4,
            sn: &SN,
            plaintext: &STORED,
        };
        assert_eq!(engine.gen_mac(&req, &mut tk), Err(Error::ExecutionError));

        let mut tk = random_tempkey(&engine);
        let prev = *tk.value();
        engine.gen_mac(&req, &mut tk).unwrap();
        let expected = sha256_concat(&[
            &prev,
            &[0x12, 0x02, 0x04, 0x00],
            &[SN[8]],
            &SN[0..2],
            &[0; 25],
            &STORED,
        ]);
        assert_eq!(tk.value(), &expected);
        assert!(tk.is_valid());
        assert!(tk.gen_dig_data());
        assert_eq!(tk.key_id(), 4);
    }
}
