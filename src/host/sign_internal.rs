// Copyright lowRISC contributors.
// Licensed under the Apache License, Version 2.0, see LICENSE for details.
// SPDX-License-Identifier: Apache-2.0

//! Host-side Sign(Internal) message construction.
//!
//! Sign(Internal) signs a message the device composes entirely from its
//! own state: TempKey, the addressed slot's configuration words, and,
//! packed into a single byte, the TempKey flag register itself. The host
//! must rebuild that message bit for bit to know what was signed; a
//! wrong flag bit here produces a message the device will later reject
//! during Verify.
//!
//! The same construction also yields the `OtherData` a subsequent
//! Verify(Validate/Invalidate) needs, so both outputs are produced
//! together.

use arrayvec::ArrayVec;

use crate::crypto::sha256;
use crate::device::Capability;
use crate::device::Device;
use crate::host::opcode;
use crate::host::Engine;
use crate::host::Error;
use crate::host::SerialNumber;
use crate::host::Source;
use crate::host::TempKey;
use crate::io::Read as _;
use crate::io::Write as _;

/// The length of the Sign(Internal) message.
pub const MSG_LEN: usize = 55;

/// The length of the derived Verify `OtherData`.
pub const OTHER_DATA_LEN: usize = 19;

/// The length of a full configuration zone.
pub const CONFIG_ZONE_LEN: usize = 128;

/// The mode bit including the full serial number in the message.
pub const MODE_INCLUDE_SN: u8 = 0x40;

/// Parameters for rebuilding a Sign(Internal) message.
#[derive(Copy, Clone, Debug)]
pub struct SignInternal<'a> {
    /// The mode byte the command ran with.
    pub mode: u8,
    /// The key slot the command addressed.
    pub key_id: u16,
    /// SlotConfig of the slot TempKey was built from.
    pub slot_config: u16,
    /// KeyConfig of the slot TempKey was built from.
    pub key_config: u16,
    /// UseFlag of that slot (ATECC108A only).
    pub use_flag: u8,
    /// UpdateCount of that slot (ATECC108A only).
    pub update_count: u8,
    /// Whether that slot is locked.
    pub is_slot_locked: bool,
    /// Whether the signature is destined for Verify(Invalidate).
    pub for_invalidate: bool,
    /// The device serial number.
    pub sn: &'a SerialNumber,
}

/// The rebuilt Sign(Internal) message and its derived outputs.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct SignedMessage {
    /// The full 55-byte message the device signed.
    pub message: [u8; MSG_LEN],
    /// The `OtherData` a later Verify(Validate/Invalidate) requires.
    pub verify_other_data: [u8; OTHER_DATA_LEN],
    /// The SHA-256 digest of the message (the value actually signed).
    pub digest: sha256::Digest,
}

impl<'a> SignInternal<'a> {
    /// Populates the configuration-derived fields from a raw config zone.
    ///
    /// Reads SlotConfig, KeyConfig, the use-flag bytes (ATECC108A), and
    /// the slot-locked bitfield for the slot recorded in `temp_key`.
    pub fn load_config(
        &mut self,
        device: Device,
        temp_key: &TempKey,
        config: &[u8; CONFIG_ZONE_LEN],
    ) -> Result<(), Error> {
        let slot = usize::from(temp_key.key_id() & 0x0F);

        let mut r = &config[20 + slot * 2..];
        self.slot_config = r.read_le::<u16>()?;
        let mut r = &config[96 + slot * 2..];
        self.key_config = r.read_le::<u16>()?;

        if device == Device::Ecc108a && slot < 8 {
            self.use_flag = config[52 + slot * 2];
            self.update_count = config[53 + slot * 2];
        } else {
            self.use_flag = 0x00;
            self.update_count = 0x00;
        }

        let mut r = &config[88..];
        let slot_locked = r.read_le::<u16>()?;
        // In the SlotLocked field a set bit means "unlocked".
        self.is_slot_locked = slot_locked & (1 << slot) == 0;
        Ok(())
    }
}

impl<B: sha256::Builder> Engine<B> {
    /// Rebuilds the message a Sign(Internal) command signed.
    ///
    /// `temp_key` contributes both its value and its packed flag byte; it
    /// is read, never consumed.
    pub fn sign_internal(
        &self,
        req: &SignInternal,
        temp_key: &TempKey,
    ) -> Result<SignedMessage, Error> {
        self.require(Capability::SignInternal)?;

        let include_sn = req.mode & MODE_INCLUDE_SN == MODE_INCLUDE_SN;

        let mut msg = ArrayVec::<u8, MSG_LEN>::new();
        msg.write_bytes(temp_key.value())?;
        msg.write_bytes(&[opcode::SIGN, req.mode])?;
        msg.write_le(req.key_id)?;
        msg.write_le(req.slot_config)?;
        msg.write_le(req.key_config)?;

        // The TempKey flag register, packed exactly as the hardware does:
        // b0-3 keyId, b4 sourceFlag, b5 GenDigData, b6 GenKeyData,
        // b7 NoMacFlag.
        let mut flags = temp_key.key_id() & 0x0F;
        if temp_key.source() == Source::Input {
            flags |= 1 << 4;
        }
        if temp_key.gen_dig_data() {
            flags |= 1 << 5;
        }
        if temp_key.gen_key_data() {
            flags |= 1 << 6;
        }
        if temp_key.no_mac() {
            flags |= 1 << 7;
        }
        msg.write_bytes(&[flags])?;

        if self.profile.device() == Device::Ecc108a && temp_key.key_id() < 8 {
            msg.write_bytes(&[req.use_flag, req.update_count])?;
        } else {
            msg.write_bytes(&[0x00, 0x00])?;
        }

        msg.write_bytes(&[req.sn[8]])?;
        if include_sn {
            msg.write_bytes(&req.sn[4..8])?;
        } else {
            msg.write_bytes(&[0; 4])?;
        }
        msg.write_bytes(&req.sn[0..2])?;
        if include_sn {
            msg.write_bytes(&req.sn[2..4])?;
        } else {
            msg.write_bytes(&[0; 2])?;
        }

        // The slot-locked bit is inverted on the wire: 0 means locked.
        msg.write_bytes(&[if req.is_slot_locked { 0x00 } else { 0x01 }])?;
        msg.write_bytes(&[if req.for_invalidate { 0x01 } else { 0x00 }])?;
        msg.write_bytes(&[0x00])?;

        let mut message = [0; MSG_LEN];
        message.copy_from_slice(&msg);

        let mut verify_other_data = [0; OTHER_DATA_LEN];
        verify_other_data[0..10].copy_from_slice(&message[33..43]);
        verify_other_data[10..14].copy_from_slice(&message[44..48]);
        verify_other_data[14..19].copy_from_slice(&message[50..55]);

        let digest = self.digest(&message)?;
        Ok(SignedMessage {
            message,
            verify_other_data,
            digest,
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::device::Device;
    use crate::host::gen_dig::GenDig;
    use crate::host::gen_dig::GenDigZone;
    use crate::host::test_util::*;

    fn base_req<'a>() -> SignInternal<'a> {
        SignInternal {
            mode: 0x00,
            key_id: 0x0000,
            slot_config: 0x8320,
            key_config: 0x3300,
            use_flag: 0x00,
            update_count: 0x00,
            is_slot_locked: false,
            for_invalidate: false,
            sn: &SN,
        }
    }

    /// Builds a TempKey whose flag register has GenDigData set for slot 5.
    fn gen_dig_tempkey(engine: &crate::host::Engine<crate::crypto::ring::Builder>) -> TempKey {
        let mut tk = random_tempkey(engine);
        let stored = [0x2e; 32];
        engine
            .gen_dig(
                &GenDig {
                    zone: GenDigZone::Data,
                    key_id: 5,
                    slot_conf: 0,
                    key_conf: 0,
                    slot_locked: 0,
                    counter: 0,
                    is_key_nomac: false,
                    sn: &SN,
                    stored_value: Some(&stored),
                    other_data: None,
                },
                &mut tk,
            )
            .unwrap();
        tk
    }

    #[test]
    fn message_matches_layout() {
        let engine = engine(Device::Ecc608);
        let tk = gen_dig_tempkey(&engine);
        let out = engine.sign_internal(&base_req(), &tk).unwrap();

        let mut expected = [0u8; MSG_LEN];
        expected[0..32].copy_from_slice(tk.value());
        expected[32] = 0x41;
        expected[33] = 0x00;
        expected[34..36].copy_from_slice(&[0x00, 0x00]);
        expected[36..38].copy_from_slice(&[0x20, 0x83]);
        expected[38..40].copy_from_slice(&[0x00, 0x33]);
        // Slot 5, Random source, GenDigData set.
        expected[40] = 0x25;
        expected[43] = SN[8];
        expected[48..50].copy_from_slice(&SN[0..2]);
        expected[52] = 0x01;
        assert_eq!(out.message, expected);
        assert_eq!(out.digest, sha256_concat(&[&expected]));
    }

    #[test]
    fn other_data_is_extracted_from_message() {
        let engine = engine(Device::Ecc608);
        let tk = gen_dig_tempkey(&engine);
        let mut req = base_req();
        req.mode = MODE_INCLUDE_SN;
        let out = engine.sign_internal(&req, &tk).unwrap();

        assert_eq!(out.verify_other_data[0..10], out.message[33..43]);
        assert_eq!(out.verify_other_data[10..14], out.message[44..48]);
        assert_eq!(out.verify_other_data[14..19], out.message[50..55]);
    }

    #[test]
    fn include_sn_embeds_full_serial() {
        let engine = engine(Device::Ecc608);
        let tk = gen_dig_tempkey(&engine);
        let mut req = base_req();
        req.mode = MODE_INCLUDE_SN;
        let out = engine.sign_internal(&req, &tk).unwrap();
        assert_eq!(out.message[44..48], SN[4..8]);
        assert_eq!(out.message[50..52], SN[2..4]);
    }

    #[test]
    fn use_flags_only_apply_to_108a_low_slots() {
        let mut req = base_req();
        req.use_flag = 0xaa;
        req.update_count = 0xbb;

        let engine608 = engine(Device::Ecc608);
        let tk = gen_dig_tempkey(&engine608);
        let out = engine608.sign_internal(&req, &tk).unwrap();
        assert_eq!(out.message[41..43], [0x00, 0x00]);

        let engine108 = engine(Device::Ecc108a);
        let tk = gen_dig_tempkey(&engine108);
        let out = engine108.sign_internal(&req, &tk).unwrap();
        assert_eq!(out.message[41..43], [0xaa, 0xbb]);
    }

    #[test]
    fn load_config_reads_slot_words() {
        let engine = engine(Device::Ecc108a);
        let tk = gen_dig_tempkey(&engine);
        let mut config = [0u8; CONFIG_ZONE_LEN];
        // Slot 5 entries.
        config[30] = 0x20;
        config[31] = 0x83;
        config[106] = 0x00;
        config[107] = 0x33;
        config[62] = 0x0a;
        config[63] = 0x0b;
        // SlotLocked: bit 5 set means unlocked.
        config[88] = 0x20;

        let mut req = base_req();
        req.load_config(Device::Ecc108a, &tk, &config).unwrap();
        assert_eq!(req.slot_config, 0x8320);
        assert_eq!(req.key_config, 0x3300);
        assert_eq!(req.use_flag, 0x0a);
        assert_eq!(req.update_count, 0x0b);
        assert!(!req.is_slot_locked);

        config[88] = 0x00;
        req.load_config(Device::Ecc108a, &tk, &config).unwrap();
        assert!(req.is_slot_locked);
    }
}
