// Copyright lowRISC contributors.
// Licensed under the Apache License, Version 2.0, see LICENSE for details.
// SPDX-License-Identifier: Apache-2.0

//! Host-side decryption of protected command output.
//!
//! Two schemes live here. Encrypted Read XORs a 32-byte block with the
//! current TempKey, which must have been built by a data-zone GenDig over
//! a random nonce, and is spent by the operation like a one-time pad.
//! The ECC608's ECDH/KDF output protection instead derives a fresh pad
//! for every 32-byte block from the IO protection key and a sliding
//! 16-byte window of the output nonce, with no TempKey involvement.

use crate::crypto::sha256;
use crate::crypto::sha256::Hasher as _;
use crate::device::Capability;
use crate::host::tempkey::Gate;
use crate::host::Engine;
use crate::host::Error;
use crate::host::Key;
use crate::host::Source;
use crate::host::TempKey;
use crate::host::KEY_LEN;

/// The block size of the IO-protection scheme's nonce window.
const NONCE_WINDOW: usize = 16;

impl<B: sha256::Builder> Engine<B> {
    /// Decrypts a 32-byte encrypted Read in place.
    ///
    /// The TempKey must be valid, untainted, random-sourced, and produced
    /// by a data-zone GenDig; it is unconditionally consumed. This
    /// function cannot tell whether the GenDig used the slot's configured
    /// read key; feeding it a TempKey built from the wrong parent yields
    /// garbage, not an error.
    pub fn read_decrypt(
        &self,
        data: &mut [u8; KEY_LEN],
        temp_key: &mut TempKey,
    ) -> Result<(), Error> {
        self.require(Capability::Decrypt)?;

        temp_key.gate(Gate {
            no_mac_clear: true,
            source: Some(Source::Random),
            gen_dig: true,
        })?;

        for (out, pad) in data.iter_mut().zip(temp_key.value().iter()) {
            *out ^= pad;
        }
        temp_key.consume();
        Ok(())
    }

    /// Decrypts IO-protected ECDH/KDF output in place.
    ///
    /// `data` must be a whole number of 32-byte blocks, and `out_nonce`
    /// must supply 16 bytes per block.
    pub fn io_decrypt(
        &self,
        io_key: &Key,
        out_nonce: &[u8],
        data: &mut [u8],
    ) -> Result<(), Error> {
        self.require(Capability::Decrypt)?;
        check!(data.len() % KEY_LEN == 0, Error::BadParameter);
        let blocks = data.len() / KEY_LEN;
        check!(out_nonce.len() >= blocks * NONCE_WINDOW, Error::BadParameter);

        for block in 0..blocks {
            let mut hasher = self.hasher()?;
            hasher.write(io_key)?;
            hasher.write(&out_nonce[block * NONCE_WINDOW..(block + 1) * NONCE_WINDOW])?;
            let mut pad = sha256::Digest::default();
            hasher.finish(&mut pad)?;

            for (out, pad) in data[block * KEY_LEN..(block + 1) * KEY_LEN]
                .iter_mut()
                .zip(pad.iter())
            {
                *out ^= pad;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::device::Device;
    use crate::host::gen_dig::GenDig;
    use crate::host::gen_dig::GenDigZone;
    use crate::host::test_util::*;

    /// A TempKey in the exact state encrypted Read requires.
    fn read_key(engine: &crate::host::Engine<crate::crypto::ring::Builder>) -> TempKey {
        let mut tk = random_tempkey(engine);
        let read_key = [0x2e; 32];
        engine
            .gen_dig(
                &GenDig {
                    zone: GenDigZone::Data,
                    key_id: 4,
                    slot_conf: 0,
                    key_conf: 0,
                    slot_locked: 0,
                    counter: 0,
                    is_key_nomac: false,
                    sn: &SN,
                    stored_value: Some(&read_key),
                    other_data: None,
                },
                &mut tk,
            )
            .unwrap();
        tk
    }

    #[test]
    fn read_decrypt_xors_with_tempkey() {
        let engine = engine(Device::Ecc508a);
        let mut tk = read_key(&engine);
        let pad = *tk.value();
        let plain = [0xe1u8; 32];
        let mut data = [0u8; 32];
        for i in 0..32 {
            data[i] = plain[i] ^ pad[i];
        }

        engine.read_decrypt(&mut data, &mut tk).unwrap();
        assert_eq!(data, plain);
        assert!(!tk.is_valid());
    }

    #[test]
    fn read_decrypt_is_one_shot() {
        let engine = engine(Device::Ecc508a);
        let mut tk = read_key(&engine);
        let mut data = [0u8; 32];
        engine.read_decrypt(&mut data, &mut tk).unwrap();

        // The pad is spent; a second use must be refused.
        assert_eq!(
            engine.read_decrypt(&mut data, &mut tk),
            Err(Error::ExecutionError)
        );
    }

    #[test]
    fn read_decrypt_requires_gen_dig_provenance() {
        let engine = engine(Device::Ecc508a);
        // A bare nonce has no GenDig provenance.
        let mut tk = random_tempkey(&engine);
        let mut data = [0u8; 32];
        assert_eq!(
            engine.read_decrypt(&mut data, &mut tk),
            Err(Error::ExecutionError)
        );
        assert!(!tk.is_valid());
    }

    #[test]
    fn read_decrypt_requires_random_source() {
        let engine = engine(Device::Ecc508a);
        let mut tk = input_tempkey(&engine, &[0x44; 32]);
        let mut data = [0u8; 32];
        assert_eq!(
            engine.read_decrypt(&mut data, &mut tk),
            Err(Error::ExecutionError)
        );
    }

    #[test]
    fn io_decrypt_derives_per_block_pads() {
        let engine = engine(Device::Ecc608);
        let io_key: Key = [0x1f; 32];
        let out_nonce: [u8; 32] = {
            let mut n = [0; 32];
            for (i, byte) in n.iter_mut().enumerate() {
                *byte = i as u8;
            }
            n
        };
        let plain = [0x3cu8; 64];

        let pad0 = sha256_concat(&[&io_key, &out_nonce[0..16]]);
        let pad1 = sha256_concat(&[&io_key, &out_nonce[16..32]]);
        let mut data = [0u8; 64];
        for i in 0..32 {
            data[i] = plain[i] ^ pad0[i];
            data[32 + i] = plain[32 + i] ^ pad1[i];
        }

        engine.io_decrypt(&io_key, &out_nonce, &mut data).unwrap();
        assert_eq!(&data[..], &plain[..]);
    }

    #[test]
    fn io_decrypt_rejects_ragged_data() {
        let engine = engine(Device::Ecc608);
        let io_key: Key = [0; 32];
        let mut data = [0u8; 33];
        assert_eq!(
            engine.io_decrypt(&io_key, &[0; 32], &mut data),
            Err(Error::BadParameter)
        );
    }

    #[test]
    fn io_decrypt_requires_enough_nonce() {
        let engine = engine(Device::Ecc608);
        let io_key: Key = [0; 32];
        let mut data = [0u8; 64];
        assert_eq!(
            engine.io_decrypt(&io_key, &[0; 16], &mut data),
            Err(Error::BadParameter)
        );
    }
}
