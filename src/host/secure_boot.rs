// Copyright lowRISC contributors.
// Licensed under the Apache License, Version 2.0, see LICENSE for details.
// SPDX-License-Identifier: Apache-2.0

//! Host-side SecureBoot support.
//!
//! In the encrypted-digest/validating-MAC option, the host hides the
//! firmware digest from the bus by XOR-ing it with a key derived from the
//! IO protection key and the current TempKey, and checks the MAC the
//! device returns over the same derived key.
//!
//! The response MAC normally covers the ECDSA signature as well. The one
//! exception is preserved verbatim from the hardware: the signature is
//! omitted if and only if the command ran in FullStore mode *and* the
//! configuration zone's SecureBootMode is FullDig.

use crate::crypto::sha256;
use crate::crypto::sha256::Hasher as _;
use crate::device::Capability;
use crate::host::opcode;
use crate::host::Engine;
use crate::host::Error;
use crate::host::Key;
use crate::host::TempKey;

/// The length of a SecureBoot firmware digest.
pub const DIGEST_LEN: usize = 32;

/// The length of a SecureBoot ECDSA signature.
pub const SIGNATURE_LEN: usize = 64;

/// The mode-byte mask selecting the SecureBoot mode proper.
const MODE_MASK: u8 = 0x07;

/// SecureBoot FullStore mode.
pub const MODE_FULL_STORE: u8 = 0x06;

/// The SecureBootConfig mask selecting the configured mode.
const CONFIG_MODE_MASK: u16 = 0x0003;

/// SecureBootConfig FullDig mode.
pub const CONFIG_MODE_FULL_DIG: u16 = 0x0003;

/// An encrypted SecureBoot digest and the key that produced it.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct EncryptedDigest {
    /// `SHA256(io_key ‖ TempKey)`, needed again for the response MAC.
    pub hashed_key: Key,
    /// The firmware digest XOR-ed with `hashed_key`.
    pub digest_enc: [u8; DIGEST_LEN],
}

/// Parameters for the expected SecureBoot response MAC.
#[derive(Copy, Clone, Debug)]
pub struct SecureBootMac<'a> {
    /// The mode byte the command ran with.
    pub mode: u8,
    /// The command's second parameter.
    pub param2: u16,
    /// The device's SecureBootConfig word from the configuration zone.
    pub secure_boot_config: u16,
    /// The derived key from [`Engine::secure_boot_enc()`].
    ///
    /// [`Engine::secure_boot_enc()`]: ../struct.Engine.html#method.secure_boot_enc
    pub hashed_key: &'a Key,
    /// The firmware digest being validated.
    pub digest: &'a [u8; DIGEST_LEN],
    /// The ECDSA signature; required unless the FullStore/FullDig
    /// exception applies.
    pub signature: Option<&'a [u8; SIGNATURE_LEN]>,
}

impl<B: sha256::Builder> Engine<B> {
    /// Encrypts a firmware digest for the SecureBoot command.
    ///
    /// Returns both the ciphertext and the derived key, which the caller
    /// will need again to check the response MAC.
    pub fn secure_boot_enc(
        &self,
        io_key: &Key,
        temp_key: &TempKey,
        digest: &[u8; DIGEST_LEN],
    ) -> Result<EncryptedDigest, Error> {
        self.require(Capability::SecureBoot)?;

        let mut hasher = self.hasher()?;
        hasher.write(io_key)?;
        hasher.write(temp_key.value())?;
        let mut hashed_key = Key::default();
        hasher.finish(&mut hashed_key)?;

        let mut digest_enc = [0; DIGEST_LEN];
        for (i, out) in digest_enc.iter_mut().enumerate() {
            *out = digest[i] ^ hashed_key[i];
        }

        Ok(EncryptedDigest {
            hashed_key,
            digest_enc,
        })
    }

    /// Computes the MAC a successful SecureBoot command returns.
    ///
    /// Compare the result against the device's actual response to
    /// authenticate the verdict.
    pub fn secure_boot_mac(&self, req: &SecureBootMac) -> Result<sha256::Digest, Error> {
        self.require(Capability::SecureBoot)?;

        let omit_signature = req.mode & MODE_MASK == MODE_FULL_STORE
            && req.secure_boot_config & CONFIG_MODE_MASK == CONFIG_MODE_FULL_DIG;

        let mut hasher = self.hasher()?;
        hasher.write(req.hashed_key)?;
        hasher.write(req.digest)?;
        if !omit_signature {
            let signature = req.signature.ok_or(Error::BadParameter)?;
            hasher.write(signature)?;
        }
        hasher.write(&[
            opcode::SECUREBOOT,
            req.mode,
            (req.param2 & 0xFF) as u8,
            (req.param2 >> 8) as u8,
        ])?;

        let mut mac = sha256::Digest::default();
        hasher.finish(&mut mac)?;
        Ok(mac)
    }
}
