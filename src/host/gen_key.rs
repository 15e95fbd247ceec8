// Copyright lowRISC contributors.
// Licensed under the Apache License, Version 2.0, see LICENSE for details.
// SPDX-License-Identifier: Apache-2.0

//! Host-side GenKey public-key digest.
//!
//! GenKey's digest modes fold a public key into TempKey, binding a
//! subsequent Sign(Internal) or Verify to that key. The 128-byte message
//! is mostly zero padding: the public key is right-aligned at the end, and
//! the middle three bytes come from the command parameters, or from
//! caller-supplied `OtherData` in the stored-pubkey-digest mode.

use arrayvec::ArrayVec;

use crate::crypto::sha256;
use crate::device::Capability;
use crate::host::opcode;
use crate::host::Engine;
use crate::host::Error;
use crate::host::SerialNumber;
use crate::host::TempKey;
use crate::host::ZEROS;
use crate::io::Write as _;

/// The length of the digested GenKey message.
const MSG_LEN: usize = 128;

/// The mode bit requesting a digest of a newly generated key.
pub const MODE_DIGEST: u8 = 0x08;

/// The mode bit requesting a digest of a stored public key; takes
/// priority over [`MODE_DIGEST`].
///
/// [`MODE_DIGEST`]: constant.MODE_DIGEST.html
pub const MODE_PUBKEY_DIGEST: u8 = 0x10;

/// The largest public key a GenKey message can carry.
pub const PUBLIC_KEY_MAX_LEN: usize = 88;

/// Parameters for a host-side GenKey digest.
#[derive(Copy, Clone, Debug)]
pub struct GenKeyDigest<'a> {
    /// The mode byte the command ran with.
    pub mode: u8,
    /// The key slot the command addressed.
    pub key_id: u16,
    /// The public key the device digested, 1 to 88 bytes.
    pub public_key: &'a [u8],
    /// Replacement mode/parameter bytes for the stored-pubkey mode.
    pub other_data: Option<&'a [u8; 3]>,
    /// The device serial number.
    pub sn: &'a SerialNumber,
}

impl<B: sha256::Builder> Engine<B> {
    /// Mirrors a GenKey digest into `temp_key`.
    ///
    /// A mode with neither digest bit set is a successful no-op, matching
    /// the device: no digest was requested, and TempKey is untouched.
    pub fn gen_key_digest(&self, req: &GenKeyDigest, temp_key: &mut TempKey) -> Result<(), Error> {
        self.require(Capability::GenKey)?;
        check!(
            !req.public_key.is_empty() && req.public_key.len() <= PUBLIC_KEY_MAX_LEN,
            Error::BadParameter
        );

        let mut msg = ArrayVec::<u8, MSG_LEN>::new();
        msg.write_bytes(temp_key.value())?;
        msg.write_bytes(&[opcode::GENKEY])?;

        if req.mode & MODE_PUBKEY_DIGEST == MODE_PUBKEY_DIGEST {
            let other_data = req.other_data.ok_or(Error::BadParameter)?;
            msg.write_bytes(other_data)?;
        } else if req.mode & MODE_DIGEST == MODE_DIGEST {
            msg.write_bytes(&[req.mode])?;
            msg.write_le(req.key_id)?;
        } else {
            // No digest was requested; TempKey is unchanged.
            return Ok(());
        }

        msg.write_bytes(&[req.sn[8]])?;
        msg.write_bytes(&req.sn[0..2])?;

        // Zero fill, with the public key right-aligned at the end.
        let pad = MSG_LEN - msg.len() - req.public_key.len();
        let mut remaining = pad;
        while remaining > 0 {
            let n = remaining.min(ZEROS.len());
            msg.write_bytes(&ZEROS[..n])?;
            remaining -= n;
        }
        msg.write_bytes(req.public_key)?;

        let digest = self.digest(&msg)?;
        temp_key.evolve_gen_key(&digest, req.key_id);
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::device::Device;
    use crate::host::test_util::*;

    #[test]
    fn digest_mode_matches_layout() {
        let engine = engine(Device::Ecc608);
        let mut tk = random_tempkey(&engine);
        let prev = *tk.value();
        let public_key = [0xab; 64];
        engine
            .gen_key_digest(
                &GenKeyDigest {
                    mode: MODE_DIGEST,
                    key_id: 0x0002,
                    public_key: &public_key,
                    other_data: None,
                    sn: &SN,
                },
                &mut tk,
            )
            .unwrap();

        let expected = sha256_concat(&[
            &prev,
            &[0x40, 0x08, 0x02, 0x00],
            &[SN[8]],
            &SN[0..2],
            &[0; 128 - 39 - 64],
            &public_key,
        ]);
        assert_eq!(tk.value(), &expected);
        assert!(tk.is_valid());
        assert!(tk.gen_key_data());
        assert!(!tk.gen_dig_data());
        assert_eq!(tk.key_id(), 2);
    }

    #[test]
    fn stored_pubkey_mode_uses_other_data() {
        let engine = engine(Device::Ecc608);
        let mut tk = random_tempkey(&engine);
        let prev = *tk.value();
        let public_key = [0xcd; 64];
        let other_data = [0x10, 0x05, 0x00];
        engine
            .gen_key_digest(
                &GenKeyDigest {
                    // The stored-pubkey bit wins even with the digest bit
                    // set.
                    mode: MODE_PUBKEY_DIGEST | MODE_DIGEST,
                    key_id: 0x0005,
                    public_key: &public_key,
                    other_data: Some(&other_data),
                    sn: &SN,
                },
                &mut tk,
            )
            .unwrap();

        let expected = sha256_concat(&[
            &prev,
            &[0x40],
            &other_data,
            &[SN[8]],
            &SN[0..2],
            &[0; 128 - 39 - 64],
            &public_key,
        ]);
        assert_eq!(tk.value(), &expected);
    }

    #[test]
    fn key_id_is_masked_to_low_nibble() {
        let engine = engine(Device::Ecc608);
        let mut tk = random_tempkey(&engine);
        engine
            .gen_key_digest(
                &GenKeyDigest {
                    mode: MODE_DIGEST,
                    key_id: 0x0012,
                    public_key: &[0xab; 64],
                    other_data: None,
                    sn: &SN,
                },
                &mut tk,
            )
            .unwrap();
        // Only the low four bits are retained; 0x12 becomes 0x02.
        assert_eq!(tk.key_id(), 0x02);
    }

    #[test]
    fn no_digest_bits_is_a_no_op() {
        let engine = engine(Device::Ecc608);
        let mut tk = random_tempkey(&engine);
        let prev = *tk.value();
        engine
            .gen_key_digest(
                &GenKeyDigest {
                    mode: 0x04,
                    key_id: 0,
                    public_key: &[0xab; 64],
                    other_data: None,
                    sn: &SN,
                },
                &mut tk,
            )
            .unwrap();
        assert_eq!(tk.value(), &prev);
        assert!(!tk.gen_key_data());
    }

    #[test]
    fn oversized_public_key_is_rejected() {
        let engine = engine(Device::Ecc608);
        let mut tk = random_tempkey(&engine);
        assert_eq!(
            engine.gen_key_digest(
                &GenKeyDigest {
                    mode: MODE_DIGEST,
                    key_id: 0,
                    public_key: &[0; 89],
                    other_data: None,
                    sn: &SN,
                },
                &mut tk,
            ),
            Err(Error::BadParameter)
        );
    }
}
