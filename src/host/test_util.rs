// Copyright lowRISC contributors.
// Licensed under the Apache License, Version 2.0, see LICENSE for details.
// SPDX-License-Identifier: Apache-2.0

//! Test-only helpers shared by the operation tests.

use crate::crypto::ring;
use crate::crypto::sha256::Digest;
use crate::device::Device;
use crate::device::Profile;
use crate::host::nonce::Nonce;
use crate::host::nonce::NonceMode;
use crate::host::Engine;
use crate::host::SerialNumber;
use crate::host::TempKey;

/// A plausible serial number: real parts start `01 23` and end `EE`.
pub const SN: SerialNumber = [0x01, 0x23, 0x6a, 0x77, 0x00, 0x45, 0x1c, 0x8a, 0xee];

/// Creates an engine over the software digest backend.
pub fn engine(device: Device) -> Engine<ring::Builder> {
    Engine::new(Profile::new(device), ring::Builder::new())
}

/// Computes SHA-256 over the concatenation of `parts`, independently of
/// the crate's own digest plumbing.
pub fn sha256_concat(parts: &[&[u8]]) -> Digest {
    let mut ctx = ::ring::digest::Context::new(&::ring::digest::SHA256);
    for part in parts {
        ctx.update(part);
    }
    let mut out = Digest::default();
    out.copy_from_slice(ctx.finish().as_ref());
    out
}

/// Produces a valid TempKey with `Source::Random`, the way a real session
/// would: by mirroring a calculated nonce.
pub fn random_tempkey(engine: &Engine<ring::Builder>) -> TempKey {
    let mut tk = TempKey::new();
    let rand_out = [0xc3; 32];
    let num_in = [0x1b; 20];
    engine
        .nonce(
            &Nonce {
                mode: NonceMode::SeedUpdate,
                zero: 0,
                num_in: &num_in,
                rand_out: Some(&rand_out),
            },
            &mut tk,
        )
        .unwrap();
    assert!(tk.is_valid());
    tk
}

/// Produces a valid TempKey with `Source::Input` via a pass-through nonce.
pub fn input_tempkey(engine: &Engine<ring::Builder>, value: &[u8; 32]) -> TempKey {
    let mut tk = TempKey::new();
    engine
        .nonce(
            &Nonce {
                mode: NonceMode::pass_through(),
                zero: 0,
                num_in: value,
                rand_out: None,
            },
            &mut tk,
        )
        .unwrap();
    assert!(tk.is_valid());
    tk
}
