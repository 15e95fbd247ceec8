// Copyright lowRISC contributors.
// Licensed under the Apache License, Version 2.0, see LICENSE for details.
// SPDX-License-Identifier: Apache-2.0

//! Test-only data.

/// A plaintext string; the classic FIPS 180-2 test message.
pub const PLAIN_TEXT: &[u8] = b"abc";

/// The SHA-256 hash of `PLAIN_TEXT`, per FIPS 180-2 appendix B.1.
pub const PLAIN_SHA256: &[u8; 32] = &[
    0xba, 0x78, 0x16, 0xbf, 0x8f, 0x01, 0xcf, 0xea, //
    0x41, 0x41, 0x40, 0xde, 0x5d, 0xae, 0x22, 0x23, //
    0xb0, 0x03, 0x61, 0xa3, 0x96, 0x17, 0x7a, 0x9c, //
    0xb4, 0x10, 0xff, 0x61, 0xf2, 0x00, 0x15, 0xad,
];
