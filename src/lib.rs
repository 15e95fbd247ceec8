// Copyright lowRISC contributors.
// Licensed under the Apache License, Version 2.0, see LICENSE for details.
// SPDX-License-Identifier: Apache-2.0

//! `wyvern` is a host-side implementation of the session authentication
//! protocol spoken by CryptoAuth-style secure element chips.
//!
//! A secure element proves possession of its keys through SHA-256 digests
//! computed over precisely laid-out internal messages, seeded by an
//! ephemeral register called *TempKey*. To verify (or produce) those
//! digests, the host CPU must replicate the chip's internal state machine
//! byte for byte: the same message layouts, the same zero padding, the
//! same flag register, the same one-shot consumption rules. That
//! replication is what this crate provides.
//!
//! `wyvern` is a pure computation layer. It never talks to hardware: an
//! external command-orchestration layer owns the wire exchange and feeds
//! command parameters and responses into [`host::Engine`], which evolves a
//! caller-owned [`host::TempKey`] and produces the MACs and derived keys
//! that the next command needs. Transports, packet framing, and
//! certificate handling are out of scope and live elsewhere.
//!
//! Cryptographic primitives are pluggable: the engine consumes a SHA-256
//! implementation through the traits in [`crypto::sha256`], so it can be
//! backed by hardware accelerators or, behind the `ring` feature, by a
//! software implementation suitable for tests and ordinary hosts.
//!
//! [`host::Engine`]: host/struct.Engine.html
//! [`host::TempKey`]: host/tempkey/struct.TempKey.html
//! [`crypto::sha256`]: crypto/sha256/index.html

#![cfg_attr(not(any(test, feature = "std")), no_std)]
#![deny(missing_docs)]
#![deny(warnings)]
#![deny(unused)]
#![deny(unsafe_code)]

#[macro_use]
pub mod debug;

pub mod crypto;
pub mod device;
pub mod host;
pub mod io;
