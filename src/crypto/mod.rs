// Copyright lowRISC contributors.
// Licensed under the Apache License, Version 2.0, see LICENSE for details.
// SPDX-License-Identifier: Apache-2.0

//! Pluggable cryptography traits.
//!
//! The authentication engine requires a SHA-256 implementation to
//! function. This module provides the traits that abstract over that
//! operation, so that implementations backed by hardware accelerators or
//! certified software can be slotted in.
//!
//! A software implementation based on the [`ring`] crate is provided under
//! the [`ring` module]; its presence is controlled by the `ring` feature
//! flag.
//!
//! [`ring` module]: ring/index.html

pub mod sha256;

#[cfg(feature = "ring")]
pub mod ring;

#[cfg(test)]
pub mod testdata;
