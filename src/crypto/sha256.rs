// Copyright lowRISC contributors.
// Licensed under the Apache License, Version 2.0, see LICENSE for details.
// SPDX-License-Identifier: Apache-2.0

//! SHA-256 abstraction, including convenience functions for one-shot
//! digests.
//!
//! The secure element's entire authentication scheme is built out of raw
//! SHA-256 over fixed-layout messages (not HMAC, except where the hardware
//! itself performs the FIPS-198 construction), so this is the only digest
//! primitive the engine consumes.

/// The length of a SHA-256 digest, in bytes.
pub const DIGEST_LEN: usize = 256 / 8;

/// A SHA-256 digest.
pub type Digest = [u8; DIGEST_LEN];

/// An error returned by a SHA-256 operation.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Error {
    /// Indicates an unspecified, internal error.
    Unspecified,
}

/// A builder for `Hasher`s.
///
/// Implementations of this trait may be either "hardware", using some kind
/// of hardware accelerator, or "software", such as an implementation using
/// the `ring` crate.
pub trait Builder {
    /// The hasher type this builder can produce.
    type Hasher: Hasher;

    /// Begins a new hashing operation.
    fn new_hasher(&self) -> Result<Self::Hasher, Error>;
}

/// An in-progress SHA-256 hashing operation.
pub trait Hasher {
    /// Adds `bytes` to the hashing state.
    fn write(&mut self, bytes: &[u8]) -> Result<(), Error>;

    /// Completes the hashing operation, writing the digest to `out`.
    fn finish(self, out: &mut Digest) -> Result<(), Error>;
}

/// Convenience functions on [`Builder`], which would otherwise make it
/// object-unsafe.
///
/// [`Builder`]: trait.Builder.html
#[extend::ext(name = BuilderExt)]
pub impl<B: Builder> B {
    /// Convenience helper for hashing a contiguous memory region.
    #[inline]
    fn hash_contiguous(&self, buf: &[u8], out: &mut Digest) -> Result<(), Error> {
        let mut hasher = self.new_hasher()?;
        hasher.write(buf)?;
        hasher.finish(out)
    }
}
