// Copyright lowRISC contributors.
// Licensed under the Apache License, Version 2.0, see LICENSE for details.
// SPDX-License-Identifier: Apache-2.0

//! I/O interfaces, in lieu of [`std::io`].
//!
//! These functions and traits are intended for assembling and picking
//! apart the fixed-layout byte messages that secure element digests are
//! computed over. Every write is bounds-checked: running off the end of a
//! message buffer is an explicit [`Error::BufferExhausted`], never a
//! silent overflow.
//!
//! [`std::io`]: https://doc.rust-lang.org/std/io/index.html
//! [`Error::BufferExhausted`]: enum.Error.html#variant.BufferExhausted

pub mod endian;
pub mod read;
pub mod write;

pub use read::Read;
pub use write::Write;

/// A generic, low-level I/O error.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[non_exhaustive]
pub enum Error {
    /// Indicates that some underlying buffer has been completely used up,
    /// either for reading from or writing to.
    ///
    /// This is typically a fatal error, since it is probably not possible
    /// to re-allocate that underlying buffer.
    BufferExhausted,

    /// Indicates that an unspecified, internal failure occurred.
    Internal,
}
