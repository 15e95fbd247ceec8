// Copyright lowRISC contributors.
// Licensed under the Apache License, Version 2.0, see LICENSE for details.
// SPDX-License-Identifier: Apache-2.0

//! Secure element device identities and capability sets.
//!
//! Not every operation exists on every part: the small SHA-only parts have
//! no ECC machinery, the ECC204 family replaces TempKey with a transport
//! session key, and SecureBoot only exists on the ECC608. Rather than
//! baking the part number into a process-wide global, callers construct a
//! [`Profile`] describing the device a session talks to and hand it to the
//! engine; every operation's behavior is then a pure function of its
//! inputs.
//!
//! [`Profile`]: struct.Profile.html

use enumflags2::bitflags;
use enumflags2::BitFlags;

/// A CryptoAuth device family member.
///
/// The same message layouts are shared across the product line, but a few
/// flag and field semantics vary per part; see the individual operations
/// for where this matters.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum Device {
    /// ATSHA204A: symmetric-only, the original command set.
    Sha204a,
    /// SHA104: client-side symmetric part with a reduced flag register.
    Sha104,
    /// SHA105: host-side symmetric part with a reduced flag register.
    Sha105,
    /// ATECC108A: adds ECC key generation and internal signing.
    Ecc108a,
    /// ECC204: transport-session-key based writes and deletes.
    Ecc204,
    /// ATECC508A: ECC part with counters and encrypted reads.
    Ecc508a,
    /// ATECC608: adds SecureBoot, IO protection, and KDF output
    /// encryption.
    Ecc608,
}

/// An operation family a device may support.
///
/// These correspond one-to-one with the host-side computations in
/// [`host`](../host/index.html); a [`Profile`] carries the set of them
/// that its device implements.
///
/// [`Profile`]: struct.Profile.html
#[bitflags]
#[repr(u16)]
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Capability {
    /// The Nonce command and TempKey loading.
    Nonce = 0x0001,
    /// MAC digests.
    Mac = 0x0002,
    /// The legacy HMAC command.
    Hmac = 0x0004,
    /// CheckMac client responses and output-response MACs.
    CheckMac = 0x0008,
    /// GenDig TempKey evolution (and its session-MAC sibling).
    GenDig = 0x0010,
    /// DeriveKey and its input MAC.
    DeriveKey = 0x0020,
    /// Encrypted Write and PrivWrite authorization MACs.
    WriteEnc = 0x0040,
    /// SecureBoot digest encryption and response MACs.
    SecureBoot = 0x0080,
    /// IO-protected Verify output MACs.
    Verify = 0x0100,
    /// GenKey public-key digests.
    GenKey = 0x0200,
    /// Sign(Internal) message construction.
    SignInternal = 0x0400,
    /// Transport session keys, Delete MACs, and diversified keys.
    SessionKey = 0x0800,
    /// Encrypted-read and IO-protection decryption.
    Decrypt = 0x1000,
    /// Counter-match slot encoding.
    Counter = 0x2000,
}

/// A description of the device on the other end of a session.
///
/// A `Profile` is constructed once per session and passed to
/// [`host::Engine::new()`]; it fixes both the part-specific flag semantics
/// and the set of supported operations. [`Profile::new()`] selects the
/// capability set the part ships with; integrations that restrict
/// operations further (for example, by configuration-zone locking) can use
/// [`Profile::with_capabilities()`].
///
/// [`host::Engine::new()`]: ../host/struct.Engine.html#method.new
/// [`Profile::new()`]: #method.new
/// [`Profile::with_capabilities()`]: #method.with_capabilities
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct Profile {
    device: Device,
    caps: BitFlags<Capability>,
}

impl Profile {
    /// Creates a `Profile` with the capability set `device` ships with.
    pub fn new(device: Device) -> Self {
        use Capability::*;
        let caps = match device {
            Device::Sha204a => {
                Nonce | Mac | Hmac | CheckMac | GenDig | DeriveKey | WriteEnc | Decrypt
            }
            Device::Sha104 => Nonce | Mac | SessionKey | Counter,
            Device::Sha105 => Nonce | CheckMac | SessionKey | Counter,
            Device::Ecc108a => {
                Nonce
                    | Mac
                    | Hmac
                    | CheckMac
                    | GenDig
                    | DeriveKey
                    | WriteEnc
                    | GenKey
                    | SignInternal
                    | Decrypt
            }
            Device::Ecc204 => Nonce | SessionKey | WriteEnc | Counter,
            Device::Ecc508a => {
                Nonce
                    | Mac
                    | CheckMac
                    | GenDig
                    | DeriveKey
                    | WriteEnc
                    | GenKey
                    | SignInternal
                    | Decrypt
                    | Counter
            }
            Device::Ecc608 => {
                Nonce
                    | Mac
                    | CheckMac
                    | GenDig
                    | DeriveKey
                    | WriteEnc
                    | SecureBoot
                    | Verify
                    | GenKey
                    | SignInternal
                    | Decrypt
                    | Counter
            }
        };
        Self { device, caps }
    }

    /// Creates a `Profile` with an explicit capability set.
    pub fn with_capabilities(device: Device, caps: BitFlags<Capability>) -> Self {
        Self { device, caps }
    }

    /// Returns the device this profile describes.
    pub fn device(&self) -> Device {
        self.device
    }

    /// Returns whether this profile's device supports `cap`.
    pub fn supports(&self, cap: Capability) -> bool {
        self.caps.contains(cap)
    }

    /// Returns whether the device carries the full TempKey flag register.
    ///
    /// The SHA104 and SHA105 track only the source flag; every other part
    /// tracks validity, provenance, and the contributing key slot.
    pub(crate) fn has_flag_register(&self) -> bool {
        !matches!(self.device, Device::Sha104 | Device::Sha105)
    }
}
