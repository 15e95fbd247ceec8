// Copyright lowRISC contributors.
// Licensed under the Apache License, Version 2.0, see LICENSE for details.
// SPDX-License-Identifier: Apache-2.0

//! The host-side mirror of the secure element's TempKey register.
//!
//! TempKey is a volatile 32-byte register inside the chip, plus a small
//! flag register recording how its current contents came to be: whether
//! they are valid at all, whether they came from a random or a fixed
//! nonce, and which key slot (if any) contributed to them. Authenticated
//! operations read those flags before consuming the register, and the
//! chip invalidates it on any misuse.
//!
//! This module reproduces that register as a plain value type. All
//! mutation happens through a small set of named transitions, one per
//! producing operation, so that every state change in an exchange is
//! auditable; consumers funnel their precondition checks through
//! [`TempKey::gate()`], which applies the hardware's invalidate-on-misuse
//! rule.
//!
//! A `TempKey` belongs to exactly one logical session. It is created
//! invalid, evolves in lockstep with the hardware as commands execute, and
//! is simply discarded when the session ends. Sharing one instance between
//! interleaved command sequences corrupts both sessions; isolation is
//! achieved by giving each session its own value, not by locking.
//!
//! [`TempKey::gate()`]: struct.TempKey.html#method.gate

use crate::host::Error;
use crate::host::KEY_ID_MAX;
use crate::host::KEY_LEN;

/// The provenance of a TempKey value.
///
/// The hardware records whether the current TempKey came out of its RNG or
/// was supplied by the host, and MAC-family modes carry a bit that must
/// agree with this flag before the register may be used.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum Source {
    /// The value came from the device RNG (a calculated nonce).
    Random,
    /// The value was supplied by the host (a pass-through nonce).
    Input,
}

/// Consumer preconditions, applied by [`TempKey::gate()`].
///
/// A violated gate forces the TempKey invalid before reporting
/// [`Error::ExecutionError`], mirroring the hardware's self-protecting
/// behavior.
///
/// [`TempKey::gate()`]: struct.TempKey.html#method.gate
/// [`Error::ExecutionError`]: ../enum.Error.html#variant.ExecutionError
#[derive(Copy, Clone, Default, Debug)]
pub(crate) struct Gate {
    /// Require the NoMac flag to be clear.
    pub no_mac_clear: bool,
    /// Require the source flag to hold this exact value.
    pub source: Option<Source>,
    /// Require the value to have been produced by a data-zone GenDig.
    pub gen_dig: bool,
}

/// The secure element's volatile authentication register, mirrored on the
/// host.
///
/// See the [module documentation][self] for the state model.
#[derive(Clone, Debug)]
pub struct TempKey {
    value: [u8; KEY_LEN],
    key_id: u8,
    source: Source,
    gen_dig_data: bool,
    gen_key_data: bool,
    no_mac: bool,
    valid: bool,
    is_64: bool,
}

impl TempKey {
    /// Creates a fresh, invalid TempKey for a new session.
    pub fn new() -> Self {
        Self {
            value: [0; KEY_LEN],
            key_id: 0,
            source: Source::Random,
            gen_dig_data: false,
            gen_key_data: false,
            no_mac: false,
            valid: false,
            is_64: false,
        }
    }

    /// The current register contents.
    ///
    /// Only meaningful as a credential while [`is_valid()`] holds.
    ///
    /// [`is_valid()`]: #method.is_valid
    pub fn value(&self) -> &[u8; KEY_LEN] {
        &self.value
    }

    /// Whether the contents are usable as an authenticated-operation input.
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// The provenance of the current contents.
    pub fn source(&self) -> Source {
        self.source
    }

    /// The key slot that contributed to the current contents.
    ///
    /// Only meaningful while [`is_valid()`] holds and one of
    /// [`gen_dig_data()`] or [`gen_key_data()`] is set.
    ///
    /// [`is_valid()`]: #method.is_valid
    /// [`gen_dig_data()`]: #method.gen_dig_data
    /// [`gen_key_data()`]: #method.gen_key_data
    pub fn key_id(&self) -> u8 {
        self.key_id
    }

    /// Whether the last producer was a data-zone GenDig.
    pub fn gen_dig_data(&self) -> bool {
        self.gen_dig_data
    }

    /// Whether the last producer was a GenKey digest.
    pub fn gen_key_data(&self) -> bool {
        self.gen_key_data
    }

    /// Whether the contributing key slot was marked NoMac.
    pub fn no_mac(&self) -> bool {
        self.no_mac
    }

    /// Whether the register logically holds a 64-byte quantity (legacy
    /// pass-through mode).
    pub fn is_64(&self) -> bool {
        self.is_64
    }

    /// Discards the credential, as the hardware does on misuse or power
    /// loss.
    pub fn invalidate(&mut self) {
        self.valid = false;
    }

    /// Loads a freshly calculated nonce digest.
    ///
    /// A full producer write: the flag set is completely overwritten so no
    /// stale provenance survives into the new round.
    pub(crate) fn load(&mut self, value: &[u8; KEY_LEN], source: Source) {
        self.value = *value;
        self.key_id = 0;
        self.source = source;
        self.gen_dig_data = false;
        self.gen_key_data = false;
        self.no_mac = false;
        self.valid = true;
        self.is_64 = false;
    }

    /// Loads a host-supplied pass-through value.
    pub(crate) fn load_passthrough(&mut self, value: &[u8; KEY_LEN], long: bool) {
        self.load(value, Source::Input);
        self.is_64 = long;
    }

    /// Overwrites the register contents without touching the flags.
    ///
    /// Used when the device has reported the literal TempKey value back to
    /// the host (nonce calculation mode) and for the parts that do not
    /// carry a flag register.
    pub(crate) fn set_value(&mut self, value: &[u8; KEY_LEN]) {
        self.value = *value;
    }

    /// Overwrites the source flag alone.
    ///
    /// The SHA104 and SHA105 track only this flag; their nonce handling
    /// does not touch the rest of the register.
    pub(crate) fn set_source(&mut self, source: Source) {
        self.source = source;
    }

    /// Overwrites the 64-byte flag alone.
    pub(crate) fn set_64(&mut self, long: bool) {
        self.is_64 = long;
    }

    /// Records a pass-through nonce aimed at a different target buffer.
    ///
    /// On the ECC608, a pass-through nonce may land in the message digest
    /// buffer or the alternate key buffer instead; the TempKey value is
    /// untouched but the register is left invalid.
    pub(crate) fn divert(&mut self) {
        self.key_id = 0;
        self.source = Source::Input;
        self.gen_dig_data = false;
        self.no_mac = false;
        self.valid = false;
    }

    /// Applies a GenDig evolution: the register was combined with a stored
    /// value and remains valid.
    ///
    /// `data_slot` carries `(key_id, no_mac)` when the digested zone was a
    /// data slot; other zones clear the slot tracking. The provenance
    /// (source flag) of the round survives, since the underlying nonce is
    /// unchanged.
    pub(crate) fn evolve_gen_dig(
        &mut self,
        value: &[u8; KEY_LEN],
        data_slot: Option<(u16, bool)>,
    ) {
        self.value = *value;
        self.valid = true;
        match data_slot {
            Some((key_id, no_mac)) if key_id <= KEY_ID_MAX => {
                self.gen_dig_data = true;
                // Lower four bits only; a hardware-compatibility constant.
                self.key_id = (key_id & 0x0F) as u8;
                if no_mac {
                    self.no_mac = true;
                }
            }
            _ => {
                self.gen_dig_data = false;
                self.key_id = 0;
            }
        }
    }

    /// Applies a GenKey digest: the register now holds a public-key
    /// digest.
    pub(crate) fn evolve_gen_key(&mut self, value: &[u8; KEY_LEN], key_id: u16) {
        self.value = *value;
        self.valid = true;
        self.gen_dig_data = false;
        self.gen_key_data = true;
        self.key_id = (key_id & 0x0F) as u8;
    }

    /// Consumes the credential after a successful one-shot use.
    pub(crate) fn consume(&mut self) {
        self.valid = false;
    }

    /// Checks consumer preconditions, invalidating on violation.
    ///
    /// Validity is always required; the remaining conditions come from
    /// `gate`. On violation the register is forced invalid and the
    /// operation fails with [`Error::ExecutionError`], distinct from
    /// [`Error::BadParameter`], which reports caller mistakes and leaves
    /// state alone.
    ///
    /// [`Error::ExecutionError`]: ../enum.Error.html#variant.ExecutionError
    /// [`Error::BadParameter`]: ../enum.Error.html#variant.BadParameter
    pub(crate) fn gate(&mut self, gate: Gate) -> Result<(), Error> {
        let ok = self.valid
            && !(gate.no_mac_clear && self.no_mac)
            && gate.source.map_or(true, |s| s == self.source)
            && !(gate.gen_dig && !self.gen_dig_data);
        if !ok {
            warn!("TempKey precondition violated: {:?} against {:?}", gate, self);
            self.valid = false;
            return Err(Error::ExecutionError);
        }
        Ok(())
    }
}

impl Default for TempKey {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn producers_reset_flags() {
        let mut tk = TempKey::new();
        tk.no_mac = true;
        tk.gen_key_data = true;
        tk.key_id = 7;

        tk.load(&[0xaa; 32], Source::Random);
        assert!(tk.is_valid());
        assert_eq!(tk.source(), Source::Random);
        assert!(!tk.no_mac());
        assert!(!tk.gen_key_data());
        assert_eq!(tk.key_id(), 0);
    }

    #[test]
    fn gate_requires_validity() {
        let mut tk = TempKey::new();
        assert_eq!(tk.gate(Gate::default()), Err(Error::ExecutionError));

        tk.load(&[0x55; 32], Source::Input);
        assert_eq!(tk.gate(Gate::default()), Ok(()));
    }

    #[test]
    fn gate_invalidates_on_violation() {
        let mut tk = TempKey::new();
        tk.load(&[0x55; 32], Source::Input);

        let gate = Gate {
            source: Some(Source::Random),
            ..Gate::default()
        };
        assert_eq!(tk.gate(gate), Err(Error::ExecutionError));
        assert!(!tk.is_valid());
    }

    #[test]
    fn gate_checks_no_mac() {
        let mut tk = TempKey::new();
        tk.load(&[0x55; 32], Source::Random);
        tk.evolve_gen_dig(&[0x66; 32], Some((3, true)));
        assert!(tk.no_mac());

        let gate = Gate {
            no_mac_clear: true,
            ..Gate::default()
        };
        assert_eq!(tk.gate(gate), Err(Error::ExecutionError));
        assert!(!tk.is_valid());
    }

    #[test]
    fn key_id_keeps_low_nibble_only() {
        let mut tk = TempKey::new();
        tk.load(&[0; 32], Source::Random);
        tk.evolve_gen_key(&[1; 32], 0x001B);
        assert_eq!(tk.key_id(), 0x0B);
    }

    #[test]
    fn gen_dig_outside_data_slots_clears_tracking() {
        let mut tk = TempKey::new();
        tk.load(&[0; 32], Source::Random);
        tk.evolve_gen_dig(&[1; 32], Some((5, false)));
        assert!(tk.gen_dig_data());
        assert_eq!(tk.key_id(), 5);

        tk.evolve_gen_dig(&[2; 32], None);
        assert!(!tk.gen_dig_data());
        assert_eq!(tk.key_id(), 0);
        assert!(tk.is_valid());
    }
}
