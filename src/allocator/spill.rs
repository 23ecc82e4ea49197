use log::trace;

use crate::allocator::registers::VirtualRegister;
use crate::error::{Error, Result};

pub const DEFAULT_BASE_ADDRESS: u64 = 4096;
pub const DEFAULT_SLOT_SIZE: u64 = 4;

/// Memory that spilled registers are stored to. Slots are never reclaimed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpillArea {
    base: u64,
    slot_size: u64,
    next_offset: u64,
    slots: u64,
}

impl SpillArea {
    /// `slot_size` must be non-zero; `AllocatorConfig` rejects zero.
    pub fn new(base: u64, slot_size: u64) -> Self {
        debug_assert!(slot_size > 0, "spill slots need a size");
        Self {
            base,
            slot_size,
            next_offset: 0,
            slots: 0,
        }
    }

    /// Address of `reg`'s slot, giving it one if it never had one.
    pub fn slot_for(&mut self, reg: &mut VirtualRegister) -> Result<u64> {
        if let Some(address) = self.address(reg) {
            return Ok(address);
        }

        let overflow = || Error::SpillAddressOverflow {
            register: reg.name.clone(),
        };
        let offset = self.next_offset;
        let address = self.base.checked_add(offset).ok_or_else(overflow)?;
        let next_offset = offset.checked_add(self.slot_size).ok_or_else(overflow)?;

        self.next_offset = next_offset;
        self.slots += 1;
        reg.offset = Some(offset);
        trace!("new spill slot {} for {}", offset, reg.name);
        Ok(address)
    }

    /// Address of `reg`'s slot, if it has one.
    pub fn address(&self, reg: &VirtualRegister) -> Option<u64> {
        reg.offset.and_then(|offset| self.base.checked_add(offset))
    }

    pub fn slots_used(&self) -> u64 {
        self.slots
    }
}

impl Default for SpillArea {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_ADDRESS, DEFAULT_SLOT_SIZE)
    }
}
