use std::collections::{HashMap, VecDeque};
use std::fmt;

use crate::frontend::REGISTER_PREFIX;

/// Index of a physical register. Printed as `ra`, `rb`, ..., `rz`, `raa`, ...
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PhysReg(pub usize);

impl fmt::Display for PhysReg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Bijective base 26, so the names never collide and never run out.
        let mut letters = Vec::new();
        let mut n = self.0 + 1;
        while n > 0 {
            n -= 1;
            letters.push((b'a' + (n % 26) as u8) as char);
            n /= 26;
        }
        let name: String = letters.into_iter().rev().collect();
        write!(f, "{}{}", REGISTER_PREFIX, name)
    }
}

/// Two-way binding between physical slots and the virtual registers they hold.
#[derive(Debug, Clone, PartialEq)]
pub struct RegisterFile {
    slots: Vec<Option<String>>,
    bound: HashMap<String, PhysReg>,
    /// Released slots are reused oldest-first.
    free: VecDeque<PhysReg>,
}

impl RegisterFile {
    pub fn new(count: usize) -> Self {
        Self {
            slots: vec![None; count],
            bound: HashMap::new(),
            free: (0..count).map(PhysReg).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn lookup(&self, virt: &str) -> Option<PhysReg> {
        self.bound.get(virt).copied()
    }

    pub fn holder(&self, phys: PhysReg) -> Option<&str> {
        self.slots[phys.0].as_deref()
    }

    pub fn take_free(&mut self) -> Option<PhysReg> {
        self.free.pop_front()
    }

    /// Oldest free slot that is not in `avoid`.
    pub fn take_free_except(&mut self, avoid: &[PhysReg]) -> Option<PhysReg> {
        let index = self.free.iter().position(|phys| !avoid.contains(phys))?;
        self.free.remove(index)
    }

    pub fn free_count(&self) -> usize {
        self.free.len()
    }

    /// Binds `virt` to a slot previously handed out by `take_free`.
    pub fn bind(&mut self, phys: PhysReg, virt: &str) {
        debug_assert!(self.slots[phys.0].is_none(), "{phys} is still occupied");
        debug_assert!(!self.bound.contains_key(virt), "{virt} is already bound");
        self.slots[phys.0] = Some(virt.to_string());
        self.bound.insert(virt.to_string(), phys);
    }

    /// Empties a slot and returns what it held.
    pub fn release(&mut self, phys: PhysReg) -> Option<String> {
        let virt = self.vacate(phys)?;
        self.free.push_back(phys);
        Some(virt)
    }

    /// Empties a slot without returning it to the free list, so the caller
    /// can bind it straight away.
    pub fn vacate(&mut self, phys: PhysReg) -> Option<String> {
        let virt = self.slots[phys.0].take()?;
        self.bound.remove(&virt);
        Some(virt)
    }

    /// Occupied slots in index order.
    pub fn bindings(&self) -> impl Iterator<Item = (PhysReg, &str)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_deref().map(|virt| (PhysReg(i), virt)))
    }
}
