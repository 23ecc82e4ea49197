use std::fmt;

use indexmap::IndexMap;

/// Bookkeeping for one virtual register.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VirtualRegister {
    pub name: String,
    pub first_use: usize,
    /// Line of the next reference relative to the point of query.
    pub next_use: Option<usize>,
    /// Line of the final reference anywhere in the program.
    pub last_use: usize,
    /// Spill slot offset, assigned on the first spill and kept afterwards.
    pub offset: Option<u64>,
    pub allocated: bool,
}

impl VirtualRegister {
    pub fn new(name: &str, line: usize) -> Self {
        Self {
            name: name.to_string(),
            first_use: line,
            next_use: None,
            last_use: line,
            offset: None,
            allocated: false,
        }
    }

    pub fn is_spilled(&self) -> bool {
        self.offset.is_some()
    }
}

impl fmt::Display for VirtualRegister {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let or_dash = |v: Option<String>| v.unwrap_or_else(|| "-".to_string());
        write!(
            f,
            "{}\tallocated: {}\tfirst use: {}\tnext use: {}\tlast use: {}\toffset: {}",
            self.name,
            self.allocated,
            self.first_use,
            or_dash(self.next_use.map(|l| l.to_string())),
            self.last_use,
            or_dash(self.offset.map(|o| o.to_string())),
        )
    }
}

/// All virtual registers of a program, in order of first appearance.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct RegisterTable {
    regs: IndexMap<String, VirtualRegister>,
}

impl RegisterTable {
    pub fn get(&self, name: &str) -> Option<&VirtualRegister> {
        self.regs.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut VirtualRegister> {
        self.regs.get_mut(name)
    }

    pub fn insert(&mut self, reg: VirtualRegister) {
        self.regs.insert(reg.name.clone(), reg);
    }

    /// Looks up `name`, creating it as first seen at `line` when unknown.
    pub fn get_or_insert(&mut self, name: &str, line: usize) -> &mut VirtualRegister {
        self.regs
            .entry(name.to_string())
            .or_insert_with(|| VirtualRegister::new(name, line))
    }

    pub fn len(&self) -> usize {
        self.regs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &VirtualRegister> {
        self.regs.values()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut VirtualRegister> {
        self.regs.values_mut()
    }

    pub fn last_use(&self, name: &str) -> Option<usize> {
        self.regs.get(name).map(|reg| reg.last_use)
    }

    pub fn next_use(&self, name: &str) -> Option<usize> {
        self.regs.get(name).and_then(|reg| reg.next_use)
    }
}
