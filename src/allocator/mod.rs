pub mod bottom_up;
pub mod liveness;
pub mod physical;
pub mod registers;
pub mod spill;

use crate::backend::{Backend, MachineInstr, TextBackend};
use crate::error::{Error, Result};
use crate::frontend::{Instruction, ParseOptions};

pub use bottom_up::BottomUp;
pub use physical::{PhysReg, RegisterFile};
pub use registers::{RegisterTable, VirtualRegister};
pub use spill::SpillArea;

pub trait RegisterAllocator {
    /// Rewrites `program` onto physical registers, adding spill code as needed.
    /// Fills in each instruction's live set on the way.
    fn allocate(&mut self, program: &mut [Instruction]) -> Result<Vec<MachineInstr>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AllocatorConfig {
    registers: usize,
    base_address: u64,
    slot_size: u64,
    parse: ParseOptions,
}

impl AllocatorConfig {
    pub fn new(registers: usize) -> Result<Self> {
        if registers == 0 {
            return Err(Error::InvalidRegisterCount(registers.to_string()));
        }
        Ok(Self {
            registers,
            base_address: spill::DEFAULT_BASE_ADDRESS,
            slot_size: spill::DEFAULT_SLOT_SIZE,
            parse: ParseOptions::default(),
        })
    }

    pub fn with_base_address(mut self, base_address: u64) -> Self {
        self.base_address = base_address;
        self
    }

    pub fn with_slot_size(mut self, slot_size: u64) -> Result<Self> {
        if slot_size == 0 {
            return Err(Error::InvalidSlotSize(slot_size.to_string()));
        }
        self.slot_size = slot_size;
        Ok(self)
    }

    pub fn with_parse_options(mut self, parse: ParseOptions) -> Self {
        self.parse = parse;
        self
    }

    pub fn registers(&self) -> usize {
        self.registers
    }

    pub fn base_address(&self) -> u64 {
        self.base_address
    }

    pub fn slot_size(&self) -> u64 {
        self.slot_size
    }

    pub fn parse_options(&self) -> ParseOptions {
        self.parse
    }
}

/// Everything the allocator mutates while walking the program.
#[derive(Debug, Clone, PartialEq)]
pub struct AllocState {
    pub table: RegisterTable,
    pub file: RegisterFile,
    pub spill: SpillArea,
}

impl AllocState {
    pub fn new(config: &AllocatorConfig) -> Self {
        Self {
            table: RegisterTable::default(),
            file: RegisterFile::new(config.registers()),
            spill: SpillArea::new(config.base_address(), config.slot_size()),
        }
    }
}

/// Result of one allocation run.
#[derive(Debug, Clone)]
pub struct Allocation {
    /// The parsed source program, with live sets filled in.
    pub program: Vec<Instruction>,
    pub code: Vec<MachineInstr>,
    pub state: AllocState,
}

impl Allocation {
    pub fn loads(&self) -> usize {
        self.code
            .iter()
            .filter(|i| matches!(i, MachineInstr::Load { .. }))
            .count()
    }

    pub fn stores(&self) -> usize {
        self.code
            .iter()
            .filter(|i| matches!(i, MachineInstr::Store { .. }))
            .count()
    }

    pub fn lines(&self) -> Vec<String> {
        TextBackend.render(&self.code)
    }
}
