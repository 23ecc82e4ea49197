use std::fmt;

use crate::allocator::physical::PhysReg;

pub mod text;

pub use text::TextBackend;

/// An operand after allocation: a physical register or a literal copied from the input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MachineOperand {
    Reg(PhysReg),
    Literal(String),
}

impl fmt::Display for MachineOperand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MachineOperand::Reg(reg) => write!(f, "{}", reg),
            MachineOperand::Literal(text) => f.write_str(text),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MachineInstr {
    Op {
        opcode: String,
        sources: Vec<MachineOperand>,
        targets: Vec<MachineOperand>,
    },
    Load {
        address: u64,
        reg: PhysReg,
    },
    Store {
        reg: PhysReg,
        address: u64,
    },
}

impl MachineInstr {
    pub fn is_spill_code(&self) -> bool {
        matches!(self, MachineInstr::Load { .. } | MachineInstr::Store { .. })
    }
}

pub trait Backend {
    fn render(&self, code: &[MachineInstr]) -> Vec<String>;
}
