pub mod instruction;
pub mod parser;

pub use instruction::{Instruction, Operand, REGISTER_PREFIX};
pub use parser::{ParseOptions, Parser};
