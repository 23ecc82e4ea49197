use crate::allocator::{AllocatorConfig, BottomUp, RegisterAllocator};
use crate::backend::{Backend, TextBackend};
use crate::frontend::{Instruction, Operand, Parser};

pub const SCENARIO: [&str; 3] = ["add r1, r2 => r3", "mul r3, r1 => r4", "sub r4, r2 => r5"];

pub fn instr(line: usize, opcode: &str, sources: &[&str], targets: &[&str]) -> Instruction {
    Instruction::new(
        opcode,
        sources.iter().map(|s| Operand::classify(s)).collect(),
        targets.iter().map(|t| Operand::classify(t)).collect(),
        line,
    )
}

pub fn program(lines: &[&str]) -> Vec<Instruction> {
    Parser::default()
        .parse_program(lines)
        .expect("test program should parse")
}

pub fn scenario() -> Vec<Instruction> {
    program(&SCENARIO)
}

/// Allocates `lines` onto `registers` registers and renders the result.
pub fn run(registers: usize, lines: &[&str]) -> Vec<String> {
    let config = AllocatorConfig::new(registers).unwrap();
    let mut prog = program(lines);
    let code = BottomUp::new(&config).allocate(&mut prog).unwrap();
    TextBackend.render(&code)
}
