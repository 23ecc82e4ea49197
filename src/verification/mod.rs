//! Symbolic execution of source and allocated programs.
//!
//! Every value an instruction produces is interned as a term built from its
//! opcode, its result position and the terms it read. Two programs compute the
//! same thing when each of their instructions reads and writes the same terms.

use std::collections::HashMap;

use crate::backend::{MachineInstr, MachineOperand, TextBackend};
use crate::error::{Error, Result};
use crate::frontend::{Instruction, Operand};

type ValueId = usize;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum Term {
    Literal(String),
    Result {
        opcode: String,
        index: usize,
        inputs: Vec<ValueId>,
    },
}

#[derive(Default)]
struct Terms {
    ids: HashMap<Term, ValueId>,
}

impl Terms {
    fn intern(&mut self, term: Term) -> ValueId {
        let next = self.ids.len();
        *self.ids.entry(term).or_insert(next)
    }
}

/// What one instruction read and wrote.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Effect {
    inputs: Vec<ValueId>,
    outputs: Vec<ValueId>,
}

struct Vm<'a> {
    terms: &'a mut Terms,
    registers: HashMap<String, ValueId>,
    memory: HashMap<u64, ValueId>,
}

impl<'a> Vm<'a> {
    fn new(terms: &'a mut Terms) -> Self {
        Vm {
            terms,
            registers: HashMap::new(),
            memory: HashMap::new(),
        }
    }

    fn read(&mut self, operand: Operand) -> Option<ValueId> {
        match operand {
            Operand::Register(name) => self.registers.get(&name).copied(),
            Operand::Literal(text) => Some(self.terms.intern(Term::Literal(text))),
        }
    }

    /// Executes one instruction. Returns `None` when it reads a register nobody wrote.
    fn execute(&mut self, opcode: &str, sources: Vec<Operand>, targets: Vec<Operand>) -> Option<Effect> {
        let inputs = sources
            .into_iter()
            .map(|op| self.read(op))
            .collect::<Option<Vec<_>>>()?;

        let mut outputs = Vec::new();
        for (index, target) in targets.into_iter().enumerate() {
            let value = self.terms.intern(Term::Result {
                opcode: opcode.to_string(),
                index,
                inputs: inputs.clone(),
            });
            match target {
                Operand::Register(name) => {
                    self.registers.insert(name, value);
                }
                Operand::Literal(_) => {}
            }
            outputs.push(value);
        }

        Some(Effect { inputs, outputs })
    }
}

fn machine_operand(op: &MachineOperand) -> Operand {
    match op {
        MachineOperand::Reg(reg) => Operand::Register(reg.to_string()),
        MachineOperand::Literal(text) => Operand::Literal(text.clone()),
    }
}

/// Checks that `code` computes what `program` computes.
pub fn verify(program: &[Instruction], code: &[MachineInstr]) -> Result<()> {
    let mut terms = Terms::default();

    let mut expected = Vec::with_capacity(program.len());
    let mut source = Vm::new(&mut terms);
    for inst in program {
        let effect = source
            .execute(&inst.opcode, inst.sources.clone(), inst.targets.clone())
            .ok_or_else(|| Error::VerificationFailed {
                line: inst.line,
                reason: "source program reads a register before writing it".to_string(),
            })?;
        expected.push(effect);
    }

    let mut expected = expected.into_iter();
    let mut machine = Vm::new(&mut terms);
    for (index, instr) in code.iter().enumerate() {
        let line = index + 1;
        let fail = |reason: String| Error::VerificationFailed { line, reason };

        match instr {
            MachineInstr::Load { address, reg } => {
                let value = *machine
                    .memory
                    .get(address)
                    .ok_or_else(|| fail(format!("load from {} which was never stored", address)))?;
                machine.registers.insert(reg.to_string(), value);
            }
            MachineInstr::Store { reg, address } => {
                let value = *machine
                    .registers
                    .get(&reg.to_string())
                    .ok_or_else(|| fail(format!("store of {} which holds nothing", reg)))?;
                machine.memory.insert(*address, value);
            }
            MachineInstr::Op {
                opcode,
                sources,
                targets,
            } => {
                let want = expected
                    .next()
                    .ok_or_else(|| fail("more instructions than the source program".to_string()))?;
                let got = machine
                    .execute(
                        opcode,
                        sources.iter().map(machine_operand).collect(),
                        targets.iter().map(machine_operand).collect(),
                    )
                    .ok_or_else(|| fail("reads a register nobody wrote".to_string()))?;
                if got != want {
                    return Err(fail(format!(
                        "'{}' does not compute what the source instruction computes",
                        TextBackend::render_instr(instr)
                    )));
                }
            }
        }
    }

    if expected.next().is_some() {
        return Err(Error::VerificationFailed {
            line: code.len(),
            reason: "allocated program ends early".to_string(),
        });
    }
    Ok(())
}

/// Estimated cost of running `code`: memory traffic is three times an ordinary instruction.
pub fn calculate_cycles(code: &[MachineInstr]) -> u64 {
    code.iter()
        .map(|instr| match instr {
            MachineInstr::Op { .. } => 1,
            MachineInstr::Load { .. } | MachineInstr::Store { .. } => 3,
        })
        .sum()
}
