//! Register discovery and live-set computation.
//!
//! Liveness is an interval approximation: a register is live from its first
//! reference through its final one. Straight-line code has no merges, so the
//! interval never needs to be split.

use indexmap::IndexSet;
use log::trace;

use crate::allocator::registers::{RegisterTable, VirtualRegister};
use crate::frontend::Instruction;

/// Runs discovery followed by live-set propagation.
pub fn analyze(program: &mut [Instruction]) -> RegisterTable {
    let table = discover(program);
    annotate_live(program, &table);
    table
}

/// Builds the register table: first use, last use, and the line of the second
/// reference as an initial `next_use`.
pub fn discover(program: &[Instruction]) -> RegisterTable {
    let mut table = RegisterTable::default();

    for inst in program {
        for name in inst.registers() {
            match table.get_mut(name) {
                Some(reg) => {
                    if reg.next_use.is_none() {
                        reg.next_use = Some(inst.line);
                    }
                    reg.last_use = inst.line;
                }
                None => table.insert(VirtualRegister::new(name, inst.line)),
            }
        }
    }

    table
}

/// Fills in each instruction's live set from the previous one.
pub fn annotate_live(program: &mut [Instruction], table: &RegisterTable) {
    let mut live: IndexSet<String> = IndexSet::new();

    for inst in program.iter_mut() {
        for name in inst.registers() {
            live.insert(name.to_string());
        }
        live.retain(|name| table.last_use(name) != Some(inst.line));

        trace!("line {} live: {:?}", inst.line, live);
        inst.live = live.clone();
    }
}

/// Largest number of registers that must be held at once: everything live
/// coming into an instruction plus everything it references.
pub fn max_pressure(program: &[Instruction]) -> usize {
    let mut live_in: IndexSet<&str> = IndexSet::new();
    let mut max = 0;

    for inst in program {
        let mut held = live_in.clone();
        held.extend(inst.registers());
        max = max.max(held.len());
        live_in = inst.live.iter().map(String::as_str).collect();
    }

    max
}
