//! Bottom-up local allocation with furthest-next-use spilling.
//!
//! The program is walked once in order. At each instruction the allocator
//! refreshes next-use lines, drops bindings of registers that are dead,
//! binds the sources, releases sources that die here, binds the targets and
//! finally rewrites the instruction onto physical registers. When no register
//! is free, the bound value whose next use is furthest away is stored to its
//! spill slot.

use std::cmp::Reverse;
use std::collections::HashMap;

use log::{debug, info, trace};

use super::{AllocState, AllocatorConfig, PhysReg, RegisterAllocator, liveness};
use crate::backend::{MachineInstr, MachineOperand};
use crate::error::Result;
use crate::frontend::{Instruction, Operand};

pub struct BottomUp {
    config: AllocatorConfig,
    state: AllocState,
    code: Vec<MachineInstr>,
}

impl BottomUp {
    pub fn new(config: &AllocatorConfig) -> Self {
        Self {
            config: *config,
            state: AllocState::new(config),
            code: Vec::new(),
        }
    }

    pub fn state(&self) -> &AllocState {
        &self.state
    }

    pub fn into_state(self) -> AllocState {
        self.state
    }

    /// Code emitted so far.
    pub fn code(&self) -> &[MachineInstr] {
        &self.code
    }

    /// Analyzes `program` and resets the allocator for a fresh walk over it.
    pub fn prepare(&mut self, program: &mut [Instruction]) {
        self.state = AllocState::new(&self.config);
        self.state.table = liveness::analyze(program);
        // Discovery only records the second reference; the walk recomputes
        // next uses from scratch.
        for reg in self.state.table.iter_mut() {
            reg.next_use = None;
        }
        self.code.clear();
    }

    /// Allocates `program[index]`. Instructions must be visited in order after `prepare`.
    pub fn allocate_instruction(&mut self, program: &[Instruction], index: usize) -> Result<()> {
        let inst = &program[index];
        trace!("allocating line {}: {}", inst.line, inst.opcode);

        self.refresh_next_use(program, index);
        self.free_dead(inst);

        // Registers this instruction names are evicted only as a last resort.
        let operands = distinct(inst.registers());

        let sources = distinct(inst.source_registers());
        let mut source_regs = HashMap::new();
        for name in &sources {
            let phys = self.resolve(name, inst.line, &operands, &[])?;
            source_regs.insert(name.clone(), phys);
        }

        // Operands are read before results are written, so a source that dies
        // here can hand its register to a target. Reloads are emitted ahead of
        // the instruction and must stay out of these registers.
        let mut released = Vec::new();
        for name in &sources {
            if !inst.live.contains(name) && !inst.target_registers().any(|t| t == name) {
                released.extend(self.release(name));
            }
        }

        let targets = distinct(inst.target_registers());
        let mut target_regs = HashMap::new();
        for name in &targets {
            let phys = self.resolve(name, inst.line, &operands, &released)?;
            target_regs.insert(name.clone(), phys);
        }

        self.code.push(MachineInstr::Op {
            opcode: inst.opcode.clone(),
            sources: rewrite(&inst.sources, &source_regs),
            targets: rewrite(&inst.targets, &target_regs),
        });
        Ok(())
    }

    /// Points every register's `next_use` at its first reference after the
    /// current instruction, unless it already points past it.
    fn refresh_next_use(&mut self, program: &[Instruction], index: usize) {
        let line = program[index].line;
        for later in &program[index + 1..] {
            for name in later.registers() {
                if let Some(reg) = self.state.table.get_mut(name) {
                    if reg.next_use.is_none_or(|next| next <= line) {
                        reg.next_use = Some(later.line);
                        trace!("line {}: next use of {} is {}", line, name, later.line);
                    }
                }
            }
        }
    }

    fn free_dead(&mut self, inst: &Instruction) {
        let dead: Vec<String> = self
            .state
            .file
            .bindings()
            .filter(|(_, virt)| !inst.live.contains(*virt) && !inst.references(virt))
            .map(|(_, virt)| virt.to_string())
            .collect();

        for name in dead {
            self.release(&name);
        }
    }

    fn release(&mut self, name: &str) -> Option<PhysReg> {
        let phys = self.state.file.lookup(name)?;
        self.state.file.release(phys);
        if let Some(reg) = self.state.table.get_mut(name) {
            reg.allocated = false;
        }
        debug!("freed {} (held {})", phys, name);
        Some(phys)
    }

    /// Makes sure `name` sits in a physical register, reloading it if it was
    /// spilled. A reload never lands in `reserved`.
    fn resolve(
        &mut self,
        name: &str,
        line: usize,
        pinned: &[String],
        reserved: &[PhysReg],
    ) -> Result<PhysReg> {
        if let Some(phys) = self.state.file.lookup(name) {
            return Ok(phys);
        }

        let spilled = self.state.table.get_or_insert(name, line).is_spilled();
        let file = &mut self.state.file;
        let free = if spilled && file.bindings().next().is_some() {
            file.take_free_except(reserved)
        } else {
            // With nothing bound there is nothing to spill instead, so even a
            // reserved slot is taken.
            file.take_free()
        };
        let phys = match free {
            Some(phys) => phys,
            None => self.evict(pinned)?,
        };
        self.state.file.bind(phys, name);

        let reg = self.state.table.get_or_insert(name, line);
        reg.allocated = true;
        match self.state.spill.address(reg) {
            Some(address) => {
                debug!("reloading {} from {} into {}", name, address, phys);
                self.code.push(MachineInstr::Load { address, reg: phys });
            }
            None => debug!("bound {} to {}", name, phys),
        }
        Ok(phys)
    }

    /// Spills the bound register needed furthest in the future and hands back
    /// its slot, which stays off the free list. Registers in `pinned` are only
    /// chosen when nothing else is bound.
    ///
    /// # Panics
    ///
    /// Callers only evict when some slot is bound, and every bound name went
    /// through `resolve` and so has a table entry.
    fn evict(&mut self, pinned: &[String]) -> Result<PhysReg> {
        let table = &self.state.table;
        let (phys, victim) = self
            .state
            .file
            .bindings()
            .min_by_key(|(_, virt)| {
                let is_pinned = pinned.iter().any(|p| p.as_str() == *virt);
                let next_use = table.next_use(virt).unwrap_or(0);
                (is_pinned, Reverse(next_use))
            })
            .map(|(phys, virt)| (phys, virt.to_string()))
            .expect("a register file with no free slot has a binding to evict");

        let reg = self
            .state
            .table
            .get_mut(&victim)
            .expect("bound registers are in the register table");
        let address = self.state.spill.slot_for(reg)?;
        reg.allocated = false;
        debug!(
            "spilling {} from {} to {} (next use {:?})",
            victim, phys, address, reg.next_use
        );

        self.code.push(MachineInstr::Store { reg: phys, address });
        self.state.file.vacate(phys);
        Ok(phys)
    }
}

impl RegisterAllocator for BottomUp {
    fn allocate(&mut self, program: &mut [Instruction]) -> Result<Vec<MachineInstr>> {
        self.prepare(program);
        for index in 0..program.len() {
            self.allocate_instruction(program, index)?;
        }

        let code = std::mem::take(&mut self.code);
        info!(
            "allocated {} instructions onto {} registers: {} stores, {} spill slots",
            program.len(),
            self.state.file.len(),
            code.iter()
                .filter(|i| matches!(i, MachineInstr::Store { .. }))
                .count(),
            self.state.spill.slots_used(),
        );
        Ok(code)
    }
}

fn distinct<'a>(names: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen: Vec<String> = Vec::new();
    for name in names {
        if !seen.iter().any(|s| s == name) {
            seen.push(name.to_string());
        }
    }
    seen
}

fn rewrite(operands: &[Operand], assigned: &HashMap<String, PhysReg>) -> Vec<MachineOperand> {
    operands
        .iter()
        .map(|op| match op {
            Operand::Register(name) => match assigned.get(name) {
                Some(&phys) => MachineOperand::Reg(phys),
                None => MachineOperand::Literal(name.clone()),
            },
            Operand::Literal(text) => MachineOperand::Literal(text.clone()),
        })
        .collect()
}
