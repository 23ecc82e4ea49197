use super::{Backend, MachineInstr, MachineOperand};

/// Renders the same textual instruction form the allocator reads.
pub struct TextBackend;

impl TextBackend {
    pub fn render_instr(instr: &MachineInstr) -> String {
        match instr {
            MachineInstr::Op {
                opcode,
                sources,
                targets,
            } => {
                let mut line = format!("{}\t{}", opcode, join(sources));
                if !targets.is_empty() {
                    line.push_str(" => ");
                    line.push_str(&join(targets));
                }
                line
            }
            MachineInstr::Load { address, reg } => format!("load\t{} => {}", address, reg),
            MachineInstr::Store { reg, address } => format!("store\t{} => {}", reg, address),
        }
    }
}

impl Backend for TextBackend {
    fn render(&self, code: &[MachineInstr]) -> Vec<String> {
        code.iter().map(Self::render_instr).collect()
    }
}

fn join(operands: &[MachineOperand]) -> String {
    operands
        .iter()
        .map(|op| op.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
