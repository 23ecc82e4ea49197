use std::fmt;

use indexmap::IndexSet;

/// Tokens starting with this character name virtual registers.
pub const REGISTER_PREFIX: char = 'r';

/// Separates source operands from target operands.
pub const ARROW: &str = "=>";

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Operand {
    Register(String),
    /// Immediates, addresses and labels. Copied through untouched.
    Literal(String),
}

impl Operand {
    pub fn classify(token: &str) -> Self {
        if token.starts_with(REGISTER_PREFIX) {
            Operand::Register(token.to_string())
        } else {
            Operand::Literal(token.to_string())
        }
    }

    pub fn register(&self) -> Option<&str> {
        match self {
            Operand::Register(name) => Some(name),
            Operand::Literal(_) => None,
        }
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Register(text) | Operand::Literal(text) => f.write_str(text),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Instruction {
    pub label: Option<String>,
    pub opcode: String,
    pub sources: Vec<Operand>,
    pub targets: Vec<Operand>,
    /// 1-based position in the program once comments and blank lines are dropped.
    pub line: usize,
    /// Virtual registers still live after this instruction.
    pub live: IndexSet<String>,
}

impl Instruction {
    pub fn new(opcode: &str, sources: Vec<Operand>, targets: Vec<Operand>, line: usize) -> Self {
        Self {
            label: None,
            opcode: opcode.to_string(),
            sources,
            targets,
            line,
            live: IndexSet::new(),
        }
    }

    pub fn source_registers(&self) -> impl Iterator<Item = &str> {
        self.sources.iter().filter_map(Operand::register)
    }

    pub fn target_registers(&self) -> impl Iterator<Item = &str> {
        self.targets.iter().filter_map(Operand::register)
    }

    /// Every register operand, sources before targets. May repeat a name.
    pub fn registers(&self) -> impl Iterator<Item = &str> {
        self.source_registers().chain(self.target_registers())
    }

    pub fn references(&self, name: &str) -> bool {
        self.registers().any(|reg| reg == name)
    }
}

/// Debug dump used by `--dump-analysis`.
impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}\topcode: {}", self.line, self.opcode)?;
        if !self.sources.is_empty() {
            write!(f, "\tsources: {}", join(&self.sources, " "))?;
        }
        if !self.targets.is_empty() {
            write!(f, "\ttargets: {}", join(&self.targets, " "))?;
        }
        write!(
            f,
            "\tlive: {{{}}}",
            self.live.iter().cloned().collect::<Vec<_>>().join(", ")
        )
    }
}

fn join(operands: &[Operand], sep: &str) -> String {
    operands
        .iter()
        .map(|op| op.to_string())
        .collect::<Vec<_>>()
        .join(sep)
}
