use std::{fmt, io, path::PathBuf};

/// Everything that can stop an allocation run.
#[derive(Debug)]
pub enum Error {
    /// A source line could not be split into an opcode and its operands.
    MalformedInstruction {
        line: usize,
        text: String,
        reason: &'static str,
    },
    /// The physical register count is not a positive integer.
    InvalidRegisterCount(String),
    /// The spill slot size is not a positive integer.
    InvalidSlotSize(String),
    /// A spill slot would lie past the end of the address space.
    SpillAddressOverflow { register: String },
    /// The input could not be read or the output could not be written.
    Io { path: PathBuf, source: io::Error },
    /// The allocated program does not compute what the source program computes.
    VerificationFailed { line: usize, reason: String },
}

pub type Result<T> = std::result::Result<T, Error>;

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::MalformedInstruction { line, text, reason } => {
                write!(f, "malformed instruction at line {line}: {reason}: '{text}'")
            }
            Error::InvalidRegisterCount(value) => {
                write!(f, "register count must be a positive integer, got '{value}'")
            }
            Error::InvalidSlotSize(value) => {
                write!(f, "spill slot size must be a positive integer, got '{value}'")
            }
            Error::SpillAddressOverflow { register } => {
                write!(f, "no spill address left for {register}")
            }
            Error::Io { path, source } => write!(f, "{}: {}", path.display(), source),
            Error::VerificationFailed { line, reason } => {
                write!(f, "verification failed at output line {line}: {reason}")
            }
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}
