use std::path::PathBuf;

use clap::{ArgAction, Parser};

use crate::allocator::spill::{DEFAULT_BASE_ADDRESS, DEFAULT_SLOT_SIZE};
use crate::allocator::AllocatorConfig;
use crate::error::{Error, Result};
use crate::frontend::ParseOptions;

#[derive(Parser, Debug)]
#[command(name = "ralloc")]
#[command(about = "Local register allocator that rewrites virtual-register code onto k physical registers")]
pub struct Cli {
    /// Number of physical registers available
    #[arg(value_parser = parse_register_count)]
    pub registers: usize,

    /// Input program, or '-' for stdin
    pub input: PathBuf,

    /// Where to write the allocated program (stdout when omitted)
    pub output: Option<PathBuf>,

    /// Address of the first spill slot
    #[arg(long, default_value_t = DEFAULT_BASE_ADDRESS)]
    pub base_address: u64,

    /// Bytes per spill slot
    #[arg(long, default_value_t = DEFAULT_SLOT_SIZE, value_parser = parse_slot_size)]
    pub slot_size: u64,

    /// The first token of every line is a label
    #[arg(long)]
    pub label_column: bool,

    /// Print the register table and live sets to stderr
    #[arg(long)]
    pub dump_analysis: bool,

    /// Check the allocated program against the input before writing it
    #[arg(long)]
    pub verify: bool,

    /// More logging (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    pub fn parse() -> Self {
        Parser::parse()
    }

    pub fn config(&self) -> Result<AllocatorConfig> {
        Ok(AllocatorConfig::new(self.registers)?
            .with_base_address(self.base_address)
            .with_slot_size(self.slot_size)?
            .with_parse_options(ParseOptions {
                label_column: self.label_column,
            }))
    }

    pub fn log_level(&self) -> log::LevelFilter {
        match self.verbose {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        }
    }
}

fn parse_register_count(value: &str) -> Result<usize> {
    match value.parse::<usize>() {
        Ok(count) if count > 0 => Ok(count),
        _ => Err(Error::InvalidRegisterCount(value.to_string())),
    }
}

fn parse_slot_size(value: &str) -> Result<u64> {
    match value.parse::<u64>() {
        Ok(size) if size > 0 => Ok(size),
        _ => Err(Error::InvalidSlotSize(value.to_string())),
    }
}
