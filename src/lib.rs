pub mod allocator;
pub mod backend;
pub mod cli;
pub mod driver;
pub mod error;
pub mod frontend;
pub mod verification;

#[cfg(test)]
mod test_helpers;

use allocator::{Allocation, AllocatorConfig, BottomUp, RegisterAllocator};
use frontend::Parser;

pub use error::{Error, Result};

/// Parses `lines` and allocates them onto `config.registers()` physical registers.
pub fn allocate<I, S>(config: &AllocatorConfig, lines: I) -> Result<Allocation>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut program = Parser::new(config.parse_options()).parse_program(lines)?;
    let mut allocator = BottomUp::new(config);
    let code = allocator.allocate(&mut program)?;
    Ok(Allocation {
        program,
        code,
        state: allocator.into_state(),
    })
}
