use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use log::info;
use tempfile::NamedTempFile;

use crate::allocator::Allocation;
use crate::cli::Cli;
use crate::error::{Error, Result};
use crate::verification;

/// Reads the input, allocates, and writes the result. Nothing is written on failure.
pub fn run(cli: &Cli) -> Result<()> {
    let config = cli.config()?;
    let source = read_source(&cli.input)?;
    let allocation = crate::allocate(&config, source.lines())?;

    if cli.dump_analysis {
        dump_analysis(&allocation);
    }

    if cli.verify {
        verification::verify(&allocation.program, &allocation.code)?;
        info!(
            "verified; estimated {} cycles",
            verification::calculate_cycles(&allocation.code)
        );
    }

    write_output(cli.output.as_deref(), &allocation.lines())
}

fn read_source(path: &Path) -> Result<String> {
    let io_err = |source| Error::Io {
        path: path.to_path_buf(),
        source,
    };

    if path == Path::new("-") {
        let mut source = String::new();
        io::stdin().read_to_string(&mut source).map_err(io_err)?;
        Ok(source)
    } else {
        fs::read_to_string(path).map_err(io_err)
    }
}

/// Writes through a temporary file next to `path` so a failed run never
/// leaves a truncated output behind.
fn write_output(path: Option<&Path>, lines: &[String]) -> Result<()> {
    let Some(path) = path else {
        let stdout = io::stdout();
        let mut out = stdout.lock();
        return write_lines(&mut out, lines).map_err(|source| Error::Io {
            path: PathBuf::from("<stdout>"),
            source,
        });
    };

    let io_err = |source| Error::Io {
        path: path.to_path_buf(),
        source,
    };
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };

    let mut file = NamedTempFile::new_in(dir).map_err(io_err)?;
    write_lines(&mut file, lines).map_err(io_err)?;
    file.persist(path).map_err(|err| io_err(err.error))?;
    Ok(())
}

fn write_lines(out: &mut impl Write, lines: &[String]) -> io::Result<()> {
    for line in lines {
        writeln!(out, "{}", line)?;
    }
    out.flush()
}

fn dump_analysis(allocation: &Allocation) {
    eprintln!("registers:");
    for reg in allocation.state.table.iter() {
        eprintln!("  {}", reg);
    }
    eprintln!("instructions:");
    for inst in &allocation.program {
        eprintln!("  {}", inst);
    }
}
