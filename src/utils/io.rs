//! Input helpers

use anyhow::{Context, Result};
use std::fs::File;
use std::io::{self, BufRead, BufReader};

/// Name which denotes standard input
pub const STDIN: &str = "-";

/// Open `name` for line-oriented reading; `-` reads from stdin
pub fn open_input(name: &str) -> Result<Box<dyn BufRead>> {
    if name == STDIN {
        return Ok(Box::new(io::stdin().lock()));
    }
    let file = File::open(name).with_context(|| format!("Failed to open input: {name}"))?;
    Ok(Box::new(BufReader::new(file)))
}
