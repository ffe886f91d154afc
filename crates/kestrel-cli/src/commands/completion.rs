use anyhow::Result;
use clap::Command;
use clap_complete::{Shell, generate};
use std::io::{self, Write};

pub fn execute(shell: Shell, cmd: &mut Command) -> Result<()> {
    tracing::debug!("Generating {} completions", shell);
    write_completion(shell, cmd, &mut io::stdout())
}

/// Render the completion script for `shell` into `out`
pub fn write_completion<W: Write>(shell: Shell, cmd: &mut Command, out: &mut W) -> Result<()> {
    let bin_name = cmd.get_name().to_string();
    generate(shell, cmd, bin_name, out);
    out.flush()?;
    Ok(())
}
