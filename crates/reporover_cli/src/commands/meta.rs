//! Shell completions and man pages, both generated from the clap definition.

use std::io::{self, Write};
use std::path::Path;

use clap::{Command, CommandFactory};
use clap_complete::Shell;

use crate::Cli;

fn command() -> Command {
    Cli::command().name("reporover")
}

fn write_completions(shell: Shell, out: &mut impl Write) {
    let mut cmd = command();
    let bin = cmd.get_name().to_string();
    clap_complete::generate(shell, &mut cmd, bin, out);
}

fn write_man_page(out: &mut impl Write) -> io::Result<()> {
    clap_mangen::Man::new(command()).render(out)
}

pub(crate) fn handle_completions(shell: Shell) -> Result<(), Box<dyn std::error::Error>> {
    let mut stdout = io::stdout().lock();
    write_completions(shell, &mut stdout);
    stdout.flush()?;
    Ok(())
}

/// Print the main page, or write a page per command into `dir`.
pub(crate) fn handle_man(dir: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let Some(dir) = dir else {
        let mut stdout = io::stdout().lock();
        write_man_page(&mut stdout)?;
        stdout.flush()?;
        return Ok(());
    };

    std::fs::create_dir_all(dir)?;
    clap_mangen::generate_to(command(), dir)?;
    println!("Generated man pages in: {}", dir.display());
    Ok(())
}
