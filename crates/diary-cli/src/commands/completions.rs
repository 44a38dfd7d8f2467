use std::io::{self, Write};
use std::path::{Path, PathBuf};

use clap::CommandFactory;
use clap_complete::aot::Generator;
use clap_complete::{generate, shells};

use crate::cli::{Cli, CompletionShell};
use crate::error::CliError;

pub fn run_completions(shell: CompletionShell, output_path: Option<&Path>) -> Result<(), CliError> {
    let buffer = render_completions(shell);

    if let Some(path) = output_path {
        let path = completion_target(shell, path);
        std::fs::write(&path, &buffer)?;
        println!("{}", path.display());
    } else {
        io::stdout().write_all(&buffer)?;
    }

    Ok(())
}

/// File name each shell looks for when loading completions for `diary`
pub const fn completion_file_name(shell: CompletionShell) -> &'static str {
    match shell {
        CompletionShell::Bash => "diary",
        CompletionShell::Zsh => "_diary",
        CompletionShell::Fish => "diary.fish",
    }
}

/// A directory output (e.g. `~/.local/share/bash-completion/completions`) gets the shell's file name
pub fn completion_target(shell: CompletionShell, output_path: &Path) -> PathBuf {
    if output_path.is_dir() {
        output_path.join(completion_file_name(shell))
    } else {
        output_path.to_path_buf()
    }
}

pub fn render_completions(shell: CompletionShell) -> Vec<u8> {
    let mut command = Cli::command();
    let mut buffer = Vec::new();
    match shell {
        CompletionShell::Bash => generate_for_shell(shells::Bash, &mut command, &mut buffer),
        CompletionShell::Zsh => generate_for_shell(shells::Zsh, &mut command, &mut buffer),
        CompletionShell::Fish => generate_for_shell(shells::Fish, &mut command, &mut buffer),
    }
    buffer
}

fn generate_for_shell<G: Generator>(
    generator: G,
    command: &mut clap::Command,
    buffer: &mut Vec<u8>,
) {
    generate(generator, command, "diary", buffer);
}
