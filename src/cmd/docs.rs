//! Generated documentation: shell completions and man pages.

use anyhow::{Context, Result};
use clap::{Command, CommandFactory};
use clap_complete::{generate, Shell};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use govgate::ui::{self, colors};

use crate::cli::Cli;

const BIN: &str = "govgate";

/// Write the completion script for `shell` to stdout.
pub fn cmd_completion(shell: Shell) -> Result<()> {
    write_completion(shell, &mut io::stdout());
    Ok(())
}

fn write_completion(shell: Shell, out: &mut dyn Write) {
    let mut cmd = Cli::command();
    generate(shell, &mut cmd, BIN, out);
}

/// One rendered man page.
struct Page {
    file_name: String,
    text: Vec<u8>,
}

fn render(cmd: Command, title: &str) -> Result<Page> {
    let man = clap_mangen::Man::new(cmd)
        .title(title.to_uppercase())
        .section("1")
        .date(env!("BUILD_DATE"))
        .source(format!("{} {}", BIN, env!("CARGO_PKG_VERSION")))
        .manual("govgate manual");
    let mut text = Vec::new();
    man.render(&mut text)
        .with_context(|| format!("Failed to render man page for {}", title))?;
    Ok(Page {
        file_name: format!("{}.1", title),
        text,
    })
}

/// `govgate.1` plus `govgate-<command>.1` for every subcommand.
fn pages() -> Result<Vec<Page>> {
    let root = Cli::command();
    let mut pages = vec![render(root.clone(), BIN)?];

    for sub in root.get_subcommands() {
        let title = format!("{}-{}", BIN, sub.get_name());
        let sub = sub
            .clone()
            .bin_name(format!("{} {}", BIN, sub.get_name()))
            .display_name(title.clone())
            .version(env!("CARGO_PKG_VERSION"));
        pages.push(render(sub, &title)?);
    }
    Ok(pages)
}

/// Write the man pages into `out_dir`, creating it if needed.
pub fn cmd_man(out_dir: &Path) -> Result<()> {
    let written = write_pages(out_dir)?;
    if !ui::is_quiet() {
        for path in &written {
            println!("{} {}", colors::success("✓"), path.display());
        }
    }
    Ok(())
}

fn write_pages(out_dir: &Path) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("Failed to create {}", out_dir.display()))?;

    let mut written = Vec::new();
    for page in pages()? {
        let path = out_dir.join(&page.file_name);
        std::fs::write(&path, &page.text)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        written.push(path);
    }
    Ok(written)
}
