//! xtask - Build tasks for the recents loader
//!
//! Run with: cargo xtask <command>
//!
//! Commands:
//! - gen-docs: Generate man pages and COMMANDS.md from the CLI definitions

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Arg, Command, CommandFactory, Parser, Subcommand};

use recents_loader::cli::Cli;

const BIN: &str = "recents";

#[derive(Parser)]
#[command(name = "xtask")]
#[command(about = "Build tasks for the recents loader")]
struct Xtask {
    #[command(subcommand)]
    command: XtaskCommand,
}

#[derive(Subcommand)]
enum XtaskCommand {
    /// Generate documentation from CLI definitions
    #[command(name = "gen-docs")]
    GenDocs {
        /// Output directory (default: docs/)
        #[arg(long, short, default_value = "docs")]
        output: PathBuf,

        /// Generate man pages only
        #[arg(long)]
        man: bool,

        /// Generate COMMANDS.md only
        #[arg(long)]
        markdown: bool,
    },
}

fn main() -> Result<()> {
    let args = Xtask::parse();

    match args.command {
        XtaskCommand::GenDocs {
            output,
            man,
            markdown,
        } => {
            let gen_all = !man && !markdown;
            if gen_all || man {
                generate_man_pages(&output)?;
            }
            if gen_all || markdown {
                generate_markdown(&output)?;
            }
        }
    }

    Ok(())
}

fn visible_subcommands(cmd: &Command) -> impl Iterator<Item = &Command> {
    cmd.get_subcommands().filter(|c| !c.is_hide_set())
}

/// Arguments worth documenting: everything but the generated help/version flags.
fn documented_args(cmd: &Command) -> Vec<&Arg> {
    cmd.get_arguments()
        .filter(|a| {
            let id = a.get_id().as_str();
            id != "help" && id != "version"
        })
        .collect()
}

fn flag_label(arg: &Arg) -> String {
    if arg.is_positional() {
        return format!("<{}>", arg.get_id().as_str().to_uppercase());
    }
    let long = arg.get_long().map(|l| format!("--{}", l));
    let short = arg.get_short().map(|s| format!("-{}", s));
    match (short, long) {
        (Some(s), Some(l)) => format!("{}, {}", s, l),
        (Some(s), None) => s,
        (None, Some(l)) => l,
        (None, None) => arg.get_id().to_string(),
    }
}

/// Generate man pages using clap_mangen, one per (nested) subcommand
fn generate_man_pages(output: &Path) -> Result<()> {
    let man_dir = output.join("man");
    fs::create_dir_all(&man_dir).context("Failed to create man directory")?;

    let cmd = Cli::command();
    write_man_page(&man_dir, BIN, &cmd)?;
    for sub in visible_subcommands(&cmd) {
        let name = format!("{}-{}", BIN, sub.get_name());
        write_man_page(&man_dir, &name, sub)?;
        for nested in visible_subcommands(sub) {
            write_man_page(
                &man_dir,
                &format!("{}-{}", name, nested.get_name()),
                nested,
            )?;
        }
    }

    println!("Man pages generated in {}", man_dir.display());
    Ok(())
}

fn write_man_page(dir: &Path, name: &str, cmd: &Command) -> Result<()> {
    let mut buffer = Vec::new();
    clap_mangen::Man::new(cmd.clone()).render(&mut buffer)?;
    let path = dir.join(format!("{}.1", name));
    fs::write(&path, buffer).with_context(|| format!("Failed to write {}", path.display()))?;
    println!("Generated: {}", path.display());
    Ok(())
}

/// Generate COMMANDS.md markdown documentation
fn generate_markdown(output: &Path) -> Result<()> {
    fs::create_dir_all(output).context("Failed to create output directory")?;

    let cmd = Cli::command();
    let mut md = String::new();

    md.push_str("# Recents Command Reference\n\n");
    md.push_str("This document is auto-generated from the CLI definitions.\n\n");
    md.push_str("## Table of Contents\n\n");
    for sub in visible_subcommands(&cmd) {
        let name = sub.get_name();
        md.push_str(&format!("- [{}](#{}-{})\n", name, BIN, name));
    }
    md.push_str("\n---\n\n");

    md.push_str(&format!("## {}\n\n", BIN));
    if let Some(about) = cmd.get_about() {
        md.push_str(&format!("{}\n\n", about));
    }
    push_options(&mut md, &cmd, "###");
    push_long_about(&mut md, &cmd);

    for sub in visible_subcommands(&cmd) {
        let name = sub.get_name();
        md.push_str(&format!("## {} {}\n\n", BIN, name));
        if let Some(about) = sub.get_about() {
            md.push_str(&format!("{}\n\n", about));
        }
        push_options(&mut md, sub, "###");
        push_long_about(&mut md, sub);

        for nested in visible_subcommands(sub) {
            md.push_str(&format!("### {} {} {}\n\n", BIN, name, nested.get_name()));
            if let Some(about) = nested.get_about() {
                md.push_str(&format!("{}\n\n", about));
            }
            push_options(&mut md, nested, "####");
            push_long_about(&mut md, nested);
        }

        md.push_str("---\n\n");
    }

    md.push_str("\n*Generated by `cargo xtask gen-docs`*\n");

    let output_path = output.join("COMMANDS.md");
    fs::write(&output_path, md)?;
    println!("Generated: {}", output_path.display());
    Ok(())
}

fn push_options(md: &mut String, cmd: &Command, heading: &str) {
    let args = documented_args(cmd);
    if args.is_empty() {
        return;
    }
    md.push_str(&format!("{} Options\n\n", heading));
    for arg in args {
        md.push_str(&format!("- `{}`", flag_label(arg)));
        if let Some(help) = arg.get_help() {
            md.push_str(&format!(": {}", help));
        }
        md.push('\n');
    }
    md.push('\n');
}

fn push_long_about(md: &mut String, cmd: &Command) {
    if let Some(long_about) = cmd.get_long_about() {
        md.push_str("```\n");
        md.push_str(&format!("{}\n", long_about));
        md.push_str("```\n\n");
    }
}
