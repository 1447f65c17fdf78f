//! Twig CLI
//!
//! `twigc <tree.json> [--pass <pass>] [--compact] [-o <out.json>]`

use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use clap::Parser;
use twig_tree::Tree;
use twigc::{init_tracing, json, run_pass, Pass};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Tree in nested-array JSON form; `-` reads stdin
    #[arg(value_name = "FILE")]
    input: PathBuf,

    /// Rewrite pass to run
    #[arg(short, long, value_enum, default_value_t = Pass::All)]
    pass: Pass,

    /// Write JSON on one line
    #[arg(short, long)]
    compact: bool,

    /// Output file (default: stdout)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,
}

fn read_input(path: &Path) -> io::Result<String> {
    if path.as_os_str() == "-" {
        let mut text = String::new();
        io::stdin().read_to_string(&mut text)?;
        Ok(text)
    } else {
        fs::read_to_string(path)
    }
}

fn run(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let text = read_input(&args.input)
        .map_err(|e| format!("failed to read {}: {e}", args.input.display()))?;
    let mut tree = Tree::from_value(&json::parse(&text)?);

    let report = run_pass(args.pass, &mut tree)?;

    if args.pass == Pass::Repeats {
        for finding in &report.findings {
            println!("{finding}");
        }
        println!("{} match(es)", report.matches);
        return Ok(());
    }

    let rendered = json::render(&tree.to_value(), !args.compact)?;
    match &args.output {
        Some(path) => fs::write(path, rendered + "\n")
            .map_err(|e| format!("failed to write {}: {e}", path.display()))?,
        None => println!("{rendered}"),
    }
    eprintln!("{} match(es) rewritten", report.matches);
    Ok(())
}

fn main() {
    init_tracing();
    let args = Args::parse();
    if let Err(err) = run(&args) {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}
