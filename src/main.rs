use std::io::{self, BufRead, Write};

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use tallypad::Engine;
use tallypad::input::parse_line;

/// Interactive four-function calculator.
///
/// Keys are whitespace-separated tokens: digit runs ("12.5"), operators
/// (+ - * / x ÷), "=" to evaluate, "c" to clear, "n" to negate, "%" for
/// percent. Type "quit" to leave.
#[derive(Debug, Parser)]
#[command(name = "tallypad")]
struct Args {
    /// Keys to press before reading further input, e.g. `5 + 3 =`
    keys: Vec<String>,

    /// Echo the readout after every individual key press
    #[arg(long)]
    echo: bool,

    /// Print the expression snapshot as JSON after each line of input
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let mut engine = Engine::new();
    if args.echo {
        engine.set_on_display(|readout| println!("  {readout}"));
        engine.set_on_clear_label(|label| tracing::debug!(label, "clear button label"));
    }

    let seeded = args.keys.join(" ");
    if !seeded.is_empty() {
        for key in parse_line(&seeded) {
            engine.handle_input(key);
        }
        report(&engine, args.json)?;
    }

    let stdin = io::stdin();
    prompt(&engine)?;
    for line in stdin.lock().lines() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            prompt(&engine)?;
            continue;
        }
        if matches!(line, "q" | "quit" | "exit") {
            break;
        }
        for key in parse_line(line) {
            engine.handle_input(key);
        }
        report(&engine, args.json)?;
        prompt(&engine)?;
    }

    Ok(())
}

fn report(engine: &Engine, json: bool) -> Result<()> {
    println!("= {}", engine.display_value());
    if json {
        println!("{}", serde_json::to_string(engine.expression())?);
    }
    Ok(())
}

fn prompt(engine: &Engine) -> Result<()> {
    let mut out = io::stdout();
    write!(out, "[{}] > ", engine.clear_label())?;
    out.flush()?;
    Ok(())
}
