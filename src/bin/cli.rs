//! regex2fsm CLI - regular expressions to finite-state machines.
//!
//! Usage:
//!   regex2fsm check <expr>              # Validate, print canonical form
//!   regex2fsm derive <expr> <letter>    # Derivative by one letter
//!   regex2fsm build <expr>              # Construct the machine
//!   regex2fsm build <expr> --ask        # Ask before creating unmatched states
//!   regex2fsm build <expr> --json       # Machine snapshot as JSON
//!   regex2fsm eval <expr> <word>        # Trace a word through the machine
//!   regex2fsm config                    # Print the effective configuration

use anyhow::{ensure, Context, Result};
use clap::{Parser, Subcommand};
use regex2fsm::config::Config;
use regex2fsm::fsm::{FiniteStateMachine, FnResolver, PendingQuestion, Resolution, StateId};
use regex2fsm::regex::RegularExpression;
use std::io::{self, BufRead};
use std::path::{Path, PathBuf};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "regex2fsm")]
#[command(about = "regex2fsm - finite-state machines from regular expressions", long_about = None)]
struct Cli {
    /// Config file (default: ./regex2fsm.toml when present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate an expression and print its canonical form and alphabet
    Check {
        /// Expression, e.g. "0+1(0+1)^*"
        expression: String,
    },

    /// Print the derivative of an expression by one letter
    Derive {
        expression: String,
        letter: char,
    },

    /// Construct the finite-state machine of an expression
    Build {
        expression: String,

        /// Ask on stdin whenever an expression matches no state syntactically
        #[arg(long)]
        ask: bool,

        /// Print the machine snapshot as JSON
        #[arg(long)]
        json: bool,
    },

    /// Trace a word through the machine and report acceptance
    Eval {
        expression: String,

        /// Word to evaluate (may be empty)
        #[arg(default_value = "")]
        word: String,
    },

    /// Print the effective configuration as TOML
    Config,
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = load_config(cli.config.as_deref())?;
    init_logging(&config);

    match cli.command {
        Commands::Check { expression } => check(&expression),
        Commands::Derive { expression, letter } => derive(&expression, letter),
        Commands::Build {
            expression,
            ask,
            json,
        } => build(&expression, &config, ask, json),
        Commands::Eval { expression, word } => eval(&expression, &word, &config),
        Commands::Config => {
            print!("{}", config.to_toml_string()?);
            Ok(())
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => Config::load(path)
            .with_context(|| format!("failed to load config from {}", path.display())),
        None => Ok(Config::discover(Path::new("."))?),
    }
}

/// `RUST_LOG` wins over the configured filter.
fn init_logging(config: &Config) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.filter));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

fn parse_expression(text: &str) -> Result<RegularExpression> {
    RegularExpression::new(text).with_context(|| format!("cannot parse '{}'", text))
}

fn check(text: &str) -> Result<()> {
    let expression = parse_expression(text)?;
    println!("✓ Valid expression");
    println!("  Canonical:  {}", expression.canonical()?);
    println!("  Alphabet:   {}", format_letters(expression.alphabet()?));
    println!(
        "  Empty word: {}",
        if expression.generates_empty_word()? { "yes" } else { "no" }
    );
    Ok(())
}

fn derive(text: &str, letter: char) -> Result<()> {
    let expression = parse_expression(text)?;
    match expression.derive(letter)? {
        Some(derived) => println!("{}", derived),
        None => println!("∅"),
    }
    Ok(())
}

fn construct(text: &str, config: &Config, ask: bool) -> Result<FiniteStateMachine> {
    let mut machine = FiniteStateMachine::with_config(text, config)
        .with_context(|| format!("cannot parse '{}'", text))?;
    if ask {
        machine.construct_all(&mut FnResolver(prompt))?;
    } else {
        machine.construct()?;
    }
    debug!(states = machine.states().len(), "machine built");
    Ok(machine)
}

fn build(text: &str, config: &Config, ask: bool, json: bool) -> Result<()> {
    let machine = construct(text, config, ask)?;
    let snapshot = machine.snapshot()?;

    if json {
        println!("{}", snapshot.to_json()?);
        return Ok(());
    }

    println!("Machine for {}", snapshot.expression);
    println!("══════════════════════════");
    println!();
    println!("States ({}):", snapshot.states.len());
    for state in &snapshot.states {
        let marker = if state.accepting { "*" } else { " " };
        println!("  {:>3}{} {}", state.id, marker, state.expression);
    }
    println!();
    println!("Transitions ({}):", snapshot.transitions.len());
    for t in &snapshot.transitions {
        println!("  {:>3} --{}--> {}", t.from, format_letters(&t.letters), t.to);
    }
    println!();
    println!("(* = accepting)");
    Ok(())
}

fn eval(text: &str, word: &str, config: &Config) -> Result<()> {
    let mut machine = construct(text, config, false)?;
    let letters: Vec<char> = word.chars().collect();

    machine.begin_evaluation(word)?;
    println!("start in state {}", machine.current_state_id());
    while machine.evaluate_step()? {
        let consumed = letters[machine.evaluation_position() - 1];
        match machine.current_state_id() {
            -1 => println!("  {} -> dead", consumed),
            id => println!("  {} -> state {}", consumed, id),
        }
    }

    let accepted = machine.is_evaluation_finished() && machine.is_accepting();
    ensure!(
        accepted == machine.expression().matches(word)?,
        "machine and derivatives disagree on '{}'",
        word
    );
    println!("{}", if accepted { "✓ accepted" } else { "✗ rejected" });
    Ok(())
}

/// Interactive answer for `build --ask`.
fn prompt(question: &PendingQuestion) -> Resolution {
    eprintln!();
    eprintln!("No state matches {} syntactically.", question.expression);
    for candidate in &question.candidates {
        eprintln!(
            "  [{}] {}  (similarity {:.2})",
            candidate.state, candidate.expression, candidate.similarity
        );
    }
    eprint!("Equivalent state id, or empty for a new state: ");

    let mut line = String::new();
    if io::stdin().lock().read_line(&mut line).is_err() {
        return Resolution::NewState;
    }
    match line.trim().parse::<StateId>() {
        Ok(id) if question.candidates.iter().any(|c| c.state == id) => Resolution::SameAs(id),
        _ => Resolution::NewState,
    }
}

fn format_letters(letters: &[char]) -> String {
    letters
        .iter()
        .map(|c| c.to_string())
        .collect::<Vec<_>>()
        .join(",")
}
