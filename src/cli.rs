use std::fs;

use crate::config::{load_config, validate_config, SearchConfig, DEFAULT_CONFIG_PATH};
use crate::eval::panel::PanelEvaluator;
use crate::rng::Rng;
use crate::search::run_search;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Optimize,
    Validate,
    Memory,
}

pub fn parse_command(args: &[String]) -> Option<Command> {
    match args.get(1).map(String::as_str) {
        Some("optimize") => Some(Command::Optimize),
        Some("validate") => Some(Command::Validate),
        Some("memory") => Some(Command::Memory),
        _ => None,
    }
}

pub fn run_with_args(args: &[String]) -> i32 {
    match parse_command(args) {
        Some(Command::Optimize) => handle_optimize(args),
        Some(Command::Validate) => handle_validate(args),
        Some(Command::Memory) => handle_memory(args),
        None => {
            eprintln!("usage: longeron <optimize|validate|memory> [config|archive] [seed]");
            2
        }
    }
}

fn handle_optimize(args: &[String]) -> i32 {
    let config_path = args.get(2).map(String::as_str).unwrap_or(DEFAULT_CONFIG_PATH);
    let config = match load_config(config_path) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{err}");
            return 1;
        }
    };

    let mut rng = match args.get(3) {
        Some(raw) => match raw.parse::<u64>() {
            Ok(seed) => Rng::new(seed),
            Err(_) => {
                eprintln!("invalid seed '{raw}': expected an unsigned integer");
                return 2;
            }
        },
        None => Rng::from_entropy(),
    };
    let evaluator = PanelEvaluator::new(rng.next_u64());

    let outcome = match run_search(&config, &evaluator, &mut rng, |update| {
        eprintln!(
            "[{}] {}/{} | calls {} | eta {}",
            update.phase, update.done, update.total, update.calls_done, update.eta
        );
    }) {
        Ok(outcome) => outcome,
        Err(err) => {
            eprintln!("{err}");
            return 1;
        }
    };

    match serde_json::to_string_pretty(&outcome) {
        Ok(payload) => {
            println!("{payload}");
            if outcome.feasible {
                0
            } else {
                eprintln!("no feasible design found");
                1
            }
        }
        Err(err) => {
            eprintln!("failed to serialize search outcome: {err}");
            1
        }
    }
}

fn handle_validate(args: &[String]) -> i32 {
    let config_path = args.get(2).map(String::as_str).unwrap_or(DEFAULT_CONFIG_PATH);
    let config = match load_config(config_path) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{err}");
            return 1;
        }
    };

    let report = validate_config(&config);
    for diagnostic in &report.diagnostics {
        eprintln!("- {diagnostic}");
    }
    if report.has_errors() {
        eprintln!("validation failed: {config_path}");
        1
    } else {
        println!("validation passed: {config_path}");
        0
    }
}

fn handle_memory(args: &[String]) -> i32 {
    let default_path = SearchConfig::default().memory_path;
    let path = args.get(2).map(String::as_str).unwrap_or(&default_path);

    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            println!("memory archive {path} not found: no elites recorded yet");
            return 0;
        }
        Err(err) => {
            eprintln!("cannot read memory archive {path}: {err}");
            return 1;
        }
    };
    let entries: Vec<Vec<f64>> = match serde_json::from_str(&raw) {
        Ok(entries) => entries,
        Err(err) => {
            eprintln!("memory archive {path} is not valid: {err}");
            return 1;
        }
    };

    println!("memory archive {path}: {} entr(ies)", entries.len());
    match serde_json::to_string_pretty(&entries) {
        Ok(payload) => {
            println!("{payload}");
            0
        }
        Err(err) => {
            eprintln!("failed to serialize memory archive: {err}");
            1
        }
    }
}
