// tracerun: run a learner program and print its execution trace.

use std::fs;
use std::path::Path;
use std::process::ExitCode;

use tracerun::context::EvaluationContext;
use tracerun::frame::FrameStatus;
use tracerun::{interpret, Language};

fn usage(program_name: &str) {
    eprintln!(
        "Usage: {} <file.lesson|file.js|file.py> [--seed N] [--json]",
        program_name
    );
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --seed N   Seed the randomness service for a reproducible run");
    eprintln!("  --json     Print the full trace as JSON instead of a summary");
}

fn language_for(path: &Path) -> Option<Language> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("lesson") => Some(Language::Lesson),
        Some("js") => Some(Language::JavaScript),
        Some("py") => Some(Language::Python),
        _ => None,
    }
}

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().collect();
    let program_name = args.first().map(|s| s.as_str()).unwrap_or("tracerun");

    let mut file = None;
    let mut seed = None;
    let mut json = false;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--json" => json = true,
            "--seed" => {
                i += 1;
                seed = match args.get(i).and_then(|s| s.parse::<u64>().ok()) {
                    Some(n) => Some(n),
                    None => {
                        eprintln!("Error: --seed needs a number");
                        return ExitCode::FAILURE;
                    }
                };
            }
            other if file.is_none() => file = Some(other.to_string()),
            other => {
                eprintln!("Error: unexpected argument '{}'", other);
                usage(program_name);
                return ExitCode::FAILURE;
            }
        }
        i += 1;
    }

    let Some(file) = file else {
        eprintln!("Error: no input file provided");
        eprintln!();
        usage(program_name);
        return ExitCode::FAILURE;
    };

    let path = Path::new(&file);
    if !path.exists() {
        eprintln!("Error: file '{}' not found", file);
        return ExitCode::FAILURE;
    }

    let Some(language) = language_for(path) else {
        eprintln!("Error: cannot tell the language from the file extension");
        usage(program_name);
        return ExitCode::FAILURE;
    };

    let source = match fs::read_to_string(path) {
        Ok(source) => source,
        Err(err) => {
            eprintln!("Error: could not read '{}': {}", file, err);
            return ExitCode::FAILURE;
        }
    };

    let context = EvaluationContext {
        random_seed: seed,
        ..EvaluationContext::default()
    };

    let result = interpret(language, &source, &context);

    if json {
        match serde_json::to_string_pretty(&result) {
            Ok(output) => println!("{}", output),
            Err(err) => {
                eprintln!("Error: could not serialize the trace: {}", err);
                return ExitCode::FAILURE;
            }
        }
        return if result.success {
            ExitCode::SUCCESS
        } else {
            ExitCode::FAILURE
        };
    }

    if let Some(error) = &result.error {
        eprintln!("Syntax error: {}", error);
        return ExitCode::FAILURE;
    }

    for frame in &result.frames {
        let marker = match frame.status {
            FrameStatus::Success => " ",
            FrameStatus::Error => "!",
        };
        println!(
            "{} t={:<4} line {:<3} {}",
            marker,
            frame.time,
            frame.line,
            frame.description()
        );
    }

    if !result.log_lines.is_empty() {
        println!();
        println!("Output:");
        for line in &result.log_lines {
            println!("  {}", line.output);
        }
    }

    if result.success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
