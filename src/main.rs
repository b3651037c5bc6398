use std::fs;
use std::process;

use clap::{Parser as ClapParser, Subcommand};
use colored::Colorize;

use tattle::analyzer::analyze_json;
use tattle::report::Report;

#[derive(ClapParser)]
#[command(name = "tattle", about = "Beginner-mistake analyzer for parsed teaching-language code")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a parser-produced syntax tree (JSON file)
    Check {
        file: String,
        /// Emit the full report as JSON instead of rendering it
        #[arg(long)]
        json: bool,
        /// Exit non-zero if any issue was raised
        #[arg(long)]
        strict: bool,
    },
}

fn read_file(path: &str) -> Result<String, String> {
    fs::read_to_string(path).map_err(|e| format!("Cannot open file '{}': {}", path, e))
}

fn render_report(report: &Report) {
    if let Some(error) = &report.error {
        println!("{} {}", "error:".red().bold(), error);
    }

    for (kind, entries) in &report.issues {
        if entries.is_empty() {
            continue;
        }
        println!("{}", kind.as_str().yellow().bold());
        for entry in entries {
            let mut parts = Vec::new();
            if let Some(name) = &entry.name {
                parts.push(name.cyan().to_string());
            }
            if let Some(position) = &entry.position {
                parts.push(format!("line {}, column {}", position.line, position.column));
            }
            if let (Some(old), Some(new)) = (&entry.old, &entry.new) {
                parts.push(format!("{} -> {}", old, new));
            }
            if let (Some(left), Some(right)) = (&entry.left, &entry.right) {
                let operation = entry.operation.as_deref().unwrap_or("op");
                parts.push(format!("{}({}, {})", operation, left, right));
            }
            if let Some(type_name) = &entry.type_name {
                parts.push(type_name.clone());
            }
            println!("  {}", parts.join("  "));
        }
    }

    if report.issue_count() == 0 && report.success {
        println!("{}", "No issues found.".green());
    }

    if !report.top_level_variables.is_empty() {
        println!("{}", "Variables".bold());
        for (name, state) in &report.top_level_variables {
            println!(
                "  {} : {}  (set={}, read={}, over={})",
                name.cyan(),
                state.ty.display(),
                state.set.as_str(),
                state.read.as_str(),
                state.over.as_str()
            );
        }
    }
}

fn main() {
    let cli = Cli::parse();
    match cli.command {
        Commands::Check { file, json, strict } => {
            let source = match read_file(&file) {
                Ok(source) => source,
                Err(e) => {
                    eprintln!("{} {}", "error:".red().bold(), e);
                    process::exit(2);
                }
            };
            let report = analyze_json(&source);
            if json {
                match serde_json::to_string_pretty(&report) {
                    Ok(out) => println!("{}", out),
                    Err(e) => {
                        eprintln!("{} {}", "error:".red().bold(), e);
                        process::exit(2);
                    }
                }
            } else {
                render_report(&report);
            }
            if !report.success || (strict && report.issue_count() > 0) {
                process::exit(1);
            }
        }
    }
}
