use std::fs::File;
use std::io::BufReader;
use std::process::ExitCode;

use anyhow::{Context, Result};

const USAGE: &str = "usage: moddesc-check [--json] [--tree] <descriptor.mod>...

Validates each descriptor file independently: a bad file is reported and
the rest are still checked. Exits nonzero if any file failed.

  --json   print each bound descriptor as JSON
  --tree   print each file's parse tree (diagnostic format)";

struct Options {
    json: bool,
    tree: bool,
    files: Vec<String>,
}

fn main() -> ExitCode {
    init_logging();

    let opts = match parse_args(std::env::args().skip(1)) {
        Some(opts) if !opts.files.is_empty() => opts,
        _ => {
            eprintln!("{USAGE}");
            return ExitCode::from(2);
        }
    };

    let mut failed = false;
    for path in &opts.files {
        // Every file is its own failure domain.
        if let Err(e) = check(path, &opts) {
            log::error!("{path}: {e:#}");
            failed = true;
        }
    }
    if failed { ExitCode::FAILURE } else { ExitCode::SUCCESS }
}

fn parse_args(args: impl Iterator<Item = String>) -> Option<Options> {
    let mut opts = Options { json: false, tree: false, files: Vec::new() };
    for arg in args {
        match arg.as_str() {
            "--json" => opts.json = true,
            "--tree" => opts.tree = true,
            "--help" | "-h" => return None,
            _ if arg.starts_with('-') => return None,
            _ => opts.files.push(arg),
        }
    }
    Some(opts)
}

fn check(path: &str, opts: &Options) -> Result<()> {
    let file = File::open(path).with_context(|| format!("opening {path}"))?;
    let root = moddesc::parse_reader(BufReader::new(file))?;
    if opts.tree {
        print!("{}", root.pretty());
    }

    let bound = moddesc::bind(moddesc::evaluate(root)?)?;
    for diagnostic in &bound.diagnostics {
        log::warn!("{path}: {diagnostic}");
    }

    if opts.json {
        println!("{}", serde_json::to_string_pretty(&bound.descriptor)?);
    } else {
        let d = &bound.descriptor;
        println!("{path}: ok ({} {})", d.name, d.version);
    }
    Ok(())
}

/// `RUST_LOG` when set, otherwise info level.
fn init_logging() {
    let mut builder = env_logger::Builder::new();
    if let Ok(filter) = std::env::var("RUST_LOG") {
        builder.parse_filters(&filter);
    } else {
        builder.filter_level(log::LevelFilter::Info);
    }
    builder.init();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Option<Options> {
        parse_args(list.iter().map(|s| s.to_string()))
    }

    #[test]
    fn flags_and_files() {
        let opts = args(&["--json", "a.mod", "b.mod"]).unwrap();
        assert!(opts.json);
        assert!(!opts.tree);
        assert_eq!(opts.files, vec!["a.mod", "b.mod"]);
    }

    #[test]
    fn unknown_flag_shows_usage() {
        assert!(args(&["--frobnicate", "a.mod"]).is_none());
    }

    #[test]
    fn help_shows_usage() {
        assert!(args(&["--help"]).is_none());
    }
}
