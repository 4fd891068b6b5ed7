mod def;
include!(concat!(env!("OUT_DIR"), "/rustc_version.rs"));
use clap::Parser;
use std::io::Read;
use yoml_rs::{load_str, Document, Eraser, ParseOptions};

pub mod log;
pub mod output;

/// Label used for standard input in messages and node origins.
const STDIN_LABEL: &str = "<stdin>";

/// One input of a command: a file path, or stdin.
struct Input {
    path: Option<String>,
}

impl Input {
    fn list(files: &[String]) -> Vec<Input> {
        if files.is_empty() {
            return vec![Input { path: None }];
        }
        files
            .iter()
            .map(|f| Input {
                path: (f != "-").then(|| f.clone()),
            })
            .collect()
    }

    fn label(&self) -> &str {
        self.path.as_deref().unwrap_or(STDIN_LABEL)
    }

    fn read(&self) -> Result<String, String> {
        match &self.path {
            Some(path) => std::fs::read_to_string(path)
                .map_err(|e| format!("Failed to read '{}': {}", path, e)),
            None => {
                let mut text = String::new();
                std::io::stdin()
                    .read_to_string(&mut text)
                    .map_err(|e| format!("Failed to read stdin: {}", e))?;
                Ok(text)
            }
        }
    }
}

/// Read and load every document of `input`.
///
/// With `secure_erase`, the input text is erased once parsed.
fn load(input: &Input, options: ParseOptions, secure_erase: bool) -> Result<Vec<Document>, String> {
    let text = input.read()?;
    ::log::debug!("loading {} ({} bytes)", input.label(), text.len());
    let options = options.origin(input.label());
    let result = load_str(&text, &options);
    if secure_erase {
        Eraser::default().erase_string(text);
    }
    result.map_err(|e| output::format_error(input.label(), &e))
}

pub fn run() -> Result<bool, String> {
    let cli = def::Args::parse();

    // Split log strings upon comma, trim them and flatten all in
    // `logs`, remove empty values
    let logs = cli.log.unwrap_or_else(Vec::new);
    let logs = logs
        .iter()
        .flat_map(|log| log.split(','))
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect::<Vec<&str>>();

    log::setup(cli.verbose, logs, cli.log_time)?;

    if cli.color && cli.no_color {
        return Err("Cannot use both --color and --no-color".to_string());
    }
    if cli.color {
        colored::control::set_override(true);
    }
    if cli.no_color {
        colored::control::set_override(false);
    }

    if cli.version {
        println!("version: {}", env!("CARGO_PKG_VERSION"));
        println!("tokenizer: yaml-rust2");
        println!("Rust: {}", RUSTC_VERSION);
        return Ok(true);
    }

    let options = if cli.secure_erase {
        ParseOptions::new().secure_erase()
    } else {
        ParseOptions::new()
    };

    match &cli.action {
        Some(def::Actions::Dump { files, raw }) => {
            let options = options.resolve(!raw);
            let mut first = true;
            for input in Input::list(files) {
                let docs = load(&input, options.clone(), cli.secure_erase)?;
                if docs.is_empty() {
                    continue;
                }
                if !first {
                    print!("{}", output::DOCUMENT_SEPARATOR);
                }
                first = false;
                print!("{}", output::render_documents(&docs));
            }
        }
        Some(def::Actions::Check { files }) => {
            let mut ok = true;
            for input in Input::list(files) {
                match load(&input, options.clone(), cli.secure_erase) {
                    Ok(docs) => {
                        ::log::info!("{}: {} document(s) ok", input.label(), docs.len());
                    }
                    Err(e) => {
                        ok = false;
                        if !cli.quiet {
                            output::print_error(&e);
                        }
                    }
                }
            }
            return Ok(ok);
        }
        Some(def::Actions::Anchors { files, raw }) => {
            let options = options.resolve(!raw);
            for input in Input::list(files) {
                for doc in load(&input, options.clone(), cli.secure_erase)? {
                    print!("{}", output::render_anchors(&doc));
                }
            }
        }
        None => {
            return Err("Missing action".to_string());
        }
    }
    Ok(true)
}
