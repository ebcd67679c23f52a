use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;

use tatu::builder::ProgramBuilder;
use tatu::evaluator::Interpreter;
use tatu::pretty::Pretty;
use tatu::value::Value;
use tatu::{Error, ParseErrorKind};

const VERSION: &str = env!("CARGO_PKG_VERSION");
const REPL_NAME: &str = "<repl>";

#[derive(Debug, Default)]
struct Options {
    print_tokens: bool,
    print_ast: bool,
    quiet: bool,
    file: Option<PathBuf>,
}

fn main() -> ExitCode {
    init_tracing();

    let options = match parse_args(std::env::args().skip(1)) {
        Ok(Some(options)) => options,
        Ok(None) => return ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("{message}");
            eprintln!("Try 'tatu --help' for usage information.");
            return ExitCode::FAILURE;
        }
    };
    let pretty = Pretty::new(std::io::stdout().is_terminal());

    match &options.file {
        Some(file) => run_file(file, &options, pretty),
        None => run_repl(pretty),
    }
}

/// Enable with `RUST_LOG=tatu=debug` or `RUST_LOG=tatu=trace`
fn init_tracing() {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    if std::env::var("RUST_LOG").is_ok() {
        tracing_subscriber::registry()
            .with(fmt::layer().with_writer(std::io::stderr).with_target(true))
            .with(EnvFilter::from_default_env())
            .init();
    }
}

/// `Ok(None)` when the invocation was fully handled (`--help`, `--version`)
fn parse_args(args: impl Iterator<Item = String>) -> Result<Option<Options>, String> {
    let mut options = Options::default();
    for arg in args {
        match arg.as_str() {
            "--print-tokens" => options.print_tokens = true,
            "--print-ast" => options.print_ast = true,
            "--quiet" | "-q" => options.quiet = true,
            "--help" | "-h" => {
                print_usage();
                return Ok(None);
            }
            "--version" | "-V" => {
                println!("tatu {VERSION}");
                return Ok(None);
            }
            flag if flag.starts_with('-') => return Err(format!("Unknown argument: {flag}")),
            file if options.file.is_none() => options.file = Some(PathBuf::from(file)),
            extra => return Err(format!("Unexpected argument: {extra}")),
        }
    }
    Ok(Some(options))
}

fn print_usage() {
    println!("Usage: tatu [OPTIONS] [FILE]");
    println!();
    println!("Runs FILE, or starts an interactive session when no file is given.");
    println!();
    println!("Options:");
    println!("  --print-tokens   Print the token stream before running");
    println!("  --print-ast      Print the syntax tree before running");
    println!("  --quiet, -q      Do not print the header");
    println!("  --version, -V    Print the version");
    println!("  --help, -h       Show this help message");
    println!();
    println!("Environment variables:");
    println!("  RUST_LOG=tatu=debug   Log include resolution and interpreter setup");
}

fn run_file(file: &Path, options: &Options, pretty: Pretty) -> ExitCode {
    let program = match ProgramBuilder::new().build_from_file(file) {
        Ok(program) => program,
        Err(error) => return report(&error, pretty),
    };

    if options.print_tokens {
        for token in &program.tokens {
            println!("{}", pretty.token(token));
        }
        println!();
    }
    if options.print_ast {
        println!("{}", pretty.ast(&program.nodes));
    }
    if !options.quiet {
        println!("{}", pretty.header(VERSION, &file.display().to_string()));
        println!("{}", pretty.result_banner());
    }

    let mut interpreter = Interpreter::new();
    for node in &program.nodes {
        match interpreter.eval(node) {
            Ok(value) => println!("{value}"),
            Err(error) => return report(&error, pretty),
        }
    }
    ExitCode::SUCCESS
}

fn report(error: &Error, pretty: Pretty) -> ExitCode {
    eprintln!("{}", render(error, pretty, None));
    ExitCode::FAILURE
}

/// The error next to its source line, read back from the file the error
/// points into (`repl_input` for errors in the interactive buffer)
fn render(error: &Error, pretty: Pretty, repl_input: Option<&str>) -> String {
    let source = match &error.location {
        Some(location) if location.file.ends_with(REPL_NAME) => repl_input.map(str::to_owned),
        Some(location) => std::fs::read_to_string(&*location.file).ok(),
        None => None,
    };
    pretty.error(error, source.as_deref())
}

fn run_repl(pretty: Pretty) -> ExitCode {
    println!("Tatu {VERSION}");
    println!("Enter S-expressions like: (+ 1 2)");
    println!("Type :help for more commands, or Ctrl+D to exit.");
    println!();

    let mut editor = match DefaultEditor::new() {
        Ok(editor) => editor,
        Err(err) => {
            eprintln!("Could not initialize REPL: {err}");
            return ExitCode::FAILURE;
        }
    };
    let mut builder = ProgramBuilder::new();
    let mut interpreter = Interpreter::new();
    let mut buffer = String::new();

    loop {
        let prompt = if buffer.is_empty() { "tatu> " } else { "...> " };
        let line = match editor.readline(prompt) {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) if !buffer.is_empty() => {
                buffer.clear();
                continue;
            }
            Err(ReadlineError::Eof | ReadlineError::Interrupted) => {
                println!("Goodbye!");
                break;
            }
            Err(err) => {
                eprintln!("Error: {err}");
                return ExitCode::FAILURE;
            }
        };

        if buffer.is_empty() {
            match line.trim() {
                "" => continue,
                ":help" => {
                    print_repl_help();
                    continue;
                }
                ":env" => {
                    print_environment(&interpreter);
                    continue;
                }
                ":quit" | ":exit" => {
                    println!("Goodbye!");
                    break;
                }
                _ => {}
            }
        }

        buffer.push_str(&line);
        buffer.push('\n');

        let program = match builder.build_from_source(&buffer, REPL_NAME) {
            Ok(program) => program,
            Err(error) if error.parse_kind() == Some(ParseErrorKind::Incomplete) => continue,
            Err(error) => {
                eprintln!("{}", render(&error, pretty, Some(&buffer)));
                buffer.clear();
                continue;
            }
        };
        let source = std::mem::take(&mut buffer);
        let _ = editor.add_history_entry(source.trim_end());

        for node in &program.nodes {
            match interpreter.eval(node) {
                Ok(value) => println!("{value}"),
                Err(error) => {
                    eprintln!("{}", render(&error, pretty, Some(&source)));
                    break;
                }
            }
        }
    }
    ExitCode::SUCCESS
}

fn print_repl_help() {
    println!("Commands:");
    println!("  :help   - Show this help message");
    println!("  :env    - Show global bindings and native functions");
    println!("  :quit   - Exit the interpreter");
    println!("  Ctrl+D  - Exit the interpreter");
    println!();
    println!("Unfinished expressions continue on the next line.");
    println!();
    println!("Examples:");
    println!("  (+ 1 2 3)");
    println!("  (def square (x) (* x x))");
    println!("  (vec:push (vector 1 2) 3)");
    println!("  (include \"lib.tatu\")");
}

fn print_environment(interpreter: &Interpreter) {
    let bindings = interpreter.globals().bindings();
    let natives = interpreter.natives().names();

    println!("Native functions ({}):", natives.len());
    let mut col = 0;
    for name in natives {
        print!("  {name:<16}");
        col += 1;
        if col % 4 == 0 {
            println!();
        }
    }
    if col % 4 != 0 {
        println!();
    }
    println!();

    if bindings.is_empty() {
        println!("No global bindings.");
        return;
    }
    println!("Global bindings ({}):", bindings.len());
    for (name, value) in bindings {
        match value {
            Value::Function(_) | Value::NativeFunction(_) => println!("  {name} : {}", value.value_type()),
            value => println!("  {name} = {value}"),
        }
    }
}
