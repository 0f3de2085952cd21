use std::{
    io::{stdin, stdout, Write},
    path::PathBuf,
    process::ExitCode,
};

use clap::Parser;
use errors::SyntaxErrors;
use interpreter::{InterpretError, Interpreter, RuntimeError};
use itertools::Itertools;
use log::debug;

const EXIT_SYNTAX_ERROR: u8 = 65;
const EXIT_RUNTIME_ERROR: u8 = 70;

#[derive(clap::Parser)]
#[command(about = "A tree-walking interpreter for Lox")]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Print the tokens of a source file, one per line
    Tokenize { file: PathBuf },
    /// Parse a single expression and print its syntax tree
    Parse { file: PathBuf },
    /// Parse and evaluate a single expression
    Evaluate { file: PathBuf },
    /// Run a program
    Run { file: PathBuf },
}

fn tokenize(source: &str) -> ExitCode {
    let (tokens, errors) = scanner::scan(source);
    for error in &errors {
        eprintln!("{}", error);
    }
    println!("{}", tokens.iter().join("\n"));

    if errors.is_empty() {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(EXIT_SYNTAX_ERROR)
    }
}

fn parse_expression(source: &str) -> Result<parser::Expr<'_>, SyntaxErrors> {
    let (tokens, scan_errors) = scanner::scan(source);
    let result = parser::Parser::new(tokens).parse_expression();

    if scan_errors.is_empty() {
        return result;
    }

    let mut errors = SyntaxErrors::default();
    errors.extend(scan_errors);
    if let Err(parse_errors) = result {
        errors.extend(parse_errors.0);
    }
    Err(errors.sorted_by_line())
}

fn syntax_error(errors: &SyntaxErrors) -> ExitCode {
    eprintln!("{}", errors);
    ExitCode::from(EXIT_SYNTAX_ERROR)
}

fn runtime_error(error: &RuntimeError) -> ExitCode {
    eprintln!("{}\n[line {}]", error, error.line());
    ExitCode::from(EXIT_RUNTIME_ERROR)
}

fn parse(source: &str) -> ExitCode {
    match parse_expression(source) {
        Ok(expr) => {
            println!("{}", expr);
            ExitCode::SUCCESS
        }
        Err(errors) => syntax_error(&errors),
    }
}

fn evaluate(source: &str) -> ExitCode {
    let expr = match parse_expression(source) {
        Ok(expr) => expr,
        Err(errors) => return syntax_error(&errors),
    };

    match Interpreter::new(stdout()).evaluate(&expr) {
        Ok(value) => {
            println!("{}", value);
            ExitCode::SUCCESS
        }
        Err(error) => runtime_error(&error),
    }
}

fn run(source: &str, interpreter: &mut Interpreter<impl Write>) -> anyhow::Result<ExitCode> {
    match interpreter.run_source(source) {
        Ok(()) => Ok(ExitCode::SUCCESS),
        Err(InterpretError::Syntax(errors)) => Ok(syntax_error(&errors)),
        Err(InterpretError::Runtime(error)) => Ok(runtime_error(&error)),
        Err(error @ InterpretError::Output(_)) => Err(error.into()),
    }
}

fn run_prompt() -> anyhow::Result<ExitCode> {
    let mut interpreter = Interpreter::new(stdout());
    loop {
        print!("> ");
        stdout().flush()?;

        let mut line = String::new();
        if stdin().read_line(&mut line)? == 0 || line.trim() == "exit" {
            debug!("Leaving prompt");
            return Ok(ExitCode::SUCCESS);
        }

        // Errors are reported by `run`, the session continues either way.
        run(&line, &mut interpreter)?;
    }
}

fn main() -> anyhow::Result<ExitCode> {
    env_logger::init();
    let args = Args::parse();

    let Some(command) = args.command else {
        return run_prompt();
    };

    let (Command::Tokenize { file }
    | Command::Parse { file }
    | Command::Evaluate { file }
    | Command::Run { file }) = &command;
    let source = std::fs::read_to_string(file)?;

    match command {
        Command::Tokenize { .. } => Ok(tokenize(&source)),
        Command::Parse { .. } => Ok(parse(&source)),
        Command::Evaluate { .. } => Ok(evaluate(&source)),
        Command::Run { .. } => run(&source, &mut Interpreter::new(stdout())),
    }
}
