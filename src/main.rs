use std::fs::File;
use std::io::{self, BufRead, BufReader, Read, Write};
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Parser as ClapParser;

use runic::ast_printer::AstPrinter;
use runic::error::Reporter;
use runic::interpreter::Interpreter;
use runic::parser::Parser;
use runic::scanner::Scanner;

/// Exit status for scan/parse/resolve errors.
const EXIT_COMPILE_ERROR: i32 = 65;

/// Exit status for runtime errors.
const EXIT_RUNTIME_ERROR: i32 = 70;

#[derive(ClapParser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Script to execute; omit to start the REPL
    script: Option<PathBuf>,

    /// Dump the scanned token stream instead of executing
    #[arg(long)]
    tokens: bool,

    /// Dump the parsed syntax tree instead of executing
    #[arg(long)]
    ast: bool,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let args: Cli = Cli::parse();

    match args.script {
        Some(path) => run_file(&path, args.tokens, args.ast),

        None => run_prompt(),
    }
}

fn read_source(path: &Path) -> anyhow::Result<String> {
    let file: File =
        File::open(path).with_context(|| format!("cannot open {}", path.display()))?;

    let mut buf: Vec<u8> = Vec::new();
    let mut reader: BufReader<File> = BufReader::new(file);
    reader.read_to_end(&mut buf)?;

    let source: String = String::from_utf8(buf)
        .with_context(|| format!("{} is not valid UTF-8", path.display()))?;

    Ok(source)
}

fn run_file(path: &Path, dump_tokens: bool, dump_ast: bool) -> anyhow::Result<()> {
    let source: String = read_source(path)?;

    let mut reporter: Reporter = Reporter::new();

    if dump_tokens {
        let tokens = Scanner::new(&source).scan_tokens(&mut reporter);

        for token in &tokens {
            println!("{}", token);
        }

        if reporter.had_error() {
            std::process::exit(EXIT_COMPILE_ERROR);
        }

        return Ok(());
    }

    if dump_ast {
        let tokens = Scanner::new(&source).scan_tokens(&mut reporter);
        let statements = Parser::new(tokens, &mut reporter).parse();

        if reporter.had_error() {
            std::process::exit(EXIT_COMPILE_ERROR);
        }

        for stmt in &statements {
            println!("{}", AstPrinter::print_stmt(stmt));
        }

        return Ok(());
    }

    let mut interpreter: Interpreter<io::Stdout> = Interpreter::new(io::stdout());

    runic::run(&source, &mut interpreter, &mut reporter);

    if reporter.had_error() {
        std::process::exit(EXIT_COMPILE_ERROR);
    }

    if reporter.had_runtime_error() {
        std::process::exit(EXIT_RUNTIME_ERROR);
    }

    Ok(())
}

/// Interactive prompt.  Globals and resolved bindings persist across
/// lines; error state is cleared at each new prompt.
fn run_prompt() -> anyhow::Result<()> {
    let stdin = io::stdin();

    let mut interpreter: Interpreter<io::Stdout> = Interpreter::new(io::stdout());
    let mut reporter: Reporter = Reporter::new();

    loop {
        print!("> ");
        io::stdout().flush()?;

        let mut line: String = String::new();

        if stdin.lock().read_line(&mut line)? == 0 {
            // end of input
            break;
        }

        runic::run(&line, &mut interpreter, &mut reporter);

        reporter.clear();
    }

    Ok(())
}
