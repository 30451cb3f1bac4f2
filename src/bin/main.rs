use lox_scan::{
    report::WriteReporter,
    scanner::Scanner,
};
use std::{
    env,
    io::{self, Write},
};

fn main() -> io::Result<()> {
    let mut stdout = io::stdout();

    let args: Vec<String> = env::args().collect();
    match args.len() {
        1 => run_prompt(&mut stdout)?,
        2 => {
            if !run_file(args[1].as_str(), &mut stdout)? {
                std::process::exit(65);
            }
        },
        _ => {
            writeln!(stdout, "Usage: lox-scan [script]")?;
            std::process::exit(64);
        },
    };

    Ok(())
}

/// Returns `false` if scanning reported any errors.
fn run_file<W: Write>(path: &str, out: &mut W) -> io::Result<bool> {
    let contents = std::fs::read_to_string(path)?;
    let mut reporter = WriteReporter::new(io::stderr());
    run(contents.as_str(), out, &mut reporter)?;
    Ok(!reporter.had_error())
}

fn run_prompt<W: Write>(out: &mut W) -> io::Result<()> {
    let mut buffer = String::new();
    let stdin = io::stdin();
    let mut reporter = WriteReporter::new(io::stderr());

    loop {
        write!(out, "> ")?;
        out.flush()?;

        buffer.clear();

        let num_bytes = stdin.read_line(&mut buffer)?;
        if num_bytes == 0 || buffer.trim_end_matches(&['\r', '\n'][..]).is_empty() {
            break;
        }

        // Each line is its own pass.
        reporter.reset();
        run(buffer.as_str(), out, &mut reporter)?;
    }

    Ok(())
}

fn run<W: Write>(source: &str, out: &mut W, reporter: &mut WriteReporter<io::Stderr>) -> io::Result<()> {
    let tokens = Scanner::new(source).scan_tokens(reporter);
    for token in tokens.iter() {
        writeln!(out, "{}", token)?;
    }
    Ok(())
}
