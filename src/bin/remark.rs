//! remark - line-oriented text highlighter (binary entry point).
//!
//! Parses CLI flags, loads and parses the script file, then drives the
//! input loop (component L): positional `TEXT` arguments as literal lines,
//! or one line at a time from stdin, each run through `execute_script` and
//! written to stdout.

use std::fs;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use remark::buffer::LineBufferedWriter;
use remark::cli::{help_text, parse_args, ParsedArgs};
use remark::error::RemarkError;
use remark::parser::parse_script;
use remark::script::{execute_script, RemarkInput};
use remark::wrapper::WrapConfig;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();

    let cli = match parse_args(args) {
        Ok(ParsedArgs::Run(cli)) => cli,
        Ok(ParsedArgs::Help) => {
            print!("{}", help_text());
            return;
        }
        Ok(ParsedArgs::Version) => {
            println!("remark {}", env!("CARGO_PKG_VERSION"));
            return;
        }
        Err(err) => {
            eprintln!("remark: {err}");
            std::process::exit(1);
        }
    };

    if let Err(err) = run(cli) {
        eprintln!("remark: {err}");
        std::process::exit(1);
    }
}

fn run(cli: remark::cli::Cli) -> Result<(), RemarkError> {
    let script_path = Path::new(&cli.script);
    let source = fs::read_to_string(script_path).map_err(|_| RemarkError::ScriptNotFound { path: cli.script.clone() })?;
    let script_dir: PathBuf = script_path.parent().map(Path::to_path_buf).unwrap_or_else(|| PathBuf::from("."));
    let script = parse_script(&source, &cli.script, script_dir)?;

    let config = WrapConfig {
        width: cli.width,
        retain: cli.retain,
        mode: cli.wrap,
        prepend: Vec::new(),
        append: Vec::new(),
    };

    let stdout = io::stdout();
    let mut locked = stdout.lock();
    let mut writer = LineBufferedWriter::new(&mut locked);
    let mut input = RemarkInput::new();

    if !cli.texts.is_empty() {
        for text in &cli.texts {
            try_line(&script, &mut input, &config, &cli, text.as_bytes(), &mut writer)?;
        }
    } else {
        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            let line = line?;
            try_line(&script, &mut input, &config, &cli, line.as_bytes(), &mut writer)?;
        }
    }

    writer.flush()?;
    Ok(())
}

/// One full pass of loading a line into the main/append/prepend buffers,
/// executing the script, and writing the result (spec.md's "try-line").
fn try_line<W: Write>(
    script: &remark::script::Script,
    input: &mut RemarkInput,
    config: &WrapConfig,
    cli: &remark::cli::Cli,
    text: &[u8],
    out: &mut LineBufferedWriter<W>,
) -> Result<(), RemarkError> {
    input.load_line(text, cli.prepend.as_bytes(), cli.append.as_bytes());
    let mut bytes = Vec::new();
    if execute_script(script, input, config, &mut bytes) {
        out.write_all(&bytes)?;
    }
    Ok(())
}
