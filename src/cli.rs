//! cli.rs - Command-line argument parsing for `remark` (component J).
//!
//! Flag surface: `-p/--prepend`, `-a/--append`, `-r/--retain`, `-w/--width`,
//! `-f/--wrap`, `--help`, `--version`. Parsed by hand with a manual
//! `parse_arg_value` loop rather than pulling in an argument-parsing crate.

use crate::error::RemarkError;
use crate::wrapper::WrapMode;

/// Parsed command-line invocation of the `remark` binary.
#[derive(Debug, PartialEq)]
pub struct Cli {
    /// Path to the script file (first positional argument).
    pub script: String,
    /// Remaining positional arguments, each processed as one input line.
    /// Empty means "read lines from stdin instead".
    pub texts: Vec<String>,
    /// `-p/--prepend` literal, run through the script's `prepend_rule`
    /// before becoming wrapper decoration.
    pub prepend: String,
    /// `-a/--append` literal, same treatment via `append_rule`.
    pub append: String,
    /// `-r/--retain` - bytes of the first segment carried onto every
    /// continuation segment.
    pub retain: usize,
    /// `-w/--width` - wrap width in bytes. Defaults to 80.
    pub width: usize,
    /// `-f/--wrap` mode. Defaults to `Char` when the flag is never given.
    pub wrap: WrapMode,
    /// The optional `:ARGS` suffix on `-f/--wrap`, parsed and stored but not
    /// currently acted on (matching `identify_wrapper`'s historical shape).
    pub wrap_args: Option<String>,
}

/// What `parse_args` found: a script ready to run, or one of the two
/// informational flags that short-circuit before any script is loaded.
#[derive(Debug, PartialEq)]
pub enum ParsedArgs {
    Run(Cli),
    Help,
    Version,
}

/// Parses `remark`'s own argv (with the program name already stripped).
///
/// Returns [`ParsedArgs::Help`]/[`ParsedArgs::Version`] when `--help`/`-h` or
/// `--version`/`-v` was given, so the caller can print only the matching
/// text (`--version` alone must not also print the help text) rather than
/// run a script; callers do that themselves with
/// [`help_text`]/`env!("CARGO_PKG_VERSION")`.
pub fn parse_args(args: Vec<String>) -> Result<ParsedArgs, RemarkError> {
    fn parse_arg_value<'a>(args: &'a [String], index: usize, long: &str, short: char) -> Result<(&'a str, usize), RemarkError> {
        let arg = args[index].as_str();
        let long_prefix = format!("--{long}=");
        let short_prefix = format!("-{short}");

        if let Some(value) = arg.strip_prefix(&long_prefix) {
            if value.is_empty() {
                return Err(RemarkError::InvalidArg { msg: format!("missing value for --{long}") });
            }
            Ok((value, index + 1))
        } else if arg == format!("--{long}") || arg == short_prefix {
            if index + 1 >= args.len() {
                return Err(RemarkError::InvalidArg { msg: format!("missing value for --{long}") });
            }
            Ok((args[index + 1].as_str(), index + 2))
        } else {
            Err(RemarkError::InvalidArg { msg: format!("unexpected argument format: {arg}") })
        }
    }

    let mut prepend = String::new();
    let mut append = String::new();
    let mut retain: usize = 0;
    let mut width: usize = 80;
    let mut wrap = WrapMode::Char;
    let mut wrap_args: Option<String> = None;
    let mut positional = Vec::new();

    let mut i = 0;
    while i < args.len() {
        let arg = args[i].as_str();
        match arg {
            "--help" | "-h" => return Ok(ParsedArgs::Help),
            "--version" | "-v" => return Ok(ParsedArgs::Version),
            arg if arg.starts_with("--prepend") || arg == "-p" => {
                let (value, next_i) = parse_arg_value(&args, i, "prepend", 'p')?;
                prepend = value.to_string();
                i = next_i;
            }
            arg if arg.starts_with("--append") || arg == "-a" => {
                let (value, next_i) = parse_arg_value(&args, i, "append", 'a')?;
                append = value.to_string();
                i = next_i;
            }
            arg if arg.starts_with("--retain") || arg == "-r" => {
                let (value, next_i) = parse_arg_value(&args, i, "retain", 'r')?;
                retain = value
                    .parse()
                    .map_err(|_| RemarkError::InvalidArg { msg: format!("invalid retain value `{value}`") })?;
                i = next_i;
            }
            arg if arg.starts_with("--width") || arg == "-w" => {
                let (value, next_i) = parse_arg_value(&args, i, "width", 'w')?;
                width = value
                    .parse()
                    .map_err(|_| RemarkError::InvalidArg { msg: format!("invalid width value `{value}`") })?;
                i = next_i;
            }
            arg if arg.starts_with("--wrap") || arg == "-f" => {
                let (value, next_i) = parse_arg_value(&args, i, "wrap", 'f')?;
                let (mode_text, suffix) = match value.split_once(':') {
                    Some((mode, rest)) => (mode, Some(rest.to_string())),
                    None => (value, None),
                };
                wrap = parse_wrap_mode(mode_text)?;
                wrap_args = suffix;
                i = next_i;
            }
            _ => {
                positional.extend_from_slice(&args[i..]);
                break;
            }
        }
    }

    if positional.is_empty() {
        return Err(RemarkError::InvalidArg { msg: "no script file specified".to_string() });
    }
    if retain + prepend.len() + append.len() >= width {
        return Err(RemarkError::InvalidArg {
            msg: format!("retain ({retain}) + prepend + append must be less than width ({width})"),
        });
    }

    let script = positional.remove(0);
    Ok(ParsedArgs::Run(Cli { script, texts: positional, prepend, append, retain, width, wrap, wrap_args }))
}

/// Prefix-matches a wrap-mode name the way `identify_wrapper` in `wrap.c`
/// does: the shortest unambiguous prefix of `none`/`char`/`word` is enough.
fn parse_wrap_mode(text: &str) -> Result<WrapMode, RemarkError> {
    if text.is_empty() {
        return Err(RemarkError::InvalidArg { msg: "empty wrap mode".to_string() });
    }
    if "none".starts_with(text) {
        Ok(WrapMode::None)
    } else if "char".starts_with(text) {
        Ok(WrapMode::Char)
    } else if "word".starts_with(text) {
        Ok(WrapMode::Word)
    } else {
        Err(RemarkError::InvalidArg { msg: format!("unknown wrap mode `{text}`") })
    }
}

/// Help text for `--help`/`-h`.
pub fn help_text() -> &'static str {
    "remark - line-oriented text highlighter\n\
     \n\
     Usage: remark [OPTIONS] SCRIPT [TEXT...]\n\
     \n\
     Options:\n\
     \x20 -p, --prepend STRING   Literal prepended to every continuation segment\n\
     \x20 -a, --append STRING    Literal appended before every wrap break\n\
     \x20 -r, --retain N         Bytes of the first segment carried onto continuations\n\
     \x20 -w, --width N          Wrap width in bytes (default 80)\n\
     \x20 -f, --wrap MODE[:ARGS] Wrap mode: none|char|word (default char)\n\
     \x20 --help, -h             Show this help message\n\
     \x20 --version, -v          Show the installed version and exit\n\
     \n\
     With no TEXT arguments, lines are read from standard input.\n"
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    fn run_cli(parsed: ParsedArgs) -> Cli {
        match parsed {
            ParsedArgs::Run(cli) => cli,
            other => panic!("expected ParsedArgs::Run, got {other:?}"),
        }
    }

    #[test]
    fn parses_script_and_positional_texts() {
        let cli = run_cli(parse_args(args(&["script.rmk", "hello", "world"])).unwrap());
        assert_eq!(cli.script, "script.rmk");
        assert_eq!(cli.texts, vec!["hello", "world"]);
        assert_eq!(cli.wrap, WrapMode::Char);
        assert_eq!(cli.width, 80);
    }

    #[test]
    fn long_and_short_flags_are_equivalent() {
        let a = run_cli(parse_args(args(&["--width=40", "--wrap=word", "s.rmk"])).unwrap());
        let b = run_cli(parse_args(args(&["-w", "40", "-f", "word", "s.rmk"])).unwrap());
        assert_eq!(a.width, b.width);
        assert_eq!(a.wrap, b.wrap);
    }

    #[test]
    fn wrap_mode_prefix_matches() {
        let cli = run_cli(parse_args(args(&["-f", "n", "s.rmk"])).unwrap());
        assert_eq!(cli.wrap, WrapMode::None);
    }

    #[test]
    fn wrap_args_suffix_is_captured() {
        let cli = run_cli(parse_args(args(&["-f", "char:foo", "s.rmk"])).unwrap());
        assert_eq!(cli.wrap, WrapMode::Char);
        assert_eq!(cli.wrap_args.as_deref(), Some("foo"));
    }

    #[test]
    fn help_and_version_are_distinguished() {
        assert_eq!(parse_args(args(&["--help"])).unwrap(), ParsedArgs::Help);
        assert_eq!(parse_args(args(&["-h"])).unwrap(), ParsedArgs::Help);
        assert_eq!(parse_args(args(&["--version"])).unwrap(), ParsedArgs::Version);
        assert_eq!(parse_args(args(&["-v"])).unwrap(), ParsedArgs::Version);
    }

    #[test]
    fn missing_script_is_an_error() {
        assert!(parse_args(args(&["--width=40"])).is_err());
    }

    #[test]
    fn retain_too_wide_is_rejected() {
        let err = parse_args(args(&["-r", "80", "-w", "80", "s.rmk"])).unwrap_err();
        assert!(err.to_string().contains("less than width"));
    }
}
