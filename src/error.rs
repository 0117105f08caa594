//! error.rs - Error type shared by the script parser, CLI and runtime.
//!
//! Every fallible operation in this crate returns a `Result<_, RemarkError>`.
//! Only the `remark` binary converts an error into a diagnostic and a
//! process exit code; library code never calls `process::exit` itself.

use std::fmt;

/// The single error type threaded through lexing, parsing, regex
/// compilation and argument handling.
///
/// Variants correspond to the failure kinds enumerated for this tool: bad
/// CLI flags, script syntax errors, regex compile failures, semantic errors
/// (duplicate names, out-of-range submatch indices) and I/O failures.
#[derive(Debug)]
pub enum RemarkError {
    /// The script file named on the command line does not exist or cannot
    /// be opened.
    ScriptNotFound { path: String },
    /// A lexer or parser error, with the file and 1-based line it occurred
    /// on.
    ScriptParse { file: String, line: u32, msg: String },
    /// A `regcomp`-equivalent failure compiling a pattern embedded in a
    /// script.
    RegexCompile { pattern: String, msg: String },
    /// A semantic error caught at parse time: unknown style/macro name,
    /// duplicate definition, or an out-of-range submatch back-reference.
    SemanticError { file: String, line: u32, msg: String },
    /// An invalid command-line argument (unparseable number, unknown wrap
    /// type, retain/prepend/append too long for the configured width).
    InvalidArg { msg: String },
    /// Wraps an underlying I/O failure (reading the script, reading stdin).
    Io(std::io::Error),
}

impl fmt::Display for RemarkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RemarkError::ScriptNotFound { path } => {
                write!(f, "cannot open script file: {path}")
            }
            RemarkError::ScriptParse { file, line, msg } => {
                write!(f, "{file}:{line}: {msg}")
            }
            RemarkError::RegexCompile { pattern, msg } => {
                write!(f, "cannot compile regex `{pattern}`: {msg}")
            }
            RemarkError::SemanticError { file, line, msg } => {
                write!(f, "{file}:{line}: {msg}")
            }
            RemarkError::InvalidArg { msg } => write!(f, "{msg}"),
            RemarkError::Io(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for RemarkError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RemarkError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for RemarkError {
    fn from(err: std::io::Error) -> Self {
        RemarkError::Io(err)
    }
}

pub type Result<T> = std::result::Result<T, RemarkError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_file_and_line() {
        let err = RemarkError::ScriptParse {
            file: "rules.rmk".into(),
            line: 12,
            msg: "unexpected token".into(),
        };
        assert_eq!(err.to_string(), "rules.rmk:12: unexpected token");
    }

    #[test]
    fn io_error_wraps_and_displays_source() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "nope");
        let err: RemarkError = io_err.into();
        assert!(err.to_string().contains("nope"));
    }
}
