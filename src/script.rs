//! script.rs - The script runtime (component F): owns the parsed
//! [`Script`] (styles, macros, rule trees) and drives a reusable
//! [`RemarkInput`] through one line at a time, per spec.md S4.7.
//!
//! Ported from `remark.c`'s `execute_script`/`try_line`.

use std::collections::HashMap;
use std::rc::Rc;

use crate::buffer::TextBuffer;
use crate::rmatch::MatchState;
use crate::rule::{execute, Action, MacroCell, Rule};
use crate::style::Style;
use crate::stylelist::StyleList;
use crate::wrapper::{materialize_whole, WrapConfig};

/// A parsed script: the style/macro tables plus the three rule trees
/// (spec.md S3). Owns every style, macro and rule node for the lifetime of
/// the run - macros and included sub-scripts share subtrees via `Rc` rather
/// than duplicating them (spec.md S9's DAG note).
pub struct Script {
    pub styles: HashMap<String, Rc<Style>>,
    pub macros: HashMap<String, MacroCell>,
    pub main_rule: Option<Rc<Rule>>,
    pub prepend_rule: Option<Rc<Rule>>,
    pub append_rule: Option<Rc<Rule>>,
}

/// One of the three independent match buffers a [`RemarkInput`] holds
/// (spec.md S3's "Match buffer"): a mutable byte buffer plus the style
/// range list accumulated against it.
#[derive(Default)]
pub struct MatchBuffer {
    pub buffer: TextBuffer,
    pub styles: StyleList,
}

impl MatchBuffer {
    fn load(&mut self, bytes: &[u8]) {
        self.buffer.set(bytes);
        self.styles.clear();
    }

    fn run(&mut self, rule: &Rc<Rule>) -> Action {
        let mut stack = vec![MatchState::root(0, self.buffer.len() as i64)];
        execute(rule, &mut stack, &mut self.buffer, &mut self.styles)
    }
}

/// The reusable per-line working state a script runs against: three
/// independent match buffers (main, append, prepend), cleared between
/// lines rather than reallocated (spec.md S3's "Lifecycle").
#[derive(Default)]
pub struct RemarkInput {
    pub main: MatchBuffer,
    pub append: MatchBuffer,
    pub prepend: MatchBuffer,
}

impl RemarkInput {
    pub fn new() -> Self {
        RemarkInput::default()
    }

    /// Loads one line of input: `text` into the main buffer, the
    /// CLI-configured `-p`/`-a` literals into the prepend/append buffers
    /// (still subject to `prepend_rule`/`append_rule` before they are used
    /// as decoration - see `remark.c`'s `try_line`). All three style lists
    /// are cleared.
    pub fn load_line(&mut self, text: &[u8], cli_prepend: &[u8], cli_append: &[u8]) {
        self.main.load(text);
        self.prepend.load(cli_prepend);
        self.append.load(cli_append);
    }
}

/// Runs `script` against one loaded line in `input`, writing the final
/// wrapped/styled output into `out` (spec.md S4.7).
///
/// Returns `false` when the main rule returned `Skip` at the top level - no
/// output is written and the caller should drop the line.
pub fn execute_script(script: &Script, input: &mut RemarkInput, config: &WrapConfig, out: &mut Vec<u8>) -> bool {
    if let Some(main_rule) = &script.main_rule {
        if input.main.run(main_rule) == Action::Skip {
            return false;
        }
    }

    let resolved_prepend = resolve_decoration(script.prepend_rule.as_ref(), &mut input.prepend);
    let resolved_append = resolve_decoration(script.append_rule.as_ref(), &mut input.append);

    let mut line_config = config.clone();
    line_config.prepend = resolved_prepend;
    line_config.append = resolved_append;

    crate::wrapper::wrap_line(input.main.buffer.as_bytes(), &input.main.styles, &line_config, out);
    input.main.styles.clear();
    true
}

/// Runs an optional prepend/append rule tree over its buffer, then
/// immediately materialises its styles (spec.md S4.7 step 2: "call S4.8
/// with ep = infinity") into a flat literal used as the wrapper's
/// prepend/append decoration for every segment of the main line.
fn resolve_decoration(rule: Option<&Rc<Rule>>, mb: &mut MatchBuffer) -> Vec<u8> {
    if let Some(rule) = rule {
        mb.run(rule);
    }
    let mut out = Vec::new();
    materialize_whole(mb.buffer.as_bytes(), &mb.styles, &mut out);
    mb.styles.clear();
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_script;
    use crate::wrapper::WrapMode;
    use std::path::PathBuf;

    fn config(mode: WrapMode, width: usize) -> WrapConfig {
        WrapConfig { width, retain: 0, mode, prepend: Vec::new(), append: Vec::new() }
    }

    #[test]
    fn identity_script_emits_line_unchanged() {
        let script = parse_script(r#" prepend { } append { } "#, "t.rmk", PathBuf::from(".")).unwrap();
        let mut input = RemarkInput::new();
        input.load_line(b"hello", b"", b"");
        let mut out = Vec::new();
        let kept = execute_script(&script, &mut input, &config(WrapMode::None, 80), &mut out);
        assert!(kept);
        assert_eq!(out, b"hello\n");
    }

    #[test]
    fn skip_rule_drops_the_line() {
        let script = parse_script(r#" "bad" skip "#, "t.rmk", PathBuf::from(".")).unwrap();
        let mut input = RemarkInput::new();
        input.load_line(b"this is bad", b"", b"");
        let mut out = Vec::new();
        let kept = execute_script(&script, &mut input, &config(WrapMode::None, 80), &mut out);
        assert!(!kept);
    }

    #[test]
    fn style_wraps_match_with_decoration() {
        let script = parse_script(
            r#" style "s" { prepend "<" append ">" } "ll" s "#,
            "t.rmk",
            PathBuf::from("."),
        )
        .unwrap();
        let mut input = RemarkInput::new();
        input.load_line(b"hello", b"", b"");
        let mut out = Vec::new();
        execute_script(&script, &mut input, &config(WrapMode::None, 80), &mut out);
        assert_eq!(out, b"he<ll>o\n");
    }

    #[test]
    fn char_wrap_splits_at_width() {
        let script = parse_script(r#" prepend { } "#, "t.rmk", PathBuf::from(".")).unwrap();
        let mut input = RemarkInput::new();
        input.load_line(b"abcdef", b"", b"");
        let mut out = Vec::new();
        execute_script(&script, &mut input, &config(WrapMode::Char, 3), &mut out);
        assert_eq!(out, b"abc\ndef\n");
    }

    #[test]
    fn cli_prepend_literal_decorates_continuation_segments() {
        let script = parse_script(r#" style "noop" prepend "" "#, "t.rmk", PathBuf::from(".")).unwrap();
        let mut input = RemarkInput::new();
        input.load_line(b"first second third", b">> ", b"");
        let mut out = Vec::new();
        execute_script(&script, &mut input, &config(WrapMode::Word, 9), &mut out);
        assert!(out.windows(3).any(|w| w == b">> "));
    }
}
