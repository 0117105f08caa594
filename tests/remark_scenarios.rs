//! End-to-end scenario tests for `remark`: write a script to a
//! `tempfile::NamedTempFile`, parse it, and run it through `execute_script`
//! exactly as the binary's input loop does. Mirrors the `tempfile`-backed
//! config-file tests in `lib_tests.rs`'s `embed_configs_tests`.

use std::io::Write as _;
use std::path::PathBuf;

use remark::parser::parse_script;
use remark::script::{execute_script, RemarkInput};
use remark::wrapper::{WrapConfig, WrapMode};

fn config(mode: WrapMode, width: usize) -> WrapConfig {
    WrapConfig { width, retain: 0, mode, prepend: Vec::new(), append: Vec::new() }
}

fn run_line(script_text: &str, line: &str, cfg: &WrapConfig) -> Vec<u8> {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, "{script_text}").unwrap();
    let dir: PathBuf = file.path().parent().unwrap().to_path_buf();

    let script = parse_script(script_text, file.path().to_str().unwrap(), dir).unwrap();
    let mut input = RemarkInput::new();
    input.load_line(line.as_bytes(), b"", b"");
    let mut out = Vec::new();
    execute_script(&script, &mut input, cfg, &mut out);
    out
}

#[test]
fn identity_line_passes_through_unchanged() {
    let out = run_line("", "hello there", &config(WrapMode::None, 80));
    assert_eq!(out, b"hello there\n");
}

#[test]
fn style_rule_brackets_the_matched_range() {
    let script = r#" style "warn" { prepend "[" append "]" } "there" warn "#;
    let out = run_line(script, "hello there world", &config(WrapMode::None, 80));
    assert_eq!(out, b"hello [there] world\n");
}

#[test]
fn substitution_rewrites_the_matched_text() {
    let script = r#" "there" subst "folks" "#;
    let out = run_line(script, "hello there", &config(WrapMode::None, 80));
    assert_eq!(out, b"hello folks\n");
}

#[test]
fn nested_styles_compose_around_a_shared_span() {
    let script = r#"
        style "outer" { prepend "(" append ")" }
        style "inner" { prepend "[" append "]" }
        "b" {
            "b" outer
            "b" inner
        }
    "#;
    let out = run_line(script, "abc", &config(WrapMode::None, 80));
    assert_eq!(out, b"a([b])c\n");
}

#[test]
fn char_wrap_breaks_at_the_configured_width() {
    let out = run_line("", "abcdefghij", &config(WrapMode::Char, 4));
    assert_eq!(out, b"abcd\nefgh\nij\n");
}

#[test]
fn word_wrap_never_splits_a_word_when_a_break_is_available() {
    let out = run_line("", "the quick brown fox", &config(WrapMode::Word, 9));
    assert_eq!(out, b"the quick\nbrown fox\n");
}

#[test]
fn skip_rule_drops_the_whole_line() {
    let script = r#" "DEBUG" skip "#;
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, "{script}").unwrap();
    let dir: PathBuf = file.path().parent().unwrap().to_path_buf();
    let parsed = parse_script(script, file.path().to_str().unwrap(), dir).unwrap();

    let mut input = RemarkInput::new();
    input.load_line(b"DEBUG: noisy line", b"", b"");
    let mut out = Vec::new();
    let kept = execute_script(&parsed, &mut input, &config(WrapMode::None, 80), &mut out);
    assert!(!kept);
    assert!(out.is_empty());
}
