//! parser.rs - Recursive-descent construction of a [`Script`] (component I)
//! from the token stream produced by `src/lexer.rs`, per spec.md S6's
//! grammar. Semantic actions mirror the constructors named in spec.md S3/
//! S4: `new_style`, `new_macro`, `new_macro_rule`, `new_style_rule`,
//! `new_multi_rule`, `new_match_rule`, `new_action_rule`,
//! `new_substitution_rule`, `new_set_rule`.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use crate::error::RemarkError;
use crate::lexer::{lex, LexedToken, Token};
use crate::rmatch::MatchPrimitive;
use crate::rule::{new_macro_cell, Action, MacroCell, Rule};
use crate::script::Script;
use crate::style::{Style, StyleSpec};

/// Parses a top-level script file's source text into a [`Script`].
/// `script_dir` seeds the `INCLUDE` search path (spec.md S6): the
/// directory the top-level script itself lives in.
pub fn parse_script(source: &str, file: &str, script_dir: PathBuf) -> Result<Script, RemarkError> {
    let tokens = lex(source, file)?;
    let mut parser = Parser {
        tokens,
        pos: 0,
        file: file.to_string(),
        script_dir,
        styles: HashMap::new(),
        macros: HashMap::new(),
    };
    parser.prescan_macros();
    parser.parse_top()
}

struct Parser {
    tokens: Vec<LexedToken>,
    pos: usize,
    file: String,
    script_dir: PathBuf,
    styles: HashMap<String, Rc<Style>>,
    macros: HashMap<String, MacroCell>,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|t| &t.token)
    }

    fn line(&self) -> u32 {
        self.tokens
            .get(self.pos)
            .or_else(|| self.tokens.last())
            .map(|t| t.line)
            .unwrap_or(0)
    }

    fn advance(&mut self) -> Option<Token> {
        let t = self.tokens.get(self.pos).map(|t| t.token.clone());
        if t.is_some() {
            self.pos += 1;
        }
        t
    }

    fn err(&self, msg: impl Into<String>) -> RemarkError {
        RemarkError::ScriptParse { file: self.file.clone(), line: self.line(), msg: msg.into() }
    }

    fn sem_err(&self, msg: impl Into<String>) -> RemarkError {
        RemarkError::SemanticError { file: self.file.clone(), line: self.line(), msg: msg.into() }
    }

    fn eat(&mut self, tok: &Token) -> Result<(), RemarkError> {
        match self.advance() {
            Some(ref t) if t == tok => Ok(()),
            other => Err(self.err(format!("expected {tok:?}, found {other:?}"))),
        }
    }

    fn expect_str(&mut self) -> Result<String, RemarkError> {
        match self.advance() {
            Some(Token::Str(s)) => Ok(s),
            Some(Token::Match(s, _flags)) => Ok(s),
            other => Err(self.err(format!("expected a quoted string, found {other:?}"))),
        }
    }

    /// Pre-registers every top-level `macro "name" ...` declaration (brace
    /// depth 0) so a match rule parsed earlier in the file can reference a
    /// macro declared later - the rule tree is a DAG, not a strictly
    /// forward-declared tree (spec.md S9).
    fn prescan_macros(&mut self) {
        let mut depth = 0i32;
        let mut i = 0usize;
        while i < self.tokens.len() {
            match &self.tokens[i].token {
                Token::LBrace => depth += 1,
                Token::RBrace => depth -= 1,
                Token::Macro if depth == 0 => {
                    if let Some(next) = self.tokens.get(i + 1) {
                        let name = match &next.token {
                            Token::Str(s) | Token::Match(s, _) => Some(s.clone()),
                            _ => None,
                        };
                        if let Some(name) = name {
                            self.macros.entry(name).or_insert_with(new_macro_cell);
                        }
                    }
                }
                _ => {}
            }
            i += 1;
        }
    }

    fn parse_top(&mut self) -> Result<Script, RemarkError> {
        let mut main_rules = Vec::new();
        let mut prepend_rule = None;
        let mut append_rule = None;

        while let Some(tok) = self.peek().cloned() {
            match tok {
                Token::Style => {
                    self.advance();
                    self.parse_style_decl()?;
                }
                Token::Macro => {
                    self.advance();
                    self.parse_macro_decl()?;
                }
                Token::Prepend => {
                    self.advance();
                    let stmts = self.parse_match_body(&[])?;
                    prepend_rule = Some(Rule::multi(stmts));
                }
                Token::Append => {
                    self.advance();
                    let stmts = self.parse_match_body(&[])?;
                    append_rule = Some(Rule::multi(stmts));
                }
                Token::Match(_, _) | Token::Number(_) => {
                    main_rules.push(self.parse_match_decl(&[])?);
                }
                other => return Err(self.err(format!("unexpected token at top level: {other:?}"))),
            }
        }

        let main_rule = if main_rules.is_empty() { None } else { Some(Rule::multi(main_rules)) };

        Ok(Script {
            styles: std::mem::take(&mut self.styles),
            macros: std::mem::take(&mut self.macros),
            main_rule,
            prepend_rule,
            append_rule,
        })
    }

    fn parse_style_decl(&mut self) -> Result<(), RemarkError> {
        let name = self.expect_str()?;
        if self.styles.contains_key(&name) {
            return Err(self.sem_err(format!("duplicate style `{name}`")));
        }
        let specs = if self.peek() == Some(&Token::LBrace) {
            self.advance();
            let mut v = Vec::new();
            while self.peek() != Some(&Token::RBrace) {
                if self.peek().is_none() {
                    return Err(self.err("unexpected end of script inside style block"));
                }
                v.push(self.parse_style_stmt()?);
            }
            self.advance();
            v
        } else {
            vec![self.parse_style_stmt()?]
        };
        let style = Rc::new(Style::new(name.clone(), &specs));
        self.styles.insert(name, style);
        Ok(())
    }

    fn parse_style_stmt(&mut self) -> Result<StyleSpec, RemarkError> {
        match self.peek().cloned() {
            Some(Token::Prepend) => {
                self.advance();
                Ok(StyleSpec::Pre(self.expect_str()?))
            }
            Some(Token::Append) => {
                self.advance();
                Ok(StyleSpec::Post(self.expect_str()?))
            }
            Some(Token::Str(name)) => {
                self.advance();
                let style = self
                    .styles
                    .get(&name)
                    .cloned()
                    .ok_or_else(|| self.sem_err(format!("unknown style `{name}`")))?;
                Ok(StyleSpec::Style(style))
            }
            other => Err(self.err(format!("expected a style statement, found {other:?}"))),
        }
    }

    fn parse_macro_decl(&mut self) -> Result<(), RemarkError> {
        let name = self.expect_str()?;
        let cell = self.macros.entry(name.clone()).or_insert_with(new_macro_cell).clone();
        if cell.borrow().is_some() {
            return Err(self.sem_err(format!("duplicate macro `{name}`")));
        }
        let stmts = self.parse_match_body(&[])?;
        *cell.borrow_mut() = Some(Rule::multi(stmts));
        Ok(())
    }

    fn parse_match_body(&mut self, ctx: &[MatchPrimitive]) -> Result<Vec<Rc<Rule>>, RemarkError> {
        self.eat(&Token::LBrace)?;
        let mut v = Vec::new();
        while self.peek() != Some(&Token::RBrace) {
            if self.peek().is_none() {
                return Err(self.err("unexpected end of script inside block"));
            }
            v.push(self.parse_match_stmt(ctx)?);
        }
        self.advance();
        Ok(v)
    }

    fn parse_match_stmt(&mut self, ctx: &[MatchPrimitive]) -> Result<Rc<Rule>, RemarkError> {
        match self.peek().cloned() {
            Some(Token::Include) => {
                self.advance();
                let filename = self.expect_str()?;
                self.parse_include(&filename, ctx)
            }
            Some(Token::Skip) => {
                self.advance();
                Ok(Rc::new(Rule::Action(Action::Skip)))
            }
            Some(Token::Break) => {
                self.advance();
                Ok(Rc::new(Rule::Action(Action::Break)))
            }
            Some(Token::Subst) => {
                self.advance();
                let replacement = self.expect_str()?;
                let (regex, global) = self.subst_regex(ctx)?;
                Ok(Rc::new(Rule::Substitution { regex, global, replacement: replacement.into_bytes() }))
            }
            Some(Token::Set) => {
                self.advance();
                let replacement = self.expect_str()?;
                Ok(Rc::new(Rule::Set { replacement: replacement.into_bytes() }))
            }
            Some(Token::Str(name)) => {
                self.advance();
                if let Some(style) = self.styles.get(&name).cloned() {
                    Ok(Rc::new(Rule::Style(style)))
                } else if let Some(mac) = self.macros.get(&name).cloned() {
                    Ok(Rc::new(Rule::MacroRef(mac)))
                } else {
                    Err(self.sem_err(format!("unknown style or macro `{name}`")))
                }
            }
            Some(Token::Match(_, _)) | Some(Token::Number(_)) => self.parse_match_decl(ctx),
            other => Err(self.err(format!("expected a match statement, found {other:?}"))),
        }
    }

    fn subst_regex(&self, ctx: &[MatchPrimitive]) -> Result<(regex::bytes::Regex, bool), RemarkError> {
        if ctx.len() != 1 {
            return Err(self.sem_err("subst requires exactly one enclosing match pattern"));
        }
        match &ctx[0] {
            MatchPrimitive::Regex { regex, global } => Ok((regex.clone(), *global)),
            MatchPrimitive::Subex { .. } => {
                Err(self.sem_err("subst cannot follow a bare submatch back-reference"))
            }
        }
    }

    fn parse_match_decl(&mut self, ctx: &[MatchPrimitive]) -> Result<Rc<Rule>, RemarkError> {
        let primitives = self.parse_match_items(ctx)?;
        let child = if self.peek() == Some(&Token::LBrace) {
            Rule::multi(self.parse_match_body(&primitives)?)
        } else {
            self.parse_match_stmt(&primitives)?
        };
        Ok(Rc::new(Rule::Match { primitives, child }))
    }

    fn parse_match_items(&mut self, ctx: &[MatchPrimitive]) -> Result<Vec<MatchPrimitive>, RemarkError> {
        let mut primitives = Vec::new();
        loop {
            match self.advance() {
                Some(Token::Match(pattern, flags)) => {
                    let mut ignore_case = false;
                    let mut global = false;
                    for ch in flags.chars() {
                        match ch {
                            'i' => ignore_case = true,
                            'g' => global = true,
                            other => return Err(self.sem_err(format!("unknown match flag `{other}`"))),
                        }
                    }
                    let prim = MatchPrimitive::compile_regex(&pattern, ignore_case, global).map_err(|e| {
                        RemarkError::RegexCompile { pattern: pattern.clone(), msg: e.to_string() }
                    })?;
                    primitives.push(prim);
                }
                Some(Token::Number(n)) => {
                    if n < 0 {
                        return Err(self.sem_err("submatch index must be non-negative"));
                    }
                    let index = n as usize;
                    // A back-reference resolves against the nearest preceding
                    // regex: the last item already parsed in this same
                    // comma-separated list, falling back to the directly
                    // enclosing match's own pattern if this list has none yet.
                    let reference = match primitives.last() {
                        Some(MatchPrimitive::Regex { regex, .. }) => Some(regex),
                        _ => match ctx {
                            [MatchPrimitive::Regex { regex, .. }] => Some(regex),
                            _ => None,
                        },
                    };
                    if let Some(regex) = reference {
                        if index >= regex.captures_len() {
                            return Err(self.sem_err(format!(
                                "submatch index {index} is out of range for the enclosing match"
                            )));
                        }
                    }
                    primitives.push(MatchPrimitive::subex(index));
                }
                other => {
                    return Err(self.err(format!("expected a match pattern or submatch number, found {other:?}")));
                }
            }
            if self.peek() == Some(&Token::Comma) {
                self.advance();
                continue;
            }
            break;
        }
        Ok(primitives)
    }

    fn parse_include(&mut self, filename: &str, ctx: &[MatchPrimitive]) -> Result<Rc<Rule>, RemarkError> {
        let path = resolve_include(filename, &self.script_dir)
            .ok_or_else(|| RemarkError::ScriptNotFound { path: filename.to_string() })?;
        let source = std::fs::read_to_string(&path)?;
        let included_file = path.display().to_string();
        let tokens = lex(&source, &included_file)?;

        let saved_tokens = std::mem::replace(&mut self.tokens, tokens);
        let saved_pos = std::mem::replace(&mut self.pos, 0);
        let saved_file = std::mem::replace(&mut self.file, included_file);
        let saved_dir = self.script_dir.clone();
        if let Some(parent) = path.parent() {
            self.script_dir = parent.to_path_buf();
        }

        let mut stmts = Vec::new();
        let result = (|| {
            while self.peek().is_some() {
                stmts.push(self.parse_match_stmt(ctx)?);
            }
            Ok(())
        })();

        self.tokens = saved_tokens;
        self.pos = saved_pos;
        self.file = saved_file;
        self.script_dir = saved_dir;

        result?;
        Ok(Rule::multi(stmts))
    }
}

/// Resolves a relative `INCLUDE` filename against the ordered candidate
/// path list from spec.md S6: the including script's own directory, then
/// `$HOME/.remark`, then a package data directory. Absolute paths are used
/// verbatim (existence still required).
fn resolve_include(filename: &str, script_dir: &Path) -> Option<PathBuf> {
    let p = Path::new(filename);
    if p.is_absolute() {
        return p.exists().then(|| p.to_path_buf());
    }

    let candidate = script_dir.join(filename);
    if candidate.exists() {
        return Some(candidate);
    }
    if let Ok(home) = std::env::var("HOME") {
        let candidate = Path::new(&home).join(".remark").join(filename);
        if candidate.exists() {
            return Some(candidate);
        }
    }
    for data_dir in data_dir_candidates() {
        let candidate = Path::new(&data_dir).join(filename);
        if candidate.exists() {
            return Some(candidate);
        }
    }
    None
}

/// The package data directory tier of `resolve_include`'s search path: an
/// explicit `REMARK_DATA_DIR` override first, then the `share/` directory
/// next to this crate's own sources (only meaningful from a dev checkout,
/// since `CARGO_MANIFEST_DIR` is baked in at compile time), then the
/// installed-layout fallback.
fn data_dir_candidates() -> Vec<String> {
    let mut dirs = Vec::with_capacity(3);
    if let Ok(dir) = std::env::var("REMARK_DATA_DIR") {
        dirs.push(dir);
    }
    dirs.push(concat!(env!("CARGO_MANIFEST_DIR"), "/share").to_string());
    dirs.push("/usr/share/remark".to_string());
    dirs
}
