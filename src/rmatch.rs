//! rmatch.rs - Match primitives (component C) and the match-state stack
//! that the rule interpreter (component D, `src/rule.rs`) drives.
//!
//! A [`MatchState`] corresponds to one scope: the whole-script buffer, or a
//! child scope carved out by a successful regex/back-reference match. States
//! are NOT a heap-allocated parent-linked tree - the parent of a state is
//! simply "whatever is earlier in the `Vec<MatchState>` stack the
//! interpreter is holding", which mirrors the call stack the original C
//! recursion used (`ms->parent` was a borrow, never an owner, per
//! spec.md S9). [`update_positions`] walks that stack from the edited
//! state down to the root exactly like `update_positions` in `execute.c`.

use crate::stylelist::StyleList;

/// A submatch span: `(so, eo)` byte offsets into the buffer the owning
/// [`MatchState`] operates over. `-1` on either side means "not matched",
/// mirroring the C `regmatch_t` convention this is ported from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub so: i64,
    pub eo: i64,
}

impl Span {
    pub const UNMATCHED: Span = Span { so: -1, eo: -1 };

    pub fn new(so: i64, eo: i64) -> Self {
        Span { so, eo }
    }

    pub fn is_matched(&self) -> bool {
        self.so != -1 && self.eo != -1
    }

    pub fn so(&self) -> usize {
        self.so.max(0) as usize
    }

    pub fn eo(&self) -> usize {
        self.eo.max(0) as usize
    }
}

/// One scope in the match-state stack. `subv[0]` is the scope's own span;
/// `subv[1..]` are regex sub-captures when this state was produced by a
/// [`MatchPrimitive::Regex`] match.
#[derive(Debug, Clone)]
pub struct MatchState {
    pub subv: Vec<Span>,
}

impl MatchState {
    pub fn root(so: i64, eo: i64) -> Self {
        MatchState { subv: vec![Span::new(so, eo)] }
    }

    pub fn scope(&self) -> Span {
        self.subv[0]
    }
}

/// A compiled match primitive: either a regex (optionally global/ignore-case)
/// or a back-reference to a submatch of the enclosing scope.
///
/// `Clone`able so a `subst` statement can borrow the regex of its directly
/// enclosing match rule without the parser having to thread lifetimes
/// through the rule tree (see `src/parser.rs`'s `ctx` parameter).
#[derive(Clone)]
pub enum MatchPrimitive {
    Regex { regex: regex::bytes::Regex, global: bool },
    Subex { index: usize },
}

impl MatchPrimitive {
    pub fn compile_regex(pattern: &str, ignore_case: bool, global: bool) -> Result<Self, regex::Error> {
        let regex = regex::bytes::RegexBuilder::new(pattern)
            .case_insensitive(ignore_case)
            .build()?;
        Ok(MatchPrimitive::Regex { regex, global })
    }

    pub fn subex(index: usize) -> Self {
        MatchPrimitive::Subex { index }
    }
}

/// `try_match(primitive, stack, start, call, scope_eo)`: attempts a match
/// starting at byte offset `start`, bounded above by `scope_eo`. Returns the
/// child [`MatchState`] on success.
///
/// `call` is the 0-based index of this call within the enclosing match
/// rule's repeat loop over this same primitive - a non-global regex only
/// succeeds on `call == 0` (spec.md S4.3).
///
/// `scope_eo` is supplied by the caller rather than re-derived from
/// `stack.last()` on every call: a repeat loop that mutates the buffer as it
/// goes (`subst`, spec.md S4.4) must freeze the scope's upper bound once
/// before the loop starts, since the live scope's `eo` keeps growing as
/// replacements land - see `rule::execute_substitution`, which freezes it,
/// versus `rule::execute_match`, which re-reads it fresh every call because
/// a match rule's own scope does not shrink/grow out from under it the same
/// way.
pub fn try_match(prim: &MatchPrimitive, stack: &[MatchState], buffer: &[u8], start: usize, call: u32, scope_eo: usize) -> Option<MatchState> {
    let ms = stack.last().expect("try_match needs a current scope");

    match prim {
        MatchPrimitive::Regex { regex, global } => {
            if call > 0 && !global {
                return None;
            }
            if start > scope_eo || start > buffer.len() {
                return None;
            }
            let window = &buffer[start..scope_eo.min(buffer.len())];
            let caps = regex.captures(window)?;
            let whole = caps.get(0).expect("capture group 0 always present on a match");
            let subc = regex.captures_len();
            let mut subv = Vec::with_capacity(subc);
            subv.push(Span::new((start + whole.start()) as i64, (start + whole.end()) as i64));
            for i in 1..subc {
                match caps.get(i) {
                    Some(m) => subv.push(Span::new((start + m.start()) as i64, (start + m.end()) as i64)),
                    None => subv.push(Span::UNMATCHED),
                }
            }
            Some(MatchState { subv })
        }
        MatchPrimitive::Subex { index } => {
            if call > 0 {
                return None;
            }
            let span = *ms.subv.get(*index)?;
            if !span.is_matched() {
                return None;
            }
            Some(MatchState { subv: vec![span] })
        }
    }
}

/// Position-update propagation (spec.md S4.6): after a buffer edit at
/// `[lo, lo+old)` changing the length by `diff`, shift every submatch
/// endpoint on the stack (current scope and every ancestor) and, once the
/// walk reaches the root state, every style range as well.
///
/// `so` is the edit's starting offset (`lo`); `diff` is
/// `new_len as i64 - old_len as i64`.
pub fn update_positions(stack: &mut [MatchState], styles: &mut StyleList, so: i64, diff: i64) {
    let root_eo = stack[0].subv[0].eo;
    styles.update_positions(so, diff, root_eo);

    for (level, state) in stack.iter_mut().enumerate().rev() {
        let is_root = level == 0;
        for (c, span) in state.subv.iter_mut().enumerate() {
            apply_update(span, so, diff, c == 0 && is_root);
        }
    }
}

fn apply_update(span: &mut Span, so: i64, diff: i64, root_scope_boundary: bool) {
    if span.so == span.eo && span.so == so {
        span.eo = (span.eo + diff).max(so);
        return;
    }
    if span.eo > so || (span.eo >= so && root_scope_boundary) {
        span.eo = (span.eo + diff).max(so);
    }
    if span.so > so {
        span.so = (span.so + diff).max(so);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn regex_match_reports_byte_offsets_and_captures() {
        let prim = MatchPrimitive::compile_regex("(a+)(b+)", false, false).unwrap();
        let stack = vec![MatchState::root(0, 9)];
        let child = try_match(&prim, &stack, b"xxaaabbby", 0, 0, 9).unwrap();
        assert_eq!(child.subv[0], Span::new(2, 8));
        assert_eq!(child.subv[1], Span::new(2, 5));
        assert_eq!(child.subv[2], Span::new(5, 8));
    }

    #[test]
    fn non_global_regex_fails_on_second_call() {
        let prim = MatchPrimitive::compile_regex("a", false, false).unwrap();
        let stack = vec![MatchState::root(0, 3)];
        assert!(try_match(&prim, &stack, b"aaa", 0, 0, 3).is_some());
        assert!(try_match(&prim, &stack, b"aaa", 1, 1, 3).is_none());
    }

    #[test]
    fn global_regex_succeeds_on_any_call() {
        let prim = MatchPrimitive::compile_regex("a", false, true).unwrap();
        let stack = vec![MatchState::root(0, 3)];
        assert!(try_match(&prim, &stack, b"aaa", 1, 1, 3).is_some());
    }

    #[test]
    fn regex_match_is_bounded_by_frozen_scope_eo_not_the_live_scope() {
        let prim = MatchPrimitive::compile_regex("a", false, false).unwrap();
        // The stack's own live scope extends to 5, but a frozen bound of 3
        // must still cut the window off early.
        let stack = vec![MatchState::root(0, 5)];
        assert!(try_match(&prim, &stack, b"aaaaa", 3, 0, 3).is_none());
    }

    #[test]
    fn subex_resolves_parent_submatch() {
        let prim = MatchPrimitive::subex(1);
        let stack = vec![MatchState { subv: vec![Span::new(0, 5), Span::new(1, 3)] }];
        let child = try_match(&prim, &stack, b"hello", 0, 0, 5).unwrap();
        assert_eq!(child.subv[0], Span::new(1, 3));
    }

    #[test]
    fn subex_fails_on_unmatched_slot() {
        let prim = MatchPrimitive::subex(1);
        let stack = vec![MatchState { subv: vec![Span::new(0, 5), Span::UNMATCHED] }];
        assert!(try_match(&prim, &stack, b"hello", 0, 0, 5).is_none());
    }

    #[test]
    fn update_positions_shifts_ancestor_and_current_spans() {
        let mut styles = StyleList::new();
        let mut stack = vec![
            MatchState::root(0, 10),
            MatchState { subv: vec![Span::new(2, 6)] },
        ];
        update_positions(&mut stack, &mut styles, 4, 2);
        assert_eq!(stack[1].subv[0], Span::new(2, 8));
        assert_eq!(stack[0].subv[0], Span::new(0, 12));
    }
}
