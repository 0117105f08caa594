//! rule.rs - The rule tree and its interpreter (component D): the
//! algebraic rule type from spec.md S3 and the `execute` function from
//! spec.md S4.4, ported from `rule.c`'s constructors and `execute.c`'s
//! `execute_any_rule`/`execute_multi_rule`/`execute_match_rule`/
//! `execute_substitution_rule`/`execute_set_rule`.

use std::cell::RefCell;
use std::rc::Rc;

use crate::buffer::TextBuffer;
use crate::expand::expand;
use crate::rmatch::{try_match, update_positions, MatchPrimitive, MatchState};
use crate::style::Style;
use crate::stylelist::{StyleList, StyleRange};

/// What a rule did, propagated up through `Multi` and `Match` parents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Continue,
    Break,
    Skip,
}

/// A named, possibly-recursive indirection to a shared rule. The cell
/// starts empty so a macro can reference itself or a macro defined later
/// in the same script; the parser fills it in once the macro's body has
/// been parsed.
pub type MacroCell = Rc<RefCell<Option<Rc<Rule>>>>;

pub fn new_macro_cell() -> MacroCell {
    Rc::new(RefCell::new(None))
}

/// One node of the rule tree (spec.md S3).
pub enum Rule {
    /// Try each primitive in turn; for every successful match, run `child`
    /// against the resulting child scope.
    Match {
        primitives: Vec<MatchPrimitive>,
        child: Rc<Rule>,
    },
    /// Run children in order, stopping at the first non-`Continue`.
    Multi(Vec<Rc<Rule>>),
    /// Tail-call to a shared rule.
    MacroRef(MacroCell),
    /// Record the enclosing scope as a style range.
    Style(Rc<Style>),
    /// A literal `Continue`/`Break`/`Skip`.
    Action(Action),
    /// Regex substitution within the current scope.
    Substitution {
        regex: regex::bytes::Regex,
        global: bool,
        replacement: Vec<u8>,
    },
    /// Replace the whole current scope with an expanded template.
    Set { replacement: Vec<u8> },
}

impl Rule {
    /// `new_multi_rule`: a singleton list collapses to its one child rather
    /// than wrapping it in a `Multi` of one - this is the rule.c behaviour a
    /// macro body with a single statement relies on when it's itself
    /// referenced from a match's child position.
    pub fn multi(mut rules: Vec<Rc<Rule>>) -> Rc<Rule> {
        if rules.len() == 1 {
            rules.pop().unwrap()
        } else {
            Rc::new(Rule::Multi(rules))
        }
    }
}

/// Runs `rule` against the topmost scope of `stack`, mutating `buffer` and
/// `styles` as side effects, per spec.md S4.4.
pub fn execute(rule: &Rule, stack: &mut Vec<MatchState>, buffer: &mut TextBuffer, styles: &mut StyleList) -> Action {
    match rule {
        Rule::Multi(children) => {
            for child in children {
                let action = execute(child, stack, buffer, styles);
                if action != Action::Continue {
                    return action;
                }
            }
            Action::Continue
        }
        Rule::MacroRef(target) => {
            let target = target
                .borrow()
                .clone()
                .expect("macro rule used before its body was resolved");
            execute(&target, stack, buffer, styles)
        }
        Rule::Style(style) => {
            let scope = stack.last().expect("execute needs a current scope").scope();
            styles.insert(StyleRange::new(scope.so(), scope.eo(), style.clone()));
            Action::Continue
        }
        Rule::Action(action) => *action,
        Rule::Substitution { regex, global, replacement } => {
            execute_substitution(regex, *global, replacement, stack, buffer, styles);
            Action::Continue
        }
        Rule::Set { replacement } => {
            execute_set(replacement, stack, buffer, styles);
            Action::Continue
        }
        Rule::Match { primitives, child } => execute_match(primitives, child, stack, buffer, styles),
    }
}

fn execute_match(
    primitives: &[MatchPrimitive],
    child_rule: &Rc<Rule>,
    stack: &mut Vec<MatchState>,
    buffer: &mut TextBuffer,
    styles: &mut StyleList,
) -> Action {
    let mut outer = Action::Continue;

    for prim in primitives {
        let mut start = stack.last().expect("execute needs a current scope").scope().so();
        let mut call = 0u32;

        loop {
            // Re-read the live scope's `eo` every call: a match rule's own
            // scope can legitimately grow as nested child rules mutate the
            // buffer, unlike `execute_substitution`'s frozen bound below.
            let scope_eo = stack.last().expect("execute needs a current scope").scope().eo();
            let child_state = match try_match(prim, stack, buffer.as_bytes(), start, call, scope_eo) {
                Some(state) => state,
                None => break,
            };
            let matched_zero_width = child_state.scope().so() == child_state.scope().eo();
            let mut next_start = child_state.scope().eo();
            if matched_zero_width {
                next_start += 1;
            }

            stack.push(child_state);
            let action = execute(child_rule, stack, buffer, styles);
            stack.pop();

            call += 1;
            start = next_start;

            match action {
                Action::Skip => return Action::Skip,
                Action::Break => outer = Action::Break,
                Action::Continue => {}
            }
        }
    }

    outer
}

fn execute_substitution(
    regex: &regex::bytes::Regex,
    global: bool,
    replacement: &[u8],
    stack: &mut Vec<MatchState>,
    buffer: &mut TextBuffer,
    styles: &mut StyleList,
) {
    let prim = MatchPrimitive::Regex { regex: regex.clone(), global };
    let scope = stack.last().expect("execute needs a current scope").scope();
    // Freeze the scope's upper bound once, before the loop: each match grows
    // the buffer (and, via `update_positions`, the live scope's `eo` along
    // with it), so re-reading it from the stack every call would let the
    // match window grow right along with the replacements it's producing.
    // `execute.c`'s `execute_substitution_rule` snapshots this the same way.
    let scope_eo = scope.eo();
    let mut start = scope.so();
    let mut call = 0u32;

    loop {
        let m = match try_match(&prim, stack, buffer.as_bytes(), start, call, scope_eo) {
            Some(m) => m,
            None => break,
        };
        let mso = m.subv[0].so();
        let meo = m.subv[0].eo();

        let expanded = expand(replacement, buffer.as_bytes(), scope, &m.subv);
        let diff = buffer.replace(mso, meo, &expanded) as i64;
        update_positions(stack, styles, mso as i64, diff);

        let mut next = mso + expanded.len();
        if expanded.is_empty() && mso == meo {
            next += 1;
        }
        start = next;
        call += 1;
    }
}

fn execute_set(replacement: &[u8], stack: &mut Vec<MatchState>, buffer: &mut TextBuffer, styles: &mut StyleList) {
    let (scope, subv) = {
        let ms = stack.last().expect("execute needs a current scope");
        (ms.scope(), ms.subv.clone())
    };

    let expanded = expand(replacement, buffer.as_bytes(), scope, &subv);
    let diff = buffer.replace(scope.so(), scope.eo(), &expanded) as i64;
    update_positions(stack, styles, scope.so() as i64, diff);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rmatch::MatchState;
    use crate::style::StyleSpec;

    fn run(rule: &Rule, text: &[u8]) -> (Action, Vec<u8>, StyleList) {
        let mut buffer = TextBuffer::from_bytes(text.to_vec());
        let mut styles = StyleList::new();
        let mut stack = vec![MatchState::root(0, buffer.len() as i64)];
        let action = execute(rule, &mut stack, &mut buffer, &mut styles);
        (action, buffer.into_vec(), styles)
    }

    #[test]
    fn match_rule_runs_child_once_per_match() {
        let prim = MatchPrimitive::compile_regex("l", false, true).unwrap();
        let child = Rc::new(Rule::Action(Action::Continue));
        let rule = Rule::Match { primitives: vec![prim], child };
        let (action, text, _) = run(&rule, b"hello");
        assert_eq!(action, Action::Continue);
        assert_eq!(text, b"hello");
    }

    #[test]
    fn style_rule_records_match_scope() {
        let prim = MatchPrimitive::compile_regex("ll", false, false).unwrap();
        let style = Rc::new(Style::new("s", &[StyleSpec::Pre("<".into()), StyleSpec::Post(">".into())]));
        let child = Rc::new(Rule::Style(style));
        let rule = Rule::Match { primitives: vec![prim], child };
        let (_, _, styles) = run(&rule, b"hello");
        let ranges: Vec<_> = styles.iter().map(|r| (r.so, r.eo)).collect();
        assert_eq!(ranges, vec![(2, 4)]);
    }

    #[test]
    fn global_substitution_rewrites_every_match() {
        let regex = regex::bytes::RegexBuilder::new(".").build().unwrap();
        let rule = Rule::Substitution { regex, global: true, replacement: b"X".to_vec() };
        let (_, text, _) = run(&rule, b"abc");
        assert_eq!(text, b"XXX");
    }

    #[test]
    fn global_substitution_scope_bound_is_frozen_not_live() {
        // scope [0,5) on "aaaaa", global "a" -> "aa": each match consumes
        // one original byte from the frozen window, so exactly 3 of the 5
        // original letters get doubled (8 a's), not every letter of the
        // ever-growing buffer (which would run forever without the freeze).
        let regex = regex::bytes::RegexBuilder::new("a").build().unwrap();
        let rule = Rule::Substitution { regex, global: true, replacement: b"aa".to_vec() };
        let (_, text, _) = run(&rule, b"aaaaa");
        assert_eq!(text, b"aaaaaaaa");
    }

    #[test]
    fn non_global_substitution_rewrites_first_match_only() {
        let regex = regex::bytes::RegexBuilder::new("a").build().unwrap();
        let rule = Rule::Substitution { regex, global: false, replacement: b"XY".to_vec() };
        let (_, text, _) = run(&rule, b"aaa");
        assert_eq!(text, b"XYaa");
    }

    #[test]
    fn set_rule_replaces_whole_scope() {
        let prim = MatchPrimitive::compile_regex("(l+)", false, false).unwrap();
        let child = Rc::new(Rule::Set { replacement: b"$1$1".to_vec() });
        let rule = Rule::Match { primitives: vec![prim], child };
        let (_, text, _) = run(&rule, b"hello");
        assert_eq!(text, b"helllo");
    }

    #[test]
    fn multi_stops_at_first_break_or_skip() {
        let children = vec![
            Rc::new(Rule::Action(Action::Continue)),
            Rc::new(Rule::Action(Action::Skip)),
            Rc::new(Rule::Action(Action::Break)),
        ];
        let rule = Rule::Multi(children);
        let (action, _, _) = run(&rule, b"x");
        assert_eq!(action, Action::Skip);
    }

    #[test]
    fn macro_ref_tail_calls_its_target() {
        let cell = new_macro_cell();
        *cell.borrow_mut() = Some(Rc::new(Rule::Action(Action::Break)));
        let rule = Rule::MacroRef(cell);
        let (action, _, _) = run(&rule, b"x");
        assert_eq!(action, Action::Break);
    }

    #[test]
    fn match_rule_break_does_not_stop_other_primitives() {
        let p1 = MatchPrimitive::compile_regex("a", false, false).unwrap();
        let p2 = MatchPrimitive::compile_regex("b", false, false).unwrap();
        let child = Rc::new(Rule::Action(Action::Break));
        let rule = Rule::Match { primitives: vec![p1, p2], child };
        let (action, _, styles) = run(&rule, b"ab");
        assert_eq!(action, Action::Break);
        assert!(styles.is_empty());
    }
}
