//! expand.rs - The substitution expander (component E): turns a
//! replacement template into a fresh byte string by resolving `$`
//! variables against the submatches of the match currently driving a
//! substitution or set rule.
//!
//! Ported from `expand_substitution`/`expand_variable` in `match.c`.
//! Recognised outside of a `\`-escape: `$0`..`$9`/`${N}` (a *run* of
//! decimal digits, braced or not - see SPEC_FULL.md S9(c)), `` $` ``,
//! `$&`, `$'`. Any other byte after `$` is emitted literally, and `\X`
//! emits `X` verbatim (an unterminated trailing `\` is dropped). An empty
//! `${}` reference has no digits to validate and resolves to `$0` (the
//! whole match), rather than falling back to literal text.

use crate::rmatch::Span;

/// Expands `template` against `scope` (the enclosing rule's own span -
/// spec.md calls this `parent_scope`) and `subv` (the submatches of the
/// match driving this expansion; `subv[0]` is spec.md's `current_scope`).
pub fn expand(template: &[u8], buffer: &[u8], scope: Span, subv: &[Span]) -> Vec<u8> {
    let mut out = Vec::new();
    let mut escaped = false;
    let mut c = 0usize;

    while c < template.len() {
        if !escaped && template[c] == b'$' {
            if c + 1 < template.len() && template[c + 1] == b'{' {
                let mut d = c + 2;
                while d < template.len() && template[d] != b'}' {
                    d += 1;
                }
                if d < template.len() && expand_variable(&mut out, &template[c + 2..d], buffer, scope, subv) {
                    c = d + 1;
                    continue;
                }
            } else if c + 1 < template.len() && template[c + 1].is_ascii_digit() {
                let mut d = c + 2;
                while d < template.len() && template[d].is_ascii_digit() {
                    d += 1;
                }
                if expand_variable(&mut out, &template[c + 1..d], buffer, scope, subv) {
                    c = d;
                    continue;
                }
            } else if c + 1 < template.len() && matches!(template[c + 1], b'`' | b'\'' | b'&') {
                expand_variable(&mut out, &template[c + 1..c + 2], buffer, scope, subv);
                c += 2;
                continue;
            }
        }

        escaped = !escaped && template[c] == b'\\';
        if !escaped {
            out.push(template[c]);
        }
        c += 1;
    }

    out
}

fn append_slice(out: &mut Vec<u8>, buffer: &[u8], so: usize, eo: usize) {
    let so = so.min(buffer.len());
    let eo = eo.clamp(so, buffer.len());
    out.extend_from_slice(&buffer[so..eo]);
}

/// Resolves one `$`-variable body (the bytes between `$`/`${`/`$` and its
/// terminator, not including the dollar sign itself). Returns `false` when
/// `spec` isn't a recognised variable, telling the caller to fall back to
/// literal emission.
fn expand_variable(out: &mut Vec<u8>, spec: &[u8], buffer: &[u8], scope: Span, subv: &[Span]) -> bool {
    if spec == b"`" {
        append_slice(out, buffer, scope.so(), subv[0].so());
        return true;
    }
    if spec == b"&" {
        append_slice(out, buffer, subv[0].so(), subv[0].eo());
        return true;
    }
    if spec == b"'" {
        append_slice(out, buffer, subv[0].eo(), scope.eo());
        return true;
    }

    if !spec.is_empty() && !spec.iter().all(u8::is_ascii_digit) {
        return false;
    }
    // An empty digit run (bare `${}`) folds to 0 here, resolving to `$0`
    // rather than being rejected - the original's digit-validation loop
    // simply runs zero times and falls through to index 0.
    let idx: u64 = spec
        .iter()
        .fold(0u64, |acc, &b| acc * 10 + u64::from(b - b'0'));
    let idx = idx as usize;
    if idx >= subv.len() {
        // Valid digit sequence, out of range: consume it but emit nothing.
        return true;
    }
    if subv[idx].is_matched() {
        append_slice(out, buffer, subv[idx].so(), subv[idx].eo());
    }
    true
}
