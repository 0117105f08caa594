//! wrapper.rs - The wrapper/emitter (component G): walks the decorated
//! buffer, materialises style ranges as their pre/post strings at the
//! correct offsets, and splits overlong lines at character or word
//! boundaries while preserving a retain prefix and prepend/append
//! decoration on continuation segments (spec.md S4.8).
//!
//! Materialisation here is an event sweep over the already-normalised
//! style list (component B guarantees no partial overlaps - only aligned
//! or nested segments) rather than the byte-accounting `style_mod`/
//! `post_last`/`keep` bookkeeping spec.md describes: since the list
//! invariant rules out partial overlaps, opening every range's `pre_string`
//! in list order at its `so` and closing `post_string`s in reverse list
//! order at their `eo` produces the same flat, correctly nested output,
//! PROVIDED adjacent same-style ranges produced by splitting one style
//! application to host a nested range (component B's cases 2a/2b/2c/3a/3b/
//! 3c/4a/4b) are treated as one continuous span rather than re-closed and
//! re-opened at the split boundary - that coalescing is `keep`'s job in the
//! byte-accounting walk, and [`materialize_segment`] reproduces it by
//! cancelling a closer against an opener of the identical style at the same
//! boundary position (see DESIGN.md).

use std::rc::Rc;

use crate::stylelist::{StyleList, StyleRange};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WrapMode {
    None,
    Char,
    Word,
}

/// Wrap/decoration configuration resolved from CLI flags (`-w -r -f`) plus
/// the per-line prepend/append literals already run through their own
/// rule trees (spec.md S4.7/S4.8).
#[derive(Debug, Clone)]
pub struct WrapConfig {
    pub width: usize,
    pub retain: usize,
    pub mode: WrapMode,
    pub prepend: Vec<u8>,
    pub append: Vec<u8>,
}

impl Default for WrapConfig {
    fn default() -> Self {
        WrapConfig { width: 80, retain: 0, mode: WrapMode::Char, prepend: Vec::new(), append: Vec::new() }
    }
}

/// Materialises every style range over the *whole* buffer with no
/// wrapping - spec.md S4.7's "call S4.8 with `ep = infinity`", used to
/// resolve the prepend/append rule's own styled output into a flat literal
/// before it becomes a decoration string for the main line's segments.
pub fn materialize_whole(content: &[u8], styles: &StyleList, out: &mut Vec<u8>) {
    let order: Vec<(usize, StyleRange)> = styles.iter().cloned().enumerate().collect();
    materialize_segment(content, &order, 0, content.len(), out);
}

/// Wraps and emits one fully-rule-processed line (spec.md S4.8).
pub fn wrap_line(content: &[u8], styles: &StyleList, config: &WrapConfig, out: &mut Vec<u8>) {
    let order: Vec<(usize, StyleRange)> = styles.iter().cloned().enumerate().collect();
    let len = content.len();

    if len == 0 {
        materialize_segment(content, &order, 0, 0, out);
        out.push(b'\n');
        return;
    }

    if config.mode == WrapMode::None {
        materialize_segment(content, &order, 0, len, out);
        out.push(b'\n');
        return;
    }

    let retain_len = config.retain.min(len);
    let mut retain_bytes = Vec::new();
    if retain_len > 0 {
        materialize_segment(content, &order, 0, retain_len, &mut retain_bytes);
    }

    let base_width = config.width.max(1);
    let mut width = base_width;
    let mut sp = 0usize;

    while sp < len {
        let old_sp = sp;
        let remaining = len - sp;
        let is_last_guess = remaining <= width;
        let applen = if is_last_guess { 0 } else { config.append.len() };

        let raw_ep = (sp + width).min(len);
        let mut ep = if raw_ep < len { raw_ep.saturating_sub(applen).max(sp) } else { raw_ep };
        let mut skip_to = ep;

        if ep < len {
            let at_space = content[ep] == b' ';
            if !at_space {
                if config.mode == WrapMode::Word {
                    if let Some(t) = (sp..ep).rev().find(|&i| content[i] == b' ') {
                        let u = (ep..len).find(|&i| content[i] == b' ').unwrap_or(len);
                        let next_len = u.saturating_sub(t + 1);
                        let budget = width.saturating_sub(config.retain + config.prepend.len());
                        if next_len <= budget {
                            ep = t;
                            skip_to = t + 1;
                        }
                    }
                }
                // Char mode: accept `ep` as-is, even mid-word.
            } else {
                let mut u = ep;
                while u < len && content[u] == b' ' {
                    u += 1;
                }
                skip_to = u;
            }
        }

        if sp > 0 {
            out.extend_from_slice(&retain_bytes);
            out.extend_from_slice(&config.prepend);
        }
        materialize_segment(content, &order, sp, ep, out);
        if ep < len {
            out.extend_from_slice(&config.append);
        }
        out.push(b'\n');

        if sp == 0 {
            width = base_width.saturating_sub(config.retain + config.prepend.len()).max(1);
        }

        sp = skip_to.max(ep);
        if sp <= old_sp {
            sp = old_sp + 1;
        }
    }
}

/// Materialises every style range whose span intersects `[sp, ep)` into
/// `out`, alongside the raw content bytes of that window. Ranges are
/// walked in their list order (`styles.iter()`'s order, already the
/// normalised insertion order from component B): `pre_string`s open in
/// ascending list order, `post_string`s close in descending list order, so
/// coincident and nested ranges invert correctly (spec.md S4.8).
///
/// At a boundary where one range closes and another of the *identical*
/// style opens (the signature of component B having split a single style
/// application to host a nested range - spec.md S4.2 cases 2a/2b/2c/3a/3b/
/// 3c/4a/4b), the closer and opener are cancelled against each other rather
/// than both emitted: otherwise the split artifact would show up in the
/// output as a spurious close-then-reopen of a style that was never
/// actually discontinuous (spec.md S8 scenario 4).
fn materialize_segment(content: &[u8], order: &[(usize, StyleRange)], sp: usize, ep: usize, out: &mut Vec<u8>) {
    let relevant: Vec<&(usize, StyleRange)> = order
        .iter()
        .filter(|(_, r)| {
            if r.so == r.eo {
                r.so >= sp && r.so < ep
            } else {
                r.so < ep && r.eo > sp
            }
        })
        .collect();

    let mut positions: Vec<usize> = vec![sp, ep];
    for (_, r) in &relevant {
        if r.so >= sp && r.so <= ep {
            positions.push(r.so);
        }
        if r.eo >= sp && r.eo <= ep {
            positions.push(r.eo);
        }
    }
    positions.sort_unstable();
    positions.dedup();

    let mut cursor = sp;
    for &pos in &positions {
        if pos < cursor {
            continue;
        }
        if pos > cursor {
            out.extend_from_slice(&content[cursor..pos]);
            cursor = pos;
        }

        let mut closers: Vec<&(usize, StyleRange)> =
            relevant.iter().copied().filter(|(_, r)| r.eo == pos && r.so < r.eo).collect();
        closers.sort_by(|a, b| b.0.cmp(&a.0));

        let mut openers: Vec<&(usize, StyleRange)> =
            relevant.iter().copied().filter(|(_, r)| r.so == pos).collect();
        openers.sort_by_key(|(i, _)| *i);

        // Cancel a closer against an opener of the identical style at this
        // same position - a split-for-nesting artifact, not a genuine
        // discontinuity (see the function doc comment above).
        for oi in (0..openers.len()).rev() {
            if let Some(ci) = closers.iter().position(|(_, cr)| Rc::ptr_eq(&cr.style, &openers[oi].1.style)) {
                closers.remove(ci);
                openers.remove(oi);
            }
        }

        for (_, r) in &closers {
            out.extend_from_slice(r.style.post_string.as_bytes());
        }
        for (_, r) in &openers {
            out.extend_from_slice(r.style.pre_string.as_bytes());
            if r.so == r.eo {
                out.extend_from_slice(r.style.post_string.as_bytes());
            }
        }
    }

    if ep > cursor {
        out.extend_from_slice(&content[cursor..ep]);
    }
}
