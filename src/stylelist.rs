//! stylelist.rs - The style range list (component B): an ordered list of
//! half-open `[so, eo)` byte ranges tagged with a [`Style`], and the
//! insertion algorithm (spec.md S4.2 / `execute.c`'s `insert_style` family)
//! that keeps the list free of partial overlaps no matter how the newly
//! inserted range relates to what's already there.
//!
//! The list is stored as a plain `Vec<StyleRange>` rather than a linked
//! list - the original implementation used a doubly linked list so that
//! split operations could splice in new nodes without disturbing existing
//! pointers, and so that a single forward/backward cursor could resume
//! mid-scan. A `Vec` gives the same observable behavior: every "insert
//! before/after node X" step below is a `Vec::insert` at X's index, and
//! every other tracked index shifts exactly the way a linked-list pointer
//! would, which is what [`StyleList::insert`] does by hand.

use std::rc::Rc;

use crate::style::Style;

/// A half-open byte range tagged with the style that should be materialized
/// around it.
#[derive(Debug, Clone)]
pub struct StyleRange {
    pub so: usize,
    pub eo: usize,
    pub style: Rc<Style>,
}

impl StyleRange {
    pub fn new(so: usize, eo: usize, style: Rc<Style>) -> Self {
        StyleRange { so, eo, style }
    }

    fn coincides_with(&self, other: &StyleRange) -> bool {
        self.so == other.so && self.eo == other.eo
    }
}

/// The ordered, normalised list of style ranges for one match buffer, plus
/// the bidirectional cursor the wrapper rewinds while walking segments.
#[derive(Debug, Default)]
pub struct StyleList {
    ranges: Vec<StyleRange>,
    cursor: usize,
}

impl StyleList {
    pub fn new() -> Self {
        StyleList { ranges: Vec::new(), cursor: 0 }
    }

    pub fn clear(&mut self) {
        self.ranges.clear();
        self.cursor = 0;
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &StyleRange> {
        self.ranges.iter()
    }

    /// Resets the cursor to the first range, for a fresh left-to-right walk.
    pub fn restart_cursor(&mut self) {
        self.cursor = 0;
    }

    pub fn cursor_has_next(&self) -> bool {
        self.cursor < self.ranges.len()
    }

    /// Returns the range at the cursor and advances it, mirroring the
    /// linked-list iterator's `next()`.
    pub fn cursor_next(&mut self) -> Option<StyleRange> {
        let r = self.ranges.get(self.cursor).cloned();
        if r.is_some() {
            self.cursor += 1;
        }
        r
    }

    /// Steps the cursor back one position, used by the wrapper to revisit a
    /// range that straddled the current segment boundary.
    pub fn cursor_previous(&mut self) {
        if self.cursor > 0 {
            self.cursor -= 1;
        }
    }

    /// Inserts `s1` into the list, re-normalising existing ranges so that no
    /// two ranges partially overlap afterwards (spec.md S4.2).
    ///
    /// This is a direct transcription of `insert_style`/`insort_style1/2/3`
    /// in `execute.c`, with linked-list node pointers replaced by vector
    /// indices that are shifted by hand wherever a node pointer would have
    /// silently kept pointing at the same logical element.
    pub fn insert(&mut self, mut s1: StyleRange) {
        let old_so = s1.so;
        let mut i = 0usize;

        loop {
            if i >= self.ranges.len() {
                self.ranges.push(s1);
                return;
            }
            let s2 = self.ranges[i].clone();

            // Z1 (case 5): s1 zero-width, lo1 == hi2.
            if s1.so == s1.eo && s1.so == s2.eo {
                self.insort1(i, &s2, s1);
                return;
            }
            // Z2 (case 6): s1 zero-width, properly contained in s2.
            if s1.so == s1.eo && s2.so < s1.so && s1.so < s2.eo {
                self.insort2(i, &s2, Some(s1), None);
                return;
            }
            // Z3 (case 7): s2 zero-width, lo1 == lo2.
            if s2.so == s2.eo && s1.so == s2.so {
                if s1.so > old_so {
                    let clone = StyleRange::new(s2.so, s2.eo, s1.style.clone());
                    i = self.insort1(i, &s2, clone);
                }
                i += 1;
                continue;
            }
            // Disjoint before.
            if s1.eo <= s2.so {
                self.ranges.insert(i, s1);
                return;
            }
            // Exact alignment (1).
            if s1.so == s2.so && s1.eo == s2.eo {
                self.insort1(i, &s2, s1);
                return;
            }
            // Prefix (2a).
            if s1.so == s2.so && s1.eo < s2.eo {
                self.insort2(i, &s2, Some(s1), None);
                return;
            }
            // Suffix (2b).
            if s1.so > s2.so && s1.eo == s2.eo {
                self.insort2(i, &s2, None, Some(s1));
                return;
            }
            // Interior (2c).
            if s1.so > s2.so && s1.eo < s2.eo {
                self.insort3(i, &s2, s1);
                return;
            }
            // Extends right (3a).
            if s1.so == s2.so && s1.eo > s2.eo {
                let clone = StyleRange::new(s2.so, s2.eo, s1.style.clone());
                i = self.insort1(i, &s2, clone);
                s1.so = s2.eo;
                i += 1;
                continue;
            }
            // Extends left (3b).
            if s1.so < s2.so && s1.eo == s2.eo {
                let lead = StyleRange::new(s1.so, s2.so, s1.style.clone());
                self.ranges.insert(i, lead);
                let i2 = i + 1;
                s1.so = s2.so;
                self.insort1(i2, &s2, s1);
                return;
            }
            // Straddles (3c).
            if s1.so < s2.so && s1.eo > s2.eo {
                let lead = StyleRange::new(s1.so, s2.so, s1.style.clone());
                self.ranges.insert(i, lead);
                let i2 = i + 1;
                let clone = StyleRange::new(s2.so, s2.eo, s1.style.clone());
                i = self.insort1(i2, &s2, clone);
                s1.so = s2.eo;
                i += 1;
                continue;
            }
            // Overhangs right (4a).
            if s1.so < s2.so && s1.eo < s2.eo && s1.eo > s2.so {
                let lead = StyleRange::new(s1.so, s2.so, s1.style.clone());
                self.ranges.insert(i, lead);
                let i2 = i + 1;
                s1.so = s2.so;
                self.insort2(i2, &s2, Some(s1), None);
                return;
            }
            // Overhangs left (4b).
            if s2.so < s1.so && s2.eo < s1.eo && s2.eo > s1.so {
                let t = s2.eo;
                let tail = StyleRange::new(s1.so, s2.eo, s1.style.clone());
                i = self.insort2(i, &s2, None, Some(tail));
                s1.so = t;
                i += 1;
                continue;
            }

            i += 1;
        }
    }

    /// Finds the last index, starting at `start`, whose range coincides
    /// (same `so`/`eo`) with `orig` - the "coincident run" subroutine shared
    /// by all three insort helpers.
    fn run_end(&self, start: usize, orig: &StyleRange) -> usize {
        let mut end = start;
        while end + 1 < self.ranges.len() && self.ranges[end + 1].coincides_with(orig) {
            end += 1;
        }
        end
    }

    /// `insort_style1`: inserts `a` immediately after the coincident run
    /// starting at `node`. Returns the index `a` landed at.
    fn insort1(&mut self, node: usize, orig: &StyleRange, a: StyleRange) -> usize {
        let end = self.run_end(node, orig);
        let pos = end + 1;
        self.ranges.insert(pos, a);
        pos
    }

    /// `insort_style2`: clips every range in the coincident run in place to
    /// `[orig.so, p2)` (where `p2` is `a.eo` or `b.so`), then inserts, in
    /// order: `a` (if present), a `[p2, orig.eo)` copy of each clipped
    /// range's original style (preserving the run's relative order), then
    /// `b` (if present). Returns `b`'s landing index when `b` is present
    /// (the overhangs-left case resumes its scan from there); otherwise the
    /// index of the last inserted piece.
    fn insort2(
        &mut self,
        node: usize,
        orig: &StyleRange,
        a: Option<StyleRange>,
        b: Option<StyleRange>,
    ) -> usize {
        let p2 = match &a {
            Some(a) => a.eo,
            None => b.as_ref().expect("insort2 needs a or b").so,
        };
        let p3 = orig.eo;
        let end = self.run_end(node, orig);

        let styles: Vec<_> = (node..=end).map(|i| self.ranges[i].style.clone()).collect();
        for i in node..=end {
            self.ranges[i].eo = p2;
        }

        let mut pos = end + 1;
        if let Some(a) = a {
            self.ranges.insert(pos, a);
            pos += 1;
        }
        for style in &styles {
            self.ranges.insert(pos, StyleRange::new(p2, p3, style.clone()));
            pos += 1;
        }
        if let Some(b) = b {
            self.ranges.insert(pos, b);
            pos += 1;
        }
        pos.saturating_sub(1)
    }

    /// `insort_style3`: clips every range in the coincident run in place to
    /// `[orig.so, b.so)`, then inserts, in order: a `[b.so, b.eo)` copy of
    /// each clipped range's original style, `b` itself, then a
    /// `[b.eo, orig.eo)` copy of each original style - all preserving the
    /// run's relative order. Returns `b`'s landing index.
    fn insort3(&mut self, node: usize, orig: &StyleRange, b: StyleRange) -> usize {
        let p2 = b.so;
        let p3 = b.eo;
        let p4 = orig.eo;
        let end = self.run_end(node, orig);

        let styles: Vec<_> = (node..=end).map(|i| self.ranges[i].style.clone()).collect();
        for i in node..=end {
            self.ranges[i].eo = p2;
        }

        let mut pos = end + 1;
        for style in &styles {
            self.ranges.insert(pos, StyleRange::new(p2, p3, style.clone()));
            pos += 1;
        }
        let b_pos = pos;
        self.ranges.insert(pos, b);
        pos += 1;
        for style in &styles {
            self.ranges.insert(pos, StyleRange::new(p3, p4, style.clone()));
            pos += 1;
        }
        b_pos
    }

    /// Position-update propagation at the outermost match state
    /// (spec.md S4.6): after a buffer edit at `[lo, lo+old)` changing length
    /// by `diff`, shift every style endpoint the same way.
    pub fn update_positions(&mut self, so: i64, diff: i64, outer_eo: i64) {
        for rng in self.ranges.iter_mut() {
            let rso = rng.so as i64;
            let reo = rng.eo as i64;

            if rso == reo && rso == so {
                rng.eo = (reo + diff).max(so) as usize;
            } else {
                if reo > so || (reo >= so && so == outer_eo) {
                    rng.eo = (reo + diff).max(so) as usize;
                }
                if rso > so {
                    rng.so = (rso + diff).max(so) as usize;
                }
            }
        }
    }
}
