//! style.rs - Named styles: pre/post decoration strings attached to a range
//! of text by a style rule.
//!
//! A style is built from a list of [`StyleSpec`] items declared in a script's
//! `style` block. Plain `pre`/`post` items contribute literal decoration
//! text; referencing an already-declared style folds that style's own
//! decoration in around it, which is what makes nested/composed styles
//! invert their nesting order in the final output (see [`Style::new`]).

use std::rc::Rc;

/// One component of a style declaration's body.
#[derive(Debug, Clone)]
pub enum StyleSpec {
    /// A literal string to prepend before the styled range.
    Pre(String),
    /// A literal string to append after the styled range.
    Post(String),
    /// A reference to a previously declared style, folded into this one.
    Style(Rc<Style>),
}

/// A named style: a pair of decoration strings materialized around a byte
/// range when a style rule fires.
///
/// Styles are reference-counted (`Rc<Style>`) rather than carrying their own
/// manual refcount field, since `Rc` already gives us exactly the shared-DAG
/// ownership the rule tree needs when the same style is referenced by more
/// than one style or match rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Style {
    pub name: String,
    pub pre_string: String,
    pub post_string: String,
}

impl Style {
    /// Builds a style from its declared component list.
    ///
    /// `Pre` strings are appended (in order) to the growing prefix. `Post`
    /// strings are *prepended* to the growing suffix, so that components
    /// declared later end up closest to the styled text - the final
    /// prefix/suffix pair nests outward-in/inward-out around an embedded
    /// style reference exactly the way it would if that style had been
    /// applied as a separate, surrounding rule.
    pub fn new(name: impl Into<String>, spec: &[StyleSpec]) -> Style {
        let mut pre = String::new();
        let mut post = String::new();

        for item in spec {
            match item {
                StyleSpec::Pre(s) => pre.push_str(s),
                StyleSpec::Post(s) => {
                    post.insert_str(0, s);
                }
                StyleSpec::Style(inner) => {
                    pre.push_str(&inner.pre_string);
                    post.insert_str(0, &inner.post_string);
                }
            }
        }

        Style {
            name: name.into(),
            pre_string: pre,
            post_string: post,
        }
    }
}
