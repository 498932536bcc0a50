//! Semicolon list assembly
//!
//! Both list forms keep every slot that `String.Split(';')` would produce, so `";A;"`
//! has three items: an empty one, `A`, and another empty one. Empty slots are zero-length
//! [`ExprKind::EmptyListItem`] nodes. Whitespace next to a `;` belongs to the separator node,
//! never to the neighbouring item.

use std::ops::Range;

use super::ast::{Expr, ExprKind};
use super::grammar::ListParts;

/// Turn the `list` rule's output into a `List` node spanning `0..length`.
pub(crate) fn build_list(parts: ListParts, length: usize) -> Expr {
    let mut children = Vec::with_capacity(parts.rest.len() * 2 + 1);
    push_slot(&mut children, parts.first, 0);
    for ((semicolon, separator), item) in parts.rest {
        let slot_start = separator.end;
        children.push(Expr::leaf(
            ExprKind::ListSeparator {
                separator_offset: semicolon.start - separator.start,
            },
            separator,
        ));
        push_slot(&mut children, item, slot_start);
    }
    Expr::node(ExprKind::List, 0..length, children)
}

fn push_slot(children: &mut Vec<Expr>, item: Option<Expr>, position: usize) {
    children.push(item.unwrap_or_else(|| Expr::leaf(ExprKind::EmptyListItem, position..position)));
}

/// Build a `SimpleList` over `text`, given the spans of its semicolons.
pub(crate) fn build_simple_list(text: &str, semicolons: &[Range<usize>]) -> Expr {
    let chars: Vec<char> = text.chars().collect();
    let length = chars.len();

    let mut segments = Vec::with_capacity(semicolons.len() + 1);
    let mut segment_start = 0;
    for semicolon in semicolons {
        segments.push(segment_start..semicolon.start);
        segment_start = semicolon.end;
    }
    segments.push(segment_start..length);

    let last = segments.len() - 1;
    let cores: Vec<Range<usize>> = segments
        .iter()
        .enumerate()
        .map(|(index, segment)| {
            let mut start = segment.start;
            let mut end = segment.end;
            if index > 0 {
                while start < end && chars[start].is_whitespace() {
                    start += 1;
                }
            }
            if index < last {
                while end > start && chars[end - 1].is_whitespace() {
                    end -= 1;
                }
            }
            // A blank slot after a separator is absorbed by it entirely.
            if start == end && index > 0 {
                start = segment.end;
                end = segment.end;
            }
            start..end
        })
        .collect();

    let mut children = Vec::with_capacity(cores.len() * 2);
    for (index, core) in cores.iter().enumerate() {
        if index > 0 {
            let separator = cores[index - 1].end..core.start;
            children.push(Expr::leaf(
                ExprKind::ListSeparator {
                    separator_offset: semicolons[index - 1].start - separator.start,
                },
                separator,
            ));
        }
        children.push(if core.is_empty() {
            Expr::leaf(ExprKind::EmptyListItem, core.clone())
        } else {
            Expr::leaf(
                ExprKind::SimpleListItem {
                    value: chars[core.clone()].iter().collect(),
                },
                core.clone(),
            )
        });
    }
    Expr::node(ExprKind::SimpleList, 0..length, children)
}
