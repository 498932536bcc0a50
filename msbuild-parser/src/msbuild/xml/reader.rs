//! Location-capturing XML reader
//!
//! Drives an `xmlparser` tokenizer over the document and builds an [`XmlDocument`] in the
//! same pass. Open elements live on a frame stack; each element records its spans as its
//! tokens go by, and gets its [`NodeLocation`] when its frame is closed, so no separate
//! location stream has to be matched up with the tree afterwards.
//!
//! The tokenizer stops at the first error. The reader records the error, closes or
//! salvages whatever tag was being read, and restarts the tokenizer in fragment mode at the
//! next `<`. Text being edited is rarely well-formed, and everything after a typo should
//! still get locations.

use std::ops;
use xmlparser::{ElementEnd, StrSpan, Token, Tokenizer};

use super::syntax::{ElementId, NodeLocation, XmlAttribute, XmlContent, XmlDocument, XmlElement, XmlText};
use crate::msbuild::diagnostics::{Diagnostic, DiagnosticSink, DiagnosticSource, Severity};
use crate::msbuild::text::{Position, PositionIndex};

struct Frame {
    element: ElementId,
    in_start_tag: bool,
}

struct Reader<'a> {
    text: &'a str,
    index: &'a PositionIndex,
    sink: &'a mut dyn DiagnosticSink,
    document: XmlDocument,
    stack: Vec<Frame>,
}

/// Read `text` into an [`XmlDocument`], reporting problems to `sink`.
pub fn read_document(
    text: &str,
    index: &PositionIndex,
    sink: &mut dyn DiagnosticSink,
) -> XmlDocument {
    let mut reader = Reader {
        text,
        index,
        sink,
        document: XmlDocument::default(),
        stack: Vec::new(),
    };

    let mut tokenizer = Tokenizer::from(text);
    let mut last_good = 0;
    let mut fragment_start = None;
    loop {
        match tokenizer.next() {
            None => break,
            Some(Ok(token)) => {
                last_good = token_end(&token);
                reader.token(token);
            }
            Some(Err(error)) => {
                let pos = error.pos();
                let error_byte = index
                    .to_offset(Position::one_based(pos.row as usize, pos.col as usize))
                    .map(|offset| index.offset_to_byte(offset))
                    .unwrap_or(text.len())
                    .max(last_good);
                let retried = fragment_start == Some(last_good);
                match reader.recover(last_good, error_byte, retried, &error.to_string()) {
                    Some(resume) => {
                        last_good = resume;
                        fragment_start = Some(resume);
                        tokenizer = Tokenizer::from_fragment(text, resume..text.len());
                    }
                    None => break,
                }
            }
        }
    }

    reader.finish()
}

fn token_end(token: &Token) -> usize {
    match token {
        Token::Declaration { span, .. }
        | Token::ProcessingInstruction { span, .. }
        | Token::Comment { span, .. }
        | Token::DtdStart { span, .. }
        | Token::EmptyDtd { span, .. }
        | Token::EntityDeclaration { span, .. }
        | Token::DtdEnd { span }
        | Token::ElementStart { span, .. }
        | Token::Attribute { span, .. }
        | Token::ElementEnd { span, .. }
        | Token::Cdata { span, .. } => span.end(),
        Token::Text { text } => text.end(),
    }
}

fn qualified_name(prefix: &StrSpan, local: &StrSpan) -> String {
    if prefix.as_str().is_empty() {
        local.as_str().to_string()
    } else {
        format!("{}:{}", prefix.as_str(), local.as_str())
    }
}

impl Reader<'_> {
    fn chars(&self, bytes: ops::Range<usize>) -> ops::Range<usize> {
        self.index.byte_to_offset(bytes.start)..self.index.byte_to_offset(bytes.end)
    }

    fn span(&self, span: &StrSpan) -> ops::Range<usize> {
        self.chars(span.start()..span.end())
    }

    fn trace(&mut self, span: ops::Range<usize>, message: impl FnOnce() -> String) {
        if self.sink.wants_trace() {
            let range = self.index.span_to_range(span);
            self.sink
                .emit(Diagnostic::new(Severity::Trace, DiagnosticSource::Reader, message()).at(range));
        }
    }

    fn report(&mut self, severity: Severity, span: ops::Range<usize>, message: String) {
        let range = self.index.span_to_range(span);
        self.sink
            .emit(Diagnostic::new(severity, DiagnosticSource::Reader, message).at(range));
    }

    fn top(&self) -> Option<&Frame> {
        self.stack.last()
    }

    fn element_mut(&mut self, id: ElementId) -> &mut XmlElement {
        &mut self.document.elements[id.0]
    }

    fn token(&mut self, token: Token) {
        match token {
            Token::ElementStart {
                prefix,
                local,
                span,
            } => {
                let name_start = if prefix.as_str().is_empty() {
                    local.start()
                } else {
                    prefix.start()
                };
                let name_span = self.chars(name_start..local.end());
                let span = self.span(&span);
                self.open_element(qualified_name(&prefix, &local), prefix.as_str(), span, name_span);
            }
            Token::Attribute {
                prefix,
                local,
                value,
                span,
            } => self.attribute(&prefix, &local, &value, &span),
            Token::ElementEnd { end, span } => {
                let span = self.span(&span);
                match end {
                    ElementEnd::Open => self.end_start_tag(span, false),
                    ElementEnd::Empty => self.end_start_tag(span, true),
                    ElementEnd::Close(prefix, local) => {
                        self.close_tag(qualified_name(&prefix, &local), span)
                    }
                }
            }
            Token::Text { text } => {
                let span = self.span(&text);
                self.content(XmlContent::Text(XmlText {
                    text: text.as_str().to_string(),
                    span,
                }));
            }
            Token::Cdata { text, .. } => {
                let span = self.span(&text);
                self.content(XmlContent::Cdata(XmlText {
                    text: text.as_str().to_string(),
                    span,
                }));
            }
            Token::Comment { text, span } => {
                let span = self.span(&span);
                let text = text.as_str().to_string();
                self.content(XmlContent::Comment(XmlText { text, span }));
            }
            Token::Declaration { span, .. }
            | Token::ProcessingInstruction { span, .. }
            | Token::DtdStart { span, .. }
            | Token::EmptyDtd { span, .. }
            | Token::EntityDeclaration { span, .. }
            | Token::DtdEnd { span } => {
                let span = self.span(&span);
                self.trace(span, || "skipped markup declaration".to_string());
            }
        }
    }

    fn new_element(
        &mut self,
        name: String,
        prefix: &str,
        span: ops::Range<usize>,
        name_span: ops::Range<usize>,
    ) -> ElementId {
        let id = ElementId(self.document.elements.len());
        let parent = self.top().map(|frame| frame.element);
        let depth = self.stack.len();
        let location = NodeLocation {
            range: self.index.span_to_range(span.clone()),
            depth,
            name: name.clone(),
        };
        self.document.elements.push(XmlElement {
            id,
            name,
            prefix: prefix.to_string(),
            span,
            name_span,
            start_tag: None,
            attributes_span: None,
            end_tag: None,
            is_empty: false,
            attributes: Vec::new(),
            content: Vec::new(),
            parent,
            location,
        });
        match parent {
            Some(parent) => self.element_mut(parent).content.push(XmlContent::Element { id }),
            None => self.document.roots.push(id),
        }
        id
    }

    fn open_element(
        &mut self,
        name: String,
        prefix: &str,
        span: ops::Range<usize>,
        name_span: ops::Range<usize>,
    ) {
        let start = span.start;
        let id = self.new_element(name, prefix, span, name_span);
        self.trace(start..start, || format!("opened element #{}", id.0));
        self.stack.push(Frame {
            element: id,
            in_start_tag: true,
        });
    }

    fn attribute(&mut self, prefix: &StrSpan, local: &StrSpan, value: &StrSpan, span: &StrSpan) {
        let Some(frame) = self.top().filter(|frame| frame.in_start_tag) else {
            return;
        };
        let element = frame.element;
        let name_start = if prefix.as_str().is_empty() {
            local.start()
        } else {
            prefix.start()
        };
        let name_span = self.chars(name_start..local.end());
        let value_span = self.span(value);
        let span = self.span(span);
        let name = qualified_name(prefix, local);
        let location = NodeLocation {
            range: self.index.span_to_range(span.clone()),
            depth: self.stack.len(),
            name: name.clone(),
        };
        self.trace(span.clone(), || format!("captured attribute {name}"));

        let attribute = XmlAttribute {
            name,
            value: value.as_str().to_string(),
            span: span.clone(),
            name_span,
            value_span,
            location,
        };
        let element = self.element_mut(element);
        element.attributes_span = Some(match element.attributes_span.take() {
            Some(block) => block.start..span.end,
            None => span.clone(),
        });
        element.span.end = span.end;
        element.attributes.push(attribute);
    }

    fn end_start_tag(&mut self, span: ops::Range<usize>, empty: bool) {
        let Some(frame) = self.stack.last_mut() else {
            return;
        };
        frame.in_start_tag = false;
        let id = frame.element;
        let element = self.element_mut(id);
        element.start_tag = Some(element.span.start..span.end);
        element.span.end = span.end;
        if empty {
            element.is_empty = true;
            self.stack.pop();
            self.finish_element(id);
        }
    }

    fn close_tag(&mut self, name: String, span: ops::Range<usize>) {
        let matching = self
            .stack
            .iter()
            .rposition(|frame| self.document.elements[frame.element.0].name == name);
        let Some(position) = matching else {
            self.report(
                Severity::Warning,
                span,
                format!("closing tag </{name}> does not match any open element"),
            );
            return;
        };

        while self.stack.len() > position + 1 {
            if let Some(frame) = self.stack.pop() {
                self.close_unclosed(frame.element, span.start);
            }
        }
        if let Some(frame) = self.stack.pop() {
            let element = self.element_mut(frame.element);
            element.end_tag = Some(span.clone());
            element.span.end = span.end;
            self.finish_element(frame.element);
        }
    }

    fn close_unclosed(&mut self, id: ElementId, at: usize) {
        let element = self.element_mut(id);
        element.span.end = at.max(element.span.start);
        let name = element.name.clone();
        let span = element.span.clone();
        self.report(
            Severity::Warning,
            span.start..span.start,
            format!("element <{name}> is not closed"),
        );
        self.finish_element(id);
    }

    fn finish_element(&mut self, id: ElementId) {
        let span = self.document.elements[id.0].span.clone();
        let range = self.index.span_to_range(span.clone());
        self.element_mut(id).location.range = range;
        self.trace(span, || format!("closed element #{}", id.0));
    }

    fn content(&mut self, content: XmlContent) {
        match self.stack.last() {
            Some(frame) if !frame.in_start_tag => {
                let id = frame.element;
                self.element_mut(id).content.push(content);
            }
            _ => {}
        }
    }

    /// Deal with a tokenizer error and pick the byte offset to resume at, if any.
    ///
    /// A tag the tokenizer rejected is first retried on its own in fragment mode, which
    /// clears errors that come from the tokenizer's document-level state (markup after the
    /// root element closed). Only a tag that fails again is treated as broken.
    fn recover(
        &mut self,
        last_good: usize,
        error_byte: usize,
        retried: bool,
        message: &str,
    ) -> Option<usize> {
        let text = self.text;
        let junk_start = text
            .get(last_good..error_byte)
            .and_then(|skipped| skipped.rfind('<'))
            .map_or(last_good, |found| last_good + found);
        let in_start_tag = self.top().is_some_and(|frame| frame.in_start_tag);
        let at_tag = text[junk_start..].starts_with('<');

        if at_tag && !in_start_tag && !retried {
            return Some(junk_start);
        }

        let search_from = error_byte.max(
            junk_start + text[junk_start..].chars().next().map_or(1, char::len_utf8),
        );
        let resume = text
            .get(search_from..)
            .and_then(|rest| rest.find('<'))
            .map(|found| search_from + found);
        let stop = resume.unwrap_or(text.len());

        let junk = self.chars(junk_start..stop);
        self.report(Severity::Error, junk.start..junk.start, message.to_string());

        if in_start_tag {
            if let Some(frame) = self.stack.pop() {
                self.close_unclosed(frame.element, junk.end);
            }
        } else if at_tag && !text[junk_start..].starts_with("</") {
            let name: String = text[junk_start + 1..stop]
                .chars()
                .take_while(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '.' | ':'))
                .collect();
            let name_start = junk.start + 1;
            let name_span = name_start..name_start + name.chars().count();
            let prefix = name
                .split_once(':')
                .map_or("", |(prefix, _)| prefix)
                .to_string();
            let id = self.new_element(name, &prefix, junk.clone(), name_span);
            self.trace(junk, || format!("salvaged broken tag as element #{}", id.0));
            self.finish_element(id);
        } else {
            self.trace(junk, || "skipped unreadable markup".to_string());
        }

        resume
    }

    fn finish(mut self) -> XmlDocument {
        let end = self.index.len();
        while let Some(frame) = self.stack.pop() {
            self.close_unclosed(frame.element, end);
        }
        self.document
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::msbuild::diagnostics::{Diagnostic, NullSink};

    fn read(text: &str) -> XmlDocument {
        read_document(text, &PositionIndex::new(text), &mut NullSink)
    }

    #[test]
    fn test_reads_nested_elements() {
        let document = read("<a><b x=\"1\"/></a>");
        let a = document.root().unwrap();
        let b = document.element(a.child_elements().next().unwrap());

        assert_eq!(a.name, "a");
        assert_eq!(a.span, 0..17);
        assert_eq!(a.start_tag, Some(0..3));
        assert_eq!(a.end_tag, Some(13..17));
        assert!(b.is_empty);
        assert_eq!(b.span, 3..13);
        assert_eq!(b.attributes[0].value_span, 9..10);
        assert_eq!(b.attributes[0].location.depth, 2);
        assert_eq!(b.location.depth, 1);
    }

    #[test]
    fn test_locations_follow_document_order() {
        let document = read("<a p=\"\"><b/><c q=\"2\"/></a>");
        let names: Vec<_> = document
            .locations()
            .into_iter()
            .map(|location| location.name.as_str())
            .collect();

        assert_eq!(names, vec!["a", "p", "b", "c", "q"]);
    }

    #[test]
    fn test_unclosed_children_close_at_parent_end_tag() {
        let text = "<a><b><c></a>";
        let mut sink: Vec<Diagnostic> = Vec::new();
        let document = read_document(text, &PositionIndex::new(text), &mut sink);
        let b = &document.elements()[1];

        assert!(!b.is_closed());
        assert_eq!(b.span, 3..9);
        assert!(document.root().unwrap().is_closed());
        assert_eq!(
            sink.iter()
                .filter(|diagnostic| diagnostic.severity == Severity::Warning)
                .count(),
            2
        );
    }

    #[test]
    fn test_recovers_after_broken_tag() {
        let text = "<a>\n  <\n  <b/>\n</a>";
        let document = read(text);
        let names: Vec<_> = document
            .elements()
            .iter()
            .map(|element| element.name.as_str())
            .collect();

        assert_eq!(names, vec!["a", "", "b"]);
        assert!(document.root().unwrap().is_closed());
        assert!(document.elements()[1].start_tag.is_none());
    }

    #[test]
    fn test_stray_close_tag_is_ignored() {
        let text = "<a></b></a>";
        let mut sink: Vec<Diagnostic> = Vec::new();
        let document = read_document(text, &PositionIndex::new(text), &mut sink);

        assert_eq!(document.elements().len(), 1);
        assert!(document.root().unwrap().is_closed());
        assert!(sink.iter().any(|d| d.message.contains("</b>")));
    }

    #[test]
    fn test_trace_only_when_wanted() {
        let text = "<a/>";
        let mut sink: Vec<Diagnostic> = Vec::new();
        read_document(text, &PositionIndex::new(text), &mut sink);

        assert!(sink.iter().all(Diagnostic::is_trace));
        assert!(!sink.is_empty());
    }

    #[test]
    fn test_multibyte_text_uses_character_offsets() {
        let document = read("<é a=\"ü\"/>");
        let element = document.root().unwrap();

        assert_eq!(element.name_span, 1..2);
        assert_eq!(element.attributes[0].value_span, 6..7);
    }
}
