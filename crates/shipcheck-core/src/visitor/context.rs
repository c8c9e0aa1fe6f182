//! Visitor context providing file information during AST traversal.

use swc_common::Span;

use crate::parser::ParsedFile;

pub struct VisitorContext<'a> {
    file: &'a ParsedFile,
}

impl<'a> VisitorContext<'a> {
    pub fn new(file: &'a ParsedFile) -> Self {
        Self { file }
    }

    pub fn file(&self) -> &ParsedFile {
        self.file
    }

    /// 1-based line and column of the start of `span`.
    pub fn span_to_location(&self, span: Span) -> (usize, usize) {
        let source = self.file.source();
        let lo = self.file.offset_of(span.lo.0);

        if source.is_empty() || lo == 0 {
            return (1, 1);
        }

        let prefix = &source[..floor_char_boundary(source, lo)];
        let line = prefix.matches('\n').count() + 1;
        let last_newline = prefix.rfind('\n').map(|i| i + 1).unwrap_or(0);
        let column = prefix.len() - last_newline + 1;

        (line, column)
    }

    pub fn span_line(&self, span: Span) -> usize {
        self.span_to_location(span).0
    }

    pub fn get_source_text(&self, span: Span) -> Option<&str> {
        let source = self.file.source();
        let lo = self.file.offset_of(span.lo.0);
        let hi = self.file.offset_of(span.hi.0);

        if lo <= hi && hi <= source.len() {
            source.get(lo..hi)
        } else {
            None
        }
    }
}

fn floor_char_boundary(source: &str, index: usize) -> usize {
    let mut index = index.min(source.len());
    while !source.is_char_boundary(index) {
        index -= 1;
    }
    index
}
