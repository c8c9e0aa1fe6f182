//! SWC parsing of project source files.
//!
//! Parsing always recovers: a file that fails to parse keeps its source and
//! errors so text-based extractors can still fall back on it.

use swc_common::sync::Lrc;
use swc_common::{FileName, SourceMap, Spanned};
use swc_ecma_ast::{EsVersion, Module};
use swc_ecma_parser::{EsSyntax, Syntax, TsSyntax, parse_file_as_module};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Language {
    /// `.js`, `.jsx`, `.mjs`, `.cjs`. JSX is always accepted.
    JavaScript,
    TypeScript,
    Tsx,
}

impl Language {
    pub fn from_filename(filename: &str) -> Self {
        let ext = filename.rsplit('.').next().unwrap_or("").to_ascii_lowercase();
        match ext.as_str() {
            "ts" | "mts" | "cts" => Language::TypeScript,
            "tsx" => Language::Tsx,
            _ => Language::JavaScript,
        }
    }

    fn syntax(self) -> Syntax {
        match self {
            Language::JavaScript => Syntax::Es(EsSyntax {
                jsx: true,
                decorators: true,
                ..Default::default()
            }),
            Language::TypeScript | Language::Tsx => Syntax::Typescript(TsSyntax {
                tsx: self == Language::Tsx,
                decorators: true,
                ..Default::default()
            }),
        }
    }
}

#[derive(Debug, Clone, thiserror::Error)]
#[error("{message} at {line}:{column}")]
pub struct ParseError {
    pub line: usize,
    pub column: usize,
    pub message: String,
}

pub struct ParsedFile {
    filename: String,
    language: Language,
    source: String,
    module: Option<Module>,
    errors: Vec<ParseError>,
    /// Byte position SWC assigned to the first character of `source`.
    start_pos: u32,
}

impl std::fmt::Debug for ParsedFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParsedFile")
            .field("filename", &self.filename)
            .field("language", &self.language)
            .field("has_module", &self.module.is_some())
            .field("error_count", &self.errors.len())
            .finish()
    }
}

impl ParsedFile {
    pub fn from_source(filename: &str, source: &str) -> Self {
        let language = Language::from_filename(filename);
        let source_map: Lrc<SourceMap> = Default::default();
        let fm = source_map.new_source_file(
            FileName::Custom(filename.to_string()).into(),
            source.to_string(),
        );

        let mut recovered = Vec::new();
        let result = parse_file_as_module(
            &fm,
            language.syntax(),
            EsVersion::latest(),
            None,
            &mut recovered,
        );

        let to_parse_error = |e: &swc_ecma_parser::error::Error| {
            let loc = source_map.lookup_char_pos(e.span().lo);
            ParseError {
                line: loc.line,
                column: loc.col_display + 1,
                message: e.kind().msg().to_string(),
            }
        };

        let mut errors: Vec<ParseError> = recovered.iter().map(to_parse_error).collect();
        let module = match result {
            Ok(module) => Some(module),
            Err(fatal) => {
                errors.push(to_parse_error(&fatal));
                None
            }
        };

        Self {
            filename: filename.to_string(),
            language,
            source: source.to_string(),
            module,
            errors,
            start_pos: fm.start_pos.0,
        }
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn module(&self) -> Option<&Module> {
        self.module.as_ref()
    }

    pub fn errors(&self) -> &[ParseError] {
        &self.errors
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Converts an absolute SWC byte position into an offset into `source()`.
    pub fn offset_of(&self, pos: u32) -> usize {
        pos.saturating_sub(self.start_pos) as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn language_from_extension() {
        assert_eq!(Language::from_filename("file.js"), Language::JavaScript);
        assert_eq!(Language::from_filename("file.mjs"), Language::JavaScript);
        assert_eq!(Language::from_filename("file.jsx"), Language::JavaScript);
        assert_eq!(Language::from_filename("file.ts"), Language::TypeScript);
        assert_eq!(Language::from_filename("file.MTS"), Language::TypeScript);
        assert_eq!(Language::from_filename("file.tsx"), Language::Tsx);
        assert_eq!(Language::from_filename("unknown"), Language::JavaScript);
    }

    #[test]
    fn parses_route_handler_module() {
        let code = r#"
import { NextResponse } from "next/server";

export async function GET() {
    return NextResponse.json({ ok: true });
}
"#;
        let parsed = ParsedFile::from_source("app/api/health/route.ts", code);

        assert!(!parsed.has_errors());
        assert_eq!(parsed.module().unwrap().body.len(), 2);
    }

    #[test]
    fn parses_tsx_page() {
        let code = "export default function Page() { return <main>Hello</main>; }";
        let parsed = ParsedFile::from_source("app/page.tsx", code);

        assert!(parsed.module().is_some());
        assert_eq!(parsed.language(), Language::Tsx);
        assert_eq!(parsed.filename(), "app/page.tsx");
    }

    #[test]
    fn javascript_files_accept_jsx() {
        let parsed = ParsedFile::from_source("components/button.js", "const b = <button />;");

        assert!(parsed.module().is_some());
        assert!(!parsed.has_errors());
    }

    #[test]
    fn fatal_errors_keep_source_and_errors() {
        let parsed = ParsedFile::from_source("broken.ts", "const = ;");

        assert!(parsed.has_errors());
        assert!(!parsed.errors()[0].message.is_empty());
        assert_eq!(parsed.source(), "const = ;");
    }

    #[test]
    fn missing_semicolons_are_not_errors() {
        let parsed = ParsedFile::from_source("a.js", "const a = 1\nconst b = 2\n");

        assert!(parsed.module().is_some());
        assert!(!parsed.has_errors());
    }

    #[test]
    fn offset_of_is_relative_to_source_start() {
        let parsed = ParsedFile::from_source("test.js", "const x = 1;");
        let module = parsed.module().unwrap();
        let lo = module.body[0].span().lo.0;

        assert_eq!(parsed.offset_of(lo), 0);
    }
}
