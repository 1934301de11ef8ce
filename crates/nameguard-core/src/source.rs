//! Parsing and printing of source units with swc.

use crate::error::{Error, Result};
use std::path::Path;
use swc_common::comments::SingleThreadedComments;
use swc_common::sync::Lrc;
use swc_common::{FileName, SourceMap, Span, Spanned};
use swc_ecma_ast::{EsVersion, Module, ModuleItem, Program};
use swc_ecma_codegen::text_writer::JsWriter;
use swc_ecma_codegen::Emitter;
use swc_ecma_parser::{lexer::Lexer, EsSyntax, Parser, StringInput, Syntax, TsSyntax};

/// One parsed file.
pub struct SourceUnit {
    /// Project-relative path; also the key of the file's name cache entry.
    pub path: String,
    pub module: Module,
    pub cm: Lrc<SourceMap>,
    pub comments: SingleThreadedComments,
    /// `.d.ts` units: every declaration is ambient.
    pub is_declaration: bool,
}

impl SourceUnit {
    /// 1-based line of a position in this unit.
    #[must_use]
    pub fn line_of(&self, span: Span) -> usize {
        self.cm.lookup_char_pos(span.lo).line
    }
}

impl std::fmt::Debug for SourceUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceUnit")
            .field("path", &self.path)
            .field("is_declaration", &self.is_declaration)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Dialect {
    Js,
    Jsx,
    Ts,
    Tsx,
}

impl Dialect {
    fn from_path(path: &str) -> Self {
        let ext = Path::new(path)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default();
        match ext {
            "ts" | "mts" | "cts" | "ets" => Self::Ts,
            "tsx" => Self::Tsx,
            "jsx" => Self::Jsx,
            _ => Self::Js,
        }
    }

    fn syntax(self) -> Syntax {
        match self {
            Self::Ts | Self::Tsx => Syntax::Typescript(TsSyntax {
                tsx: self == Self::Tsx,
                decorators: true,
                ..Default::default()
            }),
            Self::Js | Self::Jsx => Syntax::Es(EsSyntax {
                jsx: self == Self::Jsx,
                decorators: true,
                ..Default::default()
            }),
        }
    }
}

#[must_use]
pub fn is_declaration_path(path: &str) -> bool {
    [".d.ts", ".d.mts", ".d.cts", ".d.ets"]
        .iter()
        .any(|suffix| path.ends_with(suffix))
}

/// Parse `source` as the file at `path`. Any syntax error fails the file.
///
/// Files without `import`/`export` are parsed as sloppy-mode scripts and
/// carried as a module whose body holds only statements.
pub fn parse_source(path: &str, source: &str) -> Result<SourceUnit> {
    let cm: Lrc<SourceMap> = Lrc::default();
    let fm = cm.new_source_file(
        Lrc::new(FileName::Custom(path.to_string())),
        source.to_string(),
    );
    let comments = SingleThreadedComments::default();
    let lexer = Lexer::new(
        Dialect::from_path(path).syntax(),
        EsVersion::EsNext,
        StringInput::from(&*fm),
        Some(&comments),
    );
    let mut parser = Parser::new_from(lexer);

    let parse_error = |cm: &SourceMap, span: Span, kind: String| {
        let line = cm.lookup_char_pos(span.lo).line;
        Error::Parse {
            path: path.to_string(),
            message: format!("line {line}: {kind}"),
        }
    };

    let program = parser
        .parse_program()
        .map_err(|e| parse_error(&cm, e.span(), format!("{:?}", e.kind())))?;
    if let Some(e) = parser.take_errors().into_iter().next() {
        return Err(parse_error(&cm, e.span(), format!("{:?}", e.kind())));
    }

    let module = match program {
        Program::Module(module) => module,
        Program::Script(script) => Module {
            span: script.span,
            body: script.body.into_iter().map(ModuleItem::Stmt).collect(),
            shebang: script.shebang,
        },
    };

    Ok(SourceUnit {
        path: path.to_string(),
        module,
        cm,
        comments,
        is_declaration: is_declaration_path(path),
    })
}

/// Read and parse a file from disk, keyed by `key` in the name cache.
pub fn read_source(file: &Path, key: &str) -> Result<SourceUnit> {
    let source = std::fs::read_to_string(file)?;
    parse_source(key, &source)
}

/// Print a unit back to source text.
pub fn print(unit: &SourceUnit) -> Result<String> {
    let mut buf = Vec::new();
    {
        let writer = JsWriter::new(unit.cm.clone(), "\n", &mut buf, None);
        let mut emitter = Emitter {
            cfg: swc_ecma_codegen::Config::default().with_target(EsVersion::EsNext),
            cm: unit.cm.clone(),
            comments: Some(&unit.comments),
            wr: writer,
        };
        emitter.emit_module(&unit.module).map_err(|e| Error::Print {
            path: unit.path.clone(),
            message: e.to_string(),
        })?;
    }
    String::from_utf8(buf).map_err(|e| Error::Print {
        path: unit.path.clone(),
        message: format!("invalid UTF-8 output: {e}"),
    })
}
