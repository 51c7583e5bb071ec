//! Compilation inputs and compilation units.
//!
//! A [`SourceUnit`] is what callers hand to the compiler: a name and text,
//! optionally already parsed. The compiler turns each one into a
//! [`CompilationUnit`], and macro expansion adds more units whose text is
//! synthesized.

use std::{fmt, sync::Arc};

use crate::{
    compiler::staging::{ClassifierHandle, ServiceHandle},
    span::Span,
    syntax::{MemberDecl, ServiceCriteriaDecl, SourceFile},
};

/// One input to [`compile`](crate::compile).
#[derive(Debug, Clone)]
pub struct SourceUnit {
    name: Arc<str>,
    text: Arc<str>,
    syntax: Option<SourceFile>,
}

impl SourceUnit {
    /// A source to be lexed and parsed by the compiler.
    pub fn new(name: impl Into<Arc<str>>, text: impl Into<Arc<str>>) -> Self {
        Self {
            name: name.into(),
            text: text.into(),
            syntax: None,
        }
    }

    /// A source whose syntax tree was produced ahead of time. The text is
    /// still needed to place diagnostics.
    pub fn with_syntax(
        name: impl Into<Arc<str>>,
        text: impl Into<Arc<str>>,
        syntax: SourceFile,
    ) -> Self {
        Self {
            name: name.into(),
            text: text.into(),
            syntax: Some(syntax),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub(crate) fn into_parts(self) -> (Arc<str>, Arc<str>, Option<SourceFile>) {
        (self.name, self.text, self.syntax)
    }
}

/// The user-visible place that caused a macro unit to be synthesized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct MacroOrigin {
    /// A unit that is not itself a macro unit.
    pub unit: usize,
    pub span: Span,
}

/// What a compilation unit contains.
#[derive(Debug)]
pub(crate) enum UnitTree {
    /// A whole file, user-written or synthesized by a root macro.
    File(SourceFile),
    /// Members spliced into an existing classifier.
    Members {
        host: ClassifierHandle,
        members: Vec<MemberDecl>,
    },
    /// Criteria spliced into an existing service.
    ServiceCriteria {
        host: ServiceHandle,
        criteria: Vec<ServiceCriteriaDecl>,
    },
    /// The text did not lex or parse; the unit only serves diagnostics.
    Invalid,
}

/// Source text split into lines together with its parsed tree.
#[derive(Debug)]
pub(crate) struct CompilationUnit {
    ordinal: usize,
    source_name: Arc<str>,
    text: Arc<str>,
    line_starts: Vec<usize>,
    tree: UnitTree,
    macro_origin: Option<MacroOrigin>,
}

impl CompilationUnit {
    pub fn new(
        ordinal: usize,
        source_name: Arc<str>,
        text: Arc<str>,
        tree: UnitTree,
        macro_origin: Option<MacroOrigin>,
    ) -> Self {
        let line_starts = std::iter::once(0)
            .chain(text.match_indices('\n').map(|(index, _)| index + 1))
            .collect();
        Self {
            ordinal,
            source_name,
            text,
            line_starts,
            tree,
            macro_origin,
        }
    }

    pub fn ordinal(&self) -> usize {
        self.ordinal
    }

    pub fn source_name(&self) -> &Arc<str> {
        &self.source_name
    }

    pub fn text(&self) -> &Arc<str> {
        &self.text
    }

    pub fn tree(&self) -> &UnitTree {
        &self.tree
    }

    pub fn macro_origin(&self) -> Option<MacroOrigin> {
        self.macro_origin
    }

    /// 1-based line and column of a byte offset. Columns count characters.
    pub fn line_column(&self, offset: usize) -> (usize, usize) {
        let offset = offset.min(self.text.len());
        let line = self.line_starts.partition_point(|start| *start <= offset);
        let line_start = self.line_starts[line - 1];
        let column = self
            .text
            .get(line_start..offset)
            .map_or(offset - line_start, |prefix| prefix.chars().count());
        (line, column + 1)
    }
}

impl fmt::Display for CompilationUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (#{})", self.source_name, self.ordinal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit(text: &str) -> CompilationUnit {
        CompilationUnit::new(0, Arc::from("qa.klass"), Arc::from(text), UnitTree::Invalid, None)
    }

    #[test]
    fn test_line_column() {
        let unit = unit("package a\n\nclass Foo\n{\n}\n");

        assert_eq!(unit.line_column(0), (1, 1));
        assert_eq!(unit.line_column(8), (1, 9));
        assert_eq!(unit.line_column(10), (2, 1));
        assert_eq!(unit.line_column(17), (3, 7));
    }

    #[test]
    fn test_line_column_counts_characters() {
        let unit = unit("// ünïcode\nclass");
        assert_eq!(unit.line_column(13), (2, 1));
        assert_eq!(unit.line_column(5), (1, 5));
    }

    #[test]
    fn test_line_column_clamps_to_end() {
        let unit = unit("abc");
        assert_eq!(unit.line_column(99), (1, 4));
    }
}
