//! The symbol table of named top-level elements.
//!
//! Names are kept per [`Category`] in insertion-ordered maps so that every
//! walk over the table is deterministic.

use indexmap::IndexMap;
use klass_core::identifier::Id;

use crate::{
    compiler::{
        resolved::Resolved,
        staging::{
            AssociationHandle, ClassifierHandle, EnumerationHandle, ProjectionHandle,
            ServiceGroupHandle,
        },
    },
    span::Span,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum Category {
    Enumeration,
    Classifier,
    Association,
    Projection,
    ServiceGroup,
}

impl Category {
    const COUNT: usize = 5;

    pub fn name(&self) -> &'static str {
        match self {
            Category::Enumeration => "enumeration",
            Category::Classifier => "classifier",
            Category::Association => "association",
            Category::Projection => "projection",
            Category::ServiceGroup => "service group",
        }
    }

    fn slot(&self) -> usize {
        *self as usize
    }
}

/// A handle to any top-level staging element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum TopLevelHandle {
    Enumeration(EnumerationHandle),
    Classifier(ClassifierHandle),
    Association(AssociationHandle),
    Projection(ProjectionHandle),
    ServiceGroup(ServiceGroupHandle),
}

impl TopLevelHandle {
    pub fn category(&self) -> Category {
        match self {
            TopLevelHandle::Enumeration(_) => Category::Enumeration,
            TopLevelHandle::Classifier(_) => Category::Classifier,
            TopLevelHandle::Association(_) => Category::Association,
            TopLevelHandle::Projection(_) => Category::Projection,
            TopLevelHandle::ServiceGroup(_) => Category::ServiceGroup,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Symbol {
    handle: TopLevelHandle,
    unit: usize,
    span: Span,
    ambiguous: bool,
}

/// Where a name was declared before it was declared again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Redeclaration {
    pub unit: usize,
    pub span: Span,
}

#[derive(Debug)]
pub(crate) struct SymbolTable {
    tables: [IndexMap<Id, Symbol>; Category::COUNT],
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self {
            tables: std::array::from_fn(|_| IndexMap::new()),
        }
    }
}

impl SymbolTable {
    /// Declares `name` in the handle's category.
    ///
    /// A redeclaration in the same unit replaces the earlier entry; one in a
    /// different unit leaves the name ambiguous. Either way the earlier
    /// declaration is returned so the caller can report it.
    pub fn declare(
        &mut self,
        name: Id,
        span: Span,
        unit: usize,
        handle: TopLevelHandle,
    ) -> Option<Redeclaration> {
        let table = &mut self.tables[handle.category().slot()];
        let symbol = Symbol {
            handle,
            unit,
            span,
            ambiguous: false,
        };
        match table.get_mut(&name) {
            None => {
                table.insert(name, symbol);
                None
            }
            Some(existing) => {
                let previous = Redeclaration {
                    unit: existing.unit,
                    span: existing.span,
                };
                let ambiguous = existing.ambiguous || existing.unit != unit;
                *existing = Symbol { ambiguous, ..symbol };
                Some(previous)
            }
        }
    }

    pub fn lookup(&self, category: Category, name: Id) -> Resolved<TopLevelHandle> {
        match self.tables[category.slot()].get(&name) {
            None => Resolved::NotFound,
            Some(symbol) if symbol.ambiguous => Resolved::Ambiguous,
            Some(symbol) => Resolved::Found(symbol.handle),
        }
    }

    pub fn contains(&self, category: Category, name: Id) -> bool {
        self.tables[category.slot()].contains_key(&name)
    }

    pub fn lookup_enumeration(&self, name: Id) -> Resolved<EnumerationHandle> {
        self.lookup(Category::Enumeration, name).map(|handle| match handle {
            TopLevelHandle::Enumeration(handle) => handle,
            _ => unreachable!("enumeration table holds only enumerations"),
        })
    }

    pub fn lookup_classifier(&self, name: Id) -> Resolved<ClassifierHandle> {
        self.lookup(Category::Classifier, name).map(|handle| match handle {
            TopLevelHandle::Classifier(handle) => handle,
            _ => unreachable!("classifier table holds only classifiers"),
        })
    }

    pub fn lookup_projection(&self, name: Id) -> Resolved<ProjectionHandle> {
        self.lookup(Category::Projection, name).map(|handle| match handle {
            TopLevelHandle::Projection(handle) => handle,
            _ => unreachable!("projection table holds only projections"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::{arena::Arena, staging::EnumerationStaging};

    fn handles(count: usize) -> Vec<EnumerationHandle> {
        let mut arena: Arena<EnumerationStaging> = Arena::default();
        let decl = crate::syntax::EnumerationDecl {
            name: crate::span::Spanned::new(Id::new("Status"), Span::default()),
            literals: Vec::new(),
            span: Span::default(),
        };
        (0..count)
            .map(|ordinal| arena.alloc(EnumerationStaging::new(0, ordinal, &decl)))
            .collect()
    }

    #[test]
    fn test_lookup_missing_name() {
        let table = SymbolTable::default();
        assert_eq!(
            table.lookup_enumeration(Id::new("Status")),
            Resolved::NotFound
        );
    }

    #[test]
    fn test_same_unit_redeclaration_keeps_latest() {
        let handles = handles(2);
        let mut table = SymbolTable::default();
        let name = Id::new("Status");

        assert!(
            table
                .declare(name, Span::new(0..6), 0, TopLevelHandle::Enumeration(handles[0]))
                .is_none()
        );
        let previous = table.declare(
            name,
            Span::new(20..26),
            0,
            TopLevelHandle::Enumeration(handles[1]),
        );

        assert_eq!(
            previous,
            Some(Redeclaration {
                unit: 0,
                span: Span::new(0..6)
            })
        );
        assert_eq!(table.lookup_enumeration(name), Resolved::Found(handles[1]));
    }

    #[test]
    fn test_cross_unit_redeclaration_is_ambiguous() {
        let handles = handles(2);
        let mut table = SymbolTable::default();
        let name = Id::new("Status");

        table.declare(name, Span::new(0..6), 0, TopLevelHandle::Enumeration(handles[0]));
        table.declare(name, Span::new(0..6), 1, TopLevelHandle::Enumeration(handles[1]));

        assert_eq!(table.lookup_enumeration(name), Resolved::Ambiguous);
        assert!(table.contains(Category::Enumeration, name));
        assert!(!table.contains(Category::Classifier, name));
    }
}
