use klass_core::{identifier::Id, model::EnumerationId};

use crate::{
    compiler::staging::BuildSlot,
    span::Spanned,
    syntax::{EnumerationDecl, EnumerationLiteralDecl},
};

#[derive(Debug)]
pub(crate) struct EnumerationStaging {
    pub unit: usize,
    pub ordinal: usize,
    pub name: Spanned<Id>,
    pub literals: Vec<EnumerationLiteralDecl>,
    /// `(index, first index)` of literals whose name repeats an earlier one.
    pub duplicate_names: Vec<(usize, usize)>,
    /// Same as `duplicate_names`, for pretty names.
    pub duplicate_pretty_names: Vec<(usize, usize)>,
    pub slot: BuildSlot<EnumerationId>,
}

impl EnumerationStaging {
    pub fn new(unit: usize, ordinal: usize, decl: &EnumerationDecl) -> Self {
        Self {
            unit,
            ordinal,
            name: decl.name.clone(),
            literals: decl.literals.clone(),
            duplicate_names: Vec::new(),
            duplicate_pretty_names: Vec::new(),
            slot: BuildSlot::default(),
        }
    }
}
