use klass_core::{
    identifier::Id,
    model::{AssociationEndId, AssociationEndModifier, AssociationId},
};

use crate::{
    compiler::{
        resolved::Resolved,
        staging::{
            AssociationHandle, BuildSlot, ClassifierHandle, CriteriaStaging, EndHandle,
            OrderByStaging, PropertyHandle,
        },
    },
    span::{Span, Spanned},
    syntax::{AssociationDecl, AssociationEndDecl, MultiplicityDecl},
};

#[derive(Debug)]
pub(crate) struct AssociationStaging {
    pub unit: usize,
    pub ordinal: usize,
    pub name: Spanned<Id>,
    pub ends: Vec<EndHandle>,
    pub relationship_span: Span,
    pub relationship: CriteriaStaging,
    pub foreign_keys: Vec<ForeignKeyStaging>,
    pub inferred: bool,
    pub slot: BuildSlot<AssociationId>,
}

impl AssociationStaging {
    pub fn new(unit: usize, ordinal: usize, decl: &AssociationDecl, inferred: bool) -> Self {
        Self {
            unit,
            ordinal,
            name: decl.name.clone(),
            ends: Vec::new(),
            relationship_span: decl.relationship_span,
            relationship: CriteriaStaging::new(&decl.relationship),
            foreign_keys: Vec::new(),
            inferred,
            slot: BuildSlot::default(),
        }
    }

    /// Source and target end, when the association has exactly two.
    pub fn end_pair(&self) -> Option<(EndHandle, EndHandle)> {
        match self.ends.as_slice() {
            [source, target] => Some((*source, *target)),
            _ => None,
        }
    }
}

/// A relationship equality joining a foreign key to a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ForeignKeyStaging {
    pub foreign: PropertyHandle,
    pub key: PropertyHandle,
}

#[derive(Debug)]
pub(crate) struct AssociationEndStaging {
    pub unit: usize,
    pub association: AssociationHandle,
    /// Position in the association: 0 for the source end.
    pub index: usize,
    pub name: Spanned<Id>,
    pub type_name: Spanned<Id>,
    pub multiplicity: Spanned<MultiplicityDecl>,
    pub modifiers: Vec<Spanned<AssociationEndModifier>>,
    pub order_by: Option<OrderByStaging>,
    pub target: Option<Resolved<ClassifierHandle>>,
    /// The class the end is a property of: the other end's type.
    pub owner: Option<ClassifierHandle>,
    pub opposite: Option<EndHandle>,
    pub slot: BuildSlot<AssociationEndId>,
}

impl AssociationEndStaging {
    pub fn new(
        unit: usize,
        association: AssociationHandle,
        index: usize,
        decl: &AssociationEndDecl,
    ) -> Self {
        Self {
            unit,
            association,
            index,
            name: decl.name.clone(),
            type_name: decl.type_name.clone(),
            multiplicity: decl.multiplicity.clone(),
            modifiers: decl.modifiers.clone(),
            order_by: decl.order_by.as_ref().map(OrderByStaging::new),
            target: None,
            owner: None,
            opposite: None,
            slot: BuildSlot::default(),
        }
    }

    pub fn has_modifier(&self, modifier: AssociationEndModifier) -> bool {
        self.modifiers.iter().any(|m| **m == modifier)
    }

    pub fn resolved_target(&self) -> Option<ClassifierHandle> {
        self.target.and_then(|target| target.found())
    }

    pub fn is_to_one(&self) -> bool {
        self.multiplicity.upper == Some(1)
    }

    pub fn is_required(&self) -> bool {
        self.multiplicity.lower >= 1
    }
}
