use klass_core::{
    identifier::Id,
    model::{
        AssociationEndModifier, ClassModifier, ClassifierId, ClassifierKind, ParameterId,
        PrimitiveType, PropertyModifier,
    },
};

use crate::{
    compiler::{
        arena::Arena,
        resolved::Resolved,
        staging::{
            BuildSlot, ClassifierHandle, CriteriaStaging, EndHandle, OrderByStaging,
            ParameterHandle, StagedType,
        },
    },
    span::{Span, Spanned},
    syntax::{
        AssociationEndDecl, ClassifierDecl, DataTypePropertyDecl, MemberDecl, MultiplicityDecl,
        ParameterDecl, ParameterizedPropertyDecl, ValidationDecl, ValidationKind,
    },
};

/// A class, user class or interface.
#[derive(Debug)]
pub(crate) struct ClassifierStaging {
    pub unit: usize,
    pub ordinal: usize,
    pub kind: Spanned<ClassifierKind>,
    pub name: Spanned<Id>,
    pub superclass_name: Option<Spanned<Id>>,
    pub interface_names: Vec<Spanned<Id>>,
    pub modifiers: Vec<Spanned<ClassModifier>>,
    /// Set by the inheritance phase; `None` when no superclass is declared.
    pub superclass_resolution: Option<Resolved<ClassifierHandle>>,
    /// Parallel to `interface_names` once the inheritance phase ran.
    pub interfaces: Vec<Resolved<ClassifierHandle>>,
    pub cyclic: bool,
    pub properties: Vec<PropertyStaging>,
    pub signatures: Vec<SignatureStaging>,
    pub parameterized: Vec<ParameterizedStaging>,
    /// Association ends this classifier owns, in association order.
    pub ends: Vec<EndHandle>,
    pub version_class: Option<ClassifierHandle>,
    pub version_of: Option<ClassifierHandle>,
    pub inferred: bool,
    next_member_ordinal: usize,
    pub slot: BuildSlot<ClassifierId>,
}

impl ClassifierStaging {
    pub fn new(unit: usize, ordinal: usize, decl: &ClassifierDecl, inferred: bool) -> Self {
        Self {
            unit,
            ordinal,
            kind: decl.kind.clone(),
            name: decl.name.clone(),
            superclass_name: decl.superclass.clone(),
            interface_names: decl.interfaces.clone(),
            modifiers: decl.modifiers.clone(),
            superclass_resolution: None,
            interfaces: Vec::new(),
            cyclic: false,
            properties: Vec::new(),
            signatures: Vec::new(),
            parameterized: Vec::new(),
            ends: Vec::new(),
            version_class: None,
            version_of: None,
            inferred,
            next_member_ordinal: 0,
            slot: BuildSlot::default(),
        }
    }

    pub fn has_modifier(&self, modifier: ClassModifier) -> bool {
        self.modifiers.iter().any(|m| **m == modifier)
    }

    pub fn modifier_span(&self, modifier: ClassModifier) -> Option<Span> {
        self.modifiers
            .iter()
            .find(|m| ***m == modifier)
            .map(Spanned::span)
    }

    pub fn is_class(&self) -> bool {
        self.kind.is_class()
    }

    pub fn is_transient(&self) -> bool {
        self.has_modifier(ClassModifier::Transient)
    }

    /// The superclass, if one is declared and resolved.
    pub fn superclass(&self) -> Option<ClassifierHandle> {
        self.superclass_resolution.and_then(|resolved| resolved.found())
    }

    /// Adds members declared in `unit`. Parameters of parameterized
    /// properties are allocated in `parameters`.
    pub fn add_members(
        &mut self,
        unit: usize,
        members: &[MemberDecl],
        inferred: bool,
        parameters: &mut Arena<ParameterStaging>,
    ) {
        for member in members {
            let ordinal = self.next_member_ordinal;
            self.next_member_ordinal += 1;
            match member {
                MemberDecl::DataType(decl) => {
                    self.properties
                        .push(PropertyStaging::new(unit, ordinal, decl, inferred));
                }
                MemberDecl::AssociationEndSignature(decl) => {
                    self.signatures
                        .push(SignatureStaging::new(unit, ordinal, decl));
                }
                MemberDecl::Parameterized(decl) => {
                    let staging = ParameterizedStaging::new(unit, ordinal, decl, parameters);
                    self.parameterized.push(staging);
                }
            }
        }
    }

    /// Names and spans of every member, in declaration order.
    pub fn member_names(&self) -> Vec<(usize, Spanned<Id>, usize)> {
        let mut names: Vec<(usize, Spanned<Id>, usize)> = self
            .properties
            .iter()
            .map(|p| (p.ordinal, p.name.clone(), p.unit))
            .chain(
                self.signatures
                    .iter()
                    .map(|s| (s.ordinal, s.name.clone(), s.unit)),
            )
            .chain(
                self.parameterized
                    .iter()
                    .map(|p| (p.ordinal, p.name.clone(), p.unit)),
            )
            .collect();
        names.sort_by_key(|(ordinal, _, _)| *ordinal);
        names
    }
}

/// A data type property.
#[derive(Debug)]
pub(crate) struct PropertyStaging {
    pub unit: usize,
    pub ordinal: usize,
    pub name: Spanned<Id>,
    pub type_name: Spanned<Id>,
    pub optional: bool,
    pub modifiers: Vec<Spanned<PropertyModifier>>,
    pub validations: Vec<Spanned<ValidationDecl>>,
    pub data_type: Option<Resolved<StagedType>>,
    pub inferred: bool,
}

impl PropertyStaging {
    fn new(unit: usize, ordinal: usize, decl: &DataTypePropertyDecl, inferred: bool) -> Self {
        Self {
            unit,
            ordinal,
            name: decl.name.clone(),
            type_name: decl.type_name.clone(),
            optional: decl.optional,
            modifiers: decl.modifiers.clone(),
            validations: decl.validations.clone(),
            data_type: None,
            inferred,
        }
    }

    pub fn has_modifier(&self, modifier: PropertyModifier) -> bool {
        self.modifiers.iter().any(|m| **m == modifier)
    }

    pub fn modifier_span(&self, modifier: PropertyModifier) -> Option<Span> {
        self.modifiers
            .iter()
            .find(|m| ***m == modifier)
            .map(Spanned::span)
    }

    pub fn is_key(&self) -> bool {
        self.has_modifier(PropertyModifier::Key)
    }

    pub fn is_id(&self) -> bool {
        self.has_modifier(PropertyModifier::Id)
    }

    pub fn is_private(&self) -> bool {
        self.has_modifier(PropertyModifier::Private)
    }

    pub fn is_final(&self) -> bool {
        self.has_modifier(PropertyModifier::Final)
    }

    /// First value given for a validation.
    pub fn validation(&self, kind: ValidationKind) -> Option<i64> {
        self.validations
            .iter()
            .find(|validation| validation.kind == kind)
            .map(|validation| *validation.value)
    }

    pub fn resolved_type(&self) -> Option<StagedType> {
        self.data_type.and_then(|resolved| resolved.found())
    }

    pub fn primitive(&self) -> Option<PrimitiveType> {
        self.resolved_type().and_then(|data_type| data_type.primitive())
    }
}

/// An association end signature declared inside a classifier.
#[derive(Debug)]
pub(crate) struct SignatureStaging {
    pub unit: usize,
    pub ordinal: usize,
    pub name: Spanned<Id>,
    pub type_name: Spanned<Id>,
    pub multiplicity: Spanned<MultiplicityDecl>,
    pub modifiers: Vec<Spanned<AssociationEndModifier>>,
    pub order_by: Option<OrderByStaging>,
    pub target: Option<Resolved<ClassifierHandle>>,
}

impl SignatureStaging {
    fn new(unit: usize, ordinal: usize, decl: &AssociationEndDecl) -> Self {
        Self {
            unit,
            ordinal,
            name: decl.name.clone(),
            type_name: decl.type_name.clone(),
            multiplicity: decl.multiplicity.clone(),
            modifiers: decl.modifiers.clone(),
            order_by: decl.order_by.as_ref().map(OrderByStaging::new),
            target: None,
        }
    }
}

/// A reference-valued member computed from parameters and criteria.
#[derive(Debug)]
pub(crate) struct ParameterizedStaging {
    pub unit: usize,
    pub ordinal: usize,
    pub name: Spanned<Id>,
    pub parameters: Vec<ParameterHandle>,
    pub type_name: Spanned<Id>,
    pub multiplicity: Spanned<MultiplicityDecl>,
    pub order_by: Option<OrderByStaging>,
    pub criteria: CriteriaStaging,
    pub target: Option<Resolved<ClassifierHandle>>,
}

impl ParameterizedStaging {
    fn new(
        unit: usize,
        ordinal: usize,
        decl: &ParameterizedPropertyDecl,
        parameters: &mut Arena<ParameterStaging>,
    ) -> Self {
        let parameters = decl
            .parameters
            .iter()
            .enumerate()
            .map(|(index, parameter)| {
                parameters.alloc(ParameterStaging::new(unit, index, parameter))
            })
            .collect();
        Self {
            unit,
            ordinal,
            name: decl.name.clone(),
            parameters,
            type_name: decl.type_name.clone(),
            multiplicity: decl.multiplicity.clone(),
            order_by: decl.order_by.as_ref().map(OrderByStaging::new),
            criteria: CriteriaStaging::new(&decl.criteria),
            target: None,
        }
    }
}

/// A parameter of a parameterized property or a URL.
#[derive(Debug)]
pub(crate) struct ParameterStaging {
    pub unit: usize,
    pub ordinal: usize,
    pub name: Spanned<Id>,
    pub type_name: Spanned<Id>,
    pub multiplicity: Spanned<MultiplicityDecl>,
    pub data_type: Option<Resolved<StagedType>>,
    pub slot: BuildSlot<ParameterId>,
}

impl ParameterStaging {
    pub fn new(unit: usize, ordinal: usize, decl: &ParameterDecl) -> Self {
        Self {
            unit,
            ordinal,
            name: decl.name.clone(),
            type_name: decl.type_name.clone(),
            multiplicity: decl.multiplicity.clone(),
            data_type: None,
            slot: BuildSlot::default(),
        }
    }

    pub fn resolved_type(&self) -> Option<StagedType> {
        self.data_type.and_then(|resolved| resolved.found())
    }

    pub fn is_to_one(&self) -> bool {
        matches!(self.multiplicity.upper, Some(1))
    }
}
