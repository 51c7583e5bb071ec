use klass_core::{
    identifier::Id,
    model::{CriteriaKeyword, ServiceGroupId, ServiceMultiplicity, Verb},
};

use crate::{
    compiler::{
        resolved::Resolved,
        staging::{
            BuildSlot, ClassifierHandle, CriteriaStaging, OrderByStaging, ParameterHandle,
            ProjectionHandle, ServiceGroupHandle, ServiceHandle,
        },
    },
    span::{Span, Spanned},
    syntax::{ServiceCriteriaDecl, ServiceDecl, ServiceGroupDecl},
};

#[derive(Debug)]
pub(crate) struct ServiceGroupStaging {
    pub unit: usize,
    pub ordinal: usize,
    pub class_name: Spanned<Id>,
    pub span: Span,
    pub classifier: Option<Resolved<ClassifierHandle>>,
    pub urls: Vec<UrlStaging>,
    pub slot: BuildSlot<ServiceGroupId>,
}

impl ServiceGroupStaging {
    pub fn new(unit: usize, ordinal: usize, decl: &ServiceGroupDecl) -> Self {
        Self {
            unit,
            ordinal,
            class_name: decl.class_name.clone(),
            span: decl.span,
            classifier: None,
            urls: Vec::new(),
            slot: BuildSlot::default(),
        }
    }

    pub fn resolved_classifier(&self) -> Option<ClassifierHandle> {
        self.classifier.and_then(|classifier| classifier.found())
    }
}

#[derive(Debug)]
pub(crate) struct UrlStaging {
    pub segments: Vec<UrlSegmentStaging>,
    pub query: Vec<ParameterHandle>,
    pub services: Vec<ServiceHandle>,
    pub span: Span,
    pub normalized_path: String,
}

impl UrlStaging {
    /// Path parameters first, then query parameters.
    pub fn parameters(&self) -> impl Iterator<Item = ParameterHandle> + '_ {
        self.segments
            .iter()
            .filter_map(|segment| match segment {
                UrlSegmentStaging::Parameter(parameter) => Some(*parameter),
                UrlSegmentStaging::Constant(_) => None,
            })
            .chain(self.query.iter().copied())
    }
}

#[derive(Debug)]
pub(crate) enum UrlSegmentStaging {
    Constant(String),
    Parameter(ParameterHandle),
}

/// One verb on a URL.
#[derive(Debug)]
pub(crate) struct ServiceStaging {
    pub unit: usize,
    pub group: ServiceGroupHandle,
    pub url: usize,
    pub verb: Spanned<Verb>,
    pub multiplicity: Option<Spanned<ServiceMultiplicity>>,
    pub inferred_multiplicity: Option<ServiceMultiplicity>,
    pub criteria: Vec<ServiceCriteriaStaging>,
    pub projection_name: Option<Spanned<Id>>,
    pub projection: Option<Resolved<ProjectionHandle>>,
    pub order_by: Option<OrderByStaging>,
}

impl ServiceStaging {
    pub fn new(unit: usize, group: ServiceGroupHandle, url: usize, decl: &ServiceDecl) -> Self {
        Self {
            unit,
            group,
            url,
            verb: decl.verb.clone(),
            multiplicity: decl.multiplicity.clone(),
            inferred_multiplicity: None,
            criteria: decl
                .criteria
                .iter()
                .map(|criteria| ServiceCriteriaStaging::new(unit, criteria, false))
                .collect(),
            projection_name: decl.projection.clone(),
            projection: None,
            order_by: decl.order_by.as_ref().map(OrderByStaging::new),
        }
    }

    /// Declared multiplicity, or the inferred one.
    pub fn effective_multiplicity(&self) -> Option<ServiceMultiplicity> {
        self.multiplicity
            .as_ref()
            .map(|multiplicity| **multiplicity)
            .or(self.inferred_multiplicity)
    }

    pub fn has_criteria(&self, keyword: CriteriaKeyword) -> bool {
        self.criteria
            .iter()
            .any(|criteria| *criteria.keyword == keyword)
    }
}

#[derive(Debug)]
pub(crate) struct ServiceCriteriaStaging {
    pub unit: usize,
    pub keyword: Spanned<CriteriaKeyword>,
    pub criteria: CriteriaStaging,
    pub inferred: bool,
}

impl ServiceCriteriaStaging {
    pub fn new(unit: usize, decl: &ServiceCriteriaDecl, inferred: bool) -> Self {
        Self {
            unit,
            keyword: decl.keyword.clone(),
            criteria: CriteriaStaging::new(&decl.criteria),
            inferred,
        }
    }
}
