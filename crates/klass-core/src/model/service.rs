//! Service groups, URLs and endpoints.

use std::{fmt, str::FromStr};

use crate::{
    identifier::Id,
    model::{
        criteria::{Criteria, OrderBy},
        types::{ClassifierId, ParameterId, ProjectionId, UnknownKeyword},
    },
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verb {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl Verb {
    pub const ALL: [Verb; 5] = [Verb::Get, Verb::Post, Verb::Put, Verb::Patch, Verb::Delete];

    pub fn keyword(&self) -> &'static str {
        match self {
            Verb::Get => "GET",
            Verb::Post => "POST",
            Verb::Put => "PUT",
            Verb::Patch => "PATCH",
            Verb::Delete => "DELETE",
        }
    }

    /// Verbs that modify an existing instance.
    pub fn is_update(&self) -> bool {
        matches!(self, Verb::Put | Verb::Patch | Verb::Delete)
    }
}

impl FromStr for Verb {
    type Err = UnknownKeyword;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Verb::ALL
            .into_iter()
            .find(|verb| verb.keyword() == s)
            .ok_or_else(|| UnknownKeyword::new("verb", s))
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// Whether a service returns one instance or a collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServiceMultiplicity {
    One,
    Many,
}

impl FromStr for ServiceMultiplicity {
    type Err = UnknownKeyword;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "one" => Ok(ServiceMultiplicity::One),
            "many" => Ok(ServiceMultiplicity::Many),
            _ => Err(UnknownKeyword::new("service multiplicity", s)),
        }
    }
}

impl fmt::Display for ServiceMultiplicity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceMultiplicity::One => f.write_str("one"),
            ServiceMultiplicity::Many => f.write_str("many"),
        }
    }
}

/// The role a criteria plays on a service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CriteriaKeyword {
    Criteria,
    Authorize,
    Validate,
    Conflict,
    Version,
}

impl CriteriaKeyword {
    pub const ALL: [CriteriaKeyword; 5] = [
        CriteriaKeyword::Criteria,
        CriteriaKeyword::Authorize,
        CriteriaKeyword::Validate,
        CriteriaKeyword::Conflict,
        CriteriaKeyword::Version,
    ];

    pub fn keyword(&self) -> &'static str {
        match self {
            CriteriaKeyword::Criteria => "criteria",
            CriteriaKeyword::Authorize => "authorize",
            CriteriaKeyword::Validate => "validate",
            CriteriaKeyword::Conflict => "conflict",
            CriteriaKeyword::Version => "version",
        }
    }
}

impl FromStr for CriteriaKeyword {
    type Err = UnknownKeyword;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CriteriaKeyword::ALL
            .into_iter()
            .find(|keyword| keyword.keyword() == s)
            .ok_or_else(|| UnknownKeyword::new("criteria keyword", s))
    }
}

impl fmt::Display for CriteriaKeyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// All URLs that serve one classifier.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceGroup {
    name: Id,
    package: Id,
    ordinal: usize,
    classifier: ClassifierId,
    urls: Vec<Url>,
}

impl ServiceGroup {
    pub fn new(
        name: Id,
        package: Id,
        ordinal: usize,
        classifier: ClassifierId,
        urls: Vec<Url>,
    ) -> Self {
        Self {
            name,
            package,
            ordinal,
            classifier,
            urls,
        }
    }

    pub fn name(&self) -> Id {
        self.name
    }

    pub fn package(&self) -> Id {
        self.package
    }

    pub fn ordinal(&self) -> usize {
        self.ordinal
    }

    pub fn classifier(&self) -> ClassifierId {
        self.classifier
    }

    pub fn urls(&self) -> &[Url] {
        &self.urls
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PathSegment {
    Constant(String),
    Parameter(ParameterId),
}

/// A URL pattern and the services it exposes.
#[derive(Debug, Clone, PartialEq)]
pub struct Url {
    path: Vec<PathSegment>,
    query_parameters: Vec<ParameterId>,
    services: Vec<Service>,
}

impl Url {
    pub fn new(
        path: Vec<PathSegment>,
        query_parameters: Vec<ParameterId>,
        services: Vec<Service>,
    ) -> Self {
        Self {
            path,
            query_parameters,
            services,
        }
    }

    pub fn path(&self) -> &[PathSegment] {
        &self.path
    }

    pub fn query_parameters(&self) -> &[ParameterId] {
        &self.query_parameters
    }

    /// Every parameter of the URL, path parameters first.
    pub fn parameters(&self) -> impl Iterator<Item = ParameterId> + '_ {
        self.path
            .iter()
            .filter_map(|segment| match segment {
                PathSegment::Parameter(parameter) => Some(*parameter),
                PathSegment::Constant(_) => None,
            })
            .chain(self.query_parameters.iter().copied())
    }

    pub fn services(&self) -> &[Service] {
        &self.services
    }
}

/// One verb on a URL.
#[derive(Debug, Clone, PartialEq)]
pub struct Service {
    verb: Verb,
    multiplicity: ServiceMultiplicity,
    multiplicity_inferred: bool,
    criteria: Vec<ServiceCriteria>,
    projection: ProjectionId,
    order_by: Option<OrderBy>,
}

impl Service {
    pub fn new(
        verb: Verb,
        multiplicity: ServiceMultiplicity,
        multiplicity_inferred: bool,
        criteria: Vec<ServiceCriteria>,
        projection: ProjectionId,
        order_by: Option<OrderBy>,
    ) -> Self {
        Self {
            verb,
            multiplicity,
            multiplicity_inferred,
            criteria,
            projection,
            order_by,
        }
    }

    pub fn verb(&self) -> Verb {
        self.verb
    }

    pub fn multiplicity(&self) -> ServiceMultiplicity {
        self.multiplicity
    }

    pub fn is_multiplicity_inferred(&self) -> bool {
        self.multiplicity_inferred
    }

    pub fn criteria(&self) -> &[ServiceCriteria] {
        &self.criteria
    }

    /// Finds the criteria declared under `keyword`.
    pub fn criteria_for(&self, keyword: CriteriaKeyword) -> Option<&ServiceCriteria> {
        self.criteria
            .iter()
            .find(|criteria| criteria.keyword() == keyword)
    }

    pub fn projection(&self) -> ProjectionId {
        self.projection
    }

    pub fn order_by(&self) -> Option<&OrderBy> {
        self.order_by.as_ref()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ServiceCriteria {
    keyword: CriteriaKeyword,
    criteria: Criteria,
    inferred: bool,
}

impl ServiceCriteria {
    pub fn new(keyword: CriteriaKeyword, criteria: Criteria, inferred: bool) -> Self {
        Self {
            keyword,
            criteria,
            inferred,
        }
    }

    pub fn keyword(&self) -> CriteriaKeyword {
        self.keyword
    }

    pub fn criteria(&self) -> &Criteria {
        &self.criteria
    }

    pub fn is_inferred(&self) -> bool {
        self.inferred
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verb_keywords() {
        for verb in Verb::ALL {
            assert_eq!(verb.keyword().parse::<Verb>(), Ok(verb));
        }
        assert!(Verb::Patch.is_update());
        assert!(!Verb::Get.is_update());
        assert!("get".parse::<Verb>().is_err());
    }

    #[test]
    fn test_url_parameters_order() {
        let url = Url::new(
            vec![
                PathSegment::Constant("question".to_string()),
                PathSegment::Parameter(ParameterId::new(3)),
            ],
            vec![ParameterId::new(7)],
            Vec::new(),
        );

        let parameters: Vec<_> = url.parameters().collect();
        assert_eq!(parameters, vec![ParameterId::new(3), ParameterId::new(7)]);
    }

    #[test]
    fn test_service_multiplicity_keywords() {
        assert_eq!("one".parse(), Ok(ServiceMultiplicity::One));
        assert_eq!("many".parse(), Ok(ServiceMultiplicity::Many));
        assert!("some".parse::<ServiceMultiplicity>().is_err());
    }
}
