//! Domain model construction.
//!
//! Runs only after the report step found no errors, so every reference
//! the model needs has resolved. Construction happens in two passes:
//!
//! 1. [`allocate`] gives every staging element its domain model index,
//!    exactly once.
//! 2. [`Builder`] constructs the immutable elements, wiring cross
//!    references through the indices allocated in the first pass.
//!
//! An unresolved reference at this point is a compiler bug and panics.

use klass_core::model::{
    Association, AssociationEnd, AssociationEndId, AssociationEndSignature, AssociationId,
    Classifier, ClassifierId, Criteria, DataType, DataTypeProperty, DomainModel, Enumeration,
    EnumerationId, EnumerationLiteral, Expression, ForeignKey, Literal, LiteralValue, MemberPath,
    Multiplicity, OrderBy, OrderByMember, Parameter, ParameterId, ParameterizedProperty,
    PathSegment, Projection, ProjectionId, ProjectionMember, PropertyRef, Service, ServiceCriteria,
    ServiceGroup, ServiceGroupId, Url, Validations,
};
use log::{debug, trace};

use crate::{
    compiler::{
        resolved::expect_found,
        staging::{
            AssociationHandle, ClassifierHandle, CriteriaStaging, EndHandle, EnumerationHandle,
            ExpressionStaging, LiteralStaging, MemberPathStaging, OrderByStaging, ParameterHandle,
            ProjectionBodyStaging, ProjectionHandle, ProjectionMemberStaging, ProjectionTarget,
            PropertyHandle, PropertyStaging, ServiceGroupHandle, ServiceHandle, StagedType, Staging,
            UrlSegmentStaging, UrlStaging,
        },
        state::CompilerState,
    },
    span::Spanned,
    syntax::{LiteralDecl, MultiplicityDecl, ValidationKind},
};

/// Builds the domain model of an error-free compilation.
pub(crate) fn build(state: &mut CompilerState) -> DomainModel {
    allocate(&mut state.staging);
    let builder = Builder { state: &*state };
    let model = builder.model();
    debug!(
        classifiers = model.classifiers().len(),
        associations = model.associations().len(),
        projections = model.projections().len(),
        service_groups = model.service_groups().len();
        "Domain model built"
    );
    model
}

/// Allocates domain model indices in arena order, which is declaration
/// order with macro units last.
fn allocate(staging: &mut Staging) {
    for (index, (_, enumeration)) in staging.enumerations.iter_mut().enumerate() {
        enumeration.slot.allocate(EnumerationId::new(index));
    }
    for (index, (_, classifier)) in staging.classifiers.iter_mut().enumerate() {
        classifier.slot.allocate(ClassifierId::new(index));
    }
    for (index, (_, association)) in staging.associations.iter_mut().enumerate() {
        association.slot.allocate(AssociationId::new(index));
    }
    for (index, (_, end)) in staging.ends.iter_mut().enumerate() {
        end.slot.allocate(AssociationEndId::new(index));
    }
    for (index, (_, parameter)) in staging.parameters.iter_mut().enumerate() {
        parameter.slot.allocate(ParameterId::new(index));
    }
    for (index, (_, projection)) in staging.projections.iter_mut().enumerate() {
        projection.slot.allocate(ProjectionId::new(index));
    }
    for (index, (_, group)) in staging.service_groups.iter_mut().enumerate() {
        group.slot.allocate(ServiceGroupId::new(index));
    }
}

fn multiplicity(decl: &Spanned<MultiplicityDecl>) -> Multiplicity {
    match decl.to_multiplicity() {
        Some(multiplicity) => multiplicity,
        None => panic!("illegal state: multiplicity {} survived the report step", decl.inner()),
    }
}

struct Builder<'a> {
    state: &'a CompilerState,
}

impl Builder<'_> {
    fn staging(&self) -> &Staging {
        &self.state.staging
    }

    fn model(&self) -> DomainModel {
        let staging = self.staging();
        DomainModel::new(
            staging
                .enumerations
                .handles()
                .map(|handle| self.enumeration(handle))
                .collect(),
            staging
                .classifiers
                .handles()
                .map(|handle| self.classifier(handle))
                .collect(),
            staging
                .associations
                .handles()
                .map(|handle| self.association(handle))
                .collect(),
            staging.ends.handles().map(|handle| self.end(handle)).collect(),
            staging
                .projections
                .handles()
                .map(|handle| self.projection(handle))
                .collect(),
            staging
                .service_groups
                .handles()
                .map(|handle| self.service_group(handle))
                .collect(),
            staging
                .parameters
                .handles()
                .map(|handle| self.parameter(handle))
                .collect(),
        )
    }

    fn classifier_id(&self, handle: ClassifierHandle) -> ClassifierId {
        self.staging().classifiers[handle].slot.id()
    }

    fn end_id(&self, handle: EndHandle) -> AssociationEndId {
        self.staging().ends[handle].slot.id()
    }

    fn parameter_id(&self, handle: ParameterHandle) -> ParameterId {
        self.staging().parameters[handle].slot.id()
    }

    fn property_ref(&self, handle: PropertyHandle) -> PropertyRef {
        PropertyRef::new(self.classifier_id(handle.classifier), handle.index)
    }

    fn data_type(&self, data_type: Option<StagedType>, what: &str) -> DataType {
        match data_type {
            Some(StagedType::Primitive(primitive)) => DataType::Primitive(primitive),
            Some(StagedType::Enumeration(enumeration)) => {
                DataType::Enumeration(self.enumeration_id(enumeration))
            }
            None => {
                panic!("illegal state: type of {what} is unresolved in an error-free compilation")
            }
        }
    }

    fn enumeration_id(&self, handle: EnumerationHandle) -> EnumerationId {
        self.staging().enumerations[handle].slot.id()
    }

    fn enumeration(&self, handle: EnumerationHandle) -> Enumeration {
        let enumeration = &self.staging().enumerations[handle];
        trace!(enumeration:% = enumeration.name.inner(); "Building enumeration");
        let literals = enumeration
            .literals
            .iter()
            .enumerate()
            .map(|(ordinal, literal)| {
                EnumerationLiteral::new(
                    *literal.name,
                    literal.pretty_name.as_ref().map(|name| name.inner().clone()),
                    ordinal,
                )
            })
            .collect();
        Enumeration::new(
            *enumeration.name,
            self.state.package_of(enumeration.unit),
            enumeration.ordinal,
            literals,
        )
    }

    fn classifier(&self, handle: ClassifierHandle) -> Classifier {
        let classifier = &self.staging().classifiers[handle];
        trace!(classifier:% = classifier.name.inner(); "Building classifier");

        let interfaces = classifier
            .interfaces
            .iter()
            .map(|interface| self.classifier_id(expect_found(Some(*interface), "interface")))
            .collect();
        let properties = classifier
            .properties
            .iter()
            .map(|property| self.property(property))
            .collect();
        let signatures = classifier
            .signatures
            .iter()
            .map(|signature| {
                AssociationEndSignature::new(
                    *signature.name,
                    signature.ordinal,
                    self.classifier_id(expect_found(signature.target, "signature target")),
                    multiplicity(&signature.multiplicity),
                    signature.modifiers.iter().map(|modifier| **modifier).collect(),
                    signature.order_by.as_ref().map(|order_by| self.order_by(order_by)),
                )
            })
            .collect();
        let parameterized = classifier
            .parameterized
            .iter()
            .map(|property| {
                ParameterizedProperty::new(
                    *property.name,
                    property.ordinal,
                    property
                        .parameters
                        .iter()
                        .map(|parameter| self.parameter_id(*parameter))
                        .collect(),
                    self.classifier_id(expect_found(property.target, "parameterized property target")),
                    multiplicity(&property.multiplicity),
                    self.criteria(&property.criteria),
                    property.order_by.as_ref().map(|order_by| self.order_by(order_by)),
                )
            })
            .collect();

        Classifier::new(
            *classifier.name,
            self.state.package_of(classifier.unit),
            classifier.ordinal,
            *classifier.kind,
            classifier.modifiers.iter().map(|modifier| **modifier).collect(),
            classifier.superclass().map(|superclass| self.classifier_id(superclass)),
            interfaces,
            properties,
            classifier.ends.iter().map(|end| self.end_id(*end)).collect(),
            signatures,
            parameterized,
            classifier.version_class.map(|class| self.classifier_id(class)),
            classifier.version_of.map(|class| self.classifier_id(class)),
            classifier.inferred,
        )
    }

    fn property(&self, property: &PropertyStaging) -> DataTypeProperty {
        let validations = Validations {
            min_length: property.validation(ValidationKind::MinLength),
            max_length: property.validation(ValidationKind::MaxLength),
            minimum: property.validation(ValidationKind::Minimum),
            maximum: property.validation(ValidationKind::Maximum),
        };
        DataTypeProperty::new(
            *property.name,
            property.ordinal,
            self.data_type(property.resolved_type(), "property"),
            property.optional,
            property.modifiers.iter().map(|modifier| **modifier).collect(),
            validations,
            property.inferred,
        )
    }

    fn parameter(&self, handle: ParameterHandle) -> Parameter {
        let parameter = &self.staging().parameters[handle];
        Parameter::new(
            *parameter.name,
            parameter.ordinal,
            self.data_type(parameter.resolved_type(), "parameter"),
            multiplicity(&parameter.multiplicity),
        )
    }

    fn association(&self, handle: AssociationHandle) -> Association {
        let association = &self.staging().associations[handle];
        trace!(association:% = association.name.inner(); "Building association");
        let Some((source, target)) = association.end_pair() else {
            panic!(
                "illegal state: association `{}` does not have two ends",
                association.name.inner()
            );
        };
        let foreign_keys = association
            .foreign_keys
            .iter()
            .map(|key| ForeignKey::new(self.property_ref(key.foreign), self.property_ref(key.key)))
            .collect();
        Association::new(
            *association.name,
            self.state.package_of(association.unit),
            association.ordinal,
            self.end_id(source),
            self.end_id(target),
            self.criteria(&association.relationship),
            foreign_keys,
            association.inferred,
        )
    }

    fn end(&self, handle: EndHandle) -> AssociationEnd {
        let staging = self.staging();
        let end = &staging.ends[handle];
        let Some(owner) = end.owner else {
            panic!("illegal state: association end `{}` has no owner", end.name.inner());
        };
        let Some(opposite) = end.opposite else {
            panic!("illegal state: association end `{}` has no opposite", end.name.inner());
        };
        AssociationEnd::new(
            *end.name,
            staging.associations[end.association].slot.id(),
            self.classifier_id(owner),
            self.classifier_id(expect_found(end.target, "association end target")),
            multiplicity(&end.multiplicity),
            end.modifiers.iter().map(|modifier| **modifier).collect(),
            self.end_id(opposite),
            end.order_by.as_ref().map(|order_by| self.order_by(order_by)),
        )
    }

    fn projection(&self, handle: ProjectionHandle) -> Projection {
        let projection = &self.staging().projections[handle];
        trace!(projection:% = projection.name.inner(); "Building projection");
        Projection::new(
            *projection.name,
            self.state.package_of(projection.unit),
            projection.ordinal,
            self.classifier_id(expect_found(projection.classifier, "projection classifier")),
            self.projection_members(&projection.members),
        )
    }

    /// Repeated member names keep their first occurrence.
    fn projection_members(&self, members: &[ProjectionMemberStaging]) -> Vec<ProjectionMember> {
        members
            .iter()
            .filter(|member| !member.duplicate)
            .map(|member| self.projection_member(member))
            .collect()
    }

    fn projection_member(&self, member: &ProjectionMemberStaging) -> ProjectionMember {
        let name = *member.name;
        match (&member.body, expect_found(member.target, "projection member")) {
            (ProjectionBodyStaging::Header(header), ProjectionTarget::Property(property)) => {
                ProjectionMember::DataTypeProperty {
                    name,
                    property: self.property_ref(property),
                    header: header.inner().clone(),
                }
            }
            (ProjectionBodyStaging::Children(children), ProjectionTarget::End(end)) => {
                ProjectionMember::ReferenceProperty {
                    name,
                    end: self.end_id(end),
                    children: self.projection_members(children),
                }
            }
            (ProjectionBodyStaging::Projection { projection, .. }, ProjectionTarget::End(end)) => {
                ProjectionMember::ProjectionReference {
                    name,
                    end: self.end_id(end),
                    projection: self.staging().projections
                        [expect_found(*projection, "referenced projection")]
                    .slot
                    .id(),
                }
            }
            _ => panic!("illegal state: projection member `{name}` does not fit its target"),
        }
    }

    fn service_group(&self, handle: ServiceGroupHandle) -> ServiceGroup {
        let group = &self.staging().service_groups[handle];
        trace!(service_group:% = group.class_name.inner(); "Building service group");
        ServiceGroup::new(
            *group.class_name,
            self.state.package_of(group.unit),
            group.ordinal,
            self.classifier_id(expect_found(group.classifier, "service class")),
            group.urls.iter().map(|url| self.url(url)).collect(),
        )
    }

    fn url(&self, url: &UrlStaging) -> Url {
        let path = url
            .segments
            .iter()
            .map(|segment| match segment {
                UrlSegmentStaging::Constant(constant) => PathSegment::Constant(constant.clone()),
                UrlSegmentStaging::Parameter(parameter) => {
                    PathSegment::Parameter(self.parameter_id(*parameter))
                }
            })
            .collect();
        Url::new(
            path,
            url.query.iter().map(|parameter| self.parameter_id(*parameter)).collect(),
            url.services.iter().map(|service| self.service(*service)).collect(),
        )
    }

    fn service(&self, handle: ServiceHandle) -> Service {
        let staging = self.staging();
        let service = &staging.services[handle];
        let Some(multiplicity) = service.effective_multiplicity() else {
            panic!("illegal state: {} service has no multiplicity", service.verb.inner());
        };
        let criteria = service
            .criteria
            .iter()
            .map(|criteria| {
                ServiceCriteria::new(
                    *criteria.keyword,
                    self.criteria(&criteria.criteria),
                    criteria.inferred,
                )
            })
            .collect();
        let projection = expect_found(service.projection, "service projection");
        Service::new(
            *service.verb,
            multiplicity,
            service.multiplicity.is_none(),
            criteria,
            staging.projections[projection].slot.id(),
            service.order_by.as_ref().map(|order_by| self.order_by(order_by)),
        )
    }

    fn criteria(&self, criteria: &CriteriaStaging) -> Criteria {
        match criteria {
            CriteriaStaging::All => Criteria::All,
            CriteriaStaging::And(left, right) => {
                Criteria::and(self.criteria(left), self.criteria(right))
            }
            CriteriaStaging::Or(left, right) => {
                Criteria::or(self.criteria(left), self.criteria(right))
            }
            CriteriaStaging::Operator(operator) => Criteria::Operator {
                operator: *operator.operator,
                source: self.expression(&operator.source),
                target: self.expression(&operator.target),
            },
            CriteriaStaging::EdgePoint { path, .. } => Criteria::EdgePoint(self.member_path(path)),
        }
    }

    fn expression(&self, expression: &ExpressionStaging) -> Expression {
        match expression {
            ExpressionStaging::Member(path) => Expression::Member(self.member_path(path)),
            ExpressionStaging::Variable { name, parameter } => Expression::Variable {
                name: **name,
                parameter: self.parameter_id(expect_found(*parameter, "variable")),
            },
            ExpressionStaging::Literal(literal) => Expression::Literal(literal_value(literal)),
            ExpressionStaging::LiteralList { literals, .. } => {
                Expression::LiteralList(literals.iter().map(literal_value).collect())
            }
            ExpressionStaging::Null(_) => Expression::Null,
            ExpressionStaging::User { property, .. } => {
                Expression::User(self.property_ref(expect_found(*property, "user id property")))
            }
        }
    }

    fn member_path(&self, path: &MemberPathStaging) -> MemberPath {
        MemberPath::new(
            self.classifier_id(expect_found(path.classifier, "path classifier")),
            path.is_this(),
            path.ends
                .iter()
                .map(|end| self.end_id(expect_found(Some(*end), "path segment")))
                .collect(),
            self.property_ref(expect_found(path.property, "path property")),
        )
    }

    fn order_by(&self, order_by: &OrderByStaging) -> OrderBy {
        let members = order_by
            .members
            .iter()
            .map(|member| {
                let Some((direction, inferred)) = member.resolved_direction else {
                    panic!("illegal state: order-by direction was never resolved");
                };
                OrderByMember::new(self.member_path(&member.path), direction, inferred)
            })
            .collect();
        OrderBy::new(members)
    }
}

/// A literal typed by its narrowed type, or the widest reading when
/// nothing narrowed it.
fn literal_value(literal: &LiteralStaging) -> Literal {
    let data_type = match literal.narrowed {
        Some(data_type) => data_type,
        None => literal.possible_types()[0],
    };
    let value = match &literal.value {
        LiteralDecl::Integer(value) => LiteralValue::Integer(*value),
        LiteralDecl::Float(value) => LiteralValue::Float(*value),
        LiteralDecl::String(value) => LiteralValue::String(value.clone()),
        LiteralDecl::Boolean(value) => LiteralValue::Boolean(*value),
    };
    Literal::new(value, data_type)
}

#[cfg(test)]
mod tests {
    use klass_core::model::PrimitiveType;

    use super::*;
    use crate::span::Span;

    fn literal(value: LiteralDecl, narrowed: Option<PrimitiveType>) -> LiteralStaging {
        LiteralStaging {
            value,
            span: Span::default(),
            narrowed,
        }
    }

    #[test]
    fn test_literal_uses_narrowed_type() {
        let built = literal_value(&literal(LiteralDecl::Integer(7), Some(PrimitiveType::Long)));
        assert_eq!(built, Literal::new(LiteralValue::Integer(7), PrimitiveType::Long));
    }

    #[test]
    fn test_literal_defaults_to_first_possible_type() {
        let built = literal_value(&literal(LiteralDecl::Float(1.5), None));
        assert_eq!(built, Literal::new(LiteralValue::Float(1.5), PrimitiveType::Float));
        let built = literal_value(&literal(LiteralDecl::String("a".to_string()), None));
        assert_eq!(
            built,
            Literal::new(LiteralValue::String("a".to_string()), PrimitiveType::String)
        );
    }

    #[test]
    #[should_panic(expected = "illegal state")]
    fn test_multiplicity_rejects_invalid_bounds() {
        multiplicity(&Spanned::new(
            MultiplicityDecl {
                lower: 2,
                upper: Some(1),
            },
            Span::default(),
        ));
    }
}
