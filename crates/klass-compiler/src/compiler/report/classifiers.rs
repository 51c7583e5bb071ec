//! Enumerations, classifiers and their members.

use std::fmt::Display;

use klass_core::{
    identifier::Id,
    model::{ClassModifier, PrimitiveType, PropertyModifier},
};

use crate::{
    compiler::{
        report::{Report, criteria, repeated, repeated_by, unresolved},
        resolved::Resolved,
        staging::{
            ClassifierHandle, ClassifierStaging, EnumerationHandle, ParameterHandle,
            ParameterizedStaging, PropertyStaging, SignatureStaging, StagedType,
        },
    },
    error::{AnnotationCode, Diagnostic},
    span::{Span, Spanned},
    syntax::{MultiplicityDecl, ValidationKind},
};

pub(super) fn enumeration(report: &mut Report<'_>, handle: EnumerationHandle) {
    let enumeration = &report.staging().enumerations[handle];
    let unit = enumeration.unit;

    for literal in &enumeration.literals {
        if !literal.name.is_constant_name() {
            report.push(
                unit,
                Diagnostic::annotation(
                    AnnotationCode::ErrLitNme,
                    format!("invalid enumeration literal name `{}`", literal.name.inner()),
                )
                .with_label(literal.name.span(), "not an upper case constant name")
                .with_help("literal names match `[A-Z][A-Z0-9_]*`"),
            );
        }
    }
    for &(index, first) in &enumeration.duplicate_names {
        let literal = &enumeration.literals[index];
        report.push(
            unit,
            Diagnostic::annotation(
                AnnotationCode::ErrDupLit,
                format!(
                    "duplicate literal `{}` in enumeration `{}`",
                    literal.name.inner(),
                    enumeration.name.inner()
                ),
            )
            .with_label(literal.name.span(), "declared again here")
            .with_secondary_label(enumeration.literals[first].name.span(), "first declared here"),
        );
    }
    for &(index, first) in &enumeration.duplicate_pretty_names {
        let (Some(pretty_name), Some(first_pretty_name)) = (
            &enumeration.literals[index].pretty_name,
            &enumeration.literals[first].pretty_name,
        ) else {
            continue;
        };
        report.push(
            unit,
            Diagnostic::annotation(
                AnnotationCode::ErrDupPrt,
                format!(
                    "duplicate pretty name \"{}\" in enumeration `{}`",
                    pretty_name.inner(),
                    enumeration.name.inner()
                ),
            )
            .with_label(pretty_name.span(), "used again here")
            .with_secondary_label(first_pretty_name.span(), "first used here"),
        );
    }

    top_level_name(report, unit, &enumeration.name, "enumeration");
}

/// Type names match `[A-Z][A-Za-z0-9]*`.
pub(super) fn top_level_name(report: &mut Report<'_>, unit: usize, name: &Spanned<Id>, kind: &str) {
    if name.is_type_name() {
        return;
    }
    report.push(
        unit,
        Diagnostic::annotation(
            AnnotationCode::ErrTopNme,
            format!("invalid {kind} name `{}`", name.inner()),
        )
        .with_label(name.span(), "not a type name")
        .with_help("type names start with an upper case letter and contain only letters and digits"),
    );
}

pub(super) fn member_name(report: &mut Report<'_>, unit: usize, name: &Spanned<Id>) {
    if name.is_member_name() {
        return;
    }
    report.push(
        unit,
        Diagnostic::annotation(
            AnnotationCode::ErrMemNme,
            format!("invalid member name `{}`", name.inner()),
        )
        .with_label(name.span(), "not a member name")
        .with_help("member names start with a lower case letter and contain only letters and digits"),
    );
}

pub(super) fn duplicate_modifiers<T: PartialEq + Display>(
    report: &mut Report<'_>,
    unit: usize,
    modifiers: &[Spanned<T>],
) {
    for (index, first) in repeated(modifiers) {
        report.push(
            unit,
            Diagnostic::annotation(
                AnnotationCode::ErrDupMod,
                format!("duplicate modifier `{}`", modifiers[index].inner()),
            )
            .with_label(modifiers[index].span(), "repeated here")
            .with_secondary_label(modifiers[first].span(), "first given here"),
        );
    }
}

pub(super) fn multiplicity(
    report: &mut Report<'_>,
    unit: usize,
    multiplicity: &Spanned<MultiplicityDecl>,
) {
    if multiplicity.to_multiplicity().is_some() {
        return;
    }
    report.push(
        unit,
        Diagnostic::annotation(
            AnnotationCode::ErrAsoMul,
            format!("invalid multiplicity `{}`", multiplicity.inner()),
        )
        .with_label(multiplicity.span(), "unsupported multiplicity")
        .with_help("use one of `[0..1]`, `[1..1]`, `[0..*]` or `[1..*]`"),
    );
}

pub(super) fn parameter(report: &mut Report<'_>, handle: ParameterHandle) {
    let parameter = &report.staging().parameters[handle];
    let unit = parameter.unit;
    member_name(report, unit, &parameter.name);
    if let Some(reason) = unresolved(&parameter.data_type) {
        report.push(
            unit,
            Diagnostic::annotation(
                AnnotationCode::ErrParTyp,
                format!("parameter type `{}` {reason}", parameter.type_name.inner()),
            )
            .with_label(parameter.type_name.span(), "unknown type")
            .with_help("use a primitive type or an enumeration"),
        );
    }
    multiplicity(report, unit, &parameter.multiplicity);
}

pub(super) fn classifier(report: &mut Report<'_>, handle: ClassifierHandle) {
    let classifier = &report.staging().classifiers[handle];
    for property in &classifier.properties {
        self::property(report, classifier, property);
    }
    for signature in &classifier.signatures {
        self::signature(report, signature);
    }
    for parameterized in &classifier.parameterized {
        self::parameterized(report, parameterized);
    }

    let unit = classifier.unit;
    top_level_name(report, unit, &classifier.name, classifier.kind.keyword());
    duplicate_members(report, classifier);
    duplicate_modifiers(report, unit, &classifier.modifiers);
    inheritance(report, handle);
    keys(report, handle);
    if classifier.version_of.is_some() {
        if let Some(span) = classifier.modifier_span(ClassModifier::Versioned) {
            report.push(
                unit,
                Diagnostic::annotation(
                    AnnotationCode::ErrVerVer,
                    format!(
                        "version class `{}` cannot itself be versioned",
                        classifier.name.inner()
                    ),
                )
                .with_label(span, "remove this modifier"),
            );
        }
    }
}

fn duplicate_members(report: &mut Report<'_>, classifier: &ClassifierStaging) {
    let members = classifier.member_names();
    for (index, first) in repeated_by(&members, |(_, name, _)| name) {
        let (_, name, unit) = &members[index];
        let (_, first_name, first_unit) = &members[first];
        let diagnostic = Diagnostic::annotation(
            AnnotationCode::ErrDupMem,
            format!(
                "duplicate member `{}` in `{}`",
                name.inner(),
                classifier.name.inner()
            ),
        )
        .with_label(name.span(), "declared again here");
        let diagnostic = report.with_earlier(
            diagnostic,
            *unit,
            *first_unit,
            first_name.span(),
            "first declared here",
        );
        report.push(*unit, diagnostic);
    }
}

fn inheritance(report: &mut Report<'_>, handle: ClassifierHandle) {
    let staging = report.staging();
    let classifier = &staging.classifiers[handle];
    let unit = classifier.unit;

    if let (Some(name), Some(resolution)) =
        (&classifier.superclass_name, classifier.superclass_resolution)
    {
        let diagnostic = if !classifier.is_class() {
            Some(
                Diagnostic::annotation(
                    AnnotationCode::ErrExtCls,
                    format!("interface `{}` cannot extend a class", classifier.name.inner()),
                )
                .with_label(name.span(), "interfaces only implement other interfaces"),
            )
        } else {
            match resolution {
                Resolved::Found(superclass) if !staging.classifiers[superclass].is_class() => Some(
                    Diagnostic::annotation(
                        AnnotationCode::ErrExtInt,
                        format!(
                            "class `{}` extends interface `{}`",
                            classifier.name.inner(),
                            name.inner()
                        ),
                    )
                    .with_label(name.span(), "an interface")
                    .with_help(format!("use `implements {}` instead", name.inner())),
                ),
                Resolved::Found(_) => None,
                Resolved::NotFound | Resolved::Ambiguous => Some(
                    Diagnostic::annotation(
                        AnnotationCode::ErrExtCls,
                        format!(
                            "superclass `{}` {}",
                            name.inner(),
                            unresolved(&Some(resolution)).unwrap_or("not found")
                        ),
                    )
                    .with_label(name.span(), "unknown class"),
                ),
            }
        };
        if let Some(diagnostic) = diagnostic {
            report.push(unit, diagnostic);
        }
    }

    for (index, first) in repeated(&classifier.interface_names) {
        report.push(
            unit,
            Diagnostic::annotation(
                AnnotationCode::ErrDupInt,
                format!(
                    "interface `{}` is listed twice",
                    classifier.interface_names[index].inner()
                ),
            )
            .with_label(classifier.interface_names[index].span(), "listed again here")
            .with_secondary_label(classifier.interface_names[first].span(), "first listed here"),
        );
    }

    for (index, (name, resolution)) in classifier
        .interface_names
        .iter()
        .zip(&classifier.interfaces)
        .enumerate()
    {
        let interface = match resolution {
            Resolved::Found(interface) => *interface,
            Resolved::NotFound | Resolved::Ambiguous => {
                report.push(
                    unit,
                    Diagnostic::annotation(
                        AnnotationCode::ErrImpInt,
                        format!(
                            "interface `{}` {}",
                            name.inner(),
                            unresolved(&Some(*resolution)).unwrap_or("not found")
                        ),
                    )
                    .with_label(name.span(), "unknown interface"),
                );
                continue;
            }
        };
        let target = &staging.classifiers[interface];
        if target.is_class() {
            report.push(
                unit,
                Diagnostic::annotation(
                    AnnotationCode::ErrImpInt,
                    format!("`{}` is a class, not an interface", name.inner()),
                )
                .with_label(name.span(), "not an interface"),
            );
            continue;
        }
        if target.unit == unit && target.ordinal > classifier.ordinal {
            report.push(
                unit,
                Diagnostic::annotation(
                    AnnotationCode::ErrFwdRef,
                    format!("interface `{}` is declared later in this file", name.inner()),
                )
                .with_label(name.span(), "forward reference")
                .with_secondary_label(target.name.span(), "declared here")
                .with_help("declare interfaces before the classifiers that implement them"),
            );
        }
        if classifier.cyclic {
            continue;
        }
        let through_superclass = classifier
            .superclass()
            .is_some_and(|superclass| staging.conforms_to(superclass, interface));
        let through_sibling = classifier
            .interfaces
            .iter()
            .enumerate()
            .filter(|(other, _)| *other != index)
            .filter_map(|(_, other)| other.found())
            .any(|other| other != interface && staging.inherits_from(other, interface));
        if through_superclass || through_sibling {
            report.push(
                unit,
                Diagnostic::annotation(
                    AnnotationCode::ErrRedInt,
                    format!(
                        "`{}` already inherits interface `{}`",
                        classifier.name.inner(),
                        name.inner()
                    ),
                )
                .with_label(name.span(), "redundant")
                .with_help("remove the interface from the list"),
            );
        }
    }

    if classifier.cyclic {
        report.push(
            unit,
            Diagnostic::annotation(
                AnnotationCode::ErrCycInh,
                format!("`{}` inherits from itself", classifier.name.inner()),
            )
            .with_label(classifier.name.span(), "circular inheritance"),
        );
    }
}

fn keys(report: &mut Report<'_>, handle: ClassifierHandle) {
    let staging = report.staging();
    let classifier = &staging.classifiers[handle];
    let unit = classifier.unit;

    if classifier.is_transient() {
        for property in &classifier.properties {
            if let Some(span) = property.modifier_span(PropertyModifier::Id) {
                report.push(
                    property.unit,
                    Diagnostic::annotation(
                        AnnotationCode::ErrTnsIdp,
                        format!(
                            "transient class `{}` cannot have id property `{}`",
                            classifier.name.inner(),
                            property.name.inner()
                        ),
                    )
                    .with_label(span, "id in a transient class"),
                );
            }
        }
        return;
    }
    if !classifier.is_class() || classifier.cyclic {
        return;
    }

    let keys = staging.key_properties(handle);
    if keys.is_empty() {
        if !classifier.inferred {
            report.push(
                unit,
                Diagnostic::annotation(
                    AnnotationCode::ErrClsKey,
                    format!("class `{}` has no key property", classifier.name.inner()),
                )
                .with_label(classifier.name.span(), "needs a key")
                .with_help("mark at least one property `key`, or make the class `transient`"),
            );
        }
        return;
    }

    if !keys.iter().any(|key| staging.property(*key).is_id()) {
        return;
    }
    for key in keys {
        let property = staging.property(key);
        if property.is_id() {
            continue;
        }
        report.push(
            property.unit,
            Diagnostic::annotation(
                AnnotationCode::ErrKeyIds,
                format!(
                    "key `{}` of `{}` is not an id, but the class has id keys",
                    property.name.inner(),
                    classifier.name.inner()
                ),
            )
            .with_label(property.name.span(), "non-id key")
            .with_help("either every key is an `id`, or none is"),
        );
    }
}

fn property(report: &mut Report<'_>, classifier: &ClassifierStaging, property: &PropertyStaging) {
    let unit = property.unit;
    member_name(report, unit, &property.name);
    duplicate_modifiers(report, unit, &property.modifiers);

    if let Some(reason) = unresolved(&property.data_type) {
        report.push(
            unit,
            Diagnostic::annotation(
                AnnotationCode::ErrPrpTyp,
                format!(
                    "type `{}` of `{}.{}` {reason}",
                    property.type_name.inner(),
                    classifier.name.inner(),
                    property.name.inner()
                ),
            )
            .with_label(property.type_name.span(), "unknown type")
            .with_help("use a primitive type or an enumeration"),
        );
    }

    validations(report, property);
    let Some(data_type) = property.resolved_type() else {
        return;
    };
    let type_name = report.type_name(data_type);
    let primitive = data_type.primitive();
    let wrong_type = |code: AnnotationCode, modifier: PropertyModifier, expected: &str| {
        Diagnostic::annotation(
            code,
            format!(
                "`{modifier}` property `{}` must be {expected}, found {type_name}",
                property.name.inner()
            ),
        )
        .with_label(property.type_name.span(), format!("expected {expected}"))
    };

    if property.has_modifier(PropertyModifier::Version)
        && !primitive.is_some_and(|primitive| primitive.is_integral())
    {
        report.push(
            unit,
            wrong_type(AnnotationCode::ErrVerDtp, PropertyModifier::Version, "Integer or Long"),
        );
    }
    if property.has_modifier(PropertyModifier::UserId) {
        if primitive != Some(PrimitiveType::String) {
            report.push(
                unit,
                wrong_type(AnnotationCode::ErrUsrDtp, PropertyModifier::UserId, "String"),
            );
        }
        if !property.is_key() {
            report.push(
                unit,
                Diagnostic::annotation(
                    AnnotationCode::ErrAudKey,
                    format!("user id property `{}` must be a key", property.name.inner()),
                )
                .with_label(property.name.span(), "not a key")
                .with_help("add the `key` modifier"),
            );
        }
    }

    temporal(report, property, primitive);

    for modifier in [PropertyModifier::CreatedBy, PropertyModifier::LastUpdatedBy] {
        if !property.has_modifier(modifier) {
            continue;
        }
        if primitive != Some(PrimitiveType::String) {
            report.push(unit, wrong_type(AnnotationCode::ErrAudDtp, modifier, "String"));
        }
        if !property.is_private() {
            report.push(
                unit,
                Diagnostic::annotation(
                    AnnotationCode::ErrAudPri,
                    format!("`{modifier}` property `{}` must be private", property.name.inner()),
                )
                .with_label(property.name.span(), "not private")
                .with_help("add the `private` modifier"),
            );
        }
        let (code, conventional) = if modifier == PropertyModifier::CreatedBy {
            (AnnotationCode::WrnCrtNam, "createdById")
        } else {
            (AnnotationCode::WrnLubNam, "lastUpdatedById")
        };
        if *property.name != conventional {
            report.push(
                unit,
                Diagnostic::annotation(
                    code,
                    format!(
                        "`{modifier}` property `{}` is conventionally named `{conventional}`",
                        property.name.inner()
                    ),
                )
                .with_label(property.name.span(), format!("consider `{conventional}`")),
            );
        }
    }
    if property.has_modifier(PropertyModifier::CreatedOn) {
        if primitive != Some(PrimitiveType::Instant) {
            report.push(
                unit,
                wrong_type(AnnotationCode::ErrAudDtp, PropertyModifier::CreatedOn, "Instant"),
            );
        }
        if !property.is_final() {
            report.push(
                unit,
                Diagnostic::annotation(
                    AnnotationCode::ErrConFin,
                    format!("`createdOn` property `{}` must be final", property.name.inner()),
                )
                .with_label(property.name.span(), "not final")
                .with_help("add the `final` modifier"),
            );
        }
    }
}

fn temporal(report: &mut Report<'_>, property: &PropertyStaging, primitive: Option<PrimitiveType>) {
    let unit = property.unit;
    let from = property.modifier_span(PropertyModifier::From);
    let to = property.modifier_span(PropertyModifier::To);
    let dimension = property.has_modifier(PropertyModifier::Valid)
        || property.has_modifier(PropertyModifier::System);

    if let (Some(_), Some(to)) = (from, to) {
        report.push(
            unit,
            Diagnostic::annotation(
                AnnotationCode::ErrTmpFto,
                format!(
                    "temporal property `{}` cannot be both `from` and `to`",
                    property.name.inner()
                ),
            )
            .with_label(to, "remove one bound"),
        );
    }
    let Some(bound) = from.or(to) else {
        if dimension && primitive != Some(PrimitiveType::TemporalRange) {
            report.push(
                unit,
                Diagnostic::annotation(
                    AnnotationCode::ErrTmpRng,
                    format!(
                        "temporal range property `{}` must be a TemporalRange",
                        property.name.inner()
                    ),
                )
                .with_label(property.type_name.span(), "expected TemporalRange"),
            );
        }
        return;
    };
    if !dimension {
        report.push(
            unit,
            Diagnostic::annotation(
                AnnotationCode::ErrTmpSys,
                format!(
                    "temporal bound `{}` needs a `valid` or `system` dimension",
                    property.name.inner()
                ),
            )
            .with_label(bound, "bound without dimension"),
        );
    }
    if primitive != Some(PrimitiveType::TemporalInstant) {
        report.push(
            unit,
            Diagnostic::annotation(
                AnnotationCode::ErrTmpIns,
                format!(
                    "temporal bound `{}` must be a TemporalInstant",
                    property.name.inner()
                ),
            )
            .with_label(property.type_name.span(), "expected TemporalInstant"),
        );
    }
}

fn validations(report: &mut Report<'_>, property: &PropertyStaging) {
    let unit = property.unit;
    let validations = &property.validations;
    for (index, first) in repeated_by(validations, |validation| &validation.kind) {
        report.push(
            unit,
            Diagnostic::annotation(
                AnnotationCode::ErrDupVal,
                format!(
                    "duplicate validation `{}` on `{}`",
                    validations[index].kind.keyword(),
                    property.name.inner()
                ),
            )
            .with_label(validations[index].span(), "repeated here")
            .with_secondary_label(validations[first].span(), "first given here"),
        );
    }

    if let Some(data_type) = property.resolved_type() {
        let primitive = data_type.primitive();
        for validation in validations {
            let applies = if validation.kind.is_length() {
                primitive == Some(PrimitiveType::String)
            } else {
                primitive.is_some_and(|primitive| primitive.is_numeric())
            };
            if applies {
                continue;
            }
            let expected = if validation.kind.is_length() { "String" } else { "numeric" };
            report.push(
                unit,
                Diagnostic::annotation(
                    AnnotationCode::ErrValDtp,
                    format!(
                        "`{}` does not apply to {} property `{}`",
                        validation.kind.keyword(),
                        type_label(report, data_type),
                        property.name.inner()
                    ),
                )
                .with_label(validation.span(), format!("needs a {expected} property")),
            );
        }
    }

    for validation in validations {
        if validation.kind.is_length() && *validation.value < 0 {
            report.push(
                unit,
                Diagnostic::annotation(
                    AnnotationCode::ErrValRng,
                    format!("`{}` cannot be negative", validation.kind.keyword()),
                )
                .with_label(validation.value.span(), "negative length"),
            );
        }
    }
    for (lower, upper) in [
        (ValidationKind::MinLength, ValidationKind::MaxLength),
        (ValidationKind::Minimum, ValidationKind::Maximum),
    ] {
        let (Some(minimum), Some(maximum)) =
            (property.validation(lower), property.validation(upper))
        else {
            continue;
        };
        if minimum <= maximum {
            continue;
        }
        let span = validations
            .iter()
            .find(|validation| validation.kind == upper)
            .map_or(property.name.span(), |validation| validation.value.span());
        report.push(
            unit,
            Diagnostic::annotation(
                AnnotationCode::ErrValRng,
                format!(
                    "`{}({minimum})` exceeds `{}({maximum})` on `{}`",
                    lower.keyword(),
                    upper.keyword(),
                    property.name.inner()
                ),
            )
            .with_label(span, "below the lower bound"),
        );
    }
}

fn type_label(report: &Report<'_>, data_type: StagedType) -> String {
    match data_type {
        StagedType::Primitive(_) => report.type_name(data_type),
        StagedType::Enumeration(_) => format!("enumeration {}", report.type_name(data_type)),
    }
}

fn signature(report: &mut Report<'_>, signature: &SignatureStaging) {
    let unit = signature.unit;
    member_name(report, unit, &signature.name);
    if let Some(reason) = unresolved(&signature.target) {
        report.push(
            unit,
            Diagnostic::annotation(
                AnnotationCode::ErrRefTyp,
                format!("reference type `{}` {reason}", signature.type_name.inner()),
            )
            .with_label(signature.type_name.span(), "unknown classifier"),
        );
    }
    multiplicity(report, unit, &signature.multiplicity);
    if let Some(order_by) = &signature.order_by {
        to_one_order_by(report, unit, &signature.multiplicity, order_by.span);
        criteria::order_by(report, unit, order_by);
    }
    duplicate_modifiers(report, unit, &signature.modifiers);
}

fn parameterized(report: &mut Report<'_>, property: &ParameterizedStaging) {
    let unit = property.unit;
    for parameter in &property.parameters {
        self::parameter(report, *parameter);
    }
    member_name(report, unit, &property.name);
    if let Some(reason) = unresolved(&property.target) {
        report.push(
            unit,
            Diagnostic::annotation(
                AnnotationCode::ErrRefTyp,
                format!("reference type `{}` {reason}", property.type_name.inner()),
            )
            .with_label(property.type_name.span(), "unknown classifier"),
        );
    }
    multiplicity(report, unit, &property.multiplicity);
    criteria::criteria(report, unit, &property.criteria);
    if let Some(order_by) = &property.order_by {
        to_one_order_by(report, unit, &property.multiplicity, order_by.span);
        criteria::order_by(report, unit, order_by);
    }
}

/// A reference to at most one instance has nothing to order.
pub(super) fn to_one_order_by(
    report: &mut Report<'_>,
    unit: usize,
    multiplicity: &Spanned<MultiplicityDecl>,
    order_by: Span,
) {
    if multiplicity.upper != Some(1) {
        return;
    }
    report.push(
        unit,
        Diagnostic::annotation(
            AnnotationCode::ErrRefOrd,
            "a to-one reference cannot have an order-by",
        )
        .with_label(order_by, "nothing to order")
        .with_secondary_label(multiplicity.span(), "to-one"),
    );
}
