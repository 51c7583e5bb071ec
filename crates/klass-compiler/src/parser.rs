//! Parser for Klass source tokens.
//!
//! This module transforms a token stream from the [`lexer`](super::lexer) into
//! the syntax tree defined in [`syntax`](super::syntax). Trivia tokens are
//! dropped before parsing; spans still refer to the original text.
//!
//! Entry points:
//! - [`build_source_file`] - A whole compilation unit
//! - [`build_members`] - Classifier members, for in-place macro expansion
//! - [`build_service_criteria`] - Service criteria entries, for in-place macro expansion

use std::str::FromStr;

use winnow::{
    Parser as _,
    combinator::{alt, cut_err, opt, preceded, repeat, separated, terminated},
    error::{ContextError, ErrMode},
    stream::{Stream, TokenSlice},
};

use klass_core::{
    identifier::Id,
    model::{
        AssociationEndModifier, ClassModifier, ClassifierKind, CriteriaKeyword, Operator,
        PropertyModifier, ServiceMultiplicity, SortDirection, Verb,
    },
};

use crate::{
    error::{AnnotationCode, Diagnostic},
    span::{Span, Spanned},
    syntax::*,
    tokens::{PositionedToken, Token},
};

/// Context type for parser errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Context {
    /// Description of what was expected
    Label(&'static str),
    /// A specific word or symbol that was expected
    Keyword(&'static str),
    /// Remaining token count (`eof_offset()`) where the expectation failed
    Remaining(usize),
}

type Input<'src> = TokenSlice<'src, PositionedToken<'src>>;
type IResult<O> = std::result::Result<O, ErrMode<ContextError<Context>>>;

/// A backtracking error at the token `remaining` tokens before the end.
fn expected(context: Context, remaining: usize) -> ErrMode<ContextError<Context>> {
    let mut error = ContextError::new();
    error.push(Context::Remaining(remaining));
    error.push(context);
    ErrMode::Backtrack(error)
}

fn cut(error: ErrMode<ContextError<Context>>) -> ErrMode<ContextError<Context>> {
    match error {
        ErrMode::Backtrack(e) => ErrMode::Cut(e),
        other => other,
    }
}

/// Runs the remainder of a construct once its leading token matched.
/// Failures inside `f` no longer backtrack.
fn commit<'src, O>(
    input: &mut Input<'src>,
    f: impl FnOnce(&mut Input<'src>) -> IResult<O>,
) -> IResult<O> {
    f(input).map_err(cut)
}

fn peek_nth<'src>(input: &Input<'src>, n: usize) -> Option<&'src PositionedToken<'src>> {
    let mut lookahead = input.clone();
    for _ in 0..n {
        lookahead.next_token()?;
    }
    lookahead.next_token()
}

fn peek<'src>(input: &Input<'src>) -> Option<&'src Token<'src>> {
    peek_nth(input, 0).map(|positioned| &positioned.token)
}

fn peek_is(input: &Input<'_>, expected: &Token<'_>) -> bool {
    peek(input).is_some_and(|token| token == expected)
}

/// Consume the next token if `pick` accepts it.
fn next_if<O>(
    input: &mut Input<'_>,
    context: Context,
    pick: impl FnOnce(&Token<'_>) -> Option<O>,
) -> IResult<Spanned<O>> {
    let remaining = input.eof_offset();
    let picked = peek_nth(input, 0).and_then(|positioned| {
        pick(&positioned.token).map(|value| Spanned::new(value, positioned.span))
    });
    match picked {
        Some(value) => {
            let _ = input.next_token();
            Ok(value)
        }
        None => Err(expected(context, remaining)),
    }
}

/// Source text of punctuation and reserved words, for error messages.
fn symbol(token: &Token<'_>) -> &'static str {
    if let Some(word) = token.reserved_word() {
        return word;
    }
    match token {
        Token::EqualsEquals => "==",
        Token::NotEquals => "!=",
        Token::LessEquals => "<=",
        Token::GreaterEquals => ">=",
        Token::Less => "<",
        Token::Greater => ">",
        Token::AndAnd => "&&",
        Token::OrOr => "||",
        Token::DotDot => "..",
        Token::Dot => ".",
        Token::Colon => ":",
        Token::Semicolon => ";",
        Token::Comma => ",",
        Token::Question => "?",
        Token::Star => "*",
        Token::Slash => "/",
        Token::Ampersand => "&",
        Token::LeftBrace => "{",
        Token::RightBrace => "}",
        Token::LeftBracket => "[",
        Token::RightBracket => "]",
        Token::LeftParen => "(",
        Token::RightParen => ")",
        _ => "token",
    }
}

/// Parse one specific punctuation token or reserved word
fn token(expected: Token<'static>) -> impl FnMut(&mut Input<'_>) -> IResult<Span> {
    let symbol = symbol(&expected);
    move |input: &mut Input<'_>| {
        next_if(input, Context::Keyword(symbol), |found| {
            (*found == expected).then_some(())
        })
        .map(|matched| matched.span())
    }
}

/// Parse a contextual keyword, lexed as an identifier
fn keyword(word: &'static str) -> impl FnMut(&mut Input<'_>) -> IResult<Span> {
    move |input: &mut Input<'_>| {
        next_if(input, Context::Keyword(word), |found| {
            matches!(found, Token::Identifier(name) if *name == word).then_some(())
        })
        .map(|matched| matched.span())
    }
}

/// Parse an identifier that names one of a fixed set of keywords
fn from_keyword<T: FromStr>(
    label: &'static str,
) -> impl FnMut(&mut Input<'_>) -> IResult<Spanned<T>> {
    move |input: &mut Input<'_>| {
        next_if(input, Context::Label(label), |found| match found {
            Token::Identifier(name) => name.parse::<T>().ok(),
            _ => None,
        })
    }
}

fn end_of_input(label: &'static str) -> impl FnMut(&mut Input<'_>) -> IResult<()> {
    move |input: &mut Input<'_>| {
        let remaining = input.eof_offset();
        if remaining == 0 {
            Ok(())
        } else {
            Err(expected(Context::Label(label), remaining))
        }
    }
}

fn identifier(input: &mut Input<'_>) -> IResult<Spanned<Id>> {
    next_if(input, Context::Label("identifier"), |found| match found {
        Token::Identifier(name) => Some(Id::new(name)),
        _ => None,
    })
}

/// Parse any word, including reserved ones (package and URL segments)
fn word(input: &mut Input<'_>) -> IResult<Spanned<String>> {
    next_if(input, Context::Label("name"), |found| match found {
        Token::Identifier(name) => Some(name.to_string()),
        other => other.reserved_word().map(str::to_string),
    })
}

fn string_literal(input: &mut Input<'_>) -> IResult<Spanned<String>> {
    next_if(input, Context::Label("string literal"), |found| match found {
        Token::StringLiteral(text) => Some(text.clone()),
        _ => None,
    })
}

fn integer(input: &mut Input<'_>) -> IResult<Spanned<i64>> {
    next_if(input, Context::Label("integer"), |found| match found {
        Token::IntegerLiteral(value) => Some(*value),
        _ => None,
    })
}

fn literal_value(token: &Token<'_>) -> Option<LiteralDecl> {
    match token {
        Token::IntegerLiteral(value) => Some(LiteralDecl::Integer(*value)),
        Token::FloatLiteral(value) => Some(LiteralDecl::Float(*value)),
        Token::StringLiteral(text) => Some(LiteralDecl::String(text.clone())),
        Token::True => Some(LiteralDecl::Boolean(true)),
        Token::False => Some(LiteralDecl::Boolean(false)),
        _ => None,
    }
}

fn literal(input: &mut Input<'_>) -> IResult<Spanned<LiteralDecl>> {
    next_if(input, Context::Label("literal"), literal_value)
}

// =============================================================================
// Source files
// =============================================================================

/// Parse `package a.b.c`
fn package_declaration(input: &mut Input<'_>) -> IResult<Spanned<Id>> {
    token(Token::Package).parse_next(input)?;
    commit(input, |input| {
        let segments: Vec<Spanned<String>> =
            separated(1.., word, token(Token::Dot)).parse_next(input)?;
        let span = segments
            .iter()
            .map(|segment| segment.span())
            .reduce(|a, b| a.union(b))
            .unwrap_or_default();
        let name = segments
            .iter()
            .map(|segment| segment.inner().as_str())
            .collect::<Vec<_>>()
            .join(".");
        Ok(Spanned::new(Id::new(&name), span))
    })
}

fn source_file(input: &mut Input<'_>) -> IResult<SourceFile> {
    let package = package_declaration(input)?;
    let declarations: Vec<Declaration> = repeat(0.., declaration).parse_next(input)?;
    end_of_input("declaration").parse_next(input)?;
    Ok(SourceFile {
        package,
        declarations,
    })
}

fn declaration(input: &mut Input<'_>) -> IResult<Declaration> {
    alt((
        enumeration.map(Declaration::Enumeration),
        classifier.map(Declaration::Classifier),
        association.map(Declaration::Association),
        projection.map(Declaration::Projection),
        service_group.map(Declaration::Service),
    ))
    .parse_next(input)
}

// =============================================================================
// Enumerations
// =============================================================================

fn enumeration(input: &mut Input<'_>) -> IResult<EnumerationDecl> {
    let start = token(Token::Enumeration).parse_next(input)?;
    commit(input, |input| {
        let name = identifier(input)?;
        token(Token::LeftBrace).parse_next(input)?;
        let literals: Vec<EnumerationLiteralDecl> = terminated(
            separated(0.., enumeration_literal, token(Token::Comma)),
            opt(token(Token::Comma)),
        )
        .parse_next(input)?;
        let end = token(Token::RightBrace).parse_next(input)?;
        Ok(EnumerationDecl {
            name,
            literals,
            span: start.union(end),
        })
    })
}

/// Parse `NAME` or `NAME("Pretty Name")`
fn enumeration_literal(input: &mut Input<'_>) -> IResult<EnumerationLiteralDecl> {
    let name = identifier(input)?;
    let pretty_name = opt(preceded(
        token(Token::LeftParen),
        cut_err(terminated(string_literal, token(Token::RightParen))),
    ))
    .parse_next(input)?;
    Ok(EnumerationLiteralDecl { name, pretty_name })
}

// =============================================================================
// Classifiers and members
// =============================================================================

fn classifier(input: &mut Input<'_>) -> IResult<ClassifierDecl> {
    let kind = next_if(input, Context::Label("declaration"), |found| match found {
        Token::Class => Some(ClassifierKind::Class),
        Token::User => Some(ClassifierKind::User),
        Token::Interface => Some(ClassifierKind::Interface),
        _ => None,
    })?;
    commit(input, |input| {
        let name = identifier(input)?;
        let superclass =
            opt(preceded(token(Token::Extends), cut_err(identifier))).parse_next(input)?;
        let interfaces: Option<Vec<Spanned<Id>>> = opt(preceded(
            token(Token::Implements),
            cut_err(separated(1.., identifier, token(Token::Comma))),
        ))
        .parse_next(input)?;
        let modifiers: Vec<Spanned<ClassModifier>> =
            repeat(0.., from_keyword::<ClassModifier>("class modifier")).parse_next(input)?;
        token(Token::LeftBrace).parse_next(input)?;
        let members: Vec<MemberDecl> = repeat(0.., member).parse_next(input)?;
        let end = token(Token::RightBrace).parse_next(input)?;
        Ok(ClassifierDecl {
            span: kind.span().union(end),
            kind,
            name,
            superclass,
            interfaces: interfaces.unwrap_or_default(),
            modifiers,
            members,
        })
    })
}

/// Parse a classifier member
///
/// The token after the name decides the kind: `(` starts a parameterized
/// property, and a multiplicity after the type marks an association end
/// signature.
fn member(input: &mut Input<'_>) -> IResult<MemberDecl> {
    let name = identifier(input)?;
    commit(input, |input| {
        if peek_is(input, &Token::LeftParen) {
            return parameterized_property(input, name).map(MemberDecl::Parameterized);
        }
        token(Token::Colon).parse_next(input)?;
        let type_name = identifier(input)?;
        if peek_is(input, &Token::LeftBracket) {
            let end = association_end_tail(input, name, type_name)?;
            token(Token::Semicolon).parse_next(input)?;
            Ok(MemberDecl::AssociationEndSignature(end))
        } else {
            data_type_property_tail(input, name, type_name).map(MemberDecl::DataType)
        }
    })
}

/// A modifier or validation following a data type property's type.
enum PropertyTrait {
    Modifier(Spanned<PropertyModifier>),
    Validation(Spanned<ValidationDecl>),
}

fn data_type_property_tail(
    input: &mut Input<'_>,
    name: Spanned<Id>,
    type_name: Spanned<Id>,
) -> IResult<DataTypePropertyDecl> {
    let optional = opt(token(Token::Question)).parse_next(input)?.is_some();
    let traits: Vec<PropertyTrait> = repeat(
        0..,
        alt((
            validation.map(PropertyTrait::Validation),
            from_keyword::<PropertyModifier>("property modifier").map(PropertyTrait::Modifier),
        )),
    )
    .parse_next(input)?;
    token(Token::Semicolon).parse_next(input)?;

    let mut modifiers = Vec::new();
    let mut validations = Vec::new();
    for property_trait in traits {
        match property_trait {
            PropertyTrait::Modifier(modifier) => modifiers.push(modifier),
            PropertyTrait::Validation(validation) => validations.push(validation),
        }
    }
    Ok(DataTypePropertyDecl {
        name,
        type_name,
        optional,
        modifiers,
        validations,
    })
}

/// Parse `maxLength(256)`
fn validation(input: &mut Input<'_>) -> IResult<Spanned<ValidationDecl>> {
    let kind = next_if(input, Context::Label("validation"), |found| match found {
        Token::Identifier(name) => ValidationKind::ALL
            .into_iter()
            .find(|kind| kind.keyword() == *name),
        _ => None,
    })?;
    commit(input, |input| {
        token(Token::LeftParen).parse_next(input)?;
        let value = integer(input)?;
        let end = token(Token::RightParen).parse_next(input)?;
        Ok(Spanned::new(
            ValidationDecl {
                kind: *kind.inner(),
                value,
            },
            kind.span().union(end),
        ))
    })
}

/// Parse `[lower..upper]` or `[lower..*]`
fn multiplicity(input: &mut Input<'_>) -> IResult<Spanned<MultiplicityDecl>> {
    let start = token(Token::LeftBracket).parse_next(input)?;
    commit(input, |input| {
        let lower = integer(input)?;
        token(Token::DotDot).parse_next(input)?;
        let upper = next_if(input, Context::Label("upper bound or `*`"), |found| match found {
            Token::IntegerLiteral(value) => Some(Some(*value)),
            Token::Star => Some(None),
            _ => None,
        })?;
        let end = token(Token::RightBracket).parse_next(input)?;
        Ok(Spanned::new(
            MultiplicityDecl {
                lower: *lower.inner(),
                upper: upper.into_inner(),
            },
            start.union(end),
        ))
    })
}

/// Parse what follows `name: Type` in an association end: multiplicity,
/// modifiers and an optional order-by clause.
fn association_end_tail(
    input: &mut Input<'_>,
    name: Spanned<Id>,
    type_name: Spanned<Id>,
) -> IResult<AssociationEndDecl> {
    let multiplicity = multiplicity(input)?;
    let modifiers: Vec<Spanned<AssociationEndModifier>> =
        repeat(0.., from_keyword::<AssociationEndModifier>("association end modifier"))
            .parse_next(input)?;
    let order_by = opt(order_by_clause).parse_next(input)?;
    Ok(AssociationEndDecl {
        name,
        type_name,
        multiplicity,
        modifiers,
        order_by,
    })
}

/// Parse `name: Type[1..1]`
fn parameter(input: &mut Input<'_>) -> IResult<ParameterDecl> {
    let name = identifier(input)?;
    commit(input, |input| {
        token(Token::Colon).parse_next(input)?;
        let type_name = identifier(input)?;
        let multiplicity = multiplicity(input)?;
        Ok(ParameterDecl {
            name,
            type_name,
            multiplicity,
        })
    })
}

fn parameterized_property(
    input: &mut Input<'_>,
    name: Spanned<Id>,
) -> IResult<ParameterizedPropertyDecl> {
    token(Token::LeftParen).parse_next(input)?;
    let parameters: Vec<ParameterDecl> =
        separated(0.., parameter, token(Token::Comma)).parse_next(input)?;
    token(Token::RightParen).parse_next(input)?;
    token(Token::Colon).parse_next(input)?;
    let type_name = identifier(input)?;
    let multiplicity = multiplicity(input)?;
    let order_by = opt(order_by_clause).parse_next(input)?;
    token(Token::LeftBrace).parse_next(input)?;
    let criteria = criteria(input)?;
    token(Token::RightBrace).parse_next(input)?;
    Ok(ParameterizedPropertyDecl {
        name,
        parameters,
        type_name,
        multiplicity,
        order_by,
        criteria,
    })
}

// =============================================================================
// Associations
// =============================================================================

fn association(input: &mut Input<'_>) -> IResult<AssociationDecl> {
    let start = token(Token::Association).parse_next(input)?;
    commit(input, |input| {
        let name = identifier(input)?;
        token(Token::LeftBrace).parse_next(input)?;
        let ends: Vec<AssociationEndDecl> = repeat(0.., association_end).parse_next(input)?;
        let relationship_span = token(Token::Relationship).parse_next(input)?;
        let relationship = criteria(input)?;
        opt(token(Token::Semicolon)).parse_next(input)?;
        let end = token(Token::RightBrace).parse_next(input)?;
        Ok(AssociationDecl {
            name,
            ends,
            relationship_span,
            relationship,
            span: start.union(end),
        })
    })
}

fn association_end(input: &mut Input<'_>) -> IResult<AssociationEndDecl> {
    let name = identifier(input)?;
    commit(input, |input| {
        token(Token::Colon).parse_next(input)?;
        let type_name = identifier(input)?;
        let end = association_end_tail(input, name, type_name)?;
        token(Token::Semicolon).parse_next(input)?;
        Ok(end)
    })
}

// =============================================================================
// Criteria and expressions
// =============================================================================

fn criteria(input: &mut Input<'_>) -> IResult<CriteriaDecl> {
    let first = conjunction(input)?;
    let rest: Vec<CriteriaDecl> =
        repeat(0.., preceded(token(Token::OrOr), cut_err(conjunction))).parse_next(input)?;
    Ok(rest.into_iter().fold(first, |left, right| {
        CriteriaDecl::Or(Box::new(left), Box::new(right))
    }))
}

fn conjunction(input: &mut Input<'_>) -> IResult<CriteriaDecl> {
    let first = primary_criteria(input)?;
    let rest: Vec<CriteriaDecl> =
        repeat(0.., preceded(token(Token::AndAnd), cut_err(primary_criteria)))
            .parse_next(input)?;
    Ok(rest.into_iter().fold(first, |left, right| {
        CriteriaDecl::And(Box::new(left), Box::new(right))
    }))
}

fn primary_criteria(input: &mut Input<'_>) -> IResult<CriteriaDecl> {
    match peek(input) {
        Some(Token::Identifier("all")) => keyword("all").map(CriteriaDecl::All).parse_next(input),
        Some(Token::LeftParen)
            if !peek_nth(input, 1).is_some_and(|next| literal_value(&next.token).is_some()) =>
        {
            token(Token::LeftParen).parse_next(input)?;
            commit(input, |input| {
                let inner = criteria(input)?;
                token(Token::RightParen).parse_next(input)?;
                Ok(inner)
            })
        }
        _ => comparison(input),
    }
}

/// Parse `source <op> target` or `path equalsEdgePoint`
fn comparison(input: &mut Input<'_>) -> IResult<CriteriaDecl> {
    let start = input.eof_offset();
    let source = expression(input)?;
    commit(input, |input| {
        if let Some(Token::Identifier("equalsEdgePoint")) = peek(input) {
            let edge_point = keyword("equalsEdgePoint").parse_next(input)?;
            return match source {
                ExpressionDecl::ThisPath(path) | ExpressionDecl::TypePath(path) => {
                    Ok(CriteriaDecl::EdgePoint {
                        span: path.span.union(edge_point),
                        path,
                    })
                }
                _ => Err(expected(
                    Context::Label("member path before `equalsEdgePoint`"),
                    start,
                )),
            };
        }
        let operator = next_if(input, Context::Label("operator"), |found| match found {
            Token::EqualsEquals => Some(Operator::Equal),
            Token::NotEquals => Some(Operator::NotEqual),
            Token::Less => Some(Operator::LessThan),
            Token::Greater => Some(Operator::GreaterThan),
            Token::LessEquals => Some(Operator::LessThanOrEqual),
            Token::GreaterEquals => Some(Operator::GreaterThanOrEqual),
            Token::Identifier(name) => name.parse::<Operator>().ok(),
            _ => None,
        })?;
        let target = expression(input)?;
        Ok(CriteriaDecl::Operator {
            operator,
            source,
            target,
        })
    })
}

fn expression(input: &mut Input<'_>) -> IResult<ExpressionDecl> {
    let Some(next) = peek_nth(input, 0) else {
        return Err(expected(Context::Label("expression"), 0));
    };
    match &next.token {
        Token::This => member_path.map(ExpressionDecl::ThisPath).parse_next(input),
        Token::Identifier(_) if peek_nth(input, 1).is_some_and(|t| t.token == Token::Dot) => {
            member_path.map(ExpressionDecl::TypePath).parse_next(input)
        }
        Token::Identifier(_) => identifier.map(ExpressionDecl::Variable).parse_next(input),
        Token::Null => token(Token::Null).map(ExpressionDecl::Null).parse_next(input),
        Token::User => token(Token::User).map(ExpressionDecl::User).parse_next(input),
        Token::LeftParen => literal_list(input),
        _ => next_if(input, Context::Label("expression"), literal_value)
            .map(ExpressionDecl::Literal),
    }
}

/// Parse `("a", "b")`
fn literal_list(input: &mut Input<'_>) -> IResult<ExpressionDecl> {
    let start = token(Token::LeftParen).parse_next(input)?;
    commit(input, |input| {
        let literals: Vec<Spanned<LiteralDecl>> = terminated(
            separated(1.., literal, token(Token::Comma)),
            opt(token(Token::Comma)),
        )
        .parse_next(input)?;
        let end = token(Token::RightParen).parse_next(input)?;
        Ok(ExpressionDecl::LiteralList(Spanned::new(
            literals,
            start.union(end),
        )))
    })
}

/// Parse `this.a.b` or `Type.a.b`
fn member_path(input: &mut Input<'_>) -> IResult<MemberPathDecl> {
    let head = next_if(input, Context::Label("member path"), |found| match found {
        Token::This => Some(None),
        Token::Identifier(name) => Some(Some(Id::new(name))),
        _ => None,
    })?;
    commit(input, |input| {
        let segments: Vec<Spanned<Id>> =
            repeat(1.., preceded(token(Token::Dot), cut_err(identifier))).parse_next(input)?;
        let span = segments
            .last()
            .map_or(head.span(), |last| head.span().union(last.span()));
        let class_name = head
            .inner()
            .map(|name| Spanned::new(name, head.span()));
        Ok(MemberPathDecl {
            class_name,
            segments,
            span,
        })
    })
}

/// Parse `orderBy: this.a descending, this.b`
fn order_by_clause(input: &mut Input<'_>) -> IResult<OrderByDecl> {
    let start = token(Token::OrderBy).parse_next(input)?;
    commit(input, |input| {
        token(Token::Colon).parse_next(input)?;
        let members: Vec<OrderByMemberDecl> =
            separated(1.., order_by_member, token(Token::Comma)).parse_next(input)?;
        let span = members.iter().fold(start, |span, member| {
            let end = member
                .direction
                .as_ref()
                .map_or(member.path.span, |direction| direction.span());
            span.union(end)
        });
        Ok(OrderByDecl { members, span })
    })
}

fn order_by_member(input: &mut Input<'_>) -> IResult<OrderByMemberDecl> {
    let path = member_path(input)?;
    let direction = opt(|input: &mut Input<'_>| {
        next_if(input, Context::Label("sort direction"), |found| match found {
            Token::Identifier("ascending") => Some(SortDirection::Ascending),
            Token::Identifier("descending") => Some(SortDirection::Descending),
            _ => None,
        })
    })
    .parse_next(input)?;
    Ok(OrderByMemberDecl { path, direction })
}

// =============================================================================
// Projections
// =============================================================================

fn projection(input: &mut Input<'_>) -> IResult<ProjectionDecl> {
    let start = token(Token::Projection).parse_next(input)?;
    commit(input, |input| {
        let name = identifier(input)?;
        token(Token::On).parse_next(input)?;
        let class_name = identifier(input)?;
        let (members, end) = projection_members(input)?;
        Ok(ProjectionDecl {
            name,
            class_name,
            members,
            span: start.union(end),
        })
    })
}

/// Parse `{ member, member, }`, returning the closing brace span
fn projection_members(input: &mut Input<'_>) -> IResult<(Vec<ProjectionMemberDecl>, Span)> {
    token(Token::LeftBrace).parse_next(input)?;
    let members: Vec<ProjectionMemberDecl> = terminated(
        separated(0.., projection_member, token(Token::Comma)),
        opt(token(Token::Comma)),
    )
    .parse_next(input)?;
    let end = token(Token::RightBrace).parse_next(input)?;
    Ok((members, end))
}

fn projection_member(input: &mut Input<'_>) -> IResult<ProjectionMemberDecl> {
    let name = identifier(input)?;
    commit(input, |input| {
        token(Token::Colon).parse_next(input)?;
        let body = match peek(input) {
            Some(Token::StringLiteral(_)) => ProjectionBodyDecl::Header(string_literal(input)?),
            Some(Token::LeftBrace) => ProjectionBodyDecl::Children(projection_members(input)?.0),
            _ => {
                let target = next_if(
                    input,
                    Context::Label("header, `{` or projection name"),
                    |found| match found {
                        Token::Identifier(name) => Some(Id::new(name)),
                        _ => None,
                    },
                )?;
                ProjectionBodyDecl::Projection(target)
            }
        };
        Ok(ProjectionMemberDecl { name, body })
    })
}

// =============================================================================
// Services
// =============================================================================

fn service_group(input: &mut Input<'_>) -> IResult<ServiceGroupDecl> {
    let start = token(Token::Service).parse_next(input)?;
    commit(input, |input| {
        let class_name = identifier(input)?;
        token(Token::LeftBrace).parse_next(input)?;
        let urls: Vec<UrlDecl> = repeat(0.., url).parse_next(input)?;
        let end = token(Token::RightBrace).parse_next(input)?;
        Ok(ServiceGroupDecl {
            class_name,
            urls,
            span: start.union(end),
        })
    })
}

/// Parse a URL pattern followed by its verb blocks
///
/// Path segments must touch the `/` before them, so `/question/{id: Long[1..1]}`
/// is one URL.
fn url(input: &mut Input<'_>) -> IResult<UrlDecl> {
    let first_slash = token(Token::Slash).parse_next(input)?;
    commit(input, |input| {
        let (segment, mut end) = url_segment(input, first_slash)?;
        let mut segments = vec![segment];
        while peek_is(input, &Token::Slash) {
            let slash = token(Token::Slash).parse_next(input)?;
            let (segment, segment_end) = url_segment(input, slash)?;
            segments.push(segment);
            end = segment_end;
        }

        let mut query = Vec::new();
        if opt(token(Token::Question)).parse_next(input)?.is_some() {
            loop {
                token(Token::LeftBrace).parse_next(input)?;
                query.push(parameter(input)?);
                end = token(Token::RightBrace).parse_next(input)?;
                if opt(token(Token::Ampersand)).parse_next(input)?.is_none() {
                    break;
                }
            }
        }

        let services: Vec<ServiceDecl> = repeat(1.., service).parse_next(input)?;
        Ok(UrlDecl {
            segments,
            query,
            services,
            span: first_slash.union(end),
        })
    })
}

fn url_segment(input: &mut Input<'_>, slash: Span) -> IResult<(UrlSegmentDecl, Span)> {
    let remaining = input.eof_offset();
    if !peek_nth(input, 0).is_some_and(|next| next.span.start() == slash.end()) {
        return Err(expected(
            Context::Label("URL segment directly after `/`"),
            remaining,
        ));
    }
    if peek_is(input, &Token::LeftBrace) {
        token(Token::LeftBrace).parse_next(input)?;
        let parameter = parameter(input)?;
        let end = token(Token::RightBrace).parse_next(input)?;
        Ok((UrlSegmentDecl::Parameter(parameter), end))
    } else {
        let constant = word(input)?;
        let end = constant.span();
        Ok((UrlSegmentDecl::Constant(constant), end))
    }
}

/// Parse `GET { entries }`
fn service(input: &mut Input<'_>) -> IResult<ServiceDecl> {
    let verb = from_keyword::<Verb>("verb").parse_next(input)?;
    commit(input, |input| {
        token(Token::LeftBrace).parse_next(input)?;
        let mut multiplicity = None;
        let mut projection = None;
        let mut order_by = None;
        let mut criteria = Vec::new();
        let end = loop {
            match peek(input) {
                Some(Token::RightBrace) => break token(Token::RightBrace).parse_next(input)?,
                Some(Token::Identifier("multiplicity")) if multiplicity.is_none() => {
                    keyword("multiplicity").parse_next(input)?;
                    token(Token::Colon).parse_next(input)?;
                    multiplicity = Some(
                        from_keyword::<ServiceMultiplicity>("`one` or `many`")
                            .parse_next(input)?,
                    );
                    token(Token::Semicolon).parse_next(input)?;
                }
                Some(Token::Projection) if projection.is_none() => {
                    token(Token::Projection).parse_next(input)?;
                    token(Token::Colon).parse_next(input)?;
                    projection = Some(identifier(input)?);
                    token(Token::Semicolon).parse_next(input)?;
                }
                Some(Token::OrderBy) if order_by.is_none() => {
                    order_by = Some(order_by_clause(input)?);
                    token(Token::Semicolon).parse_next(input)?;
                }
                _ => criteria.push(service_criteria(input)?),
            }
        };
        Ok(ServiceDecl {
            span: verb.span().union(end),
            verb,
            multiplicity,
            criteria,
            projection,
            order_by,
        })
    })
}

/// Parse `criteria: this.id == id;`
fn service_criteria(input: &mut Input<'_>) -> IResult<ServiceCriteriaDecl> {
    let keyword = from_keyword::<CriteriaKeyword>("service entry").parse_next(input)?;
    commit(input, |input| {
        token(Token::Colon).parse_next(input)?;
        let criteria = criteria(input)?;
        token(Token::Semicolon).parse_next(input)?;
        Ok(ServiceCriteriaDecl { keyword, criteria })
    })
}

// =============================================================================
// Entry points
// =============================================================================

fn convert_error(
    error: ErrMode<ContextError<Context>>,
    tokens: &[PositionedToken<'_>],
    current_remaining: usize,
) -> Diagnostic {
    let error = match error {
        ErrMode::Backtrack(e) | ErrMode::Cut(e) => e,
        // Streaming input is never used.
        ErrMode::Incomplete(_) => ContextError::new(),
    };

    let remaining = error
        .context()
        .find_map(|ctx| match ctx {
            Context::Remaining(n) => Some(*n),
            _ => None,
        })
        .unwrap_or(current_remaining)
        .min(tokens.len());
    let expectation = error.context().find_map(|ctx| match ctx {
        Context::Label(label) => Some((*label).to_string()),
        Context::Keyword(word) => Some(format!("`{word}`")),
        Context::Remaining(_) => None,
    });

    match tokens.get(tokens.len() - remaining) {
        Some(found) => {
            let message = match &expectation {
                Some(expectation) => {
                    format!("unexpected token `{}`, expected {expectation}", found.token)
                }
                None => format!("unexpected token `{}`", found.token),
            };
            Diagnostic::annotation(AnnotationCode::ErrSynTok, message)
                .with_label(found.span, "unexpected token")
        }
        None => {
            let end = tokens.last().map_or(0, |last| last.span.end());
            let message = match &expectation {
                Some(expectation) => format!("unexpected end of input, expected {expectation}"),
                None => "unexpected end of input".to_string(),
            };
            Diagnostic::annotation(AnnotationCode::ErrSynEof, message)
                .with_label(Span::new(end..end), "input ends here")
        }
    }
}

fn parse_significant<O>(
    tokens: &[PositionedToken<'_>],
    parser: fn(&mut Input<'_>) -> IResult<O>,
) -> Result<O, Diagnostic> {
    let significant: Vec<PositionedToken<'_>> = tokens
        .iter()
        .filter(|positioned| !positioned.token.is_trivia())
        .cloned()
        .collect();
    let mut token_slice: Input<'_> = TokenSlice::new(&significant);

    match parser(&mut token_slice) {
        Ok(output) => Ok(output),
        Err(e) => {
            let current_remaining = token_slice.eof_offset();
            Err(convert_error(e, &significant, current_remaining))
        }
    }
}

fn members_only(input: &mut Input<'_>) -> IResult<Vec<MemberDecl>> {
    let members: Vec<MemberDecl> = repeat(0.., member).parse_next(input)?;
    end_of_input("member").parse_next(input)?;
    Ok(members)
}

fn service_criteria_only(input: &mut Input<'_>) -> IResult<Vec<ServiceCriteriaDecl>> {
    let criteria: Vec<ServiceCriteriaDecl> = repeat(0.., service_criteria).parse_next(input)?;
    end_of_input("service criteria").parse_next(input)?;
    Ok(criteria)
}

/// Parse the tokens of a whole compilation unit.
pub fn build_source_file(tokens: &[PositionedToken<'_>]) -> Result<SourceFile, Diagnostic> {
    parse_significant(tokens, source_file)
}

/// Parse a sequence of classifier members.
pub fn build_members(tokens: &[PositionedToken<'_>]) -> Result<Vec<MemberDecl>, Diagnostic> {
    parse_significant(tokens, members_only)
}

/// Parse a sequence of service criteria entries.
pub fn build_service_criteria(
    tokens: &[PositionedToken<'_>],
) -> Result<Vec<ServiceCriteriaDecl>, Diagnostic> {
    parse_significant(tokens, service_criteria_only)
}
