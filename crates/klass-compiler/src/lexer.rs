//! Lexical analyzer for Klass source text.
//!
//! The lexer converts source text into a stream of [`Token`]s for parsing.
//! It handles whitespace, both comment styles, string and number literals,
//! reserved words, identifiers and operators.
//!
//! The public entry point is [`tokenize`], which performs error-recovering
//! lexical analysis and collects all diagnostics in a single pass.

use winnow::{
    Parser as _,
    ascii::digit1,
    combinator::{alt, cut_err, opt, preceded, repeat, terminated},
    error::{AddContext, ContextError, ErrMode, ModalResult},
    stream::{LocatingSlice, Location, Stream},
    token::{literal, none_of, one_of, take_until, take_while},
};

use crate::{
    error::{AnnotationCode, Diagnostic, DiagnosticCollector, ParseError},
    span::Span,
    tokens::{PositionedToken, Token},
};

/// Rich diagnostic information for lexer errors.
///
/// Attached to winnow errors via `.context()` to provide detailed error
/// messages with codes, help text, and precise span information.
#[derive(Debug, Clone, PartialEq, Eq)]
struct LexerDiagnostic {
    pub code: AnnotationCode,
    pub message: &'static str,
    pub help: Option<&'static str>,
    /// The error span covers from `start` to the error position.
    pub start: usize,
}

type Input<'a> = LocatingSlice<&'a str>;
type IResult<'a, O> = ModalResult<O, ContextError<LexerDiagnostic>>;

fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Build a committed error carrying `diagnostic`, positioned at the input's
/// current location.
fn cut_with(
    input: &Input<'_>,
    diagnostic: LexerDiagnostic,
) -> ErrMode<ContextError<LexerDiagnostic>> {
    ErrMode::Cut(ContextError::new().add_context(input, &input.checkpoint(), diagnostic))
}

/// Parse an escape sequence in a string starting with backslash.
///
/// Handles `\n`, `\r`, `\t`, `\\`, `\"` and `\'`.
fn string_escape<'a>(input: &mut Input<'a>) -> IResult<'a, char> {
    let escape_start = input.current_token_start();

    let escaped: IResult<'a, Option<char>> = preceded(
        '\\',
        opt(one_of(['n', 'r', 't', '\\', '"', '\''])),
    )
    .parse_next(input);
    match escaped? {
        Some('n') => Ok('\n'),
        Some('r') => Ok('\r'),
        Some('t') => Ok('\t'),
        Some(c) => Ok(c),
        None => Err(cut_with(
            input,
            LexerDiagnostic {
                code: AnnotationCode::ErrLexEsc,
                message: "invalid escape sequence",
                help: Some("valid escapes: `\\n`, `\\r`, `\\t`, `\\\\`, `\\\"`, `\\'`"),
                start: escape_start,
            },
        )),
    }
}

/// Parse a complete string literal with double quotes.
///
/// Strings may not span lines.
fn string_literal<'a>(input: &mut Input<'a>) -> IResult<'a, Token<'a>> {
    let string_char = none_of(['"', '\\', '\n', '\r']);

    let string_content = repeat(0.., alt((string_escape, string_char))).fold(
        String::new,
        |mut acc, ch| {
            acc.push(ch);
            acc
        },
    );

    let start_pos = input.current_token_start();

    // Committed after the opening quote; the span runs from the quote to the
    // error position.
    preceded(
        '"',
        cut_err(terminated(string_content, '"')).context(LexerDiagnostic {
            code: AnnotationCode::ErrLexStr,
            message: "unterminated string literal",
            help: Some("add closing `\"` before the end of the line"),
            start: start_pos,
        }),
    )
    .map(Token::StringLiteral)
    .parse_next(input)
}

/// Parse an integer or decimal number, optionally negative.
///
/// `1..2` lexes as an integer followed by `..`, so a decimal point must be
/// followed by a digit.
fn number_literal<'a>(input: &mut Input<'a>) -> IResult<'a, Token<'a>> {
    let start_pos = input.current_token_start();

    let text: IResult<'a, &'a str> = (opt('-'), digit1, opt(('.', digit1)))
        .take()
        .parse_next(input);
    let text = text?;

    if input.chars().next().is_some_and(is_word_char) {
        let rest: IResult<'a, &'a str> = take_while(0.., is_word_char).parse_next(input);
        rest?;
        return Err(cut_with(
            input,
            LexerDiagnostic {
                code: AnnotationCode::ErrLexNum,
                message: "invalid number literal",
                help: Some("separate the number from the following word"),
                start: start_pos,
            },
        ));
    }

    let token = if text.contains('.') {
        text.parse().ok().map(Token::FloatLiteral)
    } else {
        text.parse().ok().map(Token::IntegerLiteral)
    };

    token.ok_or_else(|| {
        cut_with(
            input,
            LexerDiagnostic {
                code: AnnotationCode::ErrLexNum,
                message: "number literal out of range",
                help: Some("integer literals must fit in 64 bits"),
                start: start_pos,
            },
        )
    })
}

/// Parse line comment starting with '//'
fn line_comment<'a>(input: &mut Input<'a>) -> IResult<'a, Token<'a>> {
    preceded("//", take_while(0.., |c| c != '\n'))
        .map(Token::LineComment)
        .parse_next(input)
}

/// Parse block comment `/* ... */`; block comments do not nest.
fn block_comment<'a>(input: &mut Input<'a>) -> IResult<'a, Token<'a>> {
    let start_pos = input.current_token_start();

    preceded(
        "/*",
        cut_err(terminated(take_until(0.., "*/"), "*/")).context(LexerDiagnostic {
            code: AnnotationCode::ErrLexChr,
            message: "unterminated block comment",
            help: Some("add closing `*/`"),
            start: start_pos,
        }),
    )
    .map(Token::BlockComment)
    .parse_next(input)
}

/// Parse an identifier or reserved word.
fn word<'a>(input: &mut Input<'a>) -> IResult<'a, Token<'a>> {
    take_while(1.., is_word_char)
        .verify(|s: &str| {
            s.chars()
                .next()
                .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        })
        .map(|s| match s {
            "package" => Token::Package,
            "enumeration" => Token::Enumeration,
            "class" => Token::Class,
            "user" => Token::User,
            "interface" => Token::Interface,
            "association" => Token::Association,
            "projection" => Token::Projection,
            "service" => Token::Service,
            "relationship" => Token::Relationship,
            "extends" => Token::Extends,
            "implements" => Token::Implements,
            "on" => Token::On,
            "orderBy" => Token::OrderBy,
            "this" => Token::This,
            "null" => Token::Null,
            "true" => Token::True,
            "false" => Token::False,
            _ => Token::Identifier(s),
        })
        .parse_next(input)
}

/// Parse multi-character operators
fn multi_char_operator<'a>(input: &mut Input<'a>) -> IResult<'a, Token<'a>> {
    alt((
        literal("==").value(Token::EqualsEquals),
        literal("!=").value(Token::NotEquals),
        literal("<=").value(Token::LessEquals),
        literal(">=").value(Token::GreaterEquals),
        literal("&&").value(Token::AndAnd),
        literal("||").value(Token::OrOr),
        literal("..").value(Token::DotDot),
    ))
    .parse_next(input)
}

/// Parse single character tokens
fn single_char_token<'a>(input: &mut Input<'a>) -> IResult<'a, Token<'a>> {
    alt((
        alt((
            '<'.value(Token::Less),
            '>'.value(Token::Greater),
            '.'.value(Token::Dot),
            ':'.value(Token::Colon),
            ';'.value(Token::Semicolon),
            ','.value(Token::Comma),
            '?'.value(Token::Question),
            '*'.value(Token::Star),
        )),
        alt((
            '/'.value(Token::Slash),
            '&'.value(Token::Ampersand),
            '{'.value(Token::LeftBrace),
            '}'.value(Token::RightBrace),
            '['.value(Token::LeftBracket),
            ']'.value(Token::RightBracket),
            '('.value(Token::LeftParen),
            ')'.value(Token::RightParen),
        )),
    ))
    .parse_next(input)
}

/// Parse whitespace (spaces, tabs, etc. but not newlines)
fn whitespace<'a>(input: &mut Input<'a>) -> IResult<'a, Token<'a>> {
    take_while(1.., |c: char| c.is_whitespace() && c != '\n')
        .value(Token::Whitespace)
        .parse_next(input)
}

/// Parse newline
fn newline<'a>(input: &mut Input<'a>) -> IResult<'a, Token<'a>> {
    '\n'.value(Token::Newline).parse_next(input)
}

/// Parse a single token with position tracking
fn positioned_token<'a>(input: &mut Input<'a>) -> IResult<'a, PositionedToken<'a>> {
    let start_pos = input.current_token_start();

    let token = alt((
        line_comment,        // Must come before single char '/'
        block_comment,       // Must come before single char '/'
        string_literal,      // Must come before any single char
        number_literal,      // Must come before '.' and '..'
        multi_char_operator, // Must come before single char operators
        word,                // Reserved words and identifiers
        single_char_token,   // Single character tokens
        newline,             // Must come before whitespace
        whitespace,          // General whitespace
    ))
    .parse_next(input)?;

    let end_pos = input.current_token_start();
    let span = Span::new(start_pos..end_pos);

    Ok(PositionedToken::new(token, span))
}

/// Lexer that accumulates tokens and diagnostics during tokenization.
struct Lexer<'a> {
    tokens: Vec<PositionedToken<'a>>,
    diagnostics: DiagnosticCollector,
}

impl<'a> Lexer<'a> {
    /// Create a new lexer.
    fn new() -> Self {
        Self {
            tokens: Vec::new(),
            diagnostics: DiagnosticCollector::new(),
        }
    }

    /// Tokenize the input, collecting tokens and errors.
    fn tokenize(&mut self, mut input: Input<'a>) {
        while !input.is_empty() {
            match positioned_token(&mut input) {
                Ok(token) => {
                    self.tokens.push(token);
                }
                Err(e) => {
                    let error_pos = input.current_token_start();
                    let width = input.chars().next().map_or(1, char::len_utf8);

                    let diagnostic = Self::convert_err_mode(e, error_pos, width);
                    let code = diagnostic.code();
                    self.diagnostics.emit(diagnostic);

                    Self::recover(&mut input, code);
                }
            }
        }
    }

    /// Skip past the text that caused an error.
    ///
    /// A bad escape abandons the rest of its string so the closing quote
    /// does not open a new, unterminated one.
    fn recover(input: &mut Input<'a>, code: Option<AnnotationCode>) {
        if code == Some(AnnotationCode::ErrLexEsc) {
            while let Some(c) = input.chars().next() {
                if c == '\n' {
                    return;
                }
                input.next_token();
                if c == '"' {
                    return;
                }
            }
        } else if !input.is_empty() {
            input.next_token();
        }
    }

    /// Finish lexing and return tokens or collected errors.
    fn finish(self) -> Result<Vec<PositionedToken<'a>>, ParseError> {
        self.diagnostics.finish().map(|()| self.tokens)
    }

    /// Convert an ErrMode and error position to a Diagnostic.
    ///
    /// Extracts `LexerDiagnostic` from the error context for rich error info
    /// with code, message, and help. Falls back to ERR_LEX_CHR (unexpected
    /// character) if no diagnostic context is found.
    fn convert_err_mode(
        err: ErrMode<ContextError<LexerDiagnostic>>,
        error_pos: usize,
        width: usize,
    ) -> Diagnostic {
        let context_error = match err {
            ErrMode::Backtrack(ctx) | ErrMode::Cut(ctx) => ctx,
            ErrMode::Incomplete(_) => ContextError::new(),
        };

        if let Some(LexerDiagnostic {
            code,
            message,
            help,
            start,
        }) = context_error.context().next()
        {
            let span = Span::new(*start..error_pos.max(*start + 1));

            let mut diag = Diagnostic::error(*message)
                .with_code(*code)
                .with_label(span, code.description());
            if let Some(h) = help {
                diag = diag.with_help(*h);
            }
            return diag;
        }

        let span = Span::new(error_pos..error_pos.saturating_add(width));
        Diagnostic::error("unexpected character")
            .with_code(AnnotationCode::ErrLexChr)
            .with_label(span, AnnotationCode::ErrLexChr.description())
    }
}

/// Tokenize source text, collecting multiple errors.
///
/// Attempts to recover from errors and continue tokenizing, collecting
/// all errors encountered.
///
/// # Returns
///
/// - `Ok(tokens)` - All tokens successfully lexed
/// - `Err(ParseError)` - One or more errors occurred; contains all diagnostics
pub fn tokenize(input: &str) -> Result<Vec<PositionedToken<'_>>, ParseError> {
    let located_input = LocatingSlice::new(input);
    let mut lexer = Lexer::new();
    lexer.tokenize(located_input);
    lexer.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_single_token(input: &str, expected: Token<'_>) {
        let mut located_input = LocatingSlice::new(input);
        let result = positioned_token(&mut located_input);
        assert!(result.is_ok(), "Failed to lex: {}", input);
        let positioned = result.unwrap();
        assert_eq!(positioned.token, expected);
    }

    fn significant(input: &str) -> Vec<Token<'_>> {
        tokenize(input)
            .expect("Should tokenize")
            .into_iter()
            .map(|positioned| positioned.token)
            .filter(|token| !token.is_trivia())
            .collect()
    }

    fn error_codes(input: &str) -> Vec<AnnotationCode> {
        tokenize(input)
            .expect_err("Should fail")
            .diagnostics()
            .iter()
            .filter_map(|diagnostic| diagnostic.code())
            .collect()
    }

    #[test]
    fn test_reserved_words() {
        test_single_token("package", Token::Package);
        test_single_token("enumeration", Token::Enumeration);
        test_single_token("class", Token::Class);
        test_single_token("user", Token::User);
        test_single_token("interface", Token::Interface);
        test_single_token("association", Token::Association);
        test_single_token("projection", Token::Projection);
        test_single_token("service", Token::Service);
        test_single_token("relationship", Token::Relationship);
        test_single_token("extends", Token::Extends);
        test_single_token("implements", Token::Implements);
        test_single_token("on", Token::On);
        test_single_token("orderBy", Token::OrderBy);
        test_single_token("this", Token::This);
        test_single_token("null", Token::Null);
        test_single_token("true", Token::True);
        test_single_token("false", Token::False);
    }

    #[test]
    fn test_reserved_word_boundaries() {
        test_single_token("classes", Token::Identifier("classes"));
        test_single_token("userId", Token::Identifier("userId"));
        test_single_token("online", Token::Identifier("online"));
        test_single_token("version", Token::Identifier("version"));
        test_single_token("_hidden", Token::Identifier("_hidden"));
    }

    #[test]
    fn test_operators() {
        test_single_token("==", Token::EqualsEquals);
        test_single_token("!=", Token::NotEquals);
        test_single_token("<=", Token::LessEquals);
        test_single_token(">=", Token::GreaterEquals);
        test_single_token("<", Token::Less);
        test_single_token(">", Token::Greater);
        test_single_token("&&", Token::AndAnd);
        test_single_token("||", Token::OrOr);
        test_single_token("..", Token::DotDot);
    }

    #[test]
    fn test_punctuation() {
        test_single_token("{", Token::LeftBrace);
        test_single_token("}", Token::RightBrace);
        test_single_token("[", Token::LeftBracket);
        test_single_token("]", Token::RightBracket);
        test_single_token("(", Token::LeftParen);
        test_single_token(")", Token::RightParen);
        test_single_token(";", Token::Semicolon);
        test_single_token(",", Token::Comma);
        test_single_token("?", Token::Question);
        test_single_token("/", Token::Slash);
        test_single_token("&", Token::Ampersand);
    }

    #[test]
    fn test_numbers() {
        test_single_token("42", Token::IntegerLiteral(42));
        test_single_token("-7", Token::IntegerLiteral(-7));
        test_single_token("2.5", Token::FloatLiteral(2.5));
        test_single_token("-0.25", Token::FloatLiteral(-0.25));
    }

    #[test]
    fn test_multiplicity_is_not_a_float() {
        assert_eq!(
            significant("[0..*]"),
            vec![
                Token::LeftBracket,
                Token::IntegerLiteral(0),
                Token::DotDot,
                Token::Star,
                Token::RightBracket,
            ]
        );
        assert_eq!(
            significant("[1..1]"),
            vec![
                Token::LeftBracket,
                Token::IntegerLiteral(1),
                Token::DotDot,
                Token::IntegerLiteral(1),
                Token::RightBracket,
            ]
        );
    }

    #[test]
    fn test_string_literals() {
        test_single_token("\"Open\"", Token::StringLiteral("Open".to_string()));
        test_single_token("\"\"", Token::StringLiteral(String::new()));
        test_single_token(
            "\"say \\\"hi\\\"\\n\"",
            Token::StringLiteral("say \"hi\"\n".to_string()),
        );
    }

    #[test]
    fn test_comments() {
        let tokens = significant("// line\nclass /* block\nspanning */ Question");
        assert_eq!(tokens, vec![Token::Class, Token::Identifier("Question")]);
    }

    #[test]
    fn test_path_tokens() {
        assert_eq!(
            significant("this.version.number"),
            vec![
                Token::This,
                Token::Dot,
                Token::Identifier("version"),
                Token::Dot,
                Token::Identifier("number"),
            ]
        );
    }

    #[test]
    fn test_spans() {
        let tokens = tokenize("class Question").unwrap();
        assert_eq!(tokens[0].span, Span::new(0..5));
        assert_eq!(tokens[2].span, Span::new(6..14));
    }

    #[test]
    fn test_unexpected_character() {
        assert_eq!(error_codes("class # Question"), vec![AnnotationCode::ErrLexChr]);
    }

    #[test]
    fn test_unterminated_string() {
        let err = tokenize("title: \"Title\n").unwrap_err();
        let diagnostic = &err.diagnostics()[0];
        assert_eq!(diagnostic.code(), Some(AnnotationCode::ErrLexStr));
        assert_eq!(diagnostic.primary_span(), Some(Span::new(7..13)));
    }

    #[test]
    fn test_invalid_escape_does_not_cascade() {
        assert_eq!(error_codes("\"a\\qb\" x"), vec![AnnotationCode::ErrLexEsc]);
    }

    #[test]
    fn test_invalid_numbers() {
        assert_eq!(error_codes("12abc"), vec![AnnotationCode::ErrLexNum]);
        assert_eq!(
            error_codes("99999999999999999999"),
            vec![AnnotationCode::ErrLexNum]
        );
    }

    #[test]
    fn test_unterminated_block_comment() {
        assert_eq!(error_codes("/* never closed"), vec![AnnotationCode::ErrLexChr]);
    }

    #[test]
    fn test_collects_multiple_errors() {
        assert_eq!(
            error_codes("# $"),
            vec![AnnotationCode::ErrLexChr, AnnotationCode::ErrLexChr]
        );
    }

    mod proptest_tests {
        use proptest::prelude::*;

        use super::*;

        // =====================================================================
        // Strategies
        // =====================================================================

        fn klass_like_text() -> impl Strategy<Value = String> {
            proptest::collection::vec(
                prop_oneof![
                    Just("class ".to_string()),
                    Just("this.id".to_string()),
                    Just("[0..*]".to_string()),
                    Just("\"text\"".to_string()),
                    Just("// note\n".to_string()),
                    "[a-zA-Z0-9_ .:;,{}()\\[\\]<>=!&|*/?\"\\\\#-]{0,8}",
                ],
                0..24,
            )
            .prop_map(|parts| parts.concat())
        }

        // =====================================================================
        // Property Test Functions
        // =====================================================================

        fn check_tokenize_never_panics(input: &str) -> Result<(), TestCaseError> {
            match tokenize(input) {
                Ok(tokens) => {
                    for token in &tokens {
                        prop_assert!(token.span.end() <= input.len());
                    }
                }
                Err(err) => prop_assert!(!err.diagnostics().is_empty()),
            }
            Ok(())
        }

        fn check_spans_are_contiguous(input: &str) -> Result<(), TestCaseError> {
            if let Ok(tokens) = tokenize(input) {
                let mut expected_start = 0;
                for token in &tokens {
                    prop_assert_eq!(token.span.start(), expected_start);
                    expected_start = token.span.end();
                }
                prop_assert_eq!(expected_start, input.len());
            }
            Ok(())
        }

        // =====================================================================
        // Proptest Wrappers
        // =====================================================================

        proptest! {
            #[test]
            fn tokenize_never_panics(input in "\\PC{0,64}") {
                check_tokenize_never_panics(&input)?;
            }

            #[test]
            fn tokenize_klass_like_never_panics(input in klass_like_text()) {
                check_tokenize_never_panics(&input)?;
            }

            #[test]
            fn spans_are_contiguous(input in klass_like_text()) {
                check_spans_are_contiguous(&input)?;
            }
        }
    }
}
