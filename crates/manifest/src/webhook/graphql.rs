//! Lexer and parser for the executable subset of GraphQL used by
//! subscription queries.

use std::ops::Range;

use logos::Logos;

// ---------------------------------------------------------------------------
// Tokens
// ---------------------------------------------------------------------------

#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
#[logos(skip r"([ \t\r\n\f,]+|#[^\r\n]*)")]
pub(crate) enum Token<'src> {
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token(":")]
    Colon,
    #[token("=")]
    Equals,
    #[token("!")]
    Bang,
    #[token("$")]
    Dollar,
    #[token("@")]
    At,
    #[token("...")]
    Spread,
    #[regex(r"[_A-Za-z][_0-9A-Za-z]*", |lex| lex.slice())]
    Name(&'src str),
    #[regex(r"-?(0|[1-9][0-9]*)(\.[0-9]+)?([eE][+-]?[0-9]+)?", |lex| lex.slice())]
    Number(&'src str),
    #[regex(r#""([^"\\\r\n]|\\.)*""#, |lex| lex.slice())]
    Str(&'src str),
}

fn describe(token: Option<&Token<'_>>) -> String {
    match token {
        None => "<EOF>".to_string(),
        Some(Token::LBrace) => "\"{\"".to_string(),
        Some(Token::RBrace) => "\"}\"".to_string(),
        Some(Token::LParen) => "\"(\"".to_string(),
        Some(Token::RParen) => "\")\"".to_string(),
        Some(Token::LBracket) => "\"[\"".to_string(),
        Some(Token::RBracket) => "\"]\"".to_string(),
        Some(Token::Colon) => "\":\"".to_string(),
        Some(Token::Equals) => "\"=\"".to_string(),
        Some(Token::Bang) => "\"!\"".to_string(),
        Some(Token::Dollar) => "\"$\"".to_string(),
        Some(Token::At) => "\"@\"".to_string(),
        Some(Token::Spread) => "\"...\"".to_string(),
        Some(Token::Name(name)) => format!("Name \"{name}\""),
        Some(Token::Number(number)) => format!("Number \"{number}\""),
        Some(Token::Str(value)) => format!("String {value}"),
    }
}

// ---------------------------------------------------------------------------
// Syntax tree
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum OperationKind {
    Query,
    Mutation,
    Subscription,
}

#[derive(Debug, Clone)]
pub(crate) struct Operation {
    pub(crate) kind: OperationKind,
    pub(crate) selections: Vec<Selection>,
}

#[derive(Debug, Clone)]
pub(crate) struct Fragment {
    pub(crate) name: String,
    pub(crate) type_condition: String,
    pub(crate) selections: Vec<Selection>,
}

#[derive(Debug, Clone)]
pub(crate) enum Selection {
    Field {
        name: String,
        selections: Vec<Selection>,
    },
    FragmentSpread(String),
    InlineFragment {
        type_condition: Option<String>,
        selections: Vec<Selection>,
    },
}

#[derive(Debug, Clone, Default)]
pub(crate) struct Document {
    pub(crate) operations: Vec<Operation>,
    pub(crate) fragments: Vec<Fragment>,
}

// ---------------------------------------------------------------------------
// Parser
// ---------------------------------------------------------------------------

/// Deepest nesting of selection sets, values and types the parser accepts.
pub(crate) const MAX_DEPTH: usize = 128;
pub(crate) const TOO_DEEP: &str = "Query is too deeply nested.";

pub(crate) struct DocumentParser<'src> {
    tokens: Vec<(Token<'src>, Range<usize>)>,
    index: usize,
    depth: usize,
}

impl<'src> DocumentParser<'src> {
    /// Parses `source` into a [`Document`]; errors carry a syntax message.
    pub(crate) fn parse(source: &'src str) -> Result<Document, String> {
        let mut tokens = Vec::new();
        let mut lexer = Token::lexer(source);
        while let Some(token) = lexer.next() {
            match token {
                Ok(token) => tokens.push((token, lexer.span())),
                Err(()) => {
                    let span = lexer.span();
                    return Err(format!(
                        "Unexpected character \"{}\" at offset {}.",
                        lexer.slice(),
                        span.start
                    ));
                }
            }
        }
        if tokens.is_empty() {
            return Err("Unexpected <EOF>.".to_string());
        }

        let mut parser = Self {
            tokens,
            index: 0,
            depth: 0,
        };
        let mut document = Document::default();
        while !parser.is_end() {
            parser.parse_definition(&mut document)?;
        }
        Ok(document)
    }

    fn parse_definition(&mut self, document: &mut Document) -> Result<(), String> {
        match self.peek() {
            Some(Token::LBrace) => {
                let selections = self.parse_selection_set()?;
                document.operations.push(Operation {
                    kind: OperationKind::Query,
                    selections,
                });
                Ok(())
            }
            Some(Token::Name("query")) => self.parse_operation(OperationKind::Query, document),
            Some(Token::Name("mutation")) => {
                self.parse_operation(OperationKind::Mutation, document)
            }
            Some(Token::Name("subscription")) => {
                self.parse_operation(OperationKind::Subscription, document)
            }
            Some(Token::Name("fragment")) => {
                self.index += 1;
                let fragment = self.parse_fragment_definition()?;
                document.fragments.push(fragment);
                Ok(())
            }
            other => Err(self.unexpected(other.copied())),
        }
    }

    fn parse_operation(
        &mut self,
        kind: OperationKind,
        document: &mut Document,
    ) -> Result<(), String> {
        self.index += 1;
        if matches!(self.peek(), Some(Token::Name(_))) {
            self.index += 1;
        }
        if self.consume(Token::LParen) {
            self.parse_variable_definitions()?;
        }
        self.parse_directives()?;
        let selections = self.parse_selection_set()?;
        document.operations.push(Operation { kind, selections });
        Ok(())
    }

    fn parse_fragment_definition(&mut self) -> Result<Fragment, String> {
        let name = self.expect_name()?;
        if name == "on" {
            return Err("Unexpected Name \"on\".".to_string());
        }
        self.expect_keyword("on")?;
        let type_condition = self.expect_name()?;
        self.parse_directives()?;
        let selections = self.parse_selection_set()?;
        Ok(Fragment {
            name,
            type_condition,
            selections,
        })
    }

    fn parse_variable_definitions(&mut self) -> Result<(), String> {
        loop {
            self.expect(Token::Dollar, "\"$\"")?;
            self.expect_name()?;
            self.expect(Token::Colon, "\":\"")?;
            self.parse_type()?;
            if self.consume(Token::Equals) {
                self.parse_value()?;
            }
            self.parse_directives()?;
            if self.consume(Token::RParen) {
                return Ok(());
            }
        }
    }

    fn parse_type(&mut self) -> Result<(), String> {
        self.nested(|parser| {
            if parser.consume(Token::LBracket) {
                parser.parse_type()?;
                parser.expect(Token::RBracket, "\"]\"")?;
            } else {
                parser.expect_name()?;
            }
            parser.consume(Token::Bang);
            Ok(())
        })
    }

    fn parse_directives(&mut self) -> Result<(), String> {
        while self.consume(Token::At) {
            self.expect_name()?;
            if self.consume(Token::LParen) {
                self.parse_arguments()?;
            }
        }
        Ok(())
    }

    /// Arguments after the opening parenthesis.
    fn parse_arguments(&mut self) -> Result<(), String> {
        loop {
            self.expect_name()?;
            self.expect(Token::Colon, "\":\"")?;
            self.parse_value()?;
            if self.consume(Token::RParen) {
                return Ok(());
            }
        }
    }

    fn parse_value(&mut self) -> Result<(), String> {
        self.nested(Self::parse_value_at_depth)
    }

    fn parse_value_at_depth(&mut self) -> Result<(), String> {
        match self.next() {
            Some(Token::Dollar) => self.expect_name().map(|_| ()),
            Some(Token::Number(_) | Token::Str(_) | Token::Name(_)) => Ok(()),
            Some(Token::LBracket) => {
                while !self.consume(Token::RBracket) {
                    if self.is_end() {
                        return Err(self.unexpected(None));
                    }
                    self.parse_value()?;
                }
                Ok(())
            }
            Some(Token::LBrace) => {
                while !self.consume(Token::RBrace) {
                    self.expect_name()?;
                    self.expect(Token::Colon, "\":\"")?;
                    self.parse_value()?;
                }
                Ok(())
            }
            other => {
                self.index = self.index.saturating_sub(usize::from(other.is_some()));
                Err(self.unexpected(other))
            }
        }
    }

    fn parse_selection_set(&mut self) -> Result<Vec<Selection>, String> {
        self.nested(|parser| {
            parser.expect(Token::LBrace, "\"{\"")?;
            let mut selections = Vec::new();
            loop {
                selections.push(parser.parse_selection()?);
                if parser.consume(Token::RBrace) {
                    return Ok(selections);
                }
            }
        })
    }

    /// Runs `parse` one level deeper, failing past [`MAX_DEPTH`].
    fn nested<T>(
        &mut self,
        parse: impl FnOnce(&mut Self) -> Result<T, String>,
    ) -> Result<T, String> {
        if self.depth >= MAX_DEPTH {
            return Err(TOO_DEEP.to_string());
        }
        self.depth += 1;
        let result = parse(self);
        self.depth -= 1;
        result
    }

    fn parse_selection(&mut self) -> Result<Selection, String> {
        if self.consume(Token::Spread) {
            return match self.peek() {
                Some(Token::Name("on")) => {
                    self.index += 1;
                    let type_condition = self.expect_name()?;
                    self.parse_directives()?;
                    Ok(Selection::InlineFragment {
                        type_condition: Some(type_condition),
                        selections: self.parse_selection_set()?,
                    })
                }
                Some(Token::Name(name)) => {
                    let name = name.to_string();
                    self.index += 1;
                    self.parse_directives()?;
                    Ok(Selection::FragmentSpread(name))
                }
                _ => {
                    self.parse_directives()?;
                    Ok(Selection::InlineFragment {
                        type_condition: None,
                        selections: self.parse_selection_set()?,
                    })
                }
            };
        }

        let mut name = self.expect_name()?;
        if self.consume(Token::Colon) {
            name = self.expect_name()?;
        }
        if self.consume(Token::LParen) {
            self.parse_arguments()?;
        }
        self.parse_directives()?;
        let selections = if matches!(self.peek(), Some(Token::LBrace)) {
            self.parse_selection_set()?
        } else {
            Vec::new()
        };
        Ok(Selection::Field { name, selections })
    }

    fn expect_name(&mut self) -> Result<String, String> {
        match self.peek() {
            Some(Token::Name(name)) => {
                let name = name.to_string();
                self.index += 1;
                Ok(name)
            }
            other => Err(self.expected("Name", other.copied())),
        }
    }

    fn expect_keyword(&mut self, keyword: &str) -> Result<(), String> {
        match self.peek() {
            Some(Token::Name(name)) if *name == keyword => {
                self.index += 1;
                Ok(())
            }
            other => Err(self.expected(&format!("\"{keyword}\""), other.copied())),
        }
    }

    fn expect(&mut self, token: Token<'src>, label: &str) -> Result<(), String> {
        if self.consume(token) {
            Ok(())
        } else {
            Err(self.expected(label, self.peek().copied()))
        }
    }

    fn consume(&mut self, token: Token<'src>) -> bool {
        matches!(self.peek(), Some(found) if *found == token) && {
            self.index += 1;
            true
        }
    }

    fn expected(&self, label: &str, found: Option<Token<'_>>) -> String {
        format!("Expected {label}, found {}.", describe(found.as_ref()))
    }

    fn unexpected(&self, found: Option<Token<'_>>) -> String {
        format!("Unexpected {}.", describe(found.as_ref()))
    }

    fn is_end(&self) -> bool {
        self.index >= self.tokens.len()
    }

    fn peek(&self) -> Option<&Token<'src>> {
        self.tokens.get(self.index).map(|(token, _)| token)
    }

    fn next(&mut self) -> Option<Token<'src>> {
        let token = self.peek().copied();
        if token.is_some() {
            self.index += 1;
        }
        token
    }
}
