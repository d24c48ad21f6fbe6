//! Parser for raw object class and attribute type descriptions.
//!
//! Directory servers publish schema elements in the RFC 4512 description
//! format, for example:
//!
//! ```text
//! ( 2.5.6.6 NAME 'person' SUP top STRUCTURAL MUST ( sn $ cn ) MAY description )
//! ```
//!
//! The input is first split into tokens (parentheses, `$` separators, quoted
//! strings and bare words). Clause keywords are recognized only when a bare
//! word equals the keyword, so identifiers that merely contain one (such as
//! `supportedAlgorithms` or `mayContact`) are never mistaken for a clause
//! boundary.
//!
//! Parsing never fails. Malformed input yields the best-effort definition
//! together with [`ParseWarning`]s describing what was skipped or repaired.

use std::fmt;

use nom::{
    branch::alt,
    bytes::complete::{take_till, take_till1},
    character::complete::{char, multispace0},
    combinator::{map, rest, value},
    multi::many0,
    sequence::{delimited, preceded},
    IResult,
};

use super::entities::{AttributeTypeDefinition, AttributeUsage, ClassKind, ObjectClassDefinition};

/// A definition together with the diagnostics collected while parsing it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Parsed<T> {
    pub definition: T,
    pub warnings: Vec<ParseWarning>,
}

impl<T> Parsed<T> {
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }
}

/// Recoverable problems found in a raw description.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ParseWarning {
    /// The description did not start with `(`.
    MissingOpeningParenthesis,
    /// The outer `(` was never closed.
    UnclosedDescription,
    /// A parenthesized list was interrupted by a clause keyword or the end of input.
    UnclosedList { keyword: String },
    /// A quoted string was never terminated.
    UnterminatedQuote { text: String },
    /// A clause keyword was not followed by the value it requires.
    MissingValue { keyword: String },
    /// A token appeared where a clause keyword was expected.
    UnexpectedToken { token: String },
    /// Tokens followed the closing `)` of the description.
    TrailingInput { token: String },
}

impl fmt::Display for ParseWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingOpeningParenthesis => write!(f, "description does not start with `(`"),
            Self::UnclosedDescription => write!(f, "description is missing its closing `)`"),
            Self::UnclosedList { keyword } => write!(f, "list after `{keyword}` is not closed"),
            Self::UnterminatedQuote { text } => write!(f, "unterminated quote `'{text}`"),
            Self::MissingValue { keyword } => write!(f, "`{keyword}` has no value"),
            Self::UnexpectedToken { token } => write!(f, "unexpected token `{token}`"),
            Self::TrailingInput { token } => {
                write!(f, "unexpected `{token}` after the closing `)`")
            }
        }
    }
}

/// Parses an object class description.
#[must_use]
pub fn parse_object_class(raw: &str) -> Parsed<ObjectClassDefinition> {
    let Parsed {
        definition: description,
        warnings,
    } = parse_description(raw);

    let mut definition = ObjectClassDefinition::new("")
        .with_names(description.names)
        .with_obsolete(description.obsolete)
        .with_superiors(description.superiors)
        .with_required(description.must)
        .with_optional(description.may);
    if let Some(oid) = description.oid {
        definition = definition.with_oid(oid);
    }
    if let Some(text) = description.desc {
        definition = definition.with_description(text);
    }
    if let Some(kind) = description.kind {
        definition = definition.with_kind(kind);
    }

    Parsed {
        definition,
        warnings,
    }
}

/// Parses an attribute type description.
#[must_use]
pub fn parse_attribute_type(raw: &str) -> Parsed<AttributeTypeDefinition> {
    let Parsed {
        definition: description,
        mut warnings,
    } = parse_description(raw);

    let mut definition = AttributeTypeDefinition::new("")
        .with_names(description.names)
        .with_obsolete(description.obsolete)
        .with_single_value(description.single_value)
        .with_collective(description.collective)
        .with_user_modifiable(!description.no_user_modification);
    if let Some(oid) = description.oid {
        definition = definition.with_oid(oid);
    }
    if let Some(text) = description.desc {
        definition = definition.with_description(text);
    }
    if let Some(superior) = description.superiors.into_iter().next() {
        definition = definition.with_superior(superior);
    }
    if let Some(rule) = description.equality {
        definition = definition.with_equality(rule);
    }
    if let Some(rule) = description.ordering {
        definition = definition.with_ordering(rule);
    }
    if let Some(rule) = description.substr {
        definition = definition.with_substring(rule);
    }
    if let Some(syntax) = description.syntax {
        definition = definition.with_syntax(syntax);
    }
    if let Some(usage) = description.usage {
        match AttributeUsage::parse(&usage) {
            Some(usage) => definition = definition.with_usage(usage),
            None => warnings.push(ParseWarning::UnexpectedToken { token: usage }),
        }
    }

    Parsed {
        definition,
        warnings,
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum Token<'a> {
    Open,
    Close,
    Dollar,
    Quoted(&'a str),
    Unterminated(&'a str),
    Word(&'a str),
}

impl Token<'_> {
    fn text(&self) -> String {
        match self {
            Self::Open => "(".into(),
            Self::Close => ")".into(),
            Self::Dollar => "$".into(),
            Self::Quoted(text) => format!("'{text}'"),
            Self::Unterminated(text) => format!("'{text}"),
            Self::Word(text) => (*text).to_string(),
        }
    }
}

fn quoted(input: &str) -> IResult<&str, Token<'_>> {
    map(
        delimited(char('\''), take_till(|c| c == '\''), char('\'')),
        Token::Quoted,
    )(input)
}

fn unterminated(input: &str) -> IResult<&str, Token<'_>> {
    map(preceded(char('\''), rest), Token::Unterminated)(input)
}

fn word(input: &str) -> IResult<&str, Token<'_>> {
    map(
        take_till1(|c: char| c.is_whitespace() || matches!(c, '(' | ')' | '$' | '\'')),
        Token::Word,
    )(input)
}

fn token(input: &str) -> IResult<&str, Token<'_>> {
    alt((
        value(Token::Open, char('(')),
        value(Token::Close, char(')')),
        value(Token::Dollar, char('$')),
        quoted,
        unterminated,
        word,
    ))(input)
}

fn tokenize(input: &str) -> Vec<Token<'_>> {
    // every non-whitespace character starts some token, so this consumes
    // everything but trailing whitespace
    many0(preceded(multispace0, token))(input).map_or_else(|_| Vec::new(), |(_, tokens)| tokens)
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Keyword {
    Name,
    Desc,
    Obsolete,
    Sup,
    Abstract,
    Structural,
    Auxiliary,
    Must,
    May,
    Equality,
    Ordering,
    Substr,
    Syntax,
    SingleValue,
    Collective,
    NoUserModification,
    Usage,
    Extension,
}

impl Keyword {
    fn recognize(word: &str) -> Option<Self> {
        let upper = word.to_ascii_uppercase();
        let keyword = match upper.as_str() {
            "NAME" => Self::Name,
            "DESC" => Self::Desc,
            "OBSOLETE" => Self::Obsolete,
            "SUP" => Self::Sup,
            "ABSTRACT" => Self::Abstract,
            "STRUCTURAL" => Self::Structural,
            "AUXILIARY" => Self::Auxiliary,
            "MUST" => Self::Must,
            "MAY" => Self::May,
            "EQUALITY" => Self::Equality,
            "ORDERING" => Self::Ordering,
            "SUBSTR" => Self::Substr,
            "SYNTAX" => Self::Syntax,
            "SINGLE-VALUE" => Self::SingleValue,
            "COLLECTIVE" => Self::Collective,
            "NO-USER-MODIFICATION" => Self::NoUserModification,
            "USAGE" => Self::Usage,
            _ if upper.starts_with("X-") => Self::Extension,
            _ => return None,
        };
        Some(keyword)
    }

    fn takes_argument(self) -> bool {
        !matches!(
            self,
            Self::Obsolete
                | Self::Abstract
                | Self::Structural
                | Self::Auxiliary
                | Self::SingleValue
                | Self::Collective
                | Self::NoUserModification
        )
    }
}

/// Clauses common to object class and attribute type descriptions.
#[derive(Debug, Default)]
struct Description {
    oid: Option<String>,
    names: Vec<String>,
    desc: Option<String>,
    obsolete: bool,
    superiors: Vec<String>,
    kind: Option<ClassKind>,
    must: Vec<String>,
    may: Vec<String>,
    equality: Option<String>,
    ordering: Option<String>,
    substr: Option<String>,
    syntax: Option<String>,
    usage: Option<String>,
    single_value: bool,
    collective: bool,
    no_user_modification: bool,
}

struct Scanner<'a> {
    tokens: Vec<Token<'a>>,
    position: usize,
    warnings: Vec<ParseWarning>,
}

impl<'a> Scanner<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            tokens: tokenize(input),
            position: 0,
            warnings: Vec::new(),
        }
    }

    fn peek(&self) -> Option<&Token<'a>> {
        self.tokens.get(self.position)
    }

    fn next(&mut self) -> Option<Token<'a>> {
        let token = self.tokens.get(self.position).cloned();
        if token.is_some() {
            self.position += 1;
        }
        token
    }

    /// Whether the token `offset` places ahead could be the argument of a
    /// clause keyword.
    fn argument_at(&self, offset: usize) -> bool {
        match self.tokens.get(self.position + offset) {
            Some(Token::Word(word)) => Keyword::recognize(word).is_none(),
            Some(Token::Quoted(_) | Token::Unterminated(_) | Token::Open) => true,
            _ => false,
        }
    }

    /// Whether the next word starts a new clause rather than being a value
    /// that happens to spell a keyword, such as the `name` attribute.
    ///
    /// A keyword taking an argument only starts a clause when an argument
    /// follows it. Flag keywords start one when `flags` is set.
    fn opens_clause(&self, flags: bool) -> bool {
        let Some(Token::Word(word)) = self.peek() else {
            return false;
        };
        match Keyword::recognize(word) {
            Some(keyword) if keyword.takes_argument() => self.argument_at(1),
            Some(_) => flags,
            None => false,
        }
    }

    fn warn(&mut self, warning: ParseWarning) {
        self.warnings.push(warning);
    }

    /// Reads one string value, quoted or bare.
    fn single(&mut self, keyword: &str) -> Option<String> {
        if self.opens_clause(false) {
            self.warn(ParseWarning::MissingValue {
                keyword: keyword.to_string(),
            });
            return None;
        }
        match self.peek() {
            Some(Token::Quoted(text) | Token::Unterminated(text) | Token::Word(text)) => {
                let text = (*text).to_string();
                if let Some(Token::Unterminated(_)) = self.next() {
                    self.warn(ParseWarning::UnterminatedQuote { text: text.clone() });
                }
                Some(text)
            }
            _ => {
                self.warn(ParseWarning::MissingValue {
                    keyword: keyword.to_string(),
                });
                None
            }
        }
    }

    /// Reads a single value or a parenthesized list of values. `$`
    /// separators are accepted anywhere inside the list.
    ///
    /// Right after `(` or `$` the next word is always a value. After a value,
    /// a keyword followed by its argument means the list was never closed.
    fn list(&mut self, keyword: &str) -> Vec<String> {
        if !matches!(self.peek(), Some(Token::Open)) {
            return self.single(keyword).into_iter().collect();
        }
        self.position += 1;

        let mut values = Vec::new();
        let mut expecting_value = true;
        loop {
            if !expecting_value && self.opens_clause(true) {
                self.warn(ParseWarning::UnclosedList {
                    keyword: keyword.to_string(),
                });
                break;
            }
            match self.next() {
                Some(Token::Close) => break,
                Some(Token::Dollar) => expecting_value = true,
                Some(Token::Word(text) | Token::Quoted(text)) => {
                    values.push(text.to_string());
                    expecting_value = false;
                }
                Some(Token::Unterminated(text)) => {
                    self.warn(ParseWarning::UnterminatedQuote {
                        text: text.to_string(),
                    });
                    values.push(text.to_string());
                    expecting_value = false;
                }
                Some(Token::Open) => self.warn(ParseWarning::UnexpectedToken { token: "(".into() }),
                None => {
                    self.warn(ParseWarning::UnclosedList {
                        keyword: keyword.to_string(),
                    });
                    break;
                }
            }
        }
        values
    }

    fn description(mut self) -> Parsed<Description> {
        let mut description = Description::default();

        if matches!(self.peek(), Some(Token::Open)) {
            self.position += 1;
        } else {
            self.warn(ParseWarning::MissingOpeningParenthesis);
        }

        if let Some(Token::Word(oid)) = self.peek() {
            if Keyword::recognize(oid).is_none() {
                description.oid = Some((*oid).to_string());
                self.position += 1;
            }
        }

        let mut closed = false;
        while let Some(token) = self.next() {
            let word = match token {
                Token::Close => {
                    closed = true;
                    break;
                }
                Token::Word(word) => word,
                other => {
                    self.warn(ParseWarning::UnexpectedToken {
                        token: other.text(),
                    });
                    continue;
                }
            };
            let Some(keyword) = Keyword::recognize(word) else {
                self.warn(ParseWarning::UnexpectedToken {
                    token: word.to_string(),
                });
                continue;
            };

            match keyword {
                Keyword::Name => description.names.extend(self.list(word)),
                Keyword::Desc => description.desc = self.single(word),
                Keyword::Obsolete => description.obsolete = true,
                Keyword::Sup => description.superiors.extend(self.list(word)),
                Keyword::Abstract => description.kind = Some(ClassKind::Abstract),
                Keyword::Structural => description.kind = Some(ClassKind::Structural),
                Keyword::Auxiliary => description.kind = Some(ClassKind::Auxiliary),
                Keyword::Must => description.must.extend(self.list(word)),
                Keyword::May => description.may.extend(self.list(word)),
                Keyword::Equality => description.equality = self.single(word),
                Keyword::Ordering => description.ordering = self.single(word),
                Keyword::Substr => description.substr = self.single(word),
                Keyword::Syntax => description.syntax = self.single(word),
                Keyword::Usage => description.usage = self.single(word),
                Keyword::SingleValue => description.single_value = true,
                Keyword::Collective => description.collective = true,
                Keyword::NoUserModification => description.no_user_modification = true,
                Keyword::Extension => {
                    let _ = self.list(word);
                }
            }
        }

        if closed {
            if let Some(token) = self.peek() {
                let token = token.text();
                self.warn(ParseWarning::TrailingInput { token });
            }
        } else {
            self.warn(ParseWarning::UnclosedDescription);
        }

        Parsed {
            definition: description,
            warnings: self.warnings,
        }
    }
}

fn parse_description(raw: &str) -> Parsed<Description> {
    Scanner::new(raw).description()
}
