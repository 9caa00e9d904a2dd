//! Parsing of GLSL function definitions (for function-derived node kinds) and validation of
//! constant literal text.

use pest::error::LineColLocation;

use super::{graph::Name, sockets::SocketType};

use std::{fmt::Display, str::FromStr};

use {
    pest::{iterators::Pair, Parser},
    pest_derive::Parser,
};

/// Parsing result.
pub type PResult<T> = Result<T, self::Error>;

#[derive(Debug, Clone, PartialEq)]
/// Parsing failure with its location in the source text.
pub struct Error {
    kind: ErrorKind,
    line: LineColLocation,
}

impl Error {
    fn new(kind: ErrorKind, line: LineColLocation) -> Self {
        Self { kind, line }
    }

    /// What went wrong.
    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    /// Where it went wrong.
    pub fn line(&self) -> &LineColLocation {
        &self.line
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.line {
            LineColLocation::Pos((line, col)) => write!(f, "{} at {line}:{col}", self.kind),
            LineColLocation::Span((line, col), (end_line, end_col)) => {
                write!(f, "{} at {line}:{col} -> {end_line}:{end_col}", self.kind)
            }
        }
    }
}

impl std::error::Error for Error {}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[allow(missing_docs)]
pub enum ErrorKind {
    #[error("{0}")]
    Parsing(Box<pest::error::Error<Rule>>),
    #[error("{error} in {section:?}")]
    Code { error: CodeError, section: Section },
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[allow(missing_docs)]
pub enum CodeError {
    #[error("Redefinition of `{0}`")]
    Redefinition(String),
    #[error("Expected {expected} components, got {got}")]
    Arity { expected: u8, got: usize },
    #[error("No socket type has dimension {0}")]
    UnsupportedDimension(u8),
    #[error("Malformed {0}")]
    Malformed(String),
}

#[derive(Debug, Clone, PartialEq)]
#[allow(missing_docs)]
pub enum Section {
    Signature,
    Parameters,
    Literal,
}

#[derive(Parser)]
#[grammar = "lib/pest/grammar.pest"]
struct SParser;

fn parsing_error(err: pest::error::Error<Rule>) -> Error {
    let line = err.line_col.clone();
    Error::new(ErrorKind::Parsing(Box::new(err)), line)
}

fn lcl_from_pair(pair: &Pair<Rule>) -> LineColLocation {
    let (start, end) = pair.as_span().split();
    LineColLocation::Span(start.line_col(), end.line_col())
}

fn malformed(what: impl Into<String>, section: Section, line: LineColLocation) -> Error {
    Error::new(
        ErrorKind::Code {
            error: CodeError::Malformed(what.into()),
            section,
        },
        line,
    )
}

#[derive(Debug, Clone, PartialEq)]
/// Signature and full source of a GLSL function definition.
pub struct Function {
    /// Type of the returned value.
    pub return_type: SocketType,
    /// Function name.
    pub name: String,
    /// Parameters in declaration order.
    pub parameters: Vec<(Name, SocketType)>,
    /// Trimmed definition text, signature and body included.
    pub source: String,
}

/// Parse a GLSL function definition whose return and parameter types are all socket types.
pub fn parse_function(source: &str) -> PResult<Function> {
    let mut pairs = SParser::parse(Rule::function, source).map_err(parsing_error)?;

    let Some(function) = pairs.next() else {
        return Err(malformed(
            "function definition",
            Section::Signature,
            LineColLocation::Pos((1, 1)),
        ));
    };
    let location = lcl_from_pair(&function);
    let mut inner = function.into_inner();

    let (Some(return_type), Some(name), Some(parameters)) = (inner.next(), inner.next(), inner.next())
    else {
        return Err(malformed("function signature", Section::Signature, location));
    };

    Ok(Function {
        return_type: parse_type(&return_type, Section::Signature)?,
        name: name.as_str().to_owned(),
        parameters: parse_parameters(parameters)?,
        source: source.trim().to_owned(),
    })
}

fn parse_type(pair: &Pair<Rule>, section: Section) -> PResult<SocketType> {
    SocketType::from_str(pair.as_str()).map_err(|err| malformed(err, section, lcl_from_pair(pair)))
}

fn parse_parameters(parameters: Pair<Rule>) -> PResult<Vec<(Name, SocketType)>> {
    let mut res: Vec<(Name, SocketType)> = Vec::new();

    for parameter in parameters.into_inner() {
        let location = lcl_from_pair(&parameter);

        // Qualifiers carry no type information.
        let mut inner = parameter
            .into_inner()
            .filter(|pair| pair.as_rule() != Rule::qualifier);

        let (Some(r#type), Some(name)) = (inner.next(), inner.next()) else {
            return Err(malformed("parameter", Section::Parameters, location));
        };

        let name = Name::from(name.as_str());

        if res.iter().any(|(existing, _)| existing == &name) {
            return Err(Error::new(
                ErrorKind::Code {
                    error: CodeError::Redefinition(name.to_string()),
                    section: Section::Parameters,
                },
                location,
            ));
        }

        res.push((name, parse_type(&r#type, Section::Parameters)?));
    }

    Ok(res)
}

/// Validate constant literal text: `dimension` comma-separated signed decimal numbers. A
/// single number must have a fractional part so it reads as a GLSL `float`.
///
/// Returns the individual components on success.
pub fn validate_literal(text: &str, dimension: u8) -> PResult<Vec<&str>> {
    if SocketType::from_dimension(dimension).is_none() {
        return Err(Error::new(
            ErrorKind::Code {
                error: CodeError::UnsupportedDimension(dimension),
                section: Section::Literal,
            },
            LineColLocation::Pos((1, 1)),
        ));
    }

    let rule = if dimension == 1 {
        Rule::scalar_literal
    } else {
        Rule::vector_literal
    };

    let literal = SParser::parse(rule, text)
        .map_err(parsing_error)?
        .next()
        .map(|pair| lcl_from_pair(&pair));

    let components: Vec<&str> = text.split(',').collect();

    if components.len() != dimension as usize {
        return Err(Error::new(
            ErrorKind::Code {
                error: CodeError::Arity {
                    expected: dimension,
                    got: components.len(),
                },
                section: Section::Literal,
            },
            literal.unwrap_or(LineColLocation::Pos((1, 1))),
        ));
    }

    Ok(components)
}
