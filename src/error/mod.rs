//! Error types for every phase of the pipeline: lexing, parsing, compiling,
//! and executing.

use thiserror::Error;

/// Errors raised while scanning source text into tokens.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum LexError {
    #[error("unexpected character '{0}' at line {1}")]
    UnexpectedChar(char, usize),

    #[error("unterminated string at line {0}")]
    UnterminatedString(usize),

    #[error("invalid escape sequence '\\{0}' at line {1}")]
    InvalidEscape(char, usize),

    #[error("invalid number literal '{0}' at line {1}")]
    InvalidNumber(String, usize),
}

/// Errors raised while parsing a token stream into an AST.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ParseError {
    #[error("expected {expected}, found {found} at line {line}")]
    UnexpectedToken {
        expected: String,
        found: String,
        line: usize,
    },

    #[error("unexpected end of input at line {0}")]
    UnexpectedEof(usize),

    #[error("no prefix parse function for {0} at line {1}")]
    NoPrefixParseFn(String, usize),

    #[error("{message} at line {line}")]
    General { message: String, line: usize },
}

impl From<LexError> for ParseError {
    fn from(err: LexError) -> Self {
        ParseError::General {
            message: err.to_string(),
            line: 0,
        }
    }
}

/// Errors raised while lowering an AST into bytecode.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CompileError {
    #[error("undefined variable '{0}'")]
    UndefinedVariable(String),

    #[error("unknown operator '{0}'")]
    UnknownOperator(String),

    #[error("cannot import '{0}': {1}")]
    ImportFailed(String, String),

    #[error("{0}")]
    General(String),
}

impl CompileError {
    pub fn undefined_variable(name: impl Into<String>) -> Self {
        Self::UndefinedVariable(name.into())
    }

    pub fn unknown_operator(op: impl Into<String>) -> Self {
        Self::UnknownOperator(op.into())
    }

    pub fn general(message: impl Into<String>) -> Self {
        Self::General(message.into())
    }
}

/// Errors raised by the virtual machine while executing bytecode.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum RuntimeError {
    #[error("unsupported types for binary operation: {0} {1}")]
    UnsupportedBinaryTypes(String, String),

    #[error("unsupported operand type for {0}: {1}")]
    UnsupportedUnaryType(String, String),

    #[error("unknown comparison operator")]
    UnknownComparison,

    #[error("index operator not supported: {0}")]
    IndexNotSupported(String),

    #[error("unusable as hash key: {0}")]
    UnusableHashKey(String),

    #[error("calling non-function and non-built-in")]
    NotCallable,

    #[error("wrong number of arguments: want={want}, got={got}")]
    WrongArgumentCount { want: usize, got: usize },

    #[error("bad constant reference at index {0}")]
    BadConstantIndex(u16),

    #[error("stack overflow")]
    StackOverflow,

    #[error("call stack overflow")]
    CallStackOverflow,

    #[error("{0}")]
    General(String),
}

impl RuntimeError {
    pub fn general(message: impl Into<String>) -> Self {
        Self::General(message.into())
    }
}

/// A unified error type for the whole pipeline.
#[derive(Debug, Error)]
pub enum RivetError {
    #[error("lex error: {0}")]
    Lex(#[from] LexError),

    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("compile error: {0}")]
    Compile(#[from] CompileError),

    #[error("runtime error: {0}")]
    Runtime(#[from] RuntimeError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
