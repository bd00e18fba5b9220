//! Expression AST nodes.
//!
//! This is the external contract the lexer/parser produce and the compiler
//! consumes — see the AST contract in the external interfaces section of
//! the design docs for the authoritative node list.

use crate::ast::stmt::BlockStatement;

/// An expression in the AST.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    IntegerLiteral(i64),
    FloatLiteral(f64),
    BooleanLiteral(bool),
    StringLiteral(String),
    NullLiteral,
    IdentifierLiteral(String),
    ArrayLiteral(Vec<Expr>),
    HashLiteral(Vec<(Expr, Expr)>),

    Prefix {
        operator: PrefixOp,
        right: Box<Expr>,
    },
    Infix {
        left: Box<Expr>,
        operator: InfixOp,
        right: Box<Expr>,
    },
    If {
        condition: Box<Expr>,
        consequence: BlockStatement,
        alternative: Option<BlockStatement>,
    },
    Index {
        left: Box<Expr>,
        index: Box<Expr>,
    },
    Call {
        function: Box<Expr>,
        arguments: Vec<Expr>,
    },
    FunctionLiteral {
        parameters: Vec<String>,
        body: BlockStatement,
        /// Name bound to this literal by an enclosing `let`, if any —
        /// enables self-recursion via `OpCurrentClosure`.
        name: Option<String>,
    },
}

/// Prefix (unary) operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrefixOp {
    Minus,
    Bang,
}

impl PrefixOp {
    pub fn as_str(self) -> &'static str {
        match self {
            PrefixOp::Minus => "-",
            PrefixOp::Bang => "!",
        }
    }
}

/// Infix (binary) operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InfixOp {
    Add,
    Sub,
    Mul,
    Div,
    Lt,
    Gt,
    Eq,
    NotEq,
}

impl InfixOp {
    pub fn as_str(self) -> &'static str {
        match self {
            InfixOp::Add => "+",
            InfixOp::Sub => "-",
            InfixOp::Mul => "*",
            InfixOp::Div => "/",
            InfixOp::Lt => "<",
            InfixOp::Gt => ">",
            InfixOp::Eq => "==",
            InfixOp::NotEq => "!=",
        }
    }

    pub fn from_str(s: &str) -> Option<InfixOp> {
        Some(match s {
            "+" => InfixOp::Add,
            "-" => InfixOp::Sub,
            "*" => InfixOp::Mul,
            "/" => InfixOp::Div,
            "<" => InfixOp::Lt,
            ">" => InfixOp::Gt,
            "==" => InfixOp::Eq,
            "!=" => InfixOp::NotEq,
            _ => return None,
        })
    }
}

impl std::fmt::Display for Expr {
    /// Renders source-like text, used only to produce a deterministic sort
    /// key for hash-literal keys at compile time.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Expr::IntegerLiteral(n) => write!(f, "{n}"),
            Expr::FloatLiteral(n) => write!(f, "{n}"),
            Expr::BooleanLiteral(b) => write!(f, "{b}"),
            Expr::StringLiteral(s) => write!(f, "\"{s}\""),
            Expr::NullLiteral => write!(f, "null"),
            Expr::IdentifierLiteral(name) => write!(f, "{name}"),
            Expr::ArrayLiteral(elems) => {
                write!(f, "[")?;
                for (i, e) in elems.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{e}")?;
                }
                write!(f, "]")
            }
            Expr::HashLiteral(pairs) => {
                write!(f, "{{")?;
                for (i, (k, v)) in pairs.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{k}: {v}")?;
                }
                write!(f, "}}")
            }
            Expr::Prefix { operator, right } => write!(f, "({}{})", operator.as_str(), right),
            Expr::Infix {
                left,
                operator,
                right,
            } => write!(f, "({} {} {})", left, operator.as_str(), right),
            Expr::If { condition, .. } => write!(f, "if ({condition}) {{ ... }}"),
            Expr::Index { left, index } => write!(f, "({left}[{index}])"),
            Expr::Call {
                function,
                arguments,
            } => {
                write!(f, "{function}(")?;
                for (i, a) in arguments.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{a}")?;
                }
                write!(f, ")")
            }
            Expr::FunctionLiteral {
                parameters, name, ..
            } => {
                write!(
                    f,
                    "fn {}({})",
                    name.as_deref().unwrap_or(""),
                    parameters.join(", ")
                )
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn infix_op_roundtrips_through_str() {
        for op in [
            InfixOp::Add,
            InfixOp::Sub,
            InfixOp::Mul,
            InfixOp::Div,
            InfixOp::Lt,
            InfixOp::Gt,
            InfixOp::Eq,
            InfixOp::NotEq,
        ] {
            assert_eq!(InfixOp::from_str(op.as_str()), Some(op));
        }
    }

    #[test]
    fn display_renders_stable_text_for_hash_key_sorting() {
        let a = Expr::IntegerLiteral(3);
        let b = Expr::StringLiteral("x".to_string());
        assert_eq!(a.to_string(), "3");
        assert_eq!(b.to_string(), "\"x\"");
    }
}
