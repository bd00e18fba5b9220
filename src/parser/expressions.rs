//! Expression parsing using Pratt (precedence-climbing) parsing.

use crate::ast::{Expr, InfixOp, PrefixOp};
use crate::error::ParseError;
use crate::lexer::TokenKind;

use super::core::{ParseResult, Parser};
use super::precedence::{precedence_of, Precedence};

impl Parser {
    pub(crate) fn parse_expression(&mut self, precedence: Precedence) -> ParseResult<Expr> {
        let mut left = self.parse_prefix()?;

        while !self.check(&TokenKind::Semicolon) && precedence < precedence_of(self.peek_kind()) {
            left = match self.peek_kind() {
                TokenKind::Plus
                | TokenKind::Minus
                | TokenKind::Star
                | TokenKind::Slash
                | TokenKind::Lt
                | TokenKind::Gt
                | TokenKind::Eq
                | TokenKind::NotEq => self.parse_infix(left)?,
                TokenKind::LParen => self.parse_call(left)?,
                TokenKind::LBracket => self.parse_index(left)?,
                _ => break,
            };
        }

        Ok(left)
    }

    fn parse_prefix(&mut self) -> ParseResult<Expr> {
        match self.peek_kind().clone() {
            TokenKind::Int(n) => {
                self.advance();
                Ok(Expr::IntegerLiteral(n))
            }
            TokenKind::Float(n) => {
                self.advance();
                Ok(Expr::FloatLiteral(n))
            }
            TokenKind::Str(s) => {
                self.advance();
                Ok(Expr::StringLiteral(s))
            }
            TokenKind::True => {
                self.advance();
                Ok(Expr::BooleanLiteral(true))
            }
            TokenKind::False => {
                self.advance();
                Ok(Expr::BooleanLiteral(false))
            }
            TokenKind::Null => {
                self.advance();
                Ok(Expr::NullLiteral)
            }
            TokenKind::Ident(name) => {
                self.advance();
                Ok(Expr::IdentifierLiteral(name))
            }
            TokenKind::Minus => {
                self.advance();
                let right = self.parse_expression(Precedence::Prefix)?;
                Ok(Expr::Prefix {
                    operator: PrefixOp::Minus,
                    right: Box::new(right),
                })
            }
            TokenKind::Bang => {
                self.advance();
                let right = self.parse_expression(Precedence::Prefix)?;
                Ok(Expr::Prefix {
                    operator: PrefixOp::Bang,
                    right: Box::new(right),
                })
            }
            TokenKind::LParen => self.parse_grouped(),
            TokenKind::LBracket => self.parse_array_literal(),
            TokenKind::LBrace => self.parse_hash_literal(),
            TokenKind::If => self.parse_if_expression(),
            TokenKind::Fn => self.parse_function_literal(),
            other => Err(ParseError::NoPrefixParseFn(
                other.to_string(),
                self.current_line(),
            )),
        }
    }

    fn parse_grouped(&mut self) -> ParseResult<Expr> {
        self.expect(TokenKind::LParen)?;
        let expr = self.parse_expression(Precedence::Lowest)?;
        self.expect(TokenKind::RParen)?;
        Ok(expr)
    }

    fn parse_infix(&mut self, left: Expr) -> ParseResult<Expr> {
        let op_token = self.advance();
        let operator = match &op_token.kind {
            TokenKind::Plus => InfixOp::Add,
            TokenKind::Minus => InfixOp::Sub,
            TokenKind::Star => InfixOp::Mul,
            TokenKind::Slash => InfixOp::Div,
            TokenKind::Lt => InfixOp::Lt,
            TokenKind::Gt => InfixOp::Gt,
            TokenKind::Eq => InfixOp::Eq,
            TokenKind::NotEq => InfixOp::NotEq,
            other => {
                return Err(ParseError::General {
                    message: format!("unknown infix operator {other}"),
                    line: op_token.line,
                })
            }
        };
        let precedence = precedence_of(&op_token.kind);
        let right = self.parse_expression(precedence)?;
        Ok(Expr::Infix {
            left: Box::new(left),
            operator,
            right: Box::new(right),
        })
    }

    fn parse_call(&mut self, function: Expr) -> ParseResult<Expr> {
        self.expect(TokenKind::LParen)?;
        let arguments = self.parse_expression_list(TokenKind::RParen)?;
        Ok(Expr::Call {
            function: Box::new(function),
            arguments,
        })
    }

    fn parse_index(&mut self, left: Expr) -> ParseResult<Expr> {
        self.expect(TokenKind::LBracket)?;
        let index = self.parse_expression(Precedence::Lowest)?;
        self.expect(TokenKind::RBracket)?;
        Ok(Expr::Index {
            left: Box::new(left),
            index: Box::new(index),
        })
    }

    fn parse_expression_list(&mut self, end: TokenKind) -> ParseResult<Vec<Expr>> {
        let mut list = Vec::new();
        if self.check(&end) {
            self.advance();
            return Ok(list);
        }
        list.push(self.parse_expression(Precedence::Lowest)?);
        while self.match_token(&TokenKind::Comma) {
            list.push(self.parse_expression(Precedence::Lowest)?);
        }
        self.expect(end)?;
        Ok(list)
    }

    fn parse_array_literal(&mut self) -> ParseResult<Expr> {
        self.expect(TokenKind::LBracket)?;
        let elements = self.parse_expression_list(TokenKind::RBracket)?;
        Ok(Expr::ArrayLiteral(elements))
    }

    fn parse_hash_literal(&mut self) -> ParseResult<Expr> {
        self.expect(TokenKind::LBrace)?;
        let mut pairs = Vec::new();
        while !self.check(&TokenKind::RBrace) {
            let key = self.parse_expression(Precedence::Lowest)?;
            self.expect(TokenKind::Colon)?;
            let value = self.parse_expression(Precedence::Lowest)?;
            pairs.push((key, value));
            if !self.match_token(&TokenKind::Comma) {
                break;
            }
        }
        self.expect(TokenKind::RBrace)?;
        Ok(Expr::HashLiteral(pairs))
    }

    fn parse_if_expression(&mut self) -> ParseResult<Expr> {
        self.expect(TokenKind::If)?;
        self.expect(TokenKind::LParen)?;
        let condition = self.parse_expression(Precedence::Lowest)?;
        self.expect(TokenKind::RParen)?;
        let consequence = self.parse_block_statement()?;
        let alternative = if self.match_token(&TokenKind::Else) {
            Some(self.parse_block_statement()?)
        } else {
            None
        };
        Ok(Expr::If {
            condition: Box::new(condition),
            consequence,
            alternative,
        })
    }

    fn parse_function_literal(&mut self) -> ParseResult<Expr> {
        self.expect(TokenKind::Fn)?;
        let name = if let TokenKind::Ident(n) = self.peek_kind().clone() {
            self.advance();
            Some(n)
        } else {
            None
        };
        self.expect(TokenKind::LParen)?;
        let parameters = self.parse_function_parameters()?;
        let body = self.parse_block_statement()?;
        Ok(Expr::FunctionLiteral {
            parameters,
            body,
            name,
        })
    }

    fn parse_function_parameters(&mut self) -> ParseResult<Vec<String>> {
        let mut params = Vec::new();
        if self.check(&TokenKind::RParen) {
            self.advance();
            return Ok(params);
        }
        params.push(self.expect_identifier()?);
        while self.match_token(&TokenKind::Comma) {
            params.push(self.expect_identifier()?);
        }
        self.expect(TokenKind::RParen)?;
        Ok(params)
    }
}
