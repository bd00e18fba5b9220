//! Statement parsing: let/assign, return, while, for, import, blocks.

use crate::ast::{BlockStatement, Expr, Stmt};
use crate::lexer::TokenKind;

use super::core::{ParseResult, Parser};
use super::precedence::Precedence;

impl Parser {
    pub(crate) fn parse_statement(&mut self) -> ParseResult<Stmt> {
        match self.peek_kind() {
            TokenKind::Let => self.parse_let_statement(),
            TokenKind::Return => self.parse_return_statement(),
            TokenKind::While => self.parse_while_statement(),
            TokenKind::For => self.parse_for_statement(),
            TokenKind::Import => self.parse_import_statement(),
            TokenKind::LBrace => Ok(Stmt::BlockStatement(self.parse_block_statement()?)),
            TokenKind::Ident(_) if self.next_is_assign() => self.parse_assign_statement(),
            _ => self.parse_expression_statement(),
        }
    }

    fn next_is_assign(&self) -> bool {
        matches!(self.tokens.get(self.current + 1).map(|t| &t.kind), Some(TokenKind::Assign))
    }

    fn parse_let_statement(&mut self) -> ParseResult<Stmt> {
        self.expect(TokenKind::Let)?;
        let name = self.expect_identifier()?;
        self.expect(TokenKind::Assign)?;
        let mut value = self.parse_expression(Precedence::Lowest)?;
        self.match_token(&TokenKind::Semicolon);
        // A `let`-bound function literal picks up the binding's name so the
        // compiler can resolve self-recursion via `OpCurrentClosure` instead
        // of a free-variable capture that's still unbound at closure-creation
        // time.
        if let Expr::FunctionLiteral { name: fn_name @ None, .. } = &mut value {
            *fn_name = Some(name.clone());
        }
        Ok(Stmt::LetStatement { name, value })
    }

    fn parse_assign_statement(&mut self) -> ParseResult<Stmt> {
        let ident = self.expect_identifier()?;
        self.expect(TokenKind::Assign)?;
        let right_value = self.parse_expression(Precedence::Lowest)?;
        self.match_token(&TokenKind::Semicolon);
        Ok(Stmt::AssignStatement { ident, right_value })
    }

    fn parse_return_statement(&mut self) -> ParseResult<Stmt> {
        self.expect(TokenKind::Return)?;
        let value = self.parse_expression(Precedence::Lowest)?;
        self.match_token(&TokenKind::Semicolon);
        Ok(Stmt::ReturnStatement(value))
    }

    fn parse_while_statement(&mut self) -> ParseResult<Stmt> {
        self.expect(TokenKind::While)?;
        self.expect(TokenKind::LParen)?;
        let condition = self.parse_expression(Precedence::Lowest)?;
        self.expect(TokenKind::RParen)?;
        let body = self.parse_block_statement()?;
        Ok(Stmt::WhileStatement { condition, body })
    }

    fn parse_for_statement(&mut self) -> ParseResult<Stmt> {
        self.expect(TokenKind::For)?;
        self.expect(TokenKind::LParen)?;
        let initializer = Box::new(self.parse_statement()?);
        let condition = self.parse_expression(Precedence::Lowest)?;
        self.expect(TokenKind::Semicolon)?;
        let increment = Box::new(self.parse_assign_statement()?);
        self.expect(TokenKind::RParen)?;
        let body = self.parse_block_statement()?;
        Ok(Stmt::ForStatement {
            initializer,
            condition,
            increment,
            body,
        })
    }

    fn parse_import_statement(&mut self) -> ParseResult<Stmt> {
        self.expect(TokenKind::Import)?;
        let file_path = match self.peek_kind().clone() {
            TokenKind::Str(s) => {
                self.advance();
                s
            }
            other => {
                return Err(crate::error::ParseError::UnexpectedToken {
                    expected: "string literal".to_string(),
                    found: other.to_string(),
                    line: self.current_line(),
                })
            }
        };
        self.match_token(&TokenKind::Semicolon);
        Ok(Stmt::ImportStatement { file_path })
    }

    pub(crate) fn parse_block_statement(&mut self) -> ParseResult<BlockStatement> {
        self.expect(TokenKind::LBrace)?;
        let mut statements = Vec::new();
        while !self.check(&TokenKind::RBrace) && !self.is_at_end() {
            statements.push(self.parse_statement()?);
        }
        self.expect(TokenKind::RBrace)?;
        Ok(statements)
    }

    fn parse_expression_statement(&mut self) -> ParseResult<Stmt> {
        let expr = self.parse_expression(Precedence::Lowest)?;
        self.match_token(&TokenKind::Semicolon);
        Ok(Stmt::ExpressionStatement(expr))
    }
}
