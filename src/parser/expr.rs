//! Precedence-climbing parser for iq programs.
//!
//! Grammar, loosest to tightest binding:
//!
//! ```text
//! program   := statement (';' statement)* ';'?
//! statement := expr clause*
//! clause    := 'as' IDENT | 'opacity' NUMBER | 'mode' IDENT | 'z' '-'? NUMBER
//! expr      := additive
//! additive  := multiplicative (('+' | '-') multiplicative)*     left-assoc
//! multiplicative := unary (('*' | '/') unary)*                  left-assoc
//! unary     := '-' unary | power
//! power     := primary ('**' unary)?                            right-assoc
//! primary   := NUMBER | COLOUR | IDENT | IDENT '(' args ')' | '(' expr ')'
//! ```
//!
//! `**` is the one right-associative operator; everything else at equal
//! precedence groups left. Parenthesized sub-expressions override
//! precedence. The clause keywords are contextual identifiers, not reserved
//! words.

use crate::error::{IqError, Result};
use crate::parser::ast::{BinaryOp, Expr, Program, Statement, UnaryOp};
use crate::parser::token::{Token, TokenKind};
use crate::types::BlendMode;

/// Upper bound on expression nesting; deeper programs fail instead of
/// overflowing the stack.
pub const MAX_EXPR_DEPTH: usize = 64;

/// Parse a token sequence (as produced by `tokens_from_program`) into a
/// program AST.
///
/// Token spans carry the positions used in error messages.
pub fn ast_from_tokens(tokens: &[Token]) -> Result<Program> {
    Parser::new(tokens).parse_program()
}

struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
    depth: usize,
}

impl<'a> Parser<'a> {
    fn new(tokens: &'a [Token]) -> Self {
        Self {
            tokens,
            pos: 0,
            depth: 0,
        }
    }

    fn peek(&self) -> &'a Token {
        let tokens = self.tokens;
        // The tokenizer guarantees a trailing Eof token.
        tokens.get(self.pos).unwrap_or(&tokens[tokens.len() - 1])
    }

    fn advance(&mut self) -> &'a Token {
        let tokens = self.tokens;
        let token = &tokens[self.pos.min(tokens.len() - 1)];
        if self.pos < tokens.len() - 1 {
            self.pos += 1;
        }
        token
    }

    fn error(&self, token: &Token, message: &str, help: Option<String>) -> IqError {
        let position = match token.kind {
            TokenKind::Eof => format!("at end of input (line {})", token.span.start.line),
            _ => format!("at {}", token.span.start),
        };
        IqError::Parse {
            message: format!("{} {}", message, position),
            help,
        }
    }

    fn unexpected(&self, expected: &str) -> IqError {
        let token = self.peek();
        self.error(
            token,
            &format!("expected {}, found {}", expected, token.describe()),
            None,
        )
    }

    fn parse_program(&mut self) -> Result<Program> {
        if self.peek().kind == TokenKind::Eof {
            return Err(IqError::Parse {
                message: "empty program".to_string(),
                help: Some(
                    "an iq program is one or more ';'-separated expressions, e.g. 'invert(input)'"
                        .to_string(),
                ),
            });
        }

        let mut statements = Vec::new();
        loop {
            statements.push(self.parse_statement()?);

            match self.peek().kind {
                TokenKind::Semi => {
                    self.advance();
                    if self.peek().kind == TokenKind::Eof {
                        break;
                    }
                }
                TokenKind::Eof => break,
                _ => return Err(self.unexpected("';' or end of input")),
            }
        }

        Ok(Program { statements })
    }

    fn parse_statement(&mut self) -> Result<Statement> {
        let expr = self.parse_expr(0)?;
        let mut statement = Statement::bare(expr);

        while let TokenKind::Ident = self.peek().kind {
            let keyword = self.peek().text.clone();
            match keyword.as_str() {
                "as" => {
                    let at = self.advance().clone();
                    if statement.name.is_some() {
                        return Err(self.error(&at, "duplicate 'as' clause", None));
                    }
                    statement.name = Some(self.expect_ident("a layer name after 'as'")?);
                }
                "opacity" => {
                    let at = self.advance().clone();
                    if statement.opacity.is_some() {
                        return Err(self.error(&at, "duplicate 'opacity' clause", None));
                    }
                    let value = self.expect_number("a number after 'opacity'")?;
                    if !(0.0..=1.0).contains(&value) {
                        return Err(self.error(
                            &at,
                            &format!("opacity {} is out of range", value),
                            Some("opacity must be between 0 and 1".to_string()),
                        ));
                    }
                    statement.opacity = Some(value);
                }
                "mode" => {
                    let at = self.advance().clone();
                    if statement.mode.is_some() {
                        return Err(self.error(&at, "duplicate 'mode' clause", None));
                    }
                    let name = self.expect_ident("a blend mode after 'mode'")?;
                    let mode = BlendMode::from_name(&name).ok_or_else(|| {
                        self.error(
                            &at,
                            &format!("unknown blend mode '{}'", name),
                            Some(format!("available modes: {}", BlendMode::NAMES.join(", "))),
                        )
                    })?;
                    statement.mode = Some(mode);
                }
                "z" => {
                    let at = self.advance().clone();
                    if statement.z.is_some() {
                        return Err(self.error(&at, "duplicate 'z' clause", None));
                    }
                    let negative = if self.peek().kind == TokenKind::Minus {
                        self.advance();
                        true
                    } else {
                        false
                    };
                    let value = self.expect_number("a number after 'z'")?;
                    if value.fract() != 0.0 {
                        return Err(self.error(
                            &at,
                            &format!("z index {} is not an integer", value),
                            None,
                        ));
                    }
                    let signed = if negative { -value } else { value };
                    statement.z = Some(signed as i32);
                }
                _ => break,
            }
        }

        Ok(statement)
    }

    fn expect_ident(&mut self, expected: &str) -> Result<String> {
        match self.peek().kind {
            TokenKind::Ident => Ok(self.advance().text.clone()),
            _ => Err(self.unexpected(expected)),
        }
    }

    fn expect_number(&mut self, expected: &str) -> Result<f64> {
        match self.peek().kind {
            TokenKind::Number(value) => {
                self.advance();
                Ok(value)
            }
            _ => Err(self.unexpected(expected)),
        }
    }

    /// Precedence climbing: consume operators whose left binding power is
    /// at least `min_bp`.
    fn parse_expr(&mut self, min_bp: u8) -> Result<Expr> {
        self.depth += 1;
        if self.depth > MAX_EXPR_DEPTH {
            return Err(IqError::ResourceLimit {
                message: format!("expression nesting exceeds {} levels", MAX_EXPR_DEPTH),
                help: Some("flatten the expression or split it across statements".to_string()),
            });
        }

        let mut lhs = self.parse_prefix()?;

        loop {
            let (op, l_bp, r_bp) = match self.peek().kind {
                TokenKind::Plus => (BinaryOp::Add, 1, 2),
                TokenKind::Minus => (BinaryOp::Sub, 1, 2),
                TokenKind::Star => (BinaryOp::Mul, 3, 4),
                TokenKind::Slash => (BinaryOp::Div, 3, 4),
                // Right-associative: right binding power below left.
                TokenKind::StarStar => (BinaryOp::Pow, 8, 7),
                _ => break,
            };
            if l_bp < min_bp {
                break;
            }
            self.advance();
            let rhs = self.parse_expr(r_bp)?;
            lhs = Expr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }

        self.depth -= 1;
        Ok(lhs)
    }

    fn parse_prefix(&mut self) -> Result<Expr> {
        match self.peek().kind.clone() {
            TokenKind::Minus => {
                self.advance();
                // Unary binds tighter than '*' but looser than '**'.
                let operand = self.parse_expr(5)?;
                Ok(Expr::Unary {
                    op: UnaryOp::Neg,
                    expr: Box::new(operand),
                })
            }
            TokenKind::Number(value) => {
                self.advance();
                Ok(Expr::Number(value))
            }
            TokenKind::Colour(colour) => {
                self.advance();
                Ok(Expr::Colour(colour))
            }
            TokenKind::Ident => {
                let name = self.advance().text.clone();
                if self.peek().kind == TokenKind::LParen {
                    self.parse_call(name)
                } else {
                    Ok(Expr::Ref(name))
                }
            }
            TokenKind::LParen => {
                let open = self.advance().clone();
                let inner = self.parse_expr(0)?;
                match self.peek().kind {
                    TokenKind::RParen => {
                        self.advance();
                        Ok(inner)
                    }
                    _ => Err(self.error(
                        &open,
                        "unmatched '('",
                        Some(format!(
                            "expected ')' but found {}",
                            self.peek().describe()
                        )),
                    )),
                }
            }
            _ => Err(self.unexpected("an expression")),
        }
    }

    fn parse_call(&mut self, name: String) -> Result<Expr> {
        let open = self.advance().clone(); // '('
        let mut args = Vec::new();

        if self.peek().kind != TokenKind::RParen {
            loop {
                args.push(self.parse_expr(0)?);
                match self.peek().kind {
                    TokenKind::Comma => {
                        self.advance();
                    }
                    TokenKind::RParen => break,
                    _ => {
                        return Err(self.error(
                            &open,
                            &format!("unmatched '(' in call to {}()", name),
                            Some(format!(
                                "expected ',' or ')' but found {}",
                                self.peek().describe()
                            )),
                        ))
                    }
                }
            }
        }

        self.advance(); // ')'
        Ok(Expr::Call { name, args })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::token::tokens_from_program;
    use crate::types::Colour;

    fn parse(source: &str) -> Result<Program> {
        let tokens = tokens_from_program(source)?;
        ast_from_tokens(&tokens)
    }

    fn single_expr(source: &str) -> Expr {
        let program = parse(source).unwrap();
        assert_eq!(program.statements.len(), 1);
        program.statements.into_iter().next().unwrap().expr
    }

    #[test]
    fn test_literal_addition() {
        assert_eq!(
            single_expr("1 + 1"),
            Expr::Binary {
                op: BinaryOp::Add,
                lhs: Box::new(Expr::Number(1.0)),
                rhs: Box::new(Expr::Number(1.0)),
            }
        );
    }

    #[test]
    fn test_precedence_mul_over_add() {
        // 1 + 2 * 3 parses as 1 + (2 * 3)
        match single_expr("1 + 2 * 3") {
            Expr::Binary { op: BinaryOp::Add, rhs, .. } => match *rhs {
                Expr::Binary { op: BinaryOp::Mul, .. } => {}
                other => panic!("expected multiplication on the right, got {:?}", other),
            },
            other => panic!("expected addition at the root, got {:?}", other),
        }
    }

    #[test]
    fn test_left_associativity() {
        // 10 - 2 - 3 parses as (10 - 2) - 3
        match single_expr("10 - 2 - 3") {
            Expr::Binary { op: BinaryOp::Sub, lhs, rhs } => {
                assert!(matches!(*lhs, Expr::Binary { op: BinaryOp::Sub, .. }));
                assert_eq!(*rhs, Expr::Number(3.0));
            }
            other => panic!("expected subtraction at the root, got {:?}", other),
        }
    }

    #[test]
    fn test_power_right_associativity() {
        // 2 ** 3 ** 2 parses as 2 ** (3 ** 2)
        match single_expr("2 ** 3 ** 2") {
            Expr::Binary { op: BinaryOp::Pow, lhs, rhs } => {
                assert_eq!(*lhs, Expr::Number(2.0));
                assert!(matches!(*rhs, Expr::Binary { op: BinaryOp::Pow, .. }));
            }
            other => panic!("expected power at the root, got {:?}", other),
        }
    }

    #[test]
    fn test_unary_binds_below_power() {
        // -2 ** 2 parses as -(2 ** 2)
        match single_expr("-2 ** 2") {
            Expr::Unary { op: UnaryOp::Neg, expr } => {
                assert!(matches!(*expr, Expr::Binary { op: BinaryOp::Pow, .. }));
            }
            other => panic!("expected negation at the root, got {:?}", other),
        }
    }

    #[test]
    fn test_parentheses_override_precedence() {
        // (1 + 2) * 3 parses as multiplication at the root
        match single_expr("(1 + 2) * 3") {
            Expr::Binary { op: BinaryOp::Mul, lhs, .. } => {
                assert!(matches!(*lhs, Expr::Binary { op: BinaryOp::Add, .. }));
            }
            other => panic!("expected multiplication at the root, got {:?}", other),
        }
    }

    #[test]
    fn test_call_with_args() {
        assert_eq!(
            single_expr("blend(input, #fff, 0.5)"),
            Expr::Call {
                name: "blend".to_string(),
                args: vec![
                    Expr::Ref("input".to_string()),
                    Expr::Colour(Colour::WHITE),
                    Expr::Number(0.5),
                ],
            }
        );
    }

    #[test]
    fn test_statement_metadata() {
        let program = parse("invert(input) as neg opacity 0.5 mode screen z -1").unwrap();
        let stmt = &program.statements[0];
        assert_eq!(stmt.name.as_deref(), Some("neg"));
        assert_eq!(stmt.opacity, Some(0.5));
        assert_eq!(stmt.mode, Some(BlendMode::Screen));
        assert_eq!(stmt.z, Some(-1));
    }

    #[test]
    fn test_multiple_statements_and_trailing_semi() {
        let program = parse("input as base; input * 0.5 as dim;").unwrap();
        assert_eq!(program.statements.len(), 2);
        assert_eq!(program.statements[1].name.as_deref(), Some("dim"));
    }

    #[test]
    fn test_empty_program_is_a_parse_error() {
        match parse("").unwrap_err() {
            IqError::Parse { message, .. } => assert!(message.contains("empty program")),
            other => panic!("expected parse error, got {:?}", other),
        }
        assert!(parse("   ").is_err());
    }

    #[test]
    fn test_unexpected_token() {
        match parse("1 + + 2").unwrap_err() {
            IqError::Parse { message, .. } => {
                assert!(message.contains("expected an expression"), "{}", message)
            }
            other => panic!("expected parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_unmatched_parenthesis() {
        match parse("(1 + 2").unwrap_err() {
            IqError::Parse { message, .. } => assert!(message.contains("unmatched")),
            other => panic!("expected parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_premature_end_of_input() {
        match parse("1 +").unwrap_err() {
            IqError::Parse { message, .. } => assert!(message.contains("end of input")),
            other => panic!("expected parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_opacity_out_of_range() {
        match parse("input opacity 1.5").unwrap_err() {
            IqError::Parse { message, .. } => assert!(message.contains("out of range")),
            other => panic!("expected parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_blend_mode_lists_alternatives() {
        match parse("input mode overlay").unwrap_err() {
            IqError::Parse { help, .. } => {
                assert!(help.unwrap().contains("multiply"));
            }
            other => panic!("expected parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_duplicate_clause() {
        assert!(parse("input as a as b").is_err());
        assert!(parse("input opacity 0.5 opacity 0.6").is_err());
    }

    #[test]
    fn test_depth_limit() {
        let source = format!("{}1{}", "(".repeat(100), ")".repeat(100));
        match parse(&source).unwrap_err() {
            IqError::ResourceLimit { .. } => {}
            other => panic!("expected resource limit error, got {:?}", other),
        }
    }
}
