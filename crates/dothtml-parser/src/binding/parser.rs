//! Binding expression parsing using Pratt parsing (precedence climbing).
//!
//! ## Generic arguments
//!
//! `Method<int>(x)` and `a < b` start the same way. After an identifier or
//! member name followed by `<`, the parser tries a type argument list and
//! keeps it only if it closes with `>` immediately followed by `(`;
//! otherwise it rewinds and `<` is parsed as a comparison.

use bumpalo::Bump;
use dothtml_core::{Constant, ParseError, ParseErrorKind, Span};
use ordered_float::OrderedFloat;

use super::ast::*;
use super::lexer::Lexer;
use super::ops::{ASSIGN_BP, BinaryOp, POSTFIX_BP, UnaryOp};
use super::token::{Token, TokenKind};

/// Parse a complete binding expression into `arena`.
///
/// Spans in the result are relative to the start of `source`.
pub fn parse_binding<'ast>(source: &str, arena: &'ast Bump) -> Result<&'ast BindingExpr<'ast>, ParseError> {
    let tokens = Lexer::new(source).tokenize()?;
    let mut parser = BindingParser::new(tokens, arena);
    let expr = parser.parse_expr(0)?;
    let trailing = parser.peek();
    if trailing.kind != TokenKind::Eof {
        return Err(ParseError::unexpected_token(trailing.span, trailing.kind.description()));
    }
    Ok(expr)
}

pub struct BindingParser<'src, 'ast> {
    tokens: Vec<Token<'src>>,
    position: usize,
    arena: &'ast Bump,
}

impl<'src, 'ast> BindingParser<'src, 'ast> {
    /// `tokens` must end with an `Eof` token, as produced by [`Lexer::tokenize`].
    pub fn new(tokens: Vec<Token<'src>>, arena: &'ast Bump) -> Self {
        Self {
            tokens,
            position: 0,
            arena,
        }
    }

    // ==========================================================================
    // Token access
    // ==========================================================================

    fn peek(&self) -> Token<'src> {
        self.peek_nth(0)
    }

    fn peek_nth(&self, n: usize) -> Token<'src> {
        let index = (self.position + n).min(self.tokens.len().saturating_sub(1));
        self.tokens
            .get(index)
            .copied()
            .unwrap_or_else(|| Token::new(TokenKind::Eof, "", Span::default()))
    }

    fn advance(&mut self) -> Token<'src> {
        let token = self.peek();
        if token.kind != TokenKind::Eof {
            self.position += 1;
        }
        token
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.peek().kind == kind
    }

    fn eat(&mut self, kind: TokenKind) -> Option<Token<'src>> {
        if self.check(kind) { Some(self.advance()) } else { None }
    }

    fn expect(&mut self, kind: TokenKind) -> Result<Token<'src>, ParseError> {
        let token = self.peek();
        if token.kind == kind {
            return Ok(self.advance());
        }
        let error_kind = if token.kind == TokenKind::Eof {
            ParseErrorKind::UnexpectedEof
        } else {
            ParseErrorKind::ExpectedToken
        };
        Err(ParseError::new(
            error_kind,
            token.span,
            format!("expected {}, found {}", kind.description(), token.kind.description()),
        ))
    }

    fn previous_span(&self) -> Span {
        self.tokens
            .get(self.position.saturating_sub(1))
            .map(|t| t.span)
            .unwrap_or_default()
    }

    fn ident(&self, token: Token<'src>) -> Ident<'ast> {
        Ident::new(self.arena.alloc_str(token.lexeme), token.span)
    }

    /// `>` immediately followed by another `>` is a right shift.
    fn at_shift_right(&self) -> bool {
        let (first, second) = (self.peek(), self.peek_nth(1));
        first.kind == TokenKind::Greater
            && second.kind == TokenKind::Greater
            && first.span.line == second.span.line
            && first.span.col + 1 == second.span.col
    }

    // ==========================================================================
    // Expressions
    // ==========================================================================

    /// Parse an expression with a minimum binding power.
    pub fn parse_expr(&mut self, min_bp: u8) -> Result<&'ast BindingExpr<'ast>, ParseError> {
        let mut lhs = self.parse_prefix()?;

        loop {
            let token = self.peek();
            match token.kind {
                TokenKind::Dot | TokenKind::LeftParen | TokenKind::LeftBracket => {
                    if POSTFIX_BP < min_bp {
                        break;
                    }
                    lhs = match token.kind {
                        TokenKind::Dot => self.parse_member_access(lhs)?,
                        TokenKind::LeftParen => self.parse_call(lhs)?,
                        _ => self.parse_index(lhs)?,
                    };
                    continue;
                }
                TokenKind::Equal => {
                    let (l_bp, r_bp) = ASSIGN_BP;
                    if l_bp < min_bp {
                        break;
                    }
                    self.advance();
                    let value = self.parse_expr(r_bp)?;
                    let span = lhs.span().merge(value.span());
                    lhs = self.arena.alloc(BindingExpr::Assign(self.arena.alloc(AssignExpr {
                        target: lhs,
                        value,
                        span,
                    })));
                    continue;
                }
                _ => {}
            }

            let op = if self.at_shift_right() {
                BinaryOp::ShiftRight
            } else if let Some(op) = BinaryOp::from_token(token.kind) {
                op
            } else {
                break;
            };
            let (l_bp, r_bp) = op.binding_power();
            if l_bp < min_bp {
                break;
            }
            self.advance();
            if op == BinaryOp::ShiftRight {
                self.advance();
            }
            let right = self.parse_expr(r_bp)?;
            let span = lhs.span().merge(right.span());
            lhs = self.arena.alloc(BindingExpr::Binary(self.arena.alloc(BinaryExpr {
                left: lhs,
                op,
                right,
                span,
            })));
        }

        Ok(lhs)
    }

    fn parse_prefix(&mut self) -> Result<&'ast BindingExpr<'ast>, ParseError> {
        let token = self.peek();

        if let Some(op) = UnaryOp::from_token(token.kind) {
            self.advance();
            let operand = self.parse_expr(UnaryOp::binding_power())?;
            let span = token.span.merge(operand.span());
            return Ok(self.arena.alloc(BindingExpr::Unary(self.arena.alloc(UnaryExpr {
                op,
                operand,
                span,
            }))));
        }

        match token.kind {
            TokenKind::IntLiteral
            | TokenKind::RealLiteral
            | TokenKind::DecimalLiteral
            | TokenKind::StringLiteral
            | TokenKind::True
            | TokenKind::False
            | TokenKind::Null => {
                self.advance();
                let value = parse_literal(token)?;
                let literal = self.arena.alloc(LiteralExpr {
                    value,
                    span: token.span,
                });
                Ok(self.arena.alloc(BindingExpr::Literal(literal)))
            }
            TokenKind::Identifier => {
                self.advance();
                let ident = self.ident(token);
                let type_args = self.try_parse_call_type_args();
                let span = if type_args.is_empty() {
                    ident.span
                } else {
                    ident.span.merge(self.previous_span())
                };
                Ok(self.arena.alloc(BindingExpr::Ident(self.arena.alloc(IdentExpr {
                    ident,
                    type_args,
                    span,
                }))))
            }
            TokenKind::LeftParen => {
                self.advance();
                let expr = self.parse_expr(0)?;
                let close = self.expect(TokenKind::RightParen)?;
                let span = token.span.merge(close.span);
                Ok(self.arena.alloc(BindingExpr::Paren(self.arena.alloc(ParenExpr { expr, span }))))
            }
            TokenKind::Eof => Err(ParseError::new(
                ParseErrorKind::UnexpectedEof,
                token.span,
                "expected expression, found end of binding",
            )),
            _ => Err(ParseError::new(
                ParseErrorKind::ExpectedExpression,
                token.span,
                format!("expected expression, found {}", token.kind.description()),
            )),
        }
    }

    fn parse_member_access(&mut self, target: &'ast BindingExpr<'ast>) -> Result<&'ast BindingExpr<'ast>, ParseError> {
        self.expect(TokenKind::Dot)?;
        let name = self.peek();
        if name.kind != TokenKind::Identifier {
            return Err(ParseError::new(
                ParseErrorKind::ExpectedIdentifier,
                name.span,
                format!("expected member name, found {}", name.kind.description()),
            ));
        }
        self.advance();
        let member = self.ident(name);
        let type_args = self.try_parse_call_type_args();
        let span = target.span().merge(self.previous_span());
        Ok(self.arena.alloc(BindingExpr::Member(self.arena.alloc(MemberExpr {
            target,
            member,
            type_args,
            span,
        }))))
    }

    fn parse_call(&mut self, callee: &'ast BindingExpr<'ast>) -> Result<&'ast BindingExpr<'ast>, ParseError> {
        self.expect(TokenKind::LeftParen)?;
        let mut args = bumpalo::collections::Vec::new_in(self.arena);

        if !self.check(TokenKind::RightParen) {
            args.push(self.parse_argument()?);
            while self.eat(TokenKind::Comma).is_some() {
                args.push(self.parse_argument()?);
            }
        }

        let close = self.expect(TokenKind::RightParen)?;
        let span = callee.span().merge(close.span);
        Ok(self.arena.alloc(BindingExpr::Call(self.arena.alloc(CallExpr {
            callee,
            args: args.into_bump_slice(),
            span,
        }))))
    }

    /// A single argument, positional or `name: value`.
    fn parse_argument(&mut self) -> Result<Argument<'ast>, ParseError> {
        let start = self.peek();
        let name = if start.kind == TokenKind::Identifier && self.peek_nth(1).kind == TokenKind::Colon {
            self.advance();
            self.advance();
            Some(self.ident(start))
        } else {
            None
        };
        let value = self.parse_expr(0)?;
        Ok(Argument {
            name,
            value,
            span: start.span.merge(value.span()),
        })
    }

    fn parse_index(&mut self, target: &'ast BindingExpr<'ast>) -> Result<&'ast BindingExpr<'ast>, ParseError> {
        self.expect(TokenKind::LeftBracket)?;
        let index = self.parse_expr(0)?;
        let close = self.expect(TokenKind::RightBracket)?;
        let span = target.span().merge(close.span);
        Ok(self.arena.alloc(BindingExpr::Index(self.arena.alloc(IndexExpr { target, index, span }))))
    }

    // ==========================================================================
    // Type arguments
    // ==========================================================================

    /// Speculatively parse `<T, ...>` directly followed by `(`.
    fn try_parse_call_type_args(&mut self) -> &'ast [TypeExpr<'ast>] {
        if !self.check(TokenKind::Less) {
            return &[];
        }
        let saved = self.position;
        match self.parse_type_args() {
            Some(args) if self.check(TokenKind::LeftParen) => args,
            _ => {
                self.position = saved;
                &[]
            }
        }
    }

    fn parse_type_args(&mut self) -> Option<&'ast [TypeExpr<'ast>]> {
        self.eat(TokenKind::Less)?;
        let mut args = bumpalo::collections::Vec::new_in(self.arena);
        args.push(self.parse_type()?);
        while self.eat(TokenKind::Comma).is_some() {
            args.push(self.parse_type()?);
        }
        self.eat(TokenKind::Greater)?;
        Some(args.into_bump_slice())
    }

    fn parse_type(&mut self) -> Option<TypeExpr<'ast>> {
        let first = self.eat(TokenKind::Identifier)?;
        let mut name = String::from(first.lexeme);
        while self.check(TokenKind::Dot) && self.peek_nth(1).kind == TokenKind::Identifier {
            self.advance();
            name.push('.');
            name.push_str(self.advance().lexeme);
        }
        let args = if self.check(TokenKind::Less) {
            self.parse_type_args()?
        } else {
            &[]
        };
        let mut suffixes = bumpalo::collections::Vec::new_in(self.arena);
        loop {
            if self.check(TokenKind::LeftBracket) && self.peek_nth(1).kind == TokenKind::RightBracket {
                self.advance();
                self.advance();
                suffixes.push(TypeSuffix::Array);
            } else if self.eat(TokenKind::Question).is_some() {
                suffixes.push(TypeSuffix::Nullable);
            } else {
                break;
            }
        }
        Some(TypeExpr {
            name: self.arena.alloc_str(&name),
            args,
            suffixes: suffixes.into_bump_slice(),
            span: first.span.merge(self.previous_span()),
        })
    }
}

// ============================================================================
// Literals
// ============================================================================

fn invalid_literal(token: Token<'_>, detail: &str) -> ParseError {
    ParseError::new(
        ParseErrorKind::InvalidLiteral,
        token.span,
        format!("invalid literal '{}': {detail}", token.lexeme),
    )
}

fn parse_literal(token: Token<'_>) -> Result<Constant, ParseError> {
    let text = token.lexeme;
    Ok(match token.kind {
        TokenKind::True => Constant::Bool(true),
        TokenKind::False => Constant::Bool(false),
        TokenKind::Null => Constant::Null,
        TokenKind::IntLiteral => {
            let (digits, long) = match text.strip_suffix(['l', 'L']) {
                Some(digits) => (digits, true),
                None => (text, false),
            };
            let value: i64 = digits.parse().map_err(|_| invalid_literal(token, "out of range"))?;
            match i32::try_from(value) {
                Ok(small) if !long => Constant::Int(small),
                _ => Constant::Long(value),
            }
        }
        TokenKind::RealLiteral => {
            let digits = text.trim_end_matches(['d', 'D']);
            let value: f64 = digits.parse().map_err(|_| invalid_literal(token, "not a number"))?;
            Constant::Double(OrderedFloat(value))
        }
        TokenKind::DecimalLiteral => Constant::Decimal(text.trim_end_matches(['m', 'M']).into()),
        TokenKind::StringLiteral => Constant::string(&unescape(&text[1..text.len() - 1])),
        _ => return Err(invalid_literal(token, "not a literal")),
    })
}

fn unescape(body: &str) -> String {
    let mut result = String::with_capacity(body.len());
    let mut chars = body.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            result.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => result.push('\n'),
            Some('t') => result.push('\t'),
            Some('r') => result.push('\r'),
            Some('0') => result.push('\0'),
            Some(other) => result.push(other),
            None => result.push('\\'),
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse<'a>(source: &str, arena: &'a Bump) -> &'a BindingExpr<'a> {
        parse_binding(source, arena).unwrap()
    }

    #[test]
    fn parse_precedence() {
        let arena = Bump::new();
        match parse("1 + 2 * 3", &arena) {
            BindingExpr::Binary(bin) => {
                assert_eq!(bin.op, BinaryOp::Add);
                assert!(matches!(bin.right, BindingExpr::Binary(inner) if inner.op == BinaryOp::Mul));
            }
            other => panic!("expected binary expression, got {other:?}"),
        }
    }

    #[test]
    fn parse_member_call_with_named_argument() {
        let arena = Bump::new();
        let expr = parse("_this.Format(value, digits: 2)", &arena);
        let BindingExpr::Call(call) = expr else {
            panic!("expected call");
        };
        assert!(matches!(call.callee, BindingExpr::Member(m) if m.member.name == "Format"));
        assert_eq!(call.args.len(), 2);
        assert_eq!(call.args[1].name.map(|n| n.name), Some("digits"));
    }

    #[test]
    fn generic_call_arguments() {
        let arena = Bump::new();
        let expr = parse("Items.Select<List<int>>(x)", &arena);
        let BindingExpr::Call(call) = expr else {
            panic!("expected call");
        };
        let BindingExpr::Member(member) = call.callee else {
            panic!("expected member callee");
        };
        assert_eq!(member.type_args.len(), 1);
        assert_eq!(member.type_args[0].to_string(), "List<int>");
    }

    #[test]
    fn less_than_is_not_mistaken_for_type_arguments() {
        let arena = Bump::new();
        let expr = parse("A < B && C > D", &arena);
        let BindingExpr::Binary(bin) = expr else {
            panic!("expected binary");
        };
        assert_eq!(bin.op, BinaryOp::AndAlso);
    }

    #[test]
    fn adjacent_greater_is_shift() {
        let arena = Bump::new();
        let expr = parse("a >> 2", &arena);
        assert!(matches!(expr, BindingExpr::Binary(b) if b.op == BinaryOp::ShiftRight));
        assert!(parse_binding("a > > 2", &arena).is_err());
    }

    #[test]
    fn assignment_is_right_associative_and_lowest() {
        let arena = Bump::new();
        let expr = parse("A = B = C ?? D", &arena);
        let BindingExpr::Assign(outer) = expr else {
            panic!("expected assignment");
        };
        assert!(matches!(outer.value, BindingExpr::Assign(_)));
    }

    #[test]
    fn literals() {
        let arena = Bump::new();
        let lit = |s: &str| match parse_binding(s, &arena).unwrap() {
            BindingExpr::Literal(l) => l.value.clone(),
            other => panic!("expected literal, got {other:?}"),
        };
        assert_eq!(lit("42"), Constant::Int(42));
        assert_eq!(lit("3000000000"), Constant::Long(3_000_000_000));
        assert_eq!(lit("5L"), Constant::Long(5));
        assert_eq!(lit("'a\\'b'"), Constant::string("a'b"));
        assert_eq!(lit("1.5m"), Constant::Decimal("1.5".into()));
        assert_eq!(lit("null"), Constant::Null);
    }

    #[test]
    fn literal_nodes_are_copied_by_value() {
        let arena = Bump::new();
        let original = *parse_binding("7 + 'x'", &arena).unwrap();
        let copy = original;
        let BindingExpr::Binary(binary) = copy else {
            panic!("expected binary");
        };
        let (left, right) = (*binary.left, *binary.right);
        assert!(matches!(left, BindingExpr::Literal(l) if l.value == Constant::Int(7)));
        assert!(matches!(right, BindingExpr::Literal(l) if l.value == Constant::string("x")));
        assert_eq!(copy, original);
    }

    #[test]
    fn indexer_and_unary() {
        let arena = Bump::new();
        let expr = parse("!Items[0].Done", &arena);
        let BindingExpr::Unary(unary) = expr else {
            panic!("expected unary");
        };
        assert_eq!(unary.op, UnaryOp::Not);
        assert!(matches!(unary.operand, BindingExpr::Member(_)));
    }

    #[test]
    fn display_round_trips_shape() {
        let arena = Bump::new();
        assert_eq!(parse("a.B(c: 1) + x[2]", &arena).to_string(), "a.B(c: 1) + x[2]");
    }

    #[test]
    fn trailing_tokens_are_rejected() {
        let arena = Bump::new();
        let err = parse_binding("a b", &arena).unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::UnexpectedToken);
        assert_eq!(err.span, Span::new(1, 3, 1));
    }

    #[test]
    fn missing_operand_reports_eof() {
        let arena = Bump::new();
        let err = parse_binding("a +", &arena).unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::UnexpectedEof);
    }
}
