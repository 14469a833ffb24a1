//! Recursive-descent parser with transactional backtracking.
//!
//! ```text
//! Block        := Statement*                  (until '}' or end of input)
//! Statement    := Expr ';'
//! Expr         := FunctionDef | Call | Binding | Comparison | <empty>
//! FunctionDef  := 'fun' '(' ')' '{' Block '}'
//! Call         := Identifier '(' (Expr (',' Expr)*)? ')'
//! Binding      := 'let' Identifier '=' Expr
//! Comparison   := Operand (CompOp Operand)?
//! Operand      := BooleanLiteral | StringLiteral | Sum
//! Sum          := Product (('+' | '-') Sum)?
//! Product      := Factor (('*' | '/' | '%') Product)?
//! Factor       := '(' Sum ')' | IntLiteral | Call | Identifier | FunctionDef | Binding
//! ```
//!
//! Every production returns an [`Attempt`]: `Ok(Some(node))` when it
//! matched, `Ok(None)` when it does not apply (the cursor is rewound and
//! the next alternative is tried), or `Err(..)` once input that committed
//! to the production turns out to be malformed. Errors are never
//! backtracked past.
//!
//! `Sum` and `Product` recurse on their right operand, so `8 - 4 - 2`
//! groups as `8 - (4 - 2)`.
//!
//! A `Call` or `FunctionDef` that starts an `Expr` is parsed once. When an
//! operator follows it, the node is handed to the `Product`, `Sum` and
//! `Comparison` levels as their left operand instead of being re-read.
//!
//! Identifiers are resolved against the scope chain while parsing, so
//! unknown names, redeclarations and calls to non-invokable bindings are
//! all parse errors.

use std::rc::Rc;

use tracing::{debug, trace};

use crate::ast::{BinaryOperator, Block, Expr, Lambda};
use crate::builtins::Builtins;
use crate::cursor::TokenCursor;
use crate::error::CoreError;
use crate::lexer::{Keyword, Operator, Symbol, Token, TokenKind};
use crate::scope::{Resolved, ScopeChain};
use crate::value::Value;

/// Outcome of one production attempt.
type Attempt<T> = Result<Option<T>, CoreError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseConfig {
    /// Maximum nesting of expressions before parsing is abandoned.
    ///
    /// `Sum` and `Product` recurse on their right operand, so every
    /// operator in a flat chain such as `1 + 1 + 1` also counts as a level.
    pub max_depth: usize,
}

impl Default for ParseConfig {
    fn default() -> Self {
        ParseConfig { max_depth: 256 }
    }
}

/// Where an expression appears; `let` is only legal as a statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Position {
    Statement,
    Nested,
}

/// Parse a token sequence into a zero-argument program lambda, with the
/// builtins bound in the root scope.
pub fn parse(tokens: &[Token], builtins: &Builtins) -> Result<Rc<Lambda>, CoreError> {
    let root = ScopeChain::with_constants(builtins.values());
    Parser::new(tokens, root, ParseConfig::default()).parse()
}

pub struct Parser<'t> {
    cursor: TokenCursor<'t>,
    scope: ScopeChain,
    config: ParseConfig,
    depth: usize,
}

impl<'t> Parser<'t> {
    /// The program body is parsed in a child of `root`, so top-level
    /// bindings may shadow whatever `root` declares.
    pub fn new(tokens: &'t [Token], root: ScopeChain, config: ParseConfig) -> Self {
        Parser {
            cursor: TokenCursor::new(tokens),
            scope: root,
            config,
            depth: 0,
        }
    }

    pub fn parse(mut self) -> Result<Rc<Lambda>, CoreError> {
        self.scope.push();
        let statements = self.parse_statements()?;
        if let Some(token) = self.cursor.peek() {
            return Err(self.error_at(token, format!("unexpected '{token}'")));
        }
        let captures = self.scope.pop();
        debug!(statements = statements.len(), "parsed program");
        Ok(Rc::new(Lambda {
            params: Vec::new(),
            body: Block::new(statements),
            captures,
        }))
    }

    fn parse_statements(&mut self) -> Result<Vec<Expr>, CoreError> {
        let mut statements = Vec::new();
        while let Some(token) = self.cursor.peek() {
            if token.is_symbol(Symbol::RBrace) {
                break;
            }
            statements.push(self.parse_statement()?);
        }
        Ok(statements)
    }

    fn parse_statement(&mut self) -> Result<Expr, CoreError> {
        let expr = self
            .parse_expr(Position::Statement)?
            .unwrap_or_else(Expr::noop);
        self.expect_symbol(Symbol::Semi, "expected ';' after statement")?;
        Ok(expr)
    }

    fn parse_expr(&mut self, position: Position) -> Attempt<Expr> {
        self.nested(|p| {
            // A call or function literal is parsed once and may still be the
            // left operand of an operator (`f() * 2`).
            if let Some(lhs) = p.first_match(&[Self::parse_function_def, Self::parse_call])? {
                return p.operator_tail(lhs).map(Some);
            }
            if let Some(expr) = p.parse_binding(position)? {
                return Ok(Some(expr));
            }
            p.parse_comparison()
        })
    }

    /// Continue an already parsed factor through the `Product`, `Sum` and
    /// `Comparison` levels.
    fn operator_tail(&mut self, factor: Expr) -> Result<Expr, CoreError> {
        let product = self.product_tail(factor)?;
        let sum = self.sum_tail(product)?;
        self.comparison_tail(sum)
    }

    fn parse_function_def(&mut self) -> Attempt<Expr> {
        self.transaction(|p| {
            if p.cursor.next_if(|t| t.is_keyword(Keyword::Fun)).is_none() {
                return Ok(None);
            }
            p.expect_symbol(Symbol::LParen, "expected '(' after 'fun'")?;
            p.expect_symbol(Symbol::RParen, "expected ')' in 'fun' declaration")?;
            p.expect_symbol(Symbol::LBrace, "expected '{' to open the function body")?;

            p.scope.push();
            let statements = p.parse_statements();
            let captures = p.scope.pop();
            let statements = statements?;
            p.expect_symbol(Symbol::RBrace, "expected '}' to close the function body")?;

            Ok(Some(Expr::Lambda(Rc::new(Lambda {
                params: Vec::new(),
                body: Block::new(statements),
                captures,
            }))))
        })
    }

    fn parse_call(&mut self) -> Attempt<Expr> {
        self.transaction(|p| {
            let Some((token, name)) = p.next_identifier() else {
                return Ok(None);
            };
            if p.cursor.next_if(|t| t.is_symbol(Symbol::LParen)).is_none() {
                return Ok(None);
            }

            let callee = p.resolve(token, name)?;
            if !callee.is_invokable() {
                return Err(p.error_at(token, format!("identifier '{name}' is not invokable")));
            }
            let args = p.parse_arguments()?;
            Ok(Some(Expr::Invoke {
                callee: Box::new(callee),
                args,
            }))
        })
    }

    fn parse_arguments(&mut self) -> Result<Vec<Expr>, CoreError> {
        let mut args = Vec::new();
        if self.cursor.next_if(|t| t.is_symbol(Symbol::RParen)).is_some() {
            return Ok(args);
        }
        loop {
            let arg = self
                .parse_expr(Position::Nested)?
                .ok_or_else(|| self.error("expected an argument expression"))?;
            args.push(arg);

            let token = self.cursor.advance()?;
            match token.kind {
                TokenKind::Symbol(Symbol::Comma) => continue,
                TokenKind::Symbol(Symbol::RParen) => return Ok(args),
                _ => {
                    return Err(self.error_at(
                        token,
                        format!("expected ',' or ')' in argument list, found '{token}'"),
                    ));
                }
            }
        }
    }

    fn parse_binding(&mut self, position: Position) -> Attempt<Expr> {
        self.transaction(|p| {
            let Some(let_token) = p.cursor.next_if(|t| t.is_keyword(Keyword::Let)) else {
                return Ok(None);
            };
            if position == Position::Nested {
                return Err(p.error_at(let_token, "'let' is only allowed as a statement"));
            }

            let token = p.cursor.advance()?;
            let TokenKind::Identifier(name) = &token.kind else {
                return Err(p.error_at(
                    token,
                    format!("expected an identifier after 'let', found '{token}'"),
                ));
            };
            p.expect_operator(Operator::Assign, "expected '=' in 'let' binding")?;
            let value = p
                .parse_expr(Position::Nested)?
                .ok_or_else(|| p.error("expected an expression after '='"))?;

            let slot = p
                .scope
                .declare_variable(name, value.is_invokable())
                .map_err(|err| p.error_at(token, err.to_string()))?;
            Ok(Some(Expr::Assign {
                name: name.clone(),
                slot,
                value: Box::new(value),
            }))
        })
    }

    fn parse_comparison(&mut self) -> Attempt<Expr> {
        match self.parse_operand()? {
            Some(lhs) => self.comparison_tail(lhs).map(Some),
            None => Ok(None),
        }
    }

    fn comparison_tail(&mut self, lhs: Expr) -> Result<Expr, CoreError> {
        let Some(op) = self.next_operator(BinaryOperator::is_comparison) else {
            return Ok(lhs);
        };
        let rhs = self
            .parse_operand()?
            .ok_or_else(|| self.error(format!("expected right hand side of '{}'", op.symbol())))?;
        Ok(binary(op, lhs, rhs))
    }

    fn parse_operand(&mut self) -> Attempt<Expr> {
        self.first_match(&[
            |p| p.parse_literal(boolean_literal),
            |p| p.parse_literal(string_literal),
            Self::parse_sum,
        ])
    }

    fn parse_sum(&mut self) -> Attempt<Expr> {
        self.nested(|p| match p.parse_product()? {
            Some(lhs) => p.sum_tail(lhs).map(Some),
            None => Ok(None),
        })
    }

    fn sum_tail(&mut self, lhs: Expr) -> Result<Expr, CoreError> {
        let Some(op) =
            self.next_operator(|op| matches!(op, BinaryOperator::Add | BinaryOperator::Subtract))
        else {
            return Ok(lhs);
        };
        let rhs = self.parse_sum()?.ok_or_else(|| {
            self.error(format!("expected a numeric expression after '{}'", op.symbol()))
        })?;
        Ok(binary(op, lhs, rhs))
    }

    fn parse_product(&mut self) -> Attempt<Expr> {
        self.nested(|p| match p.parse_factor()? {
            Some(lhs) => p.product_tail(lhs).map(Some),
            None => Ok(None),
        })
    }

    fn product_tail(&mut self, lhs: Expr) -> Result<Expr, CoreError> {
        let Some(op) = self.next_operator(|op| {
            matches!(
                op,
                BinaryOperator::Multiply | BinaryOperator::Divide | BinaryOperator::Modulo
            )
        }) else {
            return Ok(lhs);
        };
        let rhs = self.parse_product()?.ok_or_else(|| {
            self.error(format!("expected a numeric expression after '{}'", op.symbol()))
        })?;
        Ok(binary(op, lhs, rhs))
    }

    /// The fallback into `Expr` only tries alternatives that consume a
    /// leading token of their own (`fun`, `name(`, `let`), never
    /// `Comparison`, which would re-enter `Factor` without progress.
    fn parse_factor(&mut self) -> Attempt<Expr> {
        self.first_match(&[
            Self::parse_parenthetical,
            |p| p.parse_literal(int_literal),
            Self::parse_call,
            Self::parse_identifier,
            Self::parse_function_def,
            |p| p.parse_binding(Position::Nested),
        ])
    }

    fn parse_parenthetical(&mut self) -> Attempt<Expr> {
        self.transaction(|p| {
            let Some(open) = p.cursor.next_if(|t| t.is_symbol(Symbol::LParen)) else {
                return Ok(None);
            };
            let inner = p
                .parse_sum()?
                .ok_or_else(|| p.error_at(open, "expected an expression after '('"))?;
            p.expect_symbol(Symbol::RParen, "expected ')'")?;
            Ok(Some(inner))
        })
    }

    fn parse_identifier(&mut self) -> Attempt<Expr> {
        self.transaction(|p| match p.next_identifier() {
            Some((token, name)) => p.resolve(token, name).map(Some),
            None => Ok(None),
        })
    }

    fn parse_literal(&mut self, extract: fn(&TokenKind) -> Option<Value>) -> Attempt<Expr> {
        self.transaction(|p| match p.cursor.peek().and_then(|t| extract(&t.kind)) {
            Some(value) => {
                p.cursor.advance()?;
                Ok(Some(Expr::Constant(value)))
            }
            None => Ok(None),
        })
    }

    // ------------------------------------------------------------------
    // Combinators
    // ------------------------------------------------------------------

    /// Run `production` behind a checkpoint: commit on a match, rewind
    /// when it does not apply, and let errors through untouched.
    fn transaction<T>(&mut self, production: impl FnOnce(&mut Self) -> Attempt<T>) -> Attempt<T> {
        let checkpoint = self.cursor.save();
        match production(self) {
            Ok(Some(node)) => {
                self.cursor.commit(checkpoint)?;
                Ok(Some(node))
            }
            Ok(None) => {
                self.cursor.revert(checkpoint)?;
                trace!(position = self.cursor.position(), "production not applicable");
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }

    /// Ordered choice: the first alternative that matches wins.
    fn first_match(&mut self, alternatives: &[fn(&mut Self) -> Attempt<Expr>]) -> Attempt<Expr> {
        for alternative in alternatives {
            if let Some(expr) = alternative(self)? {
                return Ok(Some(expr));
            }
        }
        Ok(None)
    }

    fn nested<T>(&mut self, production: impl FnOnce(&mut Self) -> Attempt<T>) -> Attempt<T> {
        if self.depth >= self.config.max_depth {
            return Err(self.error(format!(
                "expression nesting exceeds {} levels (each chained operator adds one)",
                self.config.max_depth
            )));
        }
        self.depth += 1;
        let result = production(self);
        self.depth -= 1;
        result
    }

    // ------------------------------------------------------------------
    // Token helpers
    // ------------------------------------------------------------------

    fn next_identifier(&mut self) -> Option<(&'t Token, &'t str)> {
        let token = self
            .cursor
            .next_if(|t| matches!(t.kind, TokenKind::Identifier(_)))?;
        match &token.kind {
            TokenKind::Identifier(name) => Some((token, name.as_str())),
            _ => None,
        }
    }

    fn next_operator(&mut self, accept: impl Fn(BinaryOperator) -> bool) -> Option<BinaryOperator> {
        let binary_op = |token: &Token| match token.kind {
            TokenKind::Operator(op) => BinaryOperator::from_operator(op),
            _ => None,
        };
        let token = self
            .cursor
            .next_if(|t| binary_op(t).is_some_and(&accept))?;
        binary_op(token)
    }

    fn expect_symbol(&mut self, symbol: Symbol, message: &str) -> Result<(), CoreError> {
        let token = self.cursor.advance()?;
        if token.is_symbol(symbol) {
            Ok(())
        } else {
            Err(self.error_at(token, format!("{message}, found '{token}'")))
        }
    }

    fn expect_operator(&mut self, op: Operator, message: &str) -> Result<(), CoreError> {
        let token = self.cursor.advance()?;
        if token.kind == TokenKind::Operator(op) {
            Ok(())
        } else {
            Err(self.error_at(token, format!("{message}, found '{token}'")))
        }
    }

    fn resolve(&mut self, token: &Token, name: &str) -> Result<Expr, CoreError> {
        match self.scope.resolve(name) {
            Ok(Resolved::Variable { slot, invokable }) => Ok(Expr::VariableRef {
                name: name.to_string(),
                slot,
                invokable,
            }),
            Ok(Resolved::Constant(value)) => Ok(Expr::Constant(value)),
            Err(err) => Err(self.error_at(token, err.to_string())),
        }
    }

    fn error(&self, message: impl Into<String>) -> CoreError {
        CoreError::ParseError {
            line: self.cursor.line(),
            message: message.into(),
        }
    }

    fn error_at(&self, token: &Token, message: impl Into<String>) -> CoreError {
        CoreError::ParseError {
            line: token.line,
            message: message.into(),
        }
    }
}

fn binary(op: BinaryOperator, lhs: Expr, rhs: Expr) -> Expr {
    Expr::BinaryOp {
        op,
        lhs: Box::new(lhs),
        rhs: Box::new(rhs),
    }
}

fn int_literal(kind: &TokenKind) -> Option<Value> {
    match kind {
        TokenKind::IntLiteral(value) => Some(Value::Int(*value)),
        _ => None,
    }
}

fn boolean_literal(kind: &TokenKind) -> Option<Value> {
    match kind {
        TokenKind::BooleanLiteral(value) => Some(Value::Bool(*value)),
        _ => None,
    }
}

fn string_literal(kind: &TokenKind) -> Option<Value> {
    match kind {
        TokenKind::StringLiteral(text) => Some(Value::string(text.as_str())),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use std::time::{Duration, Instant};

    use super::*;
    use crate::ast::Slot;
    use crate::lexer::tokenize;

    fn builtins() -> Builtins {
        Builtins::new(Rc::new(RefCell::new(Vec::<u8>::new())))
    }

    fn parse_source(source: &str) -> Result<Rc<Lambda>, CoreError> {
        let tokens = tokenize(source).expect("tokenize");
        parse(&tokens, &builtins())
    }

    /// Statements of the program, rendered with explicit grouping.
    fn statements(source: &str) -> Vec<String> {
        parse_source(source)
            .expect("parse")
            .body
            .statements
            .iter()
            .map(ToString::to_string)
            .collect()
    }

    fn parse_error(source: &str) -> String {
        match parse_source(source) {
            Err(CoreError::ParseError { message, .. }) => message,
            other => panic!("expected a parse error, got {other:?}"),
        }
    }

    #[test]
    fn arithmetic_is_right_associative() {
        assert_eq!(statements("8 - 4 - 2;"), vec!["(8 - (4 - 2))"]);
        assert_eq!(statements("8 / 4 / 2;"), vec!["(8 / (4 / 2))"]);
    }

    #[test]
    fn products_bind_tighter_than_sums() {
        assert_eq!(statements("1 + 2 * 3;"), vec!["(1 + (2 * 3))"]);
        assert_eq!(statements("(1 + 2) * 3;"), vec!["((1 + 2) * 3)"]);
        assert_eq!(statements("7 % 4 + 1;"), vec!["((7 % 4) + 1)"]);
    }

    #[test]
    fn parses_comparisons_of_each_operand_kind() {
        assert_eq!(statements("1 == 1;"), vec!["(1 == 1)"]);
        assert_eq!(statements("'a' != 'b';"), vec!["('a' != 'b')"]);
        assert_eq!(statements("true == false;"), vec!["(true == false)"]);
        assert_eq!(statements("1 + 1 >= 2;"), vec!["((1 + 1) >= 2)"]);
    }

    #[test]
    fn empty_statements_are_no_ops() {
        assert_eq!(statements(";;"), vec!["()", "()"]);
        assert_eq!(statements(""), Vec::<String>::new());
    }

    #[test]
    fn block_declares_its_direct_bindings() {
        let program = parse_source("let a = 1; 2; let b = a;").expect("parse");
        assert_eq!(program.body.declared, vec![0, 1]);
        assert_eq!(
            program.body.statements[2],
            Expr::Assign {
                name: "b".into(),
                slot: 1,
                value: Box::new(Expr::VariableRef {
                    name: "a".into(),
                    slot: Slot::Local(0),
                    invokable: false,
                }),
            }
        );
    }

    #[test]
    fn function_literals_capture_enclosing_bindings() {
        let program = parse_source("let x = 1; let f = fun() { let y = 2; x + y; };")
            .expect("parse");
        let Expr::Assign { value, .. } = &program.body.statements[1] else {
            panic!("expected a binding");
        };
        let Expr::Lambda(lambda) = value.as_ref() else {
            panic!("expected a lambda");
        };
        assert_eq!(lambda.captures, vec![Slot::Local(0)]);
        assert_eq!(lambda.body.declared, vec![0]);
        assert!(lambda.params.is_empty());
    }

    #[test]
    fn calls_work_as_statements_and_operands() {
        let rendered = statements("let f = fun() { 2; }; f(); 1 + f(); f() * 3;");
        assert_eq!(rendered[1..], ["f()", "(1 + f())", "(f() * 3)"]);
    }

    #[test]
    fn leading_calls_continue_through_every_operator_level() {
        let rendered = statements("let g = fun() { 1; }; g() * 2 + 1 > 2;");
        assert_eq!(rendered[1], "(((g() * 2) + 1) > 2)");
        let rendered = statements("fun() { 1; } == 1;");
        assert_eq!(rendered, vec!["(fun() { 1; } == 1)"]);
    }

    #[test]
    fn nested_call_operands_parse_in_linear_time() {
        let mut nested = "f(1)".to_string();
        for _ in 0..40 {
            nested = format!("f({nested} + 1)");
        }
        let source = format!("let f = fun() {{ 1; }};\n{nested} + 1;");

        let started = Instant::now();
        let program = parse_source(&source).expect("parse");
        assert!(
            started.elapsed() < Duration::from_secs(1),
            "parsing 40 nested calls took {:?}",
            started.elapsed()
        );
        assert_eq!(program.body.statements.len(), 2);
    }

    #[test]
    fn builtins_resolve_to_constants() {
        assert_eq!(
            statements("println('hi', 1 + 2);"),
            vec!["<builtin println>('hi', (1 + 2))"]
        );
    }

    #[test]
    fn lambdas_are_valid_arguments() {
        let rendered = statements("if(1 < 2, fun() { 'yes'; }, fun() { 'no'; });");
        assert_eq!(
            rendered,
            vec!["<builtin if>((1 < 2), fun() { 'yes'; }, fun() { 'no'; })"]
        );
    }

    #[test]
    fn invokability_follows_aliases() {
        assert!(parse_source("let f = fun() { 1; }; let g = f; g();").is_ok());
        assert!(parse_source("let p = print; p('x');").is_ok());
    }

    #[test]
    fn rejects_undeclared_identifiers() {
        let message = parse_error("y; let y = 1;");
        assert!(message.contains("'y' has not been declared"), "{message}");
    }

    #[test]
    fn rejects_redeclaration_in_the_same_block() {
        let message = parse_error("let x = 2; let y = x * 2; x + y; let x = 5;");
        assert!(message.contains("already bound"), "{message}");
    }

    #[test]
    fn allows_shadowing_inside_functions_and_over_builtins() {
        assert!(parse_source("let x = 1; let f = fun() { let x = 2; x; };").is_ok());
        assert!(parse_source("let print = 1; print + 1;").is_ok());
    }

    #[test]
    fn rejects_calls_to_non_invokable_bindings() {
        let message = parse_error("let x = 1; x();");
        assert!(message.contains("not invokable"), "{message}");
    }

    #[test]
    fn reports_the_line_of_the_offending_token() {
        let err = parse_source("let a = 1;\n\nghost;").unwrap_err();
        assert!(matches!(err, CoreError::ParseError { line: 3, .. }), "{err:?}");
    }

    #[test]
    fn requires_semicolons() {
        assert!(matches!(parse_source("1"), Err(CoreError::OutOfTokens)));
        let message = parse_error("1 2;");
        assert!(message.contains("expected ';'"), "{message}");
    }

    #[test]
    fn malformed_bindings_are_hard_errors() {
        assert!(parse_error("let x 5;").contains("expected '='"));
        assert!(parse_error("let 5 = 5;").contains("expected an identifier"));
        assert!(parse_error("let x = ;").contains("expected an expression"));
    }

    #[test]
    fn let_is_only_a_statement() {
        let message = parse_error("print(let x = 1);");
        assert!(message.contains("only allowed as a statement"), "{message}");
        assert!(parse_error("1 + let x = 1;").contains("only allowed as a statement"));
    }

    #[test]
    fn malformed_function_literals_are_hard_errors() {
        assert!(parse_error("fun(x) { 1; };").contains("expected ')'"));
        assert!(parse_error("fun() 1;").contains("expected '{'"));
        assert!(matches!(
            parse_source("let f = fun() { 1;"),
            Err(CoreError::OutOfTokens)
        ));
    }

    #[test]
    fn missing_operands_do_not_fall_back_forever() {
        assert!(parse_error("1 + ;").contains("expected a numeric expression"));
        assert!(parse_error("2 * ;").contains("expected a numeric expression"));
        assert!(parse_error("1 == ;").contains("right hand side"));
        assert!(parse_error("+;").contains("expected ';'"));
        assert!(parse_error("();").contains("expected an expression after '('"));
    }

    #[test]
    fn rejects_unbalanced_input() {
        assert!(parse_error("1; }").contains("unexpected '}'"));
        assert!(parse_error("(1 + 2;").contains("expected ')'"));
        assert!(parse_error("print(1 2);").contains("expected ',' or ')'"));
    }

    #[test]
    fn operator_chains_count_toward_the_nesting_limit() {
        let source = format!("{};", vec!["1"; 300].join(" + "));
        let tokens = tokenize(&source).expect("tokenize");

        let err = Parser::new(&tokens, ScopeChain::new(), ParseConfig::default())
            .parse()
            .unwrap_err();
        assert!(
            matches!(err, CoreError::ParseError { ref message, .. } if message.contains("chained operator")),
            "{err:?}"
        );

        let roomy = ParseConfig { max_depth: 1024 };
        assert!(Parser::new(&tokens, ScopeChain::new(), roomy).parse().is_ok());
    }

    #[test]
    fn nesting_beyond_the_limit_is_rejected() {
        let source = format!("{}1{};", "(".repeat(40), ")".repeat(40));
        let tokens = tokenize(&source).expect("tokenize");

        let shallow = ParseConfig { max_depth: 16 };
        let err = Parser::new(&tokens, ScopeChain::new(), shallow)
            .parse()
            .unwrap_err();
        assert!(matches!(err, CoreError::ParseError { ref message, .. } if message.contains("nesting")));

        let program = Parser::new(&tokens, ScopeChain::new(), ParseConfig::default())
            .parse()
            .expect("default depth is enough");
        assert_eq!(program.body.statements, vec![Expr::Constant(Value::Int(1))]);
    }
}
