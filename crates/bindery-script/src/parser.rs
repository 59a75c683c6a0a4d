//! Recursive-descent parser.
//!
//! Grammar (precedence from loosest to tightest):
//!
//! ```text
//! module   := (use | fn)*
//! use      := "use" IDENT "::" IDENT ";"
//! fn       := "fn" IDENT "(" params ")" "->" IDENT ("=" expr ";"? | block)
//! param    := IDENT ":" IDENT ("=" const)?
//! block    := "{" ("let" IDENT "=" expr ";")* expr "}"
//! expr     := or
//! or       := and ("||" and)*
//! and      := cmp ("&&" cmp)*
//! cmp      := add (("=="|"!="|"<"|"<="|">"|">=") add)?
//! add      := mul (("+"|"-") mul)*
//! mul      := unary (("*"|"/"|"%") unary)*
//! unary    := ("-"|"!") unary | postfix
//! postfix  := primary ("[" expr "]")*
//! primary  := literal | IDENT | IDENT "(" args ")" | "(" expr ")"
//!           | "[" items "]" | "{" STRING ":" expr, ... "}" | if
//! if       := "if" expr block "else" (block | if)
//! ```

use bindery_core::{TypeName, Value};

use crate::ast::{BinaryOp, Expr, FnDecl, Import, Param, Span, UnaryOp};
use crate::error::ScriptError;
use crate::lexer::{Token, tokenize};

/// A parsed module: its imports and function items, in source order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ModuleAst {
    pub imports: Vec<Import>,
    pub functions: Vec<FnDecl>,
}

/// Parse a whole module.
pub fn parse_module(source: &str) -> Result<ModuleAst, ScriptError> {
    let tokens = tokenize(source)?;
    let mut parser = Parser {
        tokens,
        pos: 0,
        eof: source.len(),
    };
    let mut module = ModuleAst::default();
    while !parser.at_end() {
        match parser.peek() {
            Some(Token::Use) => module.imports.push(parser.import()?),
            Some(Token::Fn) => module.functions.push(parser.function()?),
            _ => return Err(parser.error("expected `fn` or `use`")),
        }
    }
    Ok(module)
}

struct Parser {
    tokens: Vec<(Token, Span)>,
    pos: usize,
    eof: usize,
}

impl Parser {
    fn at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|(t, _)| t)
    }

    fn span(&self) -> Span {
        self.tokens
            .get(self.pos)
            .map_or(self.eof..self.eof, |(_, s)| s.clone())
    }

    fn prev_end(&self) -> usize {
        self.pos
            .checked_sub(1)
            .and_then(|i| self.tokens.get(i))
            .map_or(0, |(_, s)| s.end)
    }

    fn error(&self, message: impl Into<String>) -> ScriptError {
        ScriptError::Parse {
            message: message.into(),
            span: self.span(),
        }
    }

    fn bump(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).map(|(t, _)| t.clone());
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn eat(&mut self, expected: &Token) -> bool {
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, expected: &Token, what: &str) -> Result<(), ScriptError> {
        if self.eat(expected) {
            Ok(())
        } else {
            Err(self.error(format!("expected {what}")))
        }
    }

    fn ident(&mut self, what: &str) -> Result<String, ScriptError> {
        match self.peek() {
            Some(Token::Ident(_)) => match self.bump() {
                Some(Token::Ident(name)) => Ok(name),
                _ => Err(self.error(format!("expected {what}"))),
            },
            _ => Err(self.error(format!("expected {what}"))),
        }
    }

    fn type_name(&mut self) -> Result<TypeName, ScriptError> {
        let start = self.span();
        let name = self.ident("type name")?;
        TypeName::parse(&name).ok_or_else(|| ScriptError::Parse {
            message: format!("unknown type '{name}'"),
            span: start,
        })
    }

    fn import(&mut self) -> Result<Import, ScriptError> {
        let start = self.span().start;
        self.expect(&Token::Use, "`use`")?;
        let module = self.ident("module name")?;
        self.expect(&Token::PathSep, "`::`")?;
        let name = self.ident("function name")?;
        self.expect(&Token::Semi, "`;`")?;
        Ok(Import {
            module,
            name,
            span: start..self.prev_end(),
        })
    }

    fn function(&mut self) -> Result<FnDecl, ScriptError> {
        let start = self.span().start;
        self.expect(&Token::Fn, "`fn`")?;
        let name = self.ident("function name")?;
        self.expect(&Token::LParen, "`(`")?;
        let mut params: Vec<Param> = Vec::new();
        while !self.eat(&Token::RParen) {
            if !params.is_empty() {
                self.expect(&Token::Comma, "`,` or `)`")?;
                if self.eat(&Token::RParen) {
                    break;
                }
            }
            let param = self.param()?;
            if params.iter().any(|p| p.name == param.name) {
                return Err(self.error(format!("duplicate parameter '{}'", param.name)));
            }
            if param.default.is_none() && params.iter().any(|p| p.default.is_some()) {
                return Err(self.error(format!(
                    "parameter '{}' without default follows a defaulted parameter",
                    param.name
                )));
            }
            params.push(param);
        }
        self.expect(&Token::Arrow, "`->`")?;
        let result = self.type_name()?;
        let body = if self.eat(&Token::Assign) {
            let body = self.expr()?;
            self.eat(&Token::Semi);
            body
        } else if self.peek() == Some(&Token::LBrace) && self.brace_opens_map() {
            self.expr()?
        } else {
            self.block()?
        };
        Ok(FnDecl {
            name,
            params,
            result,
            body,
            span: start..self.prev_end(),
        })
    }

    fn param(&mut self) -> Result<Param, ScriptError> {
        let name = self.ident("parameter name")?;
        self.expect(&Token::Colon, "`:`")?;
        let ty = self.type_name()?;
        let default = if self.eat(&Token::Assign) {
            let at = self.span();
            let expr = self.expr()?;
            Some(expr.const_value().ok_or(ScriptError::Parse {
                message: "parameter default must be a constant".into(),
                span: at,
            })?)
        } else {
            None
        };
        Ok(Param { name, ty, default })
    }

    fn block(&mut self) -> Result<Expr, ScriptError> {
        self.expect(&Token::LBrace, "`{`")?;
        let mut lets = Vec::new();
        while self.eat(&Token::Let) {
            let name = self.ident("binding name")?;
            self.expect(&Token::Assign, "`=`")?;
            let value = self.expr()?;
            self.expect(&Token::Semi, "`;`")?;
            lets.push((name, value));
        }
        let tail = self.expr()?;
        self.expect(&Token::RBrace, "`}`")?;
        if lets.is_empty() {
            Ok(tail)
        } else {
            Ok(Expr::Block {
                lets,
                tail: Box::new(tail),
            })
        }
    }

    fn expr(&mut self) -> Result<Expr, ScriptError> {
        self.or()
    }

    fn or(&mut self) -> Result<Expr, ScriptError> {
        let mut lhs = self.and()?;
        while self.eat(&Token::OrOr) {
            let rhs = self.and()?;
            lhs = binary(BinaryOp::Or, lhs, rhs);
        }
        Ok(lhs)
    }

    fn and(&mut self) -> Result<Expr, ScriptError> {
        let mut lhs = self.comparison()?;
        while self.eat(&Token::AndAnd) {
            let rhs = self.comparison()?;
            lhs = binary(BinaryOp::And, lhs, rhs);
        }
        Ok(lhs)
    }

    fn comparison(&mut self) -> Result<Expr, ScriptError> {
        let lhs = self.additive()?;
        let op = match self.peek() {
            Some(Token::EqEq) => BinaryOp::Eq,
            Some(Token::NotEq) => BinaryOp::Ne,
            Some(Token::Lt) => BinaryOp::Lt,
            Some(Token::Le) => BinaryOp::Le,
            Some(Token::Gt) => BinaryOp::Gt,
            Some(Token::Ge) => BinaryOp::Ge,
            _ => return Ok(lhs),
        };
        self.pos += 1;
        let rhs = self.additive()?;
        Ok(binary(op, lhs, rhs))
    }

    fn additive(&mut self) -> Result<Expr, ScriptError> {
        let mut lhs = self.multiplicative()?;
        loop {
            let op = match self.peek() {
                Some(Token::Plus) => BinaryOp::Add,
                Some(Token::Minus) => BinaryOp::Sub,
                _ => return Ok(lhs),
            };
            self.pos += 1;
            let rhs = self.multiplicative()?;
            lhs = binary(op, lhs, rhs);
        }
    }

    fn multiplicative(&mut self) -> Result<Expr, ScriptError> {
        let mut lhs = self.unary()?;
        loop {
            let op = match self.peek() {
                Some(Token::Star) => BinaryOp::Mul,
                Some(Token::Slash) => BinaryOp::Div,
                Some(Token::Percent) => BinaryOp::Rem,
                _ => return Ok(lhs),
            };
            self.pos += 1;
            let rhs = self.unary()?;
            lhs = binary(op, lhs, rhs);
        }
    }

    fn unary(&mut self) -> Result<Expr, ScriptError> {
        let op = match self.peek() {
            Some(Token::Minus) => UnaryOp::Neg,
            Some(Token::Bang) => UnaryOp::Not,
            _ => return self.postfix(),
        };
        self.pos += 1;
        let expr = self.unary()?;
        Ok(Expr::Unary {
            op,
            expr: Box::new(expr),
        })
    }

    fn postfix(&mut self) -> Result<Expr, ScriptError> {
        let mut expr = self.primary()?;
        while self.eat(&Token::LBracket) {
            let index = self.expr()?;
            self.expect(&Token::RBracket, "`]`")?;
            expr = Expr::Index {
                target: Box::new(expr),
                index: Box::new(index),
            };
        }
        Ok(expr)
    }

    fn primary(&mut self) -> Result<Expr, ScriptError> {
        let Some(token) = self.peek().cloned() else {
            return Err(self.error("unexpected end of input"));
        };
        match token {
            Token::Int(i) => {
                self.pos += 1;
                Ok(Expr::Lit(Value::Int(i)))
            }
            Token::Float(f) => {
                self.pos += 1;
                Ok(Expr::Lit(Value::Float(f)))
            }
            Token::Str(s) => {
                self.pos += 1;
                Ok(Expr::Lit(Value::Str(s)))
            }
            Token::True => {
                self.pos += 1;
                Ok(Expr::Lit(Value::Bool(true)))
            }
            Token::False => {
                self.pos += 1;
                Ok(Expr::Lit(Value::Bool(false)))
            }
            Token::Null => {
                self.pos += 1;
                Ok(Expr::Lit(Value::Null))
            }
            Token::Ident(name) => {
                self.pos += 1;
                if self.eat(&Token::LParen) {
                    let args = self.list_until(&Token::RParen, "`)`")?;
                    Ok(Expr::Call { name, args })
                } else {
                    Ok(Expr::Var(name))
                }
            }
            Token::LParen => {
                self.pos += 1;
                let inner = self.expr()?;
                self.expect(&Token::RParen, "`)`")?;
                Ok(inner)
            }
            Token::LBracket => {
                self.pos += 1;
                Ok(Expr::List(self.list_until(&Token::RBracket, "`]`")?))
            }
            Token::LBrace if self.brace_opens_map() => {
                self.pos += 1;
                self.map_literal()
            }
            Token::LBrace => self.block(),
            Token::If => self.if_expr(),
            _ => Err(self.error("expected an expression")),
        }
    }

    fn list_until(&mut self, close: &Token, what: &str) -> Result<Vec<Expr>, ScriptError> {
        let mut items = Vec::new();
        while !self.eat(close) {
            if !items.is_empty() {
                self.expect(&Token::Comma, &format!("`,` or {what}"))?;
                if self.eat(close) {
                    break;
                }
            }
            items.push(self.expr()?);
        }
        Ok(items)
    }

    /// `{}` and `{"key": ...` are map literals; anything else is a block.
    fn brace_opens_map(&self) -> bool {
        let ahead = |n: usize| self.tokens.get(self.pos + n).map(|(t, _)| t);
        match ahead(1) {
            Some(Token::RBrace) => true,
            Some(Token::Str(_)) => ahead(2) == Some(&Token::Colon),
            _ => false,
        }
    }

    fn map_literal(&mut self) -> Result<Expr, ScriptError> {
        let mut entries: Vec<(String, Expr)> = Vec::new();
        while !self.eat(&Token::RBrace) {
            if !entries.is_empty() {
                self.expect(&Token::Comma, "`,` or `}`")?;
                if self.eat(&Token::RBrace) {
                    break;
                }
            }
            let key = match self.peek() {
                Some(Token::Str(key)) => key.clone(),
                _ => return Err(self.error("expected a string key")),
            };
            self.pos += 1;
            self.expect(&Token::Colon, "`:`")?;
            entries.push((key, self.expr()?));
        }
        Ok(Expr::Map(entries))
    }

    fn if_expr(&mut self) -> Result<Expr, ScriptError> {
        self.expect(&Token::If, "`if`")?;
        let cond = self.expr()?;
        let then = self.block()?;
        self.expect(&Token::Else, "`else`")?;
        let otherwise = if self.peek() == Some(&Token::If) {
            self.if_expr()?
        } else {
            self.block()?
        };
        Ok(Expr::If {
            cond: Box::new(cond),
            then: Box::new(then),
            otherwise: Box::new(otherwise),
        })
    }
}

fn binary(op: BinaryOp, lhs: Expr, rhs: Expr) -> Expr {
    Expr::Binary {
        op,
        lhs: Box::new(lhs),
        rhs: Box::new(rhs),
    }
}
