//! a module turns equation-side strings into symbolic expressions
//!
//! Parsing is namespace-driven: bare identifiers resolve to the expressions
//! stored under them (fields, scalars, grid arrays, cast parameters), and
//! call syntax resolves to bound derivative operators, built-in functions or
//! substitution macros. Substitution macros expand late: the stored body
//! text is parsed at call time in a copy of the current namespace with the
//! macro parameters bound to the parsed call arguments (this is the one
//! place where namespace overwrites are enabled).
//!
//! The grammar is the usual arithmetic one: `+ -` over `* /` over unary
//! minus over `**` (right associative; `^` is accepted as a synonym) over
//! atoms (numbers, identifiers, calls, parenthesized expressions).
//!
//! `split_equation` cuts an equation string at its single top-level `=`,
//! respecting nested parentheses.

use crate::problem::namespace::{BuiltinFn, Namespace, NamespaceEntry, OperatorSpec};
use crate::symbolic::symbolic_engine::Expr;
use crate::symbolic::utils::{brackets_balanced, find_char_positions_outside_brackets};

/// Substitution macros may reference other macros; bail out instead of
/// recursing forever on a self-referential definition.
const MAX_EXPANSION_DEPTH: usize = 64;

/// Splits an equation string at its top-level `=` into trimmed LHS/RHS
/// substrings. Zero or several top-level `=` signs are an error.
pub fn split_equation(equation: &str) -> Result<(String, String), String> {
    if !brackets_balanced(equation) {
        return Err(format!("unbalanced brackets in '{}'", equation));
    }
    let positions = find_char_positions_outside_brackets(equation, '=');
    if positions.len() != 1 {
        return Err(format!(
            "expected exactly one top-level '=' in '{}', found {}",
            equation,
            positions.len()
        ));
    }
    let (lhs, rest) = equation.split_at(positions[0]);
    let rhs = &rest[1..];
    let (lhs, rhs) = (lhs.trim(), rhs.trim());
    if lhs.is_empty() || rhs.is_empty() {
        return Err(format!("empty equation side in '{}'", equation));
    }
    Ok((lhs.to_string(), rhs.to_string()))
}

/// Parses an expression string within a namespace.
pub fn parse_expression(input: &str, namespace: &Namespace) -> Result<Expr, String> {
    parse_with_depth(input, namespace, 0)
}

fn parse_with_depth(input: &str, namespace: &Namespace, depth: usize) -> Result<Expr, String> {
    if depth > MAX_EXPANSION_DEPTH {
        return Err("substitution expansion exceeds maximum depth".to_string());
    }
    let tokens = tokenize(input)?;
    if tokens.is_empty() {
        return Err("empty expression".to_string());
    }
    let mut parser = Parser {
        tokens,
        pos: 0,
        namespace,
        depth,
    };
    let expr = parser.parse_sum()?;
    match parser.peek() {
        None => Ok(expr),
        Some(tok) => Err(format!("unexpected trailing token {:?} in '{}'", tok, input)),
    }
}

#[derive(Clone, Debug, PartialEq)]
enum Token {
    Num(f64),
    Ident(String),
    Plus,
    Minus,
    Star,
    Slash,
    DoubleStar,
    LParen,
    RParen,
    Comma,
}

fn tokenize(input: &str) -> Result<Vec<Token>, String> {
    let mut tokens = Vec::new();
    let chars: Vec<char> = input.chars().collect();
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        match c {
            ' ' | '\t' => i += 1,
            '+' => {
                tokens.push(Token::Plus);
                i += 1;
            }
            '-' => {
                tokens.push(Token::Minus);
                i += 1;
            }
            '*' => {
                if i + 1 < chars.len() && chars[i + 1] == '*' {
                    tokens.push(Token::DoubleStar);
                    i += 2;
                } else {
                    tokens.push(Token::Star);
                    i += 1;
                }
            }
            '^' => {
                tokens.push(Token::DoubleStar);
                i += 1;
            }
            '/' => {
                tokens.push(Token::Slash);
                i += 1;
            }
            '(' => {
                tokens.push(Token::LParen);
                i += 1;
            }
            ')' => {
                tokens.push(Token::RParen);
                i += 1;
            }
            ',' => {
                tokens.push(Token::Comma);
                i += 1;
            }
            _ if c.is_ascii_digit() || c == '.' => {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                    i += 1;
                }
                // scientific notation: 1e-3, 2.5E+7
                if i < chars.len() && (chars[i] == 'e' || chars[i] == 'E') {
                    let mut j = i + 1;
                    if j < chars.len() && (chars[j] == '+' || chars[j] == '-') {
                        j += 1;
                    }
                    if j < chars.len() && chars[j].is_ascii_digit() {
                        i = j;
                        while i < chars.len() && chars[i].is_ascii_digit() {
                            i += 1;
                        }
                    }
                }
                let text: String = chars[start..i].iter().collect();
                let value = text
                    .parse::<f64>()
                    .map_err(|_| format!("invalid number '{}'", text))?;
                tokens.push(Token::Num(value));
            }
            _ if c.is_alphabetic() || c == '_' => {
                let start = i;
                while i < chars.len() && (chars[i].is_alphanumeric() || chars[i] == '_') {
                    i += 1;
                }
                tokens.push(Token::Ident(chars[start..i].iter().collect()));
            }
            _ => return Err(format!("unexpected character '{}' in '{}'", c, input)),
        }
    }
    Ok(tokens)
}

struct Parser<'a> {
    tokens: Vec<Token>,
    pos: usize,
    namespace: &'a Namespace,
    depth: usize,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn bump(&mut self) -> Option<Token> {
        let tok = self.tokens.get(self.pos).cloned();
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    fn expect(&mut self, expected: &Token) -> Result<(), String> {
        match self.bump() {
            Some(ref tok) if tok == expected => Ok(()),
            other => Err(format!("expected {:?}, found {:?}", expected, other)),
        }
    }

    fn parse_sum(&mut self) -> Result<Expr, String> {
        let mut expr = self.parse_product()?;
        loop {
            match self.peek() {
                Some(Token::Plus) => {
                    self.bump();
                    expr = expr + self.parse_product()?;
                }
                Some(Token::Minus) => {
                    self.bump();
                    expr = expr - self.parse_product()?;
                }
                _ => return Ok(expr),
            }
        }
    }

    fn parse_product(&mut self) -> Result<Expr, String> {
        let mut expr = self.parse_unary()?;
        loop {
            match self.peek() {
                Some(Token::Star) => {
                    self.bump();
                    expr = expr * self.parse_unary()?;
                }
                Some(Token::Slash) => {
                    self.bump();
                    expr = expr / self.parse_unary()?;
                }
                _ => return Ok(expr),
            }
        }
    }

    fn parse_unary(&mut self) -> Result<Expr, String> {
        if let Some(Token::Minus) = self.peek() {
            self.bump();
            return Ok(Expr::Mul(
                Expr::Const(-1.0).boxed(),
                self.parse_unary()?.boxed(),
            ));
        }
        self.parse_power()
    }

    fn parse_power(&mut self) -> Result<Expr, String> {
        let base = self.parse_atom()?;
        if let Some(Token::DoubleStar) = self.peek() {
            self.bump();
            // right associative, and -n binds to the exponent
            let exp = self.parse_unary()?;
            return Ok(Expr::Pow(base.boxed(), exp.boxed()));
        }
        Ok(base)
    }

    fn parse_atom(&mut self) -> Result<Expr, String> {
        match self.bump() {
            Some(Token::Num(value)) => Ok(Expr::Const(value)),
            Some(Token::LParen) => {
                let inner = self.parse_sum()?;
                self.expect(&Token::RParen)?;
                Ok(inner)
            }
            Some(Token::Ident(name)) => {
                if let Some(Token::LParen) = self.peek() {
                    self.bump();
                    let args = self.parse_arguments()?;
                    self.resolve_call(&name, args)
                } else {
                    self.resolve_name(&name)
                }
            }
            other => Err(format!("unexpected token {:?}", other)),
        }
    }

    fn parse_arguments(&mut self) -> Result<Vec<Expr>, String> {
        let mut args = Vec::new();
        if let Some(Token::RParen) = self.peek() {
            self.bump();
            return Ok(args);
        }
        loop {
            args.push(self.parse_sum()?);
            match self.bump() {
                Some(Token::Comma) => continue,
                Some(Token::RParen) => return Ok(args),
                other => return Err(format!("expected ',' or ')', found {:?}", other)),
            }
        }
    }

    fn resolve_name(&self, name: &str) -> Result<Expr, String> {
        match self.namespace.get(name) {
            Some(NamespaceEntry::Expression(expr)) => Ok(expr.clone()),
            Some(NamespaceEntry::Operator(_)) => Err(format!(
                "operator '{}' requires an argument",
                name
            )),
            Some(NamespaceEntry::Substitution(_)) => Err(format!(
                "substitution '{}' requires call arguments",
                name
            )),
            None => Err(format!("name '{}' is not defined", name)),
        }
    }

    fn resolve_call(&self, name: &str, args: Vec<Expr>) -> Result<Expr, String> {
        match self.namespace.get(name) {
            Some(NamespaceEntry::Operator(spec)) => {
                if args.len() != 1 {
                    return Err(format!(
                        "operator '{}' takes exactly one argument, got {}",
                        name,
                        args.len()
                    ));
                }
                let mut args = args;
                let arg = args
                    .pop()
                    .ok_or_else(|| format!("operator '{}' called without arguments", name))?
                    .boxed();
                Ok(match spec {
                    OperatorSpec::Differentiate {
                        name: op,
                        axis,
                        separable,
                    } => Expr::Diff {
                        op: op.clone(),
                        axis: *axis,
                        separable: *separable,
                        arg,
                    },
                    OperatorSpec::TimeDerivative { name: op } => Expr::TimeDeriv {
                        op: op.clone(),
                        arg,
                    },
                    OperatorSpec::Builtin(builtin) => match builtin {
                        BuiltinFn::Sin => Expr::sin(arg),
                        BuiltinFn::Cos => Expr::cos(arg),
                        BuiltinFn::Exp => Expr::Exp(arg),
                        BuiltinFn::Ln => Expr::Ln(arg),
                    },
                })
            }
            Some(NamespaceEntry::Substitution(mac)) => {
                if args.len() != mac.params.len() {
                    return Err(format!(
                        "substitution '{}' takes {} arguments, got {}",
                        name,
                        mac.params.len(),
                        args.len()
                    ));
                }
                // bind parameters over a copy of the live namespace
                let mut scope = self.namespace.copy();
                scope.allow_overwrites = true;
                for (param, arg) in mac.params.iter().zip(args) {
                    scope
                        .set(param, NamespaceEntry::Expression(arg))
                        .map_err(|e| e.to_string())?;
                }
                parse_with_depth(&mac.body, &scope, self.depth + 1)
            }
            Some(NamespaceEntry::Expression(_)) => {
                Err(format!("'{}' is not callable", name))
            }
            None => Err(format!("name '{}' is not defined", name)),
        }
    }
}
