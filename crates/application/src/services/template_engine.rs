//! Text templates with `{{ expression }}` placeholders, rendered
//! against a [`MatchContext`].
//!
//! Syntax errors surface at compile time; unresolved fields, unknown
//! functions, and failed function application surface at render time.
//! The two stages fail with different error types so they can be
//! counted independently.

use synthdns_domain::{ConfigError, DomainError, MatchContext};

#[derive(Debug, Clone)]
pub struct Template {
    name: String,
    source: String,
    nodes: Vec<Node>,
}

#[derive(Debug, Clone)]
enum Node {
    Text(String),
    Expr(Expr),
}

#[derive(Debug, Clone)]
enum Expr {
    /// `.Name`, `.Group.host`, `.Question.Name`
    Path(Vec<String>),
    /// bare function name, e.g. `parseInt` used without arguments
    Ident(String),
    Str(String),
    Int(u64),
    /// head applied to arguments: `parseInt x`, `index .Match 1`,
    /// `.Meta "key"`
    Call(Box<Expr>, Vec<Expr>),
}

#[derive(Debug, Clone)]
enum Value {
    Str(String),
    Int(u64),
    List(Vec<String>),
}

impl Value {
    fn into_text(self) -> Result<String, DomainError> {
        match self {
            Value::Str(s) => Ok(s),
            Value::Int(n) => Ok(n.to_string()),
            Value::List(_) => Err(DomainError::TemplateRender(
                "cannot render a capture list directly; use index".to_string(),
            )),
        }
    }
}

impl Template {
    /// Parses `text` into a reusable artifact. Placeholder syntax
    /// errors are load-time failures.
    pub fn compile(name: &str, text: &str) -> Result<Self, ConfigError> {
        let syntax = |reason: String| ConfigError::TemplateSyntax {
            name: name.to_string(),
            reason,
        };

        let mut nodes = Vec::new();
        let mut rest = text;
        loop {
            match rest.find("{{") {
                None => {
                    if !rest.is_empty() {
                        nodes.push(Node::Text(rest.to_string()));
                    }
                    break;
                }
                Some(start) => {
                    if start > 0 {
                        nodes.push(Node::Text(rest[..start].to_string()));
                    }
                    let after = &rest[start + 2..];
                    let end = after
                        .find("}}")
                        .ok_or_else(|| syntax("unclosed placeholder".to_string()))?;
                    let expr_src = &after[..end];
                    let expr = parse_expression(expr_src).map_err(syntax)?;
                    nodes.push(Node::Expr(expr));
                    rest = &after[end + 2..];
                }
            }
        }

        Ok(Self {
            name: name.to_string(),
            source: text.to_string(),
            nodes,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The original template text; used as the template identity in
    /// failure counters.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Executes the template against a match context, producing record
    /// text. Fails when an expression references an undefined field or
    /// function, or when function application itself fails.
    pub fn render(&self, ctx: &MatchContext) -> Result<String, DomainError> {
        let mut out = String::with_capacity(self.source.len());
        for node in &self.nodes {
            match node {
                Node::Text(t) => out.push_str(t),
                Node::Expr(e) => {
                    let text = eval(e, ctx)?.into_text()?;
                    out.push_str(&text);
                }
            }
        }
        Ok(out)
    }
}

// ── placeholder expression parsing ─────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Path(Vec<String>),
    Ident(String),
    Str(String),
    Int(u64),
    LParen,
    RParen,
}

fn tokenize(src: &str) -> Result<Vec<Token>, String> {
    let mut tokens = Vec::new();
    let mut chars = src.chars().peekable();

    while let Some(&c) = chars.peek() {
        match c {
            c if c.is_whitespace() => {
                chars.next();
            }
            '(' => {
                chars.next();
                tokens.push(Token::LParen);
            }
            ')' => {
                chars.next();
                tokens.push(Token::RParen);
            }
            '"' => {
                chars.next();
                let mut s = String::new();
                loop {
                    match chars.next() {
                        None => return Err("unterminated string literal".to_string()),
                        Some('"') => break,
                        Some('\\') => match chars.next() {
                            Some('n') => s.push('\n'),
                            Some('t') => s.push('\t'),
                            Some(c2) => s.push(c2),
                            None => return Err("unterminated string literal".to_string()),
                        },
                        Some(c2) => s.push(c2),
                    }
                }
                tokens.push(Token::Str(s));
            }
            '.' => {
                chars.next();
                let mut segments = Vec::new();
                loop {
                    let mut seg = String::new();
                    while let Some(&c2) = chars.peek() {
                        if c2.is_alphanumeric() || c2 == '_' || c2 == '-' || c2 == '/' {
                            seg.push(c2);
                            chars.next();
                        } else {
                            break;
                        }
                    }
                    if seg.is_empty() {
                        return Err("empty field segment after '.'".to_string());
                    }
                    segments.push(seg);
                    if chars.peek() == Some(&'.') {
                        chars.next();
                    } else {
                        break;
                    }
                }
                tokens.push(Token::Path(segments));
            }
            c if c.is_ascii_digit() => {
                let mut n = String::new();
                while let Some(&c2) = chars.peek() {
                    if c2.is_ascii_digit() {
                        n.push(c2);
                        chars.next();
                    } else {
                        break;
                    }
                }
                let value = n
                    .parse::<u64>()
                    .map_err(|e| format!("invalid integer literal '{}': {}", n, e))?;
                tokens.push(Token::Int(value));
            }
            c if c.is_alphabetic() || c == '_' => {
                let mut ident = String::new();
                while let Some(&c2) = chars.peek() {
                    if c2.is_alphanumeric() || c2 == '_' {
                        ident.push(c2);
                        chars.next();
                    } else {
                        break;
                    }
                }
                tokens.push(Token::Ident(ident));
            }
            c => return Err(format!("unexpected character '{}'", c)),
        }
    }

    Ok(tokens)
}

fn parse_expression(src: &str) -> Result<Expr, String> {
    let tokens = tokenize(src)?;
    if tokens.is_empty() {
        return Err("empty placeholder".to_string());
    }
    let mut pos = 0;
    let expr = parse_call(&tokens, &mut pos)?;
    if pos != tokens.len() {
        return Err("unexpected trailing tokens".to_string());
    }
    Ok(expr)
}

/// One or more atoms; a leading path or identifier followed by
/// arguments becomes a call.
fn parse_call(tokens: &[Token], pos: &mut usize) -> Result<Expr, String> {
    let head = parse_atom(tokens, pos)?;
    let mut args = Vec::new();
    while *pos < tokens.len() && tokens[*pos] != Token::RParen {
        args.push(parse_atom(tokens, pos)?);
    }
    if args.is_empty() {
        return Ok(head);
    }
    match head {
        Expr::Path(_) | Expr::Ident(_) => Ok(Expr::Call(Box::new(head), args)),
        _ => Err("can't give arguments to a non-function".to_string()),
    }
}

fn parse_atom(tokens: &[Token], pos: &mut usize) -> Result<Expr, String> {
    let token = tokens
        .get(*pos)
        .ok_or_else(|| "unexpected end of expression".to_string())?;
    *pos += 1;
    match token {
        Token::LParen => {
            let inner = parse_call(tokens, pos)?;
            match tokens.get(*pos) {
                Some(Token::RParen) => {
                    *pos += 1;
                    Ok(inner)
                }
                _ => Err("missing closing parenthesis".to_string()),
            }
        }
        Token::RParen => Err("unexpected ')'".to_string()),
        Token::Path(segments) => Ok(Expr::Path(segments.clone())),
        Token::Ident(name) => Ok(Expr::Ident(name.clone())),
        Token::Str(s) => Ok(Expr::Str(s.clone())),
        Token::Int(n) => Ok(Expr::Int(*n)),
    }
}

// ── evaluation ─────────────────────────────────────────────────────────

fn eval(expr: &Expr, ctx: &MatchContext) -> Result<Value, DomainError> {
    match expr {
        Expr::Str(s) => Ok(Value::Str(s.clone())),
        Expr::Int(n) => Ok(Value::Int(*n)),
        Expr::Path(segments) => resolve_path(segments, ctx),
        Expr::Ident(name) => call_function(name, &[], ctx),
        Expr::Call(head, args) => {
            let args: Vec<Value> = args
                .iter()
                .map(|a| eval(a, ctx))
                .collect::<Result<_, _>>()?;
            match head.as_ref() {
                Expr::Ident(name) => call_function(name, &args, ctx),
                Expr::Path(segments) if segments.len() == 1 && segments[0] == "Meta" => {
                    let key = one_string_arg("Meta", &args)?;
                    Ok(Value::Str(ctx.meta(&key)))
                }
                Expr::Path(segments) => Err(DomainError::TemplateRender(format!(
                    "field .{} is not callable",
                    segments.join(".")
                ))),
                _ => Err(DomainError::TemplateRender(
                    "can't call a non-function".to_string(),
                )),
            }
        }
    }
}

fn resolve_path(segments: &[String], ctx: &MatchContext) -> Result<Value, DomainError> {
    let undefined = || {
        DomainError::TemplateRender(format!("undefined field .{}", segments.join(".")))
    };

    match segments[0].as_str() {
        "Zone" if segments.len() == 1 => Ok(Value::Str(ctx.zone.clone())),
        "Name" if segments.len() == 1 => Ok(Value::Str(ctx.name.clone())),
        "Regex" if segments.len() == 1 => Ok(Value::Str(ctx.regex.clone())),
        "Class" if segments.len() == 1 => Ok(Value::Str(ctx.class.clone())),
        "Type" if segments.len() == 1 => Ok(Value::Str(ctx.qtype.clone())),
        "Remote" if segments.len() == 1 => Ok(Value::Str(ctx.remote.clone())),
        "Match" if segments.len() == 1 => Ok(Value::List(ctx.captures.clone())),
        // Map semantics: a missing group key resolves to "".
        "Group" if segments.len() == 2 => Ok(Value::Str(
            ctx.groups.get(&segments[1]).cloned().unwrap_or_default(),
        )),
        "Question" if segments.len() == 2 => match segments[1].as_str() {
            "Name" => Ok(Value::Str(ctx.question.name.clone())),
            "Class" => Ok(Value::Str(ctx.question.class.clone())),
            "Type" => Ok(Value::Str(ctx.question.qtype.clone())),
            _ => Err(undefined()),
        },
        "Message" if segments.len() == 2 => match segments[1].as_str() {
            "Id" => Ok(Value::Int(u64::from(ctx.message.id))),
            "Opcode" => Ok(Value::Str(ctx.message.opcode.clone())),
            "RecursionDesired" => Ok(Value::Str(ctx.message.recursion_desired.to_string())),
            _ => Err(undefined()),
        },
        "Meta" => Err(DomainError::TemplateRender(
            ".Meta requires a key argument".to_string(),
        )),
        _ => Err(undefined()),
    }
}

fn call_function(name: &str, args: &[Value], ctx: &MatchContext) -> Result<Value, DomainError> {
    match name {
        "parseInt" => {
            let text = one_string_arg("parseInt", args)?;
            let n = text.parse::<u64>().map_err(|e| {
                DomainError::TemplateRender(format!("parseInt: '{}': {}", text, e))
            })?;
            Ok(Value::Int(n))
        }
        "index" => {
            if args.len() != 2 {
                return Err(DomainError::TemplateRender(
                    "index expects a sequence and a position".to_string(),
                ));
            }
            let list = match &args[0] {
                Value::List(items) => items,
                _ => {
                    return Err(DomainError::TemplateRender(
                        "index: first argument is not a sequence".to_string(),
                    ))
                }
            };
            let position = match &args[1] {
                Value::Int(n) => *n as usize,
                Value::Str(s) => s.parse::<usize>().map_err(|e| {
                    DomainError::TemplateRender(format!("index: '{}': {}", s, e))
                })?,
                Value::List(_) => {
                    return Err(DomainError::TemplateRender(
                        "index: position is not a number".to_string(),
                    ))
                }
            };
            list.get(position).cloned().map(Value::Str).ok_or_else(|| {
                DomainError::TemplateRender(format!(
                    "index {} out of range (len {})",
                    position,
                    list.len()
                ))
            })
        }
        "meta" => {
            let key = one_string_arg("meta", args)?;
            Ok(Value::Str(ctx.meta(&key)))
        }
        _ => Err(DomainError::TemplateRender(format!(
            "function \"{}\" not defined",
            name
        ))),
    }
}

fn one_string_arg(func: &str, args: &[Value]) -> Result<String, DomainError> {
    if args.len() != 1 {
        return Err(DomainError::TemplateRender(format!(
            "{} expects exactly one argument",
            func
        )));
    }
    match &args[0] {
        Value::Str(s) => Ok(s.clone()),
        Value::Int(n) => Ok(n.to_string()),
        Value::List(_) => Err(DomainError::TemplateRender(format!(
            "{}: argument is not a string",
            func
        ))),
    }
}
