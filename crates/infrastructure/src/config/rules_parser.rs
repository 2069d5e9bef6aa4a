//! Parses the rule-directive file into [`RuleConfig`] values.
//!
//! ```text
//! addition <CLASS> <TYPE> [ZONE...] {
//!     forward     <HOST[:PORT]>
//!     match       <REGEX...>
//!     answer      <TEMPLATE...>
//!     additional  <TEMPLATE...>
//!     authority   <TEMPLATE...>
//!     fallthrough [ZONE...]
//! }
//! ```
//!
//! `#` starts a comment; double-quoted tokens may contain spaces.
//! Regex and template compilation happens afterwards, when the rule
//! set is built; this parser only validates the grammar.

use synthdns_domain::{
    parse_forward_target, ConfigError, FallthroughPolicy, QueryClass, QueryType, RuleConfig,
};

pub fn parse_rules(text: &str) -> Result<Vec<RuleConfig>, ConfigError> {
    let mut rules = Vec::new();
    let mut lines = text.lines().enumerate();

    while let Some((idx, raw)) = lines.next() {
        let lineno = idx + 1;
        let tokens = split_tokens(raw, lineno)?;
        if tokens.is_empty() {
            continue;
        }

        if tokens[0] != "addition" {
            return Err(ConfigError::UnexpectedToken(tokens[0].clone(), lineno));
        }
        if tokens.last().map(String::as_str) != Some("{") {
            return Err(ConfigError::UnexpectedToken(
                tokens.last().cloned().unwrap_or_default(),
                lineno,
            ));
        }
        if tokens.len() < 4 {
            return Err(ConfigError::MissingArgument("addition".to_string(), lineno));
        }

        let qclass = QueryClass::from_mnemonic(&tokens[1])
            .ok_or_else(|| ConfigError::InvalidQueryClass(tokens[1].clone()))?;
        let qtype = QueryType::from_mnemonic(&tokens[2])
            .ok_or_else(|| ConfigError::InvalidRecordType(tokens[2].clone()))?;
        let zones = tokens[3..tokens.len() - 1].to_vec();
        let mut rule = RuleConfig::new(qclass, qtype, zones);

        let mut closed = false;
        for (bidx, braw) in lines.by_ref() {
            let blineno = bidx + 1;
            let btokens = split_tokens(braw, blineno)?;
            if btokens.is_empty() {
                continue;
            }
            if btokens[0] == "}" {
                if btokens.len() != 1 {
                    return Err(ConfigError::UnexpectedToken(btokens[1].clone(), blineno));
                }
                closed = true;
                break;
            }

            let directive = btokens[0].as_str();
            let args = &btokens[1..];
            match directive {
                "forward" => {
                    if args.len() != 1 {
                        return Err(ConfigError::MissingArgument(
                            directive.to_string(),
                            blineno,
                        ));
                    }
                    rule.forward = Some(parse_forward_target(&args[0])?);
                }
                "match" => {
                    if args.is_empty() {
                        return Err(ConfigError::MissingArgument(
                            directive.to_string(),
                            blineno,
                        ));
                    }
                    rule.patterns.extend(args.iter().cloned());
                }
                "answer" => {
                    if args.is_empty() {
                        return Err(ConfigError::MissingArgument(
                            directive.to_string(),
                            blineno,
                        ));
                    }
                    rule.answers.extend(args.iter().cloned());
                }
                "additional" => {
                    if args.is_empty() {
                        return Err(ConfigError::MissingArgument(
                            directive.to_string(),
                            blineno,
                        ));
                    }
                    rule.additionals.extend(args.iter().cloned());
                }
                "authority" => {
                    if args.is_empty() {
                        return Err(ConfigError::MissingArgument(
                            directive.to_string(),
                            blineno,
                        ));
                    }
                    rule.authorities.extend(args.iter().cloned());
                }
                "fallthrough" => {
                    rule.fallthrough = FallthroughPolicy::for_zones(args.to_vec());
                }
                other => {
                    return Err(ConfigError::UnknownDirective(other.to_string(), blineno));
                }
            }
        }

        if !closed {
            return Err(ConfigError::Parse(format!(
                "unterminated rule block starting at line {}",
                lineno
            )));
        }
        rules.push(rule);
    }

    Ok(rules)
}

/// Whitespace-separated tokens with quoting: a double-quoted token may
/// contain spaces and escaped characters. `#` outside quotes starts a
/// comment running to the end of the line.
fn split_tokens(line: &str, lineno: usize) -> Result<Vec<String>, ConfigError> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut chars = line.chars();

    while let Some(c) = chars.next() {
        match c {
            c if c.is_whitespace() => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
            }
            '#' => break,
            '"' => {
                loop {
                    match chars.next() {
                        None => {
                            return Err(ConfigError::Parse(format!(
                                "unterminated quote at line {}",
                                lineno
                            )))
                        }
                        Some('"') => break,
                        Some('\\') => match chars.next() {
                            Some(c2) => current.push(c2),
                            None => {
                                return Err(ConfigError::Parse(format!(
                                    "unterminated quote at line {}",
                                    lineno
                                )))
                            }
                        },
                        Some(c2) => current.push(c2),
                    }
                }
                tokens.push(std::mem::take(&mut current));
            }
            c => current.push(c),
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }

    Ok(tokens)
}
