//! Parses rendered template text into resource records.
//!
//! One record per template, in the standard zone-file line form
//! `owner [ttl] [class] type rdata...`. TTL defaults to 3600 and class
//! to IN when omitted; TTL and class may appear in either order.

use hickory_proto::rr::rdata::{A, AAAA, CNAME, MX, NS, PTR, SOA, SRV, TXT};
use hickory_proto::rr::{DNSClass, Name, RData, Record};
use std::net::{Ipv4Addr, Ipv6Addr};
use std::str::FromStr;
use synthdns_domain::DomainError;

const DEFAULT_TTL: u32 = 3600;

pub fn parse_record(text: &str) -> Result<Record, DomainError> {
    let tokens = tokenize(text)?;
    let mut tokens = tokens.into_iter();

    let owner = tokens
        .next()
        .ok_or_else(|| DomainError::RecordParse("empty record text".to_string()))?;
    let name = Name::from_str(&owner)
        .map_err(|e| DomainError::RecordParse(format!("bad owner name '{}': {}", owner, e)))?;

    let mut ttl: Option<u32> = None;
    let mut class: Option<DNSClass> = None;
    let type_token = loop {
        let token = tokens.next().ok_or_else(|| {
            DomainError::RecordParse(format!("missing record type after '{}'", owner))
        })?;
        if ttl.is_none() && token.chars().all(|c| c.is_ascii_digit()) {
            ttl = Some(token.parse::<u32>().map_err(|e| {
                DomainError::RecordParse(format!("bad TTL '{}': {}", token, e))
            })?);
        } else if class.is_none() && parse_class(&token).is_some() {
            class = parse_class(&token);
        } else {
            break token;
        }
    };

    let rdata_tokens: Vec<String> = tokens.collect();
    let rdata = parse_rdata(&type_token, &rdata_tokens)?;

    let mut record = Record::from_rdata(name, ttl.unwrap_or(DEFAULT_TTL), rdata);
    record.dns_class = class.unwrap_or(DNSClass::IN);
    Ok(record)
}

/// Zone-file text for a record in the subset this parser accepts, so a
/// parsed record can be re-serialized and re-parsed identically.
pub fn record_to_text(record: &Record) -> Result<String, DomainError> {
    let rdata = match &record.data {
        RData::A(a) => a.0.to_string(),
        RData::AAAA(aaaa) => aaaa.0.to_string(),
        RData::CNAME(cname) => cname.0.to_string(),
        RData::NS(ns) => ns.0.to_string(),
        RData::PTR(ptr) => ptr.0.to_string(),
        RData::TXT(txt) => txt
            .txt_data
            .iter()
            .map(|part| format!("\"{}\"", String::from_utf8_lossy(part)))
            .collect::<Vec<_>>()
            .join(" "),
        RData::MX(mx) => format!("{} {}", mx.preference, mx.exchange),
        RData::SRV(srv) => format!(
            "{} {} {} {}",
            srv.priority,
            srv.weight,
            srv.port,
            srv.target
        ),
        RData::SOA(soa) => format!(
            "{} {} {} {} {} {} {}",
            soa.mname,
            soa.rname,
            soa.serial,
            soa.refresh,
            soa.retry,
            soa.expire,
            soa.minimum
        ),
        _ => {
            return Err(DomainError::RecordParse(format!(
                "unsupported record type {}",
                record.record_type()
            )))
        }
    };

    Ok(format!(
        "{} {} {} {} {}",
        record.name,
        record.ttl,
        record.dns_class,
        record.record_type(),
        rdata
    ))
}

fn parse_class(token: &str) -> Option<DNSClass> {
    match token.to_ascii_uppercase().as_str() {
        "IN" => Some(DNSClass::IN),
        "CH" => Some(DNSClass::CH),
        "HS" => Some(DNSClass::HS),
        "NONE" => Some(DNSClass::NONE),
        "ANY" => Some(DNSClass::ANY),
        _ => None,
    }
}

fn parse_rdata(type_token: &str, tokens: &[String]) -> Result<RData, DomainError> {
    let expect = |n: usize| -> Result<(), DomainError> {
        if tokens.len() != n {
            return Err(DomainError::RecordParse(format!(
                "{} record expects {} rdata field(s), got {}",
                type_token.to_ascii_uppercase(),
                n,
                tokens.len()
            )));
        }
        Ok(())
    };

    match type_token.to_ascii_uppercase().as_str() {
        "A" => {
            expect(1)?;
            let ip = Ipv4Addr::from_str(&tokens[0]).map_err(|e| {
                DomainError::RecordParse(format!("bad A address '{}': {}", tokens[0], e))
            })?;
            Ok(RData::A(A(ip)))
        }
        "AAAA" => {
            expect(1)?;
            let ip = Ipv6Addr::from_str(&tokens[0]).map_err(|e| {
                DomainError::RecordParse(format!("bad AAAA address '{}': {}", tokens[0], e))
            })?;
            Ok(RData::AAAA(AAAA(ip)))
        }
        "CNAME" => Ok(RData::CNAME(CNAME(parse_one_name(type_token, tokens)?))),
        "NS" => Ok(RData::NS(NS(parse_one_name(type_token, tokens)?))),
        "PTR" => Ok(RData::PTR(PTR(parse_one_name(type_token, tokens)?))),
        "TXT" => {
            if tokens.is_empty() {
                return Err(DomainError::RecordParse(
                    "TXT record expects at least one string".to_string(),
                ));
            }
            Ok(RData::TXT(TXT::new(tokens.to_vec())))
        }
        "MX" => {
            expect(2)?;
            let preference = parse_number::<u16>("MX preference", &tokens[0])?;
            let exchange = parse_name("MX exchange", &tokens[1])?;
            Ok(RData::MX(MX::new(preference, exchange)))
        }
        "SRV" => {
            expect(4)?;
            let priority = parse_number::<u16>("SRV priority", &tokens[0])?;
            let weight = parse_number::<u16>("SRV weight", &tokens[1])?;
            let port = parse_number::<u16>("SRV port", &tokens[2])?;
            let target = parse_name("SRV target", &tokens[3])?;
            Ok(RData::SRV(SRV::new(priority, weight, port, target)))
        }
        "SOA" => {
            expect(7)?;
            let mname = parse_name("SOA mname", &tokens[0])?;
            let rname = parse_name("SOA rname", &tokens[1])?;
            let serial = parse_number::<u32>("SOA serial", &tokens[2])?;
            let refresh = parse_number::<i32>("SOA refresh", &tokens[3])?;
            let retry = parse_number::<i32>("SOA retry", &tokens[4])?;
            let expire = parse_number::<i32>("SOA expire", &tokens[5])?;
            let minimum = parse_number::<u32>("SOA minimum", &tokens[6])?;
            Ok(RData::SOA(SOA::new(
                mname, rname, serial, refresh, retry, expire, minimum,
            )))
        }
        other => Err(DomainError::RecordParse(format!(
            "unknown record type keyword '{}'",
            other
        ))),
    }
}

fn parse_one_name(type_token: &str, tokens: &[String]) -> Result<Name, DomainError> {
    if tokens.len() != 1 {
        return Err(DomainError::RecordParse(format!(
            "{} record expects exactly one name",
            type_token.to_ascii_uppercase()
        )));
    }
    parse_name(type_token, &tokens[0])
}

fn parse_name(what: &str, token: &str) -> Result<Name, DomainError> {
    Name::from_str(token)
        .map_err(|e| DomainError::RecordParse(format!("bad {} '{}': {}", what, token, e)))
}

fn parse_number<T: FromStr>(what: &str, token: &str) -> Result<T, DomainError>
where
    T::Err: std::fmt::Display,
{
    token
        .parse::<T>()
        .map_err(|e| DomainError::RecordParse(format!("bad {} '{}': {}", what, token, e)))
}

/// Whitespace-separated tokens; double quotes group a token and may
/// contain escaped characters (needed for TXT strings).
fn tokenize(text: &str) -> Result<Vec<String>, DomainError> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut chars = text.chars();

    while let Some(c) = chars.next() {
        match c {
            c if c.is_whitespace() => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
            }
            '"' => {
                loop {
                    match chars.next() {
                        None => {
                            return Err(DomainError::RecordParse(
                                "unterminated quoted string".to_string(),
                            ))
                        }
                        Some('"') => break,
                        Some('\\') => match chars.next() {
                            Some(c2) => current.push(c2),
                            None => {
                                return Err(DomainError::RecordParse(
                                    "unterminated quoted string".to_string(),
                                ))
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
