use serde::{Deserialize, Serialize};
use std::fmt;

/// Numeric DNS query class. `ANY` (255) is the wildcard sentinel: a rule
/// configured with it accepts every query class, and a query carrying it
/// satisfies any rule class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QueryClass(pub u16);

impl QueryClass {
    pub const IN: QueryClass = QueryClass(1);
    pub const CH: QueryClass = QueryClass(3);
    pub const HS: QueryClass = QueryClass(4);
    pub const NONE: QueryClass = QueryClass(254);
    pub const ANY: QueryClass = QueryClass(255);

    pub fn from_mnemonic(s: &str) -> Option<Self> {
        match s.to_ascii_uppercase().as_str() {
            "IN" => Some(Self::IN),
            "CH" => Some(Self::CH),
            "HS" => Some(Self::HS),
            "NONE" => Some(Self::NONE),
            "ANY" => Some(Self::ANY),
            _ => None,
        }
    }

    pub fn is_any(self) -> bool {
        self == Self::ANY
    }

    /// Wildcard-aware class filter: `ANY` on either side relaxes the
    /// check, otherwise the values must be equal.
    pub fn accepts(self, query: QueryClass) -> bool {
        self.is_any() || query.is_any() || self == query
    }

    pub fn label(self) -> String {
        match self {
            Self::IN => "IN".to_string(),
            Self::CH => "CH".to_string(),
            Self::HS => "HS".to_string(),
            Self::NONE => "NONE".to_string(),
            Self::ANY => "ANY".to_string(),
            QueryClass(n) => format!("CLASS{}", n),
        }
    }
}

impl fmt::Display for QueryClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Numeric DNS record type, with the same `ANY` wildcard convention as
/// [`QueryClass`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QueryType(pub u16);

const TYPE_MNEMONICS: &[(&str, u16)] = &[
    ("A", 1),
    ("NS", 2),
    ("CNAME", 5),
    ("SOA", 6),
    ("PTR", 12),
    ("HINFO", 13),
    ("MX", 15),
    ("TXT", 16),
    ("AAAA", 28),
    ("SRV", 33),
    ("NAPTR", 35),
    ("DS", 43),
    ("RRSIG", 46),
    ("NSEC", 47),
    ("DNSKEY", 48),
    ("SVCB", 64),
    ("HTTPS", 65),
    ("ANY", 255),
    ("CAA", 257),
];

impl QueryType {
    pub const A: QueryType = QueryType(1);
    pub const AAAA: QueryType = QueryType(28);
    pub const ANY: QueryType = QueryType(255);

    pub fn from_mnemonic(s: &str) -> Option<Self> {
        let upper = s.to_ascii_uppercase();
        TYPE_MNEMONICS
            .iter()
            .find(|(m, _)| *m == upper)
            .map(|(_, n)| QueryType(*n))
    }

    pub fn is_any(self) -> bool {
        self == Self::ANY
    }

    pub fn accepts(self, query: QueryType) -> bool {
        self.is_any() || query.is_any() || self == query
    }

    pub fn label(self) -> String {
        TYPE_MNEMONICS
            .iter()
            .find(|(_, n)| *n == self.0)
            .map(|(m, _)| m.to_string())
            .unwrap_or_else(|| format!("TYPE{}", self.0))
    }
}

impl fmt::Display for QueryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}
