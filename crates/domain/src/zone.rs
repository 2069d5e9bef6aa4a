/// Normalizes a zone or query name for suffix matching: lowercased,
/// with a trailing dot.
pub fn normalize(name: &str) -> String {
    let mut n = name.trim().to_ascii_lowercase();
    if !n.ends_with('.') {
        n.push('.');
    }
    n
}

/// Returns `true` if `name` equals `zone` or lies below it. Both inputs
/// must be normalized. The root zone `.` covers every name.
pub fn is_subdomain(name: &str, zone: &str) -> bool {
    if zone == "." {
        return true;
    }
    if name == zone {
        return true;
    }
    name.len() > zone.len()
        && name.ends_with(zone)
        && name.as_bytes()[name.len() - zone.len() - 1] == b'.'
}

/// An ordered collection of zone origins, matched longest-suffix-first.
#[derive(Debug, Clone, Default)]
pub struct ZoneSet {
    zones: Vec<String>,
}

impl ZoneSet {
    pub fn new(zones: impl IntoIterator<Item = String>) -> Self {
        Self {
            zones: zones.into_iter().map(|z| normalize(&z)).collect(),
        }
    }

    pub fn push(&mut self, zone: &str) {
        self.zones.push(normalize(zone));
    }

    pub fn extend(&mut self, zones: &[String]) {
        for z in zones {
            self.push(z);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }

    pub fn zones(&self) -> &[String] {
        &self.zones
    }

    /// Longest configured zone that covers `name`, or `None` when the
    /// name falls outside every zone.
    pub fn matches(&self, name: &str) -> Option<&str> {
        let name = normalize(name);
        let mut best: Option<&str> = None;
        for zone in &self.zones {
            if is_subdomain(&name, zone) {
                match best {
                    Some(b) if b.len() >= zone.len() => {}
                    _ => best = Some(zone),
                }
            }
        }
        best
    }
}
