use std::collections::HashMap;

/// Retired jurisdiction access codes and their replacements.
///
/// Injected through configuration so each deployment (and each test) can
/// carry its own table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrationTable {
    entries: HashMap<String, String>,
}

impl MigrationTable {
    pub fn new<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            entries: entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Parses `old=new,old2=new2`. Malformed pairs are skipped.
    pub fn parse(raw: &str) -> Self {
        let entries = raw
            .split(',')
            .filter_map(|pair| {
                let (from, to) = pair.split_once('=')?;
                let (from, to) = (from.trim(), to.trim());
                if from.is_empty() || to.is_empty() {
                    return None;
                }
                Some((from.to_string(), to.to_string()))
            })
            .collect();
        Self { entries }
    }

    pub fn contains(&self, code: &str) -> bool {
        self.entries.contains_key(code)
    }

    /// Replacement code, or the input itself when it was never retired.
    pub fn migrate<'a>(&'a self, code: &'a str) -> &'a str {
        self.entries.get(code).map(String::as_str).unwrap_or(code)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
