use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;

use crate::code::PrimaryKey;
use crate::store::{DefinitionsStore, StoreError};

/// Definitions read from properties files: one `code = WKT` pair per entry.
///
/// The usual properties syntax is supported: `#` and `!` comments, `=`, `:` or whitespace
/// between the key and the value, lines continued with a trailing backslash and the `\t`,
/// `\n`, `\r`, `\f`, `\uXXXX` escapes.
///
/// The store is loaded once. Cloning it is cheap and the clones share the definitions.
#[derive(Debug, Clone, Default)]
pub struct PropertiesStore {
    definitions: Arc<BTreeMap<String, String>>,
    mentions_axes: bool,
}

impl PropertiesStore {
    /// Merges the given sources. When a key is defined by several sources, the first source
    /// wins.
    pub fn from_sources<'a>(sources: impl IntoIterator<Item = &'a str>) -> Self {
        let mut definitions = BTreeMap::new();
        for (index, source) in sources.into_iter().enumerate() {
            for (key, value) in parse_properties(source) {
                match definitions.get(&key) {
                    Some(existing) if existing != &value => {
                        log::warn!(
                            "Definition of {key} in source {index} is ignored: it is already defined by a previous source"
                        );
                    }
                    Some(_) => {}
                    None => {
                        definitions.insert(key, value);
                    }
                }
            }
        }

        let mentions_axes = definitions
            .values()
            .any(|definition| geotoolkit_wkt::declares_axes(definition));
        if !mentions_axes {
            log::debug!("No definition declares axes, axis order hints will be ignored");
        }

        Self {
            definitions: Arc::new(definitions),
            mentions_axes,
        }
    }

    /// Reads and merges the given files. The first file wins on key collisions.
    pub fn from_files(paths: &[impl AsRef<Path>]) -> Result<Self, StoreError> {
        let sources = paths
            .iter()
            .map(|path| {
                log::debug!("Loading definitions from {:?}", path.as_ref());
                std::fs::read_to_string(path)
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self::from_sources(sources.iter().map(String::as_str)))
    }

    /// Number of definitions.
    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    /// Returns true if the store has no definitions.
    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}

impl DefinitionsStore for PropertiesStore {
    fn get(&self, key: &PrimaryKey) -> Result<Option<String>, StoreError> {
        let value = match key {
            PrimaryKey::Text(text) => self.definitions.get(text),
            PrimaryKey::Integer(value) => self.definitions.get(&value.to_string()),
        };

        Ok(value.cloned())
    }

    fn codes(&self) -> Result<BTreeSet<String>, StoreError> {
        Ok(self.definitions.keys().cloned().collect())
    }

    fn mentions_axes(&self) -> bool {
        self.mentions_axes
    }
}

fn parse_properties(source: &str) -> Vec<(String, String)> {
    let mut entries = vec![];
    let mut lines = source.lines();

    while let Some(line) = lines.next() {
        let line = line.trim_start();
        if line.is_empty() || line.starts_with('#') || line.starts_with('!') {
            continue;
        }

        let mut logical = line.to_string();
        while ends_with_continuation(&logical) {
            logical.pop();
            match lines.next() {
                Some(next) => logical.push_str(next.trim_start()),
                None => break,
            }
        }

        entries.push(split_entry(&logical));
    }

    entries
}

fn ends_with_continuation(line: &str) -> bool {
    line.chars().rev().take_while(|c| *c == '\\').count() % 2 == 1
}

fn split_entry(line: &str) -> (String, String) {
    let mut chars = line.chars().peekable();
    let mut key = String::new();

    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                if let Some(escaped) = chars.next() {
                    push_escaped(&mut key, escaped, &mut chars);
                }
            }
            '=' | ':' => break,
            c if c.is_whitespace() => {
                while chars.next_if(|c| c.is_whitespace()).is_some() {}
                if let Some('=' | ':') = chars.peek() {
                    chars.next();
                }
                break;
            }
            c => key.push(c),
        }
    }

    while chars.next_if(|c| c.is_whitespace()).is_some() {}

    let mut value = String::new();
    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                if let Some(escaped) = chars.next() {
                    push_escaped(&mut value, escaped, &mut chars);
                }
            }
            c => value.push(c),
        }
    }

    (key, value)
}

fn push_escaped(target: &mut String, escaped: char, chars: &mut impl Iterator<Item = char>) {
    match escaped {
        't' => target.push('\t'),
        'n' => target.push('\n'),
        'r' => target.push('\r'),
        'f' => target.push('\u{c}'),
        'u' => {
            let hex: String = chars.take(4).collect();
            match u32::from_str_radix(&hex, 16).ok().and_then(char::from_u32) {
                Some(c) => target.push(c),
                None => {
                    log::warn!("Invalid unicode escape \\u{hex} in properties");
                    target.push_str(&hex);
                }
            }
        }
        c => target.push(c),
    }
}
