use serde::ser::{Serialize, SerializeMap, Serializer};

use onsong::ast::{FlowItem, Metatag, MetatagValue};
use onsong::parser::metadata::normalize_name;

/// Name lookup over a song's metatags. Order and duplicates are kept; the
/// single-value accessors return the first occurrence.
#[derive(Debug, Clone, Copy)]
pub struct Metadata<'a> {
    tags: &'a [Metatag],
}

impl<'a> Metadata<'a> {
    pub fn new(tags: &'a [Metatag]) -> Self {
        Metadata { tags }
    }

    /// First value for `name`. Lookup is case-insensitive and understands
    /// aliases, so `get("ST")` finds the artist.
    pub fn get(&self, name: &str) -> Option<&'a MetatagValue> {
        self.get_all(name).next()
    }

    pub fn get_all(self, name: &str) -> impl Iterator<Item = &'a MetatagValue> + use<'a> {
        let name = normalize_name(name);
        self.tags
            .iter()
            .filter(move |tag| tag.name == name)
            .map(|tag| &tag.value)
    }

    /// Text value for `name`; `None` for a missing tag or for `flow`.
    pub fn text(&self, name: &str) -> Option<&'a str> {
        match self.get(name)? {
            MetatagValue::Text(text) => Some(text),
            MetatagValue::Flow(_) => None,
        }
    }

    pub fn iter(self) -> impl Iterator<Item = (&'a str, &'a MetatagValue)> + 'a {
        self.tags.iter().map(|tag| (tag.name.as_str(), &tag.value))
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    pub fn title(&self) -> Option<&'a str> {
        self.text("title")
    }

    pub fn artist(&self) -> Option<&'a str> {
        self.text("artist")
    }

    pub fn key(&self) -> Option<&'a str> {
        self.text("key")
    }

    pub fn tempo(&self) -> Option<&'a str> {
        self.text("tempo")
    }

    pub fn time(&self) -> Option<&'a str> {
        self.text("time")
    }

    pub fn flow(&self) -> Option<&'a [FlowItem]> {
        match self.get("flow")? {
            MetatagValue::Flow(items) => Some(items),
            MetatagValue::Text(_) => None,
        }
    }
}

/// Serializes as a `name -> value` map holding the first value per name.
impl Serialize for Metadata<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seen: Vec<&str> = Vec::new();
        let mut map = serializer.serialize_map(None)?;
        for (name, value) in self.iter() {
            if seen.contains(&name) {
                continue;
            }
            seen.push(name);
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}
