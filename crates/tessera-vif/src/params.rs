use std::collections::BTreeMap;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParamError {
    #[error("unknown parameter '{name}' for adapter '{adapter}' (recognized: {recognized})")]
    Unknown {
        adapter: String,
        name: String,
        recognized: String,
    },

    #[error("invalid value '{value}' for parameter '{name}': {reason}")]
    InvalidValue {
        name: String,
        value: String,
        reason: String,
    },
}

/// Name/value parameters handed to an adapter at construction.
///
/// Names are checked against the adapter's recognized set up front, so a
/// misspelled parameter fails before the run instead of being ignored.
#[derive(Debug, Clone, Default)]
pub struct AdapterParams {
    values: BTreeMap<String, String>,
}

impl AdapterParams {
    pub fn new<I, K, V>(adapter: &str, recognized: &[&str], pairs: I) -> Result<Self, ParamError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut values = BTreeMap::new();
        for (name, value) in pairs {
            let name = name.into();
            if !recognized.contains(&name.as_str()) {
                return Err(ParamError::Unknown {
                    adapter: adapter.to_string(),
                    name,
                    recognized: if recognized.is_empty() {
                        "none".to_string()
                    } else {
                        recognized.join(", ")
                    },
                });
            }
            values.insert(name, value.into());
        }
        Ok(Self { values })
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    /// Parse a parameter value, if present.
    pub fn parse<T>(&self, name: &str) -> Result<Option<T>, ParamError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        match self.values.get(name) {
            None => Ok(None),
            Some(raw) => raw
                .trim()
                .parse()
                .map(Some)
                .map_err(|e: T::Err| ParamError::InvalidValue {
                    name: name.to_string(),
                    value: raw.clone(),
                    reason: e.to_string(),
                }),
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
