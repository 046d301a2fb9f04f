//! Relay paths
//!
//! A path pairs two chain endpoints that share a channel. Paths are loaded
//! once from configuration and never change afterwards.

use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// Path lookup and validation errors
#[derive(Debug, Error)]
pub enum PathError {
    #[error("path '{name}' not found (configured: {available})")]
    NotFound { name: String, available: String },
    #[error("{field} must not be empty")]
    EmptyField { field: &'static str },
}

/// One side of a path
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PathEnd {
    pub chain_id: String,
    pub client_id: String,
    pub connection_id: String,
    pub channel_id: String,
    pub port_id: String,
}

impl PathEnd {
    pub fn validate(&self) -> Result<(), PathError> {
        let fields = [
            ("chain_id", &self.chain_id),
            ("client_id", &self.client_id),
            ("connection_id", &self.connection_id),
            ("channel_id", &self.channel_id),
            ("port_id", &self.port_id),
        ];
        for (field, value) in fields {
            if value.is_empty() {
                return Err(PathError::EmptyField { field });
            }
        }
        Ok(())
    }
}

impl fmt::Display for PathEnd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.chain_id, self.port_id, self.channel_id)
    }
}

/// Both ends of a path, as written in configuration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PathSpec {
    pub src: PathEnd,
    pub dst: PathEnd,
}

/// A named, resolved path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Path {
    pub name: String,
    pub src: PathEnd,
    pub dst: PathEnd,
}

/// Which end of a path a keep-alive update originates from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Src,
    Dst,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Src => "src",
            Direction::Dst => "dst",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Named path table
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct Paths(BTreeMap<String, PathSpec>);

impl Paths {
    /// Resolve a path by name
    pub fn get(&self, name: &str) -> Result<Path, PathError> {
        let spec = self.0.get(name).ok_or_else(|| PathError::NotFound {
            name: name.to_string(),
            available: self.0.keys().cloned().collect::<Vec<_>>().join(", "),
        })?;

        Ok(Path {
            name: name.to_string(),
            src: spec.src.clone(),
            dst: spec.dst.clone(),
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &PathSpec)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, PathSpec)> for Paths {
    fn from_iter<I: IntoIterator<Item = (String, PathSpec)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
pub(crate) fn test_path() -> Path {
    let end = |chain: &str, suffix: &str| PathEnd {
        chain_id: chain.to_string(),
        client_id: format!("client{}", suffix),
        connection_id: format!("connection{}", suffix),
        channel_id: format!("channel{}", suffix),
        port_id: "transfer".to_string(),
    };
    Path {
        name: "a-b".to_string(),
        src: end("chain-a", "a"),
        dst: end("chain-b", "b"),
    }
}
