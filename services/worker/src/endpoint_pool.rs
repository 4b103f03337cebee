//! Immutable pool of price-data endpoints
//!
//! Loaded once from a newline-separated credential file. Each line is an RPC
//! URL (on-chain strategy) or an API key (price API strategy).

use rand::Rng;
use std::fmt;
use std::path::Path;

use crate::errors::ConfigError;

/// One access credential or URL. The value never shows up in `Debug` output.
#[derive(Clone, PartialEq, Eq)]
pub struct Endpoint(String);

impl Endpoint {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Endpoint(<{} chars>)", self.0.len())
    }
}

#[derive(Debug, Clone)]
pub struct EndpointPool {
    endpoints: Vec<Endpoint>,
}

impl EndpointPool {
    /// Read the endpoint file. Unreadable or empty files are fatal config errors.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::EndpointsUnreadable {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_lines(&raw, path)
    }

    pub fn from_lines(raw: &str, source: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let endpoints: Vec<Endpoint> = raw
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(Endpoint::new)
            .collect();

        if endpoints.is_empty() {
            return Err(ConfigError::EndpointsEmpty {
                path: source.as_ref().to_path_buf(),
            });
        }

        Ok(Self { endpoints })
    }

    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Endpoint> {
        self.endpoints.get(index)
    }

    /// Uniformly random endpoint and its pool index (the index is what gets logged).
    pub fn pick_random(&self) -> (usize, &Endpoint) {
        self.pick_random_with(&mut rand::thread_rng())
    }

    pub fn pick_random_with<R: Rng + ?Sized>(&self, rng: &mut R) -> (usize, &Endpoint) {
        let index = rng.gen_range(0..self.endpoints.len());
        (index, &self.endpoints[index])
    }
}
