use std::time::Duration;

use serde::Deserialize;

use crate::DexError;

/// Remote provider of the ordered species list.
pub(crate) trait SpeciesSource: Send + Sync {
    /// Full ordered list in one request. Position `i` (0-based) becomes index `i + 1`.
    fn fetch_species_list(&self) -> Result<Vec<String>, DexError>;

    fn fetch_species_name(&self, number: u32) -> Result<String, DexError>;
}

#[derive(Debug, Deserialize)]
struct SpeciesListResponse {
    results: Vec<NamedResource>,
}

#[derive(Debug, Deserialize)]
struct NamedResource {
    name: String,
}

pub(crate) struct PokeApiSource {
    agent: ureq::Agent,
    base_url: String,
    list_limit: u32,
}

impl PokeApiSource {
    pub(crate) fn new(base_url: &str, list_limit: u32, timeout_ms: u64) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout_connect(Duration::from_millis(timeout_ms))
            .timeout_read(Duration::from_millis(timeout_ms))
            .build();
        Self {
            agent,
            base_url: base_url.trim_end_matches('/').to_string(),
            list_limit,
        }
    }

    fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<T, DexError> {
        match self.agent.get(url).call() {
            Ok(resp) if resp.status() != 200 => Err(DexError::SourceUnavailable(format!(
                "{url}: status {}",
                resp.status()
            ))),
            Ok(resp) => resp
                .into_json::<T>()
                .map_err(|e| DexError::SourceUnavailable(format!("{url}: decode: {e}"))),
            Err(ureq::Error::Status(code, _)) => {
                Err(DexError::SourceUnavailable(format!("{url}: status {code}")))
            }
            Err(err) => Err(DexError::SourceUnavailable(format!("{url}: {err}"))),
        }
    }
}

impl SpeciesSource for PokeApiSource {
    fn fetch_species_list(&self) -> Result<Vec<String>, DexError> {
        let url = format!("{}/pokemon-species?limit={}", self.base_url, self.list_limit);
        let body: SpeciesListResponse = self.get_json(&url)?;
        Ok(body.results.into_iter().map(|r| r.name).collect())
    }

    fn fetch_species_name(&self, number: u32) -> Result<String, DexError> {
        let url = format!("{}/pokemon-species/{number}", self.base_url);
        let body: NamedResource = self.get_json(&url)?;
        Ok(body.name)
    }
}


#[cfg(test)]
pub(crate) mod testing {
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::SpeciesSource;
    use crate::DexError;

    /// In-memory source that counts how often each operation is hit.
    #[derive(Default)]
    pub(crate) struct StubSource {
        pub(crate) list: Option<Vec<String>>,
        pub(crate) singles: Mutex<HashMap<u32, String>>,
        pub(crate) list_calls: AtomicUsize,
        pub(crate) single_calls: AtomicUsize,
    }

    impl StubSource {
        pub(crate) fn with_list(names: &[&str]) -> Self {
            Self {
                list: Some(names.iter().map(|n| n.to_string()).collect()),
                ..Default::default()
            }
        }

        pub(crate) fn unavailable() -> Self {
            Self::default()
        }

        pub(crate) fn single(self, number: u32, name: &str) -> Self {
            self.singles
                .lock()
                .unwrap()
                .insert(number, name.to_string());
            self
        }

        pub(crate) fn list_calls(&self) -> usize {
            self.list_calls.load(Ordering::SeqCst)
        }

        pub(crate) fn single_calls(&self) -> usize {
            self.single_calls.load(Ordering::SeqCst)
        }
    }

    impl SpeciesSource for StubSource {
        fn fetch_species_list(&self) -> Result<Vec<String>, DexError> {
            self.list_calls.fetch_add(1, Ordering::SeqCst);
            self.list
                .clone()
                .ok_or_else(|| DexError::SourceUnavailable("stub: status 500".into()))
        }

        fn fetch_species_name(&self, number: u32) -> Result<String, DexError> {
            self.single_calls.fetch_add(1, Ordering::SeqCst);
            self.singles
                .lock()
                .unwrap()
                .get(&number)
                .cloned()
                .ok_or_else(|| DexError::SourceUnavailable(format!("stub: no species {number}")))
        }
    }
}
