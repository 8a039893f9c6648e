//! In-memory versioned [`RemoteStore`].

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::io;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use sweep_store::{
    ListPage, ListRequest, ListedObject, Marker, RemoteStore, StoreError, StoreResult,
};

use super::gate::CallGate;

/// Recorded [`RemoteStore::list`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListCall {
    pub container: String,
    pub prefix: String,
    pub limit: usize,
    pub marker: Option<Marker>,
    pub versioned: bool,
}

/// Recorded [`RemoteStore::delete`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteCall {
    pub container: String,
    pub key: String,
    pub version: Option<String>,
}

/// Failure injected for every delete of one key.
#[derive(Debug, Clone)]
enum Fault {
    Protected(String),
    VersionConflict(String),
    Network,
    Other(String),
}

impl Fault {
    fn to_error(&self) -> StoreError {
        match self {
            Self::Protected(reason) => StoreError::protected(reason.as_str()),
            Self::VersionConflict(reason) => StoreError::version_conflict(reason.as_str()),
            Self::Network => StoreError::network(io::Error::new(
                io::ErrorKind::ConnectionRefused,
                "connection refused",
            )),
            Self::Other(message) => StoreError::other(message.as_str()),
        }
    }
}

#[derive(Debug, Default)]
struct MockState {
    /// container -> key -> versions
    containers: BTreeMap<String, BTreeMap<String, BTreeSet<String>>>,
    faults: HashMap<String, Fault>,
    listing_failure: Option<String>,
    list_gate: Option<CallGate>,
    delete_gate: Option<CallGate>,
    list_calls: Vec<ListCall>,
    delete_calls: Vec<DeleteCall>,
    next_version: u64,
}

/// In-memory [`RemoteStore`] with failure injection and call logs.
///
/// Clones share state, so a test can keep one handle while the task under
/// test owns another.
#[derive(Debug, Clone, Default)]
pub struct MockRemoteStore {
    state: Arc<Mutex<MockState>>,
}

impl MockRemoteStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty container.
    pub fn add_container(&self, container: &str) -> &Self {
        self.lock().containers.entry(container.to_owned()).or_default();
        self
    }

    /// Adds an object with a freshly generated version id.
    pub fn add_object(&self, container: &str, key: &str) -> &Self {
        let mut state = self.lock();
        state.next_version += 1;
        let version = format!("v{:04}", state.next_version);
        state
            .containers
            .entry(container.to_owned())
            .or_default()
            .entry(key.to_owned())
            .or_default()
            .insert(version);
        drop(state);
        self
    }

    /// Adds objects under `container` in one call.
    pub fn add_objects(&self, container: &str, keys: &[&str]) -> &Self {
        for key in keys {
            self.add_object(container, key);
        }
        self
    }

    /// Adds an explicit version of an object.
    pub fn add_version(&self, container: &str, key: &str, version: &str) -> &Self {
        self.lock()
            .containers
            .entry(container.to_owned())
            .or_default()
            .entry(key.to_owned())
            .or_default()
            .insert(version.to_owned());
        self
    }

    /// Makes every delete of `key` fail as protected.
    pub fn protect(&self, key: &str) -> &Self {
        self.set_fault(key, Fault::Protected("object is under a retention lock".into()))
    }

    /// Makes every delete of `key` fail with a version conflict.
    pub fn conflict_on(&self, key: &str) -> &Self {
        self.set_fault(
            key,
            Fault::VersionConflict("the latest version cannot be deleted".into()),
        )
    }

    /// Makes every delete of `key` fail with a connectivity error.
    pub fn fail_network_on(&self, key: &str) -> &Self {
        self.set_fault(key, Fault::Network)
    }

    /// Makes every delete of `key` fail with an unclassified error.
    pub fn fail_delete_on(&self, key: &str, message: &str) -> &Self {
        self.set_fault(key, Fault::Other(message.to_owned()))
    }

    /// Removes any failure injected for `key`.
    pub fn clear_fault(&self, key: &str) -> &Self {
        self.lock().faults.remove(key);
        self
    }

    /// Makes every listing fail with `message`.
    pub fn fail_listing(&self, message: &str) -> &Self {
        self.lock().listing_failure = Some(message.to_owned());
        self
    }

    /// Routes every subsequent listing through a new [`CallGate`].
    pub fn gate_listings(&self) -> CallGate {
        let gate = CallGate::new();
        self.lock().list_gate = Some(gate.clone());
        gate
    }

    /// Routes every subsequent delete through a new [`CallGate`].
    pub fn gate_deletes(&self) -> CallGate {
        let gate = CallGate::new();
        self.lock().delete_gate = Some(gate.clone());
        gate
    }

    /// Returns `true` if any version of `key` is stored.
    pub fn contains(&self, container: &str, key: &str) -> bool {
        self.lock()
            .containers
            .get(container)
            .is_some_and(|keys| keys.contains_key(key))
    }

    /// Returns the stored versions of `key`, oldest id first.
    pub fn versions(&self, container: &str, key: &str) -> Vec<String> {
        self.lock()
            .containers
            .get(container)
            .and_then(|keys| keys.get(key))
            .map(|versions| versions.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Returns the stored keys of `container` in order.
    pub fn keys(&self, container: &str) -> Vec<String> {
        self.lock()
            .containers
            .get(container)
            .map(|keys| keys.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Returns the number of stored keys in `container`.
    pub fn object_count(&self, container: &str) -> usize {
        self.lock()
            .containers
            .get(container)
            .map_or(0, BTreeMap::len)
    }

    /// Returns every list call made so far.
    pub fn list_calls(&self) -> Vec<ListCall> {
        self.lock().list_calls.clone()
    }

    /// Returns every delete call made so far, including failed ones.
    pub fn delete_calls(&self) -> Vec<DeleteCall> {
        self.lock().delete_calls.clone()
    }

    fn set_fault(&self, key: &str, fault: Fault) -> &Self {
        self.lock().faults.insert(key.to_owned(), fault);
        self
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Position of one listed entry; versioned listings carry the version.
type Position = (String, Option<String>);

fn encode_marker(position: &Position) -> StoreResult<Marker> {
    serde_json::to_string(position)
        .map(Marker::new)
        .map_err(|e| StoreError::other("cannot encode marker").with_source(e))
}

fn decode_marker(marker: &Marker) -> StoreResult<Position> {
    serde_json::from_str(marker.as_str())
        .map_err(|e| StoreError::invalid_marker(format!("{marker}: {e}")))
}

#[async_trait::async_trait]
impl RemoteStore for MockRemoteStore {
    async fn list(&self, request: ListRequest<'_>) -> StoreResult<ListPage> {
        let gate = {
            let mut state = self.lock();
            state.list_calls.push(ListCall {
                container: request.container.to_owned(),
                prefix: request.prefix.to_owned(),
                limit: request.limit,
                marker: request.marker.cloned(),
                versioned: request.versioned,
            });
            state.list_gate.clone()
        };

        if let Some(gate) = gate {
            gate.pass().await?;
        }

        let state = self.lock();
        if let Some(message) = &state.listing_failure {
            return Err(StoreError::other(message.as_str()));
        }

        let keys = state
            .containers
            .get(request.container)
            .ok_or_else(|| StoreError::container_not_found(request.container))?;

        if request.limit == 0 {
            return Ok(ListPage::default());
        }

        let after = request.marker.map(decode_marker).transpose()?;

        let mut positions: Vec<Position> = keys
            .iter()
            .filter(|(key, _)| key.starts_with(request.prefix))
            .flat_map(|(key, versions)| {
                let entries: Vec<Position> = if request.versioned {
                    versions
                        .iter()
                        .map(|version| (key.clone(), Some(version.clone())))
                        .collect()
                } else {
                    vec![(key.clone(), None)]
                };
                entries
            })
            .filter(|position| after.as_ref().is_none_or(|after| position > after))
            .take(request.limit + 1)
            .collect();

        let has_more = positions.len() > request.limit;
        positions.truncate(request.limit);

        let next_marker = match positions.last() {
            Some(last) if has_more => Some(encode_marker(last)?),
            _ => None,
        };

        let items = positions
            .into_iter()
            .map(|(key, version)| match version {
                Some(version) => ListedObject::versioned(key, version),
                None => ListedObject::new(key),
            })
            .collect();

        Ok(ListPage::new(items, next_marker))
    }

    async fn delete(&self, container: &str, key: &str, version: Option<&str>) -> StoreResult<()> {
        let gate = {
            let mut state = self.lock();
            state.delete_calls.push(DeleteCall {
                container: container.to_owned(),
                key: key.to_owned(),
                version: version.map(str::to_owned),
            });
            state.delete_gate.clone()
        };

        if let Some(gate) = gate {
            gate.pass().await?;
        }

        let mut state = self.lock();
        if let Some(fault) = state.faults.get(key) {
            return Err(fault.to_error());
        }

        let keys = state
            .containers
            .get_mut(container)
            .ok_or_else(|| StoreError::container_not_found(container))?;

        match version {
            None => {
                keys.remove(key);
            }
            Some(version) => {
                if let Some(versions) = keys.get_mut(key) {
                    versions.remove(version);
                    if versions.is_empty() {
                        keys.remove(key);
                    }
                }
            }
        }

        Ok(())
    }
}
