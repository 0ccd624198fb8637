use crate::error::{Result, SkySettleError};
use crate::types::{parse_date, FlightQuery, DATE_FORMAT};
use std::collections::HashMap;
use std::path::PathBuf;
use tracing::{debug, warn};

pub const FLIGHT_NUMBER_KEY: &str = "flightNumber";
pub const FLIGHT_DATE_KEY: &str = "flightDate";

/// Session-scoped key/value side channel
pub trait SessionStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&mut self, key: &str, value: &str) -> Result<()>;
    fn remove(&mut self, key: &str) -> Result<()>;
}

/// Remember the submitted flight for follow-up requests.
pub fn store_query(store: &mut dyn SessionStore, query: &FlightQuery) -> Result<()> {
    store.set(FLIGHT_NUMBER_KEY, &query.flight_number)?;
    store.set(
        FLIGHT_DATE_KEY,
        &query.flight_date.format(DATE_FORMAT).to_string(),
    )
}

/// The last submitted flight, or [`SkySettleError::MissingQuery`] if there is none.
pub fn load_query(store: &dyn SessionStore) -> Result<FlightQuery> {
    let flight_number = store.get(FLIGHT_NUMBER_KEY)?;
    let flight_date = store.get(FLIGHT_DATE_KEY)?;

    match (flight_number, flight_date) {
        (Some(flight_number), Some(flight_date)) if !flight_number.is_empty() => {
            Ok(FlightQuery {
                flight_number,
                flight_date: parse_date(&flight_date)?,
            })
        }
        _ => Err(SkySettleError::MissingQuery),
    }
}

pub fn clear_query(store: &mut dyn SessionStore) -> Result<()> {
    store.remove(FLIGHT_NUMBER_KEY)?;
    store.remove(FLIGHT_DATE_KEY)
}

/// Store that lives as long as the interactive session
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    values: HashMap<String, String>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemorySessionStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.values.remove(key);
        Ok(())
    }
}

/// Store backed by a JSON file, so separate one-shot commands can share the
/// last submitted flight
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    fn read_all(&self) -> Result<HashMap<String, String>> {
        if !self.path.exists() {
            return Ok(HashMap::new());
        }
        let json = std::fs::read_to_string(&self.path)?;
        match serde_json::from_str(&json) {
            Ok(values) => Ok(values),
            Err(err) => {
                warn!(
                    "Discarding corrupt session file {}: {err}",
                    self.path.display()
                );
                std::fs::remove_file(&self.path)?;
                Ok(HashMap::new())
            }
        }
    }

    fn write_all(&self, values: &HashMap<String, String>) -> Result<()> {
        if values.is_empty() {
            if self.path.exists() {
                debug!("Removing session file {}", self.path.display());
                std::fs::remove_file(&self.path)?;
            }
            return Ok(());
        }

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        debug!("Saving session to {}", self.path.display());
        std::fs::write(&self.path, serde_json::to_string_pretty(values)?)?;
        Ok(())
    }
}

impl SessionStore for FileSessionStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.read_all()?.remove(key))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let mut values = self.read_all()?;
        values.insert(key.to_string(), value.to_string());
        self.write_all(&values)
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        let mut values = self.read_all()?;
        if values.remove(key).is_some() {
            self.write_all(&values)?;
        }
        Ok(())
    }
}
