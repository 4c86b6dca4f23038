//! Registry of port drivers.
//!
//! Constructed at startup and queried by name; no global state.

use std::collections::HashMap;

use sortline_common::line::config::TransportConfig;

use crate::drivers::{modbus, simulation};
use crate::port::{IoPort, PortFactory, TransportError};

/// Registry of available port drivers.
pub struct DriverRegistry {
    factories: HashMap<&'static str, PortFactory>,
}

impl DriverRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Registry with the built-in `modbus` and `simulation` drivers.
    pub fn with_builtin() -> Self {
        let mut reg = Self::new();
        reg.register("modbus", modbus::create_port);
        reg.register("simulation", simulation::create_port);
        reg
    }

    /// Register a driver factory.
    ///
    /// # Panics
    /// Panics if a driver with the same name is already registered.
    pub fn register(&mut self, name: &'static str, factory: PortFactory) {
        if self.factories.contains_key(name) {
            panic!("Driver '{name}' is already registered");
        }
        self.factories.insert(name, factory);
    }

    /// Create a port by driver name.
    pub fn create_port(
        &self,
        name: &str,
        config: &TransportConfig,
    ) -> Result<Box<dyn IoPort>, TransportError> {
        let factory = self
            .factories
            .get(name)
            .ok_or_else(|| TransportError::DriverNotFound(name.to_string()))?;
        Ok(factory(config))
    }

    /// List all registered driver names, sorted.
    pub fn list_drivers(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.factories.keys().copied().collect();
        names.sort_unstable();
        names
    }
}

impl Default for DriverRegistry {
    fn default() -> Self {
        Self::with_builtin()
    }
}
