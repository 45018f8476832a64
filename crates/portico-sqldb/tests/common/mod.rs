//! Stub collaborators shared by the service test suites.
#![allow(dead_code)]

use async_trait::async_trait;
use portico_driver::{
    ColumnDescription, DbDriver, DriverConnector, DriverError, DriverFamily, TableDescription,
};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, RwLock};

/// In-memory driver with canned catalog contents and call recording.
pub struct StubDriver {
    pub family: DriverFamily,
    pub tables: Vec<String>,
    pub procedures: Vec<String>,
    pub functions: Vec<String>,
    pub fail_disconnect: bool,
    attributes: RwLock<BTreeMap<String, String>>,
    active: AtomicBool,
    deactivations: AtomicUsize,
    catalog_calls: Mutex<Vec<bool>>,
}

impl StubDriver {
    pub fn new(family: DriverFamily) -> Self {
        Self {
            family,
            tables: Vec::new(),
            procedures: Vec::new(),
            functions: Vec::new(),
            fail_disconnect: false,
            attributes: RwLock::new(BTreeMap::new()),
            active: AtomicBool::new(true),
            deactivations: AtomicUsize::new(0),
            catalog_calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_tables<I: IntoIterator<Item = &'static str>>(mut self, names: I) -> Self {
        self.tables = names.into_iter().map(String::from).collect();
        self
    }

    pub fn with_procedures<I: IntoIterator<Item = &'static str>>(mut self, names: I) -> Self {
        self.procedures = names.into_iter().map(String::from).collect();
        self
    }

    pub fn with_functions<I: IntoIterator<Item = &'static str>>(mut self, names: I) -> Self {
        self.functions = names.into_iter().map(String::from).collect();
        self
    }

    pub fn failing_disconnect(mut self) -> Self {
        self.fail_disconnect = true;
        self
    }

    pub fn deactivations(&self) -> usize {
        self.deactivations.load(Ordering::SeqCst)
    }

    pub fn attributes_snapshot(&self) -> BTreeMap<String, String> {
        self.attributes.read().unwrap().clone()
    }

    /// The `refresh` flag of every catalog listing call, in order.
    pub fn catalog_calls(&self) -> Vec<bool> {
        self.catalog_calls.lock().unwrap().clone()
    }

    pub fn force_inactive(&self) {
        self.active.store(false, Ordering::SeqCst);
    }
}

/// Cloneable handle so tests can inspect a driver the service owns.
#[derive(Clone)]
pub struct SharedDriver(pub Arc<StubDriver>);

#[async_trait]
impl DbDriver for SharedDriver {
    fn family(&self) -> DriverFamily {
        self.0.family
    }

    fn set_attribute(&self, key: &str, value: &str) {
        self.0
            .attributes
            .write()
            .unwrap()
            .insert(key.to_string(), value.to_string());
    }

    fn attribute(&self, key: &str) -> Option<String> {
        self.0.attributes.read().unwrap().get(key).cloned()
    }

    fn is_active(&self) -> bool {
        self.0.active.load(Ordering::SeqCst)
    }

    async fn set_active(&self, active: bool) -> Result<(), DriverError> {
        if !active {
            self.0.deactivations.fetch_add(1, Ordering::SeqCst);
            if self.0.fail_disconnect {
                return Err(DriverError::Connect("disconnect refused".into()));
            }
        }
        self.0.active.store(active, Ordering::SeqCst);
        Ok(())
    }

    async fn list_schemas_and_tables(&self, refresh: bool) -> Result<Vec<String>, DriverError> {
        self.0.catalog_calls.lock().unwrap().push(refresh);
        Ok(self.0.tables.clone())
    }

    async fn list_stored_procedures(&self) -> Result<Vec<String>, DriverError> {
        Ok(self.0.procedures.clone())
    }

    async fn list_stored_functions(&self) -> Result<Vec<String>, DriverError> {
        Ok(self.0.functions.clone())
    }

    async fn describe_table(&self, name: &str) -> Result<Option<TableDescription>, DriverError> {
        if !self.0.tables.iter().any(|table| table == name) {
            return Ok(None);
        }
        Ok(Some(TableDescription {
            name: name.to_string(),
            schema: None,
            columns: vec![ColumnDescription {
                name: "id".into(),
                data_type: "integer".into(),
                nullable: false,
                default: None,
            }],
            primary_key: vec!["id".into()],
        }))
    }
}

/// Connector that records every open and hands back a prepared stub.
pub struct RecordingConnector {
    pub driver: SharedDriver,
    opens: Mutex<Vec<OpenCall>>,
}

#[derive(Debug, Clone)]
pub struct OpenCall {
    pub dsn: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub options: BTreeMap<String, String>,
}

impl RecordingConnector {
    pub fn new(driver: StubDriver) -> Self {
        Self {
            driver: SharedDriver(Arc::new(driver)),
            opens: Mutex::new(Vec::new()),
        }
    }

    pub fn opens(&self) -> Vec<OpenCall> {
        self.opens.lock().unwrap().clone()
    }
}

#[async_trait]
impl DriverConnector for RecordingConnector {
    async fn open(
        &self,
        dsn: &str,
        username: Option<&str>,
        password: Option<&str>,
        options: &BTreeMap<String, String>,
    ) -> Result<Box<dyn DbDriver>, DriverError> {
        self.opens.lock().unwrap().push(OpenCall {
            dsn: dsn.to_string(),
            username: username.map(String::from),
            password: password.map(String::from),
            options: options.clone(),
        });
        Ok(Box::new(self.driver.clone()))
    }
}
