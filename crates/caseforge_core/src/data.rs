//! Data rows, data sources, and the enumeration-scoped disposal tracker.

use std::collections::BTreeMap;
use std::fmt;

use crate::errors::DataError;
use crate::metadata::MethodDescriptor;
use crate::value::Value;

/// One unit of theory input: raw argument values plus per-row overrides.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DataRow {
    pub values: Vec<Value>,
    pub skip: Option<String>,
    /// Overrides the marker's explicit flag when set.
    pub explicit: Option<bool>,
    /// Overrides the marker's timeout when set.
    pub timeout: Option<u32>,
    pub display_name: Option<String>,
    pub traits: BTreeMap<String, Vec<String>>,
}

impl DataRow {
    pub fn new(values: Vec<Value>) -> Self {
        Self {
            values,
            ..Self::default()
        }
    }

    pub fn with_skip(mut self, reason: impl Into<String>) -> Self {
        self.skip = Some(reason.into());
        self
    }

    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    pub fn with_trait(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.traits.entry(name.into()).or_default().push(value.into());
        self
    }
}

/// A provider of theory rows.
pub trait DataSource: Send + Sync {
    /// Name used in diagnostics and error test cases.
    fn name(&self) -> &str;

    /// Whether rows may be retrieved at discovery time.
    fn supports_discovery_enumeration(&self) -> bool;

    /// Produce this source's rows for `method`. `Ok(None)` means the source yielded no sequence at
    /// all, which is reported differently from an empty one.
    ///
    /// Any object that must be released later is registered with `tracker`; doing so makes the
    /// rows unsafe to replay and aborts eager enumeration for the method.
    fn get_data(
        &self,
        method: &MethodDescriptor,
        tracker: &mut DisposalTracker,
    ) -> Result<Option<Vec<DataRow>>, DataError>;
}

impl fmt::Debug for dyn DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataSource")
            .field("name", &self.name())
            .field("discoverable", &self.supports_discovery_enumeration())
            .finish()
    }
}

/// Something a data source acquired that must be released after enumeration.
pub trait Disposable: Send {
    fn dispose(&mut self) -> Result<(), DataError>;

    fn describe(&self) -> String;
}

/// Owns every disposable registered while probing one method's data sources.
///
/// Disposal runs in reverse registration order, either explicitly through
/// [`dispose_all`](Self::dispose_all) or when the tracker is dropped.
#[derive(Default)]
pub struct DisposalTracker {
    tracked: Vec<Box<dyn Disposable>>,
}

impl DisposalTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn track(&mut self, disposable: Box<dyn Disposable>) {
        self.tracked.push(disposable);
    }

    pub fn len(&self) -> usize {
        self.tracked.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracked.is_empty()
    }

    /// Dispose everything tracked so far; failures are collected, not short-circuited.
    pub fn dispose_all(&mut self) -> Vec<DataError> {
        let mut failures = Vec::new();
        while let Some(mut disposable) = self.tracked.pop() {
            if let Err(err) = disposable.dispose() {
                failures.push(err);
            }
        }
        failures
    }
}

impl Drop for DisposalTracker {
    fn drop(&mut self) {
        for failure in self.dispose_all() {
            tracing::warn!(error = %failure, "disposal failed while dropping tracker");
        }
    }
}

impl fmt::Debug for DisposalTracker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tracked: Vec<String> = self.tracked.iter().map(|d| d.describe()).collect();
        f.debug_struct("DisposalTracker").field("tracked", &tracked).finish()
    }
}

/// Rows declared directly on the method. Always discovery-enumerable.
#[derive(Debug, Clone)]
pub struct InlineData {
    name: String,
    rows: Vec<DataRow>,
}

impl InlineData {
    pub fn new(rows: Vec<DataRow>) -> Self {
        Self {
            name: "InlineData".to_string(),
            rows,
        }
    }

    /// One row from plain values.
    pub fn row(values: Vec<Value>) -> Self {
        Self::new(vec![DataRow::new(values)])
    }

    pub fn rows(&self) -> &[DataRow] {
        &self.rows
    }
}

impl DataSource for InlineData {
    fn name(&self) -> &str {
        &self.name
    }

    fn supports_discovery_enumeration(&self) -> bool {
        true
    }

    fn get_data(
        &self,
        _method: &MethodDescriptor,
        _tracker: &mut DisposalTracker,
    ) -> Result<Option<Vec<DataRow>>, DataError> {
        Ok(Some(self.rows.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    struct Recorder {
        id: usize,
        log: Arc<Mutex<Vec<usize>>>,
        fail: bool,
    }

    impl Disposable for Recorder {
        fn dispose(&mut self) -> Result<(), DataError> {
            self.log.lock().unwrap().push(self.id);
            if self.fail {
                return Err(DataError::Dispose {
                    object: self.describe(),
                    message: "boom".into(),
                });
            }
            Ok(())
        }

        fn describe(&self) -> String {
            format!("recorder#{}", self.id)
        }
    }

    fn recorder(id: usize, log: &Arc<Mutex<Vec<usize>>>, fail: bool) -> Box<dyn Disposable> {
        Box::new(Recorder {
            id,
            log: Arc::clone(log),
            fail,
        })
    }

    #[test]
    fn test_dispose_all_runs_in_reverse_and_collects_failures() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut tracker = DisposalTracker::new();
        tracker.track(recorder(1, &log, false));
        tracker.track(recorder(2, &log, true));
        tracker.track(recorder(3, &log, false));

        let failures = tracker.dispose_all();
        assert_eq!(*log.lock().unwrap(), vec![3, 2, 1]);
        assert_eq!(failures.len(), 1);
        assert!(tracker.is_empty());
    }

    #[test]
    fn test_drop_disposes_remaining() {
        let log = Arc::new(Mutex::new(Vec::new()));
        {
            let mut tracker = DisposalTracker::new();
            tracker.track(recorder(7, &log, false));
        }
        assert_eq!(*log.lock().unwrap(), vec![7]);
    }

    #[test]
    fn test_inline_data_returns_its_rows() {
        let source = InlineData::row(vec![Value::Int(1), Value::Int(2)]);
        let method = MethodDescriptor::new(crate::metadata::TypeName::new("C", "A"), "M");
        let mut tracker = DisposalTracker::new();
        let rows = source.get_data(&method, &mut tracker).unwrap().unwrap();
        assert_eq!(rows.len(), 1);
        assert!(tracker.is_empty());
        assert!(source.supports_discovery_enumeration());
    }
}
