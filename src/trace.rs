//! Scoped diagnostic recording of forward-pass internals.
//!
//! The model threads a `Trace` through every forward evaluation. `NullTrace`
//! is the zero-cost default; `TraceLog` keeps each recorded value under its
//! fully scope-qualified name for external inspection. Sinks only observe
//! copies, so recording can never alter the computation.

use nalgebra::DVector;

/// Observer for named intermediate values.
///
/// All methods default to no-ops so a sink overrides only what it cares
/// about. Sinks that do record should override `active` to return `true`;
/// callers use it to skip building record names that would be thrown away.
pub trait Trace {
    /// Descend into a named scope.
    fn enter(&mut self, _scope: &str) {}

    /// Leave the innermost scope.
    fn leave(&mut self) {}

    /// Record a named scalar under the current scope.
    fn scalar(&mut self, _name: &str, _value: f64) {}

    /// Record a named vector under the current scope.
    fn vector(&mut self, _name: &str, _value: &DVector<f64>) {}

    fn active(&self) -> bool {
        false
    }
}

/// Default sink: records nothing.
pub struct NullTrace;

impl Trace for NullTrace {}

/// A value captured by `TraceLog`.
#[derive(Debug, Clone)]
pub enum Recorded {
    Scalar(f64),
    Vector(DVector<f64>),
}

/// Sink that keeps every value under `scope/.../name` keys, in record order.
#[derive(Debug, Default)]
pub struct TraceLog {
    path: Vec<String>,
    entries: Vec<(String, Recorded)>,
}

impl TraceLog {
    pub fn new() -> Self {
        Self::default()
    }

    fn key(&self, name: &str) -> String {
        if self.path.is_empty() {
            name.to_string()
        } else {
            format!("{}/{}", self.path.join("/"), name)
        }
    }

    /// Everything recorded so far, in order.
    pub fn entries(&self) -> &[(String, Recorded)] {
        &self.entries
    }

    /// First scalar recorded under `key`, if any.
    pub fn scalar_named(&self, key: &str) -> Option<f64> {
        self.entries.iter().find_map(|(k, v)| match v {
            Recorded::Scalar(x) if k == key => Some(*x),
            _ => None,
        })
    }

    /// Whether any entry was recorded under `key`.
    pub fn contains(&self, key: &str) -> bool {
        self.entries.iter().any(|(k, _)| k == key)
    }
}

impl Trace for TraceLog {
    fn enter(&mut self, scope: &str) {
        self.path.push(scope.to_string());
    }

    fn leave(&mut self) {
        self.path.pop();
    }

    fn scalar(&mut self, name: &str, value: f64) {
        let key = self.key(name);
        self.entries.push((key, Recorded::Scalar(value)));
    }

    fn vector(&mut self, name: &str, value: &DVector<f64>) {
        let key = self.key(name);
        self.entries.push((key, Recorded::Vector(value.clone())));
    }

    fn active(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scoped_keys() {
        let mut log = TraceLog::new();
        log.scalar("top", 1.0);
        log.enter("outer");
        log.scalar("a", 2.0);
        log.enter("inner");
        log.scalar("b", 3.0);
        log.leave();
        log.scalar("c", 4.0);
        log.leave();
        log.scalar("bottom", 5.0);

        assert_eq!(log.scalar_named("top"), Some(1.0));
        assert_eq!(log.scalar_named("outer/a"), Some(2.0));
        assert_eq!(log.scalar_named("outer/inner/b"), Some(3.0));
        assert_eq!(log.scalar_named("outer/c"), Some(4.0));
        assert_eq!(log.scalar_named("bottom"), Some(5.0));
        assert!(!log.contains("inner/b"));
    }

    #[test]
    fn test_null_trace_is_inert() {
        let mut null = NullTrace;
        null.enter("scope");
        null.scalar("x", 1.0);
        null.leave();
        assert!(!null.active());
    }
}
