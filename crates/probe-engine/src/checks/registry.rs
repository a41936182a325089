use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use super::{
    Checker, ContainsStrings, HasContentType, HasHeaderValue, HasImageContentType, JsonParse,
    NotContainsOwsException, NotContainsStrings, ResponseTimeUnder, StatusIn, StatusIs200,
    StatusNoError,
};
use crate::error::CheckError;

/// Creates a fresh checker instance for one run
pub type CheckerFactory = Arc<dyn Fn() -> Result<Box<dyn Checker>, CheckError> + Send + Sync>;

/// Maps stable checker identifiers to factories.
///
/// Built once at startup and then shared read-only between runs, typically
/// behind an `Arc`.
#[derive(Clone, Default)]
pub struct CheckerRegistry {
    factories: HashMap<String, CheckerFactory>,
}

impl fmt::Debug for CheckerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CheckerRegistry").field("identifiers", &self.identifiers()).finish()
    }
}

impl CheckerRegistry {
    /// An empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding every built-in checker
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        registry.register_default::<StatusIs200>("status-is-200");
        registry.register_default::<StatusNoError>("http-status-no-error");
        registry.register_default::<StatusIn>("http-status-in");
        registry.register_default::<HasHeaderValue>("http-has-header-value");
        registry.register_default::<HasContentType>("http-has-content-type");
        registry.register_default::<HasImageContentType>("http-has-image-content-type");
        registry.register_default::<ContainsStrings>("contains-strings");
        registry.register_default::<NotContainsStrings>("not-contains-strings");
        registry.register_default::<NotContainsOwsException>("not-contains-ows-exception");
        registry.register_default::<JsonParse>("json-parse");
        registry.register_default::<ResponseTimeUnder>("response-time-under");
        registry
    }

    /// Register a factory under `identifier`, replacing any previous one
    pub fn register<F>(&mut self, identifier: impl Into<String>, factory: F) -> &mut Self
    where
        F: Fn() -> Result<Box<dyn Checker>, CheckError> + Send + Sync + 'static,
    {
        self.factories.insert(identifier.into(), Arc::new(factory));
        self
    }

    /// Register a checker type constructed through `Default`
    pub fn register_default<C>(&mut self, identifier: impl Into<String>) -> &mut Self
    where
        C: Checker + Default + 'static,
    {
        self.register(identifier, || Ok(Box::new(C::default()) as Box<dyn Checker>))
    }

    pub fn contains(&self, identifier: &str) -> bool {
        self.factories.contains_key(identifier)
    }

    /// Construct a new checker instance
    pub fn create(&self, identifier: &str) -> Result<Box<dyn Checker>, CheckError> {
        let factory = self
            .factories
            .get(identifier)
            .ok_or_else(|| CheckError::UnknownChecker(identifier.to_string()))?;
        factory()
    }

    /// Registered identifiers, sorted
    pub fn identifiers(&self) -> Vec<&str> {
        let mut identifiers: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        identifiers.sort_unstable();
        identifiers
    }
}
