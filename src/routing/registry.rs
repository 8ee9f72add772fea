//! Build-time registration of route files.
//!
//! Route files are compiled into the binary. The registry maps each file
//! name found in the routes directory to the function producing its
//! [`ModuleExports`]; the loader still decides which files take part by
//! scanning the directory.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::routing::endpoints::ModuleExports;

type ModuleFactory = Arc<dyn Fn() -> ModuleExports + Send + Sync>;

#[derive(Clone, Default)]
pub struct ModuleRegistry {
    modules: HashMap<String, ModuleFactory>,
}

impl ModuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the module behind `file_name` (e.g. `"users.rs"`).
    pub fn register<F, E>(&mut self, file_name: impl Into<String>, factory: F) -> &mut Self
    where
        F: Fn() -> E + Send + Sync + 'static,
        E: Into<ModuleExports>,
    {
        self.modules
            .insert(file_name.into(), Arc::new(move || factory().into()));
        self
    }

    /// Chainable form of [`register`](Self::register).
    pub fn with<F, E>(mut self, file_name: impl Into<String>, factory: F) -> Self
    where
        F: Fn() -> E + Send + Sync + 'static,
        E: Into<ModuleExports>,
    {
        self.register(file_name, factory);
        self
    }

    /// Evaluate the module registered for `file_name`.
    pub fn resolve(&self, file_name: &str) -> Option<ModuleExports> {
        self.modules.get(file_name).map(|factory| factory())
    }

    pub fn contains(&self, file_name: &str) -> bool {
        self.modules.contains_key(file_name)
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

impl fmt::Debug for ModuleRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.modules.keys().collect();
        names.sort();
        f.debug_struct("ModuleRegistry").field("modules", &names).finish()
    }
}

/// Build a [`ModuleRegistry`] from Rust modules living in the routes
/// directory. Each module is registered as `<name>.rs` and must expose
/// `pub fn endpoints()`.
///
/// ```ignore
/// #[path = "routes/users.rs"]
/// mod users;
///
/// let registry = routedir::register_routes![users];
/// ```
#[macro_export]
macro_rules! register_routes {
    ($($module:ident),* $(,)?) => {{
        let mut registry = $crate::routing::ModuleRegistry::new();
        $(
            registry.register(concat!(stringify!($module), ".rs"), $module::endpoints);
        )*
        registry
    }};
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::endpoints::Endpoints;

    mod users {
        use crate::routing::endpoints::Endpoints;

        pub fn endpoints() -> Endpoints {
            Endpoints::new().prefix("people")
        }
    }

    #[test]
    fn test_register_and_resolve() {
        let registry = ModuleRegistry::new()
            .with("a.rs", Endpoints::new)
            .with("b.ts", || ModuleExports::with_default(Endpoints::new().priority(3)));

        assert_eq!(registry.len(), 2);
        assert!(registry.resolve("missing.rs").is_none());
        let b = registry.resolve("b.ts").unwrap().into_endpoints();
        assert_eq!(b.file_priority(), Some(3));
    }

    #[test]
    fn test_register_routes_macro() {
        let registry = crate::register_routes![users];
        assert!(registry.contains("users.rs"));
        let users = registry.resolve("users.rs").unwrap().into_endpoints();
        assert_eq!(users.file_prefix(), Some("people"));
    }
}
