//! Alias-to-URI namespace bindings used while resolving qualified names in
//! expression text.

use std::collections::HashMap;

/// The alias of the default namespace (`xmlns="uri"`).
pub const DEFAULT_ALIAS: &str = "";

/// Namespace bindings for a single parse.
///
/// The parser seeds a fresh copy from the embedding application's bindings at
/// the start of every parse and extends it with inline `xmlns` declarations,
/// so no state leaks across parses. No bindings are predefined.
#[derive(Debug, Clone, Default)]
pub struct NamespaceContext {
    bindings: HashMap<String, String>,
}

impl NamespaceContext {
    pub fn new() -> Self {
        NamespaceContext::default()
    }

    /// Registers a binding, replacing any previous binding of `alias`.
    /// The empty alias binds the default namespace.
    pub fn add(&mut self, alias: impl Into<String>, uri: impl Into<String>) {
        self.bindings.insert(alias.into(), uri.into());
    }

    /// Looks up a previously declared alias.
    pub fn resolve(&self, alias: &str) -> Option<&str> {
        self.bindings.get(alias).map(String::as_str)
    }

    /// The default namespace URI, if one is bound.
    pub fn default_namespace(&self) -> Option<&str> {
        self.resolve(DEFAULT_ALIAS)
    }

    /// Clears all bindings.
    pub fn reset(&mut self) {
        self.bindings.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_resolve_overwrite_reset() {
        let mut ns = NamespaceContext::new();
        assert_eq!(ns.resolve("gd"), None);

        ns.add("gd", "http://schemas.google.com/g/2005");
        assert_eq!(ns.resolve("gd"), Some("http://schemas.google.com/g/2005"));

        ns.add("gd", "urn:other");
        assert_eq!(ns.resolve("gd"), Some("urn:other"));

        ns.add(DEFAULT_ALIAS, "http://www.w3.org/2005/Atom");
        assert_eq!(ns.default_namespace(), Some("http://www.w3.org/2005/Atom"));

        ns.reset();
        assert_eq!(ns.resolve("gd"), None);
        assert_eq!(ns.default_namespace(), None);
    }
}
