//! String interner for declaration names and site keys.
//!
//! Qualified type names, member keys ("pkg.Animal#feed(1)") and binding keys
//! are interned once and passed around as u32 `Atom`s, so comparisons and
//! hashing are integer operations.
//!
//! The interner is single-threaded: one interner belongs to one analysis
//! session, together with the type environment that owns it.

use rustc_hash::FxHashMap;
use serde::Serialize;
use std::sync::Arc;

/// An interned string identifier.
///
/// Atoms are cheap to copy (just a u32) and can be compared with == in O(1).
/// To get the actual string, use `Interner::resolve(atom)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Default, PartialOrd, Ord)]
pub struct Atom(pub u32);

impl Atom {
    /// A sentinel value representing no atom / empty string.
    pub const NONE: Atom = Atom(0);

    /// Check if this is the empty/none atom.
    #[inline]
    pub fn is_none(self) -> bool {
        self.0 == 0
    }

    /// Get the raw index value.
    #[inline]
    pub fn index(self) -> u32 {
        self.0
    }
}

/// Names that nearly every Java-model session touches.
const COMMON_STRINGS: &[&str] = &[
    "java.lang.Object",
    "java.lang.Cloneable",
    "java.io.Serializable",
    "java.lang.String",
    "java.lang.Comparable",
    "java.lang.Iterable",
    "java.util.Collection",
    "java.util.List",
    "java.util.ArrayList",
    "java.util.Map",
    "T",
    "E",
    "K",
    "V",
];

/// String interner that deduplicates strings and returns Atom handles.
///
/// # Example
/// ```
/// use tycon_common::interner::Interner;
/// let mut interner = Interner::new();
/// let a1 = interner.intern("java.util.List");
/// let a2 = interner.intern("java.util.List");
/// assert_eq!(a1, a2);
/// assert_eq!(interner.resolve(a1), "java.util.List");
/// ```
#[derive(Default)]
pub struct Interner {
    /// Map from string to atom index
    map: FxHashMap<Arc<str>, Atom>,
    /// Vector of all interned strings (index 0 is empty string)
    strings: Vec<Arc<str>>,
}

impl Interner {
    /// Create a new interner with the empty string pre-interned at index 0.
    pub fn new() -> Self {
        let mut interner = Interner {
            map: FxHashMap::default(),
            strings: Vec::with_capacity(256),
        };
        let empty: Arc<str> = Arc::from("");
        interner.strings.push(empty.clone());
        interner.map.insert(empty, Atom::NONE);
        interner
    }

    /// Intern a string, returning its Atom handle.
    /// If the string was already interned, returns the existing Atom.
    #[inline]
    pub fn intern(&mut self, s: &str) -> Atom {
        if let Some(&atom) = self.map.get(s) {
            return atom;
        }
        let atom = Atom(self.strings.len() as u32);
        let owned: Arc<str> = Arc::from(s);
        self.strings.push(owned.clone());
        self.map.insert(owned, atom);
        atom
    }

    /// Look up an already-interned string without inserting it.
    #[inline]
    pub fn get(&self, s: &str) -> Option<Atom> {
        self.map.get(s).copied()
    }

    /// Resolve an Atom back to its string value.
    /// Returns empty string if atom is out of bounds.
    #[inline]
    pub fn resolve(&self, atom: Atom) -> &str {
        self.strings
            .get(atom.0 as usize)
            .map(|s| s.as_ref())
            .unwrap_or("")
    }

    /// Resolve an Atom to a shared string, for callers that must not hold a
    /// borrow of the interner.
    #[inline]
    pub fn resolve_shared(&self, atom: Atom) -> Arc<str> {
        self.strings
            .get(atom.0 as usize)
            .cloned()
            .unwrap_or_else(|| Arc::from(""))
    }

    /// Try to resolve an Atom, returning None if invalid.
    #[inline]
    pub fn try_resolve(&self, atom: Atom) -> Option<&str> {
        self.strings.get(atom.0 as usize).map(|s| s.as_ref())
    }

    /// Get the number of interned strings.
    #[inline]
    pub fn len(&self) -> usize {
        self.strings.len()
    }

    /// Check if the interner is empty (only has the empty string).
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.strings.len() <= 1
    }

    /// Pre-intern the names most sessions use.
    pub fn intern_common(&mut self) {
        for s in COMMON_STRINGS {
            self.intern(s);
        }
    }
}

#[cfg(test)]
#[path = "../tests/interner_tests.rs"]
mod tests;
