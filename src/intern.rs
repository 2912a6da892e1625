//! String pool for identifier storage.
//!
//! Every identifier, type name, semantic, and file name in the AST is a
//! `Name` handle into the pool; comparing handles compares strings. The pool
//! also answers containment queries, which the code generators use to pick
//! helper-function names that cannot collide with anything in the source.

use rustc_hash::FxHashMap;

/// Handle to an interned string. Equality is handle equality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Name(u32);

impl Name {
    #[inline]
    fn index(self) -> usize {
        self.0 as usize
    }
}

/// Owns the unique strings of one compilation unit.
#[derive(Debug, Default)]
pub struct StringPool {
    map: FxHashMap<String, Name>,
    strings: Vec<String>,
}

impl StringPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Intern a string, returning its stable handle.
    pub fn intern(&mut self, s: &str) -> Name {
        if let Some(&name) = self.map.get(s) {
            return name;
        }
        let name = Name(u32::try_from(self.strings.len()).unwrap_or_else(|_| {
            panic!("string pool exceeded u32::MAX entries")
        }));
        self.strings.push(s.to_owned());
        self.map.insert(s.to_owned(), name);
        name
    }

    /// Look up the string for a handle.
    #[inline]
    pub fn lookup(&self, name: Name) -> &str {
        &self.strings[name.index()]
    }

    /// Whether the string occurs anywhere in the pool.
    pub fn contains(&self, s: &str) -> bool {
        self.map.contains_key(s)
    }

    pub fn len(&self) -> usize {
        self.strings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intern_and_lookup() {
        let mut pool = StringPool::new();

        let color = pool.intern("color");
        let normal = pool.intern("normal");
        let color2 = pool.intern("color");

        assert_eq!(color, color2);
        assert_ne!(color, normal);

        assert_eq!(pool.lookup(color), "color");
        assert_eq!(pool.lookup(normal), "normal");
    }

    #[test]
    fn test_contains() {
        let mut pool = StringPool::new();
        pool.intern("matrix_row0");

        assert!(pool.contains("matrix_row0"));
        assert!(!pool.contains("matrix_row1"));
    }

    #[test]
    fn test_len() {
        let mut pool = StringPool::new();
        assert!(pool.is_empty());

        pool.intern("a");
        pool.intern("b");
        pool.intern("a");
        assert_eq!(pool.len(), 2);
    }
}
