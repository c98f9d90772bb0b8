use core::fmt;

use hashbrown::HashMap;
use tracing::debug;

use crate::hash::hash_string;

/// The one capability consumed from shader reflection: enumerate the literal string constants
/// declared in a program's global scope.
pub trait LiteralStrings {
    /// Calls `f` once per literal.
    fn for_each_literal(&self, f: &mut dyn FnMut(&str));
}

impl<S: AsRef<str>> LiteralStrings for [S] {
    fn for_each_literal(&self, f: &mut dyn FnMut(&str)) {
        for s in self {
            f(s.as_ref());
        }
    }
}

impl<S: AsRef<str>> LiteralStrings for Vec<S> {
    fn for_each_literal(&self, f: &mut dyn FnMut(&str)) {
        self.as_slice().for_each_literal(f)
    }
}

impl<S: AsRef<str>, const N: usize> LiteralStrings for [S; N] {
    fn for_each_literal(&self, f: &mut dyn FnMut(&str)) {
        self.as_slice().for_each_literal(f)
    }
}

impl<T: LiteralStrings + ?Sized> LiteralStrings for &T {
    fn for_each_literal(&self, f: &mut dyn FnMut(&str)) {
        (**self).for_each_literal(f)
    }
}

/// Result of looking up a hash in a [`StringTable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolved<'a> {
    /// The registered literal.
    Text(&'a str),
    /// No literal registered under this hash. Displays as `<unknown string:0x%08x>`.
    Unknown(u32),
}

impl fmt::Display for Resolved<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => f.write_str(text),
            Self::Unknown(hash) => write!(f, "<unknown string:0x{hash:08x}>"),
        }
    }
}

/// `hash -> literal text` for every string a shader may reference from the print buffer.
///
/// Entries accumulate across [`StringTable::load_strings`] calls. When two literals share a hash
/// the one registered last wins.
#[derive(Debug, Default, Clone)]
pub struct StringTable {
    strings: HashMap<u32, String>,
}

impl StringTable {
    /// An empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers every literal exposed by `program`. Returns the number of literals visited.
    pub fn load_strings(&mut self, program: &dyn LiteralStrings) -> usize {
        let mut count = 0usize;
        program.for_each_literal(&mut |text| {
            self.insert(text);
            count += 1;
        });
        debug!(count, total = self.strings.len(), "loaded GPU print strings");
        count
    }

    /// Registers a single literal and returns its hash.
    pub fn insert(&mut self, text: &str) -> u32 {
        let hash = hash_string(text);
        if let Some(previous) = self.strings.insert(hash, text.to_owned()) {
            if previous != text {
                debug!(
                    hash,
                    previous = %previous,
                    replacement = %text,
                    "GPU print string hash collision; keeping the newer string"
                );
            }
        }
        hash
    }

    /// Literal registered under `hash`.
    pub fn get(&self, hash: u32) -> Option<&str> {
        self.strings.get(&hash).map(String::as_str)
    }

    /// Like [`Self::get`], keeping the hash when it is unknown.
    pub fn resolve(&self, hash: u32) -> Resolved<'_> {
        match self.get(hash) {
            Some(text) => Resolved::Text(text),
            None => Resolved::Unknown(hash),
        }
    }

    /// Number of distinct hashes.
    pub fn len(&self) -> usize {
        self.strings.len()
    }

    /// `true` if nothing has been registered.
    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }

    /// Forgets every literal.
    pub fn clear(&mut self) {
        self.strings.clear();
    }
}
