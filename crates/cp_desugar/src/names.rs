//! Collision-free names for generated temporaries.

use std::collections::{HashMap, HashSet};

use swc_ecma_ast::{Ident, Module};
use swc_ecma_visit::{Visit, VisitWith};

use crate::error::DesugarError;

/// Hands out temporary names that clash with nothing in the module.
///
/// Seeded with every identifier the module mentions, so a generated name
/// can never shadow a user binding or reference. Every name handed out is
/// registered as taken, which keeps temporaries unique across all
/// comprehensions rewritten with the same allocator.
///
/// Candidates for base `i` are `_i`, `_i2`, `_i3`, ...
#[derive(Debug, Clone)]
pub struct NameAllocator {
    taken: HashSet<String>,
    next_suffix: HashMap<String, usize>,
    max_attempts: usize,
}

impl Default for NameAllocator {
    fn default() -> Self {
        Self::new()
    }
}

impl NameAllocator {
    pub const DEFAULT_MAX_ATTEMPTS: usize = 10_000;

    pub fn new() -> Self {
        Self {
            taken: HashSet::new(),
            next_suffix: HashMap::new(),
            max_attempts: Self::DEFAULT_MAX_ATTEMPTS,
        }
    }

    /// An allocator that avoids every identifier in `module`.
    pub fn for_module(module: &Module) -> Self {
        let mut collector = IdentCollector::default();
        module.visit_with(&mut collector);

        let mut names = Self::new();
        names.taken = collector.names;
        names
    }

    /// Limit how many candidates are tried per allocation.
    pub fn with_max_attempts(mut self, max_attempts: usize) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub fn reserve(&mut self, name: impl Into<String>) {
        self.taken.insert(name.into());
    }

    pub fn is_taken(&self, name: &str) -> bool {
        self.taken.contains(name)
    }

    /// Allocate and register a fresh name derived from `base`.
    pub fn fresh(&mut self, base: &str) -> Result<String, DesugarError> {
        let first = self.next_suffix.get(base).copied().unwrap_or(1);

        for suffix in (first..).take(self.max_attempts) {
            let candidate = if suffix == 1 {
                format!("_{base}")
            } else {
                format!("_{base}{suffix}")
            };
            if self.taken.contains(&candidate) {
                continue;
            }

            self.taken.insert(candidate.clone());
            self.next_suffix.insert(base.to_string(), suffix + 1);
            tracing::trace!(name = %candidate, "allocated temporary");
            return Ok(candidate);
        }

        Err(DesugarError::NameCollisionExhausted {
            base: base.to_string(),
            attempts: self.max_attempts,
        })
    }
}

#[derive(Default)]
struct IdentCollector {
    names: HashSet<String>,
}

impl Visit for IdentCollector {
    fn visit_ident(&mut self, ident: &Ident) {
        self.names.insert(ident.sym.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cp_ast::CpSyntax;
    use cp_parser::parse_comprehensions;

    #[test]
    fn suffixes_count_up_per_base() {
        let mut names = NameAllocator::new();
        assert_eq!(names.fresh("i").unwrap(), "_i");
        assert_eq!(names.fresh("i").unwrap(), "_i2");
        assert_eq!(names.fresh("arr").unwrap(), "_arr");
        assert_eq!(names.fresh("i").unwrap(), "_i3");
    }

    #[test]
    fn reserved_names_are_skipped() {
        let mut names = NameAllocator::new();
        names.reserve("_len");
        names.reserve("_len2");
        assert_eq!(names.fresh("len").unwrap(), "_len3");
        assert!(names.is_taken("_len3"));
    }

    #[test]
    fn module_identifiers_are_taken() {
        let parsed = parse_comprehensions(
            "var _result = 1; function _i() { return _arr; }",
            "input.js",
            &CpSyntax::default(),
        )
        .unwrap();
        let mut names = NameAllocator::for_module(&parsed.module);
        assert_eq!(names.fresh("result").unwrap(), "_result2");
        assert_eq!(names.fresh("i").unwrap(), "_i2");
        assert_eq!(names.fresh("arr").unwrap(), "_arr2");
        assert_eq!(names.fresh("len").unwrap(), "_len");
    }

    #[test]
    fn property_names_are_not_identifiers() {
        let parsed =
            parse_comprehensions("obj._i = { _len: 1 };", "input.js", &CpSyntax::default())
                .unwrap();
        let mut names = NameAllocator::for_module(&parsed.module);
        assert_eq!(names.fresh("i").unwrap(), "_i");
        assert_eq!(names.fresh("len").unwrap(), "_len");
    }

    #[test]
    fn exhaustion_is_reported() {
        let mut names = NameAllocator::new().with_max_attempts(3);
        for name in ["_tmp", "_tmp2", "_tmp3"] {
            names.reserve(name);
        }
        assert_eq!(
            names.fresh("tmp"),
            Err(DesugarError::NameCollisionExhausted {
                base: "tmp".into(),
                attempts: 3,
            })
        );
    }
}
