//! Class-name instrumentation filter.
//!
//! Patterns may be written with dots or slashes. A trailing `*` turns the
//! pattern into a prefix match (`java.util.*` covers `java/util/HashMap` and
//! every sub-package); anything else must match the class name exactly.

/// How the pattern list is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FilterKind {
    /// Every class passes.
    #[default]
    None,
    /// Only classes matching a pattern pass.
    Inclusive,
    /// Classes matching a pattern are filtered out.
    Exclusive,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Pattern {
    Exact(String),
    Prefix(String),
}

impl Pattern {
    fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }
        let normalized = raw.replace('.', "/");
        Some(match normalized.strip_suffix('*') {
            Some(prefix) => Pattern::Prefix(prefix.trim_end_matches('*').to_string()),
            None => Pattern::Exact(normalized),
        })
    }

    fn matches(&self, class_name: &str) -> bool {
        match self {
            Pattern::Exact(name) => class_name == name,
            Pattern::Prefix(prefix) => class_name.starts_with(prefix.as_str()),
        }
    }
}

/// Include/exclude predicate keyed by class name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstrumentationFilter {
    kind: FilterKind,
    patterns: Vec<Pattern>,
}

impl InstrumentationFilter {
    /// Filter that lets everything through.
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    /// Only classes matching one of `patterns` pass.
    pub fn inclusive<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::with_kind(FilterKind::Inclusive, patterns)
    }

    /// Classes matching one of `patterns` are filtered out.
    pub fn exclusive<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::with_kind(FilterKind::Exclusive, patterns)
    }

    fn with_kind<I, S>(kind: FilterKind, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let patterns = patterns.into_iter().filter_map(|p| Pattern::parse(p.as_ref())).collect();
        Self { kind, patterns }
    }

    #[must_use]
    pub fn kind(&self) -> FilterKind {
        self.kind
    }

    /// True when the filter cannot reject anything.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.kind == FilterKind::None || self.patterns.is_empty()
    }

    /// Whether `class_name` (dotted or slashed) passes the filter.
    #[must_use]
    pub fn passes(&self, class_name: &str) -> bool {
        if self.is_empty() {
            return true;
        }
        let class_name = class_name.replace('.', "/");
        let matched = self.patterns.iter().any(|p| p.matches(&class_name));
        match self.kind {
            FilterKind::Inclusive => matched,
            FilterKind::Exclusive => !matched,
            FilterKind::None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_none_passes_everything() {
        let filter = InstrumentationFilter::none();
        assert!(filter.is_empty());
        assert!(filter.passes("java/lang/String"));
    }

    #[test]
    fn test_inclusive_prefix() {
        let filter = InstrumentationFilter::inclusive(["com.acme.*"]);
        assert!(filter.passes("com/acme/App"));
        assert!(filter.passes("com.acme.deep.Service"));
        assert!(!filter.passes("java/lang/Thread"));
    }

    #[test]
    fn test_exclusive_exact_and_prefix() {
        let filter = InstrumentationFilter::exclusive(["java.**", "sun.misc.Unsafe"]);
        assert!(!filter.passes("java/util/HashMap"));
        assert!(!filter.passes("sun/misc/Unsafe"));
        assert!(filter.passes("sun/misc/Signal"));
        assert!(filter.passes("com/acme/App"));
    }

    #[test]
    fn test_blank_patterns_are_dropped() {
        let filter = InstrumentationFilter::inclusive(["  ", ""]);
        assert!(filter.is_empty());
        assert!(filter.passes("anything/At/All"));
    }
}
