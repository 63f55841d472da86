//! Composite identifier resolution
//!
//! Provides [`ParsedIdentifier`] and the resolver that decomposes
//! `spd-<system>-<kind>-<slug>[-<kind2>-<slug2>...]` against the set of
//! registered systems.

use crate::grammar::ID_PREFIX;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt::{self, Display, Formatter};

/// Decomposed identifier
///
/// # Structure
/// - `system`: registered system the identifier belongs to
/// - `kind`: kind token matched against the expected kind
/// - `slug`: remainder after the kind
/// - `prefix_id`: parent identifier when the input is composite
///
/// # Example
/// ```
/// use spd_ident::IdentifierResolver;
///
/// let resolver = IdentifierResolver::new(["app"], None::<Vec<&str>>);
/// let parsed = resolver
///     .resolve("spd-app-spec-auth-algo-hash", "algo", Some(&|_: &str| true))
///     .unwrap();
/// assert_eq!(parsed.prefix_id.as_deref(), Some("spd-app-spec-auth"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ParsedIdentifier {
    /// Owning system
    pub system: String,
    /// Identifier kind
    pub kind: String,
    /// Slug following the kind
    pub slug: String,
    /// Parent identifier of a composite identifier
    pub prefix_id: Option<String>,
}

impl ParsedIdentifier {
    /// Whether this identifier has a parent segment
    #[inline]
    #[must_use]
    pub fn is_composite(&self) -> bool {
        self.prefix_id.is_some()
    }
}

impl Display for ParsedIdentifier {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match &self.prefix_id {
            Some(parent) => write!(f, "{}-{}-{}", parent, self.kind, self.slug),
            None => write!(
                f,
                "{}-{}-{}-{}",
                ID_PREFIX, self.system, self.kind, self.slug
            ),
        }
    }
}

/// Remainder of `raw` after the `spd-` prefix, if present
fn strip_prefix(raw: &str) -> Option<&str> {
    let head_len = ID_PREFIX.len() + 1;
    let head = raw.get(..head_len)?;
    let expected = format!("{ID_PREFIX}-");
    head.eq_ignore_ascii_case(&expected)
        .then(|| &raw[head_len..])
}

/// Longest registered system that prefixes `rest` at a dash boundary
fn longest_system<'a, I>(rest: &str, systems: I) -> Option<&'a str>
where
    I: IntoIterator<Item = &'a str>,
{
    systems
        .into_iter()
        .filter(|system| {
            !system.is_empty()
                && rest.len() > system.len()
                && rest.as_bytes()[system.len()] == b'-'
                && rest
                    .get(..system.len())
                    .is_some_and(|head| head.eq_ignore_ascii_case(system))
        })
        .max_by_key(|system| system.len())
}

/// Case-insensitive search for `needle` in `haystack`
fn find_ignore_case(haystack: &str, needle: &str) -> Option<usize> {
    haystack
        .to_ascii_lowercase()
        .find(&needle.to_ascii_lowercase())
}

fn contains_ignore_case<'a, I>(set: I, value: &str) -> bool
where
    I: IntoIterator<Item = &'a str>,
{
    set.into_iter().any(|k| k.eq_ignore_ascii_case(value))
}

/// Decompose an identifier against registered systems
///
/// # Arguments
/// - `raw`: identifier text
/// - `expected_kind`: kind the caller expects (block name)
/// - `registered_systems`: known system names
/// - `known_kinds`: optional kind allow-list for the first kind token
/// - `where_defined`: optional predicate the parent of a composite id must satisfy
///
/// Returns `None` when the identifier does not resolve.
#[must_use]
pub fn parse_identifier(
    raw: &str,
    expected_kind: &str,
    registered_systems: &BTreeSet<String>,
    known_kinds: Option<&BTreeSet<String>>,
    where_defined: Option<&dyn Fn(&str) -> bool>,
) -> Option<ParsedIdentifier> {
    let rest = strip_prefix(raw)?;
    let system = longest_system(rest, registered_systems.iter().map(String::as_str))?;

    let after_system = &rest[system.len() + 1..];
    let (first_kind, tail) = after_system.split_once('-')?;

    if let Some(kinds) = known_kinds {
        if !contains_ignore_case(kinds.iter().map(String::as_str), first_kind) {
            return None;
        }
    }

    if first_kind.eq_ignore_ascii_case(expected_kind) {
        if tail.is_empty() {
            return None;
        }
        return Some(ParsedIdentifier {
            system: system.to_string(),
            kind: first_kind.to_string(),
            slug: tail.to_string(),
            prefix_id: None,
        });
    }

    // Composite: `<parent>-<expected_kind>-<slug>`
    let separator = format!("-{expected_kind}-");
    let at = find_ignore_case(after_system, &separator)?;
    let slug = &after_system[at + separator.len()..];
    if slug.is_empty() {
        return None;
    }
    let parent_len = raw.len() - after_system.len() + at;
    let prefix_id = &raw[..parent_len];

    if let Some(defined) = where_defined {
        if !defined(prefix_id) {
            return None;
        }
    }

    Some(ParsedIdentifier {
        system: system.to_string(),
        kind: after_system[at + 1..at + 1 + expected_kind.len()].to_string(),
        slug: slug.to_string(),
        prefix_id: Some(prefix_id.to_string()),
    })
}

/// System an identifier belongs to
///
/// With registered systems the longest registered match wins; otherwise the
/// second dash-segment is used.
#[must_use]
pub fn system_of(id: &str, registered_systems: Option<&BTreeSet<String>>) -> Option<String> {
    let rest = strip_prefix(id)?;
    if let Some(systems) = registered_systems {
        if let Some(system) = longest_system(rest, systems.iter().map(String::as_str)) {
            return Some(system.to_string());
        }
    }
    rest.split('-')
        .next()
        .filter(|s| !s.is_empty())
        .map(str::to_ascii_lowercase)
}

/// Registry-bound resolver
///
/// Holds the registered systems and optional kind allow-list so callers
/// resolve many identifiers against the same configuration.
#[derive(Debug, Clone, Default)]
pub struct IdentifierResolver {
    systems: BTreeSet<String>,
    kinds: Option<BTreeSet<String>>,
}

impl IdentifierResolver {
    /// Create resolver from system names and an optional kind allow-list
    #[must_use]
    pub fn new<S, K>(systems: impl IntoIterator<Item = S>, kinds: Option<K>) -> Self
    where
        S: Into<String>,
        K: IntoIterator,
        K::Item: Into<String>,
    {
        Self {
            systems: systems.into_iter().map(Into::into).collect(),
            kinds: kinds.map(|k| k.into_iter().map(Into::into).collect()),
        }
    }

    /// Registered systems
    #[inline]
    #[must_use]
    pub fn systems(&self) -> &BTreeSet<String> {
        &self.systems
    }

    /// Kind allow-list, if any
    #[inline]
    #[must_use]
    pub fn kinds(&self) -> Option<&BTreeSet<String>> {
        self.kinds.as_ref()
    }

    /// Whether `system` is registered (case-insensitive)
    #[must_use]
    pub fn is_registered(&self, system: &str) -> bool {
        contains_ignore_case(self.systems.iter().map(String::as_str), system)
    }

    /// Resolve an identifier, see [`parse_identifier`]
    #[must_use]
    pub fn resolve(
        &self,
        raw: &str,
        expected_kind: &str,
        where_defined: Option<&dyn Fn(&str) -> bool>,
    ) -> Option<ParsedIdentifier> {
        parse_identifier(
            raw,
            expected_kind,
            &self.systems,
            self.kinds.as_ref(),
            where_defined,
        )
    }

    /// System of an identifier under this registry
    #[must_use]
    pub fn system_of(&self, id: &str) -> Option<String> {
        system_of(id, Some(&self.systems))
    }
}
