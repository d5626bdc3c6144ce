//! Name matching shared by the discovery conventions.

use std::collections::HashMap;
use std::sync::{OnceLock, RwLock};

use regex::Regex;

/// Compiled key-name patterns, one per entity type name.
struct KeyPatternCache {
    cache: RwLock<HashMap<String, Regex>>,
}

impl KeyPatternCache {
    fn new() -> Self {
        Self {
            cache: RwLock::new(HashMap::new()),
        }
    }

    fn get_or_compile(&self, entity_name: &str) -> Result<Regex, regex::Error> {
        if let Ok(cache) = self.cache.read() {
            if let Some(regex) = cache.get(entity_name) {
                return Ok(regex.clone());
            }
        }

        let regex = Regex::new(&format!("^(?i)(id|{}id)$", regex::escape(entity_name)))?;
        if let Ok(mut cache) = self.cache.write() {
            cache.insert(entity_name.to_string(), regex.clone());
        }
        Ok(regex)
    }
}

fn key_pattern_cache() -> &'static KeyPatternCache {
    static CACHE: OnceLock<KeyPatternCache> = OnceLock::new();
    CACHE.get_or_init(KeyPatternCache::new)
}

/// Whether `property` is named `Id` or `{entity}Id`, ignoring case.
pub(crate) fn is_key_name(entity_name: &str, property: &str) -> bool {
    match key_pattern_cache().get_or_compile(entity_name) {
        Ok(regex) => regex.is_match(property),
        Err(e) => {
            tracing::warn!(
                target: crate::LOG_TARGET,
                entity_type = entity_name,
                error = %e,
                "Invalid key name pattern, treating as non-match"
            );
            false
        }
    }
}

/// Whether `name` is exactly `Id`, ignoring case.
pub(crate) fn is_plain_id(name: &str) -> bool {
    name.eq_ignore_ascii_case("id")
}

/// Case-insensitive prefix test.
pub(crate) fn starts_with_ignore_case(name: &str, prefix: &str) -> bool {
    name.len() >= prefix.len()
        && name
            .get(..prefix.len())
            .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_names() {
        assert!(is_key_name("Blog", "Id"));
        assert!(is_key_name("Blog", "ID"));
        assert!(is_key_name("Blog", "BlogId"));
        assert!(is_key_name("Blog", "blogid"));
        assert!(!is_key_name("Blog", "PostId"));
        assert!(!is_key_name("Blog", "BlogIdentifier"));
        assert!(!is_key_name("Blog", "XId"));
    }

    #[test]
    fn test_entity_name_is_escaped() {
        assert!(is_key_name("A.B", "A.BId"));
        assert!(!is_key_name("A.B", "AxBId"));
    }

    #[test]
    fn test_prefix_match() {
        assert!(starts_with_ignore_case("BlogId", "blog"));
        assert!(!starts_with_ignore_case("Id", "Blog"));
    }
}
