//! Small helpers shared by the resolver and the pipeline

use futures::future::{self, LocalBoxFuture};
use futures::FutureExt;
use indexmap::IndexMap;

/// Prefix marking private (non-enumerable, non-reactive) model members
pub const PRIVATE_PREFIX: char = '_';

/// Upper-case the first character of a name
pub fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Whether a member name follows the private convention
pub fn is_private_key(key: &str) -> bool {
    key.starts_with(PRIVATE_PREFIX)
}

/// Apply a function to every entry of an ordered map
pub fn map_values<V, U>(map: &IndexMap<String, V>, mut f: impl FnMut(&V, &str) -> U) -> IndexMap<String, U> {
    map.iter()
        .map(|(key, value)| (key.clone(), f(value, key)))
        .collect()
}

/// Visit every entry of an ordered map
pub fn each<V>(map: &IndexMap<String, V>, mut f: impl FnMut(&V, &str)) {
    for (key, value) in map {
        f(value, key);
    }
}

/// Normalize an already-available value into a future
pub fn into_local_future<T: 'static>(value: T) -> LocalBoxFuture<'static, T> {
    future::ready(value).boxed_local()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capitalize() {
        assert_eq!(capitalize("user"), "User");
        assert_eq!(capitalize("extendUser"), "ExtendUser");
        assert_eq!(capitalize("User"), "User");
        assert_eq!(capitalize(""), "");
    }

    #[test]
    fn test_private_key() {
        assert!(is_private_key("_fn"));
        assert!(!is_private_key("fn_"));
    }

    #[test]
    fn test_map_values_keeps_order() {
        let mut map = IndexMap::new();
        map.insert("b".to_string(), 2);
        map.insert("a".to_string(), 1);

        let mapped = map_values(&map, |v, k| format!("{k}={v}"));
        let values: Vec<_> = mapped.values().cloned().collect();
        assert_eq!(values, vec!["b=2", "a=1"]);

        let mut seen = Vec::new();
        each(&map, |v, k| seen.push((k.to_string(), *v)));
        assert_eq!(seen, vec![("b".to_string(), 2), ("a".to_string(), 1)]);
    }

    #[test]
    fn test_into_local_future() {
        let value = futures::executor::block_on(into_local_future(42));
        assert_eq!(value, 42);
    }
}
