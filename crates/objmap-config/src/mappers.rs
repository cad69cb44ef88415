//! Type-conversion strategies
//!
//! The registry keeps an ordered list of strategies; the mapping engine
//! asks them in order and uses the first one that matches a type pair.

use objmap_meta::TypeKey;
use std::fmt;
use std::sync::Arc;

/// A source/destination type pair
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypePair {
    pub source: TypeKey,
    pub destination: TypeKey,
}

impl TypePair {
    pub fn new(source: TypeKey, destination: TypeKey) -> Self {
        Self {
            source,
            destination,
        }
    }

    /// Pair of two Rust types
    #[must_use]
    pub fn of<S: ?Sized, D: ?Sized>() -> Self {
        Self::new(TypeKey::of::<S>(), TypeKey::of::<D>())
    }
}

impl fmt::Display for TypePair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.source, self.destination)
    }
}

/// A conversion strategy the mapping engine can pick for a type pair
pub trait ObjectMapper: Send + Sync {
    fn name(&self) -> &str;

    fn is_match(&self, pair: &TypePair) -> bool;
}

impl fmt::Debug for dyn ObjectMapper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectMapper").field("name", &self.name()).finish()
    }
}

/// Strategy backed by a predicate closure
pub struct PredicateMapper {
    name: String,
    predicate: Box<dyn Fn(&TypePair) -> bool + Send + Sync>,
}

impl PredicateMapper {
    pub fn new(
        name: impl Into<String>,
        predicate: impl Fn(&TypePair) -> bool + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            predicate: Box::new(predicate),
        }
    }

    /// Build a strategy ready to go into a registry's list
    pub fn shared(
        name: impl Into<String>,
        predicate: impl Fn(&TypePair) -> bool + Send + Sync + 'static,
    ) -> Arc<dyn ObjectMapper> {
        Arc::new(Self::new(name, predicate))
    }
}

impl ObjectMapper for PredicateMapper {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_match(&self, pair: &TypePair) -> bool {
        (self.predicate)(pair)
    }
}

const COLLECTIONS: &[&str] = &["Vec<", "VecDeque<", "HashSet<", "BTreeSet<", "[", "&["];
const PRIMITIVES: &[&str] = &[
    "bool", "char", "i8", "i16", "i32", "i64", "i128", "isize", "u8", "u16", "u32", "u64", "u128",
    "usize", "f32", "f64",
];

fn is_string(key: &TypeKey) -> bool {
    key.name() == "String" || key.name() == "str" || key.name() == "&str"
}

fn is_collection(key: &TypeKey) -> bool {
    COLLECTIONS.iter().any(|prefix| key.name().starts_with(prefix))
}

fn is_primitive(key: &TypeKey) -> bool {
    key.module().is_empty() && PRIMITIVES.contains(&key.name())
}

fn is_option(key: &TypeKey) -> bool {
    key.name().starts_with("Option<")
}

fn is_map(key: &TypeKey) -> bool {
    key.name().starts_with("HashMap<") || key.name().starts_with("BTreeMap<")
}

/// The built-in strategies, most specific first
pub fn default_mappers() -> Vec<Arc<dyn ObjectMapper>> {
    vec![
        PredicateMapper::shared("assignable", |pair| {
            pair.source == pair.destination
        }),
        PredicateMapper::shared("option", |pair| {
            is_option(&pair.source) || is_option(&pair.destination)
        }),
        PredicateMapper::shared("parse", |pair| {
            is_string(&pair.source) && is_primitive(&pair.destination)
        }),
        PredicateMapper::shared("to_string", |pair| {
            is_string(&pair.destination)
        }),
        PredicateMapper::shared("primitive_cast", |pair| {
            is_primitive(&pair.source) && is_primitive(&pair.destination)
        }),
        PredicateMapper::shared("map", |pair| {
            is_map(&pair.source) && is_map(&pair.destination)
        }),
        PredicateMapper::shared("collection", |pair| {
            is_collection(&pair.source) && is_collection(&pair.destination)
        }),
    ]
}

/// First strategy in `mappers` that matches `pair`
pub fn find_mapper<'a>(
    mappers: &'a [Arc<dyn ObjectMapper>],
    pair: &TypePair,
) -> Option<&'a Arc<dyn ObjectMapper>> {
    mappers.iter().find(|mapper| mapper.is_match(pair))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matched(pair: &TypePair) -> Option<String> {
        let mappers = default_mappers();
        find_mapper(&mappers, pair).map(|mapper| mapper.name().to_string())
    }

    #[test]
    fn test_builtin_strategy_selection() {
        assert_eq!(matched(&TypePair::of::<u32, u32>()).as_deref(), Some("assignable"));
        assert_eq!(matched(&TypePair::of::<String, u64>()).as_deref(), Some("parse"));
        assert_eq!(matched(&TypePair::of::<f64, String>()).as_deref(), Some("to_string"));
        assert_eq!(matched(&TypePair::of::<u8, i64>()).as_deref(), Some("primitive_cast"));
        assert_eq!(
            matched(&TypePair::of::<Option<u32>, u32>()).as_deref(),
            Some("option")
        );
        assert_eq!(
            matched(&TypePair::of::<Vec<u32>, Vec<i64>>()).as_deref(),
            Some("collection")
        );
    }

    #[test]
    fn test_no_strategy_for_unrelated_types() {
        let pair = TypePair::new(TypeKey::new("shop", "Order"), TypeKey::new("shop", "OrderDto"));
        assert!(matched(&pair).is_none());
    }

    #[test]
    fn test_custom_strategy_first_wins() {
        let mut mappers: Vec<Arc<dyn ObjectMapper>> = vec![PredicateMapper::shared(
            "money",
            |pair| pair.destination.name() == "Money",
        )];
        mappers.extend(default_mappers());

        let pair = TypePair::new(TypeKey::new("", "f64"), TypeKey::new("shop", "Money"));
        assert_eq!(find_mapper(&mappers, &pair).unwrap().name(), "money");
    }
}
