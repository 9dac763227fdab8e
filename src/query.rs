use std::fmt;

use indexmap::IndexMap;

/// One parameter of a query fragment: either a literal value or a rewrite of
/// the value accumulated so far for that parameter name.
pub enum Param {
    Value(String),
    Update(Box<dyn Fn(&str) -> String>),
}

impl fmt::Debug for Param {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Param::Value(value) => f.debug_tuple("Value").field(value).finish(),
            Param::Update(_) => f.debug_tuple("Update").field(&"<fn>").finish(),
        }
    }
}

/// Ordered set of parameter overrides applied to a query as one unit.
pub type Fragment = Vec<(String, Param)>;

/// Literal parameter override. The value is coerced to a string because the
/// provider only accepts string query parameters.
pub fn set(name: &str, value: impl ToString) -> (String, Param) {
    (name.to_string(), Param::Value(value.to_string()))
}

/// Parameter override computed from the accumulated value for `name`
/// (the empty string if the query has no such parameter yet). Used to extend
/// filter expressions instead of replacing them.
pub fn update(name: &str, f: impl Fn(&str) -> String + 'static) -> (String, Param) {
    (name.to_string(), Param::Update(Box::new(f)))
}

/// Resolved analytics query: an ordered parameter-name to string-value map.
///
/// Parameter names are not validated here; unknown names pass through for the
/// provider to reject.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    params: IndexMap<String, String>,
}

impl Query {
    pub fn new() -> Self {
        Query::default()
    }

    /// Apply one fragment, parameters in the fragment's own order.
    pub fn apply(mut self, fragment: Fragment) -> Query {
        for (name, param) in fragment {
            let value = match param {
                Param::Value(value) => value,
                Param::Update(f) => {
                    let current = self.params.get(&name).map(String::as_str).unwrap_or("");
                    f(current)
                }
            };
            self.params.insert(name, value);
        }
        self
    }

    /// Left-to-right combination of a base query with override fragments.
    pub fn combine(base: Query, fragments: impl IntoIterator<Item = Fragment>) -> Query {
        fragments.into_iter().fold(base, Query::apply)
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.params.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}
