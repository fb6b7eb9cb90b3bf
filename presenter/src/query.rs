use std::collections::BTreeMap;

use serde::Serialize;
use url::form_urlencoded;

/// A decoded query string. Keys are sorted; repeated keys collect their values.
pub type Query = BTreeMap<String, QueryValue>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum QueryValue {
    One(String),
    Many(Vec<String>),
}

impl QueryValue {
    fn push(&mut self, value: String) {
        match self {
            QueryValue::One(first) => {
                *self = QueryValue::Many(vec![std::mem::take(first), value]);
            }
            QueryValue::Many(values) => values.push(value),
        }
    }
}

/// Decode `c=region&d=tree,map` (a leading `?` is ignored).
pub fn parse_query(query: &str) -> Query {
    let query = query.strip_prefix('?').unwrap_or(query);
    let mut out = Query::new();
    for (key, value) in form_urlencoded::parse(query.as_bytes()) {
        let value = value.into_owned();
        match out.get_mut(&*key) {
            Some(existing) => existing.push(value),
            None => {
                out.insert(key.into_owned(), QueryValue::One(value));
            }
        }
    }
    out
}
