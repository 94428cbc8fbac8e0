use serde_json::{Map, Value};

/// The JSON shape a [`path_query`] caller expects at the end of the path.
///
/// Every failure along the path resolves to the kind's zero value, so callers
/// always get a value of the shape they asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    Bool,
    Int,
    Str,
    List,
    Map,
}

impl Kind {
    /// The kind's zero value: `false`, `0`, `""`, `[]`, or `{}`.
    pub fn zero(self) -> Value {
        match self {
            Self::Bool => Value::Bool(false),
            Self::Int => Value::from(0),
            Self::Str => Value::String(String::new()),
            Self::List => Value::Array(Vec::new()),
            Self::Map => Value::Object(Map::new()),
        }
    }

    fn matches(self, value: &Value) -> bool {
        match self {
            Self::Bool => value.is_boolean(),
            Self::Int => value.is_number(),
            Self::Str => value.is_string(),
            Self::List => value.is_array(),
            Self::Map => value.is_object(),
        }
    }
}

/// One step of a [`path_query`] path.
pub enum Step<'a> {
    /// Descend into a map by key.
    Key(&'a str),
    /// Descend into a list by position.
    Index(usize),
    /// On a list, select the first element whose entries are a superset of
    /// the filter's key/value pairs.
    Filter(&'a Map<String, Value>),
    /// On a list, resolve the remaining path against every element and apply
    /// the aggregator to the results.
    Each(fn(Vec<Value>) -> Value),
}

/// Walk `steps` down `tree` and return the value at the end if it has the
/// expected `kind`, or the kind's zero value if the path does not resolve.
///
/// Type mismatches, absent keys, and out-of-range indices all degrade to the
/// zero value; no failure escapes.
pub fn path_query(tree: &Value, kind: Kind, steps: &[Step]) -> Value {
    let Some((step, rest)) = steps.split_first() else {
        return if kind.matches(tree) {
            tree.clone()
        } else {
            kind.zero()
        };
    };

    match step {
        Step::Key(key) => match tree.as_object().and_then(|map| map.get(*key)) {
            Some(value) => path_query(value, kind, rest),
            None => kind.zero(),
        },
        Step::Index(index) => match tree.as_array().and_then(|items| items.get(*index)) {
            Some(value) => path_query(value, kind, rest),
            None => kind.zero(),
        },
        Step::Filter(filter) => match tree.as_array() {
            Some(items) => match items.iter().find(|item| is_superset(item, filter)) {
                Some(value) => path_query(value, kind, rest),
                None => kind.zero(),
            },
            None => kind.zero(),
        },
        Step::Each(aggregate) => match tree.as_array() {
            Some(items) => aggregate(
                items
                    .iter()
                    .map(|item| path_query(item, kind, rest))
                    .collect(),
            ),
            None => kind.zero(),
        },
    }
}

fn is_superset(candidate: &Value, filter: &Map<String, Value>) -> bool {
    let Some(have) = candidate.as_object() else {
        return false;
    };
    filter.iter().all(|(k, v)| have.get(k) == Some(v))
}

#[cfg(test)]
mod tests {
    use {super::*, serde_json::json};

    fn doc() -> Value {
        json!({
            "channel": {
                "title": "Acme",
                "videos": [
                    {"id": "v1", "live": false, "views": 10},
                    {"id": "v2", "live": true, "views": 25},
                ],
            },
        })
    }

    #[test]
    fn resolves_key_and_index_steps() {
        let got = path_query(&doc(), Kind::Str, &[
            Step::Key("channel"),
            Step::Key("videos"),
            Step::Index(1),
            Step::Key("id"),
        ]);
        assert_eq!(got, json!("v2"));
    }

    #[test]
    fn missing_intermediate_key_yields_zero_of_kind() {
        let got = path_query(&doc(), Kind::Map, &[Step::Key("nope"), Step::Key("videos")]);
        assert_eq!(got, json!({}));

        let got = path_query(&doc(), Kind::List, &[Step::Key("nope")]);
        assert_eq!(got, json!([]));

        let got = path_query(&doc(), Kind::Str, &[Step::Key("nope")]);
        assert_eq!(got, json!(""));
    }

    #[test]
    fn kind_mismatch_at_exhaustion_yields_zero() {
        let got = path_query(&doc(), Kind::Int, &[Step::Key("channel"), Step::Key("title")]);
        assert_eq!(got, json!(0));
    }

    #[test]
    fn index_out_of_range_yields_zero() {
        let got = path_query(&doc(), Kind::Str, &[
            Step::Key("channel"),
            Step::Key("videos"),
            Step::Index(9),
            Step::Key("id"),
        ]);
        assert_eq!(got, json!(""));
    }

    #[test]
    fn filter_selects_first_superset_element() {
        let filter = json!({"live": true});
        let filter = filter.as_object().unwrap();
        let got = path_query(&doc(), Kind::Str, &[
            Step::Key("channel"),
            Step::Key("videos"),
            Step::Filter(filter),
            Step::Key("id"),
        ]);
        assert_eq!(got, json!("v2"));
    }

    #[test]
    fn filter_without_match_yields_zero() {
        let filter = json!({"live": true, "views": 999});
        let filter = filter.as_object().unwrap();
        let got = path_query(&doc(), Kind::Str, &[
            Step::Key("channel"),
            Step::Key("videos"),
            Step::Filter(filter),
            Step::Key("id"),
        ]);
        assert_eq!(got, json!(""));
    }

    #[test]
    fn filter_on_non_list_yields_zero() {
        let filter = json!({"live": true});
        let filter = filter.as_object().unwrap();
        let got = path_query(&doc(), Kind::Str, &[
            Step::Key("channel"),
            Step::Filter(filter),
        ]);
        assert_eq!(got, json!(""));
    }

    #[test]
    fn each_applies_aggregator_over_all_elements() {
        fn count_live(results: Vec<Value>) -> Value {
            Value::from(
                results
                    .iter()
                    .filter(|v| v.as_bool().unwrap_or(false))
                    .count(),
            )
        }

        let got = path_query(&doc(), Kind::Bool, &[
            Step::Key("channel"),
            Step::Key("videos"),
            Step::Each(count_live),
            Step::Key("live"),
        ]);
        assert_eq!(got, json!(1));
    }

    #[test]
    fn each_on_non_list_yields_zero() {
        fn first(results: Vec<Value>) -> Value {
            results.into_iter().next().unwrap_or(Value::Null)
        }
        let got = path_query(&doc(), Kind::Str, &[Step::Key("channel"), Step::Each(first)]);
        assert_eq!(got, json!(""));
    }

    #[test]
    fn empty_path_checks_kind_of_root() {
        assert_eq!(path_query(&doc(), Kind::Map, &[]), doc());
        assert_eq!(path_query(&doc(), Kind::List, &[]), json!([]));
    }
}
