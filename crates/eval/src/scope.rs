use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// The parameters a contract runs with.
///
/// `data` is the working scope custom statements read from and write their
/// outputs into; `keys`, `extra` and `conf` are passed through to the
/// interpreter. Missing or `null` fields deserialize as empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParamScope {
    #[serde(default, deserialize_with = "null_as_default")]
    pub data: Map<String, Value>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub keys: Map<String, Value>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub extra: Map<String, Value>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub conf: String,
}

impl ParamScope {
    pub fn new(data: Map<String, Value>) -> Self {
        ParamScope {
            data,
            ..ParamScope::default()
        }
    }

    pub fn with_keys(mut self, keys: Map<String, Value>) -> Self {
        self.keys = keys;
        self
    }

    pub fn with_extra(mut self, extra: Map<String, Value>) -> Self {
        self.extra = extra;
        self
    }

    pub fn with_conf(mut self, conf: impl Into<String>) -> Self {
        self.conf = conf.into();
        self
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn missing_and_null_fields_are_empty() {
        let scope: ParamScope =
            serde_json::from_value(json!({"data": {"a": 1}, "keys": null})).unwrap();
        assert_eq!(scope.data["a"], json!(1));
        assert!(scope.keys.is_empty());
        assert!(scope.extra.is_empty());
        assert_eq!(scope.conf, "");
    }

    #[test]
    fn builders_fill_fields() {
        let keys = json!({"k": "v"}).as_object().cloned().unwrap();
        let scope = ParamScope::default().with_keys(keys).with_conf("debug=1");
        assert_eq!(scope.keys["k"], json!("v"));
        assert_eq!(scope.conf, "debug=1");
    }
}
