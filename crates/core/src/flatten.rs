use serde_json::{Map, Value};

use crate::model::{SettingValue, Settings};

pub fn flatten(map: &Map<String, Value>) -> Settings {
    let mut out = Settings::new();
    flatten_into(&mut out, "", map);
    out
}

fn flatten_into(out: &mut Settings, prefix: &str, map: &Map<String, Value>) {
    for (key, value) in map {
        let path = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{prefix}.{key}")
        };

        match value {
            Value::Object(nested) => flatten_into(out, &path, nested),
            other => {
                if path.is_empty() {
                    continue;
                }
                out.insert(path, SettingValue::Scalar(other.clone()));
            }
        }
    }
}

pub fn yaml_to_json(value: &serde_yaml::Value) -> Value {
    match value {
        serde_yaml::Value::Null => Value::Null,
        serde_yaml::Value::Bool(flag) => Value::Bool(*flag),
        serde_yaml::Value::Number(number) => yaml_number_to_json(number),
        serde_yaml::Value::String(text) => Value::String(text.clone()),
        serde_yaml::Value::Sequence(items) => Value::Array(items.iter().map(yaml_to_json).collect()),
        serde_yaml::Value::Mapping(mapping) => Value::Object(
            mapping
                .iter()
                .map(|(key, value)| (yaml_key_to_string(key), yaml_to_json(value)))
                .collect(),
        ),
        serde_yaml::Value::Tagged(tagged) => yaml_to_json(&tagged.value),
    }
}

fn yaml_number_to_json(number: &serde_yaml::Number) -> Value {
    if let Some(int) = number.as_i64() {
        return Value::from(int);
    }
    if let Some(int) = number.as_u64() {
        return Value::from(int);
    }
    number
        .as_f64()
        .and_then(serde_json::Number::from_f64)
        .map(Value::Number)
        // .nan / .inf have no JSON number form
        .unwrap_or_else(|| Value::String(number.to_string()))
}

fn yaml_key_to_string(key: &serde_yaml::Value) -> String {
    match key {
        serde_yaml::Value::String(text) => text.clone(),
        serde_yaml::Value::Null => "null".to_string(),
        serde_yaml::Value::Bool(flag) => flag.to_string(),
        serde_yaml::Value::Number(number) => number.to_string(),
        serde_yaml::Value::Tagged(tagged) => yaml_key_to_string(&tagged.value),
        other => yaml_to_json(other).to_string(),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{json, Map, Value};

    use super::{flatten, yaml_to_json};
    use crate::model::{SettingValue, Settings};

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            other => panic!("expected object, got {other}"),
        }
    }

    fn unflattened(settings: &Settings) -> Map<String, Value> {
        settings
            .iter()
            .map(|(key, value)| {
                let scalar = value.as_scalar().cloned().expect("flattened JSON is scalar");
                (key.clone(), scalar)
            })
            .collect()
    }

    #[test]
    fn nested_mappings_become_dotted_keys() {
        let flat = flatten(&object(json!({
            "server": {"host": "localhost", "tls": {"enabled": false}},
            "ports": [80, 443],
            "name": "api"
        })));

        assert_eq!(flat.len(), 4);
        assert_eq!(flat["server.host"], SettingValue::text("localhost"));
        assert_eq!(flat["server.tls.enabled"], SettingValue::from(json!(false)));
        assert_eq!(flat["ports"], SettingValue::from(json!([80, 443])));
        assert_eq!(flat["name"], SettingValue::text("api"));
    }

    #[test]
    fn sequences_of_mappings_are_not_descended() {
        let flat = flatten(&object(json!({"users": [{"name": "a"}, {"name": "b"}]})));
        assert_eq!(flat.len(), 1);
        assert_eq!(flat["users"], SettingValue::from(json!([{"name": "a"}, {"name": "b"}])));
    }

    #[test]
    fn flatten_is_idempotent() {
        let once = flatten(&object(json!({
            "a": {"b": {"c": 1}, "d": "x"},
            "e": [1, {"f": 2}],
            "g": null
        })));
        let twice = flatten(&unflattened(&once));
        assert_eq!(once, twice);
    }

    #[test]
    fn empty_keys_and_empty_mappings_produce_nothing() {
        let flat = flatten(&object(json!({"": 1, "empty": {}, "keep": true})));
        assert_eq!(flat.len(), 1);
        assert!(flat.contains_key("keep"));
        assert!(flat.keys().all(|key| !key.is_empty()));
    }

    #[test]
    fn yaml_keys_are_stringified() {
        let yaml: serde_yaml::Value =
            serde_yaml::from_str("1: one\ntrue: yes\nnested:\n  2.5: half\n").expect("valid yaml");
        let converted = yaml_to_json(&yaml);
        assert_eq!(
            converted,
            json!({"1": "one", "true": "yes", "nested": {"2.5": "half"}})
        );
    }

    #[test]
    fn yaml_tags_are_dropped() {
        let yaml: serde_yaml::Value =
            serde_yaml::from_str("secret: !vault abc123\n").expect("valid yaml");
        assert_eq!(yaml_to_json(&yaml), json!({"secret": "abc123"}));
    }
}
