use serde_json::{Map, Value};

use crate::json::to_pretty_json;

/// Mask token used when none is configured
pub const DEFAULT_INK: &str = "[--REDACTED--]";

/// Key names redacted when none are configured
pub fn default_keys() -> Vec<String> {
    vec![
        "password".to_string(),
        "password_confirmation".to_string(),
        "authorization".to_string(),
        "telephone_number".to_string(),
        "email".to_string(),
        "algolia_key".to_string(),
        "access-token".to_string(),
    ]
}

/// Deny-by-key redaction engine.
///
/// Values are masked based on the key they are stored under, never on their
/// content. Keys match case-sensitively and exactly.
#[derive(Debug, Clone)]
pub struct Redactor {
    keys: Vec<String>,
    ink: String,
}

impl Redactor {
    pub fn new(keys: Vec<String>, ink: impl Into<String>) -> Self {
        Self {
            keys,
            ink: ink.into(),
        }
    }

    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    pub fn ink(&self) -> &str {
        &self.ink
    }

    pub fn is_denied(&self, key: &str) -> bool {
        self.keys.iter().any(|k| k == key)
    }

    /// Keep the first and last two characters and replace the middle with the ink.
    ///
    /// Inputs shorter than four characters overlap: `"abc"` becomes
    /// `"ab" + ink + "bc"`.
    pub fn partial_replace(&self, input: Option<&str>) -> Option<String> {
        input.map(|s| self.mask(s))
    }

    /// Non-optional form of [`Redactor::partial_replace`].
    pub fn mask(&self, input: &str) -> String {
        if input.is_empty() {
            return String::new();
        }

        let chars: Vec<char> = input.chars().collect();
        let head: String = chars.iter().take(2).collect();
        let tail: String = chars[chars.len().saturating_sub(2)..].iter().collect();

        format!("{}{}{}", head, self.ink, tail)
    }

    /// Recursively redact every leaf stored under a denied key.
    ///
    /// Scalars at the top level pass through untouched.
    pub fn redact_structure(&self, value: Value) -> Value {
        match value {
            Value::Object(map) => Value::Object(self.redact_map(map)),
            Value::Array(items) => Value::Array(
                items
                    .into_iter()
                    .map(|item| self.redact_structure(item))
                    .collect(),
            ),
            other => other,
        }
    }

    fn redact_map(&self, map: Map<String, Value>) -> Map<String, Value> {
        map.into_iter()
            .map(|(key, value)| {
                let value = match value {
                    Value::Object(_) | Value::Array(_) => self.redact_structure(value),
                    leaf if self.is_denied(&key) => self.redact_leaf(leaf),
                    leaf => leaf,
                };
                (key, value)
            })
            .collect()
    }

    fn redact_leaf(&self, leaf: Value) -> Value {
        match leaf {
            Value::Null => Value::Null,
            Value::String(s) if self.is_masked(&s) => Value::String(s),
            Value::String(s) => Value::String(self.mask(&s)),
            Value::Number(n) => Value::String(self.mask(&n.to_string())),
            Value::Bool(b) => Value::String(self.mask(&b.to_string())),
            other => other,
        }
    }

    /// Whether `s` already has the shape produced by [`Redactor::mask`].
    fn is_masked(&self, s: &str) -> bool {
        if self.ink.is_empty() {
            return false;
        }

        s.char_indices()
            .take(2)
            .map(|(i, c)| i + c.len_utf8())
            .any(|split| {
                s[split..]
                    .strip_prefix(self.ink.as_str())
                    .is_some_and(|rest| (1..=2).contains(&rest.chars().count()))
            })
    }

    /// Render headers as `name : value` lines, masking denied header values.
    ///
    /// Header names are matched and emitted lowercased, in iteration order.
    pub fn redact_headers<I, K, V>(&self, headers: I) -> String
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        headers
            .into_iter()
            .map(|(name, value)| {
                let name = name.as_ref().to_ascii_lowercase();
                let value = if self.is_denied(&name) {
                    self.mask(value.as_ref())
                } else {
                    value.as_ref().to_string()
                };
                format!("{} : {}", name, value)
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Redact a serialized JSON body.
    ///
    /// Text that does not parse is returned unchanged and is therefore not
    /// redacted at all.
    pub fn redact_serialized_json(&self, text: &str) -> String {
        match serde_json::from_str::<Value>(text) {
            Ok(value) => to_pretty_json(&self.redact_structure(value)),
            Err(_) => text.to_string(),
        }
    }
}

impl Default for Redactor {
    fn default() -> Self {
        Self::new(default_keys(), DEFAULT_INK)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_partial_replace_long_input() {
        let redactor = Redactor::default();
        let masked = redactor.partial_replace(Some("supersecret")).unwrap();

        assert_eq!(masked, "su[--REDACTED--]et");
        assert_eq!(masked.chars().count(), 4 + DEFAULT_INK.len());
    }

    #[test]
    fn test_partial_replace_edge_cases() {
        let redactor = Redactor::default();

        assert_eq!(redactor.partial_replace(None), None);
        assert_eq!(redactor.partial_replace(Some("")), Some(String::new()));
        assert_eq!(redactor.mask("a"), "a[--REDACTED--]a");
        assert_eq!(redactor.mask("abc"), "ab[--REDACTED--]bc");
    }

    #[test]
    fn test_partial_replace_multibyte() {
        let redactor = Redactor::new(vec![], "*");
        assert_eq!(redactor.mask("ééxyzüü"), "éé*üü");
    }

    #[test]
    fn test_redaction_is_key_driven() {
        let redactor = Redactor::default();
        let redacted = redactor.redact_structure(json!({
            "password": "secret",
            "username": "secret",
        }));

        assert_eq!(redacted["password"], "se[--REDACTED--]et");
        assert_eq!(redacted["username"], "secret");
    }

    #[test]
    fn test_redaction_recurses_into_nested_values() {
        let redactor = Redactor::default();
        let redacted = redactor.redact_structure(json!({
            "user": {
                "profile": {"email": "jane@example.com"},
                "contacts": [{"email": "bob@example.com", "name": "Bob"}],
            }
        }));

        assert_eq!(redacted["user"]["profile"]["email"], "ja[--REDACTED--]om");
        assert_eq!(
            redacted["user"]["contacts"][0]["email"],
            "bo[--REDACTED--]om"
        );
        assert_eq!(redacted["user"]["contacts"][0]["name"], "Bob");
    }

    #[test]
    fn test_denied_key_with_structured_value_is_descended() {
        let redactor = Redactor::default();
        let redacted = redactor.redact_structure(json!({
            "password": {"hint": "pet name", "password": "rex123"}
        }));

        assert_eq!(redacted["password"]["hint"], "pet name");
        assert_eq!(redacted["password"]["password"], "re[--REDACTED--]23");
    }

    #[test]
    fn test_non_string_leaves() {
        let redactor = Redactor::default();
        let redacted = redactor.redact_structure(json!({
            "telephone_number": 5551234,
            "email": null,
        }));

        assert_eq!(redacted["telephone_number"], "55[--REDACTED--]34");
        assert_eq!(redacted["email"], Value::Null);
    }

    #[test]
    fn test_scalars_pass_through() {
        let redactor = Redactor::default();

        assert_eq!(redactor.redact_structure(json!("password")), json!("password"));
        assert_eq!(redactor.redact_structure(json!(42)), json!(42));
        assert_eq!(
            redactor.redact_structure(json!(["password", "email"])),
            json!(["password", "email"])
        );
    }

    #[test]
    fn test_key_match_is_case_sensitive() {
        let redactor = Redactor::default();
        let redacted = redactor.redact_structure(json!({"Password": "hunter22"}));
        assert_eq!(redacted["Password"], "hunter22");
    }

    #[test]
    fn test_redact_headers() {
        let redactor = Redactor::default();
        let headers = vec![
            ("Host", "example.com"),
            ("Authorization", "Bearer abcdef"),
            ("Accept", "*/*"),
        ];

        let out = redactor.redact_headers(headers);

        assert_eq!(
            out,
            "host : example.com\nauthorization : Be[--REDACTED--]ef\naccept : */*"
        );
    }

    #[test]
    fn test_redact_serialized_json() {
        let redactor = Redactor::default();
        let out = redactor.redact_serialized_json(r#"{"email":"a@b.co","path":"/x/y"}"#);

        assert_eq!(
            out,
            "{\n    \"email\": \"a@[--REDACTED--]co\",\n    \"path\": \"/x/y\"\n}"
        );
    }

    #[test]
    fn test_non_json_returned_unchanged() {
        let redactor = Redactor::default();
        let body = "password=hunter2&email=a@b.co";
        assert_eq!(redactor.redact_serialized_json(body), body);

        let truncated = "{\"password\": \"abc";
        assert_eq!(redactor.redact_serialized_json(truncated), truncated);
    }

    #[test]
    fn test_redaction_idempotent() {
        let redactor = Redactor::default();
        let inputs = [
            r#"{"password":"x","email":"ab","nested":{"authorization":"Bearer token"}}"#,
            r#"[{"password":"abc"},{"password":12},{"access-token":true}]"#,
            r#""just a string""#,
            r#"{"password":"é"}"#,
        ];

        for input in inputs {
            let once = redactor.redact_serialized_json(input);
            let twice = redactor.redact_serialized_json(&once);
            assert_eq!(once, twice, "not idempotent for {}", input);
        }
    }
}
