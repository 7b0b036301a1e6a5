use serde_json::{Map, Value, json};

/// Section keys used by the analysis service. The environment section really
/// is spelled this way on the wire.
pub const ENVIRONMENT_SECTION: &str = "enviromental pros and cons";
pub const HEALTH_SECTION: &str = "health pros and cons";

pub const POSITIVE_LIST: &str = "positive_things_about_the_product";
pub const HARMFUL_LIST: &str = "harmful_things_about_the_product";
pub const ALTERNATIVES_LIST: &str = "alternatives_to_consider";

const WRAPPED_PRODUCT_NAME: &str = "Analyzed Product";
const WRAPPED_PRODUCT_DESCRIPTION: &str = "Environmental impact analysis result";

/// Shape of an upstream reply, decided once before any rewriting happens.
#[derive(Debug)]
pub enum AnalysisPayload {
    /// Bare environmental lists with no report wrapper around them.
    BareEnvironment(Map<String, Value>),
    /// A report object; its sections may arrive as embedded JSON strings.
    Report(Map<String, Value>),
    /// Anything else is left untouched.
    Opaque(Value),
}

impl AnalysisPayload {
    pub fn classify(value: Value) -> Self {
        match value {
            Value::Object(map) => {
                let bare = map.len() <= 3
                    && [POSITIVE_LIST, HARMFUL_LIST, ALTERNATIVES_LIST]
                        .iter()
                        .all(|key| map.get(*key).is_some_and(is_truthy));

                if bare {
                    AnalysisPayload::BareEnvironment(map)
                } else {
                    AnalysisPayload::Report(map)
                }
            }
            other => AnalysisPayload::Opaque(other),
        }
    }

    pub fn normalize(self) -> Value {
        match self {
            AnalysisPayload::BareEnvironment(map) => json!({
                ENVIRONMENT_SECTION: Value::Object(map),
                "product_name": WRAPPED_PRODUCT_NAME,
                "product_description": WRAPPED_PRODUCT_DESCRIPTION,
            }),
            AnalysisPayload::Report(mut map) => {
                parse_embedded_section(&mut map, ENVIRONMENT_SECTION);
                parse_embedded_section(&mut map, HEALTH_SECTION);
                Value::Object(map)
            }
            AnalysisPayload::Opaque(value) => value,
        }
    }
}

/// Normalize an upstream payload into the shape the frontend renders.
/// Falsy payloads collapse to an empty object; applying the function twice
/// yields the same value as applying it once.
pub fn normalize_payload(value: Value) -> Value {
    if !is_truthy(&value) {
        return Value::Object(Map::new());
    }
    AnalysisPayload::classify(value).normalize()
}

/// Report sections sometimes come back as stringified JSON. Parse them in
/// place; garbage becomes the empty-lists fallback so the renderer always
/// has something list-shaped to walk.
fn parse_embedded_section(map: &mut Map<String, Value>, key: &str) {
    let Some(Value::String(raw)) = map.get(key) else {
        return;
    };
    if raw.is_empty() {
        return;
    }

    let parsed = serde_json::from_str::<Value>(raw).unwrap_or_else(|_| empty_section());
    map.insert(key.to_string(), parsed);
}

/// Fallback section used when an embedded JSON string cannot be parsed.
pub fn empty_section() -> Value {
    json!({
        POSITIVE_LIST: [],
        HARMFUL_LIST: [],
        ALTERNATIVES_LIST: [],
    })
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().map(|n| n != 0.0).unwrap_or(true),
        Value::String(text) => !text.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}
