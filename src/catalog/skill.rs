use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};

const PARENT_KEYS: [&str; 3] = ["parentId", "parent_id", "parent"];
const UNLOCK_KEYS: [&str; 4] = ["unlocks", "unlockedBy", "userSkills", "progress"];

#[derive(Clone, Debug, Default, Deserialize)]
pub struct SkillDefinition {
    #[serde(default, deserialize_with = "opaque_id")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub name: String,
    #[serde(
        default,
        rename = "parentId",
        alias = "parent_id",
        alias = "parent",
        deserialize_with = "opaque_id"
    )]
    pub parent_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub description: String,
    #[serde(
        default,
        alias = "unlockedBy",
        alias = "userSkills",
        alias = "progress"
    )]
    pub unlocks: Value,
    #[serde(skip)]
    pub rejected: Option<String>,
}

impl SkillDefinition {
    /// Decodes one element of a catalog's `skills` array. An element that is
    /// not a skill object comes back as an id-less placeholder carrying the
    /// reason, so catalog positions stay aligned.
    pub fn from_entry(entry: Value) -> Self {
        let mut object = match entry {
            Value::Object(object) => object,
            other => return Self::placeholder(format!("expected an object, found {}", kind(&other))),
        };
        collapse_aliases(&mut object, &PARENT_KEYS);
        collapse_aliases(&mut object, &UNLOCK_KEYS);

        serde_json::from_value(Value::Object(object))
            .unwrap_or_else(|error| Self::placeholder(error.to_string()))
    }

    fn placeholder(reason: String) -> Self {
        Self {
            rejected: Some(reason),
            ..Self::default()
        }
    }

    pub fn label(&self, position: usize) -> String {
        match &self.id {
            Some(id) => id.clone(),
            None => format!("#{position}"),
        }
    }
}

/// Keeps the first non-null value among `keys` under the first key, so an
/// entry that carries two spellings of one field still decodes.
fn collapse_aliases(object: &mut Map<String, Value>, keys: &[&str]) {
    let mut chosen = None;
    for key in keys {
        if let Some(value) = object.remove(*key)
            && chosen.is_none()
            && !value.is_null()
        {
            chosen = Some(value);
        }
    }
    if let Some(value) = chosen {
        object.insert(keys[0].to_owned(), value);
    }
}

pub(crate) fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Ids arrive as JSON strings or numbers. Both compare as strings.
pub(crate) fn id_from_value(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => {
            let trimmed = text.trim();
            if trimmed.is_empty() || trimmed == "null" || trimmed == "undefined" {
                None
            } else {
                Some(trimmed.to_owned())
            }
        }
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

pub(crate) fn opaque_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(id_from_value(&value))
}

fn lenient_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::String(text) => text,
        Value::Null => String::new(),
        other => other.to_string(),
    })
}
