use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};

use crate::diagnostics::Diagnostic;

use super::skill::opaque_id;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnlockRecord {
    pub user_id: String,
    pub level: u32,
    pub experience: u32,
}

#[derive(Deserialize)]
struct RawUnlockRecord {
    #[serde(
        default,
        rename = "userId",
        alias = "user_id",
        alias = "user",
        deserialize_with = "opaque_id"
    )]
    user_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_count")]
    level: u32,
    #[serde(default, alias = "exp", deserialize_with = "lenient_count")]
    experience: u32,
}

fn count_from_value(value: &Value) -> u32 {
    match value {
        Value::Number(number) => {
            if let Some(unsigned) = number.as_u64() {
                unsigned.min(u32::MAX as u64) as u32
            } else if let Some(float) = number.as_f64() {
                float.max(0.0).min(u32::MAX as f64) as u32
            } else {
                0
            }
        }
        Value::String(text) => text
            .trim()
            .parse::<f64>()
            .map(|float| float.max(0.0).min(u32::MAX as f64) as u32)
            .unwrap_or(0),
        _ => 0,
    }
}

fn lenient_count<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(count_from_value(&value))
}

/// Shapes the raw unlock payload may take. They are tried in declaration order.
#[derive(Debug)]
enum UnlockPayload<'a> {
    Empty,
    EncodedArray(Vec<Value>),
    QuotedSet(Vec<String>),
    Materialized(&'a [Value]),
    Bare(&'a Map<String, Value>),
}

impl<'a> UnlockPayload<'a> {
    fn classify(raw: &'a Value) -> Result<Self, String> {
        match raw {
            Value::Null => Ok(Self::Empty),
            Value::Array(entries) => Ok(Self::Materialized(entries)),
            Value::Object(object) => Ok(Self::Bare(object)),
            Value::String(text) => Self::classify_text(text),
            other => Err(format!("unsupported payload type: {other}")),
        }
    }

    fn classify_text(text: &str) -> Result<Self, String> {
        let trimmed = text.trim();
        if trimmed.is_empty() || trimmed == "[]" || trimmed == "{}" {
            return Ok(Self::Empty);
        }

        match serde_json::from_str::<Value>(trimmed) {
            Ok(Value::Array(entries)) => return Ok(Self::EncodedArray(entries)),
            Ok(Value::Object(object)) => return Ok(Self::EncodedArray(vec![Value::Object(object)])),
            Ok(Value::Null) => return Ok(Self::Empty),
            Ok(_) | Err(_) => {}
        }

        let quoted = split_quoted_set(trimmed);
        if quoted.is_empty() {
            Err(format!("unrecognized payload text: {}", preview(trimmed)))
        } else {
            Ok(Self::QuotedSet(quoted))
        }
    }
}

/// Splits `{"{\"userId\":1}","{...}"}` into its unescaped element strings.
fn split_quoted_set(text: &str) -> Vec<String> {
    let inner = text
        .strip_prefix('{')
        .and_then(|rest| rest.strip_suffix('}'))
        .or_else(|| text.strip_prefix('[').and_then(|rest| rest.strip_suffix(']')))
        .unwrap_or(text);

    let mut elements = Vec::new();
    let mut chars = inner.chars();
    while let Some(ch) = chars.next() {
        if ch != '"' {
            continue;
        }

        let mut element = String::new();
        let mut closed = false;
        while let Some(next) = chars.next() {
            match next {
                '\\' => {
                    if let Some(escaped) = chars.next() {
                        element.push(escaped);
                    }
                }
                '"' => {
                    closed = true;
                    break;
                }
                other => element.push(other),
            }
        }

        if closed && !element.trim().is_empty() {
            elements.push(element);
        }
    }
    elements
}

fn preview(text: &str) -> String {
    const PREVIEW_CHARS: usize = 48;
    if text.chars().count() <= PREVIEW_CHARS {
        text.to_owned()
    } else {
        let head = text.chars().take(PREVIEW_CHARS).collect::<String>();
        format!("{head}...")
    }
}

#[derive(Clone, Debug, Default)]
pub struct UnlockSet {
    pub records: Vec<UnlockRecord>,
}

impl UnlockSet {
    pub fn for_user(&self, user_id: &str) -> Option<&UnlockRecord> {
        self.records.iter().find(|record| record.user_id == user_id)
    }
}

struct RecordDecoder<'a> {
    skill: &'a str,
    records: Vec<UnlockRecord>,
    diagnostics: &'a mut Vec<Diagnostic>,
}

impl RecordDecoder<'_> {
    fn malformed(&mut self, reason: String) {
        self.diagnostics.push(Diagnostic::MalformedUnlockRecord {
            skill: self.skill.to_owned(),
            reason,
        });
    }

    fn object(&mut self, object: &Map<String, Value>) {
        let raw = match RawUnlockRecord::deserialize(Value::Object(object.clone())) {
            Ok(raw) => raw,
            Err(error) => {
                self.malformed(error.to_string());
                return;
            }
        };

        let Some(user_id) = raw.user_id else {
            self.diagnostics.push(Diagnostic::MissingUserId {
                skill: self.skill.to_owned(),
            });
            return;
        };

        self.records.push(UnlockRecord {
            user_id,
            level: raw.level,
            experience: raw.experience,
        });
    }

    fn text(&mut self, text: &str) {
        match serde_json::from_str::<Value>(text) {
            Ok(Value::Object(object)) => self.object(&object),
            Ok(other) => self.malformed(format!("expected a record object, found {other}")),
            Err(error) => self.malformed(format!("{error} in {}", preview(text))),
        }
    }

    fn entry(&mut self, entry: &Value) {
        match entry {
            Value::Object(object) => self.object(object),
            Value::String(text) => self.text(text),
            Value::Null => {}
            other => self.malformed(format!("expected a record object, found {other}")),
        }
    }
}

/// Normalizes every record encoded in `raw`. Never fails: anything that cannot
/// be decoded is skipped and described in `diagnostics`.
pub fn parse_unlock_records(
    skill: &str,
    raw: &Value,
    diagnostics: &mut Vec<Diagnostic>,
) -> UnlockSet {
    let mut decoder = RecordDecoder {
        skill,
        records: Vec::new(),
        diagnostics,
    };

    match UnlockPayload::classify(raw) {
        Ok(UnlockPayload::Empty) => {}
        Ok(UnlockPayload::EncodedArray(entries)) => {
            for entry in &entries {
                decoder.entry(entry);
            }
        }
        Ok(UnlockPayload::QuotedSet(elements)) => {
            for element in &elements {
                decoder.text(element);
            }
        }
        Ok(UnlockPayload::Materialized(entries)) => {
            for entry in entries {
                decoder.entry(entry);
            }
        }
        Ok(UnlockPayload::Bare(object)) => decoder.object(object),
        Err(reason) => decoder.malformed(reason),
    }

    UnlockSet {
        records: decoder.records,
    }
}
