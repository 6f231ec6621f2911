use serde::Serialize;
use serde_json::{Map, Value};

const NAME_FIELDS: &[&str] = &["name", "fullname", "displayName", "title"];
const PREFERRED_FIELDS: &[&str] = &["preferred", "preferredName", "preferred_name"];
const FIRST_FIELDS: &[&str] = &["first", "given"];
const MIDDLE_FIELDS: &[&str] = &["middleInitial", "middle"];
const LAST_FIELDS: &[&str] = &["last", "surname", "family"];
const ACCOUNT_FIELDS: &[&str] = &["email", "username"];
const KEY_FIELDS: &[&str] = &["email", "username", "id"];
const PHOTO_FIELDS: &[&str] = &["photo", "avatar", "image", "picture"];
const WRAPPER_FIELDS: &[&str] = &["student", "fields"];

/// Where the display name of a record came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NameSource {
    Preferred,
    Constructed,
    NameField,
    Account,
    Positional,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Identity {
    pub name: String,
    pub name_source: NameSource,
    pub stable_key: String,
    pub email: Option<String>,
    pub photo_url: Option<String>,
}

/// Case-insensitive field lookup. An exact match wins over a case-folded one.
pub fn field<'a>(record: &'a Map<String, Value>, name: &str) -> Option<&'a Value> {
    if let Some(v) = record.get(name) {
        return Some(v);
    }
    record
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(name))
        .map(|(_, v)| v)
}

fn first_present<'a>(record: &'a Map<String, Value>, names: &[&str]) -> Option<&'a Value> {
    names
        .iter()
        .filter_map(|n| field(record, n))
        .find(|v| is_present(v))
}

fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::String(s) => !s.trim().is_empty(),
        _ => true,
    }
}

fn first_string(record: &Map<String, Value>, names: &[&str]) -> Option<String> {
    names
        .iter()
        .filter_map(|n| field(record, n))
        .find_map(scalar_text)
}

/// Text form of a scalar value; objects and arrays have none.
pub fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let t = s.trim();
            (!t.is_empty()).then(|| t.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// The effective record of a raw list entry: the object under `student` or
/// `fields` when the entry wraps one, else the entry itself.
pub fn unwrap_entry(entry: &Value) -> &Value {
    if let Value::Object(map) = entry {
        for key in WRAPPER_FIELDS {
            if let Some(inner) = map.get(*key) {
                if inner.is_object() {
                    return inner;
                }
            }
        }
    }
    entry
}

/// Lowercase, runs of anything outside `[a-z0-9]` collapsed to a single `-`,
/// no leading or trailing `-`.
pub fn slugify(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut pending_dash = false;
    for ch in input.chars().flat_map(char::to_lowercase) {
        if ch.is_ascii_lowercase() || ch.is_ascii_digit() {
            if pending_dash && !out.is_empty() {
                out.push('-');
            }
            pending_dash = false;
            out.push(ch);
        } else {
            pending_dash = true;
        }
    }
    out
}

pub fn positional_key(index: usize) -> String {
    format!("s-{index}")
}

fn positional_name(index: usize) -> String {
    format!("Student {}", index + 1)
}

fn name_from_object(name: &Map<String, Value>) -> Option<(String, NameSource)> {
    if let Some(pref) = first_string(name, PREFERRED_FIELDS) {
        return Some((pref, NameSource::Preferred));
    }
    let first = first_string(name, FIRST_FIELDS).unwrap_or_default();
    let middle = first_string(name, MIDDLE_FIELDS).unwrap_or_default();
    let last = first_string(name, LAST_FIELDS).unwrap_or_default();
    let constructed = [first, middle, last]
        .into_iter()
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    if constructed.is_empty() {
        None
    } else {
        Some((constructed, NameSource::Constructed))
    }
}

fn resolve_name(record: &Map<String, Value>, index: usize) -> (String, NameSource) {
    if let Some(raw) = first_present(record, NAME_FIELDS) {
        let resolved = match raw {
            Value::Object(obj) => name_from_object(obj),
            other => scalar_text(other).map(|s| (s, NameSource::NameField)),
        };
        if let Some(found) = resolved {
            return found;
        }
    }
    if let Some(account) = first_string(record, ACCOUNT_FIELDS) {
        return (account, NameSource::Account);
    }
    (positional_name(index), NameSource::Positional)
}

fn local_part(account: &str) -> &str {
    account.split('@').next().unwrap_or(account)
}

fn resolve_key(record: &Map<String, Value>, name: &str, source: NameSource, index: usize) -> String {
    if let Some(account) = first_string(record, KEY_FIELDS) {
        let slug = slugify(local_part(&account));
        if !slug.is_empty() {
            return slug;
        }
    }
    if matches!(
        source,
        NameSource::Preferred | NameSource::Constructed | NameSource::NameField
    ) {
        let slug = slugify(name);
        if !slug.is_empty() {
            return slug;
        }
    }
    positional_key(index)
}

/// Resolve the display name, routing key, account and photo of a record.
///
/// Non-object records resolve to the positional fallbacks.
pub fn resolve_identity(record: &Value, index: usize) -> Identity {
    let empty = Map::new();
    let map = record.as_object().unwrap_or(&empty);

    let (name, name_source) = resolve_name(map, index);
    let stable_key = resolve_key(map, &name, name_source, index);
    let email = first_string(map, KEY_FIELDS);
    let photo_url = first_string(map, PHOTO_FIELDS);

    Identity {
        name,
        name_source,
        stable_key,
        email,
        photo_url,
    }
}

/// Routing key of the raw list entry at `index`.
pub fn key_for(entry: &Value, index: usize) -> String {
    resolve_identity(unwrap_entry(entry), index).stable_key
}
