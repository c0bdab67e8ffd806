// Property-string codec
//
// The appliance flattens structured attributes into one string of
// `key=value` segments joined by `|`, e.g. `ttl=300|reverseRecord=true|`.
// Empty segments are legal. Values never contain `|` or `=`, so there is
// no escaping.

use std::collections::BTreeMap;

use crate::error::Error;

/// Parsed property string. Ordering carries no meaning on the wire.
pub type PropertyMap = BTreeMap<String, String>;

/// Keys the appliance sets itself and rejects on update.
pub const PARENT_KEYS: [&str; 2] = ["parentId", "parentType"];

/// Property that toggles the PTR record of a host record.
pub const REVERSE_RECORD: &str = "reverseRecord";

const SEPARATOR: char = '|';

fn split_segment(segment: &str) -> Option<(&str, &str)> {
    let (key, value) = segment.split_once('=')?;
    let key = key.trim();
    if key.is_empty() {
        return None;
    }
    let value = value.trim();
    let value = value
        .strip_prefix('\'')
        .and_then(|v| v.strip_suffix('\''))
        .unwrap_or(value);
    Some((key, value))
}

/// Parse a property string into a map.
///
/// Whitespace around keys and values is stripped, as are single quotes
/// wrapping a value. Segments without `=` are skipped. When a key repeats,
/// the first occurrence wins (same rule as [`get`]).
pub fn parse(s: &str) -> PropertyMap {
    let mut map = PropertyMap::new();
    for (key, value) in s.split(SEPARATOR).filter_map(split_segment) {
        map.entry(key.to_owned()).or_insert_with(|| value.to_owned());
    }
    map
}

/// Serialize a map as `k=v|` per entry.
pub fn join(map: &PropertyMap) -> String {
    map.iter().fold(String::new(), |mut acc, (k, v)| {
        acc.push_str(k);
        acc.push('=');
        acc.push_str(v);
        acc.push(SEPARATOR);
        acc
    })
}

/// Value of `key`, or an empty string. First match wins.
pub fn get(key: &str, s: &str) -> String {
    s.split(SEPARATOR)
        .filter_map(split_segment)
        .find(|(k, _)| *k == key)
        .map(|(_, v)| v.to_owned())
        .unwrap_or_default()
}

fn retain_segments(s: &str, keep: impl Fn(&str) -> bool) -> String {
    s.split(SEPARATOR)
        .filter(|segment| !segment.trim().is_empty())
        .filter(|segment| {
            let key = segment.split_once('=').map_or(*segment, |(k, _)| k);
            keep(key.trim())
        })
        .fold(String::new(), |mut acc, segment| {
            acc.push_str(segment);
            acc.push(SEPARATOR);
            acc
        })
}

/// Drop every segment whose key equals `key`.
pub fn remove(key: &str, s: &str) -> String {
    retain_segments(s, |k| k != key)
}

/// Drop every segment whose key appears in `keys`.
pub fn remove_immutable(s: &str, keys: &[&str]) -> String {
    retain_segments(s, |k| !keys.contains(&k))
}

/// Replace (or add) `key` with `value`.
pub fn set(key: &str, value: &str, s: &str) -> String {
    let mut out = remove(key, s);
    out.push_str(key);
    out.push('=');
    out.push_str(value);
    out.push(SEPARATOR);
    out
}

/// Subset of `server` whose keys also appear in `config`.
///
/// Used on read so that properties the appliance adds on its own do not
/// show up as drift.
pub fn filter_by_keys(server: &PropertyMap, config: &PropertyMap) -> PropertyMap {
    server
        .iter()
        .filter(|(k, _)| config.contains_key(*k))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect()
}

/// `true` iff every entry of `new` exists in `old` with the same value,
/// i.e. applying `new` over `old` changes nothing.
pub fn is_superset(old: &PropertyMap, new: &PropertyMap) -> bool {
    new.iter().all(|(k, v)| old.get(k) == Some(v))
}

/// String form of [`is_superset`].
pub fn suppresses(old: &str, new: &str) -> bool {
    is_superset(&parse(old), &parse(new))
}

/// Normalize a caller-supplied reverse-record flag to `"true"`/`"false"`.
///
/// Accepts `yes`/`true`/`1` and `no`/`false`/`0`/empty, case-insensitively.
pub fn normalize_flag(value: &str) -> Result<&'static str, Error> {
    match value.trim().to_ascii_lowercase().as_str() {
        "yes" | "true" | "1" => Ok("true"),
        "no" | "false" | "0" | "" => Ok("false"),
        other => Err(Error::validation(
            "reverse_record",
            format!("expected one of yes/no/true/false/1/0, got '{other}'"),
        )),
    }
}

/// Re-case the `reverseRecord` value of a property string to canonical
/// lowercase `true`/`false`. Other segments are left untouched.
pub fn canonicalize_reverse_record(s: &str) -> Result<String, Error> {
    let mut out = String::with_capacity(s.len());
    for segment in s.split(SEPARATOR).filter(|seg| !seg.trim().is_empty()) {
        match split_segment(segment) {
            Some((REVERSE_RECORD, value)) => {
                let canonical = match value.to_ascii_lowercase().as_str() {
                    "true" => "true",
                    "false" => "false",
                    _ => {
                        return Err(Error::validation(
                            REVERSE_RECORD,
                            format!("must be 'true' or 'false', got '{value}'"),
                        ));
                    }
                };
                out.push_str(REVERSE_RECORD);
                out.push('=');
                out.push_str(canonical);
            }
            _ => out.push_str(segment),
        }
        out.push(SEPARATOR);
    }
    Ok(out)
}
