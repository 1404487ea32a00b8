//! Record to property-map conversion.
//!
//! Datastore string properties are limited to [`MAX_PROPERTY_BYTES`]. Longer
//! values are stored as numbered parts:
//!
//! ```text
//! Body   = <3200 bytes>   =>   Body_1 = <1500 bytes>
//!                              Body_2 = <1500 bytes>
//!                              Body_3 = <200 bytes>
//! ```
//!
//! Parts are cut on UTF-8 character boundaries, so a part may be a few bytes
//! short of the limit. On read, an exact property name wins; otherwise the
//! numbered parts are ordered by their integer suffix and concatenated.

use crate::error::{CodecError, CodecResult};
use crate::record::{FieldReader, FieldWriter, Record};
use std::collections::{BTreeMap, BTreeSet, HashSet};

/// Maximum length in bytes of a single stored string property.
pub const MAX_PROPERTY_BYTES: usize = 1500;

/// Property name to stored value. `None` is an explicit null.
pub type PropertyMap = BTreeMap<String, Option<String>>;

/// Maps a record to its stored properties, splitting oversized strings.
///
/// # Errors
///
/// Returns [`CodecError::DuplicateField`] if the record lists a field name
/// twice, or [`CodecError::PropertyCollision`] if a field is named like a
/// numbered part (`<f>_<n>`) of a split field `<f>`.
pub fn to_properties<R: Record>(record: &R) -> CodecResult<PropertyMap> {
    let mut writer = FieldWriter::new();
    record.write_fields(&mut writer);

    let mut props = PropertyMap::new();
    let mut seen = HashSet::new();
    let mut written: Vec<String> = Vec::new();
    let mut split_fields: Vec<String> = Vec::new();

    for (name, value) in writer.into_fields() {
        if !seen.insert(name.clone()) {
            return Err(CodecError::DuplicateField { name });
        }
        written.push(name.clone());

        match value {
            Some(value) if value.len() > MAX_PROPERTY_BYTES => {
                let parts = split_value(&value, MAX_PROPERTY_BYTES);
                for (i, part) in parts.iter().enumerate() {
                    let property = part_name(&name, i + 1);
                    if props.contains_key(&property) {
                        return Err(CodecError::PropertyCollision {
                            field: name,
                            property,
                        });
                    }
                    props.insert(property, Some((*part).to_owned()));
                }
                split_fields.push(name);
            }
            value => {
                if props.contains_key(&name) {
                    let field = split_fields
                        .iter()
                        .find(|field| part_index(&name, field).is_some())
                        .map_or_else(|| name.clone(), Clone::clone);
                    return Err(CodecError::PropertyCollision {
                        field,
                        property: name,
                    });
                }
                props.insert(name, value);
            }
        }
    }

    // Any field named `<f>_<n>`, split or not, would be read back as a part
    // of the split field `<f>`.
    for field in &split_fields {
        if let Some(property) = written.iter().find(|name| part_index(name, field).is_some()) {
            return Err(CodecError::PropertyCollision {
                field: field.clone(),
                property: property.clone(),
            });
        }
    }

    Ok(props)
}

/// Rebuilds a record from stored properties.
///
/// # Errors
///
/// Returns an error if a split value is incomplete or a field cannot be
/// converted.
pub fn from_properties<R: Record>(props: &PropertyMap) -> CodecResult<R> {
    R::read_fields(&FieldReader::new(props))
}

/// Returns the stored value of one field, reassembling split parts.
///
/// Returns `Ok(None)` if the field is null or absent.
///
/// # Errors
///
/// Returns [`CodecError::MissingPart`] if the numbered parts have a gap.
pub fn restore(props: &PropertyMap, field: &str) -> CodecResult<Option<String>> {
    if let Some(value) = props.get(field) {
        return Ok(value.clone());
    }

    let mut parts: Vec<(usize, &str)> = numbered_parts(props, field)
        .map(|(index, _, value)| (index, value.unwrap_or_default()))
        .collect();
    if parts.is_empty() {
        return Ok(None);
    }

    parts.sort_unstable_by_key(|(index, _)| *index);

    let mut value = String::new();
    for (expected, (index, part)) in (1..).zip(parts) {
        if index != expected {
            return Err(CodecError::MissingPart {
                field: field.to_owned(),
                index: expected,
            });
        }
        value.push_str(part);
    }
    Ok(Some(value))
}

/// Returns the logical field names stored in `props`.
///
/// A group of two or more numbered parts `<f>_1`, `<f>_2`, ... with no exact
/// `<f>` property is reported once as `<f>`. Single numbered properties are
/// reported as they are, since a split always yields at least two parts.
#[must_use]
pub fn field_names(props: &PropertyMap) -> Vec<String> {
    let mut names = BTreeSet::new();
    for property in props.keys() {
        let folded = split_base(property).filter(|base| {
            !props.contains_key(*base)
                && props.contains_key(&part_name(base, 1))
                && props.contains_key(&part_name(base, 2))
        });
        names.insert(folded.unwrap_or(property.as_str()).to_owned());
    }
    names.into_iter().collect()
}

fn part_name(field: &str, index: usize) -> String {
    format!("{field}_{index}")
}

/// Parses the part number of `property` if it is `<field>_<n>`, n >= 1.
fn part_index(property: &str, field: &str) -> Option<usize> {
    let suffix = property.strip_prefix(field)?.strip_prefix('_')?;
    parse_index(suffix)
}

fn parse_index(suffix: &str) -> Option<usize> {
    if suffix.is_empty() || suffix.starts_with('0') || !suffix.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    suffix.parse().ok()
}

fn split_base(property: &str) -> Option<&str> {
    let (base, suffix) = property.rsplit_once('_')?;
    parse_index(suffix).map(|_| base)
}

fn numbered_parts<'a>(
    props: &'a PropertyMap,
    field: &'a str,
) -> impl Iterator<Item = (usize, &'a str, Option<&'a str>)> + 'a {
    let prefix = format!("{field}_");
    props
        .range(prefix.clone()..)
        .take_while(move |(property, _)| property.starts_with(&prefix))
        .filter_map(move |(property, value)| {
            part_index(property, field).map(|index| (index, property.as_str(), value.as_deref()))
        })
}

/// Cuts `value` into pieces of at most `max` bytes on char boundaries.
fn split_value(value: &str, max: usize) -> Vec<&str> {
    let mut parts = Vec::with_capacity(value.len() / max + 1);
    let mut start = 0;
    while start < value.len() {
        let mut end = (start + max).min(value.len());
        while !value.is_char_boundary(end) {
            end -= 1;
        }
        if end == start {
            // A single character wider than `max`.
            end = start + value[start..].chars().next().map_or(1, char::len_utf8);
        }
        parts.push(&value[start..end]);
        start = end;
    }
    parts
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Note {
        title: String,
        body: String,
    }

    impl Record for Note {
        fn write_fields(&self, fields: &mut FieldWriter) {
            fields.field("Title", &self.title).field("Body", &self.body);
        }

        fn read_fields(fields: &FieldReader<'_>) -> CodecResult<Self> {
            Ok(Self {
                title: fields.get("Title")?,
                body: fields.get("Body")?,
            })
        }
    }

    /// Writes a fixed list of raw fields, for collision tests.
    #[derive(Debug, Serialize, Deserialize)]
    struct Raw(Vec<(String, String)>);

    impl Record for Raw {
        fn write_fields(&self, fields: &mut FieldWriter) {
            for (name, value) in &self.0 {
                fields.field(name, value);
            }
        }

        fn read_fields(_fields: &FieldReader<'_>) -> CodecResult<Self> {
            Ok(Self(Vec::new()))
        }
    }

    fn note(body: String) -> Note {
        Note {
            title: "t".into(),
            body,
        }
    }

    #[test]
    fn short_value_is_single_property() {
        let props = to_properties(&note("hello".into())).unwrap();
        assert_eq!(props.len(), 2);
        assert_eq!(props["Body"].as_deref(), Some("hello"));
    }

    #[test]
    fn empty_string_is_stored_as_null() {
        let props = to_properties(&note(String::new())).unwrap();
        assert_eq!(props.get("Body"), Some(&None));

        let decoded: Note = from_properties(&props).unwrap();
        assert_eq!(decoded.body, "");
    }

    #[test]
    fn split_boundaries() {
        for (len, parts) in [(1499, 0), (1500, 0), (1501, 2), (3000, 2), (3001, 3)] {
            let body = "x".repeat(len);
            let props = to_properties(&note(body.clone())).unwrap();
            let stored_parts = props.keys().filter(|k| k.starts_with("Body_")).count();
            assert_eq!(stored_parts, parts, "len {len}");
            assert_eq!(props.contains_key("Body"), parts == 0, "len {len}");

            let decoded: Note = from_properties(&props).unwrap();
            assert_eq!(decoded.body, body, "len {len}");
        }
    }

    #[test]
    fn more_than_nine_parts_reassemble_in_numeric_order() {
        let body: String = (0..12)
            .map(|i| char::from(b'a' + i as u8).to_string().repeat(MAX_PROPERTY_BYTES))
            .collect();
        let props = to_properties(&note(body.clone())).unwrap();
        assert!(props.contains_key("Body_12"));

        // Lexical order would put Body_10 before Body_2.
        let decoded: Note = from_properties(&props).unwrap();
        assert_eq!(decoded.body, body);
    }

    #[test]
    fn multibyte_split_stays_on_char_boundary() {
        let body = "é".repeat(1000); // 2000 bytes
        let props = to_properties(&note(body.clone())).unwrap();
        for (name, value) in &props {
            if name.starts_with("Body_") {
                assert!(value.as_ref().unwrap().len() <= MAX_PROPERTY_BYTES);
            }
        }
        let decoded: Note = from_properties(&props).unwrap();
        assert_eq!(decoded.body, body);
    }

    #[test]
    fn duplicate_field_is_rejected() {
        let raw = Raw(vec![
            ("Name".into(), "a".into()),
            ("Name".into(), "b".into()),
        ]);
        let err = to_properties(&raw).unwrap_err();
        assert!(matches!(err, CodecError::DuplicateField { name } if name == "Name"));
    }

    #[test]
    fn field_named_like_a_part_is_rejected() {
        let long = "x".repeat(2000);
        let raw = Raw(vec![("Body".into(), long.clone()), ("Body_2".into(), "y".into())]);
        assert!(matches!(
            to_properties(&raw),
            Err(CodecError::PropertyCollision { .. })
        ));

        let raw = Raw(vec![("Body_1".into(), "y".into()), ("Body".into(), long.clone())]);
        assert!(matches!(
            to_properties(&raw),
            Err(CodecError::PropertyCollision { .. })
        ));

        let raw = Raw(vec![("Body".into(), long), ("Body_7".into(), "y".into())]);
        assert!(matches!(
            to_properties(&raw),
            Err(CodecError::PropertyCollision { ref property, .. }) if property == "Body_7"
        ));

        // Both long: `Body` writes Body_1/Body_2 and `Body_1` writes
        // Body_1_1/Body_1_2, so no stored name clashes, but `Body_1` would
        // read back part 1 of `Body`.
        let raw = Raw(vec![
            ("Body".into(), "x".repeat(2000)),
            ("Body_1".into(), "y".repeat(2000)),
        ]);
        assert!(matches!(
            to_properties(&raw),
            Err(CodecError::PropertyCollision { ref field, ref property })
                if field == "Body" && property == "Body_1"
        ));
    }

    #[test]
    fn part_like_names_are_fine_without_a_split_field() {
        let raw = Raw(vec![("Body".into(), "short".into()), ("Body_1".into(), "y".repeat(2000))]);
        let props = to_properties(&raw).unwrap();
        assert_eq!(restore(&props, "Body").unwrap().as_deref(), Some("short"));
        assert_eq!(restore(&props, "Body_1").unwrap(), Some("y".repeat(2000)));
    }

    #[test]
    fn gap_in_parts_is_an_error() {
        let mut props = PropertyMap::new();
        props.insert("Body_1".into(), Some("a".into()));
        props.insert("Body_3".into(), Some("c".into()));

        let err = restore(&props, "Body").unwrap_err();
        assert!(matches!(err, CodecError::MissingPart { index: 2, .. }));
    }

    #[test]
    fn exact_property_wins_over_parts() {
        let mut props = PropertyMap::new();
        props.insert("Body".into(), Some("exact".into()));
        props.insert("Body_1".into(), Some("part".into()));

        assert_eq!(restore(&props, "Body").unwrap().as_deref(), Some("exact"));
    }

    #[test]
    fn unrelated_suffixes_are_not_parts() {
        let mut props = PropertyMap::new();
        props.insert("Body_01".into(), Some("a".into()));
        props.insert("Body_x".into(), Some("b".into()));
        props.insert("Bodyguard_1".into(), Some("c".into()));

        assert_eq!(restore(&props, "Body").unwrap(), None);
    }

    #[test]
    fn field_names_fold_split_groups() {
        let props = to_properties(&note("x".repeat(4000))).unwrap();
        assert_eq!(field_names(&props), ["Body", "Title"]);

        let mut props = PropertyMap::new();
        props.insert("Slot_1".into(), Some("a".into()));
        assert_eq!(field_names(&props), ["Slot_1"]);
    }

    #[test]
    fn split_value_handles_wide_chars_with_tiny_limit() {
        assert_eq!(split_value("aé", 1), ["a", "é"]);
    }

    proptest! {
        #[test]
        fn oversized_round_trip(body in "\\PC{0,5000}") {
            let original = note(body);
            let props = to_properties(&original).unwrap();
            for (name, value) in &props {
                if let Some(value) = value {
                    prop_assert!(value.len() <= MAX_PROPERTY_BYTES, "{} too long", name);
                }
            }
            let decoded: Note = from_properties(&props).unwrap();
            prop_assert_eq!(decoded, original);
        }
    }
}
