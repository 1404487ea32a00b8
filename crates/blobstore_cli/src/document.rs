//! Schemaless record type used by the CLI.

use blobstore_storage::{CodecResult, FieldReader, FieldWriter, Record};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A flat map of string fields.
///
/// The field list is whatever the document holds, so any stored record with
/// string properties can be read back as a `Document`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Document {
    fields: BTreeMap<String, String>,
}

impl Document {
    /// Builds a document from `name=value` pairs. Later pairs win.
    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        Self {
            fields: pairs.into_iter().collect(),
        }
    }
}

impl Record for Document {
    fn write_fields(&self, fields: &mut FieldWriter) {
        for (name, value) in &self.fields {
            fields.field(name, value);
        }
    }

    fn read_fields(fields: &FieldReader<'_>) -> CodecResult<Self> {
        let mut document = BTreeMap::new();
        for name in fields.field_names() {
            let value: String = fields.get(&name)?;
            document.insert(name, value);
        }
        Ok(Self { fields: document })
    }
}

/// Parses a `name=value` command-line argument.
///
/// Names ending in `_<n>` are rejected: the Datastore backend stores long
/// values as `<name>_1`, `<name>_2`, ... and a document read back would fold
/// them into one field.
pub fn parse_field(arg: &str) -> Result<(String, String), String> {
    let (name, value) = arg
        .split_once('=')
        .ok_or_else(|| format!("expected name=value, got {arg:?}"))?;
    if name.is_empty() {
        return Err(format!("field name is empty in {arg:?}"));
    }
    if is_part_name(name) {
        return Err(format!(
            "field name {name:?} ends in _<number>, which is reserved for split values"
        ));
    }
    Ok((name.to_string(), value.to_string()))
}

fn is_part_name(name: &str) -> bool {
    name.rsplit_once('_').is_some_and(|(_, suffix)| {
        !suffix.is_empty() && !suffix.starts_with('0') && suffix.bytes().all(|b| b.is_ascii_digit())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use blobstore_storage::datastore::{DatastoreStore, InMemoryDatastore};
    use blobstore_storage::BlobStore;

    fn doc(pairs: &[(&str, &str)]) -> Document {
        Document::from_pairs(pairs.iter().map(|(k, v)| ((*k).to_string(), (*v).to_string())))
    }

    #[test]
    fn parses_fields() {
        assert_eq!(parse_field("Name=redis").unwrap(), ("Name".into(), "redis".into()));
        assert_eq!(parse_field("Url=a=b").unwrap(), ("Url".into(), "a=b".into()));
        assert_eq!(parse_field("Empty=").unwrap(), ("Empty".into(), String::new()));
        assert!(parse_field("novalue").is_err());
        assert!(parse_field("=x").is_err());
    }

    #[test]
    fn rejects_split_part_names() {
        assert!(parse_field("Item_1=a").is_err());
        assert!(parse_field("Item_12=a").is_err());
        assert!(parse_field("_3=a").is_err());

        // Not read back as parts, so allowed.
        assert!(parse_field("Item_0=a").is_ok());
        assert!(parse_field("Item_01=a").is_ok());
        assert!(parse_field("Item_x=a").is_ok());
        assert!(parse_field("Item_=a").is_ok());
    }

    #[test]
    fn accepted_names_round_trip_on_datastore() {
        let store: DatastoreStore<Document, _> =
            DatastoreStore::with_client("docs", "docs", "p", InMemoryDatastore::new());

        let fields = ["Item_0=a", "Item_01=b", "Item_x=c", "Item=d"]
            .into_iter()
            .map(|arg| parse_field(arg).unwrap());
        let document = Document::from_pairs(fields);
        store.store("items", &document).unwrap();

        assert_eq!(store.load("items").unwrap(), document);
    }

    #[test]
    fn json_is_a_plain_object() {
        let document = doc(&[("Name", "redis"), ("Type", "GCP")]);
        assert_eq!(
            serde_json::to_string(&document).unwrap(),
            r#"{"Name":"redis","Type":"GCP"}"#
        );
    }

    #[test]
    fn long_values_survive_datastore_splitting() {
        let store: DatastoreStore<Document, _> =
            DatastoreStore::with_client("docs", "docs", "p", InMemoryDatastore::new());

        let body = "b".repeat(4000);
        let document = doc(&[("Body", body.as_str()), ("Name", "big")]);
        store.store("big", &document).unwrap();

        let loaded = store.load("big").unwrap();
        assert_eq!(loaded, document);
        assert_eq!(loaded.fields.len(), 2);
    }
}
