//! Record trait and explicit field mapping.

use crate::error::{CodecError, CodecResult};
use crate::properties::{self, PropertyMap};
use crate::value::FieldValue;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// A user-defined structure that can be persisted by a blob store.
///
/// Records are encoded two ways: as JSON through `serde` (file backend) and
/// as a flat list of named string fields (Datastore backend). The field list
/// is written out by hand instead of discovered at runtime.
///
/// Field names must be unique across the record, nested records included.
///
/// # Example
///
/// ```
/// use blobstore_codec::{CodecResult, FieldReader, FieldWriter, Record};
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Debug, PartialEq, Serialize, Deserialize)]
/// struct Deployment {
///     name: String,
///     replicas: u32,
/// }
///
/// impl Record for Deployment {
///     fn write_fields(&self, fields: &mut FieldWriter) {
///         fields.field("Name", &self.name).field("Replicas", &self.replicas);
///     }
///
///     fn read_fields(fields: &FieldReader<'_>) -> CodecResult<Self> {
///         Ok(Self {
///             name: fields.get("Name")?,
///             replicas: fields.get("Replicas")?,
///         })
///     }
/// }
///
/// let record = Deployment { name: "redis".into(), replicas: 3 };
/// let props = blobstore_codec::to_properties(&record).unwrap();
/// let decoded: Deployment = blobstore_codec::from_properties(&props).unwrap();
/// assert_eq!(record, decoded);
/// ```
pub trait Record: Serialize + DeserializeOwned {
    /// Lists every field of the record, in declaration order.
    fn write_fields(&self, fields: &mut FieldWriter);

    /// Rebuilds a record from stored fields.
    ///
    /// # Errors
    ///
    /// Returns an error if a field value cannot be converted.
    fn read_fields(fields: &FieldReader<'_>) -> CodecResult<Self>;
}

/// Collects the `(name, value)` pairs of a record.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FieldWriter {
    fields: Vec<(String, Option<String>)>,
}

impl FieldWriter {
    /// Creates an empty writer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends one field.
    pub fn field<V: FieldValue>(&mut self, name: &str, value: &V) -> &mut Self {
        self.fields.push((name.to_owned(), value.to_field()));
        self
    }

    /// Appends the fields of a nested record into the same namespace.
    pub fn nested<R: Record>(&mut self, record: &R) -> &mut Self {
        record.write_fields(self);
        self
    }

    /// Returns the number of fields written so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns true if no fields were written.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Consumes the writer and returns the fields in write order.
    #[must_use]
    pub fn into_fields(self) -> Vec<(String, Option<String>)> {
        self.fields
    }
}

/// Read access to the stored properties of one record.
///
/// Lookups go through [`restore`](crate::restore), so split values come back
/// whole.
#[derive(Debug, Clone, Copy)]
pub struct FieldReader<'a> {
    properties: &'a PropertyMap,
}

impl<'a> FieldReader<'a> {
    /// Wraps a property map.
    #[must_use]
    pub fn new(properties: &'a PropertyMap) -> Self {
        Self { properties }
    }

    /// Reads and converts one field. A missing property reads as null.
    ///
    /// # Errors
    ///
    /// Returns an error if the field's parts are incomplete or the value
    /// cannot be converted to `V`.
    pub fn get<V: FieldValue>(&self, name: &str) -> CodecResult<V> {
        let raw = properties::restore(self.properties, name)?;
        V::from_field(raw.as_deref()).map_err(|message| CodecError::invalid_value(name, message))
    }

    /// Rebuilds a nested record from the same properties.
    ///
    /// # Errors
    ///
    /// Returns whatever the nested record's `read_fields` returns.
    pub fn nested<R: Record>(&self) -> CodecResult<R> {
        R::read_fields(self)
    }

    /// Returns the logical field names present, with split parts folded
    /// back into their field name.
    #[must_use]
    pub fn field_names(&self) -> Vec<String> {
        properties::field_names(self.properties)
    }

    /// Returns the underlying property map.
    #[must_use]
    pub fn properties(&self) -> &'a PropertyMap {
        self.properties
    }
}
