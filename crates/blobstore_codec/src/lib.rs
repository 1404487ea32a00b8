//! # Blobstore Codec
//!
//! Record encoding for blobstore backends.
//!
//! Two encodings are provided:
//!
//! - **JSON** ([`to_json`], [`from_json`]) - the whole record as one
//!   document, used by the file backend.
//! - **Properties** ([`to_properties`], [`from_properties`]) - a flat map of
//!   field name to string, used by the Datastore backend. Records list their
//!   fields explicitly through [`Record`]; there is no runtime reflection.
//!
//! ## Property rules
//!
//! - Field names are unique per record, nested records included
//! - Empty strings are stored as null
//! - Strings longer than [`MAX_PROPERTY_BYTES`] are split into `<field>_1`,
//!   `<field>_2`, ... and joined back in numeric order

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod json;
mod properties;
mod record;
mod value;

pub use error::{CodecError, CodecResult};
pub use json::{from_json, to_json};
pub use properties::{
    field_names, from_properties, restore, to_properties, PropertyMap, MAX_PROPERTY_BYTES,
};
pub use record::{FieldReader, FieldWriter, Record};
pub use value::FieldValue;
