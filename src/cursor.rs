//! Opaque pagination cursors and their wire codec.
//!
//! A cursor snapshots the sort-column values of a boundary row together with
//! the paging direction. The wire form is `base64(JSON)` of
//! `{"prefix":"next"|"prev","cols":{<identity>:<scalar-or-null>,...}}` and is
//! round-tripped verbatim by external clients, so it must stay stable once
//! published.
//!
//! The sort columns must collectively form a stable, unique ordering key;
//! otherwise pagination can skip or repeat rows. This is the caller's
//! responsibility and is not checked here.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::error::Result;

/// Which way a cursor pages through the result set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CursorDirection {
   /// Toward rows sorting after the boundary row.
   Next,
   /// Toward rows sorting before the boundary row.
   Prev,
}

/// An opaque pagination marker: direction plus boundary-row column values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cursor {
   #[serde(rename = "prefix")]
   direction: CursorDirection,
   #[serde(default)]
   cols: IndexMap<String, JsonValue>,
}

impl Cursor {
   /// Create an empty cursor for the given direction.
   pub fn new(direction: CursorDirection) -> Self {
      Self {
         direction,
         cols: IndexMap::new(),
      }
   }

   pub fn direction(&self) -> CursorDirection {
      self.direction
   }

   pub fn is_next(&self) -> bool {
      self.direction == CursorDirection::Next
   }

   pub fn is_prev(&self) -> bool {
      self.direction == CursorDirection::Prev
   }

   /// Record a boundary-row value for a column identity.
   pub fn insert(&mut self, identity: impl Into<String>, value: JsonValue) {
      self.cols.insert(identity.into(), value);
   }

   /// Captured value for a column identity.
   ///
   /// Returns `None` both for a missing key and for an explicit JSON null —
   /// either way the boundary row had no comparable value there.
   pub fn value(&self, identity: &str) -> Option<&JsonValue> {
      self.cols.get(identity).filter(|v| !v.is_null())
   }

   /// Serialize to the portable wire form: base64 over compact JSON.
   pub fn encode(&self) -> Result<String> {
      let json = serde_json::to_vec(self)?;
      Ok(STANDARD.encode(json))
   }

   /// Decode a wire-form cursor, failing on invalid base64 or JSON.
   pub fn decode(encoded: &str) -> Result<Self> {
      let json = STANDARD.decode(encoded)?;
      Ok(serde_json::from_slice(&json)?)
   }
}
