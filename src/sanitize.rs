//! Post-fetch page sanitation and cursor derivation.
//!
//! Cursor-paginated queries over-fetch one row past the page size to learn
//! whether more data exists. The sanitizer trims that probe row, restores
//! display order for backward pages (which are fetched under a reversed
//! ORDER BY), and derives the next/previous cursors from the first and last
//! rows that remain.
//!
//! Rows are read through the [`RowAccess`] capability rather than any
//! concrete row type; a closure adapter covers typed rows.

use indexmap::IndexMap;
use serde_json::Value as JsonValue;
use tracing::trace;

use crate::cursor::{Cursor, CursorDirection};
use crate::error::Result;
use crate::sort::SortSpec;

/// Read access to one result row's column values.
///
/// `identity` is the sort token's column identity, qualifier included
/// (`"t.id"`). Return `None` when the row has no such column; the sanitizer
/// records NULL in the cursor rather than failing.
pub trait RowAccess {
   fn column_value(&self, identity: &str) -> Option<JsonValue>;
}

/// Result sets usually label columns bare, so a qualified identity falls back
/// to its unqualified name.
impl RowAccess for IndexMap<String, JsonValue> {
   fn column_value(&self, identity: &str) -> Option<JsonValue> {
      if let Some(value) = self.get(identity) {
         return Some(value.clone());
      }
      identity
         .rsplit_once('.')
         .and_then(|(_, bare)| self.get(bare))
         .cloned()
   }
}

/// Encoded cursors for the page that remains after sanitation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageCursors {
   /// Cursor for the page after this one, when one exists.
   pub next: Option<String>,
   /// Cursor for the page before this one, when one exists.
   pub prev: Option<String>,
}

/// Trims the over-fetch probe row and derives page cursors.
#[derive(Debug, Clone)]
pub struct PageSanitizer {
   spec: SortSpec,
   direction: CursorDirection,
   limit: i64,
   first_page: bool,
}

impl PageSanitizer {
   /// `direction` and `first_page` describe the request that produced the
   /// rows: which way it paged, and whether it carried no cursor at all.
   pub fn new(spec: SortSpec, direction: CursorDirection, limit: i64, first_page: bool) -> Self {
      Self {
         spec,
         direction,
         limit,
         first_page,
      }
   }

   /// Sanitize rows that implement [`RowAccess`].
   pub fn sanitize<R: RowAccess>(&self, rows: &mut Vec<R>) -> Result<PageCursors> {
      self.sanitize_with(rows, |row, identity| row.column_value(identity))
   }

   /// Sanitize arbitrary rows through a column accessor closure.
   pub fn sanitize_with<T>(
      &self,
      rows: &mut Vec<T>,
      column_value: impl Fn(&T, &str) -> Option<JsonValue>,
   ) -> Result<PageCursors> {
      let fetched = rows.len();
      let exceeded = fetched as i64 > self.limit;

      // Backward pages are fetched under a reversed ORDER BY; restore
      // display order before trimming so the probe row sits at the front.
      if self.direction == CursorDirection::Prev {
         rows.reverse();
      }
      if exceeded {
         match self.direction {
            CursorDirection::Next => {
               rows.pop();
            }
            CursorDirection::Prev => {
               rows.remove(0);
            }
         }
      }

      trace!(
         fetched,
         kept = rows.len(),
         exceeded,
         first_page = self.first_page,
         "sanitized page"
      );

      if rows.is_empty() {
         return Ok(PageCursors::default());
      }

      let emit_next = exceeded || self.direction == CursorDirection::Prev;
      let emit_prev = !self.first_page
         && match self.direction {
            _ if exceeded => true,
            CursorDirection::Next => true,
            CursorDirection::Prev => false,
         };

      let mut cursors = PageCursors::default();
      if emit_next && let Some(last) = rows.last() {
         cursors.next = Some(self.capture(last, CursorDirection::Next, &column_value)?);
      }
      if emit_prev && let Some(first) = rows.first() {
         cursors.prev = Some(self.capture(first, CursorDirection::Prev, &column_value)?);
      }

      Ok(cursors)
   }

   /// Snapshot a boundary row's sort-column values into an encoded cursor.
   fn capture<T>(
      &self,
      row: &T,
      direction: CursorDirection,
      column_value: &impl Fn(&T, &str) -> Option<JsonValue>,
   ) -> Result<String> {
      let mut cursor = Cursor::new(direction);
      for col in self.spec.columns() {
         let identity = col.identity();
         let value = column_value(row, &identity).unwrap_or(JsonValue::Null);
         cursor.insert(identity, value);
      }
      cursor.encode()
   }
}

#[cfg(test)]
mod tests {
   use super::*;
   use serde_json::json;

   fn row(pairs: &[(&str, JsonValue)]) -> IndexMap<String, JsonValue> {
      pairs
         .iter()
         .map(|(k, v)| (k.to_string(), v.clone()))
         .collect()
   }

   fn id_rows(ids: &[i64]) -> Vec<IndexMap<String, JsonValue>> {
      ids.iter().map(|id| row(&[("id", json!(id))])).collect()
   }

   fn sanitizer(tokens: &[&str], direction: CursorDirection, limit: i64, first: bool) -> PageSanitizer {
      PageSanitizer::new(SortSpec::parse(tokens).unwrap(), direction, limit, first)
   }

   fn decode(encoded: &Option<String>) -> Cursor {
      Cursor::decode(encoded.as_deref().unwrap()).unwrap()
   }

   // ─── forward paging ───

   #[test]
   fn first_page_with_more_data_keeps_limit_rows() {
      let mut rows = id_rows(&[1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11]);
      let cursors = sanitizer(&["id"], CursorDirection::Next, 10, true)
         .sanitize(&mut rows)
         .unwrap();

      assert_eq!(rows.len(), 10);
      assert_eq!(rows.last().unwrap()["id"], json!(10));
      assert!(cursors.prev.is_none());

      let next = decode(&cursors.next);
      assert!(next.is_next());
      assert_eq!(next.value("id"), Some(&json!(10)));
   }

   #[test]
   fn middle_page_emits_both_cursors() {
      let mut rows = id_rows(&[11, 12, 13, 14]);
      let cursors = sanitizer(&["id"], CursorDirection::Next, 3, false)
         .sanitize(&mut rows)
         .unwrap();

      assert_eq!(rows.len(), 3);
      assert_eq!(decode(&cursors.next).value("id"), Some(&json!(13)));

      let prev = decode(&cursors.prev);
      assert!(prev.is_prev());
      assert_eq!(prev.value("id"), Some(&json!(11)));
   }

   #[test]
   fn last_page_has_no_next_cursor() {
      let mut rows = id_rows(&[21, 22]);
      let cursors = sanitizer(&["id"], CursorDirection::Next, 10, false)
         .sanitize(&mut rows)
         .unwrap();

      assert_eq!(rows.len(), 2);
      assert!(cursors.next.is_none());
      assert_eq!(decode(&cursors.prev).value("id"), Some(&json!(21)));
   }

   #[test]
   fn exact_limit_first_page_emits_nothing() {
      let mut rows = id_rows(&[1, 2, 3]);
      let cursors = sanitizer(&["id"], CursorDirection::Next, 3, true)
         .sanitize(&mut rows)
         .unwrap();

      assert_eq!(rows.len(), 3);
      assert!(cursors.next.is_none());
      assert!(cursors.prev.is_none());
   }

   // ─── backward paging ───

   #[test]
   fn backward_page_restores_display_order_and_trims_front() {
      // Fetched under reversed ORDER BY: descending ids, one probe row
      let mut rows = id_rows(&[13, 12, 11, 10]);
      let cursors = sanitizer(&["id"], CursorDirection::Prev, 3, false)
         .sanitize(&mut rows)
         .unwrap();

      let ids: Vec<_> = rows.iter().map(|r| r["id"].clone()).collect();
      assert_eq!(ids, vec![json!(11), json!(12), json!(13)]);

      // More data exists on both sides
      assert_eq!(decode(&cursors.prev).value("id"), Some(&json!(11)));
      assert_eq!(decode(&cursors.next).value("id"), Some(&json!(13)));
   }

   #[test]
   fn backward_page_at_the_start_keeps_only_next() {
      let mut rows = id_rows(&[3, 2, 1]);
      let cursors = sanitizer(&["id"], CursorDirection::Prev, 10, false)
         .sanitize(&mut rows)
         .unwrap();

      let ids: Vec<_> = rows.iter().map(|r| r["id"].clone()).collect();
      assert_eq!(ids, vec![json!(1), json!(2), json!(3)]);
      assert!(cursors.prev.is_none());
      assert_eq!(decode(&cursors.next).value("id"), Some(&json!(3)));
   }

   // ─── cursor capture ───

   #[test]
   fn capture_includes_every_sort_column() {
      let mut rows = vec![
         row(&[("code", json!("A")), ("id", json!(1))]),
         row(&[("code", json!("B")), ("id", json!(2))]),
      ];
      let cursors = sanitizer(&["code", "-id"], CursorDirection::Next, 1, true)
         .sanitize(&mut rows)
         .unwrap();

      let next = decode(&cursors.next);
      assert_eq!(next.value("code"), Some(&json!("A")));
      assert_eq!(next.value("id"), Some(&json!(1)));
   }

   #[test]
   fn qualified_identity_falls_back_to_bare_column() {
      let mut rows = vec![row(&[("id", json!(7))]), row(&[("id", json!(8))])];
      let cursors = sanitizer(&["t.id"], CursorDirection::Next, 1, true)
         .sanitize(&mut rows)
         .unwrap();

      assert_eq!(decode(&cursors.next).value("t.id"), Some(&json!(7)));
   }

   #[test]
   fn missing_column_is_captured_as_null() {
      let mut rows = vec![row(&[("id", json!(1))]), row(&[("id", json!(2))])];
      let cursors = sanitizer(&["score null", "id"], CursorDirection::Next, 1, true)
         .sanitize(&mut rows)
         .unwrap();

      let next = decode(&cursors.next);
      assert_eq!(next.value("score"), None);
      assert_eq!(next.value("id"), Some(&json!(1)));
   }

   #[test]
   fn typed_rows_through_closure_adapter() {
      struct Post {
         id: i64,
      }
      let mut rows = vec![Post { id: 1 }, Post { id: 2 }];

      let cursors = sanitizer(&["id"], CursorDirection::Next, 1, true)
         .sanitize_with(&mut rows, |post, identity| match identity {
            "id" => Some(json!(post.id)),
            _ => None,
         })
         .unwrap();

      assert_eq!(rows.len(), 1);
      assert_eq!(decode(&cursors.next).value("id"), Some(&json!(1)));
   }

   // ─── degenerate input ───

   #[test]
   fn empty_result_set_emits_no_cursors() {
      let mut rows = id_rows(&[]);
      let cursors = sanitizer(&["id"], CursorDirection::Prev, 10, false)
         .sanitize(&mut rows)
         .unwrap();

      assert_eq!(cursors, PageCursors::default());
   }
}
