//! Keyset ("seek") predicate construction.
//!
//! Turns a cursor plus a sort specification into a boolean expression
//! equivalent to "sorts strictly after (or before) the boundary row" under
//! lexicographic ordering: an OR over branches where branch `i` pins the
//! first `i` columns to the captured values and orders strictly at column
//! `i`. NULL captures are compared with `IS NULL` / `IS NOT NULL` instead of
//! binding a value.
//!
//! Every bound value is emitted as the internal placeholder marker and pushed
//! onto a side argument buffer in emission order; the placeholder translator
//! later splices that buffer into the caller's argument list.

use serde_json::Value as JsonValue;

use crate::cursor::{Cursor, CursorDirection};
use crate::placeholder::INTERNAL_MARKER;
use crate::sort::{SortColumn, SortDirection, SortSpec};

/// Comparator for the strict-ordering tail term of a branch.
fn comparator(seek: CursorDirection, order: SortDirection) -> &'static str {
   match (seek, order) {
      (CursorDirection::Next, SortDirection::Asc) => ">",
      (CursorDirection::Next, SortDirection::Desc) => "<",
      (CursorDirection::Prev, SortDirection::Asc) => "<",
      (CursorDirection::Prev, SortDirection::Desc) => ">",
   }
}

/// NULLs at this column sort toward the far end of the seek direction, so a
/// captured non-null value must also admit the null rows as "still ahead".
fn nulls_ahead(seek: CursorDirection, order: SortDirection) -> bool {
   matches!(
      (seek, order),
      (CursorDirection::Next, SortDirection::Asc) | (CursorDirection::Prev, SortDirection::Desc)
   )
}

/// Build the seek predicate and its side argument buffer.
///
/// Returns an empty string when no branch survives (a single nullable column
/// whose captured value is NULL, in the configurations where the branch
/// degenerates).
pub(crate) fn build_seek_predicate(spec: &SortSpec, cursor: &Cursor) -> (String, Vec<JsonValue>) {
   let columns = spec.columns();
   let seek = cursor.direction();
   let mut branches: Vec<String> = Vec::new();
   let mut args: Vec<JsonValue> = Vec::new();

   for (i, col) in columns.iter().enumerate() {
      let identity = col.identity();
      let captured = cursor.value(&identity);

      if col.nullable() && captured.is_some() && nulls_ahead(seek, col.direction()) {
         // The null rows sort after every non-null value here, so they are
         // part of "strictly past the boundary row".
         branches.push(format!("{identity} IS NULL"));
      }

      let null_tail =
         col.nullable() && captured.is_none() && !nulls_ahead(seek, col.direction());

      if col.nullable() && captured.is_none() && !null_tail {
         // Boundary row had NULL and nothing sorts past it at this column;
         // later branches' `identity IS NULL` equality terms cover the ties.
         continue;
      }

      let mut terms: Vec<String> = Vec::with_capacity(i + 1);

      for prior in &columns[..i] {
         let prior_identity = prior.identity();
         match cursor.value(&prior_identity) {
            Some(value) => {
               terms.push(format!("{prior_identity} = {INTERNAL_MARKER}"));
               args.push(value.clone());
            }
            None => terms.push(format!("{prior_identity} IS NULL")),
         }
      }

      if null_tail {
         terms.push(format!("{identity} IS NOT NULL"));
      } else {
         let op = comparator(seek, col.direction());
         terms.push(format!("{identity} {op} {INTERNAL_MARKER}"));
         args.push(captured.cloned().unwrap_or(JsonValue::Null));
      }

      branches.push(format!("({})", terms.join(" AND ")));
   }

   let predicate = match branches.len() {
      0 => String::new(),
      1 => branches.remove(0),
      _ => format!("({})", branches.join(" OR ")),
   };

   (predicate, args)
}

#[cfg(test)]
mod tests {
   use super::*;
   use serde_json::json;

   fn next_cursor(cols: &[(&str, JsonValue)]) -> Cursor {
      cursor_with(CursorDirection::Next, cols)
   }

   fn cursor_with(direction: CursorDirection, cols: &[(&str, JsonValue)]) -> Cursor {
      let mut cursor = Cursor::new(direction);
      for (identity, value) in cols {
         cursor.insert(*identity, value.clone());
      }
      cursor
   }

   // ─── basic branches ───

   #[test]
   fn single_column_descending() {
      let spec = SortSpec::parse(&["-id"]).unwrap();
      let cursor = next_cursor(&[("id", json!(5))]);

      let (sql, args) = build_seek_predicate(&spec, &cursor);

      assert_eq!(sql, "(id < $0)");
      assert_eq!(args, vec![json!(5)]);
   }

   #[test]
   fn two_columns_mixed_directions() {
      let spec = SortSpec::parse(&["code", "-id"]).unwrap();
      let cursor = next_cursor(&[("code", json!("A")), ("id", json!(5))]);

      let (sql, args) = build_seek_predicate(&spec, &cursor);

      assert_eq!(sql, "((code > $0) OR (code = $0 AND id < $0))");
      assert_eq!(args, vec![json!("A"), json!("A"), json!(5)]);
   }

   #[test]
   fn branch_counts_grow_linearly() {
      let spec = SortSpec::parse(&["a", "b", "-c"]).unwrap();
      let cursor = next_cursor(&[("a", json!(1)), ("b", json!(2)), ("c", json!(3))]);

      let (sql, args) = build_seek_predicate(&spec, &cursor);

      assert_eq!(
         sql,
         "((a > $0) OR (a = $0 AND b > $0) OR (a = $0 AND b = $0 AND c < $0))"
      );
      // branch i binds i equality values plus one tail value
      assert_eq!(args.len(), 1 + 2 + 3);
   }

   #[test]
   fn qualified_identities_are_preserved() {
      let spec = SortSpec::parse(&["t.code", "-t.id"]).unwrap();
      let cursor = next_cursor(&[("t.code", json!("A")), ("t.id", json!(5))]);

      let (sql, _) = build_seek_predicate(&spec, &cursor);

      assert_eq!(sql, "((t.code > $0) OR (t.code = $0 AND t.id < $0))");
   }

   // ─── comparator table ───

   #[test]
   fn prev_direction_flips_comparators() {
      let spec = SortSpec::parse(&["code", "-id"]).unwrap();
      let cursor = cursor_with(
         CursorDirection::Prev,
         &[("code", json!("A")), ("id", json!(5))],
      );

      let (sql, _) = build_seek_predicate(&spec, &cursor);

      assert_eq!(sql, "((code < $0) OR (code = $0 AND id > $0))");
   }

   #[test]
   fn prev_equals_next_over_reversed_spec() {
      let spec = SortSpec::parse(&["code", "-id"]).unwrap();
      let cols = [("code", json!("A")), ("id", json!(5))];

      let (prev_sql, prev_args) =
         build_seek_predicate(&spec, &cursor_with(CursorDirection::Prev, &cols));
      let (next_sql, next_args) =
         build_seek_predicate(&spec.reversed(), &cursor_with(CursorDirection::Next, &cols));

      assert_eq!(prev_sql, next_sql);
      assert_eq!(prev_args, next_args);
   }

   // ─── nullable column, value present ───

   #[test]
   fn nullable_present_next_asc_adds_is_null_sibling() {
      let spec = SortSpec::parse(&["score null", "id"]).unwrap();
      let cursor = next_cursor(&[("score", json!(80)), ("id", json!(7))]);

      let (sql, args) = build_seek_predicate(&spec, &cursor);

      assert_eq!(
         sql,
         "(score IS NULL OR (score > $0) OR (score = $0 AND id > $0))"
      );
      assert_eq!(args, vec![json!(80), json!(80), json!(7)]);
   }

   #[test]
   fn nullable_present_prev_desc_adds_is_null_sibling() {
      let spec = SortSpec::parse(&["-score null"]).unwrap();
      let cursor = cursor_with(CursorDirection::Prev, &[("score", json!(80))]);

      let (sql, _) = build_seek_predicate(&spec, &cursor);

      assert_eq!(sql, "(score IS NULL OR (score > $0))");
   }

   #[test]
   fn nullable_present_next_desc_has_no_sibling() {
      let spec = SortSpec::parse(&["-score null"]).unwrap();
      let cursor = next_cursor(&[("score", json!(80))]);

      let (sql, _) = build_seek_predicate(&spec, &cursor);

      assert_eq!(sql, "(score < $0)");
   }

   // ─── nullable column, value absent ───

   #[test]
   fn nullable_absent_prev_asc_tail_is_not_null() {
      let spec = SortSpec::parse(&["score null", "id"]).unwrap();
      let cursor = cursor_with(
         CursorDirection::Prev,
         &[("score", JsonValue::Null), ("id", json!(7))],
      );

      let (sql, args) = build_seek_predicate(&spec, &cursor);

      assert_eq!(
         sql,
         "((score IS NOT NULL) OR (score IS NULL AND id < $0))"
      );
      assert_eq!(args, vec![json!(7)]);
   }

   #[test]
   fn nullable_absent_next_desc_tail_is_not_null() {
      let spec = SortSpec::parse(&["-score null"]).unwrap();
      let cursor = next_cursor(&[("score", JsonValue::Null)]);

      let (sql, args) = build_seek_predicate(&spec, &cursor);

      assert_eq!(sql, "(score IS NOT NULL)");
      assert!(args.is_empty());
   }

   #[test]
   fn nullable_absent_next_asc_drops_leading_branch() {
      let spec = SortSpec::parse(&["score null", "id"]).unwrap();
      let cursor = next_cursor(&[("score", JsonValue::Null), ("id", json!(7))]);

      let (sql, args) = build_seek_predicate(&spec, &cursor);

      // Branch 0 degenerates; branch 1 carries the IS NULL tie term.
      assert_eq!(sql, "(score IS NULL AND id > $0)");
      assert_eq!(args, vec![json!(7)]);
   }

   #[test]
   fn nullable_absent_single_column_can_yield_empty_predicate() {
      let spec = SortSpec::parse(&["score null"]).unwrap();
      let cursor = next_cursor(&[("score", JsonValue::Null)]);

      let (sql, args) = build_seek_predicate(&spec, &cursor);

      assert!(sql.is_empty());
      assert!(args.is_empty());
   }

   // ─── empty cursor ───

   #[test]
   fn empty_cursor_with_non_nullable_columns_binds_nulls() {
      // Degenerate input: captured values missing for non-nullable columns.
      // The comparison binds NULL, matching no rows, rather than failing.
      let spec = SortSpec::parse(&["id"]).unwrap();
      let cursor = Cursor::new(CursorDirection::Next);

      let (sql, args) = build_seek_predicate(&spec, &cursor);

      assert_eq!(sql, "(id > $0)");
      assert_eq!(args, vec![JsonValue::Null]);
   }
}
