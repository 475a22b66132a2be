//! Fluent pagination builder.
//!
//! [`Paginator`] collects the raw SELECT, the sort tokens, and the paging
//! inputs, then compiles them into a final query plus an aligned argument
//! list. Three modes, inferred from what was set:
//!
//! - **cursor**: a cursor (or a limit without an offset) was set — seek
//!   predicate, ORDER BY, and an over-fetching LIMIT (page size + 1);
//!   requires a sort spec. A cursor takes precedence over an offset.
//! - **offset**: an offset was set — LIMIT/OFFSET with optional ORDER BY.
//! - **sort-only**: only sort tokens were set — ORDER BY injection alone.
//!
//! Cursor-mode builds retain enough state for [`Built::sanitize`] to trim
//! the probe row and derive the page cursors afterward.

use serde_json::{Value as JsonValue, json};
use tracing::{debug, trace};

use crate::cursor::{Cursor, CursorDirection};
use crate::error::{Error, Result};
use crate::modifier::ClauseMutator;
use crate::options::Options;
use crate::placeholder::{INTERNAL_MARKER, splice_args, translate};
use crate::predicate::build_seek_predicate;
use crate::sanitize::{PageCursors, PageSanitizer, RowAccess};
use crate::sort::SortSpec;

/// Builds a paginated query from a raw SELECT statement.
///
/// # Examples
///
/// ```
/// use sql_keyset::Paginator;
///
/// let built = Paginator::new("SELECT * FROM posts")
///    .with_sort(&["-id"])
///    .with_limit(10)
///    .build()?;
///
/// assert_eq!(built.query, "SELECT * FROM posts ORDER BY id DESC LIMIT ?");
/// # Ok::<(), sql_keyset::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct Paginator {
   query: String,
   options: Options,
   sort_tokens: Vec<String>,
   limit: Option<i64>,
   offset: Option<i64>,
   cursor: Option<String>,
   args: Vec<JsonValue>,
}

impl Paginator {
   /// Start a build over `query` with the process-wide default options.
   pub fn new(query: impl Into<String>) -> Self {
      Self {
         query: query.into(),
         options: Options::defaults(),
         sort_tokens: Vec::new(),
         limit: None,
         offset: None,
         cursor: None,
         args: Vec::new(),
      }
   }

   /// Replace the options for this build only.
   pub fn with_options(mut self, options: Options) -> Self {
      self.options = options;
      self
   }

   /// Set the sort tokens (`"name"`, `"-name"`, `"+name"`, `"name null"`).
   pub fn with_sort<S: AsRef<str>>(mut self, tokens: &[S]) -> Self {
      self.sort_tokens = tokens.iter().map(|t| t.as_ref().to_string()).collect();
      self
   }

   /// Set the page size. Falls back to the options default when unset.
   pub fn with_limit(mut self, limit: i64) -> Self {
      self.limit = Some(limit);
      self
   }

   /// Set the row offset, switching the build to offset pagination.
   pub fn with_offset(mut self, offset: i64) -> Self {
      self.offset = Some(offset);
      self
   }

   /// Resume from an encoded cursor returned by a previous page.
   pub fn with_cursor(mut self, cursor: impl Into<String>) -> Self {
      self.cursor = Some(cursor.into());
      self
   }

   /// Bind arguments for placeholders already present in the raw query.
   pub fn with_args(mut self, args: Vec<JsonValue>) -> Self {
      self.args = args;
      self
   }

   /// Compile the final query text and its aligned argument list.
   pub fn build(self) -> Result<Built> {
      let query = self.query.trim();
      let upper = query.trim_start().to_ascii_uppercase();
      if !upper.starts_with("SELECT") && !upper.starts_with("WITH") {
         return Err(Error::UnsupportedStatement);
      }

      let spec = if self.sort_tokens.is_empty() {
         None
      } else {
         Some(SortSpec::parse(&self.sort_tokens)?)
      };

      // Final pages publish an empty cursor string and clients echo it
      // back, so blank means "no cursor", not a decode failure.
      let cursor_text = self
         .cursor
         .as_deref()
         .map(str::trim)
         .filter(|encoded| !encoded.is_empty());

      let mut mutator = ClauseMutator::new(query);
      let mut injected: Vec<JsonValue> = Vec::new();
      let mut state: Option<PageState> = None;
      let mode;

      // A cursor always wins over an offset; offset pagination only runs
      // when no usable cursor was supplied.
      if cursor_text.is_some() || (self.limit.is_some() && self.offset.is_none()) {
         mode = "cursor";
         let spec = spec.ok_or(Error::MissingSortSpec)?;
         let limit = self.limit.unwrap_or(self.options.default_limit);
         if limit <= 0 {
            return Err(Error::InvalidLimit);
         }

         let cursor = match cursor_text {
            Some(encoded) => Some(Cursor::decode(encoded)?),
            None => None,
         };
         let first_page = cursor.is_none();
         let direction = cursor
            .as_ref()
            .map_or(CursorDirection::Next, Cursor::direction);

         if let Some(cursor) = &cursor {
            let (predicate, args) = build_seek_predicate(&spec, cursor);
            if !predicate.is_empty() {
               trace!(%predicate, bound = args.len(), "seek predicate");
               mutator.append_where(&predicate);
               injected.extend(args);
            }
         }

         // Backward pages run under a fully reversed ORDER BY; the
         // sanitizer restores display order afterward.
         let order_spec = match direction {
            CursorDirection::Next => spec.clone(),
            CursorDirection::Prev => spec.reversed(),
         };
         mutator.set_order_by(&order_spec.order_terms(self.options.null_order));

         // Fetch one row past the page to learn whether more data exists
         mutator.set_limit(INTERNAL_MARKER);
         injected.push(json!(limit + 1));

         state = Some(PageState {
            spec,
            direction,
            limit,
            first_page,
         });
      } else if self.offset.is_some() {
         mode = "offset";
         let limit = self.limit.unwrap_or(self.options.default_limit);
         if limit <= 0 {
            return Err(Error::InvalidLimit);
         }
         let offset = self.offset.unwrap_or(0);
         if offset < 0 {
            return Err(Error::NegativeOffset);
         }

         if let Some(spec) = &spec {
            mutator.set_order_by(&spec.order_terms(self.options.null_order));
         }
         mutator.set_limit(INTERNAL_MARKER);
         mutator.set_offset(INTERNAL_MARKER);
         injected.push(json!(limit));
         injected.push(json!(offset));
      } else if let Some(spec) = &spec {
         mode = "sort";
         mutator.set_order_by(&spec.order_terms(self.options.null_order));
      } else {
         return Err(Error::NothingToBuild);
      }

      let text = mutator.build();
      let translated = translate(&text, self.options.placeholder);
      let args = splice_args(self.args, injected, &translated.marker_ordinals);

      debug!(
         mode,
         placeholders = translated.placeholder_count,
         args = args.len(),
         "compiled paginated query"
      );

      Ok(Built {
         query: translated.text,
         args,
         state,
      })
   }
}

#[derive(Debug, Clone)]
struct PageState {
   spec: SortSpec,
   direction: CursorDirection,
   limit: i64,
   first_page: bool,
}

/// A compiled query: final text, aligned arguments, and (for cursor builds)
/// the state needed to sanitize the fetched rows.
#[derive(Debug, Clone)]
pub struct Built {
   /// Final query text with placeholders in the configured style.
   pub query: String,
   /// Bind arguments aligned left-to-right with the placeholders.
   pub args: Vec<JsonValue>,
   state: Option<PageState>,
}

impl Built {
   /// Trim the probe row and derive page cursors from the fetched rows.
   ///
   /// Fails with [`Error::NotPaginated`] on offset or sort-only builds.
   pub fn sanitize<R: RowAccess>(&self, rows: &mut Vec<R>) -> Result<PageCursors> {
      self.sanitizer()?.sanitize(rows)
   }

   /// Like [`sanitize`](Built::sanitize), reading rows through a closure.
   pub fn sanitize_with<T>(
      &self,
      rows: &mut Vec<T>,
      column_value: impl Fn(&T, &str) -> Option<JsonValue>,
   ) -> Result<PageCursors> {
      self.sanitizer()?.sanitize_with(rows, column_value)
   }

   fn sanitizer(&self) -> Result<PageSanitizer> {
      let state = self.state.as_ref().ok_or(Error::NotPaginated)?;
      Ok(PageSanitizer::new(
         state.spec.clone(),
         state.direction,
         state.limit,
         state.first_page,
      ))
   }
}

/// Rewrite a SELECT into its total-count companion query.
///
/// The projection becomes `COUNT(*) AS total_data`; a leading WITH block and
/// everything from the main FROM onward are preserved.
pub fn build_count_query(query: &str) -> Result<String> {
   let mut mutator = ClauseMutator::new(query);
   mutator.convert_to_count()?;
   Ok(mutator.build())
}
