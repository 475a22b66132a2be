//! Clause-boundary location and in-place SQL text mutation.
//!
//! Rewrites WHERE, ORDER BY, LIMIT, and OFFSET in raw SELECT text — plus a
//! COUNT(*) projection swap — without parsing the statement into a syntax
//! tree. Clause keywords are located with a single-pass scanner that tracks
//! paren depth, quote state, and comments, so keywords inside subqueries,
//! CTE bodies, string literals, and comments are never mistaken for the main
//! query's clauses.
//!
//! The mutator works on an internal scratch buffer; callers only see the
//! finished text via [`ClauseMutator::build`], which normalizes whitespace
//! outside quoted regions.

use crate::error::{Error, Result};

/// Clauses that may follow WHERE in a SELECT statement.
const AFTER_WHERE: &[&str] = &[
   "GROUP BY",
   "HAVING",
   "ORDER BY",
   "LIMIT",
   "OFFSET",
   "FETCH",
   "FOR UPDATE",
   "FOR SHARE",
   "LOCK IN SHARE MODE",
   "INTO",
];

/// Clauses that may follow ORDER BY.
const AFTER_ORDER_BY: &[&str] = &[
   "LIMIT",
   "OFFSET",
   "FETCH",
   "FOR UPDATE",
   "FOR SHARE",
   "LOCK IN SHARE MODE",
   "INTO",
];

/// Clauses that may follow LIMIT.
const AFTER_LIMIT: &[&str] = &[
   "OFFSET",
   "FETCH",
   "FOR UPDATE",
   "FOR SHARE",
   "LOCK IN SHARE MODE",
   "INTO",
];

/// Clauses that may follow OFFSET.
const AFTER_OFFSET: &[&str] = &["FETCH", "FOR UPDATE", "FOR SHARE", "LOCK IN SHARE MODE", "INTO"];

/// Check whether `keyword` appears as a standalone keyword at position `i`
/// in the uppercased byte slice `bytes` (length `len`).
///
/// "Standalone" means the character before and after the keyword (if present)
/// is not an identifier character (`[A-Z0-9_]`).
fn is_keyword_at(bytes: &[u8], len: usize, i: usize, keyword: &[u8]) -> bool {
   let klen = keyword.len();
   if i + klen > len {
      return false;
   }
   if &bytes[i..i + klen] != keyword {
      return false;
   }
   let before_ok = i == 0 || (!bytes[i - 1].is_ascii_alphanumeric() && bytes[i - 1] != b'_');
   let after_ok =
      i + klen >= len || (!bytes[i + klen].is_ascii_alphanumeric() && bytes[i + klen] != b'_');

   before_ok && after_ok
}

/// Advance the scanner index past a quoted literal or identifier.
///
/// `quote` is the opening quote character (`'`, `"`, or `` ` ``). The scanner
/// handles SQL-standard doubled-quote escaping (`''` or `""`).
fn skip_quoted(bytes: &[u8], len: usize, i: usize, quote: u8) -> usize {
   let mut j = i + 1;
   while j < len {
      if bytes[j] == quote {
         // Doubled quote is an escape — skip both and continue
         if j + 1 < len && bytes[j + 1] == quote {
            j += 2;
            continue;
         }
         // End of quoted section
         return j;
      }
      j += 1;
   }
   j // unterminated — return end
}

/// Advance the scanner index past a `--` line comment (until newline or end).
fn skip_line_comment(bytes: &[u8], len: usize, i: usize) -> usize {
   let mut j = i + 2; // skip the `--`
   while j < len && bytes[j] != b'\n' {
      j += 1;
   }
   j
}

/// Advance the scanner index past a `/* … */` block comment.
fn skip_block_comment(bytes: &[u8], len: usize, i: usize) -> usize {
   let mut j = i + 2; // skip the `/*`
   while j + 1 < len {
      if bytes[j] == b'*' && bytes[j + 1] == b'/' {
         return j + 1; // position of the closing `/`
      }
      j += 1;
   }
   len.saturating_sub(1) // unterminated — return end
}

/// Scan the ASCII-uppercased query, calling `on_position` at each top-level
/// byte offset (depth == 0, outside quotes and comments).
///
/// Uppercasing is ASCII-only so byte offsets map 1:1 onto the original text.
/// `on_position` receives `(uppercased_bytes, len, position)` and returns
/// `Some(T)` to short-circuit or `None` to keep scanning.
fn scan_top_level<T>(
   query: &str,
   mut on_position: impl FnMut(&[u8], usize, usize) -> Option<T>,
) -> Option<T> {
   let upper = query.to_ascii_uppercase();
   let bytes = upper.as_bytes();
   let len = bytes.len();
   let mut depth: i32 = 0;
   let mut i = 0;

   while i < len {
      match bytes[i] {
         b'(' => depth += 1,
         b')' => depth -= 1,
         // Quoted literal or identifier (with doubled-quote escape handling)
         b'\'' | b'"' | b'`' => {
            i = skip_quoted(bytes, len, i, bytes[i]);
         }
         // Line comment: --
         b'-' if i + 1 < len && bytes[i + 1] == b'-' => {
            i = skip_line_comment(bytes, len, i);
         }
         // Block comment: /* ... */
         b'/' if i + 1 < len && bytes[i + 1] == b'*' => {
            i = skip_block_comment(bytes, len, i);
         }
         _ if depth == 0 => {
            if let Some(result) = on_position(bytes, len, i) {
               return Some(result);
            }
         }
         _ => {}
      }
      i += 1;
   }

   None
}

/// True when the query text ends inside an unterminated `--` line comment,
/// in which case anything appended on the same line would be commented out.
fn ends_in_line_comment(query: &str) -> bool {
   let bytes = query.as_bytes();
   let len = bytes.len();
   let mut i = 0;

   while i < len {
      match bytes[i] {
         b'\'' | b'"' | b'`' => i = skip_quoted(bytes, len, i, bytes[i]),
         b'-' if i + 1 < len && bytes[i + 1] == b'-' => {
            let end = skip_line_comment(bytes, len, i);
            if end >= len {
               return true;
            }
            i = end;
         }
         b'/' if i + 1 < len && bytes[i + 1] == b'*' => i = skip_block_comment(bytes, len, i),
         _ => {}
      }
      i += 1;
   }

   false
}

/// Detect a top-level `AND`/`OR` in an extracted WHERE condition.
///
/// Boolean operators nested inside parenthesized subexpressions do not force
/// parenthesization of the existing condition.
fn has_top_level_bool_op(condition: &str) -> bool {
   scan_top_level(condition, |bytes, len, i| {
      if is_keyword_at(bytes, len, i, b"AND") || is_keyword_at(bytes, len, i, b"OR") {
         Some(())
      } else {
         None
      }
   })
   .is_some()
}

/// Match a LIMIT value literal at the start of `tail`: optional whitespace,
/// a number, and optionally `, number` (the MySQL `LIMIT n,n` form).
///
/// Returns the byte length of the match, or `None` when the existing value is
/// not a plain literal.
fn match_limit_literal(tail: &str) -> Option<usize> {
   let bytes = tail.as_bytes();
   let len = bytes.len();
   let mut i = 0;

   while i < len && bytes[i].is_ascii_whitespace() {
      i += 1;
   }
   let digits_start = i;
   while i < len && bytes[i].is_ascii_digit() {
      i += 1;
   }
   if i == digits_start {
      return None;
   }

   // Optional second number after a comma
   let mut j = i;
   while j < len && bytes[j].is_ascii_whitespace() {
      j += 1;
   }
   if j < len && bytes[j] == b',' {
      j += 1;
      while j < len && bytes[j].is_ascii_whitespace() {
         j += 1;
      }
      let second_start = j;
      while j < len && bytes[j].is_ascii_digit() {
         j += 1;
      }
      if j > second_start {
         i = j;
      }
   }

   Some(i)
}

/// Normalize whitespace to single spaces outside quoted regions and trim.
///
/// Quoted spans and `--` line comments are copied verbatim; a newline
/// terminating a line comment survives as `\n`, since collapsing it would
/// comment out the rest of the statement.
fn normalize_whitespace(query: &str) -> String {
   let mut out = String::with_capacity(query.len());
   // Pending separator: ' ' for collapsed whitespace, '\n' after a line
   // comment (newline wins)
   let mut pending: Option<char> = None;
   let mut chars = query.chars().peekable();

   let mut flush = |out: &mut String, pending: &mut Option<char>| {
      if let Some(sep) = pending.take()
         && !out.is_empty()
      {
         out.push(sep);
      }
   };

   while let Some(ch) = chars.next() {
      match ch {
         '\'' | '"' | '`' => {
            flush(&mut out, &mut pending);
            out.push(ch);
            // Copy verbatim to the closing quote, honoring doubled-quote
            // escapes
            while let Some(inner) = chars.next() {
               out.push(inner);
               if inner == ch {
                  if chars.peek() == Some(&ch) {
                     out.push(ch);
                     chars.next();
                     continue;
                  }
                  break;
               }
            }
         }
         '-' if chars.peek() == Some(&'-') => {
            flush(&mut out, &mut pending);
            out.push_str("--");
            chars.next();
            for inner in chars.by_ref() {
               if inner == '\n' {
                  pending = Some('\n');
                  break;
               }
               out.push(inner);
            }
         }
         c if c.is_whitespace() => {
            if pending != Some('\n') {
               pending = Some(' ');
            }
         }
         c => {
            flush(&mut out, &mut pending);
            out.push(c);
         }
      }
   }

   out
}

/// Locates and rewrites the main query's clauses in raw SQL text.
///
/// The buffer is mutated at most once per clause kind and never re-parsed
/// into a syntax tree; [`build`](ClauseMutator::build) yields the final,
/// whitespace-normalized text.
#[derive(Debug, Clone)]
pub struct ClauseMutator {
   query: String,
}

impl ClauseMutator {
   pub fn new(query: impl Into<String>) -> Self {
      Self {
         query: query.into().trim().to_string(),
      }
   }

   /// Byte offset of the first top-level occurrence of `keyword` at or after
   /// `from`, or `None`.
   fn find_clause_from(&self, keyword: &str, from: usize) -> Option<usize> {
      let upper_keyword = keyword.as_bytes();
      scan_top_level(&self.query, |bytes, len, i| {
         if i >= from && is_keyword_at(bytes, len, i, upper_keyword) {
            Some(i)
         } else {
            None
         }
      })
   }

   fn find_clause(&self, keyword: &str) -> Option<usize> {
      self.find_clause_from(keyword, 0)
   }

   /// Earliest position among `keywords` at or after `from`.
   fn earliest_clause_from(&self, keywords: &[&str], from: usize) -> Option<usize> {
      keywords
         .iter()
         .filter_map(|kw| self.find_clause_from(kw, from))
         .min()
   }

   /// Insert `clause` before the earliest of `later_keywords`, or append it
   /// at the end when none is present.
   fn insert_clause(&mut self, clause: &str, later_keywords: &[&str]) {
      match self.earliest_clause_from(later_keywords, 0) {
         Some(pos) => {
            self.query = format!(
               "{} {} {}",
               self.query[..pos].trim_end(),
               clause,
               &self.query[pos..]
            );
         }
         None => {
            // A trailing line comment must not swallow the new clause
            let separator = if ends_in_line_comment(&self.query) {
               "\n"
            } else {
               " "
            };
            self.query = format!("{}{}{}", self.query, separator, clause);
         }
      }
   }

   /// Conjoin `condition` onto the main WHERE clause, adding one if absent.
   ///
   /// An existing condition containing a top-level `AND`/`OR` is
   /// parenthesized before the conjunction so operator precedence is
   /// preserved.
   pub fn append_where(&mut self, condition: &str) {
      let Some(where_pos) = self.find_clause("WHERE") else {
         self.insert_clause(&format!("WHERE {condition}"), AFTER_WHERE);
         return;
      };

      let condition_start = where_pos + "WHERE".len();
      let next_clause = self.earliest_clause_from(AFTER_WHERE, condition_start);
      let condition_end = next_clause.unwrap_or(self.query.len());
      let existing = self.query[condition_start..condition_end].trim();

      let new_where = if has_top_level_bool_op(existing) {
         format!("WHERE ({existing}) AND {condition}")
      } else {
         format!("WHERE {existing} AND {condition}")
      };

      self.query = match next_clause {
         Some(pos) => format!("{}{} {}", &self.query[..where_pos], new_where, &self.query[pos..]),
         None => format!("{}{}", &self.query[..where_pos], new_where),
      };
   }

   /// Replace the ORDER BY clause wholesale, adding one if absent.
   pub fn set_order_by<S: AsRef<str>>(&mut self, terms: &[S]) {
      let joined = terms
         .iter()
         .map(AsRef::as_ref)
         .collect::<Vec<_>>()
         .join(", ");

      let Some(order_pos) = self.find_clause("ORDER BY") else {
         self.insert_clause(&format!("ORDER BY {joined}"), AFTER_ORDER_BY);
         return;
      };

      let clause_end = self.earliest_clause_from(AFTER_ORDER_BY, order_pos + "ORDER BY".len());
      self.query = match clause_end {
         Some(pos) => format!(
            "{}ORDER BY {} {}",
            &self.query[..order_pos],
            joined,
            &self.query[pos..]
         ),
         None => format!("{}ORDER BY {}", &self.query[..order_pos], joined),
      };
   }

   /// Set the LIMIT value, adding the clause if absent.
   ///
   /// An existing literal value (`LIMIT n` or `LIMIT n,n`) is replaced in
   /// place; anything unparsable falls back to replacing everything up to
   /// the next clause (or the end of the statement).
   pub fn set_limit(&mut self, value: &str) {
      self.replace_positional_clause("LIMIT", value, AFTER_LIMIT);
   }

   /// Set the OFFSET value, adding the clause if absent.
   pub fn set_offset(&mut self, value: &str) {
      self.replace_positional_clause("OFFSET", value, AFTER_OFFSET);
   }

   fn replace_positional_clause(&mut self, keyword: &str, value: &str, later: &[&str]) {
      let Some(pos) = self.find_clause(keyword) else {
         self.insert_clause(&format!("{keyword} {value}"), later);
         return;
      };

      let value_start = pos + keyword.len();
      match self.earliest_clause_from(later, value_start) {
         Some(next) => {
            self.query = format!(
               "{}{} {} {}",
               &self.query[..pos],
               keyword,
               value,
               &self.query[next..]
            );
         }
         None => {
            let tail = &self.query[value_start..];
            match match_limit_literal(tail) {
               Some(matched) => {
                  self.query = format!(
                     "{}{} {}{}",
                     &self.query[..pos],
                     keyword,
                     value,
                     &tail[matched..]
                  );
               }
               None => {
                  // Unparsable existing value — replace to the end
                  self.query = format!("{}{} {}", &self.query[..pos], keyword, value);
               }
            }
         }
      }
   }

   /// Swap the SELECT projection for `COUNT(*) AS total_data`, preserving a
   /// leading WITH block verbatim and everything from the main FROM onward.
   pub fn convert_to_count(&mut self) -> Result<()> {
      let upper = self.query.to_ascii_uppercase();
      if !upper.starts_with("SELECT") && !upper.starts_with("WITH") {
         return Err(Error::UnsupportedStatement);
      }

      let select_pos = self
         .find_clause("SELECT")
         .ok_or(Error::UnsupportedStatement)?;
      let from_pos = self
         .find_clause_from("FROM", select_pos + "SELECT".len())
         .ok_or(Error::MissingFromClause)?;

      self.query = format!(
         "{}SELECT COUNT(*) AS total_data {}",
         &self.query[..select_pos],
         &self.query[from_pos..]
      );
      Ok(())
   }

   /// Finish mutation: normalize whitespace outside quoted regions and trim.
   pub fn build(self) -> String {
      normalize_whitespace(&self.query)
   }
}
