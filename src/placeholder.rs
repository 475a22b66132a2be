//! Bind placeholder tokenizing, renumbering, and argument splicing.
//!
//! Clause injection marks every freshly bound value with the internal marker
//! `$0`, which is never a valid placeholder in any supported dialect. After
//! the query text is final, [`translate`] tokenizes it into quoted /
//! placeholder / plain spans, rewrites every placeholder for the target
//! style, and reports where the injected values sit among all placeholders so
//! they can be spliced into the caller's argument list.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Marker emitted at every injected bind site.
pub(crate) const INTERNAL_MARKER: &str = "$0";

/// Bind placeholder style of the target driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PlaceholderStyle {
   /// Positional `?` (MySQL, SQLite)
   #[default]
   Question,
   /// Numbered `$1`, `$2`, … (PostgreSQL)
   Dollar,
   /// Named `@p1`, `@p2`, … (SQL Server)
   At,
   /// Numbered `:1`, `:2`, … (Oracle)
   Colon,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TokenKind {
   Quoted,
   Placeholder,
   Text,
}

/// One span of the query text; `internal` marks the injected `$0` sites.
#[derive(Debug)]
struct Token {
   start: usize,
   end: usize,
   kind: TokenKind,
   internal: bool,
}

/// Result of rewriting the placeholders of a finished query.
#[derive(Debug)]
pub(crate) struct TranslatedQuery {
   /// Final text with every placeholder in the target style.
   pub text: String,
   /// For each injected marker, its ordinal position (0-based) among all
   /// placeholders in left-to-right textual order.
   pub marker_ordinals: Vec<usize>,
   /// Total number of placeholders in the final text.
   pub placeholder_count: usize,
}

fn is_placeholder_digit(b: u8) -> bool {
   b.is_ascii_digit() && b != b'0'
}

/// Split the query into quoted, placeholder, and plain-text spans.
///
/// Quoted spans (single, double, backtick) honor backslash escapes and run to
/// the closing quote or end of input. Everything else is scanned for the
/// internal marker and the four placeholder syntaxes.
fn tokenize(query: &str) -> Vec<Token> {
   let bytes = query.as_bytes();
   let len = bytes.len();
   let mut tokens = Vec::new();
   let mut i = 0;

   let mut push = |start: usize, end: usize, kind: TokenKind, internal: bool| {
      tokens.push(Token {
         start,
         end,
         kind,
         internal,
      });
   };

   while i < len {
      let b = bytes[i];

      if b == b'\'' || b == b'"' || b == b'`' {
         let start = i;
         i += 1;
         let mut escaped = false;
         while i < len && (bytes[i] != b || escaped) {
            escaped = bytes[i] == b'\\' && !escaped;
            i += 1;
         }
         if i < len {
            i += 1; // closing quote
         }
         push(start, i, TokenKind::Quoted, false);
         continue;
      }

      if b == b'$' && i + 1 < len && bytes[i + 1] == b'0' {
         push(i, i + 2, TokenKind::Placeholder, true);
         i += 2;
         continue;
      }

      if b == b'?' {
         push(i, i + 1, TokenKind::Placeholder, false);
         i += 1;
         continue;
      }

      if b == b'$' && i + 1 < len && is_placeholder_digit(bytes[i + 1]) {
         let start = i;
         i += 2;
         while i < len && bytes[i].is_ascii_digit() {
            i += 1;
         }
         push(start, i, TokenKind::Placeholder, false);
         continue;
      }

      if b == b'@' && i + 2 < len && bytes[i + 1] == b'p' && is_placeholder_digit(bytes[i + 2]) {
         let start = i;
         i += 3;
         while i < len && bytes[i].is_ascii_digit() {
            i += 1;
         }
         push(start, i, TokenKind::Placeholder, false);
         continue;
      }

      if b == b':' && i + 1 < len && is_placeholder_digit(bytes[i + 1]) {
         let start = i;
         i += 2;
         while i < len && bytes[i].is_ascii_digit() {
            i += 1;
         }
         push(start, i, TokenKind::Placeholder, false);
         continue;
      }

      // Plain text up to the next special byte
      let start = i;
      while i < len {
         let b = bytes[i];
         let special = b == b'\'' || b == b'"' || b == b'`' || b == b'?'
            || (b == b'$' && i + 1 < len && (bytes[i + 1] == b'0' || is_placeholder_digit(bytes[i + 1])))
            || (b == b'@' && i + 2 < len && bytes[i + 1] == b'p' && is_placeholder_digit(bytes[i + 2]))
            || (b == b':' && i + 1 < len && is_placeholder_digit(bytes[i + 1]));
         if special {
            break;
         }
         i += 1;
      }
      if i > start {
         push(start, i, TokenKind::Text, false);
      } else {
         i += 1;
      }
   }

   tokens
}

/// Rewrite every placeholder in `query` for the target style.
///
/// `Question` renders each placeholder as a bare `?`. The numbered styles
/// renumber all placeholders, pre-existing and injected alike, sequentially
/// from 1 in textual order — any original numbering is discarded. The output
/// argument list must therefore match the placeholders left to right, which
/// [`splice_args`] arranges.
pub(crate) fn translate(query: &str, style: PlaceholderStyle) -> TranslatedQuery {
   let tokens = tokenize(query);
   let mut text = String::with_capacity(query.len());
   let mut marker_ordinals = Vec::new();
   let mut ordinal = 0usize;

   for token in &tokens {
      match token.kind {
         TokenKind::Quoted | TokenKind::Text => {
            text.push_str(&query[token.start..token.end]);
         }
         TokenKind::Placeholder => {
            if token.internal {
               marker_ordinals.push(ordinal);
            }
            match style {
               PlaceholderStyle::Question => text.push('?'),
               PlaceholderStyle::Dollar => text.push_str(&format!("${}", ordinal + 1)),
               PlaceholderStyle::At => text.push_str(&format!("@p{}", ordinal + 1)),
               PlaceholderStyle::Colon => text.push_str(&format!(":{}", ordinal + 1)),
            }
            ordinal += 1;
         }
      }
   }

   TranslatedQuery {
      text,
      marker_ordinals,
      placeholder_count: ordinal,
   }
}

/// Splice injected bind values into the caller's argument list.
///
/// `ordinals` are the marker positions reported by [`translate`], ascending;
/// inserting in that order keeps every later ordinal valid as the list grows.
pub(crate) fn splice_args(
   user_args: Vec<JsonValue>,
   injected: Vec<JsonValue>,
   ordinals: &[usize],
) -> Vec<JsonValue> {
   let mut args = user_args;
   for (value, &position) in injected.into_iter().zip(ordinals) {
      args.insert(position.min(args.len()), value);
   }
   args
}
