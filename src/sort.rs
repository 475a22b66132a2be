//! Sort token parsing and ORDER BY term generation.
//!
//! Sort order is declared with compact tokens: `"name"` or `"+name"` for
//! ascending, `"-name"` for descending, and a trailing `null` word
//! (`"score null"`) to mark the one column that may contain NULLs. Column
//! identities may carry a single `qualifier.` prefix (`"t.id"`) and are
//! preserved verbatim for cursor lookup.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Sort direction for a sort column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortDirection {
   /// Ascending order (smallest first)
   Asc,
   /// Descending order (largest first)
   Desc,
}

impl SortDirection {
   /// Return the opposite sort direction.
   pub fn reversed(self) -> Self {
      match self {
         SortDirection::Asc => SortDirection::Desc,
         SortDirection::Desc => SortDirection::Asc,
      }
   }

   fn keyword(self) -> &'static str {
      match self {
         SortDirection::Asc => "ASC",
         SortDirection::Desc => "DESC",
      }
   }
}

/// How a nullable sort column is expressed in ORDER BY.
///
/// Engines disagree on where NULLs sort; each method forces a deterministic
/// placement so the seek predicate and the emitted order always agree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NullOrder {
   /// `col IS NULL <dir>, col <dir>` — portable boolean-flag ordering.
   IsNullFlag,
   /// `col <dir> NULLS LAST` (asc) / `NULLS FIRST` (desc) — engines with
   /// native NULLS placement.
   FirstLast,
   /// `CASE WHEN col IS NULL THEN 1 ELSE 0 END <dir>, col <dir>` — engines
   /// without boolean sort keys.
   CaseWhen,
}

/// One column of a sort specification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortColumn {
   qualifier: Option<String>,
   name: String,
   direction: SortDirection,
   nullable: bool,
}

impl SortColumn {
   /// Column identity exactly as written in the sort token
   /// (`"qualifier.name"` or `"name"`), used for cursor lookup.
   pub fn identity(&self) -> String {
      match &self.qualifier {
         Some(q) => format!("{}.{}", q, self.name),
         None => self.name.clone(),
      }
   }

   /// Optional table qualifier.
   pub fn qualifier(&self) -> Option<&str> {
      self.qualifier.as_deref()
   }

   /// Bare column name without the qualifier.
   pub fn name(&self) -> &str {
      &self.name
   }

   /// Sort direction for this column.
   pub fn direction(&self) -> SortDirection {
      self.direction
   }

   /// Whether this column may contain NULLs.
   pub fn nullable(&self) -> bool {
      self.nullable
   }

   fn reversed(&self) -> Self {
      Self {
         direction: self.direction.reversed(),
         ..self.clone()
      }
   }
}

/// Validate that a column identity is safe for SQL interpolation.
///
/// Accepts `[a-zA-Z_][a-zA-Z0-9_.]*`, which covers plain column names,
/// qualified names (e.g., `table.column`), and underscored identifiers.
fn validate_column_name(name: &str) -> Result<()> {
   let invalid = || Error::InvalidColumnName {
      name: name.to_string(),
   };

   let mut chars = name.chars();
   let first = chars.next().ok_or_else(invalid)?;
   if !first.is_ascii_alphabetic() && first != '_' {
      return Err(invalid());
   }

   for ch in chars {
      if !ch.is_ascii_alphanumeric() && ch != '_' && ch != '.' {
         return Err(invalid());
      }
   }

   Ok(())
}

/// Ordered sort specification; column order is tie-break precedence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortSpec {
   columns: Vec<SortColumn>,
}

impl SortSpec {
   /// Parse sort tokens into a specification.
   ///
   /// Fails when a token carries a trailing word other than `null`, when a
   /// column identity is unsafe for interpolation, or when more than one
   /// column is marked nullable.
   pub fn parse<S: AsRef<str>>(tokens: &[S]) -> Result<Self> {
      let mut columns = Vec::with_capacity(tokens.len());

      for token in tokens {
         columns.push(parse_token(token.as_ref())?);
      }

      if columns.iter().filter(|c| c.nullable).count() > 1 {
         return Err(Error::MultipleNullable);
      }

      Ok(Self { columns })
   }

   /// The parsed columns in tie-break order.
   pub fn columns(&self) -> &[SortColumn] {
      &self.columns
   }

   pub fn is_empty(&self) -> bool {
      self.columns.is_empty()
   }

   /// A copy with every column's direction reversed, used for backward
   /// paging and for symmetry checks.
   pub fn reversed(&self) -> Self {
      Self {
         columns: self.columns.iter().map(SortColumn::reversed).collect(),
      }
   }

   /// Render the ORDER BY terms for this specification.
   ///
   /// Nullable columns are expanded according to `null_order` so NULL rows
   /// land where the seek predicate expects them.
   pub fn order_terms(&self, null_order: NullOrder) -> Vec<String> {
      let mut terms = Vec::with_capacity(self.columns.len());

      for col in &self.columns {
         let identity = col.identity();
         let dir = col.direction.keyword();

         if col.nullable {
            match null_order {
               NullOrder::IsNullFlag => {
                  terms.push(format!("{identity} IS NULL {dir}"));
               }
               NullOrder::CaseWhen => {
                  terms.push(format!(
                     "CASE WHEN {identity} IS NULL THEN 1 ELSE 0 END {dir}"
                  ));
               }
               NullOrder::FirstLast => {
                  let placement = match col.direction {
                     SortDirection::Asc => "LAST",
                     SortDirection::Desc => "FIRST",
                  };
                  terms.push(format!("{identity} {dir} NULLS {placement}"));
                  continue;
               }
            }
         }

         terms.push(format!("{identity} {dir}"));
      }

      terms
   }
}

fn parse_token(token: &str) -> Result<SortColumn> {
   let mut parts = token.split_whitespace();
   let body = parts.next().unwrap_or("");

   let nullable = match parts.next() {
      None => false,
      Some("null") if parts.next().is_none() => true,
      Some(trailing) => {
         return Err(Error::MalformedSortToken {
            token: token.to_string(),
            trailing: trailing.to_string(),
         });
      }
   };

   let (direction, identity) = match body.strip_prefix('-') {
      Some(rest) => (SortDirection::Desc, rest),
      None => (SortDirection::Asc, body.strip_prefix('+').unwrap_or(body)),
   };

   validate_column_name(identity)?;

   let (qualifier, name) = match identity.split_once('.') {
      None => (None, identity.to_string()),
      // A second dot would leave the qualifier ambiguous
      Some((_, rest)) if rest.contains('.') => {
         return Err(Error::InvalidColumnName {
            name: identity.to_string(),
         });
      }
      Some((q, n)) if q.is_empty() || n.is_empty() => {
         return Err(Error::InvalidColumnName {
            name: identity.to_string(),
         });
      }
      Some((q, n)) => (Some(q.to_string()), n.to_string()),
   };

   Ok(SortColumn {
      qualifier,
      name,
      direction,
      nullable,
   })
}
