/// Result type alias for pagination operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for pagination compilation.
///
/// Every variant indicates caller misuse (bad sort tokens, bad cursors,
/// unsupported statements); nothing here is transient or retryable.
#[derive(Debug, thiserror::Error)]
pub enum Error {
   /// Sort token has a trailing word other than `null`.
   #[error("malformed sort token '{token}': unexpected '{trailing}'")]
   MalformedSortToken { token: String, trailing: String },

   /// More than one sort column is marked nullable.
   #[error("only one nullable sort column is allowed")]
   MultipleNullable,

   /// Sort column name contains characters unsafe for SQL interpolation.
   ///
   /// Column names must match `[a-zA-Z_][a-zA-Z0-9_]*`, optionally prefixed
   /// with a single `qualifier.` segment of the same shape.
   #[error("invalid sort column name '{name}': must match [a-zA-Z_][a-zA-Z0-9_.]*")]
   InvalidColumnName { name: String },

   /// Cursor pagination was requested without a sort specification.
   #[error("sort specification is required for cursor pagination")]
   MissingSortSpec,

   /// Limit must be greater than zero.
   #[error("limit must be greater than zero")]
   InvalidLimit,

   /// Offset must not be negative.
   #[error("offset must not be negative")]
   NegativeOffset,

   /// Statement is not a SELECT (or WITH-prefixed SELECT).
   #[error("unsupported statement: pagination requires a SELECT query")]
   UnsupportedStatement,

   /// No pagination was configured on the builder.
   #[error("nothing to build: no sort, cursor, limit, or offset was set")]
   NothingToBuild,

   /// Sanitize was called on a build without cursor pagination.
   #[error("cursor derivation requires a cursor-paginated build")]
   NotPaginated,

   /// Supplied cursor is not valid base64.
   #[error("invalid cursor encoding: {0}")]
   CursorDecode(#[from] base64::DecodeError),

   /// Supplied cursor decodes to invalid JSON.
   #[error("invalid cursor payload: {0}")]
   CursorFormat(#[from] serde_json::Error),

   /// No main FROM clause found when converting to a count query.
   #[error("no main FROM clause found while building the count query")]
   MissingFromClause,
}

impl Error {
   /// Extract a structured error code from the error type.
   ///
   /// This provides machine-readable error codes for error handling.
   pub fn error_code(&self) -> &'static str {
      match self {
         Error::MalformedSortToken { .. } => "MALFORMED_SORT_TOKEN",
         Error::MultipleNullable => "MULTIPLE_NULLABLE_COLUMNS",
         Error::InvalidColumnName { .. } => "INVALID_COLUMN_NAME",
         Error::MissingSortSpec => "MISSING_SORT_SPEC",
         Error::InvalidLimit => "INVALID_LIMIT",
         Error::NegativeOffset => "NEGATIVE_OFFSET",
         Error::UnsupportedStatement => "UNSUPPORTED_STATEMENT",
         Error::NothingToBuild => "NOTHING_TO_BUILD",
         Error::NotPaginated => "NOT_PAGINATED",
         Error::CursorDecode(_) => "CURSOR_DECODE_ERROR",
         Error::CursorFormat(_) => "CURSOR_FORMAT_ERROR",
         Error::MissingFromClause => "MISSING_FROM_CLAUSE",
      }
   }
}

#[cfg(test)]
mod tests {
   use super::*;

   #[test]
   fn test_error_code_malformed_sort_token() {
      let err = Error::MalformedSortToken {
         token: "id nulls".into(),
         trailing: "nulls".into(),
      };
      assert_eq!(err.error_code(), "MALFORMED_SORT_TOKEN");
      assert!(err.to_string().contains("nulls"));
   }

   #[test]
   fn test_error_code_multiple_nullable() {
      assert_eq!(
         Error::MultipleNullable.error_code(),
         "MULTIPLE_NULLABLE_COLUMNS"
      );
   }

   #[test]
   fn test_error_code_invalid_column_name() {
      let err = Error::InvalidColumnName {
         name: "id;--".into(),
      };
      assert_eq!(err.error_code(), "INVALID_COLUMN_NAME");
      assert!(err.to_string().contains("id;--"));
   }

   #[test]
   fn test_error_code_missing_sort_spec() {
      assert_eq!(Error::MissingSortSpec.error_code(), "MISSING_SORT_SPEC");
   }

   #[test]
   fn test_error_code_cursor_decode() {
      let err = crate::Cursor::decode("not-base64!").unwrap_err();
      assert_eq!(err.error_code(), "CURSOR_DECODE_ERROR");
   }

   #[test]
   fn test_error_code_missing_from_clause() {
      let err = Error::MissingFromClause;
      assert_eq!(err.error_code(), "MISSING_FROM_CLAUSE");
      assert!(err.to_string().contains("FROM"));
   }
}
