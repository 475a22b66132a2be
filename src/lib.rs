//! Keyset and offset pagination compiled into raw SQL SELECT statements.
//!
//! Takes an arbitrary SELECT, a compact sort specification, and an optional
//! opaque cursor, and produces the final query text plus an aligned bind
//! argument list — no SQL grammar, no AST. Clause boundaries are located by
//! a single-pass scanner that respects parentheses, quotes, and comments, so
//! subqueries, CTEs, and window functions never confuse the rewrite.
//!
//! # Example
//!
//! ```
//! use sql_keyset::Paginator;
//! use serde_json::json;
//!
//! // First page: sort by newest id, 10 rows
//! let built = Paginator::new("SELECT * FROM posts WHERE author = ?")
//!    .with_args(vec![json!("alice")])
//!    .with_sort(&["-id"])
//!    .with_limit(10)
//!    .build()?;
//!
//! assert_eq!(
//!    built.query,
//!    "SELECT * FROM posts WHERE author = ? ORDER BY id DESC LIMIT ?"
//! );
//! assert_eq!(built.args, vec![json!("alice"), json!(11)]);
//!
//! // After fetching: trim the probe row and get the page cursors
//! // let cursors = built.sanitize(&mut rows)?;
//! # Ok::<(), sql_keyset::Error>(())
//! ```
//!
//! Cursors are `base64(JSON)` snapshots of the boundary row's sort-column
//! values; feed one back via [`Paginator::with_cursor`] to resume in either
//! direction.

mod builder;
mod cursor;
mod error;
mod modifier;
mod options;
mod placeholder;
mod predicate;
mod sanitize;
mod sort;

pub use builder::{Built, Paginator, build_count_query};
pub use cursor::{Cursor, CursorDirection};
pub use error::{Error, Result};
pub use modifier::ClauseMutator;
pub use options::Options;
pub use placeholder::PlaceholderStyle;
pub use sanitize::{PageCursors, PageSanitizer, RowAccess};
pub use sort::{NullOrder, SortColumn, SortDirection, SortSpec};
