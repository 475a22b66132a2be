//! Pagination options and the process-wide default handle.

use std::sync::OnceLock;

use tracing::warn;

use crate::placeholder::PlaceholderStyle;
use crate::sort::NullOrder;

/// Configuration threaded into every [`Paginator`](crate::Paginator).
///
/// # Examples
///
/// ```
/// use sql_keyset::{NullOrder, Options, PlaceholderStyle};
///
/// // Use defaults
/// let options = Options::default();
///
/// // Override just one field
/// let options = Options {
///    placeholder: PlaceholderStyle::Dollar,
///    ..Default::default()
/// };
/// ```
#[derive(Debug, Clone)]
pub struct Options {
   /// Bind placeholder style the final query is rendered with.
   ///
   /// Default: [`PlaceholderStyle::Question`]
   pub placeholder: PlaceholderStyle,

   /// Page size used when the caller does not set one explicitly.
   ///
   /// Default: 10
   pub default_limit: i64,

   /// How nullable sort columns are expressed in ORDER BY.
   ///
   /// Default: [`NullOrder::IsNullFlag`]
   pub null_order: NullOrder,
}

impl Default for Options {
   fn default() -> Self {
      Self {
         placeholder: PlaceholderStyle::Question,
         default_limit: 10,
         null_order: NullOrder::IsNullFlag,
      }
   }
}

static DEFAULTS: OnceLock<Options> = OnceLock::new();

impl Options {
   /// Install the process-wide default options.
   ///
   /// Write-once: the first call wins and returns `true`; later calls are
   /// ignored and return `false`. Call this during startup, before any
   /// concurrent use of [`Options::defaults`].
   pub fn install_defaults(options: Options) -> bool {
      let installed = DEFAULTS.set(options).is_ok();
      if !installed {
         warn!("process-wide pagination defaults were already installed; ignoring");
      }
      installed
   }

   /// Return the installed process-wide defaults, or [`Options::default`]
   /// when none were installed.
   pub fn defaults() -> Options {
      DEFAULTS.get().cloned().unwrap_or_default()
   }
}
