//! fixall Symbol Layer
//!
//! Symbol identity, lexical binding, and overload resolution.
//!
//! # Core Concepts
//!
//! - [`Symbol`] / [`SymbolId`]: What a name denotes, independent of its spelling
//! - [`Binder`]: Explicit resolution pass mapping identifier nodes to symbols
//! - [`MethodSignature`]: Parameter list of one overload
//! - [`OverloadMatcher`]: Finds the sibling overload adding given parameter types
//! - [`SignatureIndex`]: Concurrent overload sets keyed by container and name
//!
//! # Example
//!
//! ```rust
//! use fixall_symbol::{find_overload, MethodSignature, Parameter, TypeRef};
//!
//! let target = MethodSignature::new("Compare", vec![Parameter::required("a", "string")]);
//! let with_mode = MethodSignature::new(
//!     "Compare",
//!     vec![
//!         Parameter::required("a", "string"),
//!         Parameter::required("mode", "StringComparison"),
//!     ],
//! );
//! let siblings = vec![target.clone(), with_mode.clone()];
//!
//! let found = find_overload(&target, &siblings, &[TypeRef::new("StringComparison")], false, false);
//! assert_eq!(found, Some(&with_mode));
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

mod binder;
mod index;
mod overload;
mod signature;
mod symbol;

// Re-exports
pub use binder::{Binder, Bindings};
pub use index::SignatureIndex;
pub use overload::{find_overload, MatchOptions, MatchPhase, OverloadMatcher};
pub use signature::{MethodSignature, Parameter, TypeRef};
pub use symbol::{Symbol, SymbolId, SymbolKind};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
