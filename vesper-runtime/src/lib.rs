//! Generic-function dispatch runtime for the Vesper programming language.
//!
//! Vesper resolves a call `f(a1, ..., an)` to a concrete method using the
//! runtime types of *all* arguments. This crate is the runtime core of
//! that mechanism:
//!
//! - [`Runtime`]: the process-wide registry of type identities, each
//!   owning one method table, plus the global invalidation generation.
//! - [`dispatch`]: the engine, with cached, generation-validated resolution
//!   over the specificity partial order.
//! - [`keywords`]: canonicalization of keyword-argument calls into
//!   positional calls through a secondary dispatched function.
//! - [`closure`]: closure records, nominal capture-carrying types whose
//!   invoke operator is an ordinary method.
//! - [`builtins`]: the builtin type lattice and intrinsic callables.
//!
//! Parsing, method-body compilation, garbage collection, and printing
//! tooling are external collaborators: a method body reaches this crate
//! only as an opaque invocable handle.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use vesper_runtime::{builtins, Runtime, Value};
//!
//! let rt = Runtime::new();
//! let double = rt.define_function("double");
//! rt.add_method(
//!     &double,
//!     vec![builtins::ty(builtins::INT)],
//!     None,
//!     Arc::new(|_, argv| Ok(Value::Int(argv[1].as_int().unwrap_or(0) * 2))),
//! );
//! let result = rt.call(&double, &[Value::Int(21)]).unwrap();
//! assert_eq!(result.as_int(), Some(42));
//! ```

pub mod builtins;
pub mod closure;
pub mod dispatch;
pub mod error;
pub mod keywords;
pub mod registry;
pub mod signature;
pub mod types;
pub mod value;

pub use dispatch::{EntryId, LookupOutcome, MethodEntry, MethodTable};
pub use error::DispatchError;
pub use keywords::{KeywordArg, KeywordSpec};
pub use registry::Runtime;
pub use signature::{ArgumentSignature, PatternSignature};
pub use types::{TypeId, TypeIdentity, TypeRef};
pub use value::{AssocList, KeywordName, MethodBody, Value};
