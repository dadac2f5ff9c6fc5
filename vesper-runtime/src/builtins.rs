//! Builtin type lattice and intrinsic callables.
//!
//! The builtin identities are registered in a fixed order at runtime
//! construction, so their ids are compile-time constants the value
//! representation can rely on. The lattice:
//!
//! ```text
//! Any
//! ├── Number
//! │   ├── Integer
//! │   │   ├── Int
//! │   │   └── Int8
//! │   └── Float
//! ├── Bool, Str, Unit, Keyword, Tuple, Assoc
//! └── (user-declared, function, closure, and intrinsic identities)
//! ```

use crate::registry::Runtime;
use crate::signature::PatternSignature;
use crate::types::{TypeId, TypeRef};
use crate::value::{MethodBody, Value};

/// Top of the lattice; every type is a subtype of `Any`. Represented as
/// an ordinary identity rather than an absence of a type, so catch-all
/// patterns go through the same applicability path as everything else.
pub const ANY: TypeId = TypeId(0);
/// Abstract numeric tower root.
pub const NUMBER: TypeId = TypeId(1);
/// Abstract integer types.
pub const INTEGER: TypeId = TypeId(2);
/// 64-bit signed integer.
pub const INT: TypeId = TypeId(3);
/// 8-bit signed integer.
pub const INT8: TypeId = TypeId(4);
/// 64-bit float.
pub const FLOAT: TypeId = TypeId(5);
pub const BOOL: TypeId = TypeId(6);
pub const STR: TypeId = TypeId(7);
pub const UNIT: TypeId = TypeId(8);
/// Keyword names, as they appear in keyword-argument associations.
pub const KEYWORD: TypeId = TypeId(9);
pub const TUPLE: TypeId = TypeId(10);
/// Ordered keyword/value association sequences.
pub const ASSOC: TypeId = TypeId(11);

/// Shorthand for a bare builtin type reference.
pub fn ty(id: TypeId) -> TypeRef {
    TypeRef::nullary(id)
}

/// Register the builtin lattice. Declaration order must match the id
/// constants above.
pub(crate) fn register_builtin_types(rt: &Runtime) {
    let any = rt.declare_type("Any", 0, None);
    debug_assert_eq!(any, ANY);

    let number = rt.declare_type("Number", 0, Some(ANY));
    debug_assert_eq!(number, NUMBER);
    let integer = rt.declare_type("Integer", 0, Some(NUMBER));
    debug_assert_eq!(integer, INTEGER);
    let int = rt.declare_type("Int", 0, Some(INTEGER));
    debug_assert_eq!(int, INT);
    let int8 = rt.declare_type("Int8", 0, Some(INTEGER));
    debug_assert_eq!(int8, INT8);
    let float = rt.declare_type("Float", 0, Some(NUMBER));
    debug_assert_eq!(float, FLOAT);

    let bool_ = rt.declare_type("Bool", 0, Some(ANY));
    debug_assert_eq!(bool_, BOOL);
    let str_ = rt.declare_type("Str", 0, Some(ANY));
    debug_assert_eq!(str_, STR);
    let unit = rt.declare_type("Unit", 0, Some(ANY));
    debug_assert_eq!(unit, UNIT);
    let keyword = rt.declare_type("Keyword", 0, Some(ANY));
    debug_assert_eq!(keyword, KEYWORD);
    let tuple = rt.declare_type("Tuple", 0, Some(ANY));
    debug_assert_eq!(tuple, TUPLE);
    let assoc = rt.declare_type("Assoc", 0, Some(ANY));
    debug_assert_eq!(assoc, ASSOC);
}

impl Runtime {
    /// Register an intrinsic: a primitive operation represented as a
    /// singleton value whose table holds exactly one catch-all entry
    /// backed by a native entry point.
    ///
    /// Dispatch for intrinsics short-circuits the specificity search
    /// (there is nothing to disambiguate) but flows through the same
    /// `call` contract as every other callable.
    pub fn register_intrinsic(&self, name: &str, native: MethodBody) -> Value {
        let ty_id = self.declare_type(name, 0, Some(ANY));
        let pattern = PatternSignature::new(vec![TypeRef::nullary(ty_id)], Some(ty(ANY)));
        self.identity(ty_id)
            .table
            .define(self, ty_id, pattern, native, true);
        Value::instance(TypeRef::nullary(ty_id), Vec::new())
    }
}
