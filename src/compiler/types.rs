//! Type definitions for the Go type system.
//!
//! Named types live in a [`TypeTable`] and are referred to by [`NamedId`], so
//! two named types are identical exactly when they come from the same
//! declaration.

use std::collections::HashSet;
use std::fmt;

/// Index of a named type in the [`TypeTable`].
pub type NamedId = usize;

/// Predeclared non-composite types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BasicKind {
    Bool,
    String,
    Int,
    Int8,
    Int16,
    Int32,
    Int64,
    Uint,
    Uint8,
    Uint16,
    Uint32,
    Uint64,
    Uintptr,
    Float32,
    Float64,
}

impl BasicKind {
    /// Look up a predeclared type name, including the `byte` and `rune` aliases.
    pub fn from_name(name: &str) -> Option<BasicKind> {
        let kind = match name {
            "bool" => BasicKind::Bool,
            "string" => BasicKind::String,
            "int" => BasicKind::Int,
            "int8" => BasicKind::Int8,
            "int16" => BasicKind::Int16,
            "int32" | "rune" => BasicKind::Int32,
            "int64" => BasicKind::Int64,
            "uint" => BasicKind::Uint,
            "uint8" | "byte" => BasicKind::Uint8,
            "uint16" => BasicKind::Uint16,
            "uint32" => BasicKind::Uint32,
            "uint64" => BasicKind::Uint64,
            "uintptr" => BasicKind::Uintptr,
            "float32" => BasicKind::Float32,
            "float64" => BasicKind::Float64,
            _ => return None,
        };
        Some(kind)
    }

    pub fn name(&self) -> &'static str {
        match self {
            BasicKind::Bool => "bool",
            BasicKind::String => "string",
            BasicKind::Int => "int",
            BasicKind::Int8 => "int8",
            BasicKind::Int16 => "int16",
            BasicKind::Int32 => "int32",
            BasicKind::Int64 => "int64",
            BasicKind::Uint => "uint",
            BasicKind::Uint8 => "uint8",
            BasicKind::Uint16 => "uint16",
            BasicKind::Uint32 => "uint32",
            BasicKind::Uint64 => "uint64",
            BasicKind::Uintptr => "uintptr",
            BasicKind::Float32 => "float32",
            BasicKind::Float64 => "float64",
        }
    }

    pub fn is_integer(&self) -> bool {
        !matches!(
            self,
            BasicKind::Bool | BasicKind::String | BasicKind::Float32 | BasicKind::Float64
        )
    }

    pub fn is_unsigned(&self) -> bool {
        matches!(
            self,
            BasicKind::Uint
                | BasicKind::Uint8
                | BasicKind::Uint16
                | BasicKind::Uint32
                | BasicKind::Uint64
                | BasicKind::Uintptr
        )
    }

    pub fn is_float(&self) -> bool {
        matches!(self, BasicKind::Float32 | BasicKind::Float64)
    }

    pub fn is_numeric(&self) -> bool {
        self.is_integer() || self.is_float()
    }

    pub fn is_ordered(&self) -> bool {
        self.is_numeric() || *self == BasicKind::String
    }

    /// Inclusive value range of an integer kind.
    fn int_range(&self) -> Option<(i128, i128)> {
        let range = match self {
            BasicKind::Int8 => (i8::MIN as i128, i8::MAX as i128),
            BasicKind::Int16 => (i16::MIN as i128, i16::MAX as i128),
            BasicKind::Int32 => (i32::MIN as i128, i32::MAX as i128),
            BasicKind::Int | BasicKind::Int64 => (i64::MIN as i128, i64::MAX as i128),
            BasicKind::Uint8 => (0, u8::MAX as i128),
            BasicKind::Uint16 => (0, u16::MAX as i128),
            BasicKind::Uint32 => (0, u32::MAX as i128),
            BasicKind::Uint | BasicKind::Uint64 | BasicKind::Uintptr => (0, u64::MAX as i128),
            _ => return None,
        };
        Some(range)
    }
}

/// Kinds of untyped constants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum UntypedKind {
    Bool,
    Int,
    Rune,
    Float,
    String,
    Nil,
}

impl UntypedKind {
    /// The type an untyped constant takes when nothing else constrains it.
    pub fn default_type(&self) -> Type {
        match self {
            UntypedKind::Bool => Type::Basic(BasicKind::Bool),
            UntypedKind::Int => Type::Basic(BasicKind::Int),
            UntypedKind::Rune => Type::Basic(BasicKind::Int32),
            UntypedKind::Float => Type::Basic(BasicKind::Float64),
            UntypedKind::String => Type::Basic(BasicKind::String),
            UntypedKind::Nil => Type::Invalid,
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, UntypedKind::Int | UntypedKind::Rune | UntypedKind::Float)
    }

    fn name(&self) -> &'static str {
        match self {
            UntypedKind::Bool => "untyped bool",
            UntypedKind::Int => "untyped int",
            UntypedKind::Rune => "untyped rune",
            UntypedKind::Float => "untyped float",
            UntypedKind::String => "untyped string",
            UntypedKind::Nil => "untyped nil",
        }
    }
}

/// The value of a constant expression.
#[derive(Debug, Clone, PartialEq)]
pub enum ConstValue {
    Bool(bool),
    Int(i128),
    Float(f64),
    Str(String),
}

impl ConstValue {
    pub fn as_int(&self) -> Option<i128> {
        match self {
            ConstValue::Int(n) => Some(*n),
            ConstValue::Float(f) if f.fract() == 0.0 && f.abs() < 1e30 => Some(*f as i128),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            ConstValue::Int(n) => Some(*n as f64),
            ConstValue::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Whether the value fits in a variable of the given basic kind.
    pub fn representable(&self, kind: BasicKind) -> bool {
        match (self, kind) {
            (ConstValue::Bool(_), BasicKind::Bool) => true,
            (ConstValue::Str(_), BasicKind::String) => true,
            (ConstValue::Int(_) | ConstValue::Float(_), k) if k.is_float() => true,
            (value @ (ConstValue::Int(_) | ConstValue::Float(_)), k) => {
                match (value.as_int(), k.int_range()) {
                    (Some(n), Some((min, max))) => min <= n && n <= max,
                    _ => false,
                }
            }
            _ => false,
        }
    }
}

impl fmt::Display for ConstValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConstValue::Bool(b) => write!(f, "{}", b),
            ConstValue::Int(n) => write!(f, "{}", n),
            ConstValue::Float(x) => write!(f, "{}", x),
            ConstValue::Str(s) => write!(f, "{:?}", s),
        }
    }
}

/// Reference to a named type. Equality is declaration identity.
#[derive(Debug, Clone, Eq)]
pub struct NamedType {
    pub id: NamedId,
    pub name: String,
}

impl PartialEq for NamedType {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: String,
    pub ty: Type,
    pub embedded: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Method {
    pub name: String,
    pub sig: Signature,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Signature {
    pub params: Vec<Type>,
    pub results: Vec<Type>,
    /// The last parameter is `...T`, stored as `[]T`.
    pub variadic: bool,
}

/// Core type representation.
#[derive(Debug, Clone, PartialEq)]
pub enum Type {
    Basic(BasicKind),
    Untyped(UntypedKind),
    Named(NamedType),
    Pointer(Box<Type>),
    Slice(Box<Type>),
    Array(u64, Box<Type>),
    Map(Box<Type>, Box<Type>),
    Struct(Vec<Field>),
    /// Methods sorted by name, embedded interfaces flattened.
    Interface(Vec<Method>),
    Func(Signature),
    /// Results of a call returning several values.
    Tuple(Vec<Type>),
    /// Member of a package whose source is not available.
    Opaque,
    /// Result of an earlier error; accepted everywhere to avoid cascades.
    Invalid,
}

impl Type {
    pub fn pointer(elem: Type) -> Type {
        Type::Pointer(Box::new(elem))
    }

    pub fn slice(elem: Type) -> Type {
        Type::Slice(Box::new(elem))
    }

    pub fn empty_interface() -> Type {
        Type::Interface(Vec::new())
    }

    pub fn is_invalid(&self) -> bool {
        matches!(self, Type::Invalid)
    }

    /// Opaque and invalid types are compatible with everything.
    pub fn is_lenient(&self) -> bool {
        matches!(self, Type::Invalid | Type::Opaque)
    }

    pub fn is_untyped(&self) -> bool {
        matches!(self, Type::Untyped(_))
    }

    /// Replace untyped constants by their default type.
    pub fn defaulted(&self) -> Type {
        match self {
            Type::Untyped(kind) => kind.default_type(),
            other => other.clone(),
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Basic(kind) => write!(f, "{}", kind.name()),
            Type::Untyped(kind) => write!(f, "{}", kind.name()),
            Type::Named(named) => write!(f, "{}", named.name),
            Type::Pointer(elem) => write!(f, "*{}", elem),
            Type::Slice(elem) => write!(f, "[]{}", elem),
            Type::Array(len, elem) => write!(f, "[{}]{}", len, elem),
            Type::Map(key, value) => write!(f, "map[{}]{}", key, value),
            Type::Struct(fields) => {
                write!(f, "struct{{")?;
                for (i, field) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, "; ")?;
                    }
                    if field.embedded {
                        write!(f, "{}", field.ty)?;
                    } else {
                        write!(f, "{} {}", field.name, field.ty)?;
                    }
                }
                write!(f, "}}")
            }
            Type::Interface(methods) => {
                if methods.is_empty() {
                    return write!(f, "interface{{}}");
                }
                write!(f, "interface{{")?;
                for (i, method) in methods.iter().enumerate() {
                    if i > 0 {
                        write!(f, "; ")?;
                    }
                    write!(f, "{}", method.name)?;
                    write_signature(f, &method.sig)?;
                }
                write!(f, "}}")
            }
            Type::Func(sig) => {
                write!(f, "func")?;
                write_signature(f, sig)
            }
            Type::Tuple(types) => {
                write!(f, "(")?;
                for (i, ty) in types.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", ty)?;
                }
                write!(f, ")")
            }
            Type::Opaque => write!(f, "<opaque>"),
            Type::Invalid => write!(f, "<invalid>"),
        }
    }
}

fn write_signature(f: &mut fmt::Formatter<'_>, sig: &Signature) -> fmt::Result {
    write!(f, "(")?;
    for (i, param) in sig.params.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        match param {
            Type::Slice(elem) if sig.variadic && i + 1 == sig.params.len() => {
                write!(f, "...{}", elem)?
            }
            _ => write!(f, "{}", param)?,
        }
    }
    write!(f, ")")?;
    match sig.results.as_slice() {
        [] => Ok(()),
        [single] => write!(f, " {}", single),
        results => {
            write!(f, " (")?;
            for (i, ty) in results.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{}", ty)?;
            }
            write!(f, ")")
        }
    }
}

/// Declaration data of a named type.
#[derive(Debug, Clone)]
pub struct NamedInfo {
    pub name: String,
    /// Import path of the declaring package; empty for predeclared types.
    pub package: String,
    pub underlying: Type,
    pub methods: Vec<Method>,
    /// Names of the methods declared with a pointer receiver.
    pub pointer_methods: HashSet<String>,
}

/// What a selector `x.name` refers to.
#[derive(Debug, Clone, PartialEq)]
pub enum Selection {
    Field(Type),
    Method(Signature),
    /// The name may come from an embedded opaque type.
    Opaque,
}

/// Result of a selector lookup.
struct Found {
    selection: Selection,
    /// A pointer-receiver method reached without going through a pointer.
    /// Such a method is callable on addressable values but is not in the
    /// method set of the value type.
    needs_pointer: bool,
}

impl Found {
    fn value(selection: Selection) -> Self {
        Self {
            selection,
            needs_pointer: false,
        }
    }
}

/// All named types of a program.
#[derive(Debug, Clone)]
pub struct TypeTable {
    named: Vec<NamedInfo>,
}

impl Default for TypeTable {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeTable {
    /// The predeclared `error` interface.
    pub const ERROR: NamedId = 0;

    pub fn new() -> Self {
        let error = NamedInfo {
            name: "error".to_string(),
            package: String::new(),
            underlying: Type::Interface(vec![Method {
                name: "Error".to_string(),
                sig: Signature {
                    params: Vec::new(),
                    results: vec![Type::Basic(BasicKind::String)],
                    variadic: false,
                },
            }]),
            methods: Vec::new(),
            pointer_methods: HashSet::new(),
        };
        Self { named: vec![error] }
    }

    pub fn error_type(&self) -> Type {
        Type::Named(NamedType {
            id: Self::ERROR,
            name: "error".to_string(),
        })
    }

    /// Declare a named type whose underlying type is filled in later.
    pub fn declare(&mut self, name: &str, package: &str, display: String) -> Type {
        let id = self.named.len();
        self.named.push(NamedInfo {
            name: name.to_string(),
            package: package.to_string(),
            underlying: Type::Invalid,
            methods: Vec::new(),
            pointer_methods: HashSet::new(),
        });
        Type::Named(NamedType { id, name: display })
    }

    pub fn info(&self, id: NamedId) -> &NamedInfo {
        &self.named[id]
    }

    pub fn set_underlying(&mut self, id: NamedId, underlying: Type) {
        // The underlying type of a named type is never itself named.
        let underlying = self.underlying(&underlying);
        self.named[id].underlying = underlying;
    }

    pub fn add_method(&mut self, id: NamedId, method: Method, pointer_receiver: bool) {
        if pointer_receiver {
            self.named[id].pointer_methods.insert(method.name.clone());
        }
        self.named[id].methods.push(method);
    }

    pub fn underlying(&self, ty: &Type) -> Type {
        match ty {
            Type::Named(named) => self.named[named.id].underlying.clone(),
            other => other.clone(),
        }
    }

    pub fn underlying_basic(&self, ty: &Type) -> Option<BasicKind> {
        match self.underlying(ty) {
            Type::Basic(kind) => Some(kind),
            _ => None,
        }
    }

    pub fn is_interface(&self, ty: &Type) -> bool {
        matches!(self.underlying(ty), Type::Interface(_))
    }

    /// Look up a field or method, following embedded fields breadth first.
    pub fn lookup(&self, ty: &Type, name: &str) -> Option<Selection> {
        self.find(ty, name).map(|found| found.selection)
    }

    fn find(&self, ty: &Type, name: &str) -> Option<Found> {
        let start = match ty {
            Type::Pointer(elem) if matches!(elem.as_ref(), Type::Named(_)) => (elem.as_ref().clone(), true),
            other => (other.clone(), false),
        };

        let mut level = vec![start];
        let mut seen = HashSet::new();
        let mut opaque = false;

        while !level.is_empty() {
            let mut next = Vec::new();
            for (ty, indirect) in level {
                if let Type::Named(named) = &ty {
                    if !seen.insert(named.id) {
                        continue;
                    }
                    let info = &self.named[named.id];
                    if let Some(method) = info.methods.iter().find(|m| m.name == name) {
                        return Some(Found {
                            selection: Selection::Method(method.sig.clone()),
                            needs_pointer: !indirect && info.pointer_methods.contains(name),
                        });
                    }
                }

                match self.underlying(&ty) {
                    Type::Struct(fields) => {
                        for field in &fields {
                            if field.name == name {
                                return Some(Found::value(Selection::Field(field.ty.clone())));
                            }
                            if field.embedded {
                                match &field.ty {
                                    Type::Pointer(elem) => next.push((elem.as_ref().clone(), true)),
                                    Type::Opaque => opaque = true,
                                    other => next.push((other.clone(), indirect)),
                                }
                            }
                        }
                    }
                    Type::Interface(methods) => {
                        if let Some(method) = methods.iter().find(|m| m.name == name) {
                            return Some(Found::value(Selection::Method(method.sig.clone())));
                        }
                    }
                    Type::Opaque => opaque = true,
                    _ => {}
                }
            }
            level = next;
        }

        opaque.then_some(Found::value(Selection::Opaque))
    }

    /// Check that the method set of `ty` covers the interface `iface`.
    /// Returns why it does not, e.g. `missing method String`.
    pub fn missing_method(&self, ty: &Type, iface: &Type) -> Option<String> {
        if ty.is_lenient() {
            return None;
        }
        let Type::Interface(methods) = self.underlying(iface) else {
            return None;
        };
        for method in methods {
            match self.find(ty, &method.name) {
                Some(Found {
                    selection: Selection::Method(sig),
                    needs_pointer,
                }) if sig == method.sig => {
                    if needs_pointer {
                        return Some(format!("method {} has pointer receiver", method.name));
                    }
                }
                Some(Found {
                    selection: Selection::Opaque,
                    ..
                }) => {}
                _ => return Some(format!("missing method {}", method.name)),
            }
        }
        None
    }

    /// Whether a value of type `value` may be assigned to a variable of type `target`.
    pub fn assignable(&self, value: &Type, target: &Type) -> bool {
        if value.is_lenient() || target.is_lenient() || value == target {
            return true;
        }

        let target_under = self.underlying(target);
        if let Type::Untyped(kind) = value {
            return match (kind, &target_under) {
                (UntypedKind::Nil, t) => matches!(
                    t,
                    Type::Pointer(_)
                        | Type::Slice(_)
                        | Type::Map(_, _)
                        | Type::Func(_)
                        | Type::Interface(_)
                ),
                (kind, Type::Interface(_)) => {
                    self.missing_method(&kind.default_type(), target).is_none()
                }
                (UntypedKind::Bool, Type::Basic(k)) => *k == BasicKind::Bool,
                (UntypedKind::String, Type::Basic(k)) => *k == BasicKind::String,
                (UntypedKind::Int | UntypedKind::Rune, Type::Basic(k)) => k.is_numeric(),
                (UntypedKind::Float, Type::Basic(k)) => k.is_numeric(),
                _ => false,
            };
        }

        if let Type::Interface(_) = target_under {
            return self.missing_method(value, target).is_none();
        }

        let value_named = matches!(value, Type::Named(_));
        let target_named = matches!(target, Type::Named(_));
        if !(value_named && target_named) && self.underlying(value) == target_under {
            return true;
        }

        false
    }

    /// Whether `T(x)` is a valid conversion from `from` to `to`.
    pub fn convertible(&self, from: &Type, to: &Type) -> bool {
        if self.assignable(from, to) {
            return true;
        }

        let from_under = self.underlying(from);
        let to_under = self.underlying(to);
        if from_under == to_under {
            return true;
        }

        match (&from_under, &to_under) {
            (Type::Untyped(kind), Type::Basic(k)) => {
                (kind.is_numeric() && k.is_numeric())
                    || (matches!(kind, UntypedKind::Int | UntypedKind::Rune)
                        && *k == BasicKind::String)
            }
            (Type::Basic(a), Type::Basic(b)) => {
                (a.is_numeric() && b.is_numeric())
                    || (a.is_integer() && *b == BasicKind::String)
            }
            (Type::Basic(BasicKind::String), Type::Slice(elem))
            | (Type::Untyped(UntypedKind::String), Type::Slice(elem))
            | (Type::Slice(elem), Type::Basic(BasicKind::String)) => matches!(
                self.underlying(elem),
                Type::Basic(BasicKind::Uint8 | BasicKind::Int32)
            ),
            (Type::Pointer(a), Type::Pointer(b)) => self.underlying(a) == self.underlying(b),
            _ => false,
        }
    }

    /// Whether values of the type may be compared with `==`.
    pub fn comparable(&self, ty: &Type) -> bool {
        match self.underlying(ty) {
            Type::Slice(_) | Type::Map(_, _) | Type::Func(_) => false,
            Type::Struct(fields) => fields.iter().all(|f| self.comparable(&f.ty)),
            Type::Array(_, elem) => self.comparable(&elem),
            _ => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_named_identity_ignores_names() {
        let mut table = TypeTable::new();
        let a = table.declare("T", "p", "p.T".to_string());
        let b = table.declare("T", "q", "p.T".to_string());
        assert_ne!(a, b);
        assert_eq!(a, a.clone());
    }

    #[test]
    fn test_untyped_assignability() {
        let table = TypeTable::new();
        let int = Type::Basic(BasicKind::Int);
        let float = Type::Basic(BasicKind::Float64);
        let string = Type::Basic(BasicKind::String);
        assert!(table.assignable(&Type::Untyped(UntypedKind::Int), &float));
        assert!(!table.assignable(&Type::Untyped(UntypedKind::Float), &string));
        assert!(!table.assignable(&Type::Untyped(UntypedKind::Nil), &int));
        assert!(table.assignable(&Type::Untyped(UntypedKind::Nil), &Type::slice(int)));
    }

    #[test]
    fn test_named_and_unnamed_assignability() {
        let mut table = TypeTable::new();
        let ints = table.declare("Ints", "p", "p.Ints".to_string());
        let Type::Named(named) = &ints else {
            panic!("expected named type");
        };
        table.set_underlying(named.id, Type::slice(Type::Basic(BasicKind::Int)));

        assert!(table.assignable(&Type::slice(Type::Basic(BasicKind::Int)), &ints));
        assert!(!table.assignable(&Type::Basic(BasicKind::Int), &ints));
    }

    #[test]
    fn test_interface_satisfaction() {
        let mut table = TypeTable::new();
        let err = table.declare("MyErr", "p", "p.MyErr".to_string());
        let Type::Named(named) = &err else {
            panic!("expected named type");
        };
        table.set_underlying(named.id, Type::Struct(Vec::new()));
        assert!(!table.assignable(&err, &table.error_type()));

        table.add_method(
            named.id,
            Method {
                name: "Error".to_string(),
                sig: Signature {
                    params: Vec::new(),
                    results: vec![Type::Basic(BasicKind::String)],
                    variadic: false,
                },
            },
            false,
        );
        assert!(table.assignable(&err, &table.error_type()));
        assert!(table.assignable(&Type::pointer(err.clone()), &table.error_type()));
    }

    #[test]
    fn test_pointer_receiver_method_sets() {
        let mut table = TypeTable::new();
        let stringer = Type::Interface(vec![Method {
            name: "String".to_string(),
            sig: Signature {
                params: Vec::new(),
                results: vec![Type::Basic(BasicKind::String)],
                variadic: false,
            },
        }]);
        let named = table.declare("Named", "p", "p.Named".to_string());
        let Type::Named(handle) = &named else {
            panic!("expected named type");
        };
        table.set_underlying(handle.id, Type::Struct(Vec::new()));
        table.add_method(
            handle.id,
            Method {
                name: "String".to_string(),
                sig: Signature {
                    params: Vec::new(),
                    results: vec![Type::Basic(BasicKind::String)],
                    variadic: false,
                },
            },
            true,
        );

        assert!(!table.assignable(&named, &stringer));
        assert_eq!(
            table.missing_method(&named, &stringer),
            Some("method String has pointer receiver".to_string())
        );
        assert!(table.assignable(&Type::pointer(named.clone()), &stringer));
        assert!(matches!(table.lookup(&named, "String"), Some(Selection::Method(_))));
    }

    #[test]
    fn test_embedded_field_lookup() {
        let mut table = TypeTable::new();
        let inner = table.declare("Inner", "p", "p.Inner".to_string());
        let outer = table.declare("Outer", "p", "p.Outer".to_string());
        let (Type::Named(inner_id), Type::Named(outer_id)) = (&inner, &outer) else {
            panic!("expected named types");
        };
        table.set_underlying(
            inner_id.id,
            Type::Struct(vec![Field {
                name: "x".to_string(),
                ty: Type::Basic(BasicKind::Int),
                embedded: false,
            }]),
        );
        table.set_underlying(
            outer_id.id,
            Type::Struct(vec![Field {
                name: "Inner".to_string(),
                ty: Type::pointer(inner.clone()),
                embedded: true,
            }]),
        );

        assert_eq!(
            table.lookup(&outer, "x"),
            Some(Selection::Field(Type::Basic(BasicKind::Int)))
        );
        assert_eq!(table.lookup(&outer, "y"), None);
    }

    #[test]
    fn test_representable() {
        assert!(ConstValue::Int(255).representable(BasicKind::Uint8));
        assert!(!ConstValue::Int(256).representable(BasicKind::Uint8));
        assert!(!ConstValue::Int(-1).representable(BasicKind::Uint));
        assert!(ConstValue::Float(2.0).representable(BasicKind::Int));
        assert!(!ConstValue::Float(2.5).representable(BasicKind::Int));
    }

    #[test]
    fn test_display() {
        let sig = Signature {
            params: vec![Type::Basic(BasicKind::Int), Type::slice(Type::Basic(BasicKind::String))],
            results: vec![Type::Basic(BasicKind::Bool)],
            variadic: true,
        };
        assert_eq!(Type::Func(sig).to_string(), "func(int, ...string) bool");
        assert_eq!(
            Type::Map(
                Box::new(Type::Basic(BasicKind::String)),
                Box::new(Type::pointer(Type::Basic(BasicKind::Uint8)))
            )
            .to_string(),
            "map[string]*uint8"
        );
    }
}
