//! Type checker for Go packages.
//!
//! Packages are checked one at a time in dependency order. Each package is
//! checked in phases:
//! - collect package-level declarations and imports
//! - resolve type declarations (lazily, with cycle detection)
//! - attach methods to their receiver types
//! - resolve constants, variables and function signatures
//! - check function bodies
//!
//! Diagnostics are collected rather than reported at the first failure.

// TypeError contains detailed error information, hence it's large
#![allow(clippy::result_large_err)]

use crate::compiler::ast::{
    BinaryOp, Block, BranchKind, DeclKeyword, Decl, Element, Else, Expr, File, FuncDecl,
    FuncType, GenDecl, Ident, IfStmt, InterfaceElem, LitKind, Param, Spec, Stmt, StmtKind,
    TypeExpr, TypeSpec, UnaryOp, ValueSpec,
};
use crate::compiler::lexer::{Span, unquote};
use crate::compiler::types::{
    BasicKind, ConstValue, Field, Method, NamedId, Selection, Signature, Type, TypeTable,
    UntypedKind,
};
use std::collections::{HashMap, HashSet};
use std::mem;

/// A type error with location information.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeError {
    pub message: String,
    pub span: Span,
    pub file: String,
}

impl TypeError {
    pub fn new(message: impl Into<String>, span: Span, file: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            span,
            file: file.into(),
        }
    }
}

/// Built-in functions of the universe scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    Len,
    Cap,
    Append,
    Make,
    New,
    Delete,
    Copy,
    Panic,
    Recover,
    Print,
    Println,
    Min,
    Max,
}

impl Builtin {
    fn from_name(name: &str) -> Option<Builtin> {
        let builtin = match name {
            "len" => Builtin::Len,
            "cap" => Builtin::Cap,
            "append" => Builtin::Append,
            "make" => Builtin::Make,
            "new" => Builtin::New,
            "delete" => Builtin::Delete,
            "copy" => Builtin::Copy,
            "panic" => Builtin::Panic,
            "recover" => Builtin::Recover,
            "print" => Builtin::Print,
            "println" => Builtin::Println,
            "min" => Builtin::Min,
            "max" => Builtin::Max,
            _ => return None,
        };
        Some(builtin)
    }

    fn name(&self) -> &'static str {
        match self {
            Builtin::Len => "len",
            Builtin::Cap => "cap",
            Builtin::Append => "append",
            Builtin::Make => "make",
            Builtin::New => "new",
            Builtin::Delete => "delete",
            Builtin::Copy => "copy",
            Builtin::Panic => "panic",
            Builtin::Recover => "recover",
            Builtin::Print => "print",
            Builtin::Println => "println",
            Builtin::Min => "min",
            Builtin::Max => "max",
        }
    }
}

/// A named entity of a scope.
#[derive(Debug, Clone)]
pub enum Object {
    Const(Type, Option<ConstValue>),
    Var(Type),
    TypeName(Type),
    Func(Signature),
    Package(String),
    Builtin(Builtin),
    Nil,
}

/// Result of checking one package.
#[derive(Debug, Clone)]
pub struct PackageInfo {
    pub path: String,
    pub name: String,
    /// Members are unknown; every selector on the package is accepted.
    pub opaque: bool,
    pub scope: HashMap<String, Object>,
    /// Types of the type expressions of top-level declarations, keyed by
    /// file index and position.
    type_exprs: HashMap<(usize, Span), Type>,
}

/// Checks packages and keeps their exported scopes for importers.
#[derive(Debug, Default)]
pub struct TypeChecker {
    types: TypeTable,
    packages: HashMap<String, PackageInfo>,
}

impl TypeChecker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn types(&self) -> &TypeTable {
        &self.types
    }

    pub fn package(&self, path: &str) -> Option<&PackageInfo> {
        self.packages.get(path)
    }

    /// Register a package whose source is unavailable.
    pub fn add_opaque(&mut self, path: &str) {
        let name = path.rsplit('/').next().unwrap_or(path).to_string();
        self.packages.insert(
            path.to_string(),
            PackageInfo {
                path: path.to_string(),
                name,
                opaque: true,
                scope: HashMap::new(),
                type_exprs: HashMap::new(),
            },
        );
    }

    /// Type check the files of one package. Every package it imports must
    /// already have been checked or registered as opaque.
    pub fn check_package(&mut self, path: &str, files: &[File]) -> Result<(), Vec<TypeError>> {
        let name = files
            .first()
            .map(|f| f.package.name.clone())
            .unwrap_or_default();

        let mut checker = Checker::new(path, name.clone(), files, &mut self.types, &self.packages);
        checker.check();
        let Checker {
            globals,
            type_exprs,
            mut errors,
            ..
        } = checker;

        self.packages.insert(
            path.to_string(),
            PackageInfo {
                path: path.to_string(),
                name,
                opaque: false,
                scope: globals,
                type_exprs,
            },
        );

        if errors.is_empty() {
            Ok(())
        } else {
            errors.sort_by(|a, b| (&a.file, a.span).cmp(&(&b.file, b.span)));
            errors.dedup();
            Err(errors)
        }
    }

    /// The type denoted by a type expression of a top-level declaration.
    pub fn type_of(&self, package: &str, file: usize, expr: &TypeExpr) -> Option<&Type> {
        self.packages
            .get(package)?
            .type_exprs
            .get(&(file, expr.span()))
    }
}

/// An evaluated expression.
#[derive(Debug, Clone)]
enum Operand {
    Invalid,
    NoValue,
    Value {
        ty: Type,
        addressable: bool,
        /// Map index or type assertion: may yield a second boolean result.
        comma_ok: bool,
    },
    Const {
        ty: Type,
        value: Option<ConstValue>,
    },
    Type(Type),
    Builtin(Builtin),
    Package(String),
}

impl Operand {
    fn value(ty: Type) -> Operand {
        Operand::Value {
            ty,
            addressable: false,
            comma_ok: false,
        }
    }

    fn variable(ty: Type) -> Operand {
        Operand::Value {
            ty,
            addressable: true,
            comma_ok: false,
        }
    }

    fn ty(&self) -> Option<Type> {
        match self {
            Operand::Value { ty, .. } | Operand::Const { ty, .. } => Some(ty.clone()),
            Operand::Invalid => Some(Type::Invalid),
            _ => None,
        }
    }

    fn const_value(&self) -> Option<&ConstValue> {
        match self {
            Operand::Const { value, .. } => value.as_ref(),
            _ => None,
        }
    }
}

#[derive(Clone, Copy)]
enum GlobalDecl<'a> {
    Type {
        file: usize,
        spec: &'a TypeSpec,
    },
    Value {
        file: usize,
        keyword: DeclKeyword,
        spec: &'a ValueSpec,
        /// Spec carrying the type and values; differs from `spec` for
        /// constants that repeat the previous expression list.
        source: &'a ValueSpec,
    },
    Func {
        file: usize,
        decl: &'a FuncDecl,
    },
}

struct PendingBody<'a> {
    file: usize,
    decl: &'a FuncDecl,
    bindings: Vec<(Ident, Type)>,
    results: Vec<Type>,
}

/// Saved state while a package-level declaration is resolved from inside
/// another declaration.
struct Context {
    file: usize,
    scopes: Vec<HashMap<String, Object>>,
    iota: Option<i128>,
    results: Vec<Vec<Type>>,
    named_results: Vec<bool>,
}

struct Checker<'a> {
    path: &'a str,
    pkg_name: String,
    files: &'a [File],
    types: &'a mut TypeTable,
    packages: &'a HashMap<String, PackageInfo>,
    decls: HashMap<String, GlobalDecl<'a>>,
    globals: HashMap<String, Object>,
    resolving: Vec<String>,
    pending_types: HashSet<NamedId>,
    imports: Vec<HashMap<String, String>>,
    scopes: Vec<HashMap<String, Object>>,
    file: usize,
    iota: Option<i128>,
    /// Result types of the enclosing functions, innermost last.
    results: Vec<Vec<Type>>,
    named_results: Vec<bool>,
    bodies: Vec<PendingBody<'a>>,
    type_exprs: HashMap<(usize, Span), Type>,
    errors: Vec<TypeError>,
}

impl<'a> Checker<'a> {
    fn new(
        path: &'a str,
        pkg_name: String,
        files: &'a [File],
        types: &'a mut TypeTable,
        packages: &'a HashMap<String, PackageInfo>,
    ) -> Self {
        Self {
            path,
            pkg_name,
            files,
            types,
            packages,
            decls: HashMap::new(),
            globals: HashMap::new(),
            resolving: Vec::new(),
            pending_types: HashSet::new(),
            imports: Vec::new(),
            scopes: Vec::new(),
            file: 0,
            iota: None,
            results: Vec::new(),
            named_results: Vec::new(),
            bodies: Vec::new(),
            type_exprs: HashMap::new(),
            errors: Vec::new(),
        }
    }

    fn error(&mut self, message: impl Into<String>, span: Span) {
        let file = self
            .files
            .get(self.file)
            .map(|f| f.path.clone())
            .unwrap_or_default();
        self.errors.push(TypeError::new(message, span, file));
    }

    fn check(&mut self) {
        let files = self.files;

        for (idx, file) in files.iter().enumerate() {
            self.file = idx;
            if file.package.name != self.pkg_name {
                self.error(
                    format!(
                        "package {}; expected package {}",
                        file.package.name, self.pkg_name
                    ),
                    file.package.span,
                );
            }
            self.collect_imports(file);
        }

        let mut methods = Vec::new();
        let mut anonymous = Vec::new();
        for (idx, file) in files.iter().enumerate() {
            self.file = idx;
            self.collect_decls(idx, file, &mut methods, &mut anonymous);
        }

        // Types first so that signatures and initializers see complete types.
        for (idx, file) in files.iter().enumerate() {
            for decl in &file.decls {
                let Decl::Gen(gen_decl) = decl else { continue };
                for spec in &gen_decl.specs {
                    if let Spec::Type(spec) = spec
                        && !spec.name.is_blank()
                    {
                        self.file = idx;
                        self.resolve_global(&spec.name.name);
                    }
                }
            }
        }

        for (file, decl) in methods {
            self.file = file;
            self.declare_method(file, decl);
        }

        for (idx, file) in files.iter().enumerate() {
            for decl in &file.decls {
                self.file = idx;
                match decl {
                    Decl::Gen(gen_decl) => {
                        for spec in &gen_decl.specs {
                            if let Spec::Value(spec) = spec
                                && let Some(name) = spec.names.iter().find(|n| !n.is_blank())
                            {
                                self.resolve_global(&name.name);
                            }
                        }
                    }
                    Decl::Func(func) if func.recv.is_none() && func.name.name != "init" => {
                        self.resolve_global(&func.name.name);
                    }
                    Decl::Func(_) => {}
                }
            }
        }

        for decl in anonymous {
            self.resolve_decl(decl);
        }

        while !self.bodies.is_empty() {
            let bodies = mem::take(&mut self.bodies);
            for body in bodies {
                self.check_body(body);
            }
        }
    }

    fn collect_imports(&mut self, file: &File) {
        let mut imports = HashMap::new();

        for decl in &file.imports {
            for spec in &decl.specs {
                let Some(path) = unquote(&spec.path) else {
                    self.error(format!("invalid import path: {}", spec.path), spec.span);
                    continue;
                };
                let Some(package) = self.packages.get(&path) else {
                    self.error(format!("could not import {}", path), spec.span);
                    continue;
                };

                let local = match &spec.name {
                    Some(name) if name.is_blank() => continue,
                    Some(name) if name.name == "." => {
                        self.error("dot imports are not supported", spec.span);
                        continue;
                    }
                    Some(name) => name.name.clone(),
                    None => package.name.clone(),
                };

                if imports.insert(local.clone(), path).is_some() {
                    self.error(format!("{} redeclared in this block", local), spec.span);
                }
            }
        }

        self.imports.push(imports);
    }

    fn collect_decls(
        &mut self,
        file_idx: usize,
        file: &'a File,
        methods: &mut Vec<(usize, &'a FuncDecl)>,
        anonymous: &mut Vec<GlobalDecl<'a>>,
    ) {
        for decl in &file.decls {
            match decl {
                Decl::Gen(gen_decl) => {
                    let mut source: Option<&'a ValueSpec> = None;
                    for spec in &gen_decl.specs {
                        match spec {
                            Spec::Type(spec) => {
                                let decl = GlobalDecl::Type {
                                    file: file_idx,
                                    spec,
                                };
                                if spec.name.is_blank() {
                                    anonymous.push(decl);
                                } else {
                                    self.register(&spec.name, decl);
                                }
                            }
                            Spec::Value(spec) => {
                                let src = self.value_source(gen_decl, spec, &mut source);
                                let decl = GlobalDecl::Value {
                                    file: file_idx,
                                    keyword: gen_decl.keyword,
                                    spec,
                                    source: src,
                                };
                                if spec.names.iter().all(Ident::is_blank) {
                                    anonymous.push(decl);
                                }
                                for name in &spec.names {
                                    if !name.is_blank() {
                                        self.register(name, decl);
                                    }
                                }
                            }
                        }
                    }
                }
                Decl::Func(func) => {
                    if func.recv.is_some() {
                        methods.push((file_idx, func));
                    } else if func.name.name == "init" {
                        if !func.sig.params.is_empty() || !func.sig.results.is_empty() {
                            self.error(
                                "func init must have no arguments and no return values",
                                func.name.span,
                            );
                        }
                        anonymous.push(GlobalDecl::Func {
                            file: file_idx,
                            decl: func,
                        });
                    } else if func.name.is_blank() {
                        anonymous.push(GlobalDecl::Func {
                            file: file_idx,
                            decl: func,
                        });
                    } else {
                        self.register(
                            &func.name,
                            GlobalDecl::Func {
                                file: file_idx,
                                decl: func,
                            },
                        );
                    }
                }
            }
        }
    }

    /// The spec whose type and values apply to `spec`: itself, or for a
    /// constant without values, the last constant spec in the group that has them.
    fn value_source(
        &mut self,
        gen_decl: &GenDecl,
        spec: &'a ValueSpec,
        source: &mut Option<&'a ValueSpec>,
    ) -> &'a ValueSpec {
        if gen_decl.keyword != DeclKeyword::Const {
            return spec;
        }
        if !spec.values.is_empty() || spec.ty.is_some() {
            *source = Some(spec);
            return spec;
        }
        match *source {
            Some(previous) => previous,
            None => {
                self.error("missing init expr for const declaration", spec.span);
                spec
            }
        }
    }

    fn register(&mut self, name: &Ident, decl: GlobalDecl<'a>) {
        if self.decls.contains_key(&name.name) {
            self.error(format!("{} redeclared in this block", name.name), name.span);
            return;
        }
        self.decls.insert(name.name.clone(), decl);
    }

    // Package-level resolution

    fn enter(&mut self, file: usize) -> Context {
        Context {
            file: mem::replace(&mut self.file, file),
            scopes: mem::take(&mut self.scopes),
            iota: self.iota.take(),
            results: mem::take(&mut self.results),
            named_results: mem::take(&mut self.named_results),
        }
    }

    fn leave(&mut self, context: Context) {
        self.file = context.file;
        self.scopes = context.scopes;
        self.iota = context.iota;
        self.results = context.results;
        self.named_results = context.named_results;
    }

    fn resolve_global(&mut self, name: &str) -> Option<Object> {
        if let Some(object) = self.globals.get(name) {
            return Some(object.clone());
        }
        let decl = *self.decls.get(name)?;

        if self.resolving.iter().any(|n| n == name) {
            let span = match decl {
                GlobalDecl::Type { spec, .. } => spec.name.span,
                GlobalDecl::Value { spec, .. } => spec.span,
                GlobalDecl::Func { decl, .. } => decl.name.span,
            };
            let file = match decl {
                GlobalDecl::Type { file, .. }
                | GlobalDecl::Value { file, .. }
                | GlobalDecl::Func { file, .. } => file,
            };
            let context = self.enter(file);
            match decl {
                GlobalDecl::Type { .. } => {
                    self.error(format!("invalid recursive type {}", name), span)
                }
                _ => self.error(format!("initialization cycle: {} refers to itself", name), span),
            }
            self.leave(context);
            return Some(Object::Var(Type::Invalid));
        }

        self.resolving.push(name.to_string());
        self.resolve_decl(decl);
        self.resolving.pop();

        self.globals.get(name).cloned()
    }

    fn resolve_decl(&mut self, decl: GlobalDecl<'a>) {
        match decl {
            GlobalDecl::Type { file, spec } => {
                let context = self.enter(file);
                let ty = self.type_decl(spec, true);
                self.type_exprs.insert((file, spec.ty.span()), ty);
                self.leave(context);
            }
            GlobalDecl::Value {
                file,
                keyword,
                spec,
                source,
            } => {
                let context = self.enter(file);
                if keyword == DeclKeyword::Const {
                    self.iota = Some(spec.iota as i128);
                }
                let declared = source.ty.as_ref().map(|ty| self.resolve_type(ty));
                if let (Some(expr), Some(ty)) = (&spec.ty, &declared) {
                    self.type_exprs.insert((file, expr.span()), ty.clone());
                }
                let objects =
                    self.value_objects(keyword, &spec.names, declared, &source.values, spec.span);
                for (name, object) in spec.names.iter().zip(objects) {
                    if !name.is_blank() {
                        self.globals.insert(name.name.clone(), object);
                    }
                }
                self.leave(context);
            }
            GlobalDecl::Func { file, decl } => {
                let context = self.enter(file);
                let (sig, bindings) = self.signature(&decl.sig);
                if !decl.name.is_blank() && decl.name.name != "init" {
                    self.globals
                        .insert(decl.name.name.clone(), Object::Func(sig.clone()));
                }
                if decl.body.is_some() {
                    self.bodies.push(PendingBody {
                        file,
                        decl,
                        bindings,
                        results: sig.results,
                    });
                }
                self.leave(context);
            }
        }
    }

    /// Declare a type spec, returning the type its right-hand side denotes.
    fn type_decl(&mut self, spec: &TypeSpec, global: bool) -> Type {
        if spec.alias {
            let ty = self.resolve_type(&spec.ty);
            self.define_type_name(&spec.name, Object::TypeName(ty.clone()), global);
            return ty;
        }

        let display = format!("{}.{}", self.pkg_name, spec.name.name);
        let named = self.types.declare(&spec.name.name, self.path, display);
        let Type::Named(handle) = &named else {
            return Type::Invalid;
        };
        let id = handle.id;

        if !spec.name.is_blank() {
            self.define_type_name(&spec.name, Object::TypeName(named.clone()), global);
        }

        self.pending_types.insert(id);
        let rhs = self.resolve_type(&spec.ty);
        if let Type::Named(target) = &rhs
            && self.pending_types.contains(&target.id)
        {
            self.error(
                format!("invalid recursive type {}", spec.name.name),
                spec.name.span,
            );
        }
        self.pending_types.remove(&id);

        self.types.set_underlying(id, rhs.clone());
        rhs
    }

    fn define_type_name(&mut self, name: &Ident, object: Object, global: bool) {
        if name.is_blank() {
            return;
        }
        if global {
            self.globals.insert(name.name.clone(), object);
        } else {
            self.declare(name, object);
        }
    }

    fn declare_method(&mut self, file: usize, decl: &'a FuncDecl) {
        let Some(recv) = &decl.recv else { return };

        let mut base = &recv.ty;
        let mut pointer = false;
        loop {
            match base {
                TypeExpr::Pointer { elem, .. } if !pointer => {
                    pointer = true;
                    base = elem;
                }
                TypeExpr::Paren { inner, .. } => base = inner,
                _ => break,
            }
        }

        let recv_type = match base {
            TypeExpr::Name { pkg: None, name } => match self.resolve_global(&name.name) {
                Some(Object::TypeName(ty @ Type::Named(_))) => ty,
                Some(Object::TypeName(_)) | None => {
                    self.error(
                        format!("cannot define new methods on non-local type {}", name.name),
                        name.span,
                    );
                    Type::Invalid
                }
                Some(_) => {
                    self.error(format!("{} is not a type", name.name), name.span);
                    Type::Invalid
                }
            },
            other => {
                self.error("invalid receiver type", other.span());
                Type::Invalid
            }
        };

        let (sig, mut bindings) = self.signature(&decl.sig);

        if let Type::Named(named) = &recv_type {
            let info = self.types.info(named.id);
            let type_name = info.name.clone();
            let invalid = matches!(info.underlying, Type::Pointer(_) | Type::Interface(_));
            let duplicate = info.methods.iter().any(|m| m.name == decl.name.name);
            let field_clash = matches!(&info.underlying, Type::Struct(fields)
                if fields.iter().any(|f| f.name == decl.name.name));

            if invalid {
                self.error(
                    format!("invalid receiver type {} (pointer or interface type)", recv_type),
                    recv.ty.span(),
                );
            } else if duplicate {
                self.error(
                    format!("method {}.{} already declared", type_name, decl.name.name),
                    decl.name.span,
                );
            } else if field_clash {
                self.error(
                    format!("field and method with the same name {}", decl.name.name),
                    decl.name.span,
                );
            } else if !decl.name.is_blank() {
                self.types.add_method(
                    named.id,
                    Method {
                        name: decl.name.name.clone(),
                        sig: sig.clone(),
                    },
                    pointer,
                );
            }
        }

        if decl.body.is_some() {
            let recv_ty = if pointer {
                Type::pointer(recv_type)
            } else {
                recv_type
            };
            if let Some(name) = recv.names.first() {
                bindings.insert(0, (name.clone(), recv_ty));
            }
            self.bodies.push(PendingBody {
                file,
                decl,
                bindings,
                results: sig.results,
            });
        }
    }

    fn check_body(&mut self, body: PendingBody<'a>) {
        let Some(block) = &body.decl.body else { return };

        self.file = body.file;
        self.scopes.push(HashMap::new());
        for (name, ty) in &body.bindings {
            self.declare(name, Object::Var(ty.clone()));
        }
        self.results.push(body.results.clone());
        self.named_results.push(has_named_results(&body.decl.sig));

        for stmt in &block.stmts {
            self.stmt(stmt);
        }
        if !body.results.is_empty() && !block_terminates(block) {
            self.error("missing return", block_end(block));
        }

        self.named_results.pop();
        self.results.pop();
        self.scopes.pop();
    }

    // Scopes

    fn declare(&mut self, name: &Ident, object: Object) {
        if name.is_blank() {
            return;
        }
        let Some(scope) = self.scopes.last_mut() else {
            self.globals.insert(name.name.clone(), object);
            return;
        };
        if scope.contains_key(&name.name) {
            self.error(format!("{} redeclared in this block", name.name), name.span);
            return;
        }
        scope.insert(name.name.clone(), object);
    }

    fn lookup(&mut self, name: &str) -> Option<Object> {
        for scope in self.scopes.iter().rev() {
            if let Some(object) = scope.get(name) {
                return Some(object.clone());
            }
        }
        if let Some(path) = self.imports.get(self.file).and_then(|i| i.get(name)) {
            return Some(Object::Package(path.clone()));
        }
        if let Some(object) = self.resolve_global(name) {
            return Some(object);
        }
        if name == "iota"
            && let Some(value) = self.iota
        {
            return Some(Object::Const(
                Type::Untyped(UntypedKind::Int),
                Some(ConstValue::Int(value)),
            ));
        }
        universe(name, &*self.types)
    }

    // Types

    fn resolve_type(&mut self, expr: &TypeExpr) -> Type {
        match expr {
            TypeExpr::Name { pkg: None, name } => match self.lookup(&name.name) {
                Some(Object::TypeName(ty)) => ty,
                Some(_) => {
                    self.error(format!("{} is not a type", name.name), name.span);
                    Type::Invalid
                }
                None => {
                    self.error(format!("undefined: {}", name.name), name.span);
                    Type::Invalid
                }
            },
            TypeExpr::Name {
                pkg: Some(pkg),
                name,
            } => match self.qualified(pkg, name) {
                Some(Object::TypeName(ty)) => ty,
                Some(Object::Var(Type::Opaque)) => Type::Opaque,
                Some(_) => {
                    self.error(
                        format!("{}.{} is not a type", pkg.name, name.name),
                        name.span,
                    );
                    Type::Invalid
                }
                None => Type::Invalid,
            },
            TypeExpr::Pointer { elem, .. } => Type::pointer(self.resolve_type(elem)),
            TypeExpr::Slice { elem, .. } => Type::slice(self.resolve_type(elem)),
            TypeExpr::Array { len, elem, span } => {
                let len = match len {
                    Some(len) => self.array_length(len),
                    None => {
                        self.error("invalid use of [...] array (outside a composite literal)", *span);
                        0
                    }
                };
                Type::Array(len, Box::new(self.resolve_type(elem)))
            }
            TypeExpr::Map { key, value, .. } => {
                let key_ty = self.resolve_type(key);
                if !self.types.comparable(&key_ty) {
                    self.error(format!("invalid map key type {}", key_ty), key.span());
                }
                Type::Map(Box::new(key_ty), Box::new(self.resolve_type(value)))
            }
            TypeExpr::Struct { fields, .. } => {
                let mut resolved: Vec<Field> = Vec::new();
                for field in fields {
                    let ty = self.resolve_type(&field.ty);
                    let names: Vec<(String, Span)> = if field.names.is_empty() {
                        match embedded_name(&field.ty) {
                            Some(name) => vec![(name.name.clone(), name.span)],
                            None => {
                                self.error("invalid embedded field type", field.ty.span());
                                continue;
                            }
                        }
                    } else {
                        field.names.iter().map(|n| (n.name.clone(), n.span)).collect()
                    };
                    for (name, span) in names {
                        if name != "_" && resolved.iter().any(|f| f.name == name) {
                            self.error(format!("{} redeclared", name), span);
                            continue;
                        }
                        resolved.push(Field {
                            name,
                            ty: ty.clone(),
                            embedded: field.names.is_empty(),
                        });
                    }
                }
                Type::Struct(resolved)
            }
            TypeExpr::Interface { elems, .. } => {
                let mut methods: Vec<Method> = Vec::new();
                for elem in elems {
                    match elem {
                        InterfaceElem::Method { name, sig, .. } => {
                            let (sig, _) = self.signature(sig);
                            if methods.iter().any(|m| m.name == name.name) {
                                self.error(format!("duplicate method {}", name.name), name.span);
                                continue;
                            }
                            methods.push(Method {
                                name: name.name.clone(),
                                sig,
                            });
                        }
                        InterfaceElem::Embed { ty, .. } => match self.resolve_type(ty) {
                            Type::Opaque | Type::Invalid => {}
                            embedded => match self.types.underlying(&embedded) {
                                Type::Interface(embedded_methods) => {
                                    for method in embedded_methods {
                                        if !methods.iter().any(|m| m.name == method.name) {
                                            methods.push(method);
                                        }
                                    }
                                }
                                _ => self.error(
                                    format!("cannot embed non-interface type {}", embedded),
                                    ty.span(),
                                ),
                            },
                        },
                    }
                }
                methods.sort_by(|a, b| a.name.cmp(&b.name));
                Type::Interface(methods)
            }
            TypeExpr::Func(func) => Type::Func(self.signature(func).0),
            TypeExpr::Paren { inner, .. } => self.resolve_type(inner),
        }
    }

    fn array_length(&mut self, expr: &Expr) -> u64 {
        let operand = self.single(expr);
        match operand.const_value().and_then(ConstValue::as_int) {
            Some(n) if n >= 0 => n as u64,
            Some(_) => {
                self.error("invalid array length: must not be negative", expr.span());
                0
            }
            None => {
                if !matches!(operand, Operand::Invalid) {
                    self.error("array length must be a constant integer", expr.span());
                }
                0
            }
        }
    }

    /// Resolve a signature, returning it with the named parameters and results.
    fn signature(&mut self, func: &FuncType) -> (Signature, Vec<(Ident, Type)>) {
        let mut bindings = Vec::new();
        let (params, variadic) = self.params(&func.params, &mut bindings);
        let (results, _) = self.params(&func.results, &mut bindings);
        (
            Signature {
                params,
                results,
                variadic,
            },
            bindings,
        )
    }

    fn params(&mut self, params: &[Param], bindings: &mut Vec<(Ident, Type)>) -> (Vec<Type>, bool) {
        let mut types = Vec::new();
        let mut variadic = false;

        for (i, param) in params.iter().enumerate() {
            let mut ty = self.resolve_type(&param.ty);
            if param.variadic {
                if i + 1 != params.len() || param.names.len() > 1 {
                    self.error(
                        "can only use ... with final parameter in list",
                        param.ty.span(),
                    );
                }
                ty = Type::slice(ty);
                variadic = true;
            }
            if param.names.is_empty() {
                types.push(ty);
            } else {
                for name in &param.names {
                    types.push(ty.clone());
                    bindings.push((name.clone(), ty.clone()));
                }
            }
        }

        (types, variadic)
    }

    fn qualified(&mut self, pkg: &Ident, name: &Ident) -> Option<Object> {
        let Some(path) = self.imports.get(self.file).and_then(|i| i.get(&pkg.name)).cloned()
        else {
            if self.lookup(&pkg.name).is_some() {
                self.error(format!("{} is not a package", pkg.name), pkg.span);
            } else {
                self.error(format!("undefined: {}", pkg.name), pkg.span);
            }
            return None;
        };
        self.package_member(&path, name)
    }

    fn package_member(&mut self, path: &str, name: &Ident) -> Option<Object> {
        let package = self.packages.get(path)?;
        if package.opaque {
            return Some(Object::Var(Type::Opaque));
        }
        if !name.is_exported() {
            self.error(
                format!("name {} not exported by package {}", name.name, package.name),
                name.span,
            );
            return None;
        }
        match package.scope.get(&name.name) {
            Some(object) => Some(object.clone()),
            None => {
                let message = format!("undefined: {}.{}", package.name, name.name);
                self.error(message, name.span);
                None
            }
        }
    }

    // Declarations shared by package and function scope

    fn value_objects(
        &mut self,
        keyword: DeclKeyword,
        names: &[Ident],
        declared: Option<Type>,
        values: &[Expr],
        span: Span,
    ) -> Vec<Object> {
        if keyword == DeclKeyword::Const {
            return self.const_objects(names, declared, values, span);
        }

        if values.is_empty() {
            let ty = declared.unwrap_or(Type::Invalid);
            return names.iter().map(|_| Object::Var(ty.clone())).collect();
        }

        let operands = self.rhs_values(names.len(), values, span);
        operands
            .into_iter()
            .zip(names)
            .map(|(operand, name)| match &declared {
                Some(ty) => {
                    self.assign_to(&operand, ty, "variable declaration", name.span);
                    Object::Var(ty.clone())
                }
                None => Object::Var(self.inferred_type(&operand, name.span)),
            })
            .collect()
    }

    fn const_objects(
        &mut self,
        names: &[Ident],
        declared: Option<Type>,
        values: &[Expr],
        span: Span,
    ) -> Vec<Object> {
        if values.len() < names.len() {
            self.error("missing init expr for const declaration", span);
        } else if values.len() > names.len() {
            self.error("extra init expr", span);
        }

        names
            .iter()
            .enumerate()
            .map(|(i, name)| {
                let Some(expr) = values.get(i) else {
                    return Object::Const(Type::Invalid, None);
                };
                let operand = self.single(expr);
                let (ty, value) = match operand {
                    Operand::Const { ty, value } => (ty, value),
                    Operand::Invalid => (Type::Invalid, None),
                    _ => {
                        self.error(
                            format!("{} is not constant", describe(expr)),
                            expr.span(),
                        );
                        (Type::Invalid, None)
                    }
                };
                match &declared {
                    Some(target) => {
                        let operand = Operand::Const {
                            ty,
                            value: value.clone(),
                        };
                        self.assign_to(&operand, target, "constant declaration", name.span);
                        Object::Const(target.clone(), value)
                    }
                    None => Object::Const(ty, value),
                }
            })
            .collect()
    }

    /// The type a variable takes from its initializer.
    fn inferred_type(&mut self, operand: &Operand, span: Span) -> Type {
        match operand.ty() {
            Some(Type::Untyped(UntypedKind::Nil)) => {
                self.error("use of untyped nil in assignment", span);
                Type::Invalid
            }
            Some(ty) => ty.defaulted(),
            None => Type::Invalid,
        }
    }

    /// Evaluate the right-hand side of an assignment of `count` values.
    fn rhs_values(&mut self, count: usize, values: &[Expr], span: Span) -> Vec<Operand> {
        if values.len() == count {
            return values.iter().map(|v| self.single(v)).collect();
        }

        if values.len() == 1 && count > 1 {
            let operand = self.expr(&values[0]);
            match operand {
                Operand::Value {
                    ty: Type::Tuple(types),
                    ..
                } => {
                    if types.len() == count {
                        return types.into_iter().map(Operand::value).collect();
                    }
                    self.error(
                        format!(
                            "assignment mismatch: {} variables but {} returns {} values",
                            count,
                            describe(&values[0]),
                            types.len()
                        ),
                        span,
                    );
                }
                Operand::Value {
                    ty,
                    comma_ok: true,
                    ..
                } if count == 2 => {
                    return vec![Operand::value(ty), Operand::value(Type::Untyped(UntypedKind::Bool))];
                }
                Operand::Value {
                    ty: Type::Opaque, ..
                } => return (0..count).map(|_| Operand::value(Type::Opaque)).collect(),
                Operand::Invalid => {}
                _ => self.error(
                    format!("assignment mismatch: {} variables but 1 value", count),
                    span,
                ),
            }
            return (0..count).map(|_| Operand::Invalid).collect();
        }

        for value in values {
            self.single(value);
        }
        self.error(
            format!(
                "assignment mismatch: {} variables but {} values",
                count,
                values.len()
            ),
            span,
        );
        (0..count).map(|_| Operand::Invalid).collect()
    }

    /// Report an error unless `operand` may be assigned to `target`.
    fn assign_to(&mut self, operand: &Operand, target: &Type, context: &str, span: Span) {
        let Some(ty) = operand.ty() else { return };

        if !self.types.assignable(&ty, target) {
            let mut message = format!("cannot use value of type {} as {} value in {}", ty, target, context);
            if let Some(reason) = self.types.missing_method(&ty, target) {
                message.push_str(&format!(": {} does not implement {} ({})", ty, target, reason));
            }
            self.error(message, span);
            return;
        }

        if let (Type::Untyped(_), Some(value), Some(kind)) = (
            &ty,
            operand.const_value(),
            self.types.underlying_basic(target),
        ) {
            self.check_representable(value, kind, target, span);
        }
    }

    fn check_representable(&mut self, value: &ConstValue, kind: BasicKind, target: &Type, span: Span) {
        if value.representable(kind) {
            return;
        }
        let message = match value {
            ConstValue::Float(f) if kind.is_integer() && f.fract() != 0.0 => {
                format!("constant {} truncated to integer", value)
            }
            ConstValue::Int(_) | ConstValue::Float(_) => {
                format!("constant {} overflows {}", value, target)
            }
            _ => format!("cannot use {} as {} value", value, target),
        };
        self.error(message, span);
    }

    // Statements

    fn block(&mut self, block: &Block) {
        self.scopes.push(HashMap::new());
        for stmt in &block.stmts {
            self.stmt(stmt);
        }
        self.scopes.pop();
    }

    fn stmt(&mut self, stmt: &Stmt) {
        match &stmt.kind {
            StmtKind::Decl(decl) => self.local_decl(decl),
            StmtKind::Expr(expr) => {
                let operand = self.expr(expr);
                let is_call = matches!(expr, Expr::Call { .. });
                match operand {
                    Operand::Invalid | Operand::NoValue => {}
                    _ if is_call && !is_conversion(expr, self) => {}
                    _ => self.error(format!("{} is not used", describe(expr)), expr.span()),
                }
            }
            StmtKind::ShortVar { names, values } => {
                let operands = self.rhs_values(names.len(), values, stmt.span);

                let scope = self.scopes.last();
                let any_new = names.iter().any(|n| {
                    !n.is_blank() && !scope.is_some_and(|s| s.contains_key(&n.name))
                });
                if !any_new {
                    self.error("no new variables on left side of :=", stmt.span);
                }

                let mut seen = HashSet::new();
                for (name, operand) in names.iter().zip(operands) {
                    if name.is_blank() {
                        continue;
                    }
                    if !seen.insert(name.name.clone()) {
                        self.error(format!("{} repeated on left side of :=", name.name), name.span);
                        continue;
                    }
                    let existing = self
                        .scopes
                        .last()
                        .and_then(|s| s.get(&name.name))
                        .cloned();
                    match existing {
                        Some(Object::Var(ty)) => {
                            self.assign_to(&operand, &ty, "assignment", name.span)
                        }
                        Some(_) => self.error(
                            format!("cannot assign to {}", name.name),
                            name.span,
                        ),
                        None => {
                            let ty = self.inferred_type(&operand, name.span);
                            self.declare(name, Object::Var(ty));
                        }
                    }
                }
            }
            StmtKind::Assign { lhs, op, rhs } => match op.binary() {
                None => {
                    let operands = self.rhs_values(lhs.len(), rhs, stmt.span);
                    for (target, operand) in lhs.iter().zip(operands) {
                        match self.lhs_type(target) {
                            Some(ty) => self.assign_to(&operand, &ty, "assignment", target.span()),
                            None => {
                                if let Some(Type::Untyped(UntypedKind::Nil)) = operand.ty() {
                                    self.error("use of untyped nil in assignment", target.span());
                                }
                            }
                        }
                    }
                }
                Some(binary) => {
                    if lhs.len() != 1 || rhs.len() != 1 {
                        self.error(
                            format!("assignment operation {} requires single-valued expressions", op.as_str()),
                            stmt.span,
                        );
                        return;
                    }
                    let Some(target) = self.lhs_type(&lhs[0]) else {
                        self.error("cannot use _ as value", lhs[0].span());
                        return;
                    };
                    let result = self.binary(binary, &lhs[0], &rhs[0], stmt.span);
                    self.assign_to(&result, &target, "assignment", stmt.span);
                }
            },
            StmtKind::IncDec { expr, inc } => {
                if let Some(ty) = self.lhs_type(expr)
                    && !ty.is_lenient()
                    && !self.types.underlying_basic(&ty).is_some_and(|k| k.is_numeric())
                {
                    let op = if *inc { "++" } else { "--" };
                    self.error(
                        format!("invalid operation: {}{} (non-numeric type {})", describe(expr), op, ty),
                        expr.span(),
                    );
                }
            }
            StmtKind::Return(values) => self.return_stmt(values, stmt.span),
            StmtKind::If(if_stmt) => self.if_stmt(if_stmt),
            StmtKind::For {
                init,
                cond,
                post,
                body,
            } => {
                self.scopes.push(HashMap::new());
                if let Some(init) = init {
                    self.stmt(init);
                }
                if let Some(cond) = cond {
                    self.condition(cond, "for");
                }
                if let Some(post) = post {
                    if matches!(post.kind, StmtKind::ShortVar { .. }) {
                        self.error("cannot declare in post statement of for loop", post.span);
                    }
                    self.stmt(post);
                }
                self.block(body);
                self.scopes.pop();
            }
            StmtKind::Range {
                key,
                value,
                define,
                expr,
                body,
            } => self.range_stmt(key.as_ref(), value.as_ref(), *define, expr, body),
            StmtKind::Switch {
                init,
                tag,
                clauses,
                ..
            } => {
                self.scopes.push(HashMap::new());
                if let Some(init) = init {
                    self.stmt(init);
                }
                let tag_ty = tag.as_ref().map(|tag| {
                    let operand = self.single(tag);
                    self.inferred_type(&operand, tag.span())
                });

                let mut has_default = false;
                for clause in clauses {
                    match &clause.exprs {
                        None => {
                            if has_default {
                                self.error("multiple defaults in switch", clause.span);
                            }
                            has_default = true;
                        }
                        Some(exprs) => {
                            for expr in exprs {
                                self.case_expr(expr, tag_ty.as_ref());
                            }
                        }
                    }
                    self.scopes.push(HashMap::new());
                    for stmt in &clause.body {
                        self.stmt(stmt);
                    }
                    self.scopes.pop();
                }
                self.scopes.pop();
            }
            StmtKind::Branch(_) | StmtKind::Empty => {}
            StmtKind::Block(block) => self.block(block),
            StmtKind::Go(expr) | StmtKind::Defer(expr) => {
                let keyword = if matches!(stmt.kind, StmtKind::Go(_)) {
                    "go"
                } else {
                    "defer"
                };
                if !matches!(expr, Expr::Call { .. }) {
                    self.error(format!("expression in {} must be function call", keyword), expr.span());
                }
                self.expr(expr);
            }
        }
    }

    fn local_decl(&mut self, decl: &GenDecl) {
        let mut source: Option<&ValueSpec> = None;
        for spec in &decl.specs {
            match spec {
                Spec::Type(spec) => {
                    self.type_decl(spec, false);
                }
                Spec::Value(spec) => {
                    let src = if decl.keyword == DeclKeyword::Const {
                        if !spec.values.is_empty() || spec.ty.is_some() {
                            source = Some(spec);
                            spec
                        } else if let Some(previous) = source {
                            previous
                        } else {
                            self.error("missing init expr for const declaration", spec.span);
                            spec
                        }
                    } else {
                        spec
                    };

                    let saved = self.iota;
                    if decl.keyword == DeclKeyword::Const {
                        self.iota = Some(spec.iota as i128);
                    }
                    let declared = src.ty.as_ref().map(|ty| self.resolve_type(ty));
                    let objects =
                        self.value_objects(decl.keyword, &spec.names, declared, &src.values, spec.span);
                    self.iota = saved;

                    for (name, object) in spec.names.iter().zip(objects) {
                        self.declare(name, object);
                    }
                }
            }
        }
    }

    /// Type of an assignment target; `None` for the blank identifier.
    fn lhs_type(&mut self, expr: &Expr) -> Option<Type> {
        if let Expr::Ident(ident) = expr
            && ident.is_blank()
        {
            return None;
        }

        let operand = self.expr(expr);
        match operand {
            Operand::Value {
                ty,
                addressable: true,
                ..
            } => Some(ty),
            Operand::Value {
                ty, comma_ok: true, ..
            } if matches!(expr, Expr::Index { .. }) => Some(ty),
            Operand::Value { ty, .. } if ty.is_lenient() => Some(ty),
            Operand::Invalid => Some(Type::Invalid),
            _ => {
                self.error(
                    format!(
                        "cannot assign to {} (neither addressable nor a map index expression)",
                        describe(expr)
                    ),
                    expr.span(),
                );
                Some(Type::Invalid)
            }
        }
    }

    fn return_stmt(&mut self, values: &[Expr], span: Span) {
        let results = self.results.last().cloned().unwrap_or_default();

        if values.is_empty() {
            let named = self.named_results.last().copied().unwrap_or(false);
            if !results.is_empty() && !named {
                self.error("not enough return values\n\thave ()", span);
            }
            return;
        }

        if results.is_empty() {
            for value in values {
                self.expr(value);
            }
            self.error("too many return values", span);
            return;
        }

        let operands = if values.len() == 1 && results.len() > 1 {
            match self.expr(&values[0]) {
                Operand::Value {
                    ty: Type::Tuple(types),
                    ..
                } => types.into_iter().map(Operand::value).collect(),
                Operand::Value {
                    ty: Type::Opaque, ..
                } => return,
                Operand::Invalid => return,
                _ => {
                    self.error("not enough return values", span);
                    return;
                }
            }
        } else {
            values.iter().map(|v| self.single(v)).collect::<Vec<_>>()
        };

        if operands.len() < results.len() {
            self.error("not enough return values", span);
        } else if operands.len() > results.len() {
            self.error("too many return values", span);
        } else {
            for (operand, result) in operands.iter().zip(&results) {
                self.assign_to(operand, result, "return statement", span);
            }
        }
    }

    fn if_stmt(&mut self, if_stmt: &IfStmt) {
        self.scopes.push(HashMap::new());
        if let Some(init) = &if_stmt.init {
            self.stmt(init);
        }
        self.condition(&if_stmt.cond, "if");
        self.block(&if_stmt.then);
        match if_stmt.els.as_deref() {
            Some(Else::If(nested)) => self.if_stmt(nested),
            Some(Else::Block(block)) => self.block(block),
            None => {}
        }
        self.scopes.pop();
    }

    fn condition(&mut self, cond: &Expr, keyword: &str) {
        let operand = self.single(cond);
        if let Some(ty) = operand.ty()
            && !self.is_boolean(&ty)
        {
            self.error(
                format!("non-boolean condition in {} statement", keyword),
                cond.span(),
            );
        }
    }

    fn is_boolean(&self, ty: &Type) -> bool {
        ty.is_lenient()
            || *ty == Type::Untyped(UntypedKind::Bool)
            || self.types.underlying_basic(ty) == Some(BasicKind::Bool)
    }

    fn range_stmt(
        &mut self,
        key: Option<&Expr>,
        value: Option<&Expr>,
        define: bool,
        expr: &Expr,
        body: &Block,
    ) {
        let operand = self.single(expr);
        let ty = operand.ty().unwrap_or(Type::Invalid);
        let int = Type::Basic(BasicKind::Int);

        let (key_ty, value_ty) = match self.types.underlying(&ty) {
            Type::Basic(BasicKind::String) | Type::Untyped(UntypedKind::String) => {
                (int, Some(Type::Basic(BasicKind::Int32)))
            }
            Type::Slice(elem) | Type::Array(_, elem) => (int, Some(*elem)),
            Type::Pointer(inner) => match self.types.underlying(&inner) {
                Type::Array(_, elem) => (int, Some(*elem)),
                _ => {
                    self.error(format!("cannot range over value of type {}", ty), expr.span());
                    (Type::Invalid, Some(Type::Invalid))
                }
            },
            Type::Map(k, v) => (*k, Some(*v)),
            Type::Basic(kind) if kind.is_integer() => (ty.clone(), None),
            Type::Untyped(UntypedKind::Int | UntypedKind::Rune) => (int, None),
            Type::Opaque => (Type::Opaque, Some(Type::Opaque)),
            Type::Invalid => (Type::Invalid, Some(Type::Invalid)),
            _ => {
                self.error(format!("cannot range over value of type {}", ty), expr.span());
                (Type::Invalid, Some(Type::Invalid))
            }
        };

        if value.is_some() && value_ty.is_none() {
            self.error(
                format!("range over {} permits only one iteration variable", ty),
                expr.span(),
            );
        }

        self.scopes.push(HashMap::new());
        let targets = [(key, Some(key_ty)), (value, value_ty)];
        for (target, ty) in targets {
            let Some(target) = target else { continue };
            let ty = ty.unwrap_or(Type::Invalid);
            if define {
                match target {
                    Expr::Ident(name) => self.declare(name, Object::Var(ty)),
                    other => self.error("non-name on left side of :=", other.span()),
                }
            } else if let Some(target_ty) = self.lhs_type(target) {
                self.assign_to(&Operand::value(ty), &target_ty, "range", target.span());
            }
        }
        self.block(body);
        self.scopes.pop();
    }

    fn case_expr(&mut self, expr: &Expr, tag: Option<&Type>) {
        let operand = self.single(expr);
        let Some(ty) = operand.ty() else { return };

        match tag {
            Some(tag) => {
                let compatible = self.types.assignable(&ty, tag) || self.types.assignable(tag, &ty);
                if !compatible {
                    self.error(
                        format!(
                            "invalid case {} in switch (mismatched types {} and {})",
                            describe(expr),
                            ty,
                            tag
                        ),
                        expr.span(),
                    );
                } else {
                    self.assign_to(&operand, tag, "switch case", expr.span());
                }
            }
            None => {
                if !self.is_boolean(&ty) {
                    self.error(
                        format!("invalid case {} in switch (mismatched types {} and bool)", describe(expr), ty),
                        expr.span(),
                    );
                }
            }
        }
    }

    // Expressions

    /// Evaluate an expression that must produce exactly one value.
    fn single(&mut self, expr: &Expr) -> Operand {
        let operand = self.expr(expr);
        self.require_value(operand, expr)
    }

    fn require_value(&mut self, operand: Operand, expr: &Expr) -> Operand {
        let message = match &operand {
            Operand::Value {
                ty: Type::Tuple(types),
                ..
            } => format!(
                "multiple-value {} (value of type {}) in single-value context",
                describe(expr),
                Type::Tuple(types.clone())
            ),
            Operand::Value { .. } | Operand::Const { .. } | Operand::Invalid => return operand,
            Operand::NoValue => format!("{} (no value) used as value", describe(expr)),
            Operand::Type(ty) => format!("{} (type) is not an expression", ty),
            Operand::Builtin(builtin) => {
                format!("{} (built-in function) must be called", builtin.name())
            }
            Operand::Package(path) => format!("use of package {} without selector", path),
        };
        self.error(message, expr.span());
        Operand::Invalid
    }

    fn expr(&mut self, expr: &Expr) -> Operand {
        match expr {
            Expr::Ident(ident) => self.ident(ident),
            Expr::BasicLit { kind, value, span } => self.basic_lit(*kind, value, *span),
            Expr::Composite {
                ty, elems, span, ..
            } => self.composite(ty.as_ref(), elems, None, *span),
            Expr::FuncLit { sig, body } => {
                let (signature, bindings) = self.signature(sig);
                self.scopes.push(HashMap::new());
                for (name, ty) in &bindings {
                    self.declare(name, Object::Var(ty.clone()));
                }
                self.results.push(signature.results.clone());
                self.named_results.push(has_named_results(sig));
                for stmt in &body.stmts {
                    self.stmt(stmt);
                }
                if !signature.results.is_empty() && !block_terminates(body) {
                    self.error("missing return", block_end(body));
                }
                self.named_results.pop();
                self.results.pop();
                self.scopes.pop();
                Operand::value(Type::Func(signature))
            }
            Expr::Paren { inner, .. } => self.expr(inner),
            Expr::Selector { expr, sel } => self.selector(expr, sel),
            Expr::Index { expr, index, span } => self.index(expr, index, *span),
            Expr::Slice {
                expr,
                low,
                high,
                max,
                span,
            } => self.slice_expr(expr, [low, high, max], *span),
            Expr::TypeAssert { expr, ty, span } => {
                let operand = self.single(expr);
                let target = self.resolve_type(ty);
                let Some(base) = operand.ty() else {
                    return Operand::Invalid;
                };
                if base.is_lenient() {
                    return Operand::Value {
                        ty: target,
                        addressable: false,
                        comma_ok: true,
                    };
                }
                if !self.types.is_interface(&base) {
                    self.error(
                        format!("invalid operation: {} is not an interface", describe(expr)),
                        *span,
                    );
                    return Operand::Invalid;
                }
                if !self.types.is_interface(&target)
                    && let Some(reason) = self.types.missing_method(&target, &base)
                {
                    self.error(
                        format!(
                            "impossible type assertion: {} does not implement {} ({})",
                            target, base, reason
                        ),
                        *span,
                    );
                }
                Operand::Value {
                    ty: target,
                    addressable: false,
                    comma_ok: true,
                }
            }
            Expr::Call {
                func,
                args,
                ellipsis,
                span,
                ..
            } => self.call(func, args, *ellipsis, *span),
            Expr::Unary { op, expr, span } => self.unary(*op, expr, *span),
            Expr::Binary {
                op,
                left,
                right,
                span,
            } => self.binary(*op, left, right, *span),
            Expr::Type(ty) => Operand::Type(self.resolve_type(ty)),
        }
    }

    fn ident(&mut self, ident: &Ident) -> Operand {
        if ident.is_blank() {
            self.error("cannot use _ as value", ident.span);
            return Operand::Invalid;
        }
        match self.lookup(&ident.name) {
            Some(object) => object_operand(object),
            None => {
                self.error(format!("undefined: {}", ident.name), ident.span);
                Operand::Invalid
            }
        }
    }

    fn basic_lit(&mut self, kind: LitKind, text: &str, span: Span) -> Operand {
        let (untyped, value) = match kind {
            LitKind::Int => (UntypedKind::Int, int_literal(text).map(ConstValue::Int)),
            LitKind::Float => (UntypedKind::Float, float_literal(text).map(ConstValue::Float)),
            LitKind::Rune => (UntypedKind::Rune, rune_literal(text).map(ConstValue::Int)),
            LitKind::Str => (UntypedKind::String, unquote(text).map(ConstValue::Str)),
        };
        if value.is_none() {
            self.error(format!("invalid literal {}", text), span);
        }
        Operand::Const {
            ty: Type::Untyped(untyped),
            value,
        }
    }

    fn composite(
        &mut self,
        ty: Option<&TypeExpr>,
        elems: &[Element],
        expected: Option<&Type>,
        span: Span,
    ) -> Operand {
        let mut pointer = false;
        let ty = match ty {
            Some(TypeExpr::Array {
                len: None, elem, ..
            }) => {
                let elem = self.resolve_type(elem);
                let len = self.sequence_elems(elems, &elem, None);
                return Operand::value(Type::Array(len, Box::new(elem)));
            }
            Some(ty) => self.resolve_type(ty),
            None => match expected {
                Some(expected) => match self.types.underlying(expected) {
                    Type::Pointer(elem) => {
                        pointer = true;
                        *elem
                    }
                    _ => expected.clone(),
                },
                None => {
                    self.error("invalid composite literal type: missing type", span);
                    return Operand::Invalid;
                }
            },
        };

        match self.types.underlying(&ty) {
            Type::Struct(fields) => self.struct_elems(&ty, &fields, elems, span),
            Type::Array(len, elem) => {
                self.sequence_elems(elems, &elem, Some(len));
            }
            Type::Slice(elem) => {
                self.sequence_elems(elems, &elem, None);
            }
            Type::Map(key, value) => {
                for elem in elems {
                    match &elem.key {
                        Some(key_expr) => self.element(key_expr, &key, "map literal"),
                        None => self.error("missing key in map literal", elem.value.span()),
                    }
                    self.element(&elem.value, &value, "map literal");
                }
            }
            Type::Opaque | Type::Invalid => {
                for elem in elems {
                    if let Some(key) = &elem.key
                        && !matches!(key, Expr::Ident(_))
                    {
                        self.expr(key);
                    }
                    self.element(&elem.value, &Type::Opaque, "composite literal");
                }
            }
            other => {
                self.error(format!("invalid composite literal type {}", other), span);
                return Operand::Invalid;
            }
        }

        if pointer {
            Operand::value(Type::pointer(ty))
        } else {
            Operand::value(ty)
        }
    }

    fn struct_elems(&mut self, ty: &Type, fields: &[Field], elems: &[Element], span: Span) {
        if elems.is_empty() {
            return;
        }

        let keyed = elems[0].key.is_some();
        if elems.iter().any(|e| e.key.is_some() != keyed) {
            self.error("mixture of field:value and value elements in struct literal", span);
            return;
        }

        if keyed {
            let mut seen = HashSet::new();
            for elem in elems {
                let Some(Expr::Ident(name)) = &elem.key else {
                    let key_span = elem.key.as_ref().map(Expr::span).unwrap_or(span);
                    self.error("invalid field name in struct literal", key_span);
                    continue;
                };
                let Some(field) = fields.iter().find(|f| f.name == name.name) else {
                    self.error(
                        format!("unknown field {} in struct literal of type {}", name.name, ty),
                        name.span,
                    );
                    self.expr_ignored(&elem.value);
                    continue;
                };
                if !seen.insert(name.name.clone()) {
                    self.error(
                        format!("duplicate field name {} in struct literal", name.name),
                        name.span,
                    );
                }
                let field_ty = field.ty.clone();
                self.element(&elem.value, &field_ty, "struct literal");
            }
            return;
        }

        if elems.len() < fields.len() {
            self.error(format!("too few values in struct literal of type {}", ty), span);
        } else if elems.len() > fields.len() {
            self.error(format!("too many values in struct literal of type {}", ty), span);
        }
        for (elem, field) in elems.iter().zip(fields) {
            self.element(&elem.value, &field.ty, "struct literal");
        }
    }

    /// Check array or slice elements; returns the literal's length.
    fn sequence_elems(&mut self, elems: &[Element], elem_ty: &Type, bound: Option<u64>) -> u64 {
        let mut index: u64 = 0;
        let mut max: u64 = 0;
        let mut seen = HashSet::new();

        for elem in elems {
            if let Some(key) = &elem.key {
                let operand = self.single(key);
                match operand.const_value().and_then(ConstValue::as_int) {
                    Some(n) if n >= 0 => index = n as u64,
                    _ => {
                        self.error("index must be non-negative integer constant", key.span());
                    }
                }
            }
            if let Some(bound) = bound
                && index >= bound
            {
                self.error(
                    format!("index {} out of bounds [0:{}]", index, bound),
                    elem.value.span(),
                );
            }
            if !seen.insert(index) {
                self.error(
                    format!("duplicate index {} in array or slice literal", index),
                    elem.value.span(),
                );
            }
            self.element(&elem.value, elem_ty, "array or slice literal");
            index += 1;
            max = max.max(index);
        }

        max
    }

    fn element(&mut self, value: &Expr, expected: &Type, context: &str) {
        if let Expr::Composite {
            ty: None,
            elems,
            span,
            ..
        } = value
        {
            self.composite(None, elems, Some(expected), *span);
            return;
        }
        let operand = self.single(value);
        self.assign_to(&operand, expected, context, value.span());
    }

    fn expr_ignored(&mut self, expr: &Expr) {
        if let Expr::Composite { ty: None, .. } = expr {
            return;
        }
        self.expr(expr);
    }

    fn selector(&mut self, base: &Expr, sel: &Ident) -> Operand {
        let operand = self.expr(base);

        match operand {
            Operand::Invalid => Operand::Invalid,
            Operand::Package(path) => match self.package_member(&path, sel) {
                Some(object) => object_operand(object),
                None => Operand::Invalid,
            },
            Operand::Type(ty) => match self.types.lookup(&ty, &sel.name) {
                Some(Selection::Method(sig)) => {
                    let mut params = vec![ty];
                    params.extend(sig.params);
                    Operand::value(Type::Func(Signature {
                        params,
                        results: sig.results,
                        variadic: sig.variadic,
                    }))
                }
                Some(Selection::Opaque) => Operand::value(Type::Opaque),
                _ if ty.is_lenient() => Operand::value(ty),
                _ => {
                    self.error(
                        format!("{}.{} undefined (type {} has no method {})", ty, sel.name, ty, sel.name),
                        sel.span,
                    );
                    Operand::Invalid
                }
            },
            Operand::Value {
                ty, addressable, ..
            } if !matches!(ty, Type::Tuple(_)) => self.field_or_method(&ty, addressable, base, sel),
            Operand::Const { ty, .. } => self.field_or_method(&ty, false, base, sel),
            other => {
                self.require_value(other, base);
                Operand::Invalid
            }
        }
    }

    fn field_or_method(&mut self, ty: &Type, addressable: bool, base: &Expr, sel: &Ident) -> Operand {
        if ty.is_lenient() {
            return Operand::value(ty.clone());
        }

        if !sel.is_exported() && let Some(package) = self.declaring_package(ty)
            && package != self.path
        {
            self.error(
                format!(
                    "{}.{} undefined (cannot refer to unexported field or method {})",
                    describe(base),
                    sel.name,
                    sel.name
                ),
                sel.span,
            );
            return Operand::Invalid;
        }

        match self.types.lookup(ty, &sel.name) {
            Some(Selection::Field(field)) => Operand::Value {
                ty: field,
                addressable: addressable || matches!(ty, Type::Pointer(_)),
                comma_ok: false,
            },
            Some(Selection::Method(sig)) => Operand::value(Type::Func(sig)),
            Some(Selection::Opaque) => Operand::value(Type::Opaque),
            None => {
                self.error(
                    format!(
                        "{}.{} undefined (type {} has no field or method {})",
                        describe(base),
                        sel.name,
                        ty,
                        sel.name
                    ),
                    sel.span,
                );
                Operand::Invalid
            }
        }
    }

    fn declaring_package(&self, ty: &Type) -> Option<String> {
        let named = match ty {
            Type::Named(named) => named,
            Type::Pointer(elem) => match elem.as_ref() {
                Type::Named(named) => named,
                _ => return None,
            },
            _ => return None,
        };
        let package = &self.types.info(named.id).package;
        (!package.is_empty()).then(|| package.clone())
    }

    fn index(&mut self, base: &Expr, index: &Expr, span: Span) -> Operand {
        let operand = self.single(base);
        let Some(ty) = operand.ty() else {
            return Operand::Invalid;
        };
        let addressable = matches!(operand, Operand::Value { addressable: true, .. });

        match self.types.underlying(&ty) {
            Type::Opaque | Type::Invalid => {
                self.single(index);
                Operand::value(ty)
            }
            Type::Basic(BasicKind::String) | Type::Untyped(UntypedKind::String) => {
                self.check_index(index);
                Operand::value(Type::Basic(BasicKind::Uint8))
            }
            Type::Slice(elem) => {
                self.check_index(index);
                Operand::variable(*elem)
            }
            Type::Array(len, elem) => {
                if let Some(n) = self.check_index(index)
                    && n >= len as i128
                {
                    self.error(
                        format!("invalid argument: index {} out of bounds [0:{}]", n, len),
                        index.span(),
                    );
                }
                Operand::Value {
                    ty: *elem,
                    addressable,
                    comma_ok: false,
                }
            }
            Type::Pointer(inner) => match self.types.underlying(&inner) {
                Type::Array(_, elem) => {
                    self.check_index(index);
                    Operand::variable(*elem)
                }
                _ => {
                    self.error(format!("invalid operation: cannot index {}", describe(base)), span);
                    Operand::Invalid
                }
            },
            Type::Map(key, value) => {
                self.element(index, &key, "map index");
                Operand::Value {
                    ty: *value,
                    addressable: false,
                    comma_ok: true,
                }
            }
            _ => {
                self.error(
                    format!("invalid operation: cannot index {} (value of type {})", describe(base), ty),
                    span,
                );
                self.single(index);
                Operand::Invalid
            }
        }
    }

    /// Check an index operand, returning its value when constant.
    fn check_index(&mut self, index: &Expr) -> Option<i128> {
        let operand = self.single(index);
        let ty = operand.ty()?;
        let integer = match &ty {
            Type::Untyped(UntypedKind::Int | UntypedKind::Rune) => true,
            Type::Untyped(UntypedKind::Float) => operand.const_value().and_then(ConstValue::as_int).is_some(),
            ty if ty.is_lenient() => true,
            ty => self.types.underlying_basic(ty).is_some_and(|k| k.is_integer()),
        };
        if !integer {
            self.error(
                format!("invalid argument: index {} (value of type {}) must be integer", describe(index), ty),
                index.span(),
            );
            return None;
        }
        let value = operand.const_value().and_then(ConstValue::as_int)?;
        if value < 0 {
            self.error(
                format!("invalid argument: index {} must not be negative", describe(index)),
                index.span(),
            );
            return None;
        }
        Some(value)
    }

    fn slice_expr(&mut self, base: &Expr, indices: [&Option<Box<Expr>>; 3], span: Span) -> Operand {
        let operand = self.single(base);
        let Some(ty) = operand.ty() else {
            return Operand::Invalid;
        };
        let addressable = matches!(operand, Operand::Value { addressable: true, .. });

        for index in indices.iter().copied().flatten() {
            self.check_index(index);
        }

        match self.types.underlying(&ty) {
            Type::Opaque | Type::Invalid => Operand::value(ty),
            Type::Basic(BasicKind::String) | Type::Untyped(UntypedKind::String) => {
                if indices[2].is_some() {
                    self.error("invalid operation: 3-index slice of string", span);
                }
                Operand::value(ty.defaulted())
            }
            Type::Slice(_) => Operand::value(ty),
            Type::Array(_, elem) => {
                if !addressable {
                    self.error(
                        format!("invalid operation: {} (slice of unaddressable value)", describe(base)),
                        span,
                    );
                }
                Operand::value(Type::Slice(elem))
            }
            Type::Pointer(inner) => match self.types.underlying(&inner) {
                Type::Array(_, elem) => Operand::value(Type::Slice(elem)),
                _ => {
                    self.error(format!("cannot slice {} (value of type {})", describe(base), ty), span);
                    Operand::Invalid
                }
            },
            _ => {
                self.error(format!("cannot slice {} (value of type {})", describe(base), ty), span);
                Operand::Invalid
            }
        }
    }

    fn call(&mut self, func: &Expr, args: &[Expr], ellipsis: bool, span: Span) -> Operand {
        let callee = self.expr(func);

        match callee {
            Operand::Invalid => {
                for arg in args {
                    self.expr(arg);
                }
                Operand::Invalid
            }
            Operand::Type(target) => self.conversion(&target, args, span),
            Operand::Builtin(builtin) => self.builtin(builtin, args, ellipsis, span),
            Operand::Value { ref ty, .. } | Operand::Const { ref ty, .. } => {
                let ty = ty.clone();
                match self.types.underlying(&ty) {
                    Type::Func(sig) => {
                        self.call_args(&sig, func, args, ellipsis, span);
                        match sig.results.len() {
                            0 => Operand::NoValue,
                            1 => Operand::value(sig.results[0].clone()),
                            _ => Operand::value(Type::Tuple(sig.results)),
                        }
                    }
                    Type::Opaque => {
                        for arg in args {
                            self.expr(arg);
                        }
                        Operand::value(Type::Opaque)
                    }
                    Type::Invalid => Operand::Invalid,
                    _ => {
                        self.error(
                            format!(
                                "invalid operation: cannot call non-function {} (value of type {})",
                                describe(func),
                                ty
                            ),
                            span,
                        );
                        Operand::Invalid
                    }
                }
            }
            other => {
                self.require_value(other, func);
                Operand::Invalid
            }
        }
    }

    fn call_args(&mut self, sig: &Signature, func: &Expr, args: &[Expr], ellipsis: bool, span: Span) {
        let operands: Vec<Operand> = if args.len() == 1 && !ellipsis && sig.params.len() != 1 {
            match self.expr(&args[0]) {
                Operand::Value {
                    ty: Type::Tuple(types),
                    ..
                } => types.into_iter().map(Operand::value).collect(),
                Operand::Value {
                    ty: Type::Opaque, ..
                } => return,
                other => vec![self.require_value(other, &args[0])],
            }
        } else {
            args.iter().map(|a| self.single(a)).collect()
        };

        let name = describe(func);
        let params = &sig.params;

        if ellipsis && !sig.variadic {
            self.error(
                format!("have (...) arguments but {} is not variadic", name),
                span,
            );
            return;
        }

        if sig.variadic && !ellipsis {
            let fixed = params.len() - 1;
            if operands.len() < fixed {
                self.error(format!("not enough arguments in call to {}", name), span);
                return;
            }
            let elem = match params.last() {
                Some(Type::Slice(elem)) => elem.as_ref().clone(),
                _ => Type::Invalid,
            };
            for (i, operand) in operands.iter().enumerate() {
                let target = if i < fixed { &params[i] } else { &elem };
                let arg_span = args.get(i).map(Expr::span).unwrap_or(span);
                self.assign_to(operand, target, "argument", arg_span);
            }
            return;
        }

        if operands.len() < params.len() {
            self.error(format!("not enough arguments in call to {}", name), span);
            return;
        }
        if operands.len() > params.len() {
            self.error(format!("too many arguments in call to {}", name), span);
            return;
        }
        for (i, operand) in operands.iter().enumerate() {
            let arg_span = args.get(i).map(Expr::span).unwrap_or(span);
            self.assign_to(operand, &params[i], "argument", arg_span);
        }
    }

    fn conversion(&mut self, target: &Type, args: &[Expr], span: Span) -> Operand {
        if args.len() != 1 {
            for arg in args {
                self.expr(arg);
            }
            self.error(
                format!("wrong argument count in conversion to {}", target),
                span,
            );
            return Operand::Invalid;
        }

        let operand = self.single(&args[0]);
        let Some(from) = operand.ty() else {
            return Operand::Invalid;
        };

        if !self.types.convertible(&from, target) {
            self.error(
                format!("cannot convert {} (value of type {}) to type {}", describe(&args[0]), from, target),
                span,
            );
            return Operand::Invalid;
        }

        let basic = self.types.underlying_basic(target);
        match (operand.const_value(), basic) {
            (Some(value), Some(kind)) => {
                let converted = convert_const(value, kind);
                match &converted {
                    Some(v) if !v.representable(kind) => {
                        self.error(
                            format!("cannot convert {} (constant of type {}) to type {}", value, from, target),
                            span,
                        );
                    }
                    None => {
                        self.error(
                            format!("cannot convert {} (constant of type {}) to type {}", value, from, target),
                            span,
                        );
                    }
                    _ => {}
                }
                Operand::Const {
                    ty: target.clone(),
                    value: converted,
                }
            }
            _ => Operand::value(target.clone()),
        }
    }

    fn builtin(&mut self, builtin: Builtin, args: &[Expr], ellipsis: bool, span: Span) -> Operand {
        let name = builtin.name();
        let (min_args, max_args) = match builtin {
            Builtin::Len | Builtin::Cap | Builtin::New | Builtin::Panic => (1, Some(1)),
            Builtin::Append => (1, None),
            Builtin::Make => (1, Some(3)),
            Builtin::Delete | Builtin::Copy => (2, Some(2)),
            Builtin::Recover => (0, Some(0)),
            Builtin::Print | Builtin::Println => (0, None),
            Builtin::Min | Builtin::Max => (1, None),
        };

        if args.len() < min_args {
            self.error(format!("not enough arguments for {}()", name), span);
            return Operand::Invalid;
        }
        if max_args.is_some_and(|max| args.len() > max) {
            self.error(format!("too many arguments for {}()", name), span);
            return Operand::Invalid;
        }
        if ellipsis && builtin != Builtin::Append {
            self.error(format!("invalid use of ... with built-in {}", name), span);
            return Operand::Invalid;
        }

        let int = Type::Basic(BasicKind::Int);

        match builtin {
            Builtin::Len | Builtin::Cap => {
                let operand = self.single(&args[0]);
                let Some(ty) = operand.ty() else {
                    return Operand::Invalid;
                };
                let valid = match self.types.underlying(&ty) {
                    Type::Basic(BasicKind::String) | Type::Untyped(UntypedKind::String) => {
                        builtin == Builtin::Len
                    }
                    Type::Map(_, _) => builtin == Builtin::Len,
                    Type::Slice(_) | Type::Array(_, _) | Type::Opaque | Type::Invalid => true,
                    Type::Pointer(inner) => matches!(self.types.underlying(&inner), Type::Array(_, _)),
                    _ => false,
                };
                if !valid {
                    self.error(
                        format!("invalid argument: {} (value of type {}) for built-in {}", describe(&args[0]), ty, name),
                        args[0].span(),
                    );
                    return Operand::Invalid;
                }
                match operand.const_value() {
                    Some(ConstValue::Str(s)) => Operand::Const {
                        ty: int,
                        value: Some(ConstValue::Int(s.len() as i128)),
                    },
                    _ => Operand::value(int),
                }
            }
            Builtin::Append => {
                let operand = self.single(&args[0]);
                let Some(ty) = operand.ty() else {
                    return Operand::Invalid;
                };
                let elem = match self.types.underlying(&ty) {
                    Type::Slice(elem) => *elem,
                    Type::Opaque | Type::Invalid => {
                        for arg in &args[1..] {
                            self.expr(arg);
                        }
                        return Operand::value(ty);
                    }
                    _ => {
                        self.error(
                            format!("invalid argument: {} (variable of type {}) is not a slice", describe(&args[0]), ty),
                            args[0].span(),
                        );
                        return Operand::Invalid;
                    }
                };
                if ellipsis {
                    if args.len() != 2 {
                        self.error("can only use ... with final argument in list", span);
                        return Operand::value(ty);
                    }
                    let rest = self.single(&args[1]);
                    let bytes_from_string = self.types.underlying_basic(&elem) == Some(BasicKind::Uint8)
                        && rest.ty().is_some_and(|t| {
                            t == Type::Untyped(UntypedKind::String)
                                || self.types.underlying_basic(&t) == Some(BasicKind::String)
                        });
                    if !bytes_from_string {
                        self.assign_to(&rest, &Type::Slice(Box::new(elem)), "argument", args[1].span());
                    }
                } else {
                    for arg in &args[1..] {
                        self.element(arg, &elem, "argument");
                    }
                }
                Operand::value(ty)
            }
            Builtin::Make => {
                let ty = match self.expr(&args[0]) {
                    Operand::Type(ty) => ty,
                    Operand::Invalid => return Operand::Invalid,
                    _ => {
                        self.error(format!("{} is not a type", describe(&args[0])), args[0].span());
                        return Operand::Invalid;
                    }
                };
                let (min, max) = match self.types.underlying(&ty) {
                    Type::Slice(_) => (2, 3),
                    Type::Map(_, _) => (1, 2),
                    Type::Opaque | Type::Invalid => (1, 3),
                    _ => {
                        self.error(
                            format!("invalid argument: cannot make {}; type must be slice, map, or channel", ty),
                            args[0].span(),
                        );
                        return Operand::Invalid;
                    }
                };
                if args.len() < min {
                    self.error(format!("invalid operation: {}() expects {} or {} arguments; found {}", name, min, max, args.len()), span);
                } else if args.len() > max {
                    self.error(format!("invalid operation: {}() expects {} or {} arguments; found {}", name, min, max, args.len()), span);
                }
                for size in &args[1..] {
                    self.check_index(size);
                }
                Operand::value(ty)
            }
            Builtin::New => match self.expr(&args[0]) {
                Operand::Type(ty) => Operand::value(Type::pointer(ty)),
                Operand::Invalid => Operand::Invalid,
                _ => {
                    self.error(format!("{} is not a type", describe(&args[0])), args[0].span());
                    Operand::Invalid
                }
            },
            Builtin::Delete => {
                let map = self.single(&args[0]);
                let Some(ty) = map.ty() else {
                    return Operand::Invalid;
                };
                match self.types.underlying(&ty) {
                    Type::Map(key, _) => self.element(&args[1], &key, "argument to delete"),
                    Type::Opaque | Type::Invalid => {
                        self.single(&args[1]);
                    }
                    _ => {
                        self.error(
                            format!("invalid argument: {} (variable of type {}) is not a map", describe(&args[0]), ty),
                            args[0].span(),
                        );
                    }
                }
                Operand::NoValue
            }
            Builtin::Copy => {
                let dst = self.single(&args[0]);
                let src = self.single(&args[1]);
                if let (Some(dst_ty), Some(src_ty)) = (dst.ty(), src.ty())
                    && !dst_ty.is_lenient()
                    && !matches!(self.types.underlying(&dst_ty), Type::Slice(_))
                {
                    self.error(
                        format!("invalid argument: copy expects slice arguments; found {} and {}", dst_ty, src_ty),
                        span,
                    );
                }
                Operand::value(int)
            }
            Builtin::Panic => {
                let operand = self.single(&args[0]);
                self.assign_to(&operand, &Type::empty_interface(), "argument to panic", args[0].span());
                Operand::NoValue
            }
            Builtin::Recover => Operand::value(Type::empty_interface()),
            Builtin::Print | Builtin::Println => {
                for arg in args {
                    let operand = self.single(arg);
                    if let Some(Type::Untyped(UntypedKind::Nil)) = operand.ty() {
                        self.error("use of untyped nil in argument to built-in print", arg.span());
                    }
                }
                Operand::NoValue
            }
            Builtin::Min | Builtin::Max => {
                let mut result = self.single(&args[0]);
                for arg in &args[1..] {
                    let next = self.single(arg);
                    result = self.combine(BinaryOp::Lt, result, next, arg.span());
                    if matches!(result, Operand::Invalid) {
                        return Operand::Invalid;
                    }
                }
                if let Some(ty) = result.ty()
                    && !ty.is_lenient()
                    && !self.is_ordered(&ty)
                {
                    self.error(
                        format!("invalid argument: {} cannot be ordered", ty),
                        span,
                    );
                    return Operand::Invalid;
                }
                // The value of a constant min/max is not tracked.
                match result {
                    Operand::Const { ty, .. } => Operand::Const { ty, value: None },
                    other => other,
                }
            }
        }
    }

    fn is_ordered(&self, ty: &Type) -> bool {
        match ty {
            Type::Untyped(kind) => kind.is_numeric() || *kind == UntypedKind::String,
            ty => self.types.underlying_basic(ty).is_some_and(|k| k.is_ordered()),
        }
    }

    fn unary(&mut self, op: UnaryOp, expr: &Expr, span: Span) -> Operand {
        match op {
            UnaryOp::Addr => {
                if let Expr::Composite { .. } = strip_parens(expr) {
                    let operand = self.single(expr);
                    return match operand.ty() {
                        Some(ty) if !ty.is_invalid() => Operand::value(Type::pointer(ty)),
                        _ => Operand::Invalid,
                    };
                }
                match self.single(expr) {
                    Operand::Value {
                        ty,
                        addressable: true,
                        ..
                    } => Operand::value(Type::pointer(ty)),
                    Operand::Value { ty, .. } if ty.is_lenient() => Operand::value(ty),
                    Operand::Invalid => Operand::Invalid,
                    _ => {
                        self.error(
                            format!("invalid operation: cannot take address of {}", describe(expr)),
                            span,
                        );
                        Operand::Invalid
                    }
                }
            }
            UnaryOp::Deref => match self.expr(expr) {
                Operand::Type(ty) => Operand::Type(Type::pointer(ty)),
                Operand::Invalid => Operand::Invalid,
                other => {
                    let operand = self.require_value(other, expr);
                    let Some(ty) = operand.ty() else {
                        return Operand::Invalid;
                    };
                    match self.types.underlying(&ty) {
                        Type::Pointer(elem) => Operand::variable(*elem),
                        Type::Opaque => Operand::variable(Type::Opaque),
                        Type::Invalid => Operand::Invalid,
                        _ => {
                            self.error(
                                format!("invalid operation: cannot indirect {} (value of type {})", describe(expr), ty),
                                span,
                            );
                            Operand::Invalid
                        }
                    }
                }
            },
            UnaryOp::Not | UnaryOp::Neg | UnaryOp::Plus | UnaryOp::Xor => {
                let operand = self.single(expr);
                let Some(ty) = operand.ty() else {
                    return Operand::Invalid;
                };
                if ty.is_lenient() {
                    return Operand::value(ty);
                }

                let valid = match op {
                    UnaryOp::Not => self.is_boolean(&ty),
                    UnaryOp::Xor => match &ty {
                        Type::Untyped(kind) => matches!(kind, UntypedKind::Int | UntypedKind::Rune),
                        ty => self.types.underlying_basic(ty).is_some_and(|k| k.is_integer()),
                    },
                    _ => match &ty {
                        Type::Untyped(kind) => kind.is_numeric(),
                        ty => self.types.underlying_basic(ty).is_some_and(|k| k.is_numeric()),
                    },
                };
                if !valid {
                    self.error(
                        format!("invalid operation: operator {} not defined on {} (value of type {})", op.as_str(), describe(expr), ty),
                        span,
                    );
                    return Operand::Invalid;
                }

                let Operand::Const { value, .. } = operand else {
                    return Operand::value(ty);
                };
                let value = value.and_then(|v| fold_unary(op, &v, self.types.underlying_basic(&ty)));
                if let (Some(v), Some(kind)) = (&value, self.types.underlying_basic(&ty)) {
                    self.check_representable(v, kind, &ty, span);
                }
                Operand::Const { ty, value }
            }
        }
    }

    fn binary(&mut self, op: BinaryOp, left: &Expr, right: &Expr, span: Span) -> Operand {
        let lhs = self.single(left);
        let rhs = self.single(right);

        if matches!(op, BinaryOp::Shl | BinaryOp::Shr) {
            return self.shift(op, lhs, rhs, span);
        }

        let combined = self.combine(op, lhs.clone(), rhs.clone(), span);
        let Some(ty) = combined.ty() else {
            return Operand::Invalid;
        };
        if ty.is_invalid() {
            return Operand::Invalid;
        }

        if op.is_comparison() {
            let lhs_ty = lhs.ty().unwrap_or(Type::Invalid);
            let rhs_ty = rhs.ty().unwrap_or(Type::Invalid);
            let nil_compare = lhs_ty == Type::Untyped(UntypedKind::Nil) || rhs_ty == Type::Untyped(UntypedKind::Nil);

            let valid = match op {
                BinaryOp::Eq | BinaryOp::Ne => {
                    ty.is_lenient() || nil_compare || self.types.comparable(&ty)
                }
                _ => ty.is_lenient() || self.is_ordered(&ty),
            };
            if !valid {
                self.error(
                    format!("invalid operation: operator {} not defined on {} (value of type {})", op.as_str(), describe(left), ty),
                    span,
                );
                return Operand::Invalid;
            }

            let result = Type::Untyped(UntypedKind::Bool);
            return match (lhs.const_value(), rhs.const_value()) {
                (Some(a), Some(b)) => Operand::Const {
                    ty: result,
                    value: fold_binary(op, a, b, false),
                },
                _ => Operand::value(result),
            };
        }

        if ty.is_lenient() {
            return Operand::value(ty);
        }

        let valid = match op {
            BinaryOp::LogAnd | BinaryOp::LogOr => self.is_boolean(&ty),
            BinaryOp::Add => match &ty {
                Type::Untyped(kind) => kind.is_numeric() || *kind == UntypedKind::String,
                ty => self.types.underlying_basic(ty).is_some_and(|k| k.is_ordered()),
            },
            BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div => match &ty {
                Type::Untyped(kind) => kind.is_numeric(),
                ty => self.types.underlying_basic(ty).is_some_and(|k| k.is_numeric()),
            },
            _ => match &ty {
                Type::Untyped(kind) => matches!(kind, UntypedKind::Int | UntypedKind::Rune),
                ty => self.types.underlying_basic(ty).is_some_and(|k| k.is_integer()),
            },
        };
        if !valid {
            self.error(
                format!("invalid operation: operator {} not defined on {} (value of type {})", op.as_str(), describe(left), ty),
                span,
            );
            return Operand::Invalid;
        }

        if matches!(op, BinaryOp::Div | BinaryOp::Rem)
            && rhs.const_value().and_then(ConstValue::as_float) == Some(0.0)
        {
            self.error("invalid operation: division by zero", right.span());
            return Operand::Invalid;
        }

        match (lhs.const_value(), rhs.const_value()) {
            (Some(a), Some(b)) => {
                let float = match &ty {
                    Type::Untyped(kind) => *kind == UntypedKind::Float,
                    ty => self.types.underlying_basic(ty).is_some_and(|k| k.is_float()),
                };
                let value = fold_binary(op, a, b, float);
                if let (Some(v), Some(kind)) = (&value, self.types.underlying_basic(&ty)) {
                    self.check_representable(v, kind, &ty, span);
                }
                Operand::Const { ty, value }
            }
            _ if matches!((&lhs, &rhs), (Operand::Const { .. }, Operand::Const { .. })) => {
                Operand::Const { ty, value: None }
            }
            _ => Operand::value(ty),
        }
    }

    /// The common type of two operands of a binary operation.
    fn combine(&mut self, op: BinaryOp, lhs: Operand, rhs: Operand, span: Span) -> Operand {
        let (Some(lt), Some(rt)) = (lhs.ty(), rhs.ty()) else {
            return Operand::Invalid;
        };
        if lt.is_invalid() || rt.is_invalid() {
            return Operand::Invalid;
        }
        if lt == Type::Opaque || rt == Type::Opaque {
            return Operand::value(Type::Opaque);
        }

        let mismatch = |this: &mut Self| {
            this.error(
                format!("invalid operation: mismatched types {} and {}", lt, rt),
                span,
            );
            Operand::Invalid
        };

        let ty = match (&lt, &rt) {
            (Type::Untyped(a), Type::Untyped(b)) => {
                if *a == UntypedKind::Nil && *b == UntypedKind::Nil {
                    self.error(
                        format!("invalid operation: operator {} not defined on nil", op.as_str()),
                        span,
                    );
                    return Operand::Invalid;
                }
                if a.is_numeric() && b.is_numeric() {
                    Type::Untyped((*a).max(*b))
                } else if a == b {
                    lt.clone()
                } else {
                    return mismatch(self);
                }
            }
            (Type::Untyped(_), _) => {
                if !self.types.assignable(&lt, &rt) {
                    return mismatch(self);
                }
                self.assign_to(&lhs, &rt, "operation", span);
                rt.clone()
            }
            (_, Type::Untyped(_)) => {
                if !self.types.assignable(&rt, &lt) {
                    return mismatch(self);
                }
                self.assign_to(&rhs, &lt, "operation", span);
                lt.clone()
            }
            _ => {
                if lt == rt {
                    lt.clone()
                } else if op.is_comparison()
                    && (self.types.assignable(&lt, &rt) || self.types.assignable(&rt, &lt))
                {
                    if self.types.is_interface(&lt) { lt.clone() } else { rt.clone() }
                } else {
                    return mismatch(self);
                }
            }
        };

        match (&lhs, &rhs) {
            (Operand::Const { .. }, Operand::Const { .. }) => Operand::Const { ty, value: None },
            _ => Operand::value(ty),
        }
    }

    fn shift(&mut self, op: BinaryOp, lhs: Operand, rhs: Operand, span: Span) -> Operand {
        let (Some(lt), Some(rt)) = (lhs.ty(), rhs.ty()) else {
            return Operand::Invalid;
        };
        if lt.is_invalid() || rt.is_invalid() {
            return Operand::Invalid;
        }

        let count_ok = match &rt {
            Type::Untyped(UntypedKind::Int | UntypedKind::Rune) => true,
            Type::Untyped(UntypedKind::Float) => rhs.const_value().and_then(ConstValue::as_int).is_some(),
            ty => ty.is_lenient() || self.types.underlying_basic(ty).is_some_and(|k| k.is_integer()),
        };
        if !count_ok {
            self.error(format!("invalid operation: shift count type {}, must be integer", rt), span);
            return Operand::Invalid;
        }
        if rhs.const_value().and_then(ConstValue::as_int).is_some_and(|n| n < 0) {
            self.error("invalid operation: negative shift count", span);
            return Operand::Invalid;
        }

        let operand_ok = match &lt {
            Type::Untyped(UntypedKind::Int | UntypedKind::Rune) => true,
            Type::Untyped(UntypedKind::Float) => lhs.const_value().and_then(ConstValue::as_int).is_some(),
            ty => ty.is_lenient() || self.types.underlying_basic(ty).is_some_and(|k| k.is_integer()),
        };
        if !operand_ok {
            self.error(format!("invalid operation: shifted operand of type {} must be integer", lt), span);
            return Operand::Invalid;
        }

        let ty = match lt {
            Type::Untyped(_) => Type::Untyped(UntypedKind::Int),
            other => other,
        };
        match (lhs.const_value(), rhs.const_value()) {
            (Some(a), Some(b)) => Operand::Const {
                value: fold_binary(op, a, b, false),
                ty,
            },
            _ => Operand::value(ty),
        }
    }
}

fn object_operand(object: Object) -> Operand {
    match object {
        Object::Const(ty, value) => Operand::Const { ty, value },
        Object::Var(ty) => Operand::variable(ty),
        Object::TypeName(ty) => Operand::Type(ty),
        Object::Func(sig) => Operand::value(Type::Func(sig)),
        Object::Package(path) => Operand::Package(path),
        Object::Builtin(builtin) => Operand::Builtin(builtin),
        Object::Nil => Operand::Const {
            ty: Type::Untyped(UntypedKind::Nil),
            value: None,
        },
    }
}

fn universe(name: &str, types: &TypeTable) -> Option<Object> {
    if let Some(kind) = BasicKind::from_name(name) {
        return Some(Object::TypeName(Type::Basic(kind)));
    }
    if let Some(builtin) = Builtin::from_name(name) {
        return Some(Object::Builtin(builtin));
    }
    let object = match name {
        "error" => Object::TypeName(types.error_type()),
        "any" => Object::TypeName(Type::empty_interface()),
        "true" => Object::Const(Type::Untyped(UntypedKind::Bool), Some(ConstValue::Bool(true))),
        "false" => Object::Const(Type::Untyped(UntypedKind::Bool), Some(ConstValue::Bool(false))),
        "nil" => Object::Nil,
        _ => return None,
    };
    Some(object)
}

fn embedded_name(ty: &TypeExpr) -> Option<&Ident> {
    match ty {
        TypeExpr::Name { name, .. } => Some(name),
        TypeExpr::Pointer { elem, .. } => match elem.as_ref() {
            TypeExpr::Name { name, .. } => Some(name),
            _ => None,
        },
        _ => None,
    }
}

fn has_named_results(sig: &FuncType) -> bool {
    sig.results.iter().any(|p| !p.names.is_empty())
}

fn is_conversion(expr: &Expr, checker: &mut Checker) -> bool {
    let Expr::Call { func, .. } = expr else {
        return false;
    };
    match strip_parens(func) {
        Expr::Type(_) => true,
        Expr::Ident(ident) => matches!(checker.lookup(&ident.name), Some(Object::TypeName(_)) | Some(Object::Builtin(
            Builtin::Len | Builtin::Cap | Builtin::Append | Builtin::Make | Builtin::New | Builtin::Min | Builtin::Max
        ))),
        _ => false,
    }
}

fn strip_parens(expr: &Expr) -> &Expr {
    match expr {
        Expr::Paren { inner, .. } => strip_parens(inner),
        other => other,
    }
}

/// Short source-like rendering of an expression for diagnostics.
fn describe(expr: &Expr) -> String {
    match expr {
        Expr::Ident(ident) => ident.name.clone(),
        Expr::BasicLit { value, .. } => value.clone(),
        Expr::Selector { expr, sel } => format!("{}.{}", describe(expr), sel.name),
        Expr::Call { func, .. } => format!("{}()", describe(func)),
        Expr::Index { expr, index, .. } => format!("{}[{}]", describe(expr), describe(index)),
        Expr::Paren { inner, .. } => format!("({})", describe(inner)),
        Expr::Unary { op, expr, .. } => format!("{}{}", op.as_str(), describe(expr)),
        Expr::Binary {
            op, left, right, ..
        } => format!("{} {} {}", describe(left), op.as_str(), describe(right)),
        Expr::Composite { .. } => "composite literal".to_string(),
        Expr::FuncLit { .. } => "func literal".to_string(),
        Expr::Slice { expr, .. } => format!("{}[:]", describe(expr)),
        Expr::TypeAssert { expr, .. } => format!("{}.(...)", describe(expr)),
        Expr::Type(_) => "type".to_string(),
    }
}

fn int_literal(text: &str) -> Option<i128> {
    let clean: String = text.chars().filter(|c| *c != '_').collect::<String>().to_ascii_lowercase();
    if let Some(hex) = clean.strip_prefix("0x") {
        i128::from_str_radix(hex, 16).ok()
    } else if let Some(bin) = clean.strip_prefix("0b") {
        i128::from_str_radix(bin, 2).ok()
    } else if let Some(oct) = clean.strip_prefix("0o") {
        i128::from_str_radix(oct, 8).ok()
    } else if clean.len() > 1 && clean.starts_with('0') {
        i128::from_str_radix(&clean[1..], 8).ok()
    } else {
        clean.parse().ok()
    }
}

fn float_literal(text: &str) -> Option<f64> {
    let clean: String = text.chars().filter(|c| *c != '_').collect();
    clean.parse().ok()
}

fn rune_literal(text: &str) -> Option<i128> {
    let inner = text.strip_prefix('\'')?.strip_suffix('\'')?;
    if inner == "\\'" {
        return Some('\'' as i128);
    }
    let value = unquote(&format!("\"{}\"", inner))?;
    let mut chars = value.chars();
    let ch = chars.next()?;
    chars.next().is_none().then_some(ch as i128)
}

fn convert_const(value: &ConstValue, kind: BasicKind) -> Option<ConstValue> {
    match (value, kind) {
        (ConstValue::Int(n), BasicKind::String) => {
            let ch = u32::try_from(*n).ok().and_then(char::from_u32).unwrap_or('\u{FFFD}');
            Some(ConstValue::Str(ch.to_string()))
        }
        (ConstValue::Str(s), BasicKind::String) => Some(ConstValue::Str(s.clone())),
        (ConstValue::Bool(b), BasicKind::Bool) => Some(ConstValue::Bool(*b)),
        (v @ (ConstValue::Int(_) | ConstValue::Float(_)), k) if k.is_float() => {
            v.as_float().map(ConstValue::Float)
        }
        (v @ (ConstValue::Int(_) | ConstValue::Float(_)), k) if k.is_integer() => {
            v.as_int().map(ConstValue::Int)
        }
        _ => None,
    }
}

fn fold_unary(op: UnaryOp, value: &ConstValue, kind: Option<BasicKind>) -> Option<ConstValue> {
    match (op, value) {
        (UnaryOp::Not, ConstValue::Bool(b)) => Some(ConstValue::Bool(!b)),
        (UnaryOp::Plus, v) => Some(v.clone()),
        (UnaryOp::Neg, ConstValue::Int(n)) => n.checked_neg().map(ConstValue::Int),
        (UnaryOp::Neg, ConstValue::Float(f)) => Some(ConstValue::Float(-f)),
        (UnaryOp::Xor, ConstValue::Int(n)) => match kind {
            // Unsigned complement flips only the bits of the type.
            Some(k) if k.is_unsigned() => {
                let bits = match k {
                    BasicKind::Uint8 => 8,
                    BasicKind::Uint16 => 16,
                    BasicKind::Uint32 => 32,
                    _ => 64,
                };
                let mask = (1i128 << bits) - 1;
                Some(ConstValue::Int(!n & mask))
            }
            _ => Some(ConstValue::Int(!n)),
        },
        _ => None,
    }
}

fn fold_binary(op: BinaryOp, a: &ConstValue, b: &ConstValue, float: bool) -> Option<ConstValue> {
    use ConstValue::*;

    match (a, b) {
        (Bool(x), Bool(y)) => match op {
            BinaryOp::LogAnd => Some(Bool(*x && *y)),
            BinaryOp::LogOr => Some(Bool(*x || *y)),
            BinaryOp::Eq => Some(Bool(x == y)),
            BinaryOp::Ne => Some(Bool(x != y)),
            _ => None,
        },
        (Str(x), Str(y)) => match op {
            BinaryOp::Add => Some(Str(format!("{}{}", x, y))),
            BinaryOp::Eq => Some(Bool(x == y)),
            BinaryOp::Ne => Some(Bool(x != y)),
            BinaryOp::Lt => Some(Bool(x < y)),
            BinaryOp::Le => Some(Bool(x <= y)),
            BinaryOp::Gt => Some(Bool(x > y)),
            BinaryOp::Ge => Some(Bool(x >= y)),
            _ => None,
        },
        (Int(x), Int(y)) if !float => match op {
            BinaryOp::Add => x.checked_add(*y).map(Int),
            BinaryOp::Sub => x.checked_sub(*y).map(Int),
            BinaryOp::Mul => x.checked_mul(*y).map(Int),
            BinaryOp::Div => x.checked_div(*y).map(Int),
            BinaryOp::Rem => x.checked_rem(*y).map(Int),
            BinaryOp::And => Some(Int(x & y)),
            BinaryOp::Or => Some(Int(x | y)),
            BinaryOp::Xor => Some(Int(x ^ y)),
            BinaryOp::AndNot => Some(Int(x & !y)),
            BinaryOp::Shl => u32::try_from(*y).ok().and_then(|s| x.checked_shl(s)).map(Int),
            BinaryOp::Shr => u32::try_from(*y).ok().map(|s| Int(x >> s.min(127))),
            BinaryOp::Eq => Some(Bool(x == y)),
            BinaryOp::Ne => Some(Bool(x != y)),
            BinaryOp::Lt => Some(Bool(x < y)),
            BinaryOp::Le => Some(Bool(x <= y)),
            BinaryOp::Gt => Some(Bool(x > y)),
            BinaryOp::Ge => Some(Bool(x >= y)),
            _ => None,
        },
        (x, y) => {
            let (x, y) = (x.as_float()?, y.as_float()?);
            match op {
                BinaryOp::Add => Some(Float(x + y)),
                BinaryOp::Sub => Some(Float(x - y)),
                BinaryOp::Mul => Some(Float(x * y)),
                BinaryOp::Div => Some(Float(x / y)),
                BinaryOp::Eq => Some(Bool(x == y)),
                BinaryOp::Ne => Some(Bool(x != y)),
                BinaryOp::Lt => Some(Bool(x < y)),
                BinaryOp::Le => Some(Bool(x <= y)),
                BinaryOp::Gt => Some(Bool(x > y)),
                BinaryOp::Ge => Some(Bool(x >= y)),
                _ => None,
            }
        }
    }
}

/// Whether a block ends in a terminating statement.
fn block_terminates(block: &Block) -> bool {
    block.stmts.last().is_some_and(stmt_terminates)
}

fn stmt_terminates(stmt: &Stmt) -> bool {
    match &stmt.kind {
        StmtKind::Return(_) => true,
        StmtKind::Expr(Expr::Call { func, .. }) => {
            matches!(strip_parens(func), Expr::Ident(ident) if ident.name == "panic")
        }
        StmtKind::Block(block) => block_terminates(block),
        StmtKind::If(if_stmt) => if_terminates(if_stmt),
        StmtKind::For {
            cond: None, body, ..
        } => !has_break(&body.stmts),
        StmtKind::Switch { clauses, .. } => {
            clauses.iter().any(|c| c.exprs.is_none())
                && clauses.iter().all(|c| {
                    !has_break(&c.body)
                        && c.body.last().is_some_and(|s| {
                            stmt_terminates(s)
                                || matches!(s.kind, StmtKind::Branch(BranchKind::Fallthrough))
                        })
                })
        }
        _ => false,
    }
}

fn if_terminates(if_stmt: &IfStmt) -> bool {
    let else_terminates = match if_stmt.els.as_deref() {
        Some(Else::If(nested)) => if_terminates(nested),
        Some(Else::Block(block)) => block_terminates(block),
        None => false,
    };
    block_terminates(&if_stmt.then) && else_terminates
}

/// Whether an unlabeled `break` targets the enclosing statement.
fn has_break(stmts: &[Stmt]) -> bool {
    stmts.iter().any(|stmt| match &stmt.kind {
        StmtKind::Branch(BranchKind::Break) => true,
        StmtKind::Block(block) => has_break(&block.stmts),
        StmtKind::If(if_stmt) => if_has_break(if_stmt),
        _ => false,
    })
}

fn if_has_break(if_stmt: &IfStmt) -> bool {
    has_break(&if_stmt.then.stmts)
        || match if_stmt.els.as_deref() {
            Some(Else::If(nested)) => if_has_break(nested),
            Some(Else::Block(block)) => has_break(&block.stmts),
            None => false,
        }
}

fn block_end(block: &Block) -> Span {
    block.stmts.last().map(|s| s.span).unwrap_or(block.span)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::parser::parse_file;

    fn check(source: &str) -> Result<(), Vec<TypeError>> {
        let file = parse_file("test.go", source).expect("parse failed");
        let mut checker = TypeChecker::new();
        checker.check_package("p", &[file])
    }

    fn check_err(source: &str) -> String {
        match check(source) {
            Ok(()) => panic!("expected a type error"),
            Err(errors) => errors
                .iter()
                .map(|e| e.message.clone())
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }

    /// Check `marker` as package "gomono/generic" and `source` as "p".
    fn check_with_marker(marker: &str, source: &str) -> (TypeChecker, Result<(), Vec<TypeError>>) {
        let mut checker = TypeChecker::new();
        let marker = parse_file("generic.go", marker).expect("parse failed");
        checker
            .check_package("gomono/generic", &[marker])
            .expect("marker package should check");
        let file = parse_file("box.go", source).expect("parse failed");
        let result = checker.check_package("p", &[file]);
        (checker, result)
    }

    #[test]
    fn test_simple_function() {
        assert!(check("package p\nfunc add(a, b int) int { return a + b }\n").is_ok());
    }

    #[test]
    fn test_undefined_name() {
        let err = check_err("package p\nfunc f() int { return y }\n");
        assert!(err.contains("undefined: y"), "{}", err);
    }

    #[test]
    fn test_mismatched_types() {
        let err = check_err("package p\nfunc f(a int, b string) { _ = a + b }\n");
        assert!(err.contains("mismatched types int and string"), "{}", err);
    }

    #[test]
    fn test_untyped_constants_adapt() {
        let source = "package p\nvar x float64 = 1\nvar y = x * 2\nconst big = 1 << 40\nvar z int64 = big\n";
        assert!(check(source).is_ok());
    }

    #[test]
    fn test_constant_overflow() {
        let err = check_err("package p\nvar b byte = 300\n");
        assert!(err.contains("overflows"), "{}", err);
    }

    #[test]
    fn test_iota_groups() {
        let source = "package p\ntype Color int\nconst (\n\tRed Color = iota\n\tGreen\n\tBlue\n)\nvar arr [Blue + 1]string\nvar n = len(arr)\n";
        assert!(check(source).is_ok());
    }

    #[test]
    fn test_named_types_are_distinct() {
        let source = "package p\ntype A int\ntype B int\nfunc f(a A) B { return a }\n";
        let err = check_err(source);
        assert!(err.contains("cannot use value of type p.A as p.B value"), "{}", err);
    }

    #[test]
    fn test_methods_and_interfaces() {
        let source = r#"package p
type Stringer interface { String() string }
type Name string
func (n Name) String() string { return string(n) }
func show(s Stringer) string { return s.String() }
func run() string { return show(Name("x")) }
"#;
        assert!(check(source).is_ok());
    }

    #[test]
    fn test_missing_method() {
        let source = r#"package p
type Stringer interface { String() string }
type Num int
func show(s Stringer) {}
func run() { show(Num(1)) }
"#;
        let err = check_err(source);
        assert!(err.contains("missing method String"), "{}", err);
    }

    #[test]
    fn test_pointer_receiver_methods_need_a_pointer() {
        let source = r#"package p
type Stringer interface { String() string }
type Named struct { v int }
func (n *Named) String() string { return "" }
func wrap(n Named) Stringer { return n }
"#;
        let err = check_err(source);
        assert!(
            err.contains("does not implement p.Stringer (method String has pointer receiver)"),
            "{}",
            err
        );

        let source = r#"package p
type Stringer interface { String() string }
type Named struct { v int }
func (n *Named) String() string { return "" }
type Outer struct { *Named }
func wrap(n *Named) Stringer { return n }
func embed(o Outer) Stringer { return o }
func call(n Named) string { return n.String() }
"#;
        assert!(check(source).is_ok());
    }

    #[test]
    fn test_struct_literals() {
        let source = r#"package p
type Point struct { X, Y int }
var a = Point{1, 2}
var b = Point{X: 1}
var c = []Point{{1, 2}, {X: 3}}
var d = map[string]*Point{"o": {0, 0}}
var e = &Point{Y: 4}
"#;
        assert!(check(source).is_ok());
    }

    #[test]
    fn test_unknown_struct_field() {
        let err = check_err("package p\ntype Point struct { X int }\nvar a = Point{Z: 1}\n");
        assert!(err.contains("unknown field Z"), "{}", err);
    }

    #[test]
    fn test_multiple_results() {
        let source = r#"package p
func pair() (int, string) { return 1, "a" }
func use() int {
	n, s := pair()
	_ = s
	return n
}
"#;
        assert!(check(source).is_ok());
        let err = check_err("package p\nfunc pair() (int, string) { return 1, \"a\" }\nvar x int = pair()\n");
        assert!(err.contains("assignment mismatch") || err.contains("single-value context"), "{}", err);
    }

    #[test]
    fn test_comma_ok_forms() {
        let source = r#"package p
func f(m map[string]int, x interface{}) bool {
	_, ok := m["k"]
	s, isStr := x.(string)
	_ = s
	return ok && isStr
}
"#;
        assert!(check(source).is_ok());
    }

    #[test]
    fn test_missing_return() {
        let err = check_err("package p\nfunc f(x int) int { if x > 0 { return 1 } }\n");
        assert!(err.contains("missing return"), "{}", err);

        let source = "package p\nfunc f(x int) int {\n\tfor {\n\t}\n}\nfunc g(x int) int {\n\tswitch {\n\tcase x > 0:\n\t\treturn 1\n\tdefault:\n\t\tpanic(\"no\")\n\t}\n}\n";
        assert!(check(source).is_ok());
    }

    #[test]
    fn test_no_new_variables() {
        let err = check_err("package p\nfunc f() { x := 1; x := 2; _ = x }\n");
        assert!(err.contains("no new variables"), "{}", err);
    }

    #[test]
    fn test_non_boolean_condition() {
        let err = check_err("package p\nfunc f(x int) { if x { } }\n");
        assert!(err.contains("non-boolean condition"), "{}", err);
    }

    #[test]
    fn test_range_forms() {
        let source = r#"package p
func f(xs []string, m map[string]int, s string) int {
	total := 0
	for i, x := range xs { total += i + len(x) }
	for k, v := range m { total += len(k) + v }
	for _, r := range s { total += int(r) }
	for i := range 10 { total += i }
	return total
}
"#;
        assert!(check(source).is_ok());
    }

    #[test]
    fn test_recursive_types_via_pointer() {
        let source = "package p\ntype Node struct { next *Node; value int }\nfunc (n *Node) Last() *Node { for n.next != nil { n = n.next }; return n }\n";
        assert!(check(source).is_ok());
    }

    #[test]
    fn test_invalid_recursive_type() {
        let err = check_err("package p\ntype A B\ntype B A\n");
        assert!(err.contains("invalid recursive type"), "{}", err);
    }

    #[test]
    fn test_initialization_cycle() {
        let err = check_err("package p\nvar a = b\nvar b = a\n");
        assert!(err.contains("initialization cycle"), "{}", err);
    }

    #[test]
    fn test_redeclared() {
        let err = check_err("package p\nfunc f() {}\nvar f int\n");
        assert!(err.contains("f redeclared in this block"), "{}", err);
    }

    #[test]
    fn test_builtins() {
        let source = r#"package p
func f() []int {
	xs := make([]int, 0, 4)
	xs = append(xs, 1, 2)
	xs = append(xs, xs...)
	m := map[string]bool{}
	delete(m, "k")
	p := new(int)
	*p = cap(xs)
	copy(xs, xs[1:])
	return xs
}
"#;
        assert!(check(source).is_ok());
    }

    #[test]
    fn test_call_arity() {
        let err = check_err("package p\nfunc g(a, b int) {}\nfunc f() { g(1) }\n");
        assert!(err.contains("not enough arguments in call to g"), "{}", err);
        let err = check_err("package p\nfunc g(a int) {}\nfunc f() { g(1, 2) }\n");
        assert!(err.contains("too many arguments in call to g"), "{}", err);
    }

    #[test]
    fn test_variadic_call() {
        let source = "package p\nfunc sum(xs ...int) int { return len(xs) }\nvar a = sum()\nvar b = sum(1, 2, 3)\nvar c = sum([]int{1}...)\n";
        assert!(check(source).is_ok());
    }

    #[test]
    fn test_unused_expression() {
        let err = check_err("package p\nfunc f(x int) { x + 1 }\n");
        assert!(err.contains("is not used"), "{}", err);
    }

    #[test]
    fn test_opaque_package_is_lenient() {
        let mut checker = TypeChecker::new();
        checker.add_opaque("fmt");
        let file = parse_file(
            "test.go",
            "package p\nimport \"fmt\"\nfunc f(x int) string { fmt.Println(x); var w fmt.Stringer; _ = w; return fmt.Sprint(x) }\n",
        )
        .expect("parse failed");
        assert!(checker.check_package("p", &[file]).is_ok());
    }

    #[test]
    fn test_unexported_member_of_checked_package() {
        let mut checker = TypeChecker::new();
        let lib = parse_file("lib.go", "package lib\nvar hidden int\nvar Shown int\n").expect("parse failed");
        checker.check_package("example.com/lib", &[lib]).expect("lib should check");
        let file = parse_file(
            "test.go",
            "package p\nimport \"example.com/lib\"\nvar a = lib.Shown\nvar b = lib.hidden\n",
        )
        .expect("parse failed");
        let errors = checker.check_package("p", &[file]).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.contains("not exported"));
    }

    #[test]
    fn test_placeholder_type_expressions_are_recorded() {
        let marker = "package generic\ntype Generic interface{}\nvar _ Generic\n";
        let source = r#"package box
import "gomono/generic"
type Item generic.Generic
type Box struct { items []Item }
func (b *Box) Put(x Item) { b.items = append(b.items, x) }
"#;
        let (checker, result) = check_with_marker(marker, source);
        assert!(result.is_ok(), "{:?}", result);

        let file = parse_file("box.go", source).expect("parse failed");
        let Decl::Gen(decl) = &file.decls[0] else {
            panic!("expected a type declaration");
        };
        let Spec::Type(spec) = &decl.specs[0] else {
            panic!("expected a type spec");
        };
        let recorded = checker.type_of("p", 0, &spec.ty).expect("type recorded");
        let marker_scope = &checker.package("gomono/generic").expect("marker checked").scope;
        let Some(Object::TypeName(placeholder)) = marker_scope.get("Generic") else {
            panic!("Generic missing from marker scope");
        };
        assert_eq!(recorded, placeholder);
    }

    #[test]
    fn test_errors_carry_file_and_position() {
        let errors = check("package p\n\nvar x int = \"s\"\n").unwrap_err();
        assert_eq!(errors[0].file, "test.go");
        assert_eq!(errors[0].span.line, 3);
    }
}
