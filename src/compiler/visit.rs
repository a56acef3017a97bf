//! Mutable traversal of a syntax tree.
//!
//! `VisitMut` has one method per node kind; each default implementation
//! recurses through the matching `walk_*` function, so an implementor only
//! overrides the nodes it cares about.

use crate::compiler::ast::{
    Block, CaseClause, Decl, Else, Expr, FieldDecl, File, FuncDecl, FuncType, GenDecl, Ident,
    IfStmt, ImportSpec, InterfaceElem, Param, Spec, Stmt, StmtKind, TypeExpr, TypeSpec, ValueSpec,
};

pub trait VisitMut {
    fn visit_ident(&mut self, _ident: &mut Ident) {}

    fn visit_file(&mut self, file: &mut File) {
        walk_file(self, file);
    }

    fn visit_import_spec(&mut self, spec: &mut ImportSpec) {
        if let Some(name) = &mut spec.name {
            self.visit_ident(name);
        }
    }

    fn visit_type_spec(&mut self, spec: &mut TypeSpec) {
        walk_type_spec(self, spec);
    }

    fn visit_value_spec(&mut self, spec: &mut ValueSpec) {
        walk_value_spec(self, spec);
    }

    fn visit_func_decl(&mut self, decl: &mut FuncDecl) {
        walk_func_decl(self, decl);
    }

    fn visit_type_expr(&mut self, ty: &mut TypeExpr) {
        walk_type_expr(self, ty);
    }

    fn visit_stmt(&mut self, stmt: &mut Stmt) {
        walk_stmt(self, stmt);
    }

    fn visit_expr(&mut self, expr: &mut Expr) {
        walk_expr(self, expr);
    }
}

pub fn walk_file<V: VisitMut + ?Sized>(v: &mut V, file: &mut File) {
    v.visit_ident(&mut file.package);
    for decl in &mut file.imports {
        for spec in &mut decl.specs {
            v.visit_import_spec(spec);
        }
    }
    for decl in &mut file.decls {
        match decl {
            Decl::Gen(decl) => walk_gen_decl(v, decl),
            Decl::Func(decl) => v.visit_func_decl(decl),
        }
    }
}

fn walk_gen_decl<V: VisitMut + ?Sized>(v: &mut V, decl: &mut GenDecl) {
    for spec in &mut decl.specs {
        match spec {
            Spec::Type(spec) => v.visit_type_spec(spec),
            Spec::Value(spec) => v.visit_value_spec(spec),
        }
    }
}

pub fn walk_type_spec<V: VisitMut + ?Sized>(v: &mut V, spec: &mut TypeSpec) {
    v.visit_ident(&mut spec.name);
    v.visit_type_expr(&mut spec.ty);
}

pub fn walk_value_spec<V: VisitMut + ?Sized>(v: &mut V, spec: &mut ValueSpec) {
    for name in &mut spec.names {
        v.visit_ident(name);
    }
    if let Some(ty) = &mut spec.ty {
        v.visit_type_expr(ty);
    }
    for value in &mut spec.values {
        v.visit_expr(value);
    }
}

pub fn walk_func_decl<V: VisitMut + ?Sized>(v: &mut V, decl: &mut FuncDecl) {
    if let Some(recv) = &mut decl.recv {
        walk_param(v, recv);
    }
    v.visit_ident(&mut decl.name);
    walk_func_type(v, &mut decl.sig);
    if let Some(body) = &mut decl.body {
        walk_block(v, body);
    }
}

fn walk_param<V: VisitMut + ?Sized>(v: &mut V, param: &mut Param) {
    for name in &mut param.names {
        v.visit_ident(name);
    }
    v.visit_type_expr(&mut param.ty);
}

fn walk_func_type<V: VisitMut + ?Sized>(v: &mut V, func: &mut FuncType) {
    for param in func.params.iter_mut().chain(func.results.iter_mut()) {
        walk_param(v, param);
    }
}

fn walk_field<V: VisitMut + ?Sized>(v: &mut V, field: &mut FieldDecl) {
    for name in &mut field.names {
        v.visit_ident(name);
    }
    v.visit_type_expr(&mut field.ty);
}

pub fn walk_type_expr<V: VisitMut + ?Sized>(v: &mut V, ty: &mut TypeExpr) {
    match ty {
        TypeExpr::Name { pkg, name } => {
            if let Some(pkg) = pkg {
                v.visit_ident(pkg);
            }
            v.visit_ident(name);
        }
        TypeExpr::Pointer { elem, .. } | TypeExpr::Slice { elem, .. } => v.visit_type_expr(elem),
        TypeExpr::Array { len, elem, .. } => {
            if let Some(len) = len {
                v.visit_expr(len);
            }
            v.visit_type_expr(elem);
        }
        TypeExpr::Map { key, value, .. } => {
            v.visit_type_expr(key);
            v.visit_type_expr(value);
        }
        TypeExpr::Struct { fields, .. } => {
            for field in fields {
                walk_field(v, field);
            }
        }
        TypeExpr::Interface { elems, .. } => {
            for elem in elems {
                match elem {
                    InterfaceElem::Method { name, sig, .. } => {
                        v.visit_ident(name);
                        walk_func_type(v, sig);
                    }
                    InterfaceElem::Embed { ty, .. } => v.visit_type_expr(ty),
                }
            }
        }
        TypeExpr::Func(func) => walk_func_type(v, func),
        TypeExpr::Paren { inner, .. } => v.visit_type_expr(inner),
    }
}

pub fn walk_block<V: VisitMut + ?Sized>(v: &mut V, block: &mut Block) {
    for stmt in &mut block.stmts {
        v.visit_stmt(stmt);
    }
}

pub fn walk_stmt<V: VisitMut + ?Sized>(v: &mut V, stmt: &mut Stmt) {
    match &mut stmt.kind {
        StmtKind::Decl(decl) => walk_gen_decl(v, decl),
        StmtKind::Expr(expr) | StmtKind::Go(expr) | StmtKind::Defer(expr) => v.visit_expr(expr),
        StmtKind::ShortVar { names, values } => {
            for name in names {
                v.visit_ident(name);
            }
            for value in values {
                v.visit_expr(value);
            }
        }
        StmtKind::Assign { lhs, rhs, .. } => {
            for expr in lhs.iter_mut().chain(rhs.iter_mut()) {
                v.visit_expr(expr);
            }
        }
        StmtKind::IncDec { expr, .. } => v.visit_expr(expr),
        StmtKind::Return(values) => {
            for value in values {
                v.visit_expr(value);
            }
        }
        StmtKind::If(if_stmt) => walk_if(v, if_stmt),
        StmtKind::For {
            init,
            cond,
            post,
            body,
        } => {
            if let Some(init) = init {
                v.visit_stmt(init);
            }
            if let Some(cond) = cond {
                v.visit_expr(cond);
            }
            if let Some(post) = post {
                v.visit_stmt(post);
            }
            walk_block(v, body);
        }
        StmtKind::Range {
            key,
            value,
            expr,
            body,
            ..
        } => {
            for target in [key, value].into_iter().flatten() {
                v.visit_expr(target);
            }
            v.visit_expr(expr);
            walk_block(v, body);
        }
        StmtKind::Switch {
            init, tag, clauses, ..
        } => {
            if let Some(init) = init {
                v.visit_stmt(init);
            }
            if let Some(tag) = tag {
                v.visit_expr(tag);
            }
            for clause in clauses {
                walk_clause(v, clause);
            }
        }
        StmtKind::Block(block) => walk_block(v, block),
        StmtKind::Branch(_) | StmtKind::Empty => {}
    }
}

fn walk_if<V: VisitMut + ?Sized>(v: &mut V, if_stmt: &mut IfStmt) {
    if let Some(init) = &mut if_stmt.init {
        v.visit_stmt(init);
    }
    v.visit_expr(&mut if_stmt.cond);
    walk_block(v, &mut if_stmt.then);
    match if_stmt.els.as_deref_mut() {
        Some(Else::If(nested)) => walk_if(v, nested),
        Some(Else::Block(block)) => walk_block(v, block),
        None => {}
    }
}

fn walk_clause<V: VisitMut + ?Sized>(v: &mut V, clause: &mut CaseClause) {
    if let Some(exprs) = &mut clause.exprs {
        for expr in exprs {
            v.visit_expr(expr);
        }
    }
    for stmt in &mut clause.body {
        v.visit_stmt(stmt);
    }
}

pub fn walk_expr<V: VisitMut + ?Sized>(v: &mut V, expr: &mut Expr) {
    match expr {
        Expr::Ident(ident) => v.visit_ident(ident),
        Expr::BasicLit { .. } => {}
        Expr::Composite { ty, elems, .. } => {
            if let Some(ty) = ty {
                v.visit_type_expr(ty);
            }
            for elem in elems {
                if let Some(key) = &mut elem.key {
                    v.visit_expr(key);
                }
                v.visit_expr(&mut elem.value);
            }
        }
        Expr::FuncLit { sig, body } => {
            walk_func_type(v, sig);
            walk_block(v, body);
        }
        Expr::Paren { inner, .. } => v.visit_expr(inner),
        Expr::Selector { expr, sel } => {
            v.visit_expr(expr);
            v.visit_ident(sel);
        }
        Expr::Index { expr, index, .. } => {
            v.visit_expr(expr);
            v.visit_expr(index);
        }
        Expr::Slice {
            expr,
            low,
            high,
            max,
            ..
        } => {
            v.visit_expr(expr);
            for index in [low, high, max].into_iter().flatten() {
                v.visit_expr(index);
            }
        }
        Expr::TypeAssert { expr, ty, .. } => {
            v.visit_expr(expr);
            v.visit_type_expr(ty);
        }
        Expr::Call { func, args, .. } => {
            v.visit_expr(func);
            for arg in args {
                v.visit_expr(arg);
            }
        }
        Expr::Unary { expr, .. } => v.visit_expr(expr),
        Expr::Binary { left, right, .. } => {
            v.visit_expr(left);
            v.visit_expr(right);
        }
        Expr::Type(ty) => v.visit_type_expr(ty),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::parser::parse_file;

    struct Collect(Vec<String>);

    impl VisitMut for Collect {
        fn visit_ident(&mut self, ident: &mut Ident) {
            self.0.push(ident.name.clone());
        }
    }

    fn idents(source: &str) -> Vec<String> {
        let mut file = parse_file("test.go", source).unwrap();
        let mut collect = Collect(Vec::new());
        collect.visit_file(&mut file);
        collect.0
    }

    #[test]
    fn test_visits_declaration_names() {
        let names = idents("package p\n\nimport lib \"x.org/lib\"\n\ntype T struct {\n\tA lib.Thing\n}\n");
        assert_eq!(names, vec!["p", "lib", "T", "A", "lib", "Thing"]);
    }

    #[test]
    fn test_visits_function_parts() {
        let names = idents("package p\n\nfunc (r *R) M(a A) (b B) {\n\tc := a.f\n\treturn c\n}\n");
        assert_eq!(names, vec!["p", "r", "R", "M", "a", "A", "b", "B", "c", "a", "f", "c"]);
    }

    #[test]
    fn test_visits_nested_expressions() {
        let names = idents("package p\n\nvar v = []K{{F: g(h[i].j)}}\n");
        assert_eq!(names, vec!["p", "v", "K", "F", "g", "h", "i", "j"]);
    }

    #[test]
    fn test_renames_in_place() {
        struct Upper;
        impl VisitMut for Upper {
            fn visit_ident(&mut self, ident: &mut Ident) {
                ident.name = ident.name.to_uppercase();
            }
        }

        let mut file = parse_file("test.go", "package p\n\nvar x = y\n").unwrap();
        Upper.visit_file(&mut file);
        assert_eq!(file.package.name, "P");
        let mut collect = Collect(Vec::new());
        collect.visit_file(&mut file);
        assert_eq!(collect.0, vec!["P", "X", "Y"]);
    }
}
