//! Printer producing canonical Go source from a syntax tree.
//!
//! Layout follows gofmt: tab indentation, grouped declarations in
//! parentheses, cells of consecutive lines aligned with spaces (struct fields,
//! grouped specs, keyed literal elements and trailing comments), and one
//! blank line between top-level declarations. Blank lines between statements
//! and comments attached to declarations, fields and statements come from the
//! tree's trivia, so the output depends on nothing but the tree.

use crate::compiler::ast::{
    BinaryOp, Block, BranchKind, CaseClause, Decl, Element, Else, Expr, FieldDecl, File,
    FuncDecl, FuncType, GenDecl, IfStmt, ImportDecl, ImportSpec, InterfaceElem, ListLayout,
    Param, Spec, Stmt, StmtKind, Trivia, TypeExpr, TypeSpec, UnaryOp, ValueSpec,
};

/// Longest single-line function body kept on the line of its signature.
const MAX_INLINE_BODY: usize = 100;

/// Keys longer than this are not aligned with their neighbours.
const SMALL_KEY: usize = 40;

/// Print a file as Go source.
pub fn format_file(file: &File) -> String {
    GoPrinter::new().print_file(file)
}

/// One output line made of alignment cells. All cells but the last are
/// padded to the width of their column.
struct Row {
    doc: Vec<String>,
    blank_before: bool,
    cells: Vec<String>,
    /// Start a new alignment section at this row.
    breaks: bool,
}

impl Row {
    fn new(trivia: &Trivia, cells: Vec<String>) -> Self {
        Self {
            doc: trivia.doc.clone(),
            blank_before: trivia.blank_before,
            cells,
            breaks: false,
        }
    }

    fn plain(cells: Vec<String>) -> Self {
        Self::new(&Trivia::default(), cells)
    }

    fn multiline(&self) -> bool {
        self.cells.iter().any(|c| c.contains('\n'))
    }
}

/// Pretty-printer for Go syntax trees.
pub struct GoPrinter {
    output: String,
    indent: usize,
}

impl Default for GoPrinter {
    fn default() -> Self {
        Self::new()
    }
}

impl GoPrinter {
    pub fn new() -> Self {
        Self {
            output: String::new(),
            indent: 0,
        }
    }

    pub fn print_file(mut self, file: &File) -> String {
        let mut output = String::new();
        output.push_str(&self.doc(&file.trivia.doc));
        output.push_str(&with_comment(
            format!("package {}", file.package.name),
            file.trivia.comment.as_deref(),
        ));
        output.push('\n');

        for decl in &file.imports {
            output.push('\n');
            output.push_str(&self.doc(&decl.trivia.doc));
            output.push_str(&self.import_decl(decl));
            output.push('\n');
        }

        for decl in &file.decls {
            output.push('\n');
            let (trivia, text) = match decl {
                Decl::Gen(decl) => (&decl.trivia, self.gen_decl(decl)),
                Decl::Func(decl) => (&decl.trivia, self.func_decl(decl)),
            };
            output.push_str(&self.doc(&trivia.doc));
            output.push_str(&with_comment(text, trivia.comment.as_deref()));
            output.push('\n');
        }

        let trailing = trim_blank(&file.trailing_doc);
        if !trailing.is_empty() {
            output.push('\n');
            output.push_str(&self.doc(trailing));
        }

        self.output = output;
        self.output
    }

    fn tabs(&self) -> String {
        "\t".repeat(self.indent)
    }

    /// Comment lines at the current indentation; empty entries are blank lines.
    fn doc(&self, doc: &[String]) -> String {
        let mut out = String::new();
        for line in doc {
            if line.is_empty() {
                out.push('\n');
            } else {
                out.push_str(&self.tabs());
                out.push_str(line);
                out.push('\n');
            }
        }
        out
    }

    /// Rows at the current indentation, each ending in a newline.
    fn rows(&self, rows: Vec<Row>) -> String {
        let mut out = String::new();
        let mut section: Vec<Row> = Vec::new();

        for (i, row) in rows.into_iter().enumerate() {
            let starts_section = row.breaks
                || (i > 0 && row.blank_before)
                || !row.doc.is_empty()
                || row.multiline();
            if starts_section {
                out.push_str(&self.section(&section));
                section.clear();
            }
            if i > 0 && row.blank_before {
                out.push('\n');
            }
            out.push_str(&self.doc(&row.doc));

            if row.multiline() {
                let text: Vec<&str> = row
                    .cells
                    .iter()
                    .map(String::as_str)
                    .filter(|c| !c.is_empty())
                    .collect();
                out.push_str(&self.tabs());
                out.push_str(&text.join(" "));
                out.push('\n');
            } else {
                section.push(row);
            }
        }
        out.push_str(&self.section(&section));
        out
    }

    fn section(&self, rows: &[Row]) -> String {
        let cells: Vec<&[String]> = rows.iter().map(|r| r.cells.as_slice()).collect();
        let widths = column_widths(&cells);

        let mut out = String::new();
        for (row, widths) in cells.iter().zip(widths) {
            let mut line = self.tabs();
            for (i, cell) in row.iter().enumerate() {
                line.push_str(cell);
                if let Some(&width) = widths.get(i)
                    && width > 0
                {
                    let pad = width - cell.chars().count();
                    line.push_str(&" ".repeat(pad));
                }
            }
            out.push_str(line.trim_end());
            out.push('\n');
        }
        out
    }

    // Declarations

    fn import_decl(&self, decl: &ImportDecl) -> String {
        if !decl.grouped {
            let spec = decl.specs.first().map(import_spec).unwrap_or_default();
            return with_comment(format!("import {}", spec), decl.trivia.comment.as_deref());
        }

        let mut specs: Vec<&ImportSpec> = decl.specs.iter().collect();
        sort_imports(&mut specs);

        let rows = specs
            .into_iter()
            .map(|spec| {
                let mut cells = vec![import_spec(spec)];
                cells.extend(spec.trivia.comment.clone());
                Row::new(&spec.trivia, cells)
            })
            .collect();
        let inner = self.nested(|p| p.rows(rows) + &p.doc(trim_blank(&decl.end_doc)));
        with_comment(
            format!("import (\n{}{})", inner, self.tabs()),
            decl.trivia.comment.as_deref(),
        )
    }

    fn gen_decl(&self, decl: &GenDecl) -> String {
        let keyword = decl.keyword.as_str();

        if !decl.grouped {
            let Some(spec) = decl.specs.first() else {
                return format!("{} ()", keyword);
            };
            let cells = match spec {
                Spec::Type(spec) => self.type_spec_cells(spec),
                Spec::Value(spec) => self.value_spec_cells(spec, false),
            };
            let text: Vec<String> = cells.into_iter().filter(|c| !c.is_empty()).collect();
            return format!("{} {}", keyword, text.join(" "));
        }

        if decl.specs.is_empty() && decl.end_doc.is_empty() {
            return format!("{} ()", keyword);
        }

        let keep_type = keep_type_column(&decl.specs);
        let rows = decl
            .specs
            .iter()
            .zip(keep_type)
            .map(|(spec, keep)| {
                let (trivia, mut cells) = match spec {
                    Spec::Type(spec) => (&spec.trivia, self.nested(|p| p.type_spec_cells(spec))),
                    Spec::Value(spec) => {
                        (&spec.trivia, self.nested(|p| p.value_spec_cells(spec, keep)))
                    }
                };
                if let Some(comment) = &trivia.comment {
                    let columns = match spec {
                        Spec::Type(_) => 2,
                        Spec::Value(_) => 3,
                    };
                    while cells.len() < columns {
                        cells.push(String::new());
                    }
                    cells.push(comment.clone());
                }
                Row::new(trivia, cells)
            })
            .collect();

        let inner = self.nested(|p| p.rows(rows) + &p.doc(trim_blank(&decl.end_doc)));
        format!("{} (\n{}{})", keyword, inner, self.tabs())
    }

    fn type_spec_cells(&self, spec: &TypeSpec) -> Vec<String> {
        let ty = self.type_expr(&spec.ty);
        if spec.alias {
            vec![spec.name.name.clone(), format!("= {}", ty)]
        } else {
            vec![spec.name.name.clone(), ty]
        }
    }

    fn value_spec_cells(&self, spec: &ValueSpec, keep_type: bool) -> Vec<String> {
        let names: Vec<&str> = spec.names.iter().map(|n| n.name.as_str()).collect();
        let mut cells = vec![names.join(", ")];
        match &spec.ty {
            Some(ty) => cells.push(self.type_expr(ty)),
            None if keep_type => cells.push(String::new()),
            None => {}
        }
        if !spec.values.is_empty() {
            cells.push(format!("= {}", self.expr_list(&spec.values, 1)));
        }
        cells
    }

    fn func_decl(&self, decl: &FuncDecl) -> String {
        let mut header = String::from("func ");
        if let Some(recv) = &decl.recv {
            header.push_str(&format!("({}) ", self.param(recv)));
        }
        header.push_str(&decl.name.name);
        header.push_str(&self.signature(&decl.sig));

        match &decl.body {
            Some(body) => format!("{} {}", header, self.func_body(body, header.len())),
            None => header,
        }
    }

    /// A function body, kept on one line when it was written on one line
    /// and is short.
    fn func_body(&self, body: &Block, header_len: usize) -> String {
        if body.stmts.is_empty() && body.end_doc.is_empty() {
            return "{}".to_string();
        }

        let inline = body.end_doc.is_empty()
            && body.stmts.iter().all(|s| {
                s.span.line == body.span.line && s.trivia == Trivia::default()
            });
        if inline {
            let stmts: Vec<String> = body.stmts.iter().map(|s| self.stmt(s)).collect();
            if stmts.iter().all(|s| !s.contains('\n')) {
                let text = format!("{{ {} }}", stmts.join("; "));
                if header_len + text.len() <= MAX_INLINE_BODY {
                    return text;
                }
            }
        }

        self.block(body)
    }

    fn signature(&self, sig: &FuncType) -> String {
        let params: Vec<String> = sig.params.iter().map(|p| self.param(p)).collect();
        let mut out = format!("({})", params.join(", "));

        let unnamed_single = sig.results.len() == 1 && sig.results[0].names.is_empty();
        if unnamed_single {
            out.push(' ');
            out.push_str(&self.type_expr(&sig.results[0].ty));
        } else if !sig.results.is_empty() {
            let results: Vec<String> = sig.results.iter().map(|p| self.param(p)).collect();
            out.push_str(&format!(" ({})", results.join(", ")));
        }
        out
    }

    fn param(&self, param: &Param) -> String {
        let ty = self.type_expr(&param.ty);
        let ty = if param.variadic {
            format!("...{}", ty)
        } else {
            ty
        };
        if param.names.is_empty() {
            ty
        } else {
            let names: Vec<&str> = param.names.iter().map(|n| n.name.as_str()).collect();
            format!("{} {}", names.join(", "), ty)
        }
    }

    // Types

    fn type_expr(&self, ty: &TypeExpr) -> String {
        match ty {
            TypeExpr::Name { pkg: Some(pkg), name } => format!("{}.{}", pkg.name, name.name),
            TypeExpr::Name { pkg: None, name } => name.name.clone(),
            TypeExpr::Pointer { elem, .. } => format!("*{}", self.type_expr(elem)),
            TypeExpr::Slice { elem, .. } => format!("[]{}", self.type_expr(elem)),
            TypeExpr::Array { len, elem, .. } => {
                let len = len
                    .as_ref()
                    .map(|l| self.expr(l))
                    .unwrap_or_else(|| "...".to_string());
                format!("[{}]{}", len, self.type_expr(elem))
            }
            TypeExpr::Map { key, value, .. } => {
                format!("map[{}]{}", self.type_expr(key), self.type_expr(value))
            }
            TypeExpr::Struct {
                fields,
                end_doc,
                span,
            } => self.struct_type(fields, end_doc, span.line),
            TypeExpr::Interface {
                elems,
                end_doc,
                span,
            } => self.interface_type(elems, end_doc, span.line),
            TypeExpr::Func(func) => format!("func{}", self.signature(func)),
            TypeExpr::Paren { inner, .. } => format!("({})", self.type_expr(inner)),
        }
    }

    fn struct_type(&self, fields: &[FieldDecl], end_doc: &[String], line: usize) -> String {
        if fields.is_empty() && end_doc.is_empty() {
            return "struct{}".to_string();
        }

        let one_line = end_doc.is_empty()
            && fields.iter().all(|f| {
                f.trivia == Trivia::default() && field_line(f) == line
            });
        if one_line {
            let text: Vec<String> = fields
                .iter()
                .map(|f| {
                    self.field_cells(f)
                        .into_iter()
                        .filter(|c| !c.is_empty())
                        .collect::<Vec<_>>()
                        .join(" ")
                })
                .collect();
            return format!("struct{{ {} }}", text.join("; "));
        }

        let rows = fields
            .iter()
            .map(|field| {
                let mut cells = self.nested(|p| p.field_cells(field));
                cells.extend(field.trivia.comment.clone());
                Row::new(&field.trivia, cells)
            })
            .collect();
        let inner = self.nested(|p| p.rows(rows) + &p.doc(trim_blank(end_doc)));
        format!("struct {{\n{}{}}}", inner, self.tabs())
    }

    fn field_cells(&self, field: &FieldDecl) -> Vec<String> {
        let ty = self.type_expr(&field.ty);
        let mut cells = if field.names.is_empty() {
            vec![ty, String::new()]
        } else {
            let names: Vec<&str> = field.names.iter().map(|n| n.name.as_str()).collect();
            vec![names.join(", "), ty]
        };
        cells.extend(field.tag.clone());
        cells
    }

    fn interface_type(&self, elems: &[InterfaceElem], end_doc: &[String], line: usize) -> String {
        if elems.is_empty() && end_doc.is_empty() {
            return "interface{}".to_string();
        }

        let one_line = end_doc.is_empty()
            && elems.iter().all(|e| match e {
                InterfaceElem::Method { trivia, name, .. } => {
                    *trivia == Trivia::default() && name.span.line == line
                }
                InterfaceElem::Embed { trivia, ty } => {
                    *trivia == Trivia::default() && ty.span().line == line
                }
            });
        if one_line {
            let text: Vec<String> = elems.iter().map(|e| self.interface_elem(e)).collect();
            return format!("interface{{ {} }}", text.join("; "));
        }

        let rows = elems
            .iter()
            .map(|elem| {
                let trivia = match elem {
                    InterfaceElem::Method { trivia, .. } | InterfaceElem::Embed { trivia, .. } => {
                        trivia
                    }
                };
                let mut cells = vec![self.nested(|p| p.interface_elem(elem))];
                cells.extend(trivia.comment.clone());
                Row::new(trivia, cells)
            })
            .collect();
        let inner = self.nested(|p| p.rows(rows) + &p.doc(trim_blank(end_doc)));
        format!("interface {{\n{}{}}}", inner, self.tabs())
    }

    fn interface_elem(&self, elem: &InterfaceElem) -> String {
        match elem {
            InterfaceElem::Method { name, sig, .. } => {
                format!("{}{}", name.name, self.signature(sig))
            }
            InterfaceElem::Embed { ty, .. } => self.type_expr(ty),
        }
    }

    // Statements

    fn block(&self, block: &Block) -> String {
        let inner = self.nested(|p| p.stmt_list(&block.stmts) + &p.doc(trim_blank(&block.end_doc)));
        format!("{{\n{}{}}}", inner, self.tabs())
    }

    fn stmt_list(&self, stmts: &[Stmt]) -> String {
        let rows = stmts
            .iter()
            .filter(|s| !matches!(s.kind, StmtKind::Empty))
            .map(|stmt| {
                let mut cells = vec![self.stmt(stmt)];
                cells.extend(stmt.trivia.comment.clone());
                Row::new(&stmt.trivia, cells)
            })
            .collect();
        self.rows(rows)
    }

    fn stmt(&self, stmt: &Stmt) -> String {
        match &stmt.kind {
            StmtKind::Decl(decl) => self.gen_decl(decl),
            StmtKind::Expr(expr) => self.expr(expr),
            StmtKind::ShortVar { names, values } => {
                let depth = if names.len() > 1 && values.len() > 1 { 2 } else { 1 };
                let names: Vec<&str> = names.iter().map(|n| n.name.as_str()).collect();
                format!("{} := {}", names.join(", "), self.expr_list(values, depth))
            }
            StmtKind::Assign { lhs, op, rhs } => {
                let depth = if lhs.len() > 1 && rhs.len() > 1 { 2 } else { 1 };
                format!(
                    "{} {} {}",
                    self.expr_list(lhs, depth),
                    op.as_str(),
                    self.expr_list(rhs, depth)
                )
            }
            StmtKind::IncDec { expr, inc } => {
                format!("{}{}", self.expr_at(expr, 2), if *inc { "++" } else { "--" })
            }
            StmtKind::Return(values) if values.is_empty() => "return".to_string(),
            StmtKind::Return(values) => format!("return {}", self.expr_list(values, 1)),
            StmtKind::If(if_stmt) => self.if_stmt(if_stmt),
            StmtKind::For {
                init,
                cond,
                post,
                body,
            } => {
                let header = match (init, cond, post) {
                    (None, None, None) => "for".to_string(),
                    (None, Some(cond), None) => format!("for {}", self.expr(cond)),
                    _ => {
                        let init = init.as_ref().map(|s| self.stmt(s)).unwrap_or_default();
                        let cond = cond.as_ref().map(|c| self.expr(c)).unwrap_or_default();
                        let post = post.as_ref().map(|s| self.stmt(s)).unwrap_or_default();
                        let clause = format!("{}; {}; {}", init, cond, post);
                        format!("for {}", clause.trim_end())
                    }
                };
                format!("{} {}", header, self.block(body))
            }
            StmtKind::Range {
                key,
                value,
                define,
                expr,
                body,
            } => {
                let targets: Vec<String> = [key, value]
                    .into_iter()
                    .flatten()
                    .map(|t| self.expr(t))
                    .collect();
                let header = if targets.is_empty() {
                    format!("for range {}", self.expr(expr))
                } else {
                    let op = if *define { ":=" } else { "=" };
                    format!("for {} {} range {}", targets.join(", "), op, self.expr(expr))
                };
                format!("{} {}", header, self.block(body))
            }
            StmtKind::Switch {
                init,
                tag,
                clauses,
                end_doc,
            } => {
                let mut header = String::from("switch ");
                if let Some(init) = init {
                    header.push_str(&self.stmt(init));
                    header.push_str("; ");
                }
                if let Some(tag) = tag {
                    header.push_str(&self.expr(tag));
                    header.push(' ');
                }
                let clauses: String = clauses
                    .iter()
                    .enumerate()
                    .map(|(i, c)| self.case_clause(c, i == 0))
                    .collect();
                format!(
                    "{}{{\n{}{}{}}}",
                    header,
                    clauses,
                    self.nested(|p| p.doc(trim_blank(end_doc))),
                    self.tabs()
                )
            }
            StmtKind::Branch(kind) => match kind {
                BranchKind::Break => "break".to_string(),
                BranchKind::Continue => "continue".to_string(),
                BranchKind::Fallthrough => "fallthrough".to_string(),
            },
            StmtKind::Block(block) => self.block(block),
            StmtKind::Go(expr) => format!("go {}", self.expr(expr)),
            StmtKind::Defer(expr) => format!("defer {}", self.expr(expr)),
            StmtKind::Empty => String::new(),
        }
    }

    fn case_clause(&self, clause: &CaseClause, first: bool) -> String {
        let mut out = String::new();
        if clause.trivia.blank_before && !first {
            out.push('\n');
        }
        out.push_str(&self.doc(&clause.trivia.doc));
        out.push_str(&self.tabs());
        match &clause.exprs {
            Some(exprs) => out.push_str(&format!("case {}:", self.expr_list(exprs, 1))),
            None => out.push_str("default:"),
        }
        if let Some(comment) = &clause.trivia.comment {
            out.push(' ');
            out.push_str(comment);
        }
        out.push('\n');
        out.push_str(&self.nested(|p| p.stmt_list(&clause.body)));
        out
    }

    fn if_stmt(&self, if_stmt: &IfStmt) -> String {
        let mut out = String::from("if ");
        if let Some(init) = &if_stmt.init {
            out.push_str(&self.stmt(init));
            out.push_str("; ");
        }
        out.push_str(&self.expr(&if_stmt.cond));
        out.push(' ');
        out.push_str(&self.block(&if_stmt.then));
        match if_stmt.els.as_deref() {
            Some(Else::If(nested)) => {
                out.push_str(" else ");
                out.push_str(&self.if_stmt(nested));
            }
            Some(Else::Block(block)) => {
                out.push_str(" else ");
                out.push_str(&self.block(block));
            }
            None => {}
        }
        out
    }

    // Expressions

    /// Expressions separated by commas. `depth` drives operator spacing the
    /// way gofmt does: the deeper an expression is nested, the tighter its
    /// binary operators are printed.
    fn expr_list(&self, exprs: &[Expr], depth: usize) -> String {
        exprs
            .iter()
            .map(|e| self.expr_at(e, depth))
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn expr(&self, expr: &Expr) -> String {
        self.expr_at(expr, 1)
    }

    fn expr_at(&self, expr: &Expr, depth: usize) -> String {
        match expr {
            Expr::Ident(ident) => ident.name.clone(),
            Expr::BasicLit { value, .. } => value.clone(),
            Expr::Composite {
                ty, elems, layout, ..
            } => {
                let ty = ty.as_ref().map(|t| self.type_expr(t)).unwrap_or_default();
                let body = self.list(('{', '}'), layout, |p, i| p.element_cells(&elems[i]));
                format!("{}{}", ty, body)
            }
            Expr::FuncLit { sig, body } => {
                let header = format!("func{}", self.signature(sig));
                format!("{} {}", header, self.func_body(body, header.len()))
            }
            // Parentheses undo one level of depth.
            Expr::Paren { inner, .. } => match inner.as_ref() {
                Expr::Paren { .. } => self.expr_at(inner, depth),
                _ => format!("({})", self.expr_at(inner, depth.saturating_sub(1).max(1))),
            },
            Expr::Selector { expr, sel } => format!("{}.{}", self.expr_at(expr, depth), sel.name),
            Expr::Index { expr, index, .. } => {
                format!("{}[{}]", self.expr_at(expr, 1), self.expr_at(index, depth + 1))
            }
            Expr::Slice {
                expr,
                low,
                high,
                max,
                ..
            } => self.slice(expr, [low, high, max], depth),
            Expr::TypeAssert { expr, ty, .. } => {
                format!("{}.({})", self.expr_at(expr, depth), self.type_expr(ty))
            }
            Expr::Call {
                func,
                args,
                ellipsis,
                layout,
                ..
            } => {
                let depth = if args.len() > 1 { depth + 1 } else { depth };
                let args = self.list(('(', ')'), layout, |p, i| {
                    let mut arg = p.expr_at(&args[i], depth);
                    if *ellipsis && i + 1 == args.len() {
                        arg.push_str("...");
                    }
                    vec![arg]
                });
                format!("{}{}", self.expr_at(func, depth), args)
            }
            Expr::Unary {
                op: UnaryOp::Deref,
                expr,
                ..
            } => format!("*{}", self.expr(expr)),
            Expr::Unary { op, expr, .. } => format!("{}{}", op.as_str(), self.expr_at(expr, depth)),
            Expr::Binary {
                op, left, right, ..
            } => {
                let prec = op.precedence();
                let blank = prec < cutoff(expr, depth);
                let left = self.expr_at(left, depth + diff_prec(left, prec));
                let right = self.expr_at(right, depth + 1);
                if blank {
                    format!("{} {} {}", left, op.as_str(), right)
                } else {
                    format!("{}{}{}", left, op.as_str(), right)
                }
            }
            Expr::Type(ty) => self.type_expr(ty),
        }
    }

    fn slice(&self, expr: &Expr, indices: [&Option<Box<Expr>>; 3], depth: usize) -> String {
        let [low, high, max] = indices;
        let present: Vec<&Expr> = [low, high, max]
            .into_iter()
            .flatten()
            .map(|e| e.as_ref())
            .collect();
        let blanks = depth <= 1
            && present.len() > 1
            && present.iter().any(|e| matches!(e, Expr::Binary { .. }));

        let mut parts: Vec<&Option<Box<Expr>>> = vec![low, high];
        if max.is_some() {
            parts.push(max);
        }

        let mut out = format!("{}[", self.expr_at(expr, 1));
        for (i, part) in parts.iter().enumerate() {
            if i > 0 {
                if blanks && parts[i - 1].is_some() {
                    out.push(' ');
                }
                out.push(':');
                if blanks && part.is_some() {
                    out.push(' ');
                }
            }
            if let Some(index) = part {
                out.push_str(&self.expr_at(index, depth + 1));
            }
        }
        out.push(']');
        out
    }

    /// Alignment cells of a literal element: `key:` and `value`, or `value`.
    fn element_cells(&self, elem: &Element) -> Vec<String> {
        match &elem.key {
            Some(key) => vec![format!("{}:", self.expr(key)), self.expr(&elem.value)],
            None => vec![self.expr(&elem.value)],
        }
    }

    /// A bracketed list of arguments or elements, keeping the source's line
    /// breaks and comments. Items on the opening line stay there; each later
    /// line of items becomes an indented row, with keyed elements aligned.
    fn list(
        &self,
        (open, close): (char, char),
        layout: &ListLayout,
        item: impl Fn(&GoPrinter, usize) -> Vec<String>,
    ) -> String {
        let count = layout.items.len();
        let inline = |p: &GoPrinter, i: usize| {
            let doc = &layout.items[i].trivia.doc;
            let mut text: Vec<String> = doc.iter().filter(|l| !l.is_empty()).cloned().collect();
            text.push(item(p, i).join(" "));
            text.join(" ")
        };

        if layout.is_single_line() {
            let items: Vec<String> = (0..count).map(|i| inline(self, i)).collect();
            return format!("{}{}{}", open, items.join(", "), close);
        }

        let mut out = String::from(open);
        if let Some(comment) = &layout.open_comment {
            out.push(' ');
            out.push_str(comment);
        }

        let head = layout.items.iter().take_while(|i| !i.line_break).count();
        for i in 0..head {
            if i > 0 {
                out.push(' ');
            }
            out.push_str(&inline(self, i));
            if i + 1 < count || layout.close_break {
                out.push(',');
            }
            if let Some(comment) = &layout.items[i].trivia.comment {
                out.push(' ');
                out.push_str(comment);
            }
        }

        // Rows of items, each starting at an item that began a new line.
        let mut lines: Vec<Vec<usize>> = Vec::new();
        for i in head..count {
            match lines.last_mut() {
                Some(line) if !layout.items[i].line_break => line.push(i),
                _ => lines.push(vec![i]),
            }
        }

        let rows = self.nested(|p| {
            lines
                .iter()
                .map(|line| {
                    let first = &layout.items[line[0]];
                    let last = line[line.len() - 1];
                    let comma = last + 1 < count || layout.close_break;

                    let mut cells = if line.len() == 1 {
                        item(p, line[0])
                    } else {
                        let mut text = vec![item(p, line[0]).join(" ")];
                        text.extend(line[1..].iter().map(|&i| inline(p, i)));
                        vec![text.join(", ")]
                    };
                    if comma && let Some(cell) = cells.last_mut() {
                        cell.push(',');
                    }
                    let long_key = cells.len() > 1 && cells[0].chars().count() > SMALL_KEY;
                    cells.extend(layout.items[last].trivia.comment.clone());

                    let mut row = Row::new(&first.trivia, cells);
                    row.breaks = long_key;
                    row
                })
                .collect::<Vec<_>>()
        });
        let inner = self.nested(|p| p.rows(rows) + &p.doc(trim_blank(&layout.end_doc)));

        if !inner.is_empty() {
            out.push('\n');
            out.push_str(&inner);
        }
        if layout.close_break {
            if inner.is_empty() {
                out.push('\n');
            }
            out.push_str(&self.tabs());
        } else if out.ends_with('\n') {
            out.pop();
        }
        out.push(close);
        out
    }

    /// Run `f` one indentation level deeper.
    fn nested<T>(&self, f: impl FnOnce(&GoPrinter) -> T) -> T {
        let inner = GoPrinter {
            output: String::new(),
            indent: self.indent + 1,
        };
        f(&inner)
    }
}

fn with_comment(text: String, comment: Option<&str>) -> String {
    match comment {
        Some(comment) => format!("{} {}", text, comment),
        None => text,
    }
}

fn import_spec(spec: &ImportSpec) -> String {
    match &spec.name {
        Some(name) => format!("{} {}", name.name, spec.path),
        None => spec.path.clone(),
    }
}

/// Sort runs of import specs not separated by blank lines by path.
fn sort_imports(specs: &mut [&ImportSpec]) {
    let mut start = 0;
    while start < specs.len() {
        let mut end = start + 1;
        while end < specs.len() && !specs[end].trivia.blank_before {
            end += 1;
        }
        specs[start..end].sort_by(|a, b| a.path.cmp(&b.path));
        start = end;
    }
}

/// Drop blank-line markers at the end of a comment list.
fn trim_blank(doc: &[String]) -> &[String] {
    let end = doc.iter().rposition(|l| !l.is_empty()).map_or(0, |i| i + 1);
    &doc[..end]
}

/// For each spec of a group, whether it keeps an empty type cell: in a run
/// of specs with values, if any spec of the run has a type.
fn keep_type_column(specs: &[Spec]) -> Vec<bool> {
    let mut keep = vec![false; specs.len()];
    let mut i = 0;
    while i < specs.len() {
        let has_values = |s: &Spec| matches!(s, Spec::Value(v) if !v.values.is_empty());
        if !has_values(&specs[i]) {
            i += 1;
            continue;
        }
        let start = i;
        while i < specs.len() && has_values(&specs[i]) {
            i += 1;
        }
        let typed = specs[start..i]
            .iter()
            .any(|s| matches!(s, Spec::Value(v) if v.ty.is_some()));
        for k in &mut keep[start..i] {
            *k = typed;
        }
    }
    keep
}

fn field_line(field: &FieldDecl) -> usize {
    match field.names.first() {
        Some(name) => name.span.line,
        None => field.ty.span().line,
    }
}

/// Operators of precedence below the cutoff get spaces around them.
fn cutoff(expr: &Expr, depth: usize) -> u8 {
    let (has4, has5, max_problem) = walk_binary(expr);
    if max_problem > 0 {
        return max_problem + 1;
    }
    match (has4 && has5, depth == 1) {
        (true, true) => 5,
        (false, true) => 6,
        _ => 4,
    }
}

/// Which precedence levels a binary expression mixes, and the highest
/// precedence at which dropping spaces would glue two tokens together
/// (`a / *p`, `a & ^b`, `a + +b`).
fn walk_binary(expr: &Expr) -> (bool, bool, u8) {
    let Expr::Binary {
        op, left, right, ..
    } = expr
    else {
        return (false, false, 0);
    };
    let prec = op.precedence();
    let mut has4 = prec == 4;
    let mut has5 = prec == 5;
    let mut max_problem = 0;

    if let Expr::Binary { op: l, .. } = left.as_ref()
        && l.precedence() >= prec
    {
        let (h4, h5, problem) = walk_binary(left);
        has4 |= h4;
        has5 |= h5;
        max_problem = max_problem.max(problem);
    }

    match right.as_ref() {
        Expr::Binary { op: r, .. } if r.precedence() > prec => {
            let (h4, h5, problem) = walk_binary(right);
            has4 |= h4;
            has5 |= h5;
            max_problem = max_problem.max(problem);
        }
        Expr::Unary { op: unary, .. } => match (op, unary) {
            (BinaryOp::Div, UnaryOp::Deref)
            | (BinaryOp::And, UnaryOp::Addr | UnaryOp::Xor) => max_problem = 5,
            (BinaryOp::Add, UnaryOp::Plus) | (BinaryOp::Sub, UnaryOp::Neg) => {
                max_problem = max_problem.max(4)
            }
            _ => {}
        },
        _ => {}
    }

    (has4, has5, max_problem)
}

/// Extra depth for the left operand of a binary operator of precedence `prec`.
fn diff_prec(expr: &Expr, prec: u8) -> usize {
    match expr {
        Expr::Binary { op, .. } if op.precedence() == prec => 0,
        _ => 1,
    }
}

/// Padded width of each terminated cell, following the column blocks of
/// an elastic tabstop writer: a column block is a run of consecutive rows
/// that all have a terminated cell in that column. Columns that are empty
/// throughout a block take no space.
fn column_widths(rows: &[&[String]]) -> Vec<Vec<usize>> {
    let mut widths: Vec<Vec<usize>> = rows
        .iter()
        .map(|r| vec![0; r.len().saturating_sub(1)])
        .collect();
    fill_widths(rows, &mut widths, 0, 0, rows.len());
    widths
}

fn fill_widths(rows: &[&[String]], widths: &mut [Vec<usize>], column: usize, start: usize, end: usize) {
    let terminated = |row: &[String]| row.len() > column + 1;

    let mut i = start;
    while i < end {
        if !terminated(rows[i]) {
            i += 1;
            continue;
        }
        let block_start = i;
        while i < end && terminated(rows[i]) {
            i += 1;
        }

        let width = rows[block_start..i]
            .iter()
            .map(|r| r[column].chars().count())
            .max()
            .unwrap_or(0);
        let padded = if width == 0 { 0 } else { width + 1 };
        for row in &mut widths[block_start..i] {
            row[column] = padded;
        }

        fill_widths(rows, widths, column + 1, block_start, i);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::parser::parse_file;

    fn fmt(source: &str) -> String {
        format_file(&parse_file("test.go", source).unwrap())
    }

    fn assert_stable(source: &str) {
        assert_eq!(fmt(source), source);
    }

    #[test]
    fn test_canonical_source_is_unchanged() {
        assert_stable(
            r#"// Package box holds things.
package box

import (
	"fmt"
	"strings"

	"gomono/generic"
)

// T is the element type.
type T generic.Generic

type Box struct {
	items []T // stored items
	count int
}

// Put adds x.
func (b *Box) Put(x T) {
	b.items = append(b.items, x)

	// Keep the count in sync.
	b.count++
}

func (b *Box) String() string {
	parts := make([]string, 0, len(b.items))
	for _, item := range b.items {
		parts = append(parts, fmt.Sprint(item))
	}
	return strings.Join(parts, ", ")
}
"#,
        );
    }

    #[test]
    fn test_spacing_is_normalized() {
        let source = "package p\nfunc f(a,b int)int{\nreturn a+b*2\n}\nvar x=[]int{1,2}\n";
        assert_eq!(
            fmt(source),
            "package p\n\nfunc f(a, b int) int {\n\treturn a + b*2\n}\n\nvar x = []int{1, 2}\n"
        );
    }

    #[test]
    fn test_struct_fields_are_aligned() {
        let source = "package p\n\ntype Point struct {\n\tX int // x\n\tLongName string `json:\"n\"`\n\n\tembedded\n}\n";
        assert_eq!(
            fmt(source),
            "package p\n\ntype Point struct {\n\tX        int    // x\n\tLongName string `json:\"n\"`\n\n\tembedded\n}\n"
        );
    }

    #[test]
    fn test_grouped_specs_are_aligned() {
        let source = "package p\n\nconst (\n\tA = 1 // one\n\tBBB = 22 // two\n)\n\nvar (\n\tx int = 1\n\tlonger = 2\n)\n";
        assert_eq!(
            fmt(source),
            "package p\n\nconst (\n\tA   = 1  // one\n\tBBB = 22 // two\n)\n\nvar (\n\tx      int = 1\n\tlonger     = 2\n)\n"
        );
    }

    #[test]
    fn test_iota_group() {
        assert_stable("package p\n\nconst (\n\tRed Color = iota\n\tGreen\n\tBlue\n)\n");
    }

    #[test]
    fn test_imports_sorted_within_groups() {
        let source = "package p\n\nimport (\n\t\"strings\"\n\t\"fmt\"\n)\n";
        assert_eq!(fmt(source), "package p\n\nimport (\n\t\"fmt\"\n\t\"strings\"\n)\n");
    }

    #[test]
    fn test_multiline_composite_literal() {
        assert_stable(
            "package p\n\nvar m = map[string]Point{\n\t\"origin\": {0, 0},\n\t\"x\":      {X: 1},\n}\n",
        );
    }

    #[test]
    fn test_control_flow() {
        assert_stable(
            r#"package p

func classify(n int) string {
	if n < 0 {
		return "negative"
	} else if n == 0 {
		return "zero"
	}
	switch {
	case n < 10:
		return "small"
	default:
		return "large"
	}
}

func sum(xs []int) (total int) {
	for i := 0; i < len(xs); i++ {
		total += xs[i]
	}
	for {
		break
	}
	return
}
"#,
        );
    }

    #[test]
    fn test_single_line_bodies_are_kept() {
        assert_stable("package p\n\nfunc id(x int) int { return x }\n\nvar f = func() {}\n");
    }

    #[test]
    fn test_func_literal_body_is_indented() {
        assert_stable("package p\n\nfunc run() {\n\tdefer func() {\n\t\trecover()\n\t}()\n}\n");
    }

    #[test]
    fn test_trailing_comments_align_across_statements() {
        let source = "package p\n\nfunc f() {\n\tx := 1 // a\n\tlonger := 2 // b\n\t_, _ = x, longer\n}\n";
        assert_eq!(
            fmt(source),
            "package p\n\nfunc f() {\n\tx := 1      // a\n\tlonger := 2 // b\n\t_, _ = x, longer\n}\n"
        );
    }

    #[test]
    fn test_comment_before_closing_brace() {
        assert_stable("package p\n\nfunc f() {\n\tg()\n\t// done\n}\n\n// trailing\n");
    }

    #[test]
    fn test_binary_spacing_follows_precedence() {
        let source = "package p\n\nfunc f() {\nx := a*b+c\ny := x==1&&y==2\nz := g(i, len(r)-1)\nw := buf[i+1]\nv := (a+b)*c\nu := a/ *p\nt := s[i+1 : j]\nk, l = a+1, b+2\nm := -x + -y\n}\n";
        assert_eq!(
            fmt(source),
            "package p\n\nfunc f() {\n\tx := a*b + c\n\ty := x == 1 && y == 2\n\tz := g(i, len(r)-1)\n\tw := buf[i+1]\n\tv := (a + b) * c\n\tu := a / *p\n\tt := s[i+1 : j]\n\tk, l = a+1, b+2\n\tm := -x + -y\n}\n"
        );
    }

    #[test]
    fn test_loop_header_spacing() {
        assert_stable("package p\n\nfunc f(xs []int) {\n\tfor i := 0; i < len(xs)-1; i += 2 {\n\t\txs[i] = xs[i+1] * 2\n\t}\n}\n");
    }

    #[test]
    fn test_comments_in_composite_literal_are_kept() {
        assert_stable(
            "package p\n\nvar names = map[int]string{ // by code\n\t// zero is reserved\n\t0:  \"none\", // unused\n\t10: \"ten\",\n\n\t// last\n\t20: \"twenty\",\n\t// more later\n}\n",
        );
    }

    #[test]
    fn test_multiline_call_arguments_are_kept() {
        assert_stable(
            "package p\n\nfunc f() {\n\tg(a,\n\t\tb, c)\n\th(\n\t\tfirst,  // one\n\t\tsecond, // two\n\t)\n}\n",
        );
    }

    #[test]
    fn test_inline_comments_stay_in_line() {
        assert_stable("package p\n\nvar x = []int{1, /* two */ 2, 3}\n");
    }

    #[test]
    fn test_package_clause_comment() {
        assert_stable("package p // import \"example.com/p\"\n");
    }

    #[test]
    fn test_output_is_deterministic() {
        let source = "package p\n\ntype A struct {\n\tX, Y int\n}\n";
        assert_eq!(fmt(source), fmt(source));
    }
}
