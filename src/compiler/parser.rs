use crate::compiler::ast::*;
use crate::compiler::lexer::{Span, Token, TokenKind};

/// A recursive descent parser for Go source files.
pub struct Parser<'a> {
    filename: &'a str,
    tokens: Vec<Token>,
    current: usize,
    /// Negative inside `if`/`for`/`switch` headers, where `T{` opens the body.
    expr_lev: i32,
}

impl<'a> Parser<'a> {
    pub fn new(filename: &'a str, tokens: Vec<Token>) -> Self {
        Self {
            filename,
            tokens,
            current: 0,
            expr_lev: 0,
        }
    }

    pub fn parse(&mut self) -> Result<File, String> {
        let mut trivia = self.leading();
        self.expect(&TokenKind::Package)?;
        let package = self.expect_ident()?;
        trivia.comment = self.semi()?;

        let mut imports = Vec::new();
        while self.check(&TokenKind::Import) {
            imports.push(self.import_decl()?);
        }

        let mut decls = Vec::new();
        while !self.is_at_end() {
            decls.push(self.top_decl()?);
        }

        let trailing_doc = self.closing_doc();

        Ok(File {
            path: self.filename.to_string(),
            trivia,
            package,
            imports,
            decls,
            trailing_doc,
        })
    }

    fn import_decl(&mut self) -> Result<ImportDecl, String> {
        let mut trivia = self.leading();
        let span = self.current_span();
        self.expect(&TokenKind::Import)?;

        let mut specs = Vec::new();
        let mut end_doc = Vec::new();
        let grouped = self.match_token(&TokenKind::LParen);
        if grouped {
            while !self.check(&TokenKind::RParen) && !self.is_at_end() {
                let mut spec_trivia = self.leading();
                let mut spec = self.import_spec()?;
                spec_trivia.comment = self.semi()?;
                spec.trivia = spec_trivia;
                specs.push(spec);
            }
            end_doc = self.closing_doc();
            self.expect(&TokenKind::RParen)?;
        } else {
            specs.push(self.import_spec()?);
        }
        trivia.comment = self.semi()?;

        Ok(ImportDecl {
            trivia,
            specs,
            grouped,
            end_doc,
            span,
        })
    }

    fn import_spec(&mut self) -> Result<ImportSpec, String> {
        let span = self.current_span();
        let name = if self.check_ident() {
            Some(self.expect_ident()?)
        } else if self.match_token(&TokenKind::Dot) {
            Some(Ident::new(".", self.previous_span()))
        } else {
            None
        };

        let path = match self.peek_kind() {
            Some(TokenKind::Str(path)) => path.clone(),
            _ => return Err(self.error("expected import path")),
        };
        self.advance();

        Ok(ImportSpec {
            trivia: Trivia::default(),
            name,
            path,
            span,
        })
    }

    fn top_decl(&mut self) -> Result<Decl, String> {
        let start = self.current;
        let trivia = self.leading();
        let keyword = match self.peek_kind() {
            Some(TokenKind::Const) => DeclKeyword::Const,
            Some(TokenKind::Var) => DeclKeyword::Var,
            Some(TokenKind::Type) => DeclKeyword::Type,
            Some(TokenKind::Func) => {
                let mut func = self.func_decl(trivia)?;
                func.trivia.comment = self.semi()?;
                let stray = self.stray_comments(start);
                func.trivia.doc.extend(stray);
                return Ok(Decl::Func(func));
            }
            Some(TokenKind::Import) => {
                return Err(self.error("imports must appear before other declarations"));
            }
            _ => return Err(self.error("expected declaration")),
        };

        let mut decl = self.gen_decl(keyword, trivia)?;
        decl.trivia.comment = self.semi()?;
        let stray = self.stray_comments(start);
        decl.trivia.doc.extend(stray);
        Ok(Decl::Gen(decl))
    }

    fn gen_decl(&mut self, keyword: DeclKeyword, trivia: Trivia) -> Result<GenDecl, String> {
        let span = self.current_span();
        self.advance(); // const / var / type

        let mut specs = Vec::new();
        let mut end_doc = Vec::new();
        let grouped = self.match_token(&TokenKind::LParen);
        if grouped {
            let mut iota = 0;
            while !self.check(&TokenKind::RParen) && !self.is_at_end() {
                let start = self.current;
                let mut spec_trivia = self.leading();
                let mut spec = self.spec(keyword, iota)?;
                spec_trivia.comment = self.semi()?;
                spec_trivia.doc.extend(self.stray_comments(start));
                match &mut spec {
                    Spec::Value(value) => value.trivia = spec_trivia,
                    Spec::Type(ty) => ty.trivia = spec_trivia,
                }
                specs.push(spec);
                iota += 1;
            }
            end_doc = self.closing_doc();
            self.expect(&TokenKind::RParen)?;
        } else {
            specs.push(self.spec(keyword, 0)?);
        }

        Ok(GenDecl {
            trivia,
            keyword,
            specs,
            grouped,
            end_doc,
            span,
        })
    }

    fn spec(&mut self, keyword: DeclKeyword, iota: usize) -> Result<Spec, String> {
        let span = self.current_span();

        if keyword == DeclKeyword::Type {
            let name = self.expect_ident()?;
            let alias = self.match_token(&TokenKind::Eq);
            let ty = self.parse_type()?;
            return Ok(Spec::Type(TypeSpec {
                trivia: Trivia::default(),
                name,
                alias,
                ty,
                span,
            }));
        }

        let names = self.ident_list()?;
        let ty = if !self.check(&TokenKind::Eq)
            && !self.check(&TokenKind::Semi)
            && !self.check(&TokenKind::RParen)
        {
            Some(self.parse_type()?)
        } else {
            None
        };
        let values = if self.match_token(&TokenKind::Eq) {
            self.expr_list()?
        } else {
            Vec::new()
        };

        if keyword == DeclKeyword::Var && ty.is_none() && values.is_empty() {
            return Err(self.error("expected type or initializer"));
        }

        Ok(Spec::Value(ValueSpec {
            trivia: Trivia::default(),
            names,
            ty,
            values,
            iota,
            span,
        }))
    }

    fn func_decl(&mut self, trivia: Trivia) -> Result<FuncDecl, String> {
        let span = self.current_span();
        self.expect(&TokenKind::Func)?;

        let recv = if self.check(&TokenKind::LParen) {
            let mut params = self.param_list()?;
            if params.len() != 1 || params[0].names.len() > 1 || params[0].variadic {
                return Err(self.error("method has multiple receivers"));
            }
            params.pop()
        } else {
            None
        };

        let name = self.expect_ident()?;
        let sig = self.signature(span)?;
        let body = if self.check(&TokenKind::LBrace) {
            Some(self.block()?)
        } else {
            None
        };

        Ok(FuncDecl {
            trivia,
            recv,
            name,
            sig,
            body,
            span,
        })
    }

    fn signature(&mut self, span: Span) -> Result<FuncType, String> {
        let params = self.param_list()?;
        let results = if self.check(&TokenKind::LParen) {
            self.param_list()?
        } else if self.check_type_start() {
            vec![Param {
                names: Vec::new(),
                ty: self.parse_type()?,
                variadic: false,
            }]
        } else {
            Vec::new()
        };

        Ok(FuncType {
            params,
            results,
            span,
        })
    }

    fn param_list(&mut self) -> Result<Vec<Param>, String> {
        self.expect(&TokenKind::LParen)?;

        let mut entries: Vec<(Option<Ident>, TypeExpr, bool)> = Vec::new();
        while !self.check(&TokenKind::RParen) && !self.is_at_end() {
            if self.match_token(&TokenKind::Ellipsis) {
                entries.push((None, self.parse_type()?, true));
            } else {
                let ty = self.parse_type()?;
                if !self.check(&TokenKind::Comma) && !self.check(&TokenKind::RParen) {
                    let TypeExpr::Name { pkg: None, name } = ty else {
                        return Err(self.error("expected parameter name"));
                    };
                    let variadic = self.match_token(&TokenKind::Ellipsis);
                    entries.push((Some(name), self.parse_type()?, variadic));
                } else {
                    entries.push((None, ty, false));
                }
            }
            if !self.match_token(&TokenKind::Comma) {
                break;
            }
        }
        self.expect(&TokenKind::RParen)?;

        if !entries.iter().any(|(name, _, _)| name.is_some()) {
            return Ok(entries
                .into_iter()
                .map(|(_, ty, variadic)| Param {
                    names: Vec::new(),
                    ty,
                    variadic,
                })
                .collect());
        }

        // `a, b int, c string`: bare entries are names waiting for a type.
        let mut params = Vec::new();
        let mut pending = Vec::new();
        for (name, ty, variadic) in entries {
            match name {
                Some(name) => {
                    pending.push(name);
                    params.push(Param {
                        names: std::mem::take(&mut pending),
                        ty,
                        variadic,
                    });
                }
                None => match ty {
                    TypeExpr::Name { pkg: None, name } if !variadic => pending.push(name),
                    _ => return Err(self.error("mixed named and unnamed parameters")),
                },
            }
        }
        if !pending.is_empty() {
            return Err(self.error("mixed named and unnamed parameters"));
        }

        Ok(params)
    }

    // Types

    fn check_type_start(&self) -> bool {
        matches!(
            self.peek_kind(),
            Some(
                TokenKind::Ident(_)
                    | TokenKind::Star
                    | TokenKind::LBracket
                    | TokenKind::Map
                    | TokenKind::Struct
                    | TokenKind::Interface
                    | TokenKind::Func
                    | TokenKind::LParen
                    | TokenKind::Chan
                    | TokenKind::Arrow
            )
        )
    }

    pub fn parse_type(&mut self) -> Result<TypeExpr, String> {
        let span = self.current_span();

        match self.peek_kind() {
            Some(TokenKind::Ident(_)) => {
                let first = self.expect_ident()?;
                if self.check(&TokenKind::Dot) && self.check_ident_ahead(1) {
                    self.advance();
                    let name = self.expect_ident()?;
                    Ok(TypeExpr::Name {
                        pkg: Some(first),
                        name,
                    })
                } else {
                    Ok(TypeExpr::Name {
                        pkg: None,
                        name: first,
                    })
                }
            }
            Some(TokenKind::Star) => {
                self.advance();
                let elem = Box::new(self.parse_type()?);
                Ok(TypeExpr::Pointer { elem, span })
            }
            Some(TokenKind::LBracket) => {
                self.advance();
                if self.match_token(&TokenKind::RBracket) {
                    let elem = Box::new(self.parse_type()?);
                    return Ok(TypeExpr::Slice { elem, span });
                }
                let len = if self.match_token(&TokenKind::Ellipsis) {
                    None
                } else {
                    let old = self.expr_lev;
                    self.expr_lev += 1;
                    let len = self.expression();
                    self.expr_lev = old;
                    Some(Box::new(len?))
                };
                self.expect(&TokenKind::RBracket)?;
                let elem = Box::new(self.parse_type()?);
                Ok(TypeExpr::Array { len, elem, span })
            }
            Some(TokenKind::Map) => {
                self.advance();
                self.expect(&TokenKind::LBracket)?;
                let key = Box::new(self.parse_type()?);
                self.expect(&TokenKind::RBracket)?;
                let value = Box::new(self.parse_type()?);
                Ok(TypeExpr::Map { key, value, span })
            }
            Some(TokenKind::Struct) => self.struct_type(),
            Some(TokenKind::Interface) => self.interface_type(),
            Some(TokenKind::Func) => {
                self.advance();
                Ok(TypeExpr::Func(self.signature(span)?))
            }
            Some(TokenKind::LParen) => {
                self.advance();
                let inner = Box::new(self.parse_type()?);
                self.expect(&TokenKind::RParen)?;
                Ok(TypeExpr::Paren { inner, span })
            }
            Some(TokenKind::Chan | TokenKind::Arrow) => {
                Err(self.error("channel types are not supported"))
            }
            _ => Err(self.error("expected type")),
        }
    }

    fn struct_type(&mut self) -> Result<TypeExpr, String> {
        let span = self.current_span();
        self.expect(&TokenKind::Struct)?;
        self.expect(&TokenKind::LBrace)?;

        let mut fields = Vec::new();
        while !self.check(&TokenKind::RBrace) && !self.is_at_end() {
            let start = self.current;
            let mut trivia = self.leading();

            let embedded = self.check(&TokenKind::Star)
                || (self.check_ident()
                    && matches!(
                        self.peek_kind_ahead(1),
                        Some(TokenKind::Dot | TokenKind::Semi | TokenKind::RBrace | TokenKind::Str(_))
                    ));

            let (names, ty) = if embedded {
                (Vec::new(), self.parse_type()?)
            } else {
                let names = self.ident_list()?;
                (names, self.parse_type()?)
            };

            let tag = match self.peek_kind() {
                Some(TokenKind::Str(tag)) => {
                    let tag = tag.clone();
                    self.advance();
                    Some(tag)
                }
                _ => None,
            };

            trivia.comment = self.semi()?;
            trivia.doc.extend(self.stray_comments(start));
            fields.push(FieldDecl {
                trivia,
                names,
                ty,
                tag,
            });
        }

        let end_doc = self.closing_doc();
        self.expect(&TokenKind::RBrace)?;

        Ok(TypeExpr::Struct {
            fields,
            end_doc,
            span,
        })
    }

    fn interface_type(&mut self) -> Result<TypeExpr, String> {
        let span = self.current_span();
        self.expect(&TokenKind::Interface)?;
        self.expect(&TokenKind::LBrace)?;

        let mut elems = Vec::new();
        while !self.check(&TokenKind::RBrace) && !self.is_at_end() {
            let mut trivia = self.leading();

            if self.check_ident() && self.check_ahead(&TokenKind::LParen, 1) {
                let name = self.expect_ident()?;
                let sig = self.signature(name.span)?;
                trivia.comment = self.semi()?;
                elems.push(InterfaceElem::Method { trivia, name, sig });
            } else {
                let ty = self.parse_type()?;
                trivia.comment = self.semi()?;
                elems.push(InterfaceElem::Embed { trivia, ty });
            }
        }

        let end_doc = self.closing_doc();
        self.expect(&TokenKind::RBrace)?;

        Ok(TypeExpr::Interface {
            elems,
            end_doc,
            span,
        })
    }

    // Statements

    fn block(&mut self) -> Result<Block, String> {
        let span = self.current_span();
        self.expect(&TokenKind::LBrace)?;

        let old = self.expr_lev;
        self.expr_lev = 0;
        let stmts = self.stmt_list();
        self.expr_lev = old;
        let stmts = stmts?;

        let end_doc = self.closing_doc();
        self.expect(&TokenKind::RBrace)?;

        Ok(Block {
            stmts,
            end_doc,
            span,
        })
    }

    fn stmt_list(&mut self) -> Result<Vec<Stmt>, String> {
        let mut stmts = Vec::new();
        while !self.check(&TokenKind::RBrace)
            && !self.check(&TokenKind::Case)
            && !self.check(&TokenKind::Default)
            && !self.is_at_end()
        {
            if self.match_token(&TokenKind::Semi) {
                continue;
            }
            stmts.push(self.statement()?);
        }
        Ok(stmts)
    }

    fn statement(&mut self) -> Result<Stmt, String> {
        let start = self.current;
        let mut trivia = self.leading();
        let span = self.current_span();

        let kind = match self.peek_kind() {
            Some(TokenKind::Const) => {
                StmtKind::Decl(self.gen_decl(DeclKeyword::Const, Trivia::default())?)
            }
            Some(TokenKind::Var) => {
                StmtKind::Decl(self.gen_decl(DeclKeyword::Var, Trivia::default())?)
            }
            Some(TokenKind::Type) => {
                StmtKind::Decl(self.gen_decl(DeclKeyword::Type, Trivia::default())?)
            }
            Some(TokenKind::Return) => {
                self.advance();
                if self.check(&TokenKind::Semi) || self.check(&TokenKind::RBrace) {
                    StmtKind::Return(Vec::new())
                } else {
                    StmtKind::Return(self.expr_list()?)
                }
            }
            Some(TokenKind::If) => StmtKind::If(self.if_stmt()?),
            Some(TokenKind::For) => self.for_stmt()?,
            Some(TokenKind::Switch) => self.switch_stmt()?,
            Some(TokenKind::Break | TokenKind::Continue | TokenKind::Fallthrough) => {
                let kind = match self.peek_kind() {
                    Some(TokenKind::Break) => BranchKind::Break,
                    Some(TokenKind::Continue) => BranchKind::Continue,
                    _ => BranchKind::Fallthrough,
                };
                self.advance();
                if self.check_ident() {
                    return Err(self.error("labels are not supported"));
                }
                StmtKind::Branch(kind)
            }
            Some(TokenKind::LBrace) => StmtKind::Block(self.block()?),
            Some(TokenKind::Go) => {
                self.advance();
                StmtKind::Go(self.expression()?)
            }
            Some(TokenKind::Defer) => {
                self.advance();
                StmtKind::Defer(self.expression()?)
            }
            Some(TokenKind::Goto) => return Err(self.error("goto is not supported")),
            Some(TokenKind::Select) => return Err(self.error("select is not supported")),
            _ => self.simple_stmt()?,
        };

        trivia.comment = self.semi()?;
        trivia.doc.extend(self.stray_comments(start));
        Ok(Stmt { kind, trivia, span })
    }

    fn simple_stmt(&mut self) -> Result<StmtKind, String> {
        let lhs = self.expr_list()?;
        self.simple_stmt_from(lhs)
    }

    fn simple_stmt_from(&mut self, mut lhs: Vec<Expr>) -> Result<StmtKind, String> {
        if self.match_token(&TokenKind::Define) {
            let mut names = Vec::new();
            for expr in lhs {
                match expr {
                    Expr::Ident(ident) => names.push(ident),
                    _ => return Err(self.error("non-name on left side of :=")),
                }
            }
            let values = self.expr_list()?;
            return Ok(StmtKind::ShortVar { names, values });
        }

        if let Some(op) = self.assign_op() {
            self.advance();
            let rhs = self.expr_list()?;
            return Ok(StmtKind::Assign { lhs, op, rhs });
        }

        if lhs.len() != 1 {
            return Err(self.error("expected 1 expression"));
        }
        let expr = lhs.remove(0);

        if self.match_token(&TokenKind::Inc) {
            return Ok(StmtKind::IncDec { expr, inc: true });
        }
        if self.match_token(&TokenKind::Dec) {
            return Ok(StmtKind::IncDec { expr, inc: false });
        }

        Ok(StmtKind::Expr(expr))
    }

    fn assign_op(&self) -> Option<AssignOp> {
        let op = match self.peek_kind()? {
            TokenKind::Eq => AssignOp::Assign,
            TokenKind::PlusEq => AssignOp::Add,
            TokenKind::MinusEq => AssignOp::Sub,
            TokenKind::StarEq => AssignOp::Mul,
            TokenKind::SlashEq => AssignOp::Div,
            TokenKind::PercentEq => AssignOp::Rem,
            TokenKind::AmpEq => AssignOp::And,
            TokenKind::PipeEq => AssignOp::Or,
            TokenKind::CaretEq => AssignOp::Xor,
            TokenKind::ShlEq => AssignOp::Shl,
            TokenKind::ShrEq => AssignOp::Shr,
            TokenKind::AndNotEq => AssignOp::AndNot,
            _ => return None,
        };
        Some(op)
    }

    fn header_stmt(&self, kind: StmtKind, span: Span) -> Box<Stmt> {
        Box::new(Stmt {
            kind,
            trivia: Trivia::default(),
            span,
        })
    }

    fn if_stmt(&mut self) -> Result<IfStmt, String> {
        self.expect(&TokenKind::If)?;

        let old = self.expr_lev;
        self.expr_lev = -1;
        let header = self.if_header();
        self.expr_lev = old;
        let (init, cond) = header?;

        let then = self.block()?;
        let els = if self.match_token(&TokenKind::Else) {
            if self.check(&TokenKind::If) {
                Some(Box::new(Else::If(self.if_stmt()?)))
            } else if self.check(&TokenKind::LBrace) {
                Some(Box::new(Else::Block(self.block()?)))
            } else {
                return Err(self.error("expected if statement or block after else"));
            }
        } else {
            None
        };

        Ok(IfStmt {
            init,
            cond,
            then,
            els,
        })
    }

    fn if_header(&mut self) -> Result<(Option<Box<Stmt>>, Expr), String> {
        if self.check(&TokenKind::LBrace) {
            return Err(self.error("missing condition in if statement"));
        }

        let span = self.current_span();
        let first = if self.check(&TokenKind::Semi) {
            None
        } else {
            Some(self.simple_stmt()?)
        };

        if self.match_token(&TokenKind::Semi) {
            let init = first.map(|kind| self.header_stmt(kind, span));
            let cond = self.expression()?;
            return Ok((init, cond));
        }

        match first {
            Some(StmtKind::Expr(cond)) => Ok((None, cond)),
            _ => Err(self.error("expected condition in if statement")),
        }
    }

    fn for_stmt(&mut self) -> Result<StmtKind, String> {
        self.expect(&TokenKind::For)?;

        let old = self.expr_lev;
        self.expr_lev = -1;
        let header = self.for_header();
        self.expr_lev = old;
        let header = header?;

        let body = self.block()?;

        Ok(match header {
            ForHeader::Range {
                key,
                value,
                define,
                expr,
            } => StmtKind::Range {
                key,
                value,
                define,
                expr,
                body,
            },
            ForHeader::Loop { init, cond, post } => StmtKind::For {
                init,
                cond,
                post,
                body,
            },
        })
    }

    fn for_header(&mut self) -> Result<ForHeader, String> {
        if self.check(&TokenKind::LBrace) {
            return Ok(ForHeader::Loop {
                init: None,
                cond: None,
                post: None,
            });
        }

        if self.match_token(&TokenKind::Range) {
            let expr = self.expression()?;
            return Ok(ForHeader::Range {
                key: None,
                value: None,
                define: false,
                expr,
            });
        }

        let span = self.current_span();
        let mut first = None;
        if !self.check(&TokenKind::Semi) {
            let mut lhs = self.expr_list()?;
            let is_range = (self.check(&TokenKind::Define) || self.check(&TokenKind::Eq))
                && self.check_ahead(&TokenKind::Range, 1);
            if is_range {
                let define = self.check(&TokenKind::Define);
                self.advance();
                self.advance(); // range
                if lhs.len() > 2 {
                    return Err(self.error("range clause permits at most two iteration variables"));
                }
                let value = if lhs.len() == 2 { lhs.pop() } else { None };
                let key = lhs.pop();
                let expr = self.expression()?;
                return Ok(ForHeader::Range {
                    key,
                    value,
                    define,
                    expr,
                });
            }
            first = Some(self.simple_stmt_from(lhs)?);
        }

        if self.match_token(&TokenKind::Semi) {
            let init = first.map(|kind| self.header_stmt(kind, span));
            let cond = if self.check(&TokenKind::Semi) {
                None
            } else {
                Some(self.expression()?)
            };
            self.expect(&TokenKind::Semi)?;
            let post = if self.check(&TokenKind::LBrace) {
                None
            } else {
                let post_span = self.current_span();
                let kind = self.simple_stmt()?;
                Some(self.header_stmt(kind, post_span))
            };
            return Ok(ForHeader::Loop { init, cond, post });
        }

        match first {
            Some(StmtKind::Expr(cond)) => Ok(ForHeader::Loop {
                init: None,
                cond: Some(cond),
                post: None,
            }),
            _ => Err(self.error("expected for loop condition")),
        }
    }

    fn switch_stmt(&mut self) -> Result<StmtKind, String> {
        self.expect(&TokenKind::Switch)?;

        let old = self.expr_lev;
        self.expr_lev = -1;
        let header = self.switch_header();
        self.expr_lev = old;
        let (init, tag) = header?;

        self.expect(&TokenKind::LBrace)?;
        let mut clauses = Vec::new();
        while self.check(&TokenKind::Case) || self.check(&TokenKind::Default) {
            let trivia = self.leading();
            let span = self.current_span();
            let exprs = if self.match_token(&TokenKind::Case) {
                Some(self.expr_list()?)
            } else {
                self.advance();
                None
            };
            self.expect(&TokenKind::Colon)?;
            let body = self.stmt_list()?;
            clauses.push(CaseClause {
                trivia,
                exprs,
                body,
                span,
            });
        }
        let end_doc = self.closing_doc();
        self.expect(&TokenKind::RBrace)?;

        Ok(StmtKind::Switch {
            init,
            tag,
            clauses,
            end_doc,
        })
    }

    fn switch_header(&mut self) -> Result<(Option<Box<Stmt>>, Option<Expr>), String> {
        if self.check(&TokenKind::LBrace) {
            return Ok((None, None));
        }

        let span = self.current_span();
        let first = if self.check(&TokenKind::Semi) {
            None
        } else {
            Some(self.simple_stmt()?)
        };

        if self.match_token(&TokenKind::Semi) {
            let init = first.map(|kind| self.header_stmt(kind, span));
            let tag = if self.check(&TokenKind::LBrace) {
                None
            } else {
                Some(self.expression()?)
            };
            return Ok((init, tag));
        }

        match first {
            Some(StmtKind::Expr(tag)) => Ok((None, Some(tag))),
            _ => Err(self.error("expected switch expression")),
        }
    }

    // Expression parsing with precedence climbing

    pub fn expression(&mut self) -> Result<Expr, String> {
        self.binary_expr(1)
    }

    fn binary_op(&self) -> Option<BinaryOp> {
        let op = match self.peek_kind()? {
            TokenKind::OrOr => BinaryOp::LogOr,
            TokenKind::AndAnd => BinaryOp::LogAnd,
            TokenKind::EqEq => BinaryOp::Eq,
            TokenKind::NotEq => BinaryOp::Ne,
            TokenKind::Lt => BinaryOp::Lt,
            TokenKind::Le => BinaryOp::Le,
            TokenKind::Gt => BinaryOp::Gt,
            TokenKind::Ge => BinaryOp::Ge,
            TokenKind::Plus => BinaryOp::Add,
            TokenKind::Minus => BinaryOp::Sub,
            TokenKind::Pipe => BinaryOp::Or,
            TokenKind::Caret => BinaryOp::Xor,
            TokenKind::Star => BinaryOp::Mul,
            TokenKind::Slash => BinaryOp::Div,
            TokenKind::Percent => BinaryOp::Rem,
            TokenKind::Shl => BinaryOp::Shl,
            TokenKind::Shr => BinaryOp::Shr,
            TokenKind::Amp => BinaryOp::And,
            TokenKind::AndNot => BinaryOp::AndNot,
            _ => return None,
        };
        Some(op)
    }

    fn binary_expr(&mut self, min_prec: u8) -> Result<Expr, String> {
        let mut left = self.unary_expr()?;

        while let Some(op) = self.binary_op() {
            if op.precedence() < min_prec {
                break;
            }
            self.advance();
            let span = left.span();
            let right = self.binary_expr(op.precedence() + 1)?;
            left = Expr::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
                span,
            };
        }

        Ok(left)
    }

    fn unary_expr(&mut self) -> Result<Expr, String> {
        let op = match self.peek_kind() {
            Some(TokenKind::Plus) => UnaryOp::Plus,
            Some(TokenKind::Minus) => UnaryOp::Neg,
            Some(TokenKind::Bang) => UnaryOp::Not,
            Some(TokenKind::Caret) => UnaryOp::Xor,
            Some(TokenKind::Star) => UnaryOp::Deref,
            Some(TokenKind::Amp) => UnaryOp::Addr,
            Some(TokenKind::Arrow) => return Err(self.error("channel operations are not supported")),
            _ => return self.primary_expr(),
        };

        let span = self.current_span();
        self.advance();
        let expr = self.unary_expr()?;
        Ok(Expr::Unary {
            op,
            expr: Box::new(expr),
            span,
        })
    }

    fn primary_expr(&mut self) -> Result<Expr, String> {
        let mut expr = self.operand()?;

        loop {
            match self.peek_kind() {
                Some(TokenKind::Dot) => {
                    self.advance();
                    if self.match_token(&TokenKind::LParen) {
                        let span = self.previous_span();
                        if self.check(&TokenKind::Type) {
                            return Err(self.error("type switches are not supported"));
                        }
                        let ty = self.parse_type()?;
                        self.expect(&TokenKind::RParen)?;
                        expr = Expr::TypeAssert {
                            expr: Box::new(expr),
                            ty,
                            span,
                        };
                    } else {
                        let sel = self.expect_ident()?;
                        expr = Expr::Selector {
                            expr: Box::new(expr),
                            sel,
                        };
                    }
                }
                Some(TokenKind::LBracket) => {
                    let span = self.current_span();
                    self.advance();
                    self.expr_lev += 1;
                    let result = self.index_or_slice(expr, span);
                    self.expr_lev -= 1;
                    expr = result?;
                    self.expect(&TokenKind::RBracket)?;
                }
                Some(TokenKind::LParen) => {
                    let span = self.current_span();
                    self.advance();
                    self.expr_lev += 1;
                    let result = self.call_args();
                    self.expr_lev -= 1;
                    let (args, ellipsis, layout) = result?;
                    self.expect(&TokenKind::RParen)?;
                    expr = Expr::Call {
                        func: Box::new(expr),
                        args,
                        ellipsis,
                        layout,
                        span,
                    };
                }
                Some(TokenKind::LBrace)
                    if is_literal_type(&expr) && (self.expr_lev >= 0 || !is_type_name(&expr)) =>
                {
                    let span = expr.span();
                    let ty = expr_to_type(expr);
                    expr = self.composite_lit(ty, span)?;
                }
                _ => break,
            }
        }

        Ok(expr)
    }

    fn index_or_slice(&mut self, expr: Expr, span: Span) -> Result<Expr, String> {
        let low = if self.check(&TokenKind::Colon) {
            None
        } else {
            Some(Box::new(self.expression()?))
        };

        if !self.match_token(&TokenKind::Colon) {
            let Some(index) = low else {
                return Err(self.error("expected operand"));
            };
            return Ok(Expr::Index {
                expr: Box::new(expr),
                index,
                span,
            });
        }

        let high = if self.check(&TokenKind::Colon) || self.check(&TokenKind::RBracket) {
            None
        } else {
            Some(Box::new(self.expression()?))
        };
        let max = if self.match_token(&TokenKind::Colon) {
            if high.is_none() {
                return Err(self.error("middle index required in 3-index slice"));
            }
            Some(Box::new(self.expression()?))
        } else {
            None
        };

        Ok(Expr::Slice {
            expr: Box::new(expr),
            low,
            high,
            max,
            span,
        })
    }

    fn call_args(&mut self) -> Result<(Vec<Expr>, bool, ListLayout), String> {
        let mut ellipsis = false;
        let (args, layout) = self.list(&TokenKind::RParen, |p| {
            if ellipsis {
                return Err(p.error("can only use ... with final argument"));
            }
            let arg = p.expression()?;
            ellipsis = p.match_token(&TokenKind::Ellipsis);
            Ok(arg)
        })?;
        Ok((args, ellipsis, layout))
    }

    fn composite_lit(&mut self, ty: Option<TypeExpr>, span: Span) -> Result<Expr, String> {
        self.expect(&TokenKind::LBrace)?;

        let old = self.expr_lev;
        self.expr_lev = 1;
        let elems = self.list(&TokenKind::RBrace, |p| p.element());
        self.expr_lev = old;
        let (elems, layout) = elems?;

        self.expect(&TokenKind::RBrace)?;

        Ok(Expr::Composite {
            ty,
            elems,
            layout,
            span,
        })
    }

    fn element(&mut self) -> Result<Element, String> {
        let first = self.element_value()?;
        if self.match_token(&TokenKind::Colon) {
            Ok(Element {
                key: Some(first),
                value: self.element_value()?,
            })
        } else {
            Ok(Element {
                key: None,
                value: first,
            })
        }
    }

    /// Comma separated items up to `close`, which is left unconsumed. The
    /// opening bracket must be the previous token.
    fn list<T>(
        &mut self,
        close: &TokenKind,
        mut item: impl FnMut(&mut Self) -> Result<T, String>,
    ) -> Result<(Vec<T>, ListLayout), String> {
        let mut layout = ListLayout {
            open_comment: self.previous_trailing(),
            ..ListLayout::default()
        };
        let mut items = Vec::new();
        let mut last_line = self.previous_span().line;

        while !self.check(close) && !self.is_at_end() {
            let line_break = self.current_span().line > last_line;
            let mut trivia = self.leading();
            items.push(item(self)?);

            let more = self.match_token(&TokenKind::Comma);
            if more {
                trivia.comment = self.previous_trailing();
            }
            last_line = self.previous_span().line;
            layout.items.push(ItemLayout { trivia, line_break });
            if !more {
                break;
            }
        }

        layout.end_doc = self.closing_doc();
        layout.close_break = self.current_span().line > last_line;
        Ok((items, layout))
    }

    fn element_value(&mut self) -> Result<Expr, String> {
        if self.check(&TokenKind::LBrace) {
            let span = self.current_span();
            self.composite_lit(None, span)
        } else {
            self.expression()
        }
    }

    fn operand(&mut self) -> Result<Expr, String> {
        let span = self.current_span();

        let literal = match self.peek_kind() {
            Some(TokenKind::Int(v)) => Some((LitKind::Int, v.clone())),
            Some(TokenKind::Float(v)) => Some((LitKind::Float, v.clone())),
            Some(TokenKind::Rune(v)) => Some((LitKind::Rune, v.clone())),
            Some(TokenKind::Str(v)) => Some((LitKind::Str, v.clone())),
            _ => None,
        };
        if let Some((kind, value)) = literal {
            self.advance();
            return Ok(Expr::BasicLit { kind, value, span });
        }

        match self.peek_kind() {
            Some(TokenKind::Ident(_)) => Ok(Expr::Ident(self.expect_ident()?)),
            Some(TokenKind::LParen) => {
                self.advance();
                self.expr_lev += 1;
                let inner = self.expression();
                self.expr_lev -= 1;
                let inner = inner?;
                self.expect(&TokenKind::RParen)?;
                Ok(Expr::Paren {
                    inner: Box::new(inner),
                    span,
                })
            }
            Some(TokenKind::Func) => {
                self.advance();
                let sig = self.signature(span)?;
                if self.check(&TokenKind::LBrace) {
                    self.expr_lev += 1;
                    let body = self.block();
                    self.expr_lev -= 1;
                    Ok(Expr::FuncLit { sig, body: body? })
                } else {
                    Ok(Expr::Type(TypeExpr::Func(sig)))
                }
            }
            Some(
                TokenKind::LBracket | TokenKind::Map | TokenKind::Struct | TokenKind::Interface,
            ) => Ok(Expr::Type(self.parse_type()?)),
            _ => Err(self.error("expected expression")),
        }
    }

    fn ident_list(&mut self) -> Result<Vec<Ident>, String> {
        let mut names = vec![self.expect_ident()?];
        while self.match_token(&TokenKind::Comma) {
            names.push(self.expect_ident()?);
        }
        Ok(names)
    }

    fn expr_list(&mut self) -> Result<Vec<Expr>, String> {
        let mut exprs = vec![self.expression()?];
        while self.match_token(&TokenKind::Comma) {
            exprs.push(self.expression()?);
        }
        Ok(exprs)
    }

    // Helper methods

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.current)
    }

    fn peek_kind(&self) -> Option<&TokenKind> {
        self.peek().map(|t| &t.kind)
    }

    fn peek_kind_ahead(&self, offset: usize) -> Option<&TokenKind> {
        self.tokens.get(self.current + offset).map(|t| &t.kind)
    }

    /// Comments and spacing in front of the current token, taken from the
    /// token stream. A comment ending the previous line that no node claimed
    /// comes first.
    fn leading(&mut self) -> Trivia {
        let mut doc: Vec<String> = self.previous_trailing().into_iter().collect();
        let Some(token) = self.tokens.get_mut(self.current) else {
            return Trivia {
                doc,
                ..Trivia::default()
            };
        };
        let mut blank_before = token.blank_before;
        if !doc.is_empty() && blank_before {
            doc.push(String::new());
            blank_before = false;
        }
        doc.append(&mut token.doc);
        Trivia {
            doc,
            comment: None,
            blank_before,
        }
    }

    /// Comments in front of a closing `)` or `}`.
    fn closing_doc(&mut self) -> Vec<String> {
        let mut doc: Vec<String> = self.previous_trailing().into_iter().collect();
        if let Some(token) = self.tokens.get_mut(self.current) {
            doc.append(&mut token.doc);
        }
        doc
    }

    /// Take the comment ending the previous token's line.
    fn previous_trailing(&mut self) -> Option<String> {
        let index = self.current.checked_sub(1)?;
        self.tokens.get_mut(index).and_then(|t| t.trailing.take())
    }

    /// Take the comments of the tokens from `start` up to the current one
    /// that no node claimed, so the printer can keep them in front of the
    /// enclosing statement or declaration.
    fn stray_comments(&mut self, start: usize) -> Vec<String> {
        let end = self.current.min(self.tokens.len());
        let mut stray = Vec::new();
        for token in &mut self.tokens[start.min(end)..end] {
            stray.extend(token.doc.drain(..).filter(|line| !line.is_empty()));
            stray.extend(token.trailing.take());
        }
        stray
    }

    /// Consume a statement terminator, returning the comment that ends its line.
    /// The terminator may be omitted before a closing `)` or `}`.
    fn semi(&mut self) -> Result<Option<String>, String> {
        if self.check(&TokenKind::Semi) {
            let trailing = self.tokens.get_mut(self.current).and_then(|t| t.trailing.take());
            self.advance();
            return Ok(trailing);
        }
        if self.check(&TokenKind::RParen) || self.check(&TokenKind::RBrace) || self.is_at_end() {
            return Ok(None);
        }
        Err(self.error("expected ';' or newline"))
    }

    fn is_at_end(&self) -> bool {
        matches!(self.peek_kind(), Some(TokenKind::Eof) | None)
    }

    fn check(&self, kind: &TokenKind) -> bool {
        self.peek_kind() == Some(kind)
    }

    fn check_ident(&self) -> bool {
        matches!(self.peek_kind(), Some(TokenKind::Ident(_)))
    }

    fn check_ident_ahead(&self, offset: usize) -> bool {
        matches!(self.peek_kind_ahead(offset), Some(TokenKind::Ident(_)))
    }

    fn check_ahead(&self, kind: &TokenKind, offset: usize) -> bool {
        self.peek_kind_ahead(offset) == Some(kind)
    }

    fn advance(&mut self) -> Option<&Token> {
        if !self.is_at_end() {
            self.current += 1;
        }
        self.tokens.get(self.current.saturating_sub(1))
    }

    fn match_token(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: &TokenKind) -> Result<(), String> {
        if self.check(kind) {
            self.advance();
            Ok(())
        } else {
            Err(self.error(&format!("expected {:?}", kind)))
        }
    }

    fn expect_ident(&mut self) -> Result<Ident, String> {
        let span = self.current_span();
        if let Some(TokenKind::Ident(name)) = self.peek_kind() {
            let name = name.clone();
            self.advance();
            Ok(Ident::new(name, span))
        } else {
            Err(self.error("expected identifier"))
        }
    }

    fn current_span(&self) -> Span {
        self.peek().map(|t| t.span).unwrap_or(Span::new(1, 1))
    }

    fn previous_span(&self) -> Span {
        self.tokens
            .get(self.current.saturating_sub(1))
            .map(|t| t.span)
            .unwrap_or(Span::new(1, 1))
    }

    fn error(&self, message: &str) -> String {
        let span = self.current_span();
        let found = match self.peek_kind() {
            Some(TokenKind::Semi) if self.peek().is_some_and(|t| t.implicit) => "newline".to_string(),
            Some(TokenKind::Eof) | None => "end of file".to_string(),
            Some(kind) => format!("{:?}", kind),
        };
        format!(
            "error: {}, found {}\n  --> {}:{}:{}",
            message, found, self.filename, span.line, span.column
        )
    }
}

enum ForHeader {
    Loop {
        init: Option<Box<Stmt>>,
        cond: Option<Expr>,
        post: Option<Box<Stmt>>,
    },
    Range {
        key: Option<Expr>,
        value: Option<Expr>,
        define: bool,
        expr: Expr,
    },
}

fn is_type_name(expr: &Expr) -> bool {
    match expr {
        Expr::Ident(_) => true,
        Expr::Selector { expr, .. } => matches!(expr.as_ref(), Expr::Ident(_)),
        _ => false,
    }
}

fn is_literal_type(expr: &Expr) -> bool {
    is_type_name(expr)
        || matches!(
            expr,
            Expr::Type(
                TypeExpr::Array { .. }
                    | TypeExpr::Slice { .. }
                    | TypeExpr::Map { .. }
                    | TypeExpr::Struct { .. }
            )
        )
}

fn expr_to_type(expr: Expr) -> Option<TypeExpr> {
    match expr {
        Expr::Ident(name) => Some(TypeExpr::Name { pkg: None, name }),
        Expr::Selector { expr, sel } => match *expr {
            Expr::Ident(pkg) => Some(TypeExpr::Name {
                pkg: Some(pkg),
                name: sel,
            }),
            _ => None,
        },
        Expr::Type(ty) => Some(ty),
        _ => None,
    }
}

/// Lex and parse one source file.
pub fn parse_file(filename: &str, source: &str) -> Result<File, String> {
    let mut lexer = crate::compiler::lexer::Lexer::new(filename, source);
    let tokens = lexer.scan_tokens()?;
    let mut parser = Parser::new(filename, tokens);
    parser.parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(source: &str) -> Result<File, String> {
        parse_file("test.go", source)
    }

    fn parse_body(body: &str) -> Vec<Stmt> {
        let source = format!("package p\n\nfunc f() {{\n{}\n}}\n", body);
        let file = parse(&source).unwrap();
        match file.decls.into_iter().next() {
            Some(Decl::Func(FuncDecl {
                body: Some(block), ..
            })) => block.stmts,
            _ => panic!("expected function"),
        }
    }

    #[test]
    fn test_package_and_imports() {
        let file = parse("package box\n\nimport (\n\t\"fmt\"\n\tg \"gomono/generic\"\n)\n").unwrap();
        assert_eq!(file.package.name, "box");
        assert_eq!(file.imports.len(), 1);
        assert!(file.imports[0].grouped);
        assert_eq!(file.imports[0].specs.len(), 2);
        assert_eq!(file.imports[0].specs[1].name.as_ref().unwrap().name, "g");
        assert_eq!(file.imports[0].specs[1].path, "\"gomono/generic\"");
    }

    #[test]
    fn test_type_spec() {
        let file = parse("package p\n\ntype T generic.Generic\ntype A = int\n").unwrap();
        match &file.decls[0] {
            Decl::Gen(GenDecl { specs, .. }) => match &specs[0] {
                Spec::Type(TypeSpec {
                    name,
                    alias,
                    ty: TypeExpr::Name { pkg: Some(pkg), name: sel },
                    ..
                }) => {
                    assert_eq!(name.name, "T");
                    assert!(!alias);
                    assert_eq!(pkg.name, "generic");
                    assert_eq!(sel.name, "Generic");
                }
                _ => panic!("expected qualified type spec"),
            },
            _ => panic!("expected type declaration"),
        }
        match &file.decls[1] {
            Decl::Gen(GenDecl { specs, .. }) => {
                assert!(matches!(&specs[0], Spec::Type(TypeSpec { alias: true, .. })));
            }
            _ => panic!("expected type declaration"),
        }
    }

    #[test]
    fn test_function_definition() {
        let file = parse("package p\n\nfunc (s *Stack) Push(a, b int, rest ...string) (n int, err error) {\n\treturn 0, nil\n}\n").unwrap();
        match &file.decls[0] {
            Decl::Func(func) => {
                assert_eq!(func.name.name, "Push");
                let recv = func.recv.as_ref().unwrap();
                assert_eq!(recv.names[0].name, "s");
                assert!(matches!(recv.ty, TypeExpr::Pointer { .. }));
                assert_eq!(func.sig.params.len(), 2);
                assert_eq!(func.sig.params[0].names.len(), 2);
                assert!(func.sig.params[1].variadic);
                assert_eq!(func.sig.results.len(), 2);
            }
            _ => panic!("expected function definition"),
        }
    }

    #[test]
    fn test_unnamed_params() {
        let file = parse("package p\n\nvar f func(int, string) bool\n").unwrap();
        match &file.decls[0] {
            Decl::Gen(GenDecl { specs, .. }) => match &specs[0] {
                Spec::Value(ValueSpec {
                    ty: Some(TypeExpr::Func(sig)),
                    ..
                }) => {
                    assert_eq!(sig.params.len(), 2);
                    assert!(sig.params.iter().all(|p| p.names.is_empty()));
                    assert_eq!(sig.results.len(), 1);
                }
                _ => panic!("expected func type"),
            },
            _ => panic!("expected var declaration"),
        }
    }

    #[test]
    fn test_const_group_iota() {
        let file = parse("package p\n\nconst (\n\tA = iota\n\tB\n\tC\n)\n").unwrap();
        match &file.decls[0] {
            Decl::Gen(GenDecl { specs, grouped, .. }) => {
                assert!(grouped);
                let iotas: Vec<usize> = specs
                    .iter()
                    .map(|s| match s {
                        Spec::Value(v) => v.iota,
                        _ => panic!("expected value spec"),
                    })
                    .collect();
                assert_eq!(iotas, vec![0, 1, 2]);
            }
            _ => panic!("expected const declaration"),
        }
    }

    #[test]
    fn test_struct_fields() {
        let file = parse("package p\n\ntype S struct {\n\ta, b int\n\tName string `json:\"name\"`\n\t*Inner\n\tio.Reader\n}\n").unwrap();
        match &file.decls[0] {
            Decl::Gen(GenDecl { specs, .. }) => match &specs[0] {
                Spec::Type(TypeSpec {
                    ty: TypeExpr::Struct { fields, .. },
                    ..
                }) => {
                    assert_eq!(fields.len(), 4);
                    assert_eq!(fields[0].names.len(), 2);
                    assert!(fields[1].tag.is_some());
                    assert!(fields[2].names.is_empty());
                    assert!(fields[3].names.is_empty());
                }
                _ => panic!("expected struct type"),
            },
            _ => panic!("expected type declaration"),
        }
    }

    #[test]
    fn test_binary_expression_precedence() {
        let stmts = parse_body("x := 1 + 2 * 3");
        match &stmts[0].kind {
            StmtKind::ShortVar { values, .. } => match &values[0] {
                Expr::Binary {
                    op: BinaryOp::Add,
                    right,
                    ..
                } => {
                    assert!(matches!(
                        right.as_ref(),
                        Expr::Binary {
                            op: BinaryOp::Mul,
                            ..
                        }
                    ));
                }
                _ => panic!("expected binary expression"),
            },
            _ => panic!("expected short variable declaration"),
        }
    }

    #[test]
    fn test_composite_literal_in_if_header() {
        let stmts = parse_body("if x == (T{}) {\n}\nif v := []int{1, 2}; len(v) > 0 {\n}");
        assert!(matches!(stmts[0].kind, StmtKind::If(_)));
        match &stmts[1].kind {
            StmtKind::If(IfStmt { init: Some(_), .. }) => {}
            _ => panic!("expected if with init"),
        }
    }

    #[test]
    fn test_type_name_brace_opens_block_in_header() {
        let stmts = parse_body("for x := range items {\n\tx++\n}");
        match &stmts[0].kind {
            StmtKind::Range {
                key: Some(Expr::Ident(key)),
                define: true,
                body,
                ..
            } => {
                assert_eq!(key.name, "x");
                assert_eq!(body.stmts.len(), 1);
            }
            _ => panic!("expected range loop"),
        }
    }

    #[test]
    fn test_three_clause_for() {
        let stmts = parse_body("for i := 0; i < n; i++ {\n}");
        match &stmts[0].kind {
            StmtKind::For {
                init: Some(_),
                cond: Some(_),
                post: Some(_),
                ..
            } => {}
            _ => panic!("expected three-clause for"),
        }
    }

    #[test]
    fn test_switch() {
        let stmts = parse_body("switch x {\ncase 1, 2:\n\ty()\ndefault:\n}");
        match &stmts[0].kind {
            StmtKind::Switch { tag: Some(_), clauses, .. } => {
                assert_eq!(clauses.len(), 2);
                assert_eq!(clauses[0].exprs.as_ref().unwrap().len(), 2);
                assert!(clauses[1].exprs.is_none());
            }
            _ => panic!("expected switch"),
        }
    }

    #[test]
    fn test_composite_literals() {
        let stmts = parse_body("m := map[string][]int{\n\t\"a\": {1, 2},\n}\np := &Point{X: 1}");
        match &stmts[0].kind {
            StmtKind::ShortVar { values, .. } => match &values[0] {
                Expr::Composite {
                    ty: Some(TypeExpr::Map { .. }),
                    elems,
                    layout,
                    ..
                } => {
                    assert!(layout.close_break);
                    assert!(layout.items[0].line_break);
                    assert!(elems[0].key.is_some());
                    assert!(matches!(elems[0].value, Expr::Composite { ty: None, .. }));
                }
                _ => panic!("expected map literal"),
            },
            _ => panic!("expected short variable declaration"),
        }
        match &stmts[1].kind {
            StmtKind::ShortVar { values, .. } => {
                assert!(matches!(values[0], Expr::Unary { op: UnaryOp::Addr, .. }));
            }
            _ => panic!("expected short variable declaration"),
        }
    }

    #[test]
    fn test_conversions_and_assertions() {
        let stmts = parse_body("b := []byte(s)\nv, ok := x.(fmt.Stringer)\ns = s[1:len(s)]");
        assert_eq!(stmts.len(), 3);
        match &stmts[1].kind {
            StmtKind::ShortVar { names, values } => {
                assert_eq!(names.len(), 2);
                assert!(matches!(values[0], Expr::TypeAssert { .. }));
            }
            _ => panic!("expected short variable declaration"),
        }
        assert!(matches!(stmts[2].kind, StmtKind::Assign { .. }));
    }

    #[test]
    fn test_statement_comments() {
        let stmts = parse_body("// first\nx := 1 // one\n\ny := 2");
        assert_eq!(stmts[0].trivia.doc, vec!["// first".to_string()]);
        assert_eq!(stmts[0].trivia.comment.as_deref(), Some("// one"));
        assert!(stmts[1].trivia.blank_before);
    }

    #[test]
    fn test_list_layout_keeps_comments_and_breaks() {
        let stmts = parse_body("total := sum( // numbers\n\t1, // one\n\n\t// two\n\t2,\n)");
        let StmtKind::ShortVar { values, .. } = &stmts[0].kind else {
            panic!("expected short variable declaration");
        };
        let Expr::Call { args, layout, .. } = &values[0] else {
            panic!("expected call");
        };
        assert_eq!(args.len(), 2);
        assert_eq!(layout.open_comment.as_deref(), Some("// numbers"));
        assert!(layout.items.iter().all(|item| item.line_break));
        assert_eq!(layout.items[0].trivia.comment.as_deref(), Some("// one"));
        assert_eq!(layout.items[1].trivia.doc, vec!["// two".to_string()]);
        assert!(layout.items[1].trivia.blank_before);
        assert!(layout.close_break);
        assert!(stmts[0].trivia.doc.is_empty());
    }

    #[test]
    fn test_single_line_call_layout() {
        let stmts = parse_body("f(a, b)");
        let StmtKind::Expr(Expr::Call { layout, .. }) = &stmts[0].kind else {
            panic!("expected call");
        };
        assert!(layout.is_single_line());
    }

    #[test]
    fn test_unclaimed_comments_move_before_statement() {
        let stmts = parse_body("x := a + // carry\n\tb\ny := 2");
        assert_eq!(stmts[0].trivia.doc, vec!["// carry".to_string()]);
        assert!(stmts[1].trivia.doc.is_empty());
    }

    #[test]
    fn test_comment_after_block_brace_leads_first_statement() {
        let stmts = parse_body("if ok { // taken\n\treturn\n}");
        let StmtKind::If(if_stmt) = &stmts[0].kind else {
            panic!("expected if statement");
        };
        assert_eq!(if_stmt.then.stmts[0].trivia.doc, vec!["// taken".to_string()]);
    }

    #[test]
    fn test_missing_package_clause() {
        assert!(parse("func f() {}").is_err());
    }

    #[test]
    fn test_channels_rejected() {
        assert!(parse("package p\n\nvar c chan int\n").is_err());
    }
}
