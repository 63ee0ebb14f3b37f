//! Depth-first AST traversal that hands every hook the chain of ancestors.
//!
//! [`Walker`] drives swc's [`Visit`] machinery. Only the node kinds a rewrite
//! can care about are reported (see [`NodeRef`]); every other node is walked
//! through transparently, so the parent of a reported node is the nearest
//! reported node above it.
//!
//! The chain passed to hooks includes the root and excludes the node being
//! visited: at a direct child of the root, `ancestors.len() == 1`.

use swc_core::common::{Span, Spanned};
use swc_core::ecma::ast::{
    ArrayPat, ArrowExpr, BlockStmt, Class, ClassDecl, DoWhileStmt, Expr, FnDecl, ForInStmt,
    ForOfStmt, ForStmt, Function, GetterProp, IfStmt, ImportDecl, LabeledStmt, Module, ObjectPat,
    SetterProp, SwitchCase, TryStmt, VarDecl, VarDeclarator, WhileStmt, WithStmt,
};
use swc_core::ecma::visit::{Visit, VisitWith};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Module,
    BlockStatement,
    IfStatement,
    ForStatement,
    ForInStatement,
    ForOfStatement,
    WhileStatement,
    DoWhileStatement,
    LabeledStatement,
    SwitchCase,
    TryStatement,
    WithStatement,
    Expression,
    ImportDeclaration,
    FunctionDeclaration,
    ClassDeclaration,
    /// Parameters and body of any function, method or function expression.
    Function,
    ArrowFunction,
    /// Heritage and body of any class declaration or expression.
    Class,
    /// `get`/`set` accessor of an object literal.
    Accessor,
    VariableDeclaration,
    VariableDeclarator,
    ObjectPattern,
    ArrayPattern,
}

impl NodeKind {
    /// Kinds that open a new function or class scope.
    pub fn is_scope_boundary(self) -> bool {
        matches!(
            self,
            NodeKind::Function | NodeKind::ArrowFunction | NodeKind::Class | NodeKind::Accessor
        )
    }

    pub fn is_pattern(self) -> bool {
        matches!(self, NodeKind::ObjectPattern | NodeKind::ArrayPattern)
    }
}

/// A reported node, borrowed from the tree being walked.
#[derive(Debug, Clone, Copy)]
pub enum NodeRef<'a> {
    Module(&'a Module),
    Block(&'a BlockStmt),
    /// Control-flow statement whose fields no hook needs.
    Statement(NodeKind, Span),
    ForIn(&'a ForInStmt),
    ForOf(&'a ForOfStmt),
    Expr(&'a Expr),
    ImportDecl(&'a ImportDecl),
    FnDecl(&'a FnDecl),
    ClassDecl(&'a ClassDecl),
    Function(&'a Function),
    Arrow(&'a ArrowExpr),
    Class(&'a Class),
    Accessor(Span),
    VarDecl(&'a VarDecl),
    VarDeclarator(&'a VarDeclarator),
    ObjectPat(&'a ObjectPat),
    ArrayPat(&'a ArrayPat),
}

impl NodeRef<'_> {
    pub fn kind(&self) -> NodeKind {
        match self {
            NodeRef::Module(_) => NodeKind::Module,
            NodeRef::Block(_) => NodeKind::BlockStatement,
            NodeRef::Statement(kind, _) => *kind,
            NodeRef::ForIn(_) => NodeKind::ForInStatement,
            NodeRef::ForOf(_) => NodeKind::ForOfStatement,
            NodeRef::Expr(_) => NodeKind::Expression,
            NodeRef::ImportDecl(_) => NodeKind::ImportDeclaration,
            NodeRef::FnDecl(_) => NodeKind::FunctionDeclaration,
            NodeRef::ClassDecl(_) => NodeKind::ClassDeclaration,
            NodeRef::Function(_) => NodeKind::Function,
            NodeRef::Arrow(_) => NodeKind::ArrowFunction,
            NodeRef::Class(_) => NodeKind::Class,
            NodeRef::Accessor(_) => NodeKind::Accessor,
            NodeRef::VarDecl(_) => NodeKind::VariableDeclaration,
            NodeRef::VarDeclarator(_) => NodeKind::VariableDeclarator,
            NodeRef::ObjectPat(_) => NodeKind::ObjectPattern,
            NodeRef::ArrayPat(_) => NodeKind::ArrayPattern,
        }
    }

    pub fn span(&self) -> Span {
        match self {
            NodeRef::Module(n) => n.span,
            NodeRef::Block(n) => n.span,
            NodeRef::Statement(_, span) | NodeRef::Accessor(span) => *span,
            NodeRef::ForIn(n) => n.span,
            NodeRef::ForOf(n) => n.span,
            NodeRef::Expr(n) => n.span(),
            NodeRef::ImportDecl(n) => n.span,
            NodeRef::FnDecl(n) => n.function.span,
            NodeRef::ClassDecl(n) => n.class.span,
            NodeRef::Function(n) => n.span,
            NodeRef::Arrow(n) => n.span,
            NodeRef::Class(n) => n.span,
            NodeRef::VarDecl(n) => n.span,
            NodeRef::VarDeclarator(n) => n.span,
            NodeRef::ObjectPat(n) => n.span,
            NodeRef::ArrayPat(n) => n.span,
        }
    }
}

/// One entry of the ancestor chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ancestor {
    pub kind: NodeKind,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Descend {
    Children,
    /// Prune the subtree below the node.
    Skip,
}

/// Hooks called by [`Walker`]. Both default to plain descent.
pub trait AncestorVisitor {
    fn enter(&mut self, _node: &NodeRef<'_>, _ancestors: &[Ancestor]) -> Descend {
        Descend::Children
    }

    /// Runs after the node's subtree, also when `enter` pruned it.
    fn leave(&mut self, _node: &NodeRef<'_>, _ancestors: &[Ancestor]) {}
}

pub struct Walker<'v, V: ?Sized> {
    visitor: &'v mut V,
    ancestors: Vec<Ancestor>,
}

impl<'v, V: AncestorVisitor + ?Sized> Walker<'v, V> {
    pub fn new(visitor: &'v mut V) -> Self {
        Walker {
            visitor,
            ancestors: Vec::new(),
        }
    }

    fn dispatch<N>(&mut self, node: NodeRef<'_>, children: &N)
    where
        N: VisitWith<Self> + ?Sized,
    {
        let descend = self.visitor.enter(&node, &self.ancestors);
        if descend == Descend::Children {
            self.ancestors.push(Ancestor {
                kind: node.kind(),
                span: node.span(),
            });
            children.visit_children_with(self);
            self.ancestors.pop();
        }
        self.visitor.leave(&node, &self.ancestors);
    }
}

/// Walks `root` (which becomes the first ancestor) with `visitor`.
pub fn walk_with_ancestors<'v, V, N>(root: &N, visitor: &'v mut V)
where
    V: AncestorVisitor + ?Sized,
    N: VisitWith<Walker<'v, V>> + ?Sized,
{
    let mut walker = Walker::new(visitor);
    root.visit_with(&mut walker);
    debug_assert!(walker.ancestors.is_empty(), "unbalanced ancestor stack");
}

impl<V: AncestorVisitor + ?Sized> Visit for Walker<'_, V> {
    fn visit_module(&mut self, n: &Module) {
        self.dispatch(NodeRef::Module(n), n);
    }

    fn visit_block_stmt(&mut self, n: &BlockStmt) {
        self.dispatch(NodeRef::Block(n), n);
    }

    fn visit_if_stmt(&mut self, n: &IfStmt) {
        self.dispatch(NodeRef::Statement(NodeKind::IfStatement, n.span), n);
    }

    fn visit_for_stmt(&mut self, n: &ForStmt) {
        self.dispatch(NodeRef::Statement(NodeKind::ForStatement, n.span), n);
    }

    fn visit_for_in_stmt(&mut self, n: &ForInStmt) {
        self.dispatch(NodeRef::ForIn(n), n);
    }

    fn visit_for_of_stmt(&mut self, n: &ForOfStmt) {
        self.dispatch(NodeRef::ForOf(n), n);
    }

    fn visit_while_stmt(&mut self, n: &WhileStmt) {
        self.dispatch(NodeRef::Statement(NodeKind::WhileStatement, n.span), n);
    }

    fn visit_do_while_stmt(&mut self, n: &DoWhileStmt) {
        self.dispatch(NodeRef::Statement(NodeKind::DoWhileStatement, n.span), n);
    }

    fn visit_labeled_stmt(&mut self, n: &LabeledStmt) {
        self.dispatch(NodeRef::Statement(NodeKind::LabeledStatement, n.span), n);
    }

    fn visit_switch_case(&mut self, n: &SwitchCase) {
        self.dispatch(NodeRef::Statement(NodeKind::SwitchCase, n.span), n);
    }

    fn visit_try_stmt(&mut self, n: &TryStmt) {
        self.dispatch(NodeRef::Statement(NodeKind::TryStatement, n.span), n);
    }

    fn visit_with_stmt(&mut self, n: &WithStmt) {
        self.dispatch(NodeRef::Statement(NodeKind::WithStatement, n.span), n);
    }

    fn visit_expr(&mut self, n: &Expr) {
        self.dispatch(NodeRef::Expr(n), n);
    }

    fn visit_import_decl(&mut self, n: &ImportDecl) {
        self.dispatch(NodeRef::ImportDecl(n), n);
    }

    fn visit_fn_decl(&mut self, n: &FnDecl) {
        self.dispatch(NodeRef::FnDecl(n), n);
    }

    fn visit_class_decl(&mut self, n: &ClassDecl) {
        self.dispatch(NodeRef::ClassDecl(n), n);
    }

    fn visit_function(&mut self, n: &Function) {
        self.dispatch(NodeRef::Function(n), n);
    }

    fn visit_arrow_expr(&mut self, n: &ArrowExpr) {
        self.dispatch(NodeRef::Arrow(n), n);
    }

    fn visit_class(&mut self, n: &Class) {
        self.dispatch(NodeRef::Class(n), n);
    }

    fn visit_getter_prop(&mut self, n: &GetterProp) {
        self.dispatch(NodeRef::Accessor(n.span), n);
    }

    fn visit_setter_prop(&mut self, n: &SetterProp) {
        self.dispatch(NodeRef::Accessor(n.span), n);
    }

    fn visit_var_decl(&mut self, n: &VarDecl) {
        self.dispatch(NodeRef::VarDecl(n), n);
    }

    fn visit_var_declarator(&mut self, n: &VarDeclarator) {
        self.dispatch(NodeRef::VarDeclarator(n), n);
    }

    fn visit_object_pat(&mut self, n: &ObjectPat) {
        self.dispatch(NodeRef::ObjectPat(n), n);
    }

    fn visit_array_pat(&mut self, n: &ArrayPat) {
        self.dispatch(NodeRef::ArrayPat(n), n);
    }
}
