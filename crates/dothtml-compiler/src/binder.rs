//! Binding binder: binding syntax tree to typed expression.
//!
//! ## Identifier lookup
//!
//! 1. Data-context keywords (`_this`, `_parent`, `_parentN`, `_root`)
//! 2. Members of `_this`, which are implicitly reachable
//! 3. Type names, qualified by the view's imports and the default namespaces
//!
//! A dotted chain whose head resolves to nothing is retried as a qualified
//! type name (`System.Math.Max(...)`).

use bumpalo::Bump;
use dothtml_core::{CompilationError, DataType, ResolutionError, Span};
use dothtml_parser::binding::{Argument, BindingExpr, TypeExpr, TypeSuffix, parse_binding};
use dothtml_parser::markup::{BindingKind, BindingSource};
use dothtml_registry::TypeSystem;
use dothtml_registry::builtins::DEFAULT_NAMESPACES;
use tracing::trace;

use crate::assembler::ExpressionAssembler;
use crate::data_context::DataContextStack;
use crate::overload::NamedArgument;
use crate::typed_expr::TypedExpr;

/// A resolution failure at a position relative to the binding text.
#[derive(Debug, Clone, PartialEq)]
pub struct BindError {
    pub error: ResolutionError,
    pub span: Span,
}

type BindResult<T> = Result<T, BindError>;

trait At<T> {
    fn at(self, span: Span) -> BindResult<T>;
}

impl<T> At<T> for Result<T, ResolutionError> {
    fn at(self, span: Span) -> BindResult<T> {
        self.map_err(|error| BindError { error, span })
    }
}

/// A binding resolved against its data context.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundBinding {
    pub kind: BindingKind,
    /// Expression text as written.
    pub source: String,
    pub expr: TypedExpr,
    /// Position of the opening brace in the view file.
    pub span: Span,
}

impl BoundBinding {
    pub fn result_type(&self) -> DataType {
        self.expr.ty()
    }
}

pub struct BindingBinder<'a> {
    assembler: ExpressionAssembler<'a>,
    context: &'a DataContextStack,
    namespaces: Vec<String>,
}

impl<'a> BindingBinder<'a> {
    pub fn new(types: &'a dyn TypeSystem, context: &'a DataContextStack) -> Self {
        let mut namespaces = context.namespaces().to_vec();
        namespaces.extend(DEFAULT_NAMESPACES.iter().map(|ns| ns.to_string()));
        Self {
            assembler: ExpressionAssembler::new(types),
            context,
            namespaces,
        }
    }

    /// Parse and bind a binding from markup, reporting positions in file
    /// coordinates.
    pub fn bind_source(&self, source: &BindingSource) -> Result<BoundBinding, CompilationError> {
        let arena = Bump::new();
        let ast = parse_binding(&source.expression, &arena).map_err(|mut error| {
            error.span = error.span.offset(source.expression_span);
            CompilationError::Parse(error)
        })?;
        let expr = self
            .bind(ast)
            .and_then(|expr| self.assembler.value(expr).at(ast.span()))
            .map_err(|e| CompilationError::Binding {
                error: e.error,
                span: e.span.offset(source.expression_span),
            })?;
        trace!(binding = %source, ty = %expr.ty(), "binding resolved");
        Ok(BoundBinding {
            kind: source.kind,
            source: source.expression.clone(),
            expr,
            span: source.span,
        })
    }

    /// Bind one expression node.
    pub fn bind(&self, expr: &BindingExpr<'_>) -> BindResult<TypedExpr> {
        let span = expr.span();
        match expr {
            BindingExpr::Literal(literal) => Ok(TypedExpr::constant(literal.value.clone())),
            BindingExpr::Paren(paren) => self.bind(paren.expr),
            BindingExpr::Ident(_) | BindingExpr::Member(_) => match self.bind_path(expr)? {
                Some(bound) => Ok(bound),
                None => Err(BindError {
                    error: ResolutionError::UnknownIdentifier {
                        name: head_name(expr).to_string(),
                    },
                    span,
                }),
            },
            BindingExpr::Call(call) => {
                let callee = self.bind(call.callee)?;
                let (positional, named) = self.bind_arguments(call.args)?;
                self.assembler.call(&callee, positional, named).at(span)
            }
            BindingExpr::Index(index) => {
                let target = self.bind(index.target)?;
                let value = self.bind(index.index)?;
                self.assembler.index(target, value).at(span)
            }
            BindingExpr::Unary(unary) => {
                let operand = self.bind(unary.operand)?;
                self.assembler.unary(unary.op, operand).at(span)
            }
            BindingExpr::Binary(binary) => {
                let left = self.bind(binary.left)?;
                let right = self.bind(binary.right)?;
                self.assembler.binary(left, binary.op, right).at(span)
            }
            BindingExpr::Assign(assign) => {
                let target = self.bind(assign.target)?;
                let value = self.bind(assign.value)?;
                self.assembler.assign(target, value).at(span)
            }
        }
    }

    fn bind_arguments(&self, args: &[Argument<'_>]) -> BindResult<(Vec<TypedExpr>, Vec<NamedArgument>)> {
        let mut positional = Vec::new();
        let mut named = Vec::new();
        for arg in args {
            let value = self.bind(arg.value)?;
            match arg.name {
                Some(name) => named.push(NamedArgument::new(name.name, value)),
                None => positional.push(value),
            }
        }
        Ok((positional, named))
    }

    /// Bind an identifier or member chain; `None` when nothing by that
    /// name exists, so the caller can retry the chain as a type name.
    fn bind_path(&self, expr: &BindingExpr<'_>) -> BindResult<Option<TypedExpr>> {
        match expr {
            BindingExpr::Ident(ident) => {
                let name = ident.ident.name;
                let type_args = self.bind_type_args(ident.type_args)?;
                if type_args.is_empty()
                    && let Some(ty) = self.context.keyword(name)
                {
                    return Ok(Some(TypedExpr::parameter(name, ty)));
                }
                let this = TypedExpr::parameter("_this", self.context.this().clone());
                if let Some(member) = self.assembler.try_member(&this, name, &type_args).at(ident.span)? {
                    return Ok(Some(member));
                }
                Ok(self.lookup_type(name, &type_args).map(TypedExpr::StaticTypeReference))
            }
            BindingExpr::Member(member) => {
                let type_args = self.bind_type_args(member.type_args)?;
                if let Some(target) = self.bind_path(member.target)? {
                    let target = match target {
                        TypedExpr::StaticTypeReference(_) => target,
                        other => self.assembler.value(other).at(member.target.span())?,
                    };
                    return self
                        .assembler
                        .member(&target, member.member.name, &type_args)
                        .at(member.span)
                        .map(Some);
                }
                let Some(prefix) = dotted_name(member.target) else {
                    return Ok(None);
                };
                let qualified = format!("{prefix}.{}", member.member.name);
                Ok(self
                    .lookup_type(&qualified, &type_args)
                    .map(TypedExpr::StaticTypeReference))
            }
            other => self.bind(other).map(Some),
        }
    }

    fn lookup_type(&self, name: &str, type_args: &[DataType]) -> Option<DataType> {
        let types = self.assembler.types();
        if type_args.is_empty() {
            return types.resolve_type(name, &self.namespaces);
        }
        let arity_name = format!("{name}`{}", type_args.len());
        match types.resolve_type(&arity_name, &self.namespaces)? {
            DataType::Named(named) => Some(DataType::generic(&named.name, type_args.to_vec())),
            other => Some(other),
        }
    }

    fn bind_type_args(&self, args: &[TypeExpr<'_>]) -> BindResult<Vec<DataType>> {
        args.iter().map(|arg| self.bind_type(arg)).collect()
    }

    fn bind_type(&self, ty: &TypeExpr<'_>) -> BindResult<DataType> {
        let args = self.bind_type_args(ty.args)?;
        let mut resolved = self.lookup_type(ty.name, &args).ok_or_else(|| BindError {
            error: ResolutionError::UnknownType { name: ty.to_string() },
            span: ty.span,
        })?;
        for suffix in ty.suffixes {
            resolved = match suffix {
                TypeSuffix::Array => DataType::array(resolved),
                TypeSuffix::Nullable => DataType::nullable(resolved),
            };
        }
        Ok(resolved)
    }
}

/// `A.B.C` for an identifier chain without type arguments.
fn dotted_name(expr: &BindingExpr<'_>) -> Option<String> {
    match expr {
        BindingExpr::Ident(ident) if ident.type_args.is_empty() => Some(ident.ident.name.to_string()),
        BindingExpr::Member(member) if member.type_args.is_empty() => {
            Some(format!("{}.{}", dotted_name(member.target)?, member.member.name))
        }
        _ => None,
    }
}

/// Leftmost identifier of a chain, for error messages.
fn head_name<'ast>(expr: &BindingExpr<'ast>) -> &'ast str {
    match expr {
        BindingExpr::Ident(ident) => ident.ident.name,
        BindingExpr::Member(member) => head_name(member.target),
        _ => "",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dothtml_registry::{MethodBuilder, TypeBuilder, TypeRegistry};
    use std::sync::Arc;

    fn registry() -> TypeRegistry {
        let mut registry = TypeRegistry::with_primitives();
        let order = DataType::named("App.Order");
        registry
            .register_type(
                TypeBuilder::new("App.Order", "App")
                    .property("Total", DataType::decimal())
                    .property("Note", DataType::string())
                    .build(),
            )
            .unwrap();
        registry
            .register_type(
                TypeBuilder::new("App.Customer", "App")
                    .property("Name", DataType::string())
                    .property("Age", DataType::nullable(DataType::int32()))
                    .property("Orders", DataType::array(order))
                    .method(MethodBuilder::new("Describe", DataType::string()).param("x", DataType::object()))
                    .method(MethodBuilder::new("Pick", DataType::Void).param("x", DataType::int64()))
                    .method(MethodBuilder::new("Pick", DataType::Void).param("x", DataType::double()))
                    .build(),
            )
            .unwrap();
        registry
    }

    fn context() -> Arc<DataContextStack> {
        let root = DataContextStack::root(DataType::named("App.Customer"), vec!["App".to_string()]);
        DataContextStack::child(&root, DataType::named("App.Order"))
    }

    fn bind(registry: &TypeRegistry, context: &DataContextStack, text: &str) -> BindResult<TypedExpr> {
        let arena = Bump::new();
        let ast = parse_binding(text, &arena).unwrap();
        let binder = BindingBinder::new(registry, context);
        binder.bind(ast)
    }

    fn source(text: &str) -> BindingSource {
        BindingSource {
            kind: BindingKind::Value,
            expression: text.to_string(),
            span: Span::new(3, 10, 1),
            expression_span: Span::new(3, 18, 1),
        }
    }

    #[test]
    fn implicit_this_member() {
        let registry = registry();
        let context = context();
        assert_eq!(bind(&registry, &context, "Total").unwrap().ty(), DataType::decimal());
        assert_eq!(bind(&registry, &context, "_this.Note.Length").unwrap().ty(), DataType::int32());
    }

    #[test]
    fn parent_and_root_keywords() {
        let registry = registry();
        let context = context();
        assert_eq!(bind(&registry, &context, "_parent.Name").unwrap().ty(), DataType::string());
        assert_eq!(
            bind(&registry, &context, "_root.Orders[0].Total").unwrap().ty(),
            DataType::decimal()
        );
    }

    #[test]
    fn static_calls_by_simple_and_qualified_name() {
        let registry = registry();
        let context = context();
        assert_eq!(bind(&registry, &context, "Math.Max(1, 2)").unwrap().ty(), DataType::int32());
        assert_eq!(
            bind(&registry, &context, "System.Math.Round(2.5)").unwrap().ty(),
            DataType::double()
        );
    }

    #[test]
    fn extension_and_generic_calls() {
        let registry = registry();
        let context = context();
        assert_eq!(bind(&registry, &context, "_root.Orders.Any()").unwrap().ty(), DataType::bool());
        let first = bind(&registry, &context, "_root.Orders.First<Order>()").unwrap();
        assert_eq!(first.ty(), DataType::named("App.Order"));
    }

    #[test]
    fn nullable_arithmetic_and_comparison() {
        let registry = registry();
        let context = context();
        assert_eq!(bind(&registry, &context, "_parent.Age + 1").unwrap().ty(), DataType::int32());
        assert_eq!(bind(&registry, &context, "_parent.Age == null").unwrap().ty(), DataType::bool());
    }

    #[test]
    fn named_argument_call() {
        let registry = registry();
        let context = context();
        let call = bind(&registry, &context, "_parent.Describe(x: Total)").unwrap();
        assert_eq!(call.ty(), DataType::string());
    }

    #[test]
    fn unknown_identifier() {
        let registry = registry();
        let context = context();
        let err = bind(&registry, &context, "Missing.Thing").unwrap_err();
        assert_eq!(err.error, ResolutionError::UnknownIdentifier { name: "Missing".into() });
    }

    #[test]
    fn ambiguous_call_reports_call_span() {
        let registry = registry();
        let context = context();
        let err = bind(&registry, &context, "_parent.Pick(1)").unwrap_err();
        assert_eq!(err.error.class(), "AmbiguousOverload");
        assert_eq!(err.span.col, 1);
    }

    #[test]
    fn source_positions_are_translated() {
        let registry = registry();
        let context = context();
        let binder = BindingBinder::new(&registry, &context);
        let err = binder.bind_source(&source("Note + Nope")).unwrap_err();
        assert_eq!(err.span(), Some(Span::new(3, 25, 4)));
        let err = binder.bind_source(&source("Note +")).unwrap_err();
        assert!(matches!(err, CompilationError::Parse(_)));
        assert_eq!(err.span().map(|s| s.line), Some(3));
    }

    #[test]
    fn method_group_result_is_rejected() {
        let registry = registry();
        let context = context();
        let binder = BindingBinder::new(&registry, &context);
        let err = binder.bind_source(&source("Note.ToUpper")).unwrap_err();
        assert_eq!(err.class(), "MethodGroupNotValue");
    }
}
