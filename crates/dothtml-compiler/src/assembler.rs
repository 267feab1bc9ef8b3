//! Composition of the member, overload and operator resolvers.
//!
//! [`ExpressionAssembler`] is the single entry point the binder uses to
//! build typed trees. It owns the rule that a method group or a type
//! reference is not a value: any operation consuming an operand checks it
//! first.

use dothtml_core::{DataType, ResolutionError};
use dothtml_parser::binding::{BinaryOp, UnaryOp};
use dothtml_registry::TypeSystem;

use crate::member::{resolve_member, update_member};
use crate::operators::{self, Comparison};
use crate::overload::{NamedArgument, resolve_call};
use crate::typed_expr::TypedExpr;

#[derive(Clone, Copy)]
pub struct ExpressionAssembler<'a> {
    types: &'a dyn TypeSystem,
}

impl<'a> ExpressionAssembler<'a> {
    pub fn new(types: &'a dyn TypeSystem) -> Self {
        Self { types }
    }

    pub fn types(&self) -> &'a dyn TypeSystem {
        self.types
    }

    /// Reject operands that are not values.
    pub fn value(&self, expr: TypedExpr) -> Result<TypedExpr, ResolutionError> {
        match expr {
            TypedExpr::MethodGroup(group) => Err(ResolutionError::MethodGroupNotValue {
                name: group.name.to_string(),
            }),
            TypedExpr::UnknownType => Err(ResolutionError::UnresolvedType { expr: expr.to_string() }),
            TypedExpr::StaticTypeReference(ty) => Err(ResolutionError::UnknownIdentifier { name: ty.to_string() }),
            other => Ok(other),
        }
    }

    pub fn member(&self, target: &TypedExpr, name: &str, type_args: &[DataType]) -> Result<TypedExpr, ResolutionError> {
        resolve_member(self.types, target, name, type_args, true)?.ok_or_else(|| ResolutionError::MemberNotFound {
            member: name.to_string(),
            type_name: target.ty().to_string(),
            is_static: matches!(target, TypedExpr::StaticTypeReference(_)),
        })
    }

    /// Lenient member lookup, used for implicit `_this` members.
    pub fn try_member(&self, target: &TypedExpr, name: &str, type_args: &[DataType]) -> Result<Option<TypedExpr>, ResolutionError> {
        resolve_member(self.types, target, name, type_args, false)
    }

    pub fn call(
        &self,
        callee: &TypedExpr,
        positional: Vec<TypedExpr>,
        named: Vec<NamedArgument>,
    ) -> Result<TypedExpr, ResolutionError> {
        let positional = positional
            .into_iter()
            .map(|arg| self.value(arg))
            .collect::<Result<Vec<_>, _>>()?;
        let named = named
            .into_iter()
            .map(|arg| Ok(NamedArgument { name: arg.name, value: self.value(arg.value)? }))
            .collect::<Result<Vec<_>, ResolutionError>>()?;
        resolve_call(self.types, callee, &positional, &named)
    }

    pub fn index(&self, target: TypedExpr, index: TypedExpr) -> Result<TypedExpr, ResolutionError> {
        let target = self.value(target)?;
        let index = self.value(index)?;
        operators::get_indexer(self.types, &target, &index)
    }

    pub fn binary(&self, left: TypedExpr, op: BinaryOp, right: TypedExpr) -> Result<TypedExpr, ResolutionError> {
        let left = self.value(left)?;
        let right = self.value(right)?;
        operators::resolve_binary(self.types, &left, op, &right)
    }

    pub fn unary(&self, op: UnaryOp, operand: TypedExpr) -> Result<TypedExpr, ResolutionError> {
        let operand = self.value(operand)?;
        operators::resolve_unary(self.types, op, &operand)
    }

    pub fn assign(&self, target: TypedExpr, value: TypedExpr) -> Result<TypedExpr, ResolutionError> {
        let value = self.value(value)?;
        operators::resolve_assign(self.types, &target, &value)
    }

    /// Store into `target` if it is writable.
    pub fn update(&self, target: &TypedExpr, value: TypedExpr) -> Result<Option<TypedExpr>, ResolutionError> {
        update_member(self.types, target, value)
    }

    pub fn equal(&self, left: &TypedExpr, right: &TypedExpr) -> Option<TypedExpr> {
        operators::equals_method(self.types, left, right)
    }

    pub fn compare(&self, left: &TypedExpr, right: &TypedExpr) -> Result<Comparison, ResolutionError> {
        operators::resolve_comparison(self.types, left, right)
    }
}
