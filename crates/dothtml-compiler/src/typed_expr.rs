//! Resolved binding expressions.
//!
//! A [`TypedExpr`] is the statically typed form of a binding. Every node
//! except [`TypedExpr::UnknownType`] and [`TypedExpr::MethodGroup`] knows
//! its result type; a method group only becomes a value through a call.

use std::fmt;
use std::sync::Arc;

use dothtml_core::{Constant, DataType};
use dothtml_parser::binding::{BinaryOp, UnaryOp};
use dothtml_registry::{CapabilityProperty, IndexerEntry, MethodEntry, PropertyEntry};

use crate::conversion::ConversionKind;

/// Methods named on a target, waiting for a call site to pick an overload.
#[derive(Debug, Clone, PartialEq)]
pub struct MethodGroup {
    pub name: Arc<str>,
    /// The receiver, or a [`TypedExpr::StaticTypeReference`] for static calls.
    pub target: Box<TypedExpr>,
    pub type_args: Vec<DataType>,
}

impl MethodGroup {
    pub fn is_static(&self) -> bool {
        matches!(*self.target, TypedExpr::StaticTypeReference(_))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TypedExpr {
    Constant {
        value: Constant,
        ty: DataType,
    },
    /// A data-context parameter such as `_this` or `_parent2`.
    Parameter {
        name: Arc<str>,
        ty: DataType,
    },
    /// Property or field access; `target` is `None` for static members.
    MemberAccess {
        target: Option<Box<TypedExpr>>,
        member: PropertyEntry,
    },
    /// Read through the bindable-object property registry.
    CapabilityGet {
        target: Box<TypedExpr>,
        property: CapabilityProperty,
    },
    /// Write through the bindable-object property registry.
    CapabilitySet {
        target: Box<TypedExpr>,
        property: CapabilityProperty,
        value: Box<TypedExpr>,
    },
    MethodGroup(MethodGroup),
    StaticTypeReference(DataType),
    UnknownType,
    /// Method call; `target` is `None` for static and extension calls.
    Call {
        target: Option<Box<TypedExpr>>,
        method: MethodEntry,
        args: Vec<TypedExpr>,
    },
    /// Array element access (`indexer` is `None`) or an indexer property.
    Index {
        target: Box<TypedExpr>,
        index: Box<TypedExpr>,
        indexer: Option<IndexerEntry>,
        ty: DataType,
    },
    /// Synthesized array for a variadic parameter.
    NewArray {
        element: DataType,
        items: Vec<TypedExpr>,
    },
    Convert {
        expr: Box<TypedExpr>,
        ty: DataType,
        kind: ConversionKind,
    },
    Binary {
        left: Box<TypedExpr>,
        op: BinaryOp,
        right: Box<TypedExpr>,
        ty: DataType,
        /// User-defined operator method, if one was selected.
        method: Option<MethodEntry>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<TypedExpr>,
        ty: DataType,
        method: Option<MethodEntry>,
    },
    Assign {
        target: Box<TypedExpr>,
        value: Box<TypedExpr>,
    },
}

impl TypedExpr {
    pub fn constant(value: Constant) -> Self {
        let ty = value.data_type();
        TypedExpr::Constant { value, ty }
    }

    pub fn parameter(name: &str, ty: DataType) -> Self {
        TypedExpr::Parameter {
            name: Arc::from(name),
            ty,
        }
    }

    /// Result type. Method groups and the unknown sentinel report
    /// [`DataType::Unknown`].
    pub fn ty(&self) -> DataType {
        match self {
            TypedExpr::Constant { ty, .. } => ty.clone(),
            TypedExpr::Parameter { ty, .. } => ty.clone(),
            TypedExpr::MemberAccess { member, .. } => member.ty.clone(),
            TypedExpr::CapabilityGet { property, .. } => property.ty.clone(),
            TypedExpr::CapabilitySet { .. } => DataType::Void,
            TypedExpr::MethodGroup(_) | TypedExpr::UnknownType => DataType::Unknown,
            TypedExpr::StaticTypeReference(ty) => ty.clone(),
            TypedExpr::Call { method, .. } => method.return_type.clone(),
            TypedExpr::Index { ty, .. } => ty.clone(),
            TypedExpr::NewArray { element, .. } => DataType::array(element.clone()),
            TypedExpr::Convert { ty, .. } => ty.clone(),
            TypedExpr::Binary { ty, .. } => ty.clone(),
            TypedExpr::Unary { ty, .. } => ty.clone(),
            TypedExpr::Assign { target, .. } => target.ty(),
        }
    }

    /// Whether this node can be used as a value.
    pub fn is_value(&self) -> bool {
        !matches!(
            self,
            TypedExpr::MethodGroup(_) | TypedExpr::StaticTypeReference(_) | TypedExpr::UnknownType
        )
    }

    pub fn is_null_literal(&self) -> bool {
        matches!(
            self,
            TypedExpr::Constant {
                value: Constant::Null,
                ..
            }
        )
    }

    /// Strip conversions, returning the converted expression.
    pub fn unwrap_converts(&self) -> &TypedExpr {
        let mut current = self;
        while let TypedExpr::Convert { expr, .. } = current {
            current = expr;
        }
        current
    }

    /// Visit this node and every sub-expression, parents first.
    pub fn walk(&self, f: &mut dyn FnMut(&TypedExpr)) {
        f(self);
        match self {
            TypedExpr::MemberAccess { target: Some(t), .. } => t.walk(f),
            TypedExpr::CapabilityGet { target, .. } => target.walk(f),
            TypedExpr::CapabilitySet { target, value, .. } => {
                target.walk(f);
                value.walk(f);
            }
            TypedExpr::MethodGroup(group) => group.target.walk(f),
            TypedExpr::Call { target, args, .. } => {
                if let Some(target) = target {
                    target.walk(f);
                }
                for arg in args {
                    arg.walk(f);
                }
            }
            TypedExpr::Index { target, index, .. } => {
                target.walk(f);
                index.walk(f);
            }
            TypedExpr::NewArray { items, .. } => {
                for item in items {
                    item.walk(f);
                }
            }
            TypedExpr::Convert { expr, .. } => expr.walk(f),
            TypedExpr::Binary { left, right, .. } => {
                left.walk(f);
                right.walk(f);
            }
            TypedExpr::Unary { operand, .. } => operand.walk(f),
            TypedExpr::Assign { target, value } => {
                target.walk(f);
                value.walk(f);
            }
            _ => {}
        }
    }
}

fn write_args(f: &mut fmt::Formatter<'_>, args: &[TypedExpr]) -> fmt::Result {
    for (i, arg) in args.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{arg}")?;
    }
    Ok(())
}

impl fmt::Display for TypedExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypedExpr::Constant { value, .. } => write!(f, "{value}"),
            TypedExpr::Parameter { name, .. } => write!(f, "{name}"),
            TypedExpr::MemberAccess { target, member } => match target {
                Some(target) => write!(f, "{target}.{}", member.name),
                None => write!(f, "{}.{}", member.declaring, member.name),
            },
            TypedExpr::CapabilityGet { target, property } => {
                write!(f, "{target}.GetValue({}Property)", property.name)
            }
            TypedExpr::CapabilitySet { target, property, value } => {
                write!(f, "{target}.SetValue({}Property, {value})", property.name)
            }
            TypedExpr::MethodGroup(group) => write!(f, "{}.{}", group.target, group.name),
            TypedExpr::StaticTypeReference(ty) => write!(f, "{ty}"),
            TypedExpr::UnknownType => write!(f, "?"),
            TypedExpr::Call { target, method, args } => {
                match target {
                    Some(target) => write!(f, "{target}.{}(", method.name)?,
                    None => write!(f, "{}.{}(", method.declaring, method.name)?,
                }
                write_args(f, args)?;
                write!(f, ")")
            }
            TypedExpr::Index { target, index, .. } => write!(f, "{target}[{index}]"),
            TypedExpr::NewArray { element, items } => {
                write!(f, "new {element}[] {{ ")?;
                write_args(f, items)?;
                write!(f, " }}")
            }
            TypedExpr::Convert { expr, ty, .. } => write!(f, "(({ty}){expr})"),
            TypedExpr::Binary { left, op, right, .. } => write!(f, "({left} {op} {right})"),
            TypedExpr::Unary { op, operand, .. } => write!(f, "{op}{operand}"),
            TypedExpr::Assign { target, value } => write!(f, "{target} = {value}"),
        }
    }
}
