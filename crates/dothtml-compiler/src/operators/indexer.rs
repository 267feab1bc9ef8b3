//! Indexer resolution (`target[index]`).

use dothtml_core::{DataType, ResolutionError};
use dothtml_registry::TypeSystem;
use tracing::trace;

use crate::conversion::implicit_conversion;
use crate::typed_expr::TypedExpr;

fn not_found(target_ty: &DataType, index_ty: &DataType) -> ResolutionError {
    ResolutionError::IndexerNotFound {
        type_name: target_ty.to_string(),
        index_type: index_ty.to_string(),
    }
}

/// Resolve `target[index]`.
///
/// Arrays index by `int` directly. Other types need exactly one
/// single-parameter indexer whose parameter accepts `index`.
pub fn get_indexer(types: &dyn TypeSystem, target: &TypedExpr, index: &TypedExpr) -> Result<TypedExpr, ResolutionError> {
    let target_ty = target.ty();
    let index_ty = index.ty();

    if let DataType::Array(element) = &target_ty {
        let index = implicit_conversion(types, index.clone(), &DataType::int32(), false)
            .ok_or_else(|| not_found(&target_ty, &index_ty))?;
        return Ok(TypedExpr::Index {
            target: Box::new(target.clone()),
            index: Box::new(index),
            indexer: None,
            ty: element.as_ref().clone(),
        });
    }

    let mut matching = types.indexers(&target_ty).into_iter().filter_map(|indexer| {
        let converted = implicit_conversion(types, index.clone(), &indexer.param.ty, false)?;
        Some((indexer, converted))
    });
    let Some((indexer, converted)) = matching.next() else {
        return Err(not_found(&target_ty, &index_ty));
    };
    if let Some((other, _)) = matching.next() {
        trace!(first = %indexer.param.ty, second = %other.param.ty, "indexers both accept the argument");
        return Err(ResolutionError::AmbiguousIndexer {
            type_name: target_ty.to_string(),
            index_type: index_ty.to_string(),
        });
    }

    Ok(TypedExpr::Index {
        target: Box::new(target.clone()),
        index: Box::new(converted),
        ty: indexer.ty.clone(),
        indexer: Some(indexer),
    })
}
