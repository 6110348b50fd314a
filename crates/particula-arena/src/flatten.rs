//! Copying one attribute between a container's blocks and a flat buffer.
//!
//! The flat layout is the canonical particle order: active blocks in
//! creation order, slots `[0, active_count)` within each. Byte-level entry
//! points take the element size from the attribute's descriptor; the typed
//! wrappers check the Rust type first.

use rayon::prelude::*;

use particula_core::AttributeValue;

use crate::container::BlockContainer;
use crate::error::FlattenError;

/// Buffer length in bytes needed to flatten attribute `name`.
///
/// # Panics
///
/// Panics if `name` is not in the container's schema.
#[track_caller]
pub fn flat_len(container: &BlockContainer, name: &str) -> usize {
    element_size(container, name) * container.count_active()
}

#[track_caller]
fn element_size(container: &BlockContainer, name: &str) -> usize {
    let schema = container.schema();
    let id = schema.expect_index(name);
    schema.get(id).map_or(0, |(_, ty)| ty.size())
}

#[track_caller]
fn check_len(container: &BlockContainer, name: &str, actual: usize) -> Result<(), FlattenError> {
    let expected = flat_len(container, name);
    if expected == actual {
        Ok(())
    } else {
        Err(FlattenError::SizeMismatch {
            attribute: name.to_string(),
            expected,
            actual,
        })
    }
}

/// Copy attribute `name` of every live particle into `out`.
///
/// # Errors
///
/// [`FlattenError::SizeMismatch`] if `out` is not exactly
/// [`flat_len`] bytes long; `out` is left untouched.
///
/// # Panics
///
/// Panics if `name` is not in the schema.
#[track_caller]
pub fn flatten_into(
    container: &BlockContainer,
    name: &str,
    out: &mut [u8],
) -> Result<(), FlattenError> {
    check_len(container, name, out.len())?;
    let mut offset = 0;
    for block in container.active_blocks() {
        let bytes = block.attribute_span(name).bytes();
        out[offset..offset + bytes.len()].copy_from_slice(bytes);
        offset += bytes.len();
    }
    Ok(())
}

/// Parallel [`flatten_into`]: blocks are copied concurrently into disjoint
/// slices of `out`. The result is byte-identical to the sequential path.
///
/// # Errors
///
/// [`FlattenError::SizeMismatch`] as for [`flatten_into`].
///
/// # Panics
///
/// Panics if `name` is not in the schema.
#[track_caller]
pub fn par_flatten_into(
    container: &BlockContainer,
    name: &str,
    out: &mut [u8],
) -> Result<(), FlattenError> {
    check_len(container, name, out.len())?;
    let id = container.schema().expect_index(name);

    let mut rest = out;
    let mut jobs = Vec::with_capacity(container.block_count());
    for block in container.active_blocks() {
        let span = block.span(id);
        let (head, tail) = std::mem::take(&mut rest).split_at_mut(span.bytes().len());
        jobs.push((span, head));
        rest = tail;
    }

    jobs.into_par_iter().for_each(|(span, dst)| dst.copy_from_slice(span.bytes()));
    Ok(())
}

/// Attribute `name` of every live particle as a new vector.
///
/// # Panics
///
/// Panics if `name` is unknown or not of type `T`.
#[track_caller]
pub fn flatten<T: AttributeValue>(container: &BlockContainer, name: &str) -> Vec<T> {
    expect_type::<T>(container, name);
    let mut values = Vec::with_capacity(container.count_active());
    for block in container.active_blocks() {
        values.extend_from_slice(block.attribute::<T>(name));
    }
    values
}

/// Parallel [`flatten`].
///
/// # Panics
///
/// Panics if `name` is unknown or not of type `T`.
#[track_caller]
pub fn par_flatten<T: AttributeValue>(container: &BlockContainer, name: &str) -> Vec<T> {
    expect_type::<T>(container, name);
    let mut values = vec![T::default_value(); container.count_active()];
    if let Err(e) = par_flatten_into(container, name, bytemuck::cast_slice_mut(&mut values)) {
        unreachable!("buffer sized from count_active: {e}");
    }
    values
}

/// Overwrite attribute `name` of every live particle from `input`.
///
/// # Errors
///
/// [`FlattenError::SizeMismatch`] if `input` is not exactly
/// [`flat_len`] bytes long; storage is left untouched.
///
/// # Panics
///
/// Panics if `name` is not in the schema.
#[track_caller]
pub fn unflatten_from(
    container: &mut BlockContainer,
    name: &str,
    input: &[u8],
) -> Result<(), FlattenError> {
    check_len(container, name, input.len())?;
    let id = container.schema().expect_index(name);
    let mut offset = 0;
    for block in container.active_blocks_mut() {
        let mut span = block.span_mut(id);
        let len = span.bytes().len();
        span.bytes_mut().copy_from_slice(&input[offset..offset + len]);
        offset += len;
    }
    Ok(())
}

/// Typed [`unflatten_from`].
///
/// # Errors
///
/// [`FlattenError::SizeMismatch`] if `values.len()` differs from the live
/// particle count.
///
/// # Panics
///
/// Panics if `name` is unknown or not of type `T`.
#[track_caller]
pub fn unflatten<T: AttributeValue>(
    container: &mut BlockContainer,
    name: &str,
    values: &[T],
) -> Result<(), FlattenError> {
    expect_type::<T>(container, name);
    unflatten_from(container, name, bytemuck::cast_slice(values))
}

#[track_caller]
fn expect_type<T: AttributeValue>(container: &BlockContainer, name: &str) {
    let schema = container.schema();
    let id = schema.expect_index(name);
    if let Some((_, ty)) = schema.get(id) {
        ty.assert_is::<T>(name);
    }
}
