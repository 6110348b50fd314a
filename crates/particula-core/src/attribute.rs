//! Runtime attribute type descriptors and type-erased column storage.
//!
//! An [`AttributeType`] describes a value kind (size, alignment, default
//! bit pattern) and knows how to build an empty column of that kind. Columns
//! are held behind [`ColumnData`] so blocks can store heterogeneous
//! attributes side by side and move slots around as raw bytes, while typed
//! access goes through a checked downcast to [`TypedColumn<T>`].
//!
//! Every value type is [`bytemuck::Pod`]: copying is a byte copy and
//! destruction is a plain `Drop` of the backing `Vec`, so no per-element
//! copy/destroy hooks are needed.

use std::any::{Any, TypeId};
use std::fmt;

use bytemuck::Pod;
use smallvec::SmallVec;

use crate::math::{Float3, Rgba};

/// A value type that can be stored in an attribute column.
///
/// Implementors must be plain old data. The default value is what freshly
/// allocated particle slots are initialised to.
pub trait AttributeValue: Pod + Send + Sync + 'static {
    /// Short human-readable type name used in diagnostics.
    const TYPE_NAME: &'static str;

    /// Value written into newly allocated slots.
    fn default_value() -> Self;
}

impl AttributeValue for f32 {
    const TYPE_NAME: &'static str = "float";

    fn default_value() -> Self {
        0.0
    }
}

impl AttributeValue for i32 {
    const TYPE_NAME: &'static str = "int32";

    fn default_value() -> Self {
        0
    }
}

impl AttributeValue for u32 {
    const TYPE_NAME: &'static str = "uint32";

    fn default_value() -> Self {
        0
    }
}

impl AttributeValue for Float3 {
    const TYPE_NAME: &'static str = "float3";

    fn default_value() -> Self {
        Float3::ZERO
    }
}

impl AttributeValue for Rgba {
    const TYPE_NAME: &'static str = "rgba_f";

    fn default_value() -> Self {
        Rgba::WHITE
    }
}

/// Type-erased storage for one attribute column.
///
/// The column length is the owning block's capacity; which prefix is live is
/// tracked by the block, not the column.
pub trait ColumnData: Send + Sync {
    /// Number of elements (live or not) held by this column.
    fn len(&self) -> usize;

    /// Whether the column holds no elements.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The whole column as raw bytes.
    fn bytes(&self) -> &[u8];

    /// The whole column as mutable raw bytes.
    fn bytes_mut(&mut self) -> &mut [u8];

    /// Upcast for typed downcasting.
    fn as_any(&self) -> &dyn Any;

    /// Mutable upcast for typed downcasting.
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Concrete column for values of type `T`.
pub struct TypedColumn<T: AttributeValue> {
    values: Vec<T>,
}

impl<T: AttributeValue> TypedColumn<T> {
    /// Create a column of `capacity` default values.
    pub fn new(capacity: usize) -> Self {
        Self {
            values: vec![T::default_value(); capacity],
        }
    }

    /// All values, live or not.
    pub fn as_slice(&self) -> &[T] {
        &self.values
    }

    /// All values, live or not, mutably.
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.values
    }
}

impl<T: AttributeValue> ColumnData for TypedColumn<T> {
    fn len(&self) -> usize {
        self.values.len()
    }

    fn bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.values)
    }

    fn bytes_mut(&mut self) -> &mut [u8] {
        bytemuck::cast_slice_mut(&mut self.values)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

fn make_column<T: AttributeValue>(capacity: usize) -> Box<dyn ColumnData> {
    Box::new(TypedColumn::<T>::new(capacity))
}

/// Runtime descriptor of an attribute value type.
///
/// Built once per type with [`AttributeType::of`]; cheap to clone. Two
/// descriptors are equal when they describe the same Rust type.
#[derive(Clone)]
pub struct AttributeType {
    name: &'static str,
    type_id: TypeId,
    size: usize,
    align: usize,
    default: SmallVec<[u8; 16]>,
    new_column: fn(usize) -> Box<dyn ColumnData>,
}

impl AttributeType {
    /// Descriptor for the value type `T`.
    pub fn of<T: AttributeValue>() -> Self {
        let default = T::default_value();
        Self {
            name: T::TYPE_NAME,
            type_id: TypeId::of::<T>(),
            size: std::mem::size_of::<T>(),
            align: std::mem::align_of::<T>(),
            default: SmallVec::from_slice(bytemuck::bytes_of(&default)),
            new_column: make_column::<T>,
        }
    }

    /// Human-readable type name.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Size of one element in bytes.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Alignment of one element in bytes.
    pub fn align(&self) -> usize {
        self.align
    }

    /// Bit pattern of the default value.
    pub fn default_bytes(&self) -> &[u8] {
        &self.default
    }

    /// Whether this descriptor describes `T`.
    pub fn is<T: AttributeValue>(&self) -> bool {
        self.type_id == TypeId::of::<T>()
    }

    /// Build a column holding `capacity` default values.
    pub fn new_column(&self, capacity: usize) -> Box<dyn ColumnData> {
        (self.new_column)(capacity)
    }

    /// Byte range of element `index` in a column of this type.
    pub fn element_range(&self, index: usize) -> std::ops::Range<usize> {
        let start = index * self.size;
        start..start + self.size
    }

    /// Overwrite every element of `dst` with the default bit pattern.
    ///
    /// # Panics
    ///
    /// Panics if `dst.len()` is not a multiple of the element size.
    pub fn fill_default(&self, dst: &mut [u8]) {
        assert_eq!(
            dst.len() % self.size.max(1),
            0,
            "buffer of {} bytes is not a whole number of {} elements",
            dst.len(),
            self.name,
        );
        for chunk in dst.chunks_exact_mut(self.size.max(1)) {
            chunk.copy_from_slice(&self.default);
        }
    }

    /// Copy element `from` to element `to` within one column's bytes.
    pub fn copy_within(&self, column: &mut [u8], from: usize, to: usize) {
        if from != to {
            column.copy_within(self.element_range(from), to * self.size);
        }
    }

    /// Panic unless this descriptor describes `T`.
    ///
    /// Accessing an attribute under the wrong type is a caller bug, so it
    /// fails fast instead of returning an error.
    #[track_caller]
    pub fn assert_is<T: AttributeValue>(&self, attribute: &str) {
        assert!(
            self.is::<T>(),
            "attribute '{attribute}' has type {}, accessed as {}",
            self.name,
            T::TYPE_NAME,
        );
    }
}

impl PartialEq for AttributeType {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id && self.default == other.default
    }
}

impl Eq for AttributeType {}

impl fmt::Debug for AttributeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AttributeType")
            .field("name", &self.name)
            .field("size", &self.size)
            .field("align", &self.align)
            .finish()
    }
}

impl fmt::Display for AttributeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}
