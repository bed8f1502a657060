use crate::{
    error::UsageError,
    schema::{
        attribute::{Attribute, AttributeId, AttributeValue},
        interpolation::InterpolationFn,
    },
    types::ClassId,
};

/// Describes the packed snapshot layout of one kind of replicated object.
///
/// Attributes are laid out in the order they are added; their offsets are
/// fixed at that point.
///
/// ```
/// # use snapwire_shared::ObjectClass;
/// let class = ObjectClass::new(1)
///     .with_attribute::<f32>()
///     .with_attribute::<f32>()
///     .with_attribute::<u8>();
/// assert_eq!(class.byte_size(), 9);
/// ```
#[derive(Clone, Debug)]
pub struct ObjectClass {
    id: ClassId,
    attributes: Vec<Attribute>,
    byte_size: usize,
}

impl ObjectClass {
    pub fn new(id: ClassId) -> Self {
        Self {
            id,
            attributes: Vec::new(),
            byte_size: 0,
        }
    }

    /// Adds an attribute using the type's default interpolation
    pub fn with_attribute<T: AttributeValue>(self) -> Self {
        self.with_raw_attribute(T::SIZE, T::default_interpolation())
    }

    /// Adds an attribute with a custom interpolation function
    pub fn with_interpolated_attribute<T: AttributeValue>(self, interpolation: InterpolationFn) -> Self {
        self.with_raw_attribute(T::SIZE, Some(interpolation))
    }

    /// Adds an attribute that always reads as its nearest snapshot
    pub fn with_discrete_attribute<T: AttributeValue>(self) -> Self {
        self.with_raw_attribute(T::SIZE, None)
    }

    pub fn with_raw_attribute(mut self, size: usize, interpolation: Option<InterpolationFn>) -> Self {
        self.attributes.push(Attribute {
            size,
            offset: self.byte_size,
            interpolation,
        });
        self.byte_size += size;
        self
    }

    pub fn id(&self) -> ClassId {
        self.id
    }

    pub fn byte_size(&self) -> usize {
        self.byte_size
    }

    pub fn attribute_count(&self) -> usize {
        self.attributes.len()
    }

    /// Looks up an attribute, checking that values of type `T` fit it
    pub fn typed_attribute<T: AttributeValue>(&self, attribute: AttributeId) -> Result<&Attribute, UsageError> {
        let definition = self
            .attributes
            .get(attribute)
            .ok_or(UsageError::UnknownAttribute {
                class_id: self.id,
                attribute,
            })?;
        if definition.size != T::SIZE {
            return Err(UsageError::AttributeTypeMismatch {
                attribute,
                expected: definition.size,
                actual: T::SIZE,
            });
        }
        Ok(definition)
    }

    pub fn read_attribute<T: AttributeValue>(&self, snapshot: &[u8], attribute: AttributeId) -> Result<T, UsageError> {
        let definition = self.typed_attribute::<T>(attribute)?;
        Ok(T::read_from(&snapshot[definition.range()]))
    }

    pub fn write_attribute<T: AttributeValue>(
        &self,
        snapshot: &mut [u8],
        attribute: AttributeId,
        value: T,
    ) -> Result<(), UsageError> {
        let definition = self.typed_attribute::<T>(attribute)?;
        value.write_to(&mut snapshot[definition.range()]);
        Ok(())
    }

    /// A zeroed snapshot with this class's layout
    pub fn empty_snapshot(&self) -> Box<[u8]> {
        vec![0u8; self.byte_size].into_boxed_slice()
    }
}
