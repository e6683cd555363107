/// Generates typed accessors for declared properties of an [`Entity`](crate::Entity).
///
/// Each `snake_name: Type` pair maps to the camelCase property `snakeName`
/// and yields `snake_name()`, `set_snake_name(value)` and
/// `set_snake_name_untracked(value)`.
#[macro_export]
macro_rules! entity_accessors {
    ($entity:ty { $($prop:ident : $ty:ty),+ $(,)? }) => {
        $crate::paste::paste! {
            impl $entity {
                $(
                    pub fn $prop(&self) -> $crate::Result<$ty> {
                        let name = $crate::schema::to_property_name(stringify!($prop));
                        let value = $crate::Entity::record(self).get(&name)?;
                        <$ty as $crate::FromValue>::from_value(value).ok_or_else(|| {
                            $crate::DbError::TypeMismatch(format!(
                                "property '{}' holds {}",
                                name,
                                value.type_name()
                            ))
                        })
                    }

                    pub fn [<set_ $prop>](
                        &mut self,
                        value: impl Into<$crate::Value>,
                    ) -> $crate::Result<()> {
                        let name = $crate::schema::to_property_name(stringify!($prop));
                        $crate::Entity::record_mut(self).set(&name, value)
                    }

                    pub fn [<set_ $prop _untracked>](
                        &mut self,
                        value: impl Into<$crate::Value>,
                    ) -> $crate::Result<()> {
                        let name = $crate::schema::to_property_name(stringify!($prop));
                        $crate::Entity::record_mut(self).set_with(&name, value, false)
                    }
                )+
            }
        }
    };
}
