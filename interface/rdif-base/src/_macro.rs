/// Declares a transparent newtype around a primitive.
///
/// `$fmt` is used for both `Debug` and `Display`.
#[macro_export]
macro_rules! custom_type {
    (@impl [$(#[$meta:meta])*] $name:ident, $target:ty, $fmt:literal) => {
        $(#[$meta])*
        #[repr(transparent)]
        #[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(pub $target);

        impl $name {
            pub const fn raw(&self) -> $target {
                self.0
            }
        }

        impl core::fmt::Debug for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                write!(f, $fmt, self.0)
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                write!(f, $fmt, self.0)
            }
        }

        impl From<$target> for $name {
            fn from(value: $target) -> Self {
                Self(value)
            }
        }

        impl From<$name> for $target {
            fn from(value: $name) -> Self {
                value.0
            }
        }
    };
    ($(#[$meta:meta])+, $name:ident, $target:ty, $fmt:literal) => {
        $crate::custom_type!(@impl [$(#[$meta])+] $name, $target, $fmt);
    };
    ($name:ident, $target:ty, $fmt:literal) => {
        $crate::custom_type!(@impl [] $name, $target, $fmt);
    };
}
