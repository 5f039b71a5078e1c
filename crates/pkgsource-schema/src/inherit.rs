//! The installer override rule.
//!
//! An installer manifest declares a set of installer fields once at manifest
//! level and again per installer entry. Per-entry values win; an entry field
//! left empty takes the manifest-level value; if both are empty the field
//! stays empty.

/// Whether a value counts as "not provided" for override purposes.
pub trait Unset {
    /// Returns `true` when the value is empty, zero, `false` or absent.
    fn is_unset(&self) -> bool;
}

impl Unset for String {
    fn is_unset(&self) -> bool {
        self.is_empty()
    }
}

impl Unset for bool {
    fn is_unset(&self) -> bool {
        !*self
    }
}

impl Unset for i64 {
    fn is_unset(&self) -> bool {
        *self == 0
    }
}

impl<T> Unset for Vec<T> {
    fn is_unset(&self) -> bool {
        self.is_empty()
    }
}

impl<T: Unset> Unset for Option<T> {
    fn is_unset(&self) -> bool {
        self.as_ref().is_none_or(Unset::is_unset)
    }
}

/// A field set that can take missing values from a set of defaults.
pub trait Inherit {
    /// Fill every unset field of `self` from `defaults`.
    fn inherit(&mut self, defaults: &Self);
}

/// Apply the override rule to a single field.
pub fn inherit_field<T: Unset + Clone>(slot: &mut T, fallback: &T) {
    if slot.is_unset() {
        slot.clone_from(fallback);
    }
}

/// Implements [`Unset`] as "never unset" for enum-like values, which only
/// appear wrapped in `Option`.
macro_rules! always_set {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl $crate::inherit::Unset for $ty {
                fn is_unset(&self) -> bool {
                    false
                }
            }
        )+
    };
}

/// Applies [`inherit_field`] to each listed field of two values of the same type.
macro_rules! inherit_fields {
    ($target:expr, $defaults:expr; $($field:ident),+ $(,)?) => {
        $(
            $crate::inherit::inherit_field(&mut $target.$field, &$defaults.$field);
        )+
    };
}

pub(crate) use always_set;
pub(crate) use inherit_fields;
