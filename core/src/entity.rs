use crate::error::ModelError;
use chrono::{DateTime, Utc};

/// A record held in one of the flat store collections.
pub trait Entity: Clone + Send + Sync + 'static {
    type Patch;

    const KIND: &'static str;

    fn id(&self) -> i32;

    /// Merges all `Some` fields of the patch into the record
    fn apply(&mut self, patch: Self::Patch);
}

/// Creation payload of an [`Entity`], everything except the assigned
/// id and creation timestamp.
pub trait Draft {
    type Entity: Entity;

    fn validate(&self) -> Result<(), ModelError>;

    fn build(self, id: i32, now: DateTime<Utc>) -> Self::Entity;
}

pub(crate) fn require_name(name: &str) -> Result<(), ModelError> {
    if name.trim().is_empty() {
        Err(ModelError::MissingField("name"))
    } else {
        Ok(())
    }
}

pub(crate) fn require_positive(field: &'static str, value: f64) -> Result<(), ModelError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ModelError::InvalidValue(field, format!("{}", value)))
    }
}

/// Copies every `Some` field of a patch onto the target
#[macro_export]
macro_rules! merge_patch {
    ($target:expr, $patch:expr, $($field:ident),* $(,)?) => {
        $(
            if let Some(value) = $patch.$field {
                $target.$field = value;
            }
        )*
    };
}
