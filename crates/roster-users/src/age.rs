use crate::error::AgeGroupError;
use roster_types::AgeGroup;

/// Classifies an age into its bracket.
///
/// # Errors
///
/// Returns `AgeGroupError::InvalidAge` for `age <= 0`; its message is
/// always `"Edad invalida"`.
pub fn age_group(age: i64) -> Result<AgeGroup, AgeGroupError> {
    match age {
        1..=17 => Ok(AgeGroup::Underage),
        18..=63 => Ok(AgeGroup::Adult),
        64.. => Ok(AgeGroup::Senior),
        _ => Err(AgeGroupError::InvalidAge(age)),
    }
}
