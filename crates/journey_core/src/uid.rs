//! Entry uid generation.

use uuid::Uuid;

/// Source of fresh opaque entry identifiers.
///
/// Collisions must be negligible; no ordering guarantee is required.
pub trait UidGenerator {
    fn generate(&self) -> String;
}

/// Default generator producing hyphenated UUID v4 strings.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidGenerator;

impl UidGenerator for UuidGenerator {
    fn generate(&self) -> String {
        Uuid::new_v4().to_string()
    }
}

impl<F> UidGenerator for F
where
    F: Fn() -> String,
{
    fn generate(&self) -> String {
        self()
    }
}
