//! Record identifier generation

/// Source of fresh record identifiers.
///
/// Implementations must never hand out an identifier that is already live in
/// a collection; callers do not re-check.
pub trait IdGenerator: Send + Sync {
    fn new_id(&self) -> String;
}

/// Random UUID v4 identifiers
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidGenerator;

impl IdGenerator for UuidGenerator {
    fn new_id(&self) -> String {
        uuid::Uuid::new_v4().to_string()
    }
}

/// Generate an identifier with the default generator
pub fn new_id() -> String {
    UuidGenerator.new_id()
}
