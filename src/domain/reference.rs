use chrono::Utc;

/// Source of correlation references, as a seam so tests and replays can
/// pin exact keys.
pub trait ReferenceSource: Send + Sync {
    fn generate(&self) -> String;
}

/// Clock-based reference generator.
///
/// Format: `eT` + `%y%m%d.%H%M%S.%6f` (UTC), e.g. `eT251022.143025.123456`.
/// Microsecond resolution makes collisions unlikely at this deployment's
/// volume, but the store's unique constraint stays the authority: on a
/// duplicate, the submission flow regenerates and retries.
#[derive(Default, Clone)]
pub struct ReferenceGenerator;

impl ReferenceGenerator {
    pub fn new() -> Self {
        Self
    }
}

impl ReferenceSource for ReferenceGenerator {
    fn generate(&self) -> String {
        format!("eT{}", Utc::now().format("%y%m%d.%H%M%S.%6f"))
    }
}
