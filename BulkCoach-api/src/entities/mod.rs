// Public entities for the BulkCoach API
// Request and response bodies that only exist at the HTTP boundary

// Coaching responses
pub mod coach;

// Error envelope and shared query parameters
pub mod common;

pub use coach::{ApplySuggestionResponse, DismissSuggestionResponse, StagnationCheckResponse};
pub use common::{ErrorResponse, UserQuery};
