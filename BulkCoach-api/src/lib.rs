// BulkCoach-api lib.rs
//
// HTTP layer of the BulkCoach application: routes, handlers,
// the public error envelope and the OpenAPI document.

// Public modules
pub mod api;
pub mod entities;
pub mod openapi;
