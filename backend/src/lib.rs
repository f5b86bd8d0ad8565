//! Backend library for the Quorum Q&A forum.
//!
//! Organised hexagonally: `domain` holds the entities, services, and
//! ports; `inbound` adapts HTTP onto the driving ports; `outbound` adapts
//! the driven ports onto DynamoDB, the identity provider, and the
//! tag-suggestion model.

pub mod config;
pub mod doc;
pub mod domain;
pub mod inbound;
pub mod middleware;
pub mod outbound;

/// Public OpenAPI surface used by Swagger UI and tooling.
pub use doc::ApiDoc;
pub use middleware::Trace;
