//! Sitespec Core Types and Definitions
//!
//! This crate provides the intermediate representation (IR) produced from a
//! site spec file and consumed by code generators. It includes:
//!
//! - **Type algebra**: primitive, struct, array, map, pointer and interface
//!   types ([`semantic::Type`])
//! - **Site model**: servers, services, handlers and methods ([`semantic::SiteSpec`])
//! - **Menus**: linked navigation trees ([`semantic::MenuEntry`])
//! - **Classification**: the request-type category of a method
//!   ([`semantic::RequestType`])

pub mod semantic;
