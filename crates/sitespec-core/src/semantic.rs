//! Site spec intermediate representation.
//!
//! This module contains the lowered, type-resolved representation of a site
//! spec file. It is built once per invocation and handed read-only to the
//! code generators.
//!
//! # Pipeline Position
//!
//! ```text
//! Root file
//!     ↓ import resolver
//! Resolved source text
//!     ↓ lexer
//! Line tokens
//!     ↓ parser
//! Parser AST (parser_types) - syntactic structure with spans
//!     ↓ spec builder
//! SiteSpec (these types) - resolved types, linked menus
//!     ↓ generators
//! Generated application
//! ```
//!
//! # Organization
//!
//! - [`types`] - The type algebra: [`Type`], [`Field`] and the variant structs
//! - [`site`] - [`SiteSpec`], [`Server`], [`Service`], [`Handler`], [`Method`] and topics
//! - [`menu`] - [`MenuEntry`] trees
//! - [`request_type`] - [`RequestType`] classification of methods

pub mod menu;
pub mod request_type;
pub mod site;
pub mod types;

pub use menu::*;
pub use request_type::*;
pub use site::*;
pub use types::*;
