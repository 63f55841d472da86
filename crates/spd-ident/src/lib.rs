//! SPD Identifier System
//!
//! Dash-delimited project identifiers and the grammar used to find them
//! inside artifact lines.
//!
//! # Overview
//!
//! - **Grammar**: definition lines, reference tokens, priority tokens and
//!   incidental backticked mentions
//! - **ParsedIdentifier**: `spd-<system>-<kind>-<slug>` decomposed, with the
//!   parent identifier of composite ids
//! - **IdentifierResolver**: registry-aware resolution (longest system match,
//!   kind allow-list, parent gating)
//!
//! # Example
//!
//! ```rust
//! use spd_ident::IdentifierResolver;
//!
//! let resolver = IdentifierResolver::new(["account", "account-server"], None::<Vec<&str>>);
//! let parsed = resolver.resolve("spd-account-server-spec-billing", "spec", None).unwrap();
//! assert_eq!(parsed.system, "account-server");
//! assert_eq!(parsed.slug, "billing");
//! ```

#![warn(missing_docs)]

pub mod grammar;
pub mod identifier;

// Re-exports
pub use grammar::{
    find_backticked_ids, has_priority_token, is_priority_token, looks_like_definition,
    parse_definition_line, parse_reference_token, strip_list_marker, DefinitionLine,
    ReferenceToken, DEFINITION_TAG, ID_PREFIX,
};
pub use identifier::{parse_identifier, system_of, IdentifierResolver, ParsedIdentifier};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for identifier operations
    pub use crate::{
        parse_identifier, system_of, DefinitionLine, IdentifierResolver, ParsedIdentifier,
        ReferenceToken,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
