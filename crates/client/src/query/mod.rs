//! Fluent query building for the generic query endpoint.
//!
//! [`QueryBuilder`] accumulates clauses into a
//! [`QueryDescriptor`](fluxbase_domain::QueryDescriptor) and serializes it as
//! the JSON body of a single POST to `/query`. [`ConditionGroup`] is the
//! shared condition-accumulation primitive used for WHERE/HAVING trees and
//! grouped sub-clauses.

mod builder;
mod group;
mod sql;

pub use builder::QueryBuilder;
pub use group::ConditionGroup;
pub use sql::render_sql;
