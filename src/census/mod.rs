mod acs;
mod aggregate;
mod variables;

pub use acs::{ACS_VARIABLES, AcsGroup, DEFAULT_ACS_VARIABLES, describe_acs, list_acs_tables};
pub use aggregate::{GEOID_COLUMN, aggregate, join_native, to_value_maps};
pub use variables::{DEFAULT_LOOKUP_VARIABLES, DEFAULT_VARIABLES, Pl94171Group, VARIABLES, describe, list_tables};
