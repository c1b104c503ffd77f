//! # Fixed Primitives
//!
//! Hardcoded constants for layout, id generation and input limits.
//!
//! These are compiled into the binary and are immutable at runtime.

// =============================================================================
// LAYOUT GRID
// =============================================================================

/// Number of grid columns before wrapping to the next row.
pub const GRID_COLUMNS: usize = 3;

/// Horizontal distance between grid columns, in layout units.
pub const COLUMN_SPACING: i64 = 250;

/// Vertical distance between grid rows, in layout units.
pub const ROW_SPACING: i64 = 150;

// =============================================================================
// NODE ID PREFIXES
// =============================================================================

pub const SITUATION_PREFIX: &str = "SI";
pub const PROBLEM_PREFIX: &str = "PI";
pub const INTENTION_PREFIX: &str = "EI";
pub const DECOMPOSITION_PREFIX: &str = "DI";
pub const SUBSYSTEM_PREFIX: &str = "SUB";
pub const SOLUTION_PREFIX: &str = "SA";

/// Type tag of the placeholder node created for each decomposition pair.
///
/// Not part of the closed colour table, so it renders with the default style.
pub const SUBSYSTEM_PLACEHOLDER_KIND: &str = "Subsystem";

// =============================================================================
// INPUT VALIDATION LIMITS
// =============================================================================

/// Maximum length, in bytes, of any single user-supplied value.
pub const MAX_INPUT_LENGTH: usize = 1024;

/// Maximum number of pairs accepted in one decomposition.
pub const MAX_DECOMPOSITION_PAIRS: usize = 64;

/// Default bound on transitions taken by the automatic explorer.
///
/// Guarantees termination when the knowledge base decomposes cyclically.
pub const DEFAULT_AUTO_STEPS: usize = 256;
