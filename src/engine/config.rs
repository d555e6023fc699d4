//! Validator configuration.
//!
//! [`ValidatorConfig`] is a plain `Copy` struct handed to
//! [`crate::engine::ValidatorFactory::new`]. Presets cover the common setups; individual fields
//! can be adjusted with struct update syntax.
//!
//! ```rust
//! use beanval::engine::{ExecutableTypes, ValidatorConfig};
//!
//! let config = ValidatorConfig {
//!     executable_types: ExecutableTypes::ALL,
//!     ..ValidatorConfig::fail_fast()
//! };
//! assert!(config.fail_fast);
//! ```

use bitflags::bitflags;

use crate::metadata::{rules::MethodValidationConfig, typesystem::ExecutableKind};

bitflags! {
    /// Kinds of executables eligible for parameter and return value validation.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ExecutableTypes: u8 {
        /// Constructors
        const CONSTRUCTORS = 0x01;
        /// Methods following the getter naming convention
        const GETTER_METHODS = 0x02;
        /// All other methods
        const NON_GETTER_METHODS = 0x04;
    }
}

impl ExecutableTypes {
    /// No executable is validated.
    pub const NONE: Self = Self::empty();
    /// Constructors and non getter methods, the standard setting.
    pub const IMPLICIT: Self = Self::CONSTRUCTORS.union(Self::NON_GETTER_METHODS);
    /// Every executable is validated.
    pub const ALL: Self = Self::all();

    /// Returns `true` if executables of `kind` are eligible.
    #[must_use]
    pub fn covers(self, kind: ExecutableKind) -> bool {
        match kind {
            ExecutableKind::Constructor => self.contains(Self::CONSTRUCTORS),
            ExecutableKind::Getter => self.contains(Self::GETTER_METHODS),
            ExecutableKind::Method => self.contains(Self::NON_GETTER_METHODS),
        }
    }
}

impl Default for ExecutableTypes {
    fn default() -> Self {
        Self::IMPLICIT
    }
}

/// Behaviour of validators created by a factory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidatorConfig {
    /// Stop a validation call at the first violation
    pub fail_fast: bool,
    /// Relaxations of the method configuration rules
    pub method_validation: MethodValidationConfig,
    /// Executables eligible for parameter and return value validation
    pub executable_types: ExecutableTypes,
    /// Skip beans already validated for a group on a related path. When disabled, a bean is
    /// validated again wherever it is reached, except while it is still being cascaded into
    /// further up the same path
    pub track_processed_beans: bool,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            fail_fast: false,
            method_validation: MethodValidationConfig::default(),
            executable_types: ExecutableTypes::IMPLICIT,
            track_processed_beans: true,
        }
    }
}

impl ValidatorConfig {
    /// Every rule enforced, every executable validated.
    #[must_use]
    pub fn strict() -> Self {
        Self {
            executable_types: ExecutableTypes::ALL,
            ..Self::default()
        }
    }

    /// Method configuration rules relaxed where possible.
    #[must_use]
    pub fn lenient() -> Self {
        Self {
            method_validation: MethodValidationConfig::lenient(),
            ..Self::default()
        }
    }

    /// Default settings, stopping at the first violation.
    #[must_use]
    pub fn fail_fast() -> Self {
        Self {
            fail_fast: true,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_executable_types() {
        assert!(ExecutableTypes::IMPLICIT.covers(ExecutableKind::Constructor));
        assert!(ExecutableTypes::IMPLICIT.covers(ExecutableKind::Method));
        assert!(!ExecutableTypes::IMPLICIT.covers(ExecutableKind::Getter));
        assert!(ExecutableTypes::ALL.covers(ExecutableKind::Getter));
        assert!(!ExecutableTypes::NONE.covers(ExecutableKind::Method));
    }

    #[test]
    fn test_presets() {
        assert!(!ValidatorConfig::default().fail_fast);
        assert!(ValidatorConfig::fail_fast().fail_fast);
        assert_eq!(ValidatorConfig::strict().executable_types, ExecutableTypes::ALL);
        assert!(
            ValidatorConfig::lenient()
                .method_validation
                .allow_parallel_methods_define_parameter_constraints
        );
    }
}
