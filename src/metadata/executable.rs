//! Executable (method and constructor) metadata.

use std::sync::Arc;

use crate::{
    engine::ExecutableTypes,
    metadata::{
        element::ElementMetadata,
        metaconstraint::MetaConstraint,
        typesystem::{ExecutableKind, ExecutableSignature, TypeName},
    },
    Error, Result,
};

/// Aggregated metadata of one parameter.
#[derive(Debug, Clone)]
pub struct ParameterMetadata {
    /// Position in the parameter list
    pub index: usize,
    /// Name used in property paths
    pub name: String,
    /// Declared type
    pub type_name: TypeName,
    /// Merged element configuration of all declarations
    pub element: ElementMetadata,
    /// Constraints evaluated against the parameter, including container element constraints
    pub constraints: Vec<Arc<MetaConstraint>>,
}

/// Aggregated metadata of a method or constructor.
///
/// Built from every declaration of one signature within a hierarchy. Constraint sets are the
/// union of all declarations; the override legality rules guarantee that the union of parameter
/// constraints equals the constraints of the topmost declaration.
#[derive(Debug, Clone)]
pub struct ExecutableMetadata {
    pub(crate) signature: ExecutableSignature,
    pub(crate) kind: ExecutableKind,
    pub(crate) return_type: Option<TypeName>,
    pub(crate) parameters: Vec<ParameterMetadata>,
    pub(crate) return_value: ElementMetadata,
    pub(crate) return_constraints: Vec<Arc<MetaConstraint>>,
    pub(crate) cross_parameter: Vec<Arc<MetaConstraint>>,
    pub(crate) declaring_types: Vec<TypeName>,
}

impl ExecutableMetadata {
    /// The signature shared by all merged declarations.
    #[must_use]
    pub fn signature(&self) -> &ExecutableSignature {
        &self.signature
    }

    /// The executable name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.signature.name()
    }

    /// Constructor, getter or method.
    #[must_use]
    pub fn kind(&self) -> ExecutableKind {
        self.kind
    }

    /// The return type, `None` for void methods.
    #[must_use]
    pub fn return_type(&self) -> Option<&TypeName> {
        self.return_type.as_ref()
    }

    /// All parameters in declaration order.
    #[must_use]
    pub fn parameters(&self) -> &[ParameterMetadata] {
        &self.parameters
    }

    /// The parameter at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownParameterIndex`] if the executable has fewer parameters.
    pub fn parameter(&self, index: usize) -> Result<&ParameterMetadata> {
        self.parameters
            .get(index)
            .ok_or_else(|| Error::UnknownParameterIndex {
                executable: self.signature.to_string(),
                index,
                count: self.parameters.len(),
            })
    }

    /// Merged return value configuration.
    #[must_use]
    pub fn return_value(&self) -> &ElementMetadata {
        &self.return_value
    }

    /// Constraints evaluated against the return value.
    #[must_use]
    pub fn return_value_constraints(&self) -> &[Arc<MetaConstraint>] {
        &self.return_constraints
    }

    /// Constraints evaluated against the whole parameter list.
    #[must_use]
    pub fn cross_parameter_constraints(&self) -> &[Arc<MetaConstraint>] {
        &self.cross_parameter
    }

    /// Every type in the hierarchy declaring this executable.
    #[must_use]
    pub fn declaring_types(&self) -> &[TypeName] {
        &self.declaring_types
    }

    /// Returns `true` if parameters or the parameter list carry constraints or cascades.
    #[must_use]
    pub fn has_parameter_constraints(&self) -> bool {
        !self.cross_parameter.is_empty()
            || self.parameters.iter().any(|p| p.element.is_constrained())
    }

    /// Returns `true` if the return value carries constraints or cascades.
    #[must_use]
    pub fn has_return_value_constraints(&self) -> bool {
        self.return_value.is_constrained()
    }

    /// Returns `true` if the executable is constrained at all.
    #[must_use]
    pub fn is_constrained(&self) -> bool {
        self.has_parameter_constraints() || self.has_return_value_constraints()
    }

    /// Returns `true` if executables of this kind are validated under `types`.
    #[must_use]
    pub fn is_validatable(&self, types: ExecutableTypes) -> bool {
        types.covers(self.kind)
    }
}
