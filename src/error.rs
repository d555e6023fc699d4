use thiserror::Error;

use crate::metadata::typesystem::TypeName;

macro_rules! definition_error {
    // Single string version
    ($msg:expr) => {
        crate::Error::Definition {
            message: $msg.to_string(),
            file: file!(),
            line: line!(),
        }
    };

    // Format string with arguments version
    ($fmt:expr, $($arg:tt)*) => {
        crate::Error::Definition {
            message: format!($fmt, $($arg)*),
            file: file!(),
            line: line!(),
        }
    };
}

/// Boxed error type returned by user supplied constraint evaluators.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// The generic Error type, which provides coverage for all errors this library can potentially
/// return.
///
/// Errors fall into three families. Configuration errors are raised while metadata or a
/// validation order is built and indicate a declaration mistake; they are never retried.
/// Lookup errors report requests against members that have to exist. Evaluation errors wrap a
/// failure raised by a constraint evaluator and abort the validation call that triggered it.
///
/// # Error Categories
///
/// ## Type Model Errors
/// - [`Error::Definition`] - Inconsistent descriptor handed to a builder
/// - [`Error::TypeNotFound`] - A referenced type is not registered
/// - [`Error::CyclicTypeHierarchy`] - A type reaches itself through its supertypes
///
/// ## Group and Sequence Errors
/// - [`Error::EmptyGroups`] - No group was requested
/// - [`Error::NotAGroup`] - A requested group is not an interface
/// - [`Error::CyclicSequence`] - A group sequence contains itself
/// - [`Error::UnexpandableGroupSequence`] - A group appears twice at incompatible positions
/// - [`Error::UnexpandableDefaultGroupSequence`] - A redefined default sequence cannot be inlined
/// - [`Error::DefaultGroupInSequence`], [`Error::BeanTypeMissingFromSequence`],
///   [`Error::EmptyGroupSequence`], [`Error::SequenceAndProvider`],
///   [`Error::ProviderTypeMismatch`] - Malformed default group sequence definitions
///
/// ## Method Configuration Errors
/// - [`Error::IllegalParameterConstraintOverride`]
/// - [`Error::ParallelParameterConstraints`]
/// - [`Error::VoidMethodConstrained`]
/// - [`Error::MultipleCascadedReturnValues`]
/// - [`Error::ParallelGroupConversion`]
/// - [`Error::InvalidGroupConversion`]
///
/// ## Lookup Errors
/// - [`Error::UnknownProperty`], [`Error::UnknownParameterIndex`],
///   [`Error::ParameterCountMismatch`], [`Error::InvalidPropertyPath`]
///
/// ## Evaluation Errors
/// - [`Error::NoEvaluator`] - No evaluator is registered for a constraint kind
/// - [`Error::ConstraintEvaluation`] - An evaluator failed
///
/// # Examples
///
/// ```rust
/// use beanval::Error;
///
/// fn report(error: &Error) {
///     if error.is_configuration() {
///         eprintln!("[{}] fix the declarations: {}", error.code(), error);
///     } else {
///         eprintln!("[{}] {}", error.code(), error);
///     }
/// }
/// # report(&Error::EmptyGroups);
/// ```
#[derive(Error, Debug)]
pub enum Error {
    /// A descriptor handed to a builder is internally inconsistent.
    ///
    /// # Fields
    ///
    /// * `message` - Description of the inconsistency
    /// * `file` - Source file where the error was detected
    /// * `line` - Source line where the error was detected
    #[error("Invalid definition - {file}:{line}: {message}")]
    Definition {
        /// The message to be printed for the Definition error
        message: String,
        /// The source file in which this error occured
        file: &'static str,
        /// The source line in which this error occured
        line: u32,
    },

    /// A type referenced by a hierarchy, a group list or a sequence is not registered.
    #[error("Type '{0}' is not registered")]
    TypeNotFound(TypeName),

    /// A type reaches itself through its superclass or interface chain.
    #[error("Type '{type_name}' inherits from itself")]
    CyclicTypeHierarchy {
        /// The type on which the cycle was detected
        type_name: TypeName,
    },

    // Group and sequence errors
    /// At least one group has to be specified when building a validation order.
    #[error("At least one group has to be specified")]
    EmptyGroups,

    /// A requested group is a class rather than an interface.
    #[error("A group has to be an interface, but '{group}' is a class")]
    NotAGroup {
        /// The offending type
        group: TypeName,
    },

    /// A group sequence transitively contains itself.
    #[error("Cyclic dependency in groups definition: sequence '{sequence}' contains itself")]
    CyclicSequence {
        /// The sequence that was reached twice on the current resolution path
        sequence: TypeName,
    },

    /// A group appears in a sequence both on its own and inside an inlined sequence at a
    /// position that cannot be reconciled.
    #[error("Unable to expand group sequence '{sequence}': group '{group}' is used at incompatible positions")]
    UnexpandableGroupSequence {
        /// The sequence being expanded
        sequence: TypeName,
        /// The group that appears twice
        group: TypeName,
    },

    /// A requested sequence contains `Default` but the redefined default group sequence of the
    /// validated bean cannot be inlined at that position.
    #[error("Unable to expand default group list {default_sequence:?} into sequence {sequence:?}")]
    UnexpandableDefaultGroupSequence {
        /// The redefined default group sequence of the bean
        default_sequence: Vec<TypeName>,
        /// The groups of the requested sequence
        sequence: Vec<TypeName>,
    },

    /// A redefined default group sequence lists `Default` explicitly.
    #[error("'Default' is not allowed in the redefined default group sequence of '{bean}'")]
    DefaultGroupInSequence {
        /// The bean type declaring the sequence
        bean: TypeName,
    },

    /// A redefined default group sequence does not contain the bean type itself.
    #[error("'{bean}' must be part of the redefined default group sequence")]
    BeanTypeMissingFromSequence {
        /// The bean type declaring the sequence
        bean: TypeName,
    },

    /// A redefined default group sequence, or a provider result, is empty.
    #[error("The redefined default group sequence of '{bean}' is empty")]
    EmptyGroupSequence {
        /// The bean type declaring the sequence
        bean: TypeName,
    },

    /// A type declares both a static group sequence and a default group sequence provider.
    #[error("'{bean}' declares both a group sequence and a default group sequence provider")]
    SequenceAndProvider {
        /// The offending bean type
        bean: TypeName,
    },

    /// The default group sequence provider of a type is bound to an unrelated type.
    #[error("The default group sequence provider defined for '{bean}' has the wrong type: it is bound to '{provider_type}'")]
    ProviderTypeMismatch {
        /// The bean type declaring the provider
        bean: TypeName,
        /// The type the provider is bound to
        provider_type: TypeName,
    },

    // Method configuration errors
    /// An overriding method declares parameter constraints the overridden method does not have.
    #[error("Method '{method}' of '{overriding}' alters the parameter constraints of the overridden method declared by '{overridden}'")]
    IllegalParameterConstraintOverride {
        /// The signature of the method
        method: String,
        /// The type declaring the overriding method
        overriding: TypeName,
        /// The type declaring the overridden method
        overridden: TypeName,
    },

    /// Two parallel types declare differing parameter constraints for the same method.
    #[error("Method '{method}' is declared with differing parameter constraints by parallel types '{first}' and '{second}'")]
    ParallelParameterConstraints {
        /// The signature of the method
        method: String,
        /// The first declaring type
        first: TypeName,
        /// The second declaring type
        second: TypeName,
    },

    /// A void method carries return value constraints or is marked for cascaded validation.
    #[error("Void method '{method}' declared by '{declaring}' must not have return value constraints")]
    VoidMethodConstrained {
        /// The signature of the method
        method: String,
        /// The declaring type
        declaring: TypeName,
    },

    /// A return value is marked for cascaded validation more than once in one hierarchy line.
    #[error("The return value of '{method}' is marked for cascaded validation by both '{first}' and '{second}'")]
    MultipleCascadedReturnValues {
        /// The signature of the method
        method: String,
        /// The first declaring type
        first: TypeName,
        /// The second declaring type
        second: TypeName,
    },

    /// Parallel types define group conversions for a cascaded return value.
    #[error("Parallel types '{first}' and '{second}' must not define group conversions for the cascaded return value of '{method}'")]
    ParallelGroupConversion {
        /// The signature of the method
        method: String,
        /// The first declaring type
        first: TypeName,
        /// The second declaring type
        second: TypeName,
    },

    /// A group conversion is malformed.
    #[error("Invalid group conversion on '{element}': {message}")]
    InvalidGroupConversion {
        /// The element declaring the conversion
        element: String,
        /// Why the conversion is rejected
        message: String,
    },

    // Lookup errors
    /// A property requested by name does not exist on the bean type.
    #[error("Property '{property}' does not exist on '{bean}'")]
    UnknownProperty {
        /// The bean type
        bean: TypeName,
        /// The requested property
        property: String,
    },

    /// A parameter index beyond the executable's parameter list was requested.
    #[error("Executable '{executable}' has {count} parameters, index {index} does not exist")]
    UnknownParameterIndex {
        /// The executable signature
        executable: String,
        /// The requested index
        index: usize,
        /// The parameter count
        count: usize,
    },

    /// The number of passed parameter values does not match the executable.
    #[error("Executable '{executable}' expects {expected} parameters, got {actual}")]
    ParameterCountMismatch {
        /// The executable signature
        executable: String,
        /// The declared parameter count
        expected: usize,
        /// The number of values passed
        actual: usize,
    },

    /// A property path string could not be parsed or navigated.
    #[error("Invalid property path '{path}': {message}")]
    InvalidPropertyPath {
        /// The path as passed by the caller
        path: String,
        /// What went wrong
        message: String,
    },

    /// Validators can no longer be obtained from a closed factory.
    #[error("The validator factory has been closed")]
    FactoryClosed,

    // Evaluation errors
    /// No evaluator is registered for a constraint kind that has no composing constraints.
    #[error("No evaluator registered for constraint '{kind}' and value kind '{value_kind}'")]
    NoEvaluator {
        /// The constraint kind
        kind: String,
        /// The kind of the value that was to be validated
        value_kind: String,
    },

    /// A constraint evaluator failed while validating a value.
    #[error("Evaluation of constraint '{constraint}' at '{path}' failed for value {value}: {source}")]
    ConstraintEvaluation {
        /// The constraint kind
        constraint: String,
        /// The property path of the validated value
        path: String,
        /// Rendering of the validated value
        value: String,
        /// The error raised by the evaluator
        source: BoxError,
    },

    /// Failed to lock target
    #[error("Failed to lock target")]
    LockError,
}

impl Error {
    /// Returns the stable diagnostic code of this error.
    ///
    /// Codes never change between releases and can be used to look up documentation or to
    /// match errors in logs.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Error::Definition { .. } => "BV001",
            Error::TypeNotFound(_) => "BV002",
            Error::CyclicTypeHierarchy { .. } => "BV003",
            Error::EmptyGroups => "BV010",
            Error::NotAGroup { .. } => "BV011",
            Error::CyclicSequence { .. } => "BV012",
            Error::UnexpandableGroupSequence { .. } => "BV013",
            Error::UnexpandableDefaultGroupSequence { .. } => "BV014",
            Error::DefaultGroupInSequence { .. } => "BV015",
            Error::BeanTypeMissingFromSequence { .. } => "BV016",
            Error::EmptyGroupSequence { .. } => "BV017",
            Error::SequenceAndProvider { .. } => "BV018",
            Error::ProviderTypeMismatch { .. } => "BV019",
            Error::IllegalParameterConstraintOverride { .. } => "BV020",
            Error::ParallelParameterConstraints { .. } => "BV021",
            Error::VoidMethodConstrained { .. } => "BV022",
            Error::MultipleCascadedReturnValues { .. } => "BV023",
            Error::ParallelGroupConversion { .. } => "BV024",
            Error::InvalidGroupConversion { .. } => "BV025",
            Error::UnknownProperty { .. } => "BV040",
            Error::UnknownParameterIndex { .. } => "BV041",
            Error::ParameterCountMismatch { .. } => "BV042",
            Error::InvalidPropertyPath { .. } => "BV043",
            Error::FactoryClosed => "BV050",
            Error::NoEvaluator { .. } => "BV060",
            Error::ConstraintEvaluation { .. } => "BV061",
            Error::LockError => "BV062",
        }
    }

    /// Returns `true` for errors caused by a declaration mistake.
    ///
    /// These are detected while building metadata or a validation order and are never raised
    /// because of the validated data itself.
    #[must_use]
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Error::Definition { .. }
                | Error::TypeNotFound(_)
                | Error::CyclicTypeHierarchy { .. }
                | Error::EmptyGroups
                | Error::NotAGroup { .. }
                | Error::CyclicSequence { .. }
                | Error::UnexpandableGroupSequence { .. }
                | Error::UnexpandableDefaultGroupSequence { .. }
                | Error::DefaultGroupInSequence { .. }
                | Error::BeanTypeMissingFromSequence { .. }
                | Error::EmptyGroupSequence { .. }
                | Error::SequenceAndProvider { .. }
                | Error::ProviderTypeMismatch { .. }
                | Error::IllegalParameterConstraintOverride { .. }
                | Error::ParallelParameterConstraints { .. }
                | Error::VoidMethodConstrained { .. }
                | Error::MultipleCascadedReturnValues { .. }
                | Error::ParallelGroupConversion { .. }
                | Error::InvalidGroupConversion { .. }
                | Error::NoEvaluator { .. }
        )
    }
}
