use std::sync::Arc;

use crate::{
    groups::DefaultGroupSequenceProvider,
    metadata::{
        constraint::{ConstraintDeclaration, ConstraintTarget},
        element::ElementMetadata,
        typesystem::{
            ExecutableDescriptor, ExecutableKind, FieldDescriptor, ParameterDescriptor,
            TypeDescriptor, TypeKind, TypeName,
        },
    },
    Result,
};

/// Fluent builder for [`TypeDescriptor`]s.
///
/// # Examples
///
/// ```rust
/// use beanval::metadata::{
///     constraint::ConstraintDeclaration,
///     element::ElementMetadata,
///     typesystem::{ExecutableBuilder, TypeBuilder},
/// };
///
/// let car = TypeBuilder::class("Car")
///     .field("plate", ElementMetadata::new().constraint(ConstraintDeclaration::new("NotNull")))
///     .method(
///         ExecutableBuilder::method("drive")
///             .parameter("speed", "int", ElementMetadata::new().constraint(
///                 ConstraintDeclaration::new("Max").attribute("value", 120),
///             )),
///     )
///     .build()?;
///
/// assert_eq!(car.fields.len(), 1);
/// assert_eq!(car.methods[0].signature().to_string(), "drive(int)");
/// # Ok::<(), beanval::Error>(())
/// ```
pub struct TypeBuilder {
    name: TypeName,
    kind: TypeKind,
    superclass: Option<TypeName>,
    interfaces: Vec<TypeName>,
    fields: Vec<(String, ElementMetadata)>,
    methods: Vec<ExecutableBuilder>,
    constructors: Vec<ExecutableBuilder>,
    constraints: Vec<ConstraintDeclaration>,
    group_sequence: Option<Vec<TypeName>>,
    sequence_provider: Option<Arc<dyn DefaultGroupSequenceProvider>>,
}

impl TypeBuilder {
    fn new(name: impl Into<TypeName>, kind: TypeKind) -> Self {
        TypeBuilder {
            name: name.into(),
            kind,
            superclass: None,
            interfaces: Vec::new(),
            fields: Vec::new(),
            methods: Vec::new(),
            constructors: Vec::new(),
            constraints: Vec::new(),
            group_sequence: None,
            sequence_provider: None,
        }
    }

    /// Starts describing a class.
    pub fn class(name: impl Into<TypeName>) -> Self {
        Self::new(name, TypeKind::Class)
    }

    /// Starts describing an interface.
    pub fn interface(name: impl Into<TypeName>) -> Self {
        Self::new(name, TypeKind::Interface)
    }

    /// Describes a marker interface used as a validation group.
    pub fn group(name: impl Into<TypeName>) -> Self {
        Self::interface(name)
    }

    /// Describes an interface standing for the group sequence `members`.
    pub fn sequence<T: Into<TypeName>>(
        name: impl Into<TypeName>,
        members: impl IntoIterator<Item = T>,
    ) -> Self {
        Self::interface(name).group_sequence(members)
    }

    /// Sets the superclass.
    #[must_use]
    pub fn extends(mut self, superclass: impl Into<TypeName>) -> Self {
        self.superclass = Some(superclass.into());
        self
    }

    /// Adds an implemented interface, or for interfaces an extended one.
    #[must_use]
    pub fn implements(mut self, interface: impl Into<TypeName>) -> Self {
        self.interfaces.push(interface.into());
        self
    }

    /// Adds a field.
    #[must_use]
    pub fn field(mut self, name: impl Into<String>, element: ElementMetadata) -> Self {
        self.fields.push((name.into(), element));
        self
    }

    /// Adds a getter for `property` returning `type_name`, following the `getX` convention.
    #[must_use]
    pub fn getter(
        self,
        property: &str,
        type_name: impl Into<TypeName>,
        element: ElementMetadata,
    ) -> Self {
        let mut chars = property.chars();
        let name = match chars.next() {
            Some(first) => format!("get{}{}", first.to_uppercase(), chars.as_str()),
            None => "get".to_string(),
        };
        self.method(ExecutableBuilder::method(name).returns(type_name, element))
    }

    /// Adds a method.
    #[must_use]
    pub fn method(mut self, method: ExecutableBuilder) -> Self {
        self.methods.push(method);
        self
    }

    /// Adds a constructor.
    #[must_use]
    pub fn constructor(mut self, constructor: ExecutableBuilder) -> Self {
        self.constructors.push(constructor);
        self
    }

    /// Adds a class level constraint.
    #[must_use]
    pub fn constraint(mut self, constraint: ConstraintDeclaration) -> Self {
        self.constraints.push(constraint);
        self
    }

    /// Redefines the default group sequence (classes) or defines the sequence this interface
    /// stands for.
    #[must_use]
    pub fn group_sequence<T: Into<TypeName>>(
        mut self,
        members: impl IntoIterator<Item = T>,
    ) -> Self {
        self.group_sequence = Some(members.into_iter().map(Into::into).collect());
        self
    }

    /// Computes the default group sequence per validated instance.
    #[must_use]
    pub fn sequence_provider(mut self, provider: Arc<dyn DefaultGroupSequenceProvider>) -> Self {
        self.sequence_provider = Some(provider);
        self
    }

    /// Builds the descriptor.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Definition`] if an interface declares a superclass, constructors
    /// or fields, or if a field name is declared twice.
    pub fn build(self) -> Result<TypeDescriptor> {
        let name = self.name;

        if self.kind == TypeKind::Interface {
            if let Some(superclass) = &self.superclass {
                return Err(definition_error!(
                    "interface '{}' cannot extend class '{}'",
                    name,
                    superclass
                ));
            }
            if !self.constructors.is_empty() {
                return Err(definition_error!(
                    "interface '{}' cannot declare constructors",
                    name
                ));
            }
            if !self.fields.is_empty() {
                return Err(definition_error!("interface '{}' cannot declare fields", name));
            }
        }

        let mut fields: Vec<FieldDescriptor> = Vec::with_capacity(self.fields.len());
        for (field_name, element) in self.fields {
            if fields.iter().any(|f| f.name == field_name) {
                return Err(definition_error!(
                    "field '{}' is declared twice on '{}'",
                    field_name,
                    name
                ));
            }
            fields.push(FieldDescriptor {
                element: element.located(&name, &ConstraintTarget::Field(field_name.clone())),
                name: field_name,
            });
        }

        let methods = self
            .methods
            .into_iter()
            .map(|m| m.build_for(&name))
            .collect::<Result<Vec<_>>>()?;
        let constructors = self
            .constructors
            .into_iter()
            .map(|c| c.build_for(&name))
            .collect::<Result<Vec<_>>>()?;
        let constraints = self
            .constraints
            .into_iter()
            .map(|c| c.located(&name, ConstraintTarget::Type))
            .collect();

        Ok(TypeDescriptor {
            name,
            kind: self.kind,
            superclass: self.superclass,
            interfaces: self.interfaces,
            fields,
            methods,
            constructors,
            constraints,
            group_sequence: self.group_sequence,
            sequence_provider: self.sequence_provider,
        })
    }
}

/// Fluent builder for [`ExecutableDescriptor`]s, finished by [`TypeBuilder::method`] or
/// [`TypeBuilder::constructor`].
pub struct ExecutableBuilder {
    constructor: bool,
    name: String,
    parameters: Vec<(String, TypeName, ElementMetadata)>,
    return_type: Option<TypeName>,
    return_value: ElementMetadata,
    cross_parameter: Vec<ConstraintDeclaration>,
    private: bool,
    is_static: bool,
}

impl ExecutableBuilder {
    /// Starts describing a method. Methods are void until [`ExecutableBuilder::returns`] is
    /// called.
    pub fn method(name: impl Into<String>) -> Self {
        ExecutableBuilder {
            constructor: false,
            name: name.into(),
            parameters: Vec::new(),
            return_type: None,
            return_value: ElementMetadata::new(),
            cross_parameter: Vec::new(),
            private: false,
            is_static: false,
        }
    }

    /// Starts describing a constructor.
    #[must_use]
    pub fn constructor() -> Self {
        ExecutableBuilder {
            constructor: true,
            ..Self::method(String::new())
        }
    }

    /// Appends a parameter.
    #[must_use]
    pub fn parameter(
        mut self,
        name: impl Into<String>,
        type_name: impl Into<TypeName>,
        element: ElementMetadata,
    ) -> Self {
        self.parameters.push((name.into(), type_name.into(), element));
        self
    }

    /// Sets the return type and the return value configuration of a method.
    #[must_use]
    pub fn returns(mut self, type_name: impl Into<TypeName>, element: ElementMetadata) -> Self {
        self.return_type = Some(type_name.into());
        self.return_value = element;
        self
    }

    /// Sets the return value configuration without changing the return type.
    ///
    /// For constructors this configures the validation of the created instance; for methods it
    /// allows describing (illegally) constrained void methods.
    #[must_use]
    pub fn return_value(mut self, element: ElementMetadata) -> Self {
        self.return_value = element;
        self
    }

    /// Adds a cross-parameter constraint.
    #[must_use]
    pub fn cross_parameter(mut self, constraint: ConstraintDeclaration) -> Self {
        self.cross_parameter.push(constraint);
        self
    }

    /// Marks the executable as private.
    #[must_use]
    pub fn private(mut self) -> Self {
        self.private = true;
        self
    }

    /// Marks the method as static.
    #[must_use]
    pub fn static_method(mut self) -> Self {
        self.is_static = true;
        self
    }

    pub(crate) fn build_for(self, declaring_type: &TypeName) -> Result<ExecutableDescriptor> {
        if self.constructor && self.is_static {
            return Err(definition_error!(
                "constructor of '{}' cannot be static",
                declaring_type
            ));
        }
        if !self.constructor && self.name.is_empty() {
            return Err(definition_error!(
                "method of '{}' declared without a name",
                declaring_type
            ));
        }

        let kind = if self.constructor {
            ExecutableKind::Constructor
        } else if is_getter(
            &self.name,
            self.parameters.len(),
            self.return_type.as_ref(),
            self.is_static,
        ) {
            ExecutableKind::Getter
        } else {
            ExecutableKind::Method
        };
        let (name, return_type) = if self.constructor {
            (
                declaring_type.simple_name().to_string(),
                Some(declaring_type.clone()),
            )
        } else {
            (self.name, self.return_type)
        };

        let parameters = self
            .parameters
            .into_iter()
            .enumerate()
            .map(|(index, (param_name, type_name, element))| {
                let target = if kind == ExecutableKind::Constructor {
                    ConstraintTarget::ConstructorParameter(index)
                } else {
                    ConstraintTarget::Parameter(index)
                };
                ParameterDescriptor {
                    name: if param_name.is_empty() {
                        format!("arg{index}")
                    } else {
                        param_name
                    },
                    type_name,
                    element: element.located(declaring_type, &target),
                }
            })
            .collect();

        let return_target = if kind == ExecutableKind::Constructor {
            ConstraintTarget::ConstructorReturnValue
        } else if kind == ExecutableKind::Getter {
            ConstraintTarget::Getter(name.clone())
        } else {
            ConstraintTarget::ReturnValue
        };

        Ok(ExecutableDescriptor {
            kind,
            return_value: self.return_value.located(declaring_type, &return_target),
            cross_parameter: self
                .cross_parameter
                .into_iter()
                .map(|c| c.located(declaring_type, ConstraintTarget::CrossParameter))
                .collect(),
            name,
            declaring_type: declaring_type.clone(),
            parameters,
            return_type,
            private: self.private,
            is_static: self.is_static,
        })
    }
}

fn is_getter(
    name: &str,
    parameter_count: usize,
    return_type: Option<&TypeName>,
    is_static: bool,
) -> bool {
    if parameter_count != 0 || is_static {
        return false;
    }
    let Some(return_type) = return_type else {
        return false;
    };

    // plain prefix match: `getter` exposes the property `ter`
    if let Some(stem) = name.strip_prefix("is") {
        if !stem.is_empty() && matches!(return_type.as_str(), "bool" | "boolean") {
            return true;
        }
    }
    name.strip_prefix("get").is_some_and(|stem| !stem.is_empty())
}
