//! Integration tests for parameter, cross-parameter and return value validation of methods and
//! constructors, and for the legality rules of overridden methods.

use std::sync::Arc;

use beanval::prelude::*;

fn not_null() -> ConstraintDeclaration {
    ConstraintDeclaration::new("NotNull")
}

fn min(value: i64) -> ConstraintDeclaration {
    ConstraintDeclaration::new("Min").attribute("value", value)
}

fn no_parameters() -> Vec<TypeName> {
    Vec::new()
}

fn paths(violations: &[ConstraintViolation]) -> Vec<String> {
    let mut paths: Vec<String> = violations
        .iter()
        .map(|v| v.property_path().to_string())
        .collect();
    paths.sort();
    paths
}

fn booking_types() -> Result<Arc<TypeRegistry>> {
    let types = Arc::new(TypeRegistry::new());
    types.define(
        TypeBuilder::class("Address").field("city", ElementMetadata::new().constraint(not_null())),
    )?;
    types.define(
        TypeBuilder::class("Customer")
            .field("name", ElementMetadata::new().constraint(not_null()))
            .constructor(
                ExecutableBuilder::constructor()
                    .parameter("name", "String", ElementMetadata::new().constraint(not_null()))
                    .return_value(ElementMetadata::new().cascade()),
            ),
    )?;
    types.define(
        TypeBuilder::class("BookingService")
            .method(
                ExecutableBuilder::method("place")
                    .parameter("quantity", "int", ElementMetadata::new().constraint(min(1)))
                    .parameter("note", "String", ElementMetadata::new().constraint(not_null())),
            )
            .method(
                ExecutableBuilder::method("book")
                    .parameter("start", "Integer", ElementMetadata::new().constraint(not_null()))
                    .parameter("end", "Integer", ElementMetadata::new().constraint(not_null()))
                    .cross_parameter(ConstraintDeclaration::new("ValidRange")),
            )
            .method(
                ExecutableBuilder::method("ship")
                    .parameter("address", "Address", ElementMetadata::new().cascade()),
            )
            .method(
                ExecutableBuilder::method("find")
                    .returns("Customer", ElementMetadata::new().constraint(not_null()).cascade()),
            )
            .getter("owner", "String", ElementMetadata::new().constraint(not_null())),
    )?;
    Ok(types)
}

fn factory(config: ValidatorConfig) -> Result<ValidatorFactory> {
    Ok(ValidatorFactory::builder()
        .types(booking_types()?)
        .config(config)
        .evaluator_fn("ValidRange", Some(ValueKind::List), |_, value, _| {
            let Value::List(values) = value else {
                return Err("cross-parameter value must be a list".into());
            };
            Ok(match (values[0].as_f64(), values[1].as_f64()) {
                (Some(start), Some(end)) => start < end,
                _ => true,
            })
        })
        .build())
}

/// Every parameter constraint is checked and reported under the parameter name.
#[test]
fn test_parameters() -> Result<()> {
    let validator = factory(ValidatorConfig::default())?.validator()?;
    let service = DynamicBean::new("BookingService").handle();
    let place = ExecutableSignature::new("place", ["int", "String"]);

    let violations =
        validator.validate_parameters(&service, &place, &[Value::Int(0), Value::Null], &[])?;
    assert_eq!(paths(&violations), ["place.note", "place.quantity"]);
    for violation in &violations {
        assert_eq!(
            violation.executable_parameters(),
            Some(&[Value::Int(0), Value::Null][..])
        );
        assert!(violation.executable_return_value().is_none());
    }

    assert!(validator
        .validate_parameters(&service, &place, &[Value::Int(2), Value::from("x")], &[])?
        .is_empty());

    assert!(matches!(
        validator.validate_parameters(&service, &place, &[Value::Int(2)], &[]),
        Err(Error::ParameterCountMismatch { expected: 2, actual: 1, .. })
    ));
    Ok(())
}

/// Cross-parameter constraints run once the single parameters are valid.
#[test]
fn test_cross_parameter() -> Result<()> {
    let validator = factory(ValidatorConfig::default())?.validator()?;
    let service = DynamicBean::new("BookingService").handle();
    let book = ExecutableSignature::new("book", ["Integer", "Integer"]);

    let violations =
        validator.validate_parameters(&service, &book, &[Value::Null, Value::Int(3)], &[])?;
    assert_eq!(paths(&violations), ["book.start"]);

    let violations =
        validator.validate_parameters(&service, &book, &[Value::Int(5), Value::Int(3)], &[])?;
    assert_eq!(paths(&violations), ["book.<cross-parameter>"]);
    assert_eq!(violations[0].message(), "must satisfy ValidRange");

    assert!(validator
        .validate_parameters(&service, &book, &[Value::Int(1), Value::Int(3)], &[])?
        .is_empty());
    Ok(())
}

/// Cascaded parameters and return values are validated as object graphs.
#[test]
fn test_cascaded_parameters_and_return_values() -> Result<()> {
    let validator = factory(ValidatorConfig::default())?.validator()?;
    let service = DynamicBean::new("BookingService").handle();

    let ship = ExecutableSignature::new("ship", ["Address"]);
    let address = Value::from(DynamicBean::new("Address"));
    let violations = validator.validate_parameters(&service, &ship, &[address], &[])?;
    assert_eq!(paths(&violations), ["ship.address.city"]);

    let find = ExecutableSignature::new("find", no_parameters());
    let violations = validator.validate_return_value(&service, &find, &Value::Null, &[])?;
    assert_eq!(paths(&violations), ["find.<return value>"]);
    assert_eq!(violations[0].executable_return_value(), Some(&Value::Null));

    let customer = Value::from(DynamicBean::new("Customer"));
    let violations = validator.validate_return_value(&service, &find, &customer, &[])?;
    assert_eq!(paths(&violations), ["find.<return value>.name"]);
    Ok(())
}

/// Constructor parameters have no instance; the created instance is the root of return value
/// validation.
#[test]
fn test_constructors() -> Result<()> {
    let validator = factory(ValidatorConfig::default())?.validator()?;
    let customer = TypeName::new("Customer");
    let constructor = ExecutableSignature::new("Customer", ["String"]);

    let violations =
        validator.validate_constructor_parameters(&customer, &constructor, &[Value::Null], &[])?;
    assert_eq!(paths(&violations), ["Customer.name"]);
    assert!(violations[0].root_bean().is_none());
    assert_eq!(violations[0].root_bean_type(), &customer);

    let created = DynamicBean::new("Customer").handle();
    let violations =
        validator.validate_constructor_return_value(&customer, &constructor, &created, &[])?;
    assert_eq!(paths(&violations), ["Customer.<return value>.name"]);
    assert!(violations[0].root_bean().is_some());
    Ok(())
}

/// Getters are only validated when the configuration includes them; unknown executables yield
/// nothing.
#[test]
fn test_executable_types() -> Result<()> {
    let service = DynamicBean::new("BookingService").handle();
    let owner = ExecutableSignature::new("getOwner", no_parameters());

    let implicit = factory(ValidatorConfig::default())?.validator()?;
    assert!(implicit
        .validate_return_value(&service, &owner, &Value::Null, &[])?
        .is_empty());

    let strict = factory(ValidatorConfig::strict())?.validator()?;
    let violations = strict.validate_return_value(&service, &owner, &Value::Null, &[])?;
    assert_eq!(paths(&violations), ["getOwner.<return value>"]);

    let unknown = ExecutableSignature::new("cancel", ["String"]);
    assert!(strict
        .validate_parameters(&service, &unknown, &[Value::Null], &[])?
        .is_empty());
    Ok(())
}

/// Overriding methods may not add parameter constraints but may add return value constraints.
#[test]
fn test_overriding_rules() -> Result<()> {
    let types = Arc::new(TypeRegistry::new());
    types.define(
        TypeBuilder::class("Account")
            .method(ExecutableBuilder::method("charge").parameter(
                "amount",
                "int",
                ElementMetadata::new(),
            ))
            .method(
                ExecutableBuilder::method("label")
                    .returns("String", ElementMetadata::new().constraint(not_null())),
            ),
    )?;
    types.define(
        TypeBuilder::class("SavingsAccount").extends("Account").method(
            ExecutableBuilder::method("charge").parameter(
                "amount",
                "int",
                ElementMetadata::new().constraint(min(1)),
            ),
        ),
    )?;
    types.define(
        TypeBuilder::class("CheckingAccount").extends("Account").method(
            ExecutableBuilder::method("label").returns(
                "String",
                ElementMetadata::new().constraint(
                    ConstraintDeclaration::new("Size").attribute("min", 1).attribute("max", 3),
                ),
            ),
        ),
    )?;
    let validator = ValidatorFactory::new(types, ValidatorConfig::default()).validator()?;

    let savings = DynamicBean::new("SavingsAccount").handle();
    let charge = ExecutableSignature::new("charge", ["int"]);
    let error = validator
        .validate_parameters(&savings, &charge, &[Value::Int(0)], &[])
        .unwrap_err();
    assert!(matches!(error, Error::IllegalParameterConstraintOverride { .. }));
    assert!(error.is_configuration());

    let checking = DynamicBean::new("CheckingAccount").handle();
    let label = ExecutableSignature::new("label", no_parameters());
    assert_eq!(
        validator
            .validate_return_value(&checking, &label, &Value::Null, &[])?
            .len(),
        1
    );
    let violations = validator.validate_return_value(&checking, &label, &Value::from("long"), &[])?;
    assert_eq!(violations[0].message(), "size must be between 1 and 3");
    Ok(())
}

/// Override checks follow chains through superclasses and interfaces declaring the same method.
#[test]
fn test_deep_override_chain() -> Result<()> {
    let types = Arc::new(TypeRegistry::new());
    let store = |element: ElementMetadata| {
        ExecutableBuilder::method("store").parameter("key", "String", element)
    };
    types.define(TypeBuilder::class("A").method(store(ElementMetadata::new().constraint(not_null()))))?;
    types.define(TypeBuilder::class("B").extends("A"))?;
    types.define(
        TypeBuilder::interface("D").method(store(ElementMetadata::new().constraint(not_null()))),
    )?;
    types.define(
        TypeBuilder::class("C")
            .extends("B")
            .implements("D")
            .method(store(ElementMetadata::new())),
    )?;
    types.define(
        TypeBuilder::class("E")
            .extends("B")
            .implements("D")
            .method(store(ElementMetadata::new().constraint(min(1)))),
    )?;
    let validator = ValidatorFactory::new(types, ValidatorConfig::default()).validator()?;
    let signature = ExecutableSignature::new("store", ["String"]);

    // the constraint declared by A and D applies to C and is reported once
    let c = DynamicBean::new("C").handle();
    let violations = validator.validate_parameters(&c, &signature, &[Value::Null], &[])?;
    assert_eq!(paths(&violations), ["store.key"]);

    let e = DynamicBean::new("E").handle();
    assert!(matches!(
        validator.validate_parameters(&e, &signature, &[Value::Null], &[]),
        Err(Error::IllegalParameterConstraintOverride { ref overriding, .. })
            if overriding.as_str() == "E"
    ));
    Ok(())
}

/// A class implementing unrelated interfaces that declare the same constraints is legal.
#[test]
fn test_parallel_interfaces() -> Result<()> {
    let types = Arc::new(TypeRegistry::new());
    for interface in ["Reader", "Loader"] {
        types.define(TypeBuilder::interface(interface).method(
            ExecutableBuilder::method("load")
                .parameter("id", "int", ElementMetadata::new().constraint(min(1))),
        ))?;
    }
    types.define(
        TypeBuilder::class("Repository")
            .implements("Reader")
            .implements("Loader")
            .method(ExecutableBuilder::method("load").parameter("id", "int", ElementMetadata::new())),
    )?;
    let validator = ValidatorFactory::new(types, ValidatorConfig::default()).validator()?;

    let repository = DynamicBean::new("Repository").handle();
    let load = ExecutableSignature::new("load", ["int"]);
    let violations = validator.validate_parameters(&repository, &load, &[Value::Int(0)], &[])?;
    assert_eq!(paths(&violations), ["load.id"]);
    Ok(())
}
