//! Integration tests for sharing factories and validators across threads.

use std::{sync::Arc, thread};

use beanval::prelude::*;
use rayon::prelude::*;

fn catalog() -> Result<Arc<TypeRegistry>> {
    let types = Arc::new(TypeRegistry::new());
    types.define(TypeBuilder::group("Strict"))?;
    types.define(
        TypeBuilder::class("Item")
            .field("sku", ElementMetadata::new().constraint(ConstraintDeclaration::new("NotBlank")))
            .field(
                "price",
                ElementMetadata::new()
                    .constraint(ConstraintDeclaration::new("Positive"))
                    .constraint(
                        ConstraintDeclaration::new("Max")
                            .attribute("value", 1000)
                            .groups(["Strict"]),
                    ),
            ),
    )?;
    for index in 0..32 {
        types.define(
            TypeBuilder::class(format!("Item{index}"))
                .extends("Item")
                .field("items", ElementMetadata::new().cascade()),
        )?;
    }
    Ok(types)
}

fn item(index: i64) -> Value {
    let item = DynamicBean::new("Item").with("price", index - 4);
    if index % 2 == 0 {
        item.set("sku", format!("SKU-{index}"));
    }
    Value::from(item)
}

/// Metadata requested concurrently is built once and shared.
#[test]
fn test_metadata_built_once() -> Result<()> {
    let factory = ValidatorFactory::new(catalog()?, ValidatorConfig::default());
    let name = TypeName::new("Item7");

    let built: Vec<Arc<BeanMetadata>> = thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|_| scope.spawn(|| factory.bean_metadata(&name)))
            .collect();
        handles
            .into_iter()
            .map(|handle| handle.join().expect("thread panicked"))
            .collect::<Result<_>>()
    })?;

    for metadata in &built {
        assert!(Arc::ptr_eq(metadata, &built[0]));
    }
    assert_eq!(built[0].meta_constraints().len(), 3);
    Ok(())
}

/// Parallel validation calls produce the same results as sequential ones.
#[test]
fn test_parallel_validation() -> Result<()> {
    let factory = ValidatorFactory::new(catalog()?, ValidatorConfig::default());
    assert_eq!(factory.warm_up()?, 33);
    let validator = factory.validator()?;

    let beans: Vec<BeanRef> = (0..32)
        .map(|index| {
            DynamicBean::new(format!("Item{index}"))
                .with("items", (0..10).map(item).collect::<Vec<_>>())
                .with("price", 10)
                .with("sku", "root")
                .handle()
        })
        .collect();

    let sequential = beans
        .iter()
        .map(|bean| validator.validate(bean, &[]).map(|v| v.len()))
        .collect::<Result<Vec<_>>>()?;
    let parallel = beans
        .par_iter()
        .map(|bean| validator.validate(bean, &[]).map(|v| v.len()))
        .collect::<Result<Vec<_>>>()?;

    assert_eq!(sequential, parallel);
    // five odd items without sku, five items with a price of zero or less
    assert!(sequential.iter().all(|&count| count == 10));
    Ok(())
}

/// Validators are cheap clones that can move between threads.
#[test]
fn test_validator_is_send() -> Result<()> {
    let factory = ValidatorFactory::new(catalog()?, ValidatorConfig::fail_fast());
    let validator = factory.validator()?;

    let counts: Vec<usize> = thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|index| {
                let validator = validator.clone();
                scope.spawn(move || {
                    let bean = DynamicBean::new("Item").with("price", -index).handle();
                    validator.validate(&bean, &[]).map(|v| v.len())
                })
            })
            .collect();
        handles
            .into_iter()
            .map(|handle| handle.join().expect("thread panicked"))
            .collect::<Result<_>>()
    })?;

    assert_eq!(counts, [1, 1, 1, 1]);
    Ok(())
}
