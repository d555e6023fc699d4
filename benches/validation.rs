//! Benchmarks for validation.
//!
//! Measures the hot paths of a warmed up factory:
//! - Flat bean validation
//! - Cascaded validation of a list of beans
//! - Group sequence validation
//! - Metadata aggregation of a deep hierarchy

extern crate beanval;

use beanval::prelude::*;
use criterion::{criterion_group, criterion_main, Criterion};
use std::{hint::black_box, sync::Arc};

fn types() -> Arc<TypeRegistry> {
    let types = Arc::new(TypeRegistry::new());
    types.define(TypeBuilder::group("Strict")).unwrap();
    types
        .define(TypeBuilder::sequence(
            "Ordered",
            [TypeName::default_group(), TypeName::new("Strict")],
        ))
        .unwrap();
    types
        .define(
            TypeBuilder::class("Line")
                .field(
                    "sku",
                    ElementMetadata::new().constraint(ConstraintDeclaration::new("NotBlank")),
                )
                .field(
                    "quantity",
                    ElementMetadata::new()
                        .constraint(ConstraintDeclaration::new("Min").attribute("value", 1))
                        .constraint(
                            ConstraintDeclaration::new("Max")
                                .attribute("value", 99)
                                .groups(["Strict"]),
                        ),
                ),
        )
        .unwrap();
    types
        .define(
            TypeBuilder::class("Order")
                .field(
                    "customer",
                    ElementMetadata::new()
                        .constraint(ConstraintDeclaration::new("NotNull"))
                        .constraint(ConstraintDeclaration::new("Size").attribute("max", 64)),
                )
                .field("lines", ElementMetadata::new().cascade()),
        )
        .unwrap();

    types.define(TypeBuilder::class("Level0")).unwrap();
    for level in 1..16 {
        types
            .define(
                TypeBuilder::class(format!("Level{level}"))
                    .extends(format!("Level{}", level - 1))
                    .field(
                        format!("field{level}"),
                        ElementMetadata::new().constraint(ConstraintDeclaration::new("NotNull")),
                    ),
            )
            .unwrap();
    }
    types
}

fn order(lines: i64) -> BeanRef {
    let lines: Vec<Value> = (0..lines)
        .map(|index| {
            Value::from(
                DynamicBean::new("Line")
                    .with("sku", format!("SKU-{index}"))
                    .with("quantity", index % 120),
            )
        })
        .collect();
    DynamicBean::new("Order")
        .with("customer", "ACME")
        .with("lines", lines)
        .handle()
}

/// Benchmark validating a bean without cascades.
fn bench_validate_flat(c: &mut Criterion) {
    let validator = ValidatorFactory::new(types(), ValidatorConfig::default())
        .validator()
        .unwrap();
    let line = DynamicBean::new("Line").with("sku", "A").with("quantity", 0).handle();

    c.bench_function("validate_flat", |b| {
        b.iter(|| black_box(validator.validate(black_box(&line), &[]).unwrap()));
    });
}

/// Benchmark validating an order with 100 cascaded lines.
fn bench_validate_cascaded(c: &mut Criterion) {
    let validator = ValidatorFactory::new(types(), ValidatorConfig::default())
        .validator()
        .unwrap();
    let order = order(100);

    c.bench_function("validate_cascaded_100", |b| {
        b.iter(|| black_box(validator.validate(black_box(&order), &[]).unwrap()));
    });
}

/// Benchmark validating along a group sequence.
fn bench_validate_sequence(c: &mut Criterion) {
    let validator = ValidatorFactory::new(types(), ValidatorConfig::default())
        .validator()
        .unwrap();
    let order = order(100);
    let groups = [TypeName::new("Ordered")];

    c.bench_function("validate_sequence_100", |b| {
        b.iter(|| black_box(validator.validate(black_box(&order), &groups).unwrap()));
    });
}

/// Benchmark aggregating the metadata of a 16 level hierarchy from a cold cache.
fn bench_metadata_deep_hierarchy(c: &mut Criterion) {
    let types = types();
    let name = TypeName::new("Level15");

    c.bench_function("metadata_deep_hierarchy", |b| {
        b.iter(|| {
            let factory = ValidatorFactory::new(types.clone(), ValidatorConfig::default());
            black_box(factory.bean_metadata(black_box(&name)).unwrap())
        });
    });
}

criterion_group!(
    benches,
    bench_validate_flat,
    bench_validate_cascaded,
    bench_validate_sequence,
    bench_metadata_deep_hierarchy,
);
criterion_main!(benches);
