//! Performance benchmarks for tracker-import
//!
//! These benchmarks measure the performance of key operations:
//! - Rule evaluation over bundles of growing size
//! - Merging partial rule effect aggregates
//! - Report aggregation across object types
//! - The full validate-then-commit pipeline
//!
//! ## Running Benchmarks
//!
//! ```bash
//! cargo bench
//! cargo bench rule_evaluation
//! cargo bench full_pipeline
//! ```
//!
//! ## Expected Performance Characteristics
//!
//! ### Rule Evaluation
//! - Records are evaluated in parallel with rayon
//! - Scales linearly with the number of enrollments and events
//!
//! ### Effect Merging
//! - Merge cost is linear in the size of the smaller side's keys
//!
//! ### Full Pipeline
//! - Validation and commit are sequential in batch order
//! - Dominated by reference and existence lookups

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use tracker_import::engine::RuleEngine;
use tracker_import::import::bundle::{Attribute, DataValue, Enrollment, Event, TrackedEntity};
use tracker_import::import::{ImportBundle, ImportParams, ImportPipeline, InMemoryStore, RecordingDispatcher};
use tracker_import::report::{ErrorCode, ErrorReport, ImportReport, ObjectReport, Report, TypeReport};
use tracker_import::rules::{
    BundleContext, Condition, ProgramRule, RecordKind, RuleAction, RuleActionType, RuleEffect,
    RuleEffects, RuleEngineEffects, RuleScope,
};
use tracker_import::types::{ObjectType, Uid};

// ============================================================================
// Helper Functions
// ============================================================================

/// Deterministic 11 character uid for the given prefix and number
fn uid(prefix: char, n: usize) -> Uid {
    Uid::new(format!("{}{:010}", prefix, n))
}

/// Bundle with one tracked entity, `size` enrollments and two events each
fn create_bundle(size: usize) -> ImportBundle {
    let te = uid('T', 0);
    let org_unit = Uid::new("DiszpKrYNg8");

    let enrollments: Vec<Enrollment> = (0..size)
        .map(|i| Enrollment {
            enrollment: uid('N', i),
            tracked_entity: Some(te.clone()),
            program: Some(Uid::new("IpHINAT79UW")),
            org_unit: Some(org_unit.clone()),
            attributes: if i % 2 == 0 {
                vec![Attribute::new("w75KJ2mc4zz", "Jane")]
            } else {
                Vec::new()
            },
            ..Default::default()
        })
        .collect();

    let events: Vec<Event> = (0..size * 2)
        .map(|i| Event {
            event: uid('V', i),
            enrollment: Some(uid('N', i / 2)),
            program_stage: Some(Uid::new("A03MvHHogjR")),
            org_unit: Some(org_unit.clone()),
            data_values: vec![DataValue::new("qrur9Dvnyt5", (i % 5).to_string())],
            ..Default::default()
        })
        .collect();

    ImportBundle {
        tracked_entities: vec![TrackedEntity {
            tracked_entity: te,
            tracked_entity_type: Some(Uid::new("nEenWmSyUEp")),
            org_unit: Some(org_unit),
            attributes: Vec::new(),
        }],
        enrollments,
        events,
        metadata: Vec::new(),
    }
}

fn create_rules() -> Vec<ProgramRule> {
    vec![
        ProgramRule {
            uid: Uid::new("NAgjOfWMXg6"),
            name: "first name is mandatory".to_string(),
            scope: RuleScope::Enrollment,
            condition: Condition::AttributeMissing {
                attribute: Uid::new("w75KJ2mc4zz"),
            },
            actions: vec![
                RuleAction::new(RuleActionType::ShowWarning).with_content("first name missing"),
            ],
        },
        ProgramRule {
            uid: Uid::new("tO1D62oB0tq"),
            name: "zero weight".to_string(),
            scope: RuleScope::Event,
            condition: Condition::DataValueEquals {
                data_element: Uid::new("qrur9Dvnyt5"),
                value: "0".to_string(),
            },
            actions: vec![RuleAction::new(RuleActionType::SendMessage).with_template("Zp268JB6Ne5")],
        },
    ]
}

fn create_effects(records: usize, offset: usize) -> RuleEngineEffects {
    RuleEngineEffects::from_rule_effects(
        (0..records)
            .map(|i| {
                RuleEffects::new(
                    uid('V', i + offset),
                    RecordKind::Event,
                    vec![
                        RuleEffect {
                            rule_uid: Uid::new("tO1D62oB0tq"),
                            action_type: RuleActionType::ShowWarning,
                            data: None,
                            field: Some(Uid::new("qrur9Dvnyt5")),
                            content: Some("check weight".to_string()),
                            template: None,
                        },
                        RuleEffect {
                            rule_uid: Uid::new("tO1D62oB0tq"),
                            action_type: RuleActionType::SendMessage,
                            data: None,
                            field: None,
                            content: None,
                            template: Some(Uid::new("Zp268JB6Ne5")),
                        },
                    ],
                )
            })
            .collect(),
    )
}

fn create_type_reports(count: usize) -> Vec<TypeReport> {
    let types = [
        ObjectType::tracked_entity(),
        ObjectType::enrollment(),
        ObjectType::event(),
    ];
    (0..count)
        .map(|i| {
            let object_type = types[i % types.len()].clone();
            let mut report = TypeReport::new(object_type.clone());
            if i % 4 == 0 {
                let mut object = ObjectReport::new(object_type.clone(), i, Some(uid('X', i)));
                object.add_error_report(ErrorReport::new(ErrorCode::E4000, object_type, ["orgUnit"]));
                report.add_object_report(object);
                report.stats_mut().inc_ignored();
            } else {
                report.stats_mut().inc_created();
            }
            report
        })
        .collect()
}

// ============================================================================
// Rule Engine Benchmarks
// ============================================================================

/// Benchmark rule evaluation over all tracked records of a bundle
fn bench_rule_evaluation(c: &mut Criterion) {
    let mut group = c.benchmark_group("rule_evaluation");
    let engine = RuleEngine::new(create_rules());

    for size in [100, 1_000, 5_000].iter() {
        let bundle = create_bundle(*size);
        let ctx = BundleContext::new(&bundle, false);

        group.throughput(Throughput::Elements((*size * 3) as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| black_box(engine.evaluate(&ctx)));
        });
    }

    group.finish();
}

/// Benchmark merging two partial effect aggregates
fn bench_effects_merge(c: &mut Criterion) {
    let mut group = c.benchmark_group("effects_merge");

    for records in [100, 1_000, 10_000].iter() {
        // Half the keys overlap between both sides
        let left = create_effects(*records, 0);
        let right = create_effects(*records, records / 2);

        group.throughput(Throughput::Elements(*records as u64));
        group.bench_with_input(BenchmarkId::from_parameter(records), records, |b, _| {
            b.iter(|| black_box(RuleEngineEffects::merge(left.clone(), right.clone())));
        });
    }

    group.finish();
}

// ============================================================================
// Report Benchmarks
// ============================================================================

/// Benchmark aggregating per-object type reports into an import report
fn bench_report_aggregation(c: &mut Criterion) {
    let mut group = c.benchmark_group("report_aggregation");

    for count in [100, 1_000, 10_000].iter() {
        let reports = create_type_reports(*count);

        group.throughput(Throughput::Elements(*count as u64));
        group.bench_with_input(BenchmarkId::from_parameter(count), count, |b, _| {
            b.iter(|| {
                let mut report = ImportReport::new();
                report.add_type_reports(reports.iter().cloned());
                report.clean();
                black_box(report.stats())
            });
        });
    }

    group.finish();
}

// ============================================================================
// Full Pipeline Benchmarks
// ============================================================================

/// Benchmark the complete import of a bundle into an empty store
fn bench_full_pipeline(c: &mut Criterion) {
    let mut group = c.benchmark_group("full_pipeline");
    group.sample_size(10);

    for size in [100, 1_000].iter() {
        let bundle = create_bundle(*size);

        group.throughput(Throughput::Elements(bundle.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| {
                let mut pipeline =
                    ImportPipeline::with_defaults(ImportParams::default(), create_rules()).unwrap();
                let mut store = InMemoryStore::new();
                let mut dispatcher = RecordingDispatcher::new();
                black_box(pipeline.run(&bundle, &mut store, &mut dispatcher))
            });
        });
    }

    group.finish();
}

criterion_group!(rule_benches, bench_rule_evaluation, bench_effects_merge,);

criterion_group!(report_benches, bench_report_aggregation,);

criterion_group!(pipeline_benches, bench_full_pipeline,);

criterion_main!(rule_benches, report_benches, pipeline_benches);
