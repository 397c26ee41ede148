//! Benchmarks for table parsing, merging and rendering.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use partneracl::acl::{AclTable, AuditTag, DispatcherEntry, RegionAnchor, RouterEntry};
use partneracl::config::EntryTemplate;
use partneracl::engine::{merge, MergeRequest, WorkingCopies};
use std::hint::black_box;

const MARKER: &str = "# Script inserted entries";

/// Generate a dispatcher table with `partners` blocks of 4 entries each
fn generate_dispatcher(partners: usize) -> String {
    let mut text = format!("# Web Dispatcher ACL\n{}\n", MARKER);
    for p in 0..partners {
        text.push_str(&format!("##-- {}: Partner {} --##\n", p, p));
        for e in 0..4 {
            text.push_str(&format!(
                "P * * * 10.{}.{}.{} * # Entry: D123456 | 2026-01-01 | Ops | ops@example.com\n",
                p / 256,
                p % 256,
                e
            ));
        }
    }
    text
}

/// Generate a router table with reference rows and `partners` blocks
fn generate_router(partners: usize) -> String {
    let mut text = String::from("# SAProuter table\n");
    for s in 0..26 {
        text.push_str(&format!(
            "# S{}1 host{} 32{:02}, 33{:02}\n",
            (b'A' + s as u8) as char,
            s,
            s,
            s
        ));
    }
    for p in 0..partners {
        text.push_str(&format!("##-- {}: Partner {} --##\n", p, p));
        text.push_str(&format!("P 10.{}.{}.0 host0 3200\n", p / 256, p % 256));
        text.push_str(&format!("P 10.{}.{}.0 host0 3300\n", p / 256, p % 256));
    }
    text
}

fn request(ips: usize) -> MergeRequest {
    MergeRequest {
        certification_id: "999999".to_string(),
        partner_name: "Bench".to_string(),
        ips: (0..ips).map(|i| format!("172.16.{}.{}", i / 256, i % 256)).collect(),
        sids: vec!["SA1".to_string(), "SM1".to_string()],
        audit: AuditTag {
            employee_id: "D123456".to_string(),
            date: "2026-10-19".to_string(),
            requested_by: "Bench".to_string(),
            contact_email: "bench@example.com".to_string(),
        },
        router_only: false,
    }
}

fn bench_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse");
    let anchor = RegionAnchor::Marker(MARKER.to_string());

    for partners in [100, 1000, 10000] {
        let dispatcher = generate_dispatcher(partners);
        group.bench_with_input(
            BenchmarkId::new("dispatcher", partners),
            &dispatcher,
            |b, text| {
                b.iter(|| {
                    black_box(
                        AclTable::<DispatcherEntry>::parse("/bench/acl.txt", text, &anchor).unwrap(),
                    )
                });
            },
        );

        let router = generate_router(partners);
        group.bench_with_input(BenchmarkId::new("router", partners), &router, |b, text| {
            b.iter(|| {
                black_box(
                    AclTable::<RouterEntry>::parse(
                        "/bench/saprouttab",
                        text,
                        &RegionAnchor::FirstHeader,
                    )
                    .unwrap(),
                )
            });
        });
    }

    group.finish();
}

fn bench_merge(c: &mut Criterion) {
    let mut group = c.benchmark_group("merge");
    let template = EntryTemplate::default();

    for partners in [100, 1000, 10000] {
        let copies = WorkingCopies {
            dispatcher: AclTable::parse(
                "/bench/acl.txt",
                &generate_dispatcher(partners),
                &RegionAnchor::Marker(MARKER.to_string()),
            )
            .unwrap(),
            router: AclTable::parse(
                "/bench/saprouttab",
                &generate_router(partners),
                &RegionAnchor::FirstHeader,
            )
            .unwrap(),
        };
        let request = request(16);

        group.bench_with_input(
            BenchmarkId::new("16_ips_2_sids", partners),
            &copies,
            |b, copies| {
                b.iter(|| {
                    let mut working = copies.clone();
                    black_box(merge(&mut working, &request, &template).unwrap())
                });
            },
        );
    }

    group.finish();
}

fn bench_render(c: &mut Criterion) {
    let mut group = c.benchmark_group("render");

    for partners in [1000, 10000] {
        let table: AclTable<DispatcherEntry> = AclTable::parse(
            "/bench/acl.txt",
            &generate_dispatcher(partners),
            &RegionAnchor::Marker(MARKER.to_string()),
        )
        .unwrap();

        group.bench_with_input(BenchmarkId::new("dispatcher", partners), &table, |b, table| {
            b.iter(|| black_box(table.render()));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_parse, bench_merge, bench_render);
criterion_main!(benches);
