//! Robustness tests for edge cases and error conditions.
//!
//! These tests verify that partneracl handles unusual table content and
//! bad input gracefully, through the public library API.

use partneracl::acl::{AclEntry, AclTable, AuditTag, DispatcherEntry, RegionAnchor, RouterEntry};
use partneracl::config::{Config, EntryTemplate};
use partneracl::engine::{finalize_and_persist, merge, MergeRequest, WorkingCopies};
use partneracl::fs_abstraction::RealFileSystem;
use partneracl::validation::{is_valid_ipv4, validate_partner_name};
use tempfile::TempDir;

fn marker() -> RegionAnchor {
    RegionAnchor::Marker("# Script inserted entries".to_string())
}

fn audit() -> AuditTag {
    AuditTag {
        employee_id: "D123456".to_string(),
        date: "2026-10-19".to_string(),
        requested_by: "Ops".to_string(),
        contact_email: "ops@example.com".to_string(),
    }
}

fn request(cert: &str, ips: &[&str], sids: &[&str]) -> MergeRequest {
    MergeRequest {
        certification_id: cert.to_string(),
        partner_name: format!("Partner {}", cert),
        ips: ips.iter().map(|s| s.to_string()).collect(),
        sids: sids.iter().map(|s| s.to_string()).collect(),
        audit: audit(),
        router_only: false,
    }
}

/// Test IPv4 validation edge cases
#[test]
fn test_ip_validation_edge_cases() {
    // Valid edge cases
    assert!(is_valid_ipv4("255.255.255.255"));
    assert!(is_valid_ipv4("10.0.0.0/8"));
    assert!(is_valid_ipv4("10.1.1.1/32"));
    assert!(is_valid_ipv4("1.2.3.4/0"));

    // Invalid cases - should fail gracefully
    assert!(!is_valid_ipv4("0.0.0.0"));
    assert!(!is_valid_ipv4("0.0.0.0/0"));
    assert!(!is_valid_ipv4("256.0.0.0"));
    assert!(!is_valid_ipv4("1.2.3"));
    assert!(!is_valid_ipv4("1.2.3.4.5"));
    assert!(!is_valid_ipv4("1.2.3.4/33"));
    assert!(!is_valid_ipv4("::1"));
    assert!(!is_valid_ipv4(""));
    assert!(!is_valid_ipv4(" "));
}

/// CRLF tables are read like LF tables and written back with LF
#[test]
fn test_crlf_table() {
    let text = "# acl\r\n# Script inserted entries\r\n##-- 1: Acme --##\r\nP * * * 10.1.1.1 *\r\n";
    let table: AclTable<DispatcherEntry> = AclTable::parse("/srv/acl.txt", text, &marker()).unwrap();

    assert_eq!(table.partner_name("1"), Some("Acme"));
    assert_eq!(
        table.render(),
        "# acl\n# Script inserted entries\n##-- 1: Acme --##\nP * * * 10.1.1.1 *\n"
    );
}

/// Empty and whitespace-only tables
#[test]
fn test_empty_and_whitespace_tables() {
    assert!(AclTable::<DispatcherEntry>::parse("/srv/acl.txt", "", &marker()).is_err());
    assert!(AclTable::<DispatcherEntry>::parse("/srv/acl.txt", "\n\n  \n", &marker()).is_err());

    let router: AclTable<RouterEntry> =
        AclTable::parse("/srv/saprouttab", "", &RegionAnchor::FirstHeader).unwrap();
    assert!(router.blocks().is_empty());
    assert_eq!(router.render(), "");

    let marker_only: AclTable<DispatcherEntry> =
        AclTable::parse("/srv/acl.txt", "   # Script inserted entries   \n", &marker()).unwrap();
    assert!(marker_only.blocks().is_empty());
}

/// Headers with odd spacing and unicode names survive untouched
#[test]
fn test_unicode_and_spacing_in_headers() {
    let text = "# Script inserted entries\n##--   42 :  Müller & Söhne GmbH   --##\nP * * * 10.4.4.4 *\n";
    let mut table: AclTable<DispatcherEntry> = AclTable::parse("/srv/acl.txt", text, &marker()).unwrap();

    assert_eq!(table.partner_name("42"), Some("Müller & Söhne GmbH"));
    assert!(validate_partner_name("Müller & Söhne GmbH").is_ok());

    // Extending the block leaves the original header text as it was
    let entry = DispatcherEntry::parse("P * * * 10.5.5.5 *").unwrap();
    table.insert_entry("42", "ignored", entry).unwrap();
    assert!(table.render().contains("##--   42 :  Müller & Söhne GmbH   --##\nP * * * 10.5.5.5 *\n"));
}

/// Lines that do not parse as entries are kept verbatim
#[test]
fn test_unparseable_lines_are_preserved() {
    let text = "# Script inserted entries\nP * *\n##-- 1: Acme --##\n# note about Acme\nfoo\n";
    let table: AclTable<DispatcherEntry> = AclTable::parse("/srv/acl.txt", text, &marker()).unwrap();
    assert_eq!(table.render(), text);
}

/// Large tables: many partners, merge lands in the right block
#[test]
fn test_large_table_merge() {
    let mut dispatcher = String::from("# Script inserted entries\n");
    let mut router = String::from("# ABC hostA 3200, 3300\n");
    for i in 0..2_000 {
        dispatcher.push_str(&format!(
            "##-- {}: Partner {} --##\nP * * * 10.{}.{}.1 *\n",
            i,
            i,
            i / 256,
            i % 256
        ));
        router.push_str(&format!(
            "##-- {}: Partner {} --##\nP 10.{}.{}.1 hostA 3200\n",
            i,
            i,
            i / 256,
            i % 256
        ));
    }

    let mut copies = WorkingCopies {
        dispatcher: AclTable::parse("/srv/acl.txt", &dispatcher, &marker()).unwrap(),
        router: AclTable::parse("/srv/saprouttab", &router, &RegionAnchor::FirstHeader).unwrap(),
    };

    let report = merge(
        &mut copies,
        &request("1999", &["10.7.207.1", "172.16.0.1"], &["ABC"]),
        &EntryTemplate::default(),
    )
    .unwrap();

    // 10.7.207.1 is partner 1999's own address
    assert_eq!(report.dispatcher_added.len(), 1);
    // Its 3200 route exists already
    assert_eq!(report.router_added.len(), 3);
    assert_eq!(report.partial_pairs.len(), 1);
    assert!(report.headers_created.is_empty());
    assert_eq!(copies.dispatcher.blocks().len(), 2_000);
}

/// Missing table files surface as persistence errors
#[test]
fn test_missing_files() {
    let dir = TempDir::new().unwrap();
    let config = Config {
        dispatcher_table: dir.path().join("absent.txt"),
        router_table: dir.path().join("saprouttab"),
        ..Default::default()
    };
    let err = WorkingCopies::open(&RealFileSystem, &config).unwrap_err();
    assert!(err.to_string().contains("absent.txt"));
}

/// Writing into a directory that disappeared fails without panicking
#[test]
fn test_persist_into_missing_directory() {
    let dir = TempDir::new().unwrap();
    let acl = dir.path().join("acl.txt");
    std::fs::write(&acl, "# Script inserted entries\n").unwrap();
    std::fs::write(dir.path().join("saprouttab"), "").unwrap();

    let config = Config {
        dispatcher_table: acl,
        router_table: dir.path().join("saprouttab"),
        ..Default::default()
    };
    let mut copies = WorkingCopies::open(&RealFileSystem, &config).unwrap();
    merge(&mut copies, &request("1", &["10.1.1.1"], &[]), &config.entry).unwrap();

    drop(dir);
    assert!(finalize_and_persist(&RealFileSystem, &copies, None).is_err());
}

/// Malformed configuration files are rejected, not defaulted
#[test]
fn test_yaml_malformed_config() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.yaml");

    std::fs::write(&path, "{{{{not valid yaml").unwrap();
    assert!(Config::load(&path).is_err());

    std::fs::write(&path, "dispatcher_table: [1, 2]\n").unwrap();
    assert!(Config::load(&path).is_err());

    std::fs::write(&path, "marker: 'not a comment'\n").unwrap();
    assert!(Config::load(&path).is_err());
}
