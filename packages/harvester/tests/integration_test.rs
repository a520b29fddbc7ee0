//! End-to-end integration tests for the harvester pipeline.
//!
//! Runs registries from fetch to emitted header using CSV fixtures shaped
//! like the IANA exports, served by an in-process transport.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use pretty_assertions::assert_eq;
use tempfile::{tempdir, TempDir};

use iana_harvester::catalog::RegistryId;
use iana_harvester::config::{CacheSettings, OutputSettings, Settings};
use iana_harvester::error::{HarvesterError, Result};
use iana_harvester::http::{Download, Transport};
use iana_harvester::types::{DefinitionChange, Outcome, RegistryReport, Warning};
use iana_harvester::{Harvester, RunOptions};

fn fixture_path(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

/// Serves fixture files by the last path segment of the requested URL.
#[derive(Default)]
struct FixtureTransport {
    /// Alternative fixture per file name.
    replacements: HashMap<&'static str, &'static str>,
    offline: bool,
}

impl FixtureTransport {
    fn replacing(file: &'static str, with: &'static str) -> Self {
        Self {
            replacements: HashMap::from([(file, with)]),
            ..Self::default()
        }
    }

    fn offline() -> Self {
        Self {
            offline: true,
            ..Self::default()
        }
    }
}

impl Transport for FixtureTransport {
    fn get(&self, url: &str, _if_modified_since: Option<&str>) -> Result<Download> {
        if self.offline {
            return Err(HarvesterError::RetriesExhausted {
                attempts: 3,
                message: "network unreachable".to_string(),
            });
        }
        let file = url.rsplit('/').next().unwrap_or_default();
        let file = self.replacements.get(file).copied().unwrap_or(file);
        let bytes = fs::read(fixture_path(file))
            .unwrap_or_else(|e| panic!("no fixture for {url}: {e}"));
        Ok(Download::Body {
            bytes,
            last_modified: None,
        })
    }
}

fn settings(dir: &TempDir) -> Settings {
    Settings {
        cache: CacheSettings {
            dir: Some(dir.path().join("cache")),
            ttl_secs: None,
        },
        output: OutputSettings {
            dir: Some(dir.path().join("include")),
        },
        ..Settings::default()
    }
}

fn run_with(
    settings: &Settings,
    transport: FixtureTransport,
    options: RunOptions,
    id: RegistryId,
) -> RegistryReport {
    let spec = settings.registry_spec(id).unwrap();
    Harvester::new(settings, Box::new(transport), options).run_registry(&spec)
}

fn run(dir: &TempDir, transport: FixtureTransport, id: RegistryId) -> RegistryReport {
    run_with(&settings(dir), transport, RunOptions::default(), id)
}

fn refresh() -> RunOptions {
    RunOptions {
        force_refresh: true,
        ..RunOptions::default()
    }
}

fn read(dir: &TempDir, file: &str) -> String {
    fs::read_to_string(dir.path().join("include").join(file)).unwrap()
}

fn write(dir: &TempDir, file: &str, content: &str) {
    fs::write(dir.path().join("include").join(file), content).unwrap();
}

fn assert_outcome(report: &RegistryReport, expected: &str) {
    let actual = match &report.outcome {
        Outcome::Written => "written",
        Outcome::Unchanged => "unchanged",
        Outcome::DryRun { .. } => "dry-run",
        Outcome::Failed(_) => "failed",
    };
    assert_eq!(actual, expected, "{:?}", report.outcome);
}

const COAP_OPTIONS_HEADER: &str = "\
/* IANA CoAP Option Numbers
 * Generated by iana-harvester. Edits outside the autogenerated section are kept.
 */

/* Start of coap_options autogenerated section */
/* Autogenerated IANA CoAP Option Numbers (Source: https://www.iana.org/assignments/core-parameters/core-parameters.xhtml#option-numbers) */
typedef enum {
  /* 0-255 : IETF Review or IESG Approval */
  // Reserved; Ref: [RFC7252]
  COAP_OPTION_0_RESERVED = 0,
  // If-Match; Ref: [RFC7252]
  COAP_OPTION_IF_MATCH = 1,
  // Uri-Host; Ref: [RFC7252]
  COAP_OPTION_URI_HOST = 3,
  // ETag; Ref: [RFC7252]
  COAP_OPTION_ETAG = 4,
  // If-None-Match; Ref: [RFC7252]
  COAP_OPTION_IF_NONE_MATCH = 5,
  // Observe; Ref: [RFC7641]
  COAP_OPTION_OBSERVE = 6,
  // Uri-Port; Ref: [RFC7252]
  COAP_OPTION_URI_PORT = 7,
  // Location-Path; Ref: [RFC7252]
  COAP_OPTION_LOCATION_PATH = 8,
  // Uri-Path; Ref: [RFC7252]
  COAP_OPTION_URI_PATH = 11,
  // Content-Format; Ref: [RFC7252]
  COAP_OPTION_CONTENT_FORMAT = 12,
  // Max-Age; Ref: [RFC7252]
  COAP_OPTION_MAX_AGE = 14,
  /* 256-2047 : Specification Required */
  /* 2048-64999 : Expert Review */
  /* 65000-65535 : Experimental use (no operational use) */
} coap_options_t;
/* End of coap_options autogenerated section */
";

#[test]
fn test_coap_options_fresh_header() {
    let dir = tempdir().unwrap();

    let report = run(&dir, FixtureTransport::default(), RegistryId::CoapOptions);
    assert_outcome(&report, "written");
    assert_eq!(report.generated, 11);
    assert_eq!(report.preserved, 0);
    assert!(report.warnings.is_empty(), "{:?}", report.warnings);
    assert_eq!(read(&dir, "coap_options.h"), COAP_OPTIONS_HEADER);
}

#[test]
fn test_second_run_is_idempotent() {
    let dir = tempdir().unwrap();
    run(&dir, FixtureTransport::default(), RegistryId::CoapOptions);

    let transport = FixtureTransport::default();
    let report = run_with(&settings(&dir), transport, RunOptions::default(), RegistryId::CoapOptions);
    assert_outcome(&report, "unchanged");
    assert_eq!(read(&dir, "coap_options.h"), COAP_OPTIONS_HEADER);
}

#[test]
fn test_fresh_cache_skips_network() {
    let dir = tempdir().unwrap();
    run(&dir, FixtureTransport::default(), RegistryId::CoapOptions);

    // An offline transport is never consulted while the cache is fresh
    let report = run(&dir, FixtureTransport::offline(), RegistryId::CoapOptions);
    assert_outcome(&report, "unchanged");
    assert!(report.warnings.is_empty());
}

#[test]
fn test_user_override_survives_regeneration() {
    let dir = tempdir().unwrap();
    run(&dir, FixtureTransport::default(), RegistryId::CoapOptions);

    let edited = format!(
        "#ifndef COAP_OPTIONS_H\n#define COAP_OPTIONS_H\n{}\nint coap_option_is_critical(int option);\n#endif\n",
        COAP_OPTIONS_HEADER
            .replace("COAP_OPTION_IF_MATCH = 1,", "MY_IF_MATCH = 1,")
            .replace("// If-Match; Ref: [RFC7252]", "// stale comment")
    );
    write(&dir, "coap_options.h", &edited);

    let report = run(&dir, FixtureTransport::default(), RegistryId::CoapOptions);
    assert_outcome(&report, "written");
    assert_eq!(report.preserved, 1);
    assert_eq!(report.generated, 10);

    let header = read(&dir, "coap_options.h");
    assert!(header.starts_with("#ifndef COAP_OPTIONS_H\n#define COAP_OPTIONS_H\n/* IANA CoAP"));
    assert!(header.ends_with("int coap_option_is_critical(int option);\n#endif\n"));
    assert!(header.contains("  // If-Match; Ref: [RFC7252]\n  MY_IF_MATCH = 1, /* override */\n"));
    assert!(!header.contains("COAP_OPTION_IF_MATCH"));

    // The annotated override is stable
    let again = run(&dir, FixtureTransport::default(), RegistryId::CoapOptions);
    assert_outcome(&again, "unchanged");
}

#[test]
fn test_override_matching_derived_name_is_reclassified() {
    let dir = tempdir().unwrap();
    run(&dir, FixtureTransport::default(), RegistryId::CoapOptions);

    let edited = COAP_OPTIONS_HEADER.replace(
        "COAP_OPTION_ETAG = 4,",
        "COAP_OPTION_ETAG = 4, /* override */",
    );
    write(&dir, "coap_options.h", &edited);

    let report = run(&dir, FixtureTransport::default(), RegistryId::CoapOptions);
    assert_outcome(&report, "written");
    assert_eq!(report.preserved, 0);
    assert!(report.warnings.iter().any(|w| matches!(
        w,
        Warning::OverrideReclassified { name, value: 4 } if name == "COAP_OPTION_ETAG"
    )));
    assert_eq!(read(&dir, "coap_options.h"), COAP_OPTIONS_HEADER);
}

#[test]
fn test_withdrawn_value_retained_then_pruned() {
    let dir = tempdir().unwrap();
    let settings = settings(&dir);
    run(&dir, FixtureTransport::default(), RegistryId::CoapOptions);

    let report = run_with(
        &settings,
        FixtureTransport::replacing("option-numbers.csv", "option-numbers-v2.csv"),
        refresh(),
        RegistryId::CoapOptions,
    );
    assert_outcome(&report, "written");
    assert_eq!(report.retained, 1);
    let header = read(&dir, "coap_options.h");
    assert!(header.contains(
        "  /* Retained: no longer published by the registry */\n  // Max-Age; Ref: [RFC7252]\n  COAP_OPTION_MAX_AGE = 14,\n} coap_options_t;"
    ));

    let pruned = run_with(
        &settings,
        FixtureTransport::replacing("option-numbers.csv", "option-numbers-v2.csv"),
        RunOptions {
            prune: true,
            force_refresh: true,
            ..RunOptions::default()
        },
        RegistryId::CoapOptions,
    );
    assert_eq!(pruned.pruned, 1);
    assert_eq!(pruned.retained, 0);
    let header = read(&dir, "coap_options.h");
    assert!(!header.contains("MAX_AGE"));
    assert!(!header.contains("Retained"));
}

#[test]
fn test_dry_run_lists_changes() {
    let dir = tempdir().unwrap();
    let settings = settings(&dir);
    run(&dir, FixtureTransport::default(), RegistryId::CoapOptions);

    let report = run_with(
        &settings,
        FixtureTransport::replacing("option-numbers.csv", "option-numbers-v2.csv"),
        RunOptions {
            dry_run: true,
            prune: true,
            force_refresh: true,
        },
        RegistryId::CoapOptions,
    );
    let Outcome::DryRun {
        changes,
        would_write,
    } = &report.outcome
    else {
        panic!("expected dry run, got {:?}", report.outcome);
    };
    assert!(would_write);
    assert_eq!(changes.len(), 1);
    assert!(matches!(
        &changes[0],
        DefinitionChange::Removed { name, .. } if name == "COAP_OPTION_MAX_AGE"
    ));
    assert_eq!(read(&dir, "coap_options.h"), COAP_OPTIONS_HEADER);
}

#[test]
fn test_stale_cache_used_when_offline() {
    let dir = tempdir().unwrap();
    let settings = settings(&dir);
    run(&dir, FixtureTransport::default(), RegistryId::CoapOptions);

    let report = run_with(&settings, FixtureTransport::offline(), refresh(), RegistryId::CoapOptions);
    assert_outcome(&report, "unchanged");
    assert!(matches!(
        report.warnings.as_slice(),
        [Warning::StaleCache { source_key, .. }] if source_key == "coap-option-numbers"
    ));
}

#[test]
fn test_offline_without_cache_fails_cleanly() {
    let dir = tempdir().unwrap();

    let report = run(&dir, FixtureTransport::offline(), RegistryId::CoapOptions);
    assert_outcome(&report, "failed");
    let Outcome::Failed(err) = &report.outcome else {
        unreachable!()
    };
    assert!(matches!(err, HarvesterError::Fetch { source_key, .. } if source_key == "coap-option-numbers"));
    assert!(!dir.path().join("include/coap_options.h").exists());
}

#[test]
fn test_conflicting_destination_is_not_touched() {
    let dir = tempdir().unwrap();
    fs::create_dir_all(dir.path().join("include")).unwrap();
    let broken = "/* Start of coap_options autogenerated section */\n  X = 1,\n";
    write(&dir, "coap_options.h", broken);

    let transport = FixtureTransport::default();
    let report = run(&dir, transport, RegistryId::CoapOptions);
    assert_outcome(&report, "failed");
    assert!(matches!(
        report.outcome,
        Outcome::Failed(HarvesterError::DestinationConflict { .. })
    ));
    assert_eq!(read(&dir, "coap_options.h"), broken);
}

#[test]
fn test_coap_codes_from_three_sources() {
    let dir = tempdir().unwrap();

    let report = run(&dir, FixtureTransport::default(), RegistryId::CoapCodes);
    assert_outcome(&report, "written");
    // 7 methods, 4 responses, 2 signaling codes and the Empty Message
    assert_eq!(report.generated, 14);

    let header = read(&dir, "coap_codes.h");
    assert!(header.contains("  /* 0-0 : Indicates an Empty message [RFC7252, Section 4.1] */\n  // 0.00; Empty Message; Ref: [RFC7252, Section 4.1]\n  COAP_CODE_0_00_EMPTY_MESSAGE = 0,\n"));
    assert!(header.contains("  COAP_CODE_0_01_GET = 1,\n"));
    assert!(header.contains("  COAP_CODE_0_07_IPATCH = 7,\n"));
    assert!(header.contains("  // 2.05; Content; Ref: [RFC7252]\n  COAP_CODE_2_05_CONTENT = 69,\n"));
    assert!(header.contains("  COAP_CODE_4_04_NOT_FOUND = 132,\n"));
    assert!(header.contains("  COAP_CODE_7_01_CSM = 225,\n"));
    assert!(!header.contains("UNASSIGNED"));

    // New headers carry the code packing macros above the region
    assert!(header.starts_with(
        "/* IANA CoAP Request/Response Codes
 * Generated by iana-harvester. Edits outside the autogenerated section are kept.
 */

#define COAP_CODE(CLASS, SUBCLASS) ((((CLASS)&0x07U)<<5)|((SUBCLASS)&0x1FU))
#define COAP_GET_CODE_CLASS(CODE) (((CODE)>>5U)&0x07U)
#define COAP_GET_CODE_SUBCLASS(CODE) ((CODE)&0x1FU)

/* Start of coap_codes autogenerated section */
"
    ));

    let get = header.find("COAP_CODE_0_01_GET").unwrap();
    let content = header.find("COAP_CODE_2_05_CONTENT").unwrap();
    let csm = header.find("COAP_CODE_7_01_CSM").unwrap();
    assert!(get < content && content < csm);
}

#[test]
fn test_signaling_options_keep_applicability() {
    let dir = tempdir().unwrap();

    let report = run(&dir, FixtureTransport::default(), RegistryId::CoapSignalingOptions);
    assert_outcome(&report, "written");
    assert_eq!(report.generated, 7);

    let header = read(&dir, "coap_signaling_options.h");
    assert!(header.contains(
        "  COAP_SIGNALING_OPTION_2_MAX_MESSAGE_SIZE_7_01 = 2, /* applies to 7.01 */\n"
    ));
    assert!(header.contains("  COAP_SIGNALING_OPTION_2_CUSTODY_7_02 = 2, /* applies to 7.02 */\n"));
    assert!(header.contains("  COAP_SIGNALING_OPTION_2_CUSTODY_7_03 = 2, /* applies to 7.03 */\n"));
    assert!(!header.contains("RESERVED"));

    // Overrides are matched on (value, applicability)
    write(
        &dir,
        "coap_signaling_options.h",
        &header.replace("COAP_SIGNALING_OPTION_2_CUSTODY_7_03", "MY_CUSTODY"),
    );
    let report = run(&dir, FixtureTransport::default(), RegistryId::CoapSignalingOptions);
    assert_eq!(report.preserved, 1);
    let header = read(&dir, "coap_signaling_options.h");
    assert!(header.contains("  MY_CUSTODY = 2, /* applies to 7.03; override */\n"));
    assert!(header.contains("  COAP_SIGNALING_OPTION_2_CUSTODY_7_02 = 2, /* applies to 7.02 */\n"));
}

#[test]
fn test_cbor_tags_names() {
    let dir = tempdir().unwrap();

    let report = run(&dir, FixtureTransport::default(), RegistryId::CborTags);
    assert_outcome(&report, "written");
    assert_eq!(report.generated, 12);

    let header = read(&dir, "cbor_tags.h");
    for name in [
        "CBOR_TAG_0_STD_DATE_TIME_STRING = 0ULL,",
        "CBOR_TAG_1_EPOCH_BASED_DATE_TIME = 1ULL,",
        "CBOR_TAG_32_URI = 32ULL,",
        "CBOR_TAG_37_BINARY_UUID = 37ULL,",
        "CBOR_TAG_107_SUIT_ENVELOPE = 107ULL,",
        "CBOR_TAG_1070_SUIT_MANIFEST = 1070ULL,",
        "CBOR_TAG_55799_SELF_DESCRIBED_CBOR = 55799ULL,",
        "CBOR_TAG_65535_INVALID_16BIT = 65535ULL,",
    ] {
        assert!(header.contains(name), "missing {name} in\n{header}");
    }
    assert!(header.contains("  /* 32768-65535 : First Come First Served (16-bit) */\n  // Self-described CBOR"));
}

#[test]
fn test_cbor_tag_feature_flags() {
    let dir = tempdir().unwrap();
    let settings = Settings {
        registries: Settings::from_toml("[registries.cbor-tags]\nfeature_flags = true\n")
            .unwrap()
            .registries,
        ..settings(&dir)
    };

    let report = run_with(&settings, FixtureTransport::default(), RunOptions::default(), RegistryId::CborTags);
    assert_outcome(&report, "written");
    let header = read(&dir, "cbor_tags.h");
    assert_eq!(header.matches("\n#define CBOR_TAG_").count(), 12);
    assert!(header.contains("#define CBOR_TAG_37_BINARY_UUID CBOR_TAG_37_BINARY_UUID\n"));
    let enum_end = header.find("/* End of cbor_tags autogenerated section */").unwrap();
    let flags = header.find("/* Start of cbor_tags feature flag autogenerated section */").unwrap();
    assert!(enum_end < flags);
    assert!(header.ends_with("/* End of cbor_tags feature flag autogenerated section */\n"));

    // A user rename flows into the flag region
    write(&dir, "cbor_tags.h", &header.replace("CBOR_TAG_37_BINARY_UUID = ", "MY_UUID = "));
    let report = run_with(&settings, FixtureTransport::default(), refresh(), RegistryId::CborTags);
    assert_outcome(&report, "written");
    let header = read(&dir, "cbor_tags.h");
    assert!(header.contains("#define MY_UUID MY_UUID\n"));
    assert!(!header.contains("#define CBOR_TAG_37_BINARY_UUID"));

    let report = run_with(&settings, FixtureTransport::default(), RunOptions::default(), RegistryId::CborTags);
    assert_outcome(&report, "unchanged");
}

#[test]
fn test_settings_overrides_apply() {
    let dir = tempdir().unwrap();
    let settings = Settings {
        registries: Settings::from_toml(
            r#"
[registries.coap-options]
destination = "coap/options.h"
prefix = "COAP_OPT"
typedef = "coap_opt_t"
exclude = [0]

[registries.coap-options.overrides]
"4" = "Entity Tag"
"#,
        )
        .unwrap()
        .registries,
        ..settings(&dir)
    };

    let report = run_with(&settings, FixtureTransport::default(), RunOptions::default(), RegistryId::CoapOptions);
    assert_outcome(&report, "written");

    let header = read(&dir, "coap/options.h");
    assert!(header.contains("  COAP_OPT_ENTITY_TAG = 4,\n"));
    assert!(header.contains("} coap_opt_t;\n"));
    assert!(!header.contains("RESERVED"));
}
