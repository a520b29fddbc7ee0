//! Built-in registry definitions.
//!
//! URLs point at the CSV exports IANA publishes next to each registry page.

use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

use super::{Columns, NamingFamily, RangeMarker, RegistryId, RegistrySpec, Source, TableShape};
use crate::config::IANA_ASSIGNMENTS_URL;

const NONE: &[&str] = Columns::NONE;

/// Code packing macros matching [`coap_code`], for C code using `COAP_CODE_*`.
const COAP_CODE_MACROS: &str = "\
#define COAP_CODE(CLASS, SUBCLASS) ((((CLASS)&0x07U)<<5)|((SUBCLASS)&0x1FU))
#define COAP_GET_CODE_CLASS(CODE) (((CODE)>>5U)&0x07U)
#define COAP_GET_CODE_SUBCLASS(CODE) ((CODE)&0x1FU)
";

/// Integer value of a CoAP `class.detail` code.
pub const fn coap_code(class: u64, detail: u64) -> u64 {
    ((class & 0x07) << 5) | (detail & 0x1F)
}

fn source(key: &str, path: &str) -> Source {
    Source {
        key: key.to_string(),
        url: format!("{IANA_ASSIGNMENTS_URL}/{path}"),
    }
}

fn page(path: &str) -> String {
    format!("{IANA_ASSIGNMENTS_URL}/{path}")
}

fn base(id: RegistryId, title: &str, source_url: String, sources: Vec<Source>) -> RegistrySpec {
    let section = id.as_str().replace('-', "_");
    RegistrySpec {
        id,
        title: title.to_string(),
        source_url,
        sources,
        shape: TableShape::Simple,
        family: NamingFamily::Label,
        columns: Columns {
            value: &["Value"],
            label: &["Name"],
            description: &["Description"],
            reference: &["Reference"],
            applicability: NONE,
            qualifier: NONE,
        },
        prefix: section.to_uppercase(),
        typedef: format!("{section}_t"),
        destination: PathBuf::from(format!("{section}.h")),
        section,
        ranges: Vec::new(),
        literal_suffix: None,
        include_value: false,
        placeholders: true,
        prune: false,
        min_entries: 1,
        overrides: BTreeMap::new(),
        exclude: BTreeSet::new(),
        preamble: None,
        feature_flags: false,
    }
}

/// Default `RegistrySpec` for a registry.
#[must_use]
pub fn builtin_spec(id: RegistryId) -> RegistrySpec {
    match id {
        RegistryId::CoapCodes => {
            let mut spec = base(
                id,
                "IANA CoAP Request/Response Codes",
                page("core-parameters/core-parameters.xhtml#codes"),
                vec![
                    source("coap-method-codes", "core-parameters/method-codes.csv"),
                    source("coap-response-codes", "core-parameters/response-codes.csv"),
                    source("coap-signaling-codes", "core-parameters/signaling-codes.csv"),
                ],
            );
            spec.shape = TableShape::DottedCode;
            spec.columns.value = &["Code"];
            spec.columns.label = &["Name"];
            spec.columns.description = &["Description"];
            spec.prefix = "COAP_CODE".to_string();
            spec.preamble = Some(COAP_CODE_MACROS.to_string());
            spec.include_value = true;
            spec.placeholders = false;
            spec.min_entries = 10;
            spec.ranges = vec![
                RangeMarker::new(0, 0, "Indicates an Empty message [RFC7252, Section 4.1]"),
                RangeMarker::new(
                    coap_code(0, 1),
                    coap_code(0, 31),
                    "Indicates a request [RFC7252, Section 12.1.1]",
                ),
                RangeMarker::new(coap_code(1, 0), coap_code(1, 31), "Reserved [RFC7252]"),
                RangeMarker::new(
                    coap_code(2, 0),
                    coap_code(5, 31),
                    "Indicates a response [RFC7252, Section 12.1.2]",
                ),
                RangeMarker::new(coap_code(6, 0), coap_code(6, 31), "Reserved [RFC7252]"),
                RangeMarker::new(
                    coap_code(7, 0),
                    coap_code(7, 31),
                    "Signaling codes [RFC8323, Section 11.1]",
                ),
            ];
            spec
        }
        RegistryId::CoapOptions => {
            let mut spec = base(
                id,
                "IANA CoAP Option Numbers",
                page("core-parameters/core-parameters.xhtml#option-numbers"),
                vec![source("coap-option-numbers", "core-parameters/option-numbers.csv")],
            );
            spec.columns.value = &["Number"];
            spec.prefix = "COAP_OPTION".to_string();
            spec.min_entries = 10;
            spec.ranges = vec![
                RangeMarker::new(0, 255, "IETF Review or IESG Approval"),
                RangeMarker::new(256, 2047, "Specification Required"),
                RangeMarker::new(2048, 64999, "Expert Review"),
                RangeMarker::new(65000, 65535, "Experimental use (no operational use)"),
            ];
            spec
        }
        RegistryId::CoapContentFormats => {
            let mut spec = base(
                id,
                "IANA CoAP Content-Formats",
                page("core-parameters/core-parameters.xhtml#content-formats"),
                vec![source("coap-content-formats", "core-parameters/content-formats.csv")],
            );
            spec.shape = TableShape::CompoundKey;
            spec.family = NamingFamily::MediaType;
            spec.columns.value = &["ID"];
            spec.columns.label = &["Content Type", "Media Type"];
            spec.columns.qualifier = &["Content Coding"];
            spec.prefix = "COAP_CONTENT_FORMAT".to_string();
            spec.placeholders = false;
            spec.min_entries = 10;
            spec.ranges = vec![
                RangeMarker::new(0, 255, "Expert Review"),
                RangeMarker::new(256, 9999, "IETF Review or IESG Approval"),
                RangeMarker::new(10000, 64999, "First Come First Served"),
                RangeMarker::new(65000, 65535, "Experimental use (no operational use)"),
            ];
            spec
        }
        RegistryId::CoapSignalingOptions => {
            let mut spec = base(
                id,
                "IANA CoAP Signaling Option Numbers",
                page("core-parameters/core-parameters.xhtml#signaling-option-numbers"),
                vec![source(
                    "coap-signaling-option-numbers",
                    "core-parameters/signaling-option-numbers.csv",
                )],
            );
            spec.shape = TableShape::MultiApplicability;
            spec.columns.value = &["Number"];
            spec.columns.applicability = &["Applies to"];
            spec.prefix = "COAP_SIGNALING_OPTION".to_string();
            spec.include_value = true;
            spec.placeholders = false;
            spec
        }
        RegistryId::CborSimpleValues => {
            let mut spec = base(
                id,
                "IANA CBOR Simple Values",
                page("cbor-simple-values/cbor-simple-values.xhtml#simple"),
                vec![source("cbor-simple-values", "cbor-simple-values/simple.csv")],
            );
            spec.columns.label = NONE;
            spec.columns.description = &["Semantics"];
            spec.prefix = "CBOR_SIMPLE_VALUE".to_string();
            spec.placeholders = false;
            spec.min_entries = 4;
            spec.ranges = vec![
                RangeMarker::new(0, 19, "Standards Action"),
                RangeMarker::new(32, 255, "Specification Required"),
            ];
            spec
        }
        RegistryId::CborTags => {
            let mut spec = base(
                id,
                "IANA CBOR Tags",
                page("cbor-tags/cbor-tags.xhtml#tags"),
                vec![source("cbor-tags", "cbor-tags/tags.csv")],
            );
            spec.family = NamingFamily::Semantics;
            spec.columns.value = &["Tag"];
            spec.columns.label = NONE;
            spec.columns.description = &["Semantics"];
            spec.columns.qualifier = &["Data Item"];
            spec.prefix = "CBOR_TAG".to_string();
            spec.include_value = true;
            spec.placeholders = false;
            spec.literal_suffix = Some("ULL".to_string());
            spec.min_entries = 10;
            spec.ranges = vec![
                RangeMarker::new(0, 23, "Standards Action"),
                RangeMarker::new(24, 32767, "Specification Required"),
                RangeMarker::new(32768, 65535, "First Come First Served (16-bit)"),
                RangeMarker::new(65536, 4_294_967_295, "First Come First Served (32-bit)"),
                RangeMarker::new(
                    4_294_967_296,
                    u64::MAX,
                    "First Come First Served (64-bit)",
                ),
            ];
            spec.overrides = BTreeMap::from([
                (65535, "invalid 16bit".to_string()),
                (4_294_967_295, "invalid 32bit".to_string()),
                (u64::MAX, "invalid 64bit".to_string()),
                (107, "SUIT Envelope".to_string()),
                (1070, "SUIT Manifest".to_string()),
            ]);
            spec
        }
        RegistryId::HttpStatusCodes => {
            let mut spec = base(
                id,
                "IANA HTTP Status Codes",
                page("http-status-codes/http-status-codes.xhtml#http-status-codes-1"),
                vec![source(
                    "http-status-codes",
                    "http-status-codes/http-status-codes-1.csv",
                )],
            );
            spec.columns.label = NONE;
            spec.prefix = "HTTP_STATUS".to_string();
            spec.include_value = true;
            spec.placeholders = false;
            spec.min_entries = 10;
            spec.ranges = vec![
                RangeMarker::new(100, 199, "Informational - Request received, continuing process"),
                RangeMarker::new(200, 299, "Success - The action was successfully received, understood, and accepted"),
                RangeMarker::new(300, 399, "Redirection - Further action must be taken in order to complete the request"),
                RangeMarker::new(400, 499, "Client Error - The request contains bad syntax or cannot be fulfilled"),
                RangeMarker::new(500, 599, "Server Error - The server failed to fulfill an apparently valid request"),
            ];
            spec
        }
    }
}
