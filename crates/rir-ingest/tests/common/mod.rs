//! Shared fixtures: five small registry files served from a mock server

#![allow(dead_code)]

use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Resource listed by both ARIN (older file) and RIPE NCC (newer file)
pub const DUPLICATED_START: &str = "185.0.0.0";

pub struct Fixture {
    pub registry: &'static str,
    pub last_modified: &'static str,
    pub body: &'static str,
}

pub const FIXTURES: [Fixture; 5] = [
    Fixture {
        registry: "afrinic",
        last_modified: "Mon, 01 Jan 2024 01:00:00 GMT",
        body: "\
# AFRINIC delegated-extended test file
2.3|afrinic|20240101|3|00000000|20231231|+0000
afrinic|*|asn|*|1|summary
afrinic|*|ipv4|*|2|summary
afrinic|ZA|asn|1228|1|19910301|allocated|F36B9F4B
afrinic|ZA|ipv4|41.0.0.0|2097152|20070412|allocated|F36B9F4B
afrinic|EG|ipv4|41.32.0.0|1048576|20070717|allocated|F3698E04
",
    },
    Fixture {
        registry: "apnic",
        last_modified: "Mon, 01 Jan 2024 04:00:00 GMT",
        body: "\
2.3|apnic|20240101|3|19830613|20231231|+1000
apnic|*|ipv4|*|2|summary
apnic|*|ipv6|*|1|summary
apnic|AU|ipv4|1.0.0.0|256|20110811|assigned|A91872ED
apnic|CN|ipv4|1.0.10.0|512|20110414|allocated|A92E1062
apnic|JP|ipv6|2001:200::|35|19990813|allocated|A91D94D7
",
    },
    Fixture {
        registry: "arin",
        last_modified: "Mon, 01 Jan 2024 02:00:00 GMT",
        body: "\
2.3|arin|1704067200000|3|19700101|20231231|-0500
arin|*|asn|*|1|summary
arin|*|ipv4|*|2|summary
arin|US|asn|1|1|20180308|assigned|7b5c3f0e
arin|US|ipv4|3.0.0.0|16777216|19940509|allocated|a7d6a4e0
arin|US|ipv4|185.0.0.0|256|20200101|assigned|d3ad0001
",
    },
    Fixture {
        registry: "lacnic",
        last_modified: "Mon, 01 Jan 2024 03:00:00 GMT",
        body: "\
2|lacnic|20240101|3|19870101|20231231|-0300
lacnic|*|asn|*|1|summary
lacnic|*|ipv4|*|2|summary
lacnic|BR|asn|1916|1|19960617|allocated|47921
lacnic|BR|ipv4|143.54.0.0|65536|19900101|allocated|43512
lacnic||ipv4|179.0.0.0|1024||available
",
    },
    Fixture {
        registry: "ripencc",
        last_modified: "Mon, 01 Jan 2024 05:00:00 GMT",
        body: "\
2|ripencc|1704067200|3|19830705|20231231|+0100
ripencc|*|ipv4|*|3|summary
ripencc|*|asn|*|0|summary
ripencc|FR|ipv4|2.0.0.0|1048576|20100712|allocated|2b5d9bba
ripencc|NL|ipv4|185.0.0.0|1024|20120904|allocated|e8b8a6d9
ripencc|DE|ipv4|2.16.0.0|8192|20101006|allocated|0af3c1d2
",
    },
];

pub fn canonical_path(registry: &str) -> String {
    format!("/{registry}/delegated-{registry}-extended-latest")
}

pub fn dated_path(registry: &str, date: &str) -> String {
    format!("/{registry}/delegated-{registry}-extended-{date}")
}

pub fn source_urls(server: &MockServer) -> Vec<String> {
    FIXTURES
        .iter()
        .map(|f| format!("{}{}", server.uri(), canonical_path(f.registry)))
        .collect()
}

pub fn response(fixture: &Fixture) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_string(fixture.body)
        .insert_header("Last-Modified", fixture.last_modified)
}

/// Serve every fixture under its canonical `latest` path
pub async fn mount_all(server: &MockServer) {
    for fixture in &FIXTURES {
        Mock::given(method("GET"))
            .and(path(canonical_path(fixture.registry)))
            .respond_with(response(fixture))
            .mount(server)
            .await;
    }
}
