use std::fmt::Write as _;

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use ops_mcp_rs::transport::decode;
use ops_mcp_rs::xml::{normalize_document, parse_document};

fn sample_search_response(results: usize) -> String {
    let mut xml = String::from(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<ops:world-patent-data xmlns:ops="http://ops.epo.org" xmlns="http://www.epo.org/exchange">
<ops:biblio-search total-result-count="10000">
<ops:query syntax="CQL">ti=solar</ops:query>
<ops:search-result>"#,
    );
    for i in 0..results {
        let _ = write!(
            xml,
            r#"<ops:publication-reference family-id="{i}" system="ops.epo.org">
<document-id document-id-type="docdb">
<country>EP</country><doc-number>{}</doc-number><kind>A1</kind>
</document-id>
<invention-title lang="en">Solar collector &amp; mounting {i}</invention-title>
</ops:publication-reference>"#,
            1_000_000 + i
        );
    }
    xml.push_str("</ops:search-result></ops:biblio-search></ops:world-patent-data>");
    xml
}

fn bench_normalize(c: &mut Criterion) {
    let small = sample_search_response(25);
    let large = sample_search_response(2_000);

    c.bench_function("parse_normalize_search_25", |b| {
        b.iter(|| {
            let root = parse_document(black_box(&small)).unwrap();
            black_box(normalize_document(&root));
        });
    });

    c.bench_function("parse_normalize_search_2000", |b| {
        b.iter(|| {
            let root = parse_document(black_box(&large)).unwrap();
            black_box(normalize_document(&root));
        });
    });

    let root = parse_document(&large).unwrap();
    c.bench_function("normalize_to_json_search_2000", |b| {
        b.iter(|| black_box(normalize_document(black_box(&root)).to_document_json()));
    });

    c.bench_function("decode_malformed_passthrough", |b| {
        let broken = &large[..large.len() / 2];
        b.iter(|| black_box(decode(black_box(broken), Some("application/xml"))));
    });
}

criterion_group!(benches, bench_normalize);
criterion_main!(benches);
