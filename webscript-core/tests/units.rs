use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use webscript_core::error::DiagnosticCategory;
use webscript_core::{compile_source, DiagnosticKind};

#[derive(Debug, Deserialize)]
#[serde(tag = "expect", rename_all = "lowercase")]
enum SampleMetadata {
    Ok {
        #[serde(default)]
        body_contains: Vec<String>,
        #[serde(default)]
        headers_contains: Vec<String>,
    },
    Error {
        message_contains: String,
        #[serde(default)]
        category: Option<String>,
    },
}

struct SampleCase {
    name: String,
    source: String,
    metadata: SampleMetadata,
}

fn samples_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("samples")
}

fn load_samples(subdir: &str) -> Vec<SampleCase> {
    let mut dir = samples_root();
    dir.push(subdir);

    let mut entries: Vec<_> = fs::read_dir(&dir)
        .unwrap_or_else(|err| panic!("failed to read {:?}: {}", dir, err))
        .filter_map(|entry| {
            let entry = entry.ok()?;
            let path = entry.path();
            if path.extension().map_or(false, |ext| ext == "wps") {
                Some(path)
            } else {
                None
            }
        })
        .collect();
    entries.sort();

    entries
        .into_iter()
        .map(|path| {
            let source = fs::read_to_string(&path)
                .unwrap_or_else(|err| panic!("failed to read {:?}: {}", path, err));
            let metadata_path = path.with_extension("wps.meta.json");
            let metadata_str = fs::read_to_string(&metadata_path).unwrap_or_else(|err| {
                panic!(
                    "failed to read metadata for {:?}: {}",
                    path.file_name().unwrap(),
                    err
                )
            });
            let metadata: SampleMetadata =
                serde_json::from_str(&metadata_str).unwrap_or_else(|err| {
                    panic!(
                        "failed to parse metadata JSON for {:?}: {}",
                        metadata_path, err
                    )
                });
            SampleCase {
                name: path
                    .file_name()
                    .map(|os| os.to_string_lossy().into_owned())
                    .unwrap_or_else(|| path.display().to_string()),
                source,
                metadata,
            }
        })
        .collect()
}

fn category_name(category: DiagnosticCategory) -> &'static str {
    match category {
        DiagnosticCategory::Lex => "lex",
        DiagnosticCategory::Syntax => "syntax",
        DiagnosticCategory::Context => "context",
        DiagnosticCategory::Semantic => "semantic",
    }
}

#[test]
fn passing_samples_match_metadata() {
    for sample in load_samples("passing") {
        let (body_expect, headers_expect) = match sample.metadata {
            SampleMetadata::Ok {
                body_contains,
                headers_contains,
            } => (body_contains, headers_contains),
            SampleMetadata::Error { .. } => panic!(
                "sample {} is marked as error metadata but located in passing directory",
                sample.name
            ),
        };

        let unit = compile_source(&sample.source);
        if unit.had_error {
            panic!(
                "expected {} to compile cleanly, got diagnostics: {:?}",
                sample.name,
                unit.diagnostics
                    .iter()
                    .map(|d| &d.message)
                    .collect::<Vec<_>>()
            );
        }

        for expected in &body_expect {
            assert!(
                unit.body.contains(expected),
                "body of {} did not contain {:?}:\n{}",
                sample.name,
                expected,
                unit.body
            );
        }
        for expected in &headers_expect {
            assert!(
                unit.headers.contains(expected),
                "headers of {} did not contain {:?}:\n{}",
                sample.name,
                expected,
                unit.headers
            );
        }
    }
}

#[test]
fn failing_samples_match_metadata() {
    for sample in load_samples("failing") {
        let (message_expect, category_expect) = match sample.metadata {
            SampleMetadata::Error {
                message_contains,
                category,
            } => (message_contains, category),
            SampleMetadata::Ok { .. } => panic!(
                "sample {} is marked as ok metadata but located in failing directory",
                sample.name
            ),
        };

        let unit = compile_source(&sample.source);
        assert!(
            unit.had_error,
            "expected {} to report an error, got none",
            sample.name
        );

        let matched = unit.diagnostics.iter().any(|d| {
            d.kind == DiagnosticKind::Error
                && d.message.contains(&message_expect)
                && category_expect
                    .as_deref()
                    .map_or(true, |expected| category_name(d.category) == expected)
        });
        assert!(
            matched,
            "no diagnostic of {} matched {:?} (category {:?}). Diagnostics: {:?}",
            sample.name,
            message_expect,
            category_expect,
            unit.diagnostics
                .iter()
                .map(|d| (d.category, &d.message))
                .collect::<Vec<_>>()
        );
    }
}
