//! End-to-end integration tests for docshuttle.
//!
//! Local directions (spreadsheet ⇄ csv, pdf → docx) run entirely
//! in-process with fixtures built on the fly. The remote docx → pdf
//! direction is tested against a mockito server; tests that hit the real
//! conversion service are gated behind `E2E_ENABLED` + `CONVERTAPI_SECRET`
//! so they do not run in CI unless explicitly requested.
//!
//! Run with:
//!   cargo test --test e2e -- --nocapture

use base64::{engine::general_purpose::STANDARD, Engine as _};
use docshuttle::{
    convert, convert_bytes, convert_to_file, inspect, ConvertConfig, ConvertError, Direction,
    Format, InspectDetail,
};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Object, Stream};
use rust_xlsxwriter::Workbook;
use std::path::PathBuf;

// ── Test helpers ─────────────────────────────────────────────────────────────

/// Build a small workbook with a header row and two data rows.
fn sample_xlsx() -> Vec<u8> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.write_string(0, 0, "name").unwrap();
    worksheet.write_string(0, 1, "qty").unwrap();
    worksheet.write_string(1, 0, "widget").unwrap();
    worksheet.write_number(1, 1, 2.0).unwrap();
    worksheet.write_string(2, 0, "gadget").unwrap();
    worksheet.write_number(2, 1, 3.5).unwrap();
    workbook.save_to_buffer().expect("fixture workbook")
}

const SAMPLE_CSV: &str = "name,qty\nwidget,2\ngadget,3.5\n";

/// Build a minimal one-page PDF containing the given line of text.
fn sample_pdf(text: &str) -> Vec<u8> {
    let mut doc = lopdf::Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });
    let content = Content {
        operations: vec![
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec!["F1".into(), 24.into()]),
            Operation::new("Td", vec![100.into(), 600.into()]),
            Operation::new("Tj", vec![Object::string_literal(text)]),
            Operation::new("ET", vec![]),
        ],
    };
    let content_id = doc.add_object(Stream::new(
        dictionary! {},
        content.encode().expect("encode content"),
    ));
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
    });
    let pages = dictionary! {
        "Type" => "Pages",
        "Kids" => vec![page_id.into()],
        "Count" => 1,
        "Resources" => resources_id,
        "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages));
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.compress();

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).expect("serialise pdf");
    bytes
}

/// A fake docx upload: only the magic bytes matter, the remote mock never
/// parses the container.
fn fake_docx() -> Vec<u8> {
    let mut bytes = b"PK\x03\x04".to_vec();
    bytes.extend_from_slice(&[0u8; 60]);
    bytes
}

// ── Round-trip (spreadsheet ⇄ csv) ───────────────────────────────────────────

#[tokio::test]
async fn xlsx_to_csv_extracts_tabular_content() {
    let output = convert_bytes(
        sample_xlsx(),
        "inventory.xlsx",
        Direction::XlsxToCsv,
        &ConvertConfig::default(),
    )
    .await
    .expect("conversion should succeed");

    assert_eq!(output.filename, "inventory.csv");
    assert_eq!(output.mime_type, "text/csv");
    assert_eq!(String::from_utf8(output.bytes).unwrap(), SAMPLE_CSV);

    let preview = output.preview.expect("tabular direction has a preview");
    assert_eq!(preview.rows[0], vec!["name", "qty"]);
    assert!(!preview.truncated);
}

#[tokio::test]
async fn csv_to_xlsx_to_csv_roundtrips_content() {
    let config = ConvertConfig::default();

    let xlsx = convert_bytes(
        SAMPLE_CSV.as_bytes().to_vec(),
        "inventory.csv",
        Direction::CsvToXlsx,
        &config,
    )
    .await
    .expect("csv→xlsx should succeed");
    assert_eq!(xlsx.filename, "inventory.xlsx");
    assert_eq!(&xlsx.bytes[..4], b"PK\x03\x04");

    let back = convert_bytes(xlsx.bytes, "inventory.xlsx", Direction::XlsxToCsv, &config)
        .await
        .expect("xlsx→csv should succeed");
    assert_eq!(String::from_utf8(back.bytes).unwrap(), SAMPLE_CSV);
}

#[tokio::test]
async fn preview_respects_row_limit_and_disable() {
    let config = ConvertConfig::builder().preview_rows(1).build().unwrap();
    let output = convert_bytes(
        sample_xlsx(),
        "inventory.xlsx",
        Direction::XlsxToCsv,
        &config,
    )
    .await
    .unwrap();
    let preview = output.preview.unwrap();
    assert_eq!(preview.rows.len(), 1);
    assert!(preview.truncated);

    let config = ConvertConfig::builder().preview_rows(0).build().unwrap();
    let output = convert_bytes(
        sample_xlsx(),
        "inventory.xlsx",
        Direction::XlsxToCsv,
        &config,
    )
    .await
    .unwrap();
    assert!(output.preview.is_none());
}

// ── Extension filtering ──────────────────────────────────────────────────────

#[tokio::test]
async fn each_direction_rejects_inputs_outside_its_allow_list() {
    let config = ConvertConfig::default();
    let cases = [
        (Direction::XlsxToCsv, "data.csv"),
        (Direction::CsvToXlsx, "book.xlsx"),
        (Direction::DocxToPdf, "paper.pdf"),
        (Direction::PdfToDocx, "letter.docx"),
    ];

    for (direction, name) in cases {
        let err = convert_bytes(vec![0u8; 16], name, direction, &config)
            .await
            .unwrap_err();
        assert!(
            matches!(err, ConvertError::UnsupportedExtension { .. }),
            "{direction}: expected UnsupportedExtension for '{name}', got {err:?}"
        );
    }
}

#[tokio::test]
async fn allow_list_fires_before_any_file_access() {
    // The path does not exist; a FileNotFound here would mean the
    // allow-list check ran too late.
    let err = convert(
        "/definitely/not/here.docx",
        Direction::XlsxToCsv,
        &ConvertConfig::default(),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, ConvertError::UnsupportedExtension { .. }));
}

// ── File-based conversion & atomic delivery ──────────────────────────────────

#[tokio::test]
async fn convert_to_file_writes_the_artifact() {
    let dir = tempfile::tempdir().unwrap();
    let input_path = dir.path().join("inventory.xlsx");
    std::fs::write(&input_path, sample_xlsx()).unwrap();
    let output_path = dir.path().join("out/inventory.csv");

    let output = convert_to_file(
        input_path.to_str().unwrap(),
        &output_path,
        Direction::XlsxToCsv,
        &ConvertConfig::default(),
    )
    .await
    .expect("conversion should succeed");

    assert_eq!(std::fs::read_to_string(&output_path).unwrap(), SAMPLE_CSV);
    assert_eq!(output.stats.output_bytes, SAMPLE_CSV.len() as u64);
    assert!(!dir.path().join("out/inventory.tmp").exists());
}

#[tokio::test]
async fn local_xlsx_with_wrong_magic_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let input_path = dir.path().join("fake.xlsx");
    std::fs::write(&input_path, b"this is not a zip container").unwrap();

    let err = convert(
        input_path.to_str().unwrap(),
        Direction::XlsxToCsv,
        &ConvertConfig::default(),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, ConvertError::FormatMismatch { .. }));
}

// ── PDF → DOCX (local document backend) ──────────────────────────────────────

#[tokio::test]
async fn pdf_to_docx_produces_a_document() {
    let output = convert_bytes(
        sample_pdf("Quarterly results were strong"),
        "report.pdf",
        Direction::PdfToDocx,
        &ConvertConfig::default(),
    )
    .await
    .expect("conversion should succeed");

    assert_eq!(output.filename, "report.docx");
    assert_eq!(
        output.mime_type,
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
    );
    assert_eq!(&output.bytes[..4], b"PK\x03\x04");
    assert!(output.preview.is_none(), "document output has no preview");
    assert_eq!(output.stats.backend, "lopdf+docx-rust");
}

// ── Temporary file lifecycle ─────────────────────────────────────────────────

#[tokio::test]
async fn downloaded_inputs_are_removed_after_the_conversion() {
    use docshuttle::pipeline::input;

    let mut server = mockito::Server::new_async().await;
    let _m = server
        .mock("GET", "/inventory.csv")
        .with_body(SAMPLE_CSV)
        .create_async()
        .await;

    let url = format!("{}/inventory.csv", server.url());
    let resolved = input::resolve(&url, Some(Format::Csv), 10)
        .await
        .expect("download should succeed");
    let scratch_path = resolved.path().to_path_buf();
    assert!(scratch_path.exists(), "scratch file exists while resolved");
    assert_eq!(resolved.file_name(), "inventory.csv");

    drop(resolved);
    assert!(
        !scratch_path.exists(),
        "scratch file must be removed on drop"
    );
}

#[tokio::test]
async fn url_input_converts_end_to_end() {
    let mut server = mockito::Server::new_async().await;
    let _m = server
        .mock("GET", "/inventory.csv")
        .with_body(SAMPLE_CSV)
        .create_async()
        .await;

    let url = format!("{}/inventory.csv", server.url());
    let output = convert(&url, Direction::CsvToXlsx, &ConvertConfig::default())
        .await
        .expect("URL conversion should succeed");
    assert_eq!(output.filename, "inventory.xlsx");
    assert_eq!(&output.bytes[..4], b"PK\x03\x04");
}

// ── Remote conversion API (mockito) ──────────────────────────────────────────

fn remote_config(server: &mockito::ServerGuard) -> ConvertConfig {
    ConvertConfig::builder()
        .api_base_url(server.url())
        .api_secret("test-key")
        .max_retries(0)
        .retry_backoff_ms(1)
        .build()
        .unwrap()
}

#[tokio::test]
async fn remote_failure_surfaces_and_produces_no_artifact() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/convert/docx/to/pdf")
        .match_query(mockito::Matcher::UrlEncoded(
            "secret".into(),
            "test-key".into(),
        ))
        .with_status(500)
        .with_body("conversion backend exploded")
        .create_async()
        .await;

    let err = convert_bytes(
        fake_docx(),
        "letter.docx",
        Direction::DocxToPdf,
        &remote_config(&server),
    )
    .await
    .unwrap_err();

    match err {
        ConvertError::RemoteApi { status, body } => {
            assert_eq!(status, 500);
            assert!(body.contains("exploded"));
        }
        other => panic!("expected RemoteApi, got {other:?}"),
    }
    mock.assert_async().await;
}

#[tokio::test]
async fn remote_client_errors_are_not_retried() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/convert/docx/to/pdf")
        .match_query(mockito::Matcher::Any)
        .with_status(401)
        .with_body("bad secret")
        .expect(1)
        .create_async()
        .await;

    let config = ConvertConfig::builder()
        .api_base_url(server.url())
        .api_secret("wrong-key")
        .max_retries(3)
        .retry_backoff_ms(1)
        .build()
        .unwrap();

    let err = convert_bytes(fake_docx(), "letter.docx", Direction::DocxToPdf, &config)
        .await
        .unwrap_err();
    assert!(matches!(err, ConvertError::RemoteApi { status: 401, .. }));
    mock.assert_async().await;
}

#[tokio::test]
async fn remote_server_errors_are_retried() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/convert/docx/to/pdf")
        .match_query(mockito::Matcher::Any)
        .with_status(503)
        .expect(3) // initial attempt + 2 retries
        .create_async()
        .await;

    let config = ConvertConfig::builder()
        .api_base_url(server.url())
        .api_secret("test-key")
        .max_retries(2)
        .retry_backoff_ms(1)
        .build()
        .unwrap();

    let err = convert_bytes(fake_docx(), "letter.docx", Direction::DocxToPdf, &config)
        .await
        .unwrap_err();
    assert!(matches!(err, ConvertError::RemoteApi { status: 503, .. }));
    mock.assert_async().await;
}

#[tokio::test]
async fn remote_success_with_inline_file_data() {
    let pdf_bytes = b"%PDF-1.4 fake but good enough".to_vec();
    let mut server = mockito::Server::new_async().await;
    let _m = server
        .mock("POST", "/convert/docx/to/pdf")
        .match_query(mockito::Matcher::Any)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(format!(
            r#"{{"Files":[{{"FileName":"letter.pdf","FileData":"{}"}}]}}"#,
            STANDARD.encode(&pdf_bytes)
        ))
        .create_async()
        .await;

    let output = convert_bytes(
        fake_docx(),
        "letter.docx",
        Direction::DocxToPdf,
        &remote_config(&server),
    )
    .await
    .expect("remote conversion should succeed");

    assert_eq!(output.filename, "letter.pdf");
    assert_eq!(output.mime_type, "application/pdf");
    assert_eq!(output.bytes, pdf_bytes);
    assert_eq!(output.stats.backend, "remote-api");
}

#[tokio::test]
async fn remote_success_with_result_url() {
    let pdf_bytes = b"%PDF-1.4 fetched from result url".to_vec();
    let mut server = mockito::Server::new_async().await;
    let _artifact = server
        .mock("GET", "/artifacts/letter.pdf")
        .with_body(pdf_bytes.clone())
        .create_async()
        .await;
    let _convert = server
        .mock("POST", "/convert/docx/to/pdf")
        .match_query(mockito::Matcher::Any)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(format!(
            r#"{{"Files":[{{"FileName":"letter.pdf","Url":"{}/artifacts/letter.pdf"}}]}}"#,
            server.url()
        ))
        .create_async()
        .await;

    let output = convert_bytes(
        fake_docx(),
        "letter.docx",
        Direction::DocxToPdf,
        &remote_config(&server),
    )
    .await
    .expect("remote conversion should succeed");
    assert_eq!(output.bytes, pdf_bytes);
}

#[tokio::test]
async fn remote_without_secret_fails_before_any_request() {
    // No api_secret in config; only meaningful when the environment
    // doesn't provide one either.
    if std::env::var("CONVERTAPI_SECRET").is_ok() {
        println!("SKIP — CONVERTAPI_SECRET is set in this environment");
        return;
    }

    let err = convert_bytes(
        fake_docx(),
        "letter.docx",
        Direction::DocxToPdf,
        &ConvertConfig::default(),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, ConvertError::ApiKeyMissing));
}

// ── Inspect ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn inspect_reports_workbook_structure() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("inventory.xlsx");
    std::fs::write(&path, sample_xlsx()).unwrap();

    let report = inspect(path.to_str().unwrap()).await.unwrap();
    assert_eq!(report.format, Format::Xlsx);
    match report.detail {
        InspectDetail::Spreadsheet { sheets } => {
            assert_eq!(sheets.len(), 1);
            assert_eq!(sheets[0].rows, 3);
            assert_eq!(sheets[0].columns, 2);
        }
        other => panic!("expected Spreadsheet, got {other:?}"),
    }
}

#[tokio::test]
async fn inspect_reports_pdf_pages() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("report.pdf");
    std::fs::write(&path, sample_pdf("hello")).unwrap();

    let report = inspect(path.to_str().unwrap()).await.unwrap();
    assert_eq!(report.format, Format::Pdf);
    match report.detail {
        InspectDetail::Pdf { pages, encrypted } => {
            assert_eq!(pages, 1);
            assert!(!encrypted);
        }
        other => panic!("expected Pdf, got {other:?}"),
    }
}

// ── Live service test (gated) ────────────────────────────────────────────────

/// Requires E2E_ENABLED=1 and CONVERTAPI_SECRET to be set.
#[tokio::test]
async fn live_docx_to_pdf_conversion() {
    if std::env::var("E2E_ENABLED").is_err() {
        println!("SKIP — set E2E_ENABLED=1 and CONVERTAPI_SECRET to run");
        return;
    }
    if std::env::var("CONVERTAPI_SECRET").is_err() {
        println!("SKIP — CONVERTAPI_SECRET not set");
        return;
    }

    let fixture = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("test_cases")
        .join("sample.docx");
    if !fixture.exists() {
        println!("SKIP — test_cases/sample.docx not found");
        return;
    }

    let output = convert(
        fixture.to_str().unwrap(),
        Direction::DocxToPdf,
        &ConvertConfig::default(),
    )
    .await
    .expect("live conversion should succeed");

    assert!(output.bytes.starts_with(b"%PDF"), "artifact must be a PDF");
    assert_eq!(output.filename, "sample.pdf");
    println!(
        "live conversion: {} → {} bytes in {}ms",
        output.stats.input_bytes, output.stats.output_bytes, output.stats.duration_ms
    );
}
