mod common;

use anyhow::Result;
use reqwest::multipart::{Form, Part};
use reqwest::StatusCode;
use serde_json::Value;

const TEMPLATE: &str = "templates/cidp_import_template.xlsx";

#[tokio::test]
async fn template_downloads_as_xlsx() -> Result<()> {
    let server = common::offline_server().await?;
    let res = server.get("/api/planning/template").await?;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(
        res.headers()["content-type"],
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
    );
    assert!(res.headers()["content-disposition"].to_str()?.starts_with("attachment"));
    let bytes = res.bytes().await?;
    assert_eq!(&bytes[..2], b"PK");
    Ok(())
}

#[tokio::test]
async fn preview_maps_template_headers() -> Result<()> {
    let server = common::offline_server().await?;
    let bytes = std::fs::read(TEMPLATE)?;
    let form = Form::new().part("file", Part::bytes(bytes).file_name("cidp.xlsx"));
    let res = server
        .client
        .post(server.url("/api/planning/import-cidp"))
        .multipart(form)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);

    let body: Value = res.json().await?;
    assert_eq!(body["unrecognizedHeaders"], serde_json::json!([]), "{}", body);
    assert_eq!(body["fullData"].as_array().map(Vec::len), Some(1));
    let row = &body["previewData"][0];
    assert_eq!(row["cidpId"], "CIDP-2023");
    assert_eq!(row["programme"], "Health Services");
    assert_eq!(row["subProgramme"], "Primary Health Care");
    assert_eq!(row["totalBudget"].as_f64(), Some(50_000_000.0));
    Ok(())
}

#[tokio::test]
async fn preview_without_file_is_400() -> Result<()> {
    let server = common::offline_server().await?;
    let form = Form::new().text("description", "no file here");
    let res = server
        .client
        .post(server.url("/api/planning/import-cidp"))
        .multipart(form)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn preview_rejects_non_spreadsheets() -> Result<()> {
    let server = common::offline_server().await?;
    let form = Form::new().part("file", Part::bytes(b"just some text".to_vec()).file_name("notes.xlsx"));
    let res = server
        .client
        .post(server.url("/api/planning/import-cidp"))
        .multipart(form)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    Ok(())
}
