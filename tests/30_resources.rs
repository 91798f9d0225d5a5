mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::{json, Value};

use common::{id_of, unique};

#[tokio::test]
async fn create_returns_201_with_generated_id() -> Result<()> {
    let Some(server) = common::database_server().await? else { return Ok(()) };

    let name = unique("County");
    let row = server.create("/api/counties", json!({"name": name, "code": "047"})).await?;
    assert!(row["id"].as_i64().is_some(), "{}", row);
    assert_eq!(row["name"], name.as_str());
    assert_eq!(row["code"], "047");
    assert_eq!(row["voided"], false);
    assert!(row["createdAt"].is_string());
    Ok(())
}

#[tokio::test]
async fn second_delete_is_404() -> Result<()> {
    let Some(server) = common::database_server().await? else { return Ok(()) };

    let row = server.create("/api/contractors", json!({"companyName": unique("Builders")})).await?;
    let path = format!("/api/contractors/{}", id_of(&row));

    assert_eq!(server.delete(&path).await?.status(), StatusCode::NO_CONTENT);
    assert_eq!(server.delete(&path).await?.status(), StatusCode::NOT_FOUND);
    assert_eq!(server.get(&path).await?.status(), StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn children_of_missing_parent_is_empty() -> Result<()> {
    let Some(server) = common::database_server().await? else { return Ok(()) };

    let res = server.get("/api/counties/987654321/subcounties").await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await?;
    assert_eq!(body, json!([]));
    Ok(())
}

#[tokio::test]
async fn update_replaces_supplied_fields_only() -> Result<()> {
    let Some(server) = common::database_server().await? else { return Ok(()) };

    let row = server
        .create("/api/departments", json!({"name": unique("Health"), "alias": "MOH", "location": "HQ"}))
        .await?;
    let path = format!("/api/departments/{}", id_of(&row));

    let res = server.put_json(&path, &json!({"location": "Annex"})).await?;
    assert_eq!(res.status(), StatusCode::OK);
    let updated: Value = res.json().await?;
    assert_eq!(updated["location"], "Annex");
    assert_eq!(updated["alias"], "MOH");

    assert_eq!(
        server.put_json("/api/departments/987654321", &json!({"alias": "X"})).await?.status(),
        StatusCode::NOT_FOUND
    );
    Ok(())
}

#[tokio::test]
async fn list_filters_by_column_and_hides_voided_rows() -> Result<()> {
    let Some(server) = common::database_server().await? else { return Ok(()) };

    let county = server.create("/api/counties", json!({"name": unique("Parent")})).await?;
    let county_id = id_of(&county);
    let kept = server.create("/api/subcounties", json!({"countyId": county_id, "name": "Kept"})).await?;
    let dropped = server.create("/api/subcounties", json!({"countyId": county_id, "name": "Dropped"})).await?;
    server.delete(&format!("/api/subcounties/{}", id_of(&dropped))).await?;

    let res = server.get(&format!("/api/subcounties?countyId={}", county_id)).await?;
    assert_eq!(res.status(), StatusCode::OK);
    let rows: Vec<Value> = res.json().await?;
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["id"], kept["id"]);

    let children: Vec<Value> = server.get(&format!("/api/counties/{}/subcounties", county_id)).await?.json().await?;
    assert_eq!(children, rows);
    Ok(())
}

#[tokio::test]
async fn find_supports_operators() -> Result<()> {
    let Some(server) = common::database_server().await? else { return Ok(()) };

    let tag = unique("Find");
    for name in ["Alpha", "Beta", "Gamma"] {
        server
            .create("/api/contractors", json!({"companyName": format!("{} {}", tag, name)}))
            .await?;
    }

    let res = server
        .post_json(
            "/api/find/contractors",
            &json!({
                "where": {"companyName": {"$like": format!("{}%", tag)}, "$not": {"companyName": {"$like": "%Beta"}}},
                "order": "companyName desc",
                "limit": 5
            }),
        )
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let rows: Vec<Value> = res.json().await?;
    let names: Vec<&str> = rows.iter().filter_map(|r| r["companyName"].as_str()).collect();
    assert_eq!(names, vec![format!("{} Gamma", tag), format!("{} Alpha", tag)]);
    Ok(())
}

#[tokio::test]
async fn bad_date_text_is_400() -> Result<()> {
    let Some(server) = common::database_server().await? else { return Ok(()) };

    let res = server
        .post_json("/api/projects", &json!({"projectName": unique("Road"), "startDate": "not a date"}))
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn appointment_schedules_get_text_ids() -> Result<()> {
    let Some(server) = common::database_server().await? else { return Ok(()) };

    let project = server.create("/api/projects", json!({"projectName": unique("Clinic")})).await?;
    let activity = server
        .create("/api/activities", json!({"projectId": id_of(&project), "activityName": "Site visit"}))
        .await?;
    let schedule = server
        .create(
            "/api/appointment-schedules",
            json!({"activityId": id_of(&activity), "title": "Kickoff", "startTime": "2024-03-01T09:00:00Z"}),
        )
        .await?;
    let id = schedule["id"].as_str().unwrap_or_default().to_string();
    let (millis, suffix) = id.split_once('-').unwrap_or_default();
    assert!(millis.parse::<i64>().is_ok(), "{}", id);
    assert_eq!(suffix.len(), 6);

    let res = server.get(&format!("/api/appointment-schedules/{}", id)).await?;
    assert_eq!(res.status(), StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn child_of_missing_parent_is_404() -> Result<()> {
    let Some(server) = common::database_server().await? else { return Ok(()) };

    let res = server
        .post_json("/api/subcounties", &json!({"countyId": 987654321, "name": unique("Orphan")}))
        .await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let body: Value = res.json().await?;
    assert_eq!(body["code"], "NOT_FOUND");
    Ok(())
}
