mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::{json, Value};

use common::{id_of, unique};

#[tokio::test]
async fn duplicate_contractor_assignment_is_409() -> Result<()> {
    let Some(server) = common::database_server().await? else { return Ok(()) };

    let project = server.create("/api/projects", json!({"projectName": unique("Bridge")})).await?;
    let contractor = server.create("/api/contractors", json!({"companyName": unique("Steelworks")})).await?;
    let path = format!("/api/projects/{}/contractors", id_of(&project));
    let body = json!({"contractorId": id_of(&contractor)});

    assert_eq!(server.post_json(&path, &body).await?.status(), StatusCode::CREATED);
    let res = server.post_json(&path, &body).await?;
    assert_eq!(res.status(), StatusCode::CONFLICT);
    let error: Value = res.json().await?;
    assert_eq!(error["code"], "CONFLICT");

    let linked: Vec<Value> = server.get(&path).await?.json().await?;
    assert_eq!(linked.len(), 1);
    assert_eq!(linked[0]["id"], contractor["id"]);

    let unlink = format!("{}/{}", path, id_of(&contractor));
    assert_eq!(server.delete(&unlink).await?.status(), StatusCode::NO_CONTENT);
    assert_eq!(server.delete(&unlink).await?.status(), StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn failed_milestone_link_rolls_back_activity() -> Result<()> {
    let Some(server) = common::database_server().await? else { return Ok(()) };

    let project = server.create("/api/projects", json!({"projectName": unique("Borehole")})).await?;
    let project_id = id_of(&project);

    let res = server
        .post_json(
            "/api/activities",
            &json!({"projectId": project_id, "activityName": "Drilling", "milestoneIds": [987654321]}),
        )
        .await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let activities: Vec<Value> = server
        .get(&format!("/api/projects/{}/activities", project_id))
        .await?
        .json()
        .await?;
    assert!(activities.is_empty(), "activity survived rollback: {:?}", activities);
    Ok(())
}

#[tokio::test]
async fn activity_milestones_are_linked_and_replaced() -> Result<()> {
    let Some(server) = common::database_server().await? else { return Ok(()) };

    let project = server.create("/api/projects", json!({"projectName": unique("Market")})).await?;
    let project_id = id_of(&project);
    let first = server
        .create("/api/milestones", json!({"projectId": project_id, "milestoneName": "Design"}))
        .await?;
    let second = server
        .create("/api/milestones", json!({"projectId": project_id, "milestoneName": "Build"}))
        .await?;

    let activity = server
        .create(
            "/api/activities",
            json!({"projectId": project_id, "activityName": "Tender", "milestoneIds": [id_of(&first)]}),
        )
        .await?;
    assert_eq!(activity["milestoneIds"], json!([id_of(&first)]));
    let activity_id = id_of(&activity);

    let res = server
        .put_json(&format!("/api/activities/{}", activity_id), &json!({"milestoneIds": [id_of(&second)]}))
        .await?;
    assert_eq!(res.status(), StatusCode::OK);

    let linked: Vec<Value> = server
        .get(&format!("/api/activities/{}/milestones", activity_id))
        .await?
        .json()
        .await?;
    let ids: Vec<i64> = linked.iter().map(id_of).collect();
    assert_eq!(ids, vec![id_of(&second)]);
    Ok(())
}

#[tokio::test]
async fn project_create_instantiates_category_milestones() -> Result<()> {
    let Some(server) = common::database_server().await? else { return Ok(()) };

    let category = server
        .create("/api/project-categories", json!({"categoryName": unique("Roads")}))
        .await?;
    let category_id = id_of(&category);
    for (order, name) in [(1, "Survey"), (2, "Grading"), (3, "Tarmac")] {
        server
            .create(
                "/api/category-milestones",
                json!({"categoryId": category_id, "milestoneName": name, "sequenceOrder": order}),
            )
            .await?;
    }

    let project = server
        .create("/api/projects", json!({"projectName": unique("Link road"), "categoryId": category_id}))
        .await?;
    assert_eq!(project["milestonesCreated"], 3);
    let project_id = id_of(&project);

    let milestones: Vec<Value> = server
        .get(&format!("/api/projects/{}/milestones", project_id))
        .await?
        .json()
        .await?;
    let names: Vec<&str> = milestones.iter().filter_map(|m| m["milestoneName"].as_str()).collect();
    assert_eq!(names, vec!["Survey", "Grading", "Tarmac"]);

    // Applying again only fills in names the project lacks
    let res = server
        .post_json(&format!("/api/projects/{}/apply-category-milestones", project_id), &json!({}))
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await?;
    assert_eq!(body["milestonesCreated"], 0);
    Ok(())
}

#[tokio::test]
async fn project_area_links_drive_list_filters() -> Result<()> {
    let Some(server) = common::database_server().await? else { return Ok(()) };

    let county = server.create("/api/counties", json!({"name": unique("Area")})).await?;
    let county_id = id_of(&county);
    let linked = server
        .create("/api/projects", json!({"projectName": unique("Linked"), "countyIds": [county_id]}))
        .await?;
    server.create("/api/projects", json!({"projectName": unique("Elsewhere")})).await?;

    let rows: Vec<Value> = server
        .get(&format!("/api/projects?countyId={}", county_id))
        .await?
        .json()
        .await?;
    let ids: Vec<i64> = rows.iter().map(id_of).collect();
    assert_eq!(ids, vec![id_of(&linked)]);

    let counties: Vec<Value> = server
        .get(&format!("/api/projects/{}/counties", id_of(&linked)))
        .await?
        .json()
        .await?;
    assert_eq!(counties.len(), 1);
    assert_eq!(counties[0]["id"], county["id"]);
    Ok(())
}

#[tokio::test]
async fn deleting_a_plan_voids_its_programs() -> Result<()> {
    let Some(server) = common::database_server().await? else { return Ok(()) };

    let plan = server
        .create("/api/strategic-plans", json!({"cidpId": unique("CIDP"), "cidpName": "Plan"}))
        .await?;
    let program = server
        .create("/api/programs", json!({"strategicPlanId": id_of(&plan), "programme": "Water"}))
        .await?;
    let subprogram = server
        .create("/api/subprograms", json!({"programId": id_of(&program), "subProgramme": "Boreholes"}))
        .await?;

    let res = server.delete(&format!("/api/strategic-plans/{}", id_of(&plan))).await?;
    assert_eq!(res.status(), StatusCode::NO_CONTENT);
    assert_eq!(
        server.get(&format!("/api/programs/{}", id_of(&program))).await?.status(),
        StatusCode::NOT_FOUND
    );
    assert_eq!(
        server.get(&format!("/api/subprograms/{}", id_of(&subprogram))).await?.status(),
        StatusCode::NOT_FOUND
    );
    let remaining: Vec<Value> = server
        .get(&format!("/api/programs/{}/subprograms", id_of(&program)))
        .await?
        .json()
        .await?;
    assert!(remaining.is_empty(), "{:?}", remaining);
    Ok(())
}

#[tokio::test]
async fn deleting_a_project_voids_milestones_and_maps() -> Result<()> {
    let Some(server) = common::database_server().await? else { return Ok(()) };

    let project = server.create("/api/projects", json!({"projectName": unique("Market")})).await?;
    let project_id = id_of(&project);
    server
        .create("/api/milestones", json!({"projectId": project_id, "milestoneName": "Foundation"}))
        .await?;
    server
        .create(
            "/api/project-maps",
            json!({"projectId": project_id, "map": r#"{"type":"Point","coordinates":[36.8,-1.3]}"#}),
        )
        .await?;

    let res = server.delete(&format!("/api/projects/{}", project_id)).await?;
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    let milestones: Vec<Value> = server
        .get(&format!("/api/projects/{}/milestones", project_id))
        .await?
        .json()
        .await?;
    assert!(milestones.is_empty(), "{:?}", milestones);

    let maps: Value = server.get(&format!("/api/projects/{}/maps", project_id)).await?.json().await?;
    assert_eq!(maps, json!({"data": [], "boundingBox": null}));
    Ok(())
}

#[tokio::test]
async fn linking_missing_rows_is_404() -> Result<()> {
    let Some(server) = common::database_server().await? else { return Ok(()) };

    let project = server.create("/api/projects", json!({"projectName": unique("Jetty")})).await?;
    let contractor = server.create("/api/contractors", json!({"companyName": unique("Marine")})).await?;

    let res = server
        .post_json("/api/projects/987654321/contractors", &json!({"contractorId": id_of(&contractor)}))
        .await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let path = format!("/api/projects/{}/contractors", id_of(&project));
    let res = server.post_json(&path, &json!({"contractorId": 987654321})).await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn voided_contractor_cannot_be_linked() -> Result<()> {
    let Some(server) = common::database_server().await? else { return Ok(()) };

    let project = server.create("/api/projects", json!({"projectName": unique("Pier")})).await?;
    let contractor = server.create("/api/contractors", json!({"companyName": unique("Gone Ltd")})).await?;
    let res = server.delete(&format!("/api/contractors/{}", id_of(&contractor))).await?;
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    let path = format!("/api/projects/{}/contractors", id_of(&project));
    let res = server.post_json(&path, &json!({"contractorId": id_of(&contractor)})).await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let linked: Vec<Value> = server.get(&path).await?.json().await?;
    assert!(linked.is_empty(), "{:?}", linked);
    Ok(())
}
