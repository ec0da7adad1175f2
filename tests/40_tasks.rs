mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::{json, Value};

use common::{Session, TestServer};

async fn create_task(server: &TestServer, manager: &Session, assigned_to: Value) -> Result<reqwest::Response> {
    Ok(server
        .client
        .post(server.url("/tasks"))
        .bearer_auth(&manager.token)
        .json(&json!({
            "title": "Quarterly report",
            "description": "Collect the numbers",
            "assignedTo": assigned_to,
            "dueDate": "2030-03-31",
        }))
        .send()
        .await?)
}

async fn task_id(res: reqwest::Response) -> Result<String> {
    let status = res.status();
    let body = res.json::<Value>().await?;
    anyhow::ensure!(status == StatusCode::CREATED, "task create failed ({}): {}", status, body);
    Ok(body["data"]["id"].as_str().unwrap_or_default().to_string())
}

#[tokio::test]
async fn assignee_shapes_store_the_same_set() -> Result<()> {
    let server = TestServer::start().await?;
    let manager = server.employee("Manager").await?;
    let staff = server.employee("Staff").await?;

    for shape in [
        json!(staff.id),
        json!(format!("[\"{}\"]", staff.id)),
        json!([staff.id, staff.id]),
    ] {
        let res = create_task(&server, &manager, shape.clone()).await?;
        assert_eq!(res.status(), StatusCode::CREATED, "shape {}", shape);
        let body = res.json::<Value>().await?;
        let assigned = body["data"]["assignedTo"].as_array().cloned().unwrap_or_default();
        assert_eq!(assigned.len(), 1, "shape {}", shape);
        assert_eq!(assigned[0]["id"], staff.id.as_str());
        assert_eq!(assigned[0]["firstName"], "Ada");
        assert!(assigned[0].get("email").is_none());
        assert_eq!(body["data"]["assignedBy"], manager.id.as_str());
        assert_eq!(body["data"]["deadline"], "2030-03-31T00:00:00.000Z");
        assert_eq!(body["data"]["status"], "Pending");
    }

    Ok(())
}

#[tokio::test]
async fn bad_assignees_are_rejected() -> Result<()> {
    let server = TestServer::start().await?;
    let manager = server.employee("Manager").await?;

    let res = create_task(&server, &manager, json!("someone")).await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = create_task(&server, &manager, json!(["7c9e6679-7425-40de-944b-e07fc1f90ae7"])).await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body = res.json::<Value>().await?;
    assert_eq!(body["fields"][0]["field"], "assignedTo");

    Ok(())
}

#[tokio::test]
async fn only_managers_assign_tasks() -> Result<()> {
    let server = TestServer::start().await?;
    let staff = server.employee("Staff").await?;
    let other = server.employee("Supervisor").await?;

    let res = create_task(&server, &staff, json!(other.id)).await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    Ok(())
}

#[tokio::test]
async fn listing_is_narrowed_by_role() -> Result<()> {
    let server = TestServer::start().await?;
    let admin = server.admin().await?;
    let manager = server.employee("Manager").await?;
    let outsider_manager = server.employee("Manager").await?;
    let member = server.employee("Staff").await?;
    let loner = server.employee("Staff").await?;
    server.assign_team(&admin, &manager.id, &[member.id.as_str()]).await?;

    task_id(create_task(&server, &outsider_manager, json!(member.id)).await?).await?;
    task_id(create_task(&server, &outsider_manager, json!(loner.id)).await?).await?;

    let count = |session: Session| {
        let server = &server;
        async move {
            let res = server.client.get(server.url("/tasks")).bearer_auth(&session.token).send().await?;
            let body = res.json::<Value>().await?;
            anyhow::Ok(body["count"].as_u64().unwrap_or_default())
        }
    };

    assert_eq!(count(admin.clone()).await?, 2);
    assert_eq!(count(manager.clone()).await?, 1);
    assert_eq!(count(member.clone()).await?, 1);
    assert_eq!(count(loner.clone()).await?, 1);

    Ok(())
}

#[tokio::test]
async fn visibility_of_a_single_task() -> Result<()> {
    let server = TestServer::start().await?;
    let manager = server.employee("Manager").await?;
    let staff = server.employee("Staff").await?;
    let stranger = server.employee("Staff").await?;
    let id = task_id(create_task(&server, &manager, json!(staff.id)).await?).await?;
    let url = server.url(&format!("/tasks/{}", id));

    let res = server.client.get(&url).bearer_auth(&staff.token).send().await?;
    assert_eq!(res.status(), StatusCode::OK);
    let res = server.client.get(&url).bearer_auth(&stranger.token).send().await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    let res = server
        .client
        .get(server.url("/tasks/does-not-exist"))
        .bearer_auth(&manager.token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    Ok(())
}

#[tokio::test]
async fn assignees_may_only_report_progress() -> Result<()> {
    let server = TestServer::start().await?;
    let manager = server.employee("Manager").await?;
    let staff = server.employee("Staff").await?;
    let stranger = server.employee("Staff").await?;
    let id = task_id(create_task(&server, &manager, json!(staff.id)).await?).await?;
    let url = server.url(&format!("/tasks/{}", id));

    let res = server
        .client
        .put(&url)
        .bearer_auth(&staff.token)
        .json(&json!({ "status": "InProgress" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body = res.json::<Value>().await?;
    assert_eq!(body["data"]["status"], "In Progress");

    let res = server
        .client
        .put(&url)
        .bearer_auth(&staff.token)
        .json(&json!({ "title": "Renamed" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = server
        .client
        .put(&url)
        .bearer_auth(&stranger.token)
        .json(&json!({ "status": "Completed" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = server.client.get(&url).bearer_auth(&manager.token).send().await?;
    let body = res.json::<Value>().await?;
    assert_eq!(body["data"]["title"], "Quarterly report");
    assert_eq!(body["data"]["status"], "In Progress");

    Ok(())
}

#[tokio::test]
async fn assigner_edits_but_cannot_reassign_authorship() -> Result<()> {
    let server = TestServer::start().await?;
    let manager = server.employee("Manager").await?;
    let staff = server.employee("Staff").await?;
    let id = task_id(create_task(&server, &manager, json!(staff.id)).await?).await?;
    let url = server.url(&format!("/tasks/{}", id));

    let res = server
        .client
        .put(&url)
        .bearer_auth(&manager.token)
        .json(&json!({ "assignedBy": staff.id }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = server
        .client
        .put(&url)
        .bearer_auth(&manager.token)
        .json(&json!({ "title": "Annual report", "status": "Reviewed" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body = res.json::<Value>().await?;
    assert_eq!(body["data"]["title"], "Annual report");
    assert_eq!(body["data"]["assignedBy"], manager.id.as_str());

    Ok(())
}

#[tokio::test]
async fn only_the_assigner_or_admin_deletes() -> Result<()> {
    let server = TestServer::start().await?;
    let admin = server.admin().await?;
    let manager = server.employee("Manager").await?;
    let other_manager = server.employee("Manager").await?;
    let staff = server.employee("Staff").await?;
    let id = task_id(create_task(&server, &manager, json!(staff.id)).await?).await?;
    let url = server.url(&format!("/tasks/{}", id));

    let res = server.client.delete(&url).bearer_auth(&staff.token).send().await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    let res = server.client.delete(&url).bearer_auth(&other_manager.token).send().await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = server.client.delete(&url).bearer_auth(&admin.token).send().await?;
    assert_eq!(res.status(), StatusCode::OK);
    let res = server.client.get(&url).bearer_auth(&admin.token).send().await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    Ok(())
}
