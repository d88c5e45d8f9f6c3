mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::{json, Value};

use common::{ids, World};

async fn find(world: &World, token: &str, body: Value) -> Result<Value> {
    let res = world.server.post("/api/find/documents", token, &body).send().await?;
    anyhow::ensure!(res.status() == StatusCode::OK, "search failed: {}", res.status());
    Ok(res.json::<Value>().await?["data"].clone())
}

#[tokio::test]
async fn search_pages_report_the_full_total() -> Result<()> {
    let world = World::new().await?;
    let server = &world.server;
    let mut created = Vec::new();
    for n in 0..5 {
        created.push(server.document(&format!("Surat Edaran {}", n), world.disdik.id, world.admin.id, true).await?.id);
    }
    created.reverse();

    let token = server.login("staf").await?;
    let first = find(&world, &token, json!({ "q": "edaran", "page": 1, "limit": 2 })).await?;
    assert_eq!(first["total"], 5);
    assert_eq!(first["page"], 1);
    assert_eq!(first["limit"], 2);
    assert_eq!(ids(&first["items"]), created[..2].to_vec());

    let last = find(&world, &token, json!({ "q": "edaran", "page": 3, "limit": 2 })).await?;
    assert_eq!(ids(&last["items"]), created[4..].to_vec());

    let beyond = find(&world, &token, json!({ "q": "edaran", "page": 9, "limit": 2 })).await?;
    assert!(ids(&beyond["items"]).is_empty());
    assert_eq!(beyond["total"], 5);
    Ok(())
}

#[tokio::test]
async fn search_respects_visibility_scope() -> Result<()> {
    let world = World::new().await?;
    let server = &world.server;
    let own = server.document("Anggaran Disdik", world.disdik.id, world.admin.id, false).await?;
    server.document("Anggaran Dinkes", world.dinkes.id, world.admin.id, false).await?;
    let public = server.document("Anggaran Publik", world.dinkes.id, world.admin.id, true).await?;

    let token = server.login("pengelola").await?;
    let body = find(&world, &token, json!({ "q": "anggaran" })).await?;
    assert_eq!(ids(&body["items"]), vec![public.id]);

    let body = find(&world, &token, json!({ "q": "anggaran", "include_private": true })).await?;
    assert_eq!(ids(&body["items"]), vec![public.id, own.id]);

    // Filtering on a foreign unit never widens the scope
    let body = find(&world, &token, json!({ "opd_id": world.dinkes.id, "include_private": true })).await?;
    assert_eq!(ids(&body["items"]), vec![public.id]);
    Ok(())
}

#[tokio::test]
async fn search_rejects_bad_windows() -> Result<()> {
    let world = World::new().await?;
    let server = &world.server;
    let token = server.login("admin").await?;

    for body in [
        json!({ "limit": 101 }),
        json!({ "limit": 0 }),
        json!({ "page": 0 }),
        json!({ "page": i64::MAX, "limit": 100 }),
        json!({ "date_from": "2024-12-31T00:00:00Z", "date_to": "2024-01-01T00:00:00Z" }),
    ] {
        let res = server.post("/api/find/documents", &token, &body).send().await?;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST, "accepted {}", body);
        let error = res.json::<Value>().await?;
        assert_eq!(error["code"], "VALIDATION_ERROR");
    }
    Ok(())
}

#[tokio::test]
async fn tag_and_type_filters_narrow_text_matches() -> Result<()> {
    let world = World::new().await?;
    let server = &world.server;
    let token = server.login("pengelola").await?;

    let mut uploaded = Vec::new();
    for (file_name, mime_type, tags) in [
        ("anggaran.pdf", "application/pdf", "keuangan,2024"),
        ("anggaran.xlsx", "application/vnd.ms-excel", "keuangan,2024"),
        ("anggaran-lama.pdf", "application/pdf", "keuangan,2023"),
    ] {
        let body = json!({
            "title": "Anggaran Sekolah",
            "file_path": format!("uploads/{}", file_name),
            "file_name": file_name,
            "file_size": 1024,
            "mime_type": mime_type,
            "tags": tags,
            "is_public": true
        });
        let res = server.post("/api/documents", &token, &body).send().await?;
        anyhow::ensure!(res.status() == StatusCode::CREATED, "upload failed: {}", res.status());
        uploaded.push(res.json::<Value>().await?["data"]["id"].as_i64().unwrap_or_default());
    }

    let body = find(&world, &token, json!({ "q": "anggaran", "tags": "2024", "document_type": "pdf" })).await?;
    assert_eq!(ids(&body["items"]), vec![uploaded[0]]);

    let body = find(&world, &token, json!({ "q": "anggaran", "tags": "2024" })).await?;
    assert_eq!(ids(&body["items"]), vec![uploaded[1], uploaded[0]]);

    let body = find(&world, &token, json!({ "document_type": "excel" })).await?;
    assert_eq!(ids(&body["items"]), vec![uploaded[1]]);
    Ok(())
}
