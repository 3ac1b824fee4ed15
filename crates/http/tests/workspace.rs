use birdbook_core::{Bird, FarmError, Pair, PairInput};
use birdbook_http::{FarmClient, Resource, Workspace, SAVE_FAILED};
use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn mount_lists(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/birds"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "BirdID": "B0001", "RingNo": "R-1", "Sex": "ผู้", "Species": "Gouldian" },
            { "BirdID": "B0002", "RingNo": "", "Sex": "เมีย", "Species": "gouldian " }
        ])))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/pairs"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "PairID": "P0001", "MaleID": "B0001", "FemaleID": "B0002", "Status": "ใช้งาน" }
        ])))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/chicks"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "ChickID": "K0001", "ClutchID": "P0001", "Status": "มีชีวิต" },
            { "ChickID": "K0002", "ClutchID": "P0001", "Status": "เสียชีวิต" }
        ])))
        .mount(server)
        .await;
}

fn workspace(server: &MockServer) -> Workspace {
    Workspace::new(FarmClient::new(&server.uri()).unwrap())
}

// ===== Client =====

#[tokio::test]
async fn test_list_parses_rows() {
    let server = MockServer::start().await;
    mount_lists(&server).await;
    let client = FarmClient::new(&server.uri()).unwrap();

    let birds = client.list::<Bird>().await.unwrap();

    assert_eq!(birds.len(), 2);
    assert_eq!(birds[0].bird_id, "B0001");
    assert_eq!(birds[0].color, "");
}

#[tokio::test]
async fn test_create_returns_assigned_id() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/pairs"))
        .and(body_json(json!({ "MaleID": "B0001", "Status": "ใช้งาน" })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "success": true, "PairID": "P0002" })),
        )
        .expect(1)
        .mount(&server)
        .await;
    let client = FarmClient::new(&server.uri()).unwrap();

    let input = PairInput {
        male_id: Some("B0001".to_string()),
        ..PairInput::form_default()
    };
    let id = client.create::<Pair>(&input).await.unwrap();

    assert_eq!(id, "P0002");
}

#[tokio::test]
async fn test_create_without_success_flag_fails() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/birds"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "BirdID": "B0001" })))
        .mount(&server)
        .await;
    let client = FarmClient::new(&server.uri()).unwrap();

    let err = client
        .create::<Bird>(&Default::default())
        .await
        .unwrap_err();

    assert!(matches!(err, FarmError::NotAcknowledged(_)));
}

#[tokio::test]
async fn test_update_missing_is_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/pairs/P9999"))
        .respond_with(
            ResponseTemplate::new(404).set_body_json(json!({ "error": "Pair not found" })),
        )
        .mount(&server)
        .await;
    let client = FarmClient::new(&server.uri()).unwrap();

    let err = client
        .update::<Pair>("P9999", &PairInput::default())
        .await
        .unwrap_err();

    assert!(err.is_not_found());
    assert_eq!(err.to_string(), "Pair not found");
}

#[tokio::test]
async fn test_server_error_is_http_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/birds"))
        .respond_with(
            ResponseTemplate::new(500).set_body_json(json!({ "error": "Error fetching birds" })),
        )
        .mount(&server)
        .await;
    let client = FarmClient::new(&server.uri()).unwrap();

    let err = client.list::<Bird>().await.unwrap_err();

    assert!(matches!(err, FarmError::Http(ref m) if m.contains("500")));
}

// ===== Data cache =====

#[tokio::test]
async fn test_fetch_all_fills_lists() {
    let server = MockServer::start().await;
    mount_lists(&server).await;
    let mut ws = workspace(&server);

    ws.load().await;

    assert_eq!(ws.cache.birds.len(), 2);
    assert_eq!(ws.cache.pairs.len(), 1);
    assert_eq!(ws.cache.chicks.len(), 2);
    assert_eq!(ws.message(), None);

    let stats = ws.cache.stats();
    assert_eq!(stats.male_birds, 1);
    assert_eq!(stats.female_birds, 1);
    assert_eq!(stats.species, 2);
    assert_eq!(stats.live_chicks, 1);
}

#[tokio::test]
async fn test_one_failed_list_is_empty_without_message() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/pairs"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    mount_lists(&server).await;
    let mut ws = workspace(&server);

    ws.load().await;

    assert!(ws.cache.pairs.is_empty());
    assert_eq!(ws.cache.birds.len(), 2);
    assert_eq!(ws.message(), None);
}

#[tokio::test]
async fn test_all_lists_failing_sets_message() {
    let server = MockServer::start().await;
    let mut ws = workspace(&server);

    ws.load().await;

    assert!(ws.cache.birds.is_empty());
    let message = ws.message().unwrap();
    assert!(message.contains(&server.uri()));
}

// ===== Save and delete =====

#[tokio::test]
async fn test_create_resets_form_and_refetches() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/birds"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "success": true, "BirdID": "B0003" })),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/birds"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;
    let mut ws = workspace(&server);
    ws.birds.fields.ring_no = Some("R-3".to_string());

    assert!(ws.save(Resource::Birds).await);

    assert!(!ws.is_saving());
    assert_eq!(ws.birds.fields.ring_no, None);
    assert_eq!(ws.birds.fields.origin.as_deref(), Some("เพาะเอง"));
    assert_eq!(ws.message(), Some("บันทึกข้อมูลนกสำเร็จ ✓"));
}

#[tokio::test]
async fn test_edit_then_save_issues_put() {
    let server = MockServer::start().await;
    mount_lists(&server).await;
    Mock::given(method("PUT"))
        .and(path("/pairs/P0001"))
        .and(body_json(json!({
            "MaleID": "B0001",
            "FemaleID": "B0002",
            "Status": "สิ้นสุด"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true })))
        .expect(1)
        .mount(&server)
        .await;
    let mut ws = workspace(&server);
    ws.load().await;

    assert!(ws.edit(Resource::Pairs, "P0001"));
    assert_eq!(ws.message(), Some("กำลังแก้ไขคู่ผสม P0001"));
    ws.pairs.fields.status = Some("สิ้นสุด".to_string());

    assert!(ws.save(Resource::Pairs).await);
    assert!(!ws.pairs.is_editing());
    assert_eq!(ws.message(), Some("แก้ไขคู่ผสม P0001 สำเร็จ ✓"));
}

#[tokio::test]
async fn test_bird_edit_and_delete_messages() {
    let server = MockServer::start().await;
    mount_lists(&server).await;
    Mock::given(method("PUT"))
        .and(path("/birds/B0002"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/birds/B0001"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true })))
        .expect(1)
        .mount(&server)
        .await;
    let mut ws = workspace(&server);
    ws.load().await;

    // B0002 has no ring number, so it is labelled by id
    assert!(ws.edit(Resource::Birds, "B0002"));
    assert_eq!(ws.message(), Some("กำลังแก้ไขข้อมูลนก B0002"));

    assert!(ws.save(Resource::Birds).await);
    assert_eq!(ws.message(), Some("แก้ไขข้อมูลนก B0002 สำเร็จ ✓"));

    assert!(ws.delete(Resource::Birds, "B0001", &|_: &str| true).await);
    assert_eq!(ws.message(), Some("ลบนก R-1 สำเร็จ ✓"));
}

#[tokio::test]
async fn test_edit_unknown_record() {
    let server = MockServer::start().await;
    mount_lists(&server).await;
    let mut ws = workspace(&server);
    ws.load().await;

    assert!(!ws.edit(Resource::Birds, "B0042"));
    assert!(!ws.birds.is_editing());
}

#[tokio::test]
async fn test_failed_save_keeps_form() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chicks"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    let mut ws = workspace(&server);
    ws.chicks.fields.ring_no = Some("C-1".to_string());

    assert!(!ws.save(Resource::Chicks).await);

    assert_eq!(ws.chicks.fields.ring_no.as_deref(), Some("C-1"));
    assert_eq!(ws.message(), Some(SAVE_FAILED));
    assert!(!ws.is_saving());
}

#[tokio::test]
async fn test_delete_declined_makes_no_call() {
    let server = MockServer::start().await;
    mount_lists(&server).await;
    Mock::given(method("DELETE"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true })))
        .expect(0)
        .mount(&server)
        .await;
    let mut ws = workspace(&server);
    ws.load().await;

    let deleted = ws
        .delete(Resource::Birds, "B0001", &|prompt: &str| {
            assert_eq!(prompt, "ต้องการลบนกรหัส R-1 ใช่ไหม?");
            false
        })
        .await;

    assert!(!deleted);
}

#[tokio::test]
async fn test_delete_confirmed() {
    let server = MockServer::start().await;
    mount_lists(&server).await;
    Mock::given(method("DELETE"))
        .and(path("/chicks/K0002"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true })))
        .expect(1)
        .mount(&server)
        .await;
    let mut ws = workspace(&server);
    ws.load().await;

    let deleted = ws.delete(Resource::Chicks, "K0002", &|_: &str| true).await;

    assert!(deleted);
    assert_eq!(ws.message(), Some("ลบลูกนก K0002 สำเร็จ ✓"));
}

#[tokio::test]
async fn test_delete_failure_sets_message() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/pairs/P0009"))
        .respond_with(
            ResponseTemplate::new(404).set_body_json(json!({ "error": "Pair not found" })),
        )
        .mount(&server)
        .await;
    let mut ws = workspace(&server);

    let deleted = ws.delete(Resource::Pairs, "P0009", &|_: &str| true).await;

    assert!(!deleted);
    assert_eq!(ws.message(), Some("ลบคู่ผสมไม่สำเร็จ · ตรวจสอบ server"));
}
