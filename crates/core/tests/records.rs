use birdbook_core::sheet::{MemoryBackend, SheetStore, TableStore};
use birdbook_core::{Bird, BirdInput, Chick, ChickInput, Pair, PairInput, Record};
use std::sync::Arc;

fn store() -> SheetStore {
    let backend = MemoryBackend::new()
        .with_sheet(Bird::TABLE.sheet, Bird::HEADER)
        .with_sheet(Pair::TABLE.sheet, Pair::HEADER)
        .with_sheet(Chick::TABLE.sheet, Chick::HEADER);
    SheetStore::new(Arc::new(backend))
}

#[tokio::test]
async fn test_bird_round_trip_with_defaults() {
    let store = store();
    let input: BirdInput =
        serde_json::from_str(r#"{"RingNo": "B001", "Sex": "ผู้", "BirthDate": "2025-03-02"}"#)
            .unwrap();

    let id = store.insert(&Bird::TABLE, Bird::cells(&input)).await.unwrap();
    let rows = store.read_all(&Bird::TABLE).await.unwrap();
    let bird = Bird::from_row(&rows[0]);

    assert_eq!(id, "B0001");
    assert_eq!(
        bird,
        Bird {
            bird_id: "B0001".to_string(),
            ring_no: "B001".to_string(),
            sex: "ผู้".to_string(),
            birth_date: "2025-03-02".to_string(),
            ..Bird::default()
        }
    );
}

#[tokio::test]
async fn test_pair_and_chick_tables_allocate_independently() {
    let store = store();

    let pair = store
        .insert(&Pair::TABLE, Pair::cells(&PairInput::default()))
        .await
        .unwrap();
    let chick = store
        .insert(&Chick::TABLE, Chick::cells(&ChickInput::form_default()))
        .await
        .unwrap();
    let second_pair = store
        .insert(&Pair::TABLE, Pair::cells(&PairInput::default()))
        .await
        .unwrap();

    assert_eq!(pair, "P0001");
    assert_eq!(chick, "K0001");
    assert_eq!(second_pair, "P0002");

    let pairs: Vec<Pair> = store
        .read_all(&Pair::TABLE)
        .await
        .unwrap()
        .iter()
        .map(Pair::from_row)
        .collect();
    assert!(pairs.iter().all(|p| p.status == "ใช้งาน"));

    let chicks = store.read_all(&Chick::TABLE).await.unwrap();
    assert_eq!(chicks[0]["Sex"], "ยังไม่ตรวจ");
    assert_eq!(chicks[0]["Status"], "มีชีวิต");
}

#[tokio::test]
async fn test_edit_through_to_input() {
    let store = store();
    let input = ChickInput {
        ring_no: Some("C-7".to_string()),
        ..ChickInput::form_default()
    };
    let id = store.insert(&Chick::TABLE, Chick::cells(&input)).await.unwrap();

    let rows = store.read_all(&Chick::TABLE).await.unwrap();
    let mut edit = Chick::from_row(&rows[0]).to_input();
    edit.status = Some("ขายแล้ว".to_string());

    assert!(store.replace(&Chick::TABLE, &id, Chick::cells(&edit)).await.unwrap());

    let chick = Chick::from_row(&store.read_all(&Chick::TABLE).await.unwrap()[0]);
    assert_eq!(chick.chick_id, id);
    assert_eq!(chick.ring_no, "C-7");
    assert_eq!(chick.status, "ขายแล้ว");
}
