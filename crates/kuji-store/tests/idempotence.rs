use kuji_core::{GameSpec, Pipeline, Source, UpsertSink};
use kuji_store::SqliteStore;

const TAKE5_CSV: &str = "Draw Date,Evening Winning Numbers,Evening Bonus #,Midday Winning Numbers,Midday Bonus #
02/19/2026,3 8 15 22 27,,1 5 9 14 33,
02/18/2026,2 11 19 30 39,,4 6 17 25 36,
02/17/2026,7 12 20 28 35,,,
";

fn take5() -> GameSpec {
    GameSpec {
        id: "ny-take5".into(),
        name: "Take 5".into(),
        picks: 5,
        max: 39,
        bonus: false,
        bonus_max: None,
        source: Source::Csv {
            url: "https://data.ny.gov/api/views/dg63-4siq/rows.csv".into(),
        },
    }
}

#[tokio::test]
async fn second_run_adds_no_rows() {
    let game = take5();
    let pipeline = Pipeline::new().unwrap();
    let mut sink = UpsertSink::new(SqliteStore::open_in_memory().unwrap());

    let first = pipeline.ingest(&game, TAKE5_CSV).unwrap();
    let report = sink.write(&game.id, &first.records).await;
    assert_eq!(report.written, 5);
    assert_eq!(sink.store().count(&game.id).unwrap(), 5);

    let second = pipeline.ingest(&game, TAKE5_CSV).unwrap();
    let report = sink.write(&game.id, &second.records).await;
    assert_eq!(report.failed, 0);
    assert_eq!(sink.store().count(&game.id).unwrap(), 5);
}

#[tokio::test]
async fn double_draw_sessions_are_both_stored() {
    let game = take5();
    let ingest = Pipeline::new().unwrap().ingest(&game, TAKE5_CSV).unwrap();
    let mut sink = UpsertSink::new(SqliteStore::open_in_memory().unwrap());
    sink.write(&game.id, &ingest.records).await;

    let stored = sink.store().records(&game.id).unwrap();
    let same_day: Vec<_> = stored
        .iter()
        .filter(|r| r.date.to_string() == "2026-02-19")
        .map(|r| r.numbers.clone())
        .collect();
    assert_eq!(same_day, vec![vec![1, 5, 9, 14, 33], vec![3, 8, 15, 22, 27]]);
}

#[tokio::test]
async fn small_chunks_write_everything() {
    let game = take5();
    let ingest = Pipeline::new().unwrap().ingest(&game, TAKE5_CSV).unwrap();
    let mut sink = UpsertSink::new(SqliteStore::open_in_memory().unwrap()).with_chunk_size(2);

    let report = sink.write(&game.id, &ingest.records).await;
    assert_eq!(report.chunks, 3);
    assert_eq!(sink.into_inner().count("ny-take5").unwrap(), 5);
}
