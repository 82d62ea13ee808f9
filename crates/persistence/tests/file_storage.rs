use camo_core::ProgressModel;
use persistence::{read_snapshot, write_snapshot, FileStorage, Storage, SAVE_KEY};
use std::path::PathBuf;

fn sample_catalog() -> camo_core::Catalog {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../assets/catalog.yaml");
    camo_catalog::load(path).unwrap()
}

#[test]
fn first_run_reads_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let storage = FileStorage::new(dir.path().join("saves"));
    assert!(read_snapshot(&storage, SAVE_KEY).unwrap().is_none());
}

#[test]
fn snapshot_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let catalog = sample_catalog();
    let mut model = ProgressModel::from_catalog(&catalog);
    let first_game = catalog.games[0].id.clone();
    let first_category = catalog.games[0].weapon_categories[0].id.clone();
    model
        .game_mut(&first_game)
        .unwrap()
        .get_mut(&first_category)
        .unwrap()[0]
        .max_level_reached = true;

    let mut storage = FileStorage::new(dir.path().join("saves"));
    write_snapshot(&mut storage, SAVE_KEY, &model).unwrap();
    assert!(dir.path().join("saves/savedata.json").exists());
    assert!(!dir.path().join("saves/savedata.json.tmp").exists());

    let reopened = FileStorage::new(dir.path().join("saves"));
    let back = read_snapshot(&reopened, SAVE_KEY).unwrap().unwrap();
    assert_eq!(back, model);
}

#[test]
fn overwrite_replaces_whole_snapshot() {
    let dir = tempfile::tempdir().unwrap();
    let mut storage = FileStorage::new(dir.path());
    storage.set(SAVE_KEY, "first").unwrap();
    storage.set(SAVE_KEY, "second").unwrap();
    assert_eq!(storage.get(SAVE_KEY).unwrap().as_deref(), Some("second"));
}

#[test]
fn failed_rename_cleans_up_temp_file() {
    let dir = tempfile::tempdir().unwrap();
    // A non-empty directory where the snapshot should go makes the rename fail.
    let blocker = dir.path().join("savedata.json");
    std::fs::create_dir(&blocker).unwrap();
    std::fs::write(blocker.join("keep"), "x").unwrap();

    let mut storage = FileStorage::new(dir.path());
    assert!(storage.set(SAVE_KEY, "snapshot").is_err());
    assert!(!dir.path().join("savedata.json.tmp").exists());
    assert!(blocker.is_dir());
}
