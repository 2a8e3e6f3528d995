use anyhow::{Context, Result};

use fieldwatch::model::{Note, NoteState};
use fieldwatch::store::{LocalStore, Theme};

#[test]
fn notes_roundtrip_through_the_store() -> Result<()> {
    let tmp = tempfile::tempdir().context("create tempdir")?;
    let store = LocalStore::open(tmp.path())?;

    assert!(store.load_notes()?.is_empty());

    let mut note = Note::new(
        83,
        "大教堂至聖所".to_string(),
        2,
        NoteState::Cooldown { respawn_time: 1_700_000_000_000 },
        4,
    );
    note.has_sound = false;
    store.save_notes(std::slice::from_ref(&note))?;

    let loaded = store.load_notes()?;
    assert_eq!(loaded.len(), 1);
    assert_eq!(loaded[0].id, note.id);
    assert_eq!(loaded[0].note_text, "大教堂至聖所");
    assert_eq!(loaded[0].respawn_time(), Some(1_700_000_000_000));
    assert!(!loaded[0].has_sound);
    Ok(())
}

#[test]
fn absent_keys_have_defaults() -> Result<()> {
    let tmp = tempfile::tempdir().context("create tempdir")?;
    let store = LocalStore::open(tmp.path())?;

    assert_eq!(store.load_map_version()?, 0);
    assert!(store.load_map_data()?.is_none());
    assert_eq!(store.load_theme()?, Theme::Dark);

    store.save_theme(Theme::Light)?;
    assert_eq!(store.load_theme()?, Theme::Light);
    Ok(())
}

#[test]
fn saving_overwrites_in_place() -> Result<()> {
    let tmp = tempfile::tempdir().context("create tempdir")?;
    let store = LocalStore::open(tmp.path())?;

    let first = Note::new(80, "大教堂懺悔路".to_string(), 1, NoteState::On { on_time: 5 }, 4);
    store.save_notes(std::slice::from_ref(&first))?;
    store.save_notes(&[])?;
    assert!(store.load_notes()?.is_empty());
    Ok(())
}
