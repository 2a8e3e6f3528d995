use anyhow::{Context, Result};

use fieldwatch::notify::Locale;
use fieldwatch::session::{LineOutcome, Session};
use fieldwatch::transfer::{self, ConflictChoice};

fn open(tmp: &tempfile::TempDir) -> Result<Session> {
    Session::open(tmp.path(), Locale::ZhTw, false)
}

#[test]
fn exported_board_imports_cleanly_elsewhere() -> Result<()> {
    let sender_dir = tempfile::tempdir().context("sender dir")?;
    let mut sender = open(&sender_dir)?;
    sender.submit_line("83 2 20.30", 1_000_000)?;
    sender.submit_line("81 5 on", 1_000_000)?;
    let payload = transfer::export_payload(sender.board.notes())?;

    let receiver_dir = tempfile::tempdir().context("receiver dir")?;
    let mut receiver = open(&receiver_dir)?;
    let records = transfer::parse_payload(&payload)?;
    let plan = transfer::plan_import(records, &receiver.catalog, receiver.board.notes(), 1_000_000)?;
    assert!(plan.conflicts.is_empty());

    let applied = receiver
        .board
        .import(plan, ConflictChoice::SkipConflicts, 1_000_000);
    assert_eq!(applied, 2);
    receiver.persist()?;

    let reopened = open(&receiver_dir)?;
    assert_eq!(reopened.board.len(), 2);
    let cd = reopened
        .board
        .notes()
        .iter()
        .find(|n| n.map_level == 83)
        .context("imported level 83 note")?;
    assert_eq!(cd.respawn_time(), Some(1_000_000 + (20 * 60 + 30) * 1000));
    Ok(())
}

#[test]
fn conflicting_import_respects_the_choice() -> Result<()> {
    let dir = tempfile::tempdir().context("tempdir")?;
    let mut session = open(&dir)?;
    let LineOutcome::Added { id, .. } = session.submit_line("83 2 on", 1_000)? else {
        panic!("level 83 is unambiguous");
    };

    // Same spot, different state.
    let payload = r#"[{"l":83,"n":"大教堂至聖所","c":2,"s":"CD","r":9000000}]"#;
    let records = transfer::parse_payload(payload)?;
    let plan = transfer::plan_import(records, &session.catalog, session.board.notes(), 1_000)?;
    assert_eq!(plan.conflicts.len(), 1);

    // Skipping leaves the board alone.
    let records = transfer::parse_payload(payload)?;
    let skip_plan =
        transfer::plan_import(records, &session.catalog, session.board.notes(), 1_000)?;
    assert_eq!(
        session
            .board
            .import(skip_plan, ConflictChoice::SkipConflicts, 1_000),
        0
    );
    assert!(session.board.get(&id).context("note kept")?.on_time().is_some());

    // Overwriting replaces the state but keeps the id.
    assert_eq!(
        session.board.import(plan, ConflictChoice::OverwriteAll, 1_000),
        1
    );
    let note = session.board.get(&id).context("note still addressable")?;
    assert_eq!(note.respawn_time(), Some(9_000_000));
    Ok(())
}
