//! Item store inspection and reset commands.

use anyhow::Result;

use clipforge::config::Config;
use clipforge::model::ItemStatus;
use clipforge::store::{Collection, ItemStore};
use clipforge::ui;

pub fn cmd_status(config: &Config) -> Result<()> {
    let store = ItemStore::new(config.data_dir.clone());
    let active = store.load(Collection::Active)?;
    let archive = store.load(Collection::Archive)?;

    println!();
    println!("Clipforge Pipeline Status");
    println!("=========================");
    println!();
    println!("Active items:  {}", active.len());
    for item in &active {
        println!("  {:<40} {}", item.id, item.status);
    }
    println!();
    println!("Archived items: {}", archive.len());
    let awaiting = archive
        .iter()
        .filter(|i| i.status == ItemStatus::Rendered)
        .count();
    let uploaded = archive
        .iter()
        .filter(|i| i.status == ItemStatus::Uploaded)
        .count();
    let rejected = archive
        .iter()
        .filter(|i| i.status == ItemStatus::Rejected)
        .count();
    println!("  Awaiting approval: {}", awaiting);
    println!("  Uploaded:          {}", uploaded);
    println!("  Rejected:          {}", rejected);
    println!();
    Ok(())
}

/// Clear the active collection. Archived items are kept: they are the dedup
/// history that stops old ideas from being planned again.
pub fn cmd_reset_state(config: &Config) -> Result<()> {
    let store = ItemStore::new(config.data_dir.clone());
    let discarded = store.load(Collection::Active)?.len();
    store.reset(Collection::Active)?;
    ui::ok(&format!(
        "Active collection cleared ({discarded} item(s) discarded)"
    ));
    Ok(())
}
