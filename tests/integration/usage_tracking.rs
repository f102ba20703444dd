use super::IntegrationHarness;
use anyhow::Result;
use std::fs;
use toolchest::USAGE_FILE_NAME;

#[test]
fn first_run_creates_an_entry_with_count_one() -> Result<()> {
    let harness = IntegrationHarness::new();
    let mut toolbox = harness.toolbox();
    toolbox.categories().add_main("games")?;
    let tool = harness.write_tool(&toolbox.root.path().join("games"), "setup.exe");

    toolbox.record_usage(&tool, "setup", "games");

    let record = toolbox.usage.get("games", "setup").expect("usage entry");
    assert_eq!(record.usage_count, 1);
    assert_eq!(record.first_added, record.last_used);
    assert_eq!(record.category, "games");
    Ok(())
}

#[test]
fn repeat_runs_increment_the_counter() -> Result<()> {
    let harness = IntegrationHarness::new();
    let mut toolbox = harness.toolbox();
    toolbox.categories().add_main("games")?;
    let tool = harness.write_tool(&toolbox.root.path().join("games"), "setup.exe");

    toolbox.record_usage(&tool, "setup", "games");
    toolbox.record_usage(&tool, "setup", "games");
    toolbox.record_usage(&tool, "setup", "games");

    let record = toolbox.usage.get("games", "setup").unwrap();
    assert_eq!(record.usage_count, 3);
    assert_eq!(toolbox.usage.len(), 1);
    Ok(())
}

#[test]
fn usage_lives_in_its_own_file_and_survives_a_restart() -> Result<()> {
    let harness = IntegrationHarness::new();
    {
        let mut toolbox = harness.toolbox();
        toolbox.categories().add_main("games")?;
        let tool = harness.write_tool(&toolbox.root.path().join("games"), "setup.exe");
        toolbox.record_usage(&tool, "setup", "games");
    }

    let usage_file = harness.home_path().join(USAGE_FILE_NAME);
    let raw = fs::read_to_string(&usage_file)?;
    assert!(raw.contains("games/setup"));
    assert!(raw.contains("usage_count"));

    let toolbox = harness.toolbox();
    assert_eq!(toolbox.usage.get("games", "setup").unwrap().usage_count, 1);
    let keys: Vec<&String> = toolbox.usage.iter().map(|(key, _)| key).collect();
    assert_eq!(keys, vec!["games/setup"]);
    Ok(())
}

#[test]
fn a_corrupt_usage_file_degrades_to_an_empty_store() -> Result<()> {
    let harness = IntegrationHarness::new();
    fs::create_dir_all(harness.home_path())?;
    fs::write(harness.home_path().join(USAGE_FILE_NAME), "not json at all")?;

    let toolbox = harness.toolbox();
    assert!(toolbox.usage.is_empty());
    Ok(())
}

#[test]
fn usage_can_exist_before_a_metadata_record_does() -> Result<()> {
    let harness = IntegrationHarness::new();
    let mut toolbox = harness.toolbox();
    toolbox.categories().add_main("games")?;
    let tool = harness.write_tool(&toolbox.root.path().join("games"), "setup.exe");

    toolbox.record_usage(&tool, "setup", "games");

    assert!(toolbox.records.is_empty());
    assert_eq!(toolbox.usage.len(), 1);
    Ok(())
}

#[test]
fn pruning_drops_entries_whose_file_is_gone() -> Result<()> {
    let harness = IntegrationHarness::new();
    let mut toolbox = harness.toolbox();
    toolbox.categories().add_main("games")?;
    let keep = harness.write_tool(&toolbox.root.path().join("games"), "keep.exe");
    let gone = harness.write_tool(&toolbox.root.path().join("games"), "gone.exe");
    toolbox.record_usage(&keep, "keep", "games");
    toolbox.record_usage(&gone, "gone", "games");

    fs::remove_file(&gone)?;
    let report = toolbox.prune();

    assert_eq!(report.usage_removed, 1);
    assert!(toolbox.usage.get("games", "keep").is_some());
    assert!(toolbox.usage.get("games", "gone").is_none());
    Ok(())
}
