use super::IntegrationHarness;
use anyhow::Result;
use std::fs;
use toolchest::{Selection, ViewFilter, CONFIG_FILE_NAME, VERSION_NOT_APPLICABLE};

#[test]
fn discovery_creates_a_six_field_record_row() -> Result<()> {
    let harness = IntegrationHarness::new();
    let mut toolbox = harness.toolbox();
    toolbox.categories().add_main("games")?;
    harness.write_tool(&toolbox.root.path().join("games"), "setup.exe");

    toolbox.load_catalog(&Selection::Main(1), &ViewFilter::default())?;

    let record = toolbox
        .records
        .get_by_key("games/setup.exe")
        .expect("record created on discovery");
    assert_eq!(record.name, "setup");
    assert_eq!(record.category, "games");
    assert_eq!(record.kind, "executable");
    assert!(!record.add_time.is_empty());

    let raw = fs::read_to_string(harness.home_path().join(CONFIG_FILE_NAME))?;
    assert!(raw.contains("games/setup.exe"));
    let row = toolbox.config.record_raw("games/setup.exe").unwrap();
    assert_eq!(row.split('|').count(), 6);
    Ok(())
}

#[test]
fn version_is_marked_not_applicable_for_non_probeable_kinds() -> Result<()> {
    let harness = IntegrationHarness::new();
    let mut toolbox = harness.toolbox();
    toolbox.categories().add_main("archives")?;
    harness.write_tool(&toolbox.root.path().join("archives"), "backup.zip");

    toolbox.load_catalog(&Selection::Main(1), &ViewFilter::default())?;

    let record = toolbox.records.get_by_key("archives/backup.zip").unwrap();
    assert_eq!(record.version, VERSION_NOT_APPLICABLE);
    Ok(())
}

#[cfg(not(windows))]
#[test]
fn version_falls_back_to_unknown_where_probing_is_unavailable() -> Result<()> {
    use toolchest::VERSION_UNKNOWN;

    let harness = IntegrationHarness::new();
    let mut toolbox = harness.toolbox();
    toolbox.categories().add_main("games")?;
    harness.write_tool(&toolbox.root.path().join("games"), "setup.exe");

    toolbox.load_catalog(&Selection::Main(1), &ViewFilter::default())?;

    let record = toolbox.records.get_by_key("games/setup.exe").unwrap();
    assert_eq!(record.version, VERSION_UNKNOWN);
    Ok(())
}

#[test]
fn rediscovery_never_overwrites_an_existing_record() -> Result<()> {
    let harness = IntegrationHarness::new();
    let mut toolbox = harness.toolbox();
    toolbox.categories().add_main("games")?;
    let tool = harness.write_tool(&toolbox.root.path().join("games"), "setup.exe");

    toolbox.load_catalog(&Selection::Main(1), &ViewFilter::default())?;
    toolbox.update_tool_note(&tool, "keep this note");
    let add_time = toolbox
        .records
        .get_by_key("games/setup.exe")
        .unwrap()
        .add_time
        .clone();

    toolbox.load_catalog(&Selection::Main(1), &ViewFilter::default())?;

    assert_eq!(toolbox.records.len(), 1);
    let record = toolbox.records.get_by_key("games/setup.exe").unwrap();
    assert_eq!(record.note, "keep this note");
    assert_eq!(record.add_time, add_time);
    Ok(())
}

#[test]
fn edits_before_any_scan_synthesize_a_minimal_record() -> Result<()> {
    let harness = IntegrationHarness::new();
    let mut toolbox = harness.toolbox();
    toolbox.categories().add_main("games")?;
    let tool = harness.write_tool(&toolbox.root.path().join("games"), "setup.exe");

    toolbox.update_tool_note(&tool, "added by hand");

    let record = toolbox.records.get_by_key("games/setup.exe").unwrap();
    assert_eq!(record.name, "setup");
    assert_eq!(record.note, "added by hand");
    assert_eq!(toolbox.config.custom_note(&tool).as_deref(), Some("added by hand"));
    Ok(())
}

#[test]
fn renaming_updates_both_record_and_override() -> Result<()> {
    let harness = IntegrationHarness::new();
    let mut toolbox = harness.toolbox();
    toolbox.categories().add_main("games")?;
    let tool = harness.write_tool(&toolbox.root.path().join("games"), "setup.exe");
    toolbox.load_catalog(&Selection::Main(1), &ViewFilter::default())?;

    toolbox.rename_tool(&tool, "Installer");

    let record = toolbox.records.get_by_key("games/setup.exe").unwrap();
    assert_eq!(record.name, "Installer");
    assert_eq!(toolbox.config.custom_name(&tool).as_deref(), Some("Installer"));
    Ok(())
}

#[test]
fn malformed_rows_are_dropped_when_the_store_loads() -> Result<()> {
    let harness = IntegrationHarness::new();
    let config_file = harness.home_path().join(CONFIG_FILE_NAME);
    fs::create_dir_all(harness.home_path())?;
    fs::write(
        &config_file,
        "[ToolAddedRecord]\n\"games/bad.exe\" = \"only|three|fields\"\n",
    )?;

    let toolbox = harness.toolbox();

    assert!(toolbox.records.is_empty());
    let raw = fs::read_to_string(&config_file)?;
    assert!(!raw.contains("only|three|fields"));
    Ok(())
}

#[test]
fn legacy_keys_converge_on_the_normalized_form() -> Result<()> {
    let harness = IntegrationHarness::new();
    let config_file = harness.home_path().join(CONFIG_FILE_NAME);
    fs::create_dir_all(harness.home_path())?;
    fs::write(
        &config_file,
        "[ToolAddedRecord]\n'Games\\Setup.EXE' = \"setup|Games|2024-01-01 00:00:00|executable||-\"\n",
    )?;

    let toolbox = harness.toolbox();

    assert!(toolbox.records.get_by_key("games/setup.exe").is_some());
    let keys: Vec<&String> = toolbox.records.keys().collect();
    assert_eq!(keys, vec!["games/setup.exe"]);
    let raw = fs::read_to_string(&config_file)?;
    assert!(raw.contains("games/setup.exe"));
    assert!(!raw.contains("Games\\Setup.EXE"));
    Ok(())
}
