use super::IntegrationHarness;
use anyhow::Result;
use toolchest::{Selection, ToolKind, ViewFilter, ALL_TOOLS_LABEL};

#[test]
fn dropped_file_shows_up_with_stem_name_and_classification() -> Result<()> {
    let harness = IntegrationHarness::new();
    let mut toolbox = harness.toolbox();
    toolbox.categories().add_main("games")?;
    harness.write_tool(&toolbox.root.path().join("games"), "setup.exe");

    let page = toolbox.load_catalog(&Selection::Main(1), &ViewFilter::default())?;

    assert_eq!(page.count, 1);
    assert_eq!(page.label, "games");
    let tool = &page.tools[0];
    assert_eq!(tool.name, "setup");
    assert_eq!(tool.extension, ".exe");
    assert_eq!(tool.kind, ToolKind::Executable);
    assert_eq!(tool.category, "games");
    Ok(())
}

#[test]
fn main_selection_unions_exactly_one_extra_level() -> Result<()> {
    let harness = IntegrationHarness::new();
    let mut toolbox = harness.toolbox();
    toolbox.categories().add_main("dev")?;
    toolbox.categories().add_sub(1, "editors")?;
    toolbox.categories().add_sub(1, "shells")?;
    let dev = toolbox.root.path().join("dev");
    harness.write_tool(&dev, "direct.exe");
    harness.write_tool(&dev.join("editors"), "vim.zip");
    harness.write_tool(&dev.join("shells"), "bash.sh");
    // A grand-subcategory must not be visible from the main selection.
    harness.write_tool(&dev.join("editors").join("plugins"), "deep.exe");

    let page = toolbox.load_catalog(&Selection::Main(1), &ViewFilter::default())?;
    let names: Vec<&str> = page.tools.iter().map(|tool| tool.name.as_str()).collect();
    assert_eq!(names, vec!["direct", "vim", "bash"]);

    let sub_page = toolbox.load_catalog(
        &Selection::Sub { main: 1, sub: 1 },
        &ViewFilter::default(),
    )?;
    assert_eq!(sub_page.label, "dev > editors");
    let sub_names: Vec<&str> = sub_page.tools.iter().map(|tool| tool.name.as_str()).collect();
    assert_eq!(sub_names, vec!["vim"]);
    Ok(())
}

#[test]
fn all_tools_walks_recursively_and_sorts_by_category_then_name() -> Result<()> {
    let harness = IntegrationHarness::new();
    let mut toolbox = harness.toolbox();
    toolbox.categories().add_main("alpha")?;
    toolbox.categories().add_main("beta")?;
    let root = toolbox.root.path().to_path_buf();
    harness.write_tool(&root.join("beta"), "b-tool.sh");
    harness.write_tool(&root.join("alpha"), "Zeta.exe");
    harness.write_tool(&root.join("alpha"), "alpha-tool.exe");
    harness.write_tool(&root.join("alpha").join("nested").join("deep"), "buried.zip");

    let page = toolbox.load_catalog(&Selection::AllTools, &ViewFilter::default())?;

    assert_eq!(page.label, ALL_TOOLS_LABEL);
    let listing: Vec<(String, String)> = page
        .tools
        .iter()
        .map(|tool| (tool.category.clone(), tool.name.clone()))
        .collect();
    assert_eq!(
        listing,
        vec![
            ("alpha".to_string(), "alpha-tool".to_string()),
            ("alpha".to_string(), "Zeta".to_string()),
            ("alpha > nested > deep".to_string(), "buried".to_string()),
            ("beta".to_string(), "b-tool".to_string()),
        ]
    );
    Ok(())
}

#[test]
fn unsupported_extensions_and_markers_are_invisible() -> Result<()> {
    let harness = IntegrationHarness::new();
    let mut toolbox = harness.toolbox();
    toolbox.categories().add_main("misc")?;
    let dir = toolbox.root.path().join("misc");
    harness.write_tool(&dir, "keep.exe");
    harness.write_tool(&dir, "skip.xyz");
    harness.write_tool(&dir, "noext");

    let page = toolbox.load_catalog(&Selection::Main(1), &ViewFilter::default())?;
    let names: Vec<&str> = page.tools.iter().map(|tool| tool.name.as_str()).collect();
    assert_eq!(names, vec!["keep"]);
    Ok(())
}

#[test]
fn missing_directory_degrades_to_an_empty_page() -> Result<()> {
    let harness = IntegrationHarness::new();
    let mut toolbox = harness.toolbox();
    toolbox.categories().add_main("ghost")?;
    std::fs::remove_dir_all(toolbox.root.path().join("ghost"))?;

    let page = toolbox.load_catalog(&Selection::Main(1), &ViewFilter::default())?;
    assert_eq!(page.count, 0);
    assert!(page.tools.is_empty());
    Ok(())
}

#[test]
fn search_and_type_filters_narrow_the_page() -> Result<()> {
    let harness = IntegrationHarness::new();
    let mut toolbox = harness.toolbox();
    toolbox.categories().add_main("mixed")?;
    let dir = toolbox.root.path().join("mixed");
    harness.write_tool(&dir, "installer.msi");
    harness.write_tool(&dir, "notes.txt");
    harness.write_tool(&dir, "backup.zip");

    let search = toolbox.load_catalog(
        &Selection::Main(1),
        &ViewFilter {
            query: Some("INSTALL".to_string()),
            kind: None,
        },
    )?;
    let names: Vec<&str> = search.tools.iter().map(|tool| tool.name.as_str()).collect();
    assert_eq!(names, vec!["installer"]);

    let by_kind = toolbox.load_catalog(
        &Selection::Main(1),
        &ViewFilter {
            query: None,
            kind: Some(ToolKind::Archive),
        },
    )?;
    let names: Vec<&str> = by_kind.tools.iter().map(|tool| tool.name.as_str()).collect();
    assert_eq!(names, vec!["backup"]);
    Ok(())
}

#[test]
fn path_selection_is_clamped_to_the_root() -> Result<()> {
    let harness = IntegrationHarness::new();
    let mut toolbox = harness.toolbox();
    toolbox.categories().add_main("safe")?;
    harness.write_tool(&toolbox.root.path().join("safe"), "inside.exe");
    // A hostile selection outside the root falls back to the root itself.
    let escape = toolbox.root.path().join("..").join("..").join("etc");

    let page = toolbox.load_catalog(&Selection::Path(escape), &ViewFilter::default())?;
    assert_eq!(page.label, ALL_TOOLS_LABEL);
    Ok(())
}

#[test]
fn custom_name_and_note_overrides_win_over_the_stem() -> Result<()> {
    let harness = IntegrationHarness::new();
    let mut toolbox = harness.toolbox();
    toolbox.categories().add_main("games")?;
    let tool = harness.write_tool(&toolbox.root.path().join("games"), "setup.exe");
    toolbox.rename_tool(&tool, "Fancy Installer");
    toolbox.update_tool_note(&tool, "run as admin");

    let page = toolbox.load_catalog(&Selection::Main(1), &ViewFilter::default())?;
    assert_eq!(page.tools[0].name, "Fancy Installer");
    assert_eq!(page.tools[0].note, "run as admin");
    Ok(())
}
