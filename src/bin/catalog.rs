use std::env;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use toolchest::{format_size, Selection, Toolbox, ToolKind, ViewFilter};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();
    let command = CliCommand::parse()?;
    let mut toolbox = Toolbox::open()?;
    match command {
        CliCommand::Init => {
            println!("Toolbox home: {}", toolbox.paths.home.display());
            println!("Storage root: {}", toolbox.root.path().display());
            println!("Config file:  {}", toolbox.paths.config_file.display());
        }
        CliCommand::AddCategory { name, main } => match main {
            Some(main) => {
                let ordinal = toolbox.categories().add_sub(main, &name)?;
                println!("Added subcategory {main}_{ordinal}: {name}");
            }
            None => {
                let ordinal = toolbox.categories().add_main(&name)?;
                println!("Added category {ordinal}: {name}");
            }
        },
        CliCommand::Categories => {
            for node in toolbox.category_nodes() {
                println!("{}. {}", node.ordinal, node.name);
                for sub in &node.subcategories {
                    println!("   {}.{} {}", node.ordinal, sub.ordinal, sub.name);
                }
            }
        }
        CliCommand::Usage => {
            for (key, record) in toolbox.usage.iter() {
                println!(
                    "{:<40} {:>5} runs  last used {}",
                    key, record.usage_count, record.last_used
                );
            }
        }
        CliCommand::Tools { selection, filter } => {
            let page = toolbox.load_catalog(&selection, &filter)?;
            println!("{} ({})", page.label, page.count);
            for tool in &page.tools {
                println!(
                    "{:<30} {:<10} {:>10}  {}",
                    tool.name,
                    tool.kind,
                    format_size(tool.size),
                    tool.path.display()
                );
            }
        }
    }
    Ok(())
}

enum CliCommand {
    Init,
    AddCategory { name: String, main: Option<u32> },
    Categories,
    Usage,
    Tools { selection: Selection, filter: ViewFilter },
}

impl CliCommand {
    fn parse() -> Result<Self> {
        let mut args = env::args().skip(1);
        let command = match args.next().as_deref() {
            Some("init") | None => CliCommand::Init,
            Some("add") => {
                let mut name = None;
                let mut main = None;
                while let Some(arg) = args.next() {
                    match arg.as_str() {
                        "--main" => {
                            let value = args.next().context("Expected an ordinal after --main")?;
                            main = Some(value.parse().context("--main takes a number")?);
                        }
                        other => name = Some(other.to_string()),
                    }
                }
                let name = name.context("Usage: catalog add <name> [--main <ordinal>]")?;
                CliCommand::AddCategory { name, main }
            }
            Some("categories") => CliCommand::Categories,
            Some("usage") => CliCommand::Usage,
            Some("tools") => {
                let mut selection = Selection::AllTools;
                let mut filter = ViewFilter::default();
                while let Some(arg) = args.next() {
                    match arg.as_str() {
                        "--category" => {
                            let value = args
                                .next()
                                .context("Expected an ordinal after --category")?;
                            selection = Selection::Main(
                                value.parse().context("--category takes a number")?,
                            );
                        }
                        "--path" => {
                            let value = args.next().context("Expected a path after --path")?;
                            selection = Selection::Path(PathBuf::from(value));
                        }
                        "--type" => {
                            let value = args.next().context("Expected a type after --type")?;
                            filter.kind = Some(
                                ToolKind::from_label(&value)
                                    .with_context(|| format!("Unknown tool type {value:?}"))?,
                            );
                        }
                        query => filter.query = Some(query.to_string()),
                    }
                }
                CliCommand::Tools { selection, filter }
            }
            Some(other) => bail!(
                "Unknown command {other:?}. Commands: init, add, categories, usage, tools"
            ),
        };
        Ok(command)
    }
}
