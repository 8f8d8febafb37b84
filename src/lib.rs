pub mod assertion;
pub mod capture;
pub mod cli;
pub mod config;
pub mod expression;
pub mod filter;
pub mod logging;
pub mod notify;
pub mod query;
pub mod report;
pub mod routing;
pub mod store;

use anyhow::{Context, bail};
use serde_json::json;
use std::path::Path;
use std::sync::Arc;

pub use assertion::{Assertion, AssertionCompiler, AssertionContext, ConfigurationError, EvaluationFault};
pub use capture::{CapturedError, ExceptionInfo, RecordId, RequestContext, StoredRecord};
pub use cli::{Commands, OutputFormat, cli_parse};
pub use config::{SieveConfig, load_config};
pub use expression::Expression;
pub use filter::{ChannelSet, Filter, FilterPipeline, Verdict};
pub use notify::{Notifier, NotifyError};
pub use query::{FilterCollection, QueryFilter};
pub use routing::{Delivery, ErrorRouter, RouteOutcome};
pub use store::{ErrorStore, FileStore, MemoryStore, Page, StoreError};

/// Filter source reported to assertions evaluated by `fault-sieve evaluate`
const EVALUATE_SOURCE: &str = "cli";

fn print_json(value: &serde_json::Value) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn open_store(config: &SieveConfig, path: Option<&Path>) -> anyhow::Result<Arc<dyn ErrorStore>> {
    match path {
        Some(path) => Ok(Arc::new(
            FileStore::open(path).with_context(|| format!("Failed to open store '{}'", path.display()))?,
        )),
        None => config.build_store().context("Failed to open configured store"),
    }
}

fn compile_pipeline(config: &SieveConfig, rules: Option<&Path>) -> anyhow::Result<FilterPipeline> {
    let compiler = AssertionCompiler::new();
    match rules {
        Some(path) => Ok(FilterPipeline::new(filter::load_rules(path, &compiler)?)),
        None => Ok(config.build_pipeline(&compiler)?),
    }
}

fn load_error(config: &SieveConfig, path: &Path) -> anyhow::Result<CapturedError> {
    let error = capture::load_captured_error(path)?;
    Ok(config.stamp(error))
}

pub fn run() -> anyhow::Result<()> {
    let cli = cli_parse();
    let config = load_config(cli.config.as_deref()).context("Failed to load config")?;
    logging::init(cli.verbose, config.log_level.as_deref());
    let format = cli.format;

    match cli.command {
        Commands::Check { rules } => {
            let compiler = AssertionCompiler::new();
            let filters = filter::load_rules(&rules, &compiler)?;

            match format {
                OutputFormat::Text => print!("{}", report::format_filters(&filters)),
                OutputFormat::Json => {
                    let entries: Vec<_> = filters
                        .iter()
                        .map(|f| {
                            json!({
                                "name": f.name(),
                                "channels": f.channels(),
                                "test": f.assertion().to_string(),
                            })
                        })
                        .collect();
                    print_json(&json!({ "filters": entries }))?;
                }
            }
        }
        Commands::Evaluate { rules, error } => {
            let pipeline = compile_pipeline(&config, rules.as_deref())?;
            let captured = load_error(&config, &error)?;
            let ctx = AssertionContext::new(&captured).with_filter_source(EVALUATE_SOURCE);
            let verdict = pipeline.evaluate_in(&ctx);

            match format {
                OutputFormat::Text => println!("{}", report::format_verdict(&verdict)),
                OutputFormat::Json => print_json(&serde_json::to_value(&verdict)?)?,
            }
        }
        Commands::Capture { error } => {
            let pipeline = compile_pipeline(&config, None)?;
            let store = config.build_store().context("Failed to open configured store")?;
            let router = ErrorRouter::new(pipeline, store).with_notifiers(config.build_notifiers());

            let captured = load_error(&config, &error)?;
            let outcome = router.route(captured);

            match format {
                OutputFormat::Text => print!("{}", report::format_outcome(&outcome)),
                OutputFormat::Json => print_json(&report::outcome_json(&outcome))?,
            }
            if let RouteOutcome::Unrecorded { error, .. } = outcome {
                bail!("Captured error was not recorded: {error}");
            }
        }
        Commands::List {
            store,
            filters,
            search,
            offset,
            page_size,
        } => {
            let store = open_store(&config, store.as_deref())?;
            let query = FilterCollection::from_lines(&filters).with_search(search.unwrap_or_default());
            let page_size = page_size.unwrap_or(config.query.page_size);
            let page = store.get_page(&query, offset, page_size)?;

            match format {
                OutputFormat::Text => print!("{}", report::format_page(&page, offset)),
                OutputFormat::Json => print_json(&serde_json::to_value(&page)?)?,
            }
        }
        Commands::Show { store, id } => {
            let store = open_store(&config, store.as_deref())?;
            let id: RecordId = id
                .parse()
                .with_context(|| format!("Invalid record id '{id}'"))?;
            let Some(record) = store.get_by_id(&id)? else {
                bail!("No stored error with id {id}");
            };

            match format {
                OutputFormat::Text => print!("{}", report::format_record(&record)),
                OutputFormat::Json => print_json(&serde_json::to_value(&record)?)?,
            }
        }
    }

    Ok(())
}
