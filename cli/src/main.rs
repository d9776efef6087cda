//! Archipelago CLI - place a page's islands and drive them to interactivity.
//!
//! ```text
//! requests.json -> IslandService::create_batch -> hydrate_all -> JSON report
//! ```
//!
//! Island requests are read as a JSON array from the file named on the
//! command line, or from stdin. Components come from the config file when it
//! defines any markup components, otherwise the built-in `Button` and `Input`
//! demo components are registered. Islands render into an in-memory host.
//!
//! The report goes to stdout; logs go to stderr (`RUST_LOG`, default `info`).

use anyhow::{Context, Result, bail};
use serde_json::{Value, json};
use std::{
    env, fs,
    io::{self, Read, Write},
    sync::Arc,
};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use archipelago_config::ArchipelagoConfig;
use archipelago_islands::markup::escape_html;
use archipelago_islands::{
    AdapterKind, IslandId, IslandManager, IslandRequest, IslandService, ManagerSettings,
    MarkupAdapter, MarkupComponent, MemoryHost, Priority, Props, RegisterOptions,
};

const USAGE: &str = "usage: archipelago [REQUESTS.json | -]";

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    // stdout carries the report, so logs must stay on stderr.
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(env_filter)
        .init();
}

fn read_input(arg: Option<&str>) -> Result<String> {
    match arg {
        None | Some("-") => {
            let mut input = String::new();
            io::stdin()
                .read_to_string(&mut input)
                .context("reading island requests from stdin")?;
            Ok(input)
        }
        Some(path) => {
            fs::read_to_string(path).with_context(|| format!("reading island requests from {path}"))
        }
    }
}

fn prop_str<'a>(props: &'a Props, key: &str) -> Option<&'a str> {
    props.get(key).and_then(Value::as_str)
}

fn builtin_button() -> MarkupComponent {
    MarkupComponent::new(|props| {
        let label = prop_str(props, "label").ok_or("Button needs a string \"label\" prop")?;
        let variant = prop_str(props, "variant").unwrap_or("primary");
        let disabled = props
            .get("disabled")
            .and_then(Value::as_bool)
            .unwrap_or(false);
        Ok(format!(
            "<button class=\"btn btn-{}\"{}>{}</button>",
            escape_html(variant),
            if disabled { " disabled" } else { "" },
            escape_html(label)
        ))
    })
}

fn builtin_input() -> MarkupComponent {
    MarkupComponent::new(|props| {
        let kind = prop_str(props, "type").unwrap_or("text");
        let placeholder = prop_str(props, "placeholder").unwrap_or_default();
        let value = prop_str(props, "value").unwrap_or_default();
        Ok(format!(
            "<input type=\"{}\" placeholder=\"{}\" value=\"{}\">",
            escape_html(kind),
            escape_html(placeholder),
            escape_html(value)
        ))
    })
}

fn register_builtins(manager: &mut IslandManager) -> Result<()> {
    manager.register(
        "Button",
        builtin_button().into_factory(),
        RegisterOptions::new(AdapterKind::Vanilla).priority(Priority::High),
    )?;
    manager.register(
        "Input",
        builtin_input().into_factory(),
        RegisterOptions::new(AdapterKind::Vanilla),
    )?;
    tracing::debug!("Registered built-in components");
    Ok(())
}

/// Register configured markup components, falling back to the built-ins.
fn register_components(
    manager: &mut IslandManager,
    config: Option<&ArchipelagoConfig>,
) -> Result<usize> {
    let Some(config) = config.filter(|config| config.markup_components().next().is_some()) else {
        register_builtins(manager)?;
        return Ok(2);
    };

    let mut registered = 0;
    for (name, component, template) in config.markup_components() {
        let options = RegisterOptions {
            adapter_kind: AdapterKind::Vanilla,
            ssr: component.ssr,
            hydrate: component.hydrate,
            priority: component.priority,
        };
        manager
            .register(
                name,
                MarkupComponent::template(template).into_factory(),
                options,
            )
            .with_context(|| format!("registering component {name}"))?;
        registered += 1;
    }
    for (name, component) in &config.components {
        if !manager.registry().contains(name) {
            tracing::warn!(
                component = %name,
                kind = %component.adapter,
                "Skipping component: only vanilla components with a template can render here"
            );
        }
    }
    Ok(registered)
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let arg = env::args().nth(1);
    if matches!(arg.as_deref(), Some("-h" | "--help")) {
        println!("{USAGE}");
        return Ok(());
    }

    init_tracing();

    let input = read_input(arg.as_deref())?;
    let requests: Vec<IslandRequest> =
        serde_json::from_str(&input).context("island requests must be a JSON array")?;

    let config = ArchipelagoConfig::load().ok().flatten();
    let mut settings = ManagerSettings::default();
    if let Some(prefix) = config.as_ref().and_then(ArchipelagoConfig::container_prefix) {
        settings.container_prefix = prefix.to_string();
    }

    // The page: one container per requested island.
    let host = MemoryHost::new();
    let ids: Vec<IslandId> = requests
        .iter()
        .filter_map(|request| IslandId::new(request.id.as_str()).ok())
        .collect();
    host.insert_island_containers(&settings.container_prefix, &ids);

    let mut manager = IslandManager::with_settings(host.clone(), settings);
    manager.register_adapter(Arc::new(MarkupAdapter::new(host.clone())));
    let components = register_components(&mut manager, config.as_ref())?;
    tracing::info!(
        components,
        islands = requests.len(),
        "Placing islands"
    );

    let mut service = IslandService::new(manager);
    let batch = service
        .create_batch(requests)
        .context("creating islands")?;
    let hydration = service.hydrate_all().await;

    let manager = service.manager();
    let rendered: Vec<Value> = manager
        .islands()
        .map(|island| {
            let slot = host.slot(island.container()).unwrap_or_default();
            json!({
                "id": island.id(),
                "container": island.container().as_str(),
                "markup": slot.markup,
                "interactive": slot.interactive,
            })
        })
        .collect();
    let resume: Vec<_> = manager.islands().map(|island| island.transport()).collect();
    let report = json!({
        "message": batch.message,
        "islands": service.list(),
        "hydration": hydration,
        "rendered": rendered,
        "resume": resume,
        "stats": service.stats(),
    });

    let mut out = io::stdout().lock();
    serde_json::to_writer_pretty(&mut out, &report).context("writing report")?;
    writeln!(out)?;
    drop(out);

    let torn_down = service.manager_mut().unmount_all();
    tracing::info!(count = torn_down, "Islands torn down");

    if !hydration.failures.is_empty() {
        bail!("{} island(s) failed to hydrate", hydration.failures.len());
    }
    Ok(())
}
