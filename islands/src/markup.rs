//! Built-in adapter for the `vanilla` kind: components that render plain HTML.
//!
//! Markup is written into a [`MemoryHost`] container on mount. Hydration
//! checks the container still holds what was rendered and then marks it
//! interactive; unmount clears the container.

use std::fmt;
use std::sync::Arc;

use archipelago_types::{AdapterKind, IslandId, Props};
use serde_json::Value;

use crate::adapter::{Adapter, AdapterError, AdapterFut, InstanceHandle};
use crate::host::{ContainerRef, MemoryHost};
use crate::registry::ComponentFactory;

type RenderFn = dyn Fn(&Props) -> Result<String, String> + Send + Sync;

/// Factory type understood by [`MarkupAdapter`].
#[derive(Clone)]
pub struct MarkupComponent {
    render: Arc<RenderFn>,
}

impl MarkupComponent {
    pub fn new(render: impl Fn(&Props) -> Result<String, String> + Send + Sync + 'static) -> Self {
        Self {
            render: Arc::new(render),
        }
    }

    /// A component rendered from a `{prop}` template. Values are HTML-escaped;
    /// missing props render as empty.
    pub fn template(template: impl Into<String>) -> Self {
        let template = template.into();
        Self::new(move |props| Ok(render_template(&template, props)))
    }

    pub fn render(&self, props: &Props) -> Result<String, String> {
        (self.render)(props)
    }

    #[must_use]
    pub fn into_factory(self) -> ComponentFactory {
        ComponentFactory::new(self)
    }
}

impl fmt::Debug for MarkupComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("MarkupComponent(..)")
    }
}

/// Adapter-owned state for a mounted markup island.
#[derive(Debug)]
struct MarkupInstance {
    markup: String,
}

#[derive(Debug, Clone)]
pub struct MarkupAdapter {
    host: MemoryHost,
}

impl MarkupAdapter {
    #[must_use]
    pub fn new(host: MemoryHost) -> Self {
        Self { host }
    }
}

impl Adapter for MarkupAdapter {
    fn kind(&self) -> AdapterKind {
        AdapterKind::Vanilla
    }

    fn mount<'a>(
        &'a self,
        factory: &'a ComponentFactory,
        container: &'a ContainerRef,
        props: &'a Props,
    ) -> AdapterFut<'a, InstanceHandle> {
        Box::pin(async move {
            let component = factory
                .downcast_ref::<MarkupComponent>()
                .ok_or_else(|| AdapterError::new("Vanilla component must be a markup component"))?;
            let markup = component
                .render(props)
                .map_err(|e| AdapterError::new(format!("render failed: {e}")))?;
            self.host
                .attach(container, AdapterKind::Vanilla, markup.clone())
                .map_err(|e| AdapterError::with_source("cannot attach markup", e))?;
            Ok(InstanceHandle::new(
                AdapterKind::Vanilla,
                MarkupInstance { markup },
            ))
        })
    }

    fn hydrate<'a>(
        &'a self,
        instance: &'a InstanceHandle,
        container: &'a ContainerRef,
        _props: &'a Props,
    ) -> AdapterFut<'a, ()> {
        Box::pin(async move {
            let instance = instance
                .downcast_ref::<MarkupInstance>(AdapterKind::Vanilla)
                .ok_or_else(|| AdapterError::new("instance was not produced by this adapter"))?;
            let current = self
                .host
                .markup(container)
                .ok_or_else(|| AdapterError::new(format!("container {container} is gone")))?;
            if current != instance.markup {
                return Err(AdapterError::new(format!(
                    "hydration mismatch in {container}: markup changed since mount"
                )));
            }
            self.host
                .set_interactive(container)
                .map_err(|e| AdapterError::with_source("cannot attach listeners", e))
        })
    }

    fn unmount(
        &self,
        instance: InstanceHandle,
        container: &ContainerRef,
    ) -> Result<(), AdapterError> {
        drop(instance);
        self.host
            .detach(container)
            .map_err(|e| AdapterError::with_source("cannot clear container", e))
    }
}

/// Substitute `{name}` placeholders with escaped prop values.
///
/// A brace not followed by `name}` (letters, digits, `_`, `-`) is kept as-is.
#[must_use]
pub fn render_template(template: &str, props: &Props) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let key_len = after
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_' || c == '-'))
            .unwrap_or(after.len());
        if key_len > 0 && after[key_len..].starts_with('}') {
            let key = &after[..key_len];
            if let Some(value) = props.get(key) {
                out.push_str(&escape_html(&value_text(value)));
            }
            rest = &after[key_len + 1..];
        } else {
            out.push('{');
            rest = after;
        }
    }
    out.push_str(rest);
    out
}

fn value_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[must_use]
pub fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

/// Placeholder element the server emits for an island.
#[must_use]
pub fn placement_markup(container: &ContainerRef, id: &IslandId, component: &str) -> String {
    format!(
        "<div id=\"{}\" data-island=\"{}\" data-component=\"{}\"></div>",
        escape_html(container.as_str()),
        escape_html(id.as_str()),
        escape_html(component)
    )
}
