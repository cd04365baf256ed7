//! Small repetitive HTML fragments.
//!
//! # Responsibility
//! - Render sortable column headers through a theme layout file.
//! - Build tooltip text, state icons and the tooltip activation script.
//!
//! # Invariants
//! - Layouts live at `<theme>/html/utility/<name>.html`; a missing layout is
//!   reported as `HtmlError::LayoutNotFound` (code 404), never rendered empty.
//! - Layout placeholders `{{field}}` receive HTML-escaped values.

use crate::assets::require_config::RequireConfigBuilder;
use crate::text::Translator;
use log::warn;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

const LAYOUT_DIR: &str = "html/utility";
const LAYOUT_EXTENSION: &str = "html";
const SORT_LAYOUT: &str = "sort";
const ORDER_ICON_ASC: &str = "fa-toggle-up";
const ORDER_ICON_DESC: &str = "fa-toggle-down";
const TOOLTIP_DEPENDENCY: &str = "bootstrap";
const TOOLTIP_SCRIPT: &str =
    "$('[data-toggle=\"tooltip\"], .hasTooltip').tooltip({container:'body',html:true});";

static PLACEHOLDER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\{\{\s*([A-Za-z_][A-Za-z0-9_]*)\s*\}\}").expect("placeholder pattern is valid")
});

pub type HtmlResult<T> = Result<T, HtmlError>;

#[derive(Debug)]
pub enum HtmlError {
    LayoutNotFound { layout: String, path: PathBuf },
    Io { path: PathBuf, source: std::io::Error },
    Serialize(serde_json::Error),
}

impl HtmlError {
    /// HTTP-style status code for top-level handlers.
    pub fn code(&self) -> u16 {
        match self {
            Self::LayoutNotFound { .. } => 404,
            Self::Io { .. } | Self::Serialize(_) => 500,
        }
    }
}

impl Display for HtmlError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::LayoutNotFound { layout, .. } => {
                write!(f, "HtmlUtility Layout Path Not Found : {layout}")
            }
            Self::Io { path, source } => {
                write!(f, "failed to read layout `{}`: {source}", path.display())
            }
            Self::Serialize(err) => write!(f, "failed to prepare layout data: {err}"),
        }
    }
}

impl Error for HtmlError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::LayoutNotFound { .. } => None,
            Self::Io { source, .. } => Some(source),
            Self::Serialize(err) => Some(err),
        }
    }
}

/// Input of [`HtmlRenderer::sort`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortRequest {
    pub title: String,
    /// Field this column sorts on.
    pub order: String,
    /// Current direction (`asc` or `desc`, any case).
    pub direction: String,
    /// Field currently sorted on.
    pub selected: String,
    pub task: Option<String>,
    /// Direction applied when this column is not the selected one.
    pub new_direction: String,
    pub tip: String,
    pub icon: Option<String>,
    pub form_name: String,
}

impl SortRequest {
    pub fn new(title: impl Into<String>, order: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            order: order.into(),
            direction: "asc".to_string(),
            selected: String::new(),
            task: None,
            new_direction: "asc".to_string(),
            tip: String::new(),
            icon: None,
            form_name: "form-admin".to_string(),
        }
    }
}

/// Values handed to the `sort` layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SortLayoutData {
    pub order: String,
    pub direction: String,
    pub selected: String,
    pub task: Option<String>,
    pub tip: String,
    pub title: String,
    pub order_icon: String,
    pub icon: Option<String>,
    pub form_name: String,
}

impl SortLayoutData {
    /// Resolves the next direction and the icon for the current one.
    pub fn from_request(request: &SortRequest) -> Self {
        let current = request.direction.to_lowercase();
        let order_icon = if current == "desc" {
            ORDER_ICON_DESC
        } else {
            ORDER_ICON_ASC
        };

        let direction = if request.order != request.selected {
            request.new_direction.clone()
        } else if current == "desc" {
            "asc".to_string()
        } else {
            "desc".to_string()
        };

        Self {
            order: request.order.clone(),
            direction,
            selected: request.selected.clone(),
            task: request.task.clone(),
            tip: request.tip.clone(),
            title: request.title.clone(),
            order_icon: order_icon.to_string(),
            icon: request.icon.clone(),
            form_name: request.form_name.clone(),
        }
    }
}

/// Options of [`HtmlRenderer::state`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateOptions {
    pub tooltips: bool,
    pub tooltip_placement: String,
    pub href: String,
    pub class: Option<String>,
    pub attribs: Vec<(String, String)>,
}

impl Default for StateOptions {
    fn default() -> Self {
        Self {
            tooltips: true,
            tooltip_placement: "top".to_string(),
            href: "#".to_string(),
            class: None,
            attribs: Vec::new(),
        }
    }
}

pub struct HtmlRenderer<'a> {
    translator: &'a dyn Translator,
    layout_root: PathBuf,
}

impl<'a> HtmlRenderer<'a> {
    /// Layouts are looked up under `<theme_path>/html/utility`.
    pub fn new(translator: &'a dyn Translator, theme_path: impl AsRef<Path>) -> Self {
        Self {
            translator,
            layout_root: theme_path.as_ref().join(LAYOUT_DIR),
        }
    }

    /// Renders a sortable column header.
    pub fn sort(&self, request: &SortRequest) -> HtmlResult<String> {
        self.render(SORT_LAYOUT, &SortLayoutData::from_request(request))
    }

    /// Combines a title and content into Bootstrap tooltip markup.
    pub fn tooltip_text(&self, title: &str, content: &str, translate: bool, escape: bool) -> String {
        if title.is_empty() && content.is_empty() {
            return String::new();
        }

        let (mut title, mut content) = if translate {
            (self.translator.text(title), self.translator.text(content))
        } else {
            (title.to_string(), content.to_string())
        };

        if escape {
            title = escape_html(&title);
            content = escape_html(&content);
        }

        if title.is_empty() {
            return content;
        }
        if title == content {
            return format!("<strong>{title}</strong>");
        }
        if !content.is_empty() {
            return format!("<strong>{title}</strong><br />{content}");
        }
        title
    }

    /// Queues the script that activates tooltips once the page is ready.
    pub fn tooltip(&self, loader: &mut RequireConfigBuilder) {
        loader.schedule_on_ready(TOOLTIP_SCRIPT, false, TOOLTIP_DEPENDENCY);
    }

    /// Renders the state icon link for a record state value.
    ///
    /// Known states: `1` published, `0` unpublished, `2` archived,
    /// `-2` trashed. Anything else renders as unpublished.
    pub fn state(&self, value: i32, options: &StateOptions) -> String {
        let state = State::from_value(value);

        let mut class = options.class.clone().unwrap_or_default();
        if options.tooltips {
            class.push_str(" hasTooltip");
        }

        let mut html = format!("<a href=\"{}\"", options.href);
        if !class.is_empty() {
            html.push_str(&format!(" class=\"{class}\""));
        }
        if !options.attribs.is_empty() {
            html.push(' ');
            html.push_str(&attributes_to_string(&options.attribs));
        }
        if options.tooltips {
            html.push_str(&format!(
                " data-toggle=\"tooltip\" data-placement=\"{}\" title=\"{}\"",
                options.tooltip_placement,
                self.tooltip_text(state.label_key(), "", true, true)
            ));
        }
        html.push_str(&format!("><span class=\"fa fa-{}\"></span></a>", state.icon()));
        html
    }

    /// Renders `<layout_root>/<layout>.html` with `data` placeholders.
    pub fn render<T: Serialize>(&self, layout: &str, data: &T) -> HtmlResult<String> {
        let path = self
            .layout_root
            .join(format!("{layout}.{LAYOUT_EXTENSION}"));
        if !path.is_file() {
            warn!(
                "event=layout_render module=html status=error reason=not_found layout={layout}"
            );
            return Err(HtmlError::LayoutNotFound {
                layout: layout.to_string(),
                path,
            });
        }

        let template = std::fs::read_to_string(&path).map_err(|source| HtmlError::Io {
            path: path.clone(),
            source,
        })?;
        let values = serde_json::to_value(data).map_err(HtmlError::Serialize)?;

        let rendered = PLACEHOLDER.replace_all(&template, |caps: &regex::Captures<'_>| {
            match values.get(&caps[1]) {
                Some(serde_json::Value::String(value)) => escape_html(value),
                Some(serde_json::Value::Null) | None => String::new(),
                Some(other) => escape_html(&other.to_string()),
            }
        });
        Ok(rendered.into_owned())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Unpublished,
    Published,
    Archived,
    Trashed,
}

impl State {
    fn from_value(value: i32) -> Self {
        match value {
            1 => Self::Published,
            2 => Self::Archived,
            -2 => Self::Trashed,
            _ => Self::Unpublished,
        }
    }

    fn label_key(self) -> &'static str {
        match self {
            Self::Unpublished => "APP_GLOBAL_STATE_0",
            Self::Published => "APP_GLOBAL_STATE_1",
            Self::Archived => "APP_GLOBAL_STATE_2",
            Self::Trashed => "APP_GLOBAL_STATE__2",
        }
    }

    fn icon(self) -> &'static str {
        match self {
            Self::Unpublished => "times",
            Self::Published => "check",
            Self::Archived => "archive",
            Self::Trashed => "trash",
        }
    }
}

/// Escapes `&`, `<`, `>`, `"` and `'` for HTML text and attributes.
pub fn escape_html(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#039;"),
            _ => out.push(c),
        }
    }
    out
}

/// Joins attributes as `key="value"` pairs separated by spaces.
pub fn attributes_to_string(attribs: &[(String, String)]) -> String {
    attribs
        .iter()
        .map(|(key, value)| format!("{key}=\"{}\"", escape_html(value)))
        .collect::<Vec<_>>()
        .join(" ")
}
