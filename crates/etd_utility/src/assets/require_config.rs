//! Request-scoped RequireJS configuration builder.
//!
//! # Responsibility
//! - Record modules, packages and path remaps for the loader configuration.
//! - Queue inline scripts grouped by the dependency list they wait for.
//! - Collect translated strings shipped to the client text module.
//! - Render everything as one script block.
//!
//! # Invariants
//! - Module and package keys are lowercased; client string keys uppercased.
//! - Modules: last registration wins. Packages: first registration wins.
//! - A script appears at most once per invocation group.
//! - The default package and default path remap are always seeded.
//! - `render` never mutates the accumulated state; it only advances the
//!   builder's own cache-busting clock.

use crate::assets::bust::BustClock;
use crate::assets::module_name::{is_bindable, parameter_name};
use crate::text::{TranslateOptions, Translator};
use indexmap::IndexMap;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;

/// Module id of the DOM-ready plugin.
pub const DOM_READY_MODULE: &str = "domReady";
/// Path of the DOM-ready plugin relative to the base URL.
pub const DOM_READY_PATH: &str = "js/vendor/domReady";
/// Module id of the client text store fed by [`RequireConfigBuilder::register_string`].
pub const TEXT_MODULE: &str = "etdsolutions/text";

const DOM_READY_DEPENDENCY: &str = "domReady!";
const UI_LIBRARY_DEPENDENCY: &str = "jquery";
const DEPENDENCY_SEPARATOR: char = ',';

const DEFAULT_PACKAGE_NAME: &str = "etdsolutions";
const DEFAULT_PACKAGE_LOCATION: &str = "js/etdsolutions";
const DEFAULT_PACKAGE_MAIN: &str = "app";
const DEFAULT_REMAP_PREFIX: &str = "*";
const DEFAULT_REMAP_FROM: &str = "css";
const DEFAULT_REMAP_TO: &str = "js/vendor/css.min";

/// Loader metadata for scripts that do not declare their own dependencies.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Shim {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deps: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exports: Option<String>,
    /// Name of an initialization function, emitted as a string reference.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub init: Option<String>,
}

impl Shim {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn deps<I, S>(mut self, deps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.deps = Some(deps.into_iter().map(Into::into).collect());
        self
    }

    pub fn exports(mut self, symbol: impl Into<String>) -> Self {
        self.exports = Some(symbol.into());
        self
    }

    pub fn init(mut self, reference: impl Into<String>) -> Self {
        self.init = Some(reference.into());
        self
    }
}

/// One registered module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleEntry {
    /// Identifier as spelled by the latest registration.
    pub id: String,
    pub path: String,
    pub shim: Option<Shim>,
}

/// One registered package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum PackageEntry {
    /// Short form: the package root is its own name.
    Bare(String),
    /// Structured form with an explicit location and/or entry point.
    Located {
        name: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        location: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        main: Option<String>,
    },
}

impl PackageEntry {
    pub fn name(&self) -> &str {
        match self {
            Self::Bare(name) => name,
            Self::Located { name, .. } => name,
        }
    }
}

/// Textual shape of the `packages` configuration entry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PackageListShape {
    /// Each package as a bare string or structured object.
    #[default]
    Entries,
    /// Flat list of package names.
    Names,
}

/// Accumulator for one page render.
#[derive(Debug, Clone)]
pub struct RequireConfigBuilder {
    modules: IndexMap<String, ModuleEntry>,
    packages: IndexMap<String, PackageEntry>,
    path_remaps: IndexMap<String, IndexMap<String, String>>,
    groups: IndexMap<String, Vec<String>>,
    strings: IndexMap<String, String>,
    package_shape: PackageListShape,
    bust: BustClock,
}

impl Default for RequireConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RequireConfigBuilder {
    /// Creates a builder seeded with the default package and path remap.
    pub fn new() -> Self {
        let mut builder = Self {
            modules: IndexMap::new(),
            packages: IndexMap::new(),
            path_remaps: IndexMap::new(),
            groups: IndexMap::new(),
            strings: IndexMap::new(),
            package_shape: PackageListShape::default(),
            bust: BustClock::new(),
        };
        builder.seed_defaults();
        builder
    }

    /// Selects how the package list is written by [`Self::render`].
    pub fn with_package_shape(mut self, shape: PackageListShape) -> Self {
        self.package_shape = shape;
        self
    }

    /// Drops everything accumulated so far and re-seeds the defaults.
    ///
    /// The package list shape is kept.
    pub fn reset(&mut self) {
        self.modules.clear();
        self.packages.clear();
        self.path_remaps.clear();
        self.groups.clear();
        self.strings.clear();
        self.seed_defaults();
    }

    fn seed_defaults(&mut self) {
        self.register_package(
            DEFAULT_PACKAGE_NAME,
            Some(DEFAULT_PACKAGE_LOCATION),
            Some(DEFAULT_PACKAGE_MAIN),
        );
        self.add_path_remap(DEFAULT_REMAP_PREFIX, DEFAULT_REMAP_FROM, DEFAULT_REMAP_TO);
    }

    /// Records a module path, replacing any earlier registration of `id`.
    pub fn register_module(&mut self, id: &str, path: &str, shim: Option<Shim>) -> &mut Self {
        self.modules.insert(
            id.to_lowercase(),
            ModuleEntry {
                id: id.to_string(),
                path: path.to_string(),
                shim,
            },
        );
        self
    }

    /// Records a package unless one with the same (lowercased) id exists.
    pub fn register_package(
        &mut self,
        id: &str,
        location: Option<&str>,
        main: Option<&str>,
    ) -> &mut Self {
        let name = id.to_lowercase();
        if self.packages.contains_key(&name) {
            return self;
        }

        let entry = if location.is_some() || main.is_some() {
            PackageEntry::Located {
                name: name.clone(),
                location: location.map(str::to_string),
                main: main.map(str::to_string),
            }
        } else {
            PackageEntry::Bare(name.clone())
        };
        self.packages.insert(name, entry);
        self
    }

    /// Maps `from` to `to` for modules matching `prefix`.
    pub fn add_path_remap(&mut self, prefix: &str, from: &str, to: &str) -> &mut Self {
        self.path_remaps
            .entry(prefix.to_string())
            .or_default()
            .insert(from.to_string(), to.to_string());
        self
    }

    /// Queues `script` to run once the DOM and the UI library are ready.
    ///
    /// `extra_dependencies` is a comma separated list loaded alongside.
    pub fn schedule_on_ready(
        &mut self,
        script: &str,
        prepend: bool,
        extra_dependencies: &str,
    ) -> &mut Self {
        let mut token = UI_LIBRARY_DEPENDENCY.to_string();
        if !extra_dependencies.is_empty() {
            token.push_str(", ");
            token.push_str(extra_dependencies);
        }
        token.push_str(", ");
        token.push_str(DOM_READY_DEPENDENCY);

        self.register_module(DOM_READY_MODULE, DOM_READY_PATH, None);
        self.enqueue(&token, script, prepend)
    }

    /// Queues `script` in the group waiting on `dependencies`.
    ///
    /// Whitespace is stripped from the token; groups are matched on the
    /// resulting exact string. An empty script still creates the group,
    /// which renders as a bare `require([...])`.
    pub fn enqueue(&mut self, dependencies: &str, script: &str, prepend: bool) -> &mut Self {
        let token = normalize_token(dependencies);
        let group = self.groups.entry(token).or_default();
        insert_script(group, script, prepend);
        self
    }

    /// Translates `key` into the client string table and returns the table.
    ///
    /// Without a key (or with an empty one) this is a read-only snapshot.
    pub fn register_string(
        &mut self,
        translator: &dyn Translator,
        key: Option<&str>,
        params: &[(&str, &str)],
        options: TranslateOptions,
    ) -> &IndexMap<String, String> {
        if let Some(key) = key.filter(|key| !key.is_empty()) {
            let value = translator.translate(key, params, options);
            self.strings.insert(key.to_uppercase(), value);
        }
        &self.strings
    }

    pub fn module(&self, id: &str) -> Option<&ModuleEntry> {
        self.modules.get(&id.to_lowercase())
    }

    pub fn modules(&self) -> impl Iterator<Item = &ModuleEntry> {
        self.modules.values()
    }

    pub fn package(&self, id: &str) -> Option<&PackageEntry> {
        self.packages.get(&id.to_lowercase())
    }

    pub fn packages(&self) -> impl Iterator<Item = &PackageEntry> {
        self.packages.values()
    }

    pub fn path_remaps(&self) -> &IndexMap<String, IndexMap<String, String>> {
        &self.path_remaps
    }

    /// Scripts queued for the exact (whitespace-stripped) token.
    pub fn group(&self, dependencies: &str) -> Option<&[String]> {
        self.groups
            .get(&normalize_token(dependencies))
            .map(Vec::as_slice)
    }

    /// Group tokens in creation order.
    pub fn group_tokens(&self) -> impl Iterator<Item = &str> {
        self.groups.keys().map(String::as_str)
    }

    pub fn strings(&self) -> &IndexMap<String, String> {
        &self.strings
    }

    /// Renders the loader configuration followed by one `require` call per group.
    ///
    /// `debug` adds a cache-busting `urlArgs` entry that changes on every call.
    pub fn render(&self, base_url: &str, debug: bool) -> String {
        let mut js = String::new();

        js.push_str("requirejs.config({\n");
        js.push_str(&format!("\tbaseUrl: '{base_url}',\n"));
        if debug {
            js.push_str(&format!("\turlArgs: 'bust={}',\n", self.bust.next_token()));
        }

        js.push_str(&format!("\tmap: {}", to_json(&self.path_remaps)));

        if !self.packages.is_empty() {
            let packages = match self.package_shape {
                PackageListShape::Entries => {
                    to_json(&self.packages.values().collect::<Vec<_>>())
                }
                PackageListShape::Names => to_json(
                    &self
                        .packages
                        .values()
                        .map(PackageEntry::name)
                        .collect::<Vec<_>>(),
                ),
            };
            js.push_str(&format!(",\n\tpackages: {packages}"));
        }

        if !self.modules.is_empty() {
            let shims: Vec<String> = self
                .modules
                .values()
                .filter_map(|module| {
                    module.shim.as_ref().map(|shim| {
                        format!("\t\t{}: {}", to_json(&module.id), to_json(shim))
                    })
                })
                .collect();
            let paths: Vec<String> = self
                .modules
                .values()
                .map(|module| format!("\t\t{}: {}", to_json(&module.id), to_json(&module.path)))
                .collect();

            if !shims.is_empty() {
                js.push_str(",\n\tshim: {\n");
                js.push_str(&shims.join(",\n"));
                js.push_str("\n\t}");
            }
            js.push_str(",\n\tpaths: {\n");
            js.push_str(&paths.join(",\n"));
            js.push_str("\n\t}");
        }

        js.push_str("\n});\n");

        for (token, scripts) in self.groups_for_render().iter() {
            js.push_str(&render_invocation(token, scripts));
        }

        debug!(
            "event=loader_render module=assets status=ok modules={} packages={} groups={} strings={} debug={}",
            self.modules.len(),
            self.packages.len(),
            self.groups.len(),
            self.strings.len(),
            debug
        );

        js
    }

    /// Groups as rendered: the client string table load joins the text
    /// module group, ahead of its other scripts.
    fn groups_for_render(&self) -> Cow<'_, IndexMap<String, Vec<String>>> {
        if self.strings.is_empty() {
            return Cow::Borrowed(&self.groups);
        }

        let mut groups = self.groups.clone();
        let script = format!("text.load({})", to_json(&self.strings));
        let group = groups.entry(normalize_token(TEXT_MODULE)).or_default();
        insert_script(group, &script, true);
        Cow::Owned(groups)
    }
}

fn normalize_token(dependencies: &str) -> String {
    dependencies.chars().filter(|c| !c.is_whitespace()).collect()
}

fn insert_script(group: &mut Vec<String>, script: &str, prepend: bool) {
    if group.iter().any(|existing| existing == script) {
        return;
    }
    if prepend {
        group.insert(0, script.to_string());
    } else {
        group.push(script.to_string());
    }
}

fn render_invocation(token: &str, scripts: &[String]) -> String {
    let references: Vec<&str> = token.split(DEPENDENCY_SEPARATOR).collect();

    let body: String = scripts
        .iter()
        .filter(|script| !script.is_empty())
        .map(|script| format!("  {script}\n"))
        .collect();

    let mut js = format!("require({}", to_json(&references));
    if !body.is_empty() {
        let params = references
            .iter()
            .filter(|reference| is_bindable(reference))
            .map(|reference| parameter_name(reference))
            .collect::<Vec<_>>()
            .join(",");
        js.push_str(&format!(", function({params}) {{\n"));
        js.push_str(&body);
        js.push('}');
    }
    js.push_str(");\n");
    js
}

/// Serializes `value` for an inline script; `</` is written `<\/` so no
/// value can close the surrounding `<script>` element.
fn to_json<T: Serialize + ?Sized>(value: &T) -> String {
    match serde_json::to_string(value) {
        Ok(json) => json.replace("</", "<\\/"),
        Err(err) => {
            warn!("event=loader_render module=assets status=error reason=json_encode error={err}");
            "null".to_string()
        }
    }
}
