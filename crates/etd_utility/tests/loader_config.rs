use etd_utility::{
    CatalogTranslator, PackageEntry, PackageListShape, RequireConfigBuilder, Shim,
    TranslateOptions,
};

fn urlargs_token(js: &str) -> String {
    let start = js.find("bust=").expect("debug render should carry a bust token") + "bust=".len();
    js[start..]
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect()
}

#[test]
fn new_builder_is_seeded_with_defaults() {
    let builder = RequireConfigBuilder::new();

    let packages: Vec<&PackageEntry> = builder.packages().collect();
    assert_eq!(packages.len(), 1);
    assert_eq!(
        packages[0],
        &PackageEntry::Located {
            name: "etdsolutions".to_string(),
            location: Some("js/etdsolutions".to_string()),
            main: Some("app".to_string()),
        }
    );
    assert_eq!(
        builder.path_remaps()["*"].get("css").map(String::as_str),
        Some("js/vendor/css.min")
    );
    assert_eq!(builder.modules().count(), 0);
    assert_eq!(builder.group_tokens().count(), 0);
    assert!(builder.strings().is_empty());
}

#[test]
fn module_registration_is_last_write_wins() {
    let mut builder = RequireConfigBuilder::new();
    builder
        .register_module("moment", "js/vendor/moment", None)
        .register_module("moment", "js/vendor/moment.min", None);

    let module = builder.module("moment").expect("module should exist");
    assert_eq!(module.path, "js/vendor/moment.min");
    assert_eq!(module.shim, None);
}

#[test]
fn package_registration_keeps_first_entry() {
    let mut builder = RequireConfigBuilder::new();
    builder
        .register_package("Charts", Some("js/charts"), Some("main"))
        .register_package("charts", Some("elsewhere"), None)
        .register_package("etdsolutions", None, None);

    assert_eq!(
        builder.package("CHARTS"),
        Some(&PackageEntry::Located {
            name: "charts".to_string(),
            location: Some("js/charts".to_string()),
            main: Some("main".to_string()),
        })
    );
    assert!(matches!(
        builder.package("etdsolutions"),
        Some(PackageEntry::Located { .. })
    ));
    assert_eq!(builder.packages().count(), 2);
}

#[test]
fn package_without_location_or_main_uses_short_form() {
    let mut builder = RequireConfigBuilder::new();
    builder.register_package("Moment", None, None);
    builder.register_package("lodash", None, Some("lodash.min"));

    assert_eq!(
        builder.package("moment"),
        Some(&PackageEntry::Bare("moment".to_string()))
    );
    assert_eq!(
        builder.package("lodash"),
        Some(&PackageEntry::Located {
            name: "lodash".to_string(),
            location: None,
            main: Some("lodash.min".to_string()),
        })
    );
}

#[test]
fn path_remaps_accumulate_under_prefix() {
    let mut builder = RequireConfigBuilder::new();
    builder
        .add_path_remap("*", "text", "js/vendor/text")
        .add_path_remap("*", "css", "js/vendor/require-css")
        .add_path_remap("app/legacy", "jquery", "jquery-1.12");

    let remaps = builder.path_remaps();
    assert_eq!(remaps.len(), 2);
    assert_eq!(remaps["*"].len(), 2);
    assert_eq!(remaps["*"]["css"], "js/vendor/require-css");
    assert_eq!(remaps["*"]["text"], "js/vendor/text");
    assert_eq!(remaps["app/legacy"]["jquery"], "jquery-1.12");
}

#[test]
fn enqueue_ignores_duplicate_scripts() {
    let mut builder = RequireConfigBuilder::new();
    builder.enqueue("a,b", "x", false).enqueue("a,b", "x", false);

    assert_eq!(builder.group("a,b"), Some(&["x".to_string()][..]));
}

#[test]
fn enqueue_can_prepend() {
    let mut builder = RequireConfigBuilder::new();
    builder.enqueue("a,b", "x", false).enqueue("a,b", "y", true);

    assert_eq!(
        builder.group("a,b"),
        Some(&["y".to_string(), "x".to_string()][..])
    );
}

#[test]
fn groups_match_on_exact_whitespace_stripped_token() {
    let mut builder = RequireConfigBuilder::new();
    builder
        .enqueue("a, b", "x", false)
        .enqueue("a,b", "y", false)
        .enqueue("b,a", "z", false);

    let tokens: Vec<&str> = builder.group_tokens().collect();
    assert_eq!(tokens, vec!["a,b", "b,a"]);
    assert_eq!(
        builder.group("a , b"),
        Some(&["x".to_string(), "y".to_string()][..])
    );
}

#[test]
fn schedule_on_ready_waits_for_ui_library_and_dom() {
    let mut builder = RequireConfigBuilder::new();
    builder
        .schedule_on_ready("first();", false, "")
        .schedule_on_ready("tip();", false, "bootstrap")
        .schedule_on_ready("early();", true, "");

    assert_eq!(
        builder.group("jquery,domReady!"),
        Some(&["early();".to_string(), "first();".to_string()][..])
    );
    assert_eq!(
        builder.group("jquery,bootstrap,domReady!"),
        Some(&["tip();".to_string()][..])
    );
    let dom_ready = builder.module("domReady").expect("domReady should be registered");
    assert_eq!(dom_ready.path, "js/vendor/domReady");
}

#[test]
fn register_string_uppercases_keys_and_overwrites() {
    let mut text = CatalogTranslator::new("fr_FR");
    text.insert("HELLO", "Bonjour");
    let mut builder = RequireConfigBuilder::new();

    builder.register_string(&text, Some("HELLO"), &[], TranslateOptions::for_client());
    text.insert("HELLO", "Salut");
    let table = builder.register_string(&text, Some("hello"), &[], TranslateOptions::for_client());

    assert_eq!(table.len(), 1);
    assert_eq!(table["HELLO"], "Salut");
}

#[test]
fn register_string_without_key_is_a_snapshot() {
    let mut text = CatalogTranslator::new("fr_FR");
    text.insert("APP_SAVE", "Enregistrer %s");
    let mut builder = RequireConfigBuilder::new();

    builder.register_string(
        &text,
        Some("app_save"),
        &[("%s", "la fiche")],
        TranslateOptions::for_client(),
    );
    let snapshot = builder
        .register_string(&text, None, &[], TranslateOptions::for_client())
        .clone();
    let empty_key = builder
        .register_string(&text, Some(""), &[], TranslateOptions::for_client())
        .clone();

    assert_eq!(snapshot.len(), 1);
    assert_eq!(snapshot["APP_SAVE"], "Enregistrer la fiche");
    assert_eq!(empty_key, snapshot);
}

#[test]
fn render_produces_expected_block() {
    let mut builder = RequireConfigBuilder::new();
    builder
        .register_module(
            "select2",
            "js/vendor/select2.min",
            Some(Shim::new().deps(["jquery"]).exports("$.fn.select2")),
        )
        .register_package("Moment", None, None)
        .schedule_on_ready("init();", false, "select2");

    let expected = concat!(
        "requirejs.config({\n",
        "\tbaseUrl: 'https://shop.example/',\n",
        "\tmap: {\"*\":{\"css\":\"js/vendor/css.min\"}},\n",
        "\tpackages: [{\"name\":\"etdsolutions\",\"location\":\"js/etdsolutions\",\"main\":\"app\"},\"moment\"],\n",
        "\tshim: {\n",
        "\t\t\"select2\": {\"deps\":[\"jquery\"],\"exports\":\"$.fn.select2\"}\n",
        "\t},\n",
        "\tpaths: {\n",
        "\t\t\"select2\": \"js/vendor/select2.min\",\n",
        "\t\t\"domReady\": \"js/vendor/domReady\"\n",
        "\t}\n",
        "});\n",
        "require([\"jquery\",\"select2\",\"domReady!\"], function(jquery,select2) {\n",
        "  init();\n",
        "});\n",
    );
    assert_eq!(builder.render("https://shop.example/", false), expected);
}

#[test]
fn render_without_modules_omits_shim_and_paths() {
    let builder = RequireConfigBuilder::new();
    let js = builder.render("/", false);

    assert!(!js.contains("shim:"));
    assert!(!js.contains("paths:"));
    assert!(!js.contains("urlArgs"));
    assert!(js.ends_with("\tpackages: [{\"name\":\"etdsolutions\",\"location\":\"js/etdsolutions\",\"main\":\"app\"}]\n});\n"));
}

#[test]
fn render_names_shape_lists_package_ids() {
    let mut builder = RequireConfigBuilder::new().with_package_shape(PackageListShape::Names);
    builder.register_package("charts", Some("js/charts"), None);

    let js = builder.render("/", false);
    assert!(js.contains("\tpackages: [\"etdsolutions\",\"charts\"]"));
}

#[test]
fn debug_render_adds_changing_bust_token() {
    let builder = RequireConfigBuilder::new();
    let first = builder.render("/", true);
    let second = builder.render("/", true);

    assert!(first.contains("\turlArgs: 'bust="));
    let first_token = urlargs_token(&first);
    let second_token = urlargs_token(&second);
    assert!(!first_token.is_empty());
    assert_ne!(first_token, second_token);
    assert!(!builder.render("/", false).contains("urlArgs"));
}

#[test]
fn plugin_references_stay_dependencies_but_not_parameters() {
    let mut builder = RequireConfigBuilder::new();
    builder.enqueue("jquery, domReady!", "go();", false);

    let js = builder.render("/", false);
    assert!(js.contains("require([\"jquery\",\"domReady!\"], function(jquery) {\n  go();\n});\n"));
}

#[test]
fn empty_scripts_render_bare_require() {
    let mut builder = RequireConfigBuilder::new();
    builder.enqueue("etdsolutions", "", false);

    let js = builder.render("/", false);
    assert!(js.ends_with("require([\"etdsolutions\"]);\n"));
}

#[test]
fn client_strings_load_first_in_text_group() {
    let mut text = CatalogTranslator::new("fr_FR");
    text.insert("APP_OK", "D'accord");
    let mut builder = RequireConfigBuilder::new();
    builder.enqueue("etdsolutions/text", "text.ready();", false);
    builder.register_string(&text, Some("APP_OK"), &[], TranslateOptions::for_client());

    let js = builder.render("/", false);
    assert!(js.contains(concat!(
        "require([\"etdsolutions/text\"], function(text) {\n",
        "  text.load({\"APP_OK\":\"D\\\\'accord\"})\n",
        "  text.ready();\n",
        "});\n",
    )));

    // Rendering leaves the queued scripts untouched.
    assert_eq!(
        builder.group("etdsolutions/text"),
        Some(&["text.ready();".to_string()][..])
    );
}

#[test]
fn client_strings_cannot_close_the_script_element() {
    let mut text = CatalogTranslator::new("fr_FR");
    text.insert("APP_X", "a</script><script>alert(1)</script>");
    let mut builder = RequireConfigBuilder::new();
    builder
        .register_module("legacy", "js/</script>", None)
        .register_string(&text, Some("APP_X"), &[], TranslateOptions::for_client());

    let js = builder.render("/", false);
    assert!(!js.contains("</"), "{js}");
    assert!(js.contains(r#"text.load({"APP_X":"a<\/script><script>alert(1)<\/script>"})"#));
    assert!(js.contains(r#""legacy": "js/<\/script>""#));
}

#[test]
fn client_strings_group_is_appended_when_missing() {
    let mut text = CatalogTranslator::new("fr_FR");
    text.insert("APP_OK", "OK");
    let mut builder = RequireConfigBuilder::new();
    builder.schedule_on_ready("init();", false, "");
    builder.register_string(&text, Some("APP_OK"), &[], TranslateOptions::for_client());

    let js = builder.render("/", false);
    let ready = js.find("require([\"jquery\",\"domReady!\"]").expect("ready group");
    let strings = js.find("require([\"etdsolutions/text\"]").expect("text group");
    assert!(ready < strings);
    assert!(js.ends_with("  text.load({\"APP_OK\":\"OK\"})\n});\n"));
}

#[test]
fn reset_restores_seeded_state() {
    let text = CatalogTranslator::new("fr_FR");
    let mut builder = RequireConfigBuilder::new();
    builder
        .register_module("moment", "js/vendor/moment", None)
        .register_package("charts", None, None)
        .add_path_remap("*", "text", "js/vendor/text")
        .schedule_on_ready("init();", false, "");
    builder.register_string(&text, Some("APP_OK"), &[], TranslateOptions::for_client());

    builder.reset();

    let fresh = RequireConfigBuilder::new();
    assert_eq!(builder.render("/", false), fresh.render("/", false));
    assert!(builder.strings().is_empty());
}
