//! End-to-end builds: parse, mangle and print through the project driver.

use nameguard_core::{parse_source, print, MangleConfig, NameCache, Project};
use swc_ecma_ast::{Decl, Expr, Invalid, ModuleItem, Stmt};

fn build(config: MangleConfig, files: &[(&str, &str)]) -> (Vec<String>, NameCache) {
    let mut project = Project::new(config).unwrap();
    let outputs = files
        .iter()
        .map(|(path, src)| project.mangle_source(path, src).unwrap().unwrap())
        .collect();
    (outputs, project.finish().name_cache)
}

fn build_one(config: MangleConfig, src: &str) -> String {
    build(config, &[("main.ts", src)]).0.remove(0)
}

#[test]
fn test_param_property_follows_member_names() {
    let src = "class A { p = 5; constructor(public x: number) { console.log(x, this.x); } }";

    let out = build_one(MangleConfig::default().with_property(true), src);
    assert!(out.contains("a = 5"));
    assert!(out.contains("public b: number"));
    assert!(out.contains("console.log(b, this.b)"));

    let out = build_one(MangleConfig::default(), src);
    assert!(out.contains("p = 5"));
    assert!(out.contains("public x: number"));
    assert!(out.contains("console.log(x, this.x)"));
}

#[test]
fn test_import_export_aliases() {
    let src = "import { A as B } from 'm';\nexport { C as D } from 'm';\nuse(B);";

    let out = build_one(MangleConfig::default().with_export(true), src);
    assert!(out.contains("A as B"));
    assert!(out.contains("C as D"));

    let config = MangleConfig::default().with_toplevel(true).with_export(true);
    let (outputs, cache) = build(config, &[("main.ts", src)]);
    assert!(!outputs[0].contains("A as B"));
    assert!(!outputs[0].contains("C as D"));
    for name in ["A", "B", "C", "D"] {
        assert!(cache.global_table.contains_key(name), "{name}");
    }
}

#[test]
fn test_cross_file_consistency() {
    let config = MangleConfig::default()
        .with_toplevel(true)
        .with_export(true)
        .with_property(true);
    let (outputs, cache) = build(
        config,
        &[
            ("widget.ts", "export class Widget { render() { return 1; } }"),
            ("main.ts", "import { Widget } from './widget';\nnew Widget().render();"),
        ],
    );
    let widget = cache.global_table["Widget"].clone();
    let render = cache.global_table["render"].clone();
    assert_ne!(widget, render);

    assert!(outputs[0].contains(&format!("export class {widget}")));
    assert!(outputs[0].contains(&format!("{render}()")));
    assert!(outputs[1].contains(&format!("import {{ {widget} }} from './widget'")));
    assert!(outputs[1].contains(&format!("new {widget}().{render}()")));
}

#[test]
fn test_whitelisted_names_pass_through() {
    let config = MangleConfig::default()
        .with_property(true)
        .with_toplevel(true)
        .with_keep_property_names(["api*"])
        .with_keep_global_names(["PublicThing"]);
    let out = build_one(
        config,
        "const PublicThing = 1;\nconst hidden = { apiUrl: 1, secret: 2 };\nconsole.log(PublicThing, hidden.apiUrl, hidden.secret);",
    );
    assert!(out.contains("const PublicThing = 1"));
    assert!(out.contains("apiUrl: 1"));
    assert!(!out.contains("hidden"));
    assert!(!out.contains("secret"));
    assert!(out.contains(".apiUrl"));
}

#[test]
fn test_nested_functions_do_not_shadow() {
    let out = build_one(
        MangleConfig::default(),
        "function outer(value) { return function (other) { return value + other; }; }",
    );
    assert!(out.contains("function outer(a)"));
    assert!(out.contains("return a + b"));
}

#[test]
fn test_shorthand_expansion() {
    let config = MangleConfig::default().with_property(true);
    let out = build_one(
        config,
        "function make(first, count) { return { count }; }\nfunction read(skip, { total }) { return total + skip; }",
    );
    assert!(!out.contains("count"));
    assert!(!out.contains("total"));
    // Member `count` takes `a` while the local is `b`.
    assert!(out.contains("a: b"));
    // Locals of `read` skip the property name `a`: `skip` is `b`, `total`
    // is `c`, and the destructured key takes the next property name `b`.
    assert!(out.contains("b: c"));
}

#[test]
fn test_string_keys_follow_properties() {
    let config = MangleConfig::default()
        .with_property(true)
        .with_string_property(true);
    let out = build_one(
        config,
        "const o = { 'secret': 1 };\nconsole.log(o['secret'], o.secret);",
    );
    assert!(!out.contains("secret"));
    assert!(out.contains("o.a"));
}

#[test]
fn test_labels() {
    let out = build_one(
        MangleConfig::default(),
        "function f() { outer: for (;;) { inner: for (;;) { continue outer; } } }",
    );
    assert!(!out.contains("outer"));
    assert!(!out.contains("inner"));
    assert!(out.contains("continue a"));
}

#[test]
fn test_incremental_build_is_stable() {
    let files = [
        (
            "a.ts",
            "export class Store { items = []; add(item) { this.items.push(item); } }",
        ),
        (
            "b.ts",
            "import { Store } from './a';\nfunction fill(store, count) { for (let i = 0; i < count; i++) store.add(i); }\nfill(new Store(), 3);",
        ),
    ];
    let config = MangleConfig::default()
        .with_toplevel(true)
        .with_export(true)
        .with_property(true);

    let (first, cache) = build(config.clone(), &files);

    let mut project = Project::new(config).unwrap().with_history(cache.clone());
    let second: Vec<String> = files
        .iter()
        .map(|(path, src)| project.mangle_source(path, src).unwrap().unwrap())
        .collect();
    let output = project.finish();

    assert_eq!(first, second);
    assert_eq!(cache.global_table, output.name_cache.global_table);
    assert!(output
        .report
        .files
        .iter()
        .any(|f| !f.from_history.is_empty()));
}

#[test]
fn test_cache_round_trip_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nameCache.json");
    let src = "function area(width, height) { return width * height; }";

    let (first, cache) = build(MangleConfig::default(), &[("geo.js", src)]);
    cache.save(&path).unwrap();

    let loaded = NameCache::load(&path).unwrap();
    assert_eq!(loaded.files.len(), cache.files.len());

    let mut project = Project::new(MangleConfig::default())
        .unwrap()
        .with_history(loaded);
    let second = project.mangle_source("geo.js", src).unwrap().unwrap();
    assert_eq!(first[0], second);
}

#[test]
fn test_malformed_statement_is_left_alone() {
    let mut unit = parse_source(
        "broken.js",
        "function f(param) { let broken = 1; return param; }",
    )
    .unwrap();
    if let ModuleItem::Stmt(Stmt::Decl(Decl::Fn(f))) = &mut unit.module.body[0] {
        if let Some(body) = &mut f.function.body {
            if let Stmt::Decl(Decl::Var(v)) = &mut body.stmts[0] {
                let span = v.decls[0].span;
                v.decls[0].init = Some(Box::new(Expr::Invalid(Invalid { span })));
            }
        }
    }

    let mut project = Project::new(MangleConfig::default()).unwrap();
    project.mangle_unit(&mut unit).unwrap();
    let out = print(&unit).unwrap();
    assert!(out.contains("broken"));
    assert!(!out.contains("param"));

    let output = project.finish();
    assert_eq!(output.report.files.len(), 1);
    assert_eq!(output.report.files[0].diagnostics.len(), 1);
}

#[test]
fn test_unparsable_file_is_skipped() {
    let mut project = Project::new(MangleConfig::default()).unwrap();
    assert!(project.mangle_source("bad.ts", "class {").unwrap().is_none());
    let output = project.finish();
    assert_eq!(output.report.skipped.len(), 1);
    assert!(output.name_cache.files.is_empty());
}

#[test]
fn test_free_references_follow_declarations_in_any_order() {
    let config = MangleConfig::default().with_toplevel(true);
    let caller = ("m.js", "function run(x) { return helper(x); }\nrun(1);");
    let callee = ("h.js", "function helper(v) { return v * 2; }");

    for files in [[caller, callee], [callee, caller]] {
        let (outputs, cache) = build(config.clone(), &files);
        let helper = cache.global_table["helper"].clone();
        assert_ne!(helper, "helper");
        let output = |path: &str| {
            let i = files.iter().position(|(p, _)| *p == path).unwrap();
            outputs[i].clone()
        };
        assert!(output("h.js").contains(&format!("function {helper}(")));
        assert!(output("m.js").contains(&format!("return {helper}(")));
    }
}

#[test]
fn test_member_name_does_not_capture_local_reference() {
    let config = MangleConfig::default()
        .with_toplevel(true)
        .with_property(true);
    let (outputs, cache) = build(
        config,
        &[
            ("k.ts", "export class K { foo() {} }"),
            ("m.js", "const foo = 1;\nconsole.log(a, foo);"),
        ],
    );
    let foo = &cache.global_table["foo"];
    assert!(outputs[0].contains(&format!("{foo}() {{")));
    assert!(!outputs[1].contains(&format!("console.log({foo}, {foo})")));
    assert!(outputs[1].contains("const foo = 1"));
}
