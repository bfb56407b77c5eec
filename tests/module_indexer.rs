use aliaslens::core::{
    DiagnosticLevel, IndexerConfig, Module, ModuleIndexer, PlaceholderReason, ResolutionOutcome,
    StaticDirectories, TokenKind,
};
use pretty_assertions::assert_eq;
use std::fs;
use std::path::{Path, PathBuf};

fn write<P: AsRef<Path>>(path: P, content: &str) {
    let path = path.as_ref();
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

/// Module `example` with package `a` declaring `Foo` and package `b` aliasing it.
fn example_module(dir: &Path) -> PathBuf {
    let root = dir.join("example");
    write(root.join("go.mod"), "module example\n\ngo 1.21\n");
    write(
        root.join("a/a.go"),
        "package a\n\ntype Foo struct {\n\tX int\n}\n",
    );
    write(
        root.join("b/b.go"),
        "package b\n\nimport \"example/a\"\n\ntype Bar = a.Foo\n",
    );
    root
}

#[test]
fn intra_module_alias_hoists_struct_with_info_diagnostic() {
    let dir = tempfile::TempDir::new().unwrap();
    let root = example_module(dir.path());

    let module = Module::build(&root).unwrap();
    assert_eq!(module.name(), "example");

    let keys: Vec<_> = module.packages().keys().cloned().collect();
    assert_eq!(keys, vec!["example/a".to_string(), "example/b".to_string()]);

    let b = module.package("example/b").unwrap();
    assert_eq!(b.diagnostics().len(), 1);
    let diagnostic = &b.diagnostics()[0];
    assert_eq!(diagnostic.level, DiagnosticLevel::Info);
    assert_eq!(diagnostic.text, "alias for a.Foo");
    assert_eq!(diagnostic.target_id, "example/b.Bar");

    let token = b.content().get("example/b.Bar").unwrap();
    assert_eq!(token.name, "Bar");
    assert_eq!(token.origin.as_deref(), Some("example/a"));
    match &token.kind {
        TokenKind::Struct { fields } => {
            assert_eq!(fields.len(), 1);
            assert_eq!(fields[0].name.as_deref(), Some("X"));
            assert_eq!(fields[0].type_text, "int");
        }
        other => panic!("expected struct token, got {other:?}"),
    }
    assert_eq!(token.to_string(), "type Bar struct {\n\tX int\n}");
}

#[test]
fn unreachable_module_gets_placeholder_with_warning() {
    let dir = tempfile::TempDir::new().unwrap();
    let root = example_module(dir.path());
    write(
        root.join("b/baz.go"),
        "package b\n\nimport \"othermod/pkg\"\n\ntype Baz = pkg.Qux\n",
    );

    let module = Module::build(&root).unwrap();
    let b = module.package("example/b").unwrap();

    let warning = b
        .diagnostics()
        .iter()
        .find(|d| d.target_id == "example/b.Baz")
        .unwrap();
    assert_eq!(warning.level, DiagnosticLevel::Warning);
    assert_eq!(warning.text, "alias for othermod/pkg.Qux");

    let token = b.content().get("example/b.Baz").unwrap();
    assert_eq!(
        token.kind,
        TokenKind::SimpleType {
            underlying: "othermod/pkg.Qux".to_string()
        }
    );
    assert!(token.origin.is_none());

    let event = module
        .resolution_events()
        .iter()
        .find(|e| e.alias == "Baz")
        .unwrap();
    assert_eq!(
        event.outcome,
        ResolutionOutcome::Placeholder(PlaceholderReason::Unreachable)
    );
}

#[test]
fn interface_and_named_type_shapes_are_hoisted() {
    let dir = tempfile::TempDir::new().unwrap();
    let root = dir.path().join("shapes");
    write(root.join("go.mod"), "module github.com/acme/shapes\n");
    write(
        root.join("internal/defs/defs.go"),
        r#"package defs

type Getter interface {
	Get(key string) (int, error)
	Close() error
}

type Level string

type Callback func(int) error
"#,
    );
    write(
        root.join("api.go"),
        r#"package shapes

import "github.com/acme/shapes/internal/defs"

type Getter = defs.Getter
type Level = defs.Level
type Callback = defs.Callback
type Gone = defs.Gone
"#,
    );

    let module = Module::build(&root).unwrap();
    let api = module.package("github.com/acme/shapes").unwrap();

    let getter = api.content().get("shapes.Getter").unwrap();
    match &getter.kind {
        TokenKind::Interface { methods, embedded } => {
            let names: Vec<_> = methods.iter().map(|m| m.name.as_str()).collect();
            assert_eq!(names, vec!["Get", "Close"]);
            assert_eq!(methods[0].signature, "(key string) (int, error)");
            assert!(embedded.is_empty());
        }
        other => panic!("expected interface token, got {other:?}"),
    }

    let level = api.content().get("shapes.Level").unwrap();
    assert_eq!(
        level.kind,
        TokenKind::SimpleType {
            underlying: "string".to_string()
        }
    );

    // func types have no hoistable shape and fall back to a placeholder
    let callback = api.content().get("shapes.Callback").unwrap();
    assert_eq!(
        callback.kind,
        TokenKind::SimpleType {
            underlying: "internal/defs.Callback".to_string()
        }
    );

    // no definition: neither token nor diagnostic
    assert!(api.content().get("shapes.Gone").is_none());
    assert!(api
        .diagnostics()
        .iter()
        .all(|d| d.target_id != "shapes.Gone"));
    assert_eq!(api.diagnostics().len(), 3);
    assert!(api
        .diagnostics()
        .iter()
        .all(|d| d.level == DiagnosticLevel::Info));

    let outcomes: Vec<_> = module
        .resolution_events()
        .iter()
        .map(|e| (e.alias.as_str(), e.outcome.clone()))
        .collect();
    assert_eq!(
        outcomes,
        vec![
            (
                "Callback",
                ResolutionOutcome::Placeholder(PlaceholderReason::UnexpectedShape(
                    "function_type".to_string()
                ))
            ),
            ("Getter", ResolutionOutcome::Resolved),
            ("Gone", ResolutionOutcome::Skipped),
            ("Level", ResolutionOutcome::Resolved),
        ]
    );
}

#[test]
fn every_alias_yields_one_token_and_one_diagnostic_or_nothing() {
    let dir = tempfile::TempDir::new().unwrap();
    let root = example_module(dir.path());
    write(
        root.join("b/more.go"),
        "package b\n\nimport (\n\t\"example/a\"\n\t\"othermod/pkg\"\n)\n\ntype Missing = a.Missing\ntype Ext = pkg.Ext\n",
    );

    let module = Module::build(&root).unwrap();
    for pkg in module.packages().values() {
        for alias in pkg.type_aliases().keys() {
            let id = format!("{}.{}", pkg.name(), alias);
            let tokens = pkg.content().tokens().iter().filter(|t| t.id() == id).count();
            let diagnostics = pkg
                .diagnostics()
                .iter()
                .filter(|d| d.target_id == id)
                .count();
            assert_eq!(tokens, diagnostics, "alias {id}");
            assert!(tokens <= 1, "alias {id}");
        }
    }
    let b = module.package("example/b").unwrap();
    assert_eq!(b.type_aliases().len(), 3);
    assert_eq!(b.diagnostics().len(), 2);
}

#[test]
fn building_twice_is_deterministic() {
    let dir = tempfile::TempDir::new().unwrap();
    let root = example_module(dir.path());
    write(
        root.join("b/baz.go"),
        "package b\n\nimport \"othermod/pkg\"\n\ntype Baz = pkg.Qux\n",
    );

    let first = Module::build(&root).unwrap();
    let second = Module::build(&root).unwrap();

    let keys = |m: &Module| m.packages().keys().cloned().collect::<Vec<_>>();
    assert_eq!(keys(&first), keys(&second));
    for (key, pkg) in first.packages() {
        let other = second.package(key).unwrap();
        assert_eq!(pkg.types(), other.types());
        assert_eq!(pkg.diagnostics(), other.diagnostics());
        assert_eq!(pkg.content().tokens(), other.content().tokens());
    }
}

#[test]
fn empty_directories_are_skipped() {
    let dir = tempfile::TempDir::new().unwrap();
    let root = example_module(dir.path());
    fs::create_dir_all(root.join("docs/images")).unwrap();
    write(root.join("docs/README.md"), "# docs\n");
    write(root.join("a/a_test.go"), "package a\n\ntype TestOnly struct{}\n");

    let module = Module::build(&root).unwrap();
    assert!(module.package("example/docs").is_none());
    assert!(module.package("example/docs/images").is_none());
    assert!(module.package("example").is_none());
    assert!(!module
        .package("example/a")
        .unwrap()
        .types()
        .contains_key("TestOnly"));
}

#[test]
fn testdata_is_only_indexed_in_test_mode() {
    let dir = tempfile::TempDir::new().unwrap();
    let root = example_module(dir.path());
    write(
        root.join("testdata/fixture/f.go"),
        "package fixture\n\ntype Fixture struct{}\n",
    );

    let module = Module::build(&root).unwrap();
    assert!(module.package("example/testdata/fixture").is_none());

    let config = IndexerConfig {
        index_testdata: true,
        ..IndexerConfig::default()
    };
    let module = ModuleIndexer::new().with_config(config).build(&root).unwrap();
    let fixture = module.package("example/testdata/fixture").unwrap();
    assert!(fixture.types().contains_key("Fixture"));
}

#[test]
fn module_below_a_testdata_named_directory_is_indexed() {
    let dir = tempfile::TempDir::new().unwrap();
    let root = example_module(&dir.path().join("testdata-work"));

    let module = Module::build(&root).unwrap();
    let keys: Vec<_> = module.packages().keys().cloned().collect();
    assert_eq!(keys, vec!["example/a".to_string(), "example/b".to_string()]);
}

fn assert_bar_hoisted(module: &Module) {
    let keys: Vec<_> = module.packages().keys().cloned().collect();
    assert_eq!(keys, vec!["example/a".to_string(), "example/b".to_string()]);

    let b = module.package("example/b").unwrap();
    let token = b.content().get("example/b.Bar").unwrap();
    assert!(matches!(token.kind, TokenKind::Struct { .. }));
    assert_eq!(b.diagnostics()[0].target_id, "example/b.Bar");
    assert_eq!(
        module.resolution_events()[0].outcome,
        ResolutionOutcome::Resolved
    );
}

#[test]
fn relative_root_keys_packages_by_import_path() {
    let dir = tempfile::TempDir::new().unwrap();
    let root = example_module(dir.path());

    let previous = std::env::current_dir().unwrap();
    std::env::set_current_dir(&root).unwrap();
    let result = Module::build(Path::new("."));
    std::env::set_current_dir(previous).unwrap();

    let module = result.unwrap();
    assert_eq!(module.name(), "example");
    assert_bar_hoisted(&module);
}

#[test]
fn module_directory_name_repeated_higher_up() {
    let dir = tempfile::TempDir::new().unwrap();
    let root = example_module(&dir.path().join("example/checkouts"));
    assert!(root.ends_with("example/checkouts/example"));

    let module = Module::build(&root).unwrap();
    assert_bar_hoisted(&module);
}

#[test]
fn directories_mapping_to_one_package_are_rejected() {
    let dir = tempfile::TempDir::new().unwrap();
    let root = example_module(dir.path());

    let directories = StaticDirectories::new(vec![root.join("a"), root.join("a")]);
    let err = ModuleIndexer::new()
        .with_directories(directories)
        .build(&root)
        .unwrap_err();
    assert!(err.to_string().contains("both map to package example/a"));
}

#[test]
fn missing_manifest_is_fatal() {
    let dir = tempfile::TempDir::new().unwrap();
    let root = dir.path().join("nomod");
    write(root.join("a/a.go"), "package a\n");

    let err = Module::build(&root).unwrap_err();
    assert!(format!("{err:#}").contains("go.mod"));
}

#[test]
fn syntax_errors_abort_the_build() {
    let dir = tempfile::TempDir::new().unwrap();
    let root = example_module(dir.path());
    write(root.join("a/broken.go"), "package a\n\ntype Broken struct {\n");

    let err = Module::build(&root).unwrap_err();
    assert!(format!("{err:#}").contains("broken.go"));
}
