//! Virtual module resolution over real archives

mod common;

use std::collections::BTreeSet;

use common::{archive, ScriptHost};
use dashc_runtime::{
    ArchiveIndex, Classification, DirectoryFinder, Dispatcher, EntryPoint, ExitStatus, Finder,
    Importer, ModuleKind, ResolutionChain, Value, VirtualModuleResolver,
};

fn resolver(files: &[(&str, &str)]) -> VirtualModuleResolver {
    VirtualModuleResolver::new(ArchiveIndex::from_zip_bytes(&archive(files)).unwrap())
}

#[test]
fn test_nested_packages_import() {
    let files = [
        ("a/__init__.py", ""),
        ("a/b/__init__.py", ""),
        ("a/b/mod.py", "print(__name__)"),
    ];
    let r = resolver(&files);
    assert_eq!(r.find("a").map(|s| s.kind), Some(ModuleKind::Package));
    assert_eq!(r.find("a.b").map(|s| s.kind), Some(ModuleKind::Package));

    let mut chain = ResolutionChain::new();
    chain.install(Box::new(r));
    let mut importer = Importer::new(chain);
    let mut host = ScriptHost::new();
    importer.import("a.b.mod", &mut host).unwrap();

    assert_eq!(host.output, vec!["a.b.mod"]);
    assert_eq!(importer.module("a.b").unwrap().search_root.as_deref(), Some("a/b"));
    assert_eq!(importer.module("a.b.mod").unwrap().file, "a/b/mod.py");
}

#[test]
fn test_archive_fidelity() {
    let files = [
        ("pkg/__init__.py", "# package\n"),
        ("pkg/mod.py", "VALUE = 'héllo'\r\n\ttabbed\n"),
        ("pkg/sub/__init__.py", ""),
        ("pkg/sub/deep.py", "x = 1"),
        ("top.py", "print('top')"),
    ];
    let r = resolver(&files);
    for (path, source) in files {
        assert_eq!(r.index().get(path), Some(source.as_bytes()), "{}", path);
    }
    for name in ["pkg", "pkg.mod", "pkg.sub.deep", "top"] {
        let spec = r.find(name).unwrap();
        let expected = files.iter().find(|(p, _)| *p == spec.origin).unwrap().1;
        assert_eq!(r.load(&spec).unwrap(), expected.as_bytes());
    }
}

#[test]
fn test_data_files_are_not_modules() {
    let r = resolver(&[
        ("app/__init__.py", ""),
        ("app/config.json", "{}"),
        ("app/my-script.py", "print(1)"),
        ("__init__.py", ""),
    ]);
    assert!(r.find("app.config").is_none());
    assert!(r.find("app.my-script").is_none());
    assert!(r.find("").is_none());
    assert_eq!(r.read_resource("app", "config.json").unwrap(), b"{}");
}

#[test]
fn test_archive_shadows_disk() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("util.py"), "print('disk util')").unwrap();
    std::fs::write(dir.path().join("extra.py"), "print('disk extra')").unwrap();

    let mut chain = ResolutionChain::new();
    chain.push_back(Box::new(DirectoryFinder::new(dir.path())));
    chain.install(Box::new(resolver(&[(
        "app.py",
        "import util\nimport extra",
    ), (
        "util.py",
        "print('archive util')",
    )])));
    assert_eq!(chain.names(), vec!["archive", "directory"]);

    let mut dispatcher = Dispatcher::with_chain(chain);
    let mut host = ScriptHost::new();
    let status = dispatcher.dispatch(&EntryPoint::run_module("app"), &mut host, &mut Vec::new());
    assert_eq!(status, ExitStatus::SUCCESS);
    assert_eq!(host.output, vec!["archive util", "disk extra"]);
}

#[test]
fn test_archived_package_children_never_come_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir(dir.path().join("pkg")).unwrap();
    std::fs::write(dir.path().join("pkg/__init__.py"), "").unwrap();
    std::fs::write(dir.path().join("pkg/extra.py"), "print('disk extra')").unwrap();

    let mut chain = ResolutionChain::new();
    chain.push_back(Box::new(DirectoryFinder::new(dir.path())));
    chain.install(Box::new(resolver(&[
        ("pkg/__init__.py", ""),
        ("pkg/__main__.py", "import pkg.extra"),
    ])));
    assert!(chain.find("pkg.extra").is_none());

    let mut dispatcher = Dispatcher::with_chain(chain);
    let mut host = ScriptHost::new();
    let mut stderr = Vec::new();
    let status = dispatcher.dispatch(&EntryPoint::run_module("pkg"), &mut host, &mut stderr);
    assert_eq!(status, ExitStatus::FAILURE);
    assert!(host.output.is_empty());
    assert_eq!(
        String::from_utf8(stderr).unwrap().trim(),
        "No module named 'pkg.extra'"
    );
}

#[test]
fn test_inconsistency_aborts_with_dedicated_status() {
    let index = ArchiveIndex::from_zip_bytes(&archive(&[
        ("app/__init__.py", ""),
        ("app/__main__.py", "import app.ghost\nprint('unreachable')"),
    ]))
    .unwrap();
    let mut modules: BTreeSet<String> = Classification::from_index(&index)
        .modules()
        .map(String::from)
        .collect();
    modules.insert("app.ghost".to_string());
    let classification = Classification::new(BTreeSet::from(["app".to_string()]), modules);

    let mut chain = ResolutionChain::new();
    chain.install(Box::new(VirtualModuleResolver::with_classification(
        index,
        classification,
    )));
    let mut dispatcher = Dispatcher::with_chain(chain);
    let mut host = ScriptHost::new();
    let mut stderr = Vec::new();
    let status = dispatcher.dispatch(&EntryPoint::run_module("app"), &mut host, &mut stderr);

    assert_eq!(status, ExitStatus::RESOLVER_INCONSISTENCY);
    assert!(host.output.is_empty());
    let stderr = String::from_utf8(stderr).unwrap();
    assert!(stderr.contains("app/ghost.py"), "{}", stderr);
}

#[test]
fn test_import_binds_children_on_parent() {
    let mut chain = ResolutionChain::new();
    chain.install(Box::new(resolver(&[
        ("a/__init__.py", ""),
        ("a/b.py", "def f(): return 7"),
    ])));
    let mut importer = Importer::new(chain);
    let mut host = ScriptHost::new();
    importer.import("a.b", &mut host).unwrap();

    assert_eq!(
        importer.module("a").unwrap().get("b"),
        Some(&Value::Module("a.b".into()))
    );
    assert_eq!(
        importer.module("a.b").unwrap().get("f"),
        Some(&Value::Function("a.b.f".into()))
    );
}
