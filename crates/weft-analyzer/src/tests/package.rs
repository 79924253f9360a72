//! Package-wide analysis.

use super::test_helpers::*;
use crate::{AnalysisError, Analyzer, AnalyzerConfig, QueryOptions};
use async_trait::async_trait;
use tempfile::TempDir;
use weft_core::{
    DocumentUrl, FeatureKind, FsLoader, LoadError, LoadResult, Loader, Severity, WarningCode,
};

#[tokio::test]
async fn one_broken_file_does_not_spoil_the_package() {
    let loader = TestLoader::new(&[
        ("src/a.js", &element("x-a", "XA")),
        ("src/b.js", &element("x-b", "XB")),
        ("src/broken.js", "class {"),
    ]);
    let analyzer = analyzer(&loader);

    let package = analyzer.analyze_package().await.unwrap();
    assert_eq!(package.len(), 3);
    assert_eq!(
        tags(&package.get_by_kind(FeatureKind::Element, QueryOptions::default())),
        ["x-a", "x-b"]
    );

    let warnings = package.get_warnings(QueryOptions::default());
    let errors = errors(&warnings);
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].code, WarningCode::ParseError);
    assert_eq!(errors[0].source_range.file.as_str(), "src/broken.js");
}

#[tokio::test]
async fn entry_points_that_fail_to_load_become_warnings() {
    let loader = TestLoader::new(&[
        ("src/a.js", &element("x-a", "XA")),
        ("src/b.js", &element("x-b", "XB")),
    ]);
    loader.fail("src/b.js");
    let analyzer = analyzer(&loader);

    let package = analyzer.analyze_package().await.unwrap();
    assert_eq!(urls(package.urls()), ["src/a.js"]);

    let warnings = package.get_warnings(QueryOptions::default());
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].severity, Severity::Error);
    assert_eq!(warnings[0].code, WarningCode::CouldNotLoad);
    assert_eq!(warnings[0].source_range.file.as_str(), "src/b.js");
    assert!(warnings[0].message.contains("permission denied"));
}

#[tokio::test]
async fn entry_points_skip_dependencies_excluded_dirs_and_unknown_files() {
    let loader = TestLoader::new(&[
        ("README.md", "# components"),
        ("fixtures/x-test.js", &element("x-test", "XTest")),
        ("node_modules/lit/index.js", &element("lit-thing", "LitThing")),
        ("src/app.js", &module(&["lit"], "x-app", "XApp")),
        ("src/index.html", "<script type=module src=app.js></script>"),
    ]);
    let analyzer = Analyzer::builder()
        .shared_loader(loader.clone())
        .config(AnalyzerConfig::default().with_exclude_dirs(["fixtures"]))
        .build();

    let package = analyzer.analyze_package().await.unwrap();
    assert_eq!(urls(package.urls()), ["src/app.js", "src/index.html"]);
    assert_eq!(loader.loads("fixtures/x-test.js"), 0);
    assert_eq!(loader.loads("README.md"), 0);

    // Dependencies are still analyzed when imported.
    assert_eq!(
        tags(&package.get_by_kind(FeatureKind::Element, QueryOptions::everything())),
        ["x-app", "lit-thing"]
    );
}

#[tokio::test]
async fn shared_imports_are_visited_once() {
    let loader = TestLoader::new(&[
        ("a.js", "import './shared.js';"),
        ("b.js", "import './shared.js';"),
        ("shared.js", &element("x-shared", "XShared")),
    ]);
    let analyzer = analyzer(&loader);

    let package = analyzer.analyze_package().await.unwrap();
    assert_eq!(package.len(), 3);
    assert_eq!(
        urls(package.reachable_urls(QueryOptions::default())),
        ["a.js", "shared.js", "b.js"]
    );
    assert_eq!(
        package
            .get_by_id(FeatureKind::Element, "x-shared", QueryOptions::default())
            .len(),
        1
    );

    // Every entry point is cached for later single-document requests.
    let b = analyzer.analyze("b.js").await.unwrap();
    assert!(b.ptr_eq(package.document(&url("b.js")).unwrap()));
}

#[tokio::test]
async fn analyzes_a_package_on_disk() {
    let temp = TempDir::new().unwrap();
    let root = create_test_project(
        &temp,
        &[
            ("src/app.js", &module(&["lit", "./x-foo.js"], "x-app", "XApp")),
            ("src/x-foo.js", &element("x-foo", "XFoo")),
            ("node_modules/lit/index.js", &element("lit-thing", "LitThing")),
        ],
    );
    let analyzer = Analyzer::builder().loader(FsLoader::new(root)).build();

    let package = analyzer.analyze_package().await.unwrap();
    assert_eq!(urls(package.urls()), ["src/app.js", "src/x-foo.js"]);
    assert_eq!(
        tags(&package.get_by_kind(FeatureKind::Element, QueryOptions::default())),
        ["x-app", "x-foo"]
    );
    assert_eq!(
        tags(&package.get_by_kind(FeatureKind::Element, QueryOptions::everything())),
        ["x-app", "lit-thing", "x-foo"]
    );
    assert!(package.get_warnings(QueryOptions::everything()).is_empty());
}

#[derive(Debug)]
struct SingleFileLoader;

#[async_trait]
impl Loader for SingleFileLoader {
    fn can_load(&self, url: &DocumentUrl) -> bool {
        url.as_str() == "only.js"
    }

    async fn load(&self, url: &DocumentUrl) -> LoadResult<String> {
        Err(LoadError::NotFound(url.clone()))
    }
}

#[tokio::test]
async fn loaders_that_cannot_list_fail_package_analysis() {
    let analyzer = Analyzer::builder().loader(SingleFileLoader).build();
    let error = analyzer.analyze_package().await.unwrap_err();
    assert!(matches!(error, AnalysisError::Package(LoadError::Unsupported(_))));
}

#[tokio::test]
async fn empty_packages_are_empty() {
    let loader = TestLoader::new(&[]);
    let package = analyzer(&loader).analyze_package().await.unwrap();
    assert!(package.is_empty());
    assert!(package.get_features(QueryOptions::everything()).is_empty());
}
