//! End-to-end asset pipeline tests against the public API

use pressroom::cache::{bundle_key, CacheStore};
use pressroom::config::Mode;
use pressroom::pipeline::AssetPipeline;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

fn write(dir: &Path, rel: &str, content: &str) {
    let path = dir.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}

fn pipeline_with_cache(dir: &Path, mode: Mode, cache: Arc<CacheStore>) -> AssetPipeline {
    AssetPipeline::new(dir.join("assets"), dir.join("vendor"), mode, cache)
}

#[tokio::test]
async fn full_production_build_of_a_session_bundle() {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "assets/app.js",
        "console.log('x');\nconst s = '__clientSecret__';\nexport default s;\n",
    );

    let cache = Arc::new(CacheStore::new(8, Duration::from_secs(60)));
    let pipeline = pipeline_with_cache(dir.path(), Mode::Production, Arc::clone(&cache));

    let output = pipeline.build_js("app.js", "abc123").await.unwrap();
    assert!(!output.is_empty());
    assert!(output.contains("abc123"));
    assert!(!output.contains("console.log"));

    // The second identical request is a cache hit with identical text
    let again = pipeline.build_js("app.js", "abc123").await.unwrap();
    assert_eq!(output, again);
    assert_eq!(cache.len(), 1);
    assert!(cache.get(&bundle_key("app.js", "abc123")).is_some());
}

#[tokio::test]
async fn bundles_with_package_imports_inline_their_dependencies() {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "vendor/lit-view/package.json",
        r#"{ "name": "lit-view", "module": "src/index.js" }"#,
    );
    write(
        dir.path(),
        "vendor/lit-view/src/index.js",
        "export const render = (tpl) => tpl;\nexport default render;\n",
    );
    write(
        dir.path(),
        "assets/helpers/store.js",
        "export const secret = '__clientSecret__';\n",
    );
    write(
        dir.path(),
        "assets/app.js",
        "import render from 'lit-view';\nimport { secret } from './helpers/store.js';\nrender(secret);\n",
    );

    let cache = Arc::new(CacheStore::new(8, Duration::from_secs(60)));
    let pipeline = pipeline_with_cache(dir.path(), Mode::Development, cache);

    let output = pipeline.build_js("app.js", "tok-1").await.unwrap();
    assert!(!output.contains("import"));
    assert!(output.contains("render"));
    assert!(output.contains("tok-1"));
}

#[tokio::test]
async fn cache_ttl_forces_a_rebuild() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "assets/app.js", "export default '__clientSecret__';\n");

    let cache = Arc::new(CacheStore::new(8, Duration::from_millis(30)));
    let pipeline = pipeline_with_cache(dir.path(), Mode::Production, cache);

    let first = pipeline.build_js("app.js", "s").await.unwrap();
    write(dir.path(), "assets/app.js", "export default 'rebuilt';\n");

    tokio::time::sleep(Duration::from_millis(60)).await;
    let second = pipeline.build_js("app.js", "s").await.unwrap();
    assert_ne!(first, second);
    assert!(second.contains("rebuilt"));
}

#[tokio::test]
async fn cache_capacity_evicts_oldest_session_bundle() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "assets/app.js", "export default '__clientSecret__';\n");

    let cache = Arc::new(CacheStore::new(2, Duration::from_secs(60)));
    let pipeline = pipeline_with_cache(dir.path(), Mode::Production, Arc::clone(&cache));

    pipeline.build_js("app.js", "s1").await.unwrap();
    pipeline.build_js("app.js", "s2").await.unwrap();
    // Touch s1 so s2 is the eviction candidate
    pipeline.build_js("app.js", "s1").await.unwrap();
    pipeline.build_js("app.js", "s3").await.unwrap();

    assert_eq!(cache.len(), 2);
    assert!(cache.get(&bundle_key("app.js", "s1")).is_some());
    assert!(cache.get(&bundle_key("app.js", "s2")).is_none());
    assert!(cache.get(&bundle_key("app.js", "s3")).is_some());
}

#[tokio::test]
async fn session_secrets_never_cross_bundles() {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "assets/app.js",
        "const s = '__clientSecret__';\nexport default s;\n",
    );

    let cache = Arc::new(CacheStore::new(8, Duration::from_secs(60)));
    let pipeline = pipeline_with_cache(dir.path(), Mode::Production, cache);

    let a = pipeline.build_js("app.js", "alpha-secret").await.unwrap();
    let b = pipeline.build_js("app.js", "beta-secret").await.unwrap();

    assert!(a.contains("alpha-secret"));
    assert!(!a.contains("beta-secret"));
    assert!(b.contains("beta-secret"));
    assert!(!b.contains("alpha-secret"));
    assert_ne!(
        bundle_key("app.js", "alpha-secret"),
        bundle_key("app.js", "beta-secret")
    );
}
