// Shared build script helper, pulled into each crate's build.rs with:
//   include!("../build_common.rs");
//
// The including build.rs must bring std::env, std::fs and std::path::Path
// into scope.

/// Render the crate README into OUT_DIR so lib.rs can embed it as the
/// crate-level doc comment.
///
/// Rustdoc cannot follow `src/...` file links, so `](src/foo.rs)` style
/// links are rewritten to `](foo)` module links on the way through. A
/// missing README produces an empty page rather than a build failure.
fn process_readme_for_rustdoc(crate_dir: &str) {
    println!("cargo:rerun-if-changed=README.md");

    let readme_path = Path::new(crate_dir).join("README.md");
    let content = fs::read_to_string(&readme_path).unwrap_or_default();

    let rendered = content.replace("](src/", "](").replace(".rs)", ")");

    let out_dir = env::var("OUT_DIR").expect("OUT_DIR is set by cargo");
    let dest_path = Path::new(&out_dir).join("README_GENERATED.md");
    fs::write(dest_path, rendered).expect("write README_GENERATED.md");
}
