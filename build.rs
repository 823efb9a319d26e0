use std::error::Error;
use vergen::EmitBuilder;

fn main() -> Result<(), Box<dyn Error>> {
    // Rerun on any change in the crate directory
    let emitted = EmitBuilder::builder()
        .fail_on_error()
        .custom_build_rs(".")
        .all_git()
        .git_describe(true, false, Some("polyclv-no-tag-match"))
        .emit();
    if emitted.is_err() {
        // Builds outside a git checkout have no describe output
        println!("cargo:rustc-env=VERGEN_GIT_DESCRIBE=unknown");
    }
    Ok(())
}
