//! Ensures shipped builds keep unwinding, so a panicking lookup task is
//! caught by the resolver instead of aborting the whole search.

use std::path::Path;

fn root_manifest() -> toml::Value {
    let root = Path::new(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .unwrap()
        .parent()
        .unwrap();
    let root_toml = std::fs::read_to_string(root.join("Cargo.toml")).unwrap();
    root_toml.parse().unwrap()
}

#[test]
fn no_profile_aborts_on_panic() {
    let doc = root_manifest();
    let Some(profiles) = doc.get("profile").and_then(|p| p.as_table()) else {
        return;
    };

    for (name, profile) in profiles {
        let panic = profile.get("panic").and_then(|v| v.as_str());
        assert_ne!(
            panic,
            Some("abort"),
            "profile.{name} sets panic = \"abort\"; lookup panics would kill the process"
        );
    }
}
