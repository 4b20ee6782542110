//! Verify that `build.rs` sets `RULEBOX_VERSION` correctly.
//!
//! The version embedded at compile time must never start with `v` (the
//! settings header prepends it) and must start with a digit.
//!
//! In dev builds (no `RULEBOX_RELEASE_VERSION` env var), this equals the
//! Cargo.toml version (`0.0.0-dev`).

const VERSION: &str = env!("RULEBOX_VERSION");

#[test]
fn version_has_no_v_prefix() {
    assert!(
        !VERSION.starts_with('v'),
        "RULEBOX_VERSION must not start with 'v' (got {VERSION:?}); \
         the UI already prepends the prefix"
    );
}

#[test]
fn version_starts_with_digit() {
    assert!(
        VERSION.starts_with(|c: char| c.is_ascii_digit()),
        "RULEBOX_VERSION must start with a digit (got {VERSION:?})"
    );
}

#[test]
fn dev_build_version_matches_cargo_toml() {
    if VERSION.contains("-dev") {
        assert_eq!(VERSION, env!("CARGO_PKG_VERSION"));
    }
}
