//! Workspace stub crate. Exists so the root package can host shared
//! tooling (git hooks via cargo-husky); all real code lives in `crates/`.
