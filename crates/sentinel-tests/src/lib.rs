//! Test-only crate: no public API. Everything lives under `tests/` as
//! integration tests that exercise the published surface of the other
//! `sentinel-*` crates the way an external caller would.
