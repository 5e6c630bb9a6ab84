//! Cross-crate scenarios for picpop live under `tests/`; this library is
//! intentionally empty.
