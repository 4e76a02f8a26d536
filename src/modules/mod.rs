//! Concrete language modules. Out of scope per the core's contract is a
//! full registry of languages (§1); `shell` is kept in-tree as the
//! reference implementation of the Finder/Parser/Runner contracts.

pub mod shell;
