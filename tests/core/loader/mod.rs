//! Loader pipeline tests

mod test_encoding;
mod test_failures;
mod test_scenarios;
mod test_splitters;
mod test_walker;
