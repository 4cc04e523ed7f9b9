pub mod fixtures;

#[cfg(test)]
mod status_tests;
