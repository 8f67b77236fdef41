#[cfg(test)]
mod pages_tests;
