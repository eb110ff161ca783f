mod fixture;
mod merge_tests;
mod resolve_tests;
mod shell_tests;
