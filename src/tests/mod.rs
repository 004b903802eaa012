mod utils;
mod varset_test;
