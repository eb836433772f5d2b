use super::*;

#[test]
fn print_help_does_not_panic() {
    print_help();
}
