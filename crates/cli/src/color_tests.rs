use super::*;
use serial_test::serial;

#[test]
fn codes_have_expected_values() {
    assert_eq!(codes::HEADER, 74);
    assert_eq!(codes::LITERAL, 250);
    assert_eq!(codes::CONTEXT, 245);
    assert_eq!(codes::MUTED, 240);
}

#[test]
#[serial]
fn status_colors_success_green_and_failed_red() {
    std::env::set_var("COLOR", "1");
    std::env::remove_var("NO_COLOR");
    assert!(status("success").contains("\x1b[32m"));
    assert!(status("failed").contains("\x1b[31m"));
    assert!(status("pending").contains("\x1b[33m"));
    std::env::remove_var("COLOR");
}

#[test]
#[serial]
fn no_color_env_disables_colorizing() {
    std::env::set_var("NO_COLOR", "1");
    std::env::remove_var("COLOR");
    assert_eq!(header("x"), "x");
    assert_eq!(muted("x"), "x");
    assert_eq!(status("success"), "success");
    std::env::remove_var("NO_COLOR");
}

#[test]
#[serial]
fn unknown_status_word_is_left_plain() {
    std::env::set_var("COLOR", "1");
    std::env::remove_var("NO_COLOR");
    assert_eq!(status("unknown-thing"), "unknown-thing");
    std::env::remove_var("COLOR");
}
