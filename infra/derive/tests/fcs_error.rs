#[test]
fn fcs_error_ui() {
    let t = trybuild::TestCases::new();
    t.pass("tests/ui/fcs_error_pass.rs");
    t.pass("tests/ui/fcs_error_identity_fields.rs");
}
