// tests/translate_rules.rs
use crypto_signal_desk::analyze::{translate, Rewriter};

#[test]
fn curated_override_beats_the_chain() {
    assert_eq!(
        translate("Federal Reserve issues FOMC statement."),
        "聯準會發布 FOMC 利率決策聲明"
    );
}

#[test]
fn unknown_text_is_returned_normalized() {
    assert_eq!(translate("  Hello&nbsp;  world "), "Hello world");
}

#[test]
fn rules_apply_in_order_on_rewritten_text() {
    let table = r#"
[[rule]]
pattern = 'Federal Reserve'
replace = "Fed"

[[rule]]
pattern = 'Fed'
replace = "聯準會"
"#;
    let rw = Rewriter::from_toml_str(table).unwrap();
    assert_eq!(rw.len(), 2);
    assert_eq!(rw.rewrite("Federal Reserve and Fed"), "聯準會 and 聯準會");

    // reversed order: the second rule never sees its own output
    let reversed = r#"
[[rule]]
pattern = 'Fed'
replace = "聯準會"

[[rule]]
pattern = 'Federal Reserve'
replace = "Fed"
"#;
    let rw = Rewriter::from_toml_str(reversed).unwrap();
    assert_eq!(rw.rewrite("Federal Reserve and Fed"), "聯準會eral Reserve and 聯準會");
}

#[test]
fn bad_pattern_names_the_rule() {
    let table = "[[rule]]\npattern = '('\nreplace = \"x\"\n";
    let err = Rewriter::from_toml_str(table).unwrap_err();
    assert!(format!("{err:#}").contains("rule #0"));
}

#[test]
fn repeat_rule_collapses_every_gap() {
    let once = "[[rule]]\npattern = '(\\p{Han}) +(\\p{Han})'\nreplace = \"${1}${2}\"\n";
    let rw = Rewriter::from_toml_str(once).unwrap();
    assert_eq!(rw.rewrite("甲 乙 丙"), "甲乙 丙");

    let repeated = format!("{once}repeat = true\n");
    let rw = Rewriter::from_toml_str(&repeated).unwrap();
    assert_eq!(rw.rewrite("甲 乙 丙 丁"), "甲乙丙丁");
}

#[test]
fn built_in_table_leaves_no_gap_between_han_runs() {
    assert_eq!(translate("甲 乙 丙"), "甲乙丙");
}
