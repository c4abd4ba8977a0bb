use std::cell::RefCell;
use std::rc::Rc;

use notation::annotation::{self, Annotation};
use notation::directive;
use notation::document::{Document, Element};
use notation::error::ExprError;
use notation::expr;

use engine::check;
use engine::error::EngineError;
use engine::eval::{self, WARNING_GLYPH};
use engine::overlay::{self, OverlayRule, Theme};
use engine::pass;
use engine::scheduler::{BlockState, DocumentSource, HostEvent, OverlaySink, Scheduler};
use engine::scope::{Lookup, Scope, ScopeChain};

fn block(lines: &[&str]) -> Element {
    Element::block(lines.iter().map(|line| Element::unit(*line)).collect())
}

fn page(blocks: Vec<Element>) -> Document {
    Document::page(blocks)
}

fn rules(document: &Document) -> Vec<OverlayRule> {
    pass::run(document, &Scope::new()).rules
}

fn rule_texts(document: &Document) -> Vec<String> {
    rules(document).into_iter().map(|rule| rule.text).collect()
}

// ---------------------------------------------------------------------------
// Annotation scanning
// ---------------------------------------------------------------------------

#[test]
fn annotation_classification() {
    assert_eq!(annotation::scan("{12}"), vec![Annotation::Number(12.0)]);
    assert_eq!(
        annotation::scan("{x}"),
        vec![Annotation::Reference("x".to_string())]
    );
    assert_eq!(
        annotation::scan("{_v}"),
        vec![Annotation::Reference("_v".to_string())]
    );
    assert_eq!(
        annotation::scan("{x=4}"),
        vec![Annotation::Assignment {
            name: "x".to_string(),
            value: 4.0
        }]
    );
    assert_eq!(
        annotation::scan("{x = 4}"),
        vec![Annotation::Assignment {
            name: "x".to_string(),
            value: 4.0
        }]
    );
}

#[test]
fn annotation_rejects_padding_and_mixed_heads() {
    assert!(annotation::scan("{ x=4}").is_empty());
    assert!(annotation::scan("{x=4 }").is_empty());
    assert!(annotation::scan("{ 5 }").is_empty());
    assert!(annotation::scan("{9x}").is_empty());
    assert!(annotation::scan("{x=4.5}").is_empty());
}

#[test]
fn annotation_scan_recovers_after_mismatch() {
    assert_eq!(annotation::scan("{a{5}"), vec![Annotation::Number(5.0)]);
    assert_eq!(
        annotation::scan("cost {10} and {x=2} plus {x}"),
        vec![
            Annotation::Number(10.0),
            Annotation::Assignment {
                name: "x".to_string(),
                value: 2.0
            },
            Annotation::Reference("x".to_string()),
        ]
    );
}

#[test]
fn annotation_digit_named_assignment() {
    // `{5=3}` binds the (unreachable) name "5" and still contributes 3.
    assert_eq!(
        annotation::scan("{5=3}"),
        vec![Annotation::Assignment {
            name: "5".to_string(),
            value: 3.0
        }]
    );
    let doc = page(vec![block(&["{5=3}", "[[sum]]"])]);
    assert_eq!(rule_texts(&doc), vec!["3"]);
}

// ---------------------------------------------------------------------------
// Directive scanning
// ---------------------------------------------------------------------------

#[test]
fn directive_scan_is_lazy() {
    let found = directive::scan("[[2+2]] and [[3*3]]");
    assert_eq!(found.len(), 2);
    assert_eq!(found[0].body, "2+2");
    assert_eq!(found[0].start, 0);
    assert_eq!(found[0].end, 7);
    assert_eq!(found[1].body, "3*3");
}

#[test]
fn directive_empty_body_is_not_a_directive() {
    assert!(directive::scan("[[]]").is_empty());
    // ...but a later `]]` can still close the opener.
    let found = directive::scan("[[]]x]]");
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].body, "]]x");
}

#[test]
fn directive_sum_classification() {
    assert!(directive::scan("[[sum]]")[0].is_sum());
    assert!(directive::scan("[[ SUM ]]")[0].is_sum());
    assert!(directive::scan("[[Sum]]")[0].is_sum());
    assert!(!directive::scan("[[sum+1]]")[0].is_sum());
    assert!(!directive::scan("[[summary]]")[0].is_sum());
}

// ---------------------------------------------------------------------------
// Expression grammar
// ---------------------------------------------------------------------------

#[test]
fn expr_parses_basic_arithmetic() {
    assert!(expr::parse("2+3*4").is_ok());
    assert!(expr::parse("(2 + 3) * 4").is_ok());
    assert!(expr::parse("-3 + 5").is_ok());
    assert!(expr::parse(".5 + 1").is_ok());
}

#[test]
fn expr_rejects_unsafe_and_malformed_input() {
    assert!(matches!(
        expr::parse("2^3"),
        Err(ExprError::UnsafeCharacter { ch: '^', .. })
    ));
    assert!(expr::parse("2+*3").is_err());
    assert!(expr::parse("1.2.3").is_err());
    assert!(expr::parse("2 3").is_err());
    assert!(expr::parse("(2+3").is_err());
    assert!(expr::parse("").is_err());
}

// ---------------------------------------------------------------------------
// Sums and directive rendering
// ---------------------------------------------------------------------------

#[test]
fn literals_sum_per_block() {
    let doc = page(vec![block(&["{5} apples", "{3} pears", "[[sum]]"])]);
    assert_eq!(rule_texts(&doc), vec!["8"]);
}

#[test]
fn assignment_feeds_expression_directive() {
    let doc = page(vec![block(&["{x=4}", "[[$x+1]]"])]);
    assert_eq!(rule_texts(&doc), vec!["5"]);
}

#[test]
fn annotation_order_is_commutative() {
    let a = page(vec![block(&["{5} {3} {x=2}", "[[sum]]"])]);
    let b = page(vec![block(&["{x=2} {3} {5}", "[[sum]]"])]);
    assert_eq!(rule_texts(&a), rule_texts(&b));
}

#[test]
fn reference_resolves_before_its_assignment_line() {
    // The local scope is built from the whole block before summing, so a
    // reference above its assignment still resolves.
    let doc = page(vec![block(&["{x}", "{x=4}", "[[sum]]"])]);
    assert_eq!(rule_texts(&doc), vec!["8"]);
}

#[test]
fn later_assignment_wins_but_both_contribute() {
    let doc = page(vec![block(&["{x=1}", "{x=2}", "[[$x]] / [[sum]]"])]);
    assert_eq!(rule_texts(&doc), vec!["2 / 3"]);
}

#[test]
fn unresolved_names_are_zero_never_errors() {
    let doc = page(vec![block(&["{ghost}", "[[sum]] [[$ghost+1]]"])]);
    assert_eq!(rule_texts(&doc), vec!["0 1"]);
}

#[test]
fn global_scope_fallback_and_local_shadowing() {
    let mut global = Scope::new();
    global.set("rate", 7.0);
    let doc = page(vec![
        block(&["{rate}", "[[sum]] [[$rate]]"]),
        block(&["{rate=1}", "[[$rate]]"]),
    ]);
    let outcome = pass::run(&doc, &global);
    let texts: Vec<&str> = outcome.rules.iter().map(|r| r.text.as_str()).collect();
    assert_eq!(texts, vec!["7 7", "1"]);
}

#[test]
fn lookup_reports_where_a_name_resolved() {
    let mut local = Scope::new();
    let mut global = Scope::new();
    local.set("x", 1.0);
    global.set("x", 2.0);
    global.set("y", 3.0);
    let chain = ScopeChain::new(&local, &global);
    assert_eq!(chain.lookup("x"), Lookup::Local(1.0));
    assert_eq!(chain.lookup("y"), Lookup::Global(3.0));
    assert_eq!(chain.lookup("z"), Lookup::Unbound);
    assert_eq!(chain.resolve_or_zero("z"), 0.0);
}

#[test]
fn passes_never_write_the_global_scope() {
    let global = Scope::new();
    let doc = page(vec![block(&["{x=4}", "[[sum]]"])]);
    pass::run(&doc, &global);
    assert!(global.is_empty());
}

#[test]
fn sum_keyword_is_case_insensitive() {
    let doc = page(vec![block(&["{5} {3}", "[[SUM]] [[ Sum ]]"])]);
    assert_eq!(rule_texts(&doc), vec!["8 8"]);
}

#[test]
fn sum_substitutes_only_on_word_boundaries() {
    let doc = page(vec![block(&["{5}", "[[sum+1]] [[summary]]"])]);
    assert_eq!(rule_texts(&doc), vec![format!("6 {}", WARNING_GLYPH)]);
}

#[test]
fn sum_substitution_keeps_full_precision() {
    // Rounding applies to the displayed result only, not to the
    // substituted sum text.
    let doc = page(vec![block(&["{10}", "[[sum/3]]"])]);
    assert_eq!(rule_texts(&doc), vec!["3.33"]);
}

#[test]
fn display_rounds_to_two_decimals() {
    let doc = page(vec![block(&["[[10/3]] [[10/2]] [[0.125+0]] [[1.5+2.25]]"])]);
    assert_eq!(rule_texts(&doc), vec!["3.33 5 0.13 3.75"]);
}

#[test]
fn expression_precedence_and_unary() {
    let doc = page(vec![block(&["[[2+3*4]] [[(2+3)*4]] [[-3+5]] [[5--3]]"])]);
    assert_eq!(rule_texts(&doc), vec!["14 20 2 8"]);
}

#[test]
fn malformed_directive_is_contained() {
    let doc = page(vec![block(&[
        "[[2+*3]] ok [[2+2]]",
        "untouched [[3*3]]",
    ])]);
    assert_eq!(
        rule_texts(&doc),
        vec![format!("{} ok 4", WARNING_GLYPH), "untouched 9".to_string()]
    );
}

#[test]
fn unsafe_expressions_render_the_glyph() {
    let doc = page(vec![block(&["[[2^3]]", "[[alert(1)]]", "[[$x=5]]"])]);
    assert_eq!(
        rule_texts(&doc),
        vec![WARNING_GLYPH, WARNING_GLYPH, WARNING_GLYPH]
    );
}

#[test]
fn non_finite_results_render_the_glyph() {
    let doc = page(vec![block(&["[[10/0]]", "[[0/0]]", "[[1/(2-2)]]"])]);
    assert_eq!(
        rule_texts(&doc),
        vec![WARNING_GLYPH, WARNING_GLYPH, WARNING_GLYPH]
    );
}

#[test]
fn render_unit_without_directives_is_none() {
    let scope = Scope::new();
    let chain = ScopeChain::new(&scope, &scope);
    assert_eq!(eval::render_unit("plain prose {5}", 5.0, chain), None);
}

// ---------------------------------------------------------------------------
// Pass and overlay compilation
// ---------------------------------------------------------------------------

#[test]
fn focused_block_produces_no_rules() {
    let doc = page(vec![
        block(&["{5}", "[[sum]]"]).with_focus(true),
        block(&["{2}", "[[sum]]"]),
    ]);
    let outcome = pass::run(&doc, &Scope::new());
    assert_eq!(outcome.blocks.len(), 2);
    assert_eq!(outcome.rules.len(), 1);
    assert_eq!(outcome.rules[0].text, "2");
}

#[test]
fn separator_and_blank_units_take_no_rules() {
    let doc = page(vec![block(&["--", "----", "   ", "", "[[sum]] {2}"])]);
    let collected = rules(&doc);
    assert_eq!(collected.len(), 1);
    assert_eq!(collected[0].text, "2 {2}");
}

#[test]
fn annotations_alone_produce_no_rules() {
    let doc = page(vec![block(&["{5} groceries", "{x=3} repair"])]);
    assert!(rules(&doc).is_empty());
}

#[test]
fn block_sums_are_isolated() {
    let doc = page(vec![
        block(&["{5}", "[[sum]]"]),
        block(&["{2}", "[[sum]]"]),
    ]);
    assert_eq!(rule_texts(&doc), vec!["5", "2"]);
}

#[test]
fn addresses_follow_the_ancestor_chain() {
    let doc = page(vec![
        Element::container("div", vec![]),
        Element::container("div", vec![]),
        block(&["first", "second [[1+1]]"]),
    ]);
    let collected = rules(&doc);
    assert_eq!(collected.len(), 1);
    assert_eq!(
        collected[0].address.as_str(),
        "html > body > div:nth-child(3) > p:nth-child(2)"
    );
}

#[test]
fn passes_are_idempotent() {
    let mut global = Scope::new();
    global.set("rate", 7.0);
    let doc = page(vec![
        block(&["{5} {rate}", "[[sum]]"]),
        block(&["note [[2*3]]"]),
    ]);
    let theme = Theme::default();
    let first = pass::render_document(&doc, &global, &theme);
    let second = pass::render_document(&doc, &global, &theme);
    assert_eq!(first, second);
}

#[test]
fn escape_order_is_backslash_quote_linebreak() {
    assert_eq!(
        overlay::escape_content("a\\b\"c\nd"),
        "a\\\\b\\\"c\\A d"
    );
    assert_eq!(overlay::escape_content("e\r\nf"), "e\\A f");
}

#[test]
fn rendered_text_is_escaped_into_the_stylesheet() {
    let doc = page(vec![block(&["say \"hi\\\" [[1+1]]"])]);
    let css = pass::render_document(&doc, &Scope::new(), &Theme::default());
    assert!(css.contains("content: \"say \\\"hi\\\\\\\" 2\""));
}

#[test]
fn compiled_rules_suppress_and_redraw() {
    let doc = page(vec![block(&["total [[2+2]]"])]);
    let css = pass::render_document(&doc, &Scope::new(), &Theme::default());
    assert!(css.contains("font-size: 0 !important"));
    assert!(css.contains("::after"));
    assert!(css.contains("content: \"total 4\""));
    assert!(css.contains("font-size: 14px !important"));
    assert!(css.contains("color: hsla(0,0%,100%,.9)"));
    assert!(css.contains("font-weight: 700"));
}

#[test]
fn theme_overrides_presentation() {
    let theme = Theme {
        font_size: 16,
        color: "#222".to_string(),
        font_weight: "400".to_string(),
    };
    let doc = page(vec![block(&["[[2+2]]"])]);
    let css = pass::render_document(&doc, &Scope::new(), &theme);
    assert!(css.contains("font-size: 16px !important"));
    assert!(css.contains("color: #222"));
    assert!(css.contains("font-weight: 400"));
}

#[test]
fn empty_rule_set_compiles_to_empty_stylesheet() {
    assert_eq!(overlay::compile(&[], &Theme::default()), "");
}

#[test]
fn separator_detection() {
    assert!(overlay::is_separator("--"));
    assert!(overlay::is_separator("-----"));
    assert!(!overlay::is_separator("-"));
    assert!(!overlay::is_separator("a--"));
    assert!(!overlay::is_separator(""));
}

// ---------------------------------------------------------------------------
// Scheduler
// ---------------------------------------------------------------------------

struct FixedSource(Document);

impl DocumentSource for FixedSource {
    fn snapshot(&self) -> Document {
        self.0.clone()
    }
}

#[derive(Clone, Default)]
struct RecordingSink(Rc<RefCell<Vec<String>>>);

impl RecordingSink {
    fn applied(&self) -> Vec<String> {
        self.0.borrow().clone()
    }

    fn last(&self) -> String {
        self.0.borrow().last().cloned().unwrap_or_default()
    }
}

impl OverlaySink for RecordingSink {
    fn apply(&mut self, stylesheet: &str) -> Result<(), EngineError> {
        self.0.borrow_mut().push(stylesheet.to_string());
        Ok(())
    }
}

fn two_block_document() -> Document {
    page(vec![
        block(&["{5}", "[[sum]]"]),
        block(&["{2}", "[[sum]]"]),
    ])
}

#[test]
fn ready_runs_the_initial_pass() {
    let sink = RecordingSink::default();
    let mut scheduler = Scheduler::new(FixedSource(two_block_document()), sink.clone());
    scheduler.handle(HostEvent::Ready).unwrap();
    assert_eq!(sink.applied().len(), 1);
    assert!(sink.last().contains("content: \"5\""));
}

#[test]
fn focus_gained_clears_the_sink_synchronously() {
    let doc = two_block_document();
    let addresses = pass::run(&doc, &Scope::new()).blocks;
    let sink = RecordingSink::default();
    let mut scheduler = Scheduler::new(FixedSource(doc), sink.clone());

    scheduler.handle(HostEvent::Ready).unwrap();
    scheduler
        .handle(HostEvent::FocusGained(addresses[0].clone()))
        .unwrap();

    assert_eq!(sink.applied().len(), 2);
    assert_eq!(sink.last(), "");
    assert_eq!(scheduler.block_state(&addresses[0]), BlockState::Editing);
    assert_eq!(scheduler.block_state(&addresses[1]), BlockState::Suspended);
}

#[test]
fn focus_round_trip_repopulates_identically() {
    let doc = two_block_document();
    let addresses = pass::run(&doc, &Scope::new()).blocks;
    let sink = RecordingSink::default();
    let mut scheduler = Scheduler::new(FixedSource(doc), sink.clone());

    scheduler.handle(HostEvent::Ready).unwrap();
    let initial = sink.last();
    scheduler
        .handle(HostEvent::FocusGained(addresses[0].clone()))
        .unwrap();
    scheduler
        .handle(HostEvent::FocusLost(addresses[0].clone()))
        .unwrap();

    assert_eq!(sink.last(), initial);
    assert_eq!(scheduler.block_state(&addresses[0]), BlockState::Idle);
    assert_eq!(scheduler.block_state(&addresses[1]), BlockState::Idle);
}

#[test]
fn mutation_triggers_a_recomputation() {
    let sink = RecordingSink::default();
    let mut scheduler = Scheduler::new(FixedSource(two_block_document()), sink.clone());
    scheduler.handle(HostEvent::Ready).unwrap();
    scheduler.handle(HostEvent::Mutated).unwrap();
    assert_eq!(sink.applied().len(), 2);
    assert_eq!(sink.applied()[0], sink.applied()[1]);
}

#[test]
fn mutation_while_editing_keeps_the_edited_block_verbatim() {
    // While the user types, mutations recompute the other blocks but the
    // snapshot still reports the edited block focused, so it stays bare.
    let doc = page(vec![
        block(&["{5}", "[[sum]]"]).with_focus(true),
        block(&["{2}", "[[sum]]"]),
    ]);
    let sink = RecordingSink::default();
    let mut scheduler = Scheduler::new(FixedSource(doc), sink.clone());
    scheduler.handle(HostEvent::Mutated).unwrap();
    let css = sink.last();
    assert!(css.contains("content: \"2\""));
    assert!(!css.contains("content: \"5\""));
}

#[test]
fn seeded_globals_are_visible_to_passes() {
    let doc = page(vec![block(&["{rate}", "[[$rate]]"])]);
    let sink = RecordingSink::default();
    let mut scheduler = Scheduler::new(FixedSource(doc), sink.clone());
    scheduler.global_scope_mut().set("rate", 7.0);
    scheduler.handle(HostEvent::Ready).unwrap();
    assert!(sink.last().contains("content: \"7\""));
}

// ---------------------------------------------------------------------------
// Check pipeline
// ---------------------------------------------------------------------------

#[test]
fn check_reports_uncomputable_directives_with_spans() {
    let units = vec![("pay [[2+*3]] now", 0usize), ("[[sum]]", 20)];
    let warnings = check::check_block(&units, &Scope::new(), 0);
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].span, 4..12);
    assert!(warnings[0].message.contains("never computes"));
}

#[test]
fn check_respects_resolved_globals() {
    let units = vec![("[[1/$x]]", 0usize)];
    assert_eq!(check::check_block(&units, &Scope::new(), 0).len(), 1);

    let mut global = Scope::new();
    global.set("x", 2.0);
    assert!(check::check_block(&units, &global, 0).is_empty());
}
