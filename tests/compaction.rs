// tests/compaction.rs

use sitepipe::transform::css::compact_css;
use sitepipe::transform::script::compact_js;

#[test]
fn js_comments_and_whitespace_are_removed() {
    let src = "// header\nvar a = 1;\n/* block */\nvar b = a + 1;\n";
    assert_eq!(compact_js(src), "var a=1;var b=a+1;");
}

#[test]
fn js_string_contents_are_preserved() {
    assert_eq!(
        compact_js("var s = \"a  //  b\";\nvar t = 'x /* y */';"),
        "var s=\"a  //  b\";var t='x /* y */';"
    );
    assert_eq!(compact_js("var u = `  ${ a }  `;"), "var u=`  ${ a }  `;");
}

#[test]
fn js_regex_literals_and_division_are_told_apart() {
    assert_eq!(compact_js("x = /ab+c/g.test(y)"), "x=/ab+c/g.test(y)");
    assert_eq!(compact_js("a = b / c / d"), "a=b/c/d");
    assert_eq!(
        compact_js("return /[/]x/.test(s)"),
        "return/[/]x/.test(s)"
    );
}

#[test]
fn js_keeps_tokens_apart_where_needed() {
    assert_eq!(compact_js("a + +b"), "a+ +b");
    assert_eq!(compact_js("a - -b"), "a- -b");
    assert_eq!(compact_js("typeof  x === 'y'"), "typeof x==='y'");
}

#[test]
fn js_number_literals_stay_apart_from_member_access() {
    assert_eq!(compact_js("var s = 1 .toString();\n"), "var s=1 .toString();");
    assert_eq!(compact_js("n = 10\n.toFixed(2)"), "n=10 .toFixed(2)");
    assert_eq!(compact_js("v = x1 .y"), "v=x1.y");
    assert_eq!(compact_js("f = 1.5.toFixed()"), "f=1.5.toFixed()");
}

#[test]
fn js_newlines_survive_where_semicolons_may_be_implied() {
    assert_eq!(compact_js("a = b\nc()"), "a=b\nc()");
    assert_eq!(compact_js("a = [\n1,\n2\n]"), "a=[1,2]");
    assert_eq!(compact_js("foo()\n.bar()"), "foo().bar()");
}

#[test]
fn css_comments_and_whitespace_are_removed() {
    let src = "/* theme */\nbody {\n  margin: 0;\n  color: #333;\n}\n";
    assert_eq!(compact_css(src), "body{margin:0;color:#333}");
}

#[test]
fn css_selectors_keep_descendant_spaces() {
    assert_eq!(compact_css(".a .b > .c { x: y }"), ".a .b>.c{x:y}");
    assert_eq!(compact_css("a, b {\n}\n"), "a,b{}");
}

#[test]
fn css_strings_are_untouched() {
    assert_eq!(
        compact_css("a::after { content: \"  x ; }  \"; }"),
        "a::after{content:\"  x ; }  \"}"
    );
}

#[test]
fn css_values_keep_internal_spaces() {
    assert_eq!(
        compact_css("p {\n  margin: 0 auto;\n  font: 12px / 1.5 serif;\n}"),
        "p{margin:0 auto;font:12px / 1.5 serif}"
    );
}
