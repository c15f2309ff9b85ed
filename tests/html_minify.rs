// tests/html_minify.rs

use sitepipe::transform::html::minify_html;
use sitepipe::transform::HtmlMinifyOptions;

fn minify(src: &str) -> String {
    minify_html(src, &HtmlMinifyOptions::default())
}

#[test]
fn all_flags_off_is_identity() {
    let src = "<p class=\"x\">  a  <!-- c --></p>";
    assert_eq!(minify_html(src, &HtmlMinifyOptions::none()), src);
}

#[test]
fn attributes_are_collapsed_and_pruned() {
    assert_eq!(
        minify(r#"<input type="text" disabled="disabled" class=""> disabled="x""#),
        r#"<input disabled> disabled="x""#
    );
}

#[test]
fn comments_go_but_conditional_comments_stay() {
    assert_eq!(
        minify("<p>a<!-- note -->b</p><!--[if IE]><p>ie</p><![endif]-->"),
        "<p>ab</p><!--[if IE]><p>ie</p><![endif]-->"
    );
}

#[test]
fn raw_text_blocks_keep_their_whitespace() {
    assert_eq!(
        minify("<div>\n  <pre>  keep   this  </pre>\n</div>"),
        "<div><pre>  keep   this  </pre></div>"
    );
}

#[test]
fn default_script_type_is_dropped() {
    assert_eq!(
        minify(r#"<script type="text/javascript">var a  =  1;</script>"#),
        "<script>var a  =  1;</script>"
    );
    assert_eq!(
        minify(r#"<link rel="stylesheet" type="text/css" href="/css/main.css">"#),
        r#"<link rel=stylesheet href="/css/main.css">"#
    );
}

#[test]
fn quotes_are_removed_only_where_safe() {
    assert_eq!(
        minify(r#"<div id="main" data-x='y"z'></div>"#),
        r#"<div id=main data-x='y"z'></div>"#
    );
}

#[test]
fn optional_end_tags_and_block_padding_are_removed() {
    assert_eq!(
        minify("<ul>\n  <li>one</li>\n  <li>two</li>\n</ul>"),
        "<ul><li>one<li>two</ul>"
    );
}

#[test]
fn individual_flags_can_be_disabled() {
    let opts = HtmlMinifyOptions {
        remove_comments: false,
        remove_optional_tags: false,
        ..HtmlMinifyOptions::default()
    };
    assert_eq!(
        minify_html("<ul>\n  <li>one</li> <!-- keep -->\n</ul>", &opts),
        "<ul><li>one</li><!-- keep --></ul>"
    );
}
